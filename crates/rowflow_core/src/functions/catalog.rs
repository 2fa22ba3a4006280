use hashbrown::HashMap;
use rowflow_error::{Result, RowflowError};
use tracing::debug;

use super::FunctionDefinition;
use super::aggregate::builtin::BUILTIN_AGGREGATE_FUNCTIONS;
use super::condition::builtin::BUILTIN_CONDITION_FUNCTIONS;
use super::descriptor::FunctionDescriptor;
use super::profile::builtin::BUILTIN_PROFILE_FUNCTIONS;
use super::rows::builtin::BUILTIN_ROWS_FUNCTIONS;
use super::scalar::builtin::BUILTIN_SCALAR_FUNCTIONS;
use super::series::builtin::BUILTIN_SERIES_FUNCTIONS;
use super::validate::builtin::BUILTIN_VALIDATE_FUNCTIONS;

/// Registry of function definitions keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct FunctionCatalog {
    functions: HashMap<String, &'static FunctionDefinition>,
    /// Qualified alias to qualified name.
    aliases: HashMap<String, String>,
}

impl FunctionCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a catalog containing all builtin functions.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();

        let builtins = [
            BUILTIN_SCALAR_FUNCTIONS,
            BUILTIN_CONDITION_FUNCTIONS,
            BUILTIN_AGGREGATE_FUNCTIONS,
            BUILTIN_ROWS_FUNCTIONS,
            BUILTIN_SERIES_FUNCTIONS,
            BUILTIN_VALIDATE_FUNCTIONS,
            BUILTIN_PROFILE_FUNCTIONS,
        ];

        for def in builtins.into_iter().flatten().copied() {
            if let Err(e) = catalog.register(def) {
                panic!("Invalid builtin function table: {e}");
            }
        }

        debug!(count = catalog.functions.len(), "loaded builtin functions");

        catalog
    }

    /// Add a definition to the catalog.
    ///
    /// Errors if the name or any alias is already taken.
    pub fn register(&mut self, definition: &'static FunctionDefinition) -> Result<()> {
        let name = definition.qualified_name();
        let aliases: Vec<_> = definition.qualified_aliases().collect();

        for taken in std::iter::once(&name).chain(aliases.iter()) {
            if self.functions.contains_key(taken) || self.aliases.contains_key(taken) {
                return Err(RowflowError::binding("Duplicate function name")
                    .with_field("function", taken));
            }
        }

        for alias in aliases {
            self.aliases.insert(alias, name.clone());
        }
        self.functions.insert(name, definition);

        Ok(())
    }

    /// Get a definition by qualified name or alias.
    pub fn get(&self, name: &str) -> Option<&'static FunctionDefinition> {
        let name = name.to_ascii_lowercase();
        let name = self.aliases.get(&name).unwrap_or(&name);
        self.functions.get(name).copied()
    }

    /// Resolve a function into a descriptor ready for parameter specs.
    pub fn resolve(&self, name: &str) -> Result<FunctionDescriptor> {
        let definition = self.get(name).ok_or_else(|| {
            RowflowError::binding("Unknown function").with_field("function", name)
        })?;
        Ok(FunctionDescriptor::new(definition))
    }

    /// All definitions ordered by qualified name.
    pub fn definitions(&self) -> Vec<&'static FunctionDefinition> {
        let mut defs: Vec<_> = self.functions.values().copied().collect();
        defs.sort_unstable_by_key(|def| def.qualified_name());
        defs
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::bind::BindContext;
    use crate::functions::documentation::{Category, Documentation};
    use crate::functions::parameter::{ParamType, ParameterDef};
    use crate::functions::{FunctionImpl, FunctionKind, GenericPolicy};
    use crate::values::datatype::DataType;

    fn bind_unsupported(_: &BindContext) -> Result<FunctionImpl> {
        Err(RowflowError::new("unsupported"))
    }

    static CUSTOM: FunctionDefinition = FunctionDefinition {
        name: "custom",
        category: Category::String,
        aliases: &["upper"],
        kind: FunctionKind::Map,
        generic: GenericPolicy::Fixed(DataType::Utf8),
        inputs: &[ParameterDef::single("value", ParamType::Generic)],
        returns: Some(ParamType::Generic),
        outputs: &[],
        doc: &Documentation {
            summary: "Custom function.",
            description: "Custom function.",
            examples: &[],
        },
        factory: bind_unsupported,
    };

    #[test]
    fn resolve_by_alias() {
        let catalog = FunctionCatalog::builtin();
        let a = catalog.resolve("arithmetic.divide").unwrap();
        let b = catalog.resolve("arithmetic.div").unwrap();
        assert_eq!(a.definition().name, b.definition().name);

        let eq = catalog.resolve("Condition.EQ").unwrap();
        assert_eq!("equal", eq.definition().name);
    }

    #[test]
    fn unknown_function() {
        let err = FunctionCatalog::builtin()
            .resolve("arithmetic.modulo")
            .unwrap_err();
        assert!(err.is_binding());
    }

    #[test]
    fn register_duplicate_alias() {
        let mut catalog = FunctionCatalog::builtin();
        let err = catalog.register(&CUSTOM).unwrap_err();
        assert_eq!(Some("string.upper"), err.get_field("function"));
        assert!(catalog.get("string.custom").is_none());

        let mut catalog = FunctionCatalog::empty();
        catalog.register(&CUSTOM).unwrap();
        assert_eq!("custom", catalog.get("string.upper").unwrap().name);
    }

    #[test]
    fn builtins_documented() {
        let catalog = FunctionCatalog::builtin();
        for def in catalog.definitions() {
            assert!(!def.doc.summary.trim().is_empty(), "{}", def.qualified_name());
            for input in def.inputs {
                assert!(!input.name.is_empty());
            }
        }
        assert!(catalog.len() > 40);
    }
}
