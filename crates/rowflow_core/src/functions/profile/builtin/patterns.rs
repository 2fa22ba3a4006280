use rowflow_error::Result;

use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef, arg};
use crate::functions::profile::{Distribution, ProfileFunctionImpl, ProfileResult};
use crate::functions::{FunctionDefinition, FunctionImpl, FunctionKind, GenericPolicy};
use crate::values::datatype::DataType;

pub const FUNCTION_PATTERNS: FunctionDefinition = FunctionDefinition {
    name: "patterns",
    category: Category::Profile,
    aliases: &[],
    kind: FunctionKind::Profile,
    generic: GenericPolicy::Fixed(DataType::Utf8),
    inputs: &[ParameterDef::single("value", ParamType::Generic)],
    returns: Some(ParamType::Fixed(DataType::Int64)),
    outputs: &[],
    doc: &Documentation {
        summary: "Number of distinct character patterns.",
        description: r#"
Reduces each value to a pattern where digits become `9`, upper case letters
become `A` and lower case letters become `a`. Other characters are kept. The
summary is the number of distinct patterns, the detailed result counts each.
"#,
        examples: &[Example {
            inputs: "'AB-12', 'XY-99', 'ab-1'",
            output: "2",
        }],
    },
    factory: |ctx| {
        Ok(FunctionImpl::Profile(Box::new(Patterns {
            distribution: Distribution::new(ctx.config.profile_distribution_limit),
        })))
    },
};

/// Character class pattern for a string.
pub fn pattern_of(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            c if c.is_numeric() => '9',
            c if c.is_uppercase() => 'A',
            c if c.is_lowercase() => 'a',
            c => c,
        })
        .collect()
}

#[derive(Debug)]
pub struct Patterns {
    distribution: Distribution,
}

impl ProfileFunctionImpl for Patterns {
    fn reset(&mut self) {
        self.distribution.clear();
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        let value = arg(args, 0)?;
        if !value.is_null() {
            self.distribution.add(pattern_of(value.try_as_str()?).into());
        }
        Ok(())
    }

    fn finalize(&self, detailed: bool) -> Result<ProfileResult> {
        Ok(self.distribution.result(self.distribution.len() as i64, detailed))
    }
}
