use hashbrown::{HashMap, HashSet};
use rowflow_error::{Result, RowflowError};

use crate::functions::aggregate::AggregateFunctionImpl;
use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{
    DefaultValue,
    ParamType,
    ParamValue,
    ParameterDef,
    arg,
};
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;
use crate::values::scalar::key::ScalarKey;

pub const FUNCTION_FLATTEN_HIERARCHY: FunctionDefinition = FunctionDefinition {
    name: "flatten_hierarchy",
    category: Category::Aggregate,
    aliases: &[],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::AnyComparable,
    inputs: &[
        ParameterDef::single("child", ParamType::Generic),
        ParameterDef::single("parent", ParamType::Generic),
        ParameterDef::single("levels", ParamType::Fixed(DataType::Int64))
            .with_default(DefaultValue::Int(0)),
        ParameterDef::single("orphans", ParamType::Fixed(DataType::Utf8))
            .with_default(DefaultValue::Utf8("error")),
    ],
    returns: Some(ParamType::Fixed(DataType::Int64)),
    outputs: &[ParameterDef::group("path", ParamType::Generic)],
    doc: &Documentation {
        summary: "Flattens child/parent rows into a root-first path per row.",
        description: r#"
Collects (child, parent) rows for the group, then for each row walks the
parent links up to a root. The path is written root first into the output
group, truncated or padded with nulls to the number of levels. Returns the
depth of the row's child.

`levels` defaults to the number of bound output columns, or the
`max_hierarchy_depth` setting if none are bound. An explicit `levels` above
`max_hierarchy_depth` is rejected. `orphans` controls parents
with no row of their own: 'error' fails, 'new_root' treats the parent as a
root.

A child appearing twice, or a cycle in the parent links, fails the group.
"#,
        examples: &[Example {
            inputs: "('b', 'a'), ('c', 'b'), ('a', NULL)",
            output: "path ['a', 'b', NULL], 2 for the first row",
        }],
    },
    factory: bind_flatten_hierarchy,
};

/// Handling for a parent that has no row of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanPolicy {
    Error,
    NewRoot,
}

impl OrphanPolicy {
    pub fn try_from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "new_root" | "newroot" => Ok(Self::NewRoot),
            other => {
                Err(RowflowError::binding("Invalid orphan policy").with_field("policy", other))
            }
        }
    }
}

fn bind_flatten_hierarchy(ctx: &BindContext) -> Result<FunctionImpl> {
    let levels = ctx.try_constant(2)?.try_as_i64()?;
    let orphans = OrphanPolicy::try_from_str(ctx.try_constant(3)?.try_as_str()?)?;
    let bound = ctx.output_len(0);

    let max = ctx.config.max_hierarchy_depth;

    let levels = match (levels, bound) {
        (n, _) if n < 0 => {
            return Err(RowflowError::binding("Hierarchy levels cannot be negative"));
        }
        (n, _) if n as u64 > max as u64 => {
            return Err(RowflowError::binding("Hierarchy levels exceed max_hierarchy_depth")
                .with_field("levels", n)
                .with_field("max_hierarchy_depth", max));
        }
        (0, 0) => max,
        (0, bound) => bound,
        (n, 0) => n as usize,
        (n, bound) if n as usize == bound => bound,
        (n, bound) => {
            return Err(RowflowError::binding("Hierarchy levels differ from bound output columns")
                .with_field("levels", n)
                .with_field("columns", bound));
        }
    };

    Ok(FunctionImpl::Aggregate(Box::new(FlattenHierarchy {
        levels,
        orphans,
        rows: Vec::new(),
        paths: None,
    })))
}

#[derive(Debug)]
pub struct FlattenHierarchy {
    levels: usize,
    orphans: OrphanPolicy,
    /// (child, parent) in input order.
    rows: Vec<(ScalarValue, ScalarValue)>,
    /// Root-first path per row, built on first finalize.
    paths: Option<Vec<Vec<ScalarValue>>>,
}

impl FlattenHierarchy {
    fn build_paths(&self) -> Result<Vec<Vec<ScalarValue>>> {
        let mut parents: HashMap<ScalarKey, &ScalarValue> =
            HashMap::with_capacity(self.rows.len());
        for (child, parent) in &self.rows {
            if child.is_null() {
                continue;
            }
            if parents.insert(ScalarKey(child.clone()), parent).is_some() {
                return Err(RowflowError::runtime("Duplicate child in hierarchy")
                    .with_field("child", child));
            }
        }

        self.rows
            .iter()
            .map(|(child, _)| self.walk(child, &parents))
            .collect()
    }

    fn walk(
        &self,
        child: &ScalarValue,
        parents: &HashMap<ScalarKey, &ScalarValue>,
    ) -> Result<Vec<ScalarValue>> {
        if child.is_null() {
            return Ok(Vec::new());
        }

        let mut path = vec![child.clone()];
        let mut used = HashSet::new();
        used.insert(ScalarKey(child.clone()));

        let mut current = parents.get(&ScalarKey(child.clone())).copied();
        while let Some(node) = current {
            if node.is_null() {
                break;
            }
            let key = ScalarKey(node.clone());
            if !used.insert(key.clone()) {
                return Err(RowflowError::runtime("Recursive relationship in hierarchy")
                    .with_field("child", child)
                    .with_field("node", node));
            }
            path.push(node.clone());

            current = match parents.get(&key) {
                Some(parent) => Some(*parent),
                None => match self.orphans {
                    OrphanPolicy::NewRoot => None,
                    OrphanPolicy::Error => {
                        return Err(RowflowError::runtime("Parent has no row in hierarchy")
                            .with_field("parent", node));
                    }
                },
            };
        }

        path.reverse();
        Ok(path)
    }
}

impl AggregateFunctionImpl for FlattenHierarchy {
    fn reset(&mut self) {
        self.rows.clear();
        self.paths = None;
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        self.rows.push((arg(args, 0)?.clone(), arg(args, 1)?.clone()));
        self.paths = None;
        Ok(())
    }

    fn finalize(&mut self, index: usize) -> Result<FunctionOutput> {
        if self.paths.is_none() {
            self.paths = Some(self.build_paths()?);
        }

        let path = self
            .paths
            .as_ref()
            .and_then(|paths| paths.get(index))
            .ok_or_else(|| {
                RowflowError::runtime("Hierarchy result index out of range")
                    .with_field("index", index)
            })?;

        let depth = path.len() as i64;
        let mut levels: Vec<_> = path.iter().take(self.levels).cloned().collect();
        levels.resize(self.levels, ScalarValue::Null);

        Ok(FunctionOutput::with_outputs(
            ScalarValue::Int64(depth),
            vec![ParamValue::Group(levels)],
        ))
    }

    fn result_count(&self) -> usize {
        self.rows.len()
    }
}
