use hashbrown::HashSet;
use rowflow_error::Result;

use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef, arg};
use crate::functions::profile::{Distribution, ProfileFunctionImpl, ProfileResult};
use crate::functions::{FunctionDefinition, FunctionImpl, FunctionKind, GenericPolicy};
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;
use crate::values::scalar::key::ScalarKey;

pub const FUNCTION_DISTINCT_COUNT: FunctionDefinition = FunctionDefinition {
    name: "distinct_count",
    category: Category::Profile,
    aliases: &[],
    kind: FunctionKind::Profile,
    generic: GenericPolicy::Fixed(DataType::Int64),
    inputs: &[ParameterDef::single("value", ParamType::Any)],
    returns: Some(ParamType::Fixed(DataType::Int64)),
    outputs: &[],
    doc: &Documentation {
        summary: "Number of distinct non-null values.",
        description: r#"
Number of distinct non-null values. The detailed result includes how often
each value occurred, for up to `profile_distribution_limit` values.
"#,
        examples: &[Example {
            inputs: "'a', 'b', 'a', null",
            output: "2",
        }],
    },
    factory: |ctx| {
        Ok(FunctionImpl::Profile(Box::new(DistinctCount {
            seen: HashSet::new(),
            distribution: Distribution::new(ctx.config.profile_distribution_limit),
        })))
    },
};

pub const FUNCTION_NULL_COUNT: FunctionDefinition = FunctionDefinition {
    name: "null_count",
    category: Category::Profile,
    aliases: &[],
    kind: FunctionKind::Profile,
    generic: GenericPolicy::Fixed(DataType::Int64),
    inputs: &[ParameterDef::single("value", ParamType::Any)],
    returns: Some(ParamType::Fixed(DataType::Int64)),
    outputs: &[],
    doc: &Documentation {
        summary: "Number of null values.",
        description: r#"
Number of null values. The detailed result splits rows into null and not null.
"#,
        examples: &[Example {
            inputs: "'a', null, null",
            output: "2",
        }],
    },
    factory: |_| Ok(FunctionImpl::Profile(Box::new(NullCount::default()))),
};

#[derive(Debug)]
pub struct DistinctCount {
    seen: HashSet<ScalarKey>,
    distribution: Distribution,
}

impl ProfileFunctionImpl for DistinctCount {
    fn reset(&mut self) {
        self.seen.clear();
        self.distribution.clear();
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(());
        }
        self.seen.insert(ScalarKey(value.clone()));
        self.distribution.add(value.clone());
        Ok(())
    }

    fn finalize(&self, detailed: bool) -> Result<ProfileResult> {
        Ok(self.distribution.result(self.seen.len() as i64, detailed))
    }
}

#[derive(Debug, Default)]
pub struct NullCount {
    nulls: u64,
    values: u64,
}

impl ProfileFunctionImpl for NullCount {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        if arg(args, 0)?.is_null() {
            self.nulls += 1;
        } else {
            self.values += 1;
        }
        Ok(())
    }

    fn finalize(&self, detailed: bool) -> Result<ProfileResult> {
        Ok(ProfileResult {
            summary: ScalarValue::Int64(self.nulls as i64),
            distribution: detailed.then(|| {
                vec![
                    (ScalarValue::from("null"), self.nulls),
                    (ScalarValue::from("not null"), self.values),
                ]
            }),
        })
    }
}
