use rowflow_error::Result;

use crate::functions::aggregate::AggregateFunctionImpl;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef, arg};
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::scalar::ScalarValue;

const VALUE_INPUT: &[ParameterDef] = &[ParameterDef::single("value", ParamType::Generic)];

pub const FUNCTION_FIRST: FunctionDefinition = FunctionDefinition {
    name: "first",
    category: Category::Aggregate,
    aliases: &[],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::AnyComparable,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "First non-null value in the group.",
        description: "First non-null value in the group, in input order.",
        examples: &[Example {
            inputs: "NULL, 'a', 'b'",
            output: "a",
        }],
    },
    factory: |_| Ok(FunctionImpl::Aggregate(Box::new(FirstLast::<true>::default()))),
};

pub const FUNCTION_LAST: FunctionDefinition = FunctionDefinition {
    name: "last",
    category: Category::Aggregate,
    aliases: &[],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::AnyComparable,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Last non-null value in the group.",
        description: "Last non-null value in the group, in input order.",
        examples: &[Example {
            inputs: "'a', 'b', NULL",
            output: "b",
        }],
    },
    factory: |_| Ok(FunctionImpl::Aggregate(Box::new(FirstLast::<false>::default()))),
};

#[derive(Debug, Default)]
pub struct FirstLast<const FIRST: bool> {
    value: Option<ScalarValue>,
}

impl<const FIRST: bool> AggregateFunctionImpl for FirstLast<FIRST> {
    fn reset(&mut self) {
        self.value = None;
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        let value = arg(args, 0)?;
        if value.is_null() || (FIRST && self.value.is_some()) {
            return Ok(());
        }
        self.value = Some(value.clone());
        Ok(())
    }

    fn finalize(&mut self, _index: usize) -> Result<FunctionOutput> {
        Ok(FunctionOutput::value(
            self.value.clone().unwrap_or(ScalarValue::Null),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, row, schema, vars};
    use crate::values::datatype::DataType;

    #[test]
    fn skips_nulls() {
        let schema = schema(&[("s", DataType::Utf8)]);
        let mut first = bind("aggregate.first", &schema, vec![ParameterSpec::column("s")]);
        let mut last = bind("aggregate.last", &schema, vec![ParameterSpec::column("s")]);

        for v in [ScalarValue::Null, "a".into(), "b".into(), ScalarValue::Null] {
            let r = row(vec![v]);
            first.accumulate(&r, &vars()).unwrap();
            last.accumulate(&r, &vars()).unwrap();
        }
        assert_eq!(ScalarValue::from("a"), first.result(0).unwrap().value);
        assert_eq!(ScalarValue::from("b"), last.result(0).unwrap().value);
    }
}
