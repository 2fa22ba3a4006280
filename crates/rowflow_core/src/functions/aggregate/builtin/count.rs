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
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;

pub const FUNCTION_COUNT: FunctionDefinition = FunctionDefinition {
    name: "count",
    category: Category::Aggregate,
    aliases: &[],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::Fixed(DataType::Int64),
    inputs: &[ParameterDef::single("value", ParamType::Any)],
    returns: Some(ParamType::Fixed(DataType::Int64)),
    outputs: &[],
    doc: &Documentation {
        summary: "Number of non-null values in the group.",
        description: "Number of non-null values in the group. Accepts any type.",
        examples: &[Example {
            inputs: "'a', NULL, 'b'",
            output: "2",
        }],
    },
    factory: |_| Ok(FunctionImpl::Aggregate(Box::new(Count::default()))),
};

#[derive(Debug, Default)]
pub struct Count {
    count: i64,
}

impl AggregateFunctionImpl for Count {
    fn reset(&mut self) {
        self.count = 0;
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        if !arg(args, 0)?.is_null() {
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&mut self, _index: usize) -> Result<FunctionOutput> {
        Ok(FunctionOutput::value(ScalarValue::Int64(self.count)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, row, schema, vars};

    #[test]
    fn counts_non_null() {
        let schema = schema(&[("s", DataType::Utf8)]);
        let mut f = bind("aggregate.count", &schema, vec![ParameterSpec::column("s")]);
        for v in [ScalarValue::from("a"), ScalarValue::Null, ScalarValue::from("b")] {
            f.accumulate(&row(vec![v]), &vars()).unwrap();
        }
        assert_eq!(ScalarValue::Int64(2), f.result(0).unwrap().value);
        f.reset();
        assert_eq!(ScalarValue::Int64(0), f.result(0).unwrap().value);
    }
}
