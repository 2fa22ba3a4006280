use rowflow_error::Result;

use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef, arg};
use crate::functions::scalar::ScalarFunctionImpl;
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;

const INPUTS: &[ParameterDef] = &[ParameterDef::single("value", ParamType::Any)];

pub const FUNCTION_IS_NULL: FunctionDefinition = FunctionDefinition {
    name: "is_null",
    category: Category::Condition,
    aliases: &[],
    kind: FunctionKind::Condition,
    generic: GenericPolicy::Fixed(DataType::Boolean),
    inputs: INPUTS,
    returns: Some(ParamType::Fixed(DataType::Boolean)),
    outputs: &[],
    doc: &Documentation {
        summary: "Check if a value is null.",
        description: "Check if a value is null. Accepts any type.",
        examples: &[Example {
            inputs: "NULL",
            output: "true",
        }],
    },
    factory: |_| Ok(FunctionImpl::Condition(Box::new(IsNull::<true>))),
};

pub const FUNCTION_IS_NOT_NULL: FunctionDefinition = FunctionDefinition {
    name: "is_not_null",
    category: Category::Condition,
    aliases: &[],
    kind: FunctionKind::Condition,
    generic: GenericPolicy::Fixed(DataType::Boolean),
    inputs: INPUTS,
    returns: Some(ParamType::Fixed(DataType::Boolean)),
    outputs: &[],
    doc: &Documentation {
        summary: "Check if a value is not null.",
        description: "Check if a value is not null. Accepts any type.",
        examples: &[Example {
            inputs: "'a'",
            output: "true",
        }],
    },
    factory: |_| Ok(FunctionImpl::Condition(Box::new(IsNull::<false>))),
};

#[derive(Debug, Clone, Copy)]
pub struct IsNull<const IS_NULL: bool>;

impl<const IS_NULL: bool> ScalarFunctionImpl for IsNull<IS_NULL> {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        Ok(FunctionOutput::value(arg(args, 0)?.is_null() == IS_NULL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, row, schema, vars};
    use crate::values::scalar::ScalarValue;

    #[test]
    fn any_type() {
        let schema = schema(&[("u", DataType::Uuid), ("s", DataType::Utf8)]);
        let mut is_null = bind("condition.is_null", &schema, vec![ParameterSpec::column("u")]);
        let mut not_null = bind("condition.is_not_null", &schema, vec![ParameterSpec::column("s")]);

        let r = row(vec![ScalarValue::Null, "x".into()]);
        assert!(is_null.evaluate_condition(&r, &vars()).unwrap());
        assert!(not_null.evaluate_condition(&r, &vars()).unwrap());

        let r = row(vec![uuid::Uuid::nil().into(), ScalarValue::Null]);
        assert!(!is_null.evaluate_condition(&r, &vars()).unwrap());
        assert!(!not_null.evaluate_condition(&r, &vars()).unwrap());
    }
}
