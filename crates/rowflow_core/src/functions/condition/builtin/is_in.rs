use rowflow_error::Result;

use crate::functions::bind::BindContext;
use crate::functions::condition::{CompareOperator, TypedComparison};
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef, arg, group_arg};
use crate::functions::scalar::ScalarFunctionImpl;
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;

pub const FUNCTION_IS_IN: FunctionDefinition = FunctionDefinition {
    name: "is_in",
    category: Category::Condition,
    aliases: &["in"],
    kind: FunctionKind::Condition,
    generic: GenericPolicy::AnyComparable,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::group("list", ParamType::Generic),
    ],
    returns: Some(ParamType::Fixed(DataType::Boolean)),
    outputs: &[],
    doc: &Documentation {
        summary: "Check if a value is one of a list of values.",
        description: "Check if a value equals any value in the list. A null value is false.",
        examples: &[Example {
            inputs: "'b', ['a', 'b']",
            output: "true",
        }],
    },
    factory: bind_is_in,
};

fn bind_is_in(ctx: &BindContext) -> Result<FunctionImpl> {
    Ok(FunctionImpl::Condition(Box::new(IsIn {
        eq: TypedComparison::try_new(CompareOperator::Equal, ctx.datatype)?,
    })))
}

#[derive(Debug, Clone, Copy)]
pub struct IsIn {
    eq: TypedComparison,
}

impl ScalarFunctionImpl for IsIn {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(FunctionOutput::value(false));
        }
        for candidate in group_arg(args, 1)? {
            if !candidate.is_null() && self.eq.evaluate(value, candidate)? {
                return Ok(FunctionOutput::value(true));
            }
        }
        Ok(FunctionOutput::value(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, row, schema, vars};
    use crate::values::scalar::ScalarValue;

    #[test]
    fn constant_list() {
        let schema = schema(&[("a", DataType::Int64)]);
        let mut f = bind(
            "condition.is_in",
            &schema,
            vec![
                ParameterSpec::column("a"),
                ParameterSpec::constant(vec![
                    ScalarValue::from(1),
                    ScalarValue::from("3"),
                    ScalarValue::Null,
                ]),
            ],
        );
        let cases = [
            (ScalarValue::Int64(3), true),
            (ScalarValue::Int64(2), false),
            (ScalarValue::Null, false),
        ];
        for case in cases {
            let got = f.evaluate_condition(&row(vec![case.0.clone()]), &vars()).unwrap();
            assert_eq!(case.1, got, "case: {case:?}");
        }
    }

    #[test]
    fn list_from_array_column() {
        let schema = crate::values::schema::RowSchema::try_from_columns([
            crate::values::schema::ColumnDef::new("a", DataType::Utf8),
            crate::values::schema::ColumnDef::new("allowed", DataType::Utf8).with_rank(1),
        ])
        .unwrap();
        let mut f = bind(
            "condition.is_in",
            &schema,
            vec![ParameterSpec::column("a"), ParameterSpec::column("allowed")],
        );
        let allowed = ScalarValue::List(vec!["x".into(), "y".into()]);
        assert!(f.evaluate_condition(&row(vec!["y".into(), allowed.clone()]), &vars()).unwrap());
        assert!(!f.evaluate_condition(&row(vec!["z".into(), allowed]), &vars()).unwrap());
    }
}
