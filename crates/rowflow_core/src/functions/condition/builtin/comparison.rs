use rowflow_error::Result;

use crate::functions::bind::BindContext;
use crate::functions::condition::{CompareOperator, TypedComparison};
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef, arg};
use crate::functions::scalar::ScalarFunctionImpl;
use crate::functions::{
    FunctionDefinition,
    FunctionFactory,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;

pub const FUNCTION_EQUAL: FunctionDefinition = comparison(
    "equal",
    &["eq"],
    &Documentation {
        summary: "Check if two values are equal. Two nulls are equal.",
        description: "Check if two values are equal. Two nulls are equal.",
        examples: &[Example {
            inputs: "1, 1",
            output: "true",
        }],
    },
    bind_compare::<EqOp>,
);

pub const FUNCTION_NOT_EQUAL: FunctionDefinition = comparison(
    "not_equal",
    &["ne"],
    &Documentation {
        summary: "Check if two values are not equal.",
        description: r#"
Check if two values are not equal. A null is not equal to any non-null value.
"#,
        examples: &[Example {
            inputs: "1, 2",
            output: "true",
        }],
    },
    bind_compare::<NotEqOp>,
);

pub const FUNCTION_LESS_THAN: FunctionDefinition = comparison(
    "less_than",
    &["lt"],
    &Documentation {
        summary: "Check if the left value is less than the right.",
        description: "Check if the left value is less than the right. False if either is null.",
        examples: &[Example {
            inputs: "1, 2",
            output: "true",
        }],
    },
    bind_compare::<LtOp>,
);

pub const FUNCTION_LESS_THAN_EQUAL: FunctionDefinition = comparison(
    "less_than_equal",
    &["lte"],
    &Documentation {
        summary: "Check if the left value is less than or equal to the right.",
        description: r#"
Check if the left value is less than or equal to the right. False if either is
null.
"#,
        examples: &[Example {
            inputs: "2, 2",
            output: "true",
        }],
    },
    bind_compare::<LtEqOp>,
);

pub const FUNCTION_GREATER_THAN: FunctionDefinition = comparison(
    "greater_than",
    &["gt"],
    &Documentation {
        summary: "Check if the left value is greater than the right.",
        description: "Check if the left value is greater than the right. False if either is null.",
        examples: &[Example {
            inputs: "2, 1",
            output: "true",
        }],
    },
    bind_compare::<GtOp>,
);

pub const FUNCTION_GREATER_THAN_EQUAL: FunctionDefinition = comparison(
    "greater_than_equal",
    &["gte"],
    &Documentation {
        summary: "Check if the left value is greater than or equal to the right.",
        description: r#"
Check if the left value is greater than or equal to the right. False if either
is null.
"#,
        examples: &[Example {
            inputs: "2, 2",
            output: "true",
        }],
    },
    bind_compare::<GtEqOp>,
);

pub const FUNCTION_BETWEEN: FunctionDefinition = FunctionDefinition {
    name: "between",
    category: Category::Condition,
    aliases: &[],
    kind: FunctionKind::Condition,
    generic: GenericPolicy::AnyComparable,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("low", ParamType::Generic),
        ParameterDef::single("high", ParamType::Generic),
    ],
    returns: Some(ParamType::Fixed(DataType::Boolean)),
    outputs: &[],
    doc: &Documentation {
        summary: "Check if a value is within an inclusive range.",
        description: "Check if `low <= value <= high`. False if any input is null.",
        examples: &[Example {
            inputs: "5, 1, 5",
            output: "true",
        }],
    },
    factory: bind_between,
};

const COMPARISON_INPUTS: &[ParameterDef] = &[
    ParameterDef::single("left", ParamType::Generic),
    ParameterDef::single("right", ParamType::Generic),
];

const fn comparison(
    name: &'static str,
    aliases: &'static [&'static str],
    doc: &'static Documentation,
    factory: FunctionFactory,
) -> FunctionDefinition {
    FunctionDefinition {
        name,
        category: Category::Condition,
        aliases,
        kind: FunctionKind::Condition,
        generic: GenericPolicy::AnyComparable,
        inputs: COMPARISON_INPUTS,
        returns: Some(ParamType::Fixed(DataType::Boolean)),
        outputs: &[],
        doc,
        factory,
    }
}

pub trait ComparisonOperation: Sync + Send + 'static {
    const OP: CompareOperator;
}

#[derive(Debug, Clone, Copy)]
pub struct EqOp;

impl ComparisonOperation for EqOp {
    const OP: CompareOperator = CompareOperator::Equal;
}

#[derive(Debug, Clone, Copy)]
pub struct NotEqOp;

impl ComparisonOperation for NotEqOp {
    const OP: CompareOperator = CompareOperator::NotEqual;
}

#[derive(Debug, Clone, Copy)]
pub struct LtOp;

impl ComparisonOperation for LtOp {
    const OP: CompareOperator = CompareOperator::LessThan;
}

#[derive(Debug, Clone, Copy)]
pub struct LtEqOp;

impl ComparisonOperation for LtEqOp {
    const OP: CompareOperator = CompareOperator::LessThanEqual;
}

#[derive(Debug, Clone, Copy)]
pub struct GtOp;

impl ComparisonOperation for GtOp {
    const OP: CompareOperator = CompareOperator::GreaterThan;
}

#[derive(Debug, Clone, Copy)]
pub struct GtEqOp;

impl ComparisonOperation for GtEqOp {
    const OP: CompareOperator = CompareOperator::GreaterThanEqual;
}

fn bind_compare<O: ComparisonOperation>(ctx: &BindContext) -> Result<FunctionImpl> {
    Ok(FunctionImpl::Condition(Box::new(Compare {
        comparison: TypedComparison::try_new(O::OP, ctx.datatype)?,
    })))
}

#[derive(Debug, Clone, Copy)]
pub struct Compare {
    comparison: TypedComparison,
}

impl ScalarFunctionImpl for Compare {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let matched = self.comparison.evaluate(arg(args, 0)?, arg(args, 1)?)?;
        Ok(FunctionOutput::value(matched))
    }
}

fn bind_between(ctx: &BindContext) -> Result<FunctionImpl> {
    Ok(FunctionImpl::Condition(Box::new(Between {
        low: TypedComparison::try_new(CompareOperator::GreaterThanEqual, ctx.datatype)?,
        high: TypedComparison::try_new(CompareOperator::LessThanEqual, ctx.datatype)?,
    })))
}

#[derive(Debug, Clone, Copy)]
pub struct Between {
    low: TypedComparison,
    high: TypedComparison,
}

impl ScalarFunctionImpl for Between {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let (value, low, high) = (arg(args, 0)?, arg(args, 1)?, arg(args, 2)?);
        if value.is_null() || low.is_null() || high.is_null() {
            return Ok(FunctionOutput::value(false));
        }
        let within = self.low.evaluate(value, low)? && self.high.evaluate(value, high)?;
        Ok(FunctionOutput::value(ScalarValue::Boolean(within)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, row, schema, vars};

    #[test]
    fn comparisons_on_ints() {
        let schema = schema(&[("a", DataType::Int32), ("b", DataType::Int32)]);
        let inputs = || vec![ParameterSpec::column("a"), ParameterSpec::column("b")];

        // (function, 1 vs 2, 2 vs 2, null vs 2, null vs null)
        let cases = [
            ("condition.equal", false, true, false, true),
            ("condition.not_equal", true, false, true, false),
            ("condition.less_than", true, false, false, false),
            ("condition.less_than_equal", true, true, false, false),
            ("condition.greater_than", false, false, false, false),
            ("condition.greater_than_equal", false, true, false, false),
        ];

        for case in cases {
            let mut f = bind(case.0, &schema, inputs());
            let mut eval = |a: ScalarValue, b: ScalarValue| {
                f.evaluate_condition(&row(vec![a, b]), &vars()).unwrap()
            };
            let got = (
                case.0,
                eval(1.into(), 2.into()),
                eval(2.into(), 2.into()),
                eval(ScalarValue::Null, 2.into()),
                eval(ScalarValue::Null, ScalarValue::Null),
            );
            assert_eq!(case, got, "case: {case:?}");
        }
    }

    #[test]
    fn compare_column_to_string_constant() {
        let schema = schema(&[("d", DataType::DateTime)]);
        let mut f = bind(
            "condition.lt",
            &schema,
            vec![ParameterSpec::column("d"), ParameterSpec::constant("2024-01-01")],
        );
        let early = ScalarValue::from("2023-12-31 23:59:00")
            .cast_to(DataType::DateTime)
            .unwrap();
        let late = ScalarValue::from("2024-01-01").cast_to(DataType::DateTime).unwrap();
        assert!(f.evaluate_condition(&row(vec![early]), &vars()).unwrap());
        assert!(!f.evaluate_condition(&row(vec![late]), &vars()).unwrap());
    }

    #[test]
    fn between_inclusive() {
        let schema = schema(&[("v", DataType::Float64)]);
        let mut f = bind(
            "condition.between",
            &schema,
            vec![
                ParameterSpec::column("v"),
                ParameterSpec::constant(1),
                ParameterSpec::constant(5),
            ],
        );
        let cases = [(1.0, true), (5.0, true), (5.5, false), (0.5, false)];
        for case in cases {
            let got = f
                .evaluate_condition(&row(vec![case.0.into()]), &vars())
                .unwrap();
            assert_eq!(case.1, got, "case: {case:?}");
        }
        assert!(!f.evaluate_condition(&row(vec![ScalarValue::Null]), &vars()).unwrap());
    }
}
