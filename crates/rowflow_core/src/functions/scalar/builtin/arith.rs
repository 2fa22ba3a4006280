use std::marker::PhantomData;

use rowflow_error::{Result, RowflowError};

use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{DefaultValue, ParamType, ParamValue, ParameterDef, arg};
use crate::functions::scalar::ScalarFunctionImpl;
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::match_numeric_type;
use crate::values::datatype::DataType;
use crate::values::physical_type::NumericType;
use crate::values::scalar::ScalarValue;

const BINARY_INPUTS: &[ParameterDef] = &[
    ParameterDef::single("left", ParamType::Generic),
    ParameterDef::single("right", ParamType::Generic),
];

const UNARY_INPUTS: &[ParameterDef] = &[ParameterDef::single("value", ParamType::Generic)];

pub const FUNCTION_ADD: FunctionDefinition = FunctionDefinition {
    name: "add",
    category: Category::Arithmetic,
    aliases: &["plus"],
    kind: FunctionKind::Map,
    generic: GenericPolicy::AnyNumeric,
    inputs: BINARY_INPUTS,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Adds two numbers.",
        description: "Adds two numbers. Integer overflow fails the row.",
        examples: &[Example {
            inputs: "2, 3",
            output: "5",
        }],
    },
    factory: bind_binary::<AddOp>,
};

pub const FUNCTION_SUBTRACT: FunctionDefinition = FunctionDefinition {
    name: "subtract",
    category: Category::Arithmetic,
    aliases: &["minus"],
    kind: FunctionKind::Map,
    generic: GenericPolicy::AnyNumeric,
    inputs: BINARY_INPUTS,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Subtracts the right number from the left.",
        description: "Subtracts the right number from the left. Integer overflow fails the row.",
        examples: &[Example {
            inputs: "5, 3",
            output: "2",
        }],
    },
    factory: bind_binary::<SubtractOp>,
};

pub const FUNCTION_MULTIPLY: FunctionDefinition = FunctionDefinition {
    name: "multiply",
    category: Category::Arithmetic,
    aliases: &["mul"],
    kind: FunctionKind::Map,
    generic: GenericPolicy::AnyNumeric,
    inputs: BINARY_INPUTS,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Multiplies two numbers.",
        description: "Multiplies two numbers. Integer overflow fails the row.",
        examples: &[Example {
            inputs: "4, 3",
            output: "12",
        }],
    },
    factory: bind_binary::<MultiplyOp>,
};

pub const FUNCTION_DIVIDE: FunctionDefinition = FunctionDefinition {
    name: "divide",
    category: Category::Arithmetic,
    aliases: &["div"],
    kind: FunctionKind::Map,
    generic: GenericPolicy::AnyNumeric,
    inputs: &[
        ParameterDef::single("left", ParamType::Generic),
        ParameterDef::single("right", ParamType::Generic),
        ParameterDef::single("on_zero", ParamType::Fixed(DataType::Utf8))
            .with_default(DefaultValue::Utf8("error")),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Divides the left number by the right.",
        description: r#"
Divides the left number by the right. Integer division truncates.

Division by zero is handled by `on_zero`: 'error' fails the row, 'zero'
returns zero, 'infinity' returns an infinity with the sign of the dividend
and is only valid for floats.
"#,
        examples: &[
            Example {
                inputs: "7, 2",
                output: "3",
            },
            Example {
                inputs: "-1.5, 0.0, 'infinity'",
                output: "-inf",
            },
        ],
    },
    factory: bind_divide,
};

pub const FUNCTION_NEGATE: FunctionDefinition = FunctionDefinition {
    name: "negate",
    category: Category::Arithmetic,
    aliases: &["neg"],
    kind: FunctionKind::Map,
    generic: GenericPolicy::AnyNumeric,
    inputs: UNARY_INPUTS,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Returns the negation of the input value.",
        description: r#"
Returns the negation of the input value. Negating a non-zero unsigned value
fails the row.
"#,
        examples: &[Example {
            inputs: "5",
            output: "-5",
        }],
    },
    factory: bind_unary::<NegateOp>,
};

pub const FUNCTION_ABS: FunctionDefinition = FunctionDefinition {
    name: "abs",
    category: Category::Arithmetic,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: GenericPolicy::AnyNumeric,
    inputs: UNARY_INPUTS,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Returns the absolute value of the input.",
        description: "Returns the absolute value of the input.",
        examples: &[Example {
            inputs: "-3.5",
            output: "3.5",
        }],
    },
    factory: bind_unary::<AbsOp>,
};

pub trait BinaryOp: std::fmt::Debug + Send + Sync + 'static {
    fn apply<T: NumericType>(a: T::Native, b: T::Native) -> Result<T::Native>;
}

#[derive(Debug, Clone, Copy)]
pub struct AddOp;

impl BinaryOp for AddOp {
    fn apply<T: NumericType>(a: T::Native, b: T::Native) -> Result<T::Native> {
        T::add(a, b)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubtractOp;

impl BinaryOp for SubtractOp {
    fn apply<T: NumericType>(a: T::Native, b: T::Native) -> Result<T::Native> {
        T::subtract(a, b)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MultiplyOp;

impl BinaryOp for MultiplyOp {
    fn apply<T: NumericType>(a: T::Native, b: T::Native) -> Result<T::Native> {
        T::multiply(a, b)
    }
}

pub trait UnaryOp: std::fmt::Debug + Send + Sync + 'static {
    fn apply<T: NumericType>(a: T::Native) -> Result<T::Native>;
}

#[derive(Debug, Clone, Copy)]
pub struct NegateOp;

impl UnaryOp for NegateOp {
    fn apply<T: NumericType>(a: T::Native) -> Result<T::Native> {
        T::negate(a)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AbsOp;

impl UnaryOp for AbsOp {
    fn apply<T: NumericType>(a: T::Native) -> Result<T::Native> {
        if T::is_negative(a) { T::negate(a) } else { Ok(a) }
    }
}

fn bind_binary<O: BinaryOp>(ctx: &BindContext) -> Result<FunctionImpl> {
    match_numeric_type!(ctx.datatype, T => Ok(FunctionImpl::Map(Box::new(Binary::<T, O>::new()))))
}

fn bind_unary<O: UnaryOp>(ctx: &BindContext) -> Result<FunctionImpl> {
    match_numeric_type!(ctx.datatype, T => Ok(FunctionImpl::Map(Box::new(Unary::<T, O>::new()))))
}

#[derive(Debug, Clone, Copy)]
pub struct Binary<T, O> {
    _t: PhantomData<T>,
    _o: PhantomData<O>,
}

impl<T, O> Binary<T, O> {
    pub const fn new() -> Self {
        Binary {
            _t: PhantomData,
            _o: PhantomData,
        }
    }
}

impl<T: NumericType, O: BinaryOp> ScalarFunctionImpl for Binary<T, O> {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let (left, right) = (arg(args, 0)?, arg(args, 1)?);
        if left.is_null() || right.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        let v = O::apply::<T>(T::from_scalar(left)?, T::from_scalar(right)?)?;
        Ok(FunctionOutput::value(T::into_scalar(v)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Unary<T, O> {
    _t: PhantomData<T>,
    _o: PhantomData<O>,
}

impl<T, O> Unary<T, O> {
    pub const fn new() -> Self {
        Unary {
            _t: PhantomData,
            _o: PhantomData,
        }
    }
}

impl<T: NumericType, O: UnaryOp> ScalarFunctionImpl for Unary<T, O> {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        let v = O::apply::<T>(T::from_scalar(value)?)?;
        Ok(FunctionOutput::value(T::into_scalar(v)))
    }
}

/// How division by zero is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivideByZeroPolicy {
    /// Fail the row.
    Error,
    /// Return the type's zero.
    Zero,
    /// Return an infinity signed by the dividend. Floats only.
    Infinity,
}

impl DivideByZeroPolicy {
    /// Parse the policy, checking that it's valid for `datatype`.
    pub fn try_from_scalar(value: &ScalarValue, datatype: DataType) -> Result<Self> {
        let s = value.try_as_str()?;
        let policy = match s.trim().to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "zero" => Self::Zero,
            "infinity" | "inf" => Self::Infinity,
            _ => {
                return Err(RowflowError::type_error("Invalid divide by zero policy")
                    .with_field("policy", s));
            }
        };

        if policy == Self::Infinity && !datatype.is_float() {
            return Err(RowflowError::type_error(
                "Infinity divide by zero policy requires a float type",
            )
            .with_field("datatype", datatype));
        }

        Ok(policy)
    }
}

fn bind_divide(ctx: &BindContext) -> Result<FunctionImpl> {
    // Constant policies are validated once, otherwise they're read per row.
    let policy = match ctx.constant(2) {
        Some(v) => Some(DivideByZeroPolicy::try_from_scalar(v, ctx.datatype)?),
        None => None,
    };
    match_numeric_type!(ctx.datatype, T => {
        Ok(FunctionImpl::Map(Box::new(Divide::<T>::new(policy))))
    })
}

#[derive(Debug, Clone, Copy)]
pub struct Divide<T> {
    policy: Option<DivideByZeroPolicy>,
    _t: PhantomData<T>,
}

impl<T> Divide<T> {
    pub const fn new(policy: Option<DivideByZeroPolicy>) -> Self {
        Divide {
            policy,
            _t: PhantomData,
        }
    }
}

impl<T: NumericType> ScalarFunctionImpl for Divide<T> {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let (left, right) = (arg(args, 0)?, arg(args, 1)?);
        if left.is_null() || right.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        let (a, b) = (T::from_scalar(left)?, T::from_scalar(right)?);

        if !T::is_zero(b) {
            return Ok(FunctionOutput::value(T::into_scalar(T::divide(a, b)?)));
        }

        let policy = match self.policy {
            Some(policy) => policy,
            None => DivideByZeroPolicy::try_from_scalar(arg(args, 2)?, T::DATATYPE)?,
        };

        let v = match policy {
            DivideByZeroPolicy::Error => {
                return Err(RowflowError::runtime("Division by zero").with_field("dividend", left));
            }
            DivideByZeroPolicy::Zero => T::zero(),
            DivideByZeroPolicy::Infinity => T::infinity(T::is_negative(a)).ok_or_else(|| {
                RowflowError::type_error("Infinity not supported for type")
                    .with_field("datatype", T::DATATYPE)
            })?,
        };

        Ok(FunctionOutput::value(T::into_scalar(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::transform::TransformConfig;
    use crate::functions::catalog::FunctionCatalog;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, invoke_value, row, schema, vars};

    #[test]
    fn add_cases() {
        let schema = schema(&[("a", DataType::Int32), ("b", DataType::Int32)]);
        let mut f = bind(
            "arithmetic.add",
            &schema,
            vec![ParameterSpec::column("a"), ParameterSpec::column("b")],
        );

        let cases = [
            (vec![2.into(), 3.into()], ScalarValue::Int32(5)),
            (vec![(-2).into(), 3.into()], ScalarValue::Int32(1)),
            (vec![ScalarValue::Null, 3.into()], ScalarValue::Null),
        ];
        for case in cases {
            let got = invoke_value(&mut f, case.0.clone());
            assert_eq!(case.1, got, "case: {case:?}");
        }

        let err = f
            .invoke(&row(vec![i32::MAX.into(), 1.into()]), &vars())
            .unwrap_err();
        assert!(err.is_runtime());
    }

    #[test]
    fn add_column_and_constant_decimal() {
        let schema = schema(&[("a", DataType::Decimal)]);
        let mut f = bind(
            "arithmetic.add",
            &schema,
            vec![ParameterSpec::column("a"), ParameterSpec::constant("0.25")],
        );
        let value = ScalarValue::from("1.5").cast_to(DataType::Decimal).unwrap();
        let got = invoke_value(&mut f, vec![value]);
        assert_eq!(
            ScalarValue::from("1.75").cast_to(DataType::Decimal).unwrap(),
            got
        );
    }

    #[test]
    fn subtract_unsigned_underflow() {
        let schema = schema(&[("a", DataType::UInt8)]);
        let mut f = bind(
            "arithmetic.subtract",
            &schema,
            vec![ParameterSpec::column("a"), ParameterSpec::constant(2)],
        );
        assert_eq!(ScalarValue::UInt8(1), invoke_value(&mut f, vec![ScalarValue::UInt8(3)]));
        let err = f.invoke(&row(vec![ScalarValue::UInt8(1)]), &vars()).unwrap_err();
        assert!(err.is_runtime());
    }

    fn divide_with_policy(
        datatype: DataType,
        policy: &str,
    ) -> Result<crate::functions::bound::BoundFunction> {
        let schema = schema(&[("a", datatype), ("b", datatype)]);
        FunctionCatalog::builtin()
            .resolve("arithmetic.divide")?
            .with_input(ParameterSpec::column("a"))
            .with_input(ParameterSpec::column("b"))
            .with_input(ParameterSpec::constant(policy))
            .with_return("out")
            .bind(&schema, None, &TransformConfig::default())
    }

    #[test]
    fn divide_by_zero_policies() {
        let mut f = divide_with_policy(DataType::Int64, "error").unwrap();
        let err = f
            .invoke(&row(vec![4_i64.into(), 0_i64.into()]), &vars())
            .unwrap_err();
        assert!(err.is_runtime());
        assert_eq!(ScalarValue::Int64(2), invoke_value(&mut f, vec![4_i64.into(), 2_i64.into()]));

        let mut f = divide_with_policy(DataType::Int64, "zero").unwrap();
        assert_eq!(ScalarValue::Int64(0), invoke_value(&mut f, vec![4_i64.into(), 0_i64.into()]));

        let mut f = divide_with_policy(DataType::Float64, "infinity").unwrap();
        assert_eq!(
            ScalarValue::Float64(f64::INFINITY),
            invoke_value(&mut f, vec![4.0.into(), 0.0.into()])
        );
        assert_eq!(
            ScalarValue::Float64(f64::NEG_INFINITY),
            invoke_value(&mut f, vec![(-4.0).into(), 0.0.into()])
        );

        // Infinity isn't valid for integers.
        let err = divide_with_policy(DataType::Int32, "infinity").unwrap_err();
        assert!(err.is_type());

        let err = divide_with_policy(DataType::Int32, "explode").unwrap_err();
        assert!(err.is_type());
    }

    #[test]
    fn divide_policy_from_column() {
        let schema = schema(&[
            ("a", DataType::Int32),
            ("b", DataType::Int32),
            ("p", DataType::Utf8),
        ]);
        let mut f = bind(
            "arithmetic.divide",
            &schema,
            vec![
                ParameterSpec::column("a"),
                ParameterSpec::column("b"),
                ParameterSpec::column("p"),
            ],
        );
        assert_eq!(
            ScalarValue::Int32(0),
            invoke_value(&mut f, vec![1.into(), 0.into(), "zero".into()])
        );
        let err = f
            .invoke(&row(vec![1.into(), 0.into(), "infinity".into()]), &vars())
            .unwrap_err();
        assert!(err.is_type());
    }

    #[test]
    fn negate_and_abs() {
        let schema = schema(&[("a", DataType::Int8)]);
        let mut neg = bind("arithmetic.negate", &schema, vec![ParameterSpec::column("a")]);
        let mut abs = bind("arithmetic.abs", &schema, vec![ParameterSpec::column("a")]);

        assert_eq!(ScalarValue::Int8(-5), invoke_value(&mut neg, vec![ScalarValue::Int8(5)]));
        assert_eq!(ScalarValue::Int8(5), invoke_value(&mut abs, vec![ScalarValue::Int8(-5)]));
        let err = abs
            .invoke(&row(vec![ScalarValue::Int8(i8::MIN)]), &vars())
            .unwrap_err();
        assert!(err.is_runtime());
    }
}
