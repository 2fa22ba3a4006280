use std::cmp::Ordering;
use std::marker::PhantomData;

use rowflow_error::Result;

use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{DefaultValue, ParamType, ParamValue, ParameterDef};
use crate::functions::validate::{ValidateFunctionImpl, ValidationOutcome, arg_or_null};
use crate::functions::{FunctionDefinition, FunctionImpl, FunctionKind, GenericPolicy};
use crate::match_numeric_type;
use crate::values::datatype::DataType;
use crate::values::physical_type::NumericType;
use crate::values::scalar::ScalarValue;

pub const FUNCTION_RANGE: FunctionDefinition = FunctionDefinition {
    name: "range",
    category: Category::Validate,
    aliases: &[],
    kind: FunctionKind::Validate,
    generic: GenericPolicy::AnyNumeric,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("min", ParamType::Generic).with_default(DefaultValue::Null),
        ParameterDef::single("max", ParamType::Generic).with_default(DefaultValue::Null),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[ParameterDef::single("valid", ParamType::Fixed(DataType::Boolean))],
    doc: &Documentation {
        summary: "Checks a number is within an inclusive range.",
        description: r#"
Checks `min <= value <= max`. Values outside the range are clamped to the
nearest bound. A null bound is not checked.
"#,
        examples: &[Example {
            inputs: "12, 0, 10",
            output: "10, valid = false",
        }],
    },
    factory: bind_range,
};

fn bind_range(ctx: &BindContext) -> Result<FunctionImpl> {
    match_numeric_type!(ctx.datatype, T => {
        Ok(FunctionImpl::Validate(Box::new(Range::<T> { _t: PhantomData })))
    })
}

#[derive(Debug, Clone, Copy)]
pub struct Range<T: NumericType> {
    _t: PhantomData<T>,
}

impl<T: NumericType> Range<T> {
    /// Compare a value against a bound, None if either can't be read.
    fn compare(value: &T::Native, bound: &ScalarValue) -> Option<Ordering> {
        if bound.is_null() {
            return None;
        }
        T::from_scalar(bound)
            .ok()
            .map(|bound| T::compare(value, &bound))
    }
}

impl<T: NumericType> ValidateFunctionImpl for Range<T> {
    fn check(&self, args: &[ParamValue]) -> ValidationOutcome {
        let value = arg_or_null(args, 0);
        if value.is_null() {
            // Nulls are for not_null to catch.
            return ValidationOutcome::valid(ScalarValue::Null);
        }
        let native = match T::from_scalar(value) {
            Ok(native) => native,
            Err(_) => return ValidationOutcome::invalid(value.clone()),
        };

        let (min, max) = (arg_or_null(args, 1), arg_or_null(args, 2));
        if Self::compare(&native, min) == Some(Ordering::Less) {
            return ValidationOutcome::invalid(min.clone());
        }
        if Self::compare(&native, max) == Some(Ordering::Greater) {
            return ValidationOutcome::invalid(max.clone());
        }
        ValidationOutcome::valid(value.clone())
    }
}
