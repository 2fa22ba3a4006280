//! Data quality checks.
//!
//! A validate function never fails a row because the data is bad. It reports
//! whether the value passed and a possibly adjusted value to write instead.
pub mod builtin;

use std::fmt::Debug;

use super::parameter::ParamValue;
use crate::values::scalar::ScalarValue;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// Value to write, the input if nothing was adjusted.
    pub value: ScalarValue,
}

impl ValidationOutcome {
    pub fn valid(value: ScalarValue) -> Self {
        ValidationOutcome { valid: true, value }
    }

    pub fn invalid(value: ScalarValue) -> Self {
        ValidationOutcome {
            valid: false,
            value,
        }
    }
}

pub trait ValidateFunctionImpl: Debug + Send {
    fn check(&self, args: &[ParamValue]) -> ValidationOutcome;
}

/// Get an argument, treating a missing or grouped argument as null.
pub(crate) fn arg_or_null(args: &[ParamValue], idx: usize) -> &ScalarValue {
    const NULL: &ScalarValue = &ScalarValue::Null;
    match args.get(idx) {
        Some(ParamValue::Scalar(v)) => v,
        _ => NULL,
    }
}
