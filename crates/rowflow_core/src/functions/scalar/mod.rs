pub mod builtin;

use std::fmt::Debug;

use rowflow_error::Result;

use super::FunctionOutput;
use super::parameter::ParamValue;

/// Implementation of a map or condition function.
pub trait ScalarFunctionImpl: Debug + Send {
    /// Execute the function for one row's arguments.
    ///
    /// Arguments are in declared order with defaults filled in.
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput>;
}
