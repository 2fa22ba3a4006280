mod moving;
mod previous_value;

use crate::functions::FunctionDefinition;

pub const BUILTIN_SERIES_FUNCTIONS: &[&FunctionDefinition] = &[
    &moving::FUNCTION_MOVING_AVERAGE,
    &moving::FUNCTION_MOVING_SUM,
    &previous_value::FUNCTION_PREVIOUS_VALUE,
];
