mod max_length;
mod not_null;
mod range;

use crate::functions::FunctionDefinition;

pub const BUILTIN_VALIDATE_FUNCTIONS: &[&FunctionDefinition] = &[
    &max_length::FUNCTION_MAX_LENGTH,
    &not_null::FUNCTION_NOT_NULL,
    &range::FUNCTION_RANGE,
];
