mod counts;
mod patterns;

use crate::functions::FunctionDefinition;

pub const BUILTIN_PROFILE_FUNCTIONS: &[&FunctionDefinition] = &[
    &counts::FUNCTION_DISTINCT_COUNT,
    &counts::FUNCTION_NULL_COUNT,
    &patterns::FUNCTION_PATTERNS,
];
