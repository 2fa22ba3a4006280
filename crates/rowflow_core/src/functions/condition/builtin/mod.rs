pub mod comparison;
pub mod is_in;
pub mod is_null;
pub mod regex_match;

use crate::functions::FunctionDefinition;

pub const BUILTIN_CONDITION_FUNCTIONS: &[&FunctionDefinition] = &[
    &comparison::FUNCTION_EQUAL,
    &comparison::FUNCTION_NOT_EQUAL,
    &comparison::FUNCTION_LESS_THAN,
    &comparison::FUNCTION_LESS_THAN_EQUAL,
    &comparison::FUNCTION_GREATER_THAN,
    &comparison::FUNCTION_GREATER_THAN_EQUAL,
    &comparison::FUNCTION_BETWEEN,
    &is_null::FUNCTION_IS_NULL,
    &is_null::FUNCTION_IS_NOT_NULL,
    &is_in::FUNCTION_IS_IN,
    &regex_match::FUNCTION_REGEX_MATCH,
];
