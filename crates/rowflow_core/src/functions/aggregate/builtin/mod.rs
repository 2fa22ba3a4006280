pub mod count;
pub mod first_last;
pub mod hierarchy;
pub mod minmax;
pub mod numeric;
pub mod pivot;
pub mod rank;
pub mod string_agg;

use crate::functions::FunctionDefinition;

pub const BUILTIN_AGGREGATE_FUNCTIONS: &[&FunctionDefinition] = &[
    &numeric::FUNCTION_SUM,
    &numeric::FUNCTION_AVERAGE,
    &minmax::FUNCTION_MIN,
    &minmax::FUNCTION_MAX,
    &count::FUNCTION_COUNT,
    &first_last::FUNCTION_FIRST,
    &first_last::FUNCTION_LAST,
    &string_agg::FUNCTION_CONCAT,
    &rank::FUNCTION_RANK,
    &pivot::FUNCTION_PIVOT_TO_COLUMNS,
    &hierarchy::FUNCTION_FLATTEN_HIERARCHY,
];
