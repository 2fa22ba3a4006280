pub mod sequence;
pub mod split_rows;
pub mod unpivot;

use crate::functions::FunctionDefinition;

pub const BUILTIN_ROWS_FUNCTIONS: &[&FunctionDefinition] = &[
    &split_rows::FUNCTION_SPLIT_ROWS,
    &sequence::FUNCTION_SEQUENCE,
    &unpivot::FUNCTION_UNPIVOT,
];
