pub mod arith;
pub mod datetime;
pub mod security;
pub mod string;

use crate::functions::FunctionDefinition;

pub const BUILTIN_SCALAR_FUNCTIONS: &[&FunctionDefinition] = &[
    // Arithmetic
    &arith::FUNCTION_ADD,
    &arith::FUNCTION_SUBTRACT,
    &arith::FUNCTION_MULTIPLY,
    &arith::FUNCTION_DIVIDE,
    &arith::FUNCTION_NEGATE,
    &arith::FUNCTION_ABS,
    // String
    &string::FUNCTION_CONCAT,
    &string::FUNCTION_UPPER,
    &string::FUNCTION_LOWER,
    &string::FUNCTION_TRIM,
    &string::FUNCTION_LENGTH,
    &string::FUNCTION_SUBSTRING,
    &string::FUNCTION_REPLACE,
    &string::FUNCTION_SPLIT_COLUMNS,
    // Date time
    &datetime::FUNCTION_ADD_DAYS,
    &datetime::FUNCTION_DAY_OF_WEEK,
    &datetime::FUNCTION_TO_DATETIME,
    // Security
    &security::FUNCTION_ENCRYPT,
    &security::FUNCTION_DECRYPT,
    &security::FUNCTION_HASH,
    &security::FUNCTION_VALIDATE_HASH,
];
