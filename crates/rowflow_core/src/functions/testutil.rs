//! Helpers for binding functions in tests.
use super::bound::BoundFunction;
use super::catalog::FunctionCatalog;
use super::parameter::{ExecutionVariables, ParameterSpec};
use crate::config::transform::TransformConfig;
use crate::values::datatype::DataType;
use crate::values::row::Row;
use crate::values::scalar::ScalarValue;
use crate::values::schema::{ColumnDef, RowSchema};

pub fn schema(columns: &[(&str, DataType)]) -> RowSchema {
    RowSchema::try_from_columns(
        columns
            .iter()
            .map(|(name, datatype)| ColumnDef::new(*name, *datatype)),
    )
    .unwrap()
}

pub fn row(values: Vec<ScalarValue>) -> Row {
    Row::from(values)
}

/// Bind a builtin function with the default config, writing the return value
/// to "out" if the function has one.
pub fn bind(name: &str, schema: &RowSchema, inputs: Vec<ParameterSpec>) -> BoundFunction {
    bind_with_config(name, schema, inputs, &TransformConfig::default())
}

pub fn bind_with_config(
    name: &str,
    schema: &RowSchema,
    inputs: Vec<ParameterSpec>,
    config: &TransformConfig,
) -> BoundFunction {
    let mut descriptor = FunctionCatalog::builtin()
        .resolve(name)
        .unwrap()
        .with_inputs(inputs);
    if descriptor.definition().returns.is_some() {
        descriptor = descriptor.with_return("out");
    }
    descriptor.bind(schema, None, config).unwrap()
}

pub fn vars() -> ExecutionVariables {
    ExecutionVariables::default()
}

/// Invoke a map function against a single row, returning the value.
pub fn invoke_value(f: &mut BoundFunction, values: Vec<ScalarValue>) -> ScalarValue {
    f.invoke(&row(values), &vars()).unwrap().value
}
