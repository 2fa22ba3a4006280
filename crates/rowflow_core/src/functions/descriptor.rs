use rowflow_error::Result;

use super::FunctionDefinition;
use super::bind::bind_function;
use super::bound::BoundFunction;
use super::parameter::ParameterSpec;
use crate::config::transform::TransformConfig;
use crate::values::datatype::DataType;
use crate::values::schema::RowSchema;

/// A function definition along with caller supplied parameter specs.
///
/// Produced by the catalog, filled in by the caller, then bound against a
/// schema.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    definition: &'static FunctionDefinition,
    inputs: Vec<ParameterSpec>,
    return_column: Option<String>,
    outputs: Vec<ParameterSpec>,
}

impl FunctionDescriptor {
    pub fn new(definition: &'static FunctionDefinition) -> Self {
        FunctionDescriptor {
            definition,
            inputs: Vec::new(),
            return_column: None,
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, spec: ParameterSpec) -> Self {
        self.inputs.push(spec);
        self
    }

    pub fn with_inputs(mut self, specs: impl IntoIterator<Item = ParameterSpec>) -> Self {
        self.inputs.extend(specs);
        self
    }

    /// Name of the column receiving the return value.
    pub fn with_return(mut self, column: impl Into<String>) -> Self {
        self.return_column = Some(column.into());
        self
    }

    pub fn with_output(mut self, spec: ParameterSpec) -> Self {
        self.outputs.push(spec);
        self
    }

    pub fn definition(&self) -> &'static FunctionDefinition {
        self.definition
    }

    pub fn inputs(&self) -> &[ParameterSpec] {
        &self.inputs
    }

    pub fn return_column(&self) -> Option<&str> {
        self.return_column.as_deref()
    }

    pub fn outputs(&self) -> &[ParameterSpec] {
        &self.outputs
    }

    /// Bind against a schema.
    ///
    /// `generic_override` fixes the generic type instead of inferring it
    /// from the inputs.
    pub fn bind(
        &self,
        schema: &RowSchema,
        generic_override: Option<DataType>,
        config: &TransformConfig,
    ) -> Result<BoundFunction> {
        bind_function(self, schema, generic_override, config)
    }
}
