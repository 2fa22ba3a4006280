//! Invocation of bound functions.
use rowflow_error::{Result, RowflowError};

use super::parameter::{
    BoundOutput,
    BoundOutputParam,
    BoundParameter,
    ExecutionVariables,
    ParamValue,
};
use super::profile::ProfileResult;
use super::validate::ValidationOutcome;
use super::{FunctionDefinition, FunctionImpl, FunctionKind, FunctionOutput};
use crate::values::datatype::DataType;
use crate::values::row::Row;
use crate::values::scalar::ScalarValue;

/// Linked parameters whose cardinality is only known per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundLink {
    pub name: &'static str,
    pub inputs: Vec<usize>,
    pub outputs: Vec<usize>,
    /// If any input is an array column.
    pub dynamic: bool,
}

impl BoundLink {
    pub(crate) fn new(name: &'static str) -> Self {
        BoundLink {
            name,
            inputs: Vec::new(),
            outputs: Vec::new(),
            dynamic: false,
        }
    }
}

/// A function bound to a schema, invoked many times.
#[derive(Debug)]
pub struct BoundFunction {
    pub(crate) definition: &'static FunctionDefinition,
    pub(crate) datatype: DataType,
    pub(crate) inputs: Vec<BoundParameter>,
    pub(crate) returns: Option<BoundOutput>,
    pub(crate) outputs: Vec<BoundOutputParam>,
    pub(crate) links: Vec<BoundLink>,
    pub(crate) function: FunctionImpl,
}

impl BoundFunction {
    pub fn definition(&self) -> &'static FunctionDefinition {
        self.definition
    }

    pub fn kind(&self) -> FunctionKind {
        self.definition.kind
    }

    /// Resolved generic type.
    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn inputs(&self) -> &[BoundParameter] {
        &self.inputs
    }

    pub fn returns(&self) -> Option<&BoundOutput> {
        self.returns.as_ref()
    }

    pub fn outputs(&self) -> &[BoundOutputParam] {
        &self.outputs
    }

    /// Evaluate the inputs for a row.
    pub fn evaluate_args(&self, row: &Row, vars: &ExecutionVariables) -> Result<Vec<ParamValue>> {
        let args = self
            .inputs
            .iter()
            .map(|param| param.evaluate(row, vars))
            .collect::<Result<Vec<_>>>()?;
        self.check_links(&args)?;
        Ok(args)
    }

    fn check_links(&self, args: &[ParamValue]) -> Result<()> {
        for link in &self.links {
            let lens = link
                .inputs
                .iter()
                .map(|&idx| args[idx].len())
                .chain(link.outputs.iter().filter_map(|&idx| self.outputs[idx].group_len()));

            let mut expected = None;
            for len in lens {
                match expected {
                    None => expected = Some(len),
                    Some(expected) if expected != len => {
                        return Err(RowflowError::runtime(
                            "Linked parameters have different cardinality",
                        )
                        .with_field("function", self.definition.qualified_name())
                        .with_field("link", link.name)
                        .with_field("expected", expected)
                        .with_field("got", len));
                    }
                    Some(_) => (),
                }
            }
        }
        Ok(())
    }

    /// Invoke a map or condition function.
    pub fn invoke(&mut self, row: &Row, vars: &ExecutionVariables) -> Result<FunctionOutput> {
        let args = self.evaluate_args(row, vars)?;
        match &self.function {
            FunctionImpl::Map(f) | FunctionImpl::Condition(f) => f.execute(&args),
            _ => Err(kind_error(self.definition, "invoke")),
        }
    }

    /// Evaluate a condition. Null results are treated as false.
    pub fn evaluate_condition(&mut self, row: &Row, vars: &ExecutionVariables) -> Result<bool> {
        if !matches!(self.function, FunctionImpl::Condition(_)) {
            return Err(kind_error(self.definition, "evaluate_condition"));
        }
        match self.invoke(row, vars)?.value {
            ScalarValue::Null => Ok(false),
            value => value.try_as_bool(),
        }
    }

    /// Reset accumulated state.
    ///
    /// A no-op for stateless kinds.
    pub fn reset(&mut self) {
        match &mut self.function {
            FunctionImpl::Aggregate(f) => f.reset(),
            FunctionImpl::Rows(f) => f.reset(),
            FunctionImpl::Series(f) => f.reset(),
            FunctionImpl::Profile(f) => f.reset(),
            FunctionImpl::Map(_) | FunctionImpl::Condition(_) | FunctionImpl::Validate(_) => (),
        }
    }

    /// Accumulate a row into an aggregate, series or profile function.
    ///
    /// Series functions read the key from `vars.series_key`.
    pub fn accumulate(&mut self, row: &Row, vars: &ExecutionVariables) -> Result<()> {
        let args = self.evaluate_args(row, vars)?;
        match &mut self.function {
            FunctionImpl::Aggregate(f) => f.update(&args),
            FunctionImpl::Profile(f) => f.update(&args),
            FunctionImpl::Series(f) => {
                let key = vars.series_key.as_ref().ok_or_else(|| {
                    RowflowError::runtime("Series function requires a series key")
                        .with_field("function", self.definition.qualified_name())
                })?;
                f.update(key, &args)
            }
            _ => Err(kind_error(self.definition, "accumulate")),
        }
    }

    /// Get the result for an aggregate or series function.
    ///
    /// `index` is the position within the group for positional results.
    pub fn result(&mut self, index: usize) -> Result<FunctionOutput> {
        match &mut self.function {
            FunctionImpl::Aggregate(f) => f.finalize(index),
            FunctionImpl::Series(f) => f.finalize(index),
            _ => Err(kind_error(self.definition, "result")),
        }
    }

    /// Number of results `result` can produce for the current group.
    ///
    /// Zero for kinds without positional results.
    pub fn result_count(&self) -> usize {
        match &self.function {
            FunctionImpl::Aggregate(f) => f.result_count(),
            FunctionImpl::Series(f) => f.result_count(),
            _ => 0,
        }
    }

    /// Get the next output for a rows function.
    ///
    /// Returns None once the current input row is exhausted. Call `reset`
    /// before moving to the next input row.
    pub fn next(&mut self, row: &Row, vars: &ExecutionVariables) -> Result<Option<FunctionOutput>> {
        let args = self.evaluate_args(row, vars)?;
        match &mut self.function {
            FunctionImpl::Rows(f) => f.next(&args),
            _ => Err(kind_error(self.definition, "next")),
        }
    }

    pub fn check(&mut self, row: &Row, vars: &ExecutionVariables) -> Result<ValidationOutcome> {
        let args = self.evaluate_args(row, vars)?;
        match &self.function {
            FunctionImpl::Validate(f) => Ok(f.check(&args)),
            _ => Err(kind_error(self.definition, "check")),
        }
    }

    pub fn profile_result(&self, detailed: bool) -> Result<ProfileResult> {
        match &self.function {
            FunctionImpl::Profile(f) => f.finalize(detailed),
            _ => Err(kind_error(self.definition, "profile_result")),
        }
    }
}

fn kind_error(definition: &FunctionDefinition, operation: &str) -> RowflowError {
    RowflowError::runtime("Operation not supported by function kind")
        .with_field("function", definition.qualified_name())
        .with_field("kind", definition.kind)
        .with_field("operation", operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, row, schema};

    #[test]
    fn kind_misuse_is_runtime_error() {
        let schema = schema(&[("a", DataType::Int32)]);
        let mut f = bind(
            "arithmetic.negate",
            &schema,
            vec![ParameterSpec::column("a")],
        );
        let err = f.result(0).unwrap_err();
        assert!(err.is_runtime());
        assert_eq!(Some("arithmetic.negate"), err.get_field("function"));
        assert_eq!(Some("map"), err.get_field("kind"));

        let mut f = bind("aggregate.sum", &schema, vec![ParameterSpec::column("a")]);
        let err = f.invoke(&row(vec![1.into()]), &ExecutionVariables::default());
        assert!(err.unwrap_err().is_runtime());
    }

    #[test]
    fn condition_null_is_false() {
        let schema = schema(&[("a", DataType::Int32)]);
        let mut f = bind(
            "condition.greater_than",
            &schema,
            vec![ParameterSpec::column("a"), ParameterSpec::constant(3)],
        );
        let vars = ExecutionVariables::default();
        assert!(f.evaluate_condition(&row(vec![4.into()]), &vars).unwrap());
        assert!(!f.evaluate_condition(&row(vec![ScalarValue::Null]), &vars).unwrap());
    }

    #[test]
    fn series_requires_key() {
        let schema = schema(&[("a", DataType::Int32)]);
        let mut f = bind(
            "series.moving_sum",
            &schema,
            vec![ParameterSpec::column("a")],
        );
        let err = f
            .accumulate(&row(vec![1.into()]), &ExecutionVariables::default())
            .unwrap_err();
        assert!(err.is_runtime());
    }
}
