use rowflow_error::{Result, RowflowError};
use tracing::debug;

use super::{FunctionColumns, InputRow, Mapping, MappingKind};
use crate::config::transform::TransformConfig;
use crate::functions::bound::BoundFunction;
use crate::functions::descriptor::FunctionDescriptor;
use crate::functions::parameter::ParamValue;
use crate::functions::profile::ProfileResult;
use crate::functions::{FunctionKind, FunctionOutput};
use crate::values::datatype::DataType;
use crate::values::row::Row;
use crate::values::scalar::ScalarValue;
use crate::values::schema::{ColumnDef, RowSchema};

/// Applies a function of any kind to each input row.
///
/// - Map and validate functions write their results to the output row.
/// - Conditions gate the row, optionally negated.
/// - Rows functions fan the input row out into generated rows.
/// - Aggregate, series and profile functions accumulate and write their
///   results to group result rows. Profile functions with distribution
///   columns write one result row per distinct value.
#[derive(Debug)]
pub struct MapFunction {
    descriptor: FunctionDescriptor,
    generic_override: Option<DataType>,
    negate: bool,
    function: Option<BoundFunction>,
    columns: FunctionColumns,
    /// Result for the last input row, written by `process_output_row`.
    pending: Option<FunctionOutput>,
    distribution: Option<DistributionColumns>,
    /// Detailed profile of the current group, built on first result row.
    profile: Option<ProfileResult>,
}

/// Value and count columns of a detailed profile.
#[derive(Debug, Clone)]
struct DistributionColumns {
    value_name: String,
    count_name: String,
    ordinals: Option<(usize, usize)>,
}

impl MapFunction {
    pub fn new(descriptor: FunctionDescriptor) -> Self {
        MapFunction {
            descriptor,
            generic_override: None,
            negate: false,
            function: None,
            columns: FunctionColumns::default(),
            pending: None,
            distribution: None,
            profile: None,
        }
    }

    pub fn with_generic_override(mut self, datatype: DataType) -> Self {
        self.generic_override = Some(datatype);
        self
    }

    /// Write the value distribution of a profile function, one value and its
    /// count per result row. Values are written as text.
    pub fn with_distribution(
        mut self,
        value_name: impl Into<String>,
        count_name: impl Into<String>,
    ) -> Self {
        self.distribution = Some(DistributionColumns {
            value_name: value_name.into(),
            count_name: count_name.into(),
            ordinals: None,
        });
        self
    }

    /// Keep rows where the condition is false instead.
    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    pub fn function_kind(&self) -> FunctionKind {
        self.descriptor.definition().kind
    }

    fn try_function(&mut self) -> Result<&mut BoundFunction> {
        let name = self.descriptor.definition().name;
        self.function.as_mut().ok_or_else(|| {
            RowflowError::new("Function mapping not initialized").with_field("function", name)
        })
    }
}

impl Mapping for MapFunction {
    fn kind(&self) -> MappingKind {
        MappingKind::Function
    }

    fn initialize_input_ordinals(
        &mut self,
        input: &RowSchema,
        _join: Option<&RowSchema>,
        config: &TransformConfig,
    ) -> Result<()> {
        let function = self.descriptor.bind(input, self.generic_override, config)?;
        debug!(
            function = %function.definition().qualified_name(),
            kind = %function.kind(),
            "initialized function mapping"
        );
        self.function = Some(function);
        Ok(())
    }

    fn add_output_columns(&mut self, output: &mut RowSchema) -> Result<()> {
        let function = self.try_function()?;
        let kind = function.kind();
        let columns = FunctionColumns::add_to_schema(function, output)?;
        self.columns = columns;

        if let Some(distribution) = &mut self.distribution {
            if kind != FunctionKind::Profile {
                return Err(RowflowError::binding(
                    "Distribution columns require a profile function",
                )
                .with_field("function", self.descriptor.definition().qualified_name())
                .with_field("kind", kind));
            }
            let value = output.push(ColumnDef::new(
                distribution.value_name.clone(),
                DataType::Utf8,
            ))?;
            let count = output.push(ColumnDef::new(
                distribution.count_name.clone(),
                DataType::Int64,
            ))?;
            distribution.ordinals = Some((value, count));
        }
        Ok(())
    }

    fn process_input_row(&mut self, input: &InputRow) -> Result<bool> {
        let negate = self.negate;
        let function = self.try_function()?;
        match function.kind() {
            FunctionKind::Map => {
                let out = function.invoke(input.row, input.vars)?;
                self.pending = Some(out);
                Ok(true)
            }
            FunctionKind::Condition => {
                let matched = function.evaluate_condition(input.row, input.vars)?;
                Ok(matched != negate)
            }
            FunctionKind::Validate => {
                let outcome = function.check(input.row, input.vars)?;
                self.pending = Some(FunctionOutput::with_outputs(
                    outcome.value,
                    vec![ParamValue::Scalar(outcome.valid.into())],
                ));
                Ok(true)
            }
            FunctionKind::Rows => {
                // New input row.
                function.reset();
                Ok(true)
            }
            FunctionKind::Aggregate | FunctionKind::Series | FunctionKind::Profile => {
                function.accumulate(input.row, input.vars)?;
                Ok(true)
            }
        }
    }

    fn process_output_row(&mut self, output: &mut Row) -> Result<()> {
        match self.pending.take() {
            Some(result) => self.columns.write(&result, output),
            None => Ok(()),
        }
    }

    fn is_condition(&self) -> bool {
        self.function_kind() == FunctionKind::Condition
    }

    fn is_aggregating(&self) -> bool {
        matches!(
            self.function_kind(),
            FunctionKind::Aggregate | FunctionKind::Series | FunctionKind::Profile
        )
    }

    fn result_count(&self) -> usize {
        match &self.function {
            Some(f) if f.kind() == FunctionKind::Profile => {
                if self.distribution.is_none() {
                    return 1;
                }
                // Errors surface from process_result_row.
                let values = match &self.profile {
                    Some(profile) => profile.distribution.as_ref().map(Vec::len),
                    None => f
                        .profile_result(true)
                        .ok()
                        .and_then(|profile| profile.distribution.map(|d| d.len())),
                };
                values.unwrap_or(0).max(1)
            }
            Some(f) => f.result_count(),
            None => 0,
        }
    }

    fn process_result_row(&mut self, index: usize, output: &mut Row) -> Result<bool> {
        if index >= self.result_count() {
            return Ok(false);
        }
        if self.distribution.is_some() && self.function_kind() == FunctionKind::Profile {
            if self.profile.is_none() {
                let profile = self.try_function()?.profile_result(true)?;
                self.profile = Some(profile);
            }
            return self.write_distribution_row(index, output);
        }

        let function = self.try_function()?;
        let result = match function.kind() {
            FunctionKind::Aggregate | FunctionKind::Series => function.result(index)?,
            FunctionKind::Profile => {
                FunctionOutput::value(function.profile_result(false)?.summary)
            }
            _ => return Ok(false),
        };
        self.columns.write(&result, output)?;
        Ok(true)
    }

    fn is_generator(&self) -> bool {
        self.function_kind() == FunctionKind::Rows
    }

    fn next_generated_row(&mut self, input: &InputRow, output: &mut Row) -> Result<bool> {
        if !self.is_generator() {
            return Ok(false);
        }
        let function = self.try_function()?;
        match function.next(input.row, input.vars)? {
            Some(result) => {
                self.columns.write(&result, output)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn reset(&mut self) {
        if let Some(function) = &mut self.function {
            function.reset();
        }
        self.pending = None;
        self.profile = None;
    }
}

impl MapFunction {
    fn write_distribution_row(&self, index: usize, output: &mut Row) -> Result<bool> {
        let (Some(profile), Some(columns)) = (&self.profile, &self.distribution) else {
            return Ok(false);
        };
        self.columns
            .write(&FunctionOutput::value(profile.summary.clone()), output)?;

        let Some((value_ordinal, count_ordinal)) = columns.ordinals else {
            return Ok(true);
        };
        let entry = profile
            .distribution
            .as_ref()
            .and_then(|distribution| distribution.get(index));
        let (value, count) = match entry {
            Some((value, count)) if value.is_null() => (ScalarValue::Null, *count),
            Some((value, count)) => (value.cast_to(DataType::Utf8)?, *count),
            // Empty distribution still reports the summary.
            None => (ScalarValue::Null, 0),
        };
        output.set(value_ordinal, value)?;
        output.set(count_ordinal, ScalarValue::Int64(count as i64))?;
        Ok(true)
    }
}

/// Accumulates rows into an aggregate function, writing the result once per
/// group.
#[derive(Debug)]
pub struct MapAggregate {
    inner: MapFunction,
}

impl MapAggregate {
    pub fn new(descriptor: FunctionDescriptor) -> Self {
        MapAggregate {
            inner: MapFunction::new(descriptor),
        }
    }

    pub fn with_generic_override(mut self, datatype: DataType) -> Self {
        self.inner = self.inner.with_generic_override(datatype);
        self
    }
}

impl Mapping for MapAggregate {
    fn kind(&self) -> MappingKind {
        MappingKind::Aggregate
    }

    fn initialize_input_ordinals(
        &mut self,
        input: &RowSchema,
        join: Option<&RowSchema>,
        config: &TransformConfig,
    ) -> Result<()> {
        let kind = self.inner.function_kind();
        if kind != FunctionKind::Aggregate {
            return Err(RowflowError::binding("Aggregate mapping requires an aggregate function")
                .with_field("function", self.inner.descriptor.definition().qualified_name())
                .with_field("kind", kind));
        }
        self.inner.initialize_input_ordinals(input, join, config)
    }

    fn add_output_columns(&mut self, output: &mut RowSchema) -> Result<()> {
        self.inner.add_output_columns(output)
    }

    fn process_input_row(&mut self, input: &InputRow) -> Result<bool> {
        self.inner.process_input_row(input)
    }

    fn is_aggregating(&self) -> bool {
        true
    }

    fn result_count(&self) -> usize {
        self.inner.result_count()
    }

    fn process_result_row(&mut self, index: usize, output: &mut Row) -> Result<bool> {
        self.inner.process_result_row(index, output)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::catalog::FunctionCatalog;
    use crate::functions::parameter::{ExecutionVariables, ParameterSpec};
    use crate::functions::testutil::schema;

    fn descriptor(name: &str) -> FunctionDescriptor {
        FunctionCatalog::builtin().resolve(name).unwrap()
    }

    fn init(m: &mut dyn Mapping, input: &RowSchema) -> RowSchema {
        let mut output = RowSchema::new();
        m.initialize_input_ordinals(input, None, &TransformConfig::default())
            .unwrap();
        m.add_output_columns(&mut output).unwrap();
        output
    }

    #[test]
    fn map_writes_return_and_outputs() {
        let input = schema(&[("full", DataType::Utf8)]);
        let mut m = MapFunction::new(
            descriptor("string.split_columns")
                .with_input(ParameterSpec::column("full"))
                .with_input(ParameterSpec::constant(" "))
                .with_output(ParameterSpec::output_group(["first", "last"])),
        );
        let output = init(&mut m, &input);
        assert_eq!(vec!["first", "last"], output.names().collect::<Vec<_>>());

        let vars = ExecutionVariables::default();
        let row = Row::from(vec!["Ada Lovelace".into()]);
        assert!(m.process_input_row(&InputRow::new(&row, &vars)).unwrap());
        let mut out = Row::new_null(output.len());
        m.process_output_row(&mut out).unwrap();
        assert_eq!(&[ScalarValue::from("Ada"), ScalarValue::from("Lovelace")], out.values());
    }

    #[test]
    fn condition_gates() {
        let input = schema(&[("v", DataType::Int32)]);
        let cond = || {
            descriptor("condition.is_null").with_input(ParameterSpec::column("v"))
        };
        let mut is_null = MapFunction::new(cond());
        let mut not_null = MapFunction::new(cond()).negated();
        init(&mut is_null, &input);
        init(&mut not_null, &input);

        let vars = ExecutionVariables::default();
        let row = Row::from(vec![ScalarValue::Null]);
        assert!(is_null.process_input_row(&InputRow::new(&row, &vars)).unwrap());
        assert!(!not_null.process_input_row(&InputRow::new(&row, &vars)).unwrap());
    }

    #[test]
    fn validate_writes_value_and_flag() {
        let input = schema(&[("s", DataType::Utf8)]);
        let mut m = MapFunction::new(
            descriptor("validate.max_length")
                .with_input(ParameterSpec::column("s"))
                .with_input(ParameterSpec::constant(2))
                .with_return("s_checked")
                .with_output(ParameterSpec::output("s_valid")),
        );
        let output = init(&mut m, &input);

        let vars = ExecutionVariables::default();
        let row = Row::from(vec!["abc".into()]);
        m.process_input_row(&InputRow::new(&row, &vars)).unwrap();
        let mut out = Row::new_null(output.len());
        m.process_output_row(&mut out).unwrap();
        assert_eq!(&[ScalarValue::from("ab"), ScalarValue::Boolean(false)], out.values());
    }

    #[test]
    fn aggregate_requires_aggregate_kind() {
        let input = schema(&[("v", DataType::Int32)]);
        let mut m = MapAggregate::new(
            descriptor("arithmetic.negate")
                .with_input(ParameterSpec::column("v"))
                .with_return("n"),
        );
        let err = m
            .initialize_input_ordinals(&input, None, &TransformConfig::default())
            .unwrap_err();
        assert!(err.is_binding());
    }

    #[test]
    fn rows_generate() {
        let input = schema(&[("csv", DataType::Utf8)]);
        let mut m = MapFunction::new(
            descriptor("rows.split_rows")
                .with_input(ParameterSpec::column("csv"))
                .with_return("part"),
        );
        let output = init(&mut m, &input);
        assert!(m.is_generator());

        let vars = ExecutionVariables::default();
        let row = Row::from(vec!["a,b".into()]);
        let input_row = InputRow::new(&row, &vars);
        m.process_input_row(&input_row).unwrap();

        let mut got = Vec::new();
        let mut out = Row::new_null(output.len());
        while m.next_generated_row(&input_row, &mut out).unwrap() {
            got.push(out.values()[0].clone());
        }
        assert_eq!(vec![ScalarValue::from("a"), ScalarValue::from("b")], got);
    }

    #[test]
    fn profile_distribution_rows() {
        let input = schema(&[("v", DataType::Utf8)]);
        let mut m = MapFunction::new(
            descriptor("profile.distinct_count")
                .with_input(ParameterSpec::column("v"))
                .with_return("distinct"),
        )
        .with_distribution("value", "count");
        let output = init(&mut m, &input);
        assert_eq!(
            vec!["distinct", "value", "count"],
            output.names().collect::<Vec<_>>()
        );

        let vars = ExecutionVariables::default();
        for v in ["a", "b", "a"] {
            let row = Row::from(vec![v.into()]);
            m.process_input_row(&InputRow::new(&row, &vars)).unwrap();
        }
        assert_eq!(2, m.result_count());

        let mut got = Vec::new();
        for index in 0..m.result_count() {
            let mut out = Row::new_null(output.len());
            assert!(m.process_result_row(index, &mut out).unwrap());
            got.push(out.into_values());
        }
        assert_eq!(
            vec![
                vec![ScalarValue::Int64(2), "a".into(), ScalarValue::Int64(2)],
                vec![ScalarValue::Int64(2), "b".into(), ScalarValue::Int64(1)],
            ],
            got
        );

        m.reset();
        assert_eq!(1, m.result_count());
    }

    #[test]
    fn distribution_requires_profile() {
        let input = schema(&[("v", DataType::Int32)]);
        let mut m = MapFunction::new(
            descriptor("aggregate.sum")
                .with_input(ParameterSpec::column("v"))
                .with_return("total"),
        )
        .with_distribution("value", "count");
        m.initialize_input_ordinals(&input, None, &TransformConfig::default())
            .unwrap();
        let err = m.add_output_columns(&mut RowSchema::new()).unwrap_err();
        assert!(err.is_binding());
    }
}
