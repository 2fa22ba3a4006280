//! Mapping operators.
//!
//! A mapping is one step of a pipeline stage: it resolves its inputs against
//! the stage's input schema once, appends its output columns to the output
//! schema, then processes rows. `MappingSet` drives a list of mappings over a
//! row stream.
mod column;
mod filter;
mod function;
mod series;
mod set;

pub use column::{MapColumn, MapGroup};
pub use filter::{MapFilter, MapJoin};
pub use function::{MapAggregate, MapFunction};
pub use series::{MapSeries, SeriesGrain};
pub use set::MappingSet;

use std::fmt::{self, Debug};

use rowflow_error::{Result, RowflowError};

use crate::config::transform::TransformConfig;
use crate::functions::FunctionOutput;
use crate::functions::bound::BoundFunction;
use crate::functions::parameter::{ExecutionVariables, ParamValue, ParameterSpec};
use crate::values::datatype::DataType;
use crate::values::row::Row;
use crate::values::scalar::ScalarValue;
use crate::values::schema::{ColumnDef, RowSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    Column,
    Group,
    Filter,
    Join,
    Aggregate,
    Function,
    Series,
}

impl MappingKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::Group => "group",
            Self::Filter => "filter",
            Self::Join => "join",
            Self::Aggregate => "aggregate",
            Self::Function => "function",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The row being processed along with its optional join row.
#[derive(Debug, Clone, Copy)]
pub struct InputRow<'a> {
    pub row: &'a Row,
    pub join: Option<&'a Row>,
    pub vars: &'a ExecutionVariables,
}

impl<'a> InputRow<'a> {
    pub fn new(row: &'a Row, vars: &'a ExecutionVariables) -> Self {
        InputRow {
            row,
            join: None,
            vars,
        }
    }

    pub fn with_join(mut self, join: &'a Row) -> Self {
        self.join = Some(join);
        self
    }

    pub fn try_join(&self) -> Result<&'a Row> {
        self.join
            .ok_or_else(|| RowflowError::runtime("Join mapping requires a join row"))
    }
}

pub trait Mapping: Debug + Send {
    fn kind(&self) -> MappingKind;

    /// Resolve input columns to ordinals.
    fn initialize_input_ordinals(
        &mut self,
        input: &RowSchema,
        join: Option<&RowSchema>,
        config: &TransformConfig,
    ) -> Result<()>;

    /// Append output columns, remembering their ordinals.
    fn add_output_columns(&mut self, output: &mut RowSchema) -> Result<()>;

    /// Read the input row. Returns false if the row should be dropped.
    fn process_input_row(&mut self, input: &InputRow) -> Result<bool>;

    /// Write values read from the last input row.
    fn process_output_row(&mut self, _output: &mut Row) -> Result<()> {
        Ok(())
    }

    /// If this mapping only gates rows. Conditions run with filters, before
    /// the row reaches any group state.
    fn is_condition(&self) -> bool {
        false
    }

    /// If this mapping reports through group result rows.
    fn is_aggregating(&self) -> bool {
        false
    }

    /// Number of result rows for the current group.
    fn result_count(&self) -> usize {
        0
    }

    /// Write the group result at `index`. Returns false if this mapping has
    /// no result at that index.
    fn process_result_row(&mut self, _index: usize, _output: &mut Row) -> Result<bool> {
        Ok(false)
    }

    /// If this mapping fans input rows out into generated rows.
    fn is_generator(&self) -> bool {
        false
    }

    /// Write the next row generated from the current input row. Returns false
    /// once the input row is exhausted.
    fn next_generated_row(&mut self, _input: &InputRow, _output: &mut Row) -> Result<bool> {
        Ok(false)
    }

    /// Start a new group.
    fn reset(&mut self) {}

    /// Value taking part in group boundary detection.
    fn group_value(&self) -> Option<&ScalarValue> {
        None
    }

    /// Normalized series key for the current row.
    fn series_value(&self) -> Option<&ScalarValue> {
        None
    }
}

/// Where a column or constant input comes from once resolved.
#[derive(Debug, Clone, PartialEq)]
enum ResolvedSource {
    Constant(ScalarValue),
    Column(usize),
}

impl ResolvedSource {
    fn try_new(spec: &ParameterSpec, schema: &RowSchema) -> Result<(Self, Option<DataType>)> {
        match spec {
            ParameterSpec::Constant(value) => Ok((Self::Constant(value.clone()), value.datatype())),
            ParameterSpec::Column(name) => {
                let (ordinal, column) = schema.try_column(name)?;
                Ok((Self::Column(ordinal), Some(column.datatype)))
            }
            other => Err(RowflowError::binding("Expected a column or constant")
                .with_field("spec", format!("{other:?}"))),
        }
    }

    fn read<'a>(&'a self, row: &'a Row) -> Result<&'a ScalarValue> {
        match self {
            Self::Constant(value) => Ok(value),
            Self::Column(ordinal) => row.try_get(*ordinal),
        }
    }
}

/// Output columns of a bound function.
#[derive(Debug, Clone, Default)]
struct FunctionColumns {
    returns: Option<(usize, DataType)>,
    /// Columns per declared output, empty for unused outputs.
    outputs: Vec<Vec<(usize, DataType)>>,
}

impl FunctionColumns {
    fn add_to_schema(function: &BoundFunction, output: &mut RowSchema) -> Result<Self> {
        let returns = match function.returns() {
            Some(ret) => Some((
                output.push(ColumnDef::new(ret.name.clone(), ret.datatype))?,
                ret.datatype,
            )),
            None => None,
        };

        let outputs = function
            .outputs()
            .iter()
            .map(|param| {
                param
                    .columns()
                    .iter()
                    .map(|col| {
                        let ordinal = output.push(ColumnDef::new(col.name.clone(), col.datatype))?;
                        Ok((ordinal, col.datatype))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FunctionColumns { returns, outputs })
    }

    fn write(&self, result: &FunctionOutput, row: &mut Row) -> Result<()> {
        if let Some((ordinal, datatype)) = self.returns {
            row.set(ordinal, result.value.cast_to(datatype)?)?;
        }

        for (columns, value) in self.outputs.iter().zip(&result.outputs) {
            match value {
                ParamValue::Scalar(value) => {
                    if let Some(&(ordinal, datatype)) = columns.first() {
                        row.set(ordinal, value.cast_to(datatype)?)?;
                    }
                }
                ParamValue::Group(values) => {
                    for (idx, &(ordinal, datatype)) in columns.iter().enumerate() {
                        let value = match values.get(idx) {
                            Some(value) => value.cast_to(datatype)?,
                            None => ScalarValue::Null,
                        };
                        row.set(ordinal, value)?;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Run a set over rows, collecting every emitted row.
    pub fn run(set: &mut MappingSet, rows: Vec<Vec<ScalarValue>>) -> Vec<Vec<ScalarValue>> {
        let mut out = Vec::new();
        for values in rows {
            for row in set.process_row(&Row::from(values), None).unwrap() {
                out.push(row.into_values());
            }
        }
        for row in set.finish().unwrap() {
            out.push(row.into_values());
        }
        out
    }
}
