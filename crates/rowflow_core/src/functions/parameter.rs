use rowflow_error::{Result, RowflowError};
use serde::{Deserialize, Serialize};

use crate::values::datatype::DataType;
use crate::values::row::Row;
use crate::values::scalar::ScalarValue;

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// The function's resolved generic type.
    Generic,
    Fixed(DataType),
    /// Values are passed through without conversion.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    /// Ordered group of values.
    ///
    /// Groups sharing a link name must have the same cardinality.
    Group { link: Option<&'static str> },
}

/// Default for a parameter, usable in const definitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Utf8(&'static str),
}

impl DefaultValue {
    pub fn to_scalar(&self) -> ScalarValue {
        match self {
            Self::Null => ScalarValue::Null,
            Self::Boolean(v) => ScalarValue::Boolean(*v),
            Self::Int(v) => ScalarValue::Int64(*v),
            Self::Float(v) => ScalarValue::Float64(*v),
            Self::Utf8(v) => ScalarValue::Utf8(v.to_string()),
        }
    }
}

/// Declared input or output of a function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDef {
    pub name: &'static str,
    pub datatype: ParamType,
    pub arity: Arity,
    pub default: Option<DefaultValue>,
}

impl ParameterDef {
    pub const fn single(name: &'static str, datatype: ParamType) -> Self {
        ParameterDef {
            name,
            datatype,
            arity: Arity::Single,
            default: None,
        }
    }

    pub const fn group(name: &'static str, datatype: ParamType) -> Self {
        ParameterDef {
            name,
            datatype,
            arity: Arity::Group { link: None },
            default: None,
        }
    }

    pub const fn linked(name: &'static str, datatype: ParamType, link: &'static str) -> Self {
        ParameterDef {
            name,
            datatype,
            arity: Arity::Group { link: Some(link) },
            default: None,
        }
    }

    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn is_group(&self) -> bool {
        matches!(self.arity, Arity::Group { .. })
    }

    pub const fn link(&self) -> Option<&'static str> {
        match self.arity {
            Arity::Group { link } => link,
            Arity::Single => None,
        }
    }
}

/// Variables injected by the executing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    RowIndex,
    SeriesKey,
}

/// Caller supplied binding for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterSpec {
    Constant(ScalarValue),
    Column(String),
    Group(Vec<ParameterSpec>),
    OutputColumn(String),
    Variable(VariableKind),
}

impl ParameterSpec {
    pub fn constant(value: impl Into<ScalarValue>) -> Self {
        ParameterSpec::Constant(value.into())
    }

    pub fn column(name: impl Into<String>) -> Self {
        ParameterSpec::Column(name.into())
    }

    pub fn output(name: impl Into<String>) -> Self {
        ParameterSpec::OutputColumn(name.into())
    }

    pub fn output_group<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        ParameterSpec::Group(names.into_iter().map(Self::output).collect())
    }
}

/// Parameter resolved against a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParameter {
    Constant(ScalarValue),
    Column {
        ordinal: usize,
        datatype: DataType,
        /// Type values are converted to when read, if different from the
        /// column's.
        cast: Option<DataType>,
    },
    /// Column carrying a list per row, supplying a group.
    ArrayColumn {
        ordinal: usize,
        datatype: DataType,
        cast: Option<DataType>,
    },
    Group(Vec<BoundParameter>),
    Variable(VariableKind),
}

impl BoundParameter {
    pub fn as_constant(&self) -> Option<&ScalarValue> {
        match self {
            Self::Constant(v) => Some(v),
            _ => None,
        }
    }

    /// Cardinality if known at bind.
    pub fn group_len(&self) -> Option<usize> {
        match self {
            Self::Group(params) => Some(params.len()),
            _ => None,
        }
    }

    pub fn evaluate(&self, row: &Row, vars: &ExecutionVariables) -> Result<ParamValue> {
        Ok(match self {
            Self::Group(params) => ParamValue::Group(
                params
                    .iter()
                    .map(|p| p.evaluate_scalar(row, vars))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Self::ArrayColumn { ordinal, cast, .. } => {
                let values = match row.try_get(*ordinal)? {
                    ScalarValue::Null => Vec::new(),
                    ScalarValue::List(values) => values.clone(),
                    other => vec![other.clone()],
                };
                match cast {
                    Some(datatype) => ParamValue::Group(
                        values
                            .iter()
                            .map(|v| v.cast_to(*datatype))
                            .collect::<Result<Vec<_>>>()?,
                    ),
                    None => ParamValue::Group(values),
                }
            }
            _ => ParamValue::Scalar(self.evaluate_scalar(row, vars)?),
        })
    }

    fn evaluate_scalar(&self, row: &Row, vars: &ExecutionVariables) -> Result<ScalarValue> {
        match self {
            Self::Constant(v) => Ok(v.clone()),
            Self::Column { ordinal, cast, .. } => {
                let value = row.try_get(*ordinal)?;
                match cast {
                    Some(datatype) => value.cast_to(*datatype),
                    None => Ok(value.clone()),
                }
            }
            Self::Variable(VariableKind::RowIndex) => Ok(ScalarValue::UInt64(vars.row_index)),
            Self::Variable(VariableKind::SeriesKey) => {
                Ok(vars.series_key.clone().unwrap_or(ScalarValue::Null))
            }
            Self::Group(_) | Self::ArrayColumn { .. } => {
                Err(RowflowError::new("Group parameter evaluated as a single value"))
            }
        }
    }
}

/// Output column bound from an output spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundOutput {
    pub name: String,
    pub datatype: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundOutputParam {
    /// Declared output the caller didn't bind, values are discarded.
    Unused,
    Single(BoundOutput),
    Group(Vec<BoundOutput>),
}

impl BoundOutputParam {
    pub fn group_len(&self) -> Option<usize> {
        match self {
            Self::Group(outputs) => Some(outputs.len()),
            _ => None,
        }
    }

    pub fn columns(&self) -> &[BoundOutput] {
        match self {
            Self::Unused => &[],
            Self::Single(output) => std::slice::from_ref(output),
            Self::Group(outputs) => outputs,
        }
    }
}

/// Runtime value for a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(ScalarValue),
    Group(Vec<ScalarValue>),
}

impl ParamValue {
    pub fn try_as_scalar(&self) -> Result<&ScalarValue> {
        match self {
            Self::Scalar(v) => Ok(v),
            Self::Group(_) => Err(RowflowError::new("Expected a single value, got a group")),
        }
    }

    pub fn try_as_group(&self) -> Result<&[ScalarValue]> {
        match self {
            Self::Group(v) => Ok(v),
            Self::Scalar(_) => Err(RowflowError::new("Expected a group, got a single value")),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Group(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Variables supplied by the stage driving a function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionVariables {
    /// Index of the current input row.
    pub row_index: u64,
    /// Current normalized series key.
    pub series_key: Option<ScalarValue>,
}

/// Get an argument by position.
pub(crate) fn arg(args: &[ParamValue], idx: usize) -> Result<&ScalarValue> {
    args.get(idx)
        .ok_or_else(|| RowflowError::new("Missing function argument").with_field("index", idx))?
        .try_as_scalar()
}

pub(crate) fn group_arg(args: &[ParamValue], idx: usize) -> Result<&[ScalarValue]> {
    args.get(idx)
        .ok_or_else(|| RowflowError::new("Missing function argument").with_field("index", idx))?
        .try_as_group()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_array_column() {
        let row = Row::from(vec![
            ScalarValue::List(vec![ScalarValue::from("1"), ScalarValue::from("2")]),
            ScalarValue::Null,
        ]);
        let vars = ExecutionVariables::default();

        let param = BoundParameter::ArrayColumn {
            ordinal: 0,
            datatype: DataType::Utf8,
            cast: Some(DataType::Int32),
        };
        assert_eq!(
            ParamValue::Group(vec![ScalarValue::Int32(1), ScalarValue::Int32(2)]),
            param.evaluate(&row, &vars).unwrap()
        );

        let param = BoundParameter::ArrayColumn {
            ordinal: 1,
            datatype: DataType::Utf8,
            cast: None,
        };
        assert_eq!(ParamValue::Group(Vec::new()), param.evaluate(&row, &vars).unwrap());
    }

    #[test]
    fn evaluate_variables() {
        let row = Row::new_null(0);
        let vars = ExecutionVariables {
            row_index: 7,
            series_key: Some(ScalarValue::Int64(3)),
        };

        let got = BoundParameter::Variable(VariableKind::RowIndex)
            .evaluate(&row, &vars)
            .unwrap();
        assert_eq!(ParamValue::Scalar(ScalarValue::UInt64(7)), got);

        let got = BoundParameter::Variable(VariableKind::SeriesKey)
            .evaluate(&row, &vars)
            .unwrap();
        assert_eq!(ParamValue::Scalar(ScalarValue::Int64(3)), got);
    }

    #[test]
    fn spec_serde() {
        let spec = ParameterSpec::Group(vec![
            ParameterSpec::column("a"),
            ParameterSpec::constant(4),
            ParameterSpec::Variable(VariableKind::RowIndex),
        ]);
        let s = serde_json::to_string(&spec).unwrap();
        let got: ParameterSpec = serde_json::from_str(&s).unwrap();
        assert_eq!(spec, got);
    }
}
