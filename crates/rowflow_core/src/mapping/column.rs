use rowflow_error::{Result, RowflowError};

use super::{InputRow, Mapping, MappingKind, ResolvedSource};
use crate::config::transform::TransformConfig;
use crate::functions::parameter::ParameterSpec;
use crate::values::datatype::DataType;
use crate::values::row::Row;
use crate::values::scalar::ScalarValue;
use crate::values::schema::{ColumnDef, ColumnRole, RowSchema};

/// Copies a column or constant into an output column.
#[derive(Debug)]
pub struct MapColumn {
    source: ParameterSpec,
    output_name: String,
    /// Output type. Taken from the source when not given.
    datatype: Option<DataType>,
    role: ColumnRole,
    resolved: Option<ResolvedSource>,
    /// Set if values need converting to the output type.
    cast: Option<DataType>,
    output_ordinal: Option<usize>,
    current: ScalarValue,
}

impl MapColumn {
    pub fn column(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(ParameterSpec::column(input), output)
    }

    pub fn constant(value: impl Into<ScalarValue>, output: impl Into<String>) -> Self {
        Self::new(ParameterSpec::constant(value), output)
    }

    pub fn new(source: ParameterSpec, output: impl Into<String>) -> Self {
        MapColumn {
            source,
            output_name: output.into(),
            datatype: None,
            role: ColumnRole::Attribute,
            resolved: None,
            cast: None,
            output_ordinal: None,
            current: ScalarValue::Null,
        }
    }

    /// Convert values to `datatype` instead of keeping the source type.
    pub fn with_datatype(mut self, datatype: DataType) -> Self {
        self.datatype = Some(datatype);
        self
    }

    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = role;
        self
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Value read from the last input row.
    pub fn current(&self) -> &ScalarValue {
        &self.current
    }
}

impl Mapping for MapColumn {
    fn kind(&self) -> MappingKind {
        MappingKind::Column
    }

    fn initialize_input_ordinals(
        &mut self,
        input: &RowSchema,
        _join: Option<&RowSchema>,
        _config: &TransformConfig,
    ) -> Result<()> {
        let (resolved, source_type) = ResolvedSource::try_new(&self.source, input)?;
        let datatype = match (self.datatype, source_type) {
            (Some(datatype), _) | (None, Some(datatype)) => datatype,
            (None, None) => {
                return Err(RowflowError::binding("Unable to determine output column type")
                    .with_field("column", &self.output_name));
            }
        };

        self.cast = (source_type != Some(datatype)).then_some(datatype);
        self.resolved = Some(match resolved {
            // Constants are converted once.
            ResolvedSource::Constant(value) => {
                ResolvedSource::Constant(value.cast_to(datatype)?)
            }
            column => column,
        });
        self.datatype = Some(datatype);
        Ok(())
    }

    fn add_output_columns(&mut self, output: &mut RowSchema) -> Result<()> {
        let datatype = self
            .datatype
            .ok_or_else(|| RowflowError::new("Column mapping not initialized"))?;
        let ordinal =
            output.push(ColumnDef::new(self.output_name.clone(), datatype).with_role(self.role))?;
        self.output_ordinal = Some(ordinal);
        Ok(())
    }

    fn process_input_row(&mut self, input: &InputRow) -> Result<bool> {
        let resolved = self
            .resolved
            .as_ref()
            .ok_or_else(|| RowflowError::new("Column mapping not initialized"))?;
        let value = resolved.read(input.row)?;
        self.current = match (resolved, self.cast) {
            (ResolvedSource::Column(_), Some(datatype)) => value.cast_to(datatype)?,
            _ => value.clone(),
        };
        Ok(true)
    }

    fn process_output_row(&mut self, output: &mut Row) -> Result<()> {
        if let Some(ordinal) = self.output_ordinal {
            output.set(ordinal, self.current.clone())?;
        }
        Ok(())
    }
}

/// Column mapping whose value defines group boundaries.
#[derive(Debug)]
pub struct MapGroup {
    column: MapColumn,
}

impl MapGroup {
    pub fn new(column: MapColumn) -> Self {
        MapGroup {
            column: column.with_role(ColumnRole::GroupKey),
        }
    }

    pub fn column(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(MapColumn::column(input, output))
    }
}

impl Mapping for MapGroup {
    fn kind(&self) -> MappingKind {
        MappingKind::Group
    }

    fn initialize_input_ordinals(
        &mut self,
        input: &RowSchema,
        join: Option<&RowSchema>,
        config: &TransformConfig,
    ) -> Result<()> {
        self.column.initialize_input_ordinals(input, join, config)
    }

    fn add_output_columns(&mut self, output: &mut RowSchema) -> Result<()> {
        self.column.add_output_columns(output)
    }

    fn process_input_row(&mut self, input: &InputRow) -> Result<bool> {
        self.column.process_input_row(input)
    }

    fn process_output_row(&mut self, output: &mut Row) -> Result<()> {
        self.column.process_output_row(output)
    }

    fn group_value(&self) -> Option<&ScalarValue> {
        Some(self.column.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ExecutionVariables;
    use crate::functions::testutil::schema;

    #[test]
    fn column_and_constant() {
        let input = schema(&[("a", DataType::Int32), ("b", DataType::Utf8)]);
        let conf = TransformConfig::default();
        let mut output = RowSchema::new();

        let mut b = MapColumn::column("b", "b_out");
        let mut a = MapColumn::column("a", "a_wide").with_datatype(DataType::Int64);
        let mut c = MapColumn::constant(7, "seven");
        for m in [&mut b, &mut a, &mut c] {
            m.initialize_input_ordinals(&input, None, &conf).unwrap();
            m.add_output_columns(&mut output).unwrap();
        }
        assert_eq!(
            vec!["b_out", "a_wide", "seven"],
            output.names().collect::<Vec<_>>()
        );
        assert_eq!(DataType::Int64, output.column(1).unwrap().datatype);

        let vars = ExecutionVariables::default();
        let row = Row::from(vec![ScalarValue::Int32(3), "x".into()]);
        let mut out = Row::new_null(output.len());
        for m in [&mut b, &mut a, &mut c] {
            assert!(m.process_input_row(&InputRow::new(&row, &vars)).unwrap());
            m.process_output_row(&mut out).unwrap();
        }
        assert_eq!(
            &[ScalarValue::from("x"), ScalarValue::Int64(3), ScalarValue::Int32(7)],
            out.values()
        );
    }

    #[test]
    fn unknown_column_and_duplicate_output() {
        let input = schema(&[("a", DataType::Int32)]);
        let conf = TransformConfig::default();

        let err = MapColumn::column("missing", "x")
            .initialize_input_ordinals(&input, None, &conf)
            .unwrap_err();
        assert!(err.is_binding());

        let mut output = RowSchema::new();
        let mut first = MapColumn::column("a", "x");
        let mut second = MapGroup::column("a", "x");
        first.initialize_input_ordinals(&input, None, &conf).unwrap();
        second.initialize_input_ordinals(&input, None, &conf).unwrap();
        first.add_output_columns(&mut output).unwrap();
        assert!(second.add_output_columns(&mut output).unwrap_err().is_binding());
    }

    #[test]
    fn group_value_tracks_row() {
        let input = schema(&[("k", DataType::Utf8)]);
        let mut group = MapGroup::column("k", "k");
        group
            .initialize_input_ordinals(&input, None, &TransformConfig::default())
            .unwrap();
        let mut output = RowSchema::new();
        group.add_output_columns(&mut output).unwrap();
        assert_eq!(ColumnRole::GroupKey, output.column(0).unwrap().role);

        let vars = ExecutionVariables::default();
        let row = Row::from(vec!["east".into()]);
        group.process_input_row(&InputRow::new(&row, &vars)).unwrap();
        assert_eq!(Some(&ScalarValue::from("east")), group.group_value());
    }
}
