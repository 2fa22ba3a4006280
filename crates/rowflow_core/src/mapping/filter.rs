use rowflow_error::{Result, RowflowError};

use super::{InputRow, Mapping, MappingKind, ResolvedSource};
use crate::config::transform::TransformConfig;
use crate::functions::condition::{CompareOperator, TypedComparison};
use crate::functions::parameter::ParameterSpec;
use crate::values::schema::RowSchema;

/// Keeps rows where a column compares true against a constant or another
/// column.
///
/// The comparison type is the left column's type. Constants are converted to
/// it when the mapping is initialized.
#[derive(Debug)]
pub struct MapFilter {
    left: String,
    op: CompareOperator,
    right: ParameterSpec,
    resolved: Option<(usize, TypedComparison, ResolvedSource)>,
}

impl MapFilter {
    pub fn new(left: impl Into<String>, op: CompareOperator, right: ParameterSpec) -> Self {
        MapFilter {
            left: left.into(),
            op,
            right,
            resolved: None,
        }
    }
}

impl Mapping for MapFilter {
    fn kind(&self) -> MappingKind {
        MappingKind::Filter
    }

    fn initialize_input_ordinals(
        &mut self,
        input: &RowSchema,
        _join: Option<&RowSchema>,
        _config: &TransformConfig,
    ) -> Result<()> {
        let (left, column) = input.try_column(&self.left)?;
        let comparison = TypedComparison::try_new(self.op, column.datatype)?;
        let right = match ResolvedSource::try_new(&self.right, input)?.0 {
            ResolvedSource::Constant(value) => {
                ResolvedSource::Constant(value.cast_to(column.datatype)?)
            }
            column => column,
        };
        self.resolved = Some((left, comparison, right));
        Ok(())
    }

    fn add_output_columns(&mut self, _output: &mut RowSchema) -> Result<()> {
        Ok(())
    }

    fn process_input_row(&mut self, input: &InputRow) -> Result<bool> {
        let (left, comparison, right) = self
            .resolved
            .as_ref()
            .ok_or_else(|| RowflowError::new("Filter mapping not initialized"))?;
        comparison.evaluate(input.row.try_get(*left)?, right.read(input.row)?)
    }
}

/// Matches a primary row against a join row.
#[derive(Debug)]
pub struct MapJoin {
    left: String,
    op: CompareOperator,
    /// Column in the join schema.
    right: String,
    resolved: Option<(usize, TypedComparison, usize)>,
}

impl MapJoin {
    pub fn new(left: impl Into<String>, op: CompareOperator, right: impl Into<String>) -> Self {
        MapJoin {
            left: left.into(),
            op,
            right: right.into(),
            resolved: None,
        }
    }
}

impl Mapping for MapJoin {
    fn kind(&self) -> MappingKind {
        MappingKind::Join
    }

    fn initialize_input_ordinals(
        &mut self,
        input: &RowSchema,
        join: Option<&RowSchema>,
        _config: &TransformConfig,
    ) -> Result<()> {
        let join = join.ok_or_else(|| {
            RowflowError::binding("Join mapping requires a join schema")
                .with_field("column", &self.right)
        })?;
        let (left, column) = input.try_column(&self.left)?;
        let (right, _) = join.try_column(&self.right)?;
        let comparison = TypedComparison::try_new(self.op, column.datatype)?;
        self.resolved = Some((left, comparison, right));
        Ok(())
    }

    fn add_output_columns(&mut self, _output: &mut RowSchema) -> Result<()> {
        Ok(())
    }

    fn process_input_row(&mut self, input: &InputRow) -> Result<bool> {
        let (left, comparison, right) = self
            .resolved
            .as_ref()
            .ok_or_else(|| RowflowError::new("Join mapping not initialized"))?;
        let join = input.try_join()?;
        comparison.evaluate(input.row.try_get(*left)?, join.try_get(*right)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ExecutionVariables;
    use crate::functions::testutil::schema;
    use crate::values::datatype::DataType;
    use crate::values::row::Row;
    use crate::values::scalar::ScalarValue;

    fn accepts(m: &mut dyn Mapping, values: Vec<ScalarValue>) -> bool {
        let row = Row::from(values);
        let vars = ExecutionVariables::default();
        m.process_input_row(&InputRow::new(&row, &vars)).unwrap()
    }

    #[test]
    fn column_vs_constant() {
        let input = schema(&[("age", DataType::Int32)]);
        let mut filter = MapFilter::new(
            "age",
            CompareOperator::GreaterThanEqual,
            ParameterSpec::constant("18"),
        );
        filter
            .initialize_input_ordinals(&input, None, &TransformConfig::default())
            .unwrap();

        assert!(accepts(&mut filter, vec![ScalarValue::Int32(18)]));
        assert!(!accepts(&mut filter, vec![ScalarValue::Int32(17)]));
        assert!(!accepts(&mut filter, vec![ScalarValue::Null]));
    }

    #[test]
    fn unparsable_constant() {
        let input = schema(&[("age", DataType::Int32)]);
        let err = MapFilter::new("age", CompareOperator::Equal, ParameterSpec::constant("old"))
            .initialize_input_ordinals(&input, None, &TransformConfig::default())
            .unwrap_err();
        assert!(err.is_type());
    }

    #[test]
    fn column_vs_column() {
        let input = schema(&[("a", DataType::Float64), ("b", DataType::Int32)]);
        let mut filter = MapFilter::new("a", CompareOperator::LessThan, ParameterSpec::column("b"));
        filter
            .initialize_input_ordinals(&input, None, &TransformConfig::default())
            .unwrap();
        assert!(accepts(&mut filter, vec![1.5.into(), ScalarValue::Int32(2)]));
        assert!(!accepts(&mut filter, vec![2.5.into(), ScalarValue::Int32(2)]));
    }

    #[test]
    fn join_rows() {
        let input = schema(&[("id", DataType::Int64)]);
        let join_schema = schema(&[("name", DataType::Utf8), ("customer_id", DataType::Int32)]);
        let conf = TransformConfig::default();

        let mut join = MapJoin::new("id", CompareOperator::Equal, "customer_id");
        assert!(join.initialize_input_ordinals(&input, None, &conf).unwrap_err().is_binding());
        join.initialize_input_ordinals(&input, Some(&join_schema), &conf)
            .unwrap();

        let vars = ExecutionVariables::default();
        let row = Row::from(vec![ScalarValue::Int64(4)]);
        let matching = Row::from(vec!["a".into(), ScalarValue::Int32(4)]);
        let other = Row::from(vec!["b".into(), ScalarValue::Int32(5)]);

        assert!(join.process_input_row(&InputRow::new(&row, &vars).with_join(&matching)).unwrap());
        assert!(!join.process_input_row(&InputRow::new(&row, &vars).with_join(&other)).unwrap());
        assert!(join.process_input_row(&InputRow::new(&row, &vars)).unwrap_err().is_runtime());
    }
}
