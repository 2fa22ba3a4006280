use indexmap::IndexMap;
use rowflow_error::{Result, RowflowError};
use serde::{Deserialize, Serialize};

use super::datatype::DataType;

/// Role a column plays in the target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnRole {
    #[default]
    Attribute,
    NaturalKey,
    SurrogateKey,
    TrackingField,
    AuditField,
    Ignore,
    /// Column whose value participates in group boundary detection.
    GroupKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub datatype: DataType,
    pub role: ColumnRole,
    pub nullable: bool,
    /// Array rank. Columns with a rank above zero carry a list per row.
    pub rank: usize,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        ColumnDef {
            name: name.into(),
            datatype,
            role: ColumnRole::Attribute,
            nullable: true,
            rank: 0,
        }
    }

    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn is_array(&self) -> bool {
        self.rank > 0
    }
}

/// Ordered list of uniquely named columns.
///
/// Ordinals are stable once assigned, columns can only be appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSchema {
    columns: IndexMap<String, ColumnDef>,
}

impl RowSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_from_columns(columns: impl IntoIterator<Item = ColumnDef>) -> Result<Self> {
        let mut schema = Self::new();
        for col in columns {
            schema.push(col)?;
        }
        Ok(schema)
    }

    /// Append a column, returning its ordinal.
    pub fn push(&mut self, column: ColumnDef) -> Result<usize> {
        if self.columns.contains_key(&column.name) {
            return Err(RowflowError::binding("Duplicate column name in schema")
                .with_field("column", &column.name));
        }
        let (idx, _) = self.columns.insert_full(column.name.clone(), column);
        Ok(idx)
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    pub fn try_ordinal(&self, name: &str) -> Result<usize> {
        self.ordinal(name).ok_or_else(|| {
            RowflowError::binding("Missing column in schema").with_field("column", name)
        })
    }

    pub fn column(&self, ordinal: usize) -> Option<&ColumnDef> {
        self.columns.get_index(ordinal).map(|(_, col)| col)
    }

    pub fn try_column(&self, name: &str) -> Result<(usize, &ColumnDef)> {
        let idx = self.try_ordinal(name)?;
        let (_, col) = self
            .columns
            .get_index(idx)
            .ok_or_else(|| RowflowError::new("Column ordinal out of bounds"))?;
        Ok((idx, col))
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = &ColumnDef> {
        self.columns.values()
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.columns.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_ordinals() {
        let mut schema = RowSchema::new();
        assert_eq!(0, schema.push(ColumnDef::new("a", DataType::Int32)).unwrap());
        assert_eq!(1, schema.push(ColumnDef::new("b", DataType::Utf8)).unwrap());
        assert_eq!(Some(1), schema.ordinal("b"));
        assert_eq!(vec!["a", "b"], schema.names().collect::<Vec<_>>());
    }

    #[test]
    fn duplicate_name_is_binding_error() {
        let err = RowSchema::try_from_columns([
            ColumnDef::new("a", DataType::Int32),
            ColumnDef::new("a", DataType::Utf8),
        ])
        .unwrap_err();
        assert!(err.is_binding());
    }

    #[test]
    fn missing_column() {
        let schema = RowSchema::try_from_columns([ColumnDef::new("a", DataType::Int32)]).unwrap();
        let err = schema.try_ordinal("c").unwrap_err();
        assert!(err.is_binding());
        assert_eq!(Some("c"), err.get_field("column"));
    }

    #[test]
    fn column_def_serde() {
        let col = ColumnDef::new("k", DataType::Int64)
            .with_role(ColumnRole::NaturalKey)
            .with_nullable(false);
        let s = serde_json::to_string(&col).unwrap();
        let got: ColumnDef = serde_json::from_str(&s).unwrap();
        assert_eq!(col, got);
    }
}
