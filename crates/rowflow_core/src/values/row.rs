use rowflow_error::{Result, RowflowError};

use super::scalar::ScalarValue;

/// Fixed-length ordered values, one per column of a schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<ScalarValue>,
}

impl Row {
    /// Create a row with every column set to null.
    pub fn new_null(len: usize) -> Self {
        Row {
            values: vec![ScalarValue::Null; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&ScalarValue> {
        self.values.get(ordinal)
    }

    pub fn try_get(&self, ordinal: usize) -> Result<&ScalarValue> {
        self.values.get(ordinal).ok_or_else(|| {
            RowflowError::new("Row ordinal out of bounds")
                .with_field("ordinal", ordinal)
                .with_field("len", self.values.len())
        })
    }

    pub fn set(&mut self, ordinal: usize, value: ScalarValue) -> Result<()> {
        let len = self.values.len();
        let slot = self.values.get_mut(ordinal).ok_or_else(|| {
            RowflowError::new("Row ordinal out of bounds")
                .with_field("ordinal", ordinal)
                .with_field("len", len)
        })?;
        *slot = value;
        Ok(())
    }

    /// Set every value back to null, keeping the length.
    pub fn clear(&mut self) {
        self.values.fill(ScalarValue::Null);
    }

    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<ScalarValue> {
        self.values
    }
}

impl From<Vec<ScalarValue>> for Row {
    fn from(values: Vec<ScalarValue>) -> Self {
        Row { values }
    }
}

impl FromIterator<ScalarValue> for Row {
    fn from_iter<T: IntoIterator<Item = ScalarValue>>(iter: T) -> Self {
        Row {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_out_of_bounds() {
        let mut row = Row::new_null(2);
        row.set(1, ScalarValue::Int32(4)).unwrap();
        row.set(2, ScalarValue::Int32(4)).unwrap_err();
        assert_eq!(&ScalarValue::Int32(4), row.try_get(1).unwrap());

        row.clear();
        assert_eq!(vec![ScalarValue::Null; 2], row.into_values());
    }
}
