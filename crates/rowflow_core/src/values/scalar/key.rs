use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use super::ScalarValue;

/// Wrapper around a scalar value so it can be used as a map key.
///
/// Equality and ordering follow `ScalarValue::total_cmp`, so `Int32(1)` and
/// `Int64(1)` are the same key. Hashing is kept consistent with that.
#[derive(Debug, Clone)]
pub struct ScalarKey(pub ScalarValue);

impl ScalarKey {
    pub fn value(&self) -> &ScalarValue {
        &self.0
    }

    pub fn into_value(self) -> ScalarValue {
        self.0
    }
}

impl From<ScalarValue> for ScalarKey {
    fn from(value: ScalarValue) -> Self {
        ScalarKey(value)
    }
}

impl PartialEq for ScalarKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for ScalarKey {}

impl PartialOrd for ScalarKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScalarKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for ScalarKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_scalar(&self.0, state)
    }
}

fn hash_scalar<H: Hasher>(value: &ScalarValue, state: &mut H) {
    match value {
        ScalarValue::Null => 0_u8.hash(state),
        ScalarValue::List(values) => {
            values.len().hash(state);
            for v in values {
                hash_scalar(v, state);
            }
        }
        ScalarValue::Boolean(_)
        | ScalarValue::DateTime(_)
        | ScalarValue::Uuid(_)
        | ScalarValue::Utf8(_) => value.to_string().hash(state),
        numeric => {
            // Integral numerics hash the same regardless of width so that
            // equal keys across types land in the same bucket.
            match numeric.try_as_i128() {
                Ok(v) => v.hash(state),
                Err(_) => match numeric.try_as_f64() {
                    Ok(v) => v.to_bits().hash(state),
                    Err(_) => numeric.to_string().hash(state),
                },
            }
        }
    }
}
