//! Comparison predicates.
//!
//! Condition functions are scalar functions returning a boolean. The
//! comparison machinery here is also used by the filter and join mappings.
pub mod builtin;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rowflow_error::{Result, RowflowError};
use serde::{Deserialize, Serialize};

use crate::match_comparable_type;
use crate::values::datatype::DataType;
use crate::values::physical_type::PhysicalType;
use crate::values::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl CompareOperator {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
        }
    }

    /// Check if an ordering between two non-null values satisfies this
    /// operator.
    pub const fn matches(&self, ord: Ordering) -> bool {
        match self {
            Self::Equal => matches!(ord, Ordering::Equal),
            Self::NotEqual => !matches!(ord, Ordering::Equal),
            Self::LessThan => matches!(ord, Ordering::Less),
            Self::LessThanEqual => !matches!(ord, Ordering::Greater),
            Self::GreaterThan => matches!(ord, Ordering::Greater),
            Self::GreaterThanEqual => !matches!(ord, Ordering::Less),
        }
    }

    /// Result when at least one side is null.
    ///
    /// Two nulls are equal, a null and a non-null are not equal, every
    /// ordering comparison involving null is false.
    pub const fn matches_null(&self, both_null: bool) -> bool {
        match self {
            Self::Equal => both_null,
            Self::NotEqual => !both_null,
            _ => false,
        }
    }
}

impl FromStr for CompareOperator {
    type Err = RowflowError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim() {
            "=" | "==" => Self::Equal,
            "!=" | "<>" => Self::NotEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanEqual,
            other => {
                return Err(RowflowError::binding("Unknown comparison operator")
                    .with_field("operator", other));
            }
        })
    }
}

impl fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type CompareFn = fn(&ScalarValue, &ScalarValue) -> Result<Ordering>;

fn compare_typed<T: PhysicalType>(a: &ScalarValue, b: &ScalarValue) -> Result<Ordering> {
    Ok(T::compare(&T::from_scalar(a)?, &T::from_scalar(b)?))
}

/// Comparison with its value type resolved up front.
#[derive(Debug, Clone, Copy)]
pub struct TypedComparison {
    op: CompareOperator,
    datatype: DataType,
    compare: CompareFn,
}

impl TypedComparison {
    pub fn try_new(op: CompareOperator, datatype: DataType) -> Result<Self> {
        let compare = match_comparable_type!(datatype, T => Ok(compare_typed::<T> as CompareFn))?;
        Ok(TypedComparison {
            op,
            datatype,
            compare,
        })
    }

    pub fn op(&self) -> CompareOperator {
        self.op
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    /// Compare two values, converting them to the resolved type.
    pub fn evaluate(&self, a: &ScalarValue, b: &ScalarValue) -> Result<bool> {
        match (a.is_null(), b.is_null()) {
            (false, false) => Ok(self.op.matches((self.compare)(a, b)?)),
            (a_null, b_null) => Ok(self.op.matches_null(a_null && b_null)),
        }
    }

    /// Ordering of two non-null values.
    pub fn ordering(&self, a: &ScalarValue, b: &ScalarValue) -> Result<Ordering> {
        (self.compare)(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_operators() {
        let cases = [
            ("=", CompareOperator::Equal),
            ("<>", CompareOperator::NotEqual),
            ("!=", CompareOperator::NotEqual),
            (" <= ", CompareOperator::LessThanEqual),
            (">", CompareOperator::GreaterThan),
        ];
        for case in cases {
            let got: CompareOperator = case.0.parse().unwrap();
            assert_eq!(case.1, got, "case: {case:?}");
        }
        assert!("=~".parse::<CompareOperator>().unwrap_err().is_binding());
    }

    #[test]
    fn null_semantics() {
        let eq = TypedComparison::try_new(CompareOperator::Equal, DataType::Int32).unwrap();
        let ne = TypedComparison::try_new(CompareOperator::NotEqual, DataType::Int32).unwrap();
        let lt = TypedComparison::try_new(CompareOperator::LessThan, DataType::Int32).unwrap();
        let null = ScalarValue::Null;
        let one = ScalarValue::Int32(1);

        assert!(eq.evaluate(&null, &null).unwrap());
        assert!(!eq.evaluate(&null, &one).unwrap());
        assert!(ne.evaluate(&one, &null).unwrap());
        assert!(!ne.evaluate(&null, &null).unwrap());
        assert!(!lt.evaluate(&null, &one).unwrap());
    }

    #[test]
    fn converts_to_resolved_type() {
        let gt = TypedComparison::try_new(CompareOperator::GreaterThan, DataType::Int64).unwrap();
        assert!(gt.evaluate(&ScalarValue::Int8(10), &ScalarValue::from("9")).unwrap());

        // Lexicographic for strings.
        let gt = TypedComparison::try_new(CompareOperator::GreaterThan, DataType::Utf8).unwrap();
        assert!(!gt.evaluate(&ScalarValue::from("10"), &ScalarValue::from("9")).unwrap());

        let err = TypedComparison::try_new(CompareOperator::Equal, DataType::Int64)
            .unwrap()
            .evaluate(&ScalarValue::Int64(1), &ScalarValue::from("x"))
            .unwrap_err();
        assert!(err.is_type());
    }
}
