pub mod key;

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use num_traits::ToPrimitive;
use rowflow_error::{Result, RowflowError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::datatype::DataType;
use super::parse::{
    BoolParser,
    DateTimeParser,
    DecimalParser,
    Float64Parser,
    Parser,
    UuidParser,
};

/// A single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Decimal(Decimal),
    Float32(f32),
    Float64(f64),
    DateTime(NaiveDateTime),
    Utf8(String),
    Uuid(Uuid),
    /// Row-carried array.
    List(Vec<ScalarValue>),
}

impl ScalarValue {
    /// Get the data type of this value.
    ///
    /// Returns None for nulls and lists.
    pub fn datatype(&self) -> Option<DataType> {
        Some(match self {
            Self::Null | Self::List(_) => return None,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt8(_) => DataType::UInt8,
            Self::UInt16(_) => DataType::UInt16,
            Self::UInt32(_) => DataType::UInt32,
            Self::UInt64(_) => DataType::UInt64,
            Self::Decimal(_) => DataType::Decimal,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::DateTime(_) => DataType::DateTime,
            Self::Utf8(_) => DataType::Utf8,
            Self::Uuid(_) => DataType::Uuid,
        })
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn type_error(&self, target: &str) -> RowflowError {
        RowflowError::type_error(format!("Cannot convert value to {target}"))
            .with_field("value", self)
    }

    pub fn try_as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(b) => Ok(*b),
            Self::Utf8(s) => BoolParser.parse(s).ok_or_else(|| self.type_error("Boolean")),
            other => match other.try_as_i128() {
                Ok(0) => Ok(false),
                Ok(1) => Ok(true),
                _ => Err(self.type_error("Boolean")),
            },
        }
    }

    /// Try to get the value as an i128.
    ///
    /// Floats and decimals are only converted if they have no fractional part.
    pub fn try_as_i128(&self) -> Result<i128> {
        match self {
            Self::Int8(v) => Ok(*v as i128),
            Self::Int16(v) => Ok(*v as i128),
            Self::Int32(v) => Ok(*v as i128),
            Self::Int64(v) => Ok(*v as i128),
            Self::UInt8(v) => Ok(*v as i128),
            Self::UInt16(v) => Ok(*v as i128),
            Self::UInt32(v) => Ok(*v as i128),
            Self::UInt64(v) => Ok(*v as i128),
            Self::Boolean(v) => Ok(*v as i128),
            Self::Decimal(v) if v.fract().is_zero() => {
                v.to_i128().ok_or_else(|| self.type_error("integer"))
            }
            Self::Float32(v) if v.fract() == 0.0 => {
                v.to_i128().ok_or_else(|| self.type_error("integer"))
            }
            Self::Float64(v) if v.fract() == 0.0 => {
                v.to_i128().ok_or_else(|| self.type_error("integer"))
            }
            Self::Utf8(s) => s.trim().parse().map_err(|_| self.type_error("integer")),
            _ => Err(self.type_error("integer")),
        }
    }

    pub fn try_as_i64(&self) -> Result<i64> {
        i64::try_from(self.try_as_i128()?).map_err(|_| self.type_error("Int64"))
    }

    pub fn try_as_usize(&self) -> Result<usize> {
        usize::try_from(self.try_as_i128()?).map_err(|_| self.type_error("usize"))
    }

    pub fn try_as_f64(&self) -> Result<f64> {
        match self {
            Self::Float32(v) => Ok(*v as f64),
            Self::Float64(v) => Ok(*v),
            Self::Decimal(v) => v.to_f64().ok_or_else(|| self.type_error("Float64")),
            Self::Utf8(s) => Float64Parser::new()
                .parse(s)
                .ok_or_else(|| self.type_error("Float64")),
            other => other
                .try_as_i128()
                .map(|v| v as f64)
                .map_err(|_| self.type_error("Float64")),
        }
    }

    pub fn try_as_decimal(&self) -> Result<Decimal> {
        match self {
            Self::Decimal(v) => Ok(*v),
            Self::Float32(v) => {
                Decimal::from_f32_retain(*v).ok_or_else(|| self.type_error("Decimal"))
            }
            Self::Float64(v) => {
                Decimal::from_f64_retain(*v).ok_or_else(|| self.type_error("Decimal"))
            }
            Self::Utf8(s) => DecimalParser.parse(s).ok_or_else(|| self.type_error("Decimal")),
            other => {
                let v = other.try_as_i128().map_err(|_| self.type_error("Decimal"))?;
                Decimal::try_from_i128_with_scale(v, 0).map_err(|_| self.type_error("Decimal"))
            }
        }
    }

    pub fn try_as_datetime(&self) -> Result<NaiveDateTime> {
        match self {
            Self::DateTime(v) => Ok(*v),
            Self::Utf8(s) => DateTimeParser.parse(s).ok_or_else(|| self.type_error("DateTime")),
            _ => Err(self.type_error("DateTime")),
        }
    }

    pub fn try_as_uuid(&self) -> Result<Uuid> {
        match self {
            Self::Uuid(v) => Ok(*v),
            Self::Utf8(s) => UuidParser.parse(s).ok_or_else(|| self.type_error("Uuid")),
            _ => Err(self.type_error("Uuid")),
        }
    }

    /// Borrow the string if this is a string value.
    pub fn try_as_str(&self) -> Result<&str> {
        match self {
            Self::Utf8(s) => Ok(s.as_str()),
            _ => Err(self.type_error("Utf8")),
        }
    }

    /// Convert any non-null, non-list value to its string form.
    pub fn try_into_string(&self) -> Result<String> {
        match self {
            Self::Utf8(s) => Ok(s.clone()),
            Self::Null | Self::List(_) => Err(self.type_error("Utf8")),
            other => Ok(other.to_string()),
        }
    }

    pub fn try_as_list(&self) -> Result<&[ScalarValue]> {
        match self {
            Self::List(v) => Ok(v.as_slice()),
            _ => Err(self.type_error("List")),
        }
    }

    /// Convert this value to the given type.
    ///
    /// Nulls stay null.
    pub fn cast_to(&self, datatype: DataType) -> Result<ScalarValue> {
        if self.is_null() || self.datatype() == Some(datatype) {
            return Ok(self.clone());
        }

        fn int<T: TryFrom<i128>>(v: &ScalarValue, target: &str) -> Result<T> {
            T::try_from(v.try_as_i128()?).map_err(|_| v.type_error(target))
        }

        Ok(match datatype {
            DataType::Boolean => Self::Boolean(self.try_as_bool()?),
            DataType::Int8 => Self::Int8(int(self, "Int8")?),
            DataType::Int16 => Self::Int16(int(self, "Int16")?),
            DataType::Int32 => Self::Int32(int(self, "Int32")?),
            DataType::Int64 => Self::Int64(int(self, "Int64")?),
            DataType::UInt8 => Self::UInt8(int(self, "UInt8")?),
            DataType::UInt16 => Self::UInt16(int(self, "UInt16")?),
            DataType::UInt32 => Self::UInt32(int(self, "UInt32")?),
            DataType::UInt64 => Self::UInt64(int(self, "UInt64")?),
            DataType::Decimal => Self::Decimal(self.try_as_decimal()?),
            DataType::Float32 => Self::Float32(self.try_as_f64()? as f32),
            DataType::Float64 => Self::Float64(self.try_as_f64()?),
            DataType::DateTime => Self::DateTime(self.try_as_datetime()?),
            DataType::Utf8 => Self::Utf8(self.try_into_string()?),
            DataType::Uuid => Self::Uuid(self.try_as_uuid()?),
        })
    }

    /// Total ordering across values.
    ///
    /// Nulls sort first. Numeric values of different widths compare by
    /// value. Values of unrelated types compare by their string forms.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Utf8(a), Self::Utf8(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::Uuid(a), Self::Uuid(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => {
                for (a, b) in a.iter().zip(b.iter()) {
                    match a.total_cmp(b) {
                        Ordering::Equal => (),
                        other => return other,
                    }
                }
                a.len().cmp(&b.len())
            }
            (a, b) if a.is_numeric() && b.is_numeric() => {
                if let (Ok(a), Ok(b)) = (a.try_as_i128(), b.try_as_i128()) {
                    return a.cmp(&b);
                }
                if let (Self::Decimal(a), Self::Decimal(b)) = (a, b) {
                    return a.cmp(b);
                }
                match (a.try_as_f64(), b.try_as_f64()) {
                    (Ok(a), Ok(b)) => a.total_cmp(&b),
                    _ => a.to_string().cmp(&b.to_string()),
                }
            }
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }

    fn is_numeric(&self) -> bool {
        self.datatype().is_some_and(|d| d.is_numeric())
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Utf8(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::List(v) => {
                write!(f, "[")?;
                for (idx, value) in v.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! impl_from_native {
    ($native:ty, $variant:ident) => {
        impl From<$native> for ScalarValue {
            fn from(value: $native) -> Self {
                ScalarValue::$variant(value)
            }
        }
    };
}

impl_from_native!(bool, Boolean);
impl_from_native!(i8, Int8);
impl_from_native!(i16, Int16);
impl_from_native!(i32, Int32);
impl_from_native!(i64, Int64);
impl_from_native!(u8, UInt8);
impl_from_native!(u16, UInt16);
impl_from_native!(u32, UInt32);
impl_from_native!(u64, UInt64);
impl_from_native!(Decimal, Decimal);
impl_from_native!(f32, Float32);
impl_from_native!(f64, Float64);
impl_from_native!(NaiveDateTime, DateTime);
impl_from_native!(String, Utf8);
impl_from_native!(Uuid, Uuid);
impl_from_native!(Vec<ScalarValue>, List);

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => ScalarValue::Null,
        }
    }
}
