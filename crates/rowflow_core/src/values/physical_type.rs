//! Type operations over every value kind.
//!
//! Functions are written once against `PhysicalType`/`NumericType` and
//! monomorphized at bind using `match_numeric_type!` or
//! `match_comparable_type!`.
use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::NaiveDateTime;
use num_traits::ToPrimitive;
use rowflow_error::{Result, RowflowError};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::datatype::DataType;
use super::parse::{
    BoolParser,
    DateTimeParser,
    DecimalParser,
    FromStrParser,
    Parser,
    UuidParser,
};
use super::scalar::ScalarValue;

pub trait PhysicalType: Debug + Sync + Send + Copy + 'static {
    type Native: Debug + Clone + PartialEq + Sync + Send + 'static;

    const DATATYPE: DataType;

    /// Convert a value into this kind.
    ///
    /// Null values are rejected, callers handle nulls before reaching here.
    fn from_scalar(value: &ScalarValue) -> Result<Self::Native>;

    fn parse(s: &str) -> Result<Self::Native>;

    fn into_scalar(value: Self::Native) -> ScalarValue;

    /// Total ordering, NaN sorts deterministically for floats.
    fn compare(a: &Self::Native, b: &Self::Native) -> Ordering;

    fn equal(a: &Self::Native, b: &Self::Native) -> bool {
        Self::compare(a, b) == Ordering::Equal
    }
}

/// Arithmetic on numeric kinds.
///
/// Integer operations are checked, overflow is a runtime error.
pub trait NumericType: PhysicalType<Native: Copy> {
    fn zero() -> Self::Native;

    fn add(a: Self::Native, b: Self::Native) -> Result<Self::Native>;
    fn subtract(a: Self::Native, b: Self::Native) -> Result<Self::Native>;
    fn multiply(a: Self::Native, b: Self::Native) -> Result<Self::Native>;

    /// Divide `a` by `b`.
    ///
    /// Division by zero errors for integers and decimals. Floats follow IEEE.
    fn divide(a: Self::Native, b: Self::Native) -> Result<Self::Native>;

    fn negate(a: Self::Native) -> Result<Self::Native>;

    fn is_zero(a: Self::Native) -> bool;
    fn is_negative(a: Self::Native) -> bool;

    fn from_count(count: usize) -> Result<Self::Native>;
    fn to_f64(a: Self::Native) -> f64;

    /// Signed infinity. Only floats have one.
    fn infinity(negative: bool) -> Option<Self::Native>;
}

fn conversion_error(value: &ScalarValue, datatype: DataType) -> RowflowError {
    RowflowError::type_error(format!("Cannot convert value to {datatype}"))
        .with_field("value", value)
}

fn parse_error(s: &str, datatype: DataType) -> RowflowError {
    RowflowError::type_error(format!("Failed to parse '{s}' as {datatype}"))
}

fn overflow_error(op: &str, datatype: DataType) -> RowflowError {
    RowflowError::runtime(format!("{datatype} overflow in {op}"))
}

fn divide_by_zero_error() -> RowflowError {
    RowflowError::runtime("Division by zero")
}

macro_rules! impl_from_scalar {
    ($variant:ident) => {
        fn from_scalar(value: &ScalarValue) -> Result<Self::Native> {
            match value.cast_to(DataType::$variant)? {
                ScalarValue::$variant(v) => Ok(v),
                _ => Err(conversion_error(value, DataType::$variant)),
            }
        }

        fn into_scalar(value: Self::Native) -> ScalarValue {
            ScalarValue::$variant(value)
        }
    };
}

macro_rules! impl_integer {
    ($name:ident, $native:ty, $variant:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl PhysicalType for $name {
            type Native = $native;
            const DATATYPE: DataType = DataType::$variant;

            impl_from_scalar!($variant);

            fn parse(s: &str) -> Result<Self::Native> {
                FromStrParser::<$native>::new()
                    .parse(s)
                    .ok_or_else(|| parse_error(s, Self::DATATYPE))
            }

            fn compare(a: &Self::Native, b: &Self::Native) -> Ordering {
                a.cmp(b)
            }
        }

        impl NumericType for $name {
            fn zero() -> Self::Native {
                0
            }

            fn add(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
                a.checked_add(b)
                    .ok_or_else(|| overflow_error("add", Self::DATATYPE))
            }

            fn subtract(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
                a.checked_sub(b)
                    .ok_or_else(|| overflow_error("subtract", Self::DATATYPE))
            }

            fn multiply(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
                a.checked_mul(b)
                    .ok_or_else(|| overflow_error("multiply", Self::DATATYPE))
            }

            fn divide(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
                if b == 0 {
                    return Err(divide_by_zero_error());
                }
                a.checked_div(b)
                    .ok_or_else(|| overflow_error("divide", Self::DATATYPE))
            }

            fn negate(a: Self::Native) -> Result<Self::Native> {
                a.checked_neg()
                    .ok_or_else(|| overflow_error("negate", Self::DATATYPE))
            }

            fn is_zero(a: Self::Native) -> bool {
                a == 0
            }

            fn is_negative(a: Self::Native) -> bool {
                (a as i128) < 0
            }

            fn from_count(count: usize) -> Result<Self::Native> {
                <$native>::try_from(count)
                    .map_err(|_| overflow_error("count", Self::DATATYPE))
            }

            fn to_f64(a: Self::Native) -> f64 {
                a as f64
            }

            fn infinity(_negative: bool) -> Option<Self::Native> {
                None
            }
        }
    };
}

impl_integer!(PhysicalI8, i8, Int8);
impl_integer!(PhysicalI16, i16, Int16);
impl_integer!(PhysicalI32, i32, Int32);
impl_integer!(PhysicalI64, i64, Int64);
impl_integer!(PhysicalU8, u8, UInt8);
impl_integer!(PhysicalU16, u16, UInt16);
impl_integer!(PhysicalU32, u32, UInt32);
impl_integer!(PhysicalU64, u64, UInt64);

macro_rules! impl_float {
    ($name:ident, $native:ty, $variant:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl PhysicalType for $name {
            type Native = $native;
            const DATATYPE: DataType = DataType::$variant;

            impl_from_scalar!($variant);

            fn parse(s: &str) -> Result<Self::Native> {
                FromStrParser::<$native>::new()
                    .parse(s)
                    .ok_or_else(|| parse_error(s, Self::DATATYPE))
            }

            fn compare(a: &Self::Native, b: &Self::Native) -> Ordering {
                a.total_cmp(b)
            }
        }

        impl NumericType for $name {
            fn zero() -> Self::Native {
                0.0
            }

            fn add(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
                Ok(a + b)
            }

            fn subtract(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
                Ok(a - b)
            }

            fn multiply(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
                Ok(a * b)
            }

            fn divide(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
                Ok(a / b)
            }

            fn negate(a: Self::Native) -> Result<Self::Native> {
                Ok(-a)
            }

            fn is_zero(a: Self::Native) -> bool {
                a == 0.0
            }

            fn is_negative(a: Self::Native) -> bool {
                a.is_sign_negative()
            }

            fn from_count(count: usize) -> Result<Self::Native> {
                Ok(count as $native)
            }

            fn to_f64(a: Self::Native) -> f64 {
                a as f64
            }

            fn infinity(negative: bool) -> Option<Self::Native> {
                Some(if negative {
                    <$native>::NEG_INFINITY
                } else {
                    <$native>::INFINITY
                })
            }
        }
    };
}

impl_float!(PhysicalF32, f32, Float32);
impl_float!(PhysicalF64, f64, Float64);

#[derive(Debug, Clone, Copy)]
pub struct PhysicalDecimal;

impl PhysicalType for PhysicalDecimal {
    type Native = Decimal;
    const DATATYPE: DataType = DataType::Decimal;

    impl_from_scalar!(Decimal);

    fn parse(s: &str) -> Result<Self::Native> {
        DecimalParser
            .parse(s)
            .ok_or_else(|| parse_error(s, Self::DATATYPE))
    }

    fn compare(a: &Self::Native, b: &Self::Native) -> Ordering {
        a.cmp(b)
    }
}

impl NumericType for PhysicalDecimal {
    fn zero() -> Self::Native {
        Decimal::ZERO
    }

    fn add(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
        a.checked_add(b)
            .ok_or_else(|| overflow_error("add", Self::DATATYPE))
    }

    fn subtract(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
        a.checked_sub(b)
            .ok_or_else(|| overflow_error("subtract", Self::DATATYPE))
    }

    fn multiply(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
        a.checked_mul(b)
            .ok_or_else(|| overflow_error("multiply", Self::DATATYPE))
    }

    fn divide(a: Self::Native, b: Self::Native) -> Result<Self::Native> {
        if b.is_zero() {
            return Err(divide_by_zero_error());
        }
        a.checked_div(b)
            .ok_or_else(|| overflow_error("divide", Self::DATATYPE))
    }

    fn negate(a: Self::Native) -> Result<Self::Native> {
        Ok(-a)
    }

    fn is_zero(a: Self::Native) -> bool {
        a.is_zero()
    }

    fn is_negative(a: Self::Native) -> bool {
        a.is_sign_negative() && !a.is_zero()
    }

    fn from_count(count: usize) -> Result<Self::Native> {
        Ok(Decimal::from(count))
    }

    fn to_f64(a: Self::Native) -> f64 {
        a.to_f64().unwrap_or(f64::NAN)
    }

    fn infinity(_negative: bool) -> Option<Self::Native> {
        None
    }
}

macro_rules! impl_comparable {
    ($name:ident, $native:ty, $variant:ident, |$s:ident| $parse:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl PhysicalType for $name {
            type Native = $native;
            const DATATYPE: DataType = DataType::$variant;

            impl_from_scalar!($variant);

            fn parse($s: &str) -> Result<Self::Native> {
                $parse.ok_or_else(|| parse_error($s, Self::DATATYPE))
            }

            fn compare(a: &Self::Native, b: &Self::Native) -> Ordering {
                a.cmp(b)
            }
        }
    };
}

impl_comparable!(PhysicalBool, bool, Boolean, |s| BoolParser.parse(s));
impl_comparable!(PhysicalDateTime, NaiveDateTime, DateTime, |s| DateTimeParser.parse(s));
impl_comparable!(PhysicalUuid, Uuid, Uuid, |s| UuidParser.parse(s));
impl_comparable!(PhysicalUtf8, String, Utf8, |s| Some(s.to_string()));

/// Expand a numeric data type into its physical marker type.
///
/// `$body` must evaluate to a `Result`. Non-numeric types produce a type
/// error.
#[macro_export]
macro_rules! match_numeric_type {
    ($datatype:expr, $t:ident => $body:expr) => {{
        match $datatype {
            $crate::values::datatype::DataType::Int8 => {
                type $t = $crate::values::physical_type::PhysicalI8;
                $body
            }
            $crate::values::datatype::DataType::Int16 => {
                type $t = $crate::values::physical_type::PhysicalI16;
                $body
            }
            $crate::values::datatype::DataType::Int32 => {
                type $t = $crate::values::physical_type::PhysicalI32;
                $body
            }
            $crate::values::datatype::DataType::Int64 => {
                type $t = $crate::values::physical_type::PhysicalI64;
                $body
            }
            $crate::values::datatype::DataType::UInt8 => {
                type $t = $crate::values::physical_type::PhysicalU8;
                $body
            }
            $crate::values::datatype::DataType::UInt16 => {
                type $t = $crate::values::physical_type::PhysicalU16;
                $body
            }
            $crate::values::datatype::DataType::UInt32 => {
                type $t = $crate::values::physical_type::PhysicalU32;
                $body
            }
            $crate::values::datatype::DataType::UInt64 => {
                type $t = $crate::values::physical_type::PhysicalU64;
                $body
            }
            $crate::values::datatype::DataType::Decimal => {
                type $t = $crate::values::physical_type::PhysicalDecimal;
                $body
            }
            $crate::values::datatype::DataType::Float32 => {
                type $t = $crate::values::physical_type::PhysicalF32;
                $body
            }
            $crate::values::datatype::DataType::Float64 => {
                type $t = $crate::values::physical_type::PhysicalF64;
                $body
            }
            other => Err(::rowflow_error::RowflowError::type_error(format!(
                "Expected a numeric type, got {other}"
            ))),
        }
    }};
}

/// Expand any data type into its physical marker type.
#[macro_export]
macro_rules! match_comparable_type {
    ($datatype:expr, $t:ident => $body:expr) => {{
        match $datatype {
            $crate::values::datatype::DataType::Boolean => {
                type $t = $crate::values::physical_type::PhysicalBool;
                $body
            }
            $crate::values::datatype::DataType::DateTime => {
                type $t = $crate::values::physical_type::PhysicalDateTime;
                $body
            }
            $crate::values::datatype::DataType::Utf8 => {
                type $t = $crate::values::physical_type::PhysicalUtf8;
                $body
            }
            $crate::values::datatype::DataType::Uuid => {
                type $t = $crate::values::physical_type::PhysicalUuid;
                $body
            }
            other => $crate::match_numeric_type!(other, $t => $body),
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_out_of_range() {
        let err = PhysicalU8::parse("256").unwrap_err();
        assert!(err.is_type());
        assert_eq!(255, PhysicalU8::parse("255").unwrap());
        PhysicalI8::parse("abc").unwrap_err();
    }

    #[test]
    fn integer_overflow_is_runtime_error() {
        let err = PhysicalI8::add(120, 10).unwrap_err();
        assert!(err.is_runtime());
        let err = PhysicalU32::negate(1).unwrap_err();
        assert!(err.is_runtime());
        assert_eq!(0, PhysicalU32::negate(0).unwrap());
        PhysicalI64::divide(i64::MIN, -1).unwrap_err();
    }

    #[test]
    fn divide_by_zero() {
        assert!(PhysicalI32::divide(4, 0).unwrap_err().is_runtime());
        assert!(PhysicalDecimal::divide(Decimal::ONE, Decimal::ZERO)
            .unwrap_err()
            .is_runtime());
        assert_eq!(f64::INFINITY, PhysicalF64::divide(1.0, 0.0).unwrap());
        assert_eq!(f32::NEG_INFINITY, PhysicalF32::divide(-1.0, 0.0).unwrap());
    }

    #[test]
    fn decimal_exact() {
        let a = PhysicalDecimal::parse("0.1").unwrap();
        let b = PhysicalDecimal::parse("0.2").unwrap();
        assert_eq!(Decimal::new(3, 1), PhysicalDecimal::add(a, b).unwrap());
    }

    #[test]
    fn float_total_order() {
        assert_eq!(Ordering::Greater, PhysicalF64::compare(&f64::NAN, &1.0));
        assert_eq!(Ordering::Less, PhysicalF64::compare(&-0.0, &0.0));
    }

    #[test]
    fn from_scalar_converts() {
        assert_eq!(12, PhysicalI16::from_scalar(&ScalarValue::from("12")).unwrap());
        assert_eq!(3.0, PhysicalF64::from_scalar(&ScalarValue::Int8(3)).unwrap());
        PhysicalU8::from_scalar(&ScalarValue::Int32(-1)).unwrap_err();
    }

    #[test]
    fn infinity_only_for_floats() {
        assert_eq!(None, PhysicalI32::infinity(false));
        assert_eq!(None, PhysicalDecimal::infinity(true));
        assert_eq!(Some(f64::NEG_INFINITY), PhysicalF64::infinity(true));
    }

    #[test]
    fn match_macros_dispatch() {
        fn name_of<T: PhysicalType>() -> Result<DataType> {
            Ok(T::DATATYPE)
        }

        let got = match_numeric_type!(DataType::UInt16, T => name_of::<T>()).unwrap();
        assert_eq!(DataType::UInt16, got);

        let err = match_numeric_type!(DataType::Utf8, T => name_of::<T>()).unwrap_err();
        assert!(err.is_type());

        let got = match_comparable_type!(DataType::Utf8, T => name_of::<T>()).unwrap();
        assert_eq!(DataType::Utf8, got);
        let got = match_comparable_type!(DataType::Float32, T => name_of::<T>()).unwrap();
        assert_eq!(DataType::Float32, got);
    }
}
