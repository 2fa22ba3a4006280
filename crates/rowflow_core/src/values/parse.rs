//! Parsing related utilities for converting strings into typed values.
use std::marker::PhantomData;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Converts strings read from sources or constants into typed values.
pub trait Parser {
    type Type;

    /// Returns None if `s` is not a valid `Type`. Surrounding whitespace is
    /// ignored.
    fn parse(&mut self, s: &str) -> Option<Self::Type>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolParser;

impl Parser for BoolParser {
    type Type = bool;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        match s.trim() {
            "t" | "true" | "TRUE" | "True" | "T" | "1" | "y" | "yes" => Some(true),
            "f" | "false" | "FALSE" | "False" | "F" | "0" | "n" | "no" => Some(false),
            _ => None,
        }
    }
}

/// Parser for any type implementing `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FromStrParser<T: FromStr> {
    _type: PhantomData<T>,
}

impl<T: FromStr> FromStrParser<T> {
    pub const fn new() -> Self {
        FromStrParser { _type: PhantomData }
    }
}

impl<T: FromStr> Parser for FromStrParser<T> {
    type Type = T;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        T::from_str(s.trim()).ok()
    }
}

pub type Int8Parser = FromStrParser<i8>;
pub type Int16Parser = FromStrParser<i16>;
pub type Int32Parser = FromStrParser<i32>;
pub type Int64Parser = FromStrParser<i64>;
pub type UInt8Parser = FromStrParser<u8>;
pub type UInt16Parser = FromStrParser<u16>;
pub type UInt32Parser = FromStrParser<u32>;
pub type UInt64Parser = FromStrParser<u64>;
pub type Float32Parser = FromStrParser<f32>;
pub type Float64Parser = FromStrParser<f64>;

/// Parse a decimal, accepting scientific notation as a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalParser;

impl Parser for DecimalParser {
    type Type = Decimal;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        let s = s.trim();
        Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UuidParser;

impl Parser for UuidParser {
    type Type = Uuid;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        Uuid::parse_str(s.trim()).ok()
    }
}

/// Parse a date time in one of the common formats.
///
/// Example formats:
///
/// '2024-10-11T10:15:00+02:00'
/// '2024-10-11 10:15:00'
/// '2024-10-11T10:15:00.250'
/// '2024-10-11'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeParser;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

impl Parser for DateTimeParser {
    type Type = NaiveDateTime;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(dt);
            }
        }

        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
        date.and_hms_opt(0, 0, 0)
    }
}

/// Parse a date time using an explicit chrono format string.
///
/// Formats without a time component are parsed as a date at midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDateTimeParser {
    pub format: String,
}

impl Parser for FormattedDateTimeParser {
    type Type = NaiveDateTime;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        match NaiveDateTime::parse_from_str(s, &self.format) {
            Ok(dt) => Some(dt),
            Err(_) => NaiveDate::parse_from_str(s, &self.format)
                .ok()?
                .and_hms_opt(0, 0, 0),
        }
    }
}
