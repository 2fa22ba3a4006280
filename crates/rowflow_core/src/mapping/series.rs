use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use rowflow_error::{Result, RowflowError};
use serde::{Deserialize, Serialize};

use super::{InputRow, Mapping, MappingKind};
use crate::config::transform::TransformConfig;
use crate::values::datatype::DataType;
use crate::values::row::Row;
use crate::values::scalar::ScalarValue;
use crate::values::schema::{ColumnDef, RowSchema};

/// Unit series keys are normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesGrain {
    Second,
    Minute,
    Hour,
    Day,
    /// Weeks start on Monday.
    Week,
    Month,
    Quarter,
    Year,
    /// Integer keys.
    Number,
}

impl SeriesGrain {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::Number => "number",
        }
    }

    /// Type of normalized keys.
    pub const fn datatype(&self) -> DataType {
        match self {
            Self::Number => DataType::Int64,
            _ => DataType::DateTime,
        }
    }

    /// Truncate a value to the start of its grain.
    ///
    /// Nulls stay null.
    pub fn normalize(&self, value: &ScalarValue) -> Result<ScalarValue> {
        if value.is_null() {
            return Ok(ScalarValue::Null);
        }

        let datetime = |value: &ScalarValue| value.try_as_datetime();
        let hms = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN);

        let normalized = match self {
            Self::Number => return Ok(ScalarValue::Int64(value.try_as_i64()?)),
            Self::Second => {
                let dt = datetime(value)?;
                dt.date().and_time(hms(dt.hour(), dt.minute(), dt.second()))
            }
            Self::Minute => {
                let dt = datetime(value)?;
                dt.date().and_time(hms(dt.hour(), dt.minute(), 0))
            }
            Self::Hour => {
                let dt = datetime(value)?;
                dt.date().and_time(hms(dt.hour(), 0, 0))
            }
            Self::Day => datetime(value)?.date().and_time(NaiveTime::MIN),
            Self::Week => {
                let date = datetime(value)?.date();
                let offset = TimeDelta::days(date.weekday().num_days_from_monday() as i64);
                date.checked_sub_signed(offset)
                    .ok_or_else(|| RowflowError::runtime("Series key out of range"))?
                    .and_time(NaiveTime::MIN)
            }
            Self::Month => {
                let date = datetime(value)?.date();
                month_start(date.year(), date.month())?
            }
            Self::Quarter => {
                let date = datetime(value)?.date();
                month_start(date.year(), (date.month0() / 3) * 3 + 1)?
            }
            Self::Year => month_start(datetime(value)?.year(), 1)?,
        };
        Ok(ScalarValue::DateTime(normalized))
    }

    /// Advance a normalized key by `step` grains.
    pub fn next_value(&self, value: &ScalarValue, step: i64) -> Result<ScalarValue> {
        let out_of_range = || {
            RowflowError::runtime("Series key out of range")
                .with_field("grain", self)
                .with_field("step", step)
        };

        let seconds = |unit: i64| -> Result<Option<NaiveDateTime>> {
            let dt = value.try_as_datetime()?;
            Ok(step
                .checked_mul(unit)
                .and_then(TimeDelta::try_seconds)
                .and_then(|delta| dt.checked_add_signed(delta)))
        };
        let months = |unit: i64| -> Result<Option<NaiveDateTime>> {
            let dt = value.try_as_datetime()?;
            Ok(step.checked_mul(unit).and_then(|months| add_months(dt, months)))
        };

        let next = match self {
            Self::Number => {
                let next = value.try_as_i64()?.checked_add(step).ok_or_else(out_of_range)?;
                return Ok(ScalarValue::Int64(next));
            }
            Self::Second => seconds(1)?,
            Self::Minute => seconds(60)?,
            Self::Hour => seconds(3600)?,
            Self::Day => seconds(86_400)?,
            Self::Week => seconds(7 * 86_400)?,
            Self::Month => months(1)?,
            Self::Quarter => months(3)?,
            Self::Year => months(12)?,
        };
        Ok(ScalarValue::DateTime(next.ok_or_else(out_of_range)?))
    }

    /// Keys strictly between `from` and `to`, one grain apart.
    ///
    /// Empty if `to` doesn't come after `from`.
    pub fn fill_values(&self, from: &ScalarValue, to: &ScalarValue) -> Result<Vec<ScalarValue>> {
        let (from, to) = (self.normalize(from)?, self.normalize(to)?);
        if from.is_null() || to.is_null() {
            return Ok(Vec::new());
        }

        let mut filled = Vec::new();
        let mut current = self.next_value(&from, 1)?;
        while current.total_cmp(&to) == Ordering::Less {
            let next = self.next_value(&current, 1)?;
            filled.push(current);
            current = next;
        }
        Ok(filled)
    }
}

fn month_start(year: i32, month: u32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.and_time(NaiveTime::MIN))
        .ok_or_else(|| RowflowError::runtime("Invalid month").with_field("month", month))
}

fn add_months(dt: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let abs = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months < 0 {
        dt.checked_sub_months(abs)
    } else {
        dt.checked_add_months(abs)
    }
}

impl FromStr for SeriesGrain {
    type Err = RowflowError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "second" => Self::Second,
            "minute" => Self::Minute,
            "hour" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "quarter" => Self::Quarter,
            "year" => Self::Year,
            "number" => Self::Number,
            other => {
                return Err(
                    RowflowError::binding("Unknown series grain").with_field("grain", other)
                );
            }
        })
    }
}

impl fmt::Display for SeriesGrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads the series key for each row, normalized to a grain.
///
/// The key is exposed as the current series value, which feeds the series
/// key variable of series functions.
#[derive(Debug)]
pub struct MapSeries {
    column: String,
    grain: SeriesGrain,
    output_name: Option<String>,
    input_ordinal: Option<usize>,
    output_ordinal: Option<usize>,
    current: ScalarValue,
}

impl MapSeries {
    pub fn new(column: impl Into<String>, grain: SeriesGrain) -> Self {
        MapSeries {
            column: column.into(),
            grain,
            output_name: None,
            input_ordinal: None,
            output_ordinal: None,
            current: ScalarValue::Null,
        }
    }

    /// Also write the normalized key to an output column.
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn grain(&self) -> SeriesGrain {
        self.grain
    }

    pub fn next_value(&self, step: i64) -> Result<ScalarValue> {
        self.grain.next_value(&self.current, step)
    }

    /// Keys missing between the current key and `to`.
    pub fn fill_values(&self, to: &ScalarValue) -> Result<Vec<ScalarValue>> {
        self.grain.fill_values(&self.current, to)
    }
}

impl Mapping for MapSeries {
    fn kind(&self) -> MappingKind {
        MappingKind::Series
    }

    fn initialize_input_ordinals(
        &mut self,
        input: &RowSchema,
        _join: Option<&RowSchema>,
        _config: &TransformConfig,
    ) -> Result<()> {
        let (ordinal, column) = input.try_column(&self.column)?;
        let compatible = match self.grain {
            SeriesGrain::Number => column.datatype.is_integer(),
            _ => matches!(column.datatype, DataType::DateTime | DataType::Utf8),
        };
        if !compatible {
            return Err(RowflowError::type_error("Column type not supported by series grain")
                .with_field("column", &self.column)
                .with_field("datatype", column.datatype)
                .with_field("grain", self.grain));
        }
        self.input_ordinal = Some(ordinal);
        Ok(())
    }

    fn add_output_columns(&mut self, output: &mut RowSchema) -> Result<()> {
        if let Some(name) = &self.output_name {
            let column = ColumnDef::new(name.clone(), self.grain.datatype());
            self.output_ordinal = Some(output.push(column)?);
        }
        Ok(())
    }

    fn process_input_row(&mut self, input: &InputRow) -> Result<bool> {
        let ordinal = self
            .input_ordinal
            .ok_or_else(|| RowflowError::new("Series mapping not initialized"))?;
        self.current = self.grain.normalize(input.row.try_get(ordinal)?)?;
        Ok(true)
    }

    fn process_output_row(&mut self, output: &mut Row) -> Result<()> {
        if let Some(ordinal) = self.output_ordinal {
            output.set(ordinal, self.current.clone())?;
        }
        Ok(())
    }

    fn series_value(&self) -> Option<&ScalarValue> {
        Some(&self.current)
    }
}
