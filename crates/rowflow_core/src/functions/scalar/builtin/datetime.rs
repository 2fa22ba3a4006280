use chrono::{Datelike, TimeDelta};
use rowflow_error::{Result, RowflowError};

use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{DefaultValue, ParamType, ParamValue, ParameterDef, arg};
use crate::functions::scalar::ScalarFunctionImpl;
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;
use crate::values::parse::{DateTimeParser, FormattedDateTimeParser, Parser};
use crate::values::scalar::ScalarValue;

pub const FUNCTION_ADD_DAYS: FunctionDefinition = FunctionDefinition {
    name: "add_days",
    category: Category::DateTime,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: GenericPolicy::Fixed(DataType::DateTime),
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("days", ParamType::Fixed(DataType::Int64)),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Adds a number of days to a date time.",
        description: "Adds a number of days to a date time. Negative values subtract.",
        examples: &[Example {
            inputs: "'2024-02-28', 2",
            output: "2024-03-01 00:00:00",
        }],
    },
    factory: |_| Ok(FunctionImpl::Map(Box::new(AddDays))),
};

pub const FUNCTION_DAY_OF_WEEK: FunctionDefinition = FunctionDefinition {
    name: "day_of_week",
    category: Category::DateTime,
    aliases: &["dow"],
    kind: FunctionKind::Map,
    generic: GenericPolicy::Fixed(DataType::DateTime),
    inputs: &[ParameterDef::single("value", ParamType::Generic)],
    returns: Some(ParamType::Fixed(DataType::Int32)),
    outputs: &[],
    doc: &Documentation {
        summary: "Returns the ISO day of the week, Monday is 1.",
        description: "Returns the ISO day of the week, from 1 for Monday to 7 for Sunday.",
        examples: &[Example {
            inputs: "'2024-10-13'",
            output: "7",
        }],
    },
    factory: |_| Ok(FunctionImpl::Map(Box::new(DayOfWeek))),
};

pub const FUNCTION_TO_DATETIME: FunctionDefinition = FunctionDefinition {
    name: "to_datetime",
    category: Category::DateTime,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: GenericPolicy::Fixed(DataType::DateTime),
    inputs: &[
        ParameterDef::single("value", ParamType::Fixed(DataType::Utf8)),
        ParameterDef::single("format", ParamType::Fixed(DataType::Utf8))
            .with_default(DefaultValue::Utf8("")),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Parses a string into a date time.",
        description: r#"
Parses a string into a date time using a chrono format string. An empty
format accepts RFC 3339 and common ISO 8601 forms. Formats without a time
component produce midnight.
"#,
        examples: &[Example {
            inputs: "'11/10/2024', '%d/%m/%Y'",
            output: "2024-10-11 00:00:00",
        }],
    },
    factory: bind_to_datetime,
};

#[derive(Debug, Clone, Copy)]
pub struct AddDays;

impl ScalarFunctionImpl for AddDays {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let (value, days) = (arg(args, 0)?, arg(args, 1)?);
        if value.is_null() || days.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }

        let (value, days) = (value.try_as_datetime()?, days.try_as_i64()?);
        let out = TimeDelta::try_days(days)
            .and_then(|delta| value.checked_add_signed(delta))
            .ok_or_else(|| {
                RowflowError::runtime("Date time out of range").with_field("days", days)
            })?;

        Ok(FunctionOutput::value(out))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DayOfWeek;

impl ScalarFunctionImpl for DayOfWeek {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        let dow = value.try_as_datetime()?.weekday().number_from_monday();
        Ok(FunctionOutput::value(ScalarValue::Int32(dow as i32)))
    }
}

fn bind_to_datetime(ctx: &BindContext) -> Result<FunctionImpl> {
    let format = match ctx.constant(1) {
        Some(ScalarValue::Utf8(format)) => Some(format.clone()),
        _ => None,
    };
    Ok(FunctionImpl::Map(Box::new(ToDateTime { format })))
}

#[derive(Debug, Clone)]
pub struct ToDateTime {
    /// Constant format if known at bind.
    format: Option<String>,
}

impl ScalarFunctionImpl for ToDateTime {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        let s = value.try_as_str()?;

        let format = match &self.format {
            Some(format) => format.as_str(),
            None => match arg(args, 1)? {
                ScalarValue::Null => "",
                v => v.try_as_str()?,
            },
        };

        let parsed = if format.is_empty() {
            DateTimeParser.parse(s)
        } else {
            FormattedDateTimeParser {
                format: format.to_string(),
            }
            .parse(s)
        };

        match parsed {
            Some(dt) => Ok(FunctionOutput::value(dt)),
            None => Err(RowflowError::type_error("Failed to parse date time")
                .with_field("value", s)
                .with_field("format", format)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, invoke_value, row, schema, vars};

    fn datetime(y: i32, m: u32, d: u32) -> ScalarValue {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .into()
    }

    #[test]
    fn add_days_crosses_months() {
        let schema = schema(&[("d", DataType::DateTime)]);
        let mut f = bind(
            "datetime.add_days",
            &schema,
            vec![ParameterSpec::column("d"), ParameterSpec::constant(2)],
        );
        assert_eq!(datetime(2024, 3, 1), invoke_value(&mut f, vec![datetime(2024, 2, 28)]));
        assert_eq!(ScalarValue::Null, invoke_value(&mut f, vec![ScalarValue::Null]));
    }

    #[test]
    fn add_days_out_of_range() {
        let schema = schema(&[("d", DataType::DateTime)]);
        let mut f = bind(
            "datetime.add_days",
            &schema,
            vec![ParameterSpec::column("d"), ParameterSpec::constant(i64::MAX)],
        );
        let err = f.invoke(&row(vec![datetime(2024, 1, 1)]), &vars()).unwrap_err();
        assert!(err.is_runtime());
    }

    #[test]
    fn day_of_week_from_string_column() {
        let schema = schema(&[("d", DataType::Utf8)]);
        let mut f = bind("datetime.day_of_week", &schema, vec![ParameterSpec::column("d")]);
        assert_eq!(ScalarValue::Int32(7), invoke_value(&mut f, vec!["2024-10-13".into()]));
        assert_eq!(ScalarValue::Int32(1), invoke_value(&mut f, vec!["2024-10-14 08:00:00".into()]));
    }

    #[test]
    fn to_datetime_formats() {
        let schema = schema(&[("s", DataType::Utf8)]);
        let mut auto = bind("datetime.to_datetime", &schema, vec![ParameterSpec::column("s")]);
        assert_eq!(datetime(2024, 10, 11), invoke_value(&mut auto, vec!["2024-10-11".into()]));

        let mut formatted = bind(
            "datetime.to_datetime",
            &schema,
            vec![ParameterSpec::column("s"), ParameterSpec::constant("%d/%m/%Y")],
        );
        assert_eq!(datetime(2024, 10, 11), invoke_value(&mut formatted, vec!["11/10/2024".into()]));

        let err = formatted
            .invoke(&row(vec!["2024-10-11".into()]), &vars())
            .unwrap_err();
        assert!(err.is_type());
    }
}
