use regex::Regex;
use rowflow_error::{ErrorKind, Result, RowflowError};

use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef, arg};
use crate::functions::scalar::ScalarFunctionImpl;
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;

pub const FUNCTION_REGEX_MATCH: FunctionDefinition = FunctionDefinition {
    name: "regex_match",
    category: Category::Condition,
    aliases: &["regexp_like"],
    kind: FunctionKind::Condition,
    generic: GenericPolicy::Fixed(DataType::Utf8),
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("pattern", ParamType::Generic),
    ],
    returns: Some(ParamType::Fixed(DataType::Boolean)),
    outputs: &[],
    doc: &Documentation {
        summary: "Check if a string matches a regular expression.",
        description: r#"
Check if any part of the string matches the pattern. The pattern must be a
constant and is compiled once when the function is bound. A null value is
false.
"#,
        examples: &[Example {
            inputs: "'abc123', '^[a-z]+[0-9]+$'",
            output: "true",
        }],
    },
    factory: bind_regex_match,
};

fn bind_regex_match(ctx: &BindContext) -> Result<FunctionImpl> {
    let pattern = ctx.try_constant(1)?.try_as_str()?;
    let regex = Regex::new(pattern).map_err(|e| {
        RowflowError::with_source(
            ErrorKind::Type,
            "Invalid regular expression",
            Box::new(e),
        )
        .with_field("pattern", pattern)
    })?;
    Ok(FunctionImpl::Condition(Box::new(RegexMatch { regex })))
}

#[derive(Debug, Clone)]
pub struct RegexMatch {
    regex: Regex,
}

impl ScalarFunctionImpl for RegexMatch {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(FunctionOutput::value(false));
        }
        Ok(FunctionOutput::value(self.regex.is_match(value.try_as_str()?)))
    }
}
