use rowflow_error::{Result, RowflowError};

use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{
    DefaultValue,
    ParamType,
    ParamValue,
    ParameterDef,
    arg,
    group_arg,
};
use crate::functions::scalar::ScalarFunctionImpl;
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;

const UTF8: GenericPolicy = GenericPolicy::Fixed(DataType::Utf8);
const VALUE_INPUT: &[ParameterDef] = &[ParameterDef::single("value", ParamType::Generic)];

pub const FUNCTION_CONCAT: FunctionDefinition = FunctionDefinition {
    name: "concat",
    category: Category::String,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: &[
        ParameterDef::group("values", ParamType::Generic),
        ParameterDef::single("delimiter", ParamType::Fixed(DataType::Utf8))
            .with_default(DefaultValue::Utf8("")),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Concatenates values with a delimiter.",
        description: r#"
Concatenates values with a delimiter. Null values are skipped, null if every
value is null.
"#,
        examples: &[Example {
            inputs: "['a', NULL, 'b'], '-'",
            output: "a-b",
        }],
    },
    factory: |_| Ok(FunctionImpl::Map(Box::new(Concat))),
};

pub const FUNCTION_UPPER: FunctionDefinition = FunctionDefinition {
    name: "upper",
    category: Category::String,
    aliases: &["ucase"],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Converts a string to upper case.",
        description: "Converts a string to upper case.",
        examples: &[Example {
            inputs: "'abc'",
            output: "ABC",
        }],
    },
    factory: |_| Ok(FunctionImpl::Map(Box::new(StringMap(str::to_uppercase)))),
};

pub const FUNCTION_LOWER: FunctionDefinition = FunctionDefinition {
    name: "lower",
    category: Category::String,
    aliases: &["lcase"],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Converts a string to lower case.",
        description: "Converts a string to lower case.",
        examples: &[Example {
            inputs: "'ABC'",
            output: "abc",
        }],
    },
    factory: |_| Ok(FunctionImpl::Map(Box::new(StringMap(str::to_lowercase)))),
};

pub const FUNCTION_TRIM: FunctionDefinition = FunctionDefinition {
    name: "trim",
    category: Category::String,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Removes leading and trailing whitespace.",
        description: "Removes leading and trailing whitespace.",
        examples: &[Example {
            inputs: "'  abc '",
            output: "abc",
        }],
    },
    factory: |_| Ok(FunctionImpl::Map(Box::new(StringMap(|s| s.trim().to_string())))),
};

pub const FUNCTION_LENGTH: FunctionDefinition = FunctionDefinition {
    name: "length",
    category: Category::String,
    aliases: &["len"],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Fixed(DataType::Int64)),
    outputs: &[],
    doc: &Documentation {
        summary: "Returns the number of characters in a string.",
        description: "Returns the number of characters in a string.",
        examples: &[Example {
            inputs: "'héllo'",
            output: "5",
        }],
    },
    factory: |_| Ok(FunctionImpl::Map(Box::new(Length))),
};

pub const FUNCTION_SUBSTRING: FunctionDefinition = FunctionDefinition {
    name: "substring",
    category: Category::String,
    aliases: &["substr"],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("start", ParamType::Fixed(DataType::Int64)),
        ParameterDef::single("length", ParamType::Fixed(DataType::Int64))
            .with_default(DefaultValue::Int(-1)),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Extracts part of a string.",
        description: r#"
Extracts `length` characters starting at the zero-based `start`. A negative
length takes the rest of the string. Starting past the end returns an empty
string.
"#,
        examples: &[Example {
            inputs: "'abcdef', 1, 3",
            output: "bcd",
        }],
    },
    factory: |_| Ok(FunctionImpl::Map(Box::new(Substring))),
};

pub const FUNCTION_REPLACE: FunctionDefinition = FunctionDefinition {
    name: "replace",
    category: Category::String,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("from", ParamType::Generic),
        ParameterDef::single("to", ParamType::Generic),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Replaces every occurrence of a substring.",
        description: "Replaces every occurrence of `from` with `to`.",
        examples: &[Example {
            inputs: "'a-b-c', '-', '+'",
            output: "a+b+c",
        }],
    },
    factory: |_| Ok(FunctionImpl::Map(Box::new(Replace))),
};

pub const FUNCTION_SPLIT_COLUMNS: FunctionDefinition = FunctionDefinition {
    name: "split_columns",
    category: Category::String,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("delimiter", ParamType::Generic)
            .with_default(DefaultValue::Utf8(",")),
    ],
    returns: None,
    outputs: &[ParameterDef::group("columns", ParamType::Generic)],
    doc: &Documentation {
        summary: "Splits a string across a group of output columns.",
        description: r#"
Splits a string on a delimiter, writing each part to the next output column.
Missing parts are null, extra parts are dropped.
"#,
        examples: &[Example {
            inputs: "'a,b', ','",
            output: "columns: ['a', 'b', NULL]",
        }],
    },
    factory: bind_split_columns,
};

#[derive(Debug, Clone, Copy)]
pub struct StringMap(fn(&str) -> String);

impl ScalarFunctionImpl for StringMap {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        Ok(FunctionOutput::value((self.0)(value.try_as_str()?)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Concat;

impl ScalarFunctionImpl for Concat {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let values = group_arg(args, 0)?;
        let delimiter = match arg(args, 1)? {
            ScalarValue::Null => "",
            v => v.try_as_str()?,
        };

        let mut parts = values.iter().filter(|v| !v.is_null()).peekable();
        if parts.peek().is_none() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }

        let mut out = String::new();
        for (idx, part) in parts.enumerate() {
            if idx > 0 {
                out.push_str(delimiter);
            }
            out.push_str(part.try_as_str()?);
        }

        Ok(FunctionOutput::value(out))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Length;

impl ScalarFunctionImpl for Length {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        let len = value.try_as_str()?.chars().count();
        Ok(FunctionOutput::value(ScalarValue::Int64(len as i64)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Substring;

impl ScalarFunctionImpl for Substring {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let (value, start, length) = (arg(args, 0)?, arg(args, 1)?, arg(args, 2)?);
        if value.is_null() || start.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }

        let start = start.try_as_i64()?;
        if start < 0 {
            return Err(RowflowError::runtime("Substring start cannot be negative")
                .with_field("start", start));
        }

        let chars = value.try_as_str()?.chars().skip(start as usize);
        let out: String = match length {
            ScalarValue::Null => chars.collect(),
            length => match length.try_as_i64()? {
                n if n < 0 => chars.collect(),
                n => chars.take(n as usize).collect(),
            },
        };

        Ok(FunctionOutput::value(out))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Replace;

impl ScalarFunctionImpl for Replace {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let (value, from, to) = (arg(args, 0)?, arg(args, 1)?, arg(args, 2)?);
        if value.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        let value = value.try_as_str()?;
        let from = match from {
            ScalarValue::Null => return Ok(FunctionOutput::value(value)),
            v => v.try_as_str()?,
        };
        if from.is_empty() {
            return Ok(FunctionOutput::value(value));
        }
        let to = match to {
            ScalarValue::Null => "",
            v => v.try_as_str()?,
        };
        Ok(FunctionOutput::value(value.replace(from, to)))
    }
}

fn bind_split_columns(ctx: &BindContext) -> Result<FunctionImpl> {
    if let Some(ScalarValue::Utf8(delimiter)) = ctx.constant(1) {
        if delimiter.is_empty() {
            return Err(RowflowError::binding("Split delimiter cannot be empty"));
        }
    }
    Ok(FunctionImpl::Map(Box::new(SplitColumns {
        columns: ctx.output_len(0),
    })))
}

#[derive(Debug, Clone, Copy)]
pub struct SplitColumns {
    /// Number of bound output columns.
    columns: usize,
}

impl ScalarFunctionImpl for SplitColumns {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let (value, delimiter) = (arg(args, 0)?, arg(args, 1)?);

        let mut parts = Vec::with_capacity(self.columns);
        if !value.is_null() {
            let value = value.try_as_str()?;
            let delimiter = match delimiter {
                ScalarValue::Null => ",",
                v => v.try_as_str()?,
            };
            if delimiter.is_empty() {
                return Err(RowflowError::runtime("Split delimiter cannot be empty"));
            }
            parts.extend(
                value
                    .split(delimiter)
                    .take(self.columns)
                    .map(|part| ScalarValue::Utf8(part.to_string())),
            );
        }
        parts.resize(self.columns, ScalarValue::Null);

        Ok(FunctionOutput::with_outputs(
            ScalarValue::Null,
            vec![ParamValue::Group(parts)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::transform::TransformConfig;
    use crate::functions::catalog::FunctionCatalog;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, invoke_value, row, schema, vars};

    #[test]
    fn concat_skips_nulls() {
        let schema = schema(&[("a", DataType::Utf8), ("b", DataType::Int32)]);
        let mut f = bind(
            "string.concat",
            &schema,
            vec![
                ParameterSpec::Group(vec![
                    ParameterSpec::column("a"),
                    ParameterSpec::column("b"),
                    ParameterSpec::constant("z"),
                ]),
                ParameterSpec::constant("-"),
            ],
        );

        assert_eq!(
            ScalarValue::from("x-4-z"),
            invoke_value(&mut f, vec!["x".into(), 4.into()])
        );
        assert_eq!(
            ScalarValue::from("4-z"),
            invoke_value(&mut f, vec![ScalarValue::Null, 4.into()])
        );
    }

    #[test]
    fn concat_all_null() {
        let schema = schema(&[("a", DataType::Utf8)]);
        let mut f = bind(
            "string.concat",
            &schema,
            vec![ParameterSpec::Group(vec![ParameterSpec::column("a")])],
        );
        assert_eq!(ScalarValue::Null, invoke_value(&mut f, vec![ScalarValue::Null]));
    }

    #[test]
    fn case_and_trim() {
        let schema = schema(&[("a", DataType::Utf8)]);
        let cases = [
            ("string.upper", " aBc ", " ABC "),
            ("string.lower", " aBc ", " abc "),
            ("string.trim", " aBc ", "aBc"),
        ];
        for (name, input, expected) in cases {
            let mut f = bind(name, &schema, vec![ParameterSpec::column("a")]);
            assert_eq!(ScalarValue::from(expected), invoke_value(&mut f, vec![input.into()]));
            assert_eq!(ScalarValue::Null, invoke_value(&mut f, vec![ScalarValue::Null]));
        }
    }

    #[test]
    fn length_counts_chars() {
        let schema = schema(&[("a", DataType::Utf8)]);
        let mut f = bind("string.length", &schema, vec![ParameterSpec::column("a")]);
        assert_eq!(ScalarValue::Int64(5), invoke_value(&mut f, vec!["héllo".into()]));
        assert_eq!(DataType::Int64, f.returns().unwrap().datatype);
    }

    #[test]
    fn substring_cases() {
        let schema = schema(&[("a", DataType::Utf8), ("s", DataType::Int32)]);
        let mut f = bind(
            "string.substring",
            &schema,
            vec![ParameterSpec::column("a"), ParameterSpec::column("s")],
        );
        assert_eq!(
            ScalarValue::from("cdef"),
            invoke_value(&mut f, vec!["abcdef".into(), 2.into()])
        );
        assert_eq!(ScalarValue::from(""), invoke_value(&mut f, vec!["abc".into(), 10.into()]));
        let err = f
            .invoke(&row(vec!["abc".into(), (-1).into()]), &vars())
            .unwrap_err();
        assert!(err.is_runtime());

        let mut f = bind(
            "string.substring",
            &schema,
            vec![
                ParameterSpec::column("a"),
                ParameterSpec::constant(1),
                ParameterSpec::constant(3),
            ],
        );
        assert_eq!(ScalarValue::from("bcd"), invoke_value(&mut f, vec!["abcdef".into(), 0.into()]));
    }

    #[test]
    fn replace_occurrences() {
        let schema = schema(&[("a", DataType::Utf8)]);
        let mut f = bind(
            "string.replace",
            &schema,
            vec![
                ParameterSpec::column("a"),
                ParameterSpec::constant("-"),
                ParameterSpec::constant("+"),
            ],
        );
        assert_eq!(ScalarValue::from("a+b+c"), invoke_value(&mut f, vec!["a-b-c".into()]));
    }

    #[test]
    fn split_pads_and_truncates() {
        let schema = schema(&[("a", DataType::Utf8)]);
        let mut f = FunctionCatalog::builtin()
            .resolve("string.split_columns")
            .unwrap()
            .with_input(ParameterSpec::column("a"))
            .with_output(ParameterSpec::output_group(["c1", "c2", "c3"]))
            .bind(&schema, None, &TransformConfig::default())
            .unwrap();

        let out = f.invoke(&row(vec!["x,y".into()]), &vars()).unwrap();
        assert_eq!(
            vec![ParamValue::Group(vec!["x".into(), "y".into(), ScalarValue::Null])],
            out.outputs
        );

        let out = f.invoke(&row(vec!["1,2,3,4".into()]), &vars()).unwrap();
        assert_eq!(
            vec![ParamValue::Group(vec!["1".into(), "2".into(), "3".into()])],
            out.outputs
        );

        let out = f.invoke(&row(vec![ScalarValue::Null]), &vars()).unwrap();
        assert_eq!(vec![ParamValue::Group(vec![ScalarValue::Null; 3])], out.outputs);
    }

    #[test]
    fn split_empty_delimiter() {
        let schema = schema(&[("a", DataType::Utf8)]);
        let err = FunctionCatalog::builtin()
            .resolve("string.split_columns")
            .unwrap()
            .with_input(ParameterSpec::column("a"))
            .with_input(ParameterSpec::constant(""))
            .bind(&schema, None, &TransformConfig::default())
            .unwrap_err();
        assert!(err.is_binding());
    }
}
