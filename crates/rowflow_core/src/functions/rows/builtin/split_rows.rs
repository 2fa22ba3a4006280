use std::collections::VecDeque;

use rowflow_error::{Result, RowflowError};

use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{DefaultValue, ParamType, ParamValue, ParameterDef, arg};
use crate::functions::rows::{ExpandedRows, RowExpander};
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;

pub const FUNCTION_SPLIT_ROWS: FunctionDefinition = FunctionDefinition {
    name: "split_rows",
    category: Category::Rows,
    aliases: &[],
    kind: FunctionKind::Rows,
    generic: GenericPolicy::Fixed(DataType::Utf8),
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("delimiter", ParamType::Generic)
            .with_default(DefaultValue::Utf8(",")),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[ParameterDef::single("index", ParamType::Fixed(DataType::Int64))],
    doc: &Documentation {
        summary: "Splits a string into one row per part.",
        description: r#"
Splits a string on a delimiter, producing one row per part. The optional
`index` output receives the zero-based position of the part. A null value
produces no rows.
"#,
        examples: &[Example {
            inputs: "'a,b,c'",
            output: "'a', 'b', 'c'",
        }],
    },
    factory: |_| Ok(FunctionImpl::Rows(Box::new(ExpandedRows::new(SplitRows)))),
};

#[derive(Debug, Clone, Copy)]
pub struct SplitRows;

impl RowExpander for SplitRows {
    fn expand(&self, args: &[ParamValue]) -> Result<VecDeque<FunctionOutput>> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(VecDeque::new());
        }
        let delimiter = match arg(args, 1)? {
            ScalarValue::Null => ",",
            v => v.try_as_str()?,
        };
        if delimiter.is_empty() {
            return Err(RowflowError::runtime("Split delimiter cannot be empty"));
        }

        Ok(value
            .try_as_str()?
            .split(delimiter)
            .enumerate()
            .map(|(idx, part)| {
                FunctionOutput::with_outputs(
                    part,
                    vec![ParamValue::Scalar(ScalarValue::Int64(idx as i64))],
                )
            })
            .collect())
    }
}
