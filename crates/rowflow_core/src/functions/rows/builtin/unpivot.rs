use std::collections::VecDeque;

use rowflow_error::Result;

use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{
    DefaultValue,
    ParamType,
    ParamValue,
    ParameterDef,
    arg,
    group_arg,
};
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

pub const FUNCTION_UNPIVOT: FunctionDefinition = FunctionDefinition {
    name: "unpivot",
    category: Category::Rows,
    aliases: &[],
    kind: FunctionKind::Rows,
    generic: GenericPolicy::AnyComparable,
    inputs: &[
        ParameterDef::linked("labels", ParamType::Fixed(DataType::Utf8), "columns"),
        ParameterDef::linked("values", ParamType::Generic, "columns"),
        ParameterDef::single("skip_nulls", ParamType::Fixed(DataType::Boolean))
            .with_default(DefaultValue::Boolean(false)),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[ParameterDef::single("label", ParamType::Fixed(DataType::Utf8))],
    doc: &Documentation {
        summary: "Turns a group of columns into one row per column.",
        description: r#"
Produces one row per (label, value) pair. The value is returned and the
label written to the `label` output. Labels and values must have the same
number of entries. With `skip_nulls`, pairs with a null value are dropped.
"#,
        examples: &[Example {
            inputs: "['q1', 'q2'], [10, 20]",
            output: "('q1', 10), ('q2', 20)",
        }],
    },
    factory: |_| Ok(FunctionImpl::Rows(Box::new(ExpandedRows::new(Unpivot)))),
};

#[derive(Debug, Clone, Copy)]
pub struct Unpivot;

impl RowExpander for Unpivot {
    fn expand(&self, args: &[ParamValue]) -> Result<VecDeque<FunctionOutput>> {
        let labels = group_arg(args, 0)?;
        let values = group_arg(args, 1)?;
        let skip_nulls = match arg(args, 2)? {
            ScalarValue::Null => false,
            v => v.try_as_bool()?,
        };

        Ok(labels
            .iter()
            .zip(values)
            .filter(|(_, value)| !(skip_nulls && value.is_null()))
            .map(|(label, value)| {
                FunctionOutput::with_outputs(value.clone(), vec![ParamValue::Scalar(label.clone())])
            })
            .collect())
    }
}
