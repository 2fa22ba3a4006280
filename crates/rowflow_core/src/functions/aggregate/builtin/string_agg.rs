use rowflow_error::Result;

use crate::functions::aggregate::AggregateFunctionImpl;
use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{DefaultValue, ParamType, ParamValue, ParameterDef, arg};
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;

pub const FUNCTION_CONCAT: FunctionDefinition = FunctionDefinition {
    name: "concat",
    category: Category::Aggregate,
    aliases: &["string_agg"],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::Fixed(DataType::Utf8),
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("delimiter", ParamType::Fixed(DataType::Utf8))
            .with_default(DefaultValue::Utf8(",")),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Concatenates the non-null values in the group.",
        description: r#"
Concatenates the non-null values in the group in input order, separated by
the delimiter. The delimiter must be a constant. Null for a group with no
values.
"#,
        examples: &[Example {
            inputs: "'a', 'b', 'c'",
            output: "a,b,c",
        }],
    },
    factory: bind_string_agg,
};

fn bind_string_agg(ctx: &BindContext) -> Result<FunctionImpl> {
    let delimiter = match ctx.try_constant(1)? {
        ScalarValue::Null => String::new(),
        v => v.try_as_str()?.to_string(),
    };
    Ok(FunctionImpl::Aggregate(Box::new(StringAgg {
        delimiter,
        buf: None,
    })))
}

#[derive(Debug)]
pub struct StringAgg {
    delimiter: String,
    buf: Option<String>,
}

impl AggregateFunctionImpl for StringAgg {
    fn reset(&mut self) {
        self.buf = None;
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(());
        }
        let value = value.try_as_str()?;
        match &mut self.buf {
            Some(buf) => {
                buf.push_str(&self.delimiter);
                buf.push_str(value);
            }
            None => self.buf = Some(value.to_string()),
        }
        Ok(())
    }

    fn finalize(&mut self, _index: usize) -> Result<FunctionOutput> {
        Ok(FunctionOutput::value(self.buf.clone()))
    }
}
