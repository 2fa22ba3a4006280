use rowflow_error::Result;

use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{
    DefaultValue,
    ParamType,
    ParamValue,
    ParameterDef,
    arg,
};
use crate::functions::series::builtin::moving::window_size;
use crate::functions::series::{DuplicateAggregate, SeriesFunctionImpl, SeriesWindow};
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::match_numeric_type;
use crate::values::datatype::DataType;
use crate::values::physical_type::NumericType;
use crate::values::scalar::ScalarValue;

pub const FUNCTION_PREVIOUS_VALUE: FunctionDefinition = FunctionDefinition {
    name: "previous_value",
    category: Category::Series,
    aliases: &["lag"],
    kind: FunctionKind::Series,
    generic: GenericPolicy::AnyNumeric,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("offset", ParamType::Fixed(DataType::Int64))
            .with_default(DefaultValue::Int(1)),
        ParameterDef::single("duplicates", ParamType::Fixed(DataType::Utf8))
            .with_default(DefaultValue::Utf8("sum")),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Value `offset` entries earlier in the series.",
        description: r#"
Value `offset` entries earlier in series key order. Null when there is no
such entry or the entry only saw null values.
"#,
        examples: &[Example {
            inputs: "value, 1",
            output: "value at the previous key",
        }],
    },
    factory: bind_previous_value,
};

fn bind_previous_value(ctx: &BindContext) -> Result<FunctionImpl> {
    let offset = window_size(ctx, 1)?;
    let duplicates = DuplicateAggregate::try_from_context(ctx, 2)?;
    match_numeric_type!(ctx.datatype, T => {
        Ok(FunctionImpl::Series(Box::new(PreviousValue::<T> {
            offset,
            window: SeriesWindow::new(duplicates),
        })))
    })
}

#[derive(Debug)]
pub struct PreviousValue<T: NumericType> {
    offset: usize,
    window: SeriesWindow<T>,
}

impl<T: NumericType> SeriesFunctionImpl for PreviousValue<T> {
    fn reset(&mut self) {
        self.window.clear();
    }

    fn update(&mut self, key: &ScalarValue, args: &[ParamValue]) -> Result<()> {
        let value = match arg(args, 0)? {
            ScalarValue::Null => None,
            value => Some(T::from_scalar(value)?),
        };
        self.window.insert(key, value)
    }

    fn finalize(&mut self, index: usize) -> Result<FunctionOutput> {
        let value = match index.checked_sub(self.offset) {
            Some(idx) => self.window.value_at(idx)?,
            None => None,
        };
        Ok(FunctionOutput::value(value.map(T::into_scalar)))
    }

    fn result_count(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::{ExecutionVariables, ParameterSpec};
    use crate::functions::testutil::{bind, row, schema};

    #[test]
    fn previous_by_key() {
        let schema = schema(&[("v", DataType::Float64)]);
        let mut f = bind("series.lag", &schema, vec![ParameterSpec::column("v")]);

        for (key, value) in [("2024-02", 2.0), ("2024-01", 1.0), ("2024-03", 3.0)] {
            let vars = ExecutionVariables {
                row_index: 0,
                series_key: Some(key.into()),
            };
            f.accumulate(&row(vec![value.into()]), &vars).unwrap();
        }

        let got: Vec<_> = (0..3).map(|idx| f.result(idx).unwrap().value).collect();
        assert_eq!(
            vec![ScalarValue::Null, ScalarValue::Float64(1.0), ScalarValue::Float64(2.0)],
            got
        );
    }
}
