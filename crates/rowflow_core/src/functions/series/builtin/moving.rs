use rowflow_error::{Result, RowflowError};

use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{
    DefaultValue,
    ParamType,
    ParamValue,
    ParameterDef,
    arg,
};
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

const MOVING_INPUTS: &[ParameterDef] = &[
    ParameterDef::single("value", ParamType::Generic),
    ParameterDef::single("pre", ParamType::Fixed(DataType::Int64))
        .with_default(DefaultValue::Int(0)),
    ParameterDef::single("post", ParamType::Fixed(DataType::Int64))
        .with_default(DefaultValue::Int(0)),
    ParameterDef::single("duplicates", ParamType::Fixed(DataType::Utf8))
        .with_default(DefaultValue::Utf8("sum")),
];

pub const FUNCTION_MOVING_SUM: FunctionDefinition = FunctionDefinition {
    name: "moving_sum",
    category: Category::Series,
    aliases: &[],
    kind: FunctionKind::Series,
    generic: GenericPolicy::AnyNumeric,
    inputs: MOVING_INPUTS,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Sum over a window of the series.",
        description: r#"
Sums the values from `pre` entries before to `post` entries after the current
position in series key order. Values sharing a key are merged first using the
`duplicates` policy (sum, average, min, max, count, first, last). Null values
are skipped, but their key still holds a position in the series.
"#,
        examples: &[Example {
            inputs: "value, 1, 0",
            output: "value + previous value",
        }],
    },
    factory: bind_moving::<false>,
};

pub const FUNCTION_MOVING_AVERAGE: FunctionDefinition = FunctionDefinition {
    name: "moving_average",
    category: Category::Series,
    aliases: &[],
    kind: FunctionKind::Series,
    generic: GenericPolicy::AnyNumeric,
    inputs: MOVING_INPUTS,
    returns: Some(ParamType::Fixed(DataType::Float64)),
    outputs: &[],
    doc: &Documentation {
        summary: "Average over a window of the series.",
        description: r#"
Average of the values in the same window as `moving_sum`. Keys whose values
are all null do not count towards the average. Zero for an empty window.
"#,
        examples: &[Example {
            inputs: "value, 2, 0",
            output: "average of the last three entries",
        }],
    },
    factory: bind_moving::<true>,
};

/// Read a window size from a constant input.
pub(super) fn window_size(ctx: &BindContext, idx: usize) -> Result<usize> {
    let size = ctx.try_constant(idx)?.try_as_i64()?;
    usize::try_from(size).map_err(|_| {
        RowflowError::binding("Window size cannot be negative").with_field("size", size)
    })
}

fn bind_moving<const AVERAGE: bool>(ctx: &BindContext) -> Result<FunctionImpl> {
    let pre = window_size(ctx, 1)?;
    let post = window_size(ctx, 2)?;
    let duplicates = DuplicateAggregate::try_from_context(ctx, 3)?;

    match_numeric_type!(ctx.datatype, T => {
        Ok(FunctionImpl::Series(Box::new(Moving::<T, AVERAGE> {
            pre,
            post,
            window: SeriesWindow::new(duplicates),
        })))
    })
}

#[derive(Debug)]
pub struct Moving<T: NumericType, const AVERAGE: bool> {
    pre: usize,
    post: usize,
    window: SeriesWindow<T>,
}

impl<T: NumericType, const AVERAGE: bool> SeriesFunctionImpl for Moving<T, AVERAGE> {
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
        let (sum, count) = self.window.window_sum(index, self.pre, self.post)?;
        if AVERAGE {
            let avg = if count == 0 {
                0.0
            } else {
                T::to_f64(sum) / count as f64
            };
            Ok(FunctionOutput::value(avg))
        } else {
            Ok(FunctionOutput::value(T::into_scalar(sum)))
        }
    }

    fn result_count(&self) -> usize {
        self.window.len()
    }
}
