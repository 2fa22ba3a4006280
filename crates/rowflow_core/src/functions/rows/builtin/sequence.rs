use std::cmp::Ordering;

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
use crate::functions::rows::RowsFunctionImpl;
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::match_numeric_type;
use crate::values::physical_type::NumericType;

pub const FUNCTION_SEQUENCE: FunctionDefinition = FunctionDefinition {
    name: "sequence",
    category: Category::Rows,
    aliases: &["generate_series"],
    kind: FunctionKind::Rows,
    generic: GenericPolicy::AnyNumeric,
    inputs: &[
        ParameterDef::single("start", ParamType::Generic),
        ParameterDef::single("stop", ParamType::Generic),
        ParameterDef::single("step", ParamType::Generic).with_default(DefaultValue::Int(1)),
    ],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Produces one row per value from start to stop inclusive.",
        description: r#"
Produces one row per value from `start` to `stop` inclusive, advancing by
`step`. A negative step counts down. A step of zero fails the row. Nulls
produce no rows.
"#,
        examples: &[Example {
            inputs: "1, 7, 3",
            output: "1, 4, 7",
        }],
    },
    factory: bind_sequence,
};

fn bind_sequence(ctx: &BindContext) -> Result<FunctionImpl> {
    match_numeric_type!(ctx.datatype, T => {
        Ok(FunctionImpl::Rows(Box::new(Sequence::<T>::new())))
    })
}

/// Position within the sequence of the current input row.
#[derive(Debug, Clone, Copy)]
enum Cursor<N> {
    /// Arguments not read yet.
    Start,
    Running { next: N, stop: N, step: N },
    Done,
}

/// Steps through the sequence one value per call, so long sequences are
/// never held in memory.
#[derive(Debug)]
pub struct Sequence<T: NumericType> {
    cursor: Cursor<T::Native>,
}

impl<T: NumericType> Sequence<T> {
    pub const fn new() -> Self {
        Sequence {
            cursor: Cursor::Start,
        }
    }

    fn start(args: &[ParamValue]) -> Result<Cursor<T::Native>> {
        let (start, stop, step) = (arg(args, 0)?, arg(args, 1)?, arg(args, 2)?);
        if start.is_null() || stop.is_null() || step.is_null() {
            return Ok(Cursor::Done);
        }
        let step = T::from_scalar(step)?;
        if T::is_zero(step) {
            return Err(RowflowError::runtime("Sequence step cannot be zero"));
        }
        Ok(Cursor::Running {
            next: T::from_scalar(start)?,
            stop: T::from_scalar(stop)?,
            step,
        })
    }
}

impl<T: NumericType> RowsFunctionImpl for Sequence<T> {
    fn reset(&mut self) {
        self.cursor = Cursor::Start;
    }

    fn next(&mut self, args: &[ParamValue]) -> Result<Option<FunctionOutput>> {
        if let Cursor::Start = self.cursor {
            self.cursor = Self::start(args)?;
        }
        let (current, stop, step) = match self.cursor {
            Cursor::Running { next, stop, step } => (next, stop, step),
            Cursor::Start | Cursor::Done => return Ok(None),
        };

        // Direction the sequence must keep moving in.
        let continue_while = if T::is_negative(step) {
            Ordering::Greater
        } else {
            Ordering::Less
        };

        self.cursor = match T::compare(&current, &stop) {
            Ordering::Equal => Cursor::Done,
            ord if ord == continue_while => match T::add(current, step) {
                Ok(next) => Cursor::Running { next, stop, step },
                // Stepping past the type's range ends the sequence.
                Err(_) => Cursor::Done,
            },
            _ => {
                self.cursor = Cursor::Done;
                return Ok(None);
            }
        };

        Ok(Some(FunctionOutput::value(T::into_scalar(current))))
    }
}
