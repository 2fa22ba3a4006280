use std::cmp::Ordering;
use std::marker::PhantomData;

use rowflow_error::Result;

use crate::functions::aggregate::AggregateFunctionImpl;
use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef, arg};
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::match_comparable_type;
use crate::values::physical_type::PhysicalType;
use crate::values::scalar::ScalarValue;

const VALUE_INPUT: &[ParameterDef] = &[ParameterDef::single("value", ParamType::Generic)];

pub const FUNCTION_MIN: FunctionDefinition = FunctionDefinition {
    name: "min",
    category: Category::Aggregate,
    aliases: &["minimum"],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::AnyComparable,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Smallest non-null value in the group.",
        description: "Smallest non-null value in the group, null if there are none.",
        examples: &[Example {
            inputs: "3, 1, 2",
            output: "1",
        }],
    },
    factory: bind_minmax::<MinSelect>,
};

pub const FUNCTION_MAX: FunctionDefinition = FunctionDefinition {
    name: "max",
    category: Category::Aggregate,
    aliases: &["maximum"],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::AnyComparable,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Largest non-null value in the group.",
        description: "Largest non-null value in the group, null if there are none.",
        examples: &[Example {
            inputs: "3, 1, 2",
            output: "3",
        }],
    },
    factory: bind_minmax::<MaxSelect>,
};

/// Decides if a new value replaces the current one.
pub trait Select: Sync + Send + 'static {
    /// `ord` is the new value compared to the current.
    fn replace(ord: Ordering) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct MinSelect;

impl Select for MinSelect {
    fn replace(ord: Ordering) -> bool {
        ord == Ordering::Less
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MaxSelect;

impl Select for MaxSelect {
    fn replace(ord: Ordering) -> bool {
        ord == Ordering::Greater
    }
}

fn bind_minmax<S: Select + std::fmt::Debug>(ctx: &BindContext) -> Result<FunctionImpl> {
    match_comparable_type!(ctx.datatype, T => {
        Ok(FunctionImpl::Aggregate(Box::new(MinMax::<T, S>::new())))
    })
}

#[derive(Debug)]
pub struct MinMax<T: PhysicalType, S> {
    current: Option<T::Native>,
    _s: PhantomData<S>,
}

impl<T: PhysicalType, S> MinMax<T, S> {
    pub fn new() -> Self {
        MinMax {
            current: None,
            _s: PhantomData,
        }
    }
}

impl<T: PhysicalType, S: Select + std::fmt::Debug> AggregateFunctionImpl for MinMax<T, S> {
    fn reset(&mut self) {
        self.current = None;
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(());
        }
        let value = T::from_scalar(value)?;
        match &self.current {
            Some(current) if !S::replace(T::compare(&value, current)) => (),
            _ => self.current = Some(value),
        }
        Ok(())
    }

    fn finalize(&mut self, _index: usize) -> Result<FunctionOutput> {
        let value = match &self.current {
            Some(v) => T::into_scalar(v.clone()),
            None => ScalarValue::Null,
        };
        Ok(FunctionOutput::value(value))
    }
}
