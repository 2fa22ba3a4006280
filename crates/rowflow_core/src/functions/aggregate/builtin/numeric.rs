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
use crate::match_numeric_type;
use crate::values::physical_type::NumericType;
use crate::values::scalar::ScalarValue;

const VALUE_INPUT: &[ParameterDef] = &[ParameterDef::single("value", ParamType::Generic)];

pub const FUNCTION_SUM: FunctionDefinition = FunctionDefinition {
    name: "sum",
    category: Category::Aggregate,
    aliases: &[],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::AnyNumeric,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Sum of the non-null values in the group.",
        description: "Sum of the non-null values in the group. An empty group sums to zero.",
        examples: &[Example {
            inputs: "1, 2, 3",
            output: "6",
        }],
    },
    factory: bind_sum,
};

pub const FUNCTION_AVERAGE: FunctionDefinition = FunctionDefinition {
    name: "average",
    category: Category::Aggregate,
    aliases: &["avg", "mean"],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::AnyNumeric,
    inputs: VALUE_INPUT,
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Average of the non-null values in the group.",
        description: r#"
Average of the non-null values in the group, in the input type. Integer
averages are truncated. Null for a group with no values.
"#,
        examples: &[Example {
            inputs: "1.0, 2.0",
            output: "1.5",
        }],
    },
    factory: bind_average,
};

fn bind_sum(ctx: &BindContext) -> Result<FunctionImpl> {
    match_numeric_type!(ctx.datatype, T => Ok(FunctionImpl::Aggregate(Box::new(Sum::<T>::new()))))
}

fn bind_average(ctx: &BindContext) -> Result<FunctionImpl> {
    match_numeric_type!(ctx.datatype, T => {
        Ok(FunctionImpl::Aggregate(Box::new(Average::<T>::new())))
    })
}

#[derive(Debug)]
pub struct Sum<T: NumericType> {
    sum: T::Native,
    _t: PhantomData<T>,
}

impl<T: NumericType> Sum<T> {
    pub fn new() -> Self {
        Sum {
            sum: T::zero(),
            _t: PhantomData,
        }
    }
}

impl<T: NumericType> AggregateFunctionImpl for Sum<T> {
    fn reset(&mut self) {
        self.sum = T::zero();
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        let value = arg(args, 0)?;
        if !value.is_null() {
            self.sum = T::add(self.sum, T::from_scalar(value)?)?;
        }
        Ok(())
    }

    fn finalize(&mut self, _index: usize) -> Result<FunctionOutput> {
        Ok(FunctionOutput::value(T::into_scalar(self.sum)))
    }
}

#[derive(Debug)]
pub struct Average<T: NumericType> {
    sum: T::Native,
    count: usize,
    _t: PhantomData<T>,
}

impl<T: NumericType> Average<T> {
    pub fn new() -> Self {
        Average {
            sum: T::zero(),
            count: 0,
            _t: PhantomData,
        }
    }
}

impl<T: NumericType> AggregateFunctionImpl for Average<T> {
    fn reset(&mut self) {
        self.sum = T::zero();
        self.count = 0;
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        let value = arg(args, 0)?;
        if !value.is_null() {
            self.sum = T::add(self.sum, T::from_scalar(value)?)?;
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&mut self, _index: usize) -> Result<FunctionOutput> {
        if self.count == 0 {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        let avg = T::divide(self.sum, T::from_count(self.count)?)?;
        Ok(FunctionOutput::value(T::into_scalar(avg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::parameter::ParameterSpec;
    use crate::functions::testutil::{bind, row, schema, vars};
    use crate::values::datatype::DataType;

    #[test]
    fn sum_reset_replays() {
        let schema = schema(&[("a", DataType::Int64)]);
        let mut f = bind("aggregate.sum", &schema, vec![ParameterSpec::column("a")]);

        for _ in 0..2 {
            f.reset();
            for v in 1..=10_i64 {
                f.accumulate(&row(vec![v.into()]), &vars()).unwrap();
            }
            assert_eq!(ScalarValue::Int64(55), f.result(0).unwrap().value);
        }

        f.reset();
        assert_eq!(ScalarValue::Int64(0), f.result(0).unwrap().value);
    }

    #[test]
    fn sum_overflow() {
        let schema = schema(&[("a", DataType::Int8)]);
        let mut f = bind("aggregate.sum", &schema, vec![ParameterSpec::column("a")]);
        f.accumulate(&row(vec![ScalarValue::Int8(100)]), &vars()).unwrap();
        let err = f
            .accumulate(&row(vec![ScalarValue::Int8(100)]), &vars())
            .unwrap_err();
        assert!(err.is_runtime());
    }

    #[test]
    fn average_cases() {
        let schema = schema(&[("i", DataType::Int32), ("f", DataType::Float64)]);
        let mut int = bind("aggregate.average", &schema, vec![ParameterSpec::column("i")]);
        let mut float = bind("aggregate.avg", &schema, vec![ParameterSpec::column("f")]);

        assert_eq!(ScalarValue::Null, int.result(0).unwrap().value);

        for (i, f) in [(1, 1.0), (2, 2.0)] {
            let r = row(vec![ScalarValue::Int32(i), ScalarValue::Float64(f)]);
            int.accumulate(&r, &vars()).unwrap();
            float.accumulate(&r, &vars()).unwrap();
        }
        int.accumulate(&row(vec![ScalarValue::Null, ScalarValue::Null]), &vars())
            .unwrap();

        assert_eq!(ScalarValue::Int32(1), int.result(0).unwrap().value);
        assert_eq!(ScalarValue::Float64(1.5), float.result(0).unwrap().value);
    }
}
