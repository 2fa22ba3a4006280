use std::cmp::Ordering;

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
use crate::values::scalar::key::ScalarKey;

pub const FUNCTION_RANK: FunctionDefinition = FunctionDefinition {
    name: "rank",
    category: Category::Aggregate,
    aliases: &[],
    kind: FunctionKind::Aggregate,
    generic: GenericPolicy::AnyComparable,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("descending", ParamType::Fixed(DataType::Boolean))
            .with_default(DefaultValue::Boolean(false)),
    ],
    returns: Some(ParamType::Fixed(DataType::Int64)),
    outputs: &[],
    doc: &Documentation {
        summary: "Rank of each row's value within the group.",
        description: r#"
Rank of each row's value within the group, one result per row. Ascending
ranks start at 1 and increase by the number of tied values at each distinct
value. Descending ranks start at the group size and decrease by the number
of tied values. Tied values share a rank. Nulls rank lowest.
"#,
        examples: &[Example {
            inputs: "5, 3, 3, 1",
            output: "4, 2, 2, 1",
        }],
    },
    factory: bind_rank,
};

fn bind_rank(ctx: &BindContext) -> Result<FunctionImpl> {
    let descending = ctx.try_constant(1)?.try_as_bool()?;
    Ok(FunctionImpl::Aggregate(Box::new(Rank {
        descending,
        values: Vec::new(),
        ranks: None,
    })))
}

#[derive(Debug)]
pub struct Rank {
    descending: bool,
    values: Vec<ScalarKey>,
    /// Ranks in input order, computed on first finalize.
    ranks: Option<Vec<i64>>,
}

impl Rank {
    fn compute_ranks(&self) -> Vec<i64> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[a].cmp(&self.values[b]));

        let n = self.values.len() as i64;
        let mut ranks = vec![0; self.values.len()];
        let mut less = 0;
        let mut start = 0;

        while start < order.len() {
            let mut end = start + 1;
            while end < order.len()
                && self.values[order[end]].cmp(&self.values[order[start]]) == Ordering::Equal
            {
                end += 1;
            }

            let rank = if self.descending { n - less } else { less + 1 };
            for &idx in &order[start..end] {
                ranks[idx] = rank;
            }

            less += (end - start) as i64;
            start = end;
        }

        ranks
    }
}

impl AggregateFunctionImpl for Rank {
    fn reset(&mut self) {
        self.values.clear();
        self.ranks = None;
    }

    fn update(&mut self, args: &[ParamValue]) -> Result<()> {
        self.values.push(ScalarKey(arg(args, 0)?.clone()));
        self.ranks = None;
        Ok(())
    }

    fn finalize(&mut self, index: usize) -> Result<FunctionOutput> {
        if self.ranks.is_none() {
            self.ranks = Some(self.compute_ranks());
        }
        let rank = self
            .ranks
            .as_ref()
            .and_then(|ranks| ranks.get(index).copied());
        Ok(FunctionOutput::value(rank.map(ScalarValue::Int64)))
    }

    fn result_count(&self) -> usize {
        self.values.len()
    }
}
