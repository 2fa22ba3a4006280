//! Aggregates over the rows of a group.
pub mod builtin;

use std::fmt::Debug;

use rowflow_error::Result;

use super::FunctionOutput;
use super::parameter::ParamValue;

/// State for one aggregate over one group.
///
/// The driver calls `update` for every row in the group, then `finalize`
/// once per result row. `reset` starts a new group.
pub trait AggregateFunctionImpl: Debug + Send {
    fn reset(&mut self);

    fn update(&mut self, args: &[ParamValue]) -> Result<()>;

    /// Produce the result at `index` within the group.
    ///
    /// Most aggregates have a single result and ignore the index. Positional
    /// aggregates (rank, hierarchy flattening) produce one result per
    /// accumulated row.
    fn finalize(&mut self, index: usize) -> Result<FunctionOutput>;

    /// Number of results available from `finalize`.
    fn result_count(&self) -> usize {
        1
    }
}
