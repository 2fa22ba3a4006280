//! Functions producing zero or more rows per input row.
pub mod builtin;

use std::collections::VecDeque;
use std::fmt::Debug;

use rowflow_error::Result;

use super::FunctionOutput;
use super::parameter::ParamValue;

pub trait RowsFunctionImpl: Debug + Send {
    /// Forget the current input row.
    fn reset(&mut self);

    /// Produce the next output for the current input row, None once the row
    /// is exhausted.
    fn next(&mut self, args: &[ParamValue]) -> Result<Option<FunctionOutput>>;
}

/// Expands an input row into all of its outputs up front, then hands them
/// out one at a time.
pub trait RowExpander: Debug + Send {
    fn expand(&self, args: &[ParamValue]) -> Result<VecDeque<FunctionOutput>>;
}

#[derive(Debug)]
pub struct ExpandedRows<E> {
    expander: E,
    /// Outputs left for the current input row, None before the first call.
    pending: Option<VecDeque<FunctionOutput>>,
}

impl<E: RowExpander> ExpandedRows<E> {
    pub fn new(expander: E) -> Self {
        ExpandedRows {
            expander,
            pending: None,
        }
    }
}

impl<E: RowExpander> RowsFunctionImpl for ExpandedRows<E> {
    fn reset(&mut self) {
        self.pending = None;
    }

    fn next(&mut self, args: &[ParamValue]) -> Result<Option<FunctionOutput>> {
        if self.pending.is_none() {
            self.pending = Some(self.expander.expand(args)?);
        }
        Ok(self.pending.as_mut().and_then(|pending| pending.pop_front()))
    }
}
