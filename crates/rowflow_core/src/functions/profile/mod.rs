//! Profiling aggregates.
//!
//! Profile functions accumulate like aggregates and additionally track how
//! often each value occurred, up to the configured distribution limit.
pub mod builtin;

use std::fmt::Debug;

use indexmap::IndexMap;
use rowflow_error::Result;
use tracing::trace;

use super::parameter::ParamValue;
use crate::values::scalar::ScalarValue;
use crate::values::scalar::key::ScalarKey;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResult {
    pub summary: ScalarValue,
    /// Value counts, most frequent first. Only present for detailed results.
    pub distribution: Option<Vec<(ScalarValue, u64)>>,
}

pub trait ProfileFunctionImpl: Debug + Send {
    fn reset(&mut self);

    fn update(&mut self, args: &[ParamValue]) -> Result<()>;

    fn finalize(&self, detailed: bool) -> Result<ProfileResult>;
}

/// Bounded value to count map.
#[derive(Debug, Clone)]
pub struct Distribution {
    limit: usize,
    counts: IndexMap<ScalarKey, u64>,
    /// Occurrences of values seen after the limit was reached.
    untracked: u64,
}

impl Distribution {
    pub fn new(limit: usize) -> Self {
        Distribution {
            limit,
            counts: IndexMap::new(),
            untracked: 0,
        }
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.untracked = 0;
    }

    pub fn add(&mut self, value: ScalarValue) {
        let key = ScalarKey(value);
        if let Some(count) = self.counts.get_mut(&key) {
            *count += 1;
            return;
        }
        if self.counts.len() >= self.limit {
            if self.untracked == 0 {
                trace!(limit = self.limit, "profile distribution limit reached");
            }
            self.untracked += 1;
            return;
        }
        self.counts.insert(key, 1);
    }

    /// Number of distinct values tracked.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn untracked(&self) -> u64 {
        self.untracked
    }

    /// Counts ordered by frequency, ties in first seen order.
    pub fn to_vec(&self) -> Vec<(ScalarValue, u64)> {
        let mut counts: Vec<_> = self
            .counts
            .iter()
            .map(|(key, count)| (key.value().clone(), *count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    pub fn result(&self, summary: impl Into<ScalarValue>, detailed: bool) -> ProfileResult {
        ProfileResult {
            summary: summary.into(),
            distribution: detailed.then(|| self.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_by_frequency() {
        let mut dist = Distribution::new(10);
        for v in ["b", "a", "a", "c", "b", "a"] {
            dist.add(v.into());
        }
        assert_eq!(
            vec![
                (ScalarValue::from("a"), 3),
                (ScalarValue::from("b"), 2),
                (ScalarValue::from("c"), 1)
            ],
            dist.to_vec()
        );
    }

    #[test]
    fn limit_stops_tracking_new_values() {
        let mut dist = Distribution::new(2);
        for v in [1, 2, 3, 1, 4] {
            dist.add(ScalarValue::Int32(v));
        }
        assert_eq!(2, dist.len());
        assert_eq!(2, dist.untracked());
        assert_eq!((ScalarValue::Int32(1), 2), dist.to_vec()[0]);

        dist.clear();
        assert!(dist.is_empty());
        assert_eq!(0, dist.untracked());
    }
}
