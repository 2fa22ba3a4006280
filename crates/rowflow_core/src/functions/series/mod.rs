//! Aggregates over an ordered series key.
//!
//! Each update carries the current series key. Values sharing a key are
//! merged using a `DuplicateAggregate` policy, and results are addressed by
//! position within the key order.
pub mod builtin;

use std::fmt::{self, Debug};
use std::ops::Range;
use std::str::FromStr;

use rowflow_error::{Result, RowflowError};
use serde::{Deserialize, Serialize};

use super::FunctionOutput;
use super::bind::BindContext;
use super::parameter::ParamValue;
use crate::values::physical_type::NumericType;
use crate::values::scalar::ScalarValue;
use crate::values::scalar::key::ScalarKey;

pub trait SeriesFunctionImpl: Debug + Send {
    fn reset(&mut self);

    /// Add a value at `key`.
    fn update(&mut self, key: &ScalarValue, args: &[ParamValue]) -> Result<()>;

    /// Produce the result for the entry at `index` in key order.
    fn finalize(&mut self, index: usize) -> Result<FunctionOutput>;

    /// Number of distinct keys seen, including keys with only null values.
    fn result_count(&self) -> usize;
}

/// How values with the same series key are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DuplicateAggregate {
    #[default]
    Sum,
    Average,
    Min,
    Max,
    Count,
    First,
    Last,
}

impl DuplicateAggregate {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "average",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
            Self::First => "first",
            Self::Last => "last",
        }
    }

    /// Read the policy from a constant input.
    pub fn try_from_context(ctx: &BindContext, idx: usize) -> Result<Self> {
        ctx.try_constant(idx)?.try_as_str()?.parse()
    }
}

impl FromStr for DuplicateAggregate {
    type Err = RowflowError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Self::Sum,
            "average" | "avg" => Self::Average,
            "min" => Self::Min,
            "max" => Self::Max,
            "count" => Self::Count,
            "first" => Self::First,
            "last" => Self::Last,
            _ => {
                return Err(RowflowError::binding("Unknown duplicate aggregate")
                    .with_field("duplicates", s));
            }
        })
    }
}

impl fmt::Display for DuplicateAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct SeriesEntry<N> {
    key: ScalarKey,
    /// None until a non-null value arrives for the key.
    value: Option<N>,
    count: usize,
}

/// Values ordered by series key, built incrementally.
#[derive(Debug)]
pub struct SeriesWindow<T: NumericType> {
    duplicates: DuplicateAggregate,
    entries: Vec<SeriesEntry<T::Native>>,
}

impl<T: NumericType> SeriesWindow<T> {
    pub fn new(duplicates: DuplicateAggregate) -> Self {
        SeriesWindow {
            duplicates,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Insert a value, merging it with an existing entry for the same key.
    ///
    /// A None value records the key without contributing to it, keeping key
    /// positions aligned with every row seen.
    pub fn insert(&mut self, key: &ScalarValue, value: Option<T::Native>) -> Result<()> {
        let key = ScalarKey(key.clone());
        let idx = match self.entries.binary_search_by(|entry| entry.key.cmp(&key)) {
            Ok(idx) => idx,
            Err(idx) => {
                self.entries.insert(
                    idx,
                    SeriesEntry {
                        key,
                        value: None,
                        count: 0,
                    },
                );
                idx
            }
        };

        let value = match value {
            Some(value) => value,
            None => return Ok(()),
        };
        let entry = &mut self.entries[idx];
        entry.count += 1;
        entry.value = Some(match (entry.value, self.duplicates) {
            (None, _) => value,
            (Some(current), DuplicateAggregate::Sum | DuplicateAggregate::Average) => {
                T::add(current, value)?
            }
            (Some(current), DuplicateAggregate::Min) if T::compare(&value, &current).is_lt() => {
                value
            }
            (Some(current), DuplicateAggregate::Max) if T::compare(&value, &current).is_gt() => {
                value
            }
            (Some(_), DuplicateAggregate::Last) => value,
            (Some(current), _) => current,
        });
        Ok(())
    }

    pub fn key_at(&self, index: usize) -> Option<&ScalarValue> {
        self.entries.get(index).map(|entry| entry.key.value())
    }

    /// Merged value at `index`, None if the key has no values.
    pub fn value_at(&self, index: usize) -> Result<Option<T::Native>> {
        let entry = match self.entries.get(index) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let value = match (entry.value, self.duplicates) {
            (None, _) => return Ok(None),
            (Some(value), DuplicateAggregate::Average) => {
                T::divide(value, T::from_count(entry.count)?)?
            }
            (Some(_), DuplicateAggregate::Count) => T::from_count(entry.count)?,
            (Some(value), _) => value,
        };
        Ok(Some(value))
    }

    /// Positions covered by a window of `pre` entries before and `post`
    /// entries after `index`, clipped to the series.
    pub fn window(&self, index: usize, pre: usize, post: usize) -> Range<usize> {
        let start = index.saturating_sub(pre);
        let end = self.len().min(index.saturating_add(post).saturating_add(1));
        start..end.max(start)
    }

    /// Sum and number of valued entries in a window. An empty window sums to
    /// zero.
    pub fn window_sum(
        &self,
        index: usize,
        pre: usize,
        post: usize,
    ) -> Result<(T::Native, usize)> {
        let mut sum = T::zero();
        let mut count = 0;
        for idx in self.window(index, pre, post) {
            if let Some(value) = self.value_at(idx)? {
                sum = T::add(sum, value)?;
                count += 1;
            }
        }
        Ok((sum, count))
    }
}
