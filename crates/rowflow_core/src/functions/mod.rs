//! Function model.
//!
//! Every function is a const `FunctionDefinition` describing its kind,
//! parameters and a factory. The catalog resolves definitions into
//! descriptors, descriptors bind against a row schema, and the resulting
//! `BoundFunction` is invoked once per row.

// Functions are created from const definitions and never need a Default.
#![allow(clippy::new_without_default)]

pub mod aggregate;
pub mod bind;
pub mod bound;
pub mod catalog;
pub mod condition;
pub mod descriptor;
pub mod documentation;
pub mod parameter;
pub mod profile;
pub mod rows;
pub mod scalar;
pub mod series;
pub mod validate;

#[cfg(test)]
pub(crate) mod testutil;

use std::fmt;

use aggregate::AggregateFunctionImpl;
use bind::BindContext;
use documentation::{Category, Documentation};
use parameter::{ParamType, ParamValue, ParameterDef};
use profile::ProfileFunctionImpl;
use rows::RowsFunctionImpl;
use rowflow_error::Result;
use scalar::ScalarFunctionImpl;
use series::SeriesFunctionImpl;
use validate::ValidateFunctionImpl;

use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Pure function of the row's inputs.
    Map,
    /// Map function returning a boolean, used as a predicate.
    Condition,
    Aggregate,
    /// Produces zero or more rows per input row.
    Rows,
    /// Aggregate over an ordered series key.
    Series,
    Validate,
    Profile,
}

impl FunctionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Condition => "condition",
            Self::Aggregate => "aggregate",
            Self::Rows => "rows",
            Self::Series => "series",
            Self::Validate => "validate",
            Self::Profile => "profile",
        }
    }

    /// If the function keeps state across rows.
    pub const fn is_stateful(&self) -> bool {
        matches!(
            self,
            Self::Aggregate | Self::Rows | Self::Series | Self::Profile
        )
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which concrete types a function's generic parameters may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericPolicy {
    Fixed(DataType),
    AnyNumeric,
    AnyComparable,
}

impl GenericPolicy {
    pub fn accepts(&self, datatype: DataType) -> bool {
        match self {
            Self::Fixed(fixed) => *fixed == datatype,
            Self::AnyNumeric => datatype.is_numeric(),
            Self::AnyComparable => true,
        }
    }
}

pub type FunctionFactory = fn(&BindContext) -> Result<FunctionImpl>;

/// Static definition of a function.
#[derive(Clone, Copy)]
pub struct FunctionDefinition {
    pub name: &'static str,
    pub category: Category,
    /// Alternative names within the same category.
    pub aliases: &'static [&'static str],
    pub kind: FunctionKind,
    pub generic: GenericPolicy,
    pub inputs: &'static [ParameterDef],
    /// Type of the return value, None if the function only produces
    /// outputs.
    pub returns: Option<ParamType>,
    pub outputs: &'static [ParameterDef],
    pub doc: &'static Documentation,
    /// Create the implementation once the parameters are bound.
    pub factory: FunctionFactory,
}

impl FunctionDefinition {
    /// Name including the category prefix, e.g. `arithmetic.add`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.category.as_str(), self.name)
    }

    pub fn qualified_aliases(&self) -> impl Iterator<Item = String> + '_ {
        self.aliases
            .iter()
            .map(|alias| format!("{}.{}", self.category.as_str(), alias))
    }
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.qualified_name())
            .field("kind", &self.kind)
            .field("generic", &self.generic)
            .finish_non_exhaustive()
    }
}

/// Implementation produced by a definition's factory.
#[derive(Debug)]
pub enum FunctionImpl {
    Map(Box<dyn ScalarFunctionImpl>),
    Condition(Box<dyn ScalarFunctionImpl>),
    Aggregate(Box<dyn AggregateFunctionImpl>),
    Rows(Box<dyn RowsFunctionImpl>),
    Series(Box<dyn SeriesFunctionImpl>),
    Validate(Box<dyn ValidateFunctionImpl>),
    Profile(Box<dyn ProfileFunctionImpl>),
}

impl FunctionImpl {
    pub fn kind(&self) -> FunctionKind {
        match self {
            Self::Map(_) => FunctionKind::Map,
            Self::Condition(_) => FunctionKind::Condition,
            Self::Aggregate(_) => FunctionKind::Aggregate,
            Self::Rows(_) => FunctionKind::Rows,
            Self::Series(_) => FunctionKind::Series,
            Self::Validate(_) => FunctionKind::Validate,
            Self::Profile(_) => FunctionKind::Profile,
        }
    }
}

/// Result of a single function call.
///
/// Outputs are in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionOutput {
    pub value: ScalarValue,
    pub outputs: Vec<ParamValue>,
}

impl FunctionOutput {
    pub fn value(value: impl Into<ScalarValue>) -> Self {
        FunctionOutput {
            value: value.into(),
            outputs: Vec::new(),
        }
    }

    pub fn with_outputs(value: impl Into<ScalarValue>, outputs: Vec<ParamValue>) -> Self {
        FunctionOutput {
            value: value.into(),
            outputs,
        }
    }
}
