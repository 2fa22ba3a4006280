/// Function categories.
///
/// The category is the prefix of a function's qualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Arithmetic,
    String,
    DateTime,
    Security,
    Condition,
    Aggregate,
    Rows,
    Series,
    Validate,
    Profile,
}

impl Category {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Arithmetic => "arithmetic",
            Self::String => "string",
            Self::DateTime => "datetime",
            Self::Security => "security",
            Self::Condition => "condition",
            Self::Aggregate => "aggregate",
            Self::Rows => "rows",
            Self::Series => "series",
            Self::Validate => "validate",
            Self::Profile => "profile",
        }
    }
}

/// Documentation for a single function.
#[derive(Debug, Clone, Copy)]
pub struct Documentation {
    /// One line summary.
    pub summary: &'static str,
    /// Longer description of the function.
    ///
    /// Whitespace will be trimmed. This allows for using raw strings and
    /// aligning everything to the left.
    pub description: &'static str,
    pub examples: &'static [Example],
}

/// A simple example.
#[derive(Debug, Clone, Copy)]
pub struct Example {
    /// Inputs in declared order, written the way a pipeline author would.
    pub inputs: &'static str,
    /// The output for the above inputs.
    pub output: &'static str,
}
