use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

pub type Result<T, E = RowflowError> = std::result::Result<T, E>;

/// Broad classification of an error.
///
/// Binding and type errors are raised while compiling a pipeline, before any
/// row is processed. Runtime errors abort the current row or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown column, wrong parameter shape, mismatched linked group
    /// cardinality, missing collaborator.
    Binding,
    /// Unparsable value, type not supported by a generic policy.
    Type,
    /// Domain violation during row processing.
    Runtime,
    /// Anything else. Usually indicates a bug.
    Internal,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Binding => "Binding error",
            Self::Type => "Type error",
            Self::Runtime => "Runtime function error",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct RowflowError {
    inner: Box<RowflowErrorInner>,
}

#[derive(Debug)]
struct RowflowErrorInner {
    kind: ErrorKind,
    msg: String,
    /// Extra context for the error, displayed after the message.
    fields: Vec<(&'static str, String)>,
    source: Option<Box<dyn Error + Send + Sync>>,
    backtrace: Backtrace,
}

impl RowflowError {
    /// Create a new internal error.
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Internal, msg)
    }

    pub fn binding(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Binding, msg)
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Type, msg)
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Runtime, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        RowflowError {
            inner: Box::new(RowflowErrorInner {
                kind,
                msg: msg.into(),
                fields: Vec::new(),
                source: None,
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        msg: impl Into<String>,
        source: Box<dyn Error + Send + Sync>,
    ) -> Self {
        let mut err = Self::with_kind(kind, msg);
        err.inner.source = Some(source);
        err
    }

    /// Attach a named field to the error.
    pub fn with_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.inner.fields.push((key, value.to_string()));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn is_binding(&self) -> bool {
        self.inner.kind == ErrorKind::Binding
    }

    pub fn is_type(&self) -> bool {
        self.inner.kind == ErrorKind::Type
    }

    pub fn is_runtime(&self) -> bool {
        self.inner.kind == ErrorKind::Runtime
    }

    pub fn get_msg(&self) -> &str {
        &self.inner.msg
    }

    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.inner
            .fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_backtrace(&self) -> Option<&Backtrace> {
        match self.inner.backtrace.status() {
            BacktraceStatus::Captured => Some(&self.inner.backtrace),
            _ => None,
        }
    }
}

impl fmt::Display for RowflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.inner.kind, self.inner.msg)?;

        for (key, value) in &self.inner.fields {
            write!(f, "\n  {key}: {value}")?;
        }

        if let Some(source) = &self.inner.source {
            write!(f, "\nError source: {source}")?;
        }

        if let Some(backtrace) = self.get_backtrace() {
            write!(f, "\nBacktrace: {backtrace}")?;
        }

        Ok(())
    }
}

impl Error for RowflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for RowflowError {
    fn from(value: fmt::Error) -> Self {
        RowflowError::with_source(ErrorKind::Internal, "Format error", Box::new(value))
    }
}

/// Wrap errors from other crates (or lower layers) with additional context.
pub trait ResultExt<T, E> {
    /// Wrap the error with a message. The resulting error keeps the kind of
    /// the original error if it's a `RowflowError`, otherwise it's internal.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Same as `context`, but lazily builds the message.
    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        self.context_fn(|| msg.to_string())
    }

    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => {
                let kind = match (&e as &(dyn Error + 'static)).downcast_ref::<RowflowError>() {
                    Some(inner) => inner.kind(),
                    None => ErrorKind::Internal,
                };
                Err(RowflowError::with_source(kind, f(), Box::new(e)))
            }
        }
    }
}

/// Attach fields to an error without unwrapping the result.
pub trait ErrorFieldExt<T> {
    fn with_field(self, key: &'static str, value: impl fmt::Display) -> Result<T>;
}

impl<T> ErrorFieldExt<T> for Result<T> {
    fn with_field(self, key: &'static str, value: impl fmt::Display) -> Result<T> {
        self.map_err(|e| e.with_field(key, value))
    }
}

pub trait OptionExt<T> {
    /// Return an error if the option is None.
    fn required(self, field: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, field: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(RowflowError::new(format!("Missing required value: {field}"))),
        }
    }
}
