//! Runtime error type shared by all protocol operations
//!
//! Every fallible operation in the runtime returns `Result<_, Error>`.
//! Validation errors are raised synchronously, before any source handle is
//! touched, so callers never need cleanup for them. Errors surfacing
//! mid-iteration are paired with the closing discipline in the runtime
//! crate: sibling handles are released first, then the error propagates.

/// Errors produced by sequence construction, iteration, and user callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value of the wrong kind where an object/iterable/callable is required
    Type(String),
    /// A numeric limit outside its valid range (negative take/drop limit)
    Range(String),
    /// Strict-mode joint iteration observed inputs of unequal length
    LengthMismatch,
    /// Reduce over an empty sequence with no initial value
    EmptyReduce,
    /// Failure raised by a user-supplied callback or source
    Custom(String),
}

impl Error {
    /// Type error with a formatted message
    pub fn type_err(msg: impl Into<String>) -> Self {
        Error::Type(msg.into())
    }

    /// Range error with a formatted message
    pub fn range_err(msg: impl Into<String>) -> Self {
        Error::Range(msg.into())
    }

    /// User-raised error (callbacks, custom sources)
    pub fn custom(msg: impl Into<String>) -> Self {
        Error::Custom(msg.into())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Type(msg) => write!(f, "type error: {}", msg),
            Error::Range(msg) => write!(f, "range error: {}", msg),
            Error::LengthMismatch => {
                write!(f, "strict mode: iterators ended at different times")
            }
            Error::EmptyReduce => {
                write!(f, "reduce of empty sequence with no initial value")
            }
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}
