//! Error types for isotempo operations.

use thiserror::Error;

/// A calendar field fell outside the range its calendar allows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

/// Failure to read an ISO 8601 string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No grammar matched the input.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// A grammar matched but a field is invalid for the calendar.
    #[error(transparent)]
    Range(#[from] CalendarError),

    /// Units of the combined parts do not line up (e.g. a time after a
    /// reduced-precision date, or a fraction on a non-final component).
    #[error("Precision mismatch: {0}")]
    PrecisionMismatch(String),

    /// Basic and extended separators mixed within one value.
    #[error("Ambiguous format: {0}")]
    AmbiguousFormat(String),

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Incomparable: {0}")]
    Incomparable(String),

    #[error("Calendar dependent: {0}")]
    CalendarDependent(String),

    #[error("Sign mismatch: {0}")]
    SignMismatch(String),

    #[error("Overflow: {0}")]
    Overflow(String),
}

/// Raised when a recurrence is built from bounds that cannot work together.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("Inconsistent recurrence: {0}")]
    Inconsistent(String),

    #[error("Underspecified recurrence: {0}")]
    Underspecified(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Template needs {0}, which the value does not specify")]
    MissingField(&'static str),

    #[error("Unsupported template: {0}")]
    UnsupportedTemplate(String),
}

/// Any error this crate can return.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

pub type Result<T> = std::result::Result<T, Error>;
