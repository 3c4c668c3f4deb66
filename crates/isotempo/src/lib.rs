//! # isotempo
//!
//! Calendar-aware ISO 8601 time points, durations and recurrences.
//!
//! Parsing, arithmetic and formatting are exact and work the same way over
//! the proleptic Gregorian calendar and the fixed-length calendars used in
//! climate and simulation work (360-day, 365-day, 366-day years). Values
//! remember how they were written, so ordinal dates stay ordinal, reduced
//! precision stays reduced, and formatting a parsed value gives back the
//! text it came from (modulo separator style).
//!
//! ```
//! use isotempo::{parse_time_point, Calendar, Duration, ParseOptions};
//!
//! let start = parse_time_point("2018-01-31", &Calendar::standard(), &ParseOptions::default())?;
//! let next = start.add(&"P1M".parse::<Duration>()?)?;
//! assert_eq!(next.to_string(), "2018-02-28");
//! # Ok::<(), isotempo::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`calendar`]: calendar modes, leap years, month lengths, ISO week numbering
//! - [`point`]: time points and their arithmetic, comparison and resolution
//! - [`duration`]: signed `PnYnMnDTnHnMnS` / `PnW` spans
//! - [`recurrence`]: `R[n]/…/…` repeating points
//! - [`parser`]: ISO 8601 text to values
//! - [`dumper`]: values to ISO 8601 text
//! - [`template`]: the layout language shared by parser and dumper
//! - [`fraction`]: exact decimal fractions of a time unit
//! - [`error`]: error types

pub mod calendar;
pub mod dumper;
pub mod duration;
pub mod error;
pub mod fraction;
pub mod parser;
pub mod point;
pub mod recurrence;
pub mod template;

use serde::{Serialize, Serializer};

pub use calendar::{Calendar, CalendarMode, MAX_YEAR};
pub use dumper::{format, Format};
pub use duration::{Duration, FixedUnit};
pub use error::{ArithmeticError, CalendarError, Error, FormatError, ParseError, RecurrenceError, Result};
pub use fraction::Fraction;
pub use parser::{parse, parse_duration, parse_recurrence, parse_time_point, ParseOptions};
pub use point::{DateRepr, TimeOfDay, TimePoint, TruncatedDate, UtcOffset};
pub use recurrence::{RecurrenceForm, TimeRecurrence};
pub use template::{OffsetStyle, Template};

/// Anything [`parse`] can return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    TimePoint(TimePoint),
    Duration(Duration),
    Recurrence(TimeRecurrence),
}

impl Value {
    /// The time point, if this is one.
    pub fn as_time_point(&self) -> Option<&TimePoint> {
        match self {
            Value::TimePoint(p) => Some(p),
            _ => None,
        }
    }

    /// The duration, if this is one.
    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Value::Duration(d) => Some(d),
            _ => None,
        }
    }

    /// The recurrence, if this is one.
    pub fn as_recurrence(&self) -> Option<&TimeRecurrence> {
        match self {
            Value::Recurrence(r) => Some(r),
            _ => None,
        }
    }
}

impl From<TimePoint> for Value {
    fn from(p: TimePoint) -> Self {
        Value::TimePoint(p)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<TimeRecurrence> for Value {
    fn from(r: TimeRecurrence) -> Self {
        Value::Recurrence(r)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
