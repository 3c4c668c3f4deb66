//! Exact decimal fractions for the lowest-order time unit.
//!
//! ISO 8601 allows a decimal fraction on the last component of a time
//! (`T12,5`, `T12:30:15.250`). The digits are kept exactly, including
//! trailing zeros, so that formatting reproduces the written precision.

use std::fmt;

pub(crate) const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub(crate) const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
pub(crate) const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
pub(crate) const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

/// `numerator / 10^digits`, with between one and nine digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    numerator: u32,
    digits: u8,
}

impl Fraction {
    /// Nanosecond precision.
    pub const MAX_DIGITS: u8 = 9;

    pub fn new(numerator: u32, digits: u8) -> Option<Self> {
        if digits == 0 || digits > Self::MAX_DIGITS || u64::from(numerator) >= 10u64.pow(digits.into()) {
            return None;
        }
        Some(Fraction { numerator, digits })
    }

    /// Read the digits after a decimal sign (`"250"` → 250/1000).
    pub fn parse(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let count = u8::try_from(digits.len()).ok()?;
        Fraction::new(digits.parse().ok()?, count)
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn digits(&self) -> u8 {
        self.digits
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// This fraction of a unit `unit_nanos` long, in nanoseconds.
    pub(crate) fn of_unit(&self, unit_nanos: i64) -> i64 {
        let scaled = i128::from(self.numerator) * i128::from(unit_nanos);
        (scaled / 10i128.pow(self.digits.into())) as i64
    }

    /// The fraction `nanos / unit_nanos` written with exactly `digits` digits,
    /// truncating any remainder.
    pub(crate) fn from_nanos(nanos: i64, unit_nanos: i64, digits: u8) -> Option<Self> {
        let digits = digits.clamp(1, Self::MAX_DIGITS);
        let scaled = i128::from(nanos) * 10i128.pow(digits.into()) / i128::from(unit_nanos);
        Fraction::new(u32::try_from(scaled).ok()?, digits)
    }

    /// Smallest digit count that writes `nanos` of `unit_nanos` without loss,
    /// or `None` when `nanos` is zero.
    pub(crate) fn exact_digits(nanos: i64, unit_nanos: i64) -> Option<u8> {
        if nanos == 0 {
            return None;
        }
        (1..=Self::MAX_DIGITS).find(|&d| {
            (i128::from(nanos) * 10i128.pow(d.into())) % i128::from(unit_nanos) == 0
        })
        .or(Some(Self::MAX_DIGITS))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.numerator, width = usize::from(self.digits))
    }
}
