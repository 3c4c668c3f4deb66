//! Signed calendar + clock spans.
//!
//! A [`Duration`] keeps a single sign flag and non-negative magnitudes for
//! each designator of `PnYnMnDTnHnMnS` (or the exclusive week form `PnW`).
//! Years and months have no fixed length and are never converted to days;
//! weeks, days, hours, minutes and seconds have canonical lengths (a day is
//! always 24 hours, leap seconds are ignored).

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ArithmeticError, ParseError};
use crate::fraction::{Fraction, NANOS_PER_DAY, NANOS_PER_HOUR, NANOS_PER_MINUTE, NANOS_PER_SECOND};

/// A designator with a fixed length, which may carry a decimal fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FixedUnit {
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl FixedUnit {
    pub(crate) fn nanos(self) -> i64 {
        match self {
            FixedUnit::Weeks => 7 * NANOS_PER_DAY,
            FixedUnit::Days => NANOS_PER_DAY,
            FixedUnit::Hours => NANOS_PER_HOUR,
            FixedUnit::Minutes => NANOS_PER_MINUTE,
            FixedUnit::Seconds => NANOS_PER_SECOND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Duration {
    negative: bool,
    years: u64,
    months: u64,
    weeks: u64,
    days: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
    fraction: Option<(FixedUnit, Fraction)>,
}

impl Duration {
    pub const ZERO: Duration = Duration {
        negative: false,
        years: 0,
        months: 0,
        weeks: 0,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        fraction: None,
    };

    // ── constructors ────────────────────────────────────────────────────

    pub fn of_years(n: i64) -> Self {
        Self::ZERO.with_years(n.unsigned_abs()).with_negative(n < 0)
    }

    pub fn of_months(n: i64) -> Self {
        Self::ZERO.with_months(n.unsigned_abs()).with_negative(n < 0)
    }

    pub fn of_weeks(n: i64) -> Self {
        Self::ZERO.with_weeks(n.unsigned_abs()).with_negative(n < 0)
    }

    pub fn of_days(n: i64) -> Self {
        Self::ZERO.with_days(n.unsigned_abs()).with_negative(n < 0)
    }

    pub fn of_hours(n: i64) -> Self {
        Self::ZERO.with_hours(n.unsigned_abs()).with_negative(n < 0)
    }

    pub fn of_minutes(n: i64) -> Self {
        Self::ZERO.with_minutes(n.unsigned_abs()).with_negative(n < 0)
    }

    pub fn of_seconds(n: i64) -> Self {
        Self::ZERO.with_seconds(n.unsigned_abs()).with_negative(n < 0)
    }

    /// Set the sign. A zero-length span is always positive, so call this
    /// after the components are in place.
    pub fn with_negative(mut self, negative: bool) -> Self {
        self.negative = negative;
        self.normalize_sign()
    }

    pub fn with_years(mut self, n: u64) -> Self {
        self.years = n;
        self
    }

    pub fn with_months(mut self, n: u64) -> Self {
        self.months = n;
        self
    }

    pub fn with_weeks(mut self, n: u64) -> Self {
        self.weeks = n;
        self
    }

    pub fn with_days(mut self, n: u64) -> Self {
        self.days = n;
        self
    }

    pub fn with_hours(mut self, n: u64) -> Self {
        self.hours = n;
        self
    }

    pub fn with_minutes(mut self, n: u64) -> Self {
        self.minutes = n;
        self
    }

    pub fn with_seconds(mut self, n: u64) -> Self {
        self.seconds = n;
        self
    }

    /// Attach a fraction of a second.
    pub fn with_second_fraction(mut self, fraction: Fraction) -> Self {
        self.fraction = Some((FixedUnit::Seconds, fraction));
        self
    }

    /// Attach a fraction to `unit`. Callers guarantee that every unit smaller
    /// than `unit` is zero.
    pub(crate) fn with_fraction(mut self, unit: FixedUnit, fraction: Fraction) -> Self {
        self.fraction = Some((unit, fraction));
        self
    }

    /// A pure day/clock duration of exactly `nanos` nanoseconds, spread over
    /// days, hours, minutes and seconds.
    pub fn from_nanos(nanos: i128) -> Self {
        let abs = nanos.unsigned_abs();
        let day = NANOS_PER_DAY as u128;
        let hour = NANOS_PER_HOUR as u128;
        let minute = NANOS_PER_MINUTE as u128;
        let second = NANOS_PER_SECOND as u128;

        let sub_second = (abs % second) as i64;
        let mut d = Duration::ZERO
            .with_days(saturate(abs / day))
            .with_hours(saturate(abs % day / hour))
            .with_minutes(saturate(abs % hour / minute))
            .with_seconds(saturate(abs % minute / second));
        if let Some(digits) = Fraction::exact_digits(sub_second, NANOS_PER_SECOND) {
            if let Some(f) = Fraction::from_nanos(sub_second, NANOS_PER_SECOND, digits) {
                d = d.with_second_fraction(f);
            }
        }
        d.with_negative(nanos < 0)
    }

    // ── accessors ───────────────────────────────────────────────────────

    /// Whether the whole span points backwards (`-P1D`). Components are
    /// always stored as magnitudes.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn years(&self) -> u64 {
        self.years
    }

    pub fn months(&self) -> u64 {
        self.months
    }

    /// Weeks. Only the exclusive `PnW` form prints them as weeks; next to
    /// other designators they print as days.
    pub fn weeks(&self) -> u64 {
        self.weeks
    }

    pub fn days(&self) -> u64 {
        self.days
    }

    pub fn hours(&self) -> u64 {
        self.hours
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    /// Whole seconds; any decimal part is in [`Duration::fraction`].
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Decimal part of the lowest written designator and the unit it
    /// belongs to, so `PT1.5H` gives `(Hours, 5)`.
    pub fn fraction(&self) -> Option<(FixedUnit, Fraction)> {
        self.fraction
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.clock_magnitude() == 0
    }

    /// Whether the span has year or month components, whose length depends
    /// on where it is applied.
    pub fn has_calendar_components(&self) -> bool {
        self.years != 0 || self.months != 0
    }

    /// Written in the exclusive week form `PnW`.
    pub fn is_week_form(&self) -> bool {
        (self.weeks != 0 || matches!(self.fraction, Some((FixedUnit::Weeks, _))))
            && self.years == 0
            && self.months == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0
    }

    /// Signed years and months folded into months.
    pub fn calendar_months(&self) -> i128 {
        let months = i128::from(self.years) * 12 + i128::from(self.months);
        if self.negative { -months } else { months }
    }

    /// Signed length of the week/day/clock components in nanoseconds.
    pub fn clock_nanos(&self) -> i128 {
        let magnitude = self.clock_magnitude();
        if self.negative { -magnitude } else { magnitude }
    }

    /// Signed day/clock length split into whole days and remaining nanoseconds.
    pub fn to_days_and_nanos(&self) -> (i128, i64) {
        let nanos = self.clock_nanos();
        let day = i128::from(NANOS_PER_DAY);
        (nanos.div_euclid(day), nanos.rem_euclid(day) as i64)
    }

    fn clock_magnitude(&self) -> i128 {
        let whole = (i128::from(self.weeks) * 7 + i128::from(self.days)) * i128::from(NANOS_PER_DAY)
            + i128::from(self.hours) * i128::from(NANOS_PER_HOUR)
            + i128::from(self.minutes) * i128::from(NANOS_PER_MINUTE)
            + i128::from(self.seconds) * i128::from(NANOS_PER_SECOND);
        let fraction = self
            .fraction
            .map_or(0, |(unit, f)| i128::from(f.of_unit(unit.nanos())));
        whole + fraction
    }

    fn normalize_sign(mut self) -> Self {
        if self.is_zero() {
            self.negative = false;
        }
        self
    }

    // ── arithmetic ──────────────────────────────────────────────────────

    pub fn negate(&self) -> Self {
        let mut d = *self;
        d.negative = !d.negative;
        d.normalize_sign()
    }

    /// Componentwise sum.
    ///
    /// Same-signed spans add designator by designator. Spans of opposite
    /// sign are folded into total months and total nanoseconds first.
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticError::SignMismatch`] when the calendar part and
    /// the clock part of the result would need different signs, which a
    /// single sign flag cannot express, and [`ArithmeticError::Overflow`]
    /// when a component of the sum does not fit in a `u64`.
    pub fn add(&self, other: &Duration) -> Result<Duration, ArithmeticError> {
        let same_sign = self.negative == other.negative || self.is_zero() || other.is_zero();
        let simple_fractions = [self.fraction, other.fraction]
            .iter()
            .all(|f| matches!(f, None | Some((FixedUnit::Seconds, _))));
        if same_sign && simple_fractions {
            return self.add_magnitudes(other);
        }

        let months = self.calendar_months() + other.calendar_months();
        let nanos = self.clock_nanos() + other.clock_nanos();
        if (months < 0 && nanos > 0) || (months > 0 && nanos < 0) {
            return Err(ArithmeticError::SignMismatch(format!(
                "{self} + {other} needs a calendar part and a clock part of opposite sign"
            )));
        }
        let overflow = || self.overflow(other);
        if nanos.unsigned_abs() / NANOS_PER_DAY as u128 > u128::from(u64::MAX) {
            return Err(overflow());
        }
        let clock = Duration::from_nanos(nanos);
        let abs_months = months.unsigned_abs();
        let (years, months_part) = if self.years != 0 || other.years != 0 {
            (abs_months / 12, abs_months % 12)
        } else {
            (0, abs_months)
        };
        Ok(Duration {
            negative: months < 0 || nanos < 0,
            years: u64::try_from(years).map_err(|_| overflow())?,
            months: u64::try_from(months_part).map_err(|_| overflow())?,
            ..clock
        }
        .normalize_sign())
    }

    fn overflow(&self, other: &Duration) -> ArithmeticError {
        ArithmeticError::Overflow(format!("{self} + {other} does not fit in a duration"))
    }

    pub fn subtract(&self, other: &Duration) -> Result<Duration, ArithmeticError> {
        self.add(&other.negate())
    }

    fn add_magnitudes(&self, other: &Duration) -> Result<Duration, ArithmeticError> {
        let overflow = || self.overflow(other);
        let sum = |a: u64, b: u64| a.checked_add(b).ok_or_else(overflow);
        let negative = if self.is_zero() { other.negative } else { self.negative };
        let keep_weeks = (self.is_week_form() || self.is_zero()) && (other.is_week_form() || other.is_zero());
        let (weeks, days) = if keep_weeks {
            (sum(self.weeks, other.weeks)?, 0)
        } else {
            let week_days = sum(self.weeks, other.weeks)?.checked_mul(7).ok_or_else(overflow)?;
            (0, sum(week_days, sum(self.days, other.days)?)?)
        };

        let mut seconds = sum(self.seconds, other.seconds)?;
        let fraction = match (self.fraction, other.fraction) {
            (None, None) => None,
            (Some((_, f)), None) | (None, Some((_, f))) => Some(f),
            (Some((_, a)), Some((_, b))) => {
                let digits = a.digits().max(b.digits());
                let total = a.of_unit(NANOS_PER_SECOND) + b.of_unit(NANOS_PER_SECOND);
                seconds = sum(seconds, (total / NANOS_PER_SECOND) as u64)?;
                Fraction::from_nanos(total % NANOS_PER_SECOND, NANOS_PER_SECOND, digits)
            }
        };

        Ok(Duration {
            negative,
            years: sum(self.years, other.years)?,
            months: sum(self.months, other.months)?,
            weeks,
            days,
            hours: sum(self.hours, other.hours)?,
            minutes: sum(self.minutes, other.minutes)?,
            seconds,
            fraction: fraction.map(|f| (FixedUnit::Seconds, f)),
        }
        .normalize_sign())
    }

    /// Every component multiplied by `factor`, or `None` on overflow.
    ///
    /// A fraction is multiplied out and carried into whole seconds.
    pub fn checked_mul(&self, factor: u64) -> Option<Duration> {
        let mut d = Duration {
            negative: self.negative,
            years: self.years.checked_mul(factor)?,
            months: self.months.checked_mul(factor)?,
            weeks: self.weeks.checked_mul(factor)?,
            days: self.days.checked_mul(factor)?,
            hours: self.hours.checked_mul(factor)?,
            minutes: self.minutes.checked_mul(factor)?,
            seconds: self.seconds.checked_mul(factor)?,
            fraction: None,
        };
        if let Some((unit, f)) = self.fraction {
            let nanos = i128::from(f.of_unit(unit.nanos())) * i128::from(factor);
            let second = i128::from(NANOS_PER_SECOND);
            d.seconds = d.seconds.checked_add(u64::try_from(nanos / second).ok()?)?;
            let rest = (nanos % second) as i64;
            let digits = if unit == FixedUnit::Seconds {
                Some(f.digits())
            } else {
                Fraction::exact_digits(rest, NANOS_PER_SECOND)
            };
            d.fraction = digits
                .and_then(|dg| Fraction::from_nanos(rest, NANOS_PER_SECOND, dg))
                .map(|f| (FixedUnit::Seconds, f));
        }
        Some(d.normalize_sign())
    }

    /// Split a pure day/clock span into `parts` equal pieces.
    ///
    /// Returns `None` for calendar-bearing spans, for `parts == 0`, or when
    /// the length is not a whole number of nanoseconds per piece.
    pub fn divide_exact(&self, parts: u64) -> Option<Duration> {
        if parts == 0 || self.has_calendar_components() {
            return None;
        }
        let nanos = self.clock_nanos();
        let parts = i128::from(parts);
        (nanos % parts == 0).then(|| Duration::from_nanos(nanos / parts))
    }

    /// Carry seconds into minutes and minutes into hours.
    ///
    /// Calendar components, weeks and days are left untouched.
    pub fn normalize_clock(&self) -> Duration {
        let sub_day = i128::from(self.hours) * i128::from(NANOS_PER_HOUR)
            + i128::from(self.minutes) * i128::from(NANOS_PER_MINUTE)
            + i128::from(self.seconds) * i128::from(NANOS_PER_SECOND)
            + match self.fraction {
                Some((unit, f)) if unit >= FixedUnit::Hours => i128::from(f.of_unit(unit.nanos())),
                _ => 0,
            };
        let hour = i128::from(NANOS_PER_HOUR);
        let minute = i128::from(NANOS_PER_MINUTE);
        let second = i128::from(NANOS_PER_SECOND);
        let sub_second = (sub_day % second) as i64;

        let digits = match self.fraction {
            Some((FixedUnit::Seconds, f)) => Some(f.digits()),
            _ => Fraction::exact_digits(sub_second, NANOS_PER_SECOND),
        };
        let day_fraction = self.fraction.filter(|(unit, _)| *unit < FixedUnit::Hours);

        Duration {
            hours: saturate((sub_day / hour) as u128),
            minutes: saturate((sub_day % hour / minute) as u128),
            seconds: saturate((sub_day % minute / second) as u128),
            fraction: day_fraction.or_else(|| {
                digits
                    .and_then(|d| Fraction::from_nanos(sub_second, NANOS_PER_SECOND, d))
                    .map(|f| (FixedUnit::Seconds, f))
            }),
            ..*self
        }
        .normalize_sign()
    }

    /// Order two spans by length.
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticError::CalendarDependent`] when either span has
    /// year or month components; compare those via
    /// [`crate::TimePoint::add`] from a concrete reference point instead.
    pub fn compare(&self, other: &Duration) -> Result<Ordering, ArithmeticError> {
        if self.has_calendar_components() || other.has_calendar_components() {
            return Err(ArithmeticError::CalendarDependent(format!(
                "cannot order {self} and {other} without a reference point"
            )));
        }
        Ok(self.clock_nanos().cmp(&other.clock_nanos()))
    }

    /// Convert a pure day/clock span into a [`chrono::TimeDelta`].
    pub fn to_chrono(&self) -> Result<chrono::TimeDelta, ArithmeticError> {
        if self.has_calendar_components() {
            return Err(ArithmeticError::CalendarDependent(format!(
                "{self} has no fixed length"
            )));
        }
        let nanos = self.clock_nanos();
        let second = i128::from(NANOS_PER_SECOND);
        i64::try_from(nanos.div_euclid(second))
            .ok()
            .and_then(|secs| chrono::TimeDelta::new(secs, nanos.rem_euclid(second) as u32))
            .ok_or_else(|| ArithmeticError::Incomparable(format!("{self} exceeds chrono's range")))
    }

    pub fn from_chrono(delta: chrono::TimeDelta) -> Self {
        let nanos = i128::from(delta.num_seconds()) * i128::from(NANOS_PER_SECOND)
            + i128::from(delta.subsec_nanos());
        Duration::from_nanos(nanos)
    }
}

fn saturate(n: u128) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

impl FromStr for Duration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse_duration(s)
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
