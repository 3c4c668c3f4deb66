//! Time points: complete, reduced-precision and truncated ISO 8601 instants.
//!
//! A [`TimePoint`] records which fields were written as well as their
//! values. The date part is one of the shapes in [`DateRepr`]; the time part
//! is an optional [`TimeOfDay`] with an optional [`UtcOffset`].
//!
//! - A **complete** point (possibly with reduced precision such as `2020-02`
//!   or `T12`) denotes one instant; omitted low-order fields take their
//!   minimum value.
//! - A **truncated** point (`--02-15`, `T-30`) omits high-order fields and
//!   must be [resolved](TimePoint::resolve) against a complete reference
//!   before it can take part in arithmetic or comparison.
//!
//! Arithmetic keeps the shape of the left operand: an ordinal date stays an
//! ordinal date, and precision is only extended when the result has
//! non-zero values below it.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

use crate::calendar::{check_month, check_weekday, check_year, Calendar, CalendarMode, MAX_YEAR};
use crate::duration::Duration;
use crate::error::{ArithmeticError, CalendarError, Error, ParseError, Result};
use crate::fraction::{Fraction, NANOS_PER_DAY, NANOS_PER_HOUR, NANOS_PER_MINUTE, NANOS_PER_SECOND};

/// Upper bound on periods stepped through while resolving a truncated point.
const MAX_RESOLVE_STEPS: i64 = 400;

// ── Field shapes ────────────────────────────────────────────────────────────

/// The date fields of a time point, by representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateRepr {
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`. A day is only present with a month.
    Calendar {
        year: i64,
        month: Option<u32>,
        day: Option<u32>,
    },
    /// `YYYY-DDD`.
    Ordinal { year: i64, day_of_year: u32 },
    /// `YYYY-Www` or `YYYY-Www-D`; `year` is the ISO week-numbering year.
    Week {
        year: i64,
        week: u32,
        weekday: Option<u32>,
    },
    /// High-order fields omitted.
    Truncated(TruncatedDate),
    /// No date at all: a time of day on an unspecified day (`T12:00`).
    Omitted,
}

/// Date shapes that leave out leading fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruncatedDate {
    /// `-YY`, `-YY-MM`, `-YY-MM-DD`.
    Century {
        year_of_century: u32,
        month: Option<u32>,
        day: Option<u32>,
    },
    /// `-YY-DDD`.
    CenturyOrdinal { year_of_century: u32, day_of_year: u32 },
    /// `-YY-Www`, `-YY-Www-D`.
    CenturyWeek {
        year_of_century: u32,
        week: u32,
        weekday: Option<u32>,
    },
    /// `--MM-DD`.
    MonthDay { month: u32, day: u32 },
    /// `--DD` or `---DD`.
    Day { day: u32 },
    /// `-DDD`.
    DayOfYear { day_of_year: u32 },
    /// `-Www`, `-Www-D`.
    WeekDay { week: u32, weekday: Option<u32> },
    /// `-W-D`.
    Weekday { weekday: u32 },
}

impl DateRepr {
    /// Whether low-order fields were left out (`2020-02`, `2020-W05`).
    /// ISO 8601 does not allow a time to follow such a date.
    pub fn is_reduced(&self) -> bool {
        match self {
            DateRepr::Calendar { day, .. } => day.is_none(),
            DateRepr::Week { weekday, .. } => weekday.is_none(),
            DateRepr::Truncated(TruncatedDate::Century { day, .. }) => day.is_none(),
            DateRepr::Truncated(TruncatedDate::CenturyWeek { weekday, .. })
            | DateRepr::Truncated(TruncatedDate::WeekDay { weekday, .. }) => weekday.is_none(),
            _ => false,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, DateRepr::Truncated(_) | DateRepr::Omitted)
    }
}

/// Hour, minute and second, with a decimal fraction on the last one given.
///
/// When `hour` is `None` the time is truncated (`T-30`, `T--15`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeOfDay {
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    fraction: Option<Fraction>,
}

impl TimeOfDay {
    /// Validate and build a time of day.
    ///
    /// The specified fields must be contiguous: `hh`, `hh:mm`, `hh:mm:ss`,
    /// `-mm`, `-mm:ss` or `--ss`.
    pub fn new(
        hour: Option<u32>,
        minute: Option<u32>,
        second: Option<u32>,
        fraction: Option<Fraction>,
    ) -> std::result::Result<Self, ParseError> {
        let contiguous = match (hour, minute, second) {
            (Some(_), None, Some(_)) | (None, None, None) => false,
            _ => true,
        };
        if !contiguous {
            return Err(ParseError::PrecisionMismatch(
                "time fields must run from largest to smallest without gaps".to_string(),
            ));
        }
        check_range("hour", hour, 23)?;
        check_range("minute", minute, 59)?;
        check_range("second", second, 59)?;
        Ok(TimeOfDay {
            hour,
            minute,
            second,
            fraction,
        })
    }

    /// A time of day to the second (`hh:mm:ss`).
    pub fn hms(hour: u32, minute: u32, second: u32) -> std::result::Result<Self, ParseError> {
        TimeOfDay::new(Some(hour), Some(minute), Some(second), None)
    }

    /// A time of day to the minute (`hh:mm`).
    pub fn hm(hour: u32, minute: u32) -> std::result::Result<Self, ParseError> {
        TimeOfDay::new(Some(hour), Some(minute), None, None)
    }

    pub fn with_fraction(mut self, fraction: Fraction) -> Self {
        self.fraction = Some(fraction);
        self
    }

    pub fn hour(&self) -> Option<u32> {
        self.hour
    }

    pub fn minute(&self) -> Option<u32> {
        self.minute
    }

    pub fn second(&self) -> Option<u32> {
        self.second
    }

    pub fn fraction(&self) -> Option<Fraction> {
        self.fraction
    }

    pub fn is_truncated(&self) -> bool {
        self.hour.is_none()
    }

    /// Length of the smallest unit written.
    pub(crate) fn lowest_unit_nanos(&self) -> i64 {
        if self.second.is_some() {
            NANOS_PER_SECOND
        } else if self.minute.is_some() {
            NANOS_PER_MINUTE
        } else {
            NANOS_PER_HOUR
        }
    }

    /// Nanoseconds since midnight, with a missing hour counted as zero.
    pub(crate) fn nanos(&self) -> i64 {
        i64::from(self.hour.unwrap_or(0)) * NANOS_PER_HOUR
            + i64::from(self.minute.unwrap_or(0)) * NANOS_PER_MINUTE
            + i64::from(self.second.unwrap_or(0)) * NANOS_PER_SECOND
            + self.fraction.map_or(0, |f| f.of_unit(self.lowest_unit_nanos()))
    }

    fn level(&self) -> usize {
        if self.second.is_some() {
            3
        } else if self.minute.is_some() {
            2
        } else {
            1
        }
    }
}

fn check_range(field: &'static str, value: Option<u32>, max: u32) -> std::result::Result<(), CalendarError> {
    match value {
        Some(v) if v > max => Err(CalendarError::OutOfRange {
            field,
            value: v.into(),
        }),
        _ => Ok(()),
    }
}

/// A fixed offset from UTC, written `Z`, `±hh` or `±hh:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtcOffset {
    /// `Z`.
    Utc,
    /// `±hh`, whole hours.
    Hours(i32),
    /// `±hh:mm`, in total minutes.
    HoursMinutes(i32),
}

impl UtcOffset {
    pub fn from_hours(hours: i32) -> std::result::Result<Self, CalendarError> {
        if hours.abs() > 23 {
            return Err(CalendarError::OutOfRange {
                field: "offset hours",
                value: hours.into(),
            });
        }
        Ok(UtcOffset::Hours(hours))
    }

    pub fn from_minutes(minutes: i32) -> std::result::Result<Self, CalendarError> {
        if minutes.abs() >= 24 * 60 {
            return Err(CalendarError::OutOfRange {
                field: "offset minutes",
                value: minutes.into(),
            });
        }
        Ok(UtcOffset::HoursMinutes(minutes))
    }

    /// Signed offset in minutes east of UTC.
    pub fn minutes(&self) -> i32 {
        match *self {
            UtcOffset::Utc => 0,
            UtcOffset::Hours(h) => h * 60,
            UtcOffset::HoursMinutes(m) => m,
        }
    }
}

/// Fully resolved wall-clock fields of a complete point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Civil {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub nanos: i64,
}

// ── TimePoint ───────────────────────────────────────────────────────────────

/// A complete, reduced-precision or truncated ISO 8601 time point.
///
/// `==` compares complete points by the instant they denote, so `2020-060`
/// equals `2020-02-29` and `2020-02` equals `2020-02-01T00:00`. Truncated
/// points are only equal to points written the same way. Use
/// [`TimePoint::same_representation`] to also compare the written shape.
#[derive(Debug, Clone, Copy)]
pub struct TimePoint {
    calendar: Calendar,
    date: DateRepr,
    time: Option<TimeOfDay>,
    offset: Option<UtcOffset>,
    expanded_digits: u8,
}

impl TimePoint {
    /// Validate and build a time point.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Range`] when a field does not exist in `calendar`
    /// - [`ParseError::PrecisionMismatch`] when a time follows a
    ///   reduced-precision date, a truncated time follows a date, an offset
    ///   is given without a time, or nothing at all is specified
    pub fn new(
        calendar: Calendar,
        date: DateRepr,
        time: Option<TimeOfDay>,
        offset: Option<UtcOffset>,
    ) -> std::result::Result<Self, ParseError> {
        validate_date(&calendar, &date)?;
        if time.is_some() && date.is_reduced() {
            return Err(ParseError::PrecisionMismatch(
                "a time cannot follow a reduced-precision date".to_string(),
            ));
        }
        match (&date, time) {
            (DateRepr::Omitted, None) => {
                return Err(ParseError::PrecisionMismatch("no date or time fields given".to_string()));
            }
            (d, Some(t)) if t.is_truncated() && *d != DateRepr::Omitted => {
                return Err(ParseError::PrecisionMismatch(
                    "a truncated time cannot follow a date".to_string(),
                ));
            }
            _ => {}
        }
        if offset.is_some() && time.is_none() {
            return Err(ParseError::PrecisionMismatch(
                "a UTC offset needs a time of day".to_string(),
            ));
        }
        Ok(TimePoint {
            calendar,
            date,
            time,
            offset,
            expanded_digits: 0,
        })
    }

    /// A `YYYY-MM-DD` point.
    pub fn from_calendar_date(calendar: Calendar, year: i64, month: u32, day: u32) -> std::result::Result<Self, ParseError> {
        TimePoint::new(
            calendar,
            DateRepr::Calendar {
                year,
                month: Some(month),
                day: Some(day),
            },
            None,
            None,
        )
    }

    pub fn with_time(self, time: TimeOfDay) -> std::result::Result<Self, ParseError> {
        TimePoint::new(self.calendar, self.date, Some(time), self.offset)
            .map(|p| p.with_expanded_digits(self.expanded_digits))
    }

    pub fn with_offset(self, offset: UtcOffset) -> std::result::Result<Self, ParseError> {
        TimePoint::new(self.calendar, self.date, self.time, Some(offset))
            .map(|p| p.with_expanded_digits(self.expanded_digits))
    }

    /// Record that the year is written in expanded form with `digits`
    /// digits beyond the usual four.
    pub fn with_expanded_digits(mut self, digits: u8) -> Self {
        self.expanded_digits = digits;
        self
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn date(&self) -> &DateRepr {
        &self.date
    }

    pub fn time(&self) -> Option<&TimeOfDay> {
        self.time.as_ref()
    }

    pub fn offset(&self) -> Option<UtcOffset> {
        self.offset
    }

    pub fn expanded_digits(&self) -> u8 {
        self.expanded_digits
    }

    /// Whether high-order fields are missing, so that the point has to be
    /// resolved before use.
    pub fn is_truncated(&self) -> bool {
        self.date.is_truncated() || self.time.is_some_and(|t| t.is_truncated())
    }

    /// Whether both points have the same calendar, fields, precision,
    /// offset and year width, i.e. print the same way.
    pub fn same_representation(&self, other: &TimePoint) -> bool {
        self.calendar == other.calendar
            && self.date == other.date
            && self.time == other.time
            && self.offset == other.offset
            && self.expanded_digits == other.expanded_digits
    }

    /// UTC instant of a complete point.
    fn instant(&self) -> Option<i128> {
        if self.is_truncated() {
            return None;
        }
        self.utc_nanos().ok()
    }

    // ── resolved fields ─────────────────────────────────────────────────

    pub(crate) fn civil(&self) -> Result<Civil> {
        let (year, month, day) = match self.date {
            DateRepr::Calendar { year, month, day } => (year, month.unwrap_or(1), day.unwrap_or(1)),
            DateRepr::Ordinal { year, day_of_year } => {
                let (month, day) = self.calendar.ordinal_to_month_day(year, day_of_year)?;
                (year, month, day)
            }
            DateRepr::Week { year, week, weekday } => {
                self.calendar.from_iso_week_date(year, week, weekday.unwrap_or(1))?
            }
            DateRepr::Truncated(_) | DateRepr::Omitted => return Err(self.truncated_error()),
        };
        let nanos = match self.time {
            None => 0,
            Some(t) if t.is_truncated() => return Err(self.truncated_error()),
            Some(t) => t.nanos(),
        };
        Ok(Civil { year, month, day, nanos })
    }

    fn truncated_error(&self) -> Error {
        ArithmeticError::Incomparable(format!("{self} is truncated; resolve it against a reference first")).into()
    }

    fn day_number(&self, civil: &Civil) -> Result<i64> {
        let ordinal = self.calendar.month_day_to_ordinal(civil.year, civil.month, civil.day)?;
        Ok(self.calendar.day_number(civil.year, ordinal))
    }

    /// Nanoseconds since the calendar epoch in UTC. An unspecified offset
    /// counts as `fallback`, or as UTC when that is `None` too.
    fn utc_nanos_assuming(&self, fallback: Option<UtcOffset>) -> Result<i128> {
        let civil = self.civil()?;
        let offset = self.offset.or(fallback).map_or(0, |o| o.minutes());
        Ok(i128::from(self.day_number(&civil)?) * i128::from(NANOS_PER_DAY) + i128::from(civil.nanos)
            - i128::from(offset) * i128::from(NANOS_PER_MINUTE))
    }

    pub(crate) fn utc_nanos(&self) -> Result<i128> {
        self.utc_nanos_assuming(None)
    }

    fn check_calendar(&self, other: &TimePoint) -> Result<()> {
        if self.calendar != other.calendar {
            return Err(ArithmeticError::Incomparable(format!(
                "{self} uses the {} calendar but {other} uses the {} calendar",
                self.calendar, other.calendar
            ))
            .into());
        }
        Ok(())
    }

    // ── arithmetic ──────────────────────────────────────────────────────

    /// Add a duration.
    ///
    /// Years are applied first, then months, each clamping the day of month
    /// to the length of the destination month (`2018-01-31` + `P1M` =
    /// `2018-02-28`). Weeks, days and clock components are then added as an
    /// exact span with carries across month and year ends.
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticError::Incomparable`] for a truncated point and
    /// [`CalendarError::OutOfRange`] when the result leaves the supported
    /// year range.
    ///
    /// # Examples
    ///
    /// ```
    /// use isotempo::{parse_time_point, Calendar, Duration, ParseOptions};
    ///
    /// let cal = Calendar::standard();
    /// let opts = ParseOptions::default();
    /// let start = parse_time_point("2018-01-31", &cal, &opts).unwrap();
    /// let month: Duration = "P1M".parse().unwrap();
    /// assert_eq!(start.add(&month).unwrap().to_string(), "2018-02-28");
    ///
    /// // a reduced point gains the precision the duration needs
    /// let day = parse_time_point("2020-02", &cal, &opts).unwrap();
    /// let later = day.add(&"PT6H".parse().unwrap()).unwrap();
    /// assert_eq!(later.to_string(), "2020-02-01T06");
    /// ```
    pub fn add(&self, duration: &Duration) -> Result<TimePoint> {
        let civil = self.civil()?;
        let cal = self.calendar;
        let sign: i128 = if duration.is_negative() { -1 } else { 1 };
        let (mut year, mut month, mut day) = (civil.year, civil.month, civil.day);

        if duration.years() != 0 {
            year = shift_year(i128::from(year) + sign * i128::from(duration.years()))?;
            day = day.min(cal.days_in_month(year, month)?);
        }
        if duration.months() != 0 {
            let total = i128::from(year) * 12 + i128::from(month - 1) + sign * i128::from(duration.months());
            year = shift_year(total.div_euclid(12))?;
            month = (total.rem_euclid(12) + 1) as u32;
            day = day.min(cal.days_in_month(year, month)?);
        }

        let (days, nanos) = duration.to_days_and_nanos();
        let mut nanos_of_day = civil.nanos + nanos;
        let mut day_number = i128::from(cal.day_number(year, cal.month_day_to_ordinal(year, month, day)?)) + days;
        if nanos_of_day >= NANOS_PER_DAY {
            nanos_of_day -= NANOS_PER_DAY;
            day_number += 1;
        }
        let limit = i128::from(MAX_YEAR + 1) * 366;
        if day_number.abs() > limit {
            return Err(CalendarError::OutOfRange {
                field: "year",
                value: i64::try_from(day_number / 365).unwrap_or(i64::MAX),
            }
            .into());
        }
        let (year, ordinal) = cal.from_day_number(day_number as i64);
        check_year(year)?;
        let (month, day) = cal.ordinal_to_month_day(year, ordinal)?;
        self.with_civil(Civil {
            year,
            month,
            day,
            nanos: nanos_of_day,
        })
    }

    /// Equivalent to `self.add(&duration.negate())`.
    pub fn subtract(&self, duration: &Duration) -> Result<TimePoint> {
        self.add(&duration.negate())
    }

    /// Exact elapsed time `self − other` as a day/clock duration.
    ///
    /// Both points must be complete and share a calendar; offsets are
    /// normalized to UTC first.
    pub fn difference(&self, other: &TimePoint) -> Result<Duration> {
        self.check_calendar(other)?;
        Ok(Duration::from_nanos(self.utc_nanos()? - other.utc_nanos()?))
    }

    /// Order two complete points by the instant they denote.
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticError::Incomparable`] when either point is
    /// truncated or the calendars differ.
    pub fn compare(&self, other: &TimePoint) -> Result<Ordering> {
        self.check_calendar(other)?;
        Ok(self.utc_nanos()?.cmp(&other.utc_nanos()?))
    }

    /// The same instant written with another UTC offset.
    pub fn to_offset(&self, offset: UtcOffset) -> Result<TimePoint> {
        let current = self.offset.map_or(0, |o| o.minutes());
        let shifted = self.add(&Duration::of_minutes(i64::from(offset.minutes() - current)))?;
        let time = match shifted.time {
            Some(t) => t,
            None => TimeOfDay::hm(0, 0)?,
        };
        Ok(TimePoint {
            time: Some(time),
            offset: Some(offset),
            ..shifted
        })
    }

    pub fn to_utc(&self) -> Result<TimePoint> {
        self.to_offset(UtcOffset::Utc)
    }

    /// Rebuild a point of this shape from resolved fields.
    fn with_civil(&self, civil: Civil) -> Result<TimePoint> {
        let cal = self.calendar;
        let date = match self.date {
            DateRepr::Calendar { month, day, .. } => {
                let day_needed = day.is_some() || civil.day != 1;
                let month_needed = month.is_some() || civil.month != 1 || day_needed;
                DateRepr::Calendar {
                    year: civil.year,
                    month: month_needed.then_some(civil.month),
                    day: day_needed.then_some(civil.day),
                }
            }
            DateRepr::Ordinal { .. } => DateRepr::Ordinal {
                year: civil.year,
                day_of_year: cal.month_day_to_ordinal(civil.year, civil.month, civil.day)?,
            },
            DateRepr::Week { weekday, .. } => {
                let (iso_year, week, wd) = cal.iso_week_date(civil.year, civil.month, civil.day)?;
                DateRepr::Week {
                    year: iso_year,
                    week,
                    weekday: (weekday.is_some() || wd != 1).then_some(wd),
                }
            }
            DateRepr::Truncated(_) | DateRepr::Omitted => return Err(self.truncated_error()),
        };
        let time = reproject_time(self.time.as_ref(), civil.nanos);
        let date = match (date, time) {
            // a time cannot follow a reduced date, so spell the date out
            (DateRepr::Calendar { year, .. }, Some(_)) if date.is_reduced() => DateRepr::Calendar {
                year,
                month: Some(civil.month),
                day: Some(civil.day),
            },
            (DateRepr::Week { year, week, .. }, Some(_)) if date.is_reduced() => DateRepr::Week {
                year,
                week,
                weekday: Some(cal.iso_week_date(civil.year, civil.month, civil.day)?.2),
            },
            (date, _) => date,
        };
        Ok(TimePoint {
            calendar: cal,
            date,
            time,
            offset: self.offset.filter(|_| time.is_some()),
            expanded_digits: self.expanded_digits,
        })
    }

    // ── truncation ──────────────────────────────────────────────────────

    /// Fill in the omitted high-order fields of a truncated point from a
    /// complete `reference`.
    ///
    /// The result is the earliest point at or after the reference that
    /// agrees with every field written in `self`, rolling the next larger
    /// omitted unit forward as needed: `--15` against `2020-02-20` gives
    /// `2020-03-15`. An unspecified offset is taken from the reference.
    /// Complete points are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticError::Incomparable`] when the reference is
    /// itself truncated, uses another calendar, or no match exists within
    /// 400 steps of the next larger unit.
    ///
    /// # Examples
    ///
    /// ```
    /// use isotempo::{parse_time_point, Calendar, ParseOptions};
    ///
    /// let cal = Calendar::standard();
    /// let opts = ParseOptions::default();
    /// let day = parse_time_point("--15", &cal, &opts).unwrap();
    /// let reference = parse_time_point("2020-02-20", &cal, &opts).unwrap();
    /// assert_eq!(day.resolve(&reference).unwrap().to_string(), "2020-03-15");
    /// ```
    pub fn resolve(&self, reference: &TimePoint) -> Result<TimePoint> {
        if !self.is_truncated() {
            return Ok(*self);
        }
        self.check_calendar(reference)?;
        let base = reference.civil()?;
        let cal = self.calendar;
        let base_day = reference.day_number(&base)?;
        let (base_iso_year, _, _) = cal.iso_week_date(base.year, base.month, base.day)?;
        let reference_nanos = reference.utc_nanos()?;

        for step in 0..MAX_RESOLVE_STEPS {
            let Some(candidate) = self.candidate(step, reference, &base, base_day, base_iso_year) else {
                continue;
            };
            if candidate.utc_nanos_assuming(reference.offset)? >= reference_nanos {
                tracing::trace!(truncated = %self, reference = %reference, step, "resolved truncated point");
                return Ok(candidate);
            }
        }
        Err(ArithmeticError::Incomparable(format!(
            "no match for {self} within {MAX_RESOLVE_STEPS} periods after {reference}"
        ))
        .into())
    }

    /// The `step`-th candidate for [`TimePoint::resolve`], or `None` when the
    /// written fields do not exist in that period (e.g. `---31` in April).
    fn candidate(&self, step: i64, reference: &TimePoint, base: &Civil, base_day: i64, base_iso_year: i64) -> Option<TimePoint> {
        let cal = self.calendar;
        let century = |base_year: i64, yy: u32| (base_year.div_euclid(100) + step) * 100 + i64::from(yy);
        let mut time = self.time;

        let date = match self.date {
            DateRepr::Truncated(t) => match t {
                TruncatedDate::Century { year_of_century, month, day } => DateRepr::Calendar {
                    year: century(base.year, year_of_century),
                    month,
                    day,
                },
                TruncatedDate::CenturyOrdinal { year_of_century, day_of_year } => DateRepr::Ordinal {
                    year: century(base.year, year_of_century),
                    day_of_year,
                },
                TruncatedDate::CenturyWeek { year_of_century, week, weekday } => DateRepr::Week {
                    year: century(base_iso_year, year_of_century),
                    week,
                    weekday,
                },
                TruncatedDate::MonthDay { month, day } => DateRepr::Calendar {
                    year: base.year + step,
                    month: Some(month),
                    day: Some(day),
                },
                TruncatedDate::Day { day } => {
                    let total = base.year * 12 + i64::from(base.month - 1) + step;
                    DateRepr::Calendar {
                        year: total.div_euclid(12),
                        month: Some((total.rem_euclid(12) + 1) as u32),
                        day: Some(day),
                    }
                }
                TruncatedDate::DayOfYear { day_of_year } => DateRepr::Ordinal {
                    year: base.year + step,
                    day_of_year,
                },
                TruncatedDate::WeekDay { week, weekday } => DateRepr::Week {
                    year: base_iso_year + step,
                    week,
                    weekday,
                },
                TruncatedDate::Weekday { weekday } => {
                    let (year, ordinal) = cal.from_day_number(base_day + 7 * step);
                    let (month, day) = cal.ordinal_to_month_day(year, ordinal).ok()?;
                    let (iso_year, week, _) = cal.iso_week_date(year, month, day).ok()?;
                    DateRepr::Week {
                        year: iso_year,
                        week,
                        weekday: Some(weekday),
                    }
                }
            },
            DateRepr::Omitted => {
                let t = self.time?;
                let base_hour = base.nanos / NANOS_PER_HOUR;
                let base_minute = base.nanos % NANOS_PER_HOUR / NANOS_PER_MINUTE;
                let (day_number, hour, minute) = match (t.hour, t.minute) {
                    (Some(_), _) => (base_day + step, None, None),
                    (None, Some(_)) => {
                        let hours = base_day * 24 + base_hour + step;
                        (hours.div_euclid(24), Some(hours.rem_euclid(24) as u32), None)
                    }
                    (None, None) => {
                        let minutes = (base_day * 24 + base_hour) * 60 + base_minute + step;
                        let hours = minutes.div_euclid(60);
                        (
                            hours.div_euclid(24),
                            Some(hours.rem_euclid(24) as u32),
                            Some(minutes.rem_euclid(60) as u32),
                        )
                    }
                };
                if hour.is_some() {
                    time = Some(TimeOfDay {
                        hour,
                        minute: t.minute.or(minute),
                        ..t
                    });
                }
                let (year, ordinal) = cal.from_day_number(day_number);
                let (month, day) = cal.ordinal_to_month_day(year, ordinal).ok()?;
                complete_date_like(&reference.date, &cal, year, month, day).ok()?
            }
            _ => return None,
        };
        let offset = self.offset.or(reference.offset).filter(|_| time.is_some());
        TimePoint::new(cal, date, time, offset)
            .ok()
            .map(|p| p.with_expanded_digits(reference.expanded_digits))
    }

    /// Fill the year of a truncated date that omits only the year (or the
    /// century), without any rolling. Other points are returned unchanged.
    pub fn with_assumed_year(&self, year: i64) -> std::result::Result<TimePoint, ParseError> {
        let century = |yy: u32| year.div_euclid(100) * 100 + i64::from(yy);
        let date = match self.date {
            DateRepr::Truncated(TruncatedDate::Century { year_of_century, month, day }) => DateRepr::Calendar {
                year: century(year_of_century),
                month,
                day,
            },
            DateRepr::Truncated(TruncatedDate::CenturyOrdinal { year_of_century, day_of_year }) => {
                DateRepr::Ordinal {
                    year: century(year_of_century),
                    day_of_year,
                }
            }
            DateRepr::Truncated(TruncatedDate::CenturyWeek { year_of_century, week, weekday }) => DateRepr::Week {
                year: century(year_of_century),
                week,
                weekday,
            },
            DateRepr::Truncated(TruncatedDate::MonthDay { month, day }) => DateRepr::Calendar {
                year,
                month: Some(month),
                day: Some(day),
            },
            DateRepr::Truncated(TruncatedDate::DayOfYear { day_of_year }) => DateRepr::Ordinal { year, day_of_year },
            DateRepr::Truncated(TruncatedDate::WeekDay { week, weekday }) => DateRepr::Week { year, week, weekday },
            _ => return Ok(*self),
        };
        TimePoint::new(self.calendar, date, self.time, self.offset)
    }

    // ── chrono interop ──────────────────────────────────────────────────

    /// Convert a complete standard-calendar point into a chrono datetime.
    /// An unspecified offset becomes UTC.
    pub fn to_chrono(&self) -> Result<DateTime<FixedOffset>> {
        if self.calendar.mode() != CalendarMode::Standard {
            return Err(ArithmeticError::Incomparable(format!(
                "chrono only models the standard calendar, not {}",
                self.calendar
            ))
            .into());
        }
        let civil = self.civil()?;
        let out_of_range = || Error::from(CalendarError::OutOfRange { field: "year", value: civil.year });
        let year = i32::try_from(civil.year).map_err(|_| out_of_range())?;
        let date = NaiveDate::from_ymd_opt(year, civil.month, civil.day).ok_or_else(out_of_range)?;
        let seconds = (civil.nanos / NANOS_PER_SECOND) as u32;
        let nanos = (civil.nanos % NANOS_PER_SECOND) as u32;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos).ok_or_else(out_of_range)?;
        let offset = FixedOffset::east_opt(self.offset.map_or(0, |o| o.minutes()) * 60).ok_or_else(out_of_range)?;
        date.and_time(time)
            .and_local_timezone(offset)
            .single()
            .ok_or_else(out_of_range)
    }

    /// A complete `YYYY-MM-DDThh:mm:ss[.f]±hh:mm` point (or `Z` for UTC).
    pub fn from_chrono(datetime: &DateTime<FixedOffset>) -> Result<TimePoint> {
        let naive = datetime.naive_local();
        let nanos = naive.nanosecond() % 1_000_000_000;
        let mut time = TimeOfDay::hms(naive.hour(), naive.minute(), naive.second())?;
        if let Some(digits) = Fraction::exact_digits(i64::from(nanos), NANOS_PER_SECOND) {
            if let Some(f) = Fraction::from_nanos(i64::from(nanos), NANOS_PER_SECOND, digits) {
                time = time.with_fraction(f);
            }
        }
        let minutes = datetime.offset().local_minus_utc() / 60;
        let offset = if minutes == 0 {
            UtcOffset::Utc
        } else {
            UtcOffset::from_minutes(minutes)?
        };
        let point = TimePoint::from_calendar_date(
            Calendar::standard(),
            i64::from(naive.year()),
            naive.month(),
            naive.day(),
        )?
        .with_time(time)?
        .with_offset(offset)?;
        Ok(point)
    }
}

impl PartialEq for TimePoint {
    fn eq(&self, other: &Self) -> bool {
        if self.calendar != other.calendar {
            return false;
        }
        match (self.instant(), other.instant()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.same_representation(other),
            _ => false,
        }
    }
}

impl Eq for TimePoint {}

impl Hash for TimePoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.calendar.hash(state);
        match self.instant() {
            Some(instant) => instant.hash(state),
            None => {
                self.date.hash(state);
                self.time.hash(state);
                self.offset.hash(state);
                self.expanded_digits.hash(state);
            }
        }
    }
}

impl Serialize for TimePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn shift_year(year: i128) -> std::result::Result<i64, CalendarError> {
    let year = i64::try_from(year).map_err(|_| CalendarError::OutOfRange {
        field: "year",
        value: if year < 0 { i64::MIN } else { i64::MAX },
    })?;
    check_year(year)?;
    Ok(year)
}

/// A complete date in the same representation as `like`.
fn complete_date_like(like: &DateRepr, cal: &Calendar, year: i64, month: u32, day: u32) -> std::result::Result<DateRepr, CalendarError> {
    Ok(match like {
        DateRepr::Ordinal { .. } => DateRepr::Ordinal {
            year,
            day_of_year: cal.month_day_to_ordinal(year, month, day)?,
        },
        DateRepr::Week { .. } => {
            let (iso_year, week, weekday) = cal.iso_week_date(year, month, day)?;
            DateRepr::Week {
                year: iso_year,
                week,
                weekday: Some(weekday),
            }
        }
        _ => DateRepr::Calendar {
            year,
            month: Some(month),
            day: Some(day),
        },
    })
}

/// Write `nanos` since midnight in the shape of `existing`, extending the
/// precision only when the value has non-zero digits below it.
fn reproject_time(existing: Option<&TimeOfDay>, nanos: i64) -> Option<TimeOfDay> {
    const UNITS: [i64; 4] = [NANOS_PER_DAY, NANOS_PER_HOUR, NANOS_PER_MINUTE, NANOS_PER_SECOND];
    let (level, digits) = existing.map_or((0, None), |t| (t.level(), t.fraction.map(|f| f.digits())));

    for candidate in level..=3 {
        let unit = UNITS[candidate];
        let remainder = nanos % unit;
        let written = if candidate == level { digits } else { None };
        let fraction = match written {
            Some(d) if (i128::from(remainder) * 10i128.pow(d.into())) % i128::from(unit) == 0 => {
                Some(Fraction::from_nanos(remainder, unit, d))
            }
            None if remainder == 0 => Some(None),
            _ if candidate == 3 => {
                let d = Fraction::exact_digits(remainder, unit).unwrap_or(Fraction::MAX_DIGITS);
                Some(Fraction::from_nanos(remainder, unit, d))
            }
            _ => None,
        };
        if let Some(fraction) = fraction {
            if candidate == 0 {
                return None;
            }
            return Some(TimeOfDay {
                hour: Some((nanos / NANOS_PER_HOUR) as u32),
                minute: (candidate >= 2).then_some((nanos % NANOS_PER_HOUR / NANOS_PER_MINUTE) as u32),
                second: (candidate >= 3).then_some((nanos % NANOS_PER_MINUTE / NANOS_PER_SECOND) as u32),
                fraction,
            });
        }
    }
    None
}

/// Range-check the date fields of `date` against `cal`.
pub(crate) fn validate_date(cal: &Calendar, date: &DateRepr) -> std::result::Result<(), ParseError> {
    match *date {
        DateRepr::Calendar { year, month, day } => {
            check_year(year)?;
            match (month, day) {
                (Some(m), Some(d)) => cal.validate_date(year, m, d)?,
                (Some(m), None) => check_month(m)?,
                (None, Some(_)) => {
                    return Err(ParseError::PrecisionMismatch("a day needs a month".to_string()));
                }
                (None, None) => {}
            }
        }
        DateRepr::Ordinal { year, day_of_year } => {
            cal.ordinal_to_month_day(year, day_of_year)?;
        }
        DateRepr::Week { year, week, weekday } => {
            cal.from_iso_week_date(year, week, weekday.unwrap_or(1))?;
        }
        DateRepr::Truncated(t) => validate_truncated(cal, &t)?,
        DateRepr::Omitted => {}
    }
    Ok(())
}

fn validate_truncated(cal: &Calendar, date: &TruncatedDate) -> std::result::Result<(), CalendarError> {
    // year 0 is a leap year in every calendar that has them, so it gives
    // the longest months and years
    let max_day = |month: u32| cal.days_in_month(0, month);
    let check_day = |month: u32, day: u32| -> std::result::Result<(), CalendarError> {
        if day < 1 || day > max_day(month)? {
            return Err(CalendarError::OutOfRange {
                field: "day of month",
                value: day.into(),
            });
        }
        Ok(())
    };
    let check_day_of_year = |day_of_year: u32| {
        if day_of_year < 1 || day_of_year > cal.days_in_year(0) {
            return Err(CalendarError::OutOfRange {
                field: "day of year",
                value: day_of_year.into(),
            });
        }
        Ok(())
    };
    let check_week = |week: u32, weekday: Option<u32>| {
        let max_weeks = (0..28).map(|y| cal.weeks_in_iso_year(y)).max().unwrap_or(53);
        if week < 1 || week > max_weeks {
            return Err(CalendarError::OutOfRange {
                field: "week",
                value: week.into(),
            });
        }
        weekday.map_or(Ok(()), check_weekday)
    };
    let check_year_of_century = |yy: u32| {
        if yy > 99 {
            return Err(CalendarError::OutOfRange {
                field: "year of century",
                value: yy.into(),
            });
        }
        Ok(())
    };

    match *date {
        TruncatedDate::Century { year_of_century, month, day } => {
            check_year_of_century(year_of_century)?;
            if let Some(m) = month {
                check_month(m)?;
                if let Some(d) = day {
                    check_day(m, d)?;
                }
            }
            Ok(())
        }
        TruncatedDate::CenturyOrdinal { year_of_century, day_of_year } => {
            check_year_of_century(year_of_century)?;
            check_day_of_year(day_of_year)
        }
        TruncatedDate::CenturyWeek { year_of_century, week, weekday } => {
            check_year_of_century(year_of_century)?;
            check_week(week, weekday)
        }
        TruncatedDate::MonthDay { month, day } => {
            check_month(month)?;
            check_day(month, day)
        }
        TruncatedDate::Day { day } => {
            let longest = (1..=12).filter_map(|m| max_day(m).ok()).max().unwrap_or(31);
            if day < 1 || day > longest {
                return Err(CalendarError::OutOfRange {
                    field: "day of month",
                    value: day.into(),
                });
            }
            Ok(())
        }
        TruncatedDate::DayOfYear { day_of_year } => check_day_of_year(day_of_year),
        TruncatedDate::WeekDay { week, weekday } => check_week(week, weekday),
        TruncatedDate::Weekday { weekday } => check_weekday(weekday),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_time_point, ParseOptions};

    fn point(s: &str) -> TimePoint {
        parse_time_point(s, &Calendar::standard(), &ParseOptions::default()).unwrap()
    }

    fn point_360(s: &str) -> TimePoint {
        parse_time_point(s, &Calendar::fixed360(), &ParseOptions::default()).unwrap()
    }

    fn dur(s: &str) -> Duration {
        s.parse().unwrap()
    }

    fn assert_written_as(got: TimePoint, want: &str) {
        assert!(got.same_representation(&point(want)), "{got} is not written as {want}");
    }

    // ── construction ────────────────────────────────────────────────────

    #[test]
    fn test_new_rejects_time_after_reduced_date() {
        let date = DateRepr::Calendar {
            year: 2020,
            month: Some(1),
            day: None,
        };
        let err = TimePoint::new(Calendar::standard(), date, Some(TimeOfDay::hm(12, 0).unwrap()), None).unwrap_err();
        assert!(matches!(err, ParseError::PrecisionMismatch(_)));
    }

    #[test]
    fn test_new_rejects_offset_without_time() {
        let err = TimePoint::from_calendar_date(Calendar::standard(), 2020, 1, 1)
            .unwrap()
            .with_offset(UtcOffset::Utc)
            .unwrap_err();
        assert!(matches!(err, ParseError::PrecisionMismatch(_)));
    }

    #[test]
    fn test_new_validates_against_calendar() {
        assert!(TimePoint::from_calendar_date(Calendar::standard(), 2019, 2, 29).is_err());
        assert!(TimePoint::from_calendar_date(Calendar::fixed360(), 2019, 2, 30).is_ok());
        assert!(TimePoint::from_calendar_date(Calendar::fixed360(), 2019, 1, 31).is_err());
    }

    #[test]
    fn test_time_of_day_gaps_rejected() {
        assert!(TimeOfDay::new(Some(12), None, Some(30), None).is_err());
        assert!(TimeOfDay::new(Some(24), Some(0), None, None).is_err());
        assert!(TimeOfDay::new(None, Some(30), Some(15), None).is_ok());
    }

    // ── add / subtract ──────────────────────────────────────────────────

    #[test]
    fn test_add_month_clamps_day() {
        assert_eq!(point("2018-01-31").add(&dur("P1M")).unwrap(), point("2018-02-28"));
        assert_eq!(point("2020-01-31").add(&dur("P1M")).unwrap(), point("2020-02-29"));
        assert_eq!(point("2020-03-31").subtract(&dur("P1M")).unwrap(), point("2020-02-29"));
    }

    #[test]
    fn test_add_years_then_months() {
        // Feb 29 + 1 year clamps to Feb 28 before the month is added
        assert_eq!(point("2020-02-29").add(&dur("P1Y1M")).unwrap(), point("2021-03-28"));
    }

    #[test]
    fn test_add_clock_carries_across_year_end() {
        assert_eq!(
            point("2020-12-31T23:30Z").add(&dur("PT45M")).unwrap(),
            point("2021-01-01T00:15Z")
        );
        assert_eq!(
            point("2021-01-01T00:15Z").subtract(&dur("PT45M")).unwrap(),
            point("2020-12-31T23:30Z")
        );
    }

    #[test]
    fn test_add_keeps_representation() {
        assert_written_as(point("2020-060").add(&dur("P1D")).unwrap(), "2020-061");
        assert_written_as(point("2020-W53-7").add(&dur("P1D")).unwrap(), "2021-W01-1");
        assert_written_as(point("2020-02").add(&dur("P1M")).unwrap(), "2020-03");
        assert_written_as(point("2020-02").add(&dur("P1D")).unwrap(), "2020-02-02");
    }

    #[test]
    fn test_add_extends_time_precision() {
        assert_written_as(point("2020-01-01").add(&dur("PT6H")).unwrap(), "2020-01-01T06");
        assert_written_as(point("2020-01-01T10").add(&dur("PT30M")).unwrap(), "2020-01-01T10:30");
        assert_written_as(
            point("2020-01-01T10:00:00").add(&dur("PT0.25S")).unwrap(),
            "2020-01-01T10:00:00.25",
        );
        assert_written_as(point("2020-01-01T12,5").add(&dur("PT1H")).unwrap(), "2020-01-01T13,5");
    }

    #[test]
    fn test_subtract_undoes_add_on_reduced_points() {
        for (p, d) in [
            ("2020-01-01", "PT6H"),
            ("2020-02", "P1D"),
            ("2020", "PT90M"),
            ("2020-W09", "P3DT1S"),
            ("2020-01-01T10", "-PT30M"),
        ] {
            let t = point(p);
            let d = dur(d);
            let back = t.add(&d).unwrap().subtract(&d).unwrap();
            assert_eq!(back, t, "{p} + {d} - {d} gave {back}");
        }
    }

    #[test]
    fn test_add_fixed360() {
        assert_eq!(point_360("2020-02-30").add(&dur("P1D")).unwrap(), point_360("2020-03-01"));
        assert_eq!(point_360("2020-12-30").add(&dur("P1D")).unwrap(), point_360("2021-01-01"));
        assert_eq!(point_360("2020-01-30").add(&dur("P1M")).unwrap(), point_360("2020-02-30"));
    }

    #[test]
    fn test_add_truncated_is_incomparable() {
        let err = point("--02-15").add(&dur("P1D")).unwrap_err();
        assert!(matches!(err, Error::Arithmetic(ArithmeticError::Incomparable(_))));
    }

    #[test]
    fn test_add_out_of_range_year() {
        let last = TimePoint::from_calendar_date(Calendar::standard(), MAX_YEAR, 12, 31).unwrap();
        let err = last.add(&dur("P1D")).unwrap_err();
        assert!(matches!(err, Error::Calendar(CalendarError::OutOfRange { field: "year", .. })));
    }

    // ── difference / compare ────────────────────────────────────────────

    #[test]
    fn test_difference_normalizes_offsets() {
        let a = point("2020-01-01T12:00+02:00");
        let b = point("2020-01-01T09:00Z");
        assert_eq!(a.difference(&b).unwrap(), dur("PT1H"));
        assert_eq!(b.difference(&a).unwrap(), dur("-PT1H"));
    }

    #[test]
    fn test_difference_in_days() {
        assert_eq!(point("2020-03-01").difference(&point("2020-02-01")).unwrap(), dur("P29D"));
        assert_eq!(point_360("2020-03-01").difference(&point_360("2020-02-01")).unwrap(), dur("P30D"));
    }

    #[test]
    fn test_compare_across_representations() {
        assert_eq!(point("2020-060").compare(&point("2020-02-29")).unwrap(), Ordering::Equal);
        assert_eq!(point("2020-W09-6").compare(&point("2020-02-29")).unwrap(), Ordering::Equal);
        assert_eq!(point("2020-02").compare(&point("2020-02-01T00:00")).unwrap(), Ordering::Equal);
        assert_eq!(
            point("2020-01-01T00:00+01:00").compare(&point("2020-01-01T00:00Z")).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_equality_is_by_instant() {
        assert_eq!(point("2020-060"), point("2020-02-29"));
        assert_eq!(point("2020-02"), point("2020-02-01T00:00"));
        assert_eq!(point("2020-01-01T12"), point("2020-01-01T12:00Z"));
        assert_ne!(point("2020-01-01T00:00+01:00"), point("2020-01-01T00:00Z"));
        assert_ne!(point("2020-01-01"), point_360("2020-01-01"));
        assert!(!point("2020-060").same_representation(&point("2020-02-29")));

        let set: std::collections::HashSet<TimePoint> =
            [point("2020-060"), point("2020-02-29"), point("2020-W09-6")].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_truncated_equality_is_by_fields() {
        assert_eq!(point("--02-15"), point("--0215"));
        assert_ne!(point("--02-15"), point("--02-16"));
        assert_ne!(point("---15"), point("2020-02-15"));
    }

    #[test]
    fn test_compare_truncated_fails() {
        let err = point("--02-15").compare(&point("2020-02-15")).unwrap_err();
        assert!(matches!(err, Error::Arithmetic(ArithmeticError::Incomparable(_))));
    }

    #[test]
    fn test_compare_mixed_calendars_fails() {
        let err = point("2020-01-01").compare(&point_360("2020-01-01")).unwrap_err();
        assert!(matches!(err, Error::Arithmetic(ArithmeticError::Incomparable(_))));
    }

    #[test]
    fn test_to_offset() {
        let p = point("2020-01-01T23:30-01:00").to_utc().unwrap();
        assert_eq!(p, point("2020-01-02T00:30Z"));
    }

    // ── resolve ─────────────────────────────────────────────────────────

    #[test]
    fn test_resolve_day_of_month_rolls_month() {
        assert_eq!(point("--15").resolve(&point("2020-02-20")).unwrap(), point("2020-03-15"));
        assert_eq!(point("---15").resolve(&point("2020-02-20")).unwrap(), point("2020-03-15"));
        assert_eq!(point("---15").resolve(&point("2020-02-15")).unwrap(), point("2020-02-15"));
    }

    #[test]
    fn test_resolve_two_dash_pair_is_a_day_even_when_a_valid_month() {
        let resolved = point("--05").resolve(&point("2020-02-20")).unwrap();
        assert_written_as(resolved, "2020-03-05");
        assert_eq!(point("--05").to_string(), "---05");
        assert!(point("--05").same_representation(&point("---05")));
    }

    #[test]
    fn test_resolve_skips_short_months() {
        assert_eq!(point("---31").resolve(&point("2021-04-01")).unwrap(), point("2021-05-31"));
        assert_eq!(point("--02-29").resolve(&point("2021-01-01")).unwrap(), point("2024-02-29"));
    }

    #[test]
    fn test_resolve_month_day_rolls_year() {
        assert_eq!(point("--01-15").resolve(&point("2020-02-20")).unwrap(), point("2021-01-15"));
        assert_eq!(point("--03-01").resolve(&point("2020-02-20")).unwrap(), point("2020-03-01"));
    }

    #[test]
    fn test_resolve_century() {
        assert_eq!(point("-21-06-01").resolve(&point("2020-02-20")).unwrap(), point("2021-06-01"));
        assert_eq!(point("-19-06-01").resolve(&point("2020-02-20")).unwrap(), point("2119-06-01"));
    }

    #[test]
    fn test_resolve_weekday() {
        // 2026-02-18 is a Wednesday; the next Monday is 2026-W09-1
        assert_eq!(point("-W-1").resolve(&point("2026-02-18")).unwrap(), point("2026-W09-1"));
        assert_eq!(point("-W-3").resolve(&point("2026-02-18")).unwrap(), point("2026-W08-3"));
    }

    #[test]
    fn test_resolve_time_only() {
        assert_eq!(
            point("T06:00").resolve(&point("2020-02-20T12:00Z")).unwrap(),
            point("2020-02-21T06:00Z")
        );
        assert_eq!(
            point("T-30").resolve(&point("2020-02-20T12:45Z")).unwrap(),
            point("2020-02-20T13:30Z")
        );
        assert_eq!(
            point("T--10").resolve(&point("2020-12-31T23:59:30Z")).unwrap(),
            point("2021-01-01T00:00:10Z")
        );
    }

    #[test]
    fn test_resolve_against_truncated_reference_fails() {
        assert!(point("--15").resolve(&point("--02-20")).is_err());
    }

    #[test]
    fn test_with_assumed_year() {
        assert_eq!(point("--02-15").with_assumed_year(2021).unwrap(), point("2021-02-15"));
        assert_eq!(point("-05-060").with_assumed_year(1999).unwrap(), point("1905-060"));
        assert!(point("--02-29").with_assumed_year(2021).is_err());
    }

    // ── chrono interop ──────────────────────────────────────────────────

    #[test]
    fn test_chrono_round_trip() {
        let p = point("2020-02-29T13:45:30.5+05:30");
        let dt = p.to_chrono().unwrap();
        assert_eq!(dt.to_rfc3339(), "2020-02-29T13:45:30.500+05:30");
        assert_eq!(TimePoint::from_chrono(&dt).unwrap(), p);
    }

    #[test]
    fn test_chrono_rejects_fixed360() {
        assert!(point_360("2020-02-30").to_chrono().is_err());
    }
}
