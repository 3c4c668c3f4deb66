//! Rendering of time points, durations and recurrences as ISO 8601 text.
//!
//! `Display` uses automatic layouts: extended separators, and exactly the
//! fields and precision the value carries, so that parsing the output gives
//! back an equal value. Custom layouts go through [`Template`].

use std::fmt::{self, Write};
use std::str::FromStr;

use crate::duration::{Duration, FixedUnit};
use crate::error::FormatError;
use crate::fraction::{Fraction, NANOS_PER_HOUR, NANOS_PER_MINUTE, NANOS_PER_SECOND};
use crate::point::{DateRepr, TimePoint, TruncatedDate, UtcOffset};
use crate::recurrence::{RecurrenceForm, TimeRecurrence};
use crate::template::{render, Fields, OffsetStyle, Template, Token, DATE_PATTERNS, DEFAULT_EXPANDED_DIGITS};
use crate::Value;

/// Output layout for [`format`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Format {
    /// The layout the value was written in, with extended separators.
    #[default]
    Auto,
    Template(Template),
}

impl FromStr for Format {
    type Err = FormatError;

    /// `"auto"` or a template such as `"CCYYMMDDThhmmZ"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(Format::Auto)
        } else {
            Template::new(s).map(Format::Template)
        }
    }
}

/// Render a parsed value.
///
/// Templates apply to time points, including the points of a recurrence.
///
/// # Errors
///
/// - [`FormatError::MissingField`] when the template needs a field the
///   value does not specify (a year for `--02-15`)
/// - [`FormatError::UnsupportedTemplate`] when a template is given for a
///   duration, or a four-digit year layout meets a year outside 0..=9999
///
/// # Examples
///
/// ```
/// use isotempo::{format, parse, Calendar, Format, ParseOptions};
///
/// let value = parse("2020-02-29T12:30Z", &Calendar::standard(), &ParseOptions::default()).unwrap();
/// assert_eq!(format(&value, &Format::Auto).unwrap(), "2020-02-29T12:30Z");
///
/// let basic: Format = "CCYYDDDThhmmZ".parse().unwrap();
/// assert_eq!(format(&value, &basic).unwrap(), "2020060T1230Z");
/// ```
pub fn format(value: &Value, format: &Format) -> Result<String, FormatError> {
    let template = match format {
        Format::Auto => return Ok(value.to_string()),
        Format::Template(t) => t,
    };
    match value {
        Value::TimePoint(p) => p.format_with(template),
        Value::Duration(d) => Err(FormatError::UnsupportedTemplate(format!(
            "{template} cannot lay out the duration {d}"
        ))),
        Value::Recurrence(r) => {
            let mut out = String::from("R");
            if let Some(n) = r.repetitions() {
                let _ = write!(out, "{n}");
            }
            out.push('/');
            match (r.form(), r.end()) {
                (RecurrenceForm::StartEnd, Some(end)) => {
                    out.push_str(&r.start().format_with(template)?);
                    out.push('/');
                    out.push_str(&end.format_with(template)?);
                }
                (RecurrenceForm::DurationEnd, Some(end)) => {
                    let _ = write!(out, "{}/", r.duration());
                    out.push_str(&end.format_with(template)?);
                }
                _ => {
                    out.push_str(&r.start().format_with(template)?);
                    let _ = write!(out, "/{}", r.duration());
                }
            }
            Ok(out)
        }
    }
}

// ── Time points ─────────────────────────────────────────────────────────────

impl TimePoint {
    /// Render through a custom template.
    pub fn format_with(&self, template: &Template) -> Result<String, FormatError> {
        let date_tokens = template.date_tokens();
        let week_based = date_tokens.contains(&Token::Week);
        let fields = self.fields(week_based);
        let digits = match self.expanded_digits() {
            0 => DEFAULT_EXPANDED_DIGITS,
            n => n,
        };
        let expanded = expanded_width(digits, fields.year);

        let mut out = String::new();
        render(&date_tokens, &fields, expanded, &mut out)?;

        if template.has_time() {
            let time_tokens = template.time_tokens();
            out.push('T');
            render(&time_tokens, &fields, 0, &mut out)?;
            if template.fraction_digits() > 0 {
                let unit = if time_tokens.contains(&Token::Second) {
                    NANOS_PER_SECOND
                } else if time_tokens.contains(&Token::Minute) {
                    NANOS_PER_MINUTE
                } else {
                    NANOS_PER_HOUR
                };
                let nanos = self.time().map_or(0, |t| t.nanos());
                let fraction = Fraction::from_nanos(nanos % unit, unit, template.fraction_digits())
                    .ok_or(FormatError::MissingField("fraction"))?;
                out.push(template.decimal_sign());
                let _ = write!(out, "{fraction}");
            }
            if let (Some(style), Some(offset)) = (template.offset_style(), self.offset()) {
                write_offset(&mut out, offset, style);
            }
        }
        Ok(out)
    }

    /// The layout `Display` uses for this point.
    fn auto_template(&self) -> Template {
        let year = match *self.date() {
            DateRepr::Calendar { year, .. } | DateRepr::Ordinal { year, .. } | DateRepr::Week { year, .. } => Some(year),
            _ => None,
        };
        let expanded = self.expanded_digits() > 0 || year.is_some_and(|y| !(0..=9999).contains(&y));
        let date = match *self.date() {
            DateRepr::Calendar { month, day, .. } => Some(match (month, day) {
                (Some(_), Some(_)) => "CCYY-MM-DD",
                (Some(_), None) => "CCYY-MM",
                _ => "CCYY",
            }),
            DateRepr::Ordinal { .. } => Some("CCYY-DDD"),
            DateRepr::Week { weekday, .. } => Some(if weekday.is_some() { "CCYY-Www-D" } else { "CCYY-Www" }),
            DateRepr::Truncated(t) => Some(match t {
                TruncatedDate::Century { month, day, .. } => match (month, day) {
                    (Some(_), Some(_)) => "-YY-MM-DD",
                    (Some(_), None) => "-YY-MM",
                    _ => "-YY",
                },
                TruncatedDate::CenturyOrdinal { .. } => "-YY-DDD",
                TruncatedDate::CenturyWeek { weekday, .. } => {
                    if weekday.is_some() {
                        "-YY-Www-D"
                    } else {
                        "-YY-Www"
                    }
                }
                TruncatedDate::MonthDay { .. } => "--MM-DD",
                TruncatedDate::Day { .. } => "---DD",
                TruncatedDate::DayOfYear { .. } => "-DDD",
                TruncatedDate::WeekDay { weekday, .. } => {
                    if weekday.is_some() {
                        "-Www-D"
                    } else {
                        "-Www"
                    }
                }
                TruncatedDate::Weekday { .. } => "-W-D",
            }),
            DateRepr::Omitted => None,
        };
        let date = date.map(|d| if expanded { expanded_pattern(d) } else { d });

        let time = self.time().map(|t| match (t.hour(), t.minute(), t.second()) {
            (Some(_), None, _) => "hh",
            (Some(_), Some(_), None) => "hh:mm",
            (Some(_), Some(_), Some(_)) => "hh:mm:ss",
            (None, Some(_), None) => "-mm",
            (None, Some(_), Some(_)) => "-mm:ss",
            (None, None, _) => "--ss",
        });
        let digits = self.time().and_then(|t| t.fraction()).map_or(0, |f| f.digits());
        let offset = self.offset().map(|o| match o {
            UtcOffset::Utc => OffsetStyle::Zulu,
            UtcOffset::Hours(_) => OffsetStyle::Hours,
            UtcOffset::HoursMinutes(_) => OffsetStyle::Extended,
        });
        Template::from_parts(date, time, digits, offset)
    }

    /// Every field this point specifies or implies. Week-based layouts take
    /// the ISO week-numbering year.
    fn fields(&self, week_based: bool) -> Fields {
        let cal = self.calendar();
        let mut fields = Fields::default();

        match *self.date() {
            DateRepr::Truncated(t) => match t {
                TruncatedDate::Century {
                    year_of_century,
                    month,
                    day,
                } => {
                    fields.year_of_century = Some(year_of_century);
                    fields.month = month;
                    fields.day = day;
                }
                TruncatedDate::CenturyOrdinal {
                    year_of_century,
                    day_of_year,
                } => {
                    fields.year_of_century = Some(year_of_century);
                    fields.day_of_year = Some(day_of_year);
                }
                TruncatedDate::CenturyWeek {
                    year_of_century,
                    week,
                    weekday,
                } => {
                    fields.year_of_century = Some(year_of_century);
                    fields.week = Some(week);
                    fields.weekday = weekday;
                }
                TruncatedDate::MonthDay { month, day } => {
                    fields.month = Some(month);
                    fields.day = Some(day);
                }
                TruncatedDate::Day { day } => fields.day = Some(day),
                TruncatedDate::DayOfYear { day_of_year } => fields.day_of_year = Some(day_of_year),
                TruncatedDate::WeekDay { week, weekday } => {
                    fields.week = Some(week);
                    fields.weekday = weekday;
                }
                TruncatedDate::Weekday { weekday } => fields.weekday = Some(weekday),
            },
            DateRepr::Omitted => {}
            _ => {
                if let Ok(civil) = self.civil() {
                    let ordinal = cal.month_day_to_ordinal(civil.year, civil.month, civil.day).ok();
                    let week = cal.iso_week_date(civil.year, civil.month, civil.day).ok();
                    let year = if week_based { week.map(|w| w.0) } else { Some(civil.year) };
                    fields.year = year;
                    fields.year_of_century = year.map(|y| y.rem_euclid(100) as u32);
                    fields.month = Some(civil.month);
                    fields.day = Some(civil.day);
                    fields.day_of_year = ordinal;
                    fields.week = week.map(|w| w.1);
                    fields.weekday = week.map(|w| w.2);
                }
            }
        }

        match self.time() {
            Some(t) => {
                let nanos = t.nanos();
                fields.hour = t.hour().map(|_| (nanos / NANOS_PER_HOUR) as u32);
                fields.minute = (t.hour().is_some() || t.minute().is_some())
                    .then_some((nanos % NANOS_PER_HOUR / NANOS_PER_MINUTE) as u32);
                fields.second = Some((nanos % NANOS_PER_MINUTE / NANOS_PER_SECOND) as u32);
            }
            None => {
                fields.hour = Some(0);
                fields.minute = Some(0);
                fields.second = Some(0);
            }
        }
        fields
    }
}

/// The `±XCCYY` variant of a four-digit-year layout.
fn expanded_pattern(pattern: &'static str) -> &'static str {
    DATE_PATTERNS
        .iter()
        .find(|p| p.strip_prefix("±X") == Some(pattern))
        .copied()
        .unwrap_or(pattern)
}

/// Extra digits needed to write `year` with at least `digits` extra digits.
fn expanded_width(digits: u8, year: Option<i64>) -> u8 {
    let needed = year.map_or(0, |y| y.unsigned_abs().to_string().len().saturating_sub(4));
    digits.max(u8::try_from(needed).unwrap_or(u8::MAX))
}

fn write_offset(out: &mut String, offset: UtcOffset, style: OffsetStyle) {
    let minutes = offset.minutes();
    if style == OffsetStyle::Zulu && minutes == 0 {
        out.push('Z');
        return;
    }
    let sign = if minutes < 0 { '-' } else { '+' };
    let (h, m) = (minutes.abs() / 60, minutes.abs() % 60);
    let _ = match style {
        OffsetStyle::Zulu | OffsetStyle::Extended => write!(out, "{sign}{h:02}:{m:02}"),
        OffsetStyle::Basic => write!(out, "{sign}{h:02}{m:02}"),
        OffsetStyle::Hours => write!(out, "{sign}{h:02}"),
    };
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.format_with(&self.auto_template()).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self {
            UtcOffset::Utc => OffsetStyle::Zulu,
            UtcOffset::Hours(_) => OffsetStyle::Hours,
            UtcOffset::HoursMinutes(_) => OffsetStyle::Extended,
        };
        let mut out = String::new();
        write_offset(&mut out, *self, style);
        f.write_str(&out)
    }
}

// ── Durations ───────────────────────────────────────────────────────────────

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            f.write_char('-')?;
        }
        f.write_char('P')?;
        let fraction = self.fraction();
        let component = |f: &mut fmt::Formatter<'_>, value: u64, unit: FixedUnit, designator: char| {
            write!(f, "{value}")?;
            if let Some((_, frac)) = fraction.filter(|(u, _)| *u == unit) {
                write!(f, ".{frac}")?;
            }
            f.write_char(designator)
        };
        let carries = |unit: FixedUnit| fraction.is_some_and(|(u, _)| u == unit);

        if self.is_week_form() {
            return component(f, self.weeks(), FixedUnit::Weeks, 'W');
        }

        let days = self.days().saturating_add(self.weeks().saturating_mul(7));
        let mut written = false;
        if self.years() != 0 {
            write!(f, "{}Y", self.years())?;
            written = true;
        }
        if self.months() != 0 {
            write!(f, "{}M", self.months())?;
            written = true;
        }
        if days != 0 || carries(FixedUnit::Days) {
            component(f, days, FixedUnit::Days, 'D')?;
            written = true;
        }

        let clock = [
            (self.hours(), FixedUnit::Hours, 'H'),
            (self.minutes(), FixedUnit::Minutes, 'M'),
            (self.seconds(), FixedUnit::Seconds, 'S'),
        ];
        if clock.iter().any(|(v, unit, _)| *v != 0 || carries(*unit)) {
            f.write_char('T')?;
            for (value, unit, designator) in clock {
                if value != 0 || carries(unit) {
                    component(f, value, unit, designator)?;
                }
            }
        } else if !written {
            f.write_str("T0S")?;
        }
        Ok(())
    }
}

// ── Recurrences ─────────────────────────────────────────────────────────────

impl fmt::Display for TimeRecurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('R')?;
        if let Some(n) = self.repetitions() {
            write!(f, "{n}")?;
        }
        match (self.form(), self.end()) {
            (RecurrenceForm::StartEnd, Some(end)) => write!(f, "/{}/{end}", self.start()),
            (RecurrenceForm::DurationEnd, Some(end)) => write!(f, "/{}/{end}", self.duration()),
            _ => write!(f, "/{}/{}", self.start(), self.duration()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::TimePoint(p) => write!(f, "{p}"),
            Value::Duration(d) => write!(f, "{d}"),
            Value::Recurrence(r) => write!(f, "{r}"),
        }
    }
}
