//! ISO 8601 parser for time points, durations and recurrences.
//!
//! Every layout is tried in a fixed priority order (see
//! [`crate::template`]). Each attempt either matches, fails structurally, or
//! matches structurally but carries an invalid field. When nothing
//! matches, the error reported is the first invalid field if there was one,
//! then a basic/extended mix if one can be detected, and plain syntax
//! otherwise.

use serde::Deserialize;

use crate::calendar::Calendar;
use crate::duration::{Duration, FixedUnit};
use crate::error::{CalendarError, Error, ParseError};
use crate::fraction::Fraction;
use crate::point::{validate_date, DateRepr, TimeOfDay, TimePoint, TruncatedDate, UtcOffset};
use crate::recurrence::TimeRecurrence;
use crate::template::{
    match_tokens, style, tokenize, Captures, Style, DATE_PATTERNS, DEFAULT_EXPANDED_DIGITS,
    MAX_EXPANDED_DIGITS, TIME_PATTERNS,
};
use crate::Value;

/// Knobs for reading ambiguous or incomplete input.
///
/// Deserializes from a partial map; omitted keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Year filled into truncated dates that omit only the year or century.
    pub assumed_year: Option<i64>,
    /// Complete point that truncated input is resolved against. Takes
    /// precedence over `assumed_year`.
    #[serde(skip)]
    pub assumed_reference: Option<TimePoint>,
    /// Whether truncated points may be returned unresolved.
    pub allow_truncated: bool,
    /// Digits beyond four in expanded years (`+002020` has two).
    pub expanded_year_digits: u8,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            assumed_year: None,
            assumed_reference: None,
            allow_truncated: true,
            expanded_year_digits: DEFAULT_EXPANDED_DIGITS,
        }
    }
}

impl ParseOptions {
    fn expanded_digits(&self) -> u8 {
        self.expanded_year_digits.clamp(1, MAX_EXPANDED_DIGITS)
    }
}

/// Outcome of trying one grammar.
enum Attempt<T> {
    Matched(T),
    Mismatch,
    Invalid(ParseError),
}

/// Remembers the first invalid-field error across attempts.
#[derive(Default)]
struct Diagnostics {
    invalid: Option<ParseError>,
}

impl Diagnostics {
    fn record<T>(&mut self, attempt: Attempt<T>) -> Option<T> {
        match attempt {
            Attempt::Matched(value) => Some(value),
            Attempt::Mismatch => None,
            Attempt::Invalid(err) => {
                self.invalid.get_or_insert(err);
                None
            }
        }
    }

    fn finish(self, what: &str, text: &str) -> ParseError {
        self.invalid
            .unwrap_or_else(|| ParseError::Syntax(format!("{text:?} is not an ISO 8601 {what}")))
    }
}

// ── Entry points ────────────────────────────────────────────────────────────

/// Parse any ISO 8601 value: a recurrence, a duration or a time point.
///
/// # Errors
///
/// - [`ParseError::Syntax`] when no grammar matches
/// - [`ParseError::Range`] when a layout matches but a field does not exist
///   in `calendar` (`2020-13-01`)
/// - [`ParseError::PrecisionMismatch`] when the parts do not line up
/// - [`ParseError::AmbiguousFormat`] when basic and extended layouts are mixed
/// - [`ParseError::Recurrence`] when recurrence bounds are inconsistent
///
/// # Examples
///
/// ```
/// use isotempo::{parse, Calendar, ParseOptions, Value};
///
/// let cal = Calendar::standard();
/// let opts = ParseOptions::default();
/// let value = parse("2020-060T12:30Z", &cal, &opts).unwrap();
/// assert!(matches!(value, Value::TimePoint(_)));
/// assert!(parse("P1Y2M", &cal, &opts).unwrap().as_duration().is_some());
/// assert!(parse("R3/2020-01-01/P1D", &cal, &opts).unwrap().as_recurrence().is_some());
/// assert!(parse("2020-13-01", &cal, &opts).is_err());
/// ```
#[tracing::instrument(level = "debug", skip(calendar, options), fields(calendar = %calendar))]
pub fn parse(text: &str, calendar: &Calendar, options: &ParseOptions) -> Result<Value, ParseError> {
    let text = text.trim();
    let mut diagnostics = Diagnostics::default();
    if let Some(r) = diagnostics.record(recurrence_attempt(text, calendar, options)) {
        return Ok(Value::Recurrence(r));
    }
    if let Some(d) = diagnostics.record(duration_attempt(text)) {
        return Ok(Value::Duration(d));
    }
    if let Some(p) = diagnostics.record(point_attempt(text, calendar, options)) {
        return Ok(Value::TimePoint(p));
    }
    Err(diagnostics.finish("value", text))
}

/// Parse a time point, resolving truncation as `options` direct.
pub fn parse_time_point(text: &str, calendar: &Calendar, options: &ParseOptions) -> Result<TimePoint, ParseError> {
    let text = text.trim();
    let mut diagnostics = Diagnostics::default();
    diagnostics
        .record(point_attempt(text, calendar, options))
        .ok_or_else(|| diagnostics.finish("time point", text))
}

/// Parse `[±]PnYnMnDTnHnMnS` or `[±]PnW`.
///
/// Any component may be omitted but at least one must be present; a
/// decimal fraction is allowed only on the last component given, and never
/// on years or months.
pub fn parse_duration(text: &str) -> Result<Duration, ParseError> {
    let text = text.trim();
    let syntax = |why: &str| ParseError::Syntax(format!("{text:?} is not an ISO 8601 duration: {why}"));

    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let body = unsigned.strip_prefix('P').ok_or_else(|| syntax("missing 'P'"))?;
    if body.is_empty() {
        return Err(syntax("no components"));
    }

    if body.contains('W') {
        let weeks = body
            .strip_suffix('W')
            .filter(|n| n.bytes().all(|b| b.is_ascii_digit() || b == b',' || b == b'.'))
            .ok_or_else(|| syntax("the week form PnW cannot be combined with other designators"))?;
        let (whole, fraction) = read_number(weeks, 'W').map_err(|e| e.unwrap_or_else(|| syntax("bad week count")))?;
        let mut d = Duration::ZERO.with_weeks(whole);
        if let Some(f) = fraction {
            d = d.with_fraction(FixedUnit::Weeks, f);
        }
        return Ok(d.with_negative(negative));
    }

    let (date_part, time_part) = match body.find('T') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    if time_part == Some("") {
        return Err(syntax("'T' must be followed by a time component"));
    }

    // (designator, value text) in the order written
    let mut components: Vec<(char, &str)> = Vec::new();
    for (part, designators) in [(date_part, "YMD"), (time_part.unwrap_or(""), "HMS")] {
        let mut rest = part;
        let mut allowed = designators;
        while !rest.is_empty() {
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
                .ok_or_else(|| syntax("number without a designator"))?;
            let designator = rest[end..].chars().next().ok_or_else(|| syntax("number without a designator"))?;
            let position = allowed
                .find(designator)
                .ok_or_else(|| syntax(&format!("unexpected or out-of-order designator '{designator}'")))?;
            if end == 0 {
                return Err(syntax(&format!("designator '{designator}' without a number")));
            }
            let unit = if designators == "HMS" { designator.to_ascii_lowercase() } else { designator };
            components.push((unit, &rest[..end]));
            allowed = &allowed[position + 1..];
            rest = &rest[end + designator.len_utf8()..];
        }
    }

    let mut d = Duration::ZERO;
    let last = components.len().saturating_sub(1);
    for (i, (unit, number)) in components.iter().enumerate() {
        let (whole, fraction) = read_number(number, *unit).map_err(|e| e.unwrap_or_else(|| syntax("bad number")))?;
        if fraction.is_some() && i != last {
            return Err(ParseError::PrecisionMismatch(format!(
                "{text}: only the last component may have a fraction"
            )));
        }
        let fixed = match unit {
            'Y' => {
                d = d.with_years(whole);
                None
            }
            'M' => {
                d = d.with_months(whole);
                None
            }
            'D' => {
                d = d.with_days(whole);
                Some(FixedUnit::Days)
            }
            'h' => {
                d = d.with_hours(whole);
                Some(FixedUnit::Hours)
            }
            'm' => {
                d = d.with_minutes(whole);
                Some(FixedUnit::Minutes)
            }
            _ => {
                d = d.with_seconds(whole);
                Some(FixedUnit::Seconds)
            }
        };
        if let Some(f) = fraction {
            let unit = fixed.ok_or_else(|| {
                ParseError::PrecisionMismatch(format!("{text}: years and months cannot have fractions"))
            })?;
            d = d.with_fraction(unit, f);
        }
    }
    Ok(d.with_negative(negative))
}

/// Parse `R[n]/<start>/<end>`, `R[n]/<start>/<duration>` or
/// `R[n]/<duration>/<end>`.
pub fn parse_recurrence(text: &str, calendar: &Calendar, options: &ParseOptions) -> Result<TimeRecurrence, ParseError> {
    let text = text.trim();
    let mut diagnostics = Diagnostics::default();
    diagnostics
        .record(recurrence_attempt(text, calendar, options))
        .ok_or_else(|| diagnostics.finish("recurrence", text))
}

// ── Number reading ──────────────────────────────────────────────────────────

/// `Err(None)` is a syntax error; `Err(Some(_))` a more specific one.
fn read_number(text: &str, unit: char) -> Result<(u64, Option<Fraction>), Option<ParseError>> {
    let (whole, fraction) = match text.find([',', '.']) {
        Some(i) => (&text[..i], Some(&text[i + 1..])),
        None => (text, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(None);
    }
    let value = whole.parse::<u64>().map_err(|_| {
        Some(ParseError::Range(CalendarError::OutOfRange {
            field: duration_field_name(unit),
            value: i64::MAX,
        }))
    })?;
    let fraction = match fraction {
        Some(digits) => Some(Fraction::parse(digits).ok_or(None)?),
        None => None,
    };
    Ok((value, fraction))
}

fn duration_field_name(unit: char) -> &'static str {
    match unit {
        'Y' => "years",
        'M' => "months",
        'W' => "weeks",
        'D' => "days",
        'h' => "hours",
        'm' => "minutes",
        _ => "seconds",
    }
}

// ── Families ────────────────────────────────────────────────────────────────

fn looks_like_duration(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    unsigned.starts_with('P')
}

fn duration_attempt(text: &str) -> Attempt<Duration> {
    if !looks_like_duration(text) {
        return Attempt::Mismatch;
    }
    match parse_duration(text) {
        Ok(d) => Attempt::Matched(d),
        Err(e) => Attempt::Invalid(e),
    }
}

fn point_attempt(text: &str, calendar: &Calendar, options: &ParseOptions) -> Attempt<TimePoint> {
    match raw_point(text, calendar, options) {
        Attempt::Matched(p) => match apply_options(p, options) {
            Ok(p) => {
                tracing::debug!(point = %p, "parsed time point");
                Attempt::Matched(p)
            }
            Err(e) => Attempt::Invalid(e),
        },
        other => other,
    }
}

/// Resolve or reject truncation as `options` direct.
fn apply_options(point: TimePoint, options: &ParseOptions) -> Result<TimePoint, ParseError> {
    if !point.is_truncated() {
        return Ok(point);
    }
    if let Some(reference) = &options.assumed_reference {
        return point.resolve(reference).map_err(into_parse_error);
    }
    let point = match options.assumed_year {
        Some(year) => point.with_assumed_year(year)?,
        None => point,
    };
    if point.is_truncated() && !options.allow_truncated {
        return Err(ParseError::PrecisionMismatch(format!(
            "{point} is truncated and truncated points are not allowed here"
        )));
    }
    Ok(point)
}

fn into_parse_error(err: Error) -> ParseError {
    match err {
        Error::Parse(e) => e,
        Error::Calendar(e) => ParseError::Range(e),
        Error::Recurrence(e) => ParseError::Recurrence(e),
        other => ParseError::PrecisionMismatch(other.to_string()),
    }
}

// ── Time points ─────────────────────────────────────────────────────────────

fn raw_point(text: &str, calendar: &Calendar, options: &ParseOptions) -> Attempt<TimePoint> {
    if text.is_empty() || looks_like_duration(text) || text.starts_with('R') {
        return Attempt::Mismatch;
    }
    let (date_text, time_text) = match text.find('T') {
        Some(i) => (&text[..i], Some(&text[i + 1..])),
        None => (text, None),
    };

    let (date, date_style, expanded) = if date_text.is_empty() {
        if time_text.is_none() {
            return Attempt::Mismatch;
        }
        (DateRepr::Omitted, Style::Neutral, 0)
    } else {
        match parse_date(date_text, calendar, options.expanded_digits()) {
            Attempt::Matched(parts) => parts,
            Attempt::Mismatch => return Attempt::Mismatch,
            Attempt::Invalid(e) => return Attempt::Invalid(e),
        }
    };

    let (time, offset, time_style, offset_style) = match time_text {
        None => (None, None, Style::Neutral, Style::Neutral),
        Some(t) => match parse_time(t) {
            Attempt::Matched((time, offset, ts, os)) => (Some(time), offset, ts, os),
            Attempt::Mismatch => return Attempt::Mismatch,
            Attempt::Invalid(e) => return Attempt::Invalid(e),
        },
    };

    let styles = [date_style, time_style, offset_style];
    if styles.iter().any(|a| styles.iter().any(|b| a.conflicts_with(*b))) {
        return Attempt::Invalid(ParseError::AmbiguousFormat(format!(
            "{text:?} mixes basic and extended layouts"
        )));
    }

    match TimePoint::new(*calendar, date, time, offset) {
        Ok(p) => Attempt::Matched(p.with_expanded_digits(expanded)),
        Err(e) => Attempt::Invalid(e),
    }
}

fn parse_date(text: &str, calendar: &Calendar, expanded_digits: u8) -> Attempt<(DateRepr, Style, u8)> {
    let mut diagnostics = Diagnostics::default();
    for pattern in DATE_PATTERNS {
        let tokens = tokenize(pattern).unwrap_or_default();
        let Some(caps) = match_tokens(&tokens, text, expanded_digits) else {
            continue;
        };
        let date = date_from_captures(&caps);
        match validate_date(calendar, &date) {
            Ok(()) => {
                let expanded = if caps.expanded { expanded_digits } else { 0 };
                return Attempt::Matched((date, style(&tokens), expanded));
            }
            Err(e) => {
                tracing::trace!(pattern, error = %e, "date layout matched with invalid fields");
                diagnostics.record::<()>(Attempt::Invalid(e));
            }
        }
    }
    if let Some(e) = diagnostics.invalid {
        return Attempt::Invalid(e);
    }
    if mixes_separators(text, DATE_PATTERNS, b'-', expanded_digits) {
        return Attempt::Invalid(ParseError::AmbiguousFormat(format!(
            "date {text:?} mixes basic and extended layouts"
        )));
    }
    Attempt::Mismatch
}

fn date_from_captures(caps: &Captures) -> DateRepr {
    if let Some(year) = caps.year {
        if let Some(day_of_year) = caps.day_of_year {
            DateRepr::Ordinal { year, day_of_year }
        } else if let Some(week) = caps.week {
            DateRepr::Week {
                year,
                week,
                weekday: caps.weekday,
            }
        } else {
            DateRepr::Calendar {
                year,
                month: caps.month,
                day: caps.day,
            }
        }
    } else if let Some(year_of_century) = caps.year_of_century {
        let truncated = if let Some(day_of_year) = caps.day_of_year {
            TruncatedDate::CenturyOrdinal {
                year_of_century,
                day_of_year,
            }
        } else if let Some(week) = caps.week {
            TruncatedDate::CenturyWeek {
                year_of_century,
                week,
                weekday: caps.weekday,
            }
        } else {
            TruncatedDate::Century {
                year_of_century,
                month: caps.month,
                day: caps.day,
            }
        };
        DateRepr::Truncated(truncated)
    } else if let (Some(month), Some(day)) = (caps.month, caps.day) {
        DateRepr::Truncated(TruncatedDate::MonthDay { month, day })
    } else if let Some(day_of_year) = caps.day_of_year {
        DateRepr::Truncated(TruncatedDate::DayOfYear { day_of_year })
    } else if let Some(week) = caps.week {
        DateRepr::Truncated(TruncatedDate::WeekDay {
            week,
            weekday: caps.weekday,
        })
    } else if let Some(weekday) = caps.weekday {
        DateRepr::Truncated(TruncatedDate::Weekday { weekday })
    } else {
        DateRepr::Truncated(TruncatedDate::Day {
            day: caps.day.unwrap_or(0),
        })
    }
}

/// Whether `text` would match a basic layout once its inner separators are
/// dropped, i.e. it uses separators between some fields but not others.
fn mixes_separators(text: &str, patterns: &[&str], separator: u8, expanded_digits: u8) -> bool {
    let lead = text
        .bytes()
        .take_while(|b| *b == b'-' || *b == b'+')
        .count();
    if !text.as_bytes()[lead..].contains(&separator) {
        return false;
    }
    let stripped: String = text[..lead]
        .chars()
        .chain(text[lead..].chars().filter(|c| *c as u32 != u32::from(separator)))
        .collect();
    patterns.iter().any(|p| {
        let tokens = tokenize(p).unwrap_or_default();
        style(&tokens) == Style::Basic && match_tokens(&tokens, &stripped, expanded_digits).is_some()
    })
}

type TimeParts = (TimeOfDay, Option<UtcOffset>, Style, Style);

fn parse_time(text: &str) -> Attempt<TimeParts> {
    let (clock, offset_text) = split_offset(text);
    let (offset, offset_style) = match offset_text {
        None => (None, Style::Neutral),
        Some(o) => match parse_offset(o) {
            Attempt::Matched((offset, style)) => (Some(offset), style),
            Attempt::Mismatch => return Attempt::Mismatch,
            Attempt::Invalid(e) => return Attempt::Invalid(e),
        },
    };

    let (clock, fraction) = match clock.find([',', '.']) {
        Some(i) => match Fraction::parse(&clock[i + 1..]) {
            Some(f) => (&clock[..i], Some(f)),
            None => {
                return Attempt::Invalid(ParseError::Syntax(format!(
                    "{text:?}: a fraction needs one to nine digits"
                )))
            }
        },
        None => (clock, None),
    };

    let mut diagnostics = Diagnostics::default();
    for pattern in TIME_PATTERNS {
        let tokens = tokenize(pattern).unwrap_or_default();
        let Some(caps) = match_tokens(&tokens, clock, 0) else {
            continue;
        };
        match TimeOfDay::new(caps.hour, caps.minute, caps.second, fraction) {
            Ok(time) => return Attempt::Matched((time, offset, style(&tokens), offset_style)),
            Err(e) => {
                tracing::trace!(pattern, error = %e, "time layout matched with invalid fields");
                diagnostics.record::<()>(Attempt::Invalid(e));
            }
        }
    }
    if let Some(e) = diagnostics.invalid {
        return Attempt::Invalid(e);
    }
    if mixes_separators(clock, TIME_PATTERNS, b':', 0) {
        return Attempt::Invalid(ParseError::AmbiguousFormat(format!(
            "time {text:?} mixes basic and extended layouts"
        )));
    }
    Attempt::Mismatch
}

/// Split a trailing `Z` or `±hh[:mm]` off a time, skipping the leading
/// dashes of a truncated time.
fn split_offset(text: &str) -> (&str, Option<&str>) {
    if let Some(clock) = text.strip_suffix('Z') {
        return (clock, Some("Z"));
    }
    let lead = text.bytes().take_while(|b| *b == b'-').count();
    match text[lead..].find(['+', '-']) {
        Some(i) => (&text[..lead + i], Some(&text[lead + i..])),
        None => (text, None),
    }
}

fn parse_offset(text: &str) -> Attempt<(UtcOffset, Style)> {
    if text == "Z" {
        return Attempt::Matched((UtcOffset::Utc, Style::Neutral));
    }
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let body = &text[1..];
    for (pattern, style) in [("hh:mm", Style::Extended), ("hhmm", Style::Basic), ("hh", Style::Neutral)] {
        let tokens = tokenize(pattern).unwrap_or_default();
        let Some(caps) = match_tokens(&tokens, body, 0) else {
            continue;
        };
        let hours = caps.hour.unwrap_or(0) as i32;
        let offset = match caps.minute {
            Some(minutes) if minutes > 59 => Err(CalendarError::OutOfRange {
                field: "offset minutes",
                value: minutes.into(),
            }),
            Some(minutes) => {
                if hours > 23 {
                    Err(CalendarError::OutOfRange {
                        field: "offset hours",
                        value: hours.into(),
                    })
                } else {
                    UtcOffset::from_minutes(sign * (hours * 60 + minutes as i32))
                }
            }
            None => UtcOffset::from_hours(sign * hours),
        };
        return match offset {
            Ok(offset) => Attempt::Matched((offset, style)),
            Err(e) => Attempt::Invalid(e.into()),
        };
    }
    Attempt::Mismatch
}

// ── Recurrences ─────────────────────────────────────────────────────────────

enum Bound {
    Point(TimePoint),
    Duration(Duration),
}

fn recurrence_attempt(text: &str, calendar: &Calendar, options: &ParseOptions) -> Attempt<TimeRecurrence> {
    let Some(rest) = text.strip_prefix('R') else {
        return Attempt::Mismatch;
    };
    match build_recurrence(rest, calendar, options) {
        Ok(r) => {
            tracing::debug!(recurrence = %r, "parsed recurrence");
            Attempt::Matched(r)
        }
        Err(e) => Attempt::Invalid(e),
    }
}

fn build_recurrence(rest: &str, calendar: &Calendar, options: &ParseOptions) -> Result<TimeRecurrence, ParseError> {
    let parts: Vec<&str> = rest.split('/').collect();
    let [count, first, second] = parts.as_slice() else {
        return Err(ParseError::Syntax(format!(
            "R{rest:?}: expected R[n]/<start or duration>/<end or duration>"
        )));
    };
    let repetitions = if count.is_empty() {
        None
    } else {
        Some(
            count
                .parse::<u64>()
                .map_err(|_| ParseError::Syntax(format!("bad repetition count {count:?}")))?,
        )
    };

    let bound = |text: &str| -> Result<Bound, ParseError> {
        if looks_like_duration(text) {
            return parse_duration(text).map(Bound::Duration);
        }
        match raw_point(text, calendar, options) {
            Attempt::Matched(p) => Ok(Bound::Point(p)),
            Attempt::Invalid(e) => Err(e),
            Attempt::Mismatch => Err(ParseError::Syntax(format!("{text:?} is not a time point or duration"))),
        }
    };

    match (bound(*first)?, bound(*second)?) {
        (Bound::Point(start), Bound::Point(end)) => {
            let start = apply_options(start, options)?;
            let end = if end.is_truncated() && !start.is_truncated() {
                end.resolve(&start).map_err(into_parse_error)?
            } else {
                apply_options(end, options)?
            };
            Ok(TimeRecurrence::from_start_end(start, end, repetitions)?)
        }
        (Bound::Point(start), Bound::Duration(duration)) => Ok(TimeRecurrence::from_start_duration(
            apply_options(start, options)?,
            duration,
            repetitions,
        )?),
        (Bound::Duration(duration), Bound::Point(end)) => Ok(TimeRecurrence::from_duration_end(
            duration,
            apply_options(end, options)?,
            repetitions,
        )?),
        (Bound::Duration(_), Bound::Duration(_)) => Err(ParseError::Syntax(
            "a recurrence needs at least one time point".to_string(),
        )),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarMode;

    fn point(s: &str) -> TimePoint {
        parse_time_point(s, &Calendar::standard(), &ParseOptions::default()).unwrap()
    }

    fn point_err(s: &str) -> ParseError {
        parse_time_point(s, &Calendar::standard(), &ParseOptions::default()).unwrap_err()
    }

    // ── dates ───────────────────────────────────────────────────────────

    #[test]
    fn test_calendar_dates() {
        assert_eq!(
            point("2020-02-29").date(),
            &DateRepr::Calendar {
                year: 2020,
                month: Some(2),
                day: Some(29)
            }
        );
        assert_eq!(point("20200229"), point("2020-02-29"));
        assert_eq!(
            point("2020-02").date(),
            &DateRepr::Calendar {
                year: 2020,
                month: Some(2),
                day: None
            }
        );
        assert_eq!(
            point("2020").date(),
            &DateRepr::Calendar {
                year: 2020,
                month: None,
                day: None
            }
        );
    }

    #[test]
    fn test_ordinal_and_week_dates() {
        assert_eq!(
            point("2020-060").date(),
            &DateRepr::Ordinal {
                year: 2020,
                day_of_year: 60
            }
        );
        assert_eq!(point("2020060"), point("2020-060"));
        assert_eq!(
            point("2020-W09-6").date(),
            &DateRepr::Week {
                year: 2020,
                week: 9,
                weekday: Some(6)
            }
        );
        assert_eq!(point("2020W096"), point("2020-W09-6"));
        assert_eq!(
            point("2020-W09").date(),
            &DateRepr::Week {
                year: 2020,
                week: 9,
                weekday: None
            }
        );
    }

    #[test]
    fn test_truncated_dates() {
        let t = |s: &str| match *point(s).date() {
            DateRepr::Truncated(t) => t,
            other => panic!("{s} parsed as {other:?}"),
        };
        assert_eq!(
            t("-20-02-15"),
            TruncatedDate::Century {
                year_of_century: 20,
                month: Some(2),
                day: Some(15)
            }
        );
        assert_eq!(t("--02-15"), TruncatedDate::MonthDay { month: 2, day: 15 });
        assert_eq!(t("--0215"), TruncatedDate::MonthDay { month: 2, day: 15 });
        assert_eq!(t("--02"), TruncatedDate::Day { day: 2 });
        assert_eq!(t("---15"), TruncatedDate::Day { day: 15 });
        assert_eq!(t("--15"), TruncatedDate::Day { day: 15 });
        assert_eq!(t("-060"), TruncatedDate::DayOfYear { day_of_year: 60 });
        assert_eq!(
            t("-20-060"),
            TruncatedDate::CenturyOrdinal {
                year_of_century: 20,
                day_of_year: 60
            }
        );
        assert_eq!(t("-W05-3"), TruncatedDate::WeekDay { week: 5, weekday: Some(3) });
        assert_eq!(t("-W-3"), TruncatedDate::Weekday { weekday: 3 });
        assert_eq!(
            t("-20W053"),
            TruncatedDate::CenturyWeek {
                year_of_century: 20,
                week: 5,
                weekday: Some(3)
            }
        );
    }

    #[test]
    fn test_expanded_years() {
        let p = point("+012020-06-01");
        assert_eq!(
            p.date(),
            &DateRepr::Calendar {
                year: 12020,
                month: Some(6),
                day: Some(1)
            }
        );
        assert_eq!(p.expanded_digits(), 2);
        assert_eq!(
            point("-000044-03-15").date(),
            &DateRepr::Calendar {
                year: -44,
                month: Some(3),
                day: Some(15)
            }
        );

        let opts = ParseOptions {
            expanded_year_digits: 5,
            ..ParseOptions::default()
        };
        let p = parse_time_point("+999999999-12-31", &Calendar::standard(), &opts).unwrap();
        assert_eq!(p.expanded_digits(), 5);
    }

    #[test]
    fn test_truncation_beats_expanded_year() {
        // six digits after a dash read as -YYMMDD, not as a negative year
        assert!(matches!(point("-200215").date(), DateRepr::Truncated(_)));
    }

    #[test]
    fn test_month_thirteen_is_range_error() {
        assert!(matches!(
            point_err("2020-13-01"),
            ParseError::Range(CalendarError::OutOfRange { field: "month", value: 13 })
        ));
    }

    #[test]
    fn test_calendar_specific_ranges() {
        let fixed = Calendar::new(CalendarMode::Fixed360);
        assert!(parse_time_point("2019-02-30", &fixed, &ParseOptions::default()).is_ok());
        assert!(matches!(point_err("2019-02-30"), ParseError::Range(_)));
        assert!(matches!(point_err("2019-02-29"), ParseError::Range(_)));
        assert!(matches!(point_err("2019-366"), ParseError::Range(_)));
        assert!(matches!(point_err("2019-W53-1"), ParseError::Range(_)));
        assert!(parse_time_point("2020-W53-1", &Calendar::standard(), &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_mixed_date_separators_are_ambiguous() {
        assert!(matches!(point_err("2020-0215"), ParseError::AmbiguousFormat(_)));
        assert!(matches!(point_err("2020-02-15T1230"), ParseError::AmbiguousFormat(_)));
        assert!(matches!(point_err("20200215T12:30"), ParseError::AmbiguousFormat(_)));
        assert!(matches!(point_err("T12:3000"), ParseError::AmbiguousFormat(_)));
        assert!(matches!(point_err("2020-02-15T12:30+0100"), ParseError::AmbiguousFormat(_)));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(point_err(""), ParseError::Syntax(_)));
        assert!(matches!(point_err("2020/02/15"), ParseError::Syntax(_)));
        assert!(matches!(point_err("202002"), ParseError::Syntax(_)));
        assert!(matches!(point_err("2020-02-15T"), ParseError::Syntax(_)));
        assert!(matches!(point_err("yesterday"), ParseError::Syntax(_)));
    }

    // ── times ───────────────────────────────────────────────────────────

    #[test]
    fn test_times_and_fractions() {
        let p = point("2020-02-15T12:30:15.250Z");
        let t = p.time().unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (Some(12), Some(30), Some(15)));
        assert_eq!(t.fraction().unwrap().to_string(), "250");
        assert_eq!(p.offset(), Some(UtcOffset::Utc));

        assert_eq!(point("20200215T123015,25Z"), point("2020-02-15T12:30:15.25Z"));
        let t = *point("T12,5").time().unwrap();
        assert_eq!((t.hour(), t.minute()), (Some(12), None));
        assert_eq!(t.fraction().unwrap().digits(), 1);
    }

    #[test]
    fn test_offsets() {
        assert_eq!(point("2020-01-01T00:00+05:30").offset(), Some(UtcOffset::HoursMinutes(330)));
        assert_eq!(point("20200101T0000-0130").offset(), Some(UtcOffset::HoursMinutes(-90)));
        assert_eq!(point("2020-01-01T00-05").offset(), Some(UtcOffset::Hours(-5)));
        assert!(matches!(point_err("2020-01-01T00:00+05:60"), ParseError::Range(_)));
        assert!(matches!(point_err("2020-01-01T00:00+24:00"), ParseError::Range(_)));
    }

    #[test]
    fn test_truncated_times() {
        let t = *point("T-30").time().unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (None, Some(30), None));
        let t = *point("T-30:15").time().unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (None, Some(30), Some(15)));
        let t = *point("T--15").time().unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (None, None, Some(15)));
        assert_eq!(point("T-30-05:00").offset(), Some(UtcOffset::HoursMinutes(-300)));
    }

    #[test]
    fn test_precision_mismatches() {
        assert!(matches!(point_err("2020-02T12:00"), ParseError::PrecisionMismatch(_)));
        assert!(matches!(point_err("2020-W05T12"), ParseError::PrecisionMismatch(_)));
        assert!(matches!(point_err("2020-02-15T-30"), ParseError::PrecisionMismatch(_)));
    }

    #[test]
    fn test_time_out_of_range() {
        assert!(matches!(point_err("2020-02-15T25:00"), ParseError::Range(_)));
        assert!(matches!(point_err("2020-02-15T23:60"), ParseError::Range(_)));
        assert!(matches!(point_err("2020-02-15T12:00:00.1234567891"), ParseError::Syntax(_)));
    }

    // ── options ─────────────────────────────────────────────────────────

    #[test]
    fn test_assumed_reference_resolves() {
        let opts = ParseOptions {
            assumed_reference: Some(point("2020-02-20")),
            ..ParseOptions::default()
        };
        let p = parse_time_point("--15", &Calendar::standard(), &opts).unwrap();
        assert_eq!(p, point("2020-03-15"));
    }

    #[test]
    fn test_assumed_year_fills() {
        let opts = ParseOptions {
            assumed_year: Some(2021),
            ..ParseOptions::default()
        };
        let p = parse_time_point("--02-15", &Calendar::standard(), &opts).unwrap();
        assert_eq!(p, point("2021-02-15"));
        // day-only truncation still needs a reference
        assert!(parse_time_point("---15", &Calendar::standard(), &opts).unwrap().is_truncated());
    }

    #[test]
    fn test_disallow_truncated() {
        let opts = ParseOptions {
            allow_truncated: false,
            ..ParseOptions::default()
        };
        let err = parse_time_point("--02-15", &Calendar::standard(), &opts).unwrap_err();
        assert!(matches!(err, ParseError::PrecisionMismatch(_)));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: ParseOptions = serde_json::from_str(r#"{"assumed_year": 1999}"#).unwrap();
        assert_eq!(opts.assumed_year, Some(1999));
        assert!(opts.allow_truncated);
        assert_eq!(opts.expanded_year_digits, DEFAULT_EXPANDED_DIGITS);
    }

    // ── durations ───────────────────────────────────────────────────────

    #[test]
    fn test_duration_components() {
        let d = parse_duration("P1Y2M3DT4H5M6S").unwrap();
        assert_eq!(
            (d.years(), d.months(), d.days(), d.hours(), d.minutes(), d.seconds()),
            (1, 2, 3, 4, 5, 6)
        );
        assert!(!d.is_negative());
        let d = parse_duration("PT36H").unwrap();
        assert_eq!(d.hours(), 36);
        assert!(parse_duration("-P1D").unwrap().is_negative());
        assert_eq!(parse_duration("P2W").unwrap().weeks(), 2);
    }

    #[test]
    fn test_duration_fractions() {
        let d = parse_duration("PT1.5S").unwrap();
        assert_eq!(d.fraction().map(|(u, f)| (u, f.to_string())), Some((FixedUnit::Seconds, "5".to_string())));
        let d = parse_duration("P1DT0,25H").unwrap();
        assert_eq!(d.fraction().map(|(u, _)| u), Some(FixedUnit::Hours));
        assert!(matches!(parse_duration("PT1.5H30M"), Err(ParseError::PrecisionMismatch(_))));
        assert!(matches!(parse_duration("P1.5Y"), Err(ParseError::PrecisionMismatch(_))));
    }

    #[test]
    fn test_duration_syntax_errors() {
        for bad in ["P", "PT", "1D", "P1DT", "PD", "P1H", "PT1D", "P1M1Y", "P1Y2W", "P1D1D", "P1.D"] {
            assert!(matches!(parse_duration(bad), Err(ParseError::Syntax(_))), "{bad}");
        }
    }

    #[test]
    fn test_duration_overflow_is_range() {
        assert!(matches!(
            parse_duration("P99999999999999999999D"),
            Err(ParseError::Range(_))
        ));
    }

    // ── values ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_dispatches_by_kind() {
        let cal = Calendar::standard();
        let opts = ParseOptions::default();
        assert!(matches!(parse("2020-02-15", &cal, &opts), Ok(Value::TimePoint(_))));
        assert!(matches!(parse("P1D", &cal, &opts), Ok(Value::Duration(_))));
        assert!(matches!(parse("R3/2020-01-01/P1D", &cal, &opts), Ok(Value::Recurrence(_))));
        assert!(matches!(parse("  2020-02-15 ", &cal, &opts), Ok(Value::TimePoint(_))));
    }

    #[test]
    fn test_recurrence_forms() {
        let cal = Calendar::standard();
        let opts = ParseOptions::default();
        let r = parse_recurrence("R3/2020-01-01/2020-01-04", &cal, &opts).unwrap();
        assert_eq!(r.duration(), &parse_duration("P1D").unwrap());
        let r = parse_recurrence("R2/P1D/2020-01-03", &cal, &opts).unwrap();
        assert_eq!(r.start(), &point("2020-01-01"));
        let r = parse_recurrence("R/2020-01-01T00Z/PT6H", &cal, &opts).unwrap();
        assert_eq!(r.repetitions(), None);
    }

    #[test]
    fn test_recurrence_truncated_end_resolves_against_start() {
        let cal = Calendar::standard();
        let r = parse_recurrence("R2/2020-01-30/--02-01", &cal, &ParseOptions::default()).unwrap();
        assert_eq!(r.end(), Some(&point("2020-02-01")));
    }

    #[test]
    fn test_recurrence_errors() {
        let cal = Calendar::standard();
        let opts = ParseOptions::default();
        assert!(matches!(
            parse_recurrence("R3/P1D/P2D", &cal, &opts),
            Err(ParseError::Syntax(_))
        ));
        assert!(matches!(
            parse_recurrence("R3/2020-01-01", &cal, &opts),
            Err(ParseError::Syntax(_))
        ));
        assert!(matches!(
            parse_recurrence("Rx/2020-01-01/P1D", &cal, &opts),
            Err(ParseError::Syntax(_))
        ));
        assert!(matches!(
            parse_recurrence("R/P1D/2020-01-10", &cal, &opts),
            Err(ParseError::Recurrence(_))
        ));
    }
}
