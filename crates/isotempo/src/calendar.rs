//! Calendar rules: leap years, month lengths, ordinal and ISO week numbering.
//!
//! A [`Calendar`] is a small `Copy` value selecting one of the supported
//! calendar modes. Every operation that needs calendar knowledge takes one
//! explicitly; there is no process-wide default.
//!
//! # Modes
//!
//! - [`CalendarMode::Standard`]: proleptic Gregorian calendar
//! - [`CalendarMode::Fixed360`]: twelve 30-day months, 360-day years
//! - [`CalendarMode::NoLeap365`]: Gregorian month lengths, February always 28 days
//! - [`CalendarMode::AllLeap366`]: Gregorian month lengths, February always 29 days
//!
//! Week numbering follows ISO 8601 in every mode: weeks run Monday (1) to
//! Sunday (7) and week 1 is the week holding the first Thursday of the year.
//! For the fixed-length modes weekdays are taken from a continuous day count
//! within that calendar, so the same rule applies unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Largest absolute year any calendar accepts.
pub const MAX_YEAR: i64 = 999_999_999;

const GREGORIAN_MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Days in 400 Gregorian years.
const DAYS_PER_400_YEARS: i64 = 146_097;

/// Which calendar convention to count days with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CalendarMode {
    #[default]
    #[serde(rename = "standard", alias = "gregorian")]
    Standard,
    #[serde(rename = "360day", alias = "360_day", alias = "fixed360")]
    Fixed360,
    #[serde(rename = "365day", alias = "365_day", alias = "noleap")]
    NoLeap365,
    #[serde(rename = "366day", alias = "366_day", alias = "all_leap")]
    AllLeap366,
}

impl CalendarMode {
    pub fn name(self) -> &'static str {
        match self {
            CalendarMode::Standard => "standard",
            CalendarMode::Fixed360 => "360day",
            CalendarMode::NoLeap365 => "365day",
            CalendarMode::AllLeap366 => "366day",
        }
    }
}

impl fmt::Display for CalendarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CalendarMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" => Ok(CalendarMode::Standard),
            "360day" | "360_day" | "fixed360" => Ok(CalendarMode::Fixed360),
            "365day" | "365_day" | "noleap" => Ok(CalendarMode::NoLeap365),
            "366day" | "366_day" | "all_leap" => Ok(CalendarMode::AllLeap366),
            other => Err(format!("unknown calendar mode: '{other}'")),
        }
    }
}

/// An immutable calendar context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Calendar {
    mode: CalendarMode,
}

impl FromStr for Calendar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Calendar::new)
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.mode.fmt(f)
    }
}

impl Calendar {
    pub const fn new(mode: CalendarMode) -> Self {
        Calendar { mode }
    }

    pub const fn standard() -> Self {
        Calendar::new(CalendarMode::Standard)
    }

    pub const fn fixed360() -> Self {
        Calendar::new(CalendarMode::Fixed360)
    }

    pub const fn mode(&self) -> CalendarMode {
        self.mode
    }

    /// Whether `year` has a leap day. Always `false` for 360- and 365-day
    /// calendars and always `true` for the 366-day calendar.
    pub fn is_leap_year(&self, year: i64) -> bool {
        match self.mode {
            CalendarMode::Standard => {
                year.rem_euclid(4) == 0 && (year.rem_euclid(100) != 0 || year.rem_euclid(400) == 0)
            }
            CalendarMode::Fixed360 | CalendarMode::NoLeap365 => false,
            CalendarMode::AllLeap366 => true,
        }
    }

    pub fn days_in_year(&self, year: i64) -> u32 {
        match self.mode {
            CalendarMode::Fixed360 => 360,
            CalendarMode::NoLeap365 => 365,
            CalendarMode::AllLeap366 => 366,
            CalendarMode::Standard => {
                if self.is_leap_year(year) {
                    366
                } else {
                    365
                }
            }
        }
    }

    /// Number of days in `month` (1–12) of `year`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::OutOfRange`] for a month outside 1–12 or a
    /// year beyond [`MAX_YEAR`].
    pub fn days_in_month(&self, year: i64, month: u32) -> Result<u32, CalendarError> {
        check_year(year)?;
        check_month(month)?;
        if self.mode == CalendarMode::Fixed360 {
            return Ok(30);
        }
        let days = GREGORIAN_MONTH_DAYS[(month - 1) as usize];
        if month == 2 && self.is_leap_year(year) {
            Ok(days + 1)
        } else {
            Ok(days)
        }
    }

    /// Convert a day-of-year into `(month, day)`.
    pub fn ordinal_to_month_day(&self, year: i64, ordinal: u32) -> Result<(u32, u32), CalendarError> {
        check_year(year)?;
        if ordinal < 1 || ordinal > self.days_in_year(year) {
            return Err(CalendarError::OutOfRange {
                field: "day of year",
                value: ordinal.into(),
            });
        }
        let mut remaining = ordinal;
        for month in 1..=12 {
            let len = self.days_in_month(year, month)?;
            if remaining <= len {
                return Ok((month, remaining));
            }
            remaining -= len;
        }
        // days_in_year is the sum of the month lengths
        Err(CalendarError::OutOfRange {
            field: "day of year",
            value: ordinal.into(),
        })
    }

    /// Convert `(month, day)` into a day-of-year.
    pub fn month_day_to_ordinal(&self, year: i64, month: u32, day: u32) -> Result<u32, CalendarError> {
        self.validate_date(year, month, day)?;
        let mut ordinal = day;
        for m in 1..month {
            ordinal += self.days_in_month(year, m)?;
        }
        Ok(ordinal)
    }

    /// Check that `(year, month, day)` names a real day in this calendar.
    pub fn validate_date(&self, year: i64, month: u32, day: u32) -> Result<(), CalendarError> {
        let len = self.days_in_month(year, month)?;
        if day < 1 || day > len {
            return Err(CalendarError::OutOfRange {
                field: "day of month",
                value: day.into(),
            });
        }
        Ok(())
    }

    /// ISO weekday (Monday = 1 … Sunday = 7) of a calendar date.
    pub fn weekday(&self, year: i64, month: u32, day: u32) -> Result<u32, CalendarError> {
        let ordinal = self.month_day_to_ordinal(year, month, day)?;
        Ok(weekday_of_day_number(self.day_number(year, ordinal)))
    }

    /// Number of ISO weeks (52 or 53 for Gregorian) in a week-numbering year.
    pub fn weeks_in_iso_year(&self, iso_year: i64) -> u32 {
        let first_thursday = self.first_thursday(iso_year);
        (self.days_in_year(iso_year) - first_thursday) / 7 + 1
    }

    /// Convert a calendar date to `(iso_year, week, weekday)`.
    pub fn iso_week_date(&self, year: i64, month: u32, day: u32) -> Result<(i64, u32, u32), CalendarError> {
        let ordinal = i64::from(self.month_day_to_ordinal(year, month, day)?);
        let weekday = weekday_of_day_number(self.day_number(year, ordinal as u32));
        let week_one_monday = i64::from(self.first_thursday(year)) - 3;
        let week = (ordinal - week_one_monday).div_euclid(7) + 1;

        if week < 1 {
            check_year(year - 1)?;
            return Ok((year - 1, self.weeks_in_iso_year(year - 1), weekday));
        }
        let week = week as u32;
        if week > self.weeks_in_iso_year(year) {
            check_year(year + 1)?;
            return Ok((year + 1, 1, weekday));
        }
        Ok((year, week, weekday))
    }

    /// Convert an ISO week date back to `(year, month, day)`.
    pub fn from_iso_week_date(&self, iso_year: i64, week: u32, weekday: u32) -> Result<(i64, u32, u32), CalendarError> {
        check_year(iso_year)?;
        if week < 1 || week > self.weeks_in_iso_year(iso_year) {
            return Err(CalendarError::OutOfRange {
                field: "week",
                value: week.into(),
            });
        }
        check_weekday(weekday)?;
        let week_one_monday = i64::from(self.first_thursday(iso_year)) - 3;
        let offset = week_one_monday - 1 + i64::from((week - 1) * 7 + weekday - 1);
        let (year, ordinal) = self.from_day_number(self.day_number(iso_year, 1) + offset);
        check_year(year)?;
        let (month, day) = self.ordinal_to_month_day(year, ordinal)?;
        Ok((year, month, day))
    }

    /// Continuous day count for `(year, ordinal)`; day 0 is the first day of year 0.
    pub(crate) fn day_number(&self, year: i64, ordinal: u32) -> i64 {
        let before = match self.mode {
            CalendarMode::Standard => {
                365 * year + (year + 3).div_euclid(4) - (year + 99).div_euclid(100)
                    + (year + 399).div_euclid(400)
            }
            _ => year * i64::from(self.days_in_year(year)),
        };
        before + i64::from(ordinal) - 1
    }

    /// Inverse of [`Calendar::day_number`]: `(year, ordinal)`.
    pub(crate) fn from_day_number(&self, day_number: i64) -> (i64, u32) {
        match self.mode {
            CalendarMode::Standard => {
                let mut year = (day_number * 400).div_euclid(DAYS_PER_400_YEARS);
                while self.day_number(year + 1, 1) <= day_number {
                    year += 1;
                }
                while self.day_number(year, 1) > day_number {
                    year -= 1;
                }
                (year, (day_number - self.day_number(year, 1) + 1) as u32)
            }
            _ => {
                let len = i64::from(self.days_in_year(0));
                (day_number.div_euclid(len), (day_number.rem_euclid(len) + 1) as u32)
            }
        }
    }

    /// Day-of-year of the first Thursday in `year`.
    fn first_thursday(&self, year: i64) -> u32 {
        let jan1 = weekday_of_day_number(self.day_number(year, 1)) as i64;
        ((4 - jan1).rem_euclid(7) + 1) as u32
    }
}

/// Day 0 (first day of year 0) is a Saturday in the proleptic Gregorian calendar.
fn weekday_of_day_number(day_number: i64) -> u32 {
    ((day_number + 5).rem_euclid(7) + 1) as u32
}

pub(crate) fn check_year(year: i64) -> Result<(), CalendarError> {
    if year.abs() > MAX_YEAR {
        return Err(CalendarError::OutOfRange { field: "year", value: year });
    }
    Ok(())
}

pub(crate) fn check_month(month: u32) -> Result<(), CalendarError> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::OutOfRange {
            field: "month",
            value: month.into(),
        });
    }
    Ok(())
}

pub(crate) fn check_weekday(weekday: u32) -> Result<(), CalendarError> {
    if !(1..=7).contains(&weekday) {
        return Err(CalendarError::OutOfRange {
            field: "weekday",
            value: weekday.into(),
        });
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn std_cal() -> Calendar {
        Calendar::standard()
    }

    // ── leap years and month lengths ────────────────────────────────────

    #[test]
    fn test_gregorian_leap_years() {
        let cal = std_cal();
        assert!(cal.is_leap_year(2000));
        assert!(!cal.is_leap_year(1900));
        assert!(cal.is_leap_year(2016));
        assert!(!cal.is_leap_year(2019));
        assert!(cal.is_leap_year(0));
        assert!(cal.is_leap_year(-4));
        assert!(!cal.is_leap_year(-100));
    }

    #[test]
    fn test_fixed360_months_are_thirty_days() {
        let cal = Calendar::fixed360();
        for year in [-400, 0, 1900, 2000, 2019, 2020] {
            for month in 1..=12 {
                assert_eq!(cal.days_in_month(year, month).unwrap(), 30);
            }
            assert_eq!(cal.days_in_year(year), 360);
            assert!(!cal.is_leap_year(year));
        }
    }

    #[test]
    fn test_noleap_and_all_leap_february() {
        let noleap = Calendar::new(CalendarMode::NoLeap365);
        let all_leap = Calendar::new(CalendarMode::AllLeap366);
        assert_eq!(noleap.days_in_month(2000, 2).unwrap(), 28);
        assert_eq!(all_leap.days_in_month(2001, 2).unwrap(), 29);
        assert_eq!(noleap.days_in_year(2000), 365);
        assert_eq!(all_leap.days_in_year(2001), 366);
    }

    #[test]
    fn test_days_in_month_rejects_month_13() {
        let err = std_cal().days_in_month(2020, 13).unwrap_err();
        assert_eq!(err, CalendarError::OutOfRange { field: "month", value: 13 });
    }

    #[test]
    fn test_validate_date_february_29() {
        assert!(std_cal().validate_date(2020, 2, 29).is_ok());
        assert!(std_cal().validate_date(2019, 2, 29).is_err());
        assert!(Calendar::fixed360().validate_date(2019, 2, 30).is_ok());
    }

    // ── ordinal dates ───────────────────────────────────────────────────

    #[test]
    fn test_ordinal_round_trip_leap_year() {
        let cal = std_cal();
        assert_eq!(cal.ordinal_to_month_day(2020, 60).unwrap(), (2, 29));
        assert_eq!(cal.month_day_to_ordinal(2020, 2, 29).unwrap(), 60);
        assert_eq!(cal.ordinal_to_month_day(2020, 366).unwrap(), (12, 31));
        assert!(cal.ordinal_to_month_day(2019, 366).is_err());
    }

    #[test]
    fn test_ordinal_fixed360() {
        let cal = Calendar::fixed360();
        assert_eq!(cal.ordinal_to_month_day(2020, 360).unwrap(), (12, 30));
        assert_eq!(cal.ordinal_to_month_day(2020, 31).unwrap(), (2, 1));
        assert!(cal.ordinal_to_month_day(2020, 361).is_err());
    }

    // ── day numbers and weekdays ────────────────────────────────────────

    #[test]
    fn test_known_weekdays() {
        let cal = std_cal();
        // 1970-01-01 was a Thursday, 2000-01-01 a Saturday
        assert_eq!(cal.weekday(1970, 1, 1).unwrap(), 4);
        assert_eq!(cal.weekday(2000, 1, 1).unwrap(), 6);
        assert_eq!(cal.weekday(2026, 2, 18).unwrap(), 3);
    }

    #[test]
    fn test_day_number_round_trip_negative_years() {
        for cal in [std_cal(), Calendar::fixed360()] {
            for n in [-1_000_000, -366, -1, 0, 1, 59, 60, 730_485, 5_000_000] {
                let (year, ordinal) = cal.from_day_number(n);
                assert_eq!(cal.day_number(year, ordinal), n, "{cal} day {n}");
            }
        }
    }

    // ── ISO week dates ──────────────────────────────────────────────────

    #[test]
    fn test_iso_week_year_boundaries() {
        let cal = std_cal();
        assert_eq!(cal.iso_week_date(2021, 1, 3).unwrap(), (2020, 53, 7));
        assert_eq!(cal.iso_week_date(2008, 12, 29).unwrap(), (2009, 1, 1));
        assert_eq!(cal.iso_week_date(2020, 1, 1).unwrap(), (2020, 1, 3));
        assert_eq!(cal.weeks_in_iso_year(2020), 53);
        assert_eq!(cal.weeks_in_iso_year(2021), 52);
    }

    #[test]
    fn test_from_iso_week_date() {
        let cal = std_cal();
        assert_eq!(cal.from_iso_week_date(2020, 53, 7).unwrap(), (2021, 1, 3));
        assert_eq!(cal.from_iso_week_date(2009, 1, 1).unwrap(), (2008, 12, 29));
        assert!(cal.from_iso_week_date(2021, 53, 1).is_err());
        assert!(cal.from_iso_week_date(2021, 10, 8).is_err());
    }

    #[test]
    fn test_fixed360_week_round_trip() {
        let cal = Calendar::fixed360();
        for year in [1999, 2000, 2001] {
            for ordinal in [1, 2, 3, 4, 100, 357, 358, 359, 360] {
                let (month, day) = cal.ordinal_to_month_day(year, ordinal).unwrap();
                let (iy, week, wd) = cal.iso_week_date(year, month, day).unwrap();
                assert!(week >= 1 && week <= cal.weeks_in_iso_year(iy));
                assert_eq!(cal.from_iso_week_date(iy, week, wd).unwrap(), (year, month, day));
            }
        }
    }

    // ── mode names ──────────────────────────────────────────────────────

    #[test]
    fn test_mode_from_str_aliases() {
        assert_eq!("gregorian".parse::<CalendarMode>().unwrap(), CalendarMode::Standard);
        assert_eq!("360_day".parse::<CalendarMode>().unwrap(), CalendarMode::Fixed360);
        assert_eq!("Fixed360".parse::<Calendar>().unwrap(), Calendar::fixed360());
        assert!("lunar".parse::<CalendarMode>().is_err());
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&Calendar::fixed360()).unwrap();
        assert_eq!(json, "\"360day\"");
        let cal: Calendar = serde_json::from_str("\"gregorian\"").unwrap();
        assert_eq!(cal, std_cal());
    }
}
