//! Repeating time points (`R[n]/<start>/<end>`, `R[n]/<start>/<duration>`,
//! `R[n]/<duration>/<end>`).
//!
//! A recurrence is normalized on construction to a start point, a positive
//! step and optional bounds (a repetition count, an end point, or both).
//! Iteration starts at the start point and repeatedly adds the step to the
//! previous value, so `R3/...` yields four values: the start and three
//! repetitions.

use std::cmp::Ordering;

use serde::{Serialize, Serializer};

use crate::duration::Duration;
use crate::error::{Error, RecurrenceError};
use crate::point::TimePoint;

/// Upper bound on values visited when searching a recurrence with a
/// calendar-dependent step.
const MAX_SEARCH_STEPS: u64 = 1_000_000;

/// Which two of start, end and duration were given. Decides how the
/// recurrence is written back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecurrenceForm {
    StartEnd,
    StartDuration,
    DurationEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeRecurrence {
    start: TimePoint,
    duration: Duration,
    end: Option<TimePoint>,
    repetitions: Option<u64>,
    form: RecurrenceForm,
}

impl TimeRecurrence {
    /// Build a recurrence from any two (or three) of start, duration and end.
    ///
    /// With all three, stepping `repetitions` times from `start` must not
    /// pass `end`; the end then bounds iteration and the recurrence is
    /// written as `R[n]/<start>/<duration>`.
    ///
    /// # Errors
    ///
    /// - [`RecurrenceError::Underspecified`] when fewer than two are given,
    ///   a point is truncated, or a count is needed and missing
    /// - [`RecurrenceError::Inconsistent`] when the parts contradict each
    ///   other
    pub fn new(
        start: Option<TimePoint>,
        duration: Option<Duration>,
        end: Option<TimePoint>,
        repetitions: Option<u64>,
    ) -> Result<Self, RecurrenceError> {
        match (start, duration, end) {
            (Some(start), Some(duration), Some(end)) => {
                let mut r = TimeRecurrence::from_start_duration(start, duration, repetitions)?;
                check_complete(&end)?;
                check_order(&r.start, &end)?;
                if let Some(n) = repetitions {
                    let last = step_times(&r.start, &r.duration, n)?;
                    if last.compare(&end).map_err(inconsistent)? == Ordering::Greater {
                        return Err(RecurrenceError::Inconsistent(format!(
                            "stepping {n} times by {} from {} passes {end}",
                            r.duration, r.start
                        )));
                    }
                }
                r.end = Some(end);
                Ok(r)
            }
            (Some(start), Some(duration), None) => TimeRecurrence::from_start_duration(start, duration, repetitions),
            (Some(start), None, Some(end)) => TimeRecurrence::from_start_end(start, end, repetitions),
            (None, Some(duration), Some(end)) => TimeRecurrence::from_duration_end(duration, end, repetitions),
            _ => Err(RecurrenceError::Underspecified(
                "two of start, duration and end are needed".to_string(),
            )),
        }
    }

    /// `R[n]/<start>/<duration>`; unbounded without a count.
    pub fn from_start_duration(
        start: TimePoint,
        duration: Duration,
        repetitions: Option<u64>,
    ) -> Result<Self, RecurrenceError> {
        check_complete(&start)?;
        check_step(&duration)?;
        tracing::debug!(%start, %duration, ?repetitions, "recurrence from start and duration");
        Ok(TimeRecurrence {
            start,
            duration,
            end: None,
            repetitions,
            form: RecurrenceForm::StartDuration,
        })
    }

    /// `R<n>/<start>/<end>`: the step is `(end − start) / n`, which must come
    /// out to a whole number of nanoseconds.
    pub fn from_start_end(start: TimePoint, end: TimePoint, repetitions: Option<u64>) -> Result<Self, RecurrenceError> {
        check_complete(&start)?;
        check_complete(&end)?;
        check_order(&start, &end)?;
        let n = repetitions.filter(|n| *n >= 1).ok_or_else(|| {
            RecurrenceError::Underspecified(format!(
                "a repetition count of at least 1 is needed to step from {start} to {end}"
            ))
        })?;
        let span = end.difference(&start).map_err(inconsistent)?;
        let duration = span.divide_exact(n).ok_or_else(|| {
            RecurrenceError::Inconsistent(format!("{span} does not split into {n} equal steps"))
        })?;
        check_step(&duration)?;
        tracing::debug!(%start, %end, %duration, n, "recurrence from start and end");
        Ok(TimeRecurrence {
            start,
            duration,
            end: Some(end),
            repetitions: Some(n),
            form: RecurrenceForm::StartEnd,
        })
    }

    /// `R<n>/<duration>/<end>`: the start is `end − n × duration`.
    ///
    /// With year or month steps the month-end clamp can stop the walk from
    /// that start short of the end (`R2/P1M/2020-03-31` would run
    /// `2020-01-31`, `2020-02-29`, `2020-03-29`). The walk is replayed and
    /// such recurrences are rejected.
    ///
    /// # Errors
    ///
    /// - [`RecurrenceError::Underspecified`] without a count or with a
    ///   truncated end
    /// - [`RecurrenceError::Inconsistent`] when `n` steps from the start do
    ///   not land on the end
    pub fn from_duration_end(duration: Duration, end: TimePoint, repetitions: Option<u64>) -> Result<Self, RecurrenceError> {
        check_complete(&end)?;
        check_step(&duration)?;
        let n = repetitions.ok_or_else(|| {
            RecurrenceError::Underspecified(format!("a repetition count is needed to count back from {end}"))
        })?;
        let span = duration
            .checked_mul(n)
            .ok_or_else(|| RecurrenceError::Inconsistent(format!("{n} × {duration} overflows")))?;
        let start = end.subtract(&span).map_err(inconsistent)?;
        if duration.has_calendar_components() {
            check_walk(&start, &duration, n, &end)?;
        }
        tracing::debug!(%start, %end, %duration, n, "recurrence from duration and end");
        Ok(TimeRecurrence {
            start,
            duration,
            end: Some(end),
            repetitions: Some(n),
            form: RecurrenceForm::DurationEnd,
        })
    }

    pub fn start(&self) -> &TimePoint {
        &self.start
    }

    pub fn duration(&self) -> &Duration {
        &self.duration
    }

    pub fn end(&self) -> Option<&TimePoint> {
        self.end.as_ref()
    }

    /// Steps after the start, when bounded by a count.
    pub fn repetitions(&self) -> Option<u64> {
        self.repetitions
    }

    pub fn form(&self) -> RecurrenceForm {
        self.form
    }

    pub fn is_bounded(&self) -> bool {
        self.end.is_some() || self.repetitions.is_some()
    }

    /// Values in order, starting with the start point. Unbounded
    /// recurrences iterate forever.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            duration: &self.duration,
            end: self.end.as_ref(),
            next: Some(self.start),
            remaining: self.repetitions,
        }
    }

    /// The start point, which is always the first value.
    pub fn first(&self) -> &TimePoint {
        &self.start
    }

    /// The last value of a bounded recurrence.
    pub fn last(&self) -> Option<TimePoint> {
        if !self.is_bounded() {
            return None;
        }
        self.iter().last()
    }

    /// The value at `index`, counting the start as 0.
    pub fn get(&self, index: u64) -> Option<TimePoint> {
        self.iter().nth(usize::try_from(index).ok()?)
    }

    /// Whether `point` is one of the values of this recurrence.
    ///
    /// Fixed-length steps are checked arithmetically. Calendar steps are
    /// checked by walking forward from the start. Truncated points and
    /// points in another calendar are never contained.
    ///
    /// # Examples
    ///
    /// ```
    /// use isotempo::{parse_recurrence, parse_time_point, Calendar, ParseOptions};
    ///
    /// let cal = Calendar::standard();
    /// let opts = ParseOptions::default();
    /// let r = parse_recurrence("R/2020-01-31/P1M", &cal, &opts).unwrap();
    /// let point = |s| parse_time_point(s, &cal, &opts).unwrap();
    /// assert!(r.contains(&point("2020-02-29")));
    /// assert!(r.contains(&point("2020-03-29")));
    /// assert!(!r.contains(&point("2020-03-31")));
    /// ```
    pub fn contains(&self, point: &TimePoint) -> bool {
        if point.is_truncated() || point.calendar() != self.start.calendar() {
            return false;
        }
        let (Ok(target), Ok(start)) = (point.utc_nanos(), self.start.utc_nanos()) else {
            return false;
        };
        if target < start {
            return false;
        }
        if let Some(end) = &self.end {
            match end.utc_nanos() {
                Ok(end) if target <= end => {}
                _ => return false,
            }
        }

        if !self.duration.has_calendar_components() {
            let step = self.duration.clock_nanos();
            let elapsed = target - start;
            return elapsed % step == 0 && self.repetitions.map_or(true, |n| elapsed / step <= i128::from(n));
        }

        if !self.is_bounded() {
            let horizon = self
                .duration
                .checked_mul(MAX_SEARCH_STEPS)
                .and_then(|span| self.start.add(&span).ok())
                .and_then(|p| p.utc_nanos().ok());
            if horizon.is_some_and(|h| target > h) {
                tracing::trace!(%point, steps = MAX_SEARCH_STEPS, "point beyond search horizon");
                return false;
            }
        }
        self.search(|n| n >= target).is_some_and(|(_, n)| n == target)
    }

    /// The first value strictly after `point`.
    pub fn next_after(&self, point: &TimePoint) -> Option<TimePoint> {
        let target = point.utc_nanos().ok()?;
        self.search(|n| n > target).map(|(p, _)| p)
    }

    /// The last value strictly before `point`.
    pub fn prev_before(&self, point: &TimePoint) -> Option<TimePoint> {
        let target = point.utc_nanos().ok()?;
        let mut previous = None;
        for value in self.iter().take(MAX_SEARCH_STEPS as usize) {
            if value.utc_nanos().ok()? >= target {
                break;
            }
            previous = Some(value);
        }
        previous
    }

    /// The first value whose UTC instant satisfies `stop`.
    fn search(&self, stop: impl Fn(i128) -> bool) -> Option<(TimePoint, i128)> {
        self.iter()
            .take(MAX_SEARCH_STEPS as usize)
            .filter_map(|p| p.utc_nanos().ok().map(|n| (p, n)))
            .find(|(_, n)| stop(*n))
    }
}

fn check_complete(point: &TimePoint) -> Result<(), RecurrenceError> {
    if point.is_truncated() {
        return Err(RecurrenceError::Underspecified(format!(
            "{point} is truncated; resolve it before building a recurrence"
        )));
    }
    Ok(())
}

fn check_step(duration: &Duration) -> Result<(), RecurrenceError> {
    if duration.is_zero() || duration.is_negative() {
        return Err(RecurrenceError::Inconsistent(format!(
            "step {duration} must be positive"
        )));
    }
    Ok(())
}

fn check_order(start: &TimePoint, end: &TimePoint) -> Result<(), RecurrenceError> {
    if start.compare(end).map_err(inconsistent)? == Ordering::Greater {
        return Err(RecurrenceError::Inconsistent(format!("{start} is after {end}")));
    }
    Ok(())
}

fn step_times(start: &TimePoint, duration: &Duration, n: u64) -> Result<TimePoint, RecurrenceError> {
    let span = duration
        .checked_mul(n)
        .ok_or_else(|| RecurrenceError::Inconsistent(format!("{n} × {duration} overflows")))?;
    start.add(&span).map_err(inconsistent)
}

/// Replays `n` steps from `start` and requires them to land on `end`.
fn check_walk(start: &TimePoint, duration: &Duration, n: u64, end: &TimePoint) -> Result<(), RecurrenceError> {
    if n > MAX_SEARCH_STEPS {
        return Err(RecurrenceError::Inconsistent(format!(
            "{n} steps of {duration} back from {end} are too many to check"
        )));
    }
    let mut current = *start;
    for _ in 0..n {
        current = current.add(duration).map_err(inconsistent)?;
    }
    if current != *end {
        tracing::debug!(%start, %duration, n, %end, landed = %current, "calendar walk misses the end");
        return Err(RecurrenceError::Inconsistent(format!(
            "{n} steps of {duration} from {start} reach {current}, not {end}"
        )));
    }
    Ok(())
}

fn inconsistent(err: Error) -> RecurrenceError {
    RecurrenceError::Inconsistent(err.to_string())
}

/// Values of a [`TimeRecurrence`] in order.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    duration: &'a Duration,
    end: Option<&'a TimePoint>,
    next: Option<TimePoint>,
    remaining: Option<u64>,
}

impl Iterator for Iter<'_> {
    type Item = TimePoint;

    fn next(&mut self) -> Option<TimePoint> {
        let current = self.next.take()?;
        let more = match self.remaining {
            Some(0) => false,
            Some(n) => {
                self.remaining = Some(n - 1);
                true
            }
            None => true,
        };
        if more {
            self.next = match current.add(self.duration) {
                Ok(p) => {
                    let within = self
                        .end
                        .map_or(true, |end| matches!(p.compare(end), Ok(Ordering::Less | Ordering::Equal)));
                    within.then_some(p)
                }
                Err(err) => {
                    tracing::warn!(error = %err, last = %current, "recurrence stopped early");
                    None
                }
            };
        }
        Some(current)
    }
}

impl<'a> IntoIterator for &'a TimeRecurrence {
    type Item = TimePoint;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl Serialize for TimeRecurrence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
