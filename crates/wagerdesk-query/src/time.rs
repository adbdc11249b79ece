//! Date and time-of-day inputs for the report date filter.
//!
//! Each end of a [`TimeRange`] is edited as a calendar date plus a free-text
//! time of day. The time text is normalized to `HH:MM:SS` while it is typed,
//! and an end whose text cannot be read yet is left open rather than
//! rejected, so the table keeps rendering mid-edit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::value::{Timestamp, Value};

const MAX_DIGITS: usize = 6;

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_SECOND: i64 = 1_000;

/// Normalizes raw time-of-day input to `HH`, `HH:MM` or `HH:MM:SS`.
///
/// Non-digit characters are dropped and at most six digits are kept. Digits
/// are grouped in complete pairs joined by `:`; a trailing unpaired digit is
/// held back until its pair is typed. A single digit on its own is returned
/// unchanged. Out-of-range components such as minute `99` pass through.
///
/// ```
/// use wagerdesk_query::normalize_time_fragment;
///
/// assert_eq!(normalize_time_fragment("235959"), "23:59:59");
/// assert_eq!(normalize_time_fragment("12"), "12");
/// assert_eq!(normalize_time_fragment("abc123"), "12");
/// ```
pub fn normalize_time_fragment(raw: &str) -> String {
    let digits: Vec<char> = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_DIGITS)
        .collect();

    if digits.len() < 2 {
        return digits.into_iter().collect();
    }

    digits
        .chunks_exact(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
}

/// Hour, minute and second read from time-of-day text.
///
/// Components are kept as typed; no range check is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeOfDay {
    /// Reads time-of-day text after normalizing it.
    ///
    /// Empty text is midnight and missing minute or second components
    /// default to `00`. Returns `None` while the hour is still incomplete
    /// (a single digit).
    pub fn parse(raw: &str) -> Option<TimeOfDay> {
        let normalized = normalize_time_fragment(raw);
        if normalized.is_empty() {
            return Some(TimeOfDay::default());
        }

        let mut parts = normalized.split(':');
        let mut next = || parts.next().map(|p| p.parse::<u32>());

        let hour = match next() {
            Some(Ok(h)) if normalized.len() >= 2 => h,
            _ => {
                trace!(raw, "time of day not readable yet");
                return None;
            }
        };
        let minute = next().and_then(Result::ok).unwrap_or(0);
        let second = next().and_then(Result::ok).unwrap_or(0);

        Some(TimeOfDay {
            hour,
            minute,
            second,
        })
    }

    /// Milliseconds past midnight, carrying out-of-range components.
    pub fn as_millis(self) -> i64 {
        self.hour as i64 * MILLIS_PER_HOUR
            + self.minute as i64 * MILLIS_PER_MINUTE
            + self.second as i64 * MILLIS_PER_SECOND
    }
}

/// Overlays a typed time of day onto a calendar date.
///
/// Returns `None` when there is no date, or when the time text is not
/// readable yet; callers treat `None` as an open end of the range.
///
/// ```
/// use chrono::NaiveDate;
/// use wagerdesk_query::{combine_date_and_time, Timestamp};
///
/// let day = NaiveDate::from_ymd_opt(2024, 5, 1);
/// let ts = combine_date_and_time(day, "1830").unwrap();
/// assert_eq!(ts, Timestamp::parse("2024-05-01 18:30:00").unwrap());
/// assert_eq!(combine_date_and_time(None, "1830"), None);
/// ```
pub fn combine_date_and_time(date: Option<NaiveDate>, time: &str) -> Option<Timestamp> {
    let date = date?;
    let time = TimeOfDay::parse(time)?;
    Some(Timestamp::from_millis(
        Timestamp::start_of(date).as_millis() + time.as_millis(),
    ))
}

/// Inclusive date filter. A missing end is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl TimeRange {
    /// A range with no bounds. Matches every row.
    pub fn unbounded() -> Self {
        TimeRange::default()
    }

    pub fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        TimeRange { from, to }
    }

    /// Builds a range from the four date-filter inputs.
    pub fn from_inputs(
        from_date: Option<NaiveDate>,
        from_time: &str,
        to_date: Option<NaiveDate>,
        to_time: &str,
    ) -> Self {
        TimeRange {
            from: combine_date_and_time(from_date, from_time),
            to: combine_date_and_time(to_date, to_time),
        }
    }

    /// Returns `true` if neither end is set.
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Tests a row's timestamp field against the range.
    ///
    /// With no bounds every value matches, including a missing one. With any
    /// bound set, the value must be a timestamp (or text that parses as one)
    /// inside `[from, to]`.
    pub fn contains(&self, value: &Value<'_>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let ts = match value {
            Value::Timestamp(ts) => *ts,
            Value::Text(s) => match Timestamp::parse(s) {
                Some(ts) => ts,
                None => return false,
            },
            _ => return false,
        };
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }
}
