//! Field values as the query engine sees them.
//!
//! Rows hand out a borrowed [`Value`] per field. Report data only carries
//! text, numbers, date-times and flags; anything else reads as
//! [`Value::None`] and never matches a condition.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One field of one row, borrowed from the row.
///
/// ```
/// use wagerdesk_query::{Value, Number};
///
/// struct Player {
///     login: String,
///     deposit: i64,
/// }
///
/// fn accessor<'a>(player: &'a Player, field: &str) -> Value<'a> {
///     match field {
///         "login" => Value::Text(&player.login),
///         "deposit" => Value::Number(Number::I64(player.deposit)),
///         _ => Value::None,
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Text(&'a str),
    Number(Number),
    /// Wall-clock milliseconds; see [`Timestamp`].
    Timestamp(Timestamp),
    Bool(bool),
    /// Missing, null, or a shape the engine does not read.
    None,
}

impl<'a> Value<'a> {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, Value::Timestamp(_))
    }

    /// The text, for text values only.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Reads this value as a number.
    ///
    /// Numbers pass through and text is parsed, so `"60"` and `60` compare
    /// the same way. Timestamps, flags and missing values are not numeric.
    pub fn numeric(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => Number::parse(s),
            _ => None,
        }
    }

    /// Renders the value as text for lexicographic comparison and search.
    pub fn to_text(&self) -> Cow<'a, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(s),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Timestamp(t) => Cow::Owned(t.to_string()),
            Value::Bool(b) => Cow::Owned(b.to_string()),
            Value::None => Cow::Borrowed(""),
        }
    }
}

/// A report number: ids and counts stay integral, money is `F64`.
///
/// Integers compare exactly across `I64` and `U64`; only a float on either
/// side sends the comparison through `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// `None` only when a NaN is involved.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::I64(a), Number::U64(b)) => Some(cmp_signed(a, b)),
            (Number::U64(a), Number::I64(b)) => Some(cmp_signed(b, a).reverse()),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }

    /// Parses user-entered text as a number.
    ///
    /// Integers keep integer precision; anything else with a finite decimal
    /// reading becomes `F64`. Empty and non-numeric text yields `None`.
    pub fn parse(text: &str) -> Option<Number> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(n) = text.parse::<i64>() {
            return Some(Number::I64(n));
        }
        if let Ok(n) = text.parse::<u64>() {
            return Some(Number::U64(n));
        }
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(Number::F64(n)),
            _ => None,
        }
    }
}

fn cmp_signed(a: i64, b: u64) -> Ordering {
    match u64::try_from(a) {
        Ok(a) => a.cmp(&b),
        Err(_) => Ordering::Less,
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
        }
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::I64(n)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::U64(n)
    }
}

impl From<usize> for Number {
    fn from(n: usize) -> Self {
        Number::U64(n as u64)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::F64(n)
    }
}

/// Wall-clock point in time, in milliseconds since 1970-01-01 00:00:00.
///
/// Report timestamps are local times without an offset, so this is a plain
/// count over the naive calendar rather than a UTC instant. Arithmetic on
/// out-of-range time components (minute `99`) carries into the next unit
/// instead of being rejected.
///
/// ```
/// use wagerdesk_query::Timestamp;
///
/// let ts = Timestamp::parse("2024-03-01 12:30:00").unwrap();
/// assert_eq!(ts.to_string(), "2024-03-01 12:30:00");
/// assert!(Timestamp::parse("2024-03-01").unwrap() < ts);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Timestamp for the start (00:00:00) of a calendar day.
    pub fn start_of(date: NaiveDate) -> Self {
        Timestamp::from(date.and_time(chrono::NaiveTime::MIN))
    }

    /// Parses the date-time spellings found in report data.
    ///
    /// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, RFC 3339 (the
    /// offset is dropped and the wall-clock reading kept) and a bare
    /// `YYYY-MM-DD`, which maps to the start of that day.
    pub fn parse(text: &str) -> Option<Timestamp> {
        let text = text.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT) {
            return Some(dt.into());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
            return Some(dt.into());
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.naive_local().into());
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .map(Timestamp::start_of)
    }

    /// Converts back to a calendar date-time, if representable.
    pub fn to_naive(self) -> Option<NaiveDateTime> {
        DateTime::<Utc>::from_timestamp_millis(self.0).map(|dt| dt.naive_utc())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Timestamp(dt.and_utc().timestamp_millis())
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive() {
            Some(dt) => write!(f, "{}", dt.format(DATE_TIME_FORMAT)),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_accessor() {
        assert_eq!(Value::Text("vip_chen").as_str(), Some("vip_chen"));
        assert_eq!(Value::Number(Number::I64(1)).as_str(), None);
        assert!(Value::Timestamp(Timestamp(0)).is_timestamp());
    }

    #[test]
    fn numeric_reads_text() {
        assert_eq!(Value::Text("60").numeric(), Some(Number::I64(60)));
        assert_eq!(Value::Text(" 2.5 ").numeric(), Some(Number::F64(2.5)));
        assert_eq!(Value::Text("bob").numeric(), None);
        assert_eq!(Value::Bool(true).numeric(), None);
        assert_eq!(Value::None.numeric(), None);
    }

    #[test]
    fn to_text_renders_each_kind() {
        assert_eq!(Value::Text("x").to_text(), "x");
        assert_eq!(Value::Number(Number::F64(100.0)).to_text(), "100");
        assert_eq!(Value::Bool(false).to_text(), "false");
        assert_eq!(Value::None.to_text(), "");
    }

    #[test]
    fn mixed_numbers_compare_by_value() {
        assert_eq!(Number::I64(60).compare(Number::U64(100)), Some(Ordering::Less));
        assert_eq!(Number::U64(60).compare(Number::F64(60.0)), Some(Ordering::Equal));
        assert_eq!(Number::F64(60.5).compare(Number::I64(-1)), Some(Ordering::Greater));
        assert_eq!(Number::F64(f64::NAN).compare(Number::I64(1)), None);
    }

    #[test]
    fn large_integers_compare_exactly() {
        // both read as 2^63 through f64
        let big = Number::U64(1 << 63);
        assert_eq!(Number::I64(i64::MAX).compare(big), Some(Ordering::Less));
        assert_eq!(big.compare(Number::I64(i64::MAX)), Some(Ordering::Greater));
        assert_eq!(
            Number::I64((1 << 53) + 1).compare(Number::U64(1 << 53)),
            Some(Ordering::Greater)
        );
        assert_eq!(Number::I64(-1).compare(Number::U64(0)), Some(Ordering::Less));
        assert_eq!(Number::U64(7).compare(Number::I64(7)), Some(Ordering::Equal));
    }

    #[test]
    fn number_parse() {
        assert_eq!(Number::parse("42"), Some(Number::I64(42)));
        assert_eq!(Number::parse("-7"), Some(Number::I64(-7)));
        assert_eq!(
            Number::parse("18446744073709551615"),
            Some(Number::U64(u64::MAX))
        );
        assert_eq!(Number::parse("0.5"), Some(Number::F64(0.5)));
        assert_eq!(Number::parse(""), None);
        assert_eq!(Number::parse("NaN"), None);
        assert_eq!(Number::parse("12abc"), None);
    }

    #[test]
    fn timestamp_parse_formats() {
        let spaced = Timestamp::parse("2024-01-15 08:30:00").unwrap();
        let t_sep = Timestamp::parse("2024-01-15T08:30:00").unwrap();
        let rfc = Timestamp::parse("2024-01-15T08:30:00+03:00").unwrap();
        assert_eq!(spaced, t_sep);
        assert_eq!(spaced, rfc);

        let day = Timestamp::parse("2024-01-15").unwrap();
        assert!(day < spaced);
        assert_eq!(spaced.as_millis() - day.as_millis(), 8 * 3_600_000 + 30 * 60_000);

        assert_eq!(Timestamp::parse("15/01/2024"), None);
    }

    #[test]
    fn timestamp_display_round_trips() {
        let ts = Timestamp::parse("2023-12-31 23:59:59").unwrap();
        assert_eq!(ts.to_string(), "2023-12-31 23:59:59");
    }
}
