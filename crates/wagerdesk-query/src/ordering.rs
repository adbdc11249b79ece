//! Sorting of filtered rows.
//!
//! Provides [`Dir`] for sort direction, [`SortSpec`] for the active sort key
//! and the [`sort`] / [`sort_by_all`] functions the pipeline uses.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::row::Row;
use crate::value::{Number, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    ///
    /// For `Desc` the comparison result is reversed, so equal keys stay
    /// equal and a stable sort keeps their original order.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// The other direction.
    pub fn flipped(self) -> Dir {
        match self {
            Dir::Asc => Dir::Desc,
            Dir::Desc => Dir::Asc,
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dir {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Dir::Asc),
            "desc" | "descending" => Ok(Dir::Desc),
            _ => Err(QueryError::UnknownDirection(s.to_string())),
        }
    }
}

/// The active sort key and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// The field to sort by.
    pub key: String,
    /// The sort direction.
    #[serde(rename = "direction")]
    pub dir: Dir,
}

impl SortSpec {
    /// Creates a new ascending sort for the given field.
    pub fn asc(key: impl Into<String>) -> Self {
        SortSpec {
            key: key.into(),
            dir: Dir::Asc,
        }
    }

    /// Creates a new descending sort for the given field.
    pub fn desc(key: impl Into<String>) -> Self {
        SortSpec {
            key: key.into(),
            dir: Dir::Desc,
        }
    }

    /// Creates a new sort with the given direction.
    pub fn new(key: impl Into<String>, dir: Dir) -> Self {
        SortSpec {
            key: key.into(),
            dir,
        }
    }

    /// Next sort state after the user clicks the header for `key`.
    ///
    /// Clicking the active key flips its direction; clicking any other key
    /// starts ascending on that key.
    pub fn toggle(current: Option<&SortSpec>, key: &str) -> SortSpec {
        match current {
            Some(spec) if spec.key == key => SortSpec::new(key, spec.dir.flipped()),
            _ => SortSpec::asc(key),
        }
    }

    /// Compares two values according to this sort.
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        self.dir.apply(compare_values(a, b))
    }
}

/// Natural ordering of two field values.
///
/// Values of the same kind compare naturally: numbers numerically, text
/// lexicographically, timestamps and flags by value. Missing values sort
/// after everything else. Values of different kinds order by kind (numbers,
/// timestamps, flags, text) so a mixed column still sorts consistently.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(*a, *b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    a.compare(b)
        .unwrap_or_else(|| a.to_f64().total_cmp(&b.to_f64()))
}

fn kind_rank(value: &Value<'_>) -> u8 {
    match value {
        Value::Number(_) => 0,
        Value::Timestamp(_) => 1,
        Value::Bool(_) => 2,
        Value::Text(_) => 3,
        Value::None => 4,
    }
}

/// Compares two rows using a list of sort specs.
///
/// The first spec is the primary key, later specs break ties.
pub fn compare_rows<R: Row + ?Sized>(a: &R, b: &R, specs: &[SortSpec]) -> Ordering {
    for spec in specs {
        let ordering = spec.compare(&a.field_value(&spec.key), &b.field_value(&spec.key));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Sorts rows by a single optional spec. `None` leaves the order unchanged.
///
/// The sort is stable in both directions.
pub fn sort<R: Row>(rows: &mut [R], spec: Option<&SortSpec>) {
    if let Some(spec) = spec {
        sort_by_all(rows, std::slice::from_ref(spec));
    }
}

/// Sorts rows by several specs, primary key first.
pub fn sort_by_all<R: Row>(rows: &mut [R], specs: &[SortSpec]) {
    if specs.is_empty() {
        return;
    }
    rows.sort_by(|a, b| compare_rows(a, b, specs));
}
