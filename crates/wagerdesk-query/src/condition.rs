//! Filter conditions declared in the report builder.
//!
//! A [`FilterCondition`] is a single `field <op> value` predicate. Conditions
//! are collected in a [`ConditionSet`], whose order is the display order; all
//! conditions in a set are ANDed.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::op::Op;
use crate::row::Row;
use crate::value::{Number, Timestamp, Value};

/// Value a condition compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    /// Numeric operand.
    Number(Number),
    /// Free text operand.
    Text(String),
}

impl Operand {
    /// Reads the operand as a number, parsing text if needed.
    pub fn numeric(&self) -> Option<Number> {
        match self {
            Operand::Number(n) => Some(*n),
            Operand::Text(s) => Number::parse(s),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{}", n),
            Operand::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Text(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Text(s)
    }
}

impl From<Number> for Operand {
    fn from(n: Number) -> Self {
        Operand::Number(n)
    }
}

impl From<i64> for Operand {
    fn from(n: i64) -> Self {
        Operand::Number(Number::I64(n))
    }
}

impl From<i32> for Operand {
    fn from(n: i32) -> Self {
        Operand::Number(Number::from(n))
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Operand::Number(Number::F64(n))
    }
}

/// Which rows a condition narrows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// When set, the condition only decides which displayed rows count
    /// toward the totals row; it does not hide rows from the table.
    #[serde(default)]
    pub apply_to_aggregate_row: bool,
}

/// A single filter predicate: `field <op> value`.
///
/// ```
/// use wagerdesk_query::{FilterCondition, Op};
///
/// let cond: FilterCondition = "deposit>60".parse().unwrap();
/// assert_eq!(cond.field, "deposit");
/// assert_eq!(cond.op, Op::GreaterThan);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// The field name to compare.
    pub field: String,
    /// The comparison operator.
    #[serde(rename = "operator")]
    pub op: Op,
    /// The value to compare against.
    pub value: Operand,
    /// Display or totals scope.
    #[serde(default)]
    pub scope: Scope,
}

impl FilterCondition {
    /// Creates a new display-scoped condition.
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Operand>) -> Self {
        FilterCondition {
            field: field.into(),
            op,
            value: value.into(),
            scope: Scope::default(),
        }
    }

    /// Marks this condition as qualifying rows for the totals row only.
    pub fn aggregate_only(mut self) -> Self {
        self.scope.apply_to_aggregate_row = true;
        self
    }

    /// Returns `true` if this condition only narrows the totals row.
    pub fn is_aggregate_only(&self) -> bool {
        self.scope.apply_to_aggregate_row
    }

    /// Evaluates this condition against a field value.
    ///
    /// A missing field never matches. Numeric comparison is used when both
    /// sides read as numbers; timestamps compare against parsable dates or
    /// raw milliseconds; everything else compares lexicographically.
    pub fn matches(&self, field_value: &Value<'_>) -> bool {
        match compare_to_operand(field_value, &self.value) {
            Some(ordering) => self.op.eval_ordering(ordering),
            None => false,
        }
    }

    /// Evaluates this condition against a row.
    pub fn matches_row<R: Row + ?Sized>(&self, row: &R) -> bool {
        self.matches(&row.field_value(&self.field))
    }
}

fn compare_to_operand(field: &Value<'_>, operand: &Operand) -> Option<Ordering> {
    match field {
        Value::None => None,
        Value::Timestamp(ts) => {
            let other = match operand {
                Operand::Number(n) => Some(Timestamp(n.to_f64() as i64)),
                Operand::Text(s) => Timestamp::parse(s),
            };
            match other {
                Some(other) => Some(ts.cmp(&other)),
                None => Some(cmp_text(field, &operand.to_string())),
            }
        }
        _ => match (field.numeric(), operand.numeric()) {
            (Some(a), Some(b)) => a.compare(b),
            _ => Some(cmp_text(field, &operand.to_string())),
        },
    }
}

fn cmp_text(field: &Value<'_>, other: &str) -> Ordering {
    let text = field.to_text();
    (*text).cmp(other)
}

static CONDITION_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.]*)\s*([<>=])\s*(.*?)\s*$")
        .expect("condition pattern is valid")
});

impl FromStr for FilterCondition {
    type Err = QueryError;

    /// Parses `field>value`, `field<value` or `field=value`.
    ///
    /// Unquoted values that read as numbers become numeric operands; a value
    /// wrapped in double quotes is always text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::InvalidCondition(s.to_string());
        let caps = CONDITION_EXPR.captures(s).ok_or_else(invalid)?;

        let field = &caps[1];
        let op = caps[2]
            .chars()
            .next()
            .and_then(Op::from_symbol)
            .ok_or_else(invalid)?;
        let raw = &caps[3];
        // only single-character operators exist: `>=`, `<>` and `==` are errors
        if raw.is_empty() || raw.starts_with(['<', '>', '=']) {
            return Err(invalid());
        }

        let value = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            Some(quoted) => Operand::Text(quoted.to_string()),
            None => match Number::parse(raw) {
                Some(n) => Operand::Number(n),
                None => Operand::Text(raw.to_string()),
            },
        };

        Ok(FilterCondition::new(field, op, value))
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.op.symbol(), self.value)?;
        if self.is_aggregate_only() {
            write!(f, " (totals)")?;
        }
        Ok(())
    }
}

/// Ordered, AND-combined collection of conditions.
///
/// Insertion order is display order. Removal is positional, so callers must
/// keep the list they show in the same order as the set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet {
    conditions: Vec<FilterCondition>,
}

impl ConditionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        ConditionSet::default()
    }

    /// Appends a condition at the end.
    pub fn push(&mut self, condition: FilterCondition) {
        self.conditions.push(condition);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, condition: FilterCondition) -> Self {
        self.push(condition);
        self
    }

    /// Removes the condition at `index`. Out-of-range indexes are ignored.
    pub fn remove(&mut self, index: usize) -> Option<FilterCondition> {
        if index < self.conditions.len() {
            Some(self.conditions.remove(index))
        } else {
            None
        }
    }

    /// Builder form of [`remove`](Self::remove).
    pub fn without(mut self, index: usize) -> Self {
        self.remove(index);
        self
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterCondition> {
        self.conditions.iter()
    }

    /// Conditions that hide rows from the table.
    pub fn display_conditions(&self) -> impl Iterator<Item = &FilterCondition> {
        self.conditions.iter().filter(|c| !c.is_aggregate_only())
    }

    /// Conditions that only narrow the totals row.
    pub fn aggregate_conditions(&self) -> impl Iterator<Item = &FilterCondition> {
        self.conditions.iter().filter(|c| c.is_aggregate_only())
    }

    /// Returns `true` if the row passes every display-scoped condition.
    pub fn matches_display<R: Row + ?Sized>(&self, row: &R) -> bool {
        self.display_conditions().all(|c| c.matches_row(row))
    }

    /// Returns `true` if the row passes every totals-scoped condition.
    pub fn matches_aggregate<R: Row + ?Sized>(&self, row: &R) -> bool {
        self.aggregate_conditions().all(|c| c.matches_row(row))
    }
}

impl From<Vec<FilterCondition>> for ConditionSet {
    fn from(conditions: Vec<FilterCondition>) -> Self {
        ConditionSet { conditions }
    }
}

impl<'a> IntoIterator for &'a ConditionSet {
    type Item = &'a FilterCondition;
    type IntoIter = std::slice::Iter<'a, FilterCondition>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditions.iter()
    }
}
