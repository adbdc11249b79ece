//! Comparison operators for filter conditions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Comparison operator offered by the report builder.
///
/// Each operator reads an [`Ordering`] of `field` relative to the condition
/// value; whether that ordering came from a numeric or a lexicographic
/// comparison is decided by the operands, not by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    /// `field > value`
    GreaterThan,
    /// `field < value`
    LessThan,
    /// `field == value`
    EqualTo,
}

impl Op {
    /// All operators, in the order the report builder lists them.
    pub const ALL: [Op; 3] = [Op::GreaterThan, Op::LessThan, Op::EqualTo];

    /// Evaluates a comparison given an ordering result.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::GreaterThan => ordering == Ordering::Greater,
            Op::LessThan => ordering == Ordering::Less,
            Op::EqualTo => ordering == Ordering::Equal,
        }
    }

    /// Returns the wire name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::GreaterThan => "greater_than",
            Op::LessThan => "less_than",
            Op::EqualTo => "equal_to",
        }
    }

    /// Returns the infix symbol used in condition expressions.
    pub fn symbol(self) -> char {
        match self {
            Op::GreaterThan => '>',
            Op::LessThan => '<',
            Op::EqualTo => '=',
        }
    }

    /// Looks up an operator by its infix symbol.
    pub fn from_symbol(symbol: char) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Op {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greater_than" | "gt" | ">" => Ok(Op::GreaterThan),
            "less_than" | "lt" | "<" => Ok(Op::LessThan),
            "equal_to" | "eq" | "=" => Ok(Op::EqualTo),
            other => Err(QueryError::UnknownOperator(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_eval_ordering() {
        assert!(Op::GreaterThan.eval_ordering(Ordering::Greater));
        assert!(!Op::GreaterThan.eval_ordering(Ordering::Equal));
        assert!(!Op::GreaterThan.eval_ordering(Ordering::Less));

        assert!(Op::LessThan.eval_ordering(Ordering::Less));
        assert!(!Op::LessThan.eval_ordering(Ordering::Equal));
        assert!(!Op::LessThan.eval_ordering(Ordering::Greater));

        assert!(Op::EqualTo.eval_ordering(Ordering::Equal));
        assert!(!Op::EqualTo.eval_ordering(Ordering::Less));
        assert!(!Op::EqualTo.eval_ordering(Ordering::Greater));
    }

    #[test]
    fn op_symbols_round_trip() {
        for op in Op::ALL {
            assert_eq!(Op::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(Op::from_symbol('!'), None);
    }

    #[test]
    fn op_from_str_accepts_names_and_symbols() {
        assert_eq!("greater_than".parse::<Op>().unwrap(), Op::GreaterThan);
        assert_eq!("lt".parse::<Op>().unwrap(), Op::LessThan);
        assert_eq!("=".parse::<Op>().unwrap(), Op::EqualTo);
        assert!("between".parse::<Op>().is_err());
    }

    #[test]
    fn op_serde_uses_snake_case() {
        let json = serde_json::to_string(&Op::GreaterThan).unwrap();
        assert_eq!(json, "\"greater_than\"");
        let op: Op = serde_json::from_str("\"equal_to\"").unwrap();
        assert_eq!(op, Op::EqualTo);
    }
}
