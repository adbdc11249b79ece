//! Error types for the query crate.
//!
//! Only query *construction* can fail. Once a query has been built and
//! validated, running it over rows always yields a (possibly empty) result.

use thiserror::Error;

/// Errors that can occur when building queries or loading rows.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A condition or sort key names a field the report does not declare.
    #[error("unknown field '{field}' for report '{report}'")]
    UnknownField { field: String, report: String },

    /// A record is missing a field its schema declares.
    #[error("record is missing field '{0}'")]
    MissingField(String),

    /// A record field holds a value that does not fit its declared kind.
    #[error("field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: String,
    },

    /// A record was not a JSON object.
    #[error("record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// Condition expression could not be parsed.
    #[error("invalid condition '{0}': expected <field><op><value> with op one of > < =")]
    InvalidCondition(String),

    /// Operator name not recognized.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// Page size outside the offered set.
    #[error("page size {0} is not one of 10, 20, 25, 50, 100")]
    InvalidPageSize(usize),

    /// Sort direction name not recognized.
    #[error("unknown sort direction '{0}'")]
    UnknownDirection(String),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
