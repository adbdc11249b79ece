//! Tabular data engine for the wagerdesk admin console.
//!
//! Every report table in the console (users, balance history, change log,
//! IP intersections, provider statistics, the statistics builder) is driven
//! by the same pipeline over an in-memory row collection:
//!
//! ```text
//! rows ─▶ evaluate (search, date range, conditions) ─▶ sort ─┬─▶ paginate ─▶ page
//!                                                            └─▶ aggregate ─▶ totals
//! ```
//!
//! - Search is a case-insensitive substring match over the report's search
//!   fields.
//! - The date range is built from a calendar date plus typed `HH:MM:SS`
//!   text on each end; an end that cannot be read yet is left open.
//! - Conditions (`field > value`, `field < value`, `field = value`) are
//!   ANDed, comparing numerically when both sides are numbers and
//!   lexicographically otherwise.
//! - Sorting is stable in both directions.
//! - Totals cover every filtered row, never just the visible page.
//!
//! # Quick Start
//!
//! ```rust
//! use wagerdesk_query::{FieldKind, Number, Query, Row, Schema, Value};
//!
//! struct Player {
//!     id: i64,
//!     deposit: i64,
//! }
//!
//! impl Row for Player {
//!     fn field_value(&self, field: &str) -> Value<'_> {
//!         match field {
//!             "id" => Value::Number(Number::I64(self.id)),
//!             "deposit" => Value::Number(Number::I64(self.deposit)),
//!             _ => Value::None,
//!         }
//!     }
//! }
//!
//! let schema = Schema::new("users")
//!     .field("id", FieldKind::Number)
//!     .field("deposit", FieldKind::Number)
//!     .searchable(["id"])
//!     .totals(["deposit"]);
//!
//! let players = vec![
//!     Player { id: 1, deposit: 100 },
//!     Player { id: 2, deposit: 50 },
//!     Player { id: 3, deposit: 200 },
//! ];
//!
//! let result = Query::new()
//!     .and_gt("deposit", 60)
//!     .build()
//!     .try_run(&players, &schema)
//!     .unwrap();
//!
//! let ids: Vec<i64> = result.items().iter().map(|p| p.id).collect();
//! assert_eq!(ids, [1, 3]);
//! assert_eq!(result.aggregates().get("deposit"), Some(300.0));
//! ```

mod aggregate;
mod condition;
mod error;
mod op;
mod ordering;
mod page;
mod query;
mod record;
mod row;
mod schema;
mod time;
mod value;

pub use aggregate::{aggregate, Aggregates};
pub use condition::{ConditionSet, FilterCondition, Operand, Scope};
pub use error::{QueryError, Result};
pub use op::Op;
pub use ordering::{compare_rows, compare_values, sort, sort_by_all, Dir, SortSpec};
pub use page::{paginate, Page, PageSize, PageSpec};
pub use query::{evaluate, Query, QueryResult};
pub use record::{Record, Scalar};
pub use row::Row;
pub use schema::{FieldDef, FieldKind, Schema};
pub use time::{combine_date_and_time, normalize_time_fragment, TimeOfDay, TimeRange};
pub use value::{Number, Timestamp, Value};
