//! Report row types and their schemas.
//!
//! Each page of the panel shows one report. Typed reports implement
//! [`Report`]: a serde row shape, a static [`Schema`] and the [`Row`]
//! accessor the query engine reads. The statistics report is the exception;
//! its rows are dynamic [`wagerdesk_query::Record`]s whose schema is inferred
//! from the data.

mod balance;
mod change_log;
mod ip;
mod providers;
pub mod statistics;
mod users;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wagerdesk_query::{Row, Schema};

pub use balance::{BalanceEntry, Operation};
pub use change_log::ChangeLogEntry;
pub use ip::IpIntersection;
pub use providers::ProviderStat;
pub use users::{User, UserStatus};

/// A report with a fixed row shape.
pub trait Report: Row + Serialize + DeserializeOwned + Clone {
    /// Which report this row type belongs to.
    const KIND: ReportKind;

    /// Field schema: column order, search fields, date field and totals.
    fn schema() -> Schema;
}

/// Every report the console can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ReportKind {
    Users,
    BalanceHistory,
    ChangeLog,
    IpIntersections,
    ProviderStats,
    Statistics,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Users,
        ReportKind::BalanceHistory,
        ReportKind::ChangeLog,
        ReportKind::IpIntersections,
        ReportKind::ProviderStats,
        ReportKind::Statistics,
    ];

    /// Report name, also the data file stem (`users.json`).
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Users => "users",
            ReportKind::BalanceHistory => "balance-history",
            ReportKind::ChangeLog => "change-log",
            ReportKind::IpIntersections => "ip-intersections",
            ReportKind::ProviderStats => "provider-stats",
            ReportKind::Statistics => "statistics",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serde adapter for `YYYY-MM-DD HH:MM:SS` timestamps in report data.
pub(crate) mod datetime {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use wagerdesk_query::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(ts)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let text = String::deserialize(deserializer)?;
        Timestamp::parse(&text).ok_or_else(|| D::Error::custom(format!("invalid date-time '{text}'")))
    }
}
