//! Report data sources.
//!
//! A [`DataSource`] supplies the full row collection for one report. The
//! console ships with fixture data compiled in; a data directory or an
//! explicit file replaces it. Failures never reach the table: they become
//! an empty collection plus an error [`Notice`] (see [`load_or_notify`]).

use std::path::{Path, PathBuf};

use serde_json::Value as Json;
use thiserror::Error;
use tracing::{debug, warn};
use wagerdesk_query::{QueryError, Record};

use crate::notice::Notice;
use crate::reports::{statistics, Report, ReportKind};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {report} data: {source}")]
    Parse {
        report: ReportKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed {report} data: {source}")]
    Shape {
        report: ReportKind,
        #[source]
        source: QueryError,
    },
}

/// Supplies the rows of one report.
pub trait DataSource<T> {
    fn fetch(&self) -> Result<Vec<T>, SourceError>;
}

fn bundled(report: ReportKind) -> &'static str {
    match report {
        ReportKind::Users => include_str!("../fixtures/users.json"),
        ReportKind::BalanceHistory => include_str!("../fixtures/balance-history.json"),
        ReportKind::ChangeLog => include_str!("../fixtures/change-log.json"),
        ReportKind::IpIntersections => include_str!("../fixtures/ip-intersections.json"),
        ReportKind::ProviderStats => include_str!("../fixtures/provider-stats.json"),
        ReportKind::Statistics => include_str!("../fixtures/statistics.json"),
    }
}

/// JSON fixture data for one report.
///
/// Lookup order: an explicit file, then `<data_dir>/<report>.json` if it
/// exists, then the bundled fixture.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    report: ReportKind,
    data_dir: Option<PathBuf>,
    file: Option<PathBuf>,
}

impl FixtureSource {
    pub fn new(report: ReportKind) -> Self {
        FixtureSource {
            report,
            data_dir: None,
            file: None,
        }
    }

    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.data_dir = dir;
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn report(&self) -> ReportKind {
        self.report
    }

    fn location(&self) -> Option<PathBuf> {
        if let Some(file) = &self.file {
            return Some(file.clone());
        }
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", self.report)))
            .filter(|path| path.exists())
    }

    /// Reads the raw JSON document.
    pub fn load_json(&self) -> Result<Json, SourceError> {
        let text = match self.location() {
            Some(path) => {
                debug!(report = %self.report, path = %path.display(), "reading data file");
                read(&path)?
            }
            None => bundled(self.report).to_string(),
        };
        serde_json::from_str(&text).map_err(|source| SourceError::Parse {
            report: self.report,
            source,
        })
    }
}

fn read(path: &Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })
}

impl<T: Report> DataSource<T> for FixtureSource {
    fn fetch(&self) -> Result<Vec<T>, SourceError> {
        let json = self.load_json()?;
        serde_json::from_value(json).map_err(|source| SourceError::Parse {
            report: self.report,
            source,
        })
    }
}

/// Statistics rows, schema inferred from the data.
#[derive(Debug, Clone)]
pub struct StatisticsSource {
    inner: FixtureSource,
}

impl StatisticsSource {
    pub fn new(inner: FixtureSource) -> Self {
        StatisticsSource { inner }
    }
}

impl DataSource<Record> for StatisticsSource {
    fn fetch(&self) -> Result<Vec<Record>, SourceError> {
        let json = self.inner.load_json()?;
        statistics::load(&json).map_err(|source| SourceError::Shape {
            report: ReportKind::Statistics,
            source,
        })
    }
}

/// Fetches rows, turning a failure into no rows and an error notice.
///
/// Retrying is up to the caller.
pub fn load_or_notify<T>(source: &dyn DataSource<T>, report: ReportKind) -> (Vec<T>, Option<Notice>) {
    match source.fetch() {
        Ok(rows) => {
            debug!(%report, rows = rows.len(), "data loaded");
            (rows, None)
        }
        Err(err) => {
            warn!(%report, error = %err, "data source failed");
            (
                Vec::new(),
                Some(Notice::error(format!("could not load {report}: {err}"))),
            )
        }
    }
}

/// Issued by [`RequestTracker::begin`] for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Last-request-wins bookkeeping for fetches.
///
/// Every fetch takes a ticket; only the newest ticket may apply its rows.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fetch, superseding every earlier one.
    pub fn begin(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}
