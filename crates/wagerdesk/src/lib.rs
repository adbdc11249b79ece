//! # Wagerdesk - admin console for betting platform reports
//!
//! The console shows the panel's report pages (users, balance history,
//! change log, IP intersections, provider stats and the generic statistics
//! builder) as filtered, sorted, paginated tables with a totals row, and
//! runs the write-path forms (create user, deposit, withdraw) for a
//! signed-in admin.
//!
//! ## Layout
//!
//! ```text
//! DataSource ──rows──▶ ReportController ──Query──▶ wagerdesk_query ──▶ ReportView
//!                        ▲  callbacks                                   │
//!                        │                                              ▼
//!                       cli                                table / json / yaml / csv
//! ```
//!
//! - [`reports`]: row types and schemas, one per report page
//! - [`source`]: where rows come from, and last-request-wins fetching
//! - [`controller`]: per-page filter, sort and page state
//! - [`forms`]: validated write operations over a [`forms::Ledger`]
//! - [`auth`]: the stored admin session
//! - [`table`] and [`output`]: rendering
//!
//! ## Example
//!
//! ```rust
//! use wagerdesk::controller::ReportController;
//! use wagerdesk::reports::{Report, ReportKind, User};
//! use wagerdesk::source::{load_or_notify, FixtureSource};
//! use wagerdesk_query::{FilterCondition, PageSize};
//!
//! let mut users = ReportController::<User>::new(User::schema(), PageSize::Ten);
//! let ticket = users.begin_fetch();
//! let (rows, notice) = load_or_notify::<User>(&FixtureSource::new(ReportKind::Users), ReportKind::Users);
//! assert!(notice.is_none());
//! users.replace_records(ticket, rows);
//!
//! users.on_filter_add("status=blocked".parse::<FilterCondition>().unwrap()).unwrap();
//! assert_eq!(users.view().result.total_count(), 2);
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod controller;
pub mod env;
pub mod forms;
pub mod notice;
pub mod output;
pub mod reports;
pub mod source;
pub mod table;

pub use cli::{run, Cli};
pub use config::AppConfig;
pub use controller::{RangeInput, ReportController, ReportView};
pub use notice::{Notice, NoticeLevel};
pub use output::OutputMode;
pub use reports::{Report, ReportKind};
