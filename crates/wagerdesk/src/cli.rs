//! Command-line surface and command dispatch.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use wagerdesk_query::{Dir, FilterCondition, PageSize, Record, Row, Schema, Timestamp};

use crate::auth::{parse_profile, AuthContext, SessionStore};
use crate::config::AppConfig;
use crate::controller::{RangeInput, ReportController, ReportView};
use crate::env::RealEnv;
use crate::forms::{CreateUserForm, DepositForm, Ledger, ValidationError, WithdrawForm};
use crate::notice::Notice;
use crate::output::{serialize_csv, serialize_structured, OutputMode};
use crate::reports::{
    statistics, BalanceEntry, ChangeLogEntry, IpIntersection, ProviderStat, Report, ReportKind,
    User,
};
use crate::source::{load_or_notify, DataSource, FixtureSource, StatisticsSource};
use crate::table::{render_view, Table};

#[derive(Debug, Parser)]
#[command(name = "wagerdesk")]
#[command(about = "Admin console for betting platform reports", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (YAML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Output format; defaults to the configured mode. CSV exports the
    /// page's rows only, without the totals or page line
    #[arg(long, short, global = true, value_enum)]
    pub output: Option<OutputMode>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a report page
    Report(ReportArgs),

    /// Store an access token and admin profile
    Login {
        /// Access token
        #[arg(long)]
        token: String,

        /// Admin profile as JSON, e.g. '{"id":1,"login":"root"}'
        #[arg(long)]
        user: String,
    },

    /// Clear the stored session
    Logout,

    /// Show the signed-in admin
    Whoami,

    /// Credit a user's balance
    Deposit(AmountArgs),

    /// Debit a user's balance
    Withdraw(AmountArgs),

    /// Create a player account
    CreateUser {
        #[arg(long)]
        login: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Password again
        #[arg(long)]
        confirm: String,

        /// Display name; defaults to the login
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Report to show
    #[arg(value_enum)]
    pub kind: ReportKind,

    /// Case-insensitive text matched against the report's search fields
    #[arg(long, short)]
    pub search: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub from_date: Option<NaiveDate>,

    /// Start time; partial input such as "0930" is accepted
    #[arg(long)]
    pub from_time: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub to_date: Option<NaiveDate>,

    /// End time
    #[arg(long)]
    pub to_time: Option<String>,

    /// Row condition, e.g. "deposit>100"; repeatable, all must hold
    #[arg(long = "where", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Condition applied to the totals only; repeatable
    #[arg(long, value_name = "EXPR")]
    pub total_where: Vec<String>,

    /// Sort key; repeat to break ties with further keys
    #[arg(long, value_name = "KEY")]
    pub sort: Vec<String>,

    /// Sort the first key descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Rows per page: 10, 20, 25, 50 or 100
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Page to show (1-based); past the end shows the last page
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Read rows from this JSON file instead of the data directory
    #[arg(long)]
    pub data: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AmountArgs {
    #[arg(long)]
    pub user_id: u64,

    #[arg(long)]
    pub amount: f64,
}

/// Settings every command runs with.
#[derive(Debug)]
struct Runtime {
    config: AppConfig,
    output: OutputMode,
}

impl Runtime {
    fn fixture(&self, kind: ReportKind, file: Option<PathBuf>) -> FixtureSource {
        FixtureSource::new(kind)
            .with_data_dir(self.config.data_dir.clone())
            .with_file(file)
    }

    fn auth(&self) -> Result<AuthContext> {
        AuthContext::init(SessionStore::new(&self.config.session_file))
            .context("failed to read session")
    }

    fn signed_in(&self) -> Result<AuthContext> {
        let auth = self.auth()?;
        if !auth.is_signed_in() {
            bail!("not signed in; run `wagerdesk login` first");
        }
        Ok(auth)
    }
}

/// Runs a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref(), &RealEnv)?;
    let output = cli.output.unwrap_or(config.output);
    let ctx = Runtime { config, output };

    match cli.command {
        Command::Report(args) => {
            info!(report = %args.kind, "showing report");
            match args.kind {
                ReportKind::Users => show::<User>(&ctx, &args),
                ReportKind::BalanceHistory => show::<BalanceEntry>(&ctx, &args),
                ReportKind::ChangeLog => show::<ChangeLogEntry>(&ctx, &args),
                ReportKind::IpIntersections => show::<IpIntersection>(&ctx, &args),
                ReportKind::ProviderStats => show::<ProviderStat>(&ctx, &args),
                ReportKind::Statistics => show_statistics(&ctx, &args),
            }
        }
        Command::Login { token, user } => {
            let profile = parse_profile(&user).context("invalid --user")?;
            let mut auth = ctx.auth()?;
            auth.sign_in(token, profile)?;
            info!("signed in");
            notify(&Notice::success("signed in"));
            Ok(())
        }
        Command::Logout => {
            ctx.auth()?.teardown()?;
            notify(&Notice::success("signed out"));
            Ok(())
        }
        Command::Whoami => whoami(&ctx),
        Command::Deposit(args) => {
            let form = DepositForm {
                user_id: args.user_id,
                amount: args.amount,
            };
            post_balance(&ctx, |ledger, now| form.submit(ledger, now).cloned())
        }
        Command::Withdraw(args) => {
            let form = WithdrawForm {
                user_id: args.user_id,
                amount: args.amount,
            };
            post_balance(&ctx, |ledger, now| form.submit(ledger, now).cloned())
        }
        Command::CreateUser {
            login,
            email,
            password,
            confirm,
            name,
        } => {
            let form = CreateUserForm {
                login,
                email,
                password,
                confirm,
                name,
            };
            ctx.signed_in()?;
            let mut ledger = load_ledger(&ctx)?;
            let user = form.submit(&mut ledger, now())?.clone();
            emit_record(&ctx, &user)?;
            notify(&Notice::success(format!("created user {}", user.id)));
            Ok(())
        }
    }
}

fn now() -> Timestamp {
    Timestamp::from(Local::now().naive_local())
}

fn notify(notice: &Notice) {
    eprintln!("{}", notice.render());
}

// ============================================================================
// Reports
// ============================================================================

fn show<T: Report>(ctx: &Runtime, args: &ReportArgs) -> Result<()> {
    let source = ctx.fixture(T::KIND, args.data.clone());
    let mut controller = ReportController::<T>::new(T::schema(), ctx.config.page_size);

    let ticket = controller.begin_fetch();
    match load_or_notify::<T>(&source, T::KIND) {
        (_, Some(notice)) => controller.fail_fetch(ticket, notice),
        (rows, None) => controller.replace_records(ticket, rows),
    };

    apply(&mut controller, args)?;
    emit_view(&controller.view(), ctx.output)
}

fn show_statistics(ctx: &Runtime, args: &ReportArgs) -> Result<()> {
    let source = StatisticsSource::new(ctx.fixture(ReportKind::Statistics, args.data.clone()));
    let mut controller = ReportController::<Record>::new(
        Schema::new(ReportKind::Statistics.as_str()),
        ctx.config.page_size,
    );

    let ticket = controller.begin_fetch();
    match load_or_notify::<Record>(&source, ReportKind::Statistics) {
        (_, Some(notice)) => controller.fail_fetch(ticket, notice),
        (rows, None) => {
            controller.set_schema(statistics::schema_of(&rows));
            controller.replace_records(ticket, rows)
        }
    };

    apply(&mut controller, args)?;
    emit_view(&controller.view(), ctx.output)
}

/// Replays the command-line choices through the controller callbacks.
fn apply<T: Row>(controller: &mut ReportController<T>, args: &ReportArgs) -> Result<()> {
    if let Some(search) = &args.search {
        controller.on_search(search.as_str());
    }

    let has_range = args.from_date.is_some()
        || args.to_date.is_some()
        || args.from_time.is_some()
        || args.to_time.is_some();
    if has_range {
        controller.on_time_range(
            RangeInput::new(args.from_date, args.from_time.clone().unwrap_or_default()),
            RangeInput::new(args.to_date, args.to_time.clone().unwrap_or_default()),
        );
    }

    for expr in &args.filters {
        let condition: FilterCondition = expr.parse()?;
        controller.on_filter_add(condition)?;
    }
    for expr in &args.total_where {
        let condition: FilterCondition = expr.parse()?;
        controller.on_filter_add(condition.aggregate_only())?;
    }

    if let Some((primary, rest)) = args.sort.split_first() {
        controller.on_sort_change(primary)?;
        if args.desc {
            controller.on_sort_change(primary)?;
        }
        for key in rest {
            controller.then_sort_by(key, Dir::Asc)?;
        }
    }

    if let Some(size) = args.page_size {
        controller.on_page_size_change(PageSize::try_from(size)?);
    }
    controller.on_page_change(args.page);
    Ok(())
}

/// Writes a report page. Notices go to stderr except in JSON/YAML, where
/// they are part of the document. CSV carries the rows alone.
pub fn emit_view<T: Row + Serialize>(view: &ReportView<'_, T>, mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Table => {
            view.notices.iter().for_each(notify);
            println!("{}", render_view(view));
        }
        OutputMode::Csv => {
            view.notices.iter().for_each(notify);
            print!("{}", serialize_csv(view.result.items())?);
        }
        OutputMode::Json | OutputMode::Yaml => {
            println!("{}", serialize_structured(view, mode)?.trim_end());
        }
    }
    Ok(())
}

// ============================================================================
// Session and write path
// ============================================================================

fn whoami(ctx: &Runtime) -> Result<()> {
    let auth = ctx.auth()?;
    let Some(user) = auth.user() else {
        notify(&Notice::warning("not signed in"));
        return Ok(());
    };
    if ctx.output.is_structured() {
        println!("{}", serialize_structured(user, ctx.output)?.trim_end());
        return Ok(());
    }
    match &user.name {
        Some(name) => println!("{} ({}) #{}", user.login, name, user.id),
        None => println!("{} #{}", user.login, user.id),
    }
    if let Some(api_url) = &ctx.config.api_url {
        println!("api: {api_url}");
    }
    Ok(())
}

fn load_ledger(ctx: &Runtime) -> Result<Ledger> {
    let users: Vec<User> = ctx
        .fixture(ReportKind::Users, None)
        .fetch()
        .context("failed to load users")?;
    let history: Vec<BalanceEntry> = ctx
        .fixture(ReportKind::BalanceHistory, None)
        .fetch()
        .context("failed to load balance history")?;
    Ok(Ledger::new(users, history))
}

fn post_balance<F>(ctx: &Runtime, submit: F) -> Result<()>
where
    F: FnOnce(&mut Ledger, Timestamp) -> Result<BalanceEntry, ValidationError>,
{
    ctx.signed_in()?;
    let mut ledger = load_ledger(ctx)?;
    let entry = submit(&mut ledger, now())?;
    emit_record(ctx, &entry)?;
    notify(&Notice::success(format!(
        "{} of {:.2} posted for {}",
        entry.operation.as_str(),
        entry.amount.abs(),
        entry.login
    )));
    Ok(())
}

fn emit_record<T: Report>(ctx: &Runtime, record: &T) -> Result<()> {
    if ctx.output.is_structured() {
        println!("{}", serialize_structured(record, ctx.output)?.trim_end());
    } else {
        println!("{}", Table::from_rows(&T::schema(), &[record]).render());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_report_flags() {
        let cli = Cli::try_parse_from([
            "wagerdesk",
            "report",
            "users",
            "--where",
            "deposit>100",
            "--where",
            "status=active",
            "--total-where",
            "deposit<400",
            "--sort",
            "deposit",
            "--desc",
            "--from-date",
            "2024-03-01",
            "--from-time",
            "0930",
            "--page-size",
            "25",
            "-o",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.output, Some(OutputMode::Json));
        let Command::Report(args) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.kind, ReportKind::Users);
        assert_eq!(args.filters, ["deposit>100", "status=active"]);
        assert_eq!(args.total_where, ["deposit<400"]);
        assert!(args.desc);
        assert_eq!(args.from_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(args.page_size, Some(25));
        assert_eq!(args.page, 1);
    }

    #[test]
    fn desc_needs_a_sort_key() {
        assert!(Cli::try_parse_from(["wagerdesk", "report", "users", "--desc"]).is_err());
    }

    fn args(kind: ReportKind) -> ReportArgs {
        ReportArgs {
            kind,
            search: None,
            from_date: None,
            from_time: None,
            to_date: None,
            to_time: None,
            filters: Vec::new(),
            total_where: Vec::new(),
            sort: Vec::new(),
            desc: false,
            page_size: None,
            page: 1,
            data: None,
        }
    }

    fn users_controller() -> ReportController<User> {
        let rows: Vec<User> = FixtureSource::new(ReportKind::Users).fetch().unwrap();
        let mut controller = ReportController::new(User::schema(), PageSize::Ten);
        let ticket = controller.begin_fetch();
        controller.replace_records(ticket, rows);
        controller
    }

    #[test]
    fn apply_sorts_descending_with_tiebreak() {
        let mut controller = users_controller();
        let args = ReportArgs {
            sort: vec!["status".into(), "id".into()],
            desc: true,
            ..args(ReportKind::Users)
        };
        apply(&mut controller, &args).unwrap();

        let view = controller.view();
        let ids: Vec<u64> = view.result.items().iter().map(|u| u.id).collect();
        assert_eq!(&ids[..2], [7, 18]);
        assert_eq!(ids[2], 1);
    }

    #[test]
    fn apply_rejects_bad_input() {
        let mut controller = users_controller();

        let bad_field = ReportArgs {
            filters: vec!["nope>1".into()],
            ..args(ReportKind::Users)
        };
        assert!(apply(&mut controller, &bad_field).is_err());

        let bad_size = ReportArgs {
            page_size: Some(30),
            ..args(ReportKind::Users)
        };
        assert!(apply(&mut controller, &bad_size).is_err());

        let bad_expr = ReportArgs {
            filters: vec!["deposit".into()],
            ..args(ReportKind::Users)
        };
        assert!(apply(&mut controller, &bad_expr).is_err());

        let compound_op = ReportArgs {
            filters: vec!["deposit>=60".into()],
            ..args(ReportKind::Users)
        };
        assert!(apply(&mut controller, &compound_op).is_err());
    }

    #[test]
    fn help_says_csv_has_rows_only() {
        let cmd = Cli::command();
        let output = cmd
            .get_arguments()
            .find(|arg| arg.get_id() == "output")
            .unwrap();
        let help = output.get_help().unwrap().to_string();
        assert!(help.contains("CSV exports the page's rows only"));

        let csv = output
            .get_possible_values()
            .into_iter()
            .find(|value| value.get_name() == "csv")
            .unwrap();
        assert_eq!(
            csv.get_help().map(ToString::to_string).as_deref(),
            Some("Rows of the current page, without totals")
        );
    }
}
