//! Per-report view state.
//!
//! [`ReportController`] owns everything the user can change on a report
//! page (search text, date range inputs, conditions, sort and page) plus
//! the rows last fetched for it. Every callback updates that state and
//! replays the whole query pipeline; [`ReportController::view`] yields the
//! page to render.

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;
use wagerdesk_query::{
    ConditionSet, Dir, FilterCondition, PageSize, PageSpec, Query, QueryError, QueryResult, Row,
    Schema, SortSpec, TimeRange,
};

use crate::notice::Notice;
use crate::source::{RequestTracker, Ticket};

/// One end of the date filter as typed: a calendar date and free time text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeInput {
    pub date: Option<NaiveDate>,
    pub time: String,
}

impl RangeInput {
    pub fn new(date: Option<NaiveDate>, time: impl Into<String>) -> Self {
        RangeInput {
            date,
            time: time.into(),
        }
    }
}

#[derive(Debug)]
pub struct ReportController<T> {
    schema: Schema,
    rows: Vec<T>,
    search: String,
    from: RangeInput,
    to: RangeInput,
    conditions: ConditionSet,
    sort: Option<SortSpec>,
    tiebreaks: Vec<SortSpec>,
    page: PageSpec,
    tracker: RequestTracker,
    notices: Vec<Notice>,
}

impl<T: Row> ReportController<T> {
    /// An empty report: no rows, no filters, first page.
    pub fn new(schema: Schema, page_size: PageSize) -> Self {
        ReportController {
            schema,
            rows: Vec::new(),
            search: String::new(),
            from: RangeInput::default(),
            to: RangeInput::default(),
            conditions: ConditionSet::new(),
            sort: None,
            tiebreaks: Vec::new(),
            page: PageSpec::first(page_size),
            tracker: RequestTracker::new(),
            notices: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Replaces the schema, for reports whose shape comes with the data.
    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
        self.refresh();
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> PageSpec {
        self.page
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    /// Starts a fetch. Any fetch begun earlier becomes stale.
    pub fn begin_fetch(&mut self) -> Ticket {
        self.tracker.begin()
    }

    /// Applies fetched rows if `ticket` is still the latest fetch.
    ///
    /// Returns `false` (and drops the rows) for a stale fetch.
    pub fn replace_records(&mut self, ticket: Ticket, rows: Vec<T>) -> bool {
        if !self.tracker.is_current(ticket) {
            debug!(report = %self.schema.name, "dropping stale fetch");
            return false;
        }
        self.rows = rows;
        self.refresh();
        true
    }

    /// Records a failed fetch: no rows and an error notice.
    pub fn fail_fetch(&mut self, ticket: Ticket, notice: Notice) -> bool {
        if !self.replace_records(ticket, Vec::new()) {
            return false;
        }
        self.notices.push(notice);
        true
    }

    // ========================================================================
    // User callbacks
    // ========================================================================

    pub fn on_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.refresh();
    }

    /// Sets both ends of the date filter from the raw inputs. An end whose
    /// date is missing or whose time text is incomplete stays open.
    pub fn on_time_range(&mut self, from: RangeInput, to: RangeInput) {
        self.from = from;
        self.to = to;
        self.refresh();
    }

    /// Appends a condition. Fails without changing anything if the field is
    /// not part of the report.
    pub fn on_filter_add(&mut self, condition: FilterCondition) -> Result<(), QueryError> {
        self.check_field(&condition.field)?;
        self.conditions.push(condition);
        self.refresh();
        Ok(())
    }

    /// Removes the condition at `index`. Out of range is a no-op.
    pub fn on_filter_remove(&mut self, index: usize) -> Option<FilterCondition> {
        let removed = self.conditions.remove(index);
        self.refresh();
        removed
    }

    /// Sorts by `key`: the current key flips direction, a new key starts
    /// ascending.
    pub fn on_sort_change(&mut self, key: &str) -> Result<(), QueryError> {
        self.check_field(key)?;
        let next = SortSpec::toggle(self.sort.as_ref(), key);
        self.tiebreaks.retain(|spec| spec.key != key);
        self.sort = Some(next);
        self.refresh();
        Ok(())
    }

    /// Adds a secondary key used to order rows the active sort ties on.
    pub fn then_sort_by(&mut self, key: &str, dir: Dir) -> Result<(), QueryError> {
        self.check_field(key)?;
        self.tiebreaks.push(SortSpec::new(key, dir));
        self.refresh();
        Ok(())
    }

    pub fn on_page_change(&mut self, index: usize) {
        self.page = self.page.with_index(index);
        self.refresh();
    }

    /// Changes the page size and returns to the first page.
    pub fn on_page_size_change(&mut self, size: PageSize) {
        self.page = self.page.with_size(size);
        self.refresh();
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    pub fn time_range(&self) -> TimeRange {
        TimeRange::from_inputs(self.from.date, &self.from.time, self.to.date, &self.to.time)
    }

    /// The query the current state describes.
    pub fn query(&self) -> Query {
        let mut query = Query::new()
            .search(self.search.as_str())
            .between(self.time_range())
            .conditions(self.conditions.clone())
            .sort(self.sort.clone())
            .page(self.page);
        for spec in &self.tiebreaks {
            query = query.order_by(&spec.key, spec.dir);
        }
        query
    }

    /// Runs the pipeline over the current rows.
    pub fn view(&self) -> ReportView<'_, T> {
        ReportView {
            schema: &self.schema,
            result: self.query().run(&self.rows, &self.schema),
            notices: &self.notices,
        }
    }

    fn refresh(&mut self) {
        let count = self.query().run(&self.rows, &self.schema).total_count();
        self.page = self.page.clamp(count);
    }

    fn check_field(&self, field: &str) -> Result<(), QueryError> {
        // A schema learned from data is empty until rows arrive.
        if self.schema.fields.is_empty() {
            return Ok(());
        }
        self.schema.validate_field(field).map(|_| ())
    }
}

/// A rendered-ready report page.
#[derive(Debug)]
pub struct ReportView<'a, T> {
    pub schema: &'a Schema,
    pub result: QueryResult<'a, T>,
    pub notices: &'a [Notice],
}

impl<T> ReportView<'_, T> {
    pub fn report(&self) -> &str {
        &self.schema.name
    }
}

impl<T: Serialize> Serialize for ReportView<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ReportView", 8)?;
        state.serialize_field("report", &self.schema.name)?;
        state.serialize_field("items", self.result.items())?;
        state.serialize_field("page_index", &self.result.page_index())?;
        state.serialize_field("page_size", &self.result.page_size())?;
        state.serialize_field("total_pages", &self.result.total_pages())?;
        state.serialize_field("total_count", &self.result.total_count())?;
        state.serialize_field("aggregates", self.result.aggregates())?;
        state.serialize_field("notices", self.notices)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wagerdesk_query::{FieldKind, Number, Op, Timestamp, Value};

    #[derive(Debug, Clone, PartialEq, serde::Serialize)]
    struct Txn {
        id: u64,
        login: &'static str,
        amount: i64,
        at: Timestamp,
    }

    impl Row for Txn {
        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "id" => Value::Number(Number::U64(self.id)),
                "login" => Value::Text(self.login),
                "amount" => Value::Number(Number::I64(self.amount)),
                "at" => Value::Timestamp(self.at),
                _ => Value::None,
            }
        }
    }

    fn schema() -> Schema {
        Schema::new("txns")
            .field("id", FieldKind::Number)
            .field("login", FieldKind::Text)
            .field("amount", FieldKind::Number)
            .field("at", FieldKind::DateTime)
            .searchable(["id", "login"])
            .timestamp("at")
            .totals(["amount"])
    }

    fn rows(n: u64) -> Vec<Txn> {
        (1..=n)
            .map(|id| Txn {
                id,
                login: if id % 2 == 0 { "even" } else { "odd" },
                amount: id as i64 * 10,
                at: Timestamp::parse(&format!("2024-01-{id:02} 12:00:00")).unwrap(),
            })
            .collect()
    }

    fn loaded(n: u64) -> ReportController<Txn> {
        let mut controller = ReportController::new(schema(), PageSize::Ten);
        let ticket = controller.begin_fetch();
        assert!(controller.replace_records(ticket, rows(n)));
        controller
    }

    fn ids(view: &ReportView<'_, Txn>) -> Vec<u64> {
        view.result.items().iter().map(|t| t.id).collect()
    }

    #[test]
    fn stale_fetch_is_dropped() {
        let mut controller = ReportController::new(schema(), PageSize::Ten);
        let old = controller.begin_fetch();
        let new = controller.begin_fetch();

        assert!(controller.replace_records(new, rows(3)));
        assert!(!controller.replace_records(old, rows(20)));
        assert_eq!(controller.rows().len(), 3);
    }

    #[test]
    fn failed_fetch_shows_empty_table_and_notice() {
        let mut controller = loaded(5);
        let ticket = controller.begin_fetch();
        assert!(controller.fail_fetch(ticket, Notice::error("network down")));

        let view = controller.view();
        assert!(view.result.is_empty());
        assert_eq!(view.result.total_pages(), 1);
        assert_eq!(view.notices.len(), 1);
    }

    #[test]
    fn filters_compose() {
        let mut controller = loaded(12);
        controller.on_search("even");
        controller
            .on_filter_add(FilterCondition::new("amount", Op::GreaterThan, 40))
            .unwrap();
        controller.on_time_range(
            RangeInput::new(NaiveDate::from_ymd_opt(2024, 1, 1), ""),
            RangeInput::new(NaiveDate::from_ymd_opt(2024, 1, 10), "23:59:59"),
        );

        let view = controller.view();
        assert_eq!(ids(&view), [6, 8, 10]);
        assert_eq!(view.result.aggregates().get("amount"), Some(240.0));
    }

    #[test]
    fn incomplete_time_leaves_end_open() {
        let mut controller = loaded(12);
        controller.on_time_range(
            RangeInput::new(NaiveDate::from_ymd_opt(2024, 1, 11), "1"),
            RangeInput::default(),
        );
        assert!(controller.time_range().is_unbounded());
        assert_eq!(controller.view().result.total_count(), 12);
    }

    #[test]
    fn unknown_filter_field_changes_nothing() {
        let mut controller = loaded(3);
        let err = controller
            .on_filter_add(FilterCondition::new("bonus", Op::EqualTo, 1))
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));
        assert!(controller.conditions().is_empty());
        assert!(controller.on_sort_change("bonus").is_err());
        assert_eq!(controller.sort_spec(), None);
    }

    #[test]
    fn remove_by_position() {
        let mut controller = loaded(10);
        controller
            .on_filter_add(FilterCondition::new("amount", Op::GreaterThan, 20))
            .unwrap();
        controller
            .on_filter_add(FilterCondition::new("amount", Op::LessThan, 90))
            .unwrap();
        assert_eq!(controller.view().result.total_count(), 6);

        assert!(controller.on_filter_remove(7).is_none());
        assert_eq!(controller.conditions().len(), 2);

        let removed = controller.on_filter_remove(0).unwrap();
        assert_eq!(removed.op, Op::GreaterThan);
        assert_eq!(controller.view().result.total_count(), 8);
    }

    #[test]
    fn sort_toggles_and_resets() {
        let mut controller = loaded(3);
        controller.on_sort_change("amount").unwrap();
        assert_eq!(ids(&controller.view()), [1, 2, 3]);
        controller.on_sort_change("amount").unwrap();
        assert_eq!(ids(&controller.view()), [3, 2, 1]);
        controller.on_sort_change("login").unwrap();
        assert_eq!(controller.sort_spec(), Some(&SortSpec::asc("login")));
    }

    #[test]
    fn tiebreak_orders_equal_keys() {
        let mut controller = loaded(4);
        controller.on_sort_change("login").unwrap();
        controller.then_sort_by("amount", Dir::Desc).unwrap();
        assert_eq!(ids(&controller.view()), [4, 2, 3, 1]);
    }

    #[test]
    fn page_index_stays_clamped() {
        let mut controller = loaded(25);
        controller.on_page_change(9);
        assert_eq!(controller.page().index, 3);
        assert_eq!(ids(&controller.view()), [21, 22, 23, 24, 25]);

        controller.on_search("odd");
        assert_eq!(controller.page().index, 2);

        controller.on_page_size_change(PageSize::Twenty);
        assert_eq!(controller.page(), PageSpec::first(PageSize::Twenty));
    }

    #[test]
    fn view_serializes_page_and_notices() {
        let mut controller = loaded(2);
        controller.push_notice(Notice::info("mock data"));
        let json = serde_json::to_value(controller.view()).unwrap();

        assert_eq!(json["report"], "txns");
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert_eq!(json["aggregates"]["amount"], 30.0);
        assert_eq!(json["notices"][0]["level"], "info");
    }
}
