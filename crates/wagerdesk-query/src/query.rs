//! Query builder and executor.
//!
//! A [`Query`] carries everything a report table lets the user change:
//! search text, date range, filter conditions, sort and page. Running it
//! over a row collection yields a [`QueryResult`] with the page to render
//! and totals over every row that passed the filters.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

use crate::aggregate::{aggregate, Aggregates};
use crate::condition::{ConditionSet, FilterCondition, Operand};
use crate::error::Result;
use crate::op::Op;
use crate::ordering::{sort_by_all, Dir, SortSpec};
use crate::page::{paginate, PageSize, PageSpec};
use crate::row::Row;
use crate::schema::Schema;
use crate::time::TimeRange;

/// A report query.
///
/// Rows pass the query when they match the search text (if any), fall in
/// the date range (if bounded) and satisfy every display-scoped condition.
/// Totals-scoped conditions further narrow which of those rows feed the
/// totals row, without hiding anything from the table.
///
/// # Example
///
/// ```
/// use wagerdesk_query::{FieldKind, PageSize, Query, Schema};
///
/// let schema = Schema::new("users")
///     .field("login", FieldKind::Text)
///     .field("deposit", FieldKind::Number)
///     .searchable(["login"])
///     .totals(["deposit"]);
///
/// let query = Query::new()
///     .search("vip")
///     .and_gt("deposit", 60)
///     .order_desc("deposit")
///     .page_size(PageSize::Twenty)
///     .build();
///
/// query.validate(&schema).unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    search: Option<String>,
    time_range: TimeRange,
    conditions: ConditionSet,
    sorts: Vec<SortSpec>,
    page: PageSpec,
}

impl Query {
    /// Creates a new empty query.
    ///
    /// An empty query matches all rows and serves the first page of ten.
    pub fn new() -> Self {
        Query::default()
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Sets the search text. Blank text clears the search.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
        self
    }

    /// Sets the date range.
    pub fn between(mut self, range: TimeRange) -> Self {
        self.time_range = range;
        self
    }

    /// Adds a condition at the end of the set.
    pub fn condition(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Replaces the whole condition set.
    pub fn conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = conditions;
        self
    }

    /// Adds a display-scoped condition.
    pub fn and(self, field: &str, op: Op, value: impl Into<Operand>) -> Self {
        self.condition(FilterCondition::new(field, op, value))
    }

    /// Adds a display-scoped greater-than condition.
    pub fn and_gt(self, field: &str, value: impl Into<Operand>) -> Self {
        self.and(field, Op::GreaterThan, value)
    }

    /// Adds a display-scoped less-than condition.
    pub fn and_lt(self, field: &str, value: impl Into<Operand>) -> Self {
        self.and(field, Op::LessThan, value)
    }

    /// Adds a display-scoped equality condition.
    pub fn and_eq(self, field: &str, value: impl Into<Operand>) -> Self {
        self.and(field, Op::EqualTo, value)
    }

    /// Adds a condition that only narrows the totals row.
    pub fn totals_where(self, field: &str, op: Op, value: impl Into<Operand>) -> Self {
        self.condition(FilterCondition::new(field, op, value).aggregate_only())
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Adds a sort key. The first key added is the primary one.
    pub fn order_by(mut self, key: &str, dir: Dir) -> Self {
        self.sorts.push(SortSpec::new(key, dir));
        self
    }

    /// Adds an ascending sort key.
    pub fn order_asc(self, key: &str) -> Self {
        self.order_by(key, Dir::Asc)
    }

    /// Adds a descending sort key.
    pub fn order_desc(self, key: &str) -> Self {
        self.order_by(key, Dir::Desc)
    }

    /// Replaces the sort with a single spec, or clears it.
    pub fn sort(mut self, spec: Option<SortSpec>) -> Self {
        self.sorts = spec.into_iter().collect();
        self
    }

    // ========================================================================
    // Paging
    // ========================================================================

    /// Sets the page spec.
    pub fn page(mut self, page: PageSpec) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size and returns to the first page.
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.page = self.page.with_size(size);
        self
    }

    /// Sets the 1-based page index. Clamped when the query runs.
    pub fn page_index(mut self, index: usize) -> Self {
        self.page = self.page.with_index(index);
        self
    }

    /// Finalizes the query (for API symmetry; returns self).
    pub fn build(self) -> Self {
        self
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn get_search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    pub fn get_conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn sorts(&self) -> &[SortSpec] {
        &self.sorts
    }

    pub fn get_page(&self) -> PageSpec {
        self.page
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Checks every condition field and sort key against the schema.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for condition in &self.conditions {
            schema.validate_field(&condition.field)?;
        }
        for spec in &self.sorts {
            schema.validate_field(&spec.key)?;
        }
        Ok(())
    }

    /// Validates against the schema, then runs.
    pub fn try_run<'a, T: Row>(&self, rows: &'a [T], schema: &Schema) -> Result<QueryResult<'a, T>> {
        self.validate(schema)?;
        Ok(self.run(rows, schema))
    }

    /// Runs the full pipeline: filter, sort, total, paginate.
    ///
    /// Never fails. Fields the schema does not declare simply read as
    /// missing; use [`validate`](Self::validate) to reject them up front.
    pub fn run<'a, T: Row>(&self, rows: &'a [T], schema: &Schema) -> QueryResult<'a, T> {
        let mut filtered = evaluate(
            rows,
            schema,
            self.search.as_deref(),
            &self.time_range,
            &self.conditions,
        );
        sort_by_all(&mut filtered, &self.sorts);

        let counted: Vec<&T> = filtered
            .iter()
            .copied()
            .filter(|row| self.conditions.matches_aggregate(*row))
            .collect();
        let aggregates = aggregate(&counted, &schema.total_fields);

        let page = self.page.clamp(filtered.len());
        let total_pages = page.total_pages(filtered.len());
        debug!(
            report = %schema.name,
            input = rows.len(),
            matched = filtered.len(),
            totalled = counted.len(),
            page = page.index,
            total_pages,
            "query evaluated"
        );

        QueryResult {
            rows: filtered,
            page,
            total_pages,
            aggregates,
        }
    }
}

/// Applies search, date range and display-scoped conditions.
///
/// Output keeps the input order. The search is a case-insensitive substring
/// match over the schema's search fields; the date range reads the schema's
/// timestamp field.
pub fn evaluate<'a, T: Row>(
    rows: &'a [T],
    schema: &Schema,
    search: Option<&str>,
    range: &TimeRange,
    conditions: &ConditionSet,
) -> Vec<&'a T> {
    let needle = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let timestamp_field = schema.timestamp_field.as_deref();

    rows.iter()
        .filter(|row| match &needle {
            Some(needle) => matches_search(*row, &schema.search_fields, needle),
            None => true,
        })
        .filter(|row| {
            if range.is_unbounded() {
                return true;
            }
            match timestamp_field {
                Some(field) => range.contains(&row.field_value(field)),
                None => false,
            }
        })
        .filter(|row| conditions.matches_display(*row))
        .collect()
}

fn matches_search<T: Row>(row: &T, fields: &[String], needle: &str) -> bool {
    fields.iter().any(|field| {
        let value = row.field_value(field);
        !value.is_none() && value.to_text().to_lowercase().contains(needle)
    })
}

/// Output of [`Query::run`].
#[derive(Debug, Clone)]
pub struct QueryResult<'a, T> {
    rows: Vec<&'a T>,
    page: PageSpec,
    total_pages: usize,
    aggregates: Aggregates,
}

impl<'a, T> QueryResult<'a, T> {
    /// Rows on the served page.
    pub fn items(&self) -> &[&'a T] {
        paginate(&self.rows, self.page).items
    }

    /// Every row that passed the filters, sorted.
    pub fn all_rows(&self) -> &[&'a T] {
        &self.rows
    }

    /// Number of rows that passed the filters.
    pub fn total_count(&self) -> usize {
        self.rows.len()
    }

    /// The page index actually served, after clamping.
    pub fn page_index(&self) -> usize {
        self.page.index
    }

    pub fn page_size(&self) -> PageSize {
        self.page.size
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Totals over every filtered row, not just the served page.
    pub fn aggregates(&self) -> &Aggregates {
        &self.aggregates
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: Serialize> Serialize for QueryResult<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("QueryResult", 6)?;
        state.serialize_field("items", self.items())?;
        state.serialize_field("page_index", &self.page_index())?;
        state.serialize_field("page_size", &self.page_size())?;
        state.serialize_field("total_pages", &self.total_pages)?;
        state.serialize_field("total_count", &self.total_count())?;
        state.serialize_field("aggregates", &self.aggregates)?;
        state.end()
    }
}
