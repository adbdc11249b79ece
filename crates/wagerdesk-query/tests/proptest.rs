//! Property-based tests for the report pipeline using proptest.

use proptest::prelude::*;
use wagerdesk_query::{
    aggregate, paginate, sort_by_all, FieldKind, Number, Op, PageSize, PageSpec, Query, Row,
    Schema, SortSpec, Value,
};

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    id: usize,
    amount: i64,
    group: u8,
}

impl Row for Entry {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::Number(Number::from(self.id)),
            "amount" => Value::Number(Number::I64(self.amount)),
            "group" => Value::Number(Number::I64(i64::from(self.group))),
            _ => Value::None,
        }
    }
}

fn schema() -> Schema {
    Schema::new("entries")
        .field("id", FieldKind::Number)
        .field("amount", FieldKind::Number)
        .field("group", FieldKind::Number)
        .searchable(["id"])
        .totals(["amount"])
}

// Amounts stay well inside the range f64 represents exactly, so sums are exact.
fn entries_strategy(max: usize) -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec((-1_000_000i64..1_000_000, 0u8..4), 0..max).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(id, (amount, group))| Entry { id, amount, group })
            .collect()
    })
}

fn page_size_strategy() -> impl Strategy<Value = PageSize> {
    prop::sample::select(PageSize::ALL.to_vec())
}

fn ids(rows: &[&Entry]) -> Vec<usize> {
    rows.iter().map(|e| e.id).collect()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// The first page holds min(page size, row count) rows.
    #[test]
    fn first_page_length(
        rows in entries_strategy(300),
        size in page_size_strategy(),
    ) {
        prop_assume!(!rows.is_empty());
        let page = paginate(&rows, PageSpec::first(size));
        prop_assert_eq!(page.items.len(), size.get().min(rows.len()));
        prop_assert_eq!(page.page_index, 1);
    }

    /// Sorting an already sorted collection changes nothing.
    #[test]
    fn sort_is_idempotent(
        rows in entries_strategy(100),
        descending in any::<bool>(),
    ) {
        let spec = if descending { SortSpec::desc("group") } else { SortSpec::asc("group") };
        let specs = [spec];

        let mut once: Vec<&Entry> = rows.iter().collect();
        sort_by_all(&mut once, &specs);
        let mut twice = once.clone();
        sort_by_all(&mut twice, &specs);

        prop_assert_eq!(ids(&once), ids(&twice));
    }

    /// Within a run of equal keys, both directions keep input order.
    #[test]
    fn sort_is_stable_both_ways(rows in entries_strategy(100)) {
        let mut asc: Vec<&Entry> = rows.iter().collect();
        sort_by_all(&mut asc, &[SortSpec::asc("group")]);
        let mut desc: Vec<&Entry> = rows.iter().collect();
        sort_by_all(&mut desc, &[SortSpec::desc("group")]);

        for group in 0u8..4 {
            let input: Vec<usize> = rows.iter().filter(|e| e.group == group).map(|e| e.id).collect();
            let in_asc: Vec<usize> = asc.iter().filter(|e| e.group == group).map(|e| e.id).collect();
            let in_desc: Vec<usize> = desc.iter().filter(|e| e.group == group).map(|e| e.id).collect();
            prop_assert_eq!(&in_asc, &input);
            prop_assert_eq!(&in_desc, &input);
        }

        for pair in asc.windows(2) {
            prop_assert!(pair[0].group <= pair[1].group);
        }
        for pair in desc.windows(2) {
            prop_assert!(pair[0].group >= pair[1].group);
        }
    }

    /// Totals over the filtered set equal the sum of per-page totals.
    #[test]
    fn totals_partition_over_pages(
        rows in entries_strategy(200),
        threshold in -1_000_000i64..1_000_000,
        size in page_size_strategy(),
    ) {
        let query = Query::new().and_gt("amount", threshold).page_size(size).build();
        let result = query.run(&rows, &schema());
        let whole = result.aggregates().get("amount").unwrap_or_default();

        let spec = PageSpec::first(size);
        let mut by_page = 0.0;
        for index in 1..=spec.total_pages(result.total_count()) {
            let page = paginate(result.all_rows(), spec.with_index(index));
            by_page += aggregate(page.items, &["amount"]).get("amount").unwrap_or_default();
        }

        prop_assert_eq!(whole, by_page);
    }

    /// Filtering never grows the collection, and every kept row passes.
    #[test]
    fn filter_never_grows_collection(
        rows in entries_strategy(100),
        threshold in -1_000_000i64..1_000_000,
        op in prop::sample::select(Op::ALL.to_vec()),
    ) {
        let result = Query::new().and("amount", op, threshold).run(&rows, &schema());
        prop_assert!(result.total_count() <= rows.len());

        for row in result.all_rows() {
            let ordering = row.amount.cmp(&threshold);
            prop_assert!(op.eval_ordering(ordering));
        }
    }

    /// A served page index is always within [1, total_pages].
    #[test]
    fn page_index_is_clamped(
        rows in entries_strategy(120),
        index in 0usize..50,
        size in page_size_strategy(),
    ) {
        let result = Query::new().page(PageSpec::new(size, index)).run(&rows, &schema());
        prop_assert!(result.page_index() >= 1);
        prop_assert!(result.page_index() <= result.total_pages());
        prop_assert!(result.items().len() <= size.get());
    }
}
