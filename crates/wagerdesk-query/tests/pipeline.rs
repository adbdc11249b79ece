//! End-to-end scenarios over the report pipeline.

use chrono::NaiveDate;
use serde_json::json;
use wagerdesk_query::{
    normalize_time_fragment, ConditionSet, FieldKind, FilterCondition, Op, PageSize, Query,
    QueryError, Record, Scalar, Schema, SortSpec, TimeRange,
};

fn users_schema() -> Schema {
    Schema::new("users")
        .field("id", FieldKind::Number)
        .field("login", FieldKind::Text)
        .field("deposit", FieldKind::Number)
        .field("registered_at", FieldKind::DateTime)
        .searchable(["id", "login"])
        .timestamp("registered_at")
        .totals(["deposit"])
}

fn users(json: serde_json::Value) -> Vec<Record> {
    Record::load_all(&users_schema(), &json).unwrap()
}

fn ids(rows: &[&Record]) -> Vec<i64> {
    rows.iter()
        .map(|r| match r.get("id") {
            Some(Scalar::Number(n)) => n.to_f64() as i64,
            other => panic!("row without numeric id: {other:?}"),
        })
        .collect()
}

#[test]
fn deposit_filter_and_total() {
    let rows = users(json!([
        { "id": 1, "login": "a", "deposit": 100, "registered_at": null },
        { "id": 2, "login": "b", "deposit": 50, "registered_at": null },
        { "id": 3, "login": "c", "deposit": 200, "registered_at": null }
    ]));

    let condition: FilterCondition = serde_json::from_value(json!({
        "field": "deposit",
        "operator": "greater_than",
        "value": 60
    }))
    .unwrap();

    let result = Query::new()
        .condition(condition)
        .build()
        .try_run(&rows, &users_schema())
        .unwrap();

    assert_eq!(ids(result.items()), [1, 3]);
    assert_eq!(result.aggregates().get("deposit"), Some(300.0));
}

#[test]
fn page_past_the_end_serves_last_page() {
    let raw: Vec<_> = (1..=25)
        .map(|i| json!({ "id": i, "login": format!("u{i}"), "deposit": i, "registered_at": null }))
        .collect();
    let rows = users(serde_json::Value::Array(raw));

    let result = Query::new()
        .page_size(PageSize::Ten)
        .page_index(4)
        .run(&rows, &users_schema());

    assert_eq!(result.total_pages(), 3);
    assert_eq!(result.page_index(), 3);
    assert_eq!(ids(result.items()), [21, 22, 23, 24, 25]);
}

#[test]
fn empty_rows_yield_one_empty_page_and_zero_totals() {
    let rows: Vec<Record> = Vec::new();
    let result = Query::new()
        .search("vip")
        .and_gt("deposit", 10)
        .order_desc("deposit")
        .page_index(7)
        .run(&rows, &users_schema());

    assert!(result.items().is_empty());
    assert_eq!(result.total_pages(), 1);
    assert_eq!(result.page_index(), 1);
    assert!(result.aggregates().iter().all(|(_, total)| total == 0.0));
    assert_eq!(result.aggregates().len(), 1);
}

#[test]
fn time_fragments_normalize() {
    assert_eq!(normalize_time_fragment("235959"), "23:59:59");
    assert_eq!(normalize_time_fragment("12"), "12");
    assert_eq!(normalize_time_fragment("abc123"), "12");
}

#[test]
fn report_builder_flow() {
    let rows = users(json!([
        { "id": 1, "login": "vip_anna", "deposit": 500, "registered_at": "2024-03-01 08:00:00" },
        { "id": 2, "login": "boris", "deposit": 20, "registered_at": "2024-03-02 09:00:00" },
        { "id": 3, "login": "VIP_chen", "deposit": 150, "registered_at": "2024-03-03 23:30:00" },
        { "id": 4, "login": "vip_dina", "deposit": 90, "registered_at": "2024-04-10 12:00:00" }
    ]));

    let range = TimeRange::from_inputs(
        NaiveDate::from_ymd_opt(2024, 3, 1),
        "",
        NaiveDate::from_ymd_opt(2024, 3, 31),
        "235959",
    );

    let mut conditions = ConditionSet::new();
    conditions.push("deposit>100".parse().unwrap());
    conditions.push(FilterCondition::new("deposit", Op::LessThan, 400).aggregate_only());

    let sort = SortSpec::toggle(None, "deposit");
    let sort = SortSpec::toggle(Some(&sort), "deposit");

    let result = Query::new()
        .search("vip")
        .between(range)
        .conditions(conditions)
        .sort(Some(sort))
        .build()
        .try_run(&rows, &users_schema())
        .unwrap();

    assert_eq!(ids(result.items()), [1, 3]);
    assert_eq!(result.aggregates().get("deposit"), Some(150.0));
}

#[test]
fn unknown_field_is_rejected_before_running() {
    let rows: Vec<Record> = Vec::new();
    let err = Query::new()
        .and_eq("nickname", "x")
        .build()
        .try_run(&rows, &users_schema())
        .unwrap_err();

    assert!(matches!(err, QueryError::UnknownField { ref field, .. } if field == "nickname"));
}
