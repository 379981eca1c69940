//! Integration tests for query templating.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tsrow::error::{ErrorKind, QueryError, TsrowError};
use tsrow::{DatabaseName, MeasureSchema, Param, Schema, SchemaIndex, TableName, build_query};

#[test]
fn test_table_and_id() {
    let sql = build_query(
        "SELECT * FROM :t WHERE id = :id",
        [
            ("t", Param::from(TableName::from("x"))),
            ("id", Param::from(5)),
        ],
    )
    .unwrap();
    assert_eq!(sql, r#"SELECT * FROM "x" WHERE id = 5"#);
}

#[test]
fn test_query_built_from_schema_lookup() {
    let index = SchemaIndex::new(Schema::new().with(
        "inverter_metrics",
        "power",
        MeasureSchema::new(["actual_pv_power".to_string()]).with_dimensions(["site_id"]),
    ));
    let metric = "actual_pv_power".to_string();
    let table = index.table_for(&metric).unwrap();
    let measure = index.measure_for(&metric).unwrap();

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let sql = build_query(
        "SELECT time, :metric FROM :db.:table \
         WHERE measure_name = :measure AND time >= :start AND time > ago(:window)",
        vec![
            ("metric", Param::from(metric.as_str())),
            ("db", Param::from(DatabaseName::from("energy"))),
            ("table", Param::from(TableName::from(table))),
            ("measure", Param::from(measure)),
            ("start", Param::from(start)),
            ("window", Param::from(Duration::from_secs(15 * 60))),
        ],
    )
    .unwrap();

    assert_eq!(
        sql,
        "SELECT time, 'actual_pv_power' FROM \"energy\".\"inverter_metrics\" \
         WHERE measure_name = 'power' AND time >= from_unixtime(1704067200) AND time > ago(900s)"
    );
}

#[test]
fn test_json_bindings() {
    let bindings: Vec<(String, Param)> = [("site", json!("north")), ("limit", json!(10))]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Param::from(v)))
        .collect();

    let sql = build_query(
        "SELECT * FROM t WHERE site = :site LIMIT :limit",
        bindings,
    )
    .unwrap();
    assert_eq!(sql, "SELECT * FROM t WHERE site = 'north' LIMIT 10");
}

#[test]
fn test_absent_placeholder_fails() {
    let err = build_query(
        "SELECT * FROM my_table WHERE name = :name AND timestamp = :timestamp AND id = :id",
        [("bad_placeholder", Param::from("test"))],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);
    assert_eq!(
        err.to_string(),
        "query error: placeholder :bad_placeholder not found in query template"
    );
}

#[test]
fn test_structured_value_fails() {
    let err = build_query(
        "SELECT * FROM my_table WHERE name = :name AND id = :id",
        [
            ("name", Param::from("test")),
            ("id", Param::from(json!({"some": "value"}))),
        ],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TsrowError::Query(QueryError::UnsupportedParam { ref key, type_name: "object" }) if key == "id"
    ));
}
