//! Integration tests for unmarshalling query results, including round trips
//! through the marshaller.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tsrow::error::{ErrorKind, TsrowError, UnmarshalError};
use tsrow::value::format_timestamp;
use tsrow::wire::{ColumnInfo, Datum, QueryOutput, Row, ScalarType};
use tsrow::{marshal, unmarshal, unmarshal_all};

tsrow::record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct BatteryReading {
        pub at: DateTime<Utc> => "timestamp",
        pub measure: String => "measure",
        pub site: String => "dimension,name=site_id",
        pub soc: f64 => "attribute,name=state_of_charge",
        pub cycles: i32 => "attribute,name=cycles",
        pub vendor: String => "attribute,name=vendor",
    }
}

tsrow::record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct BatteryRow {
        pub time: DateTime<Utc> => "time",
        pub measure: String => "name=measure_name",
        pub site: String => "name=site_id",
        pub soc: f64 => "name=state_of_charge",
        pub cycles: i32 => "name=cycles",
        pub vendor: String => "name=vendor",
        pub cached: String => "-",
    }
}

fn columns() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo::new("time", ScalarType::Timestamp),
        ColumnInfo::new("measure_name", ScalarType::Varchar),
        ColumnInfo::new("site_id", ScalarType::Varchar),
        ColumnInfo::new("state_of_charge", ScalarType::Double),
        ColumnInfo::new("cycles", ScalarType::Bigint),
        ColumnInfo::new("vendor", ScalarType::Varchar),
    ]
}

/// Builds the result row the store would return for a marshalled record.
fn row_for(record: &tsrow::wire::Record) -> Row {
    let millis: i64 = record.time.parse().unwrap();
    let time = DateTime::<Utc>::from_timestamp_millis(millis).unwrap();

    let mut data = vec![
        Datum::from(format_timestamp(&time).as_str()),
        Datum::from(record.measure_name.as_str()),
        Datum::from(record.dimension("site_id")),
    ];
    for name in ["state_of_charge", "cycles", "vendor"] {
        data.push(Datum::from(
            record.measure_value(name).map(|mv| mv.value.as_str()),
        ));
    }
    Row { data }
}

fn reading(i: i32) -> BatteryReading {
    BatteryReading {
        at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(i64::from(i)),
        measure: "battery".to_string(),
        site: format!("site_{i}"),
        soc: 0.1 * f64::from(i) + 0.123_456_7,
        cycles: 100 + i,
        vendor: "acme".to_string(),
    }
}

#[test]
fn test_round_trip_sequence() {
    let originals: Vec<_> = (0..5).map(reading).collect();
    let records = tsrow::marshal_all(&originals).unwrap();
    let output = QueryOutput::new(columns(), records.iter().map(row_for).collect());

    let mut rows: Vec<BatteryRow> = Vec::new();
    unmarshal_all(&output, &mut rows).unwrap();

    assert_eq!(rows.len(), originals.len());
    for (row, original) in rows.iter().zip(&originals) {
        assert_eq!(row.time, original.at);
        assert_eq!(row.measure, original.measure);
        assert_eq!(row.site, original.site);
        assert!((row.soc - original.soc).abs() < 1e-6, "{} vs {}", row.soc, original.soc);
        assert_eq!(row.cycles, original.cycles);
        assert_eq!(row.vendor, original.vendor);
        assert!(row.cached.is_empty());
    }
}

#[test]
fn test_round_trip_single_record() {
    let original = reading(3);
    let record = marshal(&original).unwrap();
    let output = QueryOutput::new(columns(), vec![row_for(&record)]);

    let mut row = BatteryRow::default();
    unmarshal(&output, &mut row).unwrap();
    assert_eq!(row.site, "site_3");
    assert_eq!(row.cycles, 103);
}

#[test]
fn test_result_from_store_json() {
    let output: QueryOutput = serde_json::from_str(
        r#"{
            "columnInfo": [
                {"name": "time", "scalarType": "TIMESTAMP"},
                {"name": "site_id", "scalarType": "VARCHAR"},
                {"name": "state_of_charge", "scalarType": "DOUBLE"}
            ],
            "rows": [
                {"data": [
                    {"scalarValue": "2024-06-01 12:00:00.500000000"},
                    {"scalarValue": "north"},
                    {"nullValue": true}
                ]}
            ]
        }"#,
    )
    .unwrap();

    tsrow::record! {
        #[derive(Debug, Default)]
        pub struct Partial {
            pub time: DateTime<Utc> => "time",
            pub site: String => "name=site_id",
            pub soc: f64 => "name=state_of_charge",
        }
    }

    let mut partial = Partial {
        soc: 0.75,
        ..Partial::default()
    };
    unmarshal(&output, &mut partial).unwrap();

    assert_eq!(
        partial.time,
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::milliseconds(500)
    );
    assert_eq!(partial.site, "north");
    // Null leaves the existing value.
    assert_eq!(partial.soc, 0.75);
}

#[test]
fn test_single_destination_cardinality() {
    let records = tsrow::marshal_all(&[reading(1), reading(2)]).unwrap();
    let two_rows = QueryOutput::new(columns(), records.iter().map(row_for).collect());

    let mut row = BatteryRow::default();
    let err = unmarshal(&two_rows, &mut row).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cardinality);
    assert_eq!(row, BatteryRow::default());

    let mut kept = BatteryRow {
        site: "kept".to_string(),
        cycles: 9,
        ..BatteryRow::default()
    };
    let before = kept.clone();
    unmarshal(&QueryOutput::new(columns(), Vec::new()), &mut kept).unwrap();
    assert_eq!(kept, before);
}

#[test]
fn test_presized_sequence_must_match() {
    let records = tsrow::marshal_all(&[reading(1), reading(2), reading(3)]).unwrap();
    let output = QueryOutput::new(columns(), records.iter().map(row_for).collect());

    let mut rows = vec![BatteryRow::default(); 2];
    let err = unmarshal_all(&output, &mut rows).unwrap_err();
    assert!(matches!(
        err,
        TsrowError::Unmarshal(UnmarshalError::LengthMismatch {
            expected: 2,
            actual: 3
        })
    ));

    let mut rows = vec![BatteryRow::default(); 3];
    unmarshal_all(&output, &mut rows).unwrap();
    assert_eq!(rows[2].site, "site_3");
}

#[test]
fn test_null_output_is_shape_error() {
    let mut rows: Vec<BatteryRow> = Vec::new();
    let err = unmarshal_all(None::<&QueryOutput>, &mut rows).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[test]
fn test_failing_row_keeps_sequence_intact() {
    let records = tsrow::marshal_all(&[reading(1), reading(2)]).unwrap();
    let mut result_rows: Vec<Row> = records.iter().map(row_for).collect();
    // cycles column of the second row no longer parses as an integer.
    result_rows[1].data[4] = Datum::from("many");
    let output = QueryOutput::new(columns(), result_rows);

    let mut rows = vec![
        BatteryRow {
            vendor: "before".to_string(),
            ..BatteryRow::default()
        },
        BatteryRow::default(),
    ];
    let before = rows.clone();

    let err = unmarshal_all(&output, &mut rows).unwrap_err();
    assert!(matches!(
        err,
        TsrowError::Unmarshal(UnmarshalError::Value { ref column, .. }) if column == "cycles"
    ));
    assert_eq!(rows, before);
}
