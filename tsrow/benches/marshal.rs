//! Microbenchmarks for the marshal and unmarshal paths.
//!
//! Run with: `cargo bench -p tsrow -- marshal`

#![allow(
    missing_docs,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tsrow::wire::{ColumnInfo, QueryOutput, Row, ScalarType};

tsrow::record! {
    #[derive(Debug, Clone, Default)]
    pub struct InverterReading {
        pub at: DateTime<Utc> => "timestamp",
        pub measure: String => "measure",
        pub site: String => "dimension,name=site_id",
        pub device: String => "dimension,name=device_id",
        pub power: f64 => "attribute,name=actual_pv_power",
        pub reactive: f64 => "attribute,name=reactive_power",
        pub state: i32 => "attribute,name=state",
        pub note: String => "attribute,name=note,omitempty",
    }
}

tsrow::record! {
    #[derive(Debug, Clone, Default)]
    pub struct InverterRow {
        pub time: DateTime<Utc> => "time",
        pub site: String => "name=site_id",
        pub power: f64 => "name=actual_pv_power",
        pub state: i32 => "name=state",
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn readings(count: usize) -> Vec<InverterReading> {
    (0..count)
        .map(|i| InverterReading {
            at: base_time() + Duration::seconds(i as i64 + 1),
            measure: "inverter".to_string(),
            site: format!("site_{}", i % 8),
            device: format!("device_{i}"),
            power: i as f64 * 0.5,
            reactive: 1.25,
            state: (i % 4) as i32,
            note: String::new(),
        })
        .collect()
}

fn query_output(count: usize) -> QueryOutput {
    let rows: Vec<Row> = (0..count)
        .map(|i| {
            let time = tsrow::value::format_timestamp(&(base_time() + Duration::seconds(i as i64)));
            let site = format!("site_{}", i % 8);
            let power = format!("{:.6}", i as f64 * 0.5);
            let state = (i % 4).to_string();
            [time.as_str(), site.as_str(), power.as_str(), state.as_str()]
                .into_iter()
                .collect()
        })
        .collect();

    QueryOutput::new(
        vec![
            ColumnInfo::new("time", ScalarType::Timestamp),
            ColumnInfo::new("site_id", ScalarType::Varchar),
            ColumnInfo::new("actual_pv_power", ScalarType::Double),
            ColumnInfo::new("state", ScalarType::Integer),
        ],
        rows,
    )
}

fn bench_marshal_single(c: &mut Criterion) {
    let reading = readings(1).remove(0);

    c.bench_function("marshal/single_record", |b| {
        b.iter(|| tsrow::marshal(black_box(&reading)).unwrap());
    });
}

fn bench_marshal_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("marshal/batch_size");

    for count in [1, 10, 100, 1000] {
        let batch = readings(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &batch, |b, batch| {
            b.iter(|| tsrow::marshal_all(black_box(batch)).unwrap());
        });
    }

    group.finish();
}

fn bench_unmarshal_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("unmarshal/row_count");

    for count in [1, 10, 100, 1000] {
        let output = query_output(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &output, |b, output| {
            b.iter(|| {
                let mut rows: Vec<InverterRow> = Vec::new();
                tsrow::unmarshal_all(black_box(output), &mut rows).unwrap();
                rows
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_marshal_single,
    bench_marshal_batch,
    bench_unmarshal_rows
);
criterion_main!(benches);
