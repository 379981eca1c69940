//! # tsrow
//!
//! Annotation-driven mapping between application records and time-series
//! store rows.
//!
//! tsrow turns flat Rust structs into multi-measure wire records for a
//! time-series store, and populates structs back from query results. Which
//! field becomes the timestamp, the measure name, a dimension or a measure
//! value is declared with a short annotation on each field.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Field roles are declared once, next to the field, via [`record!`]
//! - Records are validated in full before any output is produced
//! - Unmarshalling never leaves a half-written destination behind
//! - No transport: the crate only builds and reads the wire shapes
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{DateTime, TimeZone, Utc};
//! use tsrow::wire::{ColumnInfo, QueryOutput, ScalarType};
//!
//! tsrow::record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct PowerReading {
//!         pub at: DateTime<Utc> => "timestamp",
//!         pub measure: String => "measure",
//!         pub site: String => "dimension,name=site_id",
//!         pub power: f64 => "attribute,name=actual_pv_power",
//!     }
//! }
//!
//! # fn main() -> tsrow::Result<()> {
//! let reading = PowerReading {
//!     at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//!     measure: "inverter".to_string(),
//!     site: "north".to_string(),
//!     power: 4.2,
//! };
//!
//! // Record -> wire record
//! let record = tsrow::marshal(&reading)?;
//! assert_eq!(record.time, "1704067200000");
//! assert_eq!(record.measure_values[0].value, "4.200000");
//!
//! // Query result -> record
//! tsrow::record! {
//!     #[derive(Debug, Default)]
//!     pub struct PowerRow {
//!         pub time: DateTime<Utc> => "time",
//!         pub power: f64 => "name=actual_pv_power",
//!     }
//! }
//!
//! let output = QueryOutput::new(
//!     vec![
//!         ColumnInfo::new("time", ScalarType::Timestamp),
//!         ColumnInfo::new("actual_pv_power", ScalarType::Double),
//!     ],
//!     vec![["2024-01-01 00:00:00.000000000", "4.2"].into_iter().collect()],
//! );
//! let mut rows: Vec<PowerRow> = Vec::new();
//! tsrow::unmarshal_all(&output, &mut rows)?;
//! assert_eq!(rows[0].power, 4.2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`marshal()`] / [`marshal_all`]: Records to wire records
//! - [`unmarshal()`] / [`unmarshal_all`]: Query results to records
//! - [`SchemaIndex`]: Metric → (table, measure) lookups
//! - [`build_query`]: `:name` placeholder substitution
//!
//! ## Modules
//!
//! - [`record`]: The [`Record`]/[`FromRow`] traits and the [`record!`] macro
//! - [`tag`]: Field annotation grammar
//! - [`value`]: Scalar value codec
//! - [`wire`]: Outbound records and inbound query results
//! - [`marshal`](mod@marshal): Record → wire record
//! - [`unmarshal`](mod@unmarshal): Query result → record
//! - [`schema`]: Schema description and index
//! - [`query`]: Query templating
//! - [`error`]: Error types

pub mod error;
pub mod marshal;
pub mod query;
pub mod record;
pub mod schema;
pub mod tag;
pub mod unmarshal;
pub mod value;
pub mod wire;

// Re-export primary API types at crate root for convenience.
pub use error::{ErrorKind, Result, TsrowError};
pub use marshal::{marshal, marshal_all};
pub use query::{build_query, DatabaseName, Param, TableName};
pub use record::{FromRow, Record};
pub use schema::{MeasureSchema, Schema, SchemaIndex};
pub use unmarshal::{unmarshal, unmarshal_all};
