//! Record → wire record marshalling.
//!
//! Each record is processed in two passes. The scan pass parses every
//! annotation, checks `omitempty` placement, field visibility and the
//! timestamp/measure values, and counts roles. Only when the record is known
//! to have exactly one timestamp and one measure field does the encode pass
//! build the [`wire::Record`].
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use tsrow::marshal::marshal;
//!
//! tsrow::record! {
//!     pub struct Generation {
//!         pub at: chrono::DateTime<Utc> => "timestamp",
//!         pub measure: String => "measure",
//!         pub site: String => "dimension,name=site_id",
//!         pub power: f64 => "attribute,name=power_kw",
//!     }
//! }
//!
//! let g = Generation {
//!     at: Utc.timestamp_opt(1_704_067_200, 0).unwrap(),
//!     measure: "solar".to_string(),
//!     site: "north".to_string(),
//!     power: 4.25,
//! };
//!
//! let record = marshal(&g).unwrap();
//! assert_eq!(record.time, "1704067200000");
//! assert_eq!(record.dimension("site_id"), Some("north"));
//! assert_eq!(record.measure_value("power_kw").unwrap().value, "4.250000");
//! ```

use chrono::{DateTime, Utc};

use crate::error::{MarshalError, RecordFailure, Result};
use crate::record::{Field, Record};
use crate::tag::{OutboundTag, Role};
use crate::value::{self, FieldKind, FieldValue};
use crate::wire::{self, Dimension, MeasureValueType};

/// Marshals a single record.
///
/// # Errors
///
/// Returns [`MarshalError`] if an annotation is malformed, the record does
/// not have exactly one timestamp and one measure field, a field has a kind
/// its role does not allow, or a value cannot be encoded.
pub fn marshal<R: Record + ?Sized>(record: &R) -> Result<wire::Record> {
    marshal_record(record).map_err(Into::into)
}

/// Marshals a sequence of records.
///
/// Every record is attempted. If any fail, a single
/// [`MarshalError::Batch`] listing every failure is returned and no records
/// are produced.
///
/// # Errors
///
/// Returns [`MarshalError::Batch`] if at least one record fails.
pub fn marshal_all<R: Record>(records: &[R]) -> Result<Vec<wire::Record>> {
    let mut out = Vec::with_capacity(records.len());
    let mut failures = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match marshal_record(record) {
            Ok(r) => out.push(r),
            Err(error) => failures.push(RecordFailure { index, error }),
        }
    }

    if failures.is_empty() {
        tracing::trace!(records = out.len(), "marshalled batch");
        return Ok(out);
    }

    tracing::debug!(
        total = records.len(),
        failed = failures.len(),
        "batch marshal rejected"
    );
    Err(MarshalError::Batch {
        total: records.len(),
        failures,
    }
    .into())
}

/// A field that passed the scan pass, with its annotation parsed.
struct Scanned<'a> {
    field: Field<'a>,
    tag: OutboundTag<'static>,
}

#[derive(Default)]
struct RoleCounts {
    timestamp: usize,
    measure: usize,
}

fn marshal_record<R: Record + ?Sized>(record: &R) -> std::result::Result<wire::Record, MarshalError> {
    let scanned = scan(record.fields())?;

    let mut time = None;
    let mut measure_name = None;
    let mut dimensions = Vec::new();
    let mut measure_values = Vec::new();

    for Scanned { field, tag } in &scanned {
        let wire_name = tag.wire_name(field.name);
        match tag.role {
            Role::Timestamp => {
                let ts = expect_timestamp(field)?;
                time = Some(ts.timestamp_millis().to_string());
            }
            Role::Measure => {
                measure_name = Some(expect_string(field, Role::Measure)?.to_string());
            }
            Role::Dimension => {
                dimensions.push(Dimension {
                    name: wire_name.to_string(),
                    value: expect_string(field, Role::Dimension)?.to_string(),
                });
            }
            Role::Attribute => {
                if let Some(mv) = value::encode_attribute(
                    field.name,
                    wire_name,
                    field.value.value(),
                    tag.unit,
                    tag.omit_empty,
                )? {
                    measure_values.push(mv);
                }
            }
        }
    }

    let time = time.ok_or(MarshalError::MissingRole {
        role: Role::Timestamp,
    })?;
    let measure_name = measure_name.ok_or(MarshalError::MissingRole {
        role: Role::Measure,
    })?;

    Ok(wire::Record {
        time,
        measure_name,
        measure_value_type: MeasureValueType::Multi,
        dimensions,
        measure_values,
    })
}

/// Validates every annotated field and the role cardinalities.
fn scan(fields: Vec<Field<'_>>) -> std::result::Result<Vec<Scanned<'_>>, MarshalError> {
    let mut counts = RoleCounts::default();
    let mut scanned = Vec::with_capacity(fields.len());

    for field in fields {
        let tag = OutboundTag::parse(field.name, field.tag)?;

        let kind = field.value.kind();
        if tag.omit_empty && kind != FieldKind::String {
            return Err(MarshalError::OmitEmptyOnNonString {
                field: field.name.to_string(),
                kind,
            });
        }

        match tag.role {
            Role::Timestamp => counts.timestamp += 1,
            Role::Measure => counts.measure += 1,
            Role::Dimension | Role::Attribute => {}
        }

        if !field.exported {
            return Err(MarshalError::FieldNotExported {
                field: field.name.to_string(),
            });
        }

        match tag.role {
            Role::Timestamp => {
                if expect_timestamp(&field)? == DateTime::<Utc>::default() {
                    return Err(MarshalError::ZeroTimestamp {
                        field: field.name.to_string(),
                    });
                }
            }
            Role::Measure => {
                if expect_string(&field, Role::Measure)?.is_empty() {
                    return Err(MarshalError::EmptyMeasureName {
                        field: field.name.to_string(),
                    });
                }
            }
            Role::Dimension | Role::Attribute => {}
        }

        scanned.push(Scanned { field, tag });
    }

    check_once(Role::Timestamp, counts.timestamp)?;
    check_once(Role::Measure, counts.measure)?;

    Ok(scanned)
}

fn check_once(role: Role, count: usize) -> std::result::Result<(), MarshalError> {
    match count {
        1 => Ok(()),
        0 => Err(MarshalError::MissingRole { role }),
        count => Err(MarshalError::DuplicateRole { role, count }),
    }
}

fn expect_timestamp(field: &Field<'_>) -> std::result::Result<DateTime<Utc>, MarshalError> {
    match field.value.value() {
        FieldValue::Timestamp(ts) => Ok(ts),
        other => Err(MarshalError::RoleKindMismatch {
            field: field.name.to_string(),
            role: Role::Timestamp,
            expected: FieldKind::Timestamp,
            found: other.kind(),
        }),
    }
}

fn expect_string<'a>(
    field: &Field<'a>,
    role: Role,
) -> std::result::Result<&'a str, MarshalError> {
    match field.value.value() {
        FieldValue::String(s) => Ok(s),
        other => Err(MarshalError::RoleKindMismatch {
            field: field.name.to_string(),
            role,
            expected: FieldKind::String,
            found: other.kind(),
        }),
    }
}
