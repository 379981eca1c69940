//! Query result → record unmarshalling.
//!
//! Columns are matched to fields by name through the inbound annotation
//! (`time`, `timestamp`, `name=<column>`, or `-` to skip). A null value leaves
//! its field at whatever the destination record holds: the existing value for
//! [`unmarshal`], the `Default` value for every element built by
//! [`unmarshal_all`].
//!
//! Nothing is written until the whole input has been decoded: a row that
//! fails part way never leaves a half-populated record behind, and a failing
//! row in a sequence leaves every element of the destination as it was.

use std::collections::HashMap;

use crate::error::{Result, UnmarshalError};
use crate::record::{FieldMut, FromRow};
use crate::tag::InboundTag;
use crate::value::Decoded;
use crate::wire::{QueryOutput, Row};

/// Values decoded for one row, keyed by field position.
type RowPlan = Vec<(usize, Decoded)>;

/// Populates a single record from a query result.
///
/// A result with no rows leaves `dest` untouched.
///
/// # Errors
///
/// Returns [`UnmarshalError`] if `output` is `None`, a row is malformed, the
/// result has more than one row, a field names an unknown column, or a value
/// cannot be parsed for its field.
pub fn unmarshal<'o, R: FromRow + ?Sized>(
    output: impl Into<Option<&'o QueryOutput>>,
    dest: &mut R,
) -> Result<()> {
    let output = validate(output.into())?;

    match output.rows.as_slice() {
        [] => {
            tracing::trace!("empty result, destination left unchanged");
            Ok(())
        }
        [row] => {
            let columns = column_index(output);
            let plan = plan_row(&columns, row, &dest.fields_mut())?;
            apply(dest.fields_mut(), plan);
            Ok(())
        }
        rows => Err(UnmarshalError::TooManyRows { rows: rows.len() }.into()),
    }
}

/// Populates a sequence of records from a query result, one per row.
///
/// Every element is built from `R::default()` and populated from its row, so
/// null, skipped and unannotated fields hold their default values. A
/// non-empty `dest` must already hold exactly one record per row; its
/// elements are replaced, not merged into.
///
/// # Errors
///
/// Returns [`UnmarshalError`] if `output` is `None`, a row is malformed, a
/// non-empty `dest` has the wrong length, or any row fails to decode. On error
/// `dest` is unchanged.
pub fn unmarshal_all<'o, R: FromRow + Default>(
    output: impl Into<Option<&'o QueryOutput>>,
    dest: &mut Vec<R>,
) -> Result<()> {
    let output = validate(output.into())?;
    let rows = &output.rows;

    if !dest.is_empty() && dest.len() != rows.len() {
        return Err(UnmarshalError::LengthMismatch {
            expected: dest.len(),
            actual: rows.len(),
        }
        .into());
    }

    let columns = column_index(output);

    let mut staged = Vec::with_capacity(rows.len());
    for row in rows {
        let mut record = R::default();
        let plan = plan_row(&columns, row, &record.fields_mut())?;
        apply(record.fields_mut(), plan);
        staged.push(record);
    }
    *dest = staged;

    tracing::trace!(
        rows = rows.len(),
        columns = output.column_info.len(),
        "unmarshalled result"
    );
    Ok(())
}

/// Checks that the result is present and every row is column-aligned.
fn validate(output: Option<&QueryOutput>) -> std::result::Result<&QueryOutput, UnmarshalError> {
    let output = output.ok_or(UnmarshalError::MissingOutput)?;
    let expected = output.column_info.len();

    for (row, r) in output.rows.iter().enumerate() {
        if r.data.len() != expected {
            return Err(UnmarshalError::RowLength {
                row,
                expected,
                actual: r.data.len(),
            });
        }
    }

    Ok(output)
}

fn column_index(output: &QueryOutput) -> HashMap<&str, usize> {
    output
        .column_info
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), i))
        .collect()
}

/// Decodes every mapped, non-null value of `row` without writing anything.
fn plan_row(
    columns: &HashMap<&str, usize>,
    row: &Row,
    fields: &[FieldMut<'_>],
) -> std::result::Result<RowPlan, UnmarshalError> {
    let mut plan = Vec::new();

    for (position, field) in fields.iter().enumerate() {
        let column = match InboundTag::parse(field.name, field.tag)? {
            InboundTag::Skip => continue,
            InboundTag::Column(column) => column,
        };

        let index = *columns
            .get(column)
            .ok_or_else(|| UnmarshalError::UnknownColumn {
                field: field.name.to_string(),
                column: column.to_string(),
            })?;

        let Some(raw) = row.data.get(index).and_then(|d| d.scalar_value.as_deref()) else {
            continue;
        };

        let decoded = field
            .value
            .decode(raw)
            .map_err(|source| UnmarshalError::Value {
                field: field.name.to_string(),
                column: column.to_string(),
                source,
            })?;
        plan.push((position, decoded));
    }

    Ok(plan)
}

fn apply(mut fields: Vec<FieldMut<'_>>, plan: RowPlan) {
    for (position, decoded) in plan {
        if let Some(field) = fields.get_mut(position) {
            field.value.store(decoded);
        }
    }
}
