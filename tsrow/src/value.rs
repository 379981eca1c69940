//! Scalar value codec.
//!
//! Converts between in-memory field values and their canonical wire strings.
//! The set of kinds is closed: strings, signed integers, floats and UTC
//! timestamps round-trip; booleans, unsigned integers and composite types are
//! recognised only so they can be rejected with a useful error.
//!
//! Outbound encoding per kind:
//!
//! | kind        | type tag    | encoding                                   |
//! |-------------|-------------|--------------------------------------------|
//! | string      | `VARCHAR`   | as-is, `"-"` when empty                    |
//! | integer     | `BIGINT`    | base 10                                    |
//! | float       | `DOUBLE`    | fixed point, 6 decimals                    |
//! | timestamp   | `TIMESTAMP` | epoch integer in `s` (default), `ms`, `ns` |
//!
//! Inbound timestamps use the store layout `YYYY-MM-DD HH:MM:SS.nnnnnnnnn`,
//! read as UTC.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{MarshalError, ValueError};
use crate::wire::{MeasureValue, MeasureValueType};

/// Placeholder written for an empty string attribute without `omitempty`.
pub const EMPTY_SENTINEL: &str = "-";

/// `chrono` format string of the store's timestamp column layout.
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Kind of a field's in-memory type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `String`.
    String,
    /// Signed integers.
    Int,
    /// `f32` and `f64`.
    Float,
    /// `DateTime<Utc>`.
    Timestamp,
    /// `bool`.
    Bool,
    /// Unsigned integers.
    Unsigned,
    /// Any structured type other than a timestamp.
    Composite,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Timestamp => "timestamp",
            Self::Bool => "bool",
            Self::Unsigned => "unsigned integer",
            Self::Composite => "composite",
        };
        f.write_str(name)
    }
}

/// Unit used when a timestamp attribute is written as an epoch integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    /// Whole seconds (the default).
    #[default]
    Seconds,
    /// Milliseconds.
    Milliseconds,
    /// Nanoseconds.
    Nanoseconds,
}

impl TimeUnit {
    /// Parses the `unit=` option value.
    pub fn parse(unit: &str) -> Option<Self> {
        match unit {
            "s" => Some(Self::Seconds),
            "ms" => Some(Self::Milliseconds),
            "ns" => Some(Self::Nanoseconds),
            _ => None,
        }
    }

    /// Returns the `unit=` spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
            Self::Nanoseconds => "ns",
        }
    }

    /// Converts `ts` to an epoch count in this unit.
    ///
    /// Returns `None` when nanoseconds overflow `i64` (outside 1677–2262).
    pub fn epoch(self, ts: &DateTime<Utc>) -> Option<i64> {
        match self {
            Self::Seconds => Some(ts.timestamp()),
            Self::Milliseconds => Some(ts.timestamp_millis()),
            Self::Nanoseconds => ts.timestamp_nanos_opt(),
        }
    }
}

/// Borrowed view of a field's current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// A string.
    String(&'a str),
    /// A signed integer, widened.
    Int(i64),
    /// A float, widened.
    Float(f64),
    /// A UTC timestamp.
    Timestamp(DateTime<Utc>),
    /// A value of a kind with no wire form.
    Unsupported(FieldKind),
}

impl FieldValue<'_> {
    /// Returns the kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::String(_) => FieldKind::String,
            Self::Int(_) => FieldKind::Int,
            Self::Float(_) => FieldKind::Float,
            Self::Timestamp(_) => FieldKind::Timestamp,
            Self::Unsupported(kind) => *kind,
        }
    }
}

/// A wire value parsed for a specific destination kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Parsed string.
    String(String),
    /// Parsed integer, already range-checked for the destination.
    Int(i64),
    /// Parsed float.
    Float(f64),
    /// Parsed timestamp.
    Timestamp(DateTime<Utc>),
}

/// A type that can appear as an annotated record field.
///
/// Decoding is split from storing so a whole row can be validated before
/// any field is written.
pub trait FieldType {
    /// Returns the current value.
    fn value(&self) -> FieldValue<'_>;

    /// Returns the kind of this field.
    fn kind(&self) -> FieldKind {
        self.value().kind()
    }

    /// Parses a non-null wire value for this field.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if `raw` does not parse for this kind or the
    /// kind cannot be populated from the wire.
    fn decode(&self, raw: &str) -> Result<Decoded, ValueError> {
        decode_kind(self.kind(), raw)
    }

    /// Stores a value previously produced by [`decode`](Self::decode).
    fn store(&mut self, decoded: Decoded);
}

/// Parses `raw` according to `kind`.
///
/// # Errors
///
/// Returns [`ValueError`] on a parse failure or for kinds that cannot be
/// read from the wire.
pub fn decode_kind(kind: FieldKind, raw: &str) -> Result<Decoded, ValueError> {
    match kind {
        FieldKind::String => Ok(Decoded::String(raw.to_string())),
        FieldKind::Int => parse_int(raw).map(Decoded::Int),
        FieldKind::Float => parse_float(raw).map(Decoded::Float),
        FieldKind::Timestamp => parse_timestamp(raw).map(Decoded::Timestamp),
        FieldKind::Bool | FieldKind::Unsigned | FieldKind::Composite => {
            Err(ValueError::UnhandledKind { kind })
        }
    }
}

/// Parses a base-10 signed integer.
///
/// # Errors
///
/// Returns [`ValueError::ParseInt`] if `raw` is not an `i64`.
pub fn parse_int(raw: &str) -> Result<i64, ValueError> {
    raw.parse::<i64>().map_err(|e| ValueError::ParseInt {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Parses a decimal float.
///
/// # Errors
///
/// Returns [`ValueError::ParseFloat`] if `raw` is not an `f64`.
pub fn parse_float(raw: &str) -> Result<f64, ValueError> {
    raw.parse::<f64>().map_err(|e| ValueError::ParseFloat {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Parses a timestamp in the store layout, as UTC.
///
/// # Errors
///
/// Returns [`ValueError::ParseTimestamp`] if `raw` does not match
/// [`TIMESTAMP_LAYOUT`].
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValueError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|e| ValueError::ParseTimestamp {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Formats a timestamp in the store layout.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_LAYOUT).to_string()
}

/// Formats a float as fixed point with six decimals.
pub fn format_double(value: f64) -> String {
    format!("{value:.6}")
}

/// Encodes an attribute field as a measure value.
///
/// `field` is the declared field name (for errors), `name` the resolved wire
/// name. Returns `Ok(None)` when the value is an empty string flagged
/// `omitempty`, meaning the attribute is dropped.
///
/// # Errors
///
/// Returns [`MarshalError`] for kinds with no wire form, an unknown `unit`,
/// or a timestamp that does not fit the unit.
pub fn encode_attribute(
    field: &str,
    name: &str,
    value: FieldValue<'_>,
    unit: Option<&str>,
    omit_empty: bool,
) -> Result<Option<MeasureValue>, MarshalError> {
    let (encoded, value_type) = match value {
        FieldValue::String("") if omit_empty => return Ok(None),
        FieldValue::String("") => (EMPTY_SENTINEL.to_string(), MeasureValueType::Varchar),
        FieldValue::String(s) => (s.to_string(), MeasureValueType::Varchar),
        FieldValue::Int(i) => (i.to_string(), MeasureValueType::Bigint),
        FieldValue::Float(f) => (format_double(f), MeasureValueType::Double),
        FieldValue::Timestamp(ts) => {
            let unit = match unit {
                None => TimeUnit::default(),
                Some(raw) => TimeUnit::parse(raw).ok_or_else(|| MarshalError::UnsupportedUnit {
                    field: field.to_string(),
                    unit: raw.to_string(),
                })?,
            };
            let epoch = unit
                .epoch(&ts)
                .ok_or_else(|| MarshalError::TimestampOutOfRange {
                    field: field.to_string(),
                    unit: unit.as_str(),
                })?;
            (epoch.to_string(), MeasureValueType::Timestamp)
        }
        FieldValue::Unsupported(kind) => {
            return Err(MarshalError::UnsupportedType {
                field: field.to_string(),
                kind,
            });
        }
    };

    Ok(Some(MeasureValue {
        name: name.to_string(),
        value: encoded,
        value_type,
    }))
}

impl FieldType for String {
    fn value(&self) -> FieldValue<'_> {
        FieldValue::String(self)
    }

    fn store(&mut self, decoded: Decoded) {
        if let Decoded::String(s) = decoded {
            *self = s;
        }
    }
}

macro_rules! signed_field {
    ($($t:ty),*) => {$(
        impl FieldType for $t {
            fn value(&self) -> FieldValue<'_> {
                FieldValue::Int(i64::from(*self))
            }

            fn decode(&self, raw: &str) -> Result<Decoded, ValueError> {
                let value = parse_int(raw)?;
                <$t>::try_from(value).map_err(|_| ValueError::OutOfRange {
                    value,
                    target: stringify!($t),
                })?;
                Ok(Decoded::Int(value))
            }

            fn store(&mut self, decoded: Decoded) {
                if let Decoded::Int(value) = decoded
                    && let Ok(value) = <$t>::try_from(value)
                {
                    *self = value;
                }
            }
        }
    )*};
}

signed_field!(i8, i16, i32);

impl FieldType for i64 {
    fn value(&self) -> FieldValue<'_> {
        FieldValue::Int(*self)
    }

    fn store(&mut self, decoded: Decoded) {
        if let Decoded::Int(value) = decoded {
            *self = value;
        }
    }
}

impl FieldType for isize {
    fn value(&self) -> FieldValue<'_> {
        // isize is at most 64 bits on every supported target.
        FieldValue::Int(*self as i64)
    }

    fn decode(&self, raw: &str) -> Result<Decoded, ValueError> {
        let value = parse_int(raw)?;
        isize::try_from(value).map_err(|_| ValueError::OutOfRange {
            value,
            target: "isize",
        })?;
        Ok(Decoded::Int(value))
    }

    fn store(&mut self, decoded: Decoded) {
        if let Decoded::Int(value) = decoded
            && let Ok(value) = isize::try_from(value)
        {
            *self = value;
        }
    }
}

impl FieldType for f64 {
    fn value(&self) -> FieldValue<'_> {
        FieldValue::Float(*self)
    }

    fn store(&mut self, decoded: Decoded) {
        if let Decoded::Float(value) = decoded {
            *self = value;
        }
    }
}

impl FieldType for f32 {
    fn value(&self) -> FieldValue<'_> {
        FieldValue::Float(f64::from(*self))
    }

    #[allow(clippy::cast_possible_truncation)] // narrowing is the point of an f32 field
    fn store(&mut self, decoded: Decoded) {
        if let Decoded::Float(value) = decoded {
            *self = value as f32;
        }
    }
}

impl FieldType for DateTime<Utc> {
    fn value(&self) -> FieldValue<'_> {
        FieldValue::Timestamp(*self)
    }

    fn store(&mut self, decoded: Decoded) {
        if let Decoded::Timestamp(ts) = decoded {
            *self = ts;
        }
    }
}

macro_rules! unsupported_field {
    ($kind:expr => $($t:ty),*) => {$(
        impl FieldType for $t {
            fn value(&self) -> FieldValue<'_> {
                FieldValue::Unsupported($kind)
            }

            fn store(&mut self, _decoded: Decoded) {}
        }
    )*};
}

unsupported_field!(FieldKind::Bool => bool);
unsupported_field!(FieldKind::Unsigned => u8, u16, u32, u64, usize);
unsupported_field!(FieldKind::Composite => Duration);

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap() + chrono::Duration::nanoseconds(5)
    }

    fn encode(value: FieldValue<'_>, unit: Option<&str>, omit_empty: bool) -> Option<MeasureValue> {
        encode_attribute("f", "f", value, unit, omit_empty).unwrap()
    }

    #[test]
    fn test_encode_scalars() {
        let mv = encode(FieldValue::String("66"), None, false).unwrap();
        assert_eq!((mv.value.as_str(), mv.value_type), ("66", MeasureValueType::Varchar));

        let mv = encode(FieldValue::Int(-123), None, false).unwrap();
        assert_eq!((mv.value.as_str(), mv.value_type), ("-123", MeasureValueType::Bigint));

        let mv = encode(FieldValue::Float(123.0), None, false).unwrap();
        assert_eq!((mv.value.as_str(), mv.value_type), ("123.000000", MeasureValueType::Double));

        let mv = encode(FieldValue::Float(0.1234567), None, false).unwrap();
        assert_eq!(mv.value, "0.123457");
    }

    #[test]
    fn test_empty_string_sentinel_and_omit() {
        let mv = encode(FieldValue::String(""), None, false).unwrap();
        assert_eq!(mv.value, EMPTY_SENTINEL);

        assert!(encode(FieldValue::String(""), None, true).is_none());

        // omitempty only drops empty strings
        let mv = encode(FieldValue::String("x"), None, true).unwrap();
        assert_eq!(mv.value, "x");
    }

    #[test]
    fn test_timestamp_units() {
        let ts = instant();
        let secs = encode(FieldValue::Timestamp(ts), None, false).unwrap();
        assert_eq!(secs.value, "1704067201");
        assert_eq!(secs.value_type, MeasureValueType::Timestamp);

        let s = encode(FieldValue::Timestamp(ts), Some("s"), false).unwrap();
        let ms = encode(FieldValue::Timestamp(ts), Some("ms"), false).unwrap();
        let ns = encode(FieldValue::Timestamp(ts), Some("ns"), false).unwrap();
        assert_eq!(s.value, "1704067201");
        assert_eq!(ms.value, "1704067201000");
        assert_eq!(ns.value, "1704067201000000005");

        let err = encode_attribute("t", "t", FieldValue::Timestamp(ts), Some("bad-unit"), false)
            .unwrap_err();
        assert!(matches!(err, MarshalError::UnsupportedUnit { unit, .. } if unit == "bad-unit"));
    }

    #[test]
    fn test_nanoseconds_out_of_range() {
        let far = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
        let err = encode_attribute("t", "t", FieldValue::Timestamp(far), Some("ns"), false)
            .unwrap_err();
        assert!(matches!(err, MarshalError::TimestampOutOfRange { unit: "ns", .. }));
    }

    #[test]
    fn test_unsupported_kinds_rejected() {
        for kind in [FieldKind::Bool, FieldKind::Unsigned, FieldKind::Composite] {
            let err = encode_attribute("f", "f", FieldValue::Unsupported(kind), None, false)
                .unwrap_err();
            assert!(matches!(err, MarshalError::UnsupportedType { kind: k, .. } if k == kind));
        }
    }

    #[test]
    fn test_timestamp_layout_round_trip() {
        let ts = instant();
        let text = format_timestamp(&ts);
        assert_eq!(text, "2024-01-01 00:00:01.000000005");
        assert_eq!(parse_timestamp(&text).unwrap(), ts);

        assert!(matches!(
            parse_timestamp("2024-01-01T00:00:01Z"),
            Err(ValueError::ParseTimestamp { .. })
        ));
    }

    #[test]
    fn test_decode_by_kind() {
        let mut n = 0i64;
        let decoded = n.decode("42").unwrap();
        n.store(decoded);
        assert_eq!(n, 42);
        assert!(matches!(n.decode("4.2"), Err(ValueError::ParseInt { .. })));

        let small = 0i8;
        assert!(matches!(
            small.decode("300"),
            Err(ValueError::OutOfRange { value: 300, target: "i8" })
        ));

        let mut word = 0isize;
        let decoded = word.decode("-17").unwrap();
        word.store(decoded);
        assert_eq!(word, -17);
        assert_eq!(word.value(), FieldValue::Int(-17));

        let mut f = 0.0f32;
        let decoded = f.decode("1.5").unwrap();
        f.store(decoded);
        assert!((f - 1.5).abs() < f32::EPSILON);

        let flag = false;
        assert!(matches!(
            flag.decode("true"),
            Err(ValueError::UnhandledKind { kind: FieldKind::Bool })
        ));
        assert!(matches!(
            Duration::ZERO.decode("1"),
            Err(ValueError::UnhandledKind { kind: FieldKind::Composite })
        ));
    }

    #[test]
    fn test_time_unit_parse() {
        assert_eq!(TimeUnit::parse("s"), Some(TimeUnit::Seconds));
        assert_eq!(TimeUnit::parse("ms"), Some(TimeUnit::Milliseconds));
        assert_eq!(TimeUnit::parse("ns"), Some(TimeUnit::Nanoseconds));
        assert_eq!(TimeUnit::parse("us"), None);
        assert_eq!(TimeUnit::default(), TimeUnit::Seconds);
    }
}
