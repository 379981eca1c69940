//! Error types for tsrow.
//!
//! Every module has its own error enum; [`TsrowError`] wraps them all so the
//! public functions can share one [`Result`] alias. Each enum also exposes a
//! [`kind`](TsrowError::kind) so callers can tell a bad input shape from a
//! bad field value or a lookup miss without matching every variant.

use std::fmt;

use thiserror::Error;

use crate::tag::Role;
use crate::value::FieldKind;

/// Coarse classification of a failure.
///
/// Useful when deciding whether to fix the input, fix the data, or retry
/// with a different lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The source or destination is not a usable record or sequence.
    Shape,
    /// Wrong number of rows, values, or role-bearing fields.
    Cardinality,
    /// A field or parameter has a kind that the operation does not support.
    Type,
    /// A value could not be parsed or encoded.
    Format,
    /// A column, placeholder, or metric name was not found.
    Lookup,
    /// Reading a configuration file failed.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shape => "shape",
            Self::Cardinality => "cardinality",
            Self::Type => "type",
            Self::Format => "format",
            Self::Lookup => "lookup",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

/// The main error type for all tsrow operations.
#[derive(Error, Debug)]
pub enum TsrowError {
    /// Error marshalling records into wire records.
    #[error("marshal error: {0}")]
    Marshal(#[from] MarshalError),

    /// Error unmarshalling a query result into records.
    #[error("unmarshal error: {0}")]
    Unmarshal(#[from] UnmarshalError),

    /// Error rendering a query template.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Error building or reading a schema index.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl TsrowError {
    /// Returns the classification of the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Marshal(e) => e.kind(),
            Self::Unmarshal(e) => e.kind(),
            Self::Query(e) => e.kind(),
            Self::Schema(e) => e.kind(),
        }
    }
}

/// Errors raised while parsing a field annotation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The annotation string is empty.
    #[error("empty annotation on field '{field}'")]
    Empty {
        /// The field carrying the annotation.
        field: String,
    },

    /// The leading role is not one of the known roles.
    #[error("unknown role '{role}' on field '{field}'")]
    UnknownRole {
        /// The field carrying the annotation.
        field: String,
        /// The unrecognised role text.
        role: String,
    },

    /// An option after the role could not be understood.
    #[error("invalid option '{option}' on field '{field}'")]
    InvalidOption {
        /// The field carrying the annotation.
        field: String,
        /// The offending option text.
        option: String,
    },

    /// An inbound annotation is neither a role marker nor `name=<column>`.
    #[error("invalid column annotation '{tag}' on field '{field}'")]
    InvalidColumn {
        /// The field carrying the annotation.
        field: String,
        /// The full annotation text.
        tag: String,
    },
}

/// Errors raised while converting a single scalar to or from its wire form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A wire value is not a base-10 integer.
    #[error("failed to parse integer from '{value}': {reason}")]
    ParseInt {
        /// The wire text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A wire value is not a decimal number.
    #[error("failed to parse float from '{value}': {reason}")]
    ParseFloat {
        /// The wire text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A wire value does not match the store's timestamp layout.
    #[error("failed to parse timestamp from '{value}': {reason}")]
    ParseTimestamp {
        /// The wire text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A parsed integer does not fit the destination width.
    #[error("integer {value} does not fit in {target}")]
    OutOfRange {
        /// The parsed value.
        value: i64,
        /// The destination type name.
        target: &'static str,
    },

    /// The destination kind cannot be populated from a wire value.
    #[error("unhandled field kind: {kind}")]
    UnhandledKind {
        /// The destination kind.
        kind: FieldKind,
    },
}

impl ValueError {
    /// Returns the classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnhandledKind { .. } => ErrorKind::Type,
            _ => ErrorKind::Format,
        }
    }
}

/// A marshal failure tied to the position of the record in its batch.
#[derive(Debug)]
pub struct RecordFailure {
    /// Index of the record in the input slice.
    pub index: usize,
    /// Why the record was rejected.
    pub error: MarshalError,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {}: {}", self.index, self.error)
    }
}

/// Errors that can occur while marshalling records.
#[derive(Error, Debug)]
pub enum MarshalError {
    /// A field annotation could not be parsed.
    #[error(transparent)]
    Tag(#[from] TagError),

    /// `omitempty` was placed on a field that is not a string.
    #[error("omitempty can only be used with string fields, found on {kind} field '{field}'")]
    OmitEmptyOnNonString {
        /// The offending field.
        field: String,
        /// The field's kind.
        kind: FieldKind,
    },

    /// An annotated field is not publicly visible.
    #[error("field '{field}' is not accessible, it needs to be public")]
    FieldNotExported {
        /// The private field.
        field: String,
    },

    /// A required role has no field.
    #[error("missing required role: {role}")]
    MissingRole {
        /// The role that has no field.
        role: Role,
    },

    /// A single-occurrence role appears on more than one field.
    #[error("role {role} appears {count} times, expected exactly once")]
    DuplicateRole {
        /// The repeated role.
        role: Role,
        /// How many fields carry it.
        count: usize,
    },

    /// A field's kind does not suit its role.
    #[error("{role} field '{field}' must be {expected}, found {found}")]
    RoleKindMismatch {
        /// The field.
        field: String,
        /// Its role.
        role: Role,
        /// The kind the role requires.
        expected: FieldKind,
        /// The field's actual kind.
        found: FieldKind,
    },

    /// The timestamp field holds the default (epoch) instant.
    #[error("timestamp field '{field}' has a zero value")]
    ZeroTimestamp {
        /// The timestamp field.
        field: String,
    },

    /// The measure name field holds an empty string.
    #[error("measure field '{field}' has an empty value")]
    EmptyMeasureName {
        /// The measure field.
        field: String,
    },

    /// An attribute's kind has no wire representation.
    #[error("unsupported type for measure value '{field}': {kind}")]
    UnsupportedType {
        /// The attribute field.
        field: String,
        /// The field's kind.
        kind: FieldKind,
    },

    /// A timestamp attribute names a unit other than `s`, `ms` or `ns`.
    #[error("unsupported unit for time on field '{field}': {unit}")]
    UnsupportedUnit {
        /// The attribute field.
        field: String,
        /// The unit text.
        unit: String,
    },

    /// A timestamp cannot be expressed as an epoch integer in the unit.
    #[error("timestamp on field '{field}' is out of range for unit {unit}")]
    TimestampOutOfRange {
        /// The attribute field.
        field: String,
        /// The unit text.
        unit: &'static str,
    },

    /// One or more records of a batch failed; nothing was produced.
    #[error("{} of {total} records failed to marshal: {}", .failures.len(), join_failures(.failures))]
    Batch {
        /// Number of records in the batch.
        total: usize,
        /// Every failing record, in input order.
        failures: Vec<RecordFailure>,
    },
}

fn join_failures(failures: &[RecordFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl MarshalError {
    /// Returns the classification of this failure.
    ///
    /// A batch failure reports the kind of its first failing record.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Tag(_)
            | Self::OmitEmptyOnNonString { .. }
            | Self::FieldNotExported { .. }
            | Self::RoleKindMismatch { .. }
            | Self::UnsupportedType { .. } => ErrorKind::Type,
            Self::MissingRole { .. } | Self::DuplicateRole { .. } => ErrorKind::Cardinality,
            Self::ZeroTimestamp { .. }
            | Self::EmptyMeasureName { .. }
            | Self::UnsupportedUnit { .. }
            | Self::TimestampOutOfRange { .. } => ErrorKind::Format,
            Self::Batch { failures, .. } => failures
                .first()
                .map_or(ErrorKind::Cardinality, |f| f.error.kind()),
        }
    }
}

/// Errors that can occur while unmarshalling a query result.
#[derive(Error, Debug)]
pub enum UnmarshalError {
    /// No query result was supplied.
    #[error("query output is missing")]
    MissingOutput,

    /// A row does not carry one value per column.
    #[error("row {row} has {actual} values but there are {expected} columns")]
    RowLength {
        /// Row index.
        row: usize,
        /// Number of columns.
        expected: usize,
        /// Number of values in the row.
        actual: usize,
    },

    /// A single-record destination was given more than one row.
    #[error("expected at most one row for a single record destination, got {rows}")]
    TooManyRows {
        /// Number of rows in the result.
        rows: usize,
    },

    /// A pre-sized destination does not match the row count.
    #[error("destination holds {expected} records but the result has {actual} rows")]
    LengthMismatch {
        /// Destination length.
        expected: usize,
        /// Number of rows.
        actual: usize,
    },

    /// A field annotation could not be parsed.
    #[error(transparent)]
    Tag(#[from] TagError),

    /// An annotated field names a column absent from the result.
    #[error("column '{column}' for field '{field}' not found in query output")]
    UnknownColumn {
        /// The destination field.
        field: String,
        /// The column it asked for.
        column: String,
    },

    /// A wire value could not be stored in its field.
    #[error("field '{field}' from column '{column}': {source}")]
    Value {
        /// The destination field.
        field: String,
        /// The source column.
        column: String,
        /// The conversion failure.
        #[source]
        source: ValueError,
    },
}

impl UnmarshalError {
    /// Returns the classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingOutput => ErrorKind::Shape,
            Self::RowLength { .. } | Self::TooManyRows { .. } | Self::LengthMismatch { .. } => {
                ErrorKind::Cardinality
            }
            Self::Tag(_) => ErrorKind::Type,
            Self::UnknownColumn { .. } => ErrorKind::Lookup,
            Self::Value { source, .. } => source.kind(),
        }
    }
}

/// Errors that can occur while rendering a query template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A binding's value has no literal form.
    #[error("unsupported type for parameter {key}: {type_name}")]
    UnsupportedParam {
        /// The binding key.
        key: String,
        /// Name of the value's type.
        type_name: &'static str,
    },

    /// A binding's placeholder does not appear in the template.
    #[error("placeholder {placeholder} not found in query template")]
    PlaceholderNotFound {
        /// The placeholder, colon included.
        placeholder: String,
    },
}

impl QueryError {
    /// Returns the classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedParam { .. } => ErrorKind::Type,
            Self::PlaceholderNotFound { .. } => ErrorKind::Lookup,
        }
    }
}

/// Errors that can occur while building or reading a schema index.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The metric is not declared anywhere in the schema.
    #[error("metric name {metric} not found")]
    MetricNotFound {
        /// Debug rendering of the metric key.
        metric: String,
    },

    /// The metric is declared under more than one (table, measure).
    #[error("metric {metric} declared in {first_table}.{first_measure} and {second_table}.{second_measure}")]
    DuplicateMetric {
        /// Debug rendering of the metric key.
        metric: String,
        /// Table of the earlier declaration.
        first_table: String,
        /// Measure of the earlier declaration.
        first_measure: String,
        /// Table of the later declaration.
        second_table: String,
        /// Measure of the later declaration.
        second_measure: String,
    },

    /// The schema file could not be read.
    #[error("failed to read schema from '{}': {source}", path.display())]
    Load {
        /// The schema file path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The schema document is not valid JSON for a schema.
    #[error("failed to parse schema: {source}")]
    Parse {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl SchemaError {
    /// Returns the classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MetricNotFound { .. } => ErrorKind::Lookup,
            Self::DuplicateMetric { .. } => ErrorKind::Cardinality,
            Self::Load { .. } => ErrorKind::Io,
            Self::Parse { .. } => ErrorKind::Shape,
        }
    }
}

/// Type alias for `Result<T, TsrowError>`.
pub type Result<T> = std::result::Result<T, TsrowError>;
