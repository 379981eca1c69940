//! Wire-level shapes exchanged with the time-series store.
//!
//! These mirror what the transport layer sends and receives: outbound
//! multi-measure [`Record`]s grouped into [`WriteBatch`]es, and inbound
//! [`QueryOutput`] result sets. They derive serde so a transport can emit or
//! ingest the store's JSON form directly.
//!
//! ```rust
//! use tsrow::wire::QueryOutput;
//!
//! let output: QueryOutput = serde_json::from_str(r#"{
//!     "columnInfo": [{"name": "time", "scalarType": "TIMESTAMP"}],
//!     "rows": [{"data": [{"scalarValue": "2024-01-01 00:00:00.000000000"}]}]
//! }"#).unwrap();
//! assert_eq!(output.column_info.len(), 1);
//! assert_eq!(output.rows[0].data[0].scalar_value.as_deref(), Some("2024-01-01 00:00:00.000000000"));
//! ```

use serde::{Deserialize, Serialize};

/// Type tag of a measure value, or of the record as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeasureValueType {
    /// UTF-8 text.
    Varchar,
    /// 64-bit signed integer.
    Bigint,
    /// 64-bit float.
    Double,
    /// Epoch integer in the unit chosen at marshal time.
    Timestamp,
    /// Boolean.
    Boolean,
    /// Record carries several named measure values.
    Multi,
}

impl MeasureValueType {
    /// Returns the wire spelling of this type tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Varchar => "VARCHAR",
            Self::Bigint => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Timestamp => "TIMESTAMP",
            Self::Boolean => "BOOLEAN",
            Self::Multi => "MULTI",
        }
    }
}

/// A named string dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Dimension name.
    pub name: String,
    /// Dimension value.
    pub value: String,
}

/// A named, typed measure value in its wire string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureValue {
    /// Measure value name.
    pub name: String,
    /// Canonical string form of the value.
    pub value: String,
    /// Type tag telling the store how to read `value`.
    #[serde(rename = "type")]
    pub value_type: MeasureValueType,
}

/// One multi-measure event, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Epoch milliseconds as a decimal string.
    pub time: String,
    /// Name of the measure this event belongs to.
    pub measure_name: String,
    /// Always [`MeasureValueType::Multi`] for marshalled records.
    pub measure_value_type: MeasureValueType,
    /// Dimensions in field declaration order.
    pub dimensions: Vec<Dimension>,
    /// Measure values in field declaration order.
    pub measure_values: Vec<MeasureValue>,
}

impl Record {
    /// Looks up a measure value by name.
    pub fn measure_value(&self, name: &str) -> Option<&MeasureValue> {
        self.measure_values.iter().find(|mv| mv.name == name)
    }

    /// Looks up a dimension value by name.
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}

/// Records destined for a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteBatch {
    /// Target database.
    pub database_name: String,
    /// Target table.
    pub table_name: String,
    /// Records to write.
    pub records: Vec<Record>,
}

impl WriteBatch {
    /// Creates a batch for `database.table`.
    pub fn new(
        database_name: impl Into<String>,
        table_name: impl Into<String>,
        records: Vec<Record>,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            table_name: table_name.into(),
            records,
        }
    }

    /// Returns `true` if any record in this batch has the given measure name.
    pub fn has_measure(&self, measure_name: &str) -> bool {
        self.records.iter().any(|r| r.measure_name == measure_name)
    }
}

/// An ordered collection of write batches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteBatches(pub Vec<WriteBatch>);

impl WriteBatches {
    /// Returns the first batch holding a record for `measure_name`.
    pub fn records_for_measure(&self, measure_name: &str) -> Option<&WriteBatch> {
        self.0.iter().find(|batch| batch.has_measure(measure_name))
    }

    /// Returns the batch for `table_name`, if any.
    pub fn for_table(&self, table_name: &str) -> Option<&WriteBatch> {
        self.0.iter().find(|batch| batch.table_name == table_name)
    }

    /// Iterates over the batches in order.
    pub fn iter(&self) -> impl Iterator<Item = &WriteBatch> {
        self.0.iter()
    }

    /// Returns the number of batches.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no batches.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<WriteBatch>> for WriteBatches {
    fn from(batches: Vec<WriteBatch>) -> Self {
        Self(batches)
    }
}

/// Scalar type reported for a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalarType {
    /// Text.
    Varchar,
    /// 64-bit signed integer.
    Bigint,
    /// 64-bit float.
    Double,
    /// Nanosecond-precision timestamp.
    Timestamp,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Day-to-second interval.
    IntervalDayToSecond,
    /// Year-to-month interval.
    IntervalYearToMonth,
    /// 32-bit signed integer.
    Integer,
    /// Unknown type, typically a null literal.
    #[serde(other)]
    Unknown,
}

/// Name and type of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    /// Column name as used by `name=` annotations.
    pub name: String,
    /// Column scalar type.
    pub scalar_type: ScalarType,
}

impl ColumnInfo {
    /// Creates a column descriptor.
    pub fn new(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar_type,
        }
    }
}

/// One value of a result row; `None` is a SQL null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datum {
    /// String form of the value.
    #[serde(default)]
    pub scalar_value: Option<String>,
}

impl Datum {
    /// A null datum.
    pub fn null() -> Self {
        Self { scalar_value: None }
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self {
            scalar_value: Some(value.to_string()),
        }
    }
}

impl From<Option<&str>> for Datum {
    fn from(value: Option<&str>) -> Self {
        Self {
            scalar_value: value.map(str::to_string),
        }
    }
}

/// One result row, a value per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Values in column order.
    pub data: Vec<Datum>,
}

impl<D: Into<Datum>> FromIterator<D> for Row {
    fn from_iter<I: IntoIterator<Item = D>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A complete query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutput {
    /// Column descriptors in position order.
    pub column_info: Vec<ColumnInfo>,
    /// Result rows.
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl QueryOutput {
    /// Creates a result from columns and rows.
    pub fn new(column_info: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self { column_info, rows }
    }
}
