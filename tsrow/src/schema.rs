//! Schema description and the metric → (table, measure) index.
//!
//! A [`Schema`] declares, per table and measure, which metrics are stored
//! there and which dimensions accompany them. [`SchemaIndex`] inverts it once
//! so the table and measure for any metric can be found directly.
//!
//! The schema is plain configuration and loads from JSON:
//!
//! ```json
//! {
//!   "inverter_metrics": {
//!     "power": {
//!       "dimensions": ["site_id"],
//!       "metrics": ["actual_pv_power", "reactive_power"]
//!     }
//!   }
//! }
//! ```
//!
//! The metric key type `K` is generic so applications can use their own
//! metric enums or newtypes instead of bare strings.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Metrics and dimensions stored under one measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureSchema<K> {
    /// Dimension names written alongside the metrics.
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Metrics stored under this measure, in declaration order.
    pub metrics: Vec<K>,
}

impl<K> MeasureSchema<K> {
    /// Creates a measure with the given metrics and no dimensions.
    pub fn new(metrics: impl IntoIterator<Item = K>) -> Self {
        Self {
            dimensions: Vec::new(),
            metrics: metrics.into_iter().collect(),
        }
    }

    /// Sets the dimension names.
    #[must_use]
    pub fn with_dimensions<S: Into<String>>(
        mut self,
        dimensions: impl IntoIterator<Item = S>,
    ) -> Self {
        self.dimensions = dimensions.into_iter().map(Into::into).collect();
        self
    }
}

/// Declarative schema: table → measure → [`MeasureSchema`].
///
/// Tables and measures are kept sorted, so every traversal of a schema
/// visits them in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema<K>(pub BTreeMap<String, BTreeMap<String, MeasureSchema<K>>>);

impl<K> Default for Schema<K> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<K> Schema<K> {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a measure under a table.
    pub fn insert(
        &mut self,
        table: impl Into<String>,
        measure: impl Into<String>,
        measure_schema: MeasureSchema<K>,
    ) {
        self.0
            .entry(table.into())
            .or_default()
            .insert(measure.into(), measure_schema);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(
        mut self,
        table: impl Into<String>,
        measure: impl Into<String>,
        measure_schema: MeasureSchema<K>,
    ) -> Self {
        self.insert(table, measure, measure_schema);
        self
    }

    /// Iterates over every (table, measure, measure schema), sorted.
    pub fn measures(&self) -> impl Iterator<Item = (&str, &str, &MeasureSchema<K>)> {
        self.0.iter().flat_map(|(table, measures)| {
            measures
                .iter()
                .map(move |(measure, ms)| (table.as_str(), measure.as_str(), ms))
        })
    }

    /// Returns the number of tables.
    pub fn table_count(&self) -> usize {
        self.0.len()
    }
}

impl<K: DeserializeOwned> Schema<K> {
    /// Parses a schema from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] if the document is not a valid schema.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| SchemaError::Parse { source }.into())
    }

    /// Reads and parses a schema from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Load`] if the file cannot be read, or
    /// [`SchemaError::Parse`] if its contents are not a valid schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

/// Where a metric is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetricLocation {
    /// Table name.
    pub table: String,
    /// Measure name.
    pub measure: String,
}

/// A schema with its metric index.
///
/// Immutable once built; lookups take `&self`, so an index can be shared
/// across threads freely when `K` allows it.
///
/// # Example
///
/// ```rust
/// use tsrow::schema::{MeasureSchema, Schema, SchemaIndex};
///
/// let schema = Schema::new()
///     .with("inverter_metrics", "power", MeasureSchema::new(["actual_pv_power"]))
///     .with("battery_metrics", "charge", MeasureSchema::new(["soc"]));
/// let index = SchemaIndex::new(schema);
///
/// assert_eq!(index.table_for(&"soc").unwrap(), "battery_metrics");
/// assert_eq!(index.measure_for(&"actual_pv_power").unwrap(), "power");
/// assert!(index.measure_for(&"voltage").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SchemaIndex<K> {
    schema: Schema<K>,
    index: HashMap<K, MetricLocation>,
}

impl<K> SchemaIndex<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Builds the index.
    ///
    /// A metric declared under more than one measure resolves to the last
    /// declaration in sorted (table, measure) order; each shadowed declaration
    /// is logged at `warn`. Use [`try_new`](Self::try_new) to reject such
    /// schemas instead.
    pub fn new(schema: Schema<K>) -> Self {
        let mut index = HashMap::new();
        for (table, measure, metric) in triples(&schema) {
            let location = MetricLocation {
                table: table.to_string(),
                measure: measure.to_string(),
            };
            if let Some(previous) = index.insert(metric.clone(), location) {
                tracing::warn!(
                    metric = ?metric,
                    shadowed_table = %previous.table,
                    shadowed_measure = %previous.measure,
                    table,
                    measure,
                    "metric declared more than once, last declaration wins"
                );
            }
        }
        Self { schema, index }
    }

    /// Builds the index, rejecting metrics declared more than once.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateMetric`] naming the first two
    /// declarations of the first duplicated metric found.
    pub fn try_new(schema: Schema<K>) -> Result<Self> {
        let mut index = HashMap::new();
        for (table, measure, metric) in triples(&schema) {
            match index.entry(metric.clone()) {
                Entry::Occupied(first) => {
                    let first: &MetricLocation = first.get();
                    return Err(SchemaError::DuplicateMetric {
                        metric: format!("{metric:?}"),
                        first_table: first.table.clone(),
                        first_measure: first.measure.clone(),
                        second_table: table.to_string(),
                        second_measure: measure.to_string(),
                    }
                    .into());
                }
                Entry::Vacant(slot) => {
                    slot.insert(MetricLocation {
                        table: table.to_string(),
                        measure: measure.to_string(),
                    });
                }
            }
        }
        Ok(Self { schema, index })
    }

    /// Returns the table and measure storing `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MetricNotFound`] if the metric is not declared.
    pub fn location(&self, metric: &K) -> Result<&MetricLocation> {
        self.index.get(metric).ok_or_else(|| {
            SchemaError::MetricNotFound {
                metric: format!("{metric:?}"),
            }
            .into()
        })
    }

    /// Returns the measure name under which `metric` is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MetricNotFound`] if the metric is not declared.
    pub fn measure_for(&self, metric: &K) -> Result<&str> {
        self.location(metric).map(|l| l.measure.as_str())
    }

    /// Returns the table in which `metric` is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MetricNotFound`] if the metric is not declared.
    pub fn table_for(&self, metric: &K) -> Result<&str> {
        self.location(metric).map(|l| l.table.as_str())
    }

    /// Returns the dimension names declared for the measure storing `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MetricNotFound`] if the metric is not declared.
    pub fn dimensions_for(&self, metric: &K) -> Result<&[String]> {
        let location = self.location(metric)?;
        Ok(self
            .schema
            .0
            .get(&location.table)
            .and_then(|measures| measures.get(&location.measure))
            .map(|ms| ms.dimensions.as_slice())
            .unwrap_or_default())
    }

    /// Returns the schema the index was built from.
    pub fn schema(&self) -> &Schema<K> {
        &self.schema
    }

    /// Iterates over every (table, measure, metric) declaration, sorted by
    /// table then measure, metrics in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &K)> {
        triples(&self.schema)
    }

    /// Returns the number of distinct indexed metrics.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no metrics are indexed.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn triples<K>(schema: &Schema<K>) -> impl Iterator<Item = (&str, &str, &K)> {
    schema
        .measures()
        .flat_map(|(table, measure, ms)| {
            ms.metrics
                .iter()
                .map(move |metric| (table, measure, metric))
        })
}
