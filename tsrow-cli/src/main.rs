//! CLI for tsrow.
//!
//! Provides commands for inspecting schema files, looking up where a metric
//! is stored, and rendering query templates.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tsrow::query::{DatabaseName, Param, TableName};
use tsrow::schema::{Schema, SchemaIndex};

/// tsrow: time-series record mapping tools.
#[derive(Parser)]
#[command(name = "tsrow", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List the tables, measures, dimensions and metrics of a schema file.
    Inspect {
        /// Path to the schema JSON file.
        schema: PathBuf,

        /// Fail if a metric is declared more than once.
        #[arg(long)]
        strict: bool,
    },

    /// Show the table and measure storing a metric.
    Lookup {
        /// Path to the schema JSON file.
        schema: PathBuf,

        /// Metric name.
        metric: String,

        /// Output format.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Render a query template.
    Query {
        /// Template with `:name` placeholders.
        template: String,

        /// JSON-valued binding, e.g. `site="north"` or `limit=10`.
        #[arg(long = "param", value_name = "KEY=JSON")]
        params: Vec<String>,

        /// Table name binding.
        #[arg(long = "table", value_name = "KEY=NAME")]
        tables: Vec<String>,

        /// Database name binding.
        #[arg(long = "database", value_name = "KEY=NAME")]
        databases: Vec<String>,

        /// Timestamp binding in RFC 3339.
        #[arg(long = "time", value_name = "KEY=RFC3339")]
        times: Vec<String>,

        /// Duration binding in whole seconds.
        #[arg(long = "duration", value_name = "KEY=SECS")]
        durations: Vec<String>,
    },
}

/// Output format for lookups.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text.
    Text,
    /// JSON object.
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect { schema, strict } => cmd_inspect(&schema, strict),
        Commands::Lookup {
            schema,
            metric,
            format,
        } => cmd_lookup(&schema, metric, &format),
        Commands::Query {
            template,
            params,
            tables,
            databases,
            times,
            durations,
        } => cmd_query(&template, &params, &tables, &databases, &times, &durations),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_index(
    path: &Path,
    strict: bool,
) -> Result<SchemaIndex<String>, Box<dyn std::error::Error>> {
    let schema: Schema<String> = Schema::load(path)?;
    tracing::debug!(path = %path.display(), tables = schema.table_count(), "loaded schema");
    let index = if strict {
        SchemaIndex::try_new(schema)?
    } else {
        SchemaIndex::new(schema)
    };
    Ok(index)
}

/// Implements `tsrow inspect <schema>`.
fn cmd_inspect(path: &Path, strict: bool) -> Result<(), Box<dyn std::error::Error>> {
    let index = load_index(path, strict)?;
    let schema = index.schema();

    println!("Schema: {}", path.display());
    println!("Tables: {}", schema.table_count());
    println!("Metrics: {}", index.len());
    println!();

    let mut current_table = None;
    for (table, measure, ms) in schema.measures() {
        if current_table != Some(table) {
            println!("{table}");
            current_table = Some(table);
        }
        println!("  {measure}");
        if !ms.dimensions.is_empty() {
            println!("    dimensions: {}", ms.dimensions.join(", "));
        }
        println!("    metrics: {}", ms.metrics.join(", "));
    }

    Ok(())
}

/// Implements `tsrow lookup <schema> <metric>`.
fn cmd_lookup(
    path: &Path,
    metric: String,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let index = load_index(path, false)?;
    let location = index.location(&metric)?;
    let dimensions = index.dimensions_for(&metric)?;

    match format {
        OutputFormat::Text => {
            println!("metric: {metric}");
            println!("table: {}", location.table);
            println!("measure: {}", location.measure);
            if !dimensions.is_empty() {
                println!("dimensions: {}", dimensions.join(", "));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "metric": metric,
                "table": location.table,
                "measure": location.measure,
                "dimensions": dimensions,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Implements `tsrow query <template>`.
fn cmd_query(
    template: &str,
    params: &[String],
    tables: &[String],
    databases: &[String],
    times: &[String],
    durations: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bindings: Vec<(String, Param)> = Vec::new();

    for raw in params {
        let (key, value) = split_binding(raw)?;
        let json: serde_json::Value = serde_json::from_str(value)
            .map_err(|e| format!("invalid JSON for parameter '{key}': {e}"))?;
        bindings.push((key.to_string(), Param::from(json)));
    }
    for raw in tables {
        let (key, value) = split_binding(raw)?;
        bindings.push((key.to_string(), Param::from(TableName::from(value))));
    }
    for raw in databases {
        let (key, value) = split_binding(raw)?;
        bindings.push((key.to_string(), Param::from(DatabaseName::from(value))));
    }
    for raw in times {
        let (key, value) = split_binding(raw)?;
        let ts = DateTime::parse_from_rfc3339(value)
            .map_err(|e| format!("invalid timestamp for '{key}': {e}"))?
            .with_timezone(&Utc);
        bindings.push((key.to_string(), Param::from(ts)));
    }
    for raw in durations {
        let (key, value) = split_binding(raw)?;
        let secs: u64 = value
            .parse()
            .map_err(|e| format!("invalid duration for '{key}': {e}"))?;
        bindings.push((key.to_string(), Param::from(Duration::from_secs(secs))));
    }

    let query = tsrow::build_query(template, bindings)?;
    println!("{query}");
    Ok(())
}

/// Splits a `key=value` argument.
fn split_binding(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
