//! Query templating.
//!
//! [`build_query`] substitutes `:name` placeholders in a query template with
//! literals formatted by the bound value's type:
//!
//! | [`Param`]     | literal                     |
//! |---------------|-----------------------------|
//! | `String`      | `'value'`                   |
//! | `Timestamp`   | `from_unixtime(<epoch s>)`  |
//! | `Duration`    | `<whole seconds>s`          |
//! | `Int`/`Float` | decimal literal (finite)    |
//! | `Database`    | `"name"`                    |
//! | `Table`       | `"name"`                    |
//!
//! Values are not escaped. Templates and string bindings must come from
//! trusted code.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tsrow::query::{build_query, Param, TableName};
//!
//! let sql = build_query(
//!     "SELECT * FROM :table WHERE site = :site AND time > ago(:window)",
//!     [
//!         ("table", Param::from(TableName::from("readings"))),
//!         ("site", Param::from("north")),
//!         ("window", Param::from(Duration::from_secs(3600))),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     r#"SELECT * FROM "readings" WHERE site = 'north' AND time > ago(3600s)"#
//! );
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{QueryError, Result};

/// A database identifier, rendered double-quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseName(pub String);

/// A table identifier, rendered double-quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(pub String);

macro_rules! identifier {
    ($($t:ident),*) => {$(
        impl From<&str> for $t {
            fn from(name: &str) -> Self {
                Self(name.to_string())
            }
        }

        impl From<String> for $t {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "\"{}\"", self.0)
            }
        }
    )*};
}

identifier!(DatabaseName, TableName);

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Single-quoted string literal.
    String(String),
    /// Instant, rendered as `from_unixtime(<epoch seconds>)`.
    Timestamp(DateTime<Utc>),
    /// Interval, rendered as whole seconds with an `s` suffix.
    Duration(Duration),
    /// Integer literal.
    Int(i64),
    /// Float literal. NaN and infinities have no literal form.
    Float(f64),
    /// Database identifier.
    Database(DatabaseName),
    /// Table identifier.
    Table(TableName),
    /// A value with no literal form; rendering it fails.
    Unsupported {
        /// Name of the value's type, for the error message.
        type_name: &'static str,
    },
}

impl Param {
    /// Returns the name of the bound value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Duration(_) => "duration",
            Self::Int(_) => "int",
            Self::Float(f) if !f.is_finite() => "non-finite float",
            Self::Float(_) => "float",
            Self::Database(_) => "database name",
            Self::Table(_) => "table name",
            Self::Unsupported { type_name } => *type_name,
        }
    }

    /// Renders the literal for this value, or `None` if it has none.
    pub fn literal(&self) -> Option<String> {
        let literal = match self {
            Self::String(s) => format!("'{s}'"),
            Self::Timestamp(ts) => format!("from_unixtime({})", ts.timestamp()),
            Self::Duration(d) => format!("{}s", d.as_secs()),
            Self::Int(i) => i.to_string(),
            Self::Float(f) if !f.is_finite() => return None,
            Self::Float(f) => f.to_string(),
            Self::Database(name) => name.to_string(),
            Self::Table(name) => name.to_string(),
            Self::Unsupported { .. } => return None,
        };
        Some(literal)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<Utc>> for Param {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Duration> for Param {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DatabaseName> for Param {
    fn from(value: DatabaseName) -> Self {
        Self::Database(value)
    }
}

impl From<TableName> for Param {
    fn from(value: TableName) -> Self {
        Self::Table(value)
    }
}

/// JSON values map onto the scalar variants; anything without a literal form
/// becomes [`Param::Unsupported`].
impl From<serde_json::Value> for Param {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::String(s) => Self::String(s),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Int(i),
                (None, Some(f)) => Self::Float(f),
                (None, None) => Self::Unsupported { type_name: "number" },
            },
            Value::Bool(_) => Self::Unsupported { type_name: "bool" },
            Value::Null => Self::Unsupported { type_name: "null" },
            Value::Array(_) => Self::Unsupported { type_name: "array" },
            Value::Object(_) => Self::Unsupported { type_name: "object" },
        }
    }
}

/// A run of template text, or a `:name` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'t> {
    Text(&'t str),
    Placeholder(&'t str),
}

/// Splits a template at `:` followed by an identifier (`[A-Za-z0-9_]+`).
/// A `:` not followed by an identifier stays in the text.
fn pieces(template: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut rest = template;

    while let Some(colon) = rest.find(':') {
        let after = &rest[colon + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            pieces.push(Piece::Text(&rest[..=colon]));
        } else {
            if colon > 0 {
                pieces.push(Piece::Text(&rest[..colon]));
            }
            pieces.push(Piece::Placeholder(&after[..len]));
        }
        rest = &after[len..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest));
    }

    pieces
}

/// Renders `template` with every binding substituted.
///
/// Bindings are checked in iteration order: the value's type first, then
/// `:key` must occur in the template as a whole placeholder. The template is
/// then rendered in a single pass, replacing every bound placeholder; text
/// from substituted values is never rescanned. Placeholders with no binding
/// are left as written.
///
/// # Errors
///
/// Returns [`QueryError::UnsupportedParam`] for a value with no literal form,
/// or [`QueryError::PlaceholderNotFound`] if a key's placeholder is absent
/// from the template. The first failing binding is reported.
pub fn build_query<I, K>(template: &str, bindings: I) -> Result<String>
where
    I: IntoIterator<Item = (K, Param)>,
    K: AsRef<str>,
{
    let pieces = pieces(template);
    let mut literals: HashMap<String, String> = HashMap::new();

    for (key, param) in bindings {
        let key = key.as_ref();
        let literal = param.literal().ok_or_else(|| QueryError::UnsupportedParam {
            key: key.to_string(),
            type_name: param.type_name(),
        })?;

        if !pieces.contains(&Piece::Placeholder(key)) {
            return Err(QueryError::PlaceholderNotFound {
                placeholder: format!(":{key}"),
            }
            .into());
        }

        literals.insert(key.to_string(), literal);
    }

    let mut query = String::with_capacity(template.len());
    for piece in pieces {
        match piece {
            Piece::Placeholder(name) => match literals.get(name) {
                Some(literal) => query.push_str(literal),
                None => {
                    query.push(':');
                    query.push_str(name);
                }
            },
            Piece::Text(text) => query.push_str(text),
        }
    }

    tracing::trace!(bindings = literals.len(), "rendered query template");
    Ok(query)
}
