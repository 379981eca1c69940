//! Field annotation parsing.
//!
//! Every field that takes part in marshalling carries a short annotation
//! string. Two grammars exist, one per direction:
//!
//! - **Outbound** (record → wire): `role[,name=<ident>][,unit=s|ms|ns][,omitempty]`
//!   where `role` is one of `timestamp`, `measure`, `dimension`, `attribute`.
//! - **Inbound** (wire → record): `time`, `timestamp`, `name=<column>`, or `-`.
//!
//! ```rust
//! use tsrow::tag::{InboundTag, OutboundTag, Role};
//!
//! let tag = OutboundTag::parse("temp", "attribute,name=temperature,omitempty").unwrap();
//! assert_eq!(tag.role, Role::Attribute);
//! assert_eq!(tag.wire_name("temp"), "temperature");
//! assert!(tag.omit_empty);
//!
//! assert_eq!(InboundTag::parse("at", "time").unwrap(), InboundTag::Column("time"));
//! assert_eq!(InboundTag::parse("x", "-").unwrap(), InboundTag::Skip);
//! ```

use std::fmt;

use crate::error::TagError;

/// Semantic role of an outbound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The instant of the measurement. Exactly one per record.
    Timestamp,
    /// The measure name. Exactly one per record.
    Measure,
    /// A string tag used for filtering and grouping.
    Dimension,
    /// A typed measure value.
    Attribute,
}

impl Role {
    /// All roles, in the order the marshaller reports them.
    pub const ALL: [Role; 4] = [
        Role::Timestamp,
        Role::Measure,
        Role::Dimension,
        Role::Attribute,
    ];

    /// Returns the annotation keyword for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Measure => "measure",
            Self::Dimension => "dimension",
            Self::Attribute => "attribute",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == keyword)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed outbound annotation.
///
/// The `unit` option is kept as written; it is only interpreted when the
/// field turns out to be a timestamp attribute, so an unknown unit fails at
/// encode time rather than here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundTag<'a> {
    /// The field's role.
    pub role: Role,
    /// Wire name override from `name=`.
    pub name: Option<&'a str>,
    /// Raw `unit=` option.
    pub unit: Option<&'a str>,
    /// Whether `omitempty` was present.
    pub omit_empty: bool,
}

impl<'a> OutboundTag<'a> {
    /// Parses an outbound annotation attached to `field`.
    ///
    /// # Errors
    ///
    /// Returns [`TagError`] if the annotation is empty, the role is unknown,
    /// or an option is not one of `name=`, `unit=`, `omitempty`.
    pub fn parse(field: &str, tag: &'a str) -> Result<Self, TagError> {
        let mut parts = tag.split(',');
        let keyword = parts.next().unwrap_or_default();
        if keyword.is_empty() {
            return Err(TagError::Empty {
                field: field.to_string(),
            });
        }

        let role = Role::from_keyword(keyword).ok_or_else(|| TagError::UnknownRole {
            field: field.to_string(),
            role: keyword.to_string(),
        })?;

        let mut parsed = Self {
            role,
            name: None,
            unit: None,
            omit_empty: false,
        };

        for option in parts {
            if option == "omitempty" {
                parsed.omit_empty = true;
            } else if let Some(name) = option.strip_prefix("name=").filter(|n| !n.is_empty()) {
                parsed.name = Some(name);
            } else if let Some(unit) = option.strip_prefix("unit=") {
                parsed.unit = Some(unit);
            } else {
                return Err(TagError::InvalidOption {
                    field: field.to_string(),
                    option: option.to_string(),
                });
            }
        }

        Ok(parsed)
    }

    /// Returns the wire name: the `name=` override, or the field name.
    pub fn wire_name<'f>(&self, field: &'f str) -> &'f str
    where
        'a: 'f,
    {
        self.name.unwrap_or(field)
    }
}

/// A parsed inbound annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundTag<'a> {
    /// The field is never populated.
    Skip,
    /// The field is populated from the named column.
    Column(&'a str),
}

impl<'a> InboundTag<'a> {
    /// Parses an inbound annotation attached to `field`.
    ///
    /// `time` and `timestamp` map to the column of the same name, `name=X`
    /// maps to column `X`, and an empty annotation or `-` skips the field.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::InvalidColumn`] for anything else.
    pub fn parse(field: &str, tag: &'a str) -> Result<Self, TagError> {
        match tag {
            "" | "-" => Ok(Self::Skip),
            "time" | "timestamp" => Ok(Self::Column(tag)),
            _ => match tag.split_once('=') {
                Some(("name", column)) if !column.is_empty() && !column.contains('=') => {
                    Ok(Self::Column(column))
                }
                _ => Err(TagError::InvalidColumn {
                    field: field.to_string(),
                    tag: tag.to_string(),
                }),
            },
        }
    }
}
