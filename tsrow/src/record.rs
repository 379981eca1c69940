//! Describing record types to the marshaller.
//!
//! A record type exposes its fields, in declaration order, as a list of
//! [`Field`]s (for marshalling) or [`FieldMut`]s (for unmarshalling). Each
//! entry carries the field's declared name, its annotation, whether it is
//! publicly visible, and a reference to the value through [`FieldType`].
//!
//! The [`record!`](crate::record!) macro writes both impls from a struct
//! definition where annotated fields are followed by `=> "annotation"`:
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//!
//! tsrow::record! {
//!     #[derive(Debug, Default)]
//!     pub struct Reading {
//!         pub at: DateTime<Utc> => "timestamp",
//!         pub sensor: String => "measure",
//!         pub site: String => "dimension,name=site",
//!         pub temperature: f64 => "attribute,name=temperature",
//!         pub note: Vec<u8>,
//!     }
//! }
//!
//! let reading = Reading::default();
//! use tsrow::record::Record;
//! assert_eq!(reading.fields().len(), 4);
//! ```
//!
//! Types that cannot use the macro (generics, manual layouts) implement
//! [`Record`] and [`FromRow`] by hand.

use crate::value::FieldType;

/// Read-only view of one annotated field.
pub struct Field<'a> {
    /// Declared field name.
    pub name: &'static str,
    /// Raw annotation text.
    pub tag: &'static str,
    /// Whether the field is publicly visible.
    pub exported: bool,
    /// The field's value.
    pub value: &'a dyn FieldType,
}

impl<'a> Field<'a> {
    /// Creates a field view.
    pub fn new(
        name: &'static str,
        tag: &'static str,
        exported: bool,
        value: &'a dyn FieldType,
    ) -> Self {
        Self {
            name,
            tag,
            exported,
            value,
        }
    }
}

/// Mutable view of one annotated field.
pub struct FieldMut<'a> {
    /// Declared field name.
    pub name: &'static str,
    /// Raw annotation text.
    pub tag: &'static str,
    /// The field's storage.
    pub value: &'a mut dyn FieldType,
}

impl<'a> FieldMut<'a> {
    /// Creates a mutable field view.
    pub fn new(name: &'static str, tag: &'static str, value: &'a mut dyn FieldType) -> Self {
        Self { name, tag, value }
    }
}

/// A flat record that can be marshalled into a wire record.
pub trait Record {
    /// Returns the annotated fields in declaration order.
    ///
    /// Fields without an annotation are left out.
    fn fields(&self) -> Vec<Field<'_>>;
}

/// A flat record that can be populated from a result row.
pub trait FromRow {
    /// Returns the annotated fields in declaration order.
    ///
    /// Fields without an annotation are left out.
    fn fields_mut(&mut self) -> Vec<FieldMut<'_>>;
}

/// Declares a struct together with its [`Record`] and [`FromRow`] impls.
///
/// Annotated fields end in `=> "annotation"`; their types must implement
/// [`FieldType`]. Unannotated fields may have any type and are invisible to
/// both directions. Field visibility is recorded so that an annotated private
/// field is reported at marshal time.
///
/// Generic structs are not supported; implement the traits by hand.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::record::Record for $name {
            fn fields(&self) -> ::std::vec::Vec<$crate::record::Field<'_>> {
                #[allow(unused_mut)]
                let mut fields = ::std::vec::Vec::new();
                $(
                    $crate::__record_field!(
                        @ref fields,
                        stringify!($field),
                        !stringify!($fvis).is_empty(),
                        &self.$field
                        $(, $tag)?
                    );
                )*
                fields
            }
        }

        impl $crate::record::FromRow for $name {
            fn fields_mut(&mut self) -> ::std::vec::Vec<$crate::record::FieldMut<'_>> {
                #[allow(unused_mut)]
                let mut fields = ::std::vec::Vec::new();
                $(
                    $crate::__record_field!(
                        @mut fields,
                        stringify!($field),
                        &mut self.$field
                        $(, $tag)?
                    );
                )*
                fields
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_field {
    (@ref $fields:ident, $name:expr, $exported:expr, $value:expr) => {};
    (@ref $fields:ident, $name:expr, $exported:expr, $value:expr, $tag:literal) => {
        $fields.push($crate::record::Field::new($name, $tag, $exported, $value));
    };
    (@mut $fields:ident, $name:expr, $value:expr) => {};
    (@mut $fields:ident, $name:expr, $value:expr, $tag:literal) => {
        $fields.push($crate::record::FieldMut::new($name, $tag, $value));
    };
}
