//! Partially-loaded entities and the field tables that fill them.
//!
//! An entity starts with whatever fields its creator knew (a name, an MBID,
//! a search-result row) and fetches the rest the first time an unloaded
//! attribute is read:
//!
//! - [`field`] - tri-state [`Slot`]s and per-type [`FieldSpec`] tables
//! - [`convert`] - converters from raw JSON values to typed attributes
//! - [`entity`] - the [`Entity`] wrapper that owns the slots and hydrates them

pub mod convert;
pub mod entity;
pub mod field;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub use entity::{Entity, Hydrate};
pub use field::{Field, FieldSpec, Slot, apply_fields};

/// An untyped row as returned by the service.
pub type Row = Map<String, Value>;

/// Unwrap a cached or fetched value that must be a row.
pub fn into_row(value: Value) -> Result<Row> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(Error::parse(format!("expected an object row, got {other}"))),
    }
}

/// Take `document[root]` as a row, e.g. the `"artist"` object of an
/// `artist.getInfo` response.
pub fn take_root(mut document: Value, root: &str) -> Option<Row> {
    match document.get_mut(root).map(Value::take) {
        Some(Value::Object(row)) => Some(row),
        _ => None,
    }
}

/// The items of a list-valued field as rows.
///
/// The service sends a single object instead of a one-element list, and an
/// empty string or no field at all instead of an empty list.
pub fn rows_of(value: Option<&Value>) -> Vec<Row> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        Some(Value::Object(row)) => vec![row.clone()],
        _ => Vec::new(),
    }
}
