//! Declarative field tables.
//!
//! Each entity type declares one `'static` table of [`FieldSpec`]s: the raw
//! key to read, and a setter that converts the raw value into the right
//! [`Slot`]. [`apply_fields`] walks the table against a row.
//!
//! ```ignore
//! type Spec = FieldSpec<ArtistData>;
//!
//! static FIELDS: &[Spec] = &[
//!     Spec::new("name", |d, f| f.fill(&mut d.name, convert::text)),
//!     Spec::new("mbid", |d, f| f.fill(&mut d.id, convert::text)),
//! ];
//! ```
//!
//! Applying a table is idempotent: loaded slots are never overwritten, so a
//! second pass with the same row (or a richer one) only fills the gaps.

use std::fmt;

use serde_json::Value;

use super::Row;
use crate::client::Client;
use crate::error::{Error, Result};

/// A typed attribute that may not have been loaded yet.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    /// Never seen in any row
    Unset,
    /// A row was applied but the field was absent or blank
    Empty,
    /// Converted value
    Loaded(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Slot<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Whether a raw value counts as absent.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// One raw field handed to a setter.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    pub name: &'static str,
    pub raw: Option<&'a Value>,
}

impl Field<'_> {
    /// Fill `slot` from this field.
    ///
    /// - loaded slot: left untouched
    /// - present, non-blank value: converted and loaded
    /// - absent or blank value: the slot becomes [`Slot::Empty`]
    pub fn fill<T, E: fmt::Display>(
        self,
        slot: &mut Slot<T>,
        convert: impl FnOnce(&Value) -> std::result::Result<T, E>,
    ) -> Result<()> {
        if slot.is_loaded() {
            return Ok(());
        }

        match self.raw.filter(|v| !is_blank(v)) {
            Some(raw) => {
                let value = convert(raw).map_err(|e| Error::conversion(self.name, e.to_string()))?;
                *slot = Slot::Loaded(value);
            }
            None => *slot = Slot::Empty,
        }
        Ok(())
    }
}

type PlainSetter<E> = fn(&mut E, Field<'_>) -> Result<()>;
type OwnedSetter<E> = fn(&mut E, Field<'_>, &Client) -> Result<()>;

enum Setter<E> {
    Plain(PlainSetter<E>),
    /// The converter also needs the owning client, e.g. to build a nested
    /// entity that can hydrate itself later
    Owned(OwnedSetter<E>),
}

/// Conversion rule for one raw field of entity data `E`.
pub struct FieldSpec<E> {
    pub source: &'static str,
    setter: Setter<E>,
}

impl<E> FieldSpec<E> {
    pub const fn new(source: &'static str, setter: PlainSetter<E>) -> Self {
        Self {
            source,
            setter: Setter::Plain(setter),
        }
    }

    pub const fn with_owner(source: &'static str, setter: OwnedSetter<E>) -> Self {
        Self {
            source,
            setter: Setter::Owned(setter),
        }
    }

    pub fn needs_owner(&self) -> bool {
        matches!(self.setter, Setter::Owned(_))
    }

    fn apply(&self, target: &mut E, row: &Row, client: &Client) -> Result<()> {
        let field = Field {
            name: self.source,
            raw: row.get(self.source),
        };
        match self.setter {
            Setter::Plain(set) => set(target, field),
            Setter::Owned(set) => set(target, field, client),
        }
    }
}

impl<E> fmt::Debug for FieldSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("source", &self.source)
            .field("needs_owner", &self.needs_owner())
            .finish()
    }
}

/// Apply every field rule in `fields` to `target`.
///
/// Stops at the first conversion failure; callers that need all-or-nothing
/// semantics apply to a copy.
pub fn apply_fields<E>(
    target: &mut E,
    fields: &[FieldSpec<E>],
    row: &Row,
    client: &Client,
) -> Result<()> {
    for spec in fields {
        spec.apply(target, row, client)?;
    }
    Ok(())
}
