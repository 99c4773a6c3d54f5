//! Lazily hydrated entities.
//!
//! An [`Entity`] wraps an entity's typed slots together with the client that
//! can fetch the rest of them. Reading an attribute that is not loaded
//! triggers at most one hydration for the lifetime of the entity: the fetch
//! fills every slot at once, and whatever is still empty afterwards is the
//! final answer.

use std::fmt;

use super::{FieldSpec, Row, Slot, apply_fields};
use crate::cache::SharedCache;
use crate::client::Client;
use crate::error::{Result, ResultExt};
use crate::memo::CacheScope;

/// Typed slots of one entity type, plus how to fetch its full row.
pub trait Hydrate: Clone + Default + 'static {
    /// Entity kind, used for logging.
    const KIND: &'static str;

    /// Field table, shared by all instances.
    fn fields() -> &'static [FieldSpec<Self>];

    /// Fetch the complete row for the entity these slots describe.
    ///
    /// Implementations prefer a stable identifier over a natural key and go
    /// through the client's cache-checked fetch.
    fn fetch_full_row(&self, client: &Client) -> Result<Row>;
}

/// A partially or fully loaded entity.
#[derive(Clone)]
pub struct Entity<D> {
    client: Client,
    data: D,
    hydrated: bool,
    cache: Option<SharedCache>,
}

impl<D: Hydrate> Entity<D> {
    /// Wrap slots that are already partly known (e.g. just a name).
    pub fn new(client: Client, data: D) -> Self {
        Self {
            client,
            data,
            hydrated: false,
            cache: None,
        }
    }

    /// Build from a row. Slots the row lacks are loaded on first access.
    pub fn from_row(client: Client, row: &Row) -> Result<Self> {
        let mut entity = Self::new(client, D::default());
        entity.add_row(row)?;
        Ok(entity)
    }

    /// Build from a complete row; no hydration will ever happen.
    pub fn from_full_row(client: Client, row: &Row) -> Result<Self> {
        let mut entity = Self::from_row(client, row)?;
        entity.hydrated = true;
        Ok(entity)
    }

    /// Use `cache` for this entity's memoized results instead of the
    /// client's cache.
    pub fn with_cache(mut self, cache: SharedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Current slots, without triggering a fetch.
    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Merge a row into the slots. All-or-nothing: a conversion failure
    /// leaves the entity as it was.
    pub fn add_row(&mut self, row: &Row) -> Result<()> {
        let mut next = self.data.clone();
        apply_fields(&mut next, D::fields(), row, &self.client)?;
        self.data = next;
        Ok(())
    }

    /// Fetch the full row and fill every slot from it.
    ///
    /// On failure the entity is unchanged. A [`NotFound`](crate::Error::NotFound)
    /// is final: the entity counts as hydrated and its unset slots stay unset.
    /// Any other failure leaves it un-hydrated so a later read retries.
    pub fn hydrate(&mut self) -> Result<()> {
        tracing::debug!(kind = D::KIND, "Hydrating entity");
        let row = match self.data.fetch_full_row(&self.client) {
            Ok(row) => row,
            Err(e) if e.is_not_found() => {
                tracing::debug!(kind = D::KIND, "Entity not found, not fetching again");
                self.hydrated = true;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        self.add_row(&row)
            .with_context(format!("applying full {} row", D::KIND))?;
        self.hydrated = true;
        Ok(())
    }

    /// Read a slot, hydrating first if it is not loaded and the entity has
    /// not been hydrated yet.
    pub fn read<T>(&mut self, slot: fn(&D) -> &Slot<T>) -> Result<Option<&T>> {
        if !slot(&self.data).is_loaded() && !self.hydrated {
            self.hydrate()?;
        }
        Ok(slot(&self.data).get())
    }

    /// Mutable variant of [`Entity::read`], for nested entities that need
    /// `&mut` to hydrate themselves.
    pub fn read_mut<T>(&mut self, slot: fn(&mut D) -> &mut Slot<T>) -> Result<Option<&mut T>> {
        if !slot(&mut self.data).is_loaded() && !self.hydrated {
            self.hydrate()?;
        }
        Ok(slot(&mut self.data).get_mut())
    }
}

impl<D> CacheScope for Entity<D> {
    fn local_cache(&self) -> Option<&SharedCache> {
        self.cache.as_ref()
    }

    fn client(&self) -> &Client {
        &self.client
    }
}

impl<D: fmt::Debug> fmt::Debug for Entity<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("data", &self.data)
            .field("hydrated", &self.hydrated)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::cache_key;
    use crate::error::Error;
    use crate::model::{convert, into_row, take_root};
    use crate::test_utils::mock_client;
    use serde_json::json;

    #[derive(Debug, Clone, Default)]
    struct Band {
        name: Slot<String>,
        founded: Slot<u32>,
        members: Slot<Vec<String>>,
    }

    type Spec = FieldSpec<Band>;

    static BAND_FIELDS: &[Spec] = &[
        Spec::new("name", |d, f| f.fill(&mut d.name, convert::text)),
        Spec::new("founded", |d, f| f.fill(&mut d.founded, convert::integer)),
        Spec::new("members", |d, f| f.fill(&mut d.members, |v| convert::list(v, convert::text))),
    ];

    impl Hydrate for Band {
        const KIND: &'static str = "band";

        fn fields() -> &'static [FieldSpec<Self>] {
            BAND_FIELDS
        }

        fn fetch_full_row(&self, client: &Client) -> Result<Row> {
            let name = self.name.get().cloned().unwrap_or_default();
            let value = client.cached_fetch(
                "band",
                &[Some(name.as_str())],
                || client.call("band.getInfo", &[("band", name.as_str())]),
                |_| vec![name.clone()],
            )?;
            take_root(value, "band").ok_or_else(|| Error::not_found("band", name.clone()))
        }
    }

    fn named(client: &Client, name: &str) -> Entity<Band> {
        Entity::new(
            client.clone(),
            Band {
                name: Slot::Loaded(name.to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_first_read_hydrates_exactly_once() {
        let (client, transport) = mock_client();
        transport.respond(
            "band.getInfo",
            &[("band", "Queen")],
            json!({"band": {"name": "Queen", "founded": "1970", "members": ["Freddie", "Brian"]}}),
        );

        let mut band = named(&client, "Queen");
        assert_eq!(band.read(|d| &d.founded).unwrap(), Some(&1970));
        assert_eq!(band.read(|d| &d.members).unwrap().map(Vec::len), Some(2));
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_loaded_slot_needs_no_fetch() {
        let (client, transport) = mock_client();
        let mut band = named(&client, "Queen");
        assert_eq!(band.read(|d| &d.name).unwrap().map(String::as_str), Some("Queen"));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_missing_field_after_hydration_is_final() {
        let (client, transport) = mock_client();
        transport.respond("band.getInfo", &[("band", "Queen")], json!({"band": {"name": "Queen"}}));

        let mut band = named(&client, "Queen");
        assert_eq!(band.read(|d| &d.founded).unwrap(), None);
        assert_eq!(band.read(|d| &d.founded).unwrap(), None);
        assert_eq!(band.read(|d| &d.members).unwrap(), None);
        assert_eq!(transport.call_count(), 1);
        assert!(band.is_hydrated());
    }

    #[test]
    fn test_transport_failure_propagates_and_allows_retry() {
        let (client, transport) = mock_client();
        let mut band = named(&client, "Nobody");

        assert!(band.read(|d| &d.founded).is_err());
        assert!(band.data().founded.is_unset());
        assert!(!band.is_hydrated());
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_not_found_is_fetched_once() {
        let (client, transport) = mock_client();
        transport.respond(
            "band.getInfo",
            &[("band", "Nobody")],
            json!({"band": "\n"}),
        );
        let mut band = named(&client, "Nobody");

        let first = band.read(|d| &d.founded).unwrap_err();
        assert!(first.is_not_found());
        assert!(band.is_hydrated());

        assert_eq!(band.read(|d| &d.founded).unwrap(), None);
        assert_eq!(band.read(|d| &d.members).unwrap(), None);
        assert!(band.data().founded.is_unset());
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_full_row_never_hydrates() {
        let (client, transport) = mock_client();
        let row = into_row(json!({"name": "Queen"})).unwrap();
        let mut band = Entity::<Band>::from_full_row(client, &row).unwrap();
        assert_eq!(band.read(|d| &d.founded).unwrap(), None);
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_hydration_reads_through_cache() {
        let (client, transport) = mock_client();
        client.cache().set(
            &cache_key("band", "Queen"),
            json!({"band": {"name": "Queen", "founded": 1970}}),
        );

        let mut band = named(&client, "Queen");
        assert_eq!(band.read(|d| &d.founded).unwrap(), Some(&1970));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_bad_row_leaves_entity_untouched() {
        let (client, _) = mock_client();
        let mut band = named(&client, "Queen");
        let bad = into_row(json!({"members": ["a"], "founded": "long ago"})).unwrap();
        assert!(band.add_row(&bad).is_err());
        assert!(band.data().members.is_unset());
    }

    #[test]
    fn test_read_mut() {
        let (client, _) = mock_client();
        let row = into_row(json!({"name": "Queen", "members": ["Freddie"]})).unwrap();
        let mut band = Entity::<Band>::from_full_row(client, &row).unwrap();
        band.read_mut(|d| &mut d.members).unwrap().unwrap().push("Roger".into());
        assert_eq!(band.data().members.get().map(Vec::len), Some(2));
    }
}
