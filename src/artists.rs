//! Artists.
//!
//! [`Artist`] is a lazily hydrated entity backed by `artist.getInfo`;
//! [`ArtistCollection`] (from [`Client::artists`]) looks artists up by name
//! or MusicBrainz ID and searches them.
//!
//! Fetched rows are cached under `artist:<name>` and `artist:<mbid>`, so a
//! later lookup by either identifier is served from the cache.

use std::fmt;

use serde_json::Value;

use crate::albums::Album;
use crate::cache::{SharedCache, cache_key};
use crate::client::{Client, lookup_error};
use crate::data::{Image, Stats, Tag, WikiEntry};
use crate::error::{Error, Result};
use crate::memo::memoize;
use crate::model::{Entity, FieldSpec, Hydrate, Row, Slot, convert, into_row, rows_of, take_root};
use crate::results::{Converter, SearchResult, cached_page_loader};

/// Cache namespace for artist rows.
pub const NAMESPACE: &str = "artist";

/// Cache namespace for artist search pages.
pub const SEARCH_NAMESPACE: &str = "artist_search";

/// Marker in an artist URL meaning "the name you asked for is not the
/// canonical spelling".
const NO_REDIRECT_MARKER: &str = "+noredirect";

/// Cache key of the memoized [`Artist::similar`] result.
pub fn similar_artists_key(name: &str) -> String {
    cache_key("similar_artists", name)
}

/// Cache key of the memoized [`Artist::top_albums`] result.
pub fn top_albums_key(name: &str) -> String {
    cache_key("top_albums", name)
}

/// Typed attributes of an artist.
#[derive(Debug, Clone, Default)]
pub struct ArtistData {
    pub name: Slot<String>,
    pub id: Slot<String>,
    pub biography: Slot<WikiEntry>,
    pub images: Slot<Vec<Image>>,
    pub stats: Slot<Stats>,
    pub streamable: Slot<bool>,
    pub url: Slot<String>,
    pub tags: Slot<Vec<Tag>>,
}

type Spec = FieldSpec<ArtistData>;

static FIELDS: &[Spec] = &[
    Spec::new("name", |d, f| f.fill(&mut d.name, convert::text)),
    Spec::new("mbid", |d, f| f.fill(&mut d.id, convert::text)),
    Spec::new("bio", |d, f| f.fill(&mut d.biography, WikiEntry::from_value)),
    Spec::new("image", |d, f| f.fill(&mut d.images, Image::list_from_value)),
    Spec::new("stats", |d, f| f.fill(&mut d.stats, Stats::from_value)),
    Spec::new("streamable", |d, f| f.fill(&mut d.streamable, convert::flag)),
    Spec::new("url", |d, f| f.fill(&mut d.url, convert::text)),
    Spec::new("tags", |d, f| f.fill(&mut d.tags, Tag::list_from_value)),
];

impl Hydrate for ArtistData {
    const KIND: &'static str = "artist";

    fn fields() -> &'static [FieldSpec<Self>] {
        FIELDS
    }

    fn fetch_full_row(&self, client: &Client) -> Result<Row> {
        let lookup = match self.id.get() {
            Some(mbid) => ArtistLookup::with_id(mbid),
            None => ArtistLookup {
                name: self.name.get().map(String::as_str),
                mbid: None,
            },
        };
        fetch_row(client, lookup, false)
    }
}

/// Identifiers to look an artist up by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtistLookup<'a> {
    pub name: Option<&'a str>,
    pub mbid: Option<&'a str>,
}

impl<'a> ArtistLookup<'a> {
    pub fn named(name: &'a str) -> Self {
        Self {
            name: Some(name),
            mbid: None,
        }
    }

    pub fn with_id(mbid: &'a str) -> Self {
        Self {
            name: None,
            mbid: Some(mbid),
        }
    }

    /// Drop blank identifiers.
    fn normalized(self) -> Self {
        let present = |s: Option<&'a str>| s.filter(|s| !s.trim().is_empty());
        Self {
            name: present(self.name),
            mbid: present(self.mbid),
        }
    }

    fn params(&self) -> Vec<(&'a str, &'a str)> {
        let mut params = Vec::with_capacity(2);
        if let Some(name) = self.name {
            params.push(("artist", name));
        }
        if let Some(mbid) = self.mbid {
            params.push(("mbid", mbid));
        }
        params
    }

    fn describe(&self) -> &'a str {
        self.mbid.or(self.name).unwrap_or_default()
    }
}

/// Fetch the full `artist.getInfo` row, through the cache.
///
/// Unless `no_redirect` is set, a response flagged as a misspelling is
/// replaced by the row of its first similar artist. Fresh rows are cached
/// under their name, their MBID and the requested name.
pub fn fetch_row(client: &Client, lookup: ArtistLookup<'_>, no_redirect: bool) -> Result<Row> {
    let lookup = lookup.normalized();
    if lookup.name.is_none() && lookup.mbid.is_none() {
        return Err(Error::underspecified("a name and/or a MBID is required"));
    }

    let value = client.cached_fetch(
        NAMESPACE,
        &[lookup.mbid, lookup.name],
        || request_row(client, lookup, no_redirect).map(Value::Object),
        |fresh| fan_out_keys(fresh, lookup),
    )?;
    into_row(value)
}

fn request_row(client: &Client, lookup: ArtistLookup<'_>, no_redirect: bool) -> Result<Row> {
    let requested = lookup.describe();
    let document = client
        .call("artist.getInfo", &lookup.params())
        .map_err(|e| lookup_error(e, NAMESPACE, requested))?;
    let row = take_root(document, "artist").ok_or_else(|| Error::not_found(NAMESPACE, requested))?;

    if no_redirect {
        return Ok(row);
    }
    match redirect_target(&row) {
        Some(correct) => {
            tracing::info!(requested, correct = %correct, "Following misspelling redirect");
            fetch_row(client, ArtistLookup::named(&correct), true)
        }
        None => Ok(row),
    }
}

/// The first similar artist's name, if `row` is flagged as a misspelling.
fn redirect_target(row: &Row) -> Option<String> {
    let url = row.get("url").and_then(Value::as_str)?;
    if !url.contains(NO_REDIRECT_MARKER) {
        return None;
    }
    let similar = rows_of(row.get("similar").and_then(|s| s.get("artist")));
    let first = similar.first()?;
    convert::text(first.get("name")?).ok()
}

fn fan_out_keys(fresh: &Value, lookup: ArtistLookup<'_>) -> Vec<String> {
    let mut keys: Vec<String> = ["name", "mbid"]
        .iter()
        .filter_map(|key| fresh.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    keys.extend(lookup.name.map(str::to_string));
    keys
}

/// A similar artist with its match score (0.0 to 1.0).
#[derive(Debug, Clone)]
pub struct SimilarArtist {
    pub score: f64,
    pub artist: Artist,
}

/// An artist in the last.fm database.
#[derive(Debug, Clone)]
pub struct Artist {
    entity: Entity<ArtistData>,
}

impl Artist {
    /// Build from a row; attributes the row lacks are fetched on first read.
    pub fn from_row(client: Client, row: &Row) -> Result<Self> {
        Ok(Self {
            entity: Entity::from_row(client, row)?,
        })
    }

    pub(crate) fn from_full_row(client: Client, row: &Row) -> Result<Self> {
        Ok(Self {
            entity: Entity::from_full_row(client, row)?,
        })
    }

    /// An artist known only by name.
    pub fn named(client: Client, name: impl Into<String>) -> Self {
        let data = ArtistData {
            name: Slot::Loaded(name.into()),
            ..Default::default()
        };
        Self {
            entity: Entity::new(client, data),
        }
    }

    /// An artist known only by MusicBrainz ID.
    pub fn with_id(client: Client, mbid: impl Into<String>) -> Self {
        let data = ArtistData {
            id: Slot::Loaded(mbid.into()),
            ..Default::default()
        };
        Self {
            entity: Entity::new(client, data),
        }
    }

    /// Build from a nested artist reference: a bare name or an artist row.
    pub fn from_reference(client: &Client, value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(Self::named(client.clone(), name.trim())),
            Value::Object(row) => Self::from_row(client.clone(), row),
            other => Err(Error::parse(format!("expected an artist name or row, got {other}"))),
        }
    }

    /// Keep this artist's memoized results in `cache` instead of the
    /// client's.
    pub fn with_cache(self, cache: SharedCache) -> Self {
        Self {
            entity: self.entity.with_cache(cache),
        }
    }

    /// Fetch every attribute now.
    pub fn hydrate(&mut self) -> Result<()> {
        self.entity.hydrate()
    }

    pub fn is_hydrated(&self) -> bool {
        self.entity.is_hydrated()
    }

    /// The name if already known, without fetching.
    pub fn known_name(&self) -> Option<&str> {
        self.entity.data().name.get().map(String::as_str)
    }

    pub fn name(&mut self) -> Result<Option<&str>> {
        Ok(self.entity.read(|d| &d.name)?.map(String::as_str))
    }

    /// MusicBrainz ID.
    pub fn id(&mut self) -> Result<Option<&str>> {
        Ok(self.entity.read(|d| &d.id)?.map(String::as_str))
    }

    pub fn biography(&mut self) -> Result<Option<&WikiEntry>> {
        self.entity.read(|d| &d.biography)
    }

    pub fn images(&mut self) -> Result<Option<&[Image]>> {
        Ok(self.entity.read(|d| &d.images)?.map(Vec::as_slice))
    }

    /// Listening statistics.
    pub fn stats(&mut self) -> Result<Option<Stats>> {
        Ok(self.entity.read(|d| &d.stats)?.copied())
    }

    /// Whether the artist can be streamed on last.fm.
    pub fn streamable(&mut self) -> Result<Option<bool>> {
        Ok(self.entity.read(|d| &d.streamable)?.copied())
    }

    /// The artist's last.fm page.
    pub fn url(&mut self) -> Result<Option<&str>> {
        Ok(self.entity.read(|d| &d.url)?.map(String::as_str))
    }

    /// Top tags.
    pub fn tags(&mut self) -> Result<Option<&[Tag]>> {
        Ok(self.entity.read(|d| &d.tags)?.map(Vec::as_slice))
    }

    /// Artists similar to this one, with match scores, most similar first.
    ///
    /// Memoized under [`similar_artists_key`].
    pub fn similar(&mut self) -> Result<Vec<SimilarArtist>> {
        let name = self.required_name()?;
        let client = self.entity.client().clone();

        let rows: Vec<(f64, Row)> = memoize(&self.entity, &similar_artists_key(&name), || {
            let document = client
                .call("artist.getSimilar", &[("artist", name.as_str())])
                .map_err(|e| lookup_error(e, NAMESPACE, &name))?;
            rows_of(document.get("similarartists").and_then(|s| s.get("artist")))
                .into_iter()
                .map(|mut row| -> Result<(f64, Row)> {
                    let score = match row.remove("match") {
                        Some(raw) => convert::float(&raw).map_err(|e| Error::conversion("match", e))?,
                        None => 0.0,
                    };
                    Ok((score, row))
                })
                .collect()
        })?;

        rows.iter()
            .map(|(score, row)| -> Result<SimilarArtist> {
                Ok(SimilarArtist {
                    score: *score,
                    artist: Artist::from_row(client.clone(), row)?,
                })
            })
            .collect()
    }

    /// The artist's most played albums.
    ///
    /// Memoized under [`top_albums_key`].
    pub fn top_albums(&mut self) -> Result<Vec<Album>> {
        let name = self.required_name()?;
        let client = self.entity.client().clone();

        let rows: Vec<Row> = memoize(&self.entity, &top_albums_key(&name), || {
            let document = client
                .call("artist.getTopAlbums", &[("artist", name.as_str())])
                .map_err(|e| lookup_error(e, NAMESPACE, &name))?;
            Ok(rows_of(document.get("topalbums").and_then(|t| t.get("album"))))
        })?;

        rows.iter()
            .map(|row| Album::from_row(client.clone(), row))
            .collect()
    }

    fn required_name(&mut self) -> Result<String> {
        self.name()?
            .map(str::to_string)
            .ok_or_else(|| Error::underspecified("artist has no name"))
    }
}

impl fmt::Display for Artist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.entity.data();
        write!(f, "<Artist \"{}\"", self.known_name().unwrap_or_default())?;
        if let Some(id) = data.id.get() {
            write!(f, " ({id})")?;
        }
        f.write_str(">")
    }
}

/// Artist lookups, from [`Client::artists`].
#[derive(Debug, Clone, Copy)]
pub struct ArtistCollection<'a> {
    client: &'a Client,
}

impl<'a> ArtistCollection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Get an artist by name and/or MusicBrainz ID.
    ///
    /// A name the service flags as a misspelling is resolved to the first
    /// similar artist unless `no_redirect` is set; the correction is cached
    /// under the requested name too.
    pub fn get(&self, name: Option<&str>, id: Option<&str>, no_redirect: bool) -> Result<Artist> {
        let row = fetch_row(self.client, ArtistLookup { name, mbid: id }, no_redirect)?;
        Artist::from_full_row(self.client.clone(), &row)
    }

    /// Search artists matching `name`.
    pub fn search(&self, name: &str) -> Result<SearchResult<Artist>> {
        let loader = cached_page_loader(self.client, SEARCH_NAMESPACE, "artist.search", "artist", name);
        let client = self.client.clone();
        let converter: Converter<Artist> = Box::new(move |row| Artist::from_row(client.clone(), row));
        SearchResult::new(loader, "artist", converter)
    }
}
