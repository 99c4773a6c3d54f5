//! Albums.
//!
//! [`Album`] is a lazily hydrated entity backed by `album.getInfo`. An album
//! is identified either by its MusicBrainz ID or by the pair (artist name,
//! album name); rows are cached under `album:<artist>/<album>` and
//! `album:<mbid>`.

use std::fmt;

use chrono::NaiveDate;
use serde_json::Value;

use crate::artists::Artist;
use crate::cache::SharedCache;
use crate::client::{Client, lookup_error};
use crate::data::{Image, Tag, WikiEntry};
use crate::error::{Error, Result};
use crate::model::{Entity, FieldSpec, Hydrate, Row, Slot, convert, into_row, take_root};
use crate::results::{Converter, SearchResult, cached_page_loader};

/// Cache namespace for album rows.
pub const NAMESPACE: &str = "album";

/// Cache namespace for album search pages.
pub const SEARCH_NAMESPACE: &str = "album_search";

/// Typed attributes of an album.
#[derive(Debug, Clone, Default)]
pub struct AlbumData {
    pub name: Slot<String>,
    pub artist: Slot<Artist>,
    pub id: Slot<String>,
    pub release_date: Slot<NaiveDate>,
    pub description: Slot<WikiEntry>,
    pub images: Slot<Vec<Image>>,
    pub listeners: Slot<u64>,
    pub play_count: Slot<u64>,
    pub tags: Slot<Vec<Tag>>,
    pub url: Slot<String>,
}

type Spec = FieldSpec<AlbumData>;

static FIELDS: &[Spec] = &[
    Spec::new("name", |d, f| f.fill(&mut d.name, convert::text)),
    Spec::with_owner("artist", |d, f, client| {
        f.fill(&mut d.artist, |v| Artist::from_reference(client, v))
    }),
    Spec::new("mbid", |d, f| f.fill(&mut d.id, convert::text)),
    Spec::new("releasedate", |d, f| f.fill(&mut d.release_date, convert::date)),
    Spec::new("wiki", |d, f| f.fill(&mut d.description, WikiEntry::from_value)),
    Spec::new("image", |d, f| f.fill(&mut d.images, Image::list_from_value)),
    Spec::new("listeners", |d, f| f.fill(&mut d.listeners, convert::integer)),
    Spec::new("playcount", |d, f| f.fill(&mut d.play_count, convert::integer)),
    Spec::new("toptags", |d, f| f.fill(&mut d.tags, Tag::list_from_value)),
    Spec::new("url", |d, f| f.fill(&mut d.url, convert::text)),
];

impl Hydrate for AlbumData {
    const KIND: &'static str = "album";

    fn fields() -> &'static [FieldSpec<Self>] {
        FIELDS
    }

    fn fetch_full_row(&self, client: &Client) -> Result<Row> {
        let lookup = match self.id.get() {
            Some(mbid) => AlbumLookup {
                mbid: Some(mbid.as_str()),
                ..Default::default()
            },
            None => AlbumLookup {
                name: self.name.get().map(String::as_str),
                artist: self.artist.get().and_then(Artist::known_name),
                mbid: None,
            },
        };
        fetch_row(client, lookup)
    }
}

/// Identifiers to look an album up by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlbumLookup<'a> {
    pub name: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub mbid: Option<&'a str>,
}

impl<'a> AlbumLookup<'a> {
    fn normalized(self) -> Self {
        let present = |s: Option<&'a str>| s.filter(|s| !s.trim().is_empty());
        let (name, artist) = match (present(self.name), present(self.artist)) {
            (Some(name), Some(artist)) => (Some(name), Some(artist)),
            _ => (None, None),
        };
        Self {
            name,
            artist,
            mbid: present(self.mbid),
        }
    }

    /// `"<artist>/<album>"`, when both are known.
    fn qualified_name(&self) -> Option<String> {
        Some(qualified_name(self.artist?, self.name?))
    }

    fn params(&self) -> Vec<(&'a str, &'a str)> {
        let mut params = Vec::with_capacity(3);
        if let (Some(artist), Some(name)) = (self.artist, self.name) {
            params.push(("artist", artist));
            params.push(("album", name));
        }
        if let Some(mbid) = self.mbid {
            params.push(("mbid", mbid));
        }
        params
    }
}

fn qualified_name(artist: &str, album: &str) -> String {
    format!("{artist}/{album}")
}

/// Fetch the full `album.getInfo` row, through the cache.
pub fn fetch_row(client: &Client, lookup: AlbumLookup<'_>) -> Result<Row> {
    let lookup = lookup.normalized();
    let qualified = lookup.qualified_name();
    if qualified.is_none() && lookup.mbid.is_none() {
        return Err(Error::underspecified(
            "an MBID or an artist and album name is required",
        ));
    }
    let requested = qualified.as_deref().or(lookup.mbid).unwrap_or_default();

    let value = client.cached_fetch(
        NAMESPACE,
        &[qualified.as_deref(), lookup.mbid],
        || {
            let document = client
                .call("album.getInfo", &lookup.params())
                .map_err(|e| lookup_error(e, NAMESPACE, requested))?;
            take_root(document, "album")
                .map(Value::Object)
                .ok_or_else(|| Error::not_found(NAMESPACE, requested))
        },
        |fresh| {
            let mut keys = Vec::with_capacity(3);
            let artist = match fresh.get("artist") {
                Some(Value::Object(row)) => row.get("name").and_then(Value::as_str),
                Some(other) => other.as_str(),
                None => None,
            };
            if let (Some(artist), Some(name)) = (artist, fresh.get("name").and_then(Value::as_str)) {
                keys.push(qualified_name(artist, name));
            }
            keys.extend(fresh.get("mbid").and_then(Value::as_str).map(str::to_string));
            keys.extend(qualified.clone());
            keys
        },
    )?;
    into_row(value)
}

/// An album in the last.fm database.
#[derive(Debug, Clone)]
pub struct Album {
    entity: Entity<AlbumData>,
}

impl Album {
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

    /// An album known only by its name and its artist's name.
    pub fn named(client: Client, name: impl Into<String>, artist: impl Into<String>) -> Self {
        let data = AlbumData {
            name: Slot::Loaded(name.into()),
            artist: Slot::Loaded(Artist::named(client.clone(), artist)),
            ..Default::default()
        };
        Self {
            entity: Entity::new(client, data),
        }
    }

    /// An album known only by MusicBrainz ID.
    pub fn with_id(client: Client, mbid: impl Into<String>) -> Self {
        let data = AlbumData {
            id: Slot::Loaded(mbid.into()),
            ..Default::default()
        };
        Self {
            entity: Entity::new(client, data),
        }
    }

    pub fn with_cache(self, cache: SharedCache) -> Self {
        Self {
            entity: self.entity.with_cache(cache),
        }
    }

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

    /// The artist who made this album.
    pub fn artist(&mut self) -> Result<Option<&Artist>> {
        self.entity.read(|d| &d.artist)
    }

    /// Mutable access to the artist, e.g. to read its own lazy attributes.
    pub fn artist_mut(&mut self) -> Result<Option<&mut Artist>> {
        self.entity.read_mut(|d| &mut d.artist)
    }

    /// MusicBrainz ID.
    pub fn id(&mut self) -> Result<Option<&str>> {
        Ok(self.entity.read(|d| &d.id)?.map(String::as_str))
    }

    pub fn release_date(&mut self) -> Result<Option<NaiveDate>> {
        Ok(self.entity.read(|d| &d.release_date)?.copied())
    }

    /// The wiki entry describing the album.
    pub fn description(&mut self) -> Result<Option<&WikiEntry>> {
        self.entity.read(|d| &d.description)
    }

    /// Images, typically cover art.
    pub fn images(&mut self) -> Result<Option<&[Image]>> {
        Ok(self.entity.read(|d| &d.images)?.map(Vec::as_slice))
    }

    pub fn listeners(&mut self) -> Result<Option<u64>> {
        Ok(self.entity.read(|d| &d.listeners)?.copied())
    }

    pub fn play_count(&mut self) -> Result<Option<u64>> {
        Ok(self.entity.read(|d| &d.play_count)?.copied())
    }

    /// Top tags. Untagged albums have an empty list.
    pub fn tags(&mut self) -> Result<&[Tag]> {
        Ok(self.entity.read(|d| &d.tags)?.map_or(&[][..], Vec::as_slice))
    }

    /// The album's last.fm page.
    pub fn url(&mut self) -> Result<Option<&str>> {
        Ok(self.entity.read(|d| &d.url)?.map(String::as_str))
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.entity.data();
        let artist = data.artist.get().and_then(Artist::known_name);
        write!(
            f,
            "<Album \"{}\" by \"{}\"",
            self.known_name().unwrap_or_default(),
            artist.unwrap_or_default()
        )?;
        if let Some(id) = data.id.get() {
            write!(f, " ({id})")?;
        }
        f.write_str(">")
    }
}

/// Album lookups, from [`Client::albums`].
#[derive(Debug, Clone, Copy)]
pub struct AlbumCollection<'a> {
    client: &'a Client,
}

impl<'a> AlbumCollection<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Get an album by MusicBrainz ID, or by album and artist name.
    pub fn get(&self, name: Option<&str>, artist: Option<&str>, id: Option<&str>) -> Result<Album> {
        let row = fetch_row(self.client, AlbumLookup { name, artist, mbid: id })?;
        Album::from_full_row(self.client.clone(), &row)
    }

    /// Search albums named `name`.
    pub fn search(&self, name: &str) -> Result<SearchResult<Album>> {
        let loader = cached_page_loader(self.client, SEARCH_NAMESPACE, "album.search", "album", name);
        let client = self.client.clone();
        let converter: Converter<Album> = Box::new(move |row| Album::from_row(client.clone(), row));
        SearchResult::new(loader, "album", converter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{album_info, artist_info, mock_client, search_page};
    use serde_json::json;

    const BELIEVE_MBID: &str = "63b3a8ca-26f2-4e2b-b867-647a6ec2bebd";

    fn believe_params() -> [(&'static str, &'static str); 2] {
        [("artist", "Cher"), ("album", "Believe")]
    }

    #[test]
    fn test_get_by_name() {
        let (client, transport) = mock_client();
        transport.respond("album.getInfo", &believe_params(), album_info("Believe", "Cher", BELIEVE_MBID));

        let mut album = client.albums().get(Some("Believe"), Some("Cher"), None).unwrap();
        assert_eq!(album.id().unwrap(), Some(BELIEVE_MBID));
        assert_eq!(album.release_date().unwrap(), NaiveDate::from_ymd_opt(1999, 4, 6));
        assert_eq!(album.listeners().unwrap(), Some(501_337));
        assert_eq!(album.play_count().unwrap(), Some(3_141_592));
        assert_eq!(album.tags().unwrap()[0].name, "pop");
        assert_eq!(album.images().unwrap().map(<[Image]>::len), Some(1));
        assert!(album.description().unwrap().is_some());
        assert_eq!(album.artist().unwrap().and_then(Artist::known_name), Some("Cher"));
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_fan_out_keys() {
        let (client, transport) = mock_client();
        transport.respond("album.getInfo", &believe_params(), album_info("Believe", "Cher", BELIEVE_MBID));

        client.albums().get(Some("Believe"), Some("Cher"), None).unwrap();
        assert!(client.cache().contains("album:Cher/Believe"));
        assert!(client.cache().contains(&format!("album:{BELIEVE_MBID}")));

        let by_id = client.albums().get(None, None, Some(BELIEVE_MBID)).unwrap();
        assert_eq!(by_id.known_name(), Some("Believe"));
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_get_requires_mbid_or_both_names() {
        let (client, transport) = mock_client();
        for (name, artist) in [(None, None), (Some("Believe"), None), (None, Some("Cher"))] {
            let err = client.albums().get(name, artist, None).unwrap_err();
            assert!(matches!(err, Error::UnderspecifiedRequest(_)));
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_unknown_album_is_not_found() {
        let (client, transport) = mock_client();
        transport.respond(
            "album.getInfo",
            &[("artist", "Cher"), ("album", "Nothing")],
            json!({"error": 6, "message": "Album not found"}),
        );
        let err = client.albums().get(Some("Nothing"), Some("Cher"), None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_named_album_hydrates_once() {
        let (client, transport) = mock_client();
        transport.respond("album.getInfo", &believe_params(), album_info("Believe", "Cher", BELIEVE_MBID));

        let mut album = Album::named(client, "Believe", "Cher");
        assert_eq!(album.name().unwrap(), Some("Believe"));
        assert_eq!(transport.call_count(), 0);

        assert_eq!(album.play_count().unwrap(), Some(3_141_592));
        assert!(album.url().unwrap().is_some());
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_id_only_album_hydrates_by_mbid() {
        let (client, transport) = mock_client();
        transport.respond("album.getInfo", &[("mbid", BELIEVE_MBID)], album_info("Believe", "Cher", BELIEVE_MBID));

        let mut album = Album::with_id(client, BELIEVE_MBID);
        assert_eq!(album.name().unwrap(), Some("Believe"));
        assert_eq!(transport.calls()[0].param("mbid"), Some(BELIEVE_MBID));
    }

    #[test]
    fn test_untagged_album_has_no_tags() {
        let (client, transport) = mock_client();
        let mut doc = album_info("Believe", "Cher", BELIEVE_MBID);
        doc["album"]["toptags"] = json!("\n");
        transport.respond("album.getInfo", &believe_params(), doc);

        let mut album = client.albums().get(Some("Believe"), Some("Cher"), None).unwrap();
        assert!(album.tags().unwrap().is_empty());
    }

    #[test]
    fn test_nested_artist_hydrates_separately() {
        let (client, transport) = mock_client();
        transport
            .respond("album.getInfo", &believe_params(), album_info("Believe", "Cher", BELIEVE_MBID))
            .respond("artist.getInfo", &[("artist", "Cher")], artist_info("Cher", "bfcc6d75"));

        let mut album = client.albums().get(Some("Believe"), Some("Cher"), None).unwrap();
        let artist = album.artist_mut().unwrap().unwrap();
        assert!(artist.stats().unwrap().is_some());
        assert_eq!(transport.calls_to("artist.getInfo"), 1);
        assert_eq!(transport.calls_to("album.getInfo"), 1);
    }

    #[test]
    fn test_bad_release_date_is_a_conversion_error() {
        let (client, transport) = mock_client();
        let mut doc = album_info("Believe", "Cher", BELIEVE_MBID);
        doc["album"]["releasedate"] = json!("some day");
        transport.respond("album.getInfo", &believe_params(), doc);

        let err = client.albums().get(Some("Believe"), Some("Cher"), None).unwrap_err();
        assert!(matches!(err, Error::Conversion { field: "releasedate", .. }));
    }

    #[test]
    fn test_search_uses_album_namespace() {
        let (client, transport) = mock_client();
        transport.respond(
            "album.search",
            &[("album", "believe"), ("page", "1")],
            search_page(
                "album",
                2,
                vec![
                    json!({"name": "Believe", "artist": "Cher", "mbid": BELIEVE_MBID}),
                    json!({"name": "Believe", "artist": "Justin Bieber"}),
                ],
            ),
        );

        let results = client.albums().search("believe").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].to_string(), "<Album \"Believe\" by \"Justin Bieber\">");
        assert!(client.cache().contains("album_search:believe:1"));
        assert!(!client.cache().contains("artist_search:believe:1"));

        client.albums().search("believe").unwrap();
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_display() {
        let (client, transport) = mock_client();
        transport.respond("album.getInfo", &believe_params(), album_info("Believe", "Cher", BELIEVE_MBID));

        let album = client.albums().get(Some("Believe"), Some("Cher"), None).unwrap();
        assert_eq!(album.to_string(), format!("<Album \"Believe\" by \"Cher\" ({BELIEVE_MBID})>"));
    }
}
