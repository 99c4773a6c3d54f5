//! Test utilities and fixtures for lastfm-client tests.
//!
//! This module provides a client wired to a [`MockTransport`] plus canned
//! response documents shaped like the service's, to reduce boilerplate in
//! tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{artist_info, mock_client};
//!
//! let (client, transport) = mock_client();
//! transport.respond("artist.getInfo", &[("artist", "Cher")], artist_info("Cher", "bfcc6d75"));
//! let artist = client.artists().get(Some("Cher"), None, false)?;
//! ```

use std::sync::Arc;

use serde_json::{Value, json};

use crate::cache::MemoryCache;
use crate::client::Client;
use crate::transport::mocks::MockTransport;

/// Creates a client backed by a mock transport and a fresh in-memory cache.
///
/// # Returns
///
/// A tuple of (client, transport handle). Use the handle to register
/// responses and count calls.
pub fn mock_client() -> (Client, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let client = Client::with_parts(transport.clone(), Arc::new(MemoryCache::new()));
    (client, transport)
}

/// Install a test-friendly tracing subscriber (idempotent).
///
/// Run tests with `RUST_LOG=lastfm_client=debug` to see cache traffic.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An `artist.getInfo` response document.
pub fn artist_info(name: &str, mbid: &str) -> Value {
    json!({
        "artist": {
            "name": name,
            "mbid": mbid,
            "url": format!("https://www.last.fm/music/{}", name.replace(' ', "+")),
            "image": [
                {"#text": format!("https://img.example/{mbid}/s.png"), "size": "small"},
                {"#text": format!("https://img.example/{mbid}/l.png"), "size": "large"},
            ],
            "streamable": "0",
            "stats": {"listeners": "1523012", "playcount": "23456789"},
            "similar": {"artist": [
                {"name": "Madonna", "url": "https://www.last.fm/music/Madonna"},
            ]},
            "tags": {"tag": [
                {"name": "pop", "url": "https://www.last.fm/tag/pop"},
                {"name": "dance", "url": "https://www.last.fm/tag/dance"},
            ]},
            "bio": {
                "published": "Tue, 15 Sep 2009 05:39:26 +0000",
                "summary": format!("{name} is an artist."),
                "content": format!("{name} is an artist with a long career."),
            },
        }
    })
}

/// An `artist.getInfo` response for a name the service considers a
/// misspelling of `correct`.
pub fn misspelled_artist_info(name: &str, correct: &str) -> Value {
    json!({
        "artist": {
            "name": name,
            "mbid": "",
            "url": format!("https://www.last.fm/music/+noredirect/{name}"),
            "similar": {"artist": [
                {"name": correct, "url": format!("https://www.last.fm/music/{correct}")},
                {"name": "Someone Else", "url": "https://www.last.fm/music/Someone+Else"},
            ]},
        }
    })
}

/// An `album.getInfo` response document.
pub fn album_info(name: &str, artist: &str, mbid: &str) -> Value {
    json!({
        "album": {
            "name": name,
            "artist": artist,
            "mbid": mbid,
            "url": format!("https://www.last.fm/music/{artist}/{name}"),
            "releasedate": "    6 Apr 1999, 00:00",
            "image": [
                {"#text": format!("https://img.example/{mbid}/cover.png"), "size": "extralarge"},
            ],
            "listeners": "501337",
            "playcount": "3141592",
            "toptags": {"tag": [
                {"name": "pop", "url": "https://www.last.fm/tag/pop"},
            ]},
            "wiki": {
                "published": "Sun, 27 Jul 2008 15:44:58 +0000",
                "summary": format!("{name} is an album by {artist}."),
                "content": "",
            },
        }
    })
}

/// One page of a search response.
///
/// `field` is the entity kind (`"artist"` or `"album"`); the items land
/// under `results.<field>matches.<field>`.
pub fn search_page(field: &str, total: usize, items: Vec<Value>) -> Value {
    let mut matches = serde_json::Map::new();
    matches.insert(field.to_string(), Value::Array(items));

    let mut results = serde_json::Map::new();
    results.insert("opensearch:totalResults".to_string(), json!(total.to_string()));
    results.insert(format!("{field}matches"), Value::Object(matches));

    json!({ "results": results })
}

/// `count` artist search rows named `"<prefix> <n>"`, numbered from `first`.
pub fn artist_rows(prefix: &str, first: usize, count: usize) -> Vec<Value> {
    (first..first + count)
        .map(|n| {
            json!({
                "name": format!("{prefix} {n}"),
                "mbid": format!("mbid-{n}"),
                "listeners": "100",
                "url": format!("https://www.last.fm/music/{prefix}+{n}"),
                "streamable": "0",
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::take_root;

    #[test]
    fn test_mock_client_starts_empty() {
        let (client, transport) = mock_client();
        assert_eq!(transport.call_count(), 0);
        assert!(!client.cache().contains("artist:Cher"));
    }

    #[test]
    fn test_artist_info_fixture_shape() {
        let row = take_root(artist_info("Cher", "bfcc6d75"), "artist").unwrap();
        assert_eq!(row["name"], "Cher");
        assert_eq!(row["mbid"], "bfcc6d75");
        assert!(!row["url"].as_str().unwrap().contains("+noredirect"));
    }

    #[test]
    fn test_search_page_fixture_shape() {
        let page = search_page("album", 3, vec![json!({"name": "a"})]);
        assert_eq!(page["results"]["opensearch:totalResults"], "3");
        assert_eq!(page["results"]["albummatches"]["album"][0]["name"], "a");
    }
}
