//! lastfm-client - typed, cache-backed access to the last.fm web service.
//!
//! Artists and albums come back as lazily loaded entities: whatever a
//! response already contained is available immediately, and the first read
//! of anything else fetches the entity's full record once. Every response is
//! kept in an injected [`cache::Cache`], so repeated lookups by name or by
//! MusicBrainz ID stay off the network.
//!
//! ```ignore
//! use lastfm_client::Client;
//!
//! let client = Client::new("your-api-key")?;
//! let mut cher = client.artists().get(Some("Cher"), None, false)?;
//! for similar in cher.similar()? {
//!     println!("{:.2} {}", similar.score, similar.artist);
//! }
//! ```

pub mod albums;
pub mod artists;
pub mod cache;
pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod memo;
pub mod model;
pub mod results;
#[cfg(test)]
pub mod test_utils;
pub mod transport;

pub use albums::{Album, AlbumCollection};
pub use artists::{Artist, ArtistCollection, SimilarArtist};
pub use cache::{BlackHoleCache, Cache, MemoryCache, SharedCache};
pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use data::{Image, ImageSize, Stats, Tag, WikiEntry};
pub use error::{ApiError, ApiErrorKind, Error, Result};
pub use results::SearchResult;
pub use transport::{HttpTransport, Transport};
