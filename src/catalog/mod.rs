// Catalog - everything we know about the remote media library
// The core only talks to the `Catalog` trait; where the data comes from is someone else's problem

pub mod loader; // background fetches with a one-shot completion
pub mod local;  // JSON-backed offline catalog

pub use loader::Loader;
pub use local::LocalCatalog;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub duration_ms: u64,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub album: Option<AlbumRef>,
}

fn default_available() -> bool {
    true
}

impl Track {
    /// The first listed artist; bans and radio seeds go by this one.
    pub fn primary_artist(&self) -> Option<&Artist> {
        self.artists.first()
    }

    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(" & ")
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artists.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} by {}", self.name, self.artist_names())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Playlist,
    Album,
    Generated,
}

/// Handle to a collection whose tracks have not been fetched yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub kind: CollectionKind,
}

impl CollectionRef {
    pub fn display_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{} by {}", self.name, owner),
            None => self.name.clone(),
        }
    }
}

/// A loaded collection: anything with tracks can be enqueued as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub kind: CollectionKind,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Collection {
    pub fn from_ref(reference: &CollectionRef, tracks: Vec<Track>) -> Self {
        Self {
            id: reference.id.clone(),
            name: reference.name.clone(),
            owner: reference.owner.clone(),
            kind: reference.kind,
            tracks,
        }
    }

    /// Ad hoc collection for search results, radio and single tracks.
    pub fn generated(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let name = name.into();
        Self {
            id: format!("generated:{name}"),
            name,
            owner: None,
            kind: CollectionKind::Generated,
            tracks,
        }
    }

    pub fn reference(&self) -> CollectionRef {
        CollectionRef {
            id: self.id.clone(),
            name: self.name.clone(),
            owner: self.owner.clone(),
            kind: self.kind,
        }
    }

    pub fn available_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|track| track.available)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogItem {
    Track(Track),
    Collection(CollectionRef),
    Artist(Artist),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Tracks,
    Albums,
    Artists,
    Playlists,
}

impl SearchKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Tracks => "tracks",
            Self::Albums => "albums",
            Self::Artists => "artists",
            Self::Playlists => "playlists",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistSource {
    Mine,
    Featured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedKind {
    Tracks,
    Artists,
}

/// One page of catalog results, possibly empty with an advisory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub offset: usize,
    pub total: usize,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub message: Option<String>,
}

impl CatalogPage {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let total = items.len();
        Self {
            items,
            total,
            ..Self::default()
        }
    }

    pub fn empty_with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.items
            .iter()
            .filter_map(|item| match item {
                CatalogItem::Track(track) => Some(track.clone()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("access denied by the catalog service")]
    Unauthorized,
    #[error("catalog service unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("catalog i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog data is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type CatalogResult = Result<CatalogPage, CatalogError>;

/// Remote catalog access. Futures are `'static` so loaders can run them on the runtime.
pub trait Catalog: Send + Sync {
    fn playlists(&self, source: PlaylistSource) -> BoxFuture<'static, CatalogResult>;

    fn collection_tracks(&self, collection: &CollectionRef) -> BoxFuture<'static, CatalogResult>;

    fn search(
        &self,
        kind: SearchKind,
        query: &str,
        cursor: Option<&str>,
    ) -> BoxFuture<'static, CatalogResult>;

    fn artist_top_tracks(&self, artist: &Artist) -> BoxFuture<'static, CatalogResult>;

    fn recommendations(&self, seeds: &[String], kind: SeedKind) -> BoxFuture<'static, CatalogResult>;
}
