use super::{
    Artist, Catalog, CatalogError, CatalogItem, CatalogPage, CatalogResult, Collection,
    CollectionRef, PlaylistSource, SearchKind, SeedKind, Track,
};
use futures::future::{self, BoxFuture, FutureExt};
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PAGE_SIZE: usize = 20;
const TOP_TRACKS: usize = 10;
const RADIO_SIZE: usize = 20;

/// On-disk shape of an offline catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub playlists: Vec<Collection>,
    #[serde(default)]
    pub featured: Vec<Collection>,
    #[serde(default)]
    pub albums: Vec<Collection>,
}

/// Catalog served from a JSON file. Stands in for the remote service.
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    data: Arc<CatalogData>,
}

impl LocalCatalog {
    pub fn new(data: CatalogData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let data: CatalogData = serde_json::from_str(&content)?;
        info!(
            "Loaded catalog from {} ({} playlists, {} featured, {} albums)",
            path.display(),
            data.playlists.len(),
            data.featured.len(),
            data.albums.len()
        );
        Ok(Self::new(data))
    }

    /// Missing or broken catalog files give an empty catalog instead of a dead session.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Could not load catalog {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.data
            .playlists
            .iter()
            .chain(self.data.featured.iter())
            .chain(self.data.albums.iter())
    }

    fn all_tracks(&self) -> Vec<Track> {
        let mut seen = HashSet::new();
        self.collections()
            .flat_map(|collection| collection.tracks.iter())
            .filter(|track| seen.insert(track.id.clone()))
            .cloned()
            .collect()
    }

    fn all_artists(&self) -> Vec<Artist> {
        let mut seen = HashSet::new();
        self.all_tracks()
            .into_iter()
            .flat_map(|track| track.artists.into_iter())
            .filter(|artist| seen.insert(artist.id.clone()))
            .collect()
    }

    fn search_now(&self, kind: SearchKind, query: &str, cursor: Option<&str>) -> CatalogPage {
        let matcher = SkimMatcherV2::default().ignore_case();
        let candidates: Vec<(String, CatalogItem)> = match kind {
            SearchKind::Tracks => self
                .all_tracks()
                .into_iter()
                .map(|track| (track.to_string(), CatalogItem::Track(track)))
                .collect(),
            SearchKind::Albums => self
                .data
                .albums
                .iter()
                .map(|album| (album.name.clone(), CatalogItem::Collection(album.reference())))
                .collect(),
            SearchKind::Artists => self
                .all_artists()
                .into_iter()
                .map(|artist| (artist.name.clone(), CatalogItem::Artist(artist)))
                .collect(),
            SearchKind::Playlists => self
                .data
                .playlists
                .iter()
                .chain(self.data.featured.iter())
                .map(|list| (list.name.clone(), CatalogItem::Collection(list.reference())))
                .collect(),
        };

        let mut scored: Vec<(i64, CatalogItem)> = candidates
            .into_iter()
            .filter_map(|(text, item)| matcher.fuzzy_match(&text, query).map(|score| (score, item)))
            .collect();
        // Best match first, ties keep catalog order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let total = scored.len();
        let offset = cursor
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(0)
            .min(total);
        let items: Vec<CatalogItem> = scored
            .into_iter()
            .skip(offset)
            .take(PAGE_SIZE)
            .map(|(_, item)| item)
            .collect();

        debug!(
            "Search {} '{}' offset {}: {} of {} matches",
            kind.label(),
            query,
            offset,
            items.len(),
            total
        );

        CatalogPage {
            offset,
            total,
            previous: (offset > 0).then(|| offset.saturating_sub(PAGE_SIZE).to_string()),
            next: (offset + PAGE_SIZE < total).then(|| (offset + PAGE_SIZE).to_string()),
            message: None,
            items,
        }
    }

    fn recommend_now(&self, seeds: &[String], kind: SeedKind) -> CatalogPage {
        let tracks = self.all_tracks();
        let seed_set: HashSet<&str> = seeds.iter().map(String::as_str).collect();

        let seed_artists: HashSet<String> = match kind {
            SeedKind::Artists => seeds.iter().cloned().collect(),
            SeedKind::Tracks => tracks
                .iter()
                .filter(|track| seed_set.contains(track.id.as_str()))
                .flat_map(|track| track.artists.iter().map(|artist| artist.id.clone()))
                .collect(),
        };

        let not_a_seed = |track: &&Track| !seed_set.contains(track.id.as_str());
        let mut pool: Vec<Track> = tracks
            .iter()
            .filter(not_a_seed)
            .filter(|track| track.artists.iter().any(|a| seed_artists.contains(&a.id)))
            .cloned()
            .collect();
        if pool.is_empty() {
            pool = tracks.iter().filter(not_a_seed).cloned().collect();
        }

        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(RADIO_SIZE);
        CatalogPage::new(pool.into_iter().map(CatalogItem::Track).collect())
    }
}

impl Catalog for LocalCatalog {
    fn playlists(&self, source: PlaylistSource) -> BoxFuture<'static, CatalogResult> {
        let lists = match source {
            PlaylistSource::Mine => &self.data.playlists,
            PlaylistSource::Featured => &self.data.featured,
        };
        let items = lists
            .iter()
            .map(|list| CatalogItem::Collection(list.reference()))
            .collect();
        future::ready(Ok(CatalogPage::new(items))).boxed()
    }

    fn collection_tracks(&self, collection: &CollectionRef) -> BoxFuture<'static, CatalogResult> {
        let result = self
            .collections()
            .find(|candidate| candidate.id == collection.id)
            .map(|found| {
                CatalogPage::new(found.tracks.iter().cloned().map(CatalogItem::Track).collect())
            })
            .ok_or_else(|| CatalogError::NotFound(collection.id.clone()));
        future::ready(result).boxed()
    }

    fn search(
        &self,
        kind: SearchKind,
        query: &str,
        cursor: Option<&str>,
    ) -> BoxFuture<'static, CatalogResult> {
        future::ready(Ok(self.search_now(kind, query, cursor))).boxed()
    }

    fn artist_top_tracks(&self, artist: &Artist) -> BoxFuture<'static, CatalogResult> {
        let items = self
            .all_tracks()
            .into_iter()
            .filter(|track| track.artists.iter().any(|a| a.id == artist.id))
            .take(TOP_TRACKS)
            .map(CatalogItem::Track)
            .collect();
        future::ready(Ok(CatalogPage::new(items))).boxed()
    }

    fn recommendations(&self, seeds: &[String], kind: SeedKind) -> BoxFuture<'static, CatalogResult> {
        future::ready(Ok(self.recommend_now(seeds, kind))).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{playlist, track};
    use crate::catalog::CollectionKind;
    use std::io::Write;

    fn catalog() -> LocalCatalog {
        let mut album = playlist("Hybrid Theory", vec![track("Papercut", "Linkin Park")]);
        album.kind = CollectionKind::Album;
        album.id = "album:hybrid".into();
        LocalCatalog::new(CatalogData {
            playlists: vec![playlist(
                "Workout",
                vec![
                    track("Papercut", "Linkin Park"),
                    track("Numb", "Linkin Park"),
                    track("Holiday", "Green Day"),
                ],
            )],
            featured: vec![playlist("Chill", vec![track("Teardrop", "Massive Attack")])],
            albums: vec![album],
        })
    }

    #[tokio::test]
    async fn search_tracks_matches_fuzzily_and_dedups() {
        let page = catalog()
            .search(SearchKind::Tracks, "papr", None)
            .await
            .expect("search");
        assert_eq!(page.total, 1);
        assert_eq!(page.tracks()[0].name, "Papercut");
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
    }

    #[tokio::test]
    async fn search_pages_by_offset_cursor() {
        let tracks = (0..25).map(|i| track(&format!("Song {i}"), "Band")).collect();
        let catalog = LocalCatalog::new(CatalogData {
            playlists: vec![playlist("Big", tracks)],
            ..CatalogData::default()
        });
        let first = catalog.search(SearchKind::Tracks, "song", None).await.unwrap();
        assert_eq!(first.items.len(), PAGE_SIZE);
        assert_eq!(first.next.as_deref(), Some("20"));

        let second = catalog
            .search(SearchKind::Tracks, "song", first.next.as_deref())
            .await
            .unwrap();
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.offset, 20);
        assert_eq!(second.previous.as_deref(), Some("0"));
        assert!(second.next.is_none());
    }

    #[tokio::test]
    async fn collection_tracks_unknown_id_is_not_found() {
        let missing = CollectionRef {
            id: "nope".into(),
            name: "Nope".into(),
            owner: None,
            kind: CollectionKind::Playlist,
        };
        let result = catalog().collection_tracks(&missing).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn top_tracks_belong_to_the_artist() {
        let artist = track("x", "Linkin Park").artists[0].clone();
        let page = catalog().artist_top_tracks(&artist).await.unwrap();
        let names: Vec<_> = page.tracks().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Papercut", "Numb"]);
    }

    #[tokio::test]
    async fn radio_prefers_seed_artists_and_skips_seeds() {
        let seed = track("Papercut", "Linkin Park").id;
        let page = catalog()
            .recommendations(&[seed.clone()], SeedKind::Tracks)
            .await
            .unwrap();
        let tracks = page.tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "Numb");
        assert!(tracks.iter().all(|t| t.id != seed));
    }

    #[test]
    fn loads_catalog_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        let data = CatalogData {
            playlists: vec![playlist("Mix", vec![track("A", "x")])],
            ..CatalogData::default()
        };
        write!(file, "{}", serde_json::to_string(&data).unwrap()).unwrap();

        let catalog = LocalCatalog::load(file.path()).expect("load");
        assert_eq!(catalog.all_tracks().len(), 1);
    }

    #[test]
    fn missing_catalog_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = LocalCatalog::load_or_empty(&dir.path().join("missing.json"));
        assert!(catalog.all_tracks().is_empty());
    }
}
