use super::node::MenuContext;
use super::options::MenuOption;
use super::{Action, Destination};
use crate::catalog::{
    Artist, Catalog, CatalogItem, CatalogPage, Collection, CollectionKind, CollectionRef, Loader,
    PlaylistSource, SearchKind, SeedKind, Track,
};
use crate::player::QueueItem;
use crate::ui::format_track;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Most seeds a recommendation request takes.
const MAX_SEEDS: usize = 5;

/// Every kind of menu screen.
#[derive(Debug, Clone)]
pub enum View {
    Main,
    Playlists(PlaylistSource),
    Collection(CollectionRef),
    Search(SearchKind),
    SearchResults {
        kind: SearchKind,
        query: String,
        cursor: Option<String>,
    },
    Track {
        track: Track,
        /// Collection to keep playing in after this track.
        context: Option<Arc<Collection>>,
    },
    Artist(Artist),
    Radio {
        seeds: Vec<String>,
        kind: SeedKind,
        title: String,
    },
    BannedArtists,
    Queue,
}

impl View {
    pub fn title(&self) -> String {
        match self {
            Self::Main => "Main menu".to_string(),
            Self::Playlists(PlaylistSource::Mine) => "Select a playlist".to_string(),
            Self::Playlists(PlaylistSource::Featured) => "Featured playlists".to_string(),
            Self::Collection(collection) => format!("Playlist [{}] selected", collection.name),
            Self::Search(kind) => {
                format!("Search for {}: type your query and press [return]", kind.label())
            }
            Self::SearchResults { kind, query, .. } => {
                format!("Search results for {} \"{}\"", kind.label(), query)
            }
            Self::Track { track, .. } => format!("Song [{}] selected", track),
            Self::Artist(artist) => format!("Artist [{}] selected", artist.name),
            Self::Radio { title, .. } => title.clone(),
            Self::BannedArtists => "Banned artists, select one to unban".to_string(),
            Self::Queue => "Queue".to_string(),
        }
    }

    pub fn include_up(&self) -> bool {
        !matches!(self, Self::Main)
    }

    /// Background fetch for views that need catalog data.
    pub fn loader(&self, catalog: &dyn Catalog) -> Option<Loader> {
        let title = self.title();
        let fetch = match self {
            Self::Playlists(source) => catalog.playlists(*source),
            Self::Collection(collection) => catalog.collection_tracks(collection),
            Self::SearchResults {
                kind,
                query,
                cursor,
            } => catalog.search(*kind, query, cursor.as_deref()),
            Self::Artist(artist) => catalog.artist_top_tracks(artist),
            Self::Radio { seeds, kind, .. } => catalog.recommendations(seeds, *kind),
            _ => return None,
        };
        Some(Loader::spawn(title, fetch))
    }

    /// The view's own options; system options are added by the node.
    pub fn options(&self, ctx: &MenuContext<'_>, results: Option<&CatalogPage>) -> Vec<MenuOption> {
        match self {
            Self::Main => main_options(ctx),
            Self::Playlists(_) => results.map(playlist_options).unwrap_or_default(),
            Self::Collection(reference) => results
                .map(|page| {
                    let collection = Arc::new(Collection::from_ref(reference, page.tracks()));
                    let radio = radio_for_tracks(&collection);
                    let mut options = track_list_options(ctx, &collection);
                    if !collection.tracks.is_empty() {
                        options.push(MenuOption::new(
                            "add",
                            "Add to queue",
                            Action::Enqueue(QueueItem::Collection(collection.clone())),
                        ));
                        options.extend(radio);
                    }
                    options
                })
                .unwrap_or_default(),
            Self::Search(_) => Vec::new(),
            Self::SearchResults { kind, query, .. } => results
                .map(|page| search_result_options(*kind, query, page))
                .unwrap_or_default(),
            Self::Track { track, context } => track_options(ctx, track, context.as_ref()),
            Self::Artist(artist) => results
                .map(|page| {
                    let top = Arc::new(Collection::generated(
                        format!("Top tracks by {}", artist.name),
                        page.tracks(),
                    ));
                    let mut options = track_list_options(ctx, &top);
                    options.push(MenuOption::new(
                        "rd",
                        format!("Radio based on {}", artist.name),
                        Destination::descend(View::Radio {
                            seeds: vec![artist.id.clone()],
                            kind: SeedKind::Artists,
                            title: format!("Radio based on {}", artist.name),
                        }),
                    ));
                    options.push(ban_option(ctx, artist));
                    options
                })
                .unwrap_or_default(),
            Self::Radio { title, .. } => results
                .map(|page| {
                    let radio = Arc::new(Collection::generated(title.clone(), page.tracks()));
                    track_list_options(ctx, &radio)
                })
                .unwrap_or_default(),
            Self::BannedArtists => ctx
                .bans
                .list()
                .into_iter()
                .enumerate()
                .map(|(i, artist)| {
                    MenuOption::new(number_key(i), artist.name.clone(), Action::UnbanArtist(artist))
                })
                .collect(),
            Self::Queue => (0..ctx.queue.len())
                .filter_map(|position| {
                    let track = ctx.queue.track_at(position)?;
                    let marker = (position == ctx.queue.position()).then_some("[playing]");
                    Some(MenuOption::new(
                        number_key(position),
                        format_track(track, marker),
                        Action::PlayQueuePosition(position),
                    ))
                })
                .collect(),
        }
    }
}

/// 1-based, right aligned to four columns.
fn number_key(index: usize) -> String {
    format!("{:>4}", index + 1)
}

fn main_options(ctx: &MenuContext<'_>) -> Vec<MenuOption> {
    let mut options = vec![
        MenuOption::new("vp", "View your playlists", Destination::descend(View::Playlists(PlaylistSource::Mine))),
        MenuOption::new("fp", "Featured playlists", Destination::descend(View::Playlists(PlaylistSource::Featured))),
        MenuOption::new("st", "Search for tracks", Destination::descend(View::Search(SearchKind::Tracks))),
        MenuOption::new("sal", "Search for albums", Destination::descend(View::Search(SearchKind::Albums))),
        MenuOption::new("sar", "Search for artists", Destination::descend(View::Search(SearchKind::Artists))),
        MenuOption::new("spl", "Search for playlists", Destination::descend(View::Search(SearchKind::Playlists))),
        MenuOption::new("b", "Banned artists", Destination::descend(View::BannedArtists)),
    ];
    if ctx.queue.has_been_loaded() {
        options.push(MenuOption::new("vq", "View queue", Destination::descend(View::Queue)));
    }
    options
}

fn playlist_options(page: &CatalogPage) -> Vec<MenuOption> {
    let mut collections: Vec<&CollectionRef> = page
        .items
        .iter()
        .filter_map(|item| match item {
            CatalogItem::Collection(collection) => Some(collection),
            _ => None,
        })
        .collect();
    collections.sort_by_key(|collection| collection.name.to_lowercase());
    collections
        .into_iter()
        .enumerate()
        .map(|(i, collection)| {
            MenuOption::new(
                number_key(i),
                collection.display_name(),
                Destination::descend(View::Collection(collection.clone())),
            )
        })
        .collect()
}

fn banned_marker(ctx: &MenuContext<'_>, track: &Track) -> Option<&'static str> {
    ctx.bans.is_track_banned(track).then_some("[artist banned]")
}

/// One option per available track, keyed by its position in the collection,
/// plus shuffle play.
fn track_list_options(ctx: &MenuContext<'_>, collection: &Arc<Collection>) -> Vec<MenuOption> {
    let mut options: Vec<MenuOption> = collection
        .tracks
        .iter()
        .enumerate()
        .filter(|(_, track)| track.available)
        .enumerate()
        .map(|(start, (position, track))| {
            MenuOption::new(
                number_key(position),
                format_track(track, banned_marker(ctx, track)),
                Action::PlayCollection {
                    collection: collection.clone(),
                    start: Some(start),
                    shuffle: None,
                },
            )
        })
        .collect();
    if !options.is_empty() {
        options.push(MenuOption::new(
            "sp",
            "Shuffle play",
            Action::PlayCollection {
                collection: collection.clone(),
                start: None,
                shuffle: Some(true),
            },
        ));
    }
    options
}

fn sample_seeds(mut ids: Vec<String>) -> Vec<String> {
    if ids.len() > MAX_SEEDS {
        ids = ids
            .choose_multiple(&mut rand::thread_rng(), MAX_SEEDS)
            .cloned()
            .collect();
    }
    ids
}

fn radio_for_tracks(collection: &Collection) -> Option<MenuOption> {
    let ids: Vec<String> = collection.available_tracks().map(|t| t.id.clone()).collect();
    if ids.is_empty() {
        return None;
    }
    let title = format!("Radio based on {}", collection.name);
    Some(MenuOption::new(
        "rd",
        title.clone(),
        Destination::descend(View::Radio {
            seeds: sample_seeds(ids),
            kind: SeedKind::Tracks,
            title,
        }),
    ))
}

fn search_result_options(kind: SearchKind, query: &str, page: &CatalogPage) -> Vec<MenuOption> {
    let results = Arc::new(Collection::generated(
        format!("Search results for \"{query}\""),
        page.tracks(),
    ));
    let mut options: Vec<MenuOption> = page
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let key = number_key(page.offset + i);
            match item {
                CatalogItem::Track(track) => MenuOption::new(
                    key,
                    track.to_string(),
                    Destination::descend(View::Track {
                        track: track.clone(),
                        context: Some(results.clone()),
                    }),
                ),
                CatalogItem::Collection(collection) => MenuOption::new(
                    key,
                    collection.display_name(),
                    Destination::descend(View::Collection(collection.clone())),
                ),
                CatalogItem::Artist(artist) => MenuOption::new(
                    key,
                    artist.name.clone(),
                    Destination::descend(View::Artist(artist.clone())),
                ),
            }
        })
        .collect();

    let mut paging = |key: &str, label: &str, cursor: &Option<String>| {
        if let Some(cursor) = cursor {
            options.push(MenuOption::new(
                key,
                label,
                Destination::descend(View::SearchResults {
                    kind,
                    query: query.to_string(),
                    cursor: Some(cursor.clone()),
                }),
            ));
        }
    };
    paging("np", "Next page", &page.next);
    paging("pp", "Previous page", &page.previous);
    options
}

fn ban_option(ctx: &MenuContext<'_>, artist: &Artist) -> MenuOption {
    if ctx.bans.is_banned(artist) {
        MenuOption::new(
            "unban",
            format!("Unban {}", artist.name),
            Action::UnbanArtist(artist.clone()),
        )
    } else {
        MenuOption::new(
            "ban",
            format!("Ban {}", artist.name),
            Action::BanArtist(artist.clone()),
        )
    }
}

fn track_options(
    ctx: &MenuContext<'_>,
    track: &Track,
    context: Option<&Arc<Collection>>,
) -> Vec<MenuOption> {
    let play = match context.and_then(|c| {
        c.available_tracks()
            .position(|candidate| candidate.id == track.id)
            .map(|start| (c.clone(), start))
    }) {
        Some((collection, start)) => Action::PlayCollection {
            collection,
            start: Some(start),
            shuffle: None,
        },
        None => Action::PlayCollection {
            collection: Arc::new(Collection::generated(track.name.clone(), vec![track.clone()])),
            start: Some(0),
            shuffle: None,
        },
    };

    let mut options = vec![MenuOption::new("pt", "Play this song", play)];
    if ctx.queue.has_been_loaded() {
        options.push(MenuOption::new(
            "pn",
            "Play this song now, then return to the queue",
            Action::PlayNowThenRemove(track.clone()),
        ));
    }
    options.push(MenuOption::new(
        "a",
        "Add to queue",
        Action::Enqueue(QueueItem::Track(track.clone())),
    ));
    options.push(MenuOption::new(
        "rd",
        format!("Radio based on {}", track.name),
        Destination::descend(View::Radio {
            seeds: vec![track.id.clone()],
            kind: SeedKind::Tracks,
            title: format!("Radio based on {}", track),
        }),
    ));

    if let Some(album) = &track.album {
        options.push(MenuOption::new(
            "al",
            format!("View album {}", album.name),
            Destination::descend(View::Collection(CollectionRef {
                id: album.id.clone(),
                name: album.name.clone(),
                owner: None,
                kind: CollectionKind::Album,
            })),
        ));
    }

    match track.artists.as_slice() {
        [] => {}
        [artist] => options.push(view_artist_option("ar".to_string(), artist)),
        artists => options.extend(
            artists
                .iter()
                .enumerate()
                .map(|(i, artist)| view_artist_option(format!("ar{}", i + 1), artist)),
        ),
    }

    if let Some(artist) = track.primary_artist() {
        options.push(ban_option(ctx, artist));
    }
    options
}

fn view_artist_option(key: String, artist: &Artist) -> MenuOption {
    MenuOption::new(
        key,
        format!("View artist {}", artist.name),
        Destination::descend(View::Artist(artist.clone())),
    )
}
