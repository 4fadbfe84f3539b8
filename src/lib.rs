// tunedeck library - the pieces behind the terminal client
// The catalog is a trait, the engine is a trait, everything else is plain state

pub mod behavior; // banned artists
pub mod catalog;  // catalog model, loaders, offline JSON catalog
pub mod config;   // settings and preferences
pub mod menu;     // typed-ahead menus and navigation
pub mod player;   // playback queue and the player screen
pub mod ui;       // display, input, navigator

// Export the stuff other modules actually use
pub use behavior::BanList;
pub use catalog::{Catalog, CatalogPage, Collection, LocalCatalog, Track};
pub use config::Config;
pub use menu::{Destination, MenuNode, OptionIndex, Response, View};
pub use player::{PlaybackQueue, PlayerView, RepeatMode};
pub use ui::Navigator;
