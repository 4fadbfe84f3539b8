// Menu - typed-ahead option menus and the navigation protocol they share with the player
// Every screen answers with a Destination; the navigator decides what that means

pub mod node;    // one screen: filter, pages, loader polling
pub mod options; // key/label index with cached prefix + fuzzy matching
pub mod views;   // what each screen offers

pub use node::MenuNode;
pub use options::{MenuOption, OptionIndex};
pub use views::View;

use crate::catalog::{Artist, Collection, Track};
use crate::player::QueueItem;
use std::sync::Arc;
use thiserror::Error;

/// Control signals understood by the navigator.
#[derive(Debug, Clone)]
pub enum Response {
    /// Redraw and keep going.
    Noop,
    Up,
    Quit,
    Player,
    Descend(View),
}

/// Side effects on the queue or the ban list, run by the navigator.
#[derive(Debug, Clone)]
pub enum Action {
    /// Replace the queue with `collection`; `start` indexes its available tracks.
    PlayCollection {
        collection: Arc<Collection>,
        start: Option<usize>,
        shuffle: Option<bool>,
    },
    Enqueue(QueueItem),
    PlayNowThenRemove(Track),
    PlayQueuePosition(usize),
    BanArtist(Artist),
    UnbanArtist(Artist),
}

/// Where picking an option takes you.
#[derive(Debug, Clone)]
pub enum Destination {
    Respond(Response),
    Action(Action),
}

impl Destination {
    pub fn descend(view: View) -> Self {
        Self::Respond(Response::Descend(view))
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Respond(Response::Noop))
    }
}

impl From<Response> for Destination {
    fn from(response: Response) -> Self {
        Self::Respond(response)
    }
}

impl From<Action> for Destination {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MenuError {
    #[error("option key '{key}' collides with another key as '{normalized}'")]
    DuplicateKey { key: String, normalized: String },
}
