// Behavior - what the listener told us they never want to hear again
// Kept apart from the queue and menus so anything can ask "is this banned?"

pub mod bans; // banned artists, persisted as JSON

pub use bans::BanList;
