// Player - the playback queue and everything needed to drive it
// The engine makes the noise (or pretends to), the queue decides what comes next

pub mod duration; // mm:ss formatting with a ceiling
pub mod engine;   // PlaybackEngine seam + the silent clock engine
pub mod queue;    // song list, order permutation, temporary songs
pub mod view;     // hotkeys and the player screen

pub use duration::{format_duration, format_duration_unbounded, DurationError};
pub use engine::{EndOfTrack, EngineEvent, PlaybackEngine, SilentEngine};
pub use queue::{PlaybackQueue, QueueError, QueueItem};
pub use view::PlayerView;

use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    All,
    One,
}

impl RepeatMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::All => Self::One,
            Self::One => Self::All,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::One => write!(f, "one"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Empty,
    Paused,
    Playing,
    Disconnected,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Paused => "paused",
            Self::Playing => "playing",
            Self::Disconnected => "disconnected",
        };
        write!(f, "{name}")
    }
}

/// Snapshot for the status line.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub state: TransportState,
    pub played: String,
    /// Share of the track played, within [0, 1].
    pub fraction: f64,
    pub total: String,
}

/// Knobs the queue takes from the `[playback]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSettings {
    pub seek_step: Duration,
    pub restart_threshold: Duration,
    pub max_duration_seconds: u64,
    pub shuffle: bool,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            seek_step: Duration::from_secs(10),
            restart_threshold: Duration::from_secs(5),
            max_duration_seconds: duration::DEFAULT_MAX_SECONDS,
            shuffle: false,
        }
    }
}
