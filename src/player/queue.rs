use super::duration::{format_duration_unbounded, format_duration_with, DurationError};
use super::engine::{EndOfTrack, EngineEvent, EngineState, PlaybackEngine};
use super::{Progress, QueueSettings, RepeatMode, TransportState};
use crate::behavior::BanList;
use crate::catalog::{Collection, Track};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("no songs currently in queue")]
    Empty,
    #[error("song {0} is not in the queue")]
    NotInQueue(usize),
}

/// Anything that can be appended to the queue.
#[derive(Debug, Clone)]
pub enum QueueItem {
    Track(Track),
    Collection(Arc<Collection>),
}

/// The playback queue.
///
/// `song_list` holds the tracks, `song_order` is a permutation of its
/// indices and `current` is a position in `song_order`. Shuffling only
/// rewrites the permutation, the tracks themselves never move for it.
pub struct PlaybackQueue {
    song_list: Vec<Track>,
    song_order: Vec<usize>,
    current: usize,
    current_track: Option<Track>,
    shuffle: bool,
    repeat: RepeatMode,
    // index into song_list, never into song_order
    temporary: Option<usize>,
    // a temporary song was dropped mid-play, `current` is the song it interrupted
    resume_interrupted: bool,
    collection: Option<Arc<Collection>>,
    played: Duration,
    play_anchor: Option<Instant>,
    user_paused: bool,
    disconnected: bool,
    end_of_track: EndOfTrack,
    engine: Box<dyn PlaybackEngine>,
    bans: BanList,
    settings: QueueSettings,
}

impl PlaybackQueue {
    pub fn new(engine: Box<dyn PlaybackEngine>, bans: BanList, settings: QueueSettings) -> Self {
        Self {
            song_list: Vec::new(),
            song_order: Vec::new(),
            current: 0,
            current_track: None,
            shuffle: settings.shuffle,
            repeat: RepeatMode::All,
            temporary: None,
            resume_interrupted: false,
            collection: None,
            played: Duration::ZERO,
            play_anchor: None,
            user_paused: true,
            disconnected: false,
            end_of_track: EndOfTrack::new(),
            engine,
            bans,
            settings,
        }
    }

    /// Back to an empty queue. Shuffle survives, repeat does not.
    pub fn clear(&mut self) {
        self.song_list.clear();
        self.song_order.clear();
        self.current = 0;
        self.current_track = None;
        self.repeat = RepeatMode::All;
        self.temporary = None;
        self.resume_interrupted = false;
        self.collection = None;
        self.played = Duration::ZERO;
        self.play_anchor = None;
        self.end_of_track = EndOfTrack::new();
    }

    pub fn has_been_loaded(&self) -> bool {
        !self.song_list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.song_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.song_order.is_empty()
    }

    pub fn position(&self) -> usize {
        self.current
    }

    pub fn song_order(&self) -> &[usize] {
        &self.song_order
    }

    pub fn song_list(&self) -> &[Track] {
        &self.song_list
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn collection(&self) -> Option<&Arc<Collection>> {
        self.collection.as_ref()
    }

    pub fn temporary_song(&self) -> Option<usize> {
        self.temporary
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn bans(&self) -> &BanList {
        &self.bans
    }

    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }

    pub fn is_playing(&self) -> bool {
        self.engine.state() == EngineState::Playing
    }

    pub fn state(&self) -> TransportState {
        if self.current_track.is_none() {
            TransportState::Empty
        } else if self.disconnected {
            TransportState::Disconnected
        } else if self.is_playing() {
            TransportState::Playing
        } else {
            TransportState::Paused
        }
    }

    /// Track at `position` in play order.
    pub fn track_at(&self, position: usize) -> Option<&Track> {
        self.song_order
            .get(position)
            .and_then(|&idx| self.song_list.get(idx))
    }

    pub fn is_temporary_at(&self, position: usize) -> bool {
        self.temporary.is_some() && self.song_order.get(position).copied() == self.temporary
    }

    pub fn next_idx(&self) -> Result<usize, QueueError> {
        if self.song_order.is_empty() {
            return Err(QueueError::Empty);
        }
        let next = self.current + 1;
        Ok(if next >= self.song_order.len() { 0 } else { next })
    }

    pub fn prev_idx(&self) -> Result<usize, QueueError> {
        if self.song_order.is_empty() {
            return Err(QueueError::Empty);
        }
        Ok(match self.current {
            0 => self.song_order.len() - 1,
            n => (n - 1).min(self.song_order.len() - 1),
        })
    }

    /// Replace the queue with the available tracks of `collection`. An
    /// explicit `shuffle` sticks for later loads.
    pub fn load_playlist(&mut self, collection: Arc<Collection>, shuffle: Option<bool>) {
        self.engine.unload();
        self.clear();
        self.song_list = collection.available_tracks().cloned().collect();
        if let Some(shuffle) = shuffle {
            self.shuffle = shuffle;
        }
        self.set_song_order_by_shuffle();
        info!(
            "Loaded {} ({} of {} tracks playable, shuffle {})",
            collection.name,
            self.song_list.len(),
            collection.tracks.len(),
            self.shuffle
        );
        self.collection = Some(collection);
    }

    pub fn add_to_queue(&mut self, item: QueueItem) {
        match item {
            QueueItem::Track(track) => {
                debug!("Queueing {}", track);
                self.song_order.push(self.song_list.len());
                self.song_list.push(track);
                if self.current_track.is_none() {
                    self.play_current_song(false, true);
                }
            }
            QueueItem::Collection(collection) => {
                for track in collection.available_tracks() {
                    self.add_to_queue(QueueItem::Track(track.clone()));
                }
            }
        }
        self.collection = None;
    }

    /// Play `track` right away, ahead of the current one. It leaves the
    /// queue again as soon as playback moves on.
    pub fn add_play_then_remove(&mut self, track: Track) {
        self.clean_temporary_song();
        let idx = self.song_list.len();
        debug!("Playing {} as a temporary song", track);
        self.song_list.push(track);
        let at = self.current.min(self.song_order.len());
        self.song_order.insert(at, idx);
        self.current = at;
        self.temporary = Some(idx);
        self.play_current_song(true, false);
    }

    pub fn clean_temporary_song(&mut self) {
        let Some(temporary) = self.temporary.take() else {
            return;
        };
        let Some(position) = self.song_order.iter().position(|&idx| idx == temporary) else {
            warn!("Temporary song {} was not in the play order", temporary);
            return;
        };
        self.song_order.remove(position);
        self.song_list.remove(temporary);
        for idx in self.song_order.iter_mut() {
            if *idx > temporary {
                *idx -= 1;
            }
        }
        if position < self.current {
            // The song that was playing before the insertion slid one back
            self.current -= 1;
        }
        if self.current >= self.song_order.len() {
            self.current = 0;
        }
        debug!("Removed temporary song at position {}", position);
    }

    // Anything that reshapes the queue drops a playing temporary song first.
    // The song it interrupted keeps its position and plays next.
    fn release_temporary_song(&mut self) {
        if self.temporary.is_some() {
            self.clean_temporary_song();
            self.resume_interrupted = !self.song_order.is_empty();
        }
    }

    pub fn next_song(&mut self) -> Result<(), QueueError> {
        if self.resume_interrupted && !self.song_order.is_empty() {
            self.play_current_song(true, true);
            return Ok(());
        }
        self.current = self.next_idx()?;
        self.play_current_song(true, true);
        Ok(())
    }

    /// Go back one song, or restart the current one once it has played
    /// longer than the restart threshold.
    pub fn previous_song(&mut self) -> Result<(), QueueError> {
        if self.played_time() < self.settings.restart_threshold {
            self.current = self.prev_idx()?;
            self.play_current_song(true, true);
        } else {
            self.play_current_song(true, false);
        }
        Ok(())
    }

    /// Drop the current song from the queue (not from its collection) and
    /// play whatever takes its place.
    pub fn remove_current_song(&mut self) {
        if self.current < self.song_order.len() {
            self.remove_at(self.current);
            self.play_current_song(true, true);
            self.collection = None;
        }
    }

    fn remove_at(&mut self, position: usize) {
        let idx = self.song_order.remove(position);
        let removed = self.song_list.remove(idx);
        for item in self.song_order.iter_mut() {
            if *item > idx {
                *item -= 1;
            }
        }
        self.temporary = match self.temporary {
            Some(temporary) if temporary == idx => None,
            Some(temporary) if temporary > idx => Some(temporary - 1),
            other => other,
        };
        if self.current >= self.song_order.len() {
            self.current = 0;
        }
        debug!("Removed {} from the queue", removed);
    }

    pub fn toggle_shuffle(&mut self) {
        self.release_temporary_song();
        self.shuffle = !self.shuffle;
        let playing = self.song_order.get(self.current).copied();
        self.set_song_order_by_shuffle();
        if let Some(position) =
            playing.and_then(|idx| self.song_order.iter().position(|&other| other == idx))
        {
            self.current = position;
        }
        info!("Shuffle {}", if self.shuffle { "on" } else { "off" });
    }

    pub fn toggle_repeat(&mut self) {
        self.repeat = self.repeat.toggled();
        info!("Repeat {}", self.repeat);
    }

    fn set_song_order_by_shuffle(&mut self) {
        self.song_order = (0..self.song_list.len()).collect();
        if self.shuffle {
            self.song_order.shuffle(&mut rand::thread_rng());
        }
    }

    pub fn played_time(&self) -> Duration {
        let running = self.play_anchor.map(|anchor| anchor.elapsed()).unwrap_or_default();
        self.played + running
    }

    // Fold the running clock into `played` and restart it from now
    fn settle_clock(&mut self) {
        if let Some(anchor) = self.play_anchor {
            self.played += anchor.elapsed();
            self.play_anchor = Some(Instant::now());
        }
    }

    pub fn seek_backward(&mut self) {
        self.settle_clock();
        self.played = self.played.saturating_sub(self.settings.seek_step);
        self.engine.seek(self.played.as_millis() as u64);
    }

    pub fn seek_forward(&mut self) {
        self.settle_clock();
        self.played += self.settings.seek_step;
        self.engine.seek(self.played.as_millis() as u64);
    }

    /// Pause when playing, resume otherwise. A pause the listener asked for
    /// is only undone by the listener.
    pub fn play_pause(&mut self, user_initiated: bool) {
        if self.is_playing() {
            self.engine.pause();
            if let Some(anchor) = self.play_anchor.take() {
                self.played += anchor.elapsed();
            }
            self.user_paused = user_initiated;
        } else if !self.user_paused || user_initiated {
            if self.current_track.is_none() {
                return;
            }
            self.engine.play();
            self.play_anchor = Some(Instant::now());
        } else {
            info!("Refusing to resume playback the listener paused");
        }
    }

    /// Returns `true` when the engine finished the track and we moved on.
    pub fn check_end_of_track(&mut self) -> bool {
        if !self.end_of_track.is_set() {
            return false;
        }
        self.end_of_track = EndOfTrack::new();
        debug!("End of track, repeat {}", self.repeat);
        match self.repeat {
            RepeatMode::All => {
                if let Err(e) = self.next_song() {
                    warn!("Could not advance after end of track: {}", e);
                }
            }
            RepeatMode::One => self.play_current_song(true, true),
        }
        true
    }

    /// Pump the engine once and react to what it reports.
    pub fn process_engine_events(&mut self) {
        for event in self.engine.process_events() {
            match event {
                EngineEvent::ConnectionLost => {
                    if self.is_playing() {
                        self.play_pause(false);
                    }
                    self.disconnected = true;
                    warn!("Playback engine lost its connection");
                }
                EngineEvent::ConnectionRestored => {
                    if self.disconnected && !self.is_playing() {
                        debug!("Connection is back, resuming");
                        self.play_pause(false);
                    }
                    self.disconnected = false;
                }
                EngineEvent::PlayTokenLost => {
                    if self.is_playing() {
                        self.play_pause(true);
                        warn!("Playback paused, the account is playing somewhere else");
                    }
                }
            }
        }
    }

    /// Load the song at the current position, skipping past banned artists.
    pub fn play_current_song(&mut self, start: bool, clean_temporary: bool) {
        self.engine.unload();
        self.play_anchor = None;
        self.resume_interrupted = false;

        if clean_temporary {
            self.clean_temporary_song();
        }

        loop {
            let Some(track) = self.track_at(self.current).cloned() else {
                self.current_track = None;
                return;
            };

            if self.bans.is_track_banned(&track) {
                info!("Skipping {}, artist is banned", track);
                self.remove_at(self.current);
                self.collection = None;
                continue;
            }

            self.end_of_track = EndOfTrack::new();
            self.played = Duration::ZERO;
            let loaded = match self.engine.load(&track, self.end_of_track.clone()) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Engine failed to load {}: {}", track, e);
                    false
                }
            };
            debug!("Current track is now {}", track);
            self.current_track = Some(track);

            if loaded && start && !self.disconnected {
                self.play_pause(true);
            }
            return;
        }
    }

    /// Play the song at `idx` in the song list (not the play order).
    pub fn play_track(&mut self, idx: usize) -> Result<(), QueueError> {
        let position = self
            .song_order
            .iter()
            .position(|&other| other == idx)
            .ok_or(QueueError::NotInQueue(idx))?;
        self.current = position;
        self.play_current_song(true, true);
        Ok(())
    }

    /// Jump to `position` in play order.
    pub fn play_position(&mut self, position: usize) -> Result<(), QueueError> {
        if position >= self.song_order.len() {
            return Err(QueueError::NotInQueue(position));
        }
        self.current = position;
        self.play_current_song(true, true);
        Ok(())
    }

    pub fn duplicate_current_song(&mut self) {
        self.release_temporary_song();
        let Some(&idx) = self.song_order.get(self.current) else {
            return;
        };
        let song = self.song_list[idx].clone();
        debug!("Duplicating {}", song);
        self.song_list.insert(idx + 1, song);
        for item in self.song_order.iter_mut() {
            if *item > idx {
                *item += 1;
            }
        }
        self.song_order.insert(self.current + 1, idx + 1);
        self.collection = None;
    }

    /// No-op while shuffling.
    pub fn move_song_up(&mut self) {
        if self.shuffle || self.song_order.is_empty() {
            return;
        }
        self.release_temporary_song();
        if self.song_order.is_empty() {
            return;
        }
        let target = match self.current {
            0 => self.song_order.len() - 1,
            n => n - 1,
        };
        self.swap_with(target);
    }

    /// No-op while shuffling.
    pub fn move_song_down(&mut self) {
        if self.shuffle || self.song_order.is_empty() {
            return;
        }
        self.release_temporary_song();
        if self.song_order.is_empty() {
            return;
        }
        let target = self.current + 1;
        let target = if target >= self.song_order.len() { 0 } else { target };
        self.swap_with(target);
    }

    fn swap_with(&mut self, target: usize) {
        let from = self.song_order[self.current];
        let to = self.song_order[target];
        self.song_list.swap(from, to);
        self.current = target;
    }

    pub fn stop_and_clear(&mut self) {
        info!("Stopping playback and clearing the queue");
        self.engine.unload();
        self.clear();
    }

    pub fn total_length(&self) -> Result<String, DurationError> {
        let millis: u64 = self.song_list.iter().map(|track| track.duration_ms).sum();
        format_duration_unbounded(as_seconds(millis))
    }

    /// `None` when nothing is loaded.
    pub fn progress(&self) -> Result<Option<Progress>, DurationError> {
        let Some(track) = self.current_track.as_ref() else {
            return Ok(None);
        };
        let played = self.played_time();
        let fraction = if track.duration_ms == 0 {
            0.0
        } else {
            (played.as_millis() as f64 / track.duration_ms as f64).clamp(0.0, 1.0)
        };
        let max = Some(self.settings.max_duration_seconds);
        Ok(Some(Progress {
            state: self.state(),
            played: format_duration_with(played.as_secs_f64(), max)?,
            fraction,
            total: format_duration_with(as_seconds(track.duration_ms), max)?,
        }))
    }
}

fn as_seconds(millis: u64) -> f64 {
    millis as f64 / 1000.0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::testing::{playlist, track, unavailable};
    use crate::player::engine::testing::{Call, RecordingEngine};

    pub(crate) fn tracks(n: usize) -> Vec<Track> {
        (0..n).map(|i| track(&format!("T{i}"), &format!("Artist {i}"))).collect()
    }

    pub(crate) fn queue_of(n: usize) -> (PlaybackQueue, RecordingEngine) {
        let engine = RecordingEngine::default();
        let mut queue = PlaybackQueue::new(
            Box::new(engine.clone()),
            BanList::new(),
            QueueSettings::default(),
        );
        queue.load_playlist(Arc::new(playlist("Mix", tracks(n))), Some(false));
        queue.play_current_song(true, true);
        (queue, engine)
    }

    fn current_name(queue: &PlaybackQueue) -> String {
        queue.current_track().map(|t| t.name.clone()).unwrap_or_default()
    }

    fn assert_permutation(queue: &PlaybackQueue) {
        let mut order = queue.song_order().to_vec();
        order.sort_unstable();
        assert_eq!(order, (0..queue.song_list().len()).collect::<Vec<_>>());
    }

    #[test]
    fn next_song_wraps_back_to_the_start() {
        let (mut queue, _) = queue_of(4);
        for _ in 0..4 {
            queue.next_song().unwrap();
        }
        assert_eq!(queue.position(), 0);
        assert_eq!(current_name(&queue), "T0");
    }

    #[test]
    fn single_track_neighbours_are_itself() {
        let (queue, _) = queue_of(1);
        assert_eq!(queue.next_idx(), Ok(0));
        assert_eq!(queue.prev_idx(), Ok(0));
    }

    #[test]
    fn empty_queue_has_no_neighbours() {
        let (mut queue, _) = queue_of(0);
        assert_eq!(queue.next_idx(), Err(QueueError::Empty));
        assert_eq!(queue.prev_idx(), Err(QueueError::Empty));
        assert_eq!(queue.next_song(), Err(QueueError::Empty));
        assert_eq!(queue.state(), TransportState::Empty);
    }

    #[test]
    fn prev_wraps_to_the_end() {
        let (queue, _) = queue_of(3);
        assert_eq!(queue.prev_idx(), Ok(2));
    }

    #[test]
    fn temporary_song_is_removed_and_position_restored() {
        let (mut queue, engine) = queue_of(5);
        queue.play_position(2).unwrap();

        queue.add_play_then_remove(track("Interlude", "Guest"));
        assert_eq!(queue.song_list().len(), 6);
        assert_eq!(current_name(&queue), "Interlude");
        assert!(queue.is_temporary_at(2));
        assert!(engine.calls().ends_with(&[Call::Load("track:interlude".into()), Call::Play]));

        queue.clean_temporary_song();
        assert_eq!(queue.position(), 2);
        assert_eq!(queue.song_list().len(), 5);
        assert_eq!(queue.temporary_song(), None);
        assert_eq!(queue.track_at(2).map(|t| t.name.as_str()), Some("T2"));
        assert_permutation(&queue);
    }

    #[test]
    fn moving_on_from_a_temporary_song_resumes_the_old_one() {
        let (mut queue, _) = queue_of(5);
        queue.play_position(2).unwrap();
        queue.add_play_then_remove(track("Interlude", "Guest"));

        queue.next_song().unwrap();
        assert_eq!(current_name(&queue), "T2");
        assert_eq!(queue.position(), 2);
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn temporary_song_at_the_front_is_cleaned_too() {
        let (mut queue, _) = queue_of(3);
        queue.add_play_then_remove(track("Interlude", "Guest"));
        assert_eq!(queue.temporary_song(), Some(3));
        assert!(queue.is_temporary_at(0));

        queue.next_song().unwrap();
        assert_eq!(queue.len(), 3);
        assert_eq!(current_name(&queue), "T0");
    }

    #[test]
    fn cleaning_without_temporary_song_changes_nothing() {
        let (mut queue, _) = queue_of(3);
        queue.next_song().unwrap();
        let before = queue.song_order().to_vec();
        queue.clean_temporary_song();
        assert_eq!(queue.song_order(), before.as_slice());
        assert_eq!(queue.position(), 1);
    }

    #[test]
    fn removing_the_last_song_wraps_to_the_first() {
        let (mut queue, _) = queue_of(3);
        queue.play_position(2).unwrap();
        queue.remove_current_song();
        assert_eq!(queue.position(), 0);
        assert_eq!(queue.len(), 2);
        assert_eq!(current_name(&queue), "T0");
        assert!(queue.collection().is_none());
    }

    #[test]
    fn removing_keeps_the_order_a_permutation() {
        let (mut queue, _) = queue_of(6);
        queue.toggle_shuffle();
        queue.play_position(3).unwrap();
        let doomed = queue.current_track().cloned();
        queue.remove_current_song();
        assert_eq!(queue.len(), 5);
        assert_permutation(&queue);
        assert!(!queue.song_list().iter().any(|t| Some(t) == doomed.as_ref()));
    }

    #[test]
    fn removing_from_an_empty_queue_does_nothing() {
        let (mut queue, _) = queue_of(0);
        queue.remove_current_song();
        assert!(queue.is_empty());
    }

    #[test]
    fn removing_the_only_song_empties_the_player() {
        let (mut queue, _) = queue_of(1);
        queue.remove_current_song();
        assert!(queue.current_track().is_none());
        assert!(!queue.has_been_loaded());
    }

    #[test]
    fn shuffle_twice_restores_identity_order() {
        let (mut queue, _) = queue_of(8);
        queue.next_song().unwrap();
        queue.toggle_shuffle();
        assert!(queue.is_shuffled());
        assert_permutation(&queue);
        assert_eq!(queue.track_at(queue.position()).map(|t| t.name.as_str()), Some("T1"));

        queue.toggle_shuffle();
        assert_eq!(queue.song_order(), (0..8).collect::<Vec<_>>().as_slice());
        assert_eq!(queue.position(), 1);
    }

    #[test]
    fn load_playlist_drops_unavailable_tracks_and_keeps_shuffle() {
        let (mut queue, _) = queue_of(0);
        let mix = Arc::new(playlist(
            "Mix",
            vec![track("A", "x"), unavailable("B", "x"), track("C", "x")],
        ));
        queue.load_playlist(mix.clone(), Some(true));
        assert_eq!(queue.song_list().len(), 2);
        assert!(queue.collection().is_some());

        queue.load_playlist(mix, None);
        assert!(queue.is_shuffled());
        assert_permutation(&queue);
    }

    #[test]
    fn banned_artists_are_skipped() {
        let engine = RecordingEngine::default();
        let bans = BanList::new();
        let mut queue = PlaybackQueue::new(
            Box::new(engine.clone()),
            bans.clone(),
            QueueSettings::default(),
        );
        let mut list = tracks(4);
        list[2].artists = list[1].artists.clone();
        queue.load_playlist(Arc::new(playlist("Mix", list)), Some(false));
        queue.play_current_song(true, true);
        bans.ban(&queue.song_list()[1].artists[0]);

        queue.next_song().unwrap();
        assert_eq!(current_name(&queue), "T3");
        assert_eq!(queue.len(), 2);
        assert_eq!(engine.loaded(), vec!["track:t0", "track:t3"]);
        assert!(queue.collection().is_none());
    }

    #[test]
    fn banning_everyone_empties_the_queue() {
        let (mut queue, engine) = queue_of(3);
        let bans = queue.bans().clone();
        for track in queue.song_list().to_vec() {
            bans.ban(&track.artists[0]);
        }
        engine.clear_calls();

        queue.next_song().unwrap();
        assert!(queue.current_track().is_none());
        assert!(!queue.has_been_loaded());
        assert!(queue.is_empty());
        assert!(engine.loaded().is_empty());
        assert!(!engine.calls().contains(&Call::Play));
        assert_eq!(queue.state(), TransportState::Empty);
        assert_eq!(queue.next_song(), Err(QueueError::Empty));
    }

    #[test]
    fn shuffle_toggles_drop_the_temporary_song_and_resume_the_interrupted_one() {
        let (mut queue, _) = queue_of(5);
        queue.play_position(2).unwrap();
        queue.add_play_then_remove(track("Interlude", "Guest"));

        queue.toggle_shuffle();
        assert_eq!(queue.temporary_song(), None);
        assert_eq!(queue.len(), 5);
        assert_permutation(&queue);
        assert_eq!(queue.track_at(queue.position()).map(|t| t.name.as_str()), Some("T2"));

        queue.toggle_shuffle();
        assert_eq!(queue.song_order(), &[0, 1, 2, 3, 4]);
        assert_eq!(queue.position(), 2);
        assert_eq!(current_name(&queue), "Interlude");

        queue.next_song().unwrap();
        assert_eq!(current_name(&queue), "T2");
        queue.next_song().unwrap();
        assert_eq!(current_name(&queue), "T3");
    }

    #[test]
    fn duplicate_and_move_drop_the_temporary_song_first() {
        let (mut queue, _) = queue_of(3);
        queue.add_play_then_remove(track("Interlude", "Guest"));
        queue.duplicate_current_song();
        assert_eq!(queue.temporary_song(), None);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.track_at(1).map(|t| t.name.as_str()), Some("T0"));
        assert_permutation(&queue);

        queue.add_play_then_remove(track("Interlude", "Guest"));
        queue.move_song_down();
        assert_eq!(queue.temporary_song(), None);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.position(), 1);
        assert_permutation(&queue);
        queue.next_song().unwrap();
        assert_eq!(queue.position(), 1);
        assert_eq!(current_name(&queue), "T0");
    }

    #[test]
    fn adding_to_an_empty_queue_loads_without_playing() {
        let (mut queue, engine) = queue_of(0);
        engine.clear_calls();
        queue.add_to_queue(QueueItem::Track(track("Solo", "x")));
        assert_eq!(current_name(&queue), "Solo");
        assert!(!engine.calls().contains(&Call::Play));
        assert_eq!(queue.state(), TransportState::Paused);
    }

    #[test]
    fn adding_a_collection_appends_available_tracks() {
        let (mut queue, _) = queue_of(2);
        let extra = playlist("Extra", vec![track("A", "x"), unavailable("B", "x")]);
        queue.add_to_queue(QueueItem::Collection(Arc::new(extra)));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.song_order(), &[0, 1, 2]);
        assert!(queue.collection().is_none());
        assert_eq!(current_name(&queue), "T0");
    }

    #[test]
    fn end_of_track_follows_repeat_mode() {
        let (mut queue, engine) = queue_of(3);
        assert!(!queue.check_end_of_track());

        engine.finish_track();
        assert!(queue.check_end_of_track());
        assert_eq!(current_name(&queue), "T1");

        queue.toggle_repeat();
        assert_eq!(queue.repeat(), RepeatMode::One);
        engine.finish_track();
        assert!(queue.check_end_of_track());
        assert_eq!(current_name(&queue), "T1");
        assert_eq!(engine.loaded(), vec!["track:t0", "track:t1", "track:t1"]);
    }

    #[test]
    fn duplicate_keeps_the_order_a_permutation() {
        let (mut queue, _) = queue_of(3);
        queue.next_song().unwrap();
        queue.duplicate_current_song();
        assert_eq!(queue.len(), 4);
        assert_permutation(&queue);
        assert_eq!(queue.track_at(2).map(|t| t.name.as_str()), Some("T1"));
        assert_eq!(queue.track_at(3).map(|t| t.name.as_str()), Some("T2"));
    }

    #[test]
    fn move_song_swaps_neighbours_unless_shuffling() {
        let (mut queue, _) = queue_of(3);
        queue.move_song_down();
        assert_eq!(queue.position(), 1);
        assert_eq!(queue.track_at(1).map(|t| t.name.as_str()), Some("T0"));
        assert_eq!(current_name(&queue), "T0");

        queue.move_song_up();
        queue.move_song_up();
        assert_eq!(queue.position(), 2);
        assert_eq!(queue.track_at(2).map(|t| t.name.as_str()), Some("T0"));

        queue.toggle_shuffle();
        let order = queue.song_order().to_vec();
        let list = queue.song_list().to_vec();
        queue.move_song_up();
        assert_eq!(queue.song_order(), order.as_slice());
        assert_eq!(queue.song_list(), list.as_slice());
    }

    #[test]
    fn previous_restarts_once_past_the_threshold() {
        let (mut queue, engine) = queue_of(3);
        queue.next_song().unwrap();
        queue.seek_forward();
        queue.previous_song().unwrap();
        assert_eq!(current_name(&queue), "T1");

        queue.previous_song().unwrap();
        assert_eq!(current_name(&queue), "T0");
        assert_eq!(
            engine.loaded(),
            vec!["track:t0", "track:t1", "track:t1", "track:t0"]
        );
    }

    #[test]
    fn seeking_back_clamps_at_zero() {
        let (mut queue, engine) = queue_of(1);
        queue.play_pause(true);
        queue.seek_backward();
        assert_eq!(engine.calls().last(), Some(&Call::Seek(0)));
        queue.seek_forward();
        assert_eq!(engine.calls().last(), Some(&Call::Seek(10_000)));
        assert!(queue.played_time() >= Duration::from_secs(10));
    }

    #[test]
    fn listener_pause_survives_connection_flaps() {
        let (mut queue, engine) = queue_of(2);
        assert_eq!(queue.state(), TransportState::Playing);

        engine.push_event(EngineEvent::ConnectionLost);
        queue.process_engine_events();
        assert_eq!(queue.state(), TransportState::Disconnected);
        engine.push_event(EngineEvent::ConnectionRestored);
        queue.process_engine_events();
        assert_eq!(queue.state(), TransportState::Playing);

        queue.play_pause(true);
        engine.push_event(EngineEvent::ConnectionLost);
        engine.push_event(EngineEvent::ConnectionRestored);
        queue.process_engine_events();
        assert_eq!(queue.state(), TransportState::Paused);
    }

    #[test]
    fn total_length_is_unbounded() {
        let (queue, _) = queue_of(31);
        // 31 tracks of two minutes
        assert_eq!(queue.total_length().unwrap(), "01:02:00");
    }

    #[test]
    fn progress_reports_state_and_total() {
        let (mut queue, _) = queue_of(1);
        queue.play_pause(true);
        queue.seek_forward();
        let progress = queue.progress().unwrap().expect("progress");
        assert_eq!(progress.state, TransportState::Paused);
        assert_eq!(progress.played, "00:10");
        assert_eq!(progress.total, "02:00");
        assert!((progress.fraction - 10.0 / 120.0).abs() < 1e-3);
    }

    #[test]
    fn play_track_requires_a_queued_song() {
        let (mut queue, _) = queue_of(2);
        assert_eq!(queue.play_track(7), Err(QueueError::NotInQueue(7)));
        queue.play_track(1).unwrap();
        assert_eq!(current_name(&queue), "T1");
    }

    #[test]
    fn stop_and_clear_resets_everything_but_shuffle() {
        let (mut queue, engine) = queue_of(3);
        queue.toggle_shuffle();
        queue.toggle_repeat();
        queue.stop_and_clear();
        assert!(!queue.has_been_loaded());
        assert!(queue.is_shuffled());
        assert_eq!(queue.repeat(), RepeatMode::All);
        assert_eq!(engine.calls().last(), Some(&Call::Unload));
    }
}
