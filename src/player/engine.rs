use crate::catalog::Track;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unloaded,
    Paused,
    Playing,
}

/// Things the engine noticed while nobody was looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    ConnectionLost,
    ConnectionRestored,
    PlayTokenLost,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not load track: {0}")]
    Load(String),
}

/// One-shot end-of-track signal. A fresh one goes out with every load; the
/// engine only ever sets it, the queue only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct EndOfTrack(Arc<AtomicBool>);

impl EndOfTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Whatever actually makes the sound. Driven from the UI loop only.
pub trait PlaybackEngine: Send {
    fn load(&mut self, track: &Track, end_of_track: EndOfTrack) -> Result<(), EngineError>;
    fn play(&mut self);
    fn pause(&mut self);
    fn unload(&mut self);
    fn seek(&mut self, position_ms: u64);
    fn state(&self) -> EngineState;
    /// Non-blocking pump, called once per loop iteration.
    fn process_events(&mut self) -> Vec<EngineEvent>;
}

/// Engine without audio: a clock that runs for the length of the track and
/// then fires the end-of-track signal.
#[derive(Debug)]
pub struct SilentEngine {
    state: EngineState,
    length: Duration,
    position: Duration,
    playing_since: Option<Instant>,
    end_of_track: Option<EndOfTrack>,
}

impl Default for SilentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SilentEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::Unloaded,
            length: Duration::ZERO,
            position: Duration::ZERO,
            playing_since: None,
            end_of_track: None,
        }
    }

    fn elapsed(&self) -> Duration {
        let running = self.playing_since.map(|since| since.elapsed()).unwrap_or_default();
        self.position + running
    }

    fn settle(&mut self) {
        self.position = self.elapsed();
        self.playing_since = None;
    }
}

impl PlaybackEngine for SilentEngine {
    fn load(&mut self, track: &Track, end_of_track: EndOfTrack) -> Result<(), EngineError> {
        if !track.available {
            return Err(EngineError::Load(format!("{} is not available", track.id)));
        }
        debug!("Silent engine loaded {} ({} ms)", track.id, track.duration_ms);
        self.state = EngineState::Paused;
        self.length = Duration::from_millis(track.duration_ms);
        self.position = Duration::ZERO;
        self.playing_since = None;
        self.end_of_track = Some(end_of_track);
        Ok(())
    }

    fn play(&mut self) {
        if self.state == EngineState::Paused {
            self.state = EngineState::Playing;
            self.playing_since = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if self.state == EngineState::Playing {
            self.settle();
            self.state = EngineState::Paused;
        }
    }

    fn unload(&mut self) {
        self.state = EngineState::Unloaded;
        self.position = Duration::ZERO;
        self.playing_since = None;
        self.end_of_track = None;
    }

    fn seek(&mut self, position_ms: u64) {
        self.position = Duration::from_millis(position_ms);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn process_events(&mut self) -> Vec<EngineEvent> {
        if self.state == EngineState::Playing && self.elapsed() >= self.length {
            self.settle();
            self.state = EngineState::Paused;
            if let Some(end) = self.end_of_track.take() {
                debug!("Silent engine reached end of track");
                end.signal();
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Load(String),
        Play,
        Pause,
        Unload,
        Seek(u64),
    }

    #[derive(Debug, Default)]
    pub struct Recording {
        pub calls: Vec<Call>,
        pub events: Vec<EngineEvent>,
        pub end_of_track: Option<EndOfTrack>,
    }

    /// Engine double; the shared log stays readable after the engine is boxed.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingEngine {
        pub log: Arc<Mutex<Recording>>,
        state: Arc<Mutex<Option<EngineState>>>,
    }

    impl RecordingEngine {
        pub fn calls(&self) -> Vec<Call> {
            self.log.lock().unwrap().calls.clone()
        }

        pub fn clear_calls(&self) {
            self.log.lock().unwrap().calls.clear();
        }

        pub fn loaded(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Load(id) => Some(id),
                    _ => None,
                })
                .collect()
        }

        pub fn finish_track(&self) {
            if let Some(end) = &self.log.lock().unwrap().end_of_track {
                end.signal();
            }
        }

        pub fn push_event(&self, event: EngineEvent) {
            self.log.lock().unwrap().events.push(event);
        }

        fn set_state(&self, state: EngineState) {
            *self.state.lock().unwrap() = Some(state);
        }
    }

    impl PlaybackEngine for RecordingEngine {
        fn load(&mut self, track: &Track, end_of_track: EndOfTrack) -> Result<(), EngineError> {
            let mut log = self.log.lock().unwrap();
            log.calls.push(Call::Load(track.id.clone()));
            log.end_of_track = Some(end_of_track);
            drop(log);
            self.set_state(EngineState::Paused);
            Ok(())
        }

        fn play(&mut self) {
            self.log.lock().unwrap().calls.push(Call::Play);
            self.set_state(EngineState::Playing);
        }

        fn pause(&mut self) {
            self.log.lock().unwrap().calls.push(Call::Pause);
            self.set_state(EngineState::Paused);
        }

        fn unload(&mut self) {
            self.log.lock().unwrap().calls.push(Call::Unload);
            self.set_state(EngineState::Unloaded);
        }

        fn seek(&mut self, position_ms: u64) {
            self.log.lock().unwrap().calls.push(Call::Seek(position_ms));
        }

        fn state(&self) -> EngineState {
            self.state.lock().unwrap().unwrap_or(EngineState::Unloaded)
        }

        fn process_events(&mut self) -> Vec<EngineEvent> {
            std::mem::take(&mut self.log.lock().unwrap().events)
        }
    }
}
