use super::PlaybackQueue;
use crate::menu::{Destination, Response, View};
use crate::ui::events::{InputSource, Key};
use crate::ui::{format_track, Body, Row};
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, warn};

const HELP: &[(&str, &str)] = &[
    ("n/l", "next song"),
    ("p/h", "previous song (restarts after a few seconds)"),
    ("space", "play/pause"),
    ("u", "back to the menu"),
    ("q", "stop and clear the queue"),
    ("s", "toggle shuffle"),
    ("r", "toggle repeat"),
    ("d", "duplicate current song"),
    ("j/k", "seek backward/forward"),
    ("x", "remove current song from the queue"),
    ("i", "current song info"),
];

const MOVE_HELP: (&str, &str) = ("up/down", "move current song up/down");

// rows used above the queue window
const HEADER_ROWS: usize = 4;

/// The player screen: hotkeys drive the queue directly.
#[derive(Debug, Clone)]
pub struct PlayerView {
    tick: Duration,
    show_help: bool,
}

impl PlayerView {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            show_help: false,
        }
    }

    pub fn is_showing_help(&self) -> bool {
        self.show_help
    }

    /// Pump the engine and wait for a hotkey. `progress` redraws the status
    /// line between reads.
    pub fn get_response(
        &mut self,
        queue: &mut PlaybackQueue,
        input: &mut dyn InputSource,
        progress: &mut dyn FnMut(&PlaybackQueue),
    ) -> Result<Destination> {
        loop {
            queue.process_engine_events();
            if queue.check_end_of_track() {
                return Ok(Response::Noop.into());
            }
            progress(queue);
            if let Some(key) = input.read_key(self.tick)? {
                return Ok(self.handle_key(queue, key));
            }
        }
    }

    fn handle_key(&mut self, queue: &mut PlaybackQueue, key: Key) -> Destination {
        let moved = match key {
            Key::Interrupt => return Response::Quit.into(),
            Key::Char('u') => return Response::Up.into(),
            Key::Char('q') => {
                queue.stop_and_clear();
                return Response::Up.into();
            }
            Key::Char('i') => {
                return match queue.current_track() {
                    Some(track) => Destination::descend(View::Track {
                        track: track.clone(),
                        context: queue.collection().cloned(),
                    }),
                    None => Response::Noop.into(),
                };
            }
            Key::Char('n') | Key::Char('l') => queue.next_song(),
            Key::Char('p') | Key::Char('h') => queue.previous_song(),
            Key::Char(' ') => {
                queue.play_pause(true);
                Ok(())
            }
            Key::Char('s') => {
                queue.toggle_shuffle();
                Ok(())
            }
            Key::Char('r') => {
                queue.toggle_repeat();
                Ok(())
            }
            Key::Char('d') => {
                queue.duplicate_current_song();
                Ok(())
            }
            Key::Char('j') => {
                queue.seek_backward();
                Ok(())
            }
            Key::Char('k') => {
                queue.seek_forward();
                Ok(())
            }
            Key::Char('x') => {
                queue.remove_current_song();
                Ok(())
            }
            Key::Char('?') => {
                self.show_help = !self.show_help;
                Ok(())
            }
            Key::ArrowUp => {
                queue.move_song_up();
                Ok(())
            }
            Key::ArrowDown => {
                queue.move_song_down();
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = moved {
            debug!("Ignoring {:?}: {}", key, e);
        }
        Response::Noop.into()
    }

    pub fn get_ui(&self, queue: &PlaybackQueue, height: usize) -> Body {
        let mut rows = Vec::new();
        if self.show_help {
            rows.extend(help_rows(queue.is_shuffled()));
            return Body::Rows(rows);
        }

        rows.push(Row::line("Press ? for help"));
        rows.push(Row::blank());
        match queue.collection() {
            Some(collection) => rows.push(Row::line(format!("Playing playlist: {}", collection.name))),
            None => rows.push(Row::line("Playing your queue")),
        }
        rows.push(Row::blank());

        if queue.is_empty() {
            rows.push(Row::line("No songs found in playlist!"));
            return Body::Rows(rows);
        }

        let window = height.saturating_sub(HEADER_ROWS).max(1);
        let current = queue.position();
        let (start, end) = window_around(current, queue.len(), window);

        let info = [
            format!("{} of {}", current + 1, queue.len()),
            format!("Total playlist length: {}", total_length(queue)),
            format!("Repeat: {}", queue.repeat()),
            format!("Shuffle {}", if queue.is_shuffled() { "on" } else { "off" }),
        ];
        let mut info = info.into_iter();

        for position in start..end {
            let Some(track) = queue.track_at(position) else {
                continue;
            };
            let mut markers = Vec::new();
            if queue.is_temporary_at(position) {
                markers.push("[temporary]");
            }
            if queue.bans().is_track_banned(track) {
                markers.push("[artist banned]");
            }
            let marker = markers.join(" ");
            let arrow = if position == current { ">>>" } else { "   " };
            let left = format!(
                "{arrow} {}. {}",
                position + 1,
                format_track(track, (!marker.is_empty()).then_some(marker.as_str()))
            );
            rows.push(match info.next() {
                Some(right) => Row::Pair(left, right),
                None => Row::line(left),
            });
        }
        // short queues still show the whole right column
        rows.extend(info.map(|right| Row::Pair(String::new(), right)));
        Body::Rows(rows)
    }
}

fn total_length(queue: &PlaybackQueue) -> String {
    queue.total_length().unwrap_or_else(|e| {
        warn!("Could not format the queue length: {}", e);
        String::from("--:--:--")
    })
}

fn help_rows(shuffled: bool) -> Vec<Row> {
    let mut help: Vec<(&str, &str)> = HELP.to_vec();
    if !shuffled {
        help.push(MOVE_HELP);
    }
    help.push(("?", "hide this help"));
    help.into_iter()
        .map(|(keys, action)| Row::line(format!("[{keys}]: {action}")))
        .collect()
}

/// Half-open range of `size` positions out of `len`, centred on `current`
/// where the ends allow.
fn window_around(current: usize, len: usize, size: usize) -> (usize, usize) {
    if len <= size {
        return (0, len);
    }
    let start = current.saturating_sub(size / 2).min(len - size);
    (start, start + size)
}
