// Terminal UI - header, body, status line
// Screens describe themselves as rows; a Display decides how that hits the terminal

pub mod app;      // the navigator: render, read, respond
pub mod events;   // key tokens and where they come from
#[cfg(feature = "tui")]
pub mod terminal; // ratatui/crossterm backed display

pub use app::Navigator;
pub use events::{InputSource, Key};
#[cfg(feature = "tui")]
pub use terminal::{TerminalDisplay, TerminalManager};

use crate::catalog::Track;
use crate::player::Progress;
use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Line(String),
    /// Left aligned, right aligned.
    Pair(String, String),
}

impl Row {
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }

    pub fn blank() -> Self {
        Self::Line(String::new())
    }

    pub fn render(&self, width: usize) -> String {
        match self {
            Self::Line(text) => text.clone(),
            Self::Pair(left, right) => pad_row(left, right, width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Rows(Vec<Row>),
}

impl Body {
    /// Flatten to terminal lines.
    pub fn lines(&self, width: usize) -> Vec<String> {
        match self {
            Self::Text(text) => text.lines().map(str::to_string).collect(),
            Self::Rows(rows) => rows.iter().map(|row| row.render(width)).collect(),
        }
    }
}

/// Where screens end up.
pub trait Display {
    /// (width, height) in cells.
    fn size(&self) -> (usize, usize);

    fn render(&mut self, header: &[String], body: &Body) -> Result<()>;

    /// Overwrite the status line only.
    fn show_progress(&mut self, line: &str) -> Result<()>;

    /// Rows left for a screen's body under the header.
    fn ui_height(&self) -> usize {
        self.size().1.saturating_sub(4)
    }
}

/// How long the loops wait on input and loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub menu_tick: Duration,
    pub player_tick: Duration,
    pub loader_poll: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            menu_tick: Duration::from_millis(250),
            player_tick: Duration::from_millis(500),
            loader_poll: Duration::from_millis(100),
        }
    }
}

/// `left` then `right` flush against the right edge.
pub fn pad_row(left: &str, right: &str, width: usize) -> String {
    let left_len = left.chars().count();
    let right_len = right.chars().count();
    if left_len + right_len >= width {
        let room = width.saturating_sub(right_len + 1);
        let clipped: String = left.chars().take(room).collect();
        return format!("{clipped} {right}");
    }
    format!("{left}{}{right}", " ".repeat(width - left_len - right_len))
}

/// `[state] mm:ss[#####     ]total` sized to `width`.
pub fn progress_line(progress: &Progress, width: usize) -> String {
    let head = format!("[{}] {}[", progress.state, progress.played);
    let tail = format!("]{}", progress.total);
    let visible = head.chars().count() + tail.chars().count();
    // keep off the last column so the terminal never wraps
    let bar = width.saturating_sub(visible + 1);
    let filled = ((progress.fraction.clamp(0.0, 1.0) * bar as f64) as usize).min(bar);
    format!("{head}{}{}{tail}", "#".repeat(filled), " ".repeat(bar - filled))
}

pub fn format_track(track: &Track, extra: Option<&str>) -> String {
    match extra {
        Some(extra) => format!("{track} {extra}"),
        None => track.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Display double that keeps every frame.
    #[derive(Debug, Default)]
    pub struct RecordingDisplay {
        pub width: usize,
        pub height: usize,
        pub frames: Vec<Vec<String>>,
        pub progress: Vec<String>,
    }

    impl RecordingDisplay {
        pub fn new(width: usize, height: usize) -> Self {
            Self {
                width,
                height,
                ..Self::default()
            }
        }

        pub fn last_frame(&self) -> Vec<String> {
            self.frames.last().cloned().unwrap_or_default()
        }

        pub fn any_frame_contains(&self, needle: &str) -> bool {
            self.frames
                .iter()
                .any(|frame| frame.iter().any(|line| line.contains(needle)))
        }
    }

    impl Display for RecordingDisplay {
        fn size(&self) -> (usize, usize) {
            (self.width, self.height)
        }

        fn render(&mut self, header: &[String], body: &Body) -> Result<()> {
            let mut frame = header.to_vec();
            frame.extend(body.lines(self.width));
            self.frames.push(frame);
            Ok(())
        }

        fn show_progress(&mut self, line: &str) -> Result<()> {
            self.progress.push(line.to_string());
            Ok(())
        }
    }
}
