use anyhow::Result;
use std::time::Duration;

/// Input tokens the menus and the player understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Backspace,
    /// Previous page (PageUp or left arrow)
    PageUp,
    /// Next page (PageDown or right arrow)
    PageDown,
    ArrowUp,
    ArrowDown,
    Enter,
    /// Terminal changed size, redraw
    Resize,
    /// Ctrl-C, raw mode swallows the signal
    Interrupt,
    /// Printable character, already lower-cased
    Char(char),
}

/// Bounded single-token reads. `Ok(None)` means the wait ran out.
pub trait InputSource {
    fn read_key(&mut self, timeout: Duration) -> Result<Option<Key>>;
}

#[cfg(feature = "tui")]
pub use self::terminal_input::TerminalInput;

#[cfg(feature = "tui")]
mod terminal_input {
    use super::{InputSource, Key};
    use anyhow::Result;
    use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
    use std::time::Duration;

    /// Keystrokes from the real terminal via crossterm's poll/read.
    #[derive(Debug, Default)]
    pub struct TerminalInput;

    impl TerminalInput {
        pub fn new() -> Self {
            Self
        }

        fn map_key(key: KeyEvent) -> Option<Key> {
            if key.kind != KeyEventKind::Press {
                return None;
            }
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Key::Interrupt)
                }
                KeyCode::Backspace => Some(Key::Backspace),
                KeyCode::PageUp | KeyCode::Left => Some(Key::PageUp),
                KeyCode::PageDown | KeyCode::Right => Some(Key::PageDown),
                KeyCode::Up => Some(Key::ArrowUp),
                KeyCode::Down => Some(Key::ArrowDown),
                KeyCode::Enter => Some(Key::Enter),
                KeyCode::Char(c) => Some(Key::Char(c.to_ascii_lowercase())),
                _ => None,
            }
        }
    }

    impl InputSource for TerminalInput {
        fn read_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
            if !event::poll(timeout)? {
                return Ok(None);
            }
            Ok(match event::read()? {
                Event::Key(key) => Self::map_key(key),
                Event::Resize(_, _) => Some(Key::Resize),
                _ => None,
            })
        }
    }

}
