use super::{Body, Display};
use anyhow::{Context, Result};
use crossterm::{
    cursor, execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io;

// used when the terminal cannot report its size
const FALLBACK_SIZE: (usize, usize) = (80, 24);

pub struct TerminalManager {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    _cleanup_guard: CleanupGuard,
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Runs on panics too; nothing here may print
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    }
}

impl TerminalManager {
    pub fn new() -> Result<Self> {
        // Leftovers from a crashed session
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);

        enable_raw_mode().context("enabling raw mode")?;
        execute!(stdout, EnterAlternateScreen, cursor::Hide).context("entering alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        Ok(Self {
            terminal,
            _cleanup_guard: CleanupGuard,
        })
    }

    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}

impl Drop for TerminalManager {
    fn drop(&mut self) {
        let _ = self.terminal.clear();
        let _ = self.terminal.show_cursor();
    }
}

/// Full-screen display: header and body on top, status line at the bottom.
pub struct TerminalDisplay {
    manager: TerminalManager,
    header: Vec<String>,
    body: Vec<String>,
    status: String,
}

impl TerminalDisplay {
    pub fn new(manager: TerminalManager) -> Self {
        Self {
            manager,
            header: Vec::new(),
            body: Vec::new(),
            status: String::new(),
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let header_rows = self.header.len();
        let lines: Vec<Line> = self
            .header
            .iter()
            .map(|text| Line::styled(text.clone(), Style::default().add_modifier(Modifier::BOLD)))
            .chain(self.body.iter().map(|text| Line::raw(text.clone())))
            .collect();
        let status = self.status.clone();

        self.manager.draw(|frame| {
            let [main, bottom] =
                Layout::vertical([Constraint::Min(header_rows as u16), Constraint::Length(1)])
                    .areas(frame.area());
            frame.render_widget(Paragraph::new(Text::from(lines)), main);
            frame.render_widget(Paragraph::new(status), bottom);
        })
    }
}

impl Display for TerminalDisplay {
    fn size(&self) -> (usize, usize) {
        terminal::size()
            .map(|(width, height)| (width as usize, height as usize))
            .unwrap_or(FALLBACK_SIZE)
    }

    fn render(&mut self, header: &[String], body: &Body) -> Result<()> {
        let (width, _) = self.size();
        self.header = header.to_vec();
        self.body = body.lines(width);
        self.redraw()
    }

    fn show_progress(&mut self, line: &str) -> Result<()> {
        if self.status == line {
            return Ok(());
        }
        self.status = line.to_string();
        self.redraw()
    }
}
