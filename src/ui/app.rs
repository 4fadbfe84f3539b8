use super::events::InputSource;
use super::{progress_line, Display, Timing};
use crate::behavior::BanList;
use crate::catalog::Catalog;
use crate::menu::node::MenuContext;
use crate::menu::{Action, Destination, MenuNode, Response, View};
use crate::player::{PlaybackQueue, PlayerView};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

enum Screen {
    Menu(Box<MenuNode>),
    Player,
}

/// Owns the screen stack and turns every response into a transition.
pub struct Navigator<D: Display, I: InputSource> {
    catalog: Arc<dyn Catalog>,
    queue: PlaybackQueue,
    bans: BanList,
    player: PlayerView,
    display: D,
    input: I,
    timing: Timing,
    header: Vec<String>,
}

impl<D: Display, I: InputSource> Navigator<D, I> {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        queue: PlaybackQueue,
        display: D,
        input: I,
        timing: Timing,
    ) -> Self {
        let bans = queue.bans().clone();
        Self {
            catalog,
            queue,
            bans,
            player: PlayerView::new(timing.player_tick),
            display,
            input,
            timing,
            header: header_lines("listener"),
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.header = header_lines(name);
        self
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn bans(&self) -> &BanList {
        &self.bans
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    fn context(&self) -> MenuContext<'_> {
        MenuContext {
            queue: &self.queue,
            bans: &self.bans,
            catalog: self.catalog.as_ref(),
            ui_height: self.display.ui_height(),
        }
    }

    /// Render, read, respond until something says quit.
    pub async fn run(&mut self) -> Result<()> {
        info!("Session started");
        let mut stack = vec![Screen::Menu(Box::new(MenuNode::new(View::Main, self.timing)))];
        self.initialize_top(&mut stack);

        while let Some(screen) = stack.last_mut() {
            let destination = match screen {
                Screen::Menu(node) => {
                    let body = node.get_ui(&self.context());
                    self.display.render(&self.header, &body)?;
                    let Self {
                        queue,
                        display,
                        input,
                        ..
                    } = self;
                    let mut tick = || pump(queue, display);
                    node.get_response(input, &mut tick).await?
                }
                Screen::Player => {
                    let body = self.player.get_ui(&self.queue, self.display.ui_height());
                    self.display.render(&self.header, &body)?;
                    let Self {
                        queue,
                        display,
                        input,
                        player,
                        ..
                    } = self;
                    player.get_response(queue, input, &mut |queue| show_progress(queue, display))?
                }
            };
            self.respond(destination, &mut stack);
        }

        info!("Session ended");
        Ok(())
    }

    fn respond(&mut self, destination: Destination, stack: &mut Vec<Screen>) {
        let (response, acted) = match destination {
            Destination::Respond(response) => (response, false),
            Destination::Action(action) => (self.perform(action), true),
        };

        match response {
            Response::Noop => {
                // bans and queue changes show up in the options
                if acted {
                    self.initialize_top(stack);
                }
            }
            Response::Quit => {
                debug!("Quit requested");
                stack.clear();
            }
            Response::Up => {
                stack.pop();
                self.initialize_top(stack);
            }
            Response::Player => {
                if !matches!(stack.last(), Some(Screen::Player)) {
                    debug!("Switching to the player");
                    stack.push(Screen::Player);
                }
            }
            Response::Descend(view) => {
                let mut node = MenuNode::new(view, self.timing);
                match node.initialize(&self.context()) {
                    Ok(()) => {
                        debug!("Descending into {}", node.view().title());
                        stack.push(Screen::Menu(Box::new(node)));
                    }
                    Err(e) => {
                        error!("Could not open {}: {}", node.view().title(), e);
                        self.initialize_top(stack);
                    }
                }
            }
        }
    }

    /// Re-initialize the menu on top, dropping menus that cannot be built.
    fn initialize_top(&self, stack: &mut Vec<Screen>) {
        while let Some(Screen::Menu(node)) = stack.last_mut() {
            match node.initialize(&self.context()) {
                Ok(()) => return,
                Err(e) => {
                    error!("Could not rebuild {}: {}", node.view().title(), e);
                    stack.pop();
                }
            }
        }
    }

    fn perform(&mut self, action: Action) -> Response {
        match action {
            Action::PlayCollection {
                collection,
                start,
                shuffle,
            } => {
                self.queue.load_playlist(collection, shuffle);
                match start {
                    Some(idx) => {
                        if let Err(e) = self.queue.play_track(idx) {
                            warn!("Could not start at track {}: {}", idx, e);
                        }
                    }
                    None => self.queue.play_current_song(true, true),
                }
                Response::Player
            }
            Action::Enqueue(item) => {
                self.queue.add_to_queue(item);
                Response::Up
            }
            Action::PlayNowThenRemove(track) => {
                self.queue.add_play_then_remove(track);
                Response::Player
            }
            Action::PlayQueuePosition(position) => {
                if let Err(e) = self.queue.play_position(position) {
                    warn!("Could not play queue position {}: {}", position, e);
                }
                Response::Player
            }
            Action::BanArtist(artist) => {
                self.bans.ban(&artist);
                Response::Noop
            }
            Action::UnbanArtist(artist) => {
                self.bans.unban(&artist);
                Response::Noop
            }
        }
    }
}

fn header_lines(name: &str) -> Vec<String> {
    vec![
        format!("tunedeck v. {}", env!("CARGO_PKG_VERSION")),
        format!("Hi there {name}"),
        String::new(),
    ]
}

// Menus idle here: keep the engine pumped and the status line fresh
fn pump(queue: &mut PlaybackQueue, display: &mut impl Display) {
    queue.process_engine_events();
    queue.check_end_of_track();
    show_progress(queue, display);
}

fn show_progress(queue: &PlaybackQueue, display: &mut impl Display) {
    let (width, _) = display.size();
    let line = match queue.progress() {
        Ok(progress) => progress
            .map(|progress| progress_line(&progress, width))
            .unwrap_or_default(),
        Err(e) => {
            warn!("Could not format playback progress: {}", e);
            String::new()
        }
    };
    if let Err(e) = display.show_progress(&line) {
        warn!("Could not draw the status line: {:#}", e);
    }
}
