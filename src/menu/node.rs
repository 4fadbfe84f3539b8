use super::options::{normalize, MenuOption, OptionIndex};
use super::views::View;
use super::{Destination, MenuError, Response};
use crate::behavior::BanList;
use crate::catalog::{Catalog, CatalogPage, Loader};
use crate::player::PlaybackQueue;
use crate::ui::events::{InputSource, Key};
use crate::ui::{Body, Row, Timing};
use anyhow::Result;
use std::cmp::Ordering;
use tracing::{debug, error};

/// What a menu can see while building its options.
pub struct MenuContext<'a> {
    pub queue: &'a PlaybackQueue,
    pub bans: &'a BanList,
    pub catalog: &'a dyn Catalog,
    /// Rows available for the menu body.
    pub ui_height: usize,
}

/// One menu screen.
pub struct MenuNode {
    view: View,
    options: OptionIndex,
    filter: String,
    page: usize,
    loader: Option<Loader>,
    // loader results already turned into options
    transformed: bool,
    stalls: usize,
    timing: Timing,
}

impl MenuNode {
    pub fn new(view: View, timing: Timing) -> Self {
        Self {
            view,
            options: OptionIndex::default(),
            filter: String::new(),
            page: 0,
            loader: None,
            transformed: false,
            stalls: 0,
            timing,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn options(&self) -> &OptionIndex {
        &self.options
    }

    pub fn is_loading(&self) -> bool {
        self.loader.as_ref().is_some_and(|loader| !loader.is_loaded()) || self.pending_transform()
    }

    fn pending_transform(&self) -> bool {
        self.loader.as_ref().is_some_and(Loader::is_loaded) && !self.transformed
    }

    fn results(&self) -> Option<&CatalogPage> {
        self.loader.as_ref().and_then(Loader::results)
    }

    /// Rebuild the options and forget the typed filter. The background
    /// fetch starts on the first call and is reused afterwards.
    pub fn initialize(&mut self, ctx: &MenuContext<'_>) -> Result<(), MenuError> {
        if self.loader.is_none() {
            self.loader = self.view.loader(ctx.catalog);
        }
        self.filter.clear();
        self.page = 0;
        self.rebuild(ctx)
    }

    fn rebuild(&mut self, ctx: &MenuContext<'_>) -> Result<(), MenuError> {
        let results = self.loader.as_ref().and_then(Loader::results);
        let mut options = OptionIndex::new(self.view.options(ctx, results))?;
        options.insert(MenuOption::system("q", "quit", Response::Quit))?;
        if self.view.include_up() {
            options.insert(MenuOption::system("u", "..", Response::Up))?;
        }
        if ctx.queue.has_been_loaded() {
            options.insert(MenuOption::system("p", "player", Response::Player))?;
        }
        if results.is_some() {
            self.transformed = true;
        }
        debug!("{} rebuilt with {} options", self.view.title(), options.len());
        self.options = options;
        Ok(())
    }

    /// Read one token and react to it. Idle timeouts run `tick` and keep
    /// waiting; anything that changes the screen returns `Noop` for a redraw.
    pub async fn get_response(
        &mut self,
        input: &mut dyn InputSource,
        tick: &mut dyn FnMut(),
    ) -> Result<Destination> {
        if let Some(loader) = self.loader.as_mut() {
            if !self.transformed {
                if !loader.poll(self.timing.loader_poll).await {
                    self.stalls += 1;
                    tick();
                }
                // Either way the screen changes: more dots, or the results
                return Ok(Response::Noop.into());
            }
        }

        loop {
            tick();
            let Some(key) = input.read_key(self.timing.menu_tick)? else {
                continue;
            };
            return Ok(match key {
                Key::Interrupt => Response::Quit.into(),
                Key::Backspace => {
                    self.filter.pop();
                    Response::Noop.into()
                }
                Key::PageUp => {
                    self.page = self.page.saturating_sub(1);
                    Response::Noop.into()
                }
                Key::PageDown => {
                    self.page += 1;
                    Response::Noop.into()
                }
                Key::Enter => self.commit(),
                Key::Char(c) => {
                    self.filter.push(c);
                    Response::Noop.into()
                }
                Key::Resize | Key::ArrowUp | Key::ArrowDown => Response::Noop.into(),
            });
        }
    }

    fn commit(&mut self) -> Destination {
        if let Some(option) = self.options.match_best_or_none(&self.filter) {
            debug!("'{}' resolved to [{}]", self.filter, option.key);
            return option.destination.clone();
        }
        let query = self.filter.trim();
        if let View::Search(kind) = &self.view {
            if !query.is_empty() && self.options.get_possibilities(query).is_empty() {
                debug!("Searching {} for '{}'", kind.label(), query);
                return Destination::descend(View::SearchResults {
                    kind: *kind,
                    query: query.to_string(),
                    cursor: None,
                });
            }
        }
        Response::Noop.into()
    }

    pub fn get_ui(&mut self, ctx: &MenuContext<'_>) -> Body {
        if self.pending_transform() {
            if let Err(e) = self.rebuild(ctx) {
                error!("Could not build options for {}: {}", self.view.title(), e);
                self.transformed = true;
                return Body::Text(format!("Could not show this menu: {e}"));
            }
        }
        if self.is_loading() {
            return Body::Text(format!("Loading{}", ".".repeat(self.stalls % 4)));
        }

        let mut rows = vec![Row::line(self.view.title()), Row::blank()];
        if let Some(message) = self.results().and_then(|page| page.message.as_deref()) {
            rows.push(Row::line(message));
            rows.push(Row::blank());
        }

        let filtered = self.options.filter(&self.filter);
        let mut items: Vec<&MenuOption> = filtered.iter().collect();
        items.sort_by(|a, b| compare_options(a, b));

        if items.is_empty() {
            rows.push(Row::line(format!("No matches for \"{}\"", self.filter)));
        } else {
            let hint = if self.filter.is_empty() {
                None
            } else {
                self.options
                    .match_best_or_none(&self.filter)
                    .map(|best| format!("Press [return] to go to ({})", best.label))
            };
            // rows so far, the hint pair and the closing blank and query
            let hint_rows = if hint.is_some() { 2 } else { 0 };
            let chrome = rows.len() + hint_rows + 2;
            let mut capacity = ctx.ui_height.saturating_sub(chrome).max(1);
            if items.len() > capacity {
                // room for "Page k of n"
                capacity = capacity.saturating_sub(1).max(1);
            }
            let (page, shown, pages) = paginate(&items, self.page, capacity);
            self.page = page;
            rows.extend(
                shown
                    .iter()
                    .map(|option| Row::line(format!("[{}]: {}", option.key, option.label))),
            );
            if pages > 1 {
                rows.push(Row::line(format!("Page {} of {}", page + 1, pages)));
            }
            if let Some(hint) = hint {
                rows.push(Row::blank());
                rows.push(Row::line(hint));
            }
        }

        rows.push(Row::blank());
        rows.push(Row::line(format!("Query: {}", self.filter)));
        Body::Rows(rows)
    }
}

/// System options last, then letters before numbers, numbers by value.
fn compare_options(a: &MenuOption, b: &MenuOption) -> Ordering {
    fn sort_key(option: &MenuOption) -> (bool, Option<u64>, String) {
        let key = normalize(&option.key);
        let number = key.parse::<u64>().ok();
        (option.system, number, key)
    }
    let (a_system, a_number, a_key) = sort_key(a);
    let (b_system, b_number, b_key) = sort_key(b);
    a_system
        .cmp(&b_system)
        .then_with(|| match (a_number, b_number) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a_key.cmp(&b_key))
}

/// Slice out `page` at `capacity` per page. Past-the-end pages fall back to
/// the last non-empty one. Returns the page actually shown and the page count.
pub fn paginate<T>(items: &[T], page: usize, capacity: usize) -> (usize, &[T], usize) {
    let capacity = capacity.max(1);
    let pages = items.len().div_ceil(capacity);
    let mut page = page;
    while page > 0 && page * capacity >= items.len() {
        page -= 1;
    }
    let start = page * capacity;
    let end = (start + capacity).min(items.len());
    (page, &items[start.min(end)..end], pages)
}
