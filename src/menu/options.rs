use super::{Destination, MenuError};
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::debug;

/// A selectable entry: typed `key`, shown `label`.
#[derive(Debug, Clone)]
pub struct MenuOption {
    pub key: String,
    pub label: String,
    pub destination: Destination,
    /// quit/up/player, always sorted last
    pub system: bool,
}

impl MenuOption {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        destination: impl Into<Destination>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            destination: destination.into(),
            system: false,
        }
    }

    pub fn system(
        key: impl Into<String>,
        label: impl Into<String>,
        destination: impl Into<Destination>,
    ) -> Self {
        Self {
            system: true,
            ..Self::new(key, label, destination)
        }
    }

    pub fn normalized_key(&self) -> String {
        normalize(&self.key)
    }
}

/// Keys compare without spaces and case, so "   1" and "1" are the same key.
pub fn normalize(key: &str) -> String {
    key.chars().filter(|c| *c != ' ').collect::<String>().to_lowercase()
}

/// Options by key, with per-pattern match caching.
#[derive(Debug, Clone, Default)]
pub struct OptionIndex {
    options: Vec<MenuOption>,
    by_key: HashMap<String, usize>,
    cache: RefCell<HashMap<String, Vec<usize>>>,
}

impl OptionIndex {
    pub fn new(options: Vec<MenuOption>) -> Result<Self, MenuError> {
        let mut index = Self::default();
        for option in options {
            index.insert(option)?;
        }
        Ok(index)
    }

    /// Fails when the key collides with an existing one after normalization.
    pub fn insert(&mut self, option: MenuOption) -> Result<(), MenuError> {
        let normalized = option.normalized_key();
        if self.by_key.contains_key(&normalized) {
            return Err(MenuError::DuplicateKey {
                key: option.key,
                normalized,
            });
        }
        self.by_key.insert(normalized, self.options.len());
        self.options.push(option);
        self.cache.borrow_mut().clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MenuOption> {
        self.options.iter()
    }

    pub fn get(&self, key: &str) -> Option<&MenuOption> {
        self.by_key.get(&normalize(key)).map(|&i| &self.options[i])
    }

    /// Keys that start with `pattern`, plus keys whose label contains the
    /// pattern's characters in order (case-insensitive).
    pub fn get_possibilities(&self, pattern: &str) -> Vec<String> {
        self.possible_indices(pattern)
            .into_iter()
            .map(|i| self.options[i].key.clone())
            .collect()
    }

    fn possible_indices(&self, pattern: &str) -> Vec<usize> {
        let cache_key = pattern.to_lowercase();
        if let Some(hit) = self.cache.borrow().get(&cache_key) {
            debug!("Pattern '{}' found in cache", cache_key);
            return hit.clone();
        }

        let key_pattern = normalize(pattern);

        let label_pattern = pattern.trim().to_lowercase();
        let matcher = SkimMatcherV2::default().ignore_case();
        let matches: Vec<usize> = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, option)| {
                option.normalized_key().starts_with(&key_pattern)
                    || matcher.fuzzy_match(&option.label, &label_pattern).is_some()
            })
            .map(|(i, _)| i)
            .collect();

        debug!("Pattern '{}' matched {} options", cache_key, matches.len());
        self.cache.borrow_mut().insert(cache_key, matches.clone());
        matches
    }

    /// Sub-index of the possibilities; an empty pattern keeps everything.
    pub fn filter(&self, pattern: &str) -> OptionIndex {
        if pattern.is_empty() {
            return self.clone();
        }
        let options = self
            .possible_indices(pattern)
            .into_iter()
            .map(|i| self.options[i].clone())
            .collect();
        // Subset of unique keys, cannot collide
        Self::new(options).unwrap_or_default()
    }

    /// The only possibility, or else the option whose key is exactly `pattern`.
    pub fn match_best_or_none(&self, pattern: &str) -> Option<&MenuOption> {
        let possibilities = self.possible_indices(pattern);
        if let [only] = possibilities.as_slice() {
            return Some(&self.options[*only]);
        }
        let exact = self.by_key.get(&normalize(pattern)).map(|&i| &self.options[i]);
        if let Some(option) = exact {
            debug!("Pattern '{}' is exactly key '{}'", pattern, option.key);
        }
        exact
    }
}
