use crate::catalog::{Artist, Track};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Shared handle to the banned-artist list. Clones see the same list.
#[derive(Debug, Clone, Default)]
pub struct BanList {
    inner: Arc<RwLock<BTreeMap<String, String>>>,
    path: Option<PathBuf>,
}

impl BanList {
    /// In-memory list, nothing is written to disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing or unreadable file starts an empty list
    /// that will still be saved there.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let banned = match read_bans(&path) {
            Ok(banned) => {
                info!("Loaded {} banned artists from {}", banned.len(), path.display());
                banned
            }
            Err(e) => {
                debug!("No usable ban list at {}: {:#}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self {
            inner: Arc::new(RwLock::new(banned)),
            path: Some(path),
        }
    }

    pub fn is_banned(&self, artist: &Artist) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&artist.id)
    }

    /// Bans go by the first listed artist.
    pub fn is_track_banned(&self, track: &Track) -> bool {
        track.primary_artist().is_some_and(|artist| self.is_banned(artist))
    }

    pub fn ban(&self, artist: &Artist) {
        let added = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(artist.id.clone(), artist.name.clone())
            .is_none();
        if added {
            info!("Banned artist {} ({})", artist.name, artist.id);
            self.save();
        }
    }

    pub fn unban(&self, artist: &Artist) {
        let removed = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&artist.id)
            .is_some();
        if removed {
            info!("Unbanned artist {} ({})", artist.name, artist.id);
            self.save();
        }
    }

    /// Banned artists ordered by name.
    pub fn list(&self) -> Vec<Artist> {
        let mut artists: Vec<Artist> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, name)| Artist {
                id: id.clone(),
                name: name.clone(),
            })
            .collect();
        artists.sort_by_key(|artist| artist.name.to_lowercase());
        artists
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Failing to persist is annoying but never worth ending the session over
    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = self.write_to(path) {
            warn!("Could not save ban list to {}: {:#}", path.display(), e);
        }
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = {
            let banned = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*banned)?
        };
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

fn read_bans(path: &Path) -> Result<BTreeMap<String, String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}
