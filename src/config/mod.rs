// Configuration for tunedeck
// TOML under the user config dir, written out with defaults the first time

use crate::player::QueueSettings;
use crate::ui::Timing;
use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub banned_artists_path: PathBuf,
    pub log_dir: PathBuf,
    pub display_name: String,
    pub playback: PlaybackConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub seek_step_seconds: u64,
    /// Past this, "previous" restarts the song instead.
    pub restart_threshold_seconds: u64,
    pub max_duration_seconds: u64,
    pub shuffle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub menu_tick_ms: u64,
    pub player_tick_ms: u64,
    pub loader_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let base = Self::base_dir();
        Self {
            catalog_path: base.join("catalog.json"),
            banned_artists_path: base.join("banned_artists.json"),
            log_dir: base.join("logs"),
            display_name: "listener".to_string(),
            playback: PlaybackConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        let queue = QueueSettings::default();
        Self {
            seek_step_seconds: queue.seek_step.as_secs(),
            restart_threshold_seconds: queue.restart_threshold.as_secs(),
            max_duration_seconds: queue.max_duration_seconds,
            shuffle: queue.shuffle,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        let timing = Timing::default();
        Self {
            menu_tick_ms: timing.menu_tick.as_millis() as u64,
            player_tick_ms: timing.player_tick.as_millis() as u64,
            loader_poll_ms: timing.loader_poll.as_millis() as u64,
        }
    }
}

impl Config {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load `path`, creating it with defaults if it does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing config {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            info!("Wrote default config to {}", path.display());
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("tunedeck");
        Ok(config_dir.join("config.toml"))
    }

    fn base_dir() -> PathBuf {
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tunedeck")
    }

    pub fn queue_settings(&self) -> QueueSettings {
        QueueSettings {
            seek_step: Duration::from_secs(self.playback.seek_step_seconds),
            restart_threshold: Duration::from_secs(self.playback.restart_threshold_seconds),
            max_duration_seconds: self.playback.max_duration_seconds,
            shuffle: self.playback.shuffle,
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            menu_tick: Duration::from_millis(self.ui.menu_tick_ms),
            player_tick: Duration::from_millis(self.ui.player_tick_ms),
            loader_poll: Duration::from_millis(self.ui.loader_poll_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).expect("load");
        assert!(path.exists());
        assert_eq!(config.playback.max_duration_seconds, 3599);
        assert_eq!(config.ui.player_tick_ms, 500);

        let again = Config::load_from(&path).expect("reload");
        assert_eq!(again, config);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "display_name = \"Robin\"\n[playback]\nshuffle = true\nseek_step_seconds = 30\n",
        )
        .unwrap();

        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.display_name, "Robin");
        let settings = config.queue_settings();
        assert!(settings.shuffle);
        assert_eq!(settings.seek_step, Duration::from_secs(30));
        assert_eq!(settings.restart_threshold, Duration::from_secs(5));
        assert_eq!(config.timing(), Timing::default());
    }

    #[test]
    fn broken_toml_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "display_name = [").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }
}
