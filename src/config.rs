//! Editor configuration
//!
//! Read from `blockmap/config.ron` in the platform config directory. Every
//! field has a default, so a partial file only overrides what it names and a
//! missing or broken one falls back to defaults with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::scene::SceneMetrics;
use crate::timeline::DEFAULT_HISTORY_LIMIT;

const CONFIG_DIR: &str = "blockmap";
const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Scene sizes used by projection and visibility
    pub scene: SceneMetrics,
    /// Undo states kept, the current one included
    pub history_limit: usize,
    /// Scene units per beat when a session starts
    pub beat_depth: f64,
    /// Tempo used until a song is loaded
    pub default_bpm: f64,
    /// Beat grid the cursor and resizes snap to
    pub snap_to: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            scene: SceneMetrics::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            beat_depth: 9.0,
            default_bpm: 120.0,
            snap_to: 0.5,
        }
    }
}

impl EditorConfig {
    /// Parse a RON config, keeping defaults for missing fields
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        let mut config: EditorConfig = ron::from_str(s)?;
        config.sanitize();
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when it can't be read
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not read config {}: {}", path.display(), e);
                }
                return Self::default();
            }
        };
        match Self::from_ron(&contents) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Invalid config {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load from the platform config directory
    pub fn load() -> Self {
        match default_path() {
            Some(path) => Self::load_or_default(path),
            None => Self::default(),
        }
    }

    /// Pretty RON for writing a starter config
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new().indentor("  ".to_string()))
    }

    /// Replace values that would break the scene math with defaults
    fn sanitize(&mut self) {
        let defaults = EditorConfig::default();
        if !(self.beat_depth.is_finite() && self.beat_depth > 0.0) {
            log::warn!("beat_depth {} is not usable, using {}", self.beat_depth, defaults.beat_depth);
            self.beat_depth = defaults.beat_depth;
        }
        if !(self.snap_to.is_finite() && self.snap_to > 0.0) {
            self.snap_to = defaults.snap_to;
        }
        if !(self.default_bpm.is_finite() && self.default_bpm > 0.0) {
            self.default_bpm = defaults.default_bpm;
        }
        if !(self.scene.render_depth.is_finite() && self.scene.render_depth > 0.0) {
            self.scene.render_depth = defaults.scene.render_depth;
        }
        self.history_limit = self.history_limit.max(1);
    }
}

/// `<config dir>/blockmap/config.ron`, where the platform has one
#[cfg(not(target_arch = "wasm32"))]
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

#[cfg(target_arch = "wasm32")]
pub fn default_path() -> Option<PathBuf> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = EditorConfig::from_ron("(beat_depth: 12.0, scene: (song_offset: 3.0))").unwrap();
        assert_eq!(config.beat_depth, 12.0);
        assert_eq!(config.scene.song_offset, 3.0);
        assert_eq!(config.scene.render_depth, 100.0);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_unusable_values_are_replaced() {
        let config = EditorConfig::from_ron("(beat_depth: 0.0, history_limit: 0)").unwrap();
        assert_eq!(config.beat_depth, EditorConfig::default().beat_depth);
        assert_eq!(config.history_limit, 1);
    }

    #[test]
    fn test_missing_or_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = EditorConfig::load_or_default(dir.path().join("absent.ron"));
        assert_eq!(missing, EditorConfig::default());

        let broken = dir.path().join("broken.ron");
        fs::write(&broken, "(beat_depth: ").unwrap();
        assert_eq!(EditorConfig::load_or_default(&broken), EditorConfig::default());
    }

    #[test]
    fn test_written_config_reads_back() {
        let mut config = EditorConfig::default();
        config.snap_to = 0.25;
        let text = config.to_ron().unwrap();
        assert_eq!(EditorConfig::from_ron(&text).unwrap(), config);
    }
}
