//! Journey configuration.
//!
//! Loaded from `~/.journey/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cluster::ClusterOptions;
use crate::engine::EngineOptions;
use crate::model::Scale;
use crate::playback::DEFAULT_BASE_STEP;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Journey JSON document to read events from.
    pub data: Option<PathBuf>,

    /// `SQLite` file holding the saved viewport.
    /// Defaults to `~/.journey/viewport.sqlite`.
    pub store: Option<PathBuf>,

    pub default_scale: Scale,

    /// A time bucket with more events than this collapses into a cluster.
    pub cluster_threshold: usize,

    /// Number of time buckets across the window, one per display unit.
    pub display_width: usize,

    pub base_step: f64,

    /// Default request window in days, counted back from the journey end.
    pub days: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        let cluster = ClusterOptions::default();
        Self {
            data: None,
            store: None,
            default_scale: Scale::default(),
            cluster_threshold: cluster.threshold,
            display_width: cluster.buckets,
            base_step: DEFAULT_BASE_STEP,
            days: None,
        }
    }
}

impl Config {
    /// Load config from `~/.journey/config.toml`, or defaults if absent.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.display_width == 0 {
            return Err(format!(
                "display-width must be at least 1 in {}",
                path.display()
            ));
        }
        if !(config.base_step.is_finite() && config.base_step > 0.0) {
            return Err(format!(
                "base-step must be a positive number in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.journey/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".journey").join("config.toml"))
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            cluster: ClusterOptions {
                threshold: self.cluster_threshold,
                buckets: self.display_width,
            },
            base_step: self.base_step,
            default_scale: self.default_scale,
        }
    }
}
