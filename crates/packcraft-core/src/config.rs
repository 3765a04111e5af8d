//! Editor configuration.

use crate::align::{self, Aligner, SnapMode};
use crate::error::ConfigError;
use crate::history::MAX_HISTORY;
use crate::price::PricingRules;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_snap_tolerance() -> f64 {
    align::DEFAULT_SNAP_TOLERANCE
}

fn default_grid_size() -> f64 {
    align::DEFAULT_GRID_SIZE
}

fn default_angle_increment() -> f64 {
    align::ANGLE_SNAP_INCREMENT
}

fn default_history_limit() -> usize {
    MAX_HISTORY
}

fn default_frame_interval() -> u64 {
    16
}

/// Tunables for an editor session. Every field has a default, so a partial
/// (or empty) JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    #[serde(default = "default_snap_tolerance")]
    pub snap_tolerance: f64,
    #[serde(default)]
    pub snap_mode: SnapMode,
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
    /// Rotation snap step in degrees.
    #[serde(default = "default_angle_increment")]
    pub angle_snap_increment: f64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Minimum spacing between preview frames.
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
    #[serde(default)]
    pub pricing: PricingRules,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: default_snap_tolerance(),
            snap_mode: SnapMode::default(),
            grid_size: default_grid_size(),
            angle_snap_increment: default_angle_increment(),
            history_limit: default_history_limit(),
            frame_interval_ms: default_frame_interval(),
            pricing: PricingRules::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        log::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("snapTolerance", self.snap_tolerance),
            ("gridSize", self.grid_size),
            ("angleSnapIncrement", self.angle_snap_increment),
        ];
        if let Some((name, value)) = non_negative.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::Invalid(format!("{name} must be >= 0, got {value}")));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("historyLimit must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Alignment engine configured from these settings.
    pub fn aligner(&self) -> Aligner {
        Aligner::new(self.snap_tolerance)
            .with_mode(self.snap_mode)
            .with_grid(self.grid_size)
    }
}
