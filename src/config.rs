use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    detect::DEFAULT_MIN_SIZE,
    error::{Error, Result},
    restore::{MatchStrategy, RestoreOptions, DEFAULT_PROXIMITY_THRESHOLD},
    text_layout::AutoFit,
};

/// Tunables for the layout, detection and restoration pipeline.
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```
/// let config = spotfit::config::Config::from_json(r#"{ "min_spot_size": [80, 60] }"#).unwrap();
/// assert_eq!(config.min_spot_size, glam::vec2(80.0, 60.0));
/// assert_eq!(config.proximity_threshold, 150.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub min_spot_size: Vec2,
    pub proximity_threshold: f32,
    pub match_strategy: MatchStrategy,
    pub auto_fit: AutoFit,
    /// Whether text edits trigger detection on their own.
    pub auto_detect: bool,
    /// Delay after a text edit before detection runs.
    pub debounce_ms: u64,
    /// Delay used for direct user actions such as enabling auto-detect.
    pub immediate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_spot_size: DEFAULT_MIN_SIZE,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            match_strategy: MatchStrategy::Greedy,
            auto_fit: AutoFit::default(),
            auto_detect: true,
            debounce_ms: 500,
            immediate_ms: 50,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the pipeline cannot work with instead of clamping them.
    pub fn validate(&self) -> Result<()> {
        let min = self.min_spot_size;
        if !min.is_finite() || min.cmplt(Vec2::ZERO).any() {
            return Err(Error::InvalidMinSize(min));
        }
        let threshold = self.proximity_threshold;
        if !(threshold >= 0.0 && threshold.is_finite()) {
            return Err(Error::InvalidThreshold(threshold));
        }
        Ok(())
    }

    pub fn restore_options(&self) -> RestoreOptions {
        RestoreOptions {
            threshold: self.proximity_threshold,
            strategy: self.match_strategy,
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn immediate_delay(&self) -> Duration {
        Duration::from_millis(self.immediate_ms)
    }
}
