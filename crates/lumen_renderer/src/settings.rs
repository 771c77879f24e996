//! Render settings, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tracer::BounceLimit;

/// Errors that can occur while loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// How the sample budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// One pass per tick, the display refreshed after each.
    #[default]
    Progressive,
    /// The whole budget in a single tick, displayed once.
    AllAtOnce,
}

/// Everything the renderer reads at startup.
///
/// Missing JSON fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Interactive buffer size, `[width, height]`.
    pub small_resolution: (u32, u32),
    /// High quality buffer size, `[width, height]`.
    pub big_resolution: (u32, u32),
    /// Passes after which refinement stops.
    pub samples_limit: u32,
    pub bounce_limit: BounceLimit,
    pub gamma: f32,
    /// Hit query upper bound while in fast mode.
    pub fast_ray_max_length: f32,
    pub render_mode: RenderMode,
    /// Fixed RNG seed; a random one when absent.
    pub seed: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            small_resolution: (300, 150),
            big_resolution: (1920, 1080),
            samples_limit: 500,
            bounce_limit: BounceLimit::default(),
            gamma: 2.2,
            fast_ray_max_length: 5.0,
            render_mode: RenderMode::Progressive,
            seed: None,
        }
    }
}

impl RenderSettings {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded render settings from {:?}", path.as_ref());
        Ok(settings)
    }

    pub fn validate(&self) -> SettingsResult<()> {
        for (name, (width, height)) in [
            ("small_resolution", self.small_resolution),
            ("big_resolution", self.big_resolution),
        ] {
            if width == 0 || height == 0 {
                return Err(SettingsError::Invalid(format!(
                    "{name} must be positive, got {width}x{height}"
                )));
            }
        }

        if self.samples_limit == 0 {
            return Err(SettingsError::Invalid(
                "samples_limit must be at least 1".into(),
            ));
        }

        if self.gamma <= 0.0 || !self.gamma.is_finite() {
            return Err(SettingsError::Invalid(format!(
                "gamma must be positive, got {}",
                self.gamma
            )));
        }

        if self.fast_ray_max_length.is_nan() || self.fast_ray_max_length <= 0.0 {
            return Err(SettingsError::Invalid(format!(
                "fast_ray_max_length must be positive, got {}",
                self.fast_ray_max_length
            )));
        }

        Ok(())
    }
}
