//! Configuration file management.
//!
//! Handles loading and saving user preferences to `~/.beat-viz.toml`.

use beat_viz_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 3;
const DEFAULT_RENDER_SCALE: f32 = 0.5;

const CONFIG_TEMPLATE: &str = r#"# beat-viz configuration file

# Timeout in seconds when switching audio devices (default: 3)
# device_timeout_secs = 3

# Last selected audio device (auto-saved)
# last_device = "Device Name"
# last_device_is_input = false

# Drawing surface size relative to the window (default: 0.5)
# Per-pixel patterns get expensive at full resolution.
# render_scale = 0.5

# =============================================================================
# Engine
# =============================================================================

# [engine]
# base_duration = 600               # Frames per pattern at silence (~10s at 60fps)
# min_duration = 300                # Loud audio never shortens below this
# intensity_duration_scale = 200    # Frames removed at full intensity
# transition_speed = 0.015          # Cross-fade progress per frame
# transition_intensity_boost = 0.3  # Cross-fade speed-up at full intensity
# hue_speed = 0.3                   # Degrees of hue rotation per frame
# hue_bass_boost = 1.0              # Extra degrees per frame at full bass
# trail_fade = 0.18                 # Fade per frame for swarm/fireworks/starfield/constellation
# base_fade = 0.1                   # Fade per frame for everything else
# fade_intensity_scale = 0.5        # Extra fade at full intensity (relative)
# seed = 1234                       # Fixed random seed

# Per-pattern tunables, one table per pattern:
# [engine.patterns.swarm]
# max_particles = 200
# perception_radius = 50.0
#
# [engine.patterns.bubbles]
# bass_spawn_chance = 0.35
#
# [engine.patterns.lightning]
# min_bolts = 2
# max_bolts = 8
"#;

#[derive(Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub last_device: Option<String>,
    pub last_device_is_input: Option<bool>,
    pub device_timeout_secs: Option<u64>,
    pub render_scale: Option<f32>,

    pub engine: Option<EngineConfig>,
}

impl Config {
    fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".beat-viz.toml"))
    }

    pub fn load() -> Self {
        let path = match Self::path() {
            Some(p) => p,
            None => return Self::default(),
        };

        // Create template file if it doesn't exist
        if !path.exists() {
            match fs::write(&path, CONFIG_TEMPLATE) {
                Ok(()) => info!(path = %path.display(), "created config template"),
                Err(e) => warn!(path = %path.display(), error = %e, "could not write config template"),
            }
        }

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config, using defaults");
                return Self::default();
            }
        };
        Self::parse(&text).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            Self::default()
        })
    }

    fn parse(text: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(text).map_err(|e| e.to_string())?;
        if let Some(engine) = &config.engine {
            engine.validate().map_err(|e| e.to_string())?;
        }
        Ok(config)
    }

    pub fn save(&self) {
        let Some(path) = Self::path() else {
            return;
        };
        match toml::to_string(self) {
            Ok(content) => match fs::write(&path, content) {
                Ok(()) => info!(path = %path.display(), "config saved"),
                Err(e) => warn!(path = %path.display(), error = %e, "could not save config"),
            },
            Err(e) => warn!(error = %e, "could not serialize config"),
        }
    }

    pub fn device_timeout_secs(&self) -> u64 {
        self.device_timeout_secs.unwrap_or(DEFAULT_DEVICE_TIMEOUT_SECS)
    }

    pub fn render_scale(&self) -> f32 {
        self.render_scale
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_RENDER_SCALE)
            .min(1.0)
    }

    pub fn engine(&self) -> EngineConfig {
        self.engine.clone().unwrap_or_default()
    }

    pub fn set_device(&mut self, name: &str, is_input: bool) {
        self.last_device = Some(name.to_string());
        self.last_device_is_input = Some(is_input);
        self.save();
    }
}
