//! Engine configuration.
//!
//! Every field is optional; accessors fill in the defaults so a partial TOML
//! table (or none at all) is always a complete configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::patterns::PatternParams;
use crate::scheduler::SchedulerSettings;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    // Scheduler timing
    pub base_duration: Option<u32>,
    pub min_duration: Option<u32>,
    pub intensity_duration_scale: Option<f32>,
    pub transition_speed: Option<f32>,
    pub transition_intensity_boost: Option<f32>,

    // Hue rotation
    pub hue_speed: Option<f32>,
    pub hue_bass_boost: Option<f32>,

    // Per-frame fade
    pub trail_fade: Option<f32>,
    pub base_fade: Option<f32>,
    pub fade_intensity_scale: Option<f32>,

    /// Fixed RNG seed; entropy from the OS when unset
    pub seed: Option<u64>,

    #[serde(default, skip_serializing_if = "PatternParams::is_default")]
    pub patterns: PatternParams,
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn base_duration(&self) -> u32 {
        self.base_duration.unwrap_or(600)
    }
    pub fn min_duration(&self) -> u32 {
        self.min_duration.unwrap_or(300)
    }
    pub fn intensity_duration_scale(&self) -> f32 {
        self.intensity_duration_scale.unwrap_or(200.0)
    }
    pub fn transition_speed(&self) -> f32 {
        self.transition_speed.unwrap_or(0.015)
    }
    pub fn transition_intensity_boost(&self) -> f32 {
        self.transition_intensity_boost.unwrap_or(0.3)
    }

    pub fn hue_speed(&self) -> f32 {
        self.hue_speed.unwrap_or(0.3)
    }
    pub fn hue_bass_boost(&self) -> f32 {
        self.hue_bass_boost.unwrap_or(1.0)
    }

    /// Fade alpha for patterns that leave trails
    pub fn trail_fade(&self) -> f32 {
        self.trail_fade.unwrap_or(0.18)
    }
    pub fn base_fade(&self) -> f32 {
        self.base_fade.unwrap_or(0.1)
    }
    pub fn fade_intensity_scale(&self) -> f32 {
        self.fade_intensity_scale.unwrap_or(0.5)
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            base_duration: self.base_duration(),
            min_duration: self.min_duration(),
            intensity_duration_scale: self.intensity_duration_scale(),
            transition_speed: self.transition_speed(),
            transition_intensity_boost: self.transition_intensity_boost(),
            hue_speed: self.hue_speed(),
            hue_bass_boost: self.hue_bass_boost(),
        }
    }

    /// Rejects values that would stall the scheduler, break the fade or leave a
    /// pattern with an unsampleable range.
    pub fn validate(&self) -> Result<()> {
        if self.min_duration() == 0 {
            return Err(EngineError::config("min_duration must be at least 1 frame"));
        }
        if self.min_duration() > self.base_duration() {
            return Err(EngineError::config(format!(
                "min_duration ({}) exceeds base_duration ({})",
                self.min_duration(),
                self.base_duration()
            )));
        }
        let speed = self.transition_speed();
        if !(speed.is_finite() && speed > 0.0 && speed <= 1.0) {
            return Err(EngineError::config(format!(
                "transition_speed must be in (0, 1], got {speed}"
            )));
        }
        for (name, value) in [
            ("trail_fade", self.trail_fade()),
            ("base_fade", self.base_fade()),
            ("fade_intensity_scale", self.fade_intensity_scale()),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::config(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        for (name, value) in [
            ("intensity_duration_scale", self.intensity_duration_scale()),
            ("transition_intensity_boost", self.transition_intensity_boost()),
            ("hue_speed", self.hue_speed()),
            ("hue_bass_boost", self.hue_bass_boost()),
        ] {
            if !value.is_finite() {
                return Err(EngineError::config(format!("{name} must be finite")));
            }
        }
        self.patterns.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.base_duration(), 600);
        assert_eq!(config.min_duration(), 300);
        assert_eq!(config.transition_speed(), 0.015);
        assert_eq!(config.scheduler_settings(), SchedulerSettings::default());
        assert_eq!(config.patterns, PatternParams::default());
    }

    #[test]
    fn test_partial_config_with_pattern_table() {
        let config = EngineConfig::from_toml_str(
            r#"
            base_duration = 900
            seed = 7

            [patterns.bubbles]
            bass_spawn_chance = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.base_duration(), 900);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.patterns.bubbles.bass_spawn_chance, 0.5);
        assert_eq!(config.patterns.bubbles.pop_frames, 12);
    }

    #[test]
    fn test_rejects_unknown_and_invalid_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("dwell = 3"),
            Err(EngineError::Toml(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("min_duration = 700"),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(EngineConfig::from_toml_str("transition_speed = 0.0").is_err());
        assert!(EngineConfig::from_toml_str("trail_fade = 1.5").is_err());
    }

    #[test]
    fn test_rejects_bad_pattern_tables() {
        for text in [
            "[patterns.fireworks]\nspeed_min = nan\n",
            "[patterns.voronoi]\nspeed_min = 0.5\nspeed_max = 0.1\n",
            "[patterns.swarm]\nlife_max = inf\n",
            "[patterns.matrix]\nfont_size = 0.0\n",
            "[patterns.bubbles]\ntreble_pop_chance = 2.0\n",
            "[patterns.lissajous]\nratios = []\n",
            "[patterns.constellation]\nmin_stars = 90\n",
        ] {
            assert!(
                matches!(EngineConfig::from_toml_str(text), Err(EngineError::InvalidConfig(_))),
                "{text}"
            );
        }
        let equal = EngineConfig::from_toml_str("[patterns.voronoi]\nspeed_min = 2.0\nspeed_max = 2.0\n").unwrap();
        assert_eq!(equal.patterns.voronoi.speed_min, 2.0);
    }
}
