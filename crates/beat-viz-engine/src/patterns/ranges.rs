//! Random range draws and tunable checks shared by the pattern modules.
//!
//! Draws never panic: an empty, reversed or unsampleable range collapses to
//! its lower end. The checks turn a bad table into `EngineError::InvalidConfig`
//! before it ever reaches a draw.

use rand::distr::uniform::SampleUniform;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::error::{EngineError, Result};

/// Uniform draw from `lo..=hi`.
pub fn uniform(rng: &mut SmallRng, lo: f32, hi: f32) -> f32 {
    if lo < hi && (hi - lo).is_finite() {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

/// Uniform integer draw from `lo..=hi`.
pub fn uniform_int<T>(rng: &mut SmallRng, lo: T, hi: T) -> T
where
    T: SampleUniform + PartialOrd + Copy,
{
    if lo < hi {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

/// Validates the fields of one `[patterns.<name>]` table.
pub struct Checks {
    pattern: &'static str,
}

impl Checks {
    pub fn new(pattern: &'static str) -> Self {
        Self { pattern }
    }

    fn invalid(&self, field: &str, what: impl std::fmt::Display) -> EngineError {
        EngineError::config(format!("patterns.{}.{field} {what}", self.pattern))
    }

    pub fn finite(&self, fields: &[(&str, f64)]) -> Result<()> {
        for &(field, value) in fields {
            if !value.is_finite() {
                return Err(self.invalid(field, format!("must be finite, got {value}")));
            }
        }
        Ok(())
    }

    /// Finite and strictly above zero.
    pub fn positive(&self, fields: &[(&str, f64)]) -> Result<()> {
        for &(field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(self.invalid(field, format!("must be positive, got {value}")));
            }
        }
        Ok(())
    }

    pub fn non_negative(&self, fields: &[(&str, f64)]) -> Result<()> {
        for &(field, value) in fields {
            if !(value.is_finite() && value >= 0.0) {
                return Err(self.invalid(field, format!("must be finite and >= 0, got {value}")));
            }
        }
        Ok(())
    }

    pub fn probability(&self, fields: &[(&str, f64)]) -> Result<()> {
        for &(field, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(self.invalid(field, format!("must be in [0, 1], got {value}")));
            }
        }
        Ok(())
    }

    pub fn at_least(&self, fields: &[(&str, u64)], min: u64) -> Result<()> {
        for &(field, value) in fields {
            if value < min {
                return Err(self.invalid(field, format!("must be at least {min}, got {value}")));
            }
        }
        Ok(())
    }

    pub fn ordered(&self, lo: (&str, f64), hi: (&str, f64)) -> Result<()> {
        if lo.1 > hi.1 {
            return Err(self.invalid(lo.0, format!("({}) exceeds {} ({})", lo.1, hi.0, hi.1)));
        }
        Ok(())
    }

    /// `<name>_min` and `<name>_max` finite, the lower end at least `floor`
    /// and no greater than the upper end.
    pub fn range(&self, name: &str, lo: f64, hi: f64, floor: f64) -> Result<()> {
        let lo_field = format!("{name}_min");
        let hi_field = format!("{name}_max");
        self.finite(&[(lo_field.as_str(), lo), (hi_field.as_str(), hi)])?;
        if lo < floor {
            return Err(self.invalid(&lo_field, format!("must be at least {floor}, got {lo}")));
        }
        self.ordered((lo_field.as_str(), lo), (hi_field.as_str(), hi))
    }
}
