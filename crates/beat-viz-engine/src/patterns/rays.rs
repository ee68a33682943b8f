//! Rotating light rays from the center.

use glam::Vec2;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use super::ranges::Checks;
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::hsla;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RaysParams {
    pub ray_count: usize,
    /// Extra rays at full treble
    pub treble_rays: f32,
    /// Ray length range as a fraction of the half diagonal, interpolated by bass
    pub length_min: f32,
    pub length_max: f32,
    pub rotation_speed: f32,
    pub rotation_mid_boost: f32,
    /// Angular width of one ray as a fraction of its slot
    pub width: f32,
}

impl Default for RaysParams {
    fn default() -> Self {
        Self {
            ray_count: 12,
            treble_rays: 12.0,
            length_min: 0.3,
            length_max: 0.9,
            rotation_speed: 0.005,
            rotation_mid_boost: 0.03,
            width: 0.35,
        }
    }
}

impl RaysParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("rays");
        checks.range("length", self.length_min as f64, self.length_max as f64, 0.0)?;
        checks.non_negative(&[("treble_rays", self.treble_rays as f64)])?;
        checks.finite(&[
            ("rotation_speed", self.rotation_speed as f64),
            ("rotation_mid_boost", self.rotation_mid_boost as f64),
            ("width", self.width as f64),
        ])
    }

    pub fn count(&self, treble: f32) -> usize {
        self.ray_count + (treble.clamp(0.0, 1.0) * self.treble_rays) as usize
    }
}

#[derive(Default)]
pub struct Rays {
    rotation: f32,
}

impl Rays {
    pub fn rotation(&self) -> f32 {
        self.rotation
    }
}

impl Generator for Rays {
    type Params = RaysParams;

    fn reset(&mut self, _size: Vec2, _params: &RaysParams, _rng: &mut SmallRng) {
        self.rotation = 0.0;
    }

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &RaysParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        self.rotation = (self.rotation + params.rotation_speed + m.mid * params.rotation_mid_boost)
            % std::f32::consts::TAU;

        let center = canvas.center();
        let half_diag = center.length();
        let count = params.count(m.treble).max(1);
        let slot = std::f32::consts::TAU / count as f32;
        let half_width = slot * params.width * 0.5;
        let length = half_diag * (params.length_min + (params.length_max - params.length_min) * m.bass);

        for i in 0..count {
            let angle = self.rotation + i as f32 * slot;
            // Alternate rays breathe out of phase
            let wobble = 1.0 + 0.1 * (ctx.time * 3.0 + i as f32).sin();
            let tip = length * wobble;
            let a = center + Vec2::new((angle - half_width).cos(), (angle - half_width).sin()) * tip;
            let b = center + Vec2::new((angle + half_width).cos(), (angle + half_width).sin()) * tip;
            let hue = ctx.hue_base + i as f32 / count as f32 * 180.0;
            canvas.fill_polygon(&[center, a, b], hsla(hue, 0.9, 0.55, 0.35 + m.overall * 0.3));
        }
        canvas.fill_circle(center, 10.0 + m.bass * 30.0, hsla(ctx.hue_base, 0.5, 0.9, 0.8));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FrequencyMetrics;
    use rand::SeedableRng;

    #[test]
    fn test_treble_adds_rays() {
        let params = RaysParams::default();
        assert_eq!(params.count(0.0), 12);
        assert_eq!(params.count(1.0), 24);
    }

    #[test]
    fn test_mid_speeds_up_rotation() {
        let params = RaysParams::default();
        let mut canvas = Canvas::new(32, 32).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);

        let mut calm = Rays::default();
        calm.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
        let mut busy = Rays::default();
        let ctx = FrameContext {
            metrics: FrequencyMetrics {
                mid: 1.0,
                ..FrequencyMetrics::SILENT
            },
            ..FrameContext::default()
        };
        busy.render(&mut canvas, &ctx, &params, &mut rng);
        assert!((calm.rotation() - 0.005).abs() < 1e-6);
        assert!(busy.rotation() > calm.rotation());
    }
}
