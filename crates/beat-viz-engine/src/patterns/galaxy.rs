//! Spiral galaxy with logarithmic arms.

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
pub struct GalaxyParams {
    pub arms: usize,
    pub points_per_arm: usize,
    /// Radians of winding per unit of normalized radius
    pub tightness: f32,
    pub rotation_speed: f32,
    pub rotation_mid_boost: f32,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            arms: 4,
            points_per_arm: 90,
            tightness: 0.3,
            rotation_speed: 0.002,
            rotation_mid_boost: 0.02,
        }
    }
}

impl GalaxyParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("galaxy");
        checks.at_least(&[("arms", self.arms as u64), ("points_per_arm", self.points_per_arm as u64)], 1)?;
        checks.positive(&[("tightness", self.tightness as f64)])?;
        checks.finite(&[
            ("rotation_speed", self.rotation_speed as f64),
            ("rotation_mid_boost", self.rotation_mid_boost as f64),
        ])
    }
}

#[derive(Default)]
pub struct Galaxy {
    rotation: f32,
}

impl Generator for Galaxy {
    type Params = GalaxyParams;

    fn reset(&mut self, _size: Vec2, _params: &GalaxyParams, _rng: &mut SmallRng) {
        self.rotation = 0.0;
    }

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &GalaxyParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        self.rotation = (self.rotation + params.rotation_speed + m.mid * params.rotation_mid_boost)
            % std::f32::consts::TAU;

        let center = canvas.center();
        let max_radius = center.min_element() * 0.95;
        let arms = params.arms.max(1);
        let points = params.points_per_arm.max(1);

        canvas.fill_radial_gradient(
            center,
            max_radius * (0.25 + m.bass * 0.15),
            &[
                (0.0, hsla(ctx.hue_base + 40.0, 0.6, 0.9, 0.9)),
                (0.4, hsla(ctx.hue_base + 20.0, 0.8, 0.5, 0.35)),
                (1.0, hsla(ctx.hue_base, 0.8, 0.3, 0.0)),
            ],
        );

        for arm in 0..arms {
            let arm_offset = arm as f32 / arms as f32 * std::f32::consts::TAU;
            for i in 0..points {
                let t = (i + 1) as f32 / points as f32;
                let winding = t / params.tightness.max(0.01);
                let angle = self.rotation + arm_offset + winding;
                // Deterministic scatter so the arm has some width
                let scatter = ((i * 7 + arm * 13) as f32).sin() * 0.15 * t;
                let r = max_radius * t;
                let p = center
                    + Vec2::new((angle + scatter).cos(), (angle + scatter).sin()) * r;
                let size = (1.0 - t) * 3.0 + 0.8 + m.treble * 1.5;
                let hue = ctx.hue_base + t * 120.0 + arm as f32 * 20.0;
                canvas.fill_circle(p, size, hsla(hue, 0.8, 0.55 + (1.0 - t) * 0.3, 0.8));
            }
        }
    }
}
