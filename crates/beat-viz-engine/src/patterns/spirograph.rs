//! Hypotrochoid traced by a rolling circle.

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
pub struct SpirographParams {
    /// Fixed circle radius as a fraction of the smaller dimension
    pub outer_radius: f32,
    /// Rolling circle radius relative to the fixed one
    pub inner_ratio: f32,
    /// Pen distance relative to the rolling circle radius
    pub pen_ratio: f32,
    pub points: usize,
    /// Turns of the parameter covered by the drawn curve
    pub turns: f32,
    pub rotation_speed: f32,
}

impl Default for SpirographParams {
    fn default() -> Self {
        Self {
            outer_radius: 0.35,
            inner_ratio: 0.31,
            pen_ratio: 0.8,
            points: 1200,
            turns: 20.0,
            rotation_speed: 0.01,
        }
    }
}

impl SpirographParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("spirograph");
        checks.positive(&[
            ("outer_radius", self.outer_radius as f64),
            ("inner_ratio", self.inner_ratio as f64),
        ])?;
        checks.at_least(&[("points", self.points as u64)], 2)?;
        checks.finite(&[
            ("pen_ratio", self.pen_ratio as f64),
            ("turns", self.turns as f64),
            ("rotation_speed", self.rotation_speed as f64),
        ])
    }
}

#[derive(Default)]
pub struct Spirograph {
    angle: f32,
}

/// Point on the hypotrochoid with radii `big`, `small` and pen distance `pen`.
pub fn hypotrochoid(big: f32, small: f32, pen: f32, t: f32) -> Vec2 {
    let k = (big - small) / small.max(f32::EPSILON);
    Vec2::new(
        (big - small) * t.cos() + pen * (k * t).cos(),
        (big - small) * t.sin() - pen * (k * t).sin(),
    )
}

impl Generator for Spirograph {
    type Params = SpirographParams;

    fn reset(&mut self, _size: Vec2, _params: &SpirographParams, _rng: &mut SmallRng) {
        self.angle = 0.0;
    }

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &SpirographParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        self.angle = (self.angle + params.rotation_speed * (1.0 + m.mid * 2.0)) % std::f32::consts::TAU;

        let center = canvas.center();
        let big = center.min_element() * 2.0 * params.outer_radius * (1.0 + m.bass * 0.15);
        let small = big * params.inner_ratio;
        let pen = small * params.pen_ratio * (1.0 + m.treble * 0.3);
        let n = params.points.max(2);
        let (sin, cos) = self.angle.sin_cos();

        let curve: Vec<Vec2> = (0..=n)
            .map(|i| {
                let t = i as f32 / n as f32 * params.turns * std::f32::consts::TAU;
                let p = hypotrochoid(big, small, pen, t);
                center + Vec2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos)
            })
            .collect();

        let segments = 6;
        let chunk = curve.len() / segments + 1;
        for (k, part) in curve.chunks(chunk).enumerate() {
            let hue = ctx.hue_base + k as f32 * 360.0 / segments as f32;
            canvas.stroke_polyline(part, 1.5, hsla(hue, 0.85, 0.6, 0.8));
        }
    }
}
