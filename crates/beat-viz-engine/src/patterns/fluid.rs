//! Flow field of short strokes following a time-varying angle field.

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
pub struct FluidParams {
    /// Grid spacing in pixels
    pub spacing: f32,
    pub segment_length: f32,
    /// Extra segment length at full mid
    pub mid_length: f32,
    /// Spatial frequency of the angle field
    pub field_scale: f32,
    pub flow_speed: f32,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            spacing: 24.0,
            segment_length: 14.0,
            mid_length: 10.0,
            field_scale: 0.008,
            flow_speed: 0.01,
        }
    }
}

impl FluidParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("fluid");
        checks.positive(&[("spacing", self.spacing as f64)])?;
        checks.finite(&[
            ("segment_length", self.segment_length as f64),
            ("mid_length", self.mid_length as f64),
            ("field_scale", self.field_scale as f64),
            ("flow_speed", self.flow_speed as f64),
        ])
    }
}

#[derive(Default)]
pub struct Fluid {
    phase: f32,
}

/// Flow direction in radians at `p`.
pub fn flow_angle(p: Vec2, phase: f32, scale: f32) -> f32 {
    let a = (p.x * scale + phase).sin() + (p.y * scale * 1.7 - phase * 0.6).cos();
    let b = ((p.x + p.y) * scale * 0.5 + phase * 1.4).sin();
    (a + b) * std::f32::consts::PI
}

impl Generator for Fluid {
    type Params = FluidParams;

    fn reset(&mut self, _size: Vec2, _params: &FluidParams, _rng: &mut SmallRng) {
        self.phase = 0.0;
    }

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &FluidParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        self.phase += params.flow_speed * (1.0 + m.overall * 3.0);

        let size = canvas.size();
        let spacing = params.spacing.max(4.0);
        let length = params.segment_length + m.mid * params.mid_length;
        let cols = (size.x / spacing).ceil() as usize + 1;
        let rows = (size.y / spacing).ceil() as usize + 1;

        for row in 0..rows {
            for col in 0..cols {
                let p = Vec2::new(col as f32 * spacing, row as f32 * spacing);
                let angle = flow_angle(p, self.phase, params.field_scale * (1.0 + m.bass * 0.5));
                let dir = Vec2::new(angle.cos(), angle.sin());
                let hue = ctx.hue_base + angle.to_degrees() * 0.25;
                let color = hsla(hue, 0.8, 0.5 + m.treble * 0.2, 0.6);
                canvas.stroke_line(p - dir * length * 0.5, p + dir * length * 0.5, 1.5 + m.bass * 1.5, color);
            }
        }
    }
}
