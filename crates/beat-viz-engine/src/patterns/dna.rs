//! Double helix scrolling horizontally.

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
pub struct DnaParams {
    pub strands: usize,
    pub rungs: usize,
    /// Helix amplitude as a fraction of the surface height
    pub amplitude: f32,
    pub bass_swell: f32,
    /// Phase advanced per unit of frame time
    pub twist_speed: f32,
    /// Full turns across the surface width
    pub turns: f32,
}

impl Default for DnaParams {
    fn default() -> Self {
        Self {
            strands: 2,
            rungs: 40,
            amplitude: 0.25,
            bass_swell: 0.5,
            twist_speed: 0.03,
            turns: 2.0,
        }
    }
}

impl DnaParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("dna");
        checks.at_least(&[("strands", self.strands as u64)], 1)?;
        checks.finite(&[
            ("amplitude", self.amplitude as f64),
            ("bass_swell", self.bass_swell as f64),
            ("twist_speed", self.twist_speed as f64),
            ("turns", self.turns as f64),
        ])
    }
}

#[derive(Default)]
pub struct Dna;

impl Generator for Dna {
    type Params = DnaParams;

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &DnaParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        let size = canvas.size();
        let amplitude = size.y * params.amplitude * (1.0 + m.bass * params.bass_swell);
        let phase = ctx.frame as f32 * params.twist_speed;
        let strands = params.strands.max(1);
        let rungs = params.rungs.max(2);
        let mid_y = size.y * 0.5;

        let strand_at = |s: usize, x: f32| -> (Vec2, f32) {
            let a = x / size.x * params.turns * std::f32::consts::TAU + phase
                + s as f32 / strands as f32 * std::f32::consts::TAU;
            (Vec2::new(x, mid_y + a.sin() * amplitude), a.cos())
        };

        for r in 0..rungs {
            let x = r as f32 / (rungs - 1) as f32 * size.x;
            let ends: Vec<(Vec2, f32)> = (0..strands).map(|s| strand_at(s, x)).collect();
            for pair in ends.windows(2) {
                let depth = (pair[0].1 + pair[1].1) * 0.25 + 0.5;
                canvas.stroke_line(pair[0].0, pair[1].0, 1.5, hsla(ctx.hue_base + 90.0, 0.5, 0.6, 0.2 + depth * 0.4));
            }
            for (s, (p, z)) in ends.iter().enumerate() {
                let depth = z * 0.5 + 0.5;
                let hue = ctx.hue_base + s as f32 * 120.0;
                let radius = 2.0 + depth * 4.0 + m.treble * 3.0;
                canvas.fill_circle(*p, radius, hsla(hue, 0.9, 0.4 + depth * 0.3, 0.5 + depth * 0.5));
            }
        }

        for s in 0..strands {
            let points: Vec<Vec2> = (0..=96).map(|i| strand_at(s, i as f32 / 96.0 * size.x).0).collect();
            canvas.stroke_polyline(&points, 2.0 + m.mid * 2.0, hsla(ctx.hue_base + s as f32 * 120.0, 0.8, 0.55, 0.6));
        }
    }
}
