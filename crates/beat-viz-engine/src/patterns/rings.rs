//! Concentric rings pulsing outward with the bass.

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use super::ranges::Checks;
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::hsla;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingsParams {
    pub ring_count: usize,
    /// Outward drift per unit of frame time, in ring spacings
    pub expand_speed: f32,
    /// Radius swell at full bass, as a fraction of the spacing
    pub bass_pulse: f32,
}

impl Default for RingsParams {
    fn default() -> Self {
        Self {
            ring_count: 12,
            expand_speed: 0.5,
            bass_pulse: 0.6,
        }
    }
}

impl RingsParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("rings");
        checks.at_least(&[("ring_count", self.ring_count as u64)], 1)?;
        checks.finite(&[
            ("expand_speed", self.expand_speed as f64),
            ("bass_pulse", self.bass_pulse as f64),
        ])
    }
}

#[derive(Default)]
pub struct Rings;

impl Generator for Rings {
    type Params = RingsParams;

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &RingsParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        let center = canvas.center();
        let count = params.ring_count.max(1);
        let spacing = center.min_element() / count as f32;
        let drift = (ctx.time * params.expand_speed).fract();

        for i in 0..count {
            let k = i as f32 + drift;
            let radius = spacing * (k + m.bass * params.bass_pulse);
            let fade = 1.0 - k / count as f32;
            // Each ring wobbles with its own band
            let band = match i % 3 {
                0 => m.bass,
                1 => m.mid,
                _ => m.treble,
            };
            let width = 1.5 + band * spacing * 0.4;
            let color = hsla(ctx.hue_base + i as f32 * 25.0, 0.85, 0.5 + band * 0.2, 0.3 + fade * 0.6);
            canvas.stroke_circle(center, radius, width, color);
        }
    }
}
