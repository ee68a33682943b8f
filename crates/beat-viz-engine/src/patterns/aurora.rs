//! Hanging aurora curtains.

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use super::ranges::Checks;
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::hsla;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuroraParams {
    pub curtains: usize,
    pub columns: usize,
    /// Curtain height as a fraction of the surface height, scaled by `1 + mid`
    pub height: f32,
    pub sway: f32,
}

impl Default for AuroraParams {
    fn default() -> Self {
        Self {
            curtains: 4,
            columns: 60,
            height: 0.35,
            sway: 0.4,
        }
    }
}

impl AuroraParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("aurora");
        checks.at_least(&[("curtains", self.curtains as u64), ("columns", self.columns as u64)], 1)?;
        checks.positive(&[("height", self.height as f64)])?;
        checks.finite(&[("sway", self.sway as f64)])
    }
}

#[derive(Default)]
pub struct Aurora;

impl Generator for Aurora {
    type Params = AuroraParams;

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &AuroraParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let columns = params.columns.max(1);
        let column_width = w / columns as f32;
        let curtains = params.curtains.max(1);

        for c in 0..curtains {
            let top_base = h * (0.1 + c as f32 * 0.08);
            let length = h * params.height * (1.0 + m.mid);
            let hue = ctx.hue_base + 100.0 + c as f32 * 35.0;
            let phase = ctx.time * (0.6 + c as f32 * 0.2);

            for i in 0..columns {
                let x = i as f32 * column_width;
                let u = i as f32 / columns as f32;
                let wave = (u * 6.0 + phase).sin() * 0.5 + (u * 13.0 - phase * 1.3).sin() * 0.25;
                let top = top_base + wave * h * params.sway * 0.25;
                let brightness = (0.5 + 0.5 * (u * 20.0 + phase * 2.0).sin()) * (0.4 + m.treble * 0.6);
                let column_len = length * (0.6 + 0.4 * brightness);

                // Three bands: bright hem fading upward into the curtain body
                let bands = [(0.0, 0.15, 0.55), (0.15, 0.5, 0.3), (0.5, 1.0, 0.12)];
                for (start, end, alpha) in bands {
                    canvas.fill_rect(
                        x,
                        top + column_len * start,
                        column_width + 1.0,
                        column_len * (end - start),
                        hsla(hue + start * 60.0, 0.9, 0.55, alpha * brightness),
                    );
                }
            }
        }
    }
}
