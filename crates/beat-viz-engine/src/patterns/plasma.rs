//! Classic sum-of-sines plasma, one sample per 2x2 block.

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use super::ranges::Checks;
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::hsla;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlasmaParams {
    /// Spatial frequency of the sine terms
    pub scale: f32,
    pub speed: f32,
    /// Hue spread of the palette in degrees
    pub hue_range: f32,
}

impl Default for PlasmaParams {
    fn default() -> Self {
        Self {
            scale: 0.02,
            speed: 1.0,
            hue_range: 180.0,
        }
    }
}

impl PlasmaParams {
    pub fn validate(&self) -> Result<()> {
        Checks::new("plasma").finite(&[
            ("scale", self.scale as f64),
            ("speed", self.speed as f64),
            ("hue_range", self.hue_range as f64),
        ])
    }
}

#[derive(Default)]
pub struct Plasma;

/// Plasma field value in [-1, 1].
pub fn plasma_value(x: f32, y: f32, t: f32, scale: f32, cx: f32, cy: f32) -> f32 {
    let a = (x * scale + t).sin();
    let b = (y * scale * 1.3 - t * 0.8).sin();
    let c = ((x + y) * scale * 0.7 + t * 1.2).sin();
    let dx = x - cx;
    let dy = y - cy;
    let d = ((dx * dx + dy * dy).sqrt() * scale * 1.5 - t * 1.5).sin();
    (a + b + c + d) * 0.25
}

impl Generator for Plasma {
    type Params = PlasmaParams;

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &PlasmaParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        let t = ctx.time * params.speed * (1.0 + m.overall);
        let scale = params.scale * (1.0 + m.bass * 0.5);
        let w = canvas.width() as i32;
        let h = canvas.height() as i32;
        let cx = w as f32 * 0.5 + (t * 0.5).sin() * w as f32 * 0.3;
        let cy = h as f32 * 0.5 + (t * 0.4).cos() * h as f32 * 0.3;

        for py in (0..h).step_by(2) {
            for px in (0..w).step_by(2) {
                let v = plasma_value(px as f32, py as f32, t, scale, cx, cy);
                let color = hsla(
                    ctx.hue_base + v * params.hue_range,
                    0.85,
                    0.45 + v * 0.15 + m.treble * 0.1,
                    1.0,
                );
                canvas.blend_block(px, py, 2, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plasma_value_is_bounded() {
        for i in 0..200 {
            let v = plasma_value(i as f32 * 3.1, i as f32 * 1.7, i as f32 * 0.05, 0.02, 50.0, 40.0);
            assert!((-1.0..=1.0).contains(&v));
        }
    }
}
