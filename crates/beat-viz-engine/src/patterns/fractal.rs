//! Julia-set escape-time fractal.
//!
//! The constant C drifts around a base value, the view zooms in steadily
//! (faster when loud) and the iteration budget grows with intensity. Computed
//! at half resolution: one sample per 2x2 block.

use glam::Vec2;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use super::ranges::Checks;
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::{hsla, Rgba};
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FractalParams {
    /// Julia constant the drift oscillates around (re, im)
    pub base_constant: [f64; 2],
    /// Amplitude of the slow sine drift of C
    pub drift: f64,
    /// Extra drift of C at full bass (re) and full mid (im)
    pub audio_drift: f64,
    /// Multiplicative zoom growth per frame
    pub zoom_speed: f64,
    /// Additional zoom growth at full overall intensity
    pub zoom_intensity_boost: f64,
    /// Zoom stops growing here
    pub max_zoom: f64,
    pub min_iterations: u32,
    pub max_iterations: u32,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            base_constant: [-0.7, 0.270_15],
            drift: 0.1,
            audio_drift: 0.05,
            zoom_speed: 0.002,
            zoom_intensity_boost: 0.01,
            max_zoom: 50.0,
            min_iterations: 32,
            max_iterations: 96,
        }
    }
}

impl FractalParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("fractal");
        checks.finite(&[
            ("base_constant", self.base_constant[0]),
            ("base_constant", self.base_constant[1]),
            ("drift", self.drift),
            ("audio_drift", self.audio_drift),
        ])?;
        checks.non_negative(&[
            ("zoom_speed", self.zoom_speed),
            ("zoom_intensity_boost", self.zoom_intensity_boost),
        ])?;
        checks.positive(&[("max_zoom", self.max_zoom)])?;
        checks.at_least(&[("min_iterations", self.min_iterations as u64)], 1)?;
        checks.ordered(
            ("min_iterations", self.min_iterations as f64),
            ("max_iterations", self.max_iterations as f64),
        )
    }
}

pub struct Fractal {
    zoom: f64,
    offset: [f64; 2],
    constant: [f64; 2],
}

impl Default for Fractal {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: [0.0, 0.0],
            constant: FractalParams::default().base_constant,
        }
    }
}

impl Fractal {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    pub fn offset(&self) -> [f64; 2] {
        self.offset
    }

    pub fn set_offset(&mut self, offset: [f64; 2]) {
        if offset.iter().all(|v| v.is_finite()) {
            self.offset = offset;
        }
    }

    /// The Julia constant used for the most recent frame.
    pub fn constant(&self) -> [f64; 2] {
        self.constant
    }

    fn iterations(params: &FractalParams, overall: f32) -> u32 {
        let lo = params.min_iterations.max(1);
        let hi = params.max_iterations.max(lo);
        lo + ((hi - lo) as f32 * overall.clamp(0.0, 1.0)) as u32
    }
}

impl Generator for Fractal {
    type Params = FractalParams;

    fn render(
        &mut self,
        canvas: &mut Canvas,
        ctx: &FrameContext,
        params: &FractalParams,
        _rng: &mut SmallRng,
    ) {
        let m = ctx.metrics;
        let t = ctx.time as f64;

        self.constant = [
            params.base_constant[0] + (t * 0.3).sin() * params.drift + m.bass as f64 * params.audio_drift,
            params.base_constant[1] + (t * 0.2).cos() * params.drift + m.mid as f64 * params.audio_drift,
        ];

        // Zoom never decreases; it saturates at max_zoom
        let growth = 1.0 + params.zoom_speed + m.overall as f64 * params.zoom_intensity_boost;
        self.zoom = (self.zoom * growth).min(params.max_zoom.max(self.zoom));

        let max_iter = Self::iterations(params, m.overall);
        let w = canvas.width() as i32;
        let h = canvas.height() as i32;
        let half = Vec2::new(w as f32, h as f32) * 0.5;
        let scale = 3.0 / (self.zoom * w.min(h).max(1) as f64);
        let [cx, cy] = self.constant;

        for py in (0..h).step_by(2) {
            let y0 = (py as f64 - half.y as f64) * scale + self.offset[1];
            for px in (0..w).step_by(2) {
                let mut zx = (px as f64 - half.x as f64) * scale + self.offset[0];
                let mut zy = y0;
                let mut i = 0;
                while i < max_iter && zx * zx + zy * zy <= 4.0 {
                    let next = zx * zx - zy * zy + cx;
                    zy = 2.0 * zx * zy + cy;
                    zx = next;
                    i += 1;
                }

                let color = if i >= max_iter {
                    Rgba::BLACK
                } else {
                    let n = i as f32 / max_iter as f32;
                    hsla(
                        ctx.hue_base + n * 300.0,
                        0.85,
                        0.15 + n.sqrt() * 0.5 + m.treble * 0.1,
                        1.0,
                    )
                };
                canvas.blend_block(px, py, 2, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FrequencyMetrics;
    use rand::SeedableRng;

    #[test]
    fn test_zoom_is_monotonic_and_capped() {
        let mut fractal = Fractal::default();
        let params = FractalParams::default();
        let mut canvas = Canvas::new(16, 12).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ctx = FrameContext::default();

        let mut prev = fractal.zoom();
        for frame in 0..3000 {
            ctx.metrics = FrequencyMetrics {
                overall: (frame % 7) as f32 / 7.0,
                ..FrequencyMetrics::SILENT
            };
            fractal.render(&mut canvas, &ctx, &params, &mut rng);
            assert!(fractal.zoom() >= prev);
            prev = fractal.zoom();
        }
        assert!(fractal.zoom() <= params.max_zoom);
    }

    #[test]
    fn test_iteration_budget_scales_with_intensity() {
        let params = FractalParams::default();
        assert_eq!(Fractal::iterations(&params, 0.0), 32);
        assert_eq!(Fractal::iterations(&params, 1.0), 96);
        assert!(Fractal::iterations(&params, 0.5) > 32);
    }

    #[test]
    fn test_constant_drifts_with_bass() {
        let params = FractalParams::default();
        let mut canvas = Canvas::new(8, 8).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);

        let mut quiet = Fractal::default();
        quiet.render(&mut canvas, &FrameContext::default(), &params, &mut rng);

        let mut loud = Fractal::default();
        let ctx = FrameContext {
            metrics: FrequencyMetrics {
                bass: 1.0,
                ..FrequencyMetrics::SILENT
            },
            ..FrameContext::default()
        };
        loud.render(&mut canvas, &ctx, &params, &mut rng);
        assert!(loud.constant()[0] > quiet.constant()[0]);
    }
}
