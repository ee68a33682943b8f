//! Lissajous figures cycling through frequency ratios.

use glam::Vec2;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use super::ranges::Checks;
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::hsla;
use crate::error::{EngineError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LissajousParams {
    /// (a, b) frequency pairs visited in order
    pub ratios: Vec<[f32; 2]>,
    pub points: usize,
    /// Phase delta added per frame
    pub phase_speed: f32,
    /// Frames each ratio is shown
    pub ratio_frames: u64,
}

impl Default for LissajousParams {
    fn default() -> Self {
        Self {
            ratios: vec![[3.0, 2.0], [5.0, 4.0], [7.0, 6.0], [4.0, 3.0]],
            points: 600,
            phase_speed: 0.01,
            ratio_frames: 150,
        }
    }
}

impl LissajousParams {
    /// An empty `ratios` list is rejected.
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("lissajous");
        if self.ratios.is_empty() {
            return Err(EngineError::config("patterns.lissajous.ratios must not be empty"));
        }
        for [a, b] in &self.ratios {
            checks.finite(&[("ratios", *a as f64), ("ratios", *b as f64)])?;
        }
        checks.at_least(&[("points", self.points as u64)], 2)?;
        checks.at_least(&[("ratio_frames", self.ratio_frames)], 1)?;
        checks.finite(&[("phase_speed", self.phase_speed as f64)])
    }
}

#[derive(Default)]
pub struct Lissajous {
    phase: f32,
}

impl Lissajous {
    pub fn ratio(params: &LissajousParams, frame: u64) -> [f32; 2] {
        if params.ratios.is_empty() {
            return [1.0, 1.0];
        }
        let slot = (frame / params.ratio_frames.max(1)) as usize % params.ratios.len();
        params.ratios[slot]
    }
}

impl Generator for Lissajous {
    type Params = LissajousParams;

    fn reset(&mut self, _size: Vec2, _params: &LissajousParams, _rng: &mut SmallRng) {
        self.phase = 0.0;
    }

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &LissajousParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        self.phase = (self.phase + params.phase_speed * (1.0 + m.mid)) % std::f32::consts::TAU;

        let [a, b] = Self::ratio(params, ctx.frame);
        let center = canvas.center();
        let extent = center * 0.8 * (0.7 + m.bass * 0.3);
        let n = params.points.max(2);

        let curve: Vec<Vec2> = (0..=n)
            .map(|i| {
                let t = i as f32 / n as f32 * std::f32::consts::TAU;
                center + Vec2::new((a * t + self.phase).sin(), (b * t).sin()) * extent
            })
            .collect();

        canvas.stroke_polyline(&curve, 6.0 + m.bass * 6.0, hsla(ctx.hue_base, 0.9, 0.5, 0.15));
        canvas.stroke_polyline(&curve, 1.5 + m.treble * 2.0, hsla(ctx.hue_base + 30.0, 0.9, 0.7, 0.9));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios_cycle() {
        let params = LissajousParams::default();
        assert_eq!(Lissajous::ratio(&params, 0), [3.0, 2.0]);
        assert_eq!(Lissajous::ratio(&params, 150), [5.0, 4.0]);
        assert_eq!(Lissajous::ratio(&params, 600), [3.0, 2.0]);

        let empty = LissajousParams {
            ratios: Vec::new(),
            ..LissajousParams::default()
        };
        assert_eq!(Lissajous::ratio(&empty, 10), [1.0, 1.0]);
    }
}
