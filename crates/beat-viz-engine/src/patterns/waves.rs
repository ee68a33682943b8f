//! Layered sine waves, one band per frequency range.

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
pub struct WavesParams {
    pub wave_count: usize,
    pub base_amplitude: f32,
    /// Amplitude added at full intensity of the wave's band
    pub amplitude_boost: f32,
    pub frequency_min: f32,
    pub frequency_max: f32,
    /// Horizontal sample spacing in pixels
    pub resolution: f32,
}

impl Default for WavesParams {
    fn default() -> Self {
        Self {
            wave_count: 5,
            base_amplitude: 20.0,
            amplitude_boost: 80.0,
            frequency_min: 0.005,
            frequency_max: 0.02,
            resolution: 4.0,
        }
    }
}

impl WavesParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("waves");
        checks.at_least(&[("wave_count", self.wave_count as u64)], 1)?;
        checks.positive(&[("resolution", self.resolution as f64)])?;
        checks.range("frequency", self.frequency_min as f64, self.frequency_max as f64, 0.0)?;
        checks.finite(&[
            ("base_amplitude", self.base_amplitude as f64),
            ("amplitude_boost", self.amplitude_boost as f64),
        ])
    }
}

#[derive(Default)]
pub struct Waves;

impl Generator for Waves {
    type Params = WavesParams;

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &WavesParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        let bands = [m.bass, m.mid, m.treble];
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let n = params.wave_count.max(1);
        let step = params.resolution.max(1.0);

        for i in 0..n {
            let t = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.5 };
            let band = bands[i % bands.len()];
            let amplitude = params.base_amplitude + band * params.amplitude_boost;
            let frequency = params.frequency_min + (params.frequency_max - params.frequency_min) * t;
            let baseline = h * (i as f32 + 1.0) / (n as f32 + 1.0);
            let phase = ctx.time * (1.0 + i as f32 * 0.4);

            let mut points = Vec::with_capacity((w / step) as usize + 2);
            let mut x = 0.0;
            while x <= w + step {
                let y = baseline
                    + (x * frequency + phase).sin() * amplitude
                    + (x * frequency * 2.3 - phase * 0.7).sin() * amplitude * 0.25;
                points.push(Vec2::new(x, y));
                x += step;
            }
            let color = hsla(ctx.hue_base + i as f32 * 40.0, 0.85, 0.55, 0.7);
            canvas.stroke_polyline(&points, 2.0 + band * 4.0, color);
        }
    }
}
