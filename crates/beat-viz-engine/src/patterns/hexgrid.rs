//! Honeycomb grid lit by a travelling wave.

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
pub struct HexgridParams {
    /// Center-to-corner radius of one hexagon
    pub hex_radius: f32,
    pub wave_speed: f32,
    /// Lightness added at full bass
    pub bass_brightness: f32,
}

impl Default for HexgridParams {
    fn default() -> Self {
        Self {
            hex_radius: 28.0,
            wave_speed: 0.05,
            bass_brightness: 0.3,
        }
    }
}

impl HexgridParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("hexgrid");
        checks.positive(&[("hex_radius", self.hex_radius as f64)])?;
        checks.finite(&[
            ("wave_speed", self.wave_speed as f64),
            ("bass_brightness", self.bass_brightness as f64),
        ])
    }
}

#[derive(Default)]
pub struct Hexgrid;

/// Corners of a pointy-top hexagon.
pub fn hex_corners(center: Vec2, radius: f32) -> [Vec2; 6] {
    std::array::from_fn(|k| {
        let a = std::f32::consts::FRAC_PI_3 * k as f32 - std::f32::consts::FRAC_PI_6;
        center + Vec2::new(a.cos(), a.sin()) * radius
    })
}

impl Generator for Hexgrid {
    type Params = HexgridParams;

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &HexgridParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        let r = params.hex_radius.max(4.0);
        let dx = 3f32.sqrt() * r;
        let dy = 1.5 * r;
        let size = canvas.size();
        let center = canvas.center();
        let cols = (size.x / dx).ceil() as i32 + 1;
        let rows = (size.y / dy).ceil() as i32 + 1;
        let wave = ctx.frame as f32 * params.wave_speed;

        for row in 0..rows {
            let shift = if row % 2 == 0 { 0.0 } else { dx * 0.5 };
            for col in 0..cols {
                let c = Vec2::new(col as f32 * dx + shift, row as f32 * dy);
                let dist = c.distance(center) / r;
                let pulse = (dist * 0.5 - wave).sin() * 0.5 + 0.5;
                let lightness = 0.15 + pulse * 0.35 + m.bass * params.bass_brightness;
                let hue = ctx.hue_base + dist * 8.0;

                let corners = hex_corners(c, r * (0.88 + m.treble * 0.1));
                canvas.fill_polygon(&corners, hsla(hue, 0.75, lightness, 0.35 + pulse * 0.5));
                let mut outline = corners.to_vec();
                outline.push(corners[0]);
                canvas.stroke_polyline(&outline, 1.0, hsla(hue + 30.0, 0.9, 0.7, 0.3 + m.mid * 0.4));
            }
        }
    }
}
