//! Rotating layered petals with radial symmetry.

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
pub struct MandalaParams {
    pub petals: usize,
    pub layers: usize,
    /// Petal length as a fraction of the smaller half-dimension
    pub petal_length: f32,
    /// Extra petal length at full mid
    pub mid_growth: f32,
    pub rotation_speed: f32,
}

impl Default for MandalaParams {
    fn default() -> Self {
        Self {
            petals: 12,
            layers: 4,
            petal_length: 0.35,
            mid_growth: 0.5,
            rotation_speed: 0.004,
        }
    }
}

impl MandalaParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("mandala");
        checks.at_least(&[("petals", self.petals as u64), ("layers", self.layers as u64)], 1)?;
        checks.finite(&[
            ("petal_length", self.petal_length as f64),
            ("mid_growth", self.mid_growth as f64),
            ("rotation_speed", self.rotation_speed as f64),
        ])
    }
}

#[derive(Default)]
pub struct Mandala {
    rotation: f32,
}

impl Generator for Mandala {
    type Params = MandalaParams;

    fn reset(&mut self, _size: Vec2, _params: &MandalaParams, _rng: &mut SmallRng) {
        self.rotation = 0.0;
    }

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &MandalaParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        self.rotation = (self.rotation + params.rotation_speed * (1.0 + m.overall * 2.0)) % std::f32::consts::TAU;

        let center = canvas.center();
        let unit = center.min_element();
        let petals = params.petals.max(1);
        let layers = params.layers.max(1);

        for layer in (0..layers).rev() {
            let scale = (layer + 1) as f32 / layers as f32;
            let length = unit * params.petal_length * scale * (1.0 + m.mid * params.mid_growth);
            let width = length * 0.3;
            // Odd layers counter-rotate
            let spin = if layer % 2 == 0 { self.rotation } else { -self.rotation };
            let offset = spin + layer as f32 * std::f32::consts::PI / petals as f32;

            for k in 0..petals {
                let a = offset + k as f32 / petals as f32 * std::f32::consts::TAU;
                let dir = Vec2::new(a.cos(), a.sin());
                let side = dir.perp() * width;
                let tip = center + dir * length;
                let mid = center + dir * length * 0.5;
                let shape = [center, mid + side, tip, mid - side];
                let hue = ctx.hue_base + layer as f32 * 45.0 + k as f32 * 3.0;
                canvas.fill_polygon(&shape, hsla(hue, 0.8, 0.3 + scale * 0.3, 0.5));
                canvas.stroke_polyline(&[center, mid + side, tip, mid - side, center], 1.0, hsla(hue, 0.9, 0.75, 0.7));
            }
        }
        canvas.fill_circle(center, unit * 0.05 * (1.0 + m.bass), hsla(ctx.hue_base + 180.0, 0.9, 0.7, 1.0));
    }
}
