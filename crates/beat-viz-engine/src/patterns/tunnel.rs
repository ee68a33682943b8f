//! Polygon tunnel flying toward the viewer.

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
pub struct TunnelParams {
    pub rings: usize,
    pub sides: usize,
    /// Depth advanced per frame, in ring spacings
    pub speed: f32,
    pub speed_intensity_boost: f32,
    /// Rotation of each ring relative to the one in front of it
    pub twist: f32,
}

impl Default for TunnelParams {
    fn default() -> Self {
        Self {
            rings: 18,
            sides: 6,
            speed: 0.01,
            speed_intensity_boost: 0.04,
            twist: 0.2,
        }
    }
}

impl TunnelParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("tunnel");
        checks.at_least(&[("rings", self.rings as u64)], 1)?;
        checks.at_least(&[("sides", self.sides as u64)], 3)?;
        checks.finite(&[
            ("speed", self.speed as f64),
            ("speed_intensity_boost", self.speed_intensity_boost as f64),
            ("twist", self.twist as f64),
        ])
    }
}

#[derive(Default)]
pub struct Tunnel {
    depth: f32,
}

impl Tunnel {
    pub fn depth(&self) -> f32 {
        self.depth
    }
}

impl Generator for Tunnel {
    type Params = TunnelParams;

    fn reset(&mut self, _size: Vec2, _params: &TunnelParams, _rng: &mut SmallRng) {
        self.depth = 0.0;
    }

    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &TunnelParams, _rng: &mut SmallRng) {
        let m = ctx.metrics;
        self.depth = (self.depth + params.speed + m.overall * params.speed_intensity_boost).fract();

        let rings = params.rings.max(1);
        let sides = params.sides.max(3);
        let center = canvas.center()
            + Vec2::new((ctx.time * 0.7).sin(), (ctx.time * 0.5).cos()) * 20.0 * m.mid;
        let max_radius = canvas.size().length() * 0.6;

        // Far rings first so near ones paint over them
        for i in (0..rings).rev() {
            let z = (i as f32 + 1.0 - self.depth) / rings as f32;
            let radius = max_radius * (0.05 / z).min(1.5) * (1.0 + m.bass * 0.2);
            let rotation = i as f32 * params.twist + ctx.time * 0.3;
            let points: Vec<Vec2> = (0..=sides)
                .map(|k| {
                    let a = rotation + k as f32 / sides as f32 * std::f32::consts::TAU;
                    center + Vec2::new(a.cos(), a.sin()) * radius
                })
                .collect();
            let nearness = 1.0 - z;
            let color = hsla(ctx.hue_base + i as f32 * 12.0, 0.85, 0.5, 0.3 + nearness * 0.7);
            canvas.stroke_polyline(&points, 1.0 + nearness * 3.0 + m.treble * 2.0, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_depth_wraps() {
        let params = TunnelParams::default();
        let mut tunnel = Tunnel::default();
        let mut canvas = Canvas::new(32, 24).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..250 {
            tunnel.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
            assert!((0.0..1.0).contains(&tunnel.depth()));
        }
    }
}
