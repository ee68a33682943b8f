//! Voronoi cells around seeds orbiting a wandering center.
//!
//! Nearest-seed lookup per 2x2 block; cell edges are where the nearest and
//! second-nearest seeds are almost equidistant.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ranges::{uniform, Checks};
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::hsla;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoronoiParams {
    pub seed_count: usize,
    /// Orbit radius range as a fraction of the smaller surface dimension
    pub orbit_min: f32,
    pub orbit_max: f32,
    /// Angular speed range in radians per frame
    pub speed_min: f32,
    pub speed_max: f32,
    /// Hue degrees each seed rotates per frame
    pub hue_drift: f32,
    /// How far the common center wanders, as a fraction of the surface
    pub center_wander: f32,
    /// Width in pixels of the highlighted cell border
    pub edge_width: f32,
}

impl Default for VoronoiParams {
    fn default() -> Self {
        Self {
            seed_count: 20,
            orbit_min: 0.1,
            orbit_max: 0.45,
            speed_min: 0.002,
            speed_max: 0.01,
            hue_drift: 0.5,
            center_wander: 0.15,
            edge_width: 3.0,
        }
    }
}

impl VoronoiParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("voronoi");
        checks.range("orbit", self.orbit_min as f64, self.orbit_max as f64, 0.0)?;
        checks.range("speed", self.speed_min as f64, self.speed_max as f64, 0.0)?;
        checks.non_negative(&[("edge_width", self.edge_width as f64)])?;
        checks.finite(&[
            ("hue_drift", self.hue_drift as f64),
            ("center_wander", self.center_wander as f64),
        ])
    }
}

#[derive(Clone, Debug)]
pub struct VoronoiSeed {
    pub position: Vec2,
    pub hue: f32,
    orbit_radius: f32,
    angle: f32,
    angular_velocity: f32,
}

#[derive(Default)]
pub struct Voronoi {
    seeds: Vec<VoronoiSeed>,
}

impl Voronoi {
    pub fn seeds(&self) -> &[VoronoiSeed] {
        &self.seeds
    }
}

impl Generator for Voronoi {
    type Params = VoronoiParams;

    fn reset(&mut self, size: Vec2, params: &VoronoiParams, rng: &mut SmallRng) {
        self.seeds = (0..params.seed_count)
            .map(|i| {
                let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let orbit_radius = uniform(rng, params.orbit_min, params.orbit_max);
                VoronoiSeed {
                    position: size * 0.5
                        + Vec2::new(angle.cos(), angle.sin()) * orbit_radius * size.min_element(),
                    hue: i as f32 / params.seed_count.max(1) as f32 * 360.0,
                    orbit_radius,
                    angle,
                    angular_velocity: uniform(rng, params.speed_min, params.speed_max) * direction,
                }
            })
            .collect();
    }

    fn render(
        &mut self,
        canvas: &mut Canvas,
        ctx: &FrameContext,
        params: &VoronoiParams,
        _rng: &mut SmallRng,
    ) {
        if self.seeds.is_empty() {
            return;
        }
        let m = ctx.metrics;
        let size = canvas.size();
        let min_dim = size.min_element();
        let center = size * 0.5
            + Vec2::new((ctx.time * 0.4).sin(), (ctx.time * 0.3).cos()) * size * params.center_wander;

        for seed in &mut self.seeds {
            seed.angle += seed.angular_velocity * (1.0 + m.mid * 2.0);
            let r = seed.orbit_radius * min_dim * (1.0 + m.bass * 0.2);
            seed.position = center + Vec2::new(seed.angle.cos(), seed.angle.sin()) * r;
            seed.hue = crate::color::wrap_hue(seed.hue + params.hue_drift * (1.0 + m.treble));
        }

        let w = canvas.width() as i32;
        let h = canvas.height() as i32;
        let reach = min_dim * 0.5;

        for py in (0..h).step_by(2) {
            for px in (0..w).step_by(2) {
                let p = Vec2::new(px as f32 + 1.0, py as f32 + 1.0);
                let mut nearest = (f32::INFINITY, 0usize);
                let mut second = f32::INFINITY;
                for (i, seed) in self.seeds.iter().enumerate() {
                    let d = p.distance_squared(seed.position);
                    if d < nearest.0 {
                        second = nearest.0;
                        nearest = (d, i);
                    } else if d < second {
                        second = d;
                    }
                }

                let d1 = nearest.0.sqrt();
                let seed = &self.seeds[nearest.1];
                let falloff = 1.0 - (d1 / reach).min(1.0);
                let mut lightness = 0.2 + falloff * 0.35 + m.bass * 0.1;
                if second.is_finite() && second.sqrt() - d1 < params.edge_width {
                    lightness = 0.75 + m.treble * 0.2;
                }
                let color = hsla(ctx.hue_base + seed.hue, 0.7, lightness, 1.0);
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
    fn test_seed_count_is_fixed() {
        let params = VoronoiParams::default();
        let mut voronoi = Voronoi::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut canvas = Canvas::new(40, 30).unwrap();
        voronoi.reset(canvas.size(), &params, &mut rng);

        let ctx = FrameContext {
            metrics: FrequencyMetrics {
                overall: 1.0,
                bass: 1.0,
                mid: 1.0,
                treble: 1.0,
            },
            ..FrameContext::default()
        };
        for _ in 0..50 {
            voronoi.render(&mut canvas, &ctx, &params, &mut rng);
        }
        assert_eq!(voronoi.seeds().len(), 20);
    }

    #[test]
    fn test_equal_speed_ends_fix_every_seed_speed() {
        let params = VoronoiParams {
            speed_min: 2.0,
            speed_max: 2.0,
            orbit_min: 0.3,
            orbit_max: 0.3,
            ..VoronoiParams::default()
        };
        params.validate().unwrap();
        let mut voronoi = Voronoi::default();
        let mut rng = SmallRng::seed_from_u64(4);
        voronoi.reset(Vec2::new(100.0, 80.0), &params, &mut rng);
        for seed in voronoi.seeds() {
            assert_eq!(seed.angular_velocity.abs(), 2.0);
            assert_eq!(seed.orbit_radius, 0.3);
        }
    }

    #[test]
    fn test_seeds_stay_on_their_orbit() {
        let params = VoronoiParams {
            center_wander: 0.0,
            ..VoronoiParams::default()
        };
        let mut voronoi = Voronoi::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut canvas = Canvas::new(60, 60).unwrap();
        voronoi.reset(canvas.size(), &params, &mut rng);

        let before: Vec<f32> = voronoi
            .seeds()
            .iter()
            .map(|s| s.position.distance(Vec2::splat(30.0)))
            .collect();
        for _ in 0..10 {
            voronoi.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
        }
        for (seed, r) in voronoi.seeds().iter().zip(before) {
            assert!((seed.position.distance(Vec2::splat(30.0)) - r).abs() < 1e-2);
        }
    }
}
