//! Warp-speed starfield.
//!
//! Stars sit in a box in front of the viewer and move toward it every frame;
//! perspective divides lateral position by depth. A star that reaches the
//! viewer plane (or leaves the screen) goes back to maximum depth at a new
//! lateral position.

use glam::{Vec2, Vec3};
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
pub struct StarfieldParams {
    /// Surface pixels per star
    pub density: f32,
    pub max_stars: usize,
    pub max_depth: f32,
    pub focal_length: f32,
    pub base_speed: f32,
    pub bass_speed: f32,
    pub overall_speed: f32,
}

impl Default for StarfieldParams {
    fn default() -> Self {
        Self {
            density: 2000.0,
            max_stars: 400,
            max_depth: 1000.0,
            focal_length: 256.0,
            base_speed: 4.0,
            bass_speed: 20.0,
            overall_speed: 10.0,
        }
    }
}

impl StarfieldParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("starfield");
        checks.positive(&[
            ("density", self.density as f64),
            ("max_depth", self.max_depth as f64),
            ("focal_length", self.focal_length as f64),
        ])?;
        checks.finite(&[
            ("base_speed", self.base_speed as f64),
            ("bass_speed", self.bass_speed as f64),
            ("overall_speed", self.overall_speed as f64),
        ])
    }

    pub fn star_count(&self, size: Vec2) -> usize {
        let area = (size.x.max(0.0) * size.y.max(0.0)) as f64;
        ((area / self.density.max(1.0) as f64).floor() as usize).min(self.max_stars)
    }
}

#[derive(Clone, Debug)]
pub struct Star {
    /// Lateral x/y around the view axis plus depth in z
    pub position: Vec3,
    pub size: f32,
}

#[derive(Default)]
pub struct Starfield {
    stars: Vec<Star>,
    bounds: Vec2,
}

impl Starfield {
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    fn project(&self, p: Vec3, focal: f32) -> Vec2 {
        self.bounds * 0.5 + Vec2::new(p.x, p.y) * (focal / p.z.max(1.0))
    }

    fn place(bounds: Vec2, depth: f32, rng: &mut SmallRng) -> Vec3 {
        Vec3::new(
            rng.random_range(-bounds.x..bounds.x.max(-bounds.x + 1.0)),
            rng.random_range(-bounds.y..bounds.y.max(-bounds.y + 1.0)),
            depth,
        )
    }
}

impl Generator for Starfield {
    type Params = StarfieldParams;

    fn reset(&mut self, size: Vec2, params: &StarfieldParams, rng: &mut SmallRng) {
        self.bounds = size;
        let max_depth = params.max_depth.max(2.0);
        self.stars = (0..params.star_count(size))
            .map(|_| {
                let depth = uniform(rng, 1.0, max_depth);
                Star {
                    position: Self::place(size, depth, rng),
                    size: rng.random_range(0.5..2.0),
                }
            })
            .collect();
    }

    fn render(
        &mut self,
        canvas: &mut Canvas,
        ctx: &FrameContext,
        params: &StarfieldParams,
        rng: &mut SmallRng,
    ) {
        let m = ctx.metrics;
        let speed = params.base_speed + m.bass * params.bass_speed + m.overall * params.overall_speed;
        let max_depth = params.max_depth.max(2.0);
        let focal = params.focal_length;

        for i in 0..self.stars.len() {
            let before = self.stars[i].position;
            let mut after = before;
            after.z -= speed;

            let screen = self.project(after, focal);
            let visible = screen.x >= 0.0
                && screen.y >= 0.0
                && screen.x < self.bounds.x
                && screen.y < self.bounds.y;
            if after.z <= 1.0 || !visible {
                self.stars[i].position = Self::place(self.bounds, max_depth, rng);
                continue;
            }
            self.stars[i].position = after;

            let nearness = 1.0 - after.z / max_depth;
            let tail = self.project(before, focal);
            let width = self.stars[i].size * (1.0 + nearness * 2.0);
            let color = hsla(ctx.hue_base + nearness * 60.0, 0.3, 0.5 + nearness * 0.5, nearness);
            canvas.stroke_line(tail, screen, width, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_star_count_follows_area() {
        let params = StarfieldParams::default();
        assert_eq!(params.star_count(Vec2::new(200.0, 100.0)), 10);
        assert_eq!(params.star_count(Vec2::new(1920.0, 1080.0)), 400);
    }

    #[test]
    fn test_stars_approach_and_respawn_far() {
        let params = StarfieldParams::default();
        let mut starfield = Starfield::default();
        let mut rng = SmallRng::seed_from_u64(12);
        let mut canvas = Canvas::new(200, 160).unwrap();
        starfield.reset(canvas.size(), &params, &mut rng);
        let count = starfield.stars().len();

        for _ in 0..400 {
            let before: Vec<f32> = starfield.stars().iter().map(|s| s.position.z).collect();
            starfield.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
            for (star, z) in starfield.stars().iter().zip(before) {
                let moved_closer = (star.position.z - (z - params.base_speed)).abs() < 1e-3;
                let respawned = star.position.z == params.max_depth;
                assert!(moved_closer || respawned);
                assert!(star.position.z > 1.0);
            }
        }
        assert_eq!(starfield.stars().len(), count);
    }
}
