//! Drifting stars joined to their nearest neighbours.
//!
//! Links are computed once when the pool is built; stars then drift freely
//! but keep the same connectivity until the next reset.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ranges::Checks;
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::hsla;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstellationParams {
    /// Surface pixels per star
    pub density: f32,
    pub max_stars: usize,
    pub min_stars: usize,
    pub neighbours: usize,
    /// Maximum drift speed in pixels per frame
    pub drift: f32,
}

impl Default for ConstellationParams {
    fn default() -> Self {
        Self {
            density: 10_000.0,
            max_stars: 80,
            min_stars: 4,
            neighbours: 3,
            drift: 0.3,
        }
    }
}

impl ConstellationParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("constellation");
        checks.positive(&[("density", self.density as f64)])?;
        checks.non_negative(&[("drift", self.drift as f64)])?;
        checks.ordered(
            ("min_stars", self.min_stars as f64),
            ("max_stars", self.max_stars as f64),
        )
    }

    pub fn star_count(&self, size: Vec2) -> usize {
        let area = (size.x.max(0.0) * size.y.max(0.0)) as f64;
        let by_area = (area / self.density.max(1.0) as f64).floor() as usize;
        by_area.min(self.max_stars).max(self.min_stars)
    }
}

#[derive(Clone, Debug)]
pub struct ConstellationStar {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    /// Indices of the nearest stars at reset time
    pub links: Vec<usize>,
}

#[derive(Default)]
pub struct Constellation {
    stars: Vec<ConstellationStar>,
    bounds: Vec2,
}

impl Constellation {
    pub fn stars(&self) -> &[ConstellationStar] {
        &self.stars
    }
}

/// Indices of the `k` points closest to `points[index]`, nearest first.
pub fn nearest_neighbours(points: &[Vec2], index: usize, k: usize) -> Vec<usize> {
    let origin = points[index];
    let mut others: Vec<(f32, usize)> = points
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(i, p)| (p.distance_squared(origin), i))
        .collect();
    others.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    others.into_iter().take(k).map(|(_, i)| i).collect()
}

impl Generator for Constellation {
    type Params = ConstellationParams;

    fn reset(&mut self, size: Vec2, params: &ConstellationParams, rng: &mut SmallRng) {
        self.bounds = size;
        let count = params.star_count(size);
        let drift = params.drift.max(0.0);

        let positions: Vec<Vec2> = (0..count)
            .map(|_| {
                Vec2::new(
                    rng.random_range(0.0..size.x.max(1.0)),
                    rng.random_range(0.0..size.y.max(1.0)),
                )
            })
            .collect();

        self.stars = positions
            .iter()
            .enumerate()
            .map(|(i, &position)| ConstellationStar {
                position,
                velocity: Vec2::new(
                    rng.random_range(-1.0..=1.0) * drift,
                    rng.random_range(-1.0..=1.0) * drift,
                ),
                size: rng.random_range(1.0..2.5),
                links: nearest_neighbours(&positions, i, params.neighbours),
            })
            .collect();
    }

    fn render(
        &mut self,
        canvas: &mut Canvas,
        ctx: &FrameContext,
        _params: &ConstellationParams,
        _rng: &mut SmallRng,
    ) {
        let m = ctx.metrics;
        for star in &mut self.stars {
            star.position += star.velocity * (1.0 + m.overall);
            if star.position.x < 0.0 || star.position.x > self.bounds.x {
                star.velocity.x = -star.velocity.x;
                star.position.x = star.position.x.clamp(0.0, self.bounds.x);
            }
            if star.position.y < 0.0 || star.position.y > self.bounds.y {
                star.velocity.y = -star.velocity.y;
                star.position.y = star.position.y.clamp(0.0, self.bounds.y);
            }
        }

        let reach = self.bounds.length() * 0.25;
        for (i, star) in self.stars.iter().enumerate() {
            for &j in &star.links {
                // Each mutual link is drawn once
                if j < i && self.stars[j].links.contains(&i) {
                    continue;
                }
                let other = self.stars[j].position;
                let closeness = 1.0 - (star.position.distance(other) / reach).min(1.0);
                let color = hsla(ctx.hue_base + 200.0, 0.6, 0.6, 0.15 + closeness * 0.4 + m.mid * 0.2);
                canvas.stroke_line(star.position, other, 1.0, color);
            }
        }
        for star in &self.stars {
            let r = star.size * (1.0 + m.bass);
            canvas.fill_circle(star.position, r * 3.0, hsla(ctx.hue_base + 220.0, 0.8, 0.7, 0.1));
            canvas.fill_circle(star.position, r, hsla(ctx.hue_base + 220.0, 0.2, 0.95, 1.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FrequencyMetrics;
    use rand::SeedableRng;

    #[test]
    fn test_star_count_has_floor_and_cap() {
        let params = ConstellationParams::default();
        assert_eq!(params.star_count(Vec2::new(50.0, 50.0)), 4);
        assert_eq!(params.star_count(Vec2::new(400.0, 300.0)), 12);
        assert_eq!(params.star_count(Vec2::new(3840.0, 2160.0)), 80);
    }

    #[test]
    fn test_nearest_neighbours() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(100.0, 0.0),
        ];
        assert_eq!(nearest_neighbours(&points, 0, 3), vec![1, 3, 2]);
        assert_eq!(nearest_neighbours(&points, 4, 1), vec![2]);
    }

    #[test]
    fn test_links_fixed_while_stars_drift() {
        let params = ConstellationParams::default();
        let mut constellation = Constellation::default();
        let mut rng = SmallRng::seed_from_u64(21);
        let mut canvas = Canvas::new(200, 200).unwrap();
        constellation.reset(canvas.size(), &params, &mut rng);

        let links: Vec<Vec<usize>> = constellation.stars().iter().map(|s| s.links.clone()).collect();
        let start: Vec<Vec2> = constellation.stars().iter().map(|s| s.position).collect();
        assert!(links.iter().all(|l| l.len() == 3));

        let ctx = FrameContext {
            metrics: FrequencyMetrics {
                overall: 1.0,
                ..FrequencyMetrics::SILENT
            },
            ..FrameContext::default()
        };
        for _ in 0..100 {
            constellation.render(&mut canvas, &ctx, &params, &mut rng);
        }

        let after: Vec<Vec<usize>> = constellation.stars().iter().map(|s| s.links.clone()).collect();
        assert_eq!(links, after);
        let moved = constellation
            .stars()
            .iter()
            .zip(&start)
            .any(|(s, p)| s.position.distance(*p) > 0.5);
        assert!(moved);
        for s in constellation.stars() {
            assert!((0.0..=200.0).contains(&s.position.x));
            assert!((0.0..=200.0).contains(&s.position.y));
        }
    }
}
