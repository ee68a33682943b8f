//! Jagged lightning bolts.
//!
//! A bolt is a polyline grown from the top edge downward in random steps with
//! lateral jitter. It lives for a few dozen frames; forks hang off it for the
//! first `branch_frames` only. A floor of `min_bolts` is always on screen and
//! bass peaks add more up to `max_bolts`.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ranges::{uniform, uniform_int, Checks};
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::hsla;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightningParams {
    pub min_bolts: usize,
    pub max_bolts: usize,
    pub bass_threshold: f32,
    pub spawn_chance: f64,
    pub step_min: f32,
    pub step_max: f32,
    /// Lateral jitter in pixels per step, scaled by `1 + treble * 2`
    pub jitter: f32,
    pub life_min: u32,
    pub life_max: u32,
    /// Forks are only drawn while a bolt is younger than this
    pub branch_frames: u32,
    pub branches_per_bolt: usize,
}

impl Default for LightningParams {
    fn default() -> Self {
        Self {
            min_bolts: 2,
            max_bolts: 8,
            bass_threshold: 0.6,
            spawn_chance: 0.3,
            step_min: 10.0,
            step_max: 25.0,
            jitter: 15.0,
            life_min: 12,
            life_max: 24,
            branch_frames: 5,
            branches_per_bolt: 3,
        }
    }
}

impl LightningParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("lightning");
        checks.ordered(
            ("min_bolts", self.min_bolts as f64),
            ("max_bolts", self.max_bolts as f64),
        )?;
        checks.range("step", self.step_min as f64, self.step_max as f64, 1.0)?;
        checks.range("life", self.life_min as f64, self.life_max as f64, 1.0)?;
        checks.probability(&[("spawn_chance", self.spawn_chance)])?;
        checks.finite(&[
            ("bass_threshold", self.bass_threshold as f64),
            ("jitter", self.jitter as f64),
        ])
    }
}

#[derive(Clone, Debug)]
pub struct LightningBolt {
    pub points: Vec<Vec2>,
    pub branches: Vec<Vec<Vec2>>,
    pub life: u32,
    pub max_life: u32,
    pub hue: f32,
}

impl LightningBolt {
    pub fn branches_visible(&self, params: &LightningParams) -> bool {
        self.life < params.branch_frames
    }

    fn is_expired(&self) -> bool {
        self.life >= self.max_life
    }
}

#[derive(Default)]
pub struct Lightning {
    bolts: Vec<LightningBolt>,
    bounds: Vec2,
    branches_drawn: usize,
}

impl Lightning {
    pub fn bolts(&self) -> &[LightningBolt] {
        &self.bolts
    }

    /// Number of fork polylines drawn by the last frame.
    pub fn branches_drawn(&self) -> usize {
        self.branches_drawn
    }

    fn spawn(&mut self, treble: f32, params: &LightningParams, rng: &mut SmallRng) {
        let jitter = params.jitter * (1.0 + treble * 2.0);
        let step_lo = params.step_min.max(1.0);
        let step_hi = params.step_max.max(step_lo);

        let mut points = Vec::new();
        let mut p = Vec2::new(
            rng.random_range(self.bounds.x * 0.1..self.bounds.x * 0.9 + 0.1),
            0.0,
        );
        points.push(p);
        while p.y < self.bounds.y {
            p.y += uniform(rng, step_lo, step_hi);
            p.x += rng.random_range(-1.0..1.0) * jitter;
            points.push(p);
        }

        let mut branches = Vec::with_capacity(params.branches_per_bolt);
        for _ in 0..params.branches_per_bolt {
            let start = points[rng.random_range(0..points.len())];
            let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            let mut q = start;
            let mut branch = vec![q];
            for _ in 0..rng.random_range(3..7) {
                q.y += uniform(rng, step_lo, step_hi) * 0.6;
                q.x += direction * rng.random_range(0.3..1.0) * jitter;
                branch.push(q);
            }
            branches.push(branch);
        }

        self.bolts.push(LightningBolt {
            points,
            branches,
            life: 0,
            max_life: uniform_int(rng, params.life_min.max(1), params.life_max),
            hue: rng.random_range(180.0..280.0),
        });
    }

    fn update(&mut self, ctx: &FrameContext, params: &LightningParams, rng: &mut SmallRng) {
        let m = ctx.metrics;
        for bolt in &mut self.bolts {
            bolt.life += 1;
        }
        self.bolts.retain(|b| !b.is_expired());

        let cap = params.max_bolts.max(params.min_bolts);
        while self.bolts.len() < params.min_bolts {
            self.spawn(m.treble, params, rng);
        }
        if m.bass > params.bass_threshold
            && self.bolts.len() < cap
            && rng.random_bool(params.spawn_chance.clamp(0.0, 1.0))
        {
            self.spawn(m.treble, params, rng);
        }
    }
}

impl Generator for Lightning {
    type Params = LightningParams;

    fn reset(&mut self, size: Vec2, params: &LightningParams, rng: &mut SmallRng) {
        self.bounds = size;
        self.bolts.clear();
        self.branches_drawn = 0;
        for _ in 0..params.min_bolts {
            self.spawn(0.0, params, rng);
        }
    }

    fn render(
        &mut self,
        canvas: &mut Canvas,
        ctx: &FrameContext,
        params: &LightningParams,
        rng: &mut SmallRng,
    ) {
        self.update(ctx, params, rng);

        let m = ctx.metrics;
        self.branches_drawn = 0;
        for bolt in &self.bolts {
            let fade = 1.0 - bolt.life as f32 / bolt.max_life.max(1) as f32;
            let hue = ctx.hue_base * 0.2 + bolt.hue;
            let glow = hsla(hue, 0.9, 0.6, 0.25 * fade);
            let core = hsla(hue, 0.3, 0.95, fade);

            canvas.stroke_polyline(&bolt.points, 8.0 + m.bass * 6.0, glow);
            canvas.stroke_polyline(&bolt.points, 2.0, core);

            if bolt.branches_visible(params) {
                for branch in &bolt.branches {
                    canvas.stroke_polyline(branch, 4.0, glow);
                    canvas.stroke_polyline(branch, 1.0, core);
                    self.branches_drawn += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FrequencyMetrics;
    use rand::SeedableRng;

    fn storm() -> FrameContext {
        FrameContext {
            metrics: FrequencyMetrics {
                overall: 0.5,
                bass: 1.0,
                mid: 0.2,
                treble: 0.4,
            },
            ..FrameContext::default()
        }
    }

    #[test]
    fn test_bolt_reaches_bottom_edge() {
        let params = LightningParams::default();
        let mut lightning = Lightning::default();
        let mut rng = SmallRng::seed_from_u64(3);
        lightning.reset(Vec2::new(120.0, 200.0), &params, &mut rng);

        for bolt in lightning.bolts() {
            assert_eq!(bolt.points[0].y, 0.0);
            assert!(bolt.points.last().unwrap().y >= 200.0);
            assert!(bolt.points.windows(2).all(|w| w[1].y > w[0].y));
        }
    }

    #[test]
    fn test_bolt_count_never_below_floor() {
        let params = LightningParams::default();
        let mut lightning = Lightning::default();
        let mut rng = SmallRng::seed_from_u64(17);
        let mut canvas = Canvas::new(80, 60).unwrap();
        lightning.reset(canvas.size(), &params, &mut rng);

        for frame in 0..300 {
            let ctx = if frame % 3 == 0 { FrameContext::default() } else { storm() };
            lightning.render(&mut canvas, &ctx, &params, &mut rng);
            let live = lightning.bolts().len();
            assert!(live >= params.min_bolts, "only {live} bolts at frame {frame}");
            assert!(live <= params.max_bolts);
        }
    }

    #[test]
    fn test_branches_only_drawn_while_young() {
        let params = LightningParams::default();
        let mut lightning = Lightning::default();
        let mut rng = SmallRng::seed_from_u64(23);
        let mut canvas = Canvas::new(80, 60).unwrap();
        lightning.reset(canvas.size(), &params, &mut rng);

        let mut saw_branches = false;
        for _ in 0..120 {
            lightning.render(&mut canvas, &storm(), &params, &mut rng);
            let expected: usize = lightning
                .bolts()
                .iter()
                .filter(|b| b.life < params.branch_frames)
                .map(|b| b.branches.len())
                .sum();
            assert_eq!(lightning.branches_drawn(), expected);
            saw_branches |= expected > 0;
        }
        assert!(saw_branches);
    }

    #[test]
    fn test_bolts_expire() {
        let params = LightningParams::default();
        let mut lightning = Lightning::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut canvas = Canvas::new(40, 40).unwrap();
        lightning.reset(canvas.size(), &params, &mut rng);
        for _ in 0..200 {
            lightning.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
            assert!(lightning.bolts().iter().all(|b| b.life < b.max_life));
        }
    }
}
