//! Rising soap bubbles.
//!
//! Bubbles spawn at the bottom edge (ambiently, and in bursts on bass peaks),
//! rise under buoyancy with Brownian sideways jitter and drag, then pop. A
//! pop lasts `pop_frames` frames; the bubble leaves the pool once its pop
//! animation has finished. The pool grows and shrinks freely.

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
pub struct BubblesParams {
    /// Chance per frame of one bubble regardless of audio
    pub ambient_spawn_chance: f64,
    pub bass_threshold: f32,
    /// Chance per frame of a burst while bass is above the threshold
    pub bass_spawn_chance: f64,
    pub burst_min: usize,
    pub burst_max: usize,
    /// Upward acceleration in pixels per frame squared
    pub buoyancy: f32,
    /// Velocity multiplier per frame
    pub drag: f32,
    /// Amplitude of the random sideways kick per frame
    pub jitter: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub max_age_min: u32,
    pub max_age_max: u32,
    pub pop_frames: u32,
    pub treble_pop_threshold: f32,
    pub treble_pop_chance: f64,
}

impl Default for BubblesParams {
    fn default() -> Self {
        Self {
            ambient_spawn_chance: 0.03,
            bass_threshold: 0.5,
            bass_spawn_chance: 0.35,
            burst_min: 1,
            burst_max: 3,
            buoyancy: 0.05,
            drag: 0.99,
            jitter: 0.3,
            radius_min: 8.0,
            radius_max: 30.0,
            max_age_min: 240,
            max_age_max: 480,
            pop_frames: 12,
            treble_pop_threshold: 0.6,
            treble_pop_chance: 0.002,
        }
    }
}

impl BubblesParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("bubbles");
        checks.range("radius", self.radius_min as f64, self.radius_max as f64, 0.0)?;
        checks.range("max_age", self.max_age_min as f64, self.max_age_max as f64, 0.0)?;
        checks.range("burst", self.burst_min as f64, self.burst_max as f64, 0.0)?;
        checks.probability(&[
            ("ambient_spawn_chance", self.ambient_spawn_chance),
            ("bass_spawn_chance", self.bass_spawn_chance),
            ("treble_pop_chance", self.treble_pop_chance),
        ])?;
        checks.at_least(&[("pop_frames", self.pop_frames as u64)], 1)?;
        checks.finite(&[
            ("bass_threshold", self.bass_threshold as f64),
            ("buoyancy", self.buoyancy as f64),
            ("drag", self.drag as f64),
            ("jitter", self.jitter as f64),
            ("treble_pop_threshold", self.treble_pop_threshold as f64),
        ])
    }
}

#[derive(Clone, Debug)]
pub struct Bubble {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub hue: f32,
    pub age: u32,
    pub max_age: u32,
    pub popping: bool,
    /// Pop animation progress in 0.0-1.0; stays 0 until `popping`
    pub pop_progress: f32,
}

impl Bubble {
    fn is_off_screen(&self, bounds: Vec2) -> bool {
        self.position.y + self.radius < 0.0
            || self.position.x + self.radius < 0.0
            || self.position.x - self.radius > bounds.x
    }
}

#[derive(Default)]
pub struct Bubbles {
    bubbles: Vec<Bubble>,
    bounds: Vec2,
}

impl Bubbles {
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Appends one bubble just below the bottom edge.
    pub fn spawn(&mut self, params: &BubblesParams, rng: &mut SmallRng) {
        let radius = uniform(rng, params.radius_min, params.radius_max);
        self.bubbles.push(Bubble {
            position: Vec2::new(rng.random_range(0.0..self.bounds.x.max(1.0)), self.bounds.y + radius),
            velocity: Vec2::new(rng.random_range(-0.5..0.5), -rng.random_range(0.5..1.5)),
            radius,
            hue: rng.random_range(0.0..360.0),
            age: 0,
            max_age: uniform_int(rng, params.max_age_min, params.max_age_max),
            popping: false,
            pop_progress: 0.0,
        });
    }

    fn update(&mut self, ctx: &FrameContext, params: &BubblesParams, rng: &mut SmallRng) {
        let m = ctx.metrics;
        let pop_step = 1.0 / params.pop_frames.max(1) as f32;
        let treble_pops = m.treble > params.treble_pop_threshold;

        for bubble in &mut self.bubbles {
            if bubble.popping {
                bubble.pop_progress = (bubble.pop_progress + pop_step).min(1.0);
                // Absorb float drift so exactly `pop_frames` steps finish the pop
                if 1.0 - bubble.pop_progress < 1e-4 {
                    bubble.pop_progress = 1.0;
                }
                continue;
            }
            bubble.age += 1;
            bubble.velocity.y -= params.buoyancy;
            bubble.velocity.x += rng.random_range(-1.0..1.0) * params.jitter;
            bubble.velocity *= params.drag;
            bubble.position += bubble.velocity;

            let random_pop = treble_pops && rng.random_bool(params.treble_pop_chance.clamp(0.0, 1.0));
            if bubble.age > bubble.max_age || bubble.is_off_screen(self.bounds) || random_pop {
                bubble.popping = true;
            }
        }

        if rng.random_bool(params.ambient_spawn_chance.clamp(0.0, 1.0)) {
            self.spawn(params, rng);
        }
        if m.bass > params.bass_threshold && rng.random_bool(params.bass_spawn_chance.clamp(0.0, 1.0)) {
            let count = uniform_int(rng, params.burst_min, params.burst_max);
            for _ in 0..count {
                self.spawn(params, rng);
            }
        }
    }

    fn draw(&self, canvas: &mut Canvas, ctx: &FrameContext) {
        let m = ctx.metrics;
        for b in &self.bubbles {
            let hue = ctx.hue_base + b.hue;
            if b.popping {
                let radius = b.radius * (1.0 + b.pop_progress * 0.8);
                let alpha = (1.0 - b.pop_progress) * 0.8;
                canvas.stroke_circle(b.position, radius, 2.0, hsla(hue, 0.7, 0.8, alpha));
                continue;
            }

            let r = b.radius * (1.0 + m.bass * 0.15);
            canvas.fill_circle(b.position, r * 1.4, hsla(hue, 0.8, 0.6, 0.08 + m.mid * 0.1));
            canvas.fill_radial_gradient(
                b.position,
                r,
                &[
                    (0.0, hsla(hue, 0.6, 0.5, 0.05)),
                    (0.7, hsla(hue + 30.0, 0.7, 0.6, 0.2)),
                    (1.0, hsla(hue + 60.0, 0.9, 0.75, 0.6)),
                ],
            );
            let highlight = b.position + Vec2::new(-r * 0.35, -r * 0.35);
            canvas.fill_circle(highlight, r * 0.22, hsla(0.0, 0.0, 1.0, 0.7));
        }
    }
}

impl Generator for Bubbles {
    type Params = BubblesParams;

    fn reset(&mut self, size: Vec2, _params: &BubblesParams, _rng: &mut SmallRng) {
        self.bounds = size;
        self.bubbles.clear();
    }

    fn render(
        &mut self,
        canvas: &mut Canvas,
        ctx: &FrameContext,
        params: &BubblesParams,
        rng: &mut SmallRng,
    ) {
        self.update(ctx, params, rng);
        self.draw(canvas, ctx);
        self.bubbles.retain(|b| !(b.popping && b.pop_progress >= 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FrequencyMetrics;
    use rand::SeedableRng;

    fn bass_ctx() -> FrameContext {
        FrameContext {
            metrics: FrequencyMetrics {
                overall: 0.3,
                bass: 1.0,
                mid: 0.0,
                treble: 0.0,
            },
            ..FrameContext::default()
        }
    }

    #[test]
    fn test_new_bubble_starts_fresh() {
        let params = BubblesParams::default();
        let mut bubbles = Bubbles::default();
        let mut rng = SmallRng::seed_from_u64(1);
        bubbles.reset(Vec2::new(200.0, 150.0), &params, &mut rng);
        bubbles.spawn(&params, &mut rng);

        let b = &bubbles.bubbles()[0];
        assert_eq!(b.age, 0);
        assert!(!b.popping);
        assert_eq!(b.pop_progress, 0.0);
        assert!(b.position.y > 150.0);
        assert!((params.radius_min..params.radius_max).contains(&b.radius));
    }

    #[test]
    fn test_pop_progress_only_advances_while_popping() {
        let params = BubblesParams {
            max_age_min: 5,
            max_age_max: 10,
            ..BubblesParams::default()
        };
        let mut bubbles = Bubbles::default();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut canvas = Canvas::new(120, 400).unwrap();
        bubbles.reset(canvas.size(), &params, &mut rng);
        for _ in 0..5 {
            bubbles.spawn(&params, &mut rng);
        }

        for _ in 0..60 {
            bubbles.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
            for b in bubbles.bubbles() {
                if !b.popping {
                    assert_eq!(b.pop_progress, 0.0);
                }
                assert!(b.pop_progress < 1.0, "finished pop left in the pool");
            }
        }
    }

    #[test]
    fn test_popped_bubble_is_removed_after_animation() {
        let params = BubblesParams {
            ambient_spawn_chance: 0.0,
            ..BubblesParams::default()
        };
        let mut bubbles = Bubbles::default();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut canvas = Canvas::new(100, 100).unwrap();
        bubbles.reset(canvas.size(), &params, &mut rng);
        bubbles.spawn(&params, &mut rng);
        bubbles.bubbles[0].popping = true;

        for _ in 0..params.pop_frames - 1 {
            bubbles.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
            assert_eq!(bubbles.bubbles().len(), 1);
        }
        bubbles.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
        assert!(bubbles.bubbles().is_empty());
    }

    #[test]
    fn test_bass_spawns_more_bubbles_than_silence() {
        let params = BubblesParams::default();
        let mut canvas = Canvas::new(160, 120).unwrap();

        let mut quiet = Bubbles::default();
        let mut rng = SmallRng::seed_from_u64(4);
        quiet.reset(canvas.size(), &params, &mut rng);
        for _ in 0..60 {
            quiet.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
        }

        let mut loud = Bubbles::default();
        let mut rng = SmallRng::seed_from_u64(4);
        loud.reset(canvas.size(), &params, &mut rng);
        for _ in 0..60 {
            loud.render(&mut canvas, &bass_ctx(), &params, &mut rng);
        }

        assert!(loud.bubbles().len() > quiet.bubbles().len());
    }

    #[test]
    fn test_bubbles_rise() {
        let params = BubblesParams {
            ambient_spawn_chance: 0.0,
            jitter: 0.0,
            ..BubblesParams::default()
        };
        let mut bubbles = Bubbles::default();
        let mut rng = SmallRng::seed_from_u64(6);
        let mut canvas = Canvas::new(100, 300).unwrap();
        bubbles.reset(canvas.size(), &params, &mut rng);
        bubbles.spawn(&params, &mut rng);
        let start = bubbles.bubbles()[0].position.y;
        for _ in 0..10 {
            bubbles.render(&mut canvas, &FrameContext::default(), &params, &mut rng);
        }
        assert!(bubbles.bubbles()[0].position.y < start);
    }
}
