//! Firework bursts on bass hits.
//!
//! Each burst scatters particles evenly around a launch point; particles
//! fall under gravity, lose speed to air drag and are removed one by one as
//! they expire. A cooldown bounds how often bursts fire.

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
pub struct FireworksParams {
    pub bass_threshold: f32,
    /// Minimum frames between two bursts
    pub cooldown_frames: u32,
    pub burst_base: usize,
    /// Extra particles per burst at full treble
    pub burst_treble: f32,
    pub burst_max: usize,
    pub gravity: f32,
    /// Velocity multiplier per frame
    pub decay: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub life_min: u32,
    pub life_max: u32,
}

impl Default for FireworksParams {
    fn default() -> Self {
        Self {
            bass_threshold: 0.5,
            cooldown_frames: 12,
            burst_base: 50,
            burst_treble: 100.0,
            burst_max: 150,
            gravity: 0.05,
            decay: 0.98,
            speed_min: 1.0,
            speed_max: 5.0,
            life_min: 60,
            life_max: 100,
        }
    }
}

impl FireworksParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("fireworks");
        checks.range("speed", self.speed_min as f64, self.speed_max as f64, 0.0)?;
        checks.range("life", self.life_min as f64, self.life_max as f64, 1.0)?;
        checks.non_negative(&[("burst_treble", self.burst_treble as f64)])?;
        checks.finite(&[
            ("bass_threshold", self.bass_threshold as f64),
            ("gravity", self.gravity as f64),
            ("decay", self.decay as f64),
        ])
    }

    /// Particles in one burst at the given treble level.
    pub fn burst_size(&self, treble: f32) -> usize {
        let extra = (treble.clamp(0.0, 1.0) * self.burst_treble) as usize;
        (self.burst_base + extra).min(self.burst_max)
    }
}

#[derive(Clone, Debug)]
pub struct Spark {
    pub position: Vec2,
    pub velocity: Vec2,
    pub hue: f32,
    pub life: u32,
    pub max_life: u32,
    pub size: f32,
}

#[derive(Default)]
pub struct Fireworks {
    sparks: Vec<Spark>,
    bounds: Vec2,
    cooldown: u32,
    bursts: u64,
}

impl Fireworks {
    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    /// Bursts launched since the last reset.
    pub fn bursts(&self) -> u64 {
        self.bursts
    }

    fn launch(&mut self, treble: f32, params: &FireworksParams, rng: &mut SmallRng) {
        let origin = Vec2::new(
            rng.random_range(self.bounds.x * 0.15..self.bounds.x * 0.85 + 0.1),
            rng.random_range(self.bounds.y * 0.15..self.bounds.y * 0.55 + 0.1),
        );
        let hue = rng.random_range(0.0..360.0);
        let count = params.burst_size(treble);

        self.sparks.reserve(count);
        for i in 0..count {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let speed = uniform(rng, params.speed_min, params.speed_max);
            self.sparks.push(Spark {
                position: origin,
                velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
                hue: hue + rng.random_range(-20.0..20.0),
                life: 0,
                max_life: uniform_int(rng, params.life_min, params.life_max),
                size: rng.random_range(1.0..3.0),
            });
        }
        self.cooldown = params.cooldown_frames;
        self.bursts += 1;
    }
}

impl Generator for Fireworks {
    type Params = FireworksParams;

    fn reset(&mut self, size: Vec2, _params: &FireworksParams, _rng: &mut SmallRng) {
        self.bounds = size;
        self.sparks.clear();
        self.cooldown = 0;
        self.bursts = 0;
    }

    fn render(
        &mut self,
        canvas: &mut Canvas,
        ctx: &FrameContext,
        params: &FireworksParams,
        rng: &mut SmallRng,
    ) {
        let m = ctx.metrics;
        self.cooldown = self.cooldown.saturating_sub(1);
        if m.bass > params.bass_threshold && self.cooldown == 0 {
            self.launch(m.treble, params, rng);
        }

        for spark in &mut self.sparks {
            spark.velocity.y += params.gravity;
            spark.velocity *= params.decay;
            spark.position += spark.velocity;
            spark.life += 1;
        }
        self.sparks.retain(|s| s.life <= s.max_life);

        for s in &self.sparks {
            let fade = 1.0 - s.life as f32 / s.max_life.max(1) as f32;
            let hue = ctx.hue_base * 0.5 + s.hue;
            canvas.fill_circle(s.position, s.size * 2.5, hsla(hue, 1.0, 0.6, 0.2 * fade));
            canvas.fill_circle(s.position, s.size, hsla(hue, 1.0, 0.75, fade));
        }
    }
}
