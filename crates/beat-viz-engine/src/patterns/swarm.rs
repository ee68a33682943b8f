//! Boids flock with fading trails.
//!
//! Alignment, cohesion and separation inside a perception radius that widens
//! with intensity, plus a weak bass-driven pull toward the center. The pool
//! has a fixed size: a particle whose life runs out is respawned in its slot.

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
pub struct SwarmParams {
    /// Surface pixels per particle
    pub density: f32,
    pub max_particles: usize,
    pub perception_radius: f32,
    /// Extra perception radius at full overall intensity
    pub perception_boost: f32,
    /// Neighbours closer than this push each other away
    pub separation_distance: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub center_pull: f32,
    /// Multiplier on the center pull at full bass
    pub center_bass_boost: f32,
    pub max_speed: f32,
    /// Extra speed cap at full treble
    pub max_speed_treble_boost: f32,
    pub trail_length: usize,
    pub life_min: f32,
    pub life_max: f32,
    pub size_min: f32,
    pub size_max: f32,
}

impl Default for SwarmParams {
    fn default() -> Self {
        Self {
            density: 800.0,
            max_particles: 200,
            perception_radius: 50.0,
            perception_boost: 50.0,
            separation_distance: 20.0,
            alignment_weight: 0.05,
            cohesion_weight: 0.005,
            separation_weight: 0.08,
            center_pull: 0.0005,
            center_bass_boost: 4.0,
            max_speed: 2.0,
            max_speed_treble_boost: 4.0,
            trail_length: 12,
            life_min: 300.0,
            life_max: 600.0,
            size_min: 1.5,
            size_max: 3.5,
        }
    }
}

impl SwarmParams {
    /// Rejects tunables that cannot be sampled or drawn.
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("swarm");
        checks.positive(&[
            ("density", self.density as f64),
            ("max_speed", self.max_speed as f64),
        ])?;
        checks.range("life", self.life_min as f64, self.life_max as f64, 1.0)?;
        checks.range("size", self.size_min as f64, self.size_max as f64, 0.0)?;
        checks.non_negative(&[
            ("perception_radius", self.perception_radius as f64),
            ("perception_boost", self.perception_boost as f64),
            ("separation_distance", self.separation_distance as f64),
            ("max_speed_treble_boost", self.max_speed_treble_boost as f64),
        ])?;
        checks.finite(&[
            ("alignment_weight", self.alignment_weight as f64),
            ("cohesion_weight", self.cohesion_weight as f64),
            ("separation_weight", self.separation_weight as f64),
            ("center_pull", self.center_pull as f64),
            ("center_bass_boost", self.center_bass_boost as f64),
        ])
    }

    /// Pool size for a surface: `min(max_particles, floor(area / density))`.
    pub fn particle_count(&self, size: Vec2) -> usize {
        let area = (size.x.max(0.0) * size.y.max(0.0)) as f64;
        let by_area = (area / self.density.max(1.0) as f64).floor() as usize;
        by_area.min(self.max_particles)
    }
}

/// Fixed-capacity ring of recent positions.
#[derive(Clone, Debug)]
pub struct Trail {
    points: Vec<Vec2>,
    head: usize,
    len: usize,
}

impl Trail {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: vec![Vec2::ZERO; capacity],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, point: Vec2) {
        if self.points.is_empty() {
            return;
        }
        self.points[self.head] = point;
        self.head = (self.head + 1) % self.points.len();
        self.len = (self.len + 1).min(self.points.len());
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Positions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        let cap = self.points.len();
        let start = (self.head + cap - self.len) % cap.max(1);
        (0..self.len).map(move |i| self.points[(start + i) % cap])
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub hue: f32,
    pub life: f32,
    pub max_life: f32,
    pub angle: f32,
    pub angular_velocity: f32,
    pub trail: Trail,
}

impl Particle {
    fn spawn(size: Vec2, params: &SwarmParams, rng: &mut SmallRng) -> Self {
        let mut particle = Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size: 0.0,
            hue: 0.0,
            life: 0.0,
            max_life: 0.0,
            angle: 0.0,
            angular_velocity: 0.0,
            trail: Trail::with_capacity(params.trail_length),
        };
        particle.respawn(size, params, rng);
        particle
    }

    /// Re-randomizes this slot in place, keeping its trail allocation.
    fn respawn(&mut self, size: Vec2, params: &SwarmParams, rng: &mut SmallRng) {
        let heading = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = uniform(rng, 0.5, params.max_speed);

        self.position = Vec2::new(
            rng.random_range(0.0..size.x.max(1.0)),
            rng.random_range(0.0..size.y.max(1.0)),
        );
        self.velocity = Vec2::new(heading.cos(), heading.sin()) * speed;
        self.size = uniform(rng, params.size_min, params.size_max);
        self.hue = rng.random_range(0.0..360.0);
        self.max_life = uniform(rng, params.life_min.max(1.0), params.life_max);
        self.life = self.max_life;
        self.angle = heading;
        self.angular_velocity = rng.random_range(-0.05..0.05);
        self.trail.clear();
    }
}

#[derive(Default)]
pub struct Swarm {
    particles: Vec<Particle>,
    bounds: Vec2,
}

impl Swarm {
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn steer(&mut self, ctx: &FrameContext, params: &SwarmParams, rng: &mut SmallRng) {
        let m = ctx.metrics;
        let perception = params.perception_radius + m.overall * params.perception_boost;
        let perception_sq = perception * perception;
        let separation_sq = params.separation_distance * params.separation_distance;
        let max_speed = params.max_speed + m.treble * params.max_speed_treble_boost;
        let pull = params.center_pull * (1.0 + m.bass * params.center_bass_boost);
        let center = self.bounds * 0.5;

        let snapshot: Vec<(Vec2, Vec2)> =
            self.particles.iter().map(|p| (p.position, p.velocity)).collect();

        for (i, particle) in self.particles.iter_mut().enumerate() {
            let mut alignment = Vec2::ZERO;
            let mut cohesion = Vec2::ZERO;
            let mut separation = Vec2::ZERO;
            let mut neighbours = 0;

            for (j, &(pos, vel)) in snapshot.iter().enumerate() {
                if i == j {
                    continue;
                }
                let offset = particle.position - pos;
                let d_sq = offset.length_squared();
                if d_sq >= perception_sq {
                    continue;
                }
                alignment += vel;
                cohesion += pos;
                neighbours += 1;
                if d_sq < separation_sq && d_sq > 0.0 {
                    separation += offset / d_sq.sqrt();
                }
            }

            let mut accel = (center - particle.position) * pull;
            if neighbours > 0 {
                let n = neighbours as f32;
                accel += (alignment / n - particle.velocity) * params.alignment_weight;
                accel += (cohesion / n - particle.position) * params.cohesion_weight;
                accel += separation * params.separation_weight;
            }

            particle.velocity += accel;
            if particle.velocity.length() > max_speed {
                particle.velocity = particle.velocity.normalize_or_zero() * max_speed;
            }
            particle.position += particle.velocity;
            particle.position.x = particle.position.x.rem_euclid(self.bounds.x.max(1.0));
            particle.position.y = particle.position.y.rem_euclid(self.bounds.y.max(1.0));
            particle.angle += particle.angular_velocity;

            particle.life -= 1.0;
            if particle.life <= 0.0 {
                particle.respawn(self.bounds, params, rng);
            }
            particle.trail.push(particle.position);
        }
    }
}

impl Generator for Swarm {
    type Params = SwarmParams;

    fn reset(&mut self, size: Vec2, params: &SwarmParams, rng: &mut SmallRng) {
        self.bounds = size;
        let count = params.particle_count(size);
        self.particles = (0..count).map(|_| Particle::spawn(size, params, rng)).collect();
    }

    fn render(
        &mut self,
        canvas: &mut Canvas,
        ctx: &FrameContext,
        params: &SwarmParams,
        rng: &mut SmallRng,
    ) {
        self.steer(ctx, params, rng);

        let m = ctx.metrics;
        let half_diag = self.bounds.length() * 0.5;
        for p in &self.particles {
            let hue = ctx.hue_base + p.hue * 0.3;
            let fade = (p.life / p.max_life.max(1.0)).clamp(0.2, 1.0);

            // Trail: older segments thinner and more transparent; skip wrap jumps
            let n = p.trail.len();
            let mut prev: Option<Vec2> = None;
            for (k, point) in p.trail.iter().enumerate() {
                if let Some(from) = prev {
                    if from.distance(point) < half_diag * 0.5 {
                        let t = k as f32 / n.max(1) as f32;
                        let color = hsla(hue, 0.8, 0.55, t * 0.6 * fade);
                        canvas.stroke_line(from, point, p.size * t, color);
                    }
                }
                prev = Some(point);
            }

            let size = p.size * (1.0 + m.bass * 0.6);
            canvas.fill_circle(p.position, size * 2.0, hsla(hue, 0.9, 0.6, 0.15 * fade));
            canvas.fill_circle(p.position, size, hsla(hue, 0.9, 0.7, fade));
        }
    }
}
