//! The 22 pattern generators and the library that owns their state.
//!
//! Every generator is an independent struct holding only its own pool or
//! closed-form state. [`PatternLibrary`] owns one of each and dispatches by
//! [`Pattern`], so rendering one pattern can never touch another's state.

pub mod aurora;
pub mod bubbles;
pub mod constellation;
pub mod dna;
pub mod fireworks;
pub mod fluid;
pub mod fractal;
pub mod galaxy;
pub mod hexgrid;
pub mod lightning;
pub mod lissajous;
pub mod mandala;
pub mod matrix;
pub mod plasma;
mod ranges;
pub mod rays;
pub mod rings;
pub mod spirograph;
pub mod starfield;
pub mod swarm;
pub mod tunnel;
pub mod voronoi;
pub mod waves;

use glam::Vec2;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::analysis::FrequencyMetrics;
use crate::canvas::Canvas;
use crate::error::Result;
use crate::pattern::Pattern;

pub use aurora::{Aurora, AuroraParams};
pub use bubbles::{Bubble, Bubbles, BubblesParams};
pub use constellation::{Constellation, ConstellationParams, ConstellationStar};
pub use dna::{Dna, DnaParams};
pub use fireworks::{Fireworks, FireworksParams, Spark};
pub use fluid::{Fluid, FluidParams};
pub use fractal::{Fractal, FractalParams};
pub use galaxy::{Galaxy, GalaxyParams};
pub use hexgrid::{Hexgrid, HexgridParams};
pub use lightning::{Lightning, LightningBolt, LightningParams};
pub use lissajous::{Lissajous, LissajousParams};
pub use mandala::{Mandala, MandalaParams};
pub use matrix::{Matrix, MatrixColumn, MatrixParams};
pub use plasma::{Plasma, PlasmaParams};
pub use rays::{Rays, RaysParams};
pub use rings::{Rings, RingsParams};
pub use spirograph::{Spirograph, SpirographParams};
pub use starfield::{Star, Starfield, StarfieldParams};
pub use swarm::{Particle, Swarm, SwarmParams, Trail};
pub use tunnel::{Tunnel, TunnelParams};
pub use voronoi::{Voronoi, VoronoiParams, VoronoiSeed};
pub use waves::{Waves, WavesParams};

/// Seconds-like time base: frame counter times this step.
pub const TIME_STEP: f32 = 0.016;

/// Per-frame inputs shared by every generator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameContext {
    pub metrics: FrequencyMetrics,
    /// Global hue baseline in degrees
    pub hue_base: f32,
    /// `frame * TIME_STEP`
    pub time: f32,
    pub frame: u64,
}

impl FrameContext {
    pub fn new(metrics: FrequencyMetrics, hue_base: f32, frame: u64) -> Self {
        Self {
            metrics,
            hue_base,
            time: frame as f32 * TIME_STEP,
            frame,
        }
    }
}

/// Common call signature of all pattern generators.
pub trait Generator {
    type Params;

    /// Discards and rebuilds all state for a surface of `size`.
    fn reset(&mut self, _size: Vec2, _params: &Self::Params, _rng: &mut SmallRng) {}

    /// Advances one frame and draws it onto `canvas`.
    fn render(&mut self, canvas: &mut Canvas, ctx: &FrameContext, params: &Self::Params, rng: &mut SmallRng);
}

/// Tunables for every pattern, one table per pattern in TOML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternParams {
    pub fractal: FractalParams,
    pub rays: RaysParams,
    pub tunnel: TunnelParams,
    pub bubbles: BubblesParams,
    pub voronoi: VoronoiParams,
    pub waves: WavesParams,
    pub swarm: SwarmParams,
    pub mandala: MandalaParams,
    pub dna: DnaParams,
    pub plasma: PlasmaParams,
    pub galaxy: GalaxyParams,
    pub matrix: MatrixParams,
    pub lightning: LightningParams,
    pub aurora: AuroraParams,
    pub fireworks: FireworksParams,
    pub lissajous: LissajousParams,
    pub rings: RingsParams,
    pub starfield: StarfieldParams,
    pub fluid: FluidParams,
    pub hexgrid: HexgridParams,
    pub spirograph: SpirographParams,
    pub constellation: ConstellationParams,
}

impl PatternParams {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Checks every table; the error names the first offending
    /// `patterns.<name>.<field>`.
    pub fn validate(&self) -> Result<()> {
        self.fractal.validate()?;
        self.rays.validate()?;
        self.tunnel.validate()?;
        self.bubbles.validate()?;
        self.voronoi.validate()?;
        self.waves.validate()?;
        self.swarm.validate()?;
        self.mandala.validate()?;
        self.dna.validate()?;
        self.plasma.validate()?;
        self.galaxy.validate()?;
        self.matrix.validate()?;
        self.lightning.validate()?;
        self.aurora.validate()?;
        self.fireworks.validate()?;
        self.lissajous.validate()?;
        self.rings.validate()?;
        self.starfield.validate()?;
        self.fluid.validate()?;
        self.hexgrid.validate()?;
        self.spirograph.validate()?;
        self.constellation.validate()
    }
}

/// Entity pool sizes, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolSizes {
    pub swarm: usize,
    pub bubbles: usize,
    pub lightning: usize,
    pub fireworks: usize,
    pub matrix: usize,
    pub starfield: usize,
    pub constellation: usize,
    pub voronoi: usize,
}

#[derive(Default)]
pub struct PatternLibrary {
    params: PatternParams,
    size: Vec2,
    fractal: Fractal,
    rays: Rays,
    tunnel: Tunnel,
    bubbles: Bubbles,
    voronoi: Voronoi,
    waves: Waves,
    swarm: Swarm,
    mandala: Mandala,
    dna: Dna,
    plasma: Plasma,
    galaxy: Galaxy,
    matrix: Matrix,
    lightning: Lightning,
    aurora: Aurora,
    fireworks: Fireworks,
    lissajous: Lissajous,
    rings: Rings,
    starfield: Starfield,
    fluid: Fluid,
    hexgrid: Hexgrid,
    spirograph: Spirograph,
    constellation: Constellation,
}

impl PatternLibrary {
    pub fn new(size: Vec2, params: PatternParams, rng: &mut SmallRng) -> Self {
        let mut library = Self {
            params,
            ..Self::default()
        };
        library.reset(size, rng);
        library
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn params(&self) -> &PatternParams {
        &self.params
    }

    /// Discards and rebuilds every generator for a surface of `size`.
    pub fn reset(&mut self, size: Vec2, rng: &mut SmallRng) {
        self.size = size;
        let p = &self.params;
        self.fractal.reset(size, &p.fractal, rng);
        self.rays.reset(size, &p.rays, rng);
        self.tunnel.reset(size, &p.tunnel, rng);
        self.bubbles.reset(size, &p.bubbles, rng);
        self.voronoi.reset(size, &p.voronoi, rng);
        self.waves.reset(size, &p.waves, rng);
        self.swarm.reset(size, &p.swarm, rng);
        self.mandala.reset(size, &p.mandala, rng);
        self.dna.reset(size, &p.dna, rng);
        self.plasma.reset(size, &p.plasma, rng);
        self.galaxy.reset(size, &p.galaxy, rng);
        self.matrix.reset(size, &p.matrix, rng);
        self.lightning.reset(size, &p.lightning, rng);
        self.aurora.reset(size, &p.aurora, rng);
        self.fireworks.reset(size, &p.fireworks, rng);
        self.lissajous.reset(size, &p.lissajous, rng);
        self.rings.reset(size, &p.rings, rng);
        self.starfield.reset(size, &p.starfield, rng);
        self.fluid.reset(size, &p.fluid, rng);
        self.hexgrid.reset(size, &p.hexgrid, rng);
        self.spirograph.reset(size, &p.spirograph, rng);
        self.constellation.reset(size, &p.constellation, rng);
    }

    /// Replaces the tunables; entity pools whose parameters changed are rebuilt.
    /// Invalid tunables are rejected and the current ones stay in place.
    pub fn set_params(&mut self, params: PatternParams, rng: &mut SmallRng) -> Result<()> {
        params.validate()?;
        let old = std::mem::replace(&mut self.params, params);
        let p = &self.params;
        let size = self.size;
        if old.bubbles != p.bubbles {
            self.bubbles.reset(size, &p.bubbles, rng);
        }
        if old.voronoi != p.voronoi {
            self.voronoi.reset(size, &p.voronoi, rng);
        }
        if old.swarm != p.swarm {
            self.swarm.reset(size, &p.swarm, rng);
        }
        if old.matrix != p.matrix {
            self.matrix.reset(size, &p.matrix, rng);
        }
        if old.lightning != p.lightning {
            self.lightning.reset(size, &p.lightning, rng);
        }
        if old.fireworks != p.fireworks {
            self.fireworks.reset(size, &p.fireworks, rng);
        }
        if old.starfield != p.starfield {
            self.starfield.reset(size, &p.starfield, rng);
        }
        if old.constellation != p.constellation {
            self.constellation.reset(size, &p.constellation, rng);
        }
        Ok(())
    }

    /// Draws one frame of `pattern`.
    pub fn render(&mut self, pattern: Pattern, canvas: &mut Canvas, ctx: &FrameContext, rng: &mut SmallRng) {
        let p = &self.params;
        match pattern {
            Pattern::Fractal => self.fractal.render(canvas, ctx, &p.fractal, rng),
            Pattern::Rays => self.rays.render(canvas, ctx, &p.rays, rng),
            Pattern::Tunnel => self.tunnel.render(canvas, ctx, &p.tunnel, rng),
            Pattern::Bubbles => self.bubbles.render(canvas, ctx, &p.bubbles, rng),
            Pattern::Voronoi => self.voronoi.render(canvas, ctx, &p.voronoi, rng),
            Pattern::Waves => self.waves.render(canvas, ctx, &p.waves, rng),
            Pattern::Swarm => self.swarm.render(canvas, ctx, &p.swarm, rng),
            Pattern::Mandala => self.mandala.render(canvas, ctx, &p.mandala, rng),
            Pattern::Dna => self.dna.render(canvas, ctx, &p.dna, rng),
            Pattern::Plasma => self.plasma.render(canvas, ctx, &p.plasma, rng),
            Pattern::Galaxy => self.galaxy.render(canvas, ctx, &p.galaxy, rng),
            Pattern::Matrix => self.matrix.render(canvas, ctx, &p.matrix, rng),
            Pattern::Lightning => self.lightning.render(canvas, ctx, &p.lightning, rng),
            Pattern::Aurora => self.aurora.render(canvas, ctx, &p.aurora, rng),
            Pattern::Fireworks => self.fireworks.render(canvas, ctx, &p.fireworks, rng),
            Pattern::Lissajous => self.lissajous.render(canvas, ctx, &p.lissajous, rng),
            Pattern::Rings => self.rings.render(canvas, ctx, &p.rings, rng),
            Pattern::Starfield => self.starfield.render(canvas, ctx, &p.starfield, rng),
            Pattern::Fluid => self.fluid.render(canvas, ctx, &p.fluid, rng),
            Pattern::Hexgrid => self.hexgrid.render(canvas, ctx, &p.hexgrid, rng),
            Pattern::Spirograph => self.spirograph.render(canvas, ctx, &p.spirograph, rng),
            Pattern::Constellation => self.constellation.render(canvas, ctx, &p.constellation, rng),
        }
    }

    pub fn pool_sizes(&self) -> PoolSizes {
        PoolSizes {
            swarm: self.swarm.particles().len(),
            bubbles: self.bubbles.bubbles().len(),
            lightning: self.lightning.bolts().len(),
            fireworks: self.fireworks.sparks().len(),
            matrix: self.matrix.columns().len(),
            starfield: self.starfield.stars().len(),
            constellation: self.constellation.stars().len(),
            voronoi: self.voronoi.seeds().len(),
        }
    }

    pub fn fractal(&self) -> &Fractal {
        &self.fractal
    }

    pub fn fractal_mut(&mut self) -> &mut Fractal {
        &mut self.fractal
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub fn bubbles(&self) -> &Bubbles {
        &self.bubbles
    }

    pub fn lightning(&self) -> &Lightning {
        &self.lightning
    }

    pub fn fireworks(&self) -> &Fireworks {
        &self.fireworks
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn starfield(&self) -> &Starfield {
        &self.starfield
    }

    pub fn constellation(&self) -> &Constellation {
        &self.constellation
    }

    pub fn voronoi(&self) -> &Voronoi {
        &self.voronoi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::SEQUENCE;
    use rand::SeedableRng;

    #[test]
    fn test_every_pattern_renders_on_tiny_surface() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut canvas = Canvas::new(3, 2).unwrap();
        let mut library = PatternLibrary::new(canvas.size(), PatternParams::default(), &mut rng);
        let loud = FrequencyMetrics {
            overall: 1.0,
            bass: 1.0,
            mid: 1.0,
            treble: 1.0,
        };
        for (frame, pattern) in SEQUENCE.iter().enumerate() {
            let ctx = FrameContext::new(loud, 120.0, frame as u64);
            library.render(*pattern, &mut canvas, &ctx, &mut rng);
        }
    }

    #[test]
    fn test_set_params_rebuilds_only_changed_pools() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut library = PatternLibrary::new(Vec2::new(400.0, 300.0), PatternParams::default(), &mut rng);
        let stars_before: Vec<Vec2> = library
            .constellation()
            .stars()
            .iter()
            .map(|s| s.position)
            .collect();

        let mut params = library.params().clone();
        params.swarm.max_particles = 10;
        library.set_params(params, &mut rng).unwrap();

        assert_eq!(library.pool_sizes().swarm, 10);
        let stars_after: Vec<Vec2> = library
            .constellation()
            .stars()
            .iter()
            .map(|s| s.position)
            .collect();
        assert_eq!(stars_before, stars_after);
    }

    #[test]
    fn test_params_from_toml_tables() {
        let params: PatternParams = toml::from_str(
            r#"
            [swarm]
            max_particles = 50

            [lightning]
            min_bolts = 3
            "#,
        )
        .unwrap();
        assert_eq!(params.swarm.max_particles, 50);
        assert_eq!(params.swarm.density, 800.0);
        assert_eq!(params.lightning.min_bolts, 3);

        assert!(toml::from_str::<PatternParams>("[swarm]\nspeed = 2.0\n").is_err());
    }

    #[test]
    fn test_set_params_rejects_unsampleable_ranges() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut library = PatternLibrary::new(Vec2::new(200.0, 100.0), PatternParams::default(), &mut rng);

        let mut reversed = library.params().clone();
        reversed.fireworks.speed_min = 6.0;
        reversed.fireworks.speed_max = 1.0;
        let err = library.set_params(reversed, &mut rng).unwrap_err();
        assert!(err.to_string().contains("patterns.fireworks.speed_min"));

        let mut nan = library.params().clone();
        nan.swarm.size_max = f32::NAN;
        assert!(library.set_params(nan, &mut rng).is_err());

        let mut empty = library.params().clone();
        empty.lissajous.ratios.clear();
        assert!(library.set_params(empty, &mut rng).is_err());

        assert!(library.params().is_default());
    }

    #[test]
    fn test_equal_range_ends_are_accepted_and_render() {
        let mut rng = SmallRng::seed_from_u64(6);
        let mut canvas = Canvas::new(120, 80).unwrap();
        let mut params = PatternParams::default();
        params.voronoi.speed_min = 2.0;
        params.voronoi.speed_max = 2.0;
        params.voronoi.orbit_min = 0.3;
        params.voronoi.orbit_max = 0.3;
        params.fireworks.speed_min = 3.0;
        params.fireworks.speed_max = 3.0;
        params.fireworks.life_min = 40;
        params.fireworks.life_max = 40;
        params.swarm.size_min = 2.0;
        params.swarm.size_max = 2.0;
        params.matrix.speed_min = 4.0;
        params.matrix.speed_max = 4.0;
        params.bubbles.radius_min = 10.0;
        params.bubbles.radius_max = 10.0;
        params.validate().unwrap();

        let mut library = PatternLibrary::new(canvas.size(), params, &mut rng);
        assert_eq!(library.pool_sizes().voronoi, 20);
        let loud = FrequencyMetrics {
            overall: 1.0,
            bass: 1.0,
            mid: 1.0,
            treble: 1.0,
        };
        for pattern in [Pattern::Fireworks, Pattern::Swarm, Pattern::Matrix, Pattern::Bubbles, Pattern::Voronoi] {
            for frame in 0..3 {
                let ctx = FrameContext::new(loud, 0.0, frame);
                library.render(pattern, &mut canvas, &ctx, &mut rng);
            }
        }
        assert!(library.fireworks().sparks().iter().all(|s| s.max_life == 40));
    }

    #[test]
    fn test_default_params_validate() {
        PatternParams::default().validate().unwrap();
    }

    #[test]
    fn test_time_follows_frame_counter() {
        let ctx = FrameContext::new(FrequencyMetrics::SILENT, 0.0, 100);
        assert!((ctx.time - 1.6).abs() < 1e-5);
    }
}
