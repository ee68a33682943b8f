//! The per-frame render loop.
//!
//! [`Visualizer`] owns the raster surface, the scheduler, every pattern's
//! state and the random source. The driver calls [`Visualizer::render`] once
//! per animation frame and [`Visualizer::resize`] between frames.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, trace};

use crate::analysis::FrequencyMetrics;
use crate::canvas::Canvas;
use crate::color::Rgba;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pattern::Pattern;
use crate::patterns::{FrameContext, PatternLibrary, PatternParams, PoolSizes};
use crate::scheduler::{PatternScheduler, SchedulerEvent, SchedulerState};

pub struct Visualizer {
    config: EngineConfig,
    canvas: Canvas,
    scheduler: PatternScheduler,
    library: PatternLibrary,
    rng: SmallRng,
    frame: u64,
    metrics: FrequencyMetrics,
}

impl Visualizer {
    /// Creates an engine drawing onto a fresh `width`x`height` surface.
    pub fn new(width: u32, height: u32, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let canvas = Canvas::new(width, height)?;
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let library = PatternLibrary::new(canvas.size(), config.patterns.clone(), &mut rng);
        let scheduler = PatternScheduler::new(config.scheduler_settings());

        info!(
            width,
            height,
            first = %scheduler.state().current,
            seeded = config.seed.is_some(),
            "visualizer ready"
        );

        Ok(Self {
            config,
            canvas,
            scheduler,
            library,
            rng,
            frame: 0,
            metrics: FrequencyMetrics::SILENT,
        })
    }

    /// Draws exactly one frame from the frequency buffer (logical length `len`).
    ///
    /// Never fails: an empty or short buffer renders as silence.
    pub fn render(&mut self, buffer: &[u8], len: usize) {
        self.metrics = FrequencyMetrics::from_spectrum(buffer, len);
        let m = self.metrics;

        self.scheduler.advance_hue(m.bass);
        match self.scheduler.advance(m.overall) {
            SchedulerEvent::TransitionStarted { from, to } => {
                debug!(frame = self.frame, %from, %to, "transition started");
            }
            SchedulerEvent::TransitionCompleted { current } => {
                debug!(frame = self.frame, %current, "transition completed");
            }
            SchedulerEvent::None => {}
        }

        let state = self.scheduler.state().clone();
        self.canvas.set_global_alpha(1.0);
        let fade = if state.is_transitioning {
            self.fade_alpha(state.current).max(self.fade_alpha(state.next))
        } else {
            self.fade_alpha(state.current)
        };
        self.canvas.fill(Rgba::BLACK.with_alpha(fade));

        let ctx = FrameContext::new(m, state.hue_base, self.frame);
        if state.is_transitioning {
            let eased = self.scheduler.blend_weight();
            self.canvas.set_global_alpha(1.0 - eased);
            self.library.render(state.current, &mut self.canvas, &ctx, &mut self.rng);
            self.canvas.set_global_alpha(eased);
            self.library.render(state.next, &mut self.canvas, &ctx, &mut self.rng);
            self.canvas.set_global_alpha(1.0);
        } else {
            self.library.render(state.current, &mut self.canvas, &ctx, &mut self.rng);
        }

        trace!(frame = self.frame, pools = ?self.library.pool_sizes(), "frame rendered");
        self.frame += 1;
    }

    /// Per-frame fade for `pattern`: trail patterns fade harder, loud audio a bit more.
    fn fade_alpha(&self, pattern: Pattern) -> f32 {
        let base = if pattern.leaves_trails() {
            self.config.trail_fade()
        } else {
            self.config.base_fade()
        };
        (base * (1.0 + self.metrics.overall * self.config.fade_intensity_scale())).clamp(0.0, 1.0)
    }

    /// Switches to a new surface size and rebuilds every entity pool.
    ///
    /// On error the engine keeps drawing onto its previous surface.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let canvas = Canvas::new(width, height)?;
        self.canvas = canvas;
        self.library.reset(self.canvas.size(), &mut self.rng);
        info!(width, height, pools = ?self.library.pool_sizes(), "surface resized");
        Ok(())
    }

    /// Shows `pattern` immediately, bypassing the scheduled tour.
    pub fn set_pattern(&mut self, pattern: Pattern) {
        debug!(frame = self.frame, %pattern, "pattern override");
        self.scheduler.force(pattern);
    }

    /// Starts the transition to the next scheduled pattern now.
    pub fn skip(&mut self) {
        if let SchedulerEvent::TransitionStarted { from, to } = self.scheduler.begin_transition() {
            debug!(frame = self.frame, %from, %to, "transition skipped ahead");
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn center(&self) -> Vec2 {
        self.canvas.center()
    }

    pub fn scheduler_state(&self) -> &SchedulerState {
        self.scheduler.state()
    }

    pub fn current_pattern(&self) -> Pattern {
        self.scheduler.state().current
    }

    /// Metrics computed by the most recent frame.
    pub fn metrics(&self) -> FrequencyMetrics {
        self.metrics
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn pool_sizes(&self) -> PoolSizes {
        self.library.pool_sizes()
    }

    pub fn hue_base(&self) -> f32 {
        self.scheduler.state().hue_base
    }

    pub fn set_hue_base(&mut self, hue: f32) {
        self.scheduler.set_hue_base(hue);
    }

    pub fn transition_speed(&self) -> f32 {
        self.scheduler.settings().transition_speed
    }

    pub fn set_transition_speed(&mut self, speed: f32) -> Result<()> {
        if !(speed.is_finite() && speed > 0.0 && speed <= 1.0) {
            return Err(EngineError::config(format!(
                "transition_speed must be in (0, 1], got {speed}"
            )));
        }
        self.config.transition_speed = Some(speed);
        self.scheduler.settings_mut().transition_speed = speed;
        Ok(())
    }

    /// Dwell time in frames at silence.
    pub fn pattern_duration(&self) -> u32 {
        self.scheduler.settings().base_duration
    }

    /// Sets the silent dwell time; the floor drops with it if needed.
    pub fn set_pattern_duration(&mut self, frames: u32) -> Result<()> {
        if frames == 0 {
            return Err(EngineError::config("pattern duration must be at least 1 frame"));
        }
        let settings = self.scheduler.settings_mut();
        settings.base_duration = frames;
        settings.min_duration = settings.min_duration.min(frames);
        self.config.base_duration = Some(frames);
        self.config.min_duration = Some(settings.min_duration);
        Ok(())
    }

    pub fn fractal_zoom(&self) -> f64 {
        self.library.fractal().zoom()
    }

    pub fn set_fractal_zoom(&mut self, zoom: f64) {
        self.library.fractal_mut().set_zoom(zoom);
    }

    pub fn fractal_offset(&self) -> [f64; 2] {
        self.library.fractal().offset()
    }

    pub fn set_fractal_offset(&mut self, offset: [f64; 2]) {
        self.library.fractal_mut().set_offset(offset);
    }

    /// Julia constant the fractal drifts around.
    pub fn fractal_constant(&self) -> [f64; 2] {
        self.library.params().fractal.base_constant
    }

    pub fn set_fractal_constant(&mut self, constant: [f64; 2]) -> Result<()> {
        self.update_params(|p| p.fractal.base_constant = constant)
    }

    pub fn pattern_params(&self) -> &PatternParams {
        self.library.params()
    }

    /// Edits the pattern tunables; pools whose parameters changed are rebuilt.
    ///
    /// An edit that leaves any table invalid is rejected as a whole and the
    /// previous tunables stay in effect.
    pub fn update_params<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut PatternParams),
    {
        let mut params = self.library.params().clone();
        edit(&mut params);
        if let Err(e) = self.library.set_params(params.clone(), &mut self.rng) {
            debug!(error = %e, "pattern parameter edit rejected");
            return Err(e);
        }
        self.config.patterns = params;
        trace!(pools = ?self.library.pool_sizes(), "pattern parameters updated");
        Ok(())
    }

    /// Swarm pool cap.
    pub fn particle_count(&self) -> usize {
        self.library.params().swarm.max_particles
    }

    pub fn set_particle_count(&mut self, count: usize) -> Result<()> {
        self.update_params(|p| p.swarm.max_particles = count)
    }
}
