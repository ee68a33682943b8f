//! Timed pattern state machine.
//!
//! Two states: steady (one pattern) and transitioning (cross-fading the
//! current pattern into the next one). Loud audio shortens the dwell time and
//! speeds up the blend, but the order of patterns is always [`SEQUENCE`].

use crate::pattern::{Pattern, SEQUENCE};

/// Tunables for [`PatternScheduler`], resolved from [`crate::EngineConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerSettings {
    /// Dwell frames at silence
    pub base_duration: u32,
    /// Dwell never drops below this many frames
    pub min_duration: u32,
    /// Frames removed from the dwell at full overall intensity
    pub intensity_duration_scale: f32,
    /// Progress added per transitioning frame at silence
    pub transition_speed: f32,
    /// Relative speed-up of the blend at full overall intensity
    pub transition_intensity_boost: f32,
    /// Hue degrees added every frame
    pub hue_speed: f32,
    /// Extra hue degrees per frame at full bass
    pub hue_bass_boost: f32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            base_duration: 600,
            min_duration: 300,
            intensity_duration_scale: 200.0,
            transition_speed: 0.015,
            transition_intensity_boost: 0.3,
            hue_speed: 0.3,
            hue_bass_boost: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerState {
    pub current: Pattern,
    pub next: Pattern,
    pub elapsed_frames: u32,
    /// Linear blend progress in 0.0-1.0
    pub transition_progress: f32,
    pub is_transitioning: bool,
    /// Cursor into [`SEQUENCE`] pointing at `next`
    pub pattern_index: usize,
    /// Global hue baseline in [0, 360)
    pub hue_base: f32,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            current: SEQUENCE[0],
            next: SEQUENCE[1],
            elapsed_frames: 0,
            transition_progress: 0.0,
            is_transitioning: false,
            pattern_index: 1,
            hue_base: 0.0,
        }
    }
}

/// What a call to [`PatternScheduler::advance`] changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerEvent {
    None,
    TransitionStarted { from: Pattern, to: Pattern },
    TransitionCompleted { current: Pattern },
}

#[derive(Clone, Debug, Default)]
pub struct PatternScheduler {
    state: SchedulerState,
    settings: SchedulerSettings,
}

impl PatternScheduler {
    pub fn new(settings: SchedulerSettings) -> Self {
        Self {
            state: SchedulerState::default(),
            settings,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SchedulerSettings {
        &mut self.settings
    }

    /// Frames the current pattern stays on screen at the given loudness.
    pub fn dynamic_duration(&self, overall: f32) -> f32 {
        let overall = sanitize(overall);
        (self.settings.base_duration as f32 - overall * self.settings.intensity_duration_scale)
            .max(self.settings.min_duration as f32)
    }

    /// Rotates the shared hue baseline; runs every frame regardless of state.
    pub fn advance_hue(&mut self, bass: f32) {
        let step = self.settings.hue_speed + sanitize(bass) * self.settings.hue_bass_boost;
        self.state.hue_base = crate::color::wrap_hue(self.state.hue_base + step);
    }

    /// Advances the state machine by one frame.
    pub fn advance(&mut self, overall: f32) -> SchedulerEvent {
        let overall = sanitize(overall);

        if self.state.is_transitioning {
            let step =
                self.settings.transition_speed * (1.0 + overall * self.settings.transition_intensity_boost);
            self.state.transition_progress = (self.state.transition_progress + step).min(1.0);
            if self.state.transition_progress >= 1.0 {
                return self.complete_transition();
            }
            return SchedulerEvent::None;
        }

        self.state.elapsed_frames = self.state.elapsed_frames.saturating_add(1);
        if self.state.elapsed_frames as f32 > self.dynamic_duration(overall) {
            return self.begin_transition();
        }
        SchedulerEvent::None
    }

    /// Starts blending into the next pattern immediately (no-op while blending).
    pub fn begin_transition(&mut self) -> SchedulerEvent {
        if self.state.is_transitioning {
            return SchedulerEvent::None;
        }
        self.state.is_transitioning = true;
        self.state.transition_progress = 0.0;
        SchedulerEvent::TransitionStarted {
            from: self.state.current,
            to: self.state.next,
        }
    }

    fn complete_transition(&mut self) -> SchedulerEvent {
        self.state.current = self.state.next;
        self.state.elapsed_frames = 0;
        self.state.pattern_index = (self.state.pattern_index + 1) % SEQUENCE.len();
        self.state.next = SEQUENCE[self.state.pattern_index];
        self.state.transition_progress = 0.0;
        self.state.is_transitioning = false;
        SchedulerEvent::TransitionCompleted {
            current: self.state.current,
        }
    }

    /// Shows `pattern` right away; the tour resumes from its successor.
    pub fn force(&mut self, pattern: Pattern) {
        self.state.current = pattern;
        self.state.pattern_index = (pattern.index() + 1) % SEQUENCE.len();
        self.state.next = SEQUENCE[self.state.pattern_index];
        self.state.elapsed_frames = 0;
        self.state.transition_progress = 0.0;
        self.state.is_transitioning = false;
    }

    /// Eased cross-fade weight of the incoming pattern.
    pub fn blend_weight(&self) -> f32 {
        ease_in_out_cubic(self.state.transition_progress)
    }

    pub fn set_hue_base(&mut self, hue: f32) {
        self.state.hue_base = crate::color::wrap_hue(hue);
    }
}

/// Cubic ease-in-out; exactly 0 at 0 and exactly 1 at 1.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = sanitize(t);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until_current_changes(scheduler: &mut PatternScheduler, overall: f32) -> u32 {
        let start = scheduler.state().current;
        let mut frames = 0;
        while scheduler.state().current == start {
            scheduler.advance(overall);
            frames += 1;
            assert!(frames < 10_000, "scheduler stalled");
        }
        frames
    }

    #[test]
    fn test_initial_state() {
        let scheduler = PatternScheduler::default();
        let state = scheduler.state();
        assert_eq!(state.current, SEQUENCE[0]);
        assert_eq!(state.next, SEQUENCE[1]);
        assert!(!state.is_transitioning);
        assert_eq!(state.elapsed_frames, 0);
    }

    #[test]
    fn test_transition_starts_at_frame_601_on_silence() {
        let mut scheduler = PatternScheduler::default();
        for _ in 0..600 {
            assert_eq!(scheduler.advance(0.0), SchedulerEvent::None);
        }
        assert!(!scheduler.state().is_transitioning);

        let event = scheduler.advance(0.0);
        assert_eq!(
            event,
            SchedulerEvent::TransitionStarted {
                from: SEQUENCE[0],
                to: SEQUENCE[1]
            }
        );
        assert!(scheduler.state().is_transitioning);
        assert_eq!(scheduler.blend_weight(), 0.0);
    }

    #[test]
    fn test_loud_audio_shortens_dwell_but_not_below_floor() {
        let scheduler = PatternScheduler::default();
        assert_eq!(scheduler.dynamic_duration(0.0), 600.0);
        assert_eq!(scheduler.dynamic_duration(1.0), 400.0);

        let mut settings = SchedulerSettings::default();
        settings.intensity_duration_scale = 1000.0;
        let scheduler = PatternScheduler::new(settings);
        assert_eq!(scheduler.dynamic_duration(1.0), 300.0);
    }

    #[test]
    fn test_transition_completes_and_advances_cursor() {
        let mut scheduler = PatternScheduler::default();
        run_until_current_changes(&mut scheduler, 0.0);
        let state = scheduler.state();
        assert_eq!(state.current, SEQUENCE[1]);
        assert_eq!(state.next, SEQUENCE[2]);
        assert_eq!(state.elapsed_frames, 0);
        assert!(!state.is_transitioning);
        assert_eq!(state.transition_progress, 0.0);
    }

    #[test]
    fn test_louder_audio_is_faster_overall() {
        let mut quiet = PatternScheduler::default();
        let mut loud = PatternScheduler::default();
        let quiet_frames = run_until_current_changes(&mut quiet, 0.0);
        let loud_frames = run_until_current_changes(&mut loud, 1.0);
        assert!(loud_frames < quiet_frames);
    }

    #[test]
    fn test_order_is_independent_of_intensity() {
        let profiles: [fn(u32) -> f32; 3] = [
            |_| 0.0,
            |_| 1.0,
            |frame| ((frame as f32 * 0.37).sin() * 0.5 + 0.5),
        ];
        let mut tours = Vec::new();
        for profile in profiles {
            let mut scheduler = PatternScheduler::default();
            let mut visited = vec![scheduler.state().current];
            let mut frame = 0u32;
            while visited.len() < SEQUENCE.len() * 2 + 1 {
                scheduler.advance(profile(frame));
                frame += 1;
                if let Some(last) = visited.last() {
                    if *last != scheduler.state().current {
                        visited.push(scheduler.state().current);
                    }
                }
            }
            tours.push(visited);
        }
        assert_eq!(tours[0], tours[1]);
        assert_eq!(tours[0], tours[2]);
        assert_eq!(&tours[0][..SEQUENCE.len()], &SEQUENCE[..]);
        assert_eq!(tours[0][SEQUENCE.len()], SEQUENCE[0]);
    }

    #[test]
    fn test_easing_endpoints_are_exact() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert_eq!(ease_in_out_cubic(0.5), 0.5);
        assert!((ease_in_out_cubic(0.25) - 0.0625).abs() < 1e-6);
        let mut prev = 0.0;
        for i in 1..=100 {
            let eased = ease_in_out_cubic(i as f32 / 100.0);
            assert!(eased >= prev);
            prev = eased;
        }
    }

    #[test]
    fn test_hue_rotates_and_wraps() {
        let mut scheduler = PatternScheduler::default();
        scheduler.advance_hue(0.0);
        assert!((scheduler.state().hue_base - 0.3).abs() < 1e-6);
        scheduler.set_hue_base(359.9);
        scheduler.advance_hue(1.0);
        let hue = scheduler.state().hue_base;
        assert!((0.0..360.0).contains(&hue));
        assert!(hue < 2.0);
    }

    #[test]
    fn test_force_resumes_tour_after_override() {
        let mut scheduler = PatternScheduler::default();
        for _ in 0..650 {
            scheduler.advance(0.0);
        }
        scheduler.force(Pattern::Lightning);
        let state = scheduler.state();
        assert_eq!(state.current, Pattern::Lightning);
        assert_eq!(state.next, Pattern::Aurora);
        assert!(!state.is_transitioning);
        assert_eq!(state.elapsed_frames, 0);
    }
}
