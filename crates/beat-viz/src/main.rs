mod audio;
mod config;
mod display;
mod ui;

use audio::{SourcePipe, SpectrumAnalyzer};
use beat_viz_engine::Visualizer;
use config::Config;
use display::{scaled_size, Resolution, SurfaceTexture};
use nannou::prelude::*;
use std::env;
use std::fmt::Debug;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ui::bindings::{parse_key, Action};

/// Multiplier applied to the cross-fade speed per Up/Down press
const TRANSITION_STEP: f32 = 1.25;
const MIN_TRANSITION_SPEED: f32 = 0.002;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--list-devices") {
        SourcePipe::list_devices();
        return;
    }

    nannou::app(model).update(update).run();
}

struct Model {
    source: SourcePipe,
    spectrum: SpectrumAnalyzer,
    visualizer: Visualizer,
    surface: SurfaceTexture,
    render_scale: f32,
}

fn fatal(context: &str, err: impl Debug) -> ! {
    error!(error = ?err, "{}", context);
    std::process::exit(1);
}

fn model(app: &App) -> Model {
    let args: Vec<String> = env::args().collect();
    let windowed = args.iter().any(|a| a == "--windowed" || a == "-w");
    let resolution = Resolution::current(windowed);
    app.set_exit_on_escape(false);

    let mut win = app
        .new_window()
        .title("beat-viz")
        .view(view)
        .key_pressed(key_pressed)
        .resized(resized)
        .size(resolution.width, resolution.height)
        .min_size(400, 300);

    if resolution.fullscreen {
        win = win.fullscreen();
    }

    let window_id = win.build().unwrap_or_else(|e| fatal("could not create window", e));
    let Some(window) = app.window(window_id) else {
        fatal("window closed during startup", "missing window");
    };
    if resolution.fullscreen {
        window.set_cursor_visible(false);
    }

    let config = Config::load();
    let render_scale = config.render_scale();
    let (width, height) = scaled_size(window.inner_size_pixels(), render_scale);
    info!(width, height, render_scale, "drawing surface");

    let visualizer =
        Visualizer::new(width, height, config.engine()).unwrap_or_else(|e| fatal("could not start visualizer", e));
    let surface = SurfaceTexture::new(window.device(), [width, height]);

    Model {
        source: SourcePipe::new(),
        spectrum: SpectrumAnalyzer::new(),
        visualizer,
        surface,
        render_scale,
    }
}

fn update(_app: &App, model: &mut Model, _update: Update) {
    let samples = model.source.stream();
    let spectrum = model.spectrum.process(&samples);
    model.visualizer.render(spectrum, spectrum.len());
}

fn view(app: &App, model: &Model, frame: Frame) {
    {
        let window = app.main_window();
        let mut encoder = frame.command_encoder();
        model
            .surface
            .upload(window.device(), &mut encoder, model.visualizer.canvas().as_bytes());
    }

    let draw = app.draw();
    draw.background().color(BLACK);
    let rect = app.window_rect();
    draw.texture(model.surface.texture()).w_h(rect.w(), rect.h());

    if let Err(e) = draw.to_frame(app, &frame) {
        warn!(error = ?e, "failed to draw frame");
    }
}

fn resized(app: &App, model: &mut Model, _size: Vec2) {
    let window = app.main_window();
    let (width, height) = scaled_size(window.inner_size_pixels(), model.render_scale);

    match model.visualizer.resize(width, height) {
        Ok(()) => model.surface.resize(window.device(), [width, height]),
        Err(e) => warn!(error = %e, width, height, "resize rejected"),
    }
}

fn adjust_transition_speed(visualizer: &mut Visualizer, factor: f32) {
    let speed = (visualizer.transition_speed() * factor).clamp(MIN_TRANSITION_SPEED, 1.0);
    match visualizer.set_transition_speed(speed) {
        Ok(()) => info!(speed, "transition speed"),
        Err(e) => warn!(error = %e, "could not change transition speed"),
    }
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    let Some(action) = parse_key(key, app.keys.mods.shift()) else {
        return;
    };

    match action {
        Action::Quit => app.quit(),
        Action::Skip => {
            model.visualizer.skip();
            info!(from = model.visualizer.current_pattern().name(), "skipping");
        }
        Action::NextPattern => {
            let pattern = model.visualizer.current_pattern().next();
            model.visualizer.set_pattern(pattern);
            info!(pattern = pattern.name(), "pattern selected");
        }
        Action::PreviousPattern => {
            let pattern = model.visualizer.current_pattern().previous();
            model.visualizer.set_pattern(pattern);
            info!(pattern = pattern.name(), "pattern selected");
        }
        Action::FasterTransitions => adjust_transition_speed(&mut model.visualizer, TRANSITION_STEP),
        Action::SlowerTransitions => adjust_transition_speed(&mut model.visualizer, 1.0 / TRANSITION_STEP),
        Action::SelectDevice(index) => match model.source.select_device(index) {
            Some((name, true)) => info!(index, device = %name, "audio device active"),
            Some((name, false)) => warn!(index, device = %name, "audio device unavailable"),
            None => warn!(index, "no audio device at that index"),
        },
    }
}
