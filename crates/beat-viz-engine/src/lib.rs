//! Audio-reactive procedural visualization engine.
//!
//! Feed [`Visualizer::render`] a frequency-magnitude buffer once per frame and
//! it draws one of 22 generative patterns onto its RGBA [`Canvas`], touring
//! through them in a fixed order with eased cross-fades. Loudness shortens
//! the dwell time and speeds up the blend; it never changes the order.
//!
//! ```no_run
//! use beat_viz_engine::{EngineConfig, Visualizer};
//!
//! let mut viz = Visualizer::new(640, 360, EngineConfig::default())?;
//! let spectrum = [0u8; 1024];
//! viz.render(&spectrum, spectrum.len());
//! let _rgba: &[u8] = viz.canvas().as_bytes();
//! # Ok::<(), beat_viz_engine::EngineError>(())
//! ```

pub mod analysis;
pub mod canvas;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod patterns;
pub mod scheduler;

pub use analysis::FrequencyMetrics;
pub use canvas::Canvas;
pub use color::Rgba;
pub use config::EngineConfig;
pub use engine::Visualizer;
pub use error::{EngineError, Result};
pub use pattern::{Pattern, SEQUENCE};
pub use patterns::{FrameContext, PatternParams, PoolSizes};
pub use scheduler::{SchedulerEvent, SchedulerState};
