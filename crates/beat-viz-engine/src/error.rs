//! Error types for the engine.
//!
//! Only construction, resize, configuration parsing and tuning can fail. The per-frame
//! render path never returns an error.

/// Result alias carrying [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The raster surface could not be allocated for the requested size.
    #[error("cannot create a {width}x{height} drawing surface")]
    InvalidSurface { width: u32, height: u32 },

    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration text is not valid TOML for [`crate::EngineConfig`].
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EngineError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
