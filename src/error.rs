//! Error type for the generation pipeline.
//!
//! Structural problems (bad parameters, unknown generator, malformed step
//! data) are fatal and abort the run; checkpoint I/O failures are handled
//! at the call site by degrading to a cold start.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("can't read parameters file '{path}': {source}")]
    ParametersIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid parameters file '{path}': {source}")]
    ParametersFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unknown heightmap generator '{0}'")]
    UnknownGenerator(String),

    #[error("invalid heightmap generator parameters: {0}")]
    GeneratorParams(serde_json::Error),

    #[error("step {step} produced malformed map data: {reason}")]
    StepData { step: u32, reason: String },

    #[error("image data must have 1 or 3 channels, got {0}")]
    ImageChannels(usize),

    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
