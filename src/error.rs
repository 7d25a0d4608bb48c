use thiserror::Error;

/// Errors raised while loading rasters, tracing blobs or evaluating features.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BlobError {
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    #[error("raster is not binary: expected only values {object} and {background}, found {found:?}")]
    NotBinary {
        object: u8,
        background: u8,
        found: Vec<u8>,
    },

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("not initialized: {0}")]
    Uninitialized(&'static str),

    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    #[error("feature {feature} expects {expected}, got {found}")]
    ArgumentMismatch {
        feature: String,
        expected: String,
        found: String,
    },

    #[error("feature already registered: {0}")]
    DuplicateFeature(String),

    #[error("feature {feature} failed: {message}")]
    FeatureFailed { feature: String, message: String },
}

pub type Result<T> = std::result::Result<T, BlobError>;
