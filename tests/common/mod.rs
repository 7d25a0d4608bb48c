mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from blobtrace for tests
pub use blobtrace::{
    Blob, BlobError, BlobSet, BuiltinFeature, Calibration, Contour, Feature, FeatureRegistry,
    GrayRaster, LabelBuffer, ParamKind, ParamValue, Point, Polarity, Signature, TracerConfig,
};
