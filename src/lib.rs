//! Connected component labeling by single-pass contour tracing, with shape
//! descriptors computed from the traced contours and name-keyed filtering
//! over them.

pub mod blob;
pub mod blob_set;
pub mod detection;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod raster;
pub mod render;

pub use blob::{Blob, BlobSummary, DEFAULT_BOX_SIZES, Ellipse, FractalDimension};
pub use blob_set::{BlobSet, FILTER_EPSILON, MIN_FILTER_POINTS};
pub use detection::{ContourTracer, LabelBuffer, Polarity, TraceOutput, TracerConfig};
pub use error::BlobError;
pub use features::{
    BuiltinFeature, Feature, FeatureRegistry, ParamKind, ParamValue, ResolvedFeature, Signature,
};
pub use models::{BoundingBox, Calibration, Contour, Point, PointF};
pub use pipeline::{FilterPipeline, FilterStep};
pub use raster::{GrayRaster, Raster};
pub use render::{DrawOptions, Renderer};
