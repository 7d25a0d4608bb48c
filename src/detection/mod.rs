pub mod contours;
pub mod preprocessing;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blob::Blob;
use crate::error::{BlobError, Result};
use crate::models::Calibration;
use crate::raster::Raster;

pub use contours::{BACKGROUND_MARK, LabelBuffer, UNLABELED};

/// Which gray value is the background; the other extreme is the object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// Background 255, objects 0
    #[default]
    WhiteBackground,
    /// Background 0, objects 255
    BlackBackground,
}

impl Polarity {
    pub fn object(self) -> u8 {
        match self {
            Polarity::WhiteBackground => 0,
            Polarity::BlackBackground => 255,
        }
    }

    pub fn background(self) -> u8 {
        match self {
            Polarity::WhiteBackground => 255,
            Polarity::BlackBackground => 0,
        }
    }
}

/// Tracer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TracerConfig {
    pub polarity: Polarity,
    /// Trace every gray level above the minimum as its own mask instead of
    /// rejecting non-binary input
    pub multilevel: bool,
}

impl TracerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn with_multilevel(mut self, multilevel: bool) -> Self {
        self.multilevel = multilevel;
        self
    }
}

/// Blobs and labels of one tracing run
#[derive(Debug)]
pub struct TraceOutput {
    pub blobs: Vec<Blob>,
    pub labels: LabelBuffer,
}

/// Connected component labeling by contour tracing
#[derive(Debug, Clone, Default)]
pub struct ContourTracer {
    config: TracerConfig,
}

impl ContourTracer {
    pub fn new(config: TracerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Label every component of the raster and extract its contours
    pub fn trace<R: Raster + ?Sized>(&self, raster: &R) -> Result<TraceOutput> {
        let image = preprocessing::to_gray_image(raster);
        if image.width() == 0 || image.height() == 0 {
            return Err(BlobError::InvalidRaster(format!(
                "raster has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }
        let calibration = raster.calibration();
        let (object, background) = (self.config.polarity.object(), self.config.polarity.background());

        let levels = preprocessing::gray_levels(&image);
        if preprocessing::is_binary(&levels, object, background) {
            let (blobs, labels, _) = trace_mask(&image, object, background, 1, calibration);
            return Ok(TraceOutput { blobs, labels });
        }

        if !self.config.multilevel {
            return Err(BlobError::NotBinary {
                object,
                background,
                found: levels,
            });
        }

        // the lowest level is the background of every mask
        let mut labels = LabelBuffer::new(image.width(), image.height());
        let mut blobs = Vec::new();
        let mut next_label = 1;
        for &level in levels.iter().skip(1) {
            let mask = preprocessing::level_mask(&image, level);
            let (level_blobs, level_labels, after) = trace_mask(
                &mask,
                preprocessing::MASK_OBJECT,
                preprocessing::MASK_BACKGROUND,
                next_label,
                calibration,
            );
            debug!(level, blobs = level_blobs.len(), "traced gray level");
            labels.merge(&level_labels);
            blobs.extend(level_blobs);
            next_label = after;
        }

        Ok(TraceOutput { blobs, labels })
    }
}

/// Trace one binary image; returns the blobs, labels and the next free label
fn trace_mask(
    image: &GrayImage,
    object: u8,
    background: u8,
    first_label: i32,
    calibration: Calibration,
) -> (Vec<Blob>, LabelBuffer, i32) {
    let (width, height) = image.dimensions();
    let padded = preprocessing::touches_border(image, object);
    debug!(width, height, padded, "tracing mask");

    let (components, labels) = if padded {
        let framed = preprocessing::pad(image, background);
        let (components, labels) = contours::ComponentScanner::new(&framed, object).scan(first_label);
        (components, labels.strip_border())
    } else {
        contours::ComponentScanner::new(image, object).scan(first_label)
    };

    let offset = if padded { -1 } else { 0 };
    let next_label = components.last().map_or(first_label, |c| c.label + 1);
    let blobs = components
        .into_iter()
        .map(|component| {
            let mut outer = component.outer;
            outer.translate(offset, offset);
            let holes = component
                .holes
                .into_iter()
                .map(|mut hole| {
                    hole.translate(offset, offset);
                    hole
                })
                .collect();
            Blob::new(component.label, outer, calibration)
                .with_holes(holes)
                .with_frame(width, height)
        })
        .collect();

    (blobs, labels, next_label)
}
