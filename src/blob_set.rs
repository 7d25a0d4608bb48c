use std::sync::Arc;

use image::{DynamicImage, RgbImage};
use tracing::{debug, info};

use crate::blob::Blob;
use crate::detection::{ContourTracer, LabelBuffer, Polarity, TracerConfig};
use crate::error::{BlobError, Result};
use crate::features::{Feature, FeatureRegistry, ParamValue};
use crate::models::Point;
use crate::raster::{GrayRaster, Raster};
use crate::render::{self, DrawOptions};

/// Values this close to a filter bound count as inside it
pub const FILTER_EPSILON: f64 = 1e-4;
/// Outer contours with fewer points are skipped by feature filters
pub const MIN_FILTER_POINTS: usize = 4;

/// The blobs of one raster, in label order, with their label image.
///
/// Filtering returns a new set that shares the `Blob` instances and the
/// feature registry with this one.
#[derive(Debug, Clone)]
pub struct BlobSet {
    blobs: Vec<Arc<Blob>>,
    raster: Option<Arc<GrayRaster>>,
    labels: Option<LabelBuffer>,
    config: TracerConfig,
    registry: Arc<FeatureRegistry>,
}

impl Default for BlobSet {
    fn default() -> Self {
        Self {
            blobs: Vec::new(),
            raster: None,
            labels: None,
            config: TracerConfig::default(),
            registry: Arc::new(FeatureRegistry::new()),
        }
    }
}

impl BlobSet {
    /// Blob set over a copy of the raster, with its own feature registry
    pub fn new<R: Raster + ?Sized>(raster: &R) -> Self {
        Self::with_registry(raster, Arc::new(FeatureRegistry::new()))
    }

    /// Blob set sharing an existing feature registry
    pub fn with_registry<R: Raster + ?Sized>(raster: &R, registry: Arc<FeatureRegistry>) -> Self {
        Self {
            raster: Some(Arc::new(GrayRaster::from_raster(raster))),
            registry,
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: TracerConfig) -> Self {
        self.config = config;
        self
    }

    /// Choose which gray value is background for the next tracing run
    pub fn set_background(&mut self, polarity: Polarity) {
        self.config.polarity = polarity;
    }

    pub fn set_multilevel(&mut self, multilevel: bool) {
        self.config.multilevel = multilevel;
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn raster(&self) -> Option<&GrayRaster> {
        self.raster.as_deref()
    }

    pub fn registry(&self) -> &Arc<FeatureRegistry> {
        &self.registry
    }

    /// Trace the raster, replacing any previous result
    pub fn find_connected_components(&mut self) -> Result<()> {
        let raster = self
            .raster
            .as_ref()
            .ok_or(BlobError::Uninitialized("no input raster"))?;
        let output = ContourTracer::new(self.config).trace(raster.as_ref())?;
        info!(
            blobs = output.blobs.len(),
            width = raster.width(),
            height = raster.height(),
            "found connected components"
        );
        self.blobs = output.blobs.into_iter().map(Arc::new).collect();
        self.labels = Some(output.labels);
        Ok(())
    }

    /// Label image of the last tracing run, or of the filtered blobs
    pub fn labeled_image(&self) -> Result<&LabelBuffer> {
        self.labels
            .as_ref()
            .ok_or(BlobError::Uninitialized("connected components have not been traced"))
    }

    /// Label image with one color per blob
    pub fn labeled_rgb(&self) -> Result<RgbImage> {
        Ok(render::colorize_labels(self.labeled_image()?))
    }

    /// The source raster with every blob drawn over it
    pub fn overlay(&self, options: &DrawOptions) -> Result<RgbImage> {
        let raster = self
            .raster
            .as_ref()
            .ok_or(BlobError::Uninitialized("no input raster"))?;
        let mut canvas = DynamicImage::ImageLuma8(raster.image().clone()).to_rgb8();
        for blob in &self.blobs {
            blob.draw(&mut canvas, options, render::label_color(blob.label()));
        }
        Ok(canvas)
    }

    pub fn blobs(&self) -> &[Arc<Blob>] {
        &self.blobs
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Blob>> {
        self.blobs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Blob>> {
        self.blobs.iter()
    }

    /// First blob whose outer contour contains the point, boundary included
    pub fn blob_at(&self, x: i32, y: i32) -> Option<&Arc<Blob>> {
        let p = Point::new(x, y);
        self.blobs.iter().find(|b| b.contains(p))
    }

    pub fn blob_by_label(&self, label: i32) -> Option<&Arc<Blob>> {
        self.blobs.iter().find(|b| b.label() == label)
    }

    /// Register a custom feature in the shared registry
    pub fn add_custom_feature(&self, feature: Arc<dyn Feature>) -> Result<()> {
        self.registry.register(feature)
    }

    /// Evaluate a feature by name on one blob
    pub fn evaluate(&self, blob: &Blob, name: &str, params: &[ParamValue]) -> Result<f64> {
        self.registry.evaluate(blob, name, params)
    }

    /// Keep the blobs whose feature value lies in `[lower, upper]`.
    ///
    /// NaN values are kept, as are values within [`FILTER_EPSILON`] of a bound.
    /// An infinite `upper` keeps everything from `lower` up. Blobs with fewer
    /// than [`MIN_FILTER_POINTS`] contour points are dropped.
    pub fn filter(&self, lower: f64, upper: f64, name: &str, params: &[ParamValue]) -> Result<BlobSet> {
        let labels = self.labeled_image()?;
        let feature = self.registry.resolve(name)?;
        feature.signature().check(feature.name(), params)?;

        let mut kept = Vec::new();
        for blob in &self.blobs {
            if blob.outer_contour().len() < MIN_FILTER_POINTS {
                debug!(label = blob.label(), "degenerate contour skipped by filter");
                continue;
            }
            let value = feature.evaluate(blob, params)?;
            if within_bounds(value, lower, upper) {
                kept.push(Arc::clone(blob));
            }
        }

        info!(
            feature = name,
            lower,
            upper,
            kept = kept.len(),
            total = self.blobs.len(),
            "filtered blobs"
        );
        let labels = paint_labels(&kept, labels.width(), labels.height());
        Ok(BlobSet {
            blobs: kept,
            raster: self.raster.clone(),
            labels: Some(labels),
            config: self.config,
            registry: Arc::clone(&self.registry),
        })
    }

    /// Keep the blobs whose feature value is at least `lower`
    pub fn filter_min(&self, lower: f64, name: &str, params: &[ParamValue]) -> Result<BlobSet> {
        self.filter(lower, f64::INFINITY, name, params)
    }
}

impl<'a> IntoIterator for &'a BlobSet {
    type Item = &'a Arc<Blob>;
    type IntoIter = std::slice::Iter<'a, Arc<Blob>>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.iter()
    }
}

pub(crate) fn within_bounds(value: f64, lower: f64, upper: f64) -> bool {
    if value.is_nan() {
        return true;
    }
    let near = |bound: f64| (bound - value).abs() < FILTER_EPSILON;
    if upper == f64::INFINITY {
        return value >= lower || near(lower);
    }
    (value >= lower && value <= upper) || near(lower) || near(upper)
}

/// Label image painted from the blob regions
fn paint_labels(blobs: &[Arc<Blob>], width: u32, height: u32) -> LabelBuffer {
    let mut labels = LabelBuffer::new(width, height);
    for blob in blobs {
        for p in blob.pixels() {
            labels.set(p.x, p.y, blob.label());
        }
    }
    labels
}
