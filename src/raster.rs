use std::path::Path;

use image::{DynamicImage, GrayImage, ImageReader, Luma};

use crate::error::{BlobError, Result};
use crate::models::Calibration;

/// An 8-bit single-channel pixel grid the tracer can read.
pub trait Raster {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn get(&self, x: u32, y: u32) -> u8;
    fn set(&mut self, x: u32, y: u32, value: u8);

    fn calibration(&self) -> Calibration {
        Calibration::default()
    }
}

impl Raster for GrayImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn get(&self, x: u32, y: u32) -> u8 {
        self.get_pixel(x, y)[0]
    }

    fn set(&mut self, x: u32, y: u32, value: u8) {
        self.put_pixel(x, y, Luma([value]));
    }
}

/// A grayscale image carrying its pixel calibration
#[derive(Debug, Clone, PartialEq)]
pub struct GrayRaster {
    image: GrayImage,
    calibration: Calibration,
}

impl GrayRaster {
    pub fn new(image: GrayImage) -> Self {
        Self {
            image,
            calibration: Calibration::default(),
        }
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    /// Accepts only 8-bit single-channel images; no implicit conversion
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageLuma8(gray) => Ok(Self::new(gray)),
            other => Err(BlobError::InvalidRaster(format!(
                "expected an 8-bit single-channel image, got {:?}",
                other.color()
            ))),
        }
    }

    /// Copies any raster into an owned grid
    pub fn from_raster<R: Raster + ?Sized>(raster: &R) -> Self {
        let image = GrayImage::from_fn(raster.width(), raster.height(), |x, y| {
            Luma([raster.get(x, y)])
        });
        Self {
            image,
            calibration: raster.calibration(),
        }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}

impl From<GrayImage> for GrayRaster {
    fn from(image: GrayImage) -> Self {
        Self::new(image)
    }
}

impl Raster for GrayRaster {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn get(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel(x, y)[0]
    }

    fn set(&mut self, x: u32, y: u32, value: u8) {
        self.image.put_pixel(x, y, Luma([value]));
    }

    fn calibration(&self) -> Calibration {
        self.calibration
    }
}

/// Decode an image file into a raster
pub fn load(path: impl AsRef<Path>) -> Result<GrayRaster> {
    let path = path.as_ref();
    let image = ImageReader::open(path)
        .map_err(|e| BlobError::ImageLoad(format!("{}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| BlobError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    GrayRaster::from_dynamic(image)
}
