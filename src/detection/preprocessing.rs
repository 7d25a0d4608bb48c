use image::{GrayImage, Luma, imageops};

use crate::raster::Raster;

/// Value of object pixels in the per-level masks of multi-level tracing
pub const MASK_OBJECT: u8 = 255;
/// Value of background pixels in the per-level masks of multi-level tracing
pub const MASK_BACKGROUND: u8 = 0;

/// Copy a raster into a working image the tracer may pad and scan
pub fn to_gray_image<R: Raster + ?Sized>(raster: &R) -> GrayImage {
    GrayImage::from_fn(raster.width(), raster.height(), |x, y| {
        Luma([raster.get(x, y)])
    })
}

/// Distinct gray values present in the image, ascending
pub fn gray_levels(img: &GrayImage) -> Vec<u8> {
    let mut seen = [false; 256];
    for p in img.pixels() {
        seen[p[0] as usize] = true;
    }
    (0..=255u8).filter(|v| seen[*v as usize]).collect()
}

/// True when every present level is either the object or the background value
pub fn is_binary(levels: &[u8], object: u8, background: u8) -> bool {
    levels.iter().all(|v| *v == object || *v == background)
}

/// True when an object pixel lies on the first/last row or column
pub fn touches_border(img: &GrayImage, object: u8) -> bool {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return false;
    }
    let is_object = |x: u32, y: u32| img.get_pixel(x, y)[0] == object;
    (0..w).any(|x| is_object(x, 0) || is_object(x, h - 1))
        || (0..h).any(|y| is_object(0, y) || is_object(w - 1, y))
}

/// Surround the image with a one pixel background frame
pub fn pad(img: &GrayImage, background: u8) -> GrayImage {
    let (w, h) = img.dimensions();
    let mut padded = GrayImage::from_pixel(w + 2, h + 2, Luma([background]));
    imageops::replace(&mut padded, img, 1, 1);
    padded
}

/// Binary mask of one gray level: object where the pixel equals `level`
pub fn level_mask(img: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] == level {
            Luma([MASK_OBJECT])
        } else {
            Luma([MASK_BACKGROUND])
        }
    })
}
