#![allow(dead_code)]

use blobtrace::{BlobSet, Point};
use image::{GrayImage, Luma};
use tempfile::NamedTempFile;

/// Default polarity: black objects on white
pub const BACKGROUND: u8 = 255;
pub const OBJECT: u8 = 0;

/// White image of the given size
pub fn blank(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([BACKGROUND]))
}

/// Fill `[x0, x1) x [y0, y1)` with `value`
pub fn paint_rect(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, value: u8) {
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, Luma([value]));
        }
    }
}

/// Object pixels with `(x-cx)² + (y-cy)² <= r²`
pub fn paint_disk(img: &mut GrayImage, cx: i64, cy: i64, r: i64) {
    let (w, h) = img.dimensions();
    for y in 0..h {
        for x in 0..w {
            let (dx, dy) = (x as i64 - cx, y as i64 - cy);
            if dx * dx + dy * dy <= r * r {
                img.put_pixel(x, y, Luma([OBJECT]));
            }
        }
    }
}

/// Disk of radius `r` centred in a 100x100 image
pub fn disk(r: i64) -> GrayImage {
    let mut img = blank(100, 100);
    paint_disk(&mut img, 50, 50, r);
    img
}

/// 100x100 square at (10,10) with a concentric 30x30 hole, in a 120x120 image
pub fn square_with_hole() -> GrayImage {
    let mut img = blank(120, 120);
    paint_rect(&mut img, 10, 10, 110, 110, OBJECT);
    paint_rect(&mut img, 45, 45, 75, 75, BACKGROUND);
    img
}

/// 50x50 square with four 18x18 holes, each holding a 10x10 square
pub fn nested_squares() -> GrayImage {
    let mut img = blank(60, 60);
    paint_rect(&mut img, 5, 5, 55, 55, OBJECT);
    for (ox, oy) in [(10, 10), (32, 10), (10, 32), (32, 32)] {
        paint_rect(&mut img, ox, oy, ox + 18, oy + 18, BACKGROUND);
        paint_rect(&mut img, ox + 4, oy + 4, ox + 14, oy + 14, OBJECT);
    }
    img
}

/// Two blobs touching the image border: the top-left corner and the bottom edge
pub fn border_blobs() -> GrayImage {
    let mut img = blank(20, 20);
    paint_rect(&mut img, 0, 0, 5, 5, OBJECT);
    paint_rect(&mut img, 12, 15, 20, 20, OBJECT);
    img
}

/// Two 20x20 squares and one 30x30 square
pub fn three_squares() -> GrayImage {
    let mut img = blank(100, 50);
    paint_rect(&mut img, 5, 5, 25, 25, OBJECT);
    paint_rect(&mut img, 35, 5, 55, 25, OBJECT);
    paint_rect(&mut img, 65, 5, 95, 35, OBJECT);
    img
}

/// A bar (label 1), a disk (label 2) and an L shape (label 3)
pub fn mixed_shapes() -> GrayImage {
    let mut img = blank(120, 60);
    paint_disk(&mut img, 20, 30, 12);
    paint_rect(&mut img, 40, 10, 100, 16, OBJECT);
    paint_rect(&mut img, 40, 30, 50, 55, OBJECT);
    paint_rect(&mut img, 50, 45, 80, 55, OBJECT);
    img
}

/// 40x10 axis-aligned rectangle at (10,10)
pub fn bar() -> GrayImage {
    let mut img = blank(70, 40);
    paint_rect(&mut img, 10, 10, 50, 20, OBJECT);
    img
}

/// Two-lobed shape whose traced outer contour is known point for point
pub fn reference_shape() -> GrayImage {
    let mut img = blank(14, 8);
    for x in [3, 4, 8, 9] {
        img.put_pixel(x, 1, Luma([OBJECT]));
        img.put_pixel(x, 5, Luma([OBJECT]));
    }
    paint_rect(&mut img, 2, 2, 12, 5, OBJECT);
    img
}

pub fn reference_contour() -> Vec<Point> {
    let xs = [3, 4, 5, 6, 7, 8, 9, 10, 11, 11, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 2, 2, 3];
    let ys = [1, 1, 2, 2, 2, 1, 1, 2, 2, 3, 4, 4, 5, 5, 4, 4, 4, 5, 5, 4, 3, 2, 1];
    xs.iter().zip(ys.iter()).map(|(x, y)| Point::new(*x, *y)).collect()
}

/// Trace an image with the default settings
pub fn traced(img: &GrayImage) -> anyhow::Result<BlobSet> {
    let mut blobs = BlobSet::new(img);
    blobs.find_connected_components()?;
    Ok(blobs)
}

/// Saves an image as PNG into a temp file that is removed when dropped
pub fn save_png(img: &GrayImage) -> anyhow::Result<NamedTempFile> {
    let file = tempfile::Builder::new().suffix(".png").tempfile()?;
    img.save_with_format(file.path(), image::ImageFormat::Png)?;
    Ok(file)
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
