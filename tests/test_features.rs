//! Feature engine tests
//!
//! Covers:
//! - Perimeter, area and derived ratios on a digitised disk
//! - Calibration of lengths and areas
//! - Convex hull, bounding rectangle and Feret diameters
//! - Moments, orientation and the inscribed circle
//! - Degenerate blobs (single pixel, one-pixel-wide line)
//! - Caching and concurrent evaluation

mod common;
use common::*;

use std::f64::consts::PI;
use std::sync::Arc;
use std::thread;

use blobtrace::DEFAULT_BOX_SIZES;

fn single_blob(img: &image::GrayImage) -> anyhow::Result<Arc<Blob>> {
    let blobs = traced(img)?;
    assert_eq!(blobs.len(), 1);
    Ok(Arc::clone(&blobs.blobs()[0]))
}

#[test]
fn test_disk_shape_descriptors() -> anyhow::Result<()> {
    let r = 30.0;
    let blob = single_blob(&disk(30))?;

    assert_close(blob.perimeter(), 2.0 * PI * r, 0.02 * 2.0 * PI * r);
    assert_close(blob.perimeter(), 187.488, 1e-6);
    assert_close(blob.enclosed_area(), PI * r * r, 10.0);
    assert_eq!(blob.enclosed_area(), 2821.0);
    assert_close(blob.circularity(), 4.0 * PI, 0.5);
    assert_close(blob.thinness_ratio(), 1.0, 0.01);
    assert_close(blob.area_to_perimeter_ratio(), 2821.0 / 187.488, 1e-6);

    // The traced disk is convex
    assert_eq!(blob.convexity(), 1.0);
    assert_close(blob.perimeter_convex_hull(), 187.75, 0.01);
    assert_eq!(blob.area_convex_hull(), 2877.0);
    assert_close(blob.solidity(), 2821.0 / 2877.0, 1e-9);

    let cog = blob.center_of_gravity();
    assert_close(cog.x, 50.0, 1e-6);
    assert_close(cog.y, 50.0, 1e-6);

    assert_close(blob.feret_diameter(), 60.0, 1e-9);
    assert_close(blob.min_feret_diameter(), 59.397, 1e-3);
    assert_close(blob.diameter_maximum_inscribed_circle(), 60.0, 0.1);

    let ellipse = blob.ellipse().unwrap();
    assert_close(ellipse.major, 60.0, 0.2);
    assert_close(blob.elongation(), 0.0, 0.05);

    Ok(())
}

#[test]
fn test_larger_disk_scales() -> anyhow::Result<()> {
    let small = single_blob(&disk(30))?;
    let large = single_blob(&disk(40))?;

    assert_eq!(large.enclosed_area(), 5025.0);
    assert_close(large.perimeter(), 249.98, 0.01);
    assert!(large.enclosed_area() > small.enclosed_area());
    assert_close(large.circularity(), small.circularity(), 0.2);

    Ok(())
}

#[test]
fn test_square_with_hole_descriptors() -> anyhow::Result<()> {
    let blob = single_blob(&square_with_hole())?;

    assert_eq!(blob.number_of_holes(), 1);
    assert_eq!(blob.enclosed_area(), 9100.0);
    assert_close(blob.perimeter(), 375.408, 1e-6);
    // Hull of a 100 pixel square runs through the corner pixel centres
    assert_close(blob.perimeter_convex_hull(), 4.0 * 100.0 - 4.0, 1e-9);
    assert_eq!(blob.area_convex_hull(), 10000.0);
    assert_close(blob.solidity(), 0.91, 1e-9);

    Ok(())
}

#[test]
fn test_rectangle_bounding_box_and_feret() -> anyhow::Result<()> {
    let blob = single_blob(&bar())?;

    assert_eq!(blob.enclosed_area(), 400.0);
    assert_close(blob.perimeter(), 91.008, 1e-6);
    assert_close(blob.long_side_mbr(), 39.0, 1e-9);
    assert_close(blob.short_side_mbr(), 9.0, 1e-9);
    assert_close(blob.aspect_ratio(), 39.0 / 9.0, 1e-9);
    assert_close(blob.feret_diameter(), (39.0f64 * 39.0 + 81.0).sqrt(), 1e-9);
    assert_close(blob.min_feret_diameter(), 9.0, 1e-9);

    let cog = blob.center_of_gravity();
    assert_close(cog.x, 29.5, 1e-9);
    assert_close(cog.y, 14.5, 1e-9);

    // Horizontal bar
    assert_close(blob.orientation_major_axis(), 0.0, 1e-9);
    assert_close(blob.orientation_minor_axis(), -90.0, 1e-9);
    assert!(blob.eigenvalue_major_axis() > blob.eigenvalue_minor_axis());
    assert!(blob.elongation() > 0.5);

    let bounds = blob.bounds().unwrap();
    assert_eq!((bounds.x, bounds.y, bounds.width, bounds.height), (10, 10, 40, 10));

    Ok(())
}

#[test]
fn test_vertical_bar_orientation() -> anyhow::Result<()> {
    let mut img = blank(40, 70);
    paint_rect(&mut img, 10, 10, 20, 50, OBJECT);
    let blob = single_blob(&img)?;

    assert_close(blob.orientation_major_axis(), 90.0, 1e-9);
    assert_close(blob.orientation_minor_axis(), 0.0, 1e-9);

    Ok(())
}

#[test]
fn test_moments() -> anyhow::Result<()> {
    let blob = single_blob(&disk(30))?;

    assert_eq!(blob.moment(0, 0), 2821.0);
    assert_close(blob.moment(1, 0) / blob.moment(0, 0), 50.0, 1e-9);
    assert_close(blob.moment(0, 1) / blob.moment(0, 0), 50.0, 1e-9);
    assert_eq!(blob.central_moment(1, 0), 0.0);
    assert_eq!(blob.central_moment(0, 0), blob.moment(0, 0));
    // Symmetric disk: odd central moments vanish
    assert_close(blob.central_moment(1, 1), 0.0, 1e-6);
    assert_close(blob.central_moment(3, 0), 0.0, 1e-6);
    assert_close(blob.eigenvalue_major_axis(), blob.eigenvalue_minor_axis(), 1e-6);

    // Moments beyond the cached orders are still computed
    assert!(blob.moment(3, 0) > 0.0);

    Ok(())
}

#[test]
fn test_calibration_scales_features() -> anyhow::Result<()> {
    let plain = single_blob(&disk(30))?;

    let raster = GrayRaster::new(disk(30)).with_calibration(Calibration::new(0.5, 0.5));
    let mut blobs = BlobSet::new(&raster);
    blobs.find_connected_components()?;
    let blob = &blobs.blobs()[0];

    assert_eq!(blob.calibration(), Calibration::new(0.5, 0.5));
    assert_close(blob.perimeter(), plain.perimeter() * 0.5, 1e-9);
    assert_close(blob.enclosed_area(), plain.enclosed_area() * 0.25, 1e-9);
    assert_close(blob.circularity(), plain.circularity(), 1e-9);
    assert_close(blob.feret_diameter(), 30.0, 1e-9);
    assert_close(blob.diameter_maximum_inscribed_circle(), plain.diameter_maximum_inscribed_circle() * 0.5, 1e-9);
    assert_close(blob.center_of_gravity().x, 25.0, 1e-6);
    // Zeroth moment counts pixels; higher orders use calibrated coordinates
    assert_eq!(blob.moment(0, 0), 2821.0);
    assert_close(blob.moment(1, 0), plain.moment(1, 0) * 0.5, 1e-6);
    assert_close(blob.moment(2, 0), plain.moment(2, 0) * 0.25, 1e-6);

    // Anisotropic pixels stretch only one axis
    let wide = plain.recalibrated(Calibration::new(2.0, 1.0));
    assert_close(wide.enclosed_area(), 2.0 * 2821.0, 1e-9);
    assert_close(wide.feret_diameter(), 120.0, 1e-9);
    assert_close(wide.center_of_gravity().x, 100.0, 1e-6);

    // Origin shifts calibrated coordinates
    let shifted = plain.recalibrated(Calibration::default().with_origin(10.0, 20.0));
    assert_close(shifted.center_of_gravity().x, 40.0, 1e-6);
    assert_close(shifted.center_of_gravity().y, 30.0, 1e-6);

    Ok(())
}

#[test]
fn test_single_pixel_blob() -> anyhow::Result<()> {
    let mut img = blank(9, 9);
    img.put_pixel(4, 6, image::Luma([OBJECT]));
    let blob = single_blob(&img)?;

    assert_eq!(blob.outer_contour().len(), 1);
    assert_eq!(blob.perimeter(), 1.0);
    assert_eq!(blob.enclosed_area(), 1.0);
    let cog = blob.center_of_gravity();
    assert_eq!((cog.x, cog.y), (4.0, 6.0));
    assert!(blob.chain_code().is_empty());

    // Hull falls back to the contour itself, no rectangle exists
    assert_eq!(blob.convex_hull(), blob.outer_contour());
    assert!(blob.min_bounding_rectangle().is_none());
    assert!(blob.long_side_mbr().is_nan());
    assert_eq!(blob.feret_diameter(), 0.0);

    Ok(())
}

#[test]
fn test_line_blob() -> anyhow::Result<()> {
    let mut img = blank(20, 10);
    paint_rect(&mut img, 3, 4, 13, 5, OBJECT);
    let blob = single_blob(&img)?;

    // The contour runs out and back along the line
    assert_eq!(blob.outer_contour().len(), 19);
    assert_eq!(blob.enclosed_area(), 10.0);
    assert_close(blob.perimeter(), 18.0 * 0.948, 1e-9);

    let cog = blob.center_of_gravity();
    assert_close(cog.y, 4.0, 1e-9);
    assert!(cog.x > 3.0 && cog.x < 12.0);

    assert_eq!(blob.convex_hull(), blob.outer_contour());
    assert_close(blob.perimeter_convex_hull(), 18.0, 1e-9);
    assert_eq!(blob.feret_diameter(), 9.0);
    assert_eq!(blob.min_feret_diameter(), 0.0);
    assert!(blob.aspect_ratio().is_nan());

    Ok(())
}

#[test]
fn test_chain_code_of_reference_shape() -> anyhow::Result<()> {
    let blob = single_blob(&reference_shape())?;
    let code = blob.chain_code();

    assert_eq!(code.len(), reference_contour().len() - 1);
    // East, then down-right into the valley
    assert_eq!(&code[..3], &[0, 7, 0]);
    let even = code.iter().filter(|c| *c % 2 == 0).count() as f64;
    let odd = code.len() as f64 - even;
    assert_close(blob.perimeter(), even * 0.948 + odd * 1.340, 1e-9);

    Ok(())
}

#[test]
fn test_fractal_dimension() -> anyhow::Result<()> {
    let blob = single_blob(&disk(30))?;

    let fd = blob.fractal_box_dimension(&DEFAULT_BOX_SIZES);
    assert!(fd.dimension > 0.9 && fd.dimension < 1.3, "dimension {}", fd.dimension);
    assert!(fd.goodness > 0.95, "goodness {}", fd.goodness);

    // Same sizes in another order hit the same cache entry
    let again = blob.fractal_box_dimension(&[64, 32, 16, 12, 8, 6, 4, 3, 2]);
    assert_eq!(fd, again);

    // A single usable size cannot be fitted
    let single = blob.fractal_box_dimension(&[2]);
    assert!(single.dimension.is_nan());

    Ok(())
}

#[test]
fn test_features_are_cached() -> anyhow::Result<()> {
    let blob = single_blob(&disk(30))?;

    assert_eq!(blob.cached(BuiltinFeature::Perimeter), None);
    assert_eq!(blob.cached(BuiltinFeature::Circularity), None);

    let perimeter = blob.perimeter();
    assert_eq!(blob.cached(BuiltinFeature::Perimeter), Some(perimeter));
    assert_eq!(blob.cached(BuiltinFeature::Circularity), None);

    let circularity = blob.circularity();
    assert_eq!(blob.cached(BuiltinFeature::EnclosedArea), Some(2821.0));
    assert_eq!(blob.cached(BuiltinFeature::Circularity), Some(circularity));
    assert_eq!(blob.cached(BuiltinFeature::NumberOfHoles), Some(0.0));

    // A recalibrated copy starts empty
    let copy = blob.recalibrated(Calibration::new(2.0, 2.0));
    assert_eq!(copy.cached(BuiltinFeature::Perimeter), None);

    Ok(())
}

#[test]
fn test_concurrent_feature_evaluation() -> anyhow::Result<()> {
    let blob = single_blob(&square_with_hole())?;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let blob = Arc::clone(&blob);
            thread::spawn(move || (blob.enclosed_area(), blob.perimeter(), blob.solidity()))
        })
        .collect();

    for handle in handles {
        let (area, perimeter, solidity) = handle.join().expect("worker panicked");
        assert_eq!(area, 9100.0);
        assert_close(perimeter, 375.408, 1e-6);
        assert_close(solidity, 0.91, 1e-9);
    }

    Ok(())
}

#[test]
fn test_synthetic_blob_from_contour() {
    let square = Contour::new(vec![
        Point::new(0, 0),
        Point::new(4, 0),
        Point::new(4, 4),
        Point::new(0, 4),
    ]);
    let blob = Blob::new(blobtrace::blob::SYNTHETIC_LABEL, square, Calibration::default());

    assert_eq!(blob.label(), -1);
    assert_eq!(blob.enclosed_area(), 25.0);
    assert!(!blob.is_on_edge());
    assert_close(blob.perimeter_convex_hull(), 16.0, 1e-9);
}
