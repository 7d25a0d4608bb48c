use serde::Serialize;

use super::mask::Mask;
use crate::models::{Calibration, PointF};

/// Variance of a unit pixel along one axis
const PIXEL_VARIANCE: f64 = 1.0 / 12.0;

/// Ellipse with the same second moments as a region.
///
/// Axes are full lengths in pixels; `angle` is in degrees, counter-clockwise
/// from +x as seen on screen, in `[0, 180)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ellipse {
    pub major: f64,
    pub minor: f64,
    pub angle: f64,
    pub center: PointF,
}

/// Sum of `x^p * y^q` over the region pixels, in calibrated coordinates
pub(crate) fn raw_moment(mask: &Mask, calibration: &Calibration, p: u32, q: u32) -> f64 {
    mask.pixels()
        .map(|pt| {
            calibration.x(pt.x as f64).powi(p as i32) * calibration.y(pt.y as f64).powi(q as i32)
        })
        .sum()
}

/// Central moment by direct summation around a calibrated centroid
pub(crate) fn summed_central_moment(
    mask: &Mask,
    calibration: &Calibration,
    p: u32,
    q: u32,
    centroid: PointF,
) -> f64 {
    mask.pixels()
        .map(|pt| {
            (calibration.x(pt.x as f64) - centroid.x).powi(p as i32)
                * (calibration.y(pt.y as f64) - centroid.y).powi(q as i32)
        })
        .sum()
}

/// Central moments of order up to two expressed through raw moments
pub(crate) fn central_from_raw(p: u32, q: u32, moment: impl Fn(u32, u32) -> f64) -> Option<f64> {
    let m00 = moment(0, 0);
    match (p, q) {
        (0, 0) => Some(m00),
        (1, 0) | (0, 1) => Some(0.0),
        (1, 1) => Some(moment(1, 1) - moment(0, 1) / m00 * moment(1, 0)),
        (2, 0) => Some(moment(2, 0) - moment(1, 0) / m00 * moment(1, 0)),
        (0, 2) => Some(moment(0, 2) - moment(0, 1) / m00 * moment(0, 1)),
        _ => None,
    }
}

/// Eigenvalues `(major, minor)` of the covariance matrix `[[c20, c11], [c11, c02]]`
pub(crate) fn principal_values(c20: f64, c02: f64, c11: f64) -> (f64, f64) {
    let mean = 0.5 * (c20 + c02);
    let spread = 0.5 * (4.0 * c11 * c11 + (c20 - c02).powi(2)).sqrt();
    (mean + spread, mean - spread)
}

/// Fit an ellipse to the region pixels; `None` for an empty region
pub(crate) fn fit_ellipse(mask: &Mask) -> Option<Ellipse> {
    let (mut n, mut sx, mut sy) = (0usize, 0.0, 0.0);
    for p in mask.pixels() {
        n += 1;
        sx += p.x as f64;
        sy += p.y as f64;
    }
    if n == 0 {
        return None;
    }
    let (xm, ym) = (sx / n as f64, sy / n as f64);

    let (mut u20, mut u02, mut u11) = (0.0, 0.0, 0.0);
    for p in mask.pixels() {
        let (dx, dy) = (p.x as f64 - xm, p.y as f64 - ym);
        u20 += dx * dx;
        u02 += dy * dy;
        u11 += dx * dy;
    }
    let u20 = u20 / n as f64 + PIXEL_VARIANCE;
    let u02 = u02 / n as f64 + PIXEL_VARIANCE;
    let u11 = u11 / n as f64;

    let (l1, l2) = principal_values(u20, u02, u11);
    // y grows downwards, so the screen angle flips the sign of the covariance
    let mut angle = (0.5 * (-2.0 * u11).atan2(u20 - u02)).to_degrees();
    if angle < 0.0 {
        angle += 180.0;
    }
    if angle >= 180.0 {
        angle -= 180.0;
    }

    Some(Ellipse {
        major: 4.0 * l1.max(0.0).sqrt(),
        minor: 4.0 * l2.max(0.0).sqrt(),
        angle,
        center: PointF::new(xm, ym),
    })
}
