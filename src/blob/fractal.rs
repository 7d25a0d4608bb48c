use std::collections::HashSet;

use serde::Serialize;

use super::mask::Mask;
use crate::models::BoundingBox;

/// Box sizes used when the caller does not pass any
pub const DEFAULT_BOX_SIZES: [u32; 9] = [2, 3, 4, 6, 8, 12, 16, 32, 64];

/// Box-counting estimate and the R² of its regression
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FractalDimension {
    pub dimension: f64,
    pub goodness: f64,
}

impl FractalDimension {
    const UNDEFINED: Self = Self {
        dimension: f64::NAN,
        goodness: f64::NAN,
    };
}

/// Sizes that fit into the contour extent, ascending without repeats
pub(crate) fn usable_sizes(sizes: &[u32], bounds: BoundingBox) -> Vec<u32> {
    let extent = bounds.width.max(bounds.height);
    let mut usable: Vec<u32> = sizes
        .iter()
        .copied()
        .filter(|s| *s >= 1 && *s <= extent)
        .collect();
    usable.sort_unstable();
    usable.dedup();
    usable
}

/// Box counting over the outline pixels on a grid anchored at the bounds origin.
///
/// The dimension is the slope of log(count) against log(1/size).
pub(crate) fn box_count(outline: &Mask, bounds: BoundingBox, sizes: &[u32]) -> FractalDimension {
    if sizes.len() < 2 {
        return FractalDimension::UNDEFINED;
    }

    let samples: Vec<(f64, f64)> = sizes
        .iter()
        .map(|&size| {
            let size = size as i32;
            let boxes: HashSet<(i32, i32)> = outline
                .pixels()
                .map(|p| ((p.x - bounds.x) / size, (p.y - bounds.y) / size))
                .collect();
            ((1.0 / size as f64).ln(), (boxes.len() as f64).ln())
        })
        .collect();

    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|s| s.0).sum::<f64>() / n;
    let mean_y = samples.iter().map(|s| s.1).sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in &samples {
        sxx += (x - mean_x).powi(2);
        syy += (y - mean_y).powi(2);
        sxy += (x - mean_x) * (y - mean_y);
    }

    let dimension = sxy / sxx;
    // a constant count is fitted exactly by a flat line
    let goodness = if syy == 0.0 { 1.0 } else { sxy * sxy / (sxx * syy) };
    FractalDimension { dimension, goodness }
}
