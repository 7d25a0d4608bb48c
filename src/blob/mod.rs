pub mod fractal;
pub(crate) mod geometry;
pub(crate) mod mask;
pub mod moments;

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Mutex, OnceLock, PoisonError};

use image::Rgb;
use serde::Serialize;

use crate::error::Result;
use crate::features::{BuiltinFeature, FeatureRegistry, ParamValue};
use crate::models::{BoundingBox, Calibration, Contour, Point, PointF};
use crate::render::{DrawOptions, Renderer};

pub use fractal::{DEFAULT_BOX_SIZES, FractalDimension};
pub use moments::Ellipse;

/// Label of helper blobs that do not come from a tracing run
pub const SYNTHETIC_LABEL: i32 = -1;

const EVEN_STEP: f64 = 0.948;
const ODD_STEP: f64 = 1.340;
/// Cached moment orders per axis
const MOMENT_TABLE: usize = 3;

/// Lazily filled feature values; each cell is computed at most once
#[derive(Debug, Default)]
struct FeatureCache {
    outer_region: OnceLock<mask::Mask>,
    center_of_gravity: OnceLock<PointF>,
    perimeter: OnceLock<f64>,
    enclosed_area: OnceLock<f64>,
    moments: [[OnceLock<f64>; MOMENT_TABLE]; MOMENT_TABLE],
    central_moments: [[OnceLock<f64>; MOMENT_TABLE]; MOMENT_TABLE],
    ellipse: OnceLock<Option<Ellipse>>,
    eigenvalues: OnceLock<(f64, f64)>,
    convex_hull: OnceLock<Contour>,
    perimeter_convex_hull: OnceLock<f64>,
    area_convex_hull: OnceLock<f64>,
    min_bounding_rectangle: OnceLock<Option<[PointF; 4]>>,
    feret: OnceLock<(f64, f64)>,
    inscribed_circle: OnceLock<f64>,
    fractal: Mutex<HashMap<Vec<u32>, FractalDimension>>,
}

fn both(a: &OnceLock<f64>, b: &OnceLock<f64>) -> bool {
    a.get().is_some() && b.get().is_some()
}

/// One connected component: its outer boundary, its holes and the feature
/// values derived from them.
#[derive(Debug)]
pub struct Blob {
    label: i32,
    outer: Contour,
    holes: Vec<Contour>,
    calibration: Calibration,
    frame: Option<(u32, u32)>,
    cache: FeatureCache,
}

/// Serializable digest of the most common features
#[derive(Debug, Clone, Serialize)]
pub struct BlobSummary {
    pub label: i32,
    pub bounds: Option<BoundingBox>,
    pub contour_points: usize,
    pub holes: usize,
    pub on_edge: bool,
    pub center_of_gravity: PointF,
    pub enclosed_area: f64,
    pub perimeter: f64,
    pub circularity: f64,
    pub thinness_ratio: f64,
    pub convexity: f64,
    pub solidity: f64,
    pub orientation_major_axis: f64,
}

impl Blob {
    pub fn new(label: i32, outer: Contour, calibration: Calibration) -> Self {
        Self {
            label,
            outer,
            holes: Vec::new(),
            calibration,
            frame: None,
            cache: FeatureCache::default(),
        }
    }

    /// Size of the traced raster, used by the on-edge test
    pub fn with_frame(mut self, width: u32, height: u32) -> Self {
        self.frame = Some((width, height));
        self
    }

    pub fn with_holes(mut self, holes: Vec<Contour>) -> Self {
        self.holes = holes;
        self
    }

    /// Copy of this blob under another calibration, with an empty cache
    pub fn recalibrated(&self, calibration: Calibration) -> Self {
        Self {
            label: self.label,
            outer: self.outer.clone(),
            holes: self.holes.clone(),
            calibration,
            frame: self.frame,
            cache: FeatureCache::default(),
        }
    }

    pub fn label(&self) -> i32 {
        self.label
    }

    pub fn outer_contour(&self) -> &Contour {
        &self.outer
    }

    pub fn inner_contours(&self) -> &[Contour] {
        &self.holes
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn frame(&self) -> Option<(u32, u32)> {
        self.frame
    }

    pub fn number_of_holes(&self) -> usize {
        self.holes.len()
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.outer.bounds()
    }

    pub fn chain_code(&self) -> Vec<u8> {
        self.outer.chain_code()
    }

    /// True if the outer contour reaches the first or last row/column of the
    /// traced raster; always false for blobs without a frame
    pub fn is_on_edge(&self) -> bool {
        self.frame.is_some_and(|(w, h)| self.outer.touches_frame(w, h))
    }

    /// Point inside the outer contour, boundary included
    pub fn contains(&self, p: Point) -> bool {
        self.outer.contains(p)
    }

    /// Pixels of the blob (outer polygon minus hole interiors)
    pub fn pixels(&self) -> Vec<Point> {
        mask::region(&self.outer, &self.holes).pixels().collect()
    }

    /// Feature value if it has already been computed
    pub fn cached(&self, feature: BuiltinFeature) -> Option<f64> {
        let c = &self.cache;
        match feature {
            BuiltinFeature::Perimeter => c.perimeter.get().copied(),
            BuiltinFeature::EnclosedArea => c.enclosed_area.get().copied(),
            BuiltinFeature::OrientationMajorAxis => c.ellipse.get().map(|_| self.orientation_major_axis()),
            BuiltinFeature::OrientationMinorAxis => c.ellipse.get().map(|_| self.orientation_minor_axis()),
            BuiltinFeature::Elongation => c.ellipse.get().map(|_| self.elongation()),
            BuiltinFeature::EigenvalueMajorAxis => c.eigenvalues.get().map(|e| e.0),
            BuiltinFeature::EigenvalueMinorAxis => c.eigenvalues.get().map(|e| e.1),
            BuiltinFeature::PerimeterConvexHull => c.perimeter_convex_hull.get().copied(),
            BuiltinFeature::AreaConvexHull => c.area_convex_hull.get().copied(),
            BuiltinFeature::FeretDiameter => c.feret.get().map(|f| f.0),
            BuiltinFeature::MinFeretDiameter => c.feret.get().map(|f| f.1),
            BuiltinFeature::DiameterMaximumInscribedCircle => c.inscribed_circle.get().copied(),
            BuiltinFeature::LongSideMbr | BuiltinFeature::ShortSideMbr | BuiltinFeature::AspectRatio => {
                c.min_bounding_rectangle.get().map(|_| self.mbr_value(feature))
            }
            BuiltinFeature::NumberOfHoles => Some(self.holes.len() as f64),
            // ratios are known once both of their inputs are
            BuiltinFeature::Convexity => {
                both(&c.perimeter, &c.perimeter_convex_hull).then(|| self.convexity())
            }
            BuiltinFeature::ContourTemperature => {
                both(&c.perimeter, &c.perimeter_convex_hull).then(|| self.contour_temperature())
            }
            BuiltinFeature::Solidity => {
                both(&c.enclosed_area, &c.area_convex_hull).then(|| self.solidity())
            }
            BuiltinFeature::Circularity => {
                both(&c.perimeter, &c.enclosed_area).then(|| self.circularity())
            }
            BuiltinFeature::ThinnessRatio => {
                both(&c.perimeter, &c.enclosed_area).then(|| self.thinness_ratio())
            }
            BuiltinFeature::AreaToPerimeterRatio => {
                both(&c.perimeter, &c.enclosed_area).then(|| self.area_to_perimeter_ratio())
            }
            BuiltinFeature::Moment
            | BuiltinFeature::CentralMoment
            | BuiltinFeature::FractalBoxDimension
            | BuiltinFeature::FractalDimensionGoodness => None,
        }
    }

    /// Evaluate a built-in or registered feature by name
    pub fn feature(&self, registry: &FeatureRegistry, name: &str, params: &[ParamValue]) -> Result<f64> {
        registry.evaluate(self, name, params)
    }

    /// Centroid of the outer polygon, calibrated
    pub fn center_of_gravity(&self) -> PointF {
        *self.cache.center_of_gravity.get_or_init(|| {
            let pts = self.outer.points();
            let cal = &self.calibration;
            if pts.len() == 1 {
                return cal.point(pts[0]);
            }

            let n = pts.len();
            let (mut area2, mut cx, mut cy) = (0.0, 0.0, 0.0);
            for i in 0..n {
                let (a, b) = (pts[i], pts[(i + 1) % n]);
                let cross = (a.x as f64) * (b.y as f64) - (b.x as f64) * (a.y as f64);
                area2 += cross;
                cx += (a.x + b.x) as f64 * cross;
                cy += (a.y + b.y) as f64 * cross;
            }

            if area2 == 0.0 {
                // line-shaped blob
                let sx: f64 = pts.iter().map(|p| p.x as f64).sum();
                let sy: f64 = pts.iter().map(|p| p.y as f64).sum();
                return PointF::new(cal.x(sx / n as f64), cal.y(sy / n as f64));
            }
            PointF::new(cal.x(cx / (3.0 * area2)), cal.y(cy / (3.0 * area2)))
        })
    }

    /// Chain-code perimeter with weights 0.948 (even) and 1.340 (odd)
    pub fn perimeter(&self) -> f64 {
        *self.cache.perimeter.get_or_init(|| {
            if self.outer.len() == 1 {
                return self.calibration.pixel_width;
            }
            self.outer
                .chain_code()
                .into_iter()
                .map(|code| {
                    let weight = if code % 2 == 0 { EVEN_STEP } else { ODD_STEP };
                    weight * self.calibration.step_scale(code)
                })
                .sum()
        })
    }

    /// Number of blob pixels times the calibrated pixel area
    pub fn enclosed_area(&self) -> f64 {
        *self.cache.enclosed_area.get_or_init(|| {
            mask::region(&self.outer, &self.holes).count() as f64 * self.calibration.pixel_area()
        })
    }

    fn outer_region(&self) -> &mask::Mask {
        self.cache
            .outer_region
            .get_or_init(|| mask::outer_region(&self.outer))
    }

    /// Region moment `Σ x^p y^q` over the filled outer contour
    pub fn moment(&self, p: u32, q: u32) -> f64 {
        let compute = || moments::raw_moment(self.outer_region(), &self.calibration, p, q);
        match self.cache.moments.get(p as usize).and_then(|row| row.get(q as usize)) {
            Some(cell) => *cell.get_or_init(compute),
            None => compute(),
        }
    }

    /// Central moment of the filled outer contour
    pub fn central_moment(&self, p: u32, q: u32) -> f64 {
        let compute = || {
            moments::central_from_raw(p, q, |a, b| self.moment(a, b)).unwrap_or_else(|| {
                let m00 = self.moment(0, 0);
                let centroid = PointF::new(self.moment(1, 0) / m00, self.moment(0, 1) / m00);
                moments::summed_central_moment(self.outer_region(), &self.calibration, p, q, centroid)
            })
        };
        match self
            .cache
            .central_moments
            .get(p as usize)
            .and_then(|row| row.get(q as usize))
        {
            Some(cell) => *cell.get_or_init(compute),
            None => compute(),
        }
    }

    /// Best-fit ellipse of the filled outer contour
    pub fn ellipse(&self) -> Option<Ellipse> {
        *self
            .cache
            .ellipse
            .get_or_init(|| moments::fit_ellipse(self.outer_region()))
    }

    /// Major axis angle in degrees, counter-clockwise from +x
    pub fn orientation_major_axis(&self) -> f64 {
        match self.ellipse() {
            Some(e) if (e.angle - 180.0).abs() < 0.01 => 0.0,
            Some(e) => e.angle,
            None => f64::NAN,
        }
    }

    pub fn orientation_minor_axis(&self) -> f64 {
        self.orientation_major_axis() - 90.0
    }

    pub fn elongation(&self) -> f64 {
        match self.ellipse() {
            Some(e) if e.major > 0.0 => (1.0 - e.minor / e.major).sqrt(),
            _ => f64::NAN,
        }
    }

    fn eigenvalues(&self) -> (f64, f64) {
        *self.cache.eigenvalues.get_or_init(|| {
            let c00 = self.central_moment(0, 0);
            moments::principal_values(
                self.central_moment(2, 0) / c00,
                self.central_moment(0, 2) / c00,
                self.central_moment(1, 1) / c00,
            )
        })
    }

    pub fn eigenvalue_major_axis(&self) -> f64 {
        self.eigenvalues().0
    }

    pub fn eigenvalue_minor_axis(&self) -> f64 {
        self.eigenvalues().1
    }

    /// Convex hull of the outer contour; the contour itself when all its
    /// points are collinear
    pub fn convex_hull(&self) -> &Contour {
        self.cache.convex_hull.get_or_init(|| {
            geometry::convex_hull(self.outer.points())
                .map(Contour::new)
                .unwrap_or_else(|| self.outer.clone())
        })
    }

    pub fn perimeter_convex_hull(&self) -> f64 {
        *self
            .cache
            .perimeter_convex_hull
            .get_or_init(|| geometry::closed_length(self.convex_hull().points(), &self.calibration))
    }

    /// Rasterised area of the hull, computed through a synthetic blob
    pub fn area_convex_hull(&self) -> f64 {
        *self.cache.area_convex_hull.get_or_init(|| {
            Blob::new(SYNTHETIC_LABEL, self.convex_hull().clone(), self.calibration).enclosed_area()
        })
    }

    pub fn convexity(&self) -> f64 {
        (self.perimeter_convex_hull() / self.perimeter()).min(1.0)
    }

    pub fn solidity(&self) -> f64 {
        (self.enclosed_area() / self.area_convex_hull()).min(1.0)
    }

    pub fn circularity(&self) -> f64 {
        self.perimeter().powi(2) / self.enclosed_area()
    }

    pub fn thinness_ratio(&self) -> f64 {
        (4.0 * PI / self.circularity()).min(1.0)
    }

    pub fn area_to_perimeter_ratio(&self) -> f64 {
        self.enclosed_area() / self.perimeter()
    }

    pub fn contour_temperature(&self) -> f64 {
        let perimeter = self.perimeter();
        let hull = self.perimeter_convex_hull();
        1.0 / (2.0 * perimeter / (perimeter - hull).abs()).log2()
    }

    /// Corners of the minimum-area bounding rectangle, in pixel coordinates
    pub fn min_bounding_rectangle(&self) -> Option<[PointF; 4]> {
        *self.cache.min_bounding_rectangle.get_or_init(|| {
            geometry::convex_hull(self.outer.points()).and_then(|hull| geometry::min_area_rect(&hull))
        })
    }

    fn mbr_value(&self, feature: BuiltinFeature) -> f64 {
        let Some(corners) = self.min_bounding_rectangle() else {
            return f64::NAN;
        };
        let cal = &self.calibration;
        let side = |a: PointF, b: PointF| {
            ((b.x - a.x) * cal.pixel_width).hypot((b.y - a.y) * cal.pixel_height)
        };
        let (s1, s2) = (side(corners[0], corners[1]), side(corners[1], corners[2]));
        let (long, short) = (s1.max(s2), s1.min(s2));
        match feature {
            BuiltinFeature::LongSideMbr => long,
            BuiltinFeature::ShortSideMbr => short,
            _ => long / short,
        }
    }

    pub fn long_side_mbr(&self) -> f64 {
        self.mbr_value(BuiltinFeature::LongSideMbr)
    }

    pub fn short_side_mbr(&self) -> f64 {
        self.mbr_value(BuiltinFeature::ShortSideMbr)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.mbr_value(BuiltinFeature::AspectRatio)
    }

    fn feret(&self) -> (f64, f64) {
        *self.cache.feret.get_or_init(|| {
            match geometry::convex_hull(self.outer.points()) {
                Some(hull) => geometry::feret_diameters(&hull, &self.calibration),
                None => {
                    // collinear: the extreme points in sort order are the segment ends
                    let pts = self.outer.points();
                    let extent = match (pts.iter().min(), pts.iter().max()) {
                        (Some(a), Some(b)) => self.calibration.distance(*a, *b),
                        _ => 0.0,
                    };
                    (extent, 0.0)
                }
            }
        })
    }

    /// Largest distance between two points of the outer contour
    pub fn feret_diameter(&self) -> f64 {
        self.feret().0
    }

    /// Smallest caliper width of the outer contour
    pub fn min_feret_diameter(&self) -> f64 {
        self.feret().1
    }

    /// Box-counting dimension of the contour pixels; sizes larger than the
    /// contour extent are ignored. Cached per size list.
    pub fn fractal_box_dimension(&self, box_sizes: &[u32]) -> FractalDimension {
        let Some(bounds) = self.outer.bounds() else {
            return FractalDimension {
                dimension: f64::NAN,
                goodness: f64::NAN,
            };
        };
        let sizes = fractal::usable_sizes(box_sizes, bounds);
        let mut cache = self.cache.fractal.lock().unwrap_or_else(PoisonError::into_inner);
        *cache.entry(sizes).or_insert_with_key(|sizes| {
            fractal::box_count(&mask::outline(&self.outer, &self.holes), bounds, sizes)
        })
    }

    pub fn diameter_maximum_inscribed_circle(&self) -> f64 {
        *self.cache.inscribed_circle.get_or_init(|| {
            2.0 * mask::region(&self.outer, &self.holes).max_inner_distance() * self.calibration.pixel_width
        })
    }

    /// Paint the blob: filled outer contour, optionally its holes and hull
    pub fn draw<R: Renderer + ?Sized>(&self, renderer: &mut R, options: &DrawOptions, color: Rgb<u8>) {
        renderer.fill_polygon(self.outer.points(), color);
        if options.holes {
            for hole in &self.holes {
                renderer.fill_polygon(hole.points(), options.hole_color);
                renderer.draw_polygon(hole.points(), color);
            }
        }
        if options.convex_hull {
            renderer.draw_polygon(self.convex_hull().points(), options.hull_color);
        }
    }

    pub fn summary(&self) -> BlobSummary {
        BlobSummary {
            label: self.label,
            bounds: self.bounds(),
            contour_points: self.outer.len(),
            holes: self.holes.len(),
            on_edge: self.is_on_edge(),
            center_of_gravity: self.center_of_gravity(),
            enclosed_area: self.enclosed_area(),
            perimeter: self.perimeter(),
            circularity: self.circularity(),
            thinness_ratio: self.thinness_ratio(),
            convexity: self.convexity(),
            solidity: self.solidity(),
            orientation_major_axis: self.orientation_major_axis(),
        }
    }
}
