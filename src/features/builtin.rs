use crate::blob::Blob;
use crate::error::{BlobError, Result};

use super::{ParamKind, ParamValue, Signature};

/// Features computed by [`Blob`] itself, addressable by their snake_case name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFeature {
    Perimeter,
    EnclosedArea,
    Moment,
    CentralMoment,
    OrientationMajorAxis,
    OrientationMinorAxis,
    Elongation,
    EigenvalueMajorAxis,
    EigenvalueMinorAxis,
    PerimeterConvexHull,
    AreaConvexHull,
    Convexity,
    Solidity,
    Circularity,
    ThinnessRatio,
    AreaToPerimeterRatio,
    ContourTemperature,
    LongSideMbr,
    ShortSideMbr,
    AspectRatio,
    FeretDiameter,
    MinFeretDiameter,
    FractalBoxDimension,
    FractalDimensionGoodness,
    DiameterMaximumInscribedCircle,
    NumberOfHoles,
}

impl BuiltinFeature {
    pub const ALL: [BuiltinFeature; 26] = [
        BuiltinFeature::Perimeter,
        BuiltinFeature::EnclosedArea,
        BuiltinFeature::Moment,
        BuiltinFeature::CentralMoment,
        BuiltinFeature::OrientationMajorAxis,
        BuiltinFeature::OrientationMinorAxis,
        BuiltinFeature::Elongation,
        BuiltinFeature::EigenvalueMajorAxis,
        BuiltinFeature::EigenvalueMinorAxis,
        BuiltinFeature::PerimeterConvexHull,
        BuiltinFeature::AreaConvexHull,
        BuiltinFeature::Convexity,
        BuiltinFeature::Solidity,
        BuiltinFeature::Circularity,
        BuiltinFeature::ThinnessRatio,
        BuiltinFeature::AreaToPerimeterRatio,
        BuiltinFeature::ContourTemperature,
        BuiltinFeature::LongSideMbr,
        BuiltinFeature::ShortSideMbr,
        BuiltinFeature::AspectRatio,
        BuiltinFeature::FeretDiameter,
        BuiltinFeature::MinFeretDiameter,
        BuiltinFeature::FractalBoxDimension,
        BuiltinFeature::FractalDimensionGoodness,
        BuiltinFeature::DiameterMaximumInscribedCircle,
        BuiltinFeature::NumberOfHoles,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinFeature::Perimeter => "perimeter",
            BuiltinFeature::EnclosedArea => "enclosed_area",
            BuiltinFeature::Moment => "moment",
            BuiltinFeature::CentralMoment => "central_moment",
            BuiltinFeature::OrientationMajorAxis => "orientation_major_axis",
            BuiltinFeature::OrientationMinorAxis => "orientation_minor_axis",
            BuiltinFeature::Elongation => "elongation",
            BuiltinFeature::EigenvalueMajorAxis => "eigenvalue_major_axis",
            BuiltinFeature::EigenvalueMinorAxis => "eigenvalue_minor_axis",
            BuiltinFeature::PerimeterConvexHull => "perimeter_convex_hull",
            BuiltinFeature::AreaConvexHull => "area_convex_hull",
            BuiltinFeature::Convexity => "convexity",
            BuiltinFeature::Solidity => "solidity",
            BuiltinFeature::Circularity => "circularity",
            BuiltinFeature::ThinnessRatio => "thinness_ratio",
            BuiltinFeature::AreaToPerimeterRatio => "area_to_perimeter_ratio",
            BuiltinFeature::ContourTemperature => "contour_temperature",
            BuiltinFeature::LongSideMbr => "long_side_mbr",
            BuiltinFeature::ShortSideMbr => "short_side_mbr",
            BuiltinFeature::AspectRatio => "aspect_ratio",
            BuiltinFeature::FeretDiameter => "feret_diameter",
            BuiltinFeature::MinFeretDiameter => "min_feret_diameter",
            BuiltinFeature::FractalBoxDimension => "fractal_box_dimension",
            BuiltinFeature::FractalDimensionGoodness => "fractal_dimension_goodness",
            BuiltinFeature::DiameterMaximumInscribedCircle => "diameter_maximum_inscribed_circle",
            BuiltinFeature::NumberOfHoles => "number_of_holes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn signature(self) -> Signature {
        match self {
            BuiltinFeature::Moment | BuiltinFeature::CentralMoment => {
                Signature::fixed(&[ParamKind::Int, ParamKind::Int])
            }
            BuiltinFeature::FractalBoxDimension | BuiltinFeature::FractalDimensionGoodness => {
                Signature::repeated(ParamKind::Int)
            }
            _ => Signature::empty(),
        }
    }

    /// Compute the feature, validating the parameters first.
    ///
    /// Fractal features take the box sizes as parameters; none means the
    /// default sizes.
    pub fn evaluate(self, blob: &Blob, params: &[ParamValue]) -> Result<f64> {
        self.signature().check(self.name(), params)?;
        let value = match self {
            BuiltinFeature::Perimeter => blob.perimeter(),
            BuiltinFeature::EnclosedArea => blob.enclosed_area(),
            BuiltinFeature::Moment => {
                let (p, q) = self.order(params)?;
                blob.moment(p, q)
            }
            BuiltinFeature::CentralMoment => {
                let (p, q) = self.order(params)?;
                blob.central_moment(p, q)
            }
            BuiltinFeature::OrientationMajorAxis => blob.orientation_major_axis(),
            BuiltinFeature::OrientationMinorAxis => blob.orientation_minor_axis(),
            BuiltinFeature::Elongation => blob.elongation(),
            BuiltinFeature::EigenvalueMajorAxis => blob.eigenvalue_major_axis(),
            BuiltinFeature::EigenvalueMinorAxis => blob.eigenvalue_minor_axis(),
            BuiltinFeature::PerimeterConvexHull => blob.perimeter_convex_hull(),
            BuiltinFeature::AreaConvexHull => blob.area_convex_hull(),
            BuiltinFeature::Convexity => blob.convexity(),
            BuiltinFeature::Solidity => blob.solidity(),
            BuiltinFeature::Circularity => blob.circularity(),
            BuiltinFeature::ThinnessRatio => blob.thinness_ratio(),
            BuiltinFeature::AreaToPerimeterRatio => blob.area_to_perimeter_ratio(),
            BuiltinFeature::ContourTemperature => blob.contour_temperature(),
            BuiltinFeature::LongSideMbr => blob.long_side_mbr(),
            BuiltinFeature::ShortSideMbr => blob.short_side_mbr(),
            BuiltinFeature::AspectRatio => blob.aspect_ratio(),
            BuiltinFeature::FeretDiameter => blob.feret_diameter(),
            BuiltinFeature::MinFeretDiameter => blob.min_feret_diameter(),
            BuiltinFeature::FractalBoxDimension => {
                blob.fractal_box_dimension(&self.box_sizes(params)?).dimension
            }
            BuiltinFeature::FractalDimensionGoodness => {
                blob.fractal_box_dimension(&self.box_sizes(params)?).goodness
            }
            BuiltinFeature::DiameterMaximumInscribedCircle => {
                blob.diameter_maximum_inscribed_circle()
            }
            BuiltinFeature::NumberOfHoles => blob.number_of_holes() as f64,
        };
        Ok(value)
    }

    fn non_negative(self, params: &[ParamValue]) -> Result<Vec<u32>> {
        params
            .iter()
            .map(|p| {
                p.as_int().and_then(|v| u32::try_from(v).ok()).ok_or_else(|| {
                    BlobError::ArgumentMismatch {
                        feature: self.name().to_string(),
                        expected: "non-negative integers".to_string(),
                        found: format!("{p:?}"),
                    }
                })
            })
            .collect()
    }

    fn order(self, params: &[ParamValue]) -> Result<(u32, u32)> {
        match self.non_negative(params)?.as_slice() {
            [p, q] => Ok((*p, *q)),
            _ => Err(BlobError::ArgumentMismatch {
                feature: self.name().to_string(),
                expected: self.signature().to_string(),
                found: format!("{} values", params.len()),
            }),
        }
    }

    fn box_sizes(self, params: &[ParamValue]) -> Result<Vec<u32>> {
        if params.is_empty() {
            return Ok(crate::blob::DEFAULT_BOX_SIZES.to_vec());
        }
        self.non_negative(params)
    }
}
