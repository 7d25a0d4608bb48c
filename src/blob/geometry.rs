use imageproc::geometry;
use imageproc::point::Point as DrawPoint;

use crate::models::{Calibration, Point, PointF};

/// Convex hull without collinear points, through `imageproc::geometry`.
///
/// Returns `None` when fewer than three points remain, i.e. all input
/// points are collinear.
pub(crate) fn convex_hull(points: &[Point]) -> Option<Vec<Point>> {
    // the angular sort needs distinct points
    let mut unique: Vec<DrawPoint<i32>> = points.iter().map(|p| DrawPoint::new(p.x, p.y)).collect();
    unique.sort_unstable_by_key(|p| (p.x, p.y));
    unique.dedup();
    if unique.len() < 3 {
        return None;
    }

    let hull: Vec<Point> = geometry::convex_hull(unique)
        .into_iter()
        .map(|p| Point::new(p.x, p.y))
        .collect();
    (hull.len() >= 3).then_some(hull)
}

/// Length of the polygon including the edge back to the first point
pub(crate) fn closed_length(points: &[Point], calibration: &Calibration) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| calibration.distance(points[i], points[(i + 1) % n]))
        .sum()
}

/// Minimum-area enclosing rectangle of a convex polygon, by rotating calipers.
///
/// Corners are in pixel coordinates, in order around the rectangle. They stay
/// fractional; `imageproc::geometry::min_area_rect` rounds them to the point
/// type, which shortens the sides of rotated rectangles.
pub(crate) fn min_area_rect(hull: &[Point]) -> Option<[PointF; 4]> {
    if hull.len() < 3 {
        return None;
    }
    let pts: Vec<PointF> = hull.iter().map(|p| PointF::new(p.x as f64, p.y as f64)).collect();
    let n = pts.len();

    let mut best: Option<(f64, [PointF; 4])> = None;
    for i in 0..n {
        let (a, b) = (pts[i], pts[(i + 1) % n]);
        let len = a.distance(&b);
        if len == 0.0 {
            continue;
        }
        let (ux, uy) = ((b.x - a.x) / len, (b.y - a.y) / len);
        let (nx, ny) = (-uy, ux);

        let (mut min_u, mut max_u, mut min_n, mut max_n) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for p in &pts {
            let u = p.x * ux + p.y * uy;
            let v = p.x * nx + p.y * ny;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_n = min_n.min(v);
            max_n = max_n.max(v);
        }

        let area = (max_u - min_u) * (max_n - min_n);
        if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
            let corner = |u: f64, v: f64| PointF::new(u * ux + v * nx, u * uy + v * ny);
            best = Some((
                area,
                [
                    corner(min_u, min_n),
                    corner(max_u, min_n),
                    corner(max_u, max_n),
                    corner(min_u, max_n),
                ],
            ));
        }
    }
    best.map(|(_, corners)| corners)
}

/// Largest and smallest caliper width of a point set, in calibrated units.
///
/// The minimum is only meaningful for a proper convex polygon; collinear
/// input yields a zero width.
pub(crate) fn feret_diameters(points: &[Point], calibration: &Calibration) -> (f64, f64) {
    let pts: Vec<PointF> = points.iter().map(|p| calibration.point(*p)).collect();
    let n = pts.len();

    let mut max = 0.0f64;
    for i in 0..n {
        for j in i + 1..n {
            max = max.max(pts[i].distance(&pts[j]));
        }
    }

    if n < 3 {
        return (max, 0.0);
    }
    let mut min = f64::INFINITY;
    for i in 0..n {
        let (a, b) = (pts[i], pts[(i + 1) % n]);
        let len = a.distance(&b);
        if len == 0.0 {
            continue;
        }
        let width = pts
            .iter()
            .map(|p| ((b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)).abs() / len)
            .fold(0.0, f64::max);
        min = min.min(width);
    }
    (max, if min.is_finite() { min } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hull_drops_interior_and_collinear_points() {
        let pts = vec![
            Point::new(0, 0),
            Point::new(2, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 4),
            Point::new(2, 2),
        ];
        let hull = convex_hull(&pts).unwrap();
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Point::new(2, 0)));
        assert!(!hull.contains(&Point::new(2, 2)));
        assert_eq!(closed_length(&hull, &Calibration::default()), 16.0);
    }

    #[test]
    fn traced_contour_with_repeats() {
        // closed contour running back over a spur
        let pts = vec![
            Point::new(2, 0),
            Point::new(3, 1),
            Point::new(4, 1),
            Point::new(3, 1),
            Point::new(2, 2),
            Point::new(1, 1),
            Point::new(2, 0),
        ];
        let mut hull = convex_hull(&pts).unwrap();
        hull.sort_unstable();
        assert_eq!(
            hull,
            vec![Point::new(1, 1), Point::new(2, 0), Point::new(2, 2), Point::new(4, 1)]
        );
        assert!(convex_hull(&[Point::new(3, 3), Point::new(3, 3), Point::new(4, 4)]).is_none());
    }

    #[test]
    fn collinear_points_have_no_hull() {
        let pts: Vec<Point> = (0..5).map(|i| Point::new(i, i)).collect();
        assert!(convex_hull(&pts).is_none());
        assert!(convex_hull(&[Point::new(1, 1)]).is_none());
    }

    #[test]
    fn rectangle_of_a_rotated_square() {
        let diamond = vec![
            Point::new(5, 0),
            Point::new(10, 5),
            Point::new(5, 10),
            Point::new(0, 5),
        ];
        let corners = min_area_rect(&diamond).unwrap();
        let side_a = corners[0].distance(&corners[1]);
        let side_b = corners[1].distance(&corners[2]);
        assert!((side_a - 50f64.sqrt()).abs() < 1e-9);
        assert!((side_b - 50f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn feret_of_rectangle() {
        let rect = vec![
            Point::new(0, 0),
            Point::new(8, 0),
            Point::new(8, 6),
            Point::new(0, 6),
        ];
        let (max, min) = feret_diameters(&rect, &Calibration::default());
        assert!((max - 10.0).abs() < 1e-9);
        assert!((min - 6.0).abs() < 1e-9);

        let (max, min) = feret_diameters(&rect, &Calibration::new(0.5, 0.5));
        assert!((max - 5.0).abs() < 1e-9);
        assert!((min - 3.0).abs() < 1e-9);
    }
}
