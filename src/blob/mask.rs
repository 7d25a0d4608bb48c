use image::{GrayImage, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::drawing::BresenhamLineIter;

use crate::models::{BoundingBox, Contour, Point};

const ON: u8 = 255;
const OFF: u8 = 0;
/// Background pixels kept around the region on every side
const MARGIN: i32 = 1;

/// Scratch raster of a blob region, positioned in image coordinates
#[derive(Debug, Clone)]
pub(crate) struct Mask {
    image: GrayImage,
    origin: Point,
}

impl Mask {
    fn covering(bounds: Option<BoundingBox>) -> Self {
        match bounds {
            Some(b) => Self {
                image: GrayImage::new(b.width + 2 * MARGIN as u32, b.height + 2 * MARGIN as u32),
                origin: Point::new(b.x - MARGIN, b.y - MARGIN),
            },
            None => Self {
                image: GrayImage::new(0, 0),
                origin: Point::new(0, 0),
            },
        }
    }

    fn local(&self, p: Point) -> Option<(u32, u32)> {
        let (x, y) = (p.x - self.origin.x, p.y - self.origin.y);
        if x < 0 || y < 0 || x >= self.image.width() as i32 || y >= self.image.height() as i32 {
            return None;
        }
        Some((x as u32, y as u32))
    }

    fn put(&mut self, p: Point, value: u8) {
        if let Some((x, y)) = self.local(p) {
            self.image.put_pixel(x, y, Luma([value]));
        }
    }

    pub fn is_set(&self, p: Point) -> bool {
        self.local(p)
            .is_some_and(|(x, y)| self.image.get_pixel(x, y)[0] == ON)
    }

    pub fn count(&self) -> usize {
        self.image.pixels().filter(|p| p[0] == ON).count()
    }

    /// Set pixels in image coordinates
    pub fn pixels(&self) -> impl Iterator<Item = Point> + '_ {
        self.image
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == ON)
            .map(|(x, y, _)| Point::new(x as i32 + self.origin.x, y as i32 + self.origin.y))
    }

    /// Scanline fill of the pixels strictly inside a polygon
    fn fill_interior(&mut self, points: &[Point], value: u8) {
        let n = points.len();
        if n < 3 {
            return;
        }
        let top = self.origin.y;
        let bottom = top + self.image.height() as i32;
        let mut crossings: Vec<f64> = Vec::new();
        for y in top..bottom {
            crossings.clear();
            for i in 0..n {
                let (a, b) = (points[i], points[(i + 1) % n]);
                if (a.y > y) != (b.y > y) {
                    crossings.push(
                        a.x as f64 + (y - a.y) as f64 * (b.x - a.x) as f64 / (b.y - a.y) as f64,
                    );
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let start = span[0].floor() as i32 + 1;
                let end = span[1].ceil() as i32 - 1;
                for x in start..=end {
                    self.put(Point::new(x, y), value);
                }
            }
        }
    }

    /// Rasterise the closed polygon outline
    fn draw_edges(&mut self, points: &[Point], value: u8) {
        let n = points.len();
        for i in 0..n {
            for p in digital_line(points[i], points[(i + 1) % n]) {
                self.put(p, value);
            }
        }
    }

    /// Largest distance from a set pixel to the nearest unset pixel
    pub fn max_inner_distance(&self) -> f64 {
        if self.image.width() == 0 || self.image.height() == 0 {
            return 0.0;
        }
        let outside = GrayImage::from_fn(self.image.width(), self.image.height(), |x, y| {
            if self.image.get_pixel(x, y)[0] == ON {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        euclidean_squared_distance_transform(&outside)
            .pixels()
            .map(|p| p[0])
            .fold(0.0, f64::max)
            .sqrt()
    }
}

/// Pixels of the filled outer polygon, boundary included, holes ignored
pub(crate) fn outer_region(outer: &Contour) -> Mask {
    let mut mask = Mask::covering(outer.bounds());
    mask.fill_interior(outer.points(), ON);
    mask.draw_edges(outer.points(), ON);
    mask
}

/// Pixels of the blob: the filled outer polygon minus the inside of each hole
pub(crate) fn region(outer: &Contour, holes: &[Contour]) -> Mask {
    let mut mask = outer_region(outer);
    for hole in holes {
        mask.fill_interior(hole.points(), OFF);
        // hole boundaries are object pixels
        mask.draw_edges(hole.points(), ON);
    }
    mask
}

/// Only the boundary pixels of the outer contour and the holes
pub(crate) fn outline(outer: &Contour, holes: &[Contour]) -> Mask {
    let mut mask = Mask::covering(outer.bounds());
    mask.draw_edges(outer.points(), ON);
    for hole in holes {
        mask.draw_edges(hole.points(), ON);
    }
    mask
}

/// Bresenham line including both end points
fn digital_line(from: Point, to: Point) -> impl Iterator<Item = Point> {
    BresenhamLineIter::new((from.x as f32, from.y as f32), (to.x as f32, to.y as f32))
        .map(|(x, y)| Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
        Contour::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
            Point::new(x0, y0),
        ])
    }

    #[test]
    fn filled_rectangle_counts_boundary() {
        let mask = outer_region(&rect(2, 3, 11, 7));
        assert_eq!(mask.count(), 10 * 5);
        assert!(mask.is_set(Point::new(2, 3)));
        assert!(mask.is_set(Point::new(11, 7)));
        assert!(!mask.is_set(Point::new(12, 7)));
    }

    #[test]
    fn hole_keeps_its_boundary() {
        let mask = region(&rect(0, 0, 9, 9), &[rect(3, 3, 6, 6)]);
        // inner 2x2 of the hole polygon is cleared
        assert_eq!(mask.count(), 100 - 4);
        assert!(!mask.is_set(Point::new(4, 4)));
        assert!(mask.is_set(Point::new(3, 3)));
    }

    #[test]
    fn single_point_region() {
        let c = Contour::new(vec![Point::new(5, 5)]);
        let mask = outer_region(&c);
        assert_eq!(mask.count(), 1);
        assert_eq!(mask.pixels().collect::<Vec<_>>(), vec![Point::new(5, 5)]);
        assert!((mask.max_inner_distance() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn inner_distance_of_square() {
        let mask = outer_region(&rect(0, 0, 6, 6));
        // centre pixel (3,3) is 4 pixels from the margin
        assert!((mask.max_inner_distance() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn diagonal_line_is_connected() {
        let line: Vec<Point> = digital_line(Point::new(0, 0), Point::new(3, 2)).collect();
        assert_eq!(line.first(), Some(&Point::new(0, 0)));
        assert_eq!(line.last(), Some(&Point::new(3, 2)));
        assert_eq!(line.len(), 4);

        // endpoints are kept whichever way the line runs
        let back: Vec<Point> = digital_line(Point::new(2, 7), Point::new(0, 0)).collect();
        assert_eq!(back.len(), 8);
        assert!(back.contains(&Point::new(2, 7)));
        assert!(back.contains(&Point::new(0, 0)));
        let dot: Vec<Point> = digital_line(Point::new(4, 4), Point::new(4, 4)).collect();
        assert_eq!(dot, vec![Point::new(4, 4)]);
    }
}
