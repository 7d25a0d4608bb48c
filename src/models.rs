use serde::{Deserialize, Serialize};

/// Integer pixel coordinate, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Sub-pixel coordinate, used for centroids and rectangle corners
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &PointF) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Physical size of a pixel and the origin of the calibrated coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub x_origin: f64,
    pub y_origin: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pixel_width: 1.0,
            pixel_height: 1.0,
            x_origin: 0.0,
            y_origin: 0.0,
        }
    }
}

impl Calibration {
    pub fn new(pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            pixel_width,
            pixel_height,
            ..Self::default()
        }
    }

    pub fn with_origin(mut self, x_origin: f64, y_origin: f64) -> Self {
        self.x_origin = x_origin;
        self.y_origin = y_origin;
        self
    }

    /// Calibrated x coordinate of a (possibly fractional) pixel column
    pub fn x(&self, x: f64) -> f64 {
        (x - self.x_origin) * self.pixel_width
    }

    /// Calibrated y coordinate of a (possibly fractional) pixel row
    pub fn y(&self, y: f64) -> f64 {
        (y - self.y_origin) * self.pixel_height
    }

    pub fn point(&self, p: Point) -> PointF {
        PointF::new(self.x(p.x as f64), self.y(p.y as f64))
    }

    pub fn pixel_area(&self) -> f64 {
        self.pixel_width * self.pixel_height
    }

    /// Calibrated length of the straight segment between two pixels
    pub fn distance(&self, a: Point, b: Point) -> f64 {
        let dx = (b.x - a.x) as f64 * self.pixel_width;
        let dy = (b.y - a.y) as f64 * self.pixel_height;
        dx.hypot(dy)
    }

    /// Scale applied to a chain code step: horizontal, vertical or diagonal
    pub fn step_scale(&self, code: u8) -> f64 {
        match code % 8 {
            0 | 4 => self.pixel_width,
            2 | 6 => self.pixel_height,
            _ => ((self.pixel_width.powi(2) + self.pixel_height.powi(2)) / 2.0).sqrt(),
        }
    }
}

/// Axis-aligned bounds in pixel coordinates; `width`/`height` count pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Last column inside the box
    pub fn right(&self) -> i32 {
        self.x + self.width as i32 - 1
    }

    /// Last row inside the box
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32 - 1
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Freeman code for a unit step, counter-clockwise from +x as seen on screen.
pub fn chain_code_for_step(dx: i32, dy: i32) -> Option<u8> {
    match (dx, dy) {
        (1, 0) => Some(0),
        (1, -1) => Some(1),
        (0, -1) => Some(2),
        (-1, -1) => Some(3),
        (-1, 0) => Some(4),
        (-1, 1) => Some(5),
        (0, 1) => Some(6),
        (1, 1) => Some(7),
        _ => None,
    }
}

/// An ordered, closed pixel boundary as produced by the tracer.
///
/// Traced contours repeat their start point at the end, except for an isolated
/// pixel whose contour is that single point.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub(crate) fn translate(&mut self, dx: i32, dy: i32) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    /// Freeman chain code of consecutive points; non-unit steps are skipped
    pub fn chain_code(&self) -> Vec<u8> {
        self.points
            .windows(2)
            .filter_map(|w| chain_code_for_step(w[1].x - w[0].x, w[1].y - w[0].y))
            .collect()
    }

    /// Point-in-polygon test, counting points on the boundary as inside
    pub fn contains(&self, p: Point) -> bool {
        let n = self.points.len();
        match n {
            0 => return false,
            1 => return self.points[0] == p,
            _ => {}
        }

        let mut inside = false;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            if on_segment(a, b, p) {
                return true;
            }
            if (a.y > p.y) != (b.y > p.y) {
                let cross_x =
                    a.x as f64 + (p.y - a.y) as f64 * (b.x - a.x) as f64 / (b.y - a.y) as f64;
                if cross_x > p.x as f64 {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// True when any point lies on the outermost rows or columns of a frame
    pub fn touches_frame(&self, width: u32, height: u32) -> bool {
        let (last_x, last_y) = (width as i32 - 1, height as i32 - 1);
        self.points
            .iter()
            .any(|p| p.x <= 0 || p.y <= 0 || p.x >= last_x || p.y >= last_y)
    }
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let cross = (b.x - a.x) as i64 * (p.y - a.y) as i64 - (b.y - a.y) as i64 * (p.x - a.x) as i64;
    cross == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}
