use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as DrawPoint;

use crate::detection::LabelBuffer;
use crate::models::Point;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Drawing surface for blob outlines
pub trait Renderer {
    fn fill_polygon(&mut self, points: &[Point], color: Rgb<u8>);
    fn draw_polygon(&mut self, points: &[Point], color: Rgb<u8>);
}

/// What `Blob::draw` paints besides the filled outer contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawOptions {
    pub holes: bool,
    pub convex_hull: bool,
    pub hole_color: Rgb<u8>,
    pub hull_color: Rgb<u8>,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            holes: true,
            convex_hull: false,
            hole_color: WHITE,
            hull_color: RED,
        }
    }
}

/// Contour without the repeated closing point(s)
fn open_ring(points: &[Point]) -> &[Point] {
    let mut end = points.len();
    while end > 1 && points[end - 1] == points[0] {
        end -= 1;
    }
    &points[..end]
}

impl Renderer for RgbImage {
    fn fill_polygon(&mut self, points: &[Point], color: Rgb<u8>) {
        let ring = open_ring(points);
        if ring.len() < 3 {
            self.draw_polygon(ring, color);
            return;
        }
        let poly: Vec<DrawPoint<i32>> = ring.iter().map(|p| DrawPoint::new(p.x, p.y)).collect();
        draw_polygon_mut(self, &poly, color);
        // imageproc leaves parts of the boundary unpainted
        self.draw_polygon(ring, color);
    }

    fn draw_polygon(&mut self, points: &[Point], color: Rgb<u8>) {
        let ring = open_ring(points);
        match ring {
            [] => {}
            [p] => {
                if p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width() && (p.y as u32) < self.height() {
                    self.put_pixel(p.x as u32, p.y as u32, color);
                }
            }
            _ => {
                for i in 0..ring.len() {
                    let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
                    draw_line_segment_mut(
                        self,
                        (a.x as f32, a.y as f32),
                        (b.x as f32, b.y as f32),
                        color,
                    );
                }
            }
        }
    }
}

/// Stable, well separated color for a component label
pub fn label_color(label: i32) -> Rgb<u8> {
    let hue = (label as f64 * 0.618_033_988_75).fract() * 6.0;
    let sector = hue.floor() as u32;
    let f = hue - hue.floor();
    let (v, s) = (230.0, 0.75);
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb([r as u8, g as u8, b as u8])
}

/// Render a label buffer, background white and each component in its own color
pub fn colorize_labels(labels: &LabelBuffer) -> RgbImage {
    RgbImage::from_fn(labels.width(), labels.height(), |x, y| {
        match labels.label_at(x as i32, y as i32) {
            Some(label) => label_color(label),
            None => WHITE,
        }
    })
}
