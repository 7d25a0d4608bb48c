use image::{GrayImage, Luma};
use tracing::warn;

use crate::models::{Contour, Point};

/// Label of a pixel the scan has not reached yet
pub const UNLABELED: i32 = 0;
/// Label of a background pixel confirmed while tracing a contour
pub const BACKGROUND_MARK: i32 = -1;

/// Clockwise neighbour offsets with y pointing down: E, SE, S, SW, W, NW, N, NE
const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// First neighbour examined when an outer contour starts
const OUTER_START: usize = 7;
/// First neighbour examined when an inner contour starts
const INNER_START: usize = 3;

/// Per-pixel component labels produced by a tracing run.
///
/// `0` is unlabeled, `-1` is background confirmed during tracing and any
/// positive value is a component label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelBuffer {
    width: u32,
    height: u32,
    data: Vec<i32>,
}

impl LabelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![UNLABELED; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Raw value at a pixel; positions outside the buffer read as unlabeled
    pub fn get(&self, x: i32, y: i32) -> i32 {
        self.index(x, y).map_or(UNLABELED, |i| self.data[i])
    }

    /// Component label at a pixel, if any
    pub fn label_at(&self, x: i32, y: i32) -> Option<i32> {
        let value = self.get(x, y);
        (value > 0).then_some(value)
    }

    pub(crate) fn set(&mut self, x: i32, y: i32, value: i32) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = value;
        }
    }

    /// Distinct component labels, ascending
    pub fn labels(&self) -> Vec<i32> {
        let mut labels: Vec<i32> = self.data.iter().copied().filter(|v| *v > 0).collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Number of pixels carrying `label`
    pub fn count(&self, label: i32) -> usize {
        self.data.iter().filter(|v| **v == label).count()
    }

    /// Binary image with `object` on every labeled pixel
    pub fn to_mask(&self, object: u8, background: u8) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x as i32, y as i32) > 0 {
                Luma([object])
            } else {
                Luma([background])
            }
        })
    }

    /// Drop a one pixel frame added before tracing
    pub(crate) fn strip_border(&self) -> LabelBuffer {
        let width = self.width.saturating_sub(2);
        let height = self.height.saturating_sub(2);
        let mut stripped = LabelBuffer::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                stripped.set(x, y, self.get(x + 1, y + 1));
            }
        }
        stripped
    }

    /// Overlay another buffer of the same size: its labels win, its background
    /// marks only fill unlabeled pixels
    pub(crate) fn merge(&mut self, other: &LabelBuffer) {
        for (mine, theirs) in self.data.iter_mut().zip(&other.data) {
            if *theirs > 0 || (*theirs == BACKGROUND_MARK && *mine == UNLABELED) {
                *mine = *theirs;
            }
        }
    }
}

/// Outer boundary and holes of one component, in scan coordinates
#[derive(Debug, Clone)]
pub(crate) struct TracedComponent {
    pub label: i32,
    pub outer: Contour,
    pub holes: Vec<Contour>,
}

/// Single-pass labeling by contour tracing over one binary image
pub(crate) struct ComponentScanner<'a> {
    image: &'a GrayImage,
    object: u8,
    labels: LabelBuffer,
}

impl<'a> ComponentScanner<'a> {
    pub fn new(image: &'a GrayImage, object: u8) -> Self {
        Self {
            image,
            object,
            labels: LabelBuffer::new(image.width(), image.height()),
        }
    }

    fn is_object(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.image.width() as i32 || y >= self.image.height() as i32 {
            return false;
        }
        self.image.get_pixel(x as u32, y as u32)[0] == self.object
    }

    /// Scan the image row by row, numbering components from `first_label`
    pub fn scan(mut self, first_label: i32) -> (Vec<TracedComponent>, LabelBuffer) {
        let mut components: Vec<TracedComponent> = Vec::new();
        let mut next_label = first_label;
        let (width, height) = (self.image.width() as i32, self.image.height() as i32);

        for y in 0..height {
            for x in 0..width {
                if !self.is_object(x, y) {
                    continue;
                }

                if !self.is_object(x, y - 1) && self.labels.get(x, y) == UNLABELED {
                    let label = next_label;
                    next_label += 1;
                    self.labels.set(x, y, label);
                    let outer = self.trace(Point::new(x, y), label, OUTER_START);
                    components.push(TracedComponent {
                        label,
                        outer,
                        holes: Vec::new(),
                    });
                }

                if !self.is_object(x, y + 1) && self.labels.get(x, y + 1) != BACKGROUND_MARK {
                    let mut label = self.labels.get(x, y);
                    if label == UNLABELED {
                        label = self.labels.get(x - 1, y);
                        self.labels.set(x, y, label);
                    }
                    let hole = self.trace(Point::new(x, y), label, INNER_START);
                    // components are pushed in label order
                    match components.binary_search_by_key(&label, |c| c.label) {
                        Ok(i) => components[i].holes.push(hole),
                        Err(_) => warn!(x, y, label, "inner contour has no owning blob, skipped"),
                    }
                } else if self.labels.get(x, y) == UNLABELED {
                    let west = self.labels.get(x - 1, y);
                    self.labels.set(x, y, west);
                }
            }
        }

        (components, self.labels)
    }

    /// Follow a boundary from `start` until it closes on its second point
    fn trace(&mut self, start: Point, label: i32, offset: usize) -> Contour {
        let mut points = vec![start];
        let Some((second, mut direction)) = self.next_point(start, offset) else {
            return Contour::new(points);
        };

        let mut current = second;
        loop {
            points.push(current);
            self.labels.set(current.x, current.y, label);
            // previous point sits at direction + 4, the search resumes two steps past it
            let Some((next, next_direction)) = self.next_point(current, (direction + 6) % 8) else {
                break;
            };
            if current == start && next == second {
                break;
            }
            current = next;
            direction = next_direction;
        }

        Contour::new(points)
    }

    /// Clockwise search for the next object neighbour, marking the background
    /// neighbours passed on the way
    fn next_point(&mut self, p: Point, start: usize) -> Option<(Point, usize)> {
        for k in 0..NEIGHBOURS.len() {
            let direction = (start + k) % NEIGHBOURS.len();
            let (dx, dy) = NEIGHBOURS[direction];
            let (x, y) = (p.x + dx, p.y + dy);
            if self.is_object(x, y) {
                return Some((Point::new(x, y), direction));
            }
            self.labels.set(x, y, BACKGROUND_MARK);
        }
        None
    }
}
