//! Bounding boxes and eraser hit-testing.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;
use crate::scene::{Drawable, Geometry};

/// Axis-aligned bounding box in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    /// Center point of the box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// The larger of width and height.
    #[must_use]
    pub fn larger_dim(&self) -> f64 {
        self.width.max(self.height)
    }
}

/// Bounding box of a point list, or `None` for an empty list.
#[must_use]
pub fn points_bbox(points: &[Point]) -> Option<BBox> {
    let first = points.first()?;
    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BBox { left: min_x, top: min_y, width: max_x - min_x, height: max_y - min_y })
}

/// Bounding box of a drawable object.
#[must_use]
pub fn bounding_box(object: &Drawable) -> BBox {
    match &object.geometry {
        Geometry::Rect { width, height } => {
            BBox { left: object.left, top: object.top, width: *width, height: *height }
        }
        Geometry::Circle { radius } => BBox {
            left: object.left,
            top: object.top,
            width: radius * 2.0,
            height: radius * 2.0,
        },
        Geometry::Line { x2, y2 } => {
            let left = object.left.min(*x2);
            let top = object.top.min(*y2);
            BBox {
                left,
                top,
                width: (object.left - *x2).abs(),
                height: (object.top - *y2).abs(),
            }
        }
        Geometry::Path { points } => points_bbox(points).unwrap_or(BBox {
            left: object.left,
            top: object.top,
            width: 0.0,
            height: 0.0,
        }),
    }
}

/// Whether an erase circle at `center` with `radius` touches `bbox`.
///
/// Uses the coarse center-distance test: the circle hits when the distance
/// from the cursor to the box center is below the erase radius plus half the
/// box's larger dimension.
#[must_use]
pub fn erase_circle_hits(center: Point, radius: f64, bbox: &BBox) -> bool {
    let c = bbox.center();
    let distance = (center.x - c.x).hypot(center.y - c.y);
    distance < radius + bbox.larger_dim() / 2.0
}
