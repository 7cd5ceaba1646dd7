//! Straight line segment, used for mind-map connection edges.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_shape_id, point_to_segment_dist};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// A line segment between two points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub(crate) id: ShapeId,
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Line {
    /// Create a new line.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: new_shape_id(),
            start,
            end,
            style: ShapeStyle::default(),
        }
    }

    /// Move both endpoints.
    pub fn set_endpoints(&mut self, start: Point, end: Point) {
        self.start = start;
        self.end = end;
    }
}

impl ShapeTrait for Line {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end)
            <= tolerance + self.style.stroke_width / 2.0
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.start = affine * self.start;
        self.end = affine * self.end;
    }
}
