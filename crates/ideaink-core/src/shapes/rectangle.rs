//! Rectangle shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: new_shape_id(),
            position,
            width,
            height,
            style: ShapeStyle::default(),
        }
    }

    /// Create a rectangle from two corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let mut rect = Self::new(p1, 0.0, 0.0);
        rect.set_corners(p1, p2);
        rect
    }

    /// Reshape to span the two corner points (min-corner + width/height).
    pub fn set_corners(&mut self, p1: Point, p2: Point) {
        self.position = Point::new(p1.x.min(p2.x), p1.y.min(p2.y));
        self.width = (p2.x - p1.x).abs();
        self.height = (p2.y - p1.y).abs();
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.as_rect();
        if self.style.has_fill() {
            // Filled: hit anywhere inside
            rect.inflate(tolerance, tolerance).contains(point)
        } else {
            // Outline only: hit on the border
            let outer = rect.inflate(
                tolerance + self.style.stroke_width / 2.0,
                tolerance + self.style.stroke_width / 2.0,
            );
            let inner = rect.inflate(
                -(tolerance + self.style.stroke_width / 2.0),
                -(tolerance + self.style.stroke_width / 2.0),
            );
            outer.contains(point) && !inner.contains(point)
        }
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        // Axis-aligned scale only
        let scale = affine.as_coeffs();
        self.width *= scale[0].abs();
        self.height *= scale[3].abs();
    }
}
