//! Ellipse shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// An ellipse shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    /// Center point.
    pub center: Point,
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Ellipse {
    /// Create a new ellipse.
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            id: new_shape_id(),
            center,
            radius_x,
            radius_y,
            style: ShapeStyle::default(),
        }
    }

    /// Create a circle.
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center, radius, radius)
    }

    /// Reshape to fill the box spanned by two corner points.
    ///
    /// Each radius is half the absolute delta on its own axis.
    pub fn set_corners(&mut self, p1: Point, p2: Point) {
        self.radius_x = (p2.x - p1.x).abs() / 2.0;
        self.radius_y = (p2.y - p1.y).abs() / 2.0;
        self.center = Point::new(
            p1.x.min(p2.x) + self.radius_x,
            p1.y.min(p2.y) + self.radius_y,
        );
    }
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let half_sw = self.style.stroke_width / 2.0;
        let dx_outer = (point.x - self.center.x) / (self.radius_x + tolerance + half_sw);
        let dy_outer = (point.y - self.center.y) / (self.radius_y + tolerance + half_sw);
        if dx_outer * dx_outer + dy_outer * dy_outer > 1.0 {
            return false;
        }
        if self.style.has_fill() {
            return true;
        }
        // Outline only: reject if inside inner ellipse
        let inner_rx = (self.radius_x - tolerance - half_sw).max(0.0);
        let inner_ry = (self.radius_y - tolerance - half_sw).max(0.0);
        if inner_rx < f64::EPSILON || inner_ry < f64::EPSILON {
            return true;
        }
        let dx_inner = (point.x - self.center.x) / inner_rx;
        let dy_inner = (point.y - self.center.y) / inner_ry;
        dx_inner * dx_inner + dy_inner * dy_inner > 1.0
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.center = affine * self.center;
        let scale = affine.as_coeffs();
        self.radius_x *= scale[0].abs();
        self.radius_y *= scale[3].abs();
    }
}
