//! Group shape for combining multiple shapes.

use super::{Shape, ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// Shapes moved and hit-tested as one unit. Groups may nest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub(crate) id: ShapeId,
    /// Child shapes in draw order.
    pub children: Vec<Shape>,
    /// Unused by rendering; kept so every shape exposes a style.
    style: ShapeStyle,
}

impl Group {
    /// Create a new group from a list of shapes.
    pub fn new(children: Vec<Shape>) -> Self {
        Self {
            id: new_shape_id(),
            children,
            style: ShapeStyle::default(),
        }
    }

    /// Get the children of this group.
    pub fn children(&self) -> &[Shape] {
        &self.children
    }

    /// Dissolve this group and return its children.
    pub fn ungroup(self) -> Vec<Shape> {
        self.children
    }
}

impl ShapeTrait for Group {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let mut iter = self.children.iter();
        let Some(first) = iter.next() else {
            return Rect::ZERO;
        };
        iter.fold(first.bounds(), |acc, child| acc.union(child.bounds()))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.children
            .iter()
            .any(|child| child.hit_test(point, tolerance))
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        for child in &mut self.children {
            child.transform(affine);
        }
    }
}
