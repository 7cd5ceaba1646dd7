//! Freehand pen stroke.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_shape_id, point_to_segment_dist};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// A pen stroke (series of points).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Freehand {
    pub(crate) id: ShapeId,
    /// Points in the stroke.
    pub points: Vec<Point>,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Freehand {
    /// Start a stroke at `origin`.
    pub fn starting_at(origin: Point) -> Self {
        Self::from_points(vec![origin])
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            id: new_shape_id(),
            points,
            style: ShapeStyle::default(),
        }
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drop points that do not change the stroke's shape by more than `tolerance`.
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() >= 3 {
            self.points = rdp_simplify(&self.points, tolerance);
        }
    }
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let (max_index, max_dist) = points[1..points.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, perpendicular_distance(*p, first, last)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        // Junction point appears in both halves
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// Distance from `point` to the infinite line through `a` and `b`.
fn perpendicular_distance(point: Point, a: Point, b: Point) -> f64 {
    let d = b - a;
    let len = d.hypot();
    if len < f64::EPSILON {
        return (point - a).hypot();
    }
    ((point.x - a.x) * d.y - (point.y - a.y) * d.x).abs() / len
}

impl ShapeTrait for Freehand {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let mut iter = self.points.iter();
        let Some(first) = iter.next() else {
            return Rect::ZERO;
        };
        iter.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.style.stroke_width / 2.0;
        match self.points.as_slice() {
            [] => false,
            [only] => (point - *only).hypot() <= reach,
            points => points
                .windows(2)
                .any(|w| point_to_segment_dist(point, w[0], w[1]) <= reach),
        }
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        for point in &mut self.points {
            *point = affine * *point;
        }
    }
}
