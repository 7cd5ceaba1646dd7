//! Shape definitions for the whiteboard.

mod ellipse;
mod freehand;
mod group;
mod image;
mod line;
mod node;
mod rectangle;
mod text;

pub use ellipse::Ellipse;
pub use freehand::Freehand;
pub use group::Group;
pub use image::{Image, ImageFormat};
pub use line::Line;
pub use node::{
    AFFORDANCE_SIZE, Affordance, MIN_NODE_HEIGHT, MIN_NODE_WIDTH, MindNode, NODE_FONT_SIZE,
};
pub use rectangle::Rectangle;
pub use text::Text;
pub(crate) use text::measure_text;

use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Returns `None` for anything else.
    pub fn from_hex(color: &str) -> Option<Self> {
        if color == "transparent" {
            return Some(Self::transparent());
        }
        let hex = color.trim().strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = channel(&hex[0..1])? * 17;
                let g = channel(&hex[1..2])? * 17;
                let b = channel(&hex[2..3])? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb` (or `#rrggbbaa` when not fully opaque).
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Whether the color is fully transparent.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width.
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ShapeStyle {
    /// Outline-only style with the given stroke color.
    pub fn stroked(color: SerializableColor) -> Self {
        Self {
            stroke_color: color,
            ..Self::default()
        }
    }

    /// Whether the shape has a visible fill.
    pub fn has_fill(&self) -> bool {
        self.fill_color.is_some_and(|c| !c.is_transparent())
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
            opacity: 1.0,
        }
    }
}

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = kurbo::Vec2::new(b.x - a.x, b.y - a.y);
    let pv = kurbo::Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Get the bounding box in world coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point (in world coordinates) hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;

    /// Apply a transform to this shape.
    fn transform(&mut self, affine: Affine);
}

/// Enum wrapper for all shape types (for serialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Line(Line),
    Freehand(Freehand),
    Text(Text),
    Group(Group),
    Image(Image),
    Node(MindNode),
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        match self {
            Shape::Rectangle(s) => s.id(),
            Shape::Ellipse(s) => s.id(),
            Shape::Line(s) => s.id(),
            Shape::Freehand(s) => s.id(),
            Shape::Text(s) => s.id(),
            Shape::Group(s) => s.id(),
            Shape::Image(s) => s.id(),
            Shape::Node(s) => s.id(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rectangle(s) => s.bounds(),
            Shape::Ellipse(s) => s.bounds(),
            Shape::Line(s) => s.bounds(),
            Shape::Freehand(s) => s.bounds(),
            Shape::Text(s) => s.bounds(),
            Shape::Group(s) => s.bounds(),
            Shape::Image(s) => s.bounds(),
            Shape::Node(s) => s.bounds(),
        }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            Shape::Rectangle(s) => s.hit_test(point, tolerance),
            Shape::Ellipse(s) => s.hit_test(point, tolerance),
            Shape::Line(s) => s.hit_test(point, tolerance),
            Shape::Freehand(s) => s.hit_test(point, tolerance),
            Shape::Text(s) => s.hit_test(point, tolerance),
            Shape::Group(s) => s.hit_test(point, tolerance),
            Shape::Image(s) => s.hit_test(point, tolerance),
            Shape::Node(s) => s.hit_test(point, tolerance),
        }
    }

    pub fn style(&self) -> &ShapeStyle {
        match self {
            Shape::Rectangle(s) => s.style(),
            Shape::Ellipse(s) => s.style(),
            Shape::Line(s) => s.style(),
            Shape::Freehand(s) => s.style(),
            Shape::Text(s) => s.style(),
            Shape::Group(s) => s.style(),
            Shape::Image(s) => s.style(),
            Shape::Node(s) => s.style(),
        }
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        match self {
            Shape::Rectangle(s) => s.style_mut(),
            Shape::Ellipse(s) => s.style_mut(),
            Shape::Line(s) => s.style_mut(),
            Shape::Freehand(s) => s.style_mut(),
            Shape::Text(s) => s.style_mut(),
            Shape::Group(s) => s.style_mut(),
            Shape::Image(s) => s.style_mut(),
            Shape::Node(s) => s.style_mut(),
        }
    }

    pub fn transform(&mut self, affine: Affine) {
        match self {
            Shape::Rectangle(s) => s.transform(affine),
            Shape::Ellipse(s) => s.transform(affine),
            Shape::Line(s) => s.transform(affine),
            Shape::Freehand(s) => s.transform(affine),
            Shape::Text(s) => s.transform(affine),
            Shape::Group(s) => s.transform(affine),
            Shape::Image(s) => s.transform(affine),
            Shape::Node(s) => s.transform(affine),
        }
    }

    /// Check if this shape is a group.
    pub fn is_group(&self) -> bool {
        matches!(self, Shape::Group(_))
    }

    /// Check if this shape is an editable text region.
    pub fn is_text(&self) -> bool {
        matches!(self, Shape::Text(_))
    }

    /// Get the mind-map node if this shape is one.
    pub fn as_node(&self) -> Option<&MindNode> {
        match self {
            Shape::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Get the mutable mind-map node if this shape is one.
    pub fn as_node_mut(&mut self) -> Option<&mut MindNode> {
        match self {
            Shape::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Get the text region if this shape is one.
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Whether the shape is drawn at all. Only mind-map nodes can be hidden.
    pub fn is_visible(&self) -> bool {
        match self {
            Shape::Node(n) => n.visible,
            _ => true,
        }
    }
}

/// Generate a fresh shape identifier.
pub(crate) fn new_shape_id() -> ShapeId {
    Uuid::new_v4()
}
