//! Mind-map node: rounded background, centered text and two action buttons.

use super::text::measure_text;
use super::{SerializableColor, ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use crate::mindmap::{Node, NodeId};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Font size of node labels.
pub const NODE_FONT_SIZE: f64 = 16.0;
/// Space added around the label on each axis.
const LABEL_PADDING: f64 = 40.0;
pub const MIN_NODE_WIDTH: f64 = 200.0;
pub const MIN_NODE_HEIGHT: f64 = 100.0;
/// Side length of an action button.
pub const AFFORDANCE_SIZE: f64 = 30.0;
/// Horizontal offset of each button from the node's center line.
const AFFORDANCE_OFFSET_X: f64 = 20.0;
/// Distance from the bottom edge to a button's center.
const AFFORDANCE_INSET: f64 = 20.0;

/// Clickable action buttons on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Affordance {
    Expand,
    Summarize,
}

impl Affordance {
    pub const ALL: [Affordance; 2] = [Affordance::Expand, Affordance::Summarize];

    fn offset_x(self) -> f64 {
        match self {
            Affordance::Expand => -AFFORDANCE_OFFSET_X,
            Affordance::Summarize => AFFORDANCE_OFFSET_X,
        }
    }
}

/// Scene object carrying a mind-map node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindNode {
    pub(crate) id: ShapeId,
    /// Graph metadata.
    pub node: Node,
    pub width: f64,
    pub height: f64,
    /// Hidden while a text overlay stands in for it.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Set between `begin_text_edit` and its commit.
    #[serde(default)]
    pub editing: bool,
    style: ShapeStyle,
}

fn default_visible() -> bool {
    true
}

impl MindNode {
    pub fn new(node: Node) -> Self {
        let mut shape = Self {
            id: new_shape_id(),
            style: style_for(&node),
            node,
            width: MIN_NODE_WIDTH,
            height: MIN_NODE_HEIGHT,
            visible: true,
            editing: false,
        };
        shape.update_size();
        shape
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node.id
    }

    pub fn text(&self) -> &str {
        &self.node.text
    }

    /// Replace the label and re-layout.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.node.text = text.into();
        self.update_size();
    }

    pub fn position(&self) -> Point {
        self.node.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.node.position = position;
    }

    /// Recompute the background size from the label.
    ///
    /// Buttons are positioned relative to the size, so they follow
    /// automatically. Safe to call any number of times.
    pub fn update_size(&mut self) {
        let label = measure_text(&self.node.text, NODE_FONT_SIZE);
        self.width = (label.width + LABEL_PADDING).max(MIN_NODE_WIDTH);
        self.height = (label.height + LABEL_PADDING).max(MIN_NODE_HEIGHT);
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Set the stroke color of both the node and its drawn outline.
    pub fn set_stroke(&mut self, color: SerializableColor) {
        self.node.style.stroke = color;
        self.style = style_for(&self.node);
    }

    /// Set the background fill.
    pub fn set_fill(&mut self, color: SerializableColor) {
        self.node.style.fill = color;
        self.style = style_for(&self.node);
    }

    /// Center of an action button.
    pub fn affordance_center(&self, affordance: Affordance) -> Point {
        self.node.position
            + Vec2::new(
                affordance.offset_x(),
                self.height / 2.0 - AFFORDANCE_INSET,
            )
    }

    /// Clickable area of an action button.
    pub fn affordance_rect(&self, affordance: Affordance) -> Rect {
        Rect::from_center_size(
            self.affordance_center(affordance),
            (AFFORDANCE_SIZE, AFFORDANCE_SIZE),
        )
    }

    /// Which action button, if any, lies under `point`.
    pub fn affordance_at(&self, point: Point) -> Option<Affordance> {
        Affordance::ALL
            .into_iter()
            .find(|a| self.affordance_rect(*a).contains(point))
    }
}

fn style_for(node: &Node) -> ShapeStyle {
    ShapeStyle {
        stroke_color: node.style.stroke,
        stroke_width: 2.0,
        fill_color: Some(node.style.fill),
        opacity: 1.0,
    }
}

impl ShapeTrait for MindNode {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_center_size(self.node.position, self.size())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        // Size follows the label, so only the position moves
        self.node.position = affine * self.node.position;
    }
}
