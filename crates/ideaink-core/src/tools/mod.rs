//! Tool system for the whiteboard.
//!
//! Exactly one [`ToolKind`] is active at a time. The active tool decides
//! which canvas pointer handlers are attached and which objects respond to
//! the pointer. Rectangle and ellipse drawing run through a [`Draft`]: a
//! placeholder shape inserted on press, reshaped on move and settled on
//! release.

use crate::scene::PointerHandlers;
use crate::shapes::{Ellipse, Rectangle, Shape, ShapeId, ShapeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest rectangle side that survives release.
pub const MIN_RECT_SIDE: f64 = 5.0;
/// Smallest ellipse radius that survives release.
pub const MIN_ELLIPSE_RADIUS: f64 = 3.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Pen,
    Rectangle,
    Ellipse,
    Text,
    MindMap,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Select,
        ToolKind::Pen,
        ToolKind::Rectangle,
        ToolKind::Ellipse,
        ToolKind::Text,
        ToolKind::MindMap,
    ];

    /// Canvas pointer handlers this tool needs.
    ///
    /// Select and pen rely on the scene's own selection and brush.
    pub fn pointer_handlers(self) -> PointerHandlers {
        match self {
            ToolKind::Select | ToolKind::Pen => PointerHandlers::NONE,
            ToolKind::Rectangle | ToolKind::Ellipse => PointerHandlers::DRAG,
            ToolKind::Text | ToolKind::MindMap => PointerHandlers::PRESS,
        }
    }

    /// Whether `shape` responds to the pointer while this tool is active.
    pub fn makes_interactive(self, shape: &Shape) -> bool {
        match self {
            ToolKind::Select => true,
            ToolKind::Text => shape.is_text(),
            _ => false,
        }
    }

    /// Whether mind-map action buttons and drag refresh are live.
    pub fn routes_node_events(self) -> bool {
        matches!(self, ToolKind::Select | ToolKind::MindMap)
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pen => "pen",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Ellipse => "ellipse",
            ToolKind::Text => "text",
            ToolKind::MindMap => "mindmap",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tool: {s}"))
    }
}

/// Shape family being drawn by drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    Rectangle,
    Ellipse,
}

impl DraftKind {
    fn for_tool(tool: ToolKind) -> Option<Self> {
        match tool {
            ToolKind::Rectangle => Some(DraftKind::Rectangle),
            ToolKind::Ellipse => Some(DraftKind::Ellipse),
            _ => None,
        }
    }

    /// Zero-size placeholder anchored at `anchor`.
    pub fn placeholder(self, anchor: Point, style: &ShapeStyle) -> Shape {
        match self {
            DraftKind::Rectangle => {
                let mut rect = Rectangle::new(anchor, 0.0, 0.0);
                rect.style = style.clone();
                Shape::Rectangle(rect)
            }
            DraftKind::Ellipse => {
                let mut ellipse = Ellipse::circle(anchor, 0.0);
                ellipse.style = style.clone();
                Shape::Ellipse(ellipse)
            }
        }
    }
}

/// A shape being drawn by drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draft {
    pub shape: ShapeId,
    pub anchor: Point,
    pub kind: DraftKind,
}

impl Draft {
    /// Reshape the placeholder to span anchor..`current`.
    pub fn reshape(&self, shape: &mut Shape, current: Point) {
        match shape {
            Shape::Rectangle(rect) => rect.set_corners(self.anchor, current),
            Shape::Ellipse(ellipse) => ellipse.set_corners(self.anchor, current),
            _ => {}
        }
    }
}

/// Decide whether a released draft is kept.
///
/// A draft whose dimensions are all under the minimum was an accidental
/// click and is dropped. Otherwise any undersized dimension is raised to
/// the minimum and the shape is kept.
pub fn settle_draft(shape: &mut Shape) -> bool {
    match shape {
        Shape::Rectangle(rect) => {
            if rect.width < MIN_RECT_SIDE && rect.height < MIN_RECT_SIDE {
                return false;
            }
            rect.width = rect.width.max(MIN_RECT_SIDE);
            rect.height = rect.height.max(MIN_RECT_SIDE);
            true
        }
        Shape::Ellipse(ellipse) => {
            if ellipse.radius_x < MIN_ELLIPSE_RADIUS && ellipse.radius_y < MIN_ELLIPSE_RADIUS {
                return false;
            }
            ellipse.radius_x = ellipse.radius_x.max(MIN_ELLIPSE_RADIUS);
            ellipse.radius_y = ellipse.radius_y.max(MIN_ELLIPSE_RADIUS);
            true
        }
        _ => true,
    }
}

/// Manages the current tool and its in-progress draft.
#[derive(Debug, Clone, Default)]
pub struct ToolController {
    /// Currently selected tool.
    current: ToolKind,
    draft: Option<Draft>,
    /// Current style to apply to new shapes.
    pub current_style: ShapeStyle,
}

impl ToolController {
    /// Create a new tool controller.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ToolKind {
        self.current
    }

    /// Switch tools. Returns the draft that was in progress, which the
    /// caller must discard from the scene.
    pub fn set_tool(&mut self, tool: ToolKind) -> Option<Draft> {
        self.current = tool;
        self.draft.take()
    }

    /// The shape family the current tool draws by drag, if any.
    pub fn draft_kind(&self) -> Option<DraftKind> {
        DraftKind::for_tool(self.current)
    }

    /// Record the placeholder inserted for a draft.
    pub fn track_draft(&mut self, draft: Draft) {
        self.draft = Some(draft);
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn take_draft(&mut self) -> Option<Draft> {
        self.draft.take()
    }

    /// Check if a tool interaction is active.
    pub fn is_active(&self) -> bool {
        self.draft.is_some()
    }
}
