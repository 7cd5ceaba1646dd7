//! The drawing-surface interface the interaction core drives.
//!
//! Everything the tool controller, node factory and graph model need from
//! the scene goes through [`Scene`]. [`crate::CanvasDocument`] is the
//! in-process implementation.

use crate::input::PointerEvent;
use crate::mindmap::{Node, NodeId};
use crate::shapes::{MindNode, SerializableColor, Shape, ShapeId, ShapeStyle};
use crate::tools::ToolKind;
use kurbo::{Point, Rect};
use thiserror::Error;

/// Scene errors.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Unknown object: {0}")]
    UnknownObject(ShapeId),
}

/// A property update routed through [`Scene::set_property`].
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeProperty {
    /// Center for mind-map nodes, top-left of the bounds for everything else.
    Position(Point),
    /// Only mind-map nodes can be hidden.
    Visible(bool),
    /// Node label or text region content.
    Text(String),
    StrokeColor(SerializableColor),
    FillColor(Option<SerializableColor>),
    /// Line endpoints.
    Endpoints(Point, Point),
}

/// The pointer events a tool listens to on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerHandlers {
    pub press: bool,
    pub moving: bool,
    pub release: bool,
}

impl PointerHandlers {
    pub const NONE: Self = Self {
        press: false,
        moving: false,
        release: false,
    };
    pub const PRESS: Self = Self {
        press: true,
        moving: false,
        release: false,
    };
    pub const DRAG: Self = Self {
        press: true,
        moving: true,
        release: true,
    };

    /// Whether this set reacts to `event`.
    pub fn handles(&self, event: &PointerEvent) -> bool {
        match event {
            PointerEvent::Down { .. } => self.press,
            PointerEvent::Move { .. } => self.moving,
            PointerEvent::Up { .. } => self.release,
            PointerEvent::DoubleClick { .. } => false,
        }
    }
}

/// A handler set attached to the canvas on behalf of one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerBinding {
    pub tool: ToolKind,
    pub handlers: PointerHandlers,
}

/// Events an individual object has subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectEvents {
    pub press: bool,
    pub moving: bool,
}

impl ObjectEvents {
    pub const NONE: Self = Self {
        press: false,
        moving: false,
    };
    /// Action-button presses and connection refresh on drag.
    pub const MIND_NODE: Self = Self {
        press: true,
        moving: true,
    };
}

/// What the scene did with a pointer event it handled natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeOutcome {
    /// Neither freehand drawing nor selection wanted the event.
    Ignored,
    /// Handled without anything worth reporting.
    Consumed,
    Selected(ShapeId),
    /// The dragged object moved.
    Moved(ShapeId),
    StrokeFinished(ShapeId),
}

/// The scene graph consumed by the interaction core.
pub trait Scene {
    /// Add an object on top of the draw order.
    fn add_object(&mut self, shape: Shape) -> ShapeId;

    /// Add a temporary object that never appears in snapshots.
    fn add_overlay(&mut self, shape: Shape) -> ShapeId;

    fn remove_object(&mut self, id: ShapeId) -> Option<Shape>;

    fn object(&self, id: ShapeId) -> Option<&Shape>;

    fn object_mut(&mut self, id: ShapeId) -> Option<&mut Shape>;

    /// All object ids, back to front.
    fn object_ids(&self) -> Vec<ShapeId>;

    fn send_to_back(&mut self, id: ShapeId);

    /// Remove every object.
    fn clear(&mut self);

    /// Generic property update. Returns false if the object does not
    /// exist or the property does not apply to it.
    fn set_property(&mut self, id: ShapeId, property: ShapeProperty) -> bool;

    /// Topmost visible, interactive object under a world point.
    fn hit_test(&self, point: Point) -> Option<ShapeId>;

    /// Every visible object under a world point, front to back,
    /// interactive or not.
    fn objects_at(&self, point: Point) -> Vec<ShapeId>;

    /// Screen position to world position.
    fn to_world(&self, screen: Point) -> Point;

    /// The world rectangle currently on screen.
    fn viewport(&self) -> Rect;

    fn set_interactive(&mut self, id: ShapeId, interactive: bool);

    fn is_interactive(&self, id: ShapeId) -> bool;

    fn attach_pointer_handlers(&mut self, binding: HandlerBinding);

    fn detach_pointer_handlers(&mut self);

    fn handler_bindings(&self) -> &[HandlerBinding];

    /// Toggle the built-in freehand brush.
    fn set_freehand_mode(&mut self, enabled: bool);

    fn freehand_mode(&self) -> bool;

    /// Style used for new freehand strokes.
    fn set_brush(&mut self, style: ShapeStyle);

    /// Toggle built-in click-to-select and drag-to-move.
    fn set_selection_enabled(&mut self, enabled: bool);

    fn selection_enabled(&self) -> bool;

    fn selected(&self) -> Option<ShapeId>;

    fn set_selected(&mut self, id: Option<ShapeId>);

    /// Feed a pointer event (world coordinates) to the built-in brush and
    /// selection behavior.
    fn native_pointer(&mut self, event: PointerEvent) -> NativeOutcome;

    fn subscribe(&mut self, id: ShapeId, events: ObjectEvents);

    fn subscriptions(&self, id: ShapeId) -> ObjectEvents;

    /// Replace several objects by one group. Mind-map nodes are never grouped.
    fn group(&mut self, ids: &[ShapeId]) -> Option<ShapeId>;

    /// Dissolve a group into its children.
    fn ungroup(&mut self, id: ShapeId) -> Option<Vec<ShapeId>>;

    /// The object carrying a mind-map node.
    fn node_shape(&self, node: &NodeId) -> Option<ShapeId>;

    fn request_redraw(&mut self);

    /// Return and reset the pending redraw flag.
    fn take_redraw(&mut self) -> bool;

    /// Serialize every non-overlay object. Never mutates the scene.
    fn snapshot(&self) -> Result<String, SceneError>;

    /// Replace the scene's objects with a snapshot's. On error the scene
    /// is left untouched.
    fn restore(&mut self, snapshot: &str) -> Result<(), SceneError>;

    fn len(&self) -> usize {
        self.object_ids().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mind_node(&self, id: &NodeId) -> Option<&MindNode> {
        self.object(self.node_shape(id)?)?.as_node()
    }

    fn mind_node_mut(&mut self, id: &NodeId) -> Option<&mut MindNode> {
        let shape = self.node_shape(id)?;
        self.object_mut(shape)?.as_node_mut()
    }

    /// Graph metadata of every mind-map node, back to front.
    fn nodes(&self) -> Vec<&Node> {
        self.object_ids()
            .into_iter()
            .filter_map(|id| self.object(id)?.as_node())
            .map(|n| &n.node)
            .collect()
    }
}
