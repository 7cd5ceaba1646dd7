//! Canvas document: the in-process scene graph.

use crate::camera::Camera;
use crate::input::PointerEvent;
use crate::mindmap::NodeId;
use crate::scene::{
    HandlerBinding, NativeOutcome, ObjectEvents, Scene, SceneError, ShapeProperty,
};
use crate::shapes::{Freehand, Group, Shape, ShapeId, ShapeStyle};
use kurbo::{Affine, Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Hit-test slack around strokes, in world units.
const HIT_TOLERANCE: f64 = 4.0;
/// Simplification tolerance applied to finished pen strokes.
const STROKE_SIMPLIFY_TOLERANCE: f64 = 1.0;
/// Width of the default pen brush.
const BRUSH_WIDTH: f64 = 3.0;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    objects: Vec<&'a Shape>,
}

#[derive(Deserialize)]
struct SnapshotOwned {
    objects: Vec<Shape>,
}

/// In-progress native gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    Stroke(ShapeId),
    Drag { id: ShapeId, last: Point },
}

/// A canvas document containing all shapes and their interaction state.
#[derive(Debug, Clone)]
pub struct CanvasDocument {
    /// Unique document identifier.
    pub id: String,
    /// All shapes in the document, keyed by ID.
    shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    z_order: Vec<ShapeId>,
    interactive: HashSet<ShapeId>,
    overlays: HashSet<ShapeId>,
    subscriptions: HashMap<ShapeId, ObjectEvents>,
    node_index: HashMap<NodeId, ShapeId>,
    bindings: Vec<HandlerBinding>,
    freehand: bool,
    brush: ShapeStyle,
    selection_enabled: bool,
    selected: Option<ShapeId>,
    gesture: Gesture,
    /// Camera for view transform.
    pub camera: Camera,
    /// Viewport size in screen pixels.
    pub viewport_size: Size,
    redraw: bool,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shapes: HashMap::new(),
            z_order: Vec::new(),
            interactive: HashSet::new(),
            overlays: HashSet::new(),
            subscriptions: HashMap::new(),
            node_index: HashMap::new(),
            bindings: Vec::new(),
            freehand: false,
            brush: ShapeStyle {
                stroke_width: BRUSH_WIDTH,
                ..ShapeStyle::default()
            },
            selection_enabled: false,
            selected: None,
            gesture: Gesture::Idle,
            camera: Camera::new(),
            viewport_size: Size::new(800.0, 600.0),
            redraw: false,
        }
    }

    /// Set the viewport size.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }

    /// Whether an object is a temporary overlay.
    pub fn is_overlay(&self, id: ShapeId) -> bool {
        self.overlays.contains(&id)
    }

    fn insert(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        if let Shape::Node(node) = &shape {
            self.node_index.insert(node.node_id().clone(), id);
        }
        self.z_order.push(id);
        self.shapes.insert(id, shape);
        self.redraw = true;
        id
    }

    fn forget(&mut self, id: ShapeId) {
        self.z_order.retain(|&z| z != id);
        self.interactive.remove(&id);
        self.overlays.remove(&id);
        self.subscriptions.remove(&id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        match self.gesture {
            Gesture::Stroke(s) | Gesture::Drag { id: s, .. } if s == id => {
                self.gesture = Gesture::Idle;
            }
            _ => {}
        }
    }

    fn translate(&mut self, id: ShapeId, delta: kurbo::Vec2) -> bool {
        match self.shapes.get_mut(&id) {
            Some(shape) => {
                shape.transform(Affine::translate(delta));
                self.redraw = true;
                true
            }
            None => false,
        }
    }

    fn native_freehand(&mut self, event: PointerEvent) -> NativeOutcome {
        let point = event.position();
        match (event, self.gesture) {
            (PointerEvent::Down { .. }, _) => {
                let mut stroke = Freehand::starting_at(point);
                stroke.style = self.brush.clone();
                let id = self.insert(Shape::Freehand(stroke));
                self.gesture = Gesture::Stroke(id);
                NativeOutcome::Consumed
            }
            (PointerEvent::Move { .. }, Gesture::Stroke(id)) => {
                if let Some(Shape::Freehand(stroke)) = self.shapes.get_mut(&id) {
                    stroke.add_point(point);
                    self.redraw = true;
                }
                NativeOutcome::Consumed
            }
            (PointerEvent::Up { .. }, Gesture::Stroke(id)) => {
                self.gesture = Gesture::Idle;
                let keep = match self.shapes.get_mut(&id) {
                    Some(Shape::Freehand(stroke)) if stroke.len() >= 2 => {
                        stroke.simplify(STROKE_SIMPLIFY_TOLERANCE);
                        true
                    }
                    _ => false,
                };
                if keep {
                    NativeOutcome::StrokeFinished(id)
                } else {
                    self.remove_object(id);
                    NativeOutcome::Consumed
                }
            }
            _ => NativeOutcome::Ignored,
        }
    }

    fn native_select(&mut self, event: PointerEvent) -> NativeOutcome {
        let point = event.position();
        match (event, self.gesture) {
            (PointerEvent::Down { .. }, _) => match self.hit_test(point) {
                Some(id) => {
                    self.selected = Some(id);
                    self.gesture = Gesture::Drag { id, last: point };
                    self.redraw = true;
                    NativeOutcome::Selected(id)
                }
                None => {
                    if self.selected.take().is_some() {
                        self.redraw = true;
                    }
                    NativeOutcome::Consumed
                }
            },
            (PointerEvent::Move { .. }, Gesture::Drag { id, last }) => {
                self.gesture = Gesture::Drag { id, last: point };
                if self.translate(id, point - last) {
                    NativeOutcome::Moved(id)
                } else {
                    NativeOutcome::Consumed
                }
            }
            (PointerEvent::Up { .. }, Gesture::Drag { .. }) => {
                self.gesture = Gesture::Idle;
                NativeOutcome::Consumed
            }
            _ => NativeOutcome::Ignored,
        }
    }
}

impl Scene for CanvasDocument {
    fn add_object(&mut self, shape: Shape) -> ShapeId {
        self.insert(shape)
    }

    fn add_overlay(&mut self, shape: Shape) -> ShapeId {
        let id = self.insert(shape);
        self.overlays.insert(id);
        id
    }

    fn remove_object(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.shapes.remove(&id)?;
        self.forget(id);
        if let Shape::Node(node) = &shape {
            self.node_index.remove(node.node_id());
        }
        self.redraw = true;
        Some(shape)
    }

    fn object(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    fn object_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    fn object_ids(&self) -> Vec<ShapeId> {
        self.z_order.clone()
    }

    fn send_to_back(&mut self, id: ShapeId) {
        if self.shapes.contains_key(&id) {
            self.z_order.retain(|&z| z != id);
            self.z_order.insert(0, id);
            self.redraw = true;
        }
    }

    fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
        self.interactive.clear();
        self.overlays.clear();
        self.subscriptions.clear();
        self.node_index.clear();
        self.selected = None;
        self.gesture = Gesture::Idle;
        self.redraw = true;
    }

    fn set_property(&mut self, id: ShapeId, property: ShapeProperty) -> bool {
        let Some(shape) = self.shapes.get_mut(&id) else {
            return false;
        };
        let applied = match (shape, property) {
            (Shape::Node(node), ShapeProperty::Position(p)) => {
                node.set_position(p);
                true
            }
            (shape, ShapeProperty::Position(p)) => {
                let origin = shape.bounds().origin();
                shape.transform(Affine::translate(p - origin));
                true
            }
            (Shape::Node(node), ShapeProperty::Visible(visible)) => {
                node.visible = visible;
                true
            }
            (Shape::Node(node), ShapeProperty::Text(text)) => {
                node.set_text(text);
                true
            }
            (Shape::Text(region), ShapeProperty::Text(text)) => {
                region.set_content(text);
                true
            }
            (Shape::Node(node), ShapeProperty::StrokeColor(color)) => {
                node.set_stroke(color);
                true
            }
            (Shape::Node(node), ShapeProperty::FillColor(Some(color))) => {
                node.set_fill(color);
                true
            }
            (Shape::Node(_), ShapeProperty::FillColor(None)) => false,
            (shape, ShapeProperty::StrokeColor(color)) => {
                shape.style_mut().stroke_color = color;
                true
            }
            (shape, ShapeProperty::FillColor(color)) => {
                shape.style_mut().fill_color = color;
                true
            }
            (Shape::Line(line), ShapeProperty::Endpoints(start, end)) => {
                line.set_endpoints(start, end);
                true
            }
            _ => false,
        };
        if applied {
            self.redraw = true;
        }
        applied
    }

    fn hit_test(&self, point: Point) -> Option<ShapeId> {
        self.z_order.iter().rev().copied().find(|id| {
            self.interactive.contains(id)
                && self
                    .shapes
                    .get(id)
                    .is_some_and(|s| s.is_visible() && s.hit_test(point, HIT_TOLERANCE))
        })
    }

    fn objects_at(&self, point: Point) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .copied()
            .filter(|id| {
                self.shapes
                    .get(id)
                    .is_some_and(|s| s.is_visible() && s.hit_test(point, HIT_TOLERANCE))
            })
            .collect()
    }

    fn to_world(&self, screen: Point) -> Point {
        self.camera.screen_to_world(screen)
    }

    fn viewport(&self) -> Rect {
        self.camera.visible_world_rect(self.viewport_size)
    }

    fn set_interactive(&mut self, id: ShapeId, interactive: bool) {
        if interactive && self.shapes.contains_key(&id) {
            self.interactive.insert(id);
        } else {
            self.interactive.remove(&id);
        }
    }

    fn is_interactive(&self, id: ShapeId) -> bool {
        self.interactive.contains(&id)
    }

    fn attach_pointer_handlers(&mut self, binding: HandlerBinding) {
        self.bindings.push(binding);
    }

    fn detach_pointer_handlers(&mut self) {
        self.bindings.clear();
    }

    fn handler_bindings(&self) -> &[HandlerBinding] {
        &self.bindings
    }

    fn set_freehand_mode(&mut self, enabled: bool) {
        self.freehand = enabled;
        if !enabled {
            if let Gesture::Stroke(id) = self.gesture {
                self.remove_object(id);
                self.gesture = Gesture::Idle;
            }
        }
    }

    fn freehand_mode(&self) -> bool {
        self.freehand
    }

    fn set_brush(&mut self, style: ShapeStyle) {
        self.brush = style;
    }

    fn set_selection_enabled(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
        if !enabled {
            self.selected = None;
            if matches!(self.gesture, Gesture::Drag { .. }) {
                self.gesture = Gesture::Idle;
            }
        }
    }

    fn selection_enabled(&self) -> bool {
        self.selection_enabled
    }

    fn selected(&self) -> Option<ShapeId> {
        self.selected
    }

    fn set_selected(&mut self, id: Option<ShapeId>) {
        self.selected = id.filter(|id| self.shapes.contains_key(id));
        self.redraw = true;
    }

    fn native_pointer(&mut self, event: PointerEvent) -> NativeOutcome {
        if self.freehand {
            self.native_freehand(event)
        } else if self.selection_enabled {
            self.native_select(event)
        } else {
            NativeOutcome::Ignored
        }
    }

    fn subscribe(&mut self, id: ShapeId, events: ObjectEvents) {
        if self.shapes.contains_key(&id) {
            self.subscriptions.insert(id, events);
        }
    }

    fn subscriptions(&self, id: ShapeId) -> ObjectEvents {
        self.subscriptions.get(&id).copied().unwrap_or_default()
    }

    fn group(&mut self, ids: &[ShapeId]) -> Option<ShapeId> {
        // Collect in z-order, skipping nodes and unknown ids
        let members: Vec<(usize, ShapeId)> = self
            .z_order
            .iter()
            .enumerate()
            .filter(|(_, id)| ids.contains(*id))
            .filter(|(_, id)| {
                self.shapes
                    .get(*id)
                    .is_some_and(|s| s.as_node().is_none())
            })
            .map(|(idx, id)| (idx, *id))
            .collect();
        if members.len() < 2 {
            return None;
        }

        // The group takes the slot of its frontmost member
        let frontmost = members.last().map(|(idx, _)| *idx)?;
        let insert_at = frontmost + 1 - members.len();
        let was_interactive = members.iter().any(|(_, id)| self.interactive.contains(id));

        let mut children = Vec::with_capacity(members.len());
        for (_, id) in &members {
            if let Some(shape) = self.shapes.remove(id) {
                self.forget(*id);
                children.push(shape);
            }
        }

        let group = Group::new(children);
        let group_id = group.id;
        self.shapes.insert(group_id, Shape::Group(group));
        self.z_order.insert(insert_at.min(self.z_order.len()), group_id);
        if was_interactive {
            self.interactive.insert(group_id);
        }
        self.redraw = true;
        Some(group_id)
    }

    fn ungroup(&mut self, id: ShapeId) -> Option<Vec<ShapeId>> {
        if !self.shapes.get(&id).is_some_and(Shape::is_group) {
            return None;
        }
        let z_pos = self.z_order.iter().position(|&z| z == id)?;
        let was_interactive = self.interactive.contains(&id);
        let Some(Shape::Group(group)) = self.shapes.remove(&id) else {
            return None;
        };
        self.forget(id);

        let mut child_ids = Vec::new();
        for (i, child) in group.ungroup().into_iter().enumerate() {
            let child_id = child.id();
            self.shapes.insert(child_id, child);
            self.z_order.insert(z_pos + i, child_id);
            if was_interactive {
                self.interactive.insert(child_id);
            }
            child_ids.push(child_id);
        }
        self.redraw = true;
        Some(child_ids)
    }

    fn node_shape(&self, node: &NodeId) -> Option<ShapeId> {
        self.node_index.get(node).copied()
    }

    fn request_redraw(&mut self) {
        self.redraw = true;
    }

    fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn snapshot(&self) -> Result<String, SceneError> {
        let objects = self
            .z_order
            .iter()
            .filter(|id| !self.overlays.contains(id))
            .filter_map(|id| self.shapes.get(id))
            .collect();
        Ok(serde_json::to_string(&SnapshotRef { objects })?)
    }

    fn restore(&mut self, snapshot: &str) -> Result<(), SceneError> {
        let SnapshotOwned { objects } = serde_json::from_str(snapshot)?;
        self.clear();
        for mut shape in objects {
            if let Shape::Node(node) = &mut shape {
                // A snapshot taken mid-edit must not come back hidden
                node.visible = true;
                node.editing = false;
            }
            self.insert(shape);
        }
        log::debug!("Restored {} objects", self.shapes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mindmap::{Node, NodeStyle};
    use crate::scene::PointerHandlers;
    use crate::shapes::{MindNode, Rectangle, SerializableColor, Text};
    use crate::tools::ToolKind;

    fn filled_rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
        let mut rect = Rectangle::new(Point::new(x, y), w, h);
        rect.style.fill_color = Some(SerializableColor::white());
        Shape::Rectangle(rect)
    }

    fn node_shape(x: f64, y: f64) -> Shape {
        Shape::Node(MindNode::new(Node::new(
            Point::new(x, y),
            "Idea",
            NodeStyle::default(),
        )))
    }

    #[test]
    fn test_add_remove_and_z_order() {
        let mut doc = CanvasDocument::new();
        let a = doc.add_object(filled_rect(0.0, 0.0, 10.0, 10.0));
        let b = doc.add_object(filled_rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(doc.object_ids(), vec![a, b]);

        doc.send_to_back(b);
        assert_eq!(doc.object_ids(), vec![b, a]);

        assert!(doc.remove_object(a).is_some());
        assert!(doc.remove_object(a).is_none());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_hit_test_respects_interactivity() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_object(filled_rect(0.0, 0.0, 100.0, 100.0));
        let point = Point::new(50.0, 50.0);

        assert_eq!(doc.hit_test(point), None);
        assert_eq!(doc.objects_at(point), vec![id]);

        doc.set_interactive(id, true);
        assert_eq!(doc.hit_test(point), Some(id));
    }

    #[test]
    fn test_hidden_node_is_not_hit() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_object(node_shape(0.0, 0.0));
        assert_eq!(doc.objects_at(Point::ZERO), vec![id]);
        assert!(doc.set_property(id, ShapeProperty::Visible(false)));
        assert!(doc.objects_at(Point::ZERO).is_empty());
    }

    #[test]
    fn test_node_index_tracks_nodes() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_object(node_shape(0.0, 0.0));
        let node_id = doc.object(id).and_then(Shape::as_node).map(|n| n.node_id().clone());
        let node_id = node_id.unwrap();
        assert_eq!(doc.node_shape(&node_id), Some(id));
        assert_eq!(doc.nodes().len(), 1);

        doc.remove_object(id);
        assert_eq!(doc.node_shape(&node_id), None);
    }

    #[test]
    fn test_set_property_text_resizes_node() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_object(node_shape(0.0, 0.0));
        let long = "x".repeat(60);
        assert!(doc.set_property(id, ShapeProperty::Text(long)));
        let width = doc.object(id).map(|s| s.bounds().width()).unwrap_or_default();
        assert!(width > 200.0);
        assert!(doc.take_redraw());
        assert!(!doc.take_redraw());
    }

    #[test]
    fn test_set_property_rejects_mismatches() {
        let mut doc = CanvasDocument::new();
        let rect = doc.add_object(filled_rect(0.0, 0.0, 10.0, 10.0));
        assert!(!doc.set_property(rect, ShapeProperty::Visible(false)));
        assert!(!doc.set_property(rect, ShapeProperty::Text("hi".into())));
        assert!(!doc.set_property(Uuid::new_v4(), ShapeProperty::Visible(true)));

        assert!(doc.set_property(rect, ShapeProperty::Position(Point::new(30.0, 40.0))));
        let bounds = doc.object(rect).map(Shape::bounds).unwrap_or_default();
        assert!((bounds.x0 - 30.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_handler_bindings() {
        let mut doc = CanvasDocument::new();
        doc.attach_pointer_handlers(HandlerBinding {
            tool: ToolKind::Rectangle,
            handlers: PointerHandlers::DRAG,
        });
        assert_eq!(doc.handler_bindings().len(), 1);
        doc.detach_pointer_handlers();
        assert!(doc.handler_bindings().is_empty());
    }

    #[test]
    fn test_native_freehand_stroke() {
        let mut doc = CanvasDocument::new();
        doc.set_freehand_mode(true);
        doc.native_pointer(PointerEvent::down(Point::new(0.0, 0.0)));
        doc.native_pointer(PointerEvent::moved(Point::new(10.0, 10.0)));
        let outcome = doc.native_pointer(PointerEvent::up(Point::new(20.0, 5.0)));
        assert!(matches!(outcome, NativeOutcome::StrokeFinished(_)));
        assert_eq!(doc.len(), 1);

        // A click without movement leaves nothing behind
        doc.native_pointer(PointerEvent::down(Point::new(50.0, 50.0)));
        doc.native_pointer(PointerEvent::up(Point::new(50.0, 50.0)));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_native_select_drag() {
        let mut doc = CanvasDocument::new();
        let id = doc.add_object(filled_rect(0.0, 0.0, 100.0, 100.0));
        doc.set_interactive(id, true);
        doc.set_selection_enabled(true);

        let outcome = doc.native_pointer(PointerEvent::down(Point::new(50.0, 50.0)));
        assert_eq!(outcome, NativeOutcome::Selected(id));
        let outcome = doc.native_pointer(PointerEvent::moved(Point::new(60.0, 70.0)));
        assert_eq!(outcome, NativeOutcome::Moved(id));
        doc.native_pointer(PointerEvent::up(Point::new(60.0, 70.0)));

        let bounds = doc.object(id).map(Shape::bounds).unwrap_or_default();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 20.0).abs() < f64::EPSILON);

        // Press on empty space clears the selection
        doc.native_pointer(PointerEvent::down(Point::new(500.0, 500.0)));
        assert_eq!(doc.selected(), None);
    }

    #[test]
    fn test_group_and_ungroup() {
        let mut doc = CanvasDocument::new();
        let a = doc.add_object(filled_rect(0.0, 0.0, 10.0, 10.0));
        let b = doc.add_object(filled_rect(20.0, 0.0, 10.0, 10.0));
        let node = doc.add_object(node_shape(500.0, 500.0));

        let group = doc.group(&[a, b, node]).unwrap();
        assert_eq!(doc.len(), 2);
        assert!(doc.object(node).is_some());

        let children = doc.ungroup(group).unwrap();
        assert_eq!(children, vec![a, b]);
        assert_eq!(doc.len(), 3);
        assert!(doc.ungroup(node).is_none());
    }

    #[test]
    fn test_snapshot_skips_overlays_and_restores() {
        let mut doc = CanvasDocument::new();
        doc.add_object(filled_rect(0.0, 0.0, 10.0, 10.0));
        let node = doc.add_object(node_shape(200.0, 200.0));
        doc.set_property(node, ShapeProperty::Visible(false));
        let overlay = doc.add_overlay(Shape::Text(Text::new(Point::ZERO, "draft".into())));
        assert!(doc.is_overlay(overlay));
        assert_eq!(doc.len(), 3);

        let snapshot = doc.snapshot().unwrap();
        assert_eq!(doc.len(), 3);

        let mut other = CanvasDocument::new();
        other.restore(&snapshot).unwrap();
        assert_eq!(other.len(), 2);
        let restored = other.nodes();
        assert_eq!(restored.len(), 1);
        let shape = other.node_shape(&restored[0].id).and_then(|id| other.object(id));
        assert!(shape.is_some_and(Shape::is_visible));
    }

    #[test]
    fn test_failed_restore_keeps_scene() {
        let mut doc = CanvasDocument::new();
        doc.add_object(filled_rect(0.0, 0.0, 10.0, 10.0));
        assert!(doc.restore("{ not json").is_err());
        assert_eq!(doc.len(), 1);
    }
}
