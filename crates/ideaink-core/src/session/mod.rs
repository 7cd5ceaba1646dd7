//! Interaction session: one open whiteboard and everything the user is
//! doing with it.
//!
//! A [`Session`] owns the scene, the tool controller, the edit state and
//! the in-flight tracker. All scene mutation goes through it, on the
//! thread that dispatches pointer events.

mod edit;

pub use edit::EditState;

use crate::activity::{ActivityGuard, ActivityTracker};
use crate::canvas::CanvasDocument;
use crate::input::PointerEvent;
use crate::mindmap::{
    GraphView, NodeId, NodeStyle, begin_text_edit, commit_text_edit, connect, create_node,
    refresh_connections, remove_node, wire_node,
};
use crate::scene::{HandlerBinding, NativeOutcome, Scene, SceneError, ShapeProperty};
use crate::shapes::{
    Affordance, Image, ImageFormat, SerializableColor, Shape, ShapeId, ShapeStyle, Text,
};
use crate::storage::Workspace;
use crate::tools::{Draft, ToolController, ToolKind, settle_draft};
use kurbo::{Point, Size};
use std::collections::HashSet;

/// Free space a new mind-map node needs around its press point.
pub const NODE_CLEARANCE: f64 = 30.0;
/// Label of a node placed by hand.
pub const DEFAULT_NODE_TEXT: &str = "New Idea";
/// Content of a freshly placed text region.
pub const DEFAULT_TEXT: &str = "Edit this text";
/// Share of the viewport an imported image may cover.
const IMAGE_VIEWPORT_SHARE: f64 = 0.8;

/// Session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Refuse a second expand/summarize on a node with one in flight.
    pub exclusive_per_node: bool,
    pub node_style: NodeStyle,
    /// Initial drawing colour.
    pub stroke_color: SerializableColor,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exclusive_per_node: true,
            node_style: NodeStyle::default(),
            stroke_color: SerializableColor::black(),
        }
    }
}

/// A press on one of a node's action buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAction {
    pub node: NodeId,
    pub affordance: Affordance,
}

/// An open whiteboard and its interaction state.
#[derive(Debug)]
pub struct Session<S: Scene = CanvasDocument> {
    scene: S,
    tools: ToolController,
    edit: EditState,
    activity: ActivityTracker,
    config: SessionConfig,
}

impl Default for Session<CanvasDocument> {
    fn default() -> Self {
        Self::new(CanvasDocument::new(), SessionConfig::default())
    }
}

impl<S: Scene> Session<S> {
    /// Wrap a scene. The session starts in select mode.
    pub fn new(scene: S, config: SessionConfig) -> Self {
        let mut tools = ToolController::new();
        tools.current_style = ShapeStyle::stroked(config.stroke_color);
        let mut session = Self {
            scene,
            tools,
            edit: EditState::Idle,
            activity: ActivityTracker::new(),
            config,
        };
        session.set_tool(ToolKind::Select);
        session
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    /// Whether any generative request is in flight.
    pub fn is_busy(&self) -> bool {
        self.activity.is_busy()
    }

    /// The drawing colour.
    pub fn color(&self) -> SerializableColor {
        self.tools.current_style.stroke_color
    }

    /// Read the mind map as a graph.
    pub fn graph(&self) -> GraphView<'_> {
        GraphView::from_scene(&self.scene)
    }

    // --- Tools ---

    /// Switch the active tool.
    ///
    /// Finishes any edit, drops an unfinished draft, swaps the canvas
    /// handler set for the new tool's and recomputes which objects take
    /// pointer input.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.commit_edit();
        if let Some(draft) = self.tools.set_tool(tool) {
            self.scene.remove_object(draft.shape);
        }

        self.scene.detach_pointer_handlers();
        self.scene.attach_pointer_handlers(HandlerBinding {
            tool,
            handlers: tool.pointer_handlers(),
        });
        self.scene.set_freehand_mode(tool == ToolKind::Pen);
        if tool == ToolKind::Pen {
            let brush = self.brush();
            self.scene.set_brush(brush);
        }
        self.scene.set_selection_enabled(tool == ToolKind::Select);
        self.apply_interactivity();
        self.scene.request_redraw();
        log::debug!("Tool set to {}", tool);
    }

    fn brush(&self) -> ShapeStyle {
        ShapeStyle {
            stroke_width: 3.0,
            ..self.tools.current_style.clone()
        }
    }

    /// Connection lines, which never take pointer input.
    fn edge_ids(&self) -> HashSet<ShapeId> {
        self.scene
            .nodes()
            .into_iter()
            .flat_map(|n| n.connections.iter().map(|c| c.edge))
            .collect()
    }

    fn apply_interactivity(&mut self) {
        let tool = self.tools.current();
        let edges = self.edge_ids();
        for id in self.scene.object_ids() {
            let interactive = !edges.contains(&id)
                && self
                    .scene
                    .object(id)
                    .is_some_and(|shape| tool.makes_interactive(shape));
            self.scene.set_interactive(id, interactive);
        }
    }

    // --- Pointer routing ---

    /// Route one pointer event given in screen coordinates.
    ///
    /// Returns the action button pressed, if the press landed on one; the
    /// caller hands it to the expansion service.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<NodeAction> {
        let world = self.scene.to_world(event.position());
        let event = event.with_position(world);

        match event {
            PointerEvent::DoubleClick { .. } => {
                self.on_double_click(world);
                return None;
            }
            PointerEvent::Down { .. } => {
                if self.edit.is_editing() {
                    let on_surface = self
                        .edit
                        .surface()
                        .is_some_and(|s| self.scene.objects_at(world).contains(&s));
                    if on_surface {
                        return None;
                    }
                    self.commit_edit();
                }
                if let Some(action) = self.node_action_at(world) {
                    log::debug!("{:?} pressed on {}", action.affordance, action.node);
                    return Some(action);
                }
            }
            _ => {}
        }

        let tool = self.tools.current();
        let attached = self
            .scene
            .handler_bindings()
            .iter()
            .any(|b| b.tool == tool && b.handlers.handles(&event));
        if attached {
            self.on_tool_event(tool, event);
        } else {
            let outcome = self.scene.native_pointer(event);
            self.on_native_outcome(outcome);
        }
        None
    }

    /// The action button under `point` on a node subscribed to presses.
    fn node_action_at(&self, point: Point) -> Option<NodeAction> {
        if !self.tools.current().routes_node_events() {
            return None;
        }
        self.scene
            .objects_at(point)
            .into_iter()
            .filter(|&id| self.scene.subscriptions(id).press)
            .filter_map(|id| self.scene.object(id)?.as_node())
            .find_map(|node| {
                node.affordance_at(point).map(|affordance| NodeAction {
                    node: node.node_id().clone(),
                    affordance,
                })
            })
    }

    fn on_native_outcome(&mut self, outcome: NativeOutcome) {
        match outcome {
            NativeOutcome::Moved(id) => {
                if !self.tools.current().routes_node_events() || !self.scene.subscriptions(id).moving
                {
                    return;
                }
                let node = self
                    .scene
                    .object(id)
                    .and_then(Shape::as_node)
                    .map(|n| n.node_id().clone());
                if let Some(node) = node {
                    refresh_connections(&mut self.scene, &node);
                }
            }
            NativeOutcome::StrokeFinished(id) => log::debug!("Stroke {} finished", id),
            NativeOutcome::Selected(id) => log::debug!("Selected {}", id),
            NativeOutcome::Ignored | NativeOutcome::Consumed => {}
        }
    }

    fn on_tool_event(&mut self, tool: ToolKind, event: PointerEvent) {
        let point = event.position();
        match (tool, event) {
            (ToolKind::Rectangle | ToolKind::Ellipse, PointerEvent::Down { .. }) => {
                self.start_draft(point)
            }
            (ToolKind::Rectangle | ToolKind::Ellipse, PointerEvent::Move { .. }) => {
                self.update_draft(point)
            }
            (ToolKind::Rectangle | ToolKind::Ellipse, PointerEvent::Up { .. }) => {
                self.finish_draft()
            }
            (ToolKind::Text, PointerEvent::Down { .. }) => self.on_text_press(point),
            (ToolKind::MindMap, PointerEvent::Down { .. }) => {
                self.on_mindmap_press(point);
            }
            _ => {}
        }
    }

    fn on_double_click(&mut self, point: Point) {
        let hit = self.scene.objects_at(point);
        let node = hit
            .iter()
            .filter_map(|&id| self.scene.object(id)?.as_node())
            .next();
        if let Some(node) = node {
            if node.affordance_at(point).is_some() {
                return;
            }
            let node_id = node.node_id().clone();
            self.commit_edit();
            self.begin_node_edit(&node_id, true);
            return;
        }

        if matches!(self.tools.current(), ToolKind::Select | ToolKind::Text) {
            let text = hit
                .into_iter()
                .find(|&id| self.scene.object(id).is_some_and(Shape::is_text));
            if let Some(shape) = text {
                if self.edit.surface() != Some(shape) {
                    self.commit_edit();
                    self.edit = EditState::Text {
                        shape,
                        select_all: true,
                    };
                }
            }
        }
    }

    // --- Shape drafts ---

    fn start_draft(&mut self, anchor: Point) {
        let Some(kind) = self.tools.draft_kind() else {
            return;
        };
        if let Some(stale) = self.tools.take_draft() {
            self.scene.remove_object(stale.shape);
        }
        let shape = self
            .scene
            .add_object(kind.placeholder(anchor, &self.tools.current_style));
        self.scene.set_interactive(shape, false);
        self.tools.track_draft(Draft {
            shape,
            anchor,
            kind,
        });
    }

    fn update_draft(&mut self, current: Point) {
        let Some(draft) = self.tools.draft().copied() else {
            return;
        };
        if let Some(shape) = self.scene.object_mut(draft.shape) {
            draft.reshape(shape, current);
            self.scene.request_redraw();
        }
    }

    fn finish_draft(&mut self) {
        let Some(draft) = self.tools.take_draft() else {
            return;
        };
        let keep = self.scene.object_mut(draft.shape).is_some_and(settle_draft);
        if keep {
            self.scene.set_interactive(draft.shape, true);
            self.scene.request_redraw();
            log::debug!("Finished {:?} {}", draft.kind, draft.shape);
        } else {
            self.scene.remove_object(draft.shape);
            log::debug!("Discarded accidental {:?}", draft.kind);
        }
    }

    // --- Text regions ---

    fn on_text_press(&mut self, point: Point) {
        let existing = self
            .scene
            .objects_at(point)
            .into_iter()
            .find(|&id| self.scene.object(id).is_some_and(Shape::is_text));
        let shape = match existing {
            Some(shape) => shape,
            None => {
                let mut text = Text::new(point, DEFAULT_TEXT.to_string())
                    .with_font_size(Text::DEFAULT_FONT_SIZE);
                text.style.stroke_color = self.color();
                let shape = self.scene.add_object(Shape::Text(text));
                self.scene.set_interactive(shape, true);
                shape
            }
        };
        self.edit = EditState::Text {
            shape,
            select_all: true,
        };
        self.scene.request_redraw();
    }

    /// Replace the text being edited. Returns false when nothing is being
    /// edited.
    pub fn set_edit_text(&mut self, text: &str) -> bool {
        let Some(surface) = self.edit.surface() else {
            return false;
        };
        self.edit.clear_selection();
        self.scene
            .set_property(surface, ShapeProperty::Text(text.to_string()))
    }

    /// Finish the current edit. Returns false when nothing was being edited.
    ///
    /// A text region left empty is removed; a node label is written back
    /// to its node.
    pub fn commit_edit(&mut self) -> bool {
        match std::mem::take(&mut self.edit) {
            EditState::Idle => false,
            EditState::Text { shape, .. } => {
                let empty = self
                    .scene
                    .object(shape)
                    .and_then(Shape::as_text)
                    .is_some_and(|t| t.content().trim().is_empty());
                if empty {
                    self.scene.remove_object(shape);
                    log::debug!("Removed empty text region {}", shape);
                }
                true
            }
            EditState::Node { edit, .. } => {
                let text = self
                    .scene
                    .object(edit.overlay)
                    .and_then(Shape::as_text)
                    .map(|t| t.content().to_string());
                let text = match text {
                    Some(text) => text,
                    None => self
                        .scene
                        .mind_node(&edit.node)
                        .map(|n| n.text().to_string())
                        .unwrap_or_default(),
                };
                commit_text_edit(&mut self.scene, edit, &text)
            }
        }
    }

    // --- Mind map ---

    /// Place a node at `point` unless something is too close. Returns the
    /// new node, already in label-edit mode.
    fn on_mindmap_press(&mut self, point: Point) -> Option<NodeId> {
        let crowded = self.scene.object_ids().into_iter().any(|id| {
            self.scene.object(id).is_some_and(|shape| {
                shape
                    .bounds()
                    .inflate(NODE_CLEARANCE, NODE_CLEARANCE)
                    .contains(point)
            })
        });
        if crowded {
            log::debug!("Node placement at ({:.0}, {:.0}) rejected", point.x, point.y);
            return None;
        }
        let id = self.spawn_node(point, DEFAULT_NODE_TEXT);
        self.begin_node_edit(&id, true);
        Some(id)
    }

    fn begin_node_edit(&mut self, node: &NodeId, select_all: bool) -> bool {
        match begin_text_edit(&mut self.scene, node) {
            Some(edit) => {
                self.edit = EditState::Node { edit, select_all };
                true
            }
            None => false,
        }
    }

    /// Start editing a node's label from code, as a double-click would.
    pub fn edit_node(&mut self, node: &NodeId) -> bool {
        self.commit_edit();
        self.begin_node_edit(node, true)
    }

    /// Create a wired node with the session's node style.
    pub fn spawn_node(&mut self, position: Point, text: &str) -> NodeId {
        let id = create_node(&mut self.scene, position, text, self.config.node_style);
        if let Some(shape) = self.scene.node_shape(&id) {
            let interactive = self
                .scene
                .object(shape)
                .is_some_and(|s| self.tools.current().makes_interactive(s));
            self.scene.set_interactive(shape, interactive);
        }
        id
    }

    /// Create a node connected from `parent`. Returns `None` if `parent`
    /// no longer exists.
    pub fn add_child_node(&mut self, parent: &NodeId, position: Point, text: &str) -> Option<NodeId> {
        self.scene.node_shape(parent)?;
        let child = self.spawn_node(position, text);
        if connect(&mut self.scene, parent, &child).is_none() {
            remove_node(&mut self.scene, &child);
            return None;
        }
        Some(child)
    }

    /// Claim the in-flight slot for a request on `node`.
    ///
    /// Returns `None` for unknown nodes, and for nodes that already have a
    /// request running when requests are exclusive.
    pub fn begin_request(&self, node: &NodeId) -> Option<ActivityGuard> {
        self.scene.node_shape(node)?;
        self.activity.try_begin(node, self.config.exclusive_per_node)
    }

    // --- Editing commands ---

    /// Change the drawing colour and recolour the selected object.
    pub fn set_color(&mut self, color: SerializableColor) {
        self.tools.current_style.stroke_color = color;
        log::debug!("Colour set to {}", color.to_hex());
        let brush = self.brush();
        self.scene.set_brush(brush);
        let Some(selected) = self.scene.selected() else {
            return;
        };
        let refill = self
            .scene
            .object(selected)
            .is_some_and(|s| s.as_node().is_none() && s.style().has_fill());
        self.scene
            .set_property(selected, ShapeProperty::StrokeColor(color));
        if refill {
            self.scene
                .set_property(selected, ShapeProperty::FillColor(Some(color)));
        }
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        self.edit = EditState::Idle;
        self.tools.take_draft();
        self.scene.clear();
        log::info!("Canvas cleared");
    }

    /// Add an image centred in the viewport, shrunk to fit, and switch to
    /// select mode with the image selected.
    ///
    /// Returns `None` when the bytes are not a recognised image format.
    pub fn import_image(&mut self, bytes: &[u8], width: u32, height: u32) -> Option<ShapeId> {
        let Some(format) = ImageFormat::from_magic_bytes(bytes) else {
            log::warn!("Unrecognised image data ({} bytes)", bytes.len());
            return None;
        };
        let viewport = self.scene.viewport();
        let max = Size::new(
            viewport.width() * IMAGE_VIEWPORT_SHARE,
            viewport.height() * IMAGE_VIEWPORT_SHARE,
        );
        let image = Image::new(Point::ZERO, bytes, width, height, format)
            .fit_within(max)
            .centered_on(viewport.center());

        self.commit_edit();
        let id = self.scene.add_object(Shape::Image(image));
        self.set_tool(ToolKind::Select);
        self.scene.set_selected(Some(id));
        log::info!("Imported {} image {}x{}", format.mime_type(), width, height);
        Some(id)
    }

    /// Delete the selected object. Nodes take their connections with them.
    pub fn delete_selected(&mut self) -> bool {
        let Some(selected) = self.scene.selected() else {
            return false;
        };
        let node = self
            .scene
            .object(selected)
            .and_then(Shape::as_node)
            .map(|n| n.node_id().clone());
        match node {
            Some(node) => remove_node(&mut self.scene, &node),
            None => self.scene.remove_object(selected).is_some(),
        }
    }

    /// Group the given objects.
    pub fn group(&mut self, ids: &[ShapeId]) -> Option<ShapeId> {
        let group = self.scene.group(ids)?;
        self.scene.set_selected(Some(group));
        Some(group)
    }

    pub fn ungroup(&mut self, id: ShapeId) -> Option<Vec<ShapeId>> {
        self.scene.ungroup(id)
    }

    // --- Persistence ---

    /// Snapshot the scene into a workspace record. Live objects are not
    /// touched, so an edit in progress survives a save.
    pub fn to_workspace(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Workspace, SceneError> {
        let snapshot = self.scene.snapshot()?;
        Ok(Workspace::new(id, name).with_data(snapshot))
    }

    /// Replace the scene with a workspace's content.
    ///
    /// On a bad snapshot the current scene stays as it was.
    pub fn open_workspace(&mut self, workspace: &Workspace) -> Result<(), SceneError> {
        self.commit_edit();
        match &workspace.data {
            Some(snapshot) => self.scene.restore(snapshot)?,
            None => self.scene.clear(),
        }
        self.tools.take_draft();

        let nodes: Vec<NodeId> = self.scene.nodes().into_iter().map(|n| n.id.clone()).collect();
        for node in &nodes {
            if let Some(shape) = self.scene.node_shape(node) {
                wire_node(&mut self.scene, shape);
            }
        }
        let tool = self.tools.current();
        self.set_tool(tool);
        log::info!(
            "Opened workspace {} ({} objects, {} nodes)",
            workspace.name,
            self.scene.len(),
            nodes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PointerHandlers;
    use crate::shapes::Rectangle;

    fn session() -> Session {
        Session::default()
    }

    fn drag<S: Scene>(session: &mut Session<S>, from: Point, to: Point) {
        session.handle_pointer(PointerEvent::down(from));
        session.handle_pointer(PointerEvent::moved(to));
        session.handle_pointer(PointerEvent::up(to));
    }

    fn press<S: Scene>(session: &mut Session<S>, at: Point) -> Option<NodeAction> {
        let action = session.handle_pointer(PointerEvent::down(at));
        session.handle_pointer(PointerEvent::up(at));
        action
    }

    #[test]
    fn test_every_switch_leaves_one_handler_set() {
        let mut s = session();
        for from in ToolKind::ALL {
            for to in ToolKind::ALL {
                s.set_tool(from);
                s.set_tool(to);
                let bindings = s.scene().handler_bindings();
                assert_eq!(bindings.len(), 1);
                assert_eq!(bindings[0].tool, to);
                assert_eq!(bindings[0].handlers, to.pointer_handlers());
            }
        }
    }

    #[test]
    fn test_tool_switch_sets_native_modes() {
        let mut s = session();
        assert!(s.scene().selection_enabled());
        s.set_tool(ToolKind::Pen);
        assert!(s.scene().freehand_mode());
        assert!(!s.scene().selection_enabled());
        s.set_tool(ToolKind::Rectangle);
        assert!(!s.scene().freehand_mode());
        assert_eq!(
            s.scene().handler_bindings()[0].handlers,
            PointerHandlers::DRAG
        );
    }

    #[test]
    fn test_interactivity_follows_tool() {
        let mut s = session();
        let rect = s
            .scene_mut()
            .add_object(Shape::Rectangle(Rectangle::new(Point::ZERO, 50.0, 50.0)));
        let text = s
            .scene_mut()
            .add_object(Shape::Text(Text::new(Point::new(200.0, 0.0), "hi".into())));

        s.set_tool(ToolKind::Select);
        assert!(s.scene().is_interactive(rect) && s.scene().is_interactive(text));
        s.set_tool(ToolKind::Text);
        assert!(!s.scene().is_interactive(rect) && s.scene().is_interactive(text));
        s.set_tool(ToolKind::MindMap);
        assert!(!s.scene().is_interactive(rect) && !s.scene().is_interactive(text));
    }

    #[test]
    fn test_accidental_rectangle_is_discarded() {
        let mut s = session();
        s.set_tool(ToolKind::Rectangle);
        drag(&mut s, Point::new(10.0, 10.0), Point::new(12.0, 11.0));
        assert!(s.scene().is_empty());
    }

    #[test]
    fn test_thin_rectangle_is_kept_and_clamped() {
        let mut s = session();
        s.set_tool(ToolKind::Rectangle);
        drag(&mut s, Point::new(10.0, 10.0), Point::new(10.0, 60.0));

        let ids = s.scene().object_ids();
        assert_eq!(ids.len(), 1);
        assert!(s.scene().is_interactive(ids[0]));
        let bounds = s.scene().object(ids[0]).map(Shape::bounds).unwrap_or_default();
        assert!((bounds.width() - 5.0).abs() < f64::EPSILON);
        assert!((bounds.height() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ellipse_draft_follows_pointer() {
        let mut s = session();
        s.set_tool(ToolKind::Ellipse);
        s.handle_pointer(PointerEvent::down(Point::new(0.0, 0.0)));
        let draft = s.scene().object_ids()[0];
        assert!(!s.scene().is_interactive(draft));
        s.handle_pointer(PointerEvent::moved(Point::new(40.0, -20.0)));
        s.handle_pointer(PointerEvent::up(Point::new(40.0, -20.0)));

        match s.scene().object(draft) {
            Some(Shape::Ellipse(e)) => {
                assert!((e.radius_x - 20.0).abs() < f64::EPSILON);
                assert!((e.radius_y - 10.0).abs() < f64::EPSILON);
            }
            other => panic!("expected an ellipse, got {other:?}"),
        }
    }

    #[test]
    fn test_switching_tool_mid_draft_drops_placeholder() {
        let mut s = session();
        s.set_tool(ToolKind::Rectangle);
        s.handle_pointer(PointerEvent::down(Point::new(0.0, 0.0)));
        s.handle_pointer(PointerEvent::moved(Point::new(80.0, 80.0)));
        assert_eq!(s.scene().len(), 1);
        s.set_tool(ToolKind::Select);
        assert!(s.scene().is_empty());
    }

    #[test]
    fn test_mindmap_press_respects_clearance() {
        let mut s = session();
        // 200x100 node spanning x 0..200, y 50..150
        s.spawn_node(Point::new(100.0, 100.0), "Root");
        s.set_tool(ToolKind::MindMap);

        press(&mut s, Point::new(225.0, 100.0));
        assert_eq!(s.graph().len(), 1);
        press(&mut s, Point::new(100.0, 100.0));
        assert_eq!(s.graph().len(), 1);

        press(&mut s, Point::new(231.0, 100.0));
        assert_eq!(s.graph().len(), 2);
        assert!(matches!(
            s.edit_state(),
            EditState::Node {
                select_all: true,
                ..
            }
        ));
    }

    #[test]
    fn test_new_node_label_commits_on_tool_switch() {
        let mut s = session();
        s.set_tool(ToolKind::MindMap);
        press(&mut s, Point::new(500.0, 500.0));
        let node = s.graph().nodes().next().map(|n| n.id.clone()).unwrap();
        assert_eq!(s.scene().len(), 2);

        assert!(s.set_edit_text("Big plan"));
        assert!(!s.edit_state().select_all());
        s.set_tool(ToolKind::Select);

        let mind = s.scene().mind_node(&node).unwrap();
        assert_eq!(mind.text(), "Big plan");
        assert!(mind.visible);
        assert_eq!(s.scene().len(), 1);
        assert!(!s.edit_state().is_editing());
    }

    #[test]
    fn test_text_tool_creates_then_reuses_region() {
        let mut s = session();
        s.set_color(SerializableColor::new(200, 0, 0, 255));
        s.set_tool(ToolKind::Text);
        press(&mut s, Point::new(10.0, 10.0));
        assert_eq!(s.scene().len(), 1);
        let region = s.scene().object_ids()[0];
        let text = s.scene().object(region).and_then(Shape::as_text).unwrap();
        assert_eq!(text.content(), DEFAULT_TEXT);
        assert_eq!(text.style.stroke_color, SerializableColor::new(200, 0, 0, 255));
        assert_eq!(
            s.edit_state(),
            &EditState::Text {
                shape: region,
                select_all: true
            }
        );

        s.commit_edit();
        press(&mut s, Point::new(15.0, 15.0));
        assert_eq!(s.scene().len(), 1);
        assert_eq!(s.edit_state().surface(), Some(region));
    }

    #[test]
    fn test_empty_text_region_is_removed_on_commit() {
        let mut s = session();
        s.set_tool(ToolKind::Text);
        press(&mut s, Point::new(10.0, 10.0));
        s.set_edit_text("   ");
        assert!(s.commit_edit());
        assert!(s.scene().is_empty());
        assert!(!s.commit_edit());
    }

    #[test]
    fn test_affordance_press_routes_in_node_modes_only() {
        let mut s = session();
        let id = s.spawn_node(Point::new(100.0, 100.0), "Root");
        let expand = s
            .scene()
            .mind_node(&id)
            .map(|n| n.affordance_center(Affordance::Expand))
            .unwrap();
        let summarize = s
            .scene()
            .mind_node(&id)
            .map(|n| n.affordance_center(Affordance::Summarize))
            .unwrap();

        let action = press(&mut s, expand).unwrap();
        assert_eq!(action.node, id);
        assert_eq!(action.affordance, Affordance::Expand);

        s.set_tool(ToolKind::MindMap);
        let action = press(&mut s, summarize).unwrap();
        assert_eq!(action.affordance, Affordance::Summarize);
        assert_eq!(s.graph().len(), 1);

        s.set_tool(ToolKind::Pen);
        s.handle_pointer(PointerEvent::down(expand));
        assert!(s.handle_pointer(PointerEvent::up(expand)).is_none());
    }

    #[test]
    fn test_dragging_node_keeps_edges_attached() {
        let mut s = session();
        let root = s.spawn_node(Point::new(100.0, 100.0), "Root");
        let child = s
            .add_child_node(&root, Point::new(400.0, 100.0), "Child")
            .unwrap();
        let edge = s.scene().mind_node(&root).unwrap().node.connections[0].edge;
        assert!(!s.scene().is_interactive(edge));

        s.handle_pointer(PointerEvent::down(Point::new(400.0, 80.0)));
        s.handle_pointer(PointerEvent::moved(Point::new(400.0, 280.0)));

        let moved = s.scene().mind_node(&child).unwrap().position();
        assert_eq!(moved, Point::new(400.0, 300.0));
        match s.scene().object(edge) {
            Some(Shape::Line(line)) => {
                assert_eq!(line.start, Point::new(100.0, 100.0));
                assert_eq!(line.end, moved);
            }
            other => panic!("expected a line, got {other:?}"),
        }
        s.handle_pointer(PointerEvent::up(Point::new(400.0, 280.0)));
    }

    #[test]
    fn test_double_click_edits_node_but_not_affordance() {
        let mut s = session();
        let id = s.spawn_node(Point::new(100.0, 100.0), "Root");
        let expand = s
            .scene()
            .mind_node(&id)
            .map(|n| n.affordance_center(Affordance::Expand))
            .unwrap();

        s.handle_pointer(PointerEvent::double_click(expand));
        assert!(!s.edit_state().is_editing());

        s.handle_pointer(PointerEvent::double_click(Point::new(100.0, 80.0)));
        assert!(matches!(s.edit_state(), EditState::Node { .. }));
        s.set_edit_text("Renamed");
        s.commit_edit();
        assert_eq!(s.scene().mind_node(&id).unwrap().text(), "Renamed");
    }

    #[test]
    fn test_set_color_recolours_selection() {
        let mut s = session();
        let mut rect = Rectangle::new(Point::ZERO, 50.0, 50.0);
        rect.style.fill_color = Some(SerializableColor::white());
        let rect = s.scene_mut().add_object(Shape::Rectangle(rect));
        s.set_tool(ToolKind::Select);
        press(&mut s, Point::new(25.0, 25.0));
        assert_eq!(s.scene().selected(), Some(rect));

        let red = SerializableColor::new(255, 0, 0, 255);
        s.set_color(red);
        let style = s.scene().object(rect).map(|r| r.style().clone()).unwrap();
        assert_eq!(style.stroke_color, red);
        assert_eq!(style.fill_color, Some(red));
        assert_eq!(s.color(), red);
    }

    #[test]
    fn test_import_image_forces_select() {
        let mut s = session();
        s.set_tool(ToolKind::Pen);
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let id = s.import_image(&png, 2000, 1000).unwrap();

        assert_eq!(s.tool(), ToolKind::Select);
        assert_eq!(s.scene().selected(), Some(id));
        let bounds = s.scene().object(id).map(Shape::bounds).unwrap();
        // 800x600 viewport: fits within 640x480, centred on (400, 300)
        assert!((bounds.width() - 640.0).abs() < 1e-9);
        assert!((bounds.center().x - 400.0).abs() < 1e-9);
        assert!((bounds.center().y - 300.0).abs() < 1e-9);

        assert!(s.import_image(b"not an image", 10, 10).is_none());
    }

    #[test]
    fn test_delete_selected_node_prunes_parent() {
        let mut s = session();
        let root = s.spawn_node(Point::new(100.0, 100.0), "Root");
        let child = s
            .add_child_node(&root, Point::new(400.0, 100.0), "Child")
            .unwrap();
        press(&mut s, Point::new(400.0, 80.0));
        assert!(s.delete_selected());
        assert!(s.scene().mind_node(&child).is_none());
        assert!(s.scene().mind_node(&root).unwrap().node.connections.is_empty());
        assert_eq!(s.scene().len(), 1);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut s = session();
        s.spawn_node(Point::new(100.0, 100.0), "Root");
        s.set_tool(ToolKind::Text);
        press(&mut s, Point::new(600.0, 600.0));
        s.clear();
        assert!(s.scene().is_empty());
        assert!(!s.edit_state().is_editing());
    }

    #[test]
    fn test_workspace_roundtrip_rewires_nodes() {
        let mut s = session();
        let root = s.spawn_node(Point::new(100.0, 100.0), "Root");
        s.add_child_node(&root, Point::new(400.0, 100.0), "Child");
        // Save mid-edit: the overlay must not leak into the snapshot
        s.edit_node(&root);
        let workspace = s.to_workspace("w1", "Plans").unwrap();
        assert!(s.edit_state().is_editing());

        let mut other = session();
        other.open_workspace(&workspace).unwrap();
        assert_eq!(other.graph().len(), 2);
        assert_eq!(other.scene().len(), 3);

        let shape = other.scene().node_shape(&root).unwrap();
        assert_eq!(
            other.scene().subscriptions(shape),
            crate::scene::ObjectEvents::MIND_NODE
        );
        assert!(other.scene().is_interactive(shape));
        let edge = other.scene().mind_node(&root).unwrap().node.connections[0].edge;
        assert!(!other.scene().is_interactive(edge));
        assert!(other.scene().mind_node(&root).unwrap().visible);
    }

    #[test]
    fn test_bad_workspace_keeps_scene() {
        let mut s = session();
        s.spawn_node(Point::new(100.0, 100.0), "Root");
        let broken = Workspace::new("w", "broken").with_data("{ nope".into());
        assert!(s.open_workspace(&broken).is_err());
        assert_eq!(s.graph().len(), 1);
    }

    #[test]
    fn test_request_guard_is_exclusive_per_node() {
        let mut s = session();
        let id = s.spawn_node(Point::new(100.0, 100.0), "Root");
        let guard = s.begin_request(&id).unwrap();
        assert!(s.is_busy());
        assert!(s.begin_request(&id).is_none());
        drop(guard);
        assert!(!s.is_busy());
        assert!(s.begin_request(&NodeId::from("ghost")).is_none());
    }
}
