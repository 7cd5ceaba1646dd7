//! Node construction, editing and connection upkeep.
//!
//! Every function here works against any [`Scene`], mutating node objects
//! only through the scene's own operations.

use super::model::{ConnectionRef, Node, NodeId, NodeStyle};
use crate::scene::{ObjectEvents, Scene, ShapeProperty};
use crate::shapes::{Line, MindNode, NODE_FONT_SIZE, Shape, ShapeId, ShapeStyle, Text, measure_text};
use kurbo::{Point, Vec2};

/// Create a node, add it to the scene and wire its event subscriptions.
pub fn create_node<S: Scene + ?Sized>(
    scene: &mut S,
    position: Point,
    text: &str,
    style: NodeStyle,
) -> NodeId {
    let node = Node::new(position, text, style);
    let id = node.id.clone();
    let shape = scene.add_object(Shape::Node(MindNode::new(node)));
    wire_node(scene, shape);
    scene.request_redraw();
    log::debug!("Created node {} at ({:.0}, {:.0})", id, position.x, position.y);
    id
}

/// Subscribe a node object to action-button presses and drag moves.
pub fn wire_node<S: Scene + ?Sized>(scene: &mut S, shape: ShapeId) {
    scene.subscribe(shape, ObjectEvents::MIND_NODE);
}

/// An in-progress label edit on a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEdit {
    pub node: NodeId,
    /// Temporary text surface standing in for the node.
    pub overlay: ShapeId,
    was_interactive: bool,
}

/// Put a node into label-editing mode.
///
/// The overlay is added before the node is hidden, so there is never a frame
/// without the label on screen. Returns `None` for unknown nodes and nodes
/// already being edited.
pub fn begin_text_edit<S: Scene + ?Sized>(scene: &mut S, node_id: &NodeId) -> Option<NodeEdit> {
    let shape = scene.node_shape(node_id)?;
    let mind = scene.object(shape)?.as_node()?;
    if mind.editing {
        return None;
    }
    let text = mind.text().to_string();
    let label = measure_text(&text, NODE_FONT_SIZE);
    let top_left = mind.position() - Vec2::new(label.width / 2.0, label.height / 2.0);

    let mut surface = Text::new(top_left, text).with_font_size(NODE_FONT_SIZE);
    surface.style.stroke_color = mind.node.style.stroke;
    let overlay = scene.add_overlay(Shape::Text(surface));
    scene.set_interactive(overlay, true);

    let was_interactive = scene.is_interactive(shape);
    scene.set_property(shape, ShapeProperty::Visible(false));
    scene.set_interactive(shape, false);
    if let Some(mind) = scene.object_mut(shape).and_then(Shape::as_node_mut) {
        mind.editing = true;
    }
    scene.request_redraw();
    log::debug!("Editing node {}", node_id);

    Some(NodeEdit {
        node: node_id.clone(),
        overlay,
        was_interactive,
    })
}

/// Finish a label edit: write the text back, re-layout and show the node,
/// then drop the overlay and restore interactivity.
pub fn commit_text_edit<S: Scene + ?Sized>(scene: &mut S, edit: NodeEdit, text: &str) -> bool {
    let Some(shape) = scene.node_shape(&edit.node) else {
        scene.remove_object(edit.overlay);
        return false;
    };
    scene.set_property(shape, ShapeProperty::Text(text.to_string()));
    if let Some(mind) = scene.object_mut(shape).and_then(Shape::as_node_mut) {
        mind.editing = false;
    }
    scene.set_property(shape, ShapeProperty::Visible(true));
    scene.remove_object(edit.overlay);
    scene.set_interactive(shape, edit.was_interactive);
    if scene.selection_enabled() {
        scene.set_selected(Some(shape));
    }
    scene.request_redraw();
    true
}

/// Draw a directed edge from `source` to `target` and record it on the source.
///
/// The edge goes behind everything else and never takes pointer input.
pub fn connect<S: Scene + ?Sized>(
    scene: &mut S,
    source: &NodeId,
    target: &NodeId,
) -> Option<ConnectionRef> {
    let from = scene.mind_node(source)?;
    let (start, color) = (from.position(), from.node.style.stroke);
    let end = scene.mind_node(target)?.position();

    let mut line = Line::new(start, end);
    line.style = ShapeStyle::stroked(color);
    let edge = scene.add_object(Shape::Line(line));
    scene.send_to_back(edge);
    scene.set_interactive(edge, false);

    let connection = ConnectionRef {
        target_id: target.clone(),
        edge,
    };
    match scene.mind_node_mut(source) {
        Some(from) => from.node.connections.push(connection.clone()),
        None => {
            scene.remove_object(edge);
            return None;
        }
    }
    Some(connection)
}

/// Re-attach every edge touching `node_id` to the current node positions.
///
/// Covers edges where the node is the source and edges other nodes hold
/// towards it. Call on every drag step.
pub fn refresh_connections<S: Scene + ?Sized>(scene: &mut S, node_id: &NodeId) {
    let Some(here) = scene.mind_node(node_id).map(MindNode::position) else {
        return;
    };
    let mut updates: Vec<(ShapeId, Point, Point)> = Vec::new();

    for node in scene.nodes() {
        if &node.id == node_id {
            for conn in &node.connections {
                match scene.mind_node(&conn.target_id) {
                    Some(target) => updates.push((conn.edge, here, target.position())),
                    None => log::warn!(
                        "Connection lost: {} -> {}",
                        node_id,
                        conn.target_id
                    ),
                }
            }
        } else {
            for conn in node.connections.iter().filter(|c| &c.target_id == node_id) {
                updates.push((conn.edge, node.position, here));
            }
        }
    }

    for (edge, start, end) in updates {
        scene.set_property(edge, ShapeProperty::Endpoints(start, end));
    }
}

/// Delete a node with its outgoing edges and every reference other nodes
/// hold to it.
pub fn remove_node<S: Scene + ?Sized>(scene: &mut S, node_id: &NodeId) -> bool {
    let Some(shape) = scene.node_shape(node_id) else {
        return false;
    };

    let holders: Vec<NodeId> = scene
        .nodes()
        .into_iter()
        .filter(|n| &n.id != node_id && n.connects_to(node_id))
        .map(|n| n.id.clone())
        .collect();
    let mut edges = Vec::new();
    for holder in &holders {
        if let Some(mind) = scene.mind_node_mut(holder) {
            mind.node.connections.retain(|c| {
                if &c.target_id == node_id {
                    edges.push(c.edge);
                    false
                } else {
                    true
                }
            });
        }
    }

    if let Some(Shape::Node(removed)) = scene.remove_object(shape) {
        edges.extend(removed.node.connections.iter().map(|c| c.edge));
    }
    for edge in edges {
        scene.remove_object(edge);
    }
    log::debug!("Removed node {}", node_id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasDocument;
    use crate::shapes::ShapeTrait;

    fn edge_endpoints(scene: &CanvasDocument, edge: ShapeId) -> (Point, Point) {
        match scene.object(edge) {
            Some(Shape::Line(line)) => (line.start, line.end),
            other => panic!("expected a line, got {other:?}"),
        }
    }

    #[test]
    fn test_create_node_registers_and_subscribes() {
        let mut scene = CanvasDocument::new();
        let id = create_node(&mut scene, Point::new(100.0, 100.0), "Root", NodeStyle::default());
        let shape = scene.node_shape(&id).unwrap();
        assert_eq!(scene.subscriptions(shape), ObjectEvents::MIND_NODE);
        let node = scene.mind_node(&id).unwrap();
        assert_eq!(node.text(), "Root");
        assert!(node.bounds().width() >= 200.0);
    }

    #[test]
    fn test_connect_puts_edge_behind_and_records_ref() {
        let mut scene = CanvasDocument::new();
        let a = create_node(&mut scene, Point::new(0.0, 0.0), "A", NodeStyle::default());
        let b = create_node(&mut scene, Point::new(300.0, 0.0), "B", NodeStyle::default());
        let conn = connect(&mut scene, &a, &b).unwrap();

        assert_eq!(scene.object_ids()[0], conn.edge);
        assert!(!scene.is_interactive(conn.edge));
        assert_eq!(scene.mind_node(&a).unwrap().node.connections, vec![conn.clone()]);
        let line_color = scene.object(conn.edge).map(|s| s.style().stroke_color);
        assert_eq!(line_color, Some(NodeStyle::DEFAULT_STROKE));

        assert!(connect(&mut scene, &a, &NodeId::from("missing")).is_none());
    }

    #[test]
    fn test_refresh_updates_both_directions() {
        let mut scene = CanvasDocument::new();
        let a = create_node(&mut scene, Point::new(0.0, 0.0), "A", NodeStyle::default());
        let b = create_node(&mut scene, Point::new(300.0, 0.0), "B", NodeStyle::default());
        let c = create_node(&mut scene, Point::new(600.0, 0.0), "C", NodeStyle::default());
        let ab = connect(&mut scene, &a, &b).unwrap();
        let bc = connect(&mut scene, &b, &c).unwrap();

        let moved = Point::new(300.0, 250.0);
        let shape = scene.node_shape(&b).unwrap();
        scene.set_property(shape, ShapeProperty::Position(moved));
        refresh_connections(&mut scene, &b);

        assert_eq!(edge_endpoints(&scene, ab.edge), (Point::new(0.0, 0.0), moved));
        assert_eq!(edge_endpoints(&scene, bc.edge), (moved, Point::new(600.0, 0.0)));
    }

    #[test]
    fn test_text_edit_never_hides_label() {
        let mut scene = CanvasDocument::new();
        let id = create_node(&mut scene, Point::new(0.0, 0.0), "Old", NodeStyle::default());
        let shape = scene.node_shape(&id).unwrap();
        scene.set_interactive(shape, true);

        let edit = begin_text_edit(&mut scene, &id).unwrap();
        assert!(scene.object(edit.overlay).is_some());
        assert!(!scene.object(shape).unwrap().is_visible());
        assert!(!scene.is_interactive(shape));
        assert!(begin_text_edit(&mut scene, &id).is_none());

        let long = "a much longer label than the one we started with";
        assert!(commit_text_edit(&mut scene, edit.clone(), long));
        let node = scene.mind_node(&id).unwrap();
        assert_eq!(node.text(), long);
        assert!(node.visible && !node.editing);
        assert!(node.width > 200.0);
        assert!(scene.object(edit.overlay).is_none());
        assert!(scene.is_interactive(shape));
    }

    #[test]
    fn test_remove_node_prunes_references() {
        let mut scene = CanvasDocument::new();
        let a = create_node(&mut scene, Point::new(0.0, 0.0), "A", NodeStyle::default());
        let b = create_node(&mut scene, Point::new(300.0, 0.0), "B", NodeStyle::default());
        let c = create_node(&mut scene, Point::new(600.0, 0.0), "C", NodeStyle::default());
        let ab = connect(&mut scene, &a, &b).unwrap();
        let bc = connect(&mut scene, &b, &c).unwrap();

        assert!(remove_node(&mut scene, &b));
        assert!(scene.mind_node(&a).unwrap().node.connections.is_empty());
        assert!(scene.object(ab.edge).is_none());
        assert!(scene.object(bc.edge).is_none());
        assert_eq!(scene.len(), 2);
        assert!(!remove_node(&mut scene, &b));
    }
}
