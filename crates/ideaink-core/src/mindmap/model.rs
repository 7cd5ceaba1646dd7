//! Mind-map graph entities.
//!
//! Nodes reference each other only by [`NodeId`]. A node owns its outgoing
//! connections; nothing stores a parent pointer, so every node serializes
//! on its own and the graph can be rebuilt from ids alone.

use crate::shapes::{SerializableColor, ShapeId};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a mind-map node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Mint a fresh, unique node id.
    pub fn new() -> Self {
        Self(format!("node_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fill and stroke colors of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub fill: SerializableColor,
    pub stroke: SerializableColor,
}

impl NodeStyle {
    pub const DEFAULT_FILL: SerializableColor = SerializableColor {
        r: 0xf0,
        g: 0xf8,
        b: 0xff,
        a: 255,
    };
    pub const DEFAULT_STROKE: SerializableColor = SerializableColor {
        r: 0x00,
        g: 0x78,
        b: 0xd7,
        a: 255,
    };
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            fill: Self::DEFAULT_FILL,
            stroke: Self::DEFAULT_STROKE,
        }
    }
}

/// A directed edge owned by its source node.
///
/// The target was derived from (is a child of) the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRef {
    pub target_id: NodeId,
    /// The line drawn for this edge.
    pub edge: ShapeId,
}

/// A mind-map vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub text: String,
    /// Center of the node in world coordinates.
    pub position: Point,
    #[serde(default)]
    pub style: NodeStyle,
    /// Outgoing connections, in creation order.
    #[serde(default)]
    pub connections: Vec<ConnectionRef>,
}

impl Node {
    pub fn new(position: Point, text: impl Into<String>, style: NodeStyle) -> Self {
        Self {
            id: NodeId::new(),
            text: text.into(),
            position,
            style,
            connections: Vec::new(),
        }
    }

    /// Whether this node has an outgoing edge to `target`.
    pub fn connects_to(&self, target: &NodeId) -> bool {
        self.connections.iter().any(|c| &c.target_id == target)
    }
}

/// Ephemeral tree rebuilt from the graph for every generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextTreeNode {
    pub id: NodeId,
    pub text: String,
    pub children: Vec<ContextTreeNode>,
}

impl ContextTreeNode {
    /// Number of nodes in this subtree, itself included.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(ContextTreeNode::len).sum::<usize>()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Render as an indented outline, two spaces per level.
    pub fn render_outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(0, &mut out);
        out
    }

    fn write_outline(&self, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str("- ");
        out.push_str(&self.text);
        out.push('\n');
        for child in &self.children {
            child.write_outline(depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_unique_and_prefixed() {
        let a = NodeId::new();
        let b = NodeId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("node_"));
    }

    #[test]
    fn test_node_id_serializes_as_plain_string() {
        let id = NodeId::from("node_42");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"node_42\""));
    }

    #[test]
    fn test_outline_rendering() {
        let tree = ContextTreeNode {
            id: NodeId::from("a"),
            text: "Root".into(),
            children: vec![ContextTreeNode {
                id: NodeId::from("b"),
                text: "Child".into(),
                children: vec![ContextTreeNode {
                    id: NodeId::from("c"),
                    text: "Leaf".into(),
                    children: vec![],
                }],
            }],
        };
        assert_eq!(tree.render_outline(), "- Root\n  - Child\n    - Leaf\n");
        assert_eq!(tree.len(), 3);
    }
}
