//! Read-only graph view over the mind-map nodes of a scene.
//!
//! Only forward (parent to child) edges are stored, so ancestor queries
//! invert them through a reverse index built per query.

use super::model::{ContextTreeNode, Node, NodeId};
use crate::scene::Scene;
use std::collections::{HashMap, HashSet};

/// Borrowed view of a node set, keyed by id.
#[derive(Debug, Clone)]
pub struct GraphView<'a> {
    by_id: HashMap<&'a NodeId, &'a Node>,
    /// Scan order (scene draw order).
    order: Vec<&'a Node>,
}

impl<'a> GraphView<'a> {
    pub fn new(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let order: Vec<&'a Node> = nodes.into_iter().collect();
        let by_id = order.iter().map(|n| (&n.id, *n)).collect();
        Self { by_id, order }
    }

    /// View every mind-map node currently in `scene`.
    pub fn from_scene<S: Scene + ?Sized>(scene: &'a S) -> Self {
        Self::new(scene.nodes())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &NodeId) -> Option<&'a Node> {
        self.by_id.get(id).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.order.iter().copied()
    }

    /// Child to parent. When a node has several parents, the first one in
    /// scan order wins.
    fn parent_index(&self) -> HashMap<&'a NodeId, &'a NodeId> {
        let mut parents = HashMap::new();
        for node in &self.order {
            for conn in &node.connections {
                parents.entry(&conn.target_id).or_insert(&node.id);
            }
        }
        parents
    }

    /// Whether any node holds a connection to `id`.
    pub fn has_incoming(&self, id: &NodeId) -> bool {
        self.order.iter().any(|n| n.connects_to(id))
    }

    /// Walk incoming edges up to a node that has none.
    ///
    /// If the walk revisits a node, the diagram has a cycle; the start node
    /// is returned instead.
    pub fn find_root(&self, id: &NodeId) -> NodeId {
        let parents = self.parent_index();
        let mut visited: HashSet<&NodeId> = HashSet::from([id]);
        let mut current = id;
        while let Some(&parent) = parents.get(current) {
            if !visited.insert(parent) {
                log::warn!("Cycle detected while looking for the root of {}", id);
                return id.clone();
            }
            current = parent;
        }
        current.clone()
    }

    /// Materialize the tree reachable from `root` through outgoing edges.
    ///
    /// Connections to missing nodes are skipped. An edge back into the
    /// current ancestor path is dropped, so every path ends.
    pub fn build_context_tree(&self, root: &NodeId) -> Option<ContextTreeNode> {
        let node = self.get(root)?;
        let mut ancestors = Vec::new();
        Some(self.build_subtree(node, &mut ancestors))
    }

    fn build_subtree(&self, node: &'a Node, ancestors: &mut Vec<&'a NodeId>) -> ContextTreeNode {
        ancestors.push(&node.id);
        let mut children = Vec::new();
        for conn in &node.connections {
            let Some(child) = self.get(&conn.target_id) else {
                log::warn!("Connection lost: {} -> {}", node.id, conn.target_id);
                continue;
            };
            if ancestors.contains(&&child.id) {
                log::warn!("Skipping cyclic connection {} -> {}", node.id, child.id);
                continue;
            }
            children.push(self.build_subtree(child, ancestors));
        }
        ancestors.pop();
        ContextTreeNode {
            id: node.id.clone(),
            text: node.text.clone(),
            children,
        }
    }
}

/// Texts from the tree root down to `target`.
///
/// Falls back to the root's text alone when `target` is not in the tree.
pub fn path_to_node(tree: &ContextTreeNode, target: &NodeId) -> Vec<String> {
    fn walk(node: &ContextTreeNode, target: &NodeId, path: &mut Vec<String>) -> bool {
        path.push(node.text.clone());
        if &node.id == target {
            return true;
        }
        if node.children.iter().any(|child| walk(child, target, path)) {
            return true;
        }
        path.pop();
        false
    }

    let mut path = Vec::new();
    if walk(tree, target, &mut path) {
        path
    } else {
        vec![tree.text.clone()]
    }
}

/// Join a root-to-node path for display.
pub fn breadcrumb(path: &[String]) -> String {
    path.join(" > ")
}
