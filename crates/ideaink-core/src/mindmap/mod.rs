//! Mind-map nodes, their connections and tree reconstruction.
//!
//! Node metadata lives inside the scene object that draws it
//! ([`crate::shapes::MindNode`]); [`factory`] builds and mutates those objects
//! and [`graph`] reads them back as a directed graph.

pub mod factory;
pub mod graph;
mod model;

pub use factory::{
    NodeEdit, begin_text_edit, commit_text_edit, connect, create_node, refresh_connections,
    remove_node, wire_node,
};
pub use graph::{GraphView, breadcrumb, path_to_node};
pub use model::{ConnectionRef, ContextTreeNode, Node, NodeId, NodeStyle};
