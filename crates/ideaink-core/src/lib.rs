//! IdeaInk Core Library
//!
//! Platform-agnostic data structures and logic for the IdeaInk mind-map
//! whiteboard: shapes, the scene graph, tools, the mind-map graph and the
//! interaction session that ties them together.

pub mod activity;
pub mod camera;
pub mod canvas;
pub mod input;
pub mod mindmap;
pub mod scene;
pub mod session;
pub mod shapes;
pub mod storage;
pub mod tools;

pub use activity::{ActivityGuard, ActivityTracker};
pub use camera::Camera;
pub use canvas::CanvasDocument;
pub use input::PointerEvent;
pub use mindmap::{ContextTreeNode, GraphView, Node, NodeId, NodeStyle};
pub use scene::{Scene, SceneError, ShapeProperty};
pub use session::{EditState, NodeAction, Session, SessionConfig};
pub use shapes::{Affordance, SerializableColor, Shape, ShapeId};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, Workspace};
pub use tools::ToolKind;
