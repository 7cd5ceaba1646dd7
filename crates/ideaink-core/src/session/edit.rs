//! Text editing state.

use crate::mindmap::NodeEdit;
use crate::shapes::ShapeId;

/// What, if anything, is receiving keystrokes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    /// No edit in progress.
    #[default]
    Idle,
    /// A free text region edited in place.
    Text { shape: ShapeId, select_all: bool },
    /// A node label edited through a temporary overlay.
    Node { edit: NodeEdit, select_all: bool },
}

impl EditState {
    pub fn is_editing(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// The scene object whose text changes as the user types.
    pub fn surface(&self) -> Option<ShapeId> {
        match self {
            Self::Idle => None,
            Self::Text { shape, .. } => Some(*shape),
            Self::Node { edit, .. } => Some(edit.overlay),
        }
    }

    /// Whether the whole text is selected, so the next keystroke replaces it.
    pub fn select_all(&self) -> bool {
        match self {
            Self::Idle => false,
            Self::Text { select_all, .. } | Self::Node { select_all, .. } => *select_all,
        }
    }

    pub(crate) fn clear_selection(&mut self) {
        match self {
            Self::Idle => {}
            Self::Text { select_all, .. } | Self::Node { select_all, .. } => *select_all = false,
        }
    }
}
