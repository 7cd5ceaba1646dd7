//! Scripted session events.
//!
//! A script is a JSON array of commands, or one command per line:
//!
//! ```json
//! {"op": "tool", "tool": "mindmap"}
//! {"op": "click", "x": 400, "y": 300}
//! {"op": "type", "text": "Garden"}
//! {"op": "expand", "node": "Garden"}
//! {"op": "wait"}
//! ```
//!
//! Nodes are named by label or id.

use ideaink_core::{PointerEvent, ToolKind};
use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Tool { tool: ToolKind },
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    /// Press and release at one point.
    Click { x: f64, y: f64 },
    DoubleClick { x: f64, y: f64 },
    /// Replace the text being edited.
    Type { text: String },
    Commit,
    /// Hex colour such as `#ff8800`.
    Color { color: String },
    Expand { node: String },
    Summarize { node: String },
    /// Base64-encoded image bytes.
    ImportImage { data: String, width: u32, height: u32 },
    Delete,
    Clear,
    Resize { width: f64, height: f64 },
    /// Move the view by a screen-space delta.
    Pan { dx: f64, dy: f64 },
    /// Zoom by `factor` around a screen point.
    Zoom { x: f64, y: f64, factor: f64 },
    ResetView,
    /// Block until every running request has been applied.
    Wait,
    Save,
}

impl Command {
    /// The pointer events this command stands for.
    pub fn pointer_events(&self) -> Vec<PointerEvent> {
        match *self {
            Command::Down { x, y } => vec![PointerEvent::down(Point::new(x, y))],
            Command::Move { x, y } => vec![PointerEvent::moved(Point::new(x, y))],
            Command::Up { x, y } => vec![PointerEvent::up(Point::new(x, y))],
            Command::Click { x, y } => {
                let p = Point::new(x, y);
                vec![PointerEvent::down(p), PointerEvent::up(p)]
            }
            Command::DoubleClick { x, y } => vec![PointerEvent::double_click(Point::new(x, y))],
            _ => Vec::new(),
        }
    }
}

/// Parse a script in either accepted layout.
pub fn parse_script(text: &str) -> serde_json::Result<Vec<Command>> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text);
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .map(serde_json::from_str)
        .collect()
}
