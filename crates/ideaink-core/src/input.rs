//! Pointer input events.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Pointer event in screen coordinates.
///
/// Serialized with an internal `type` tag so event scripts read naturally:
/// `{"type": "down", "x": 10, "y": 20}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    DoubleClick { x: f64, y: f64 },
}

impl PointerEvent {
    pub fn down(p: Point) -> Self {
        Self::Down { x: p.x, y: p.y }
    }

    pub fn moved(p: Point) -> Self {
        Self::Move { x: p.x, y: p.y }
    }

    pub fn up(p: Point) -> Self {
        Self::Up { x: p.x, y: p.y }
    }

    pub fn double_click(p: Point) -> Self {
        Self::DoubleClick { x: p.x, y: p.y }
    }

    /// Where the event happened.
    pub fn position(&self) -> Point {
        match *self {
            Self::Down { x, y }
            | Self::Move { x, y }
            | Self::Up { x, y }
            | Self::DoubleClick { x, y } => Point::new(x, y),
        }
    }

    /// The same event kind at another position.
    pub fn with_position(&self, p: Point) -> Self {
        match self {
            Self::Down { .. } => Self::down(p),
            Self::Move { .. } => Self::moved(p),
            Self::Up { .. } => Self::up(p),
            Self::DoubleClick { .. } => Self::double_click(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event: PointerEvent =
            serde_json::from_str(r#"{"type":"double_click","x":1.5,"y":2}"#).unwrap();
        assert_eq!(event, PointerEvent::double_click(Point::new(1.5, 2.0)));
    }

    #[test]
    fn test_with_position_keeps_kind() {
        let event = PointerEvent::up(Point::ZERO).with_position(Point::new(3.0, 4.0));
        assert_eq!(event, PointerEvent::Up { x: 3.0, y: 4.0 });
    }
}
