//! Text shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use kurbo::{Affine, Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.55;
/// Line height as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Approximate the laid-out size of `content` at `font_size`.
///
/// Real glyph metrics belong to the renderer; this estimate is what layout
/// and hit-testing use until one reports back.
pub(crate) fn measure_text(content: &str, font_size: f64) -> Size {
    let max_line_len = content
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    // Empty content still occupies one line; a trailing newline opens another.
    let mut line_count = content.lines().count().max(1);
    if content.ends_with('\n') {
        line_count += 1;
    }
    Size::new(
        max_line_len as f64 * font_size * CHAR_WIDTH_FACTOR,
        line_count as f64 * font_size * LINE_HEIGHT_FACTOR,
    )
}

/// A free-standing editable text region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Position (top-left corner of text bounding box).
    pub position: Point,
    /// The text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Style properties. The stroke color is the glyph color.
    pub style: ShapeStyle,
}

impl Text {
    /// Default font size for text regions.
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    /// Create a new text shape.
    pub fn new(position: Point, content: String) -> Self {
        Self {
            id: new_shape_id(),
            position,
            content,
            font_size: Self::DEFAULT_FONT_SIZE,
            style: ShapeStyle::default(),
        }
    }

    /// Create a new text shape with font size.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Set the text content.
    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let size = measure_text(&self.content, self.font_size);
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + size.width.max(20.0),
            self.position.y + size.height,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        // Scale font size if there's uniform scaling
        let coeffs = affine.as_coeffs();
        let scale = (coeffs[0].abs() + coeffs[3].abs()) / 2.0;
        if (scale - 1.0).abs() > 0.01 {
            self.font_size *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_multiline() {
        let size = measure_text("ab\nabcd", 10.0);
        assert!((size.width - 4.0 * 10.0 * CHAR_WIDTH_FACTOR).abs() < 1e-9);
        assert!((size.height - 2.0 * 10.0 * LINE_HEIGHT_FACTOR).abs() < 1e-9);
    }

    #[test]
    fn test_measure_empty_is_one_line() {
        let size = measure_text("", 10.0);
        assert!(size.width.abs() < f64::EPSILON);
        assert!((size.height - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test() {
        let text = Text::new(Point::new(100.0, 100.0), "Hello World".to_string());
        let center = text.bounds().center();
        assert!(text.hit_test(center, 0.0));
        assert!(!text.hit_test(Point::new(0.0, 0.0), 0.0));
    }

    #[test]
    fn test_translate_keeps_font_size() {
        let mut text = Text::new(Point::ZERO, "Hi".to_string());
        text.transform(Affine::translate((10.0, 10.0)));
        assert!((text.font_size - Text::DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
        assert!((text.position.x - 10.0).abs() < f64::EPSILON);
    }
}
