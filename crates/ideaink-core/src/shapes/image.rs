//! Embedded raster image.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_shape_id};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Affine, Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }
        // RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// An image placed on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Original image width in pixels.
    pub source_width: u32,
    /// Original image height in pixels.
    pub source_height: u32,
    pub format: ImageFormat,
    /// Encoded bytes, base64 so the snapshot stays plain JSON.
    pub data_base64: String,
    pub style: ShapeStyle,
}

impl Image {
    /// Create an image at its natural pixel size.
    pub fn new(
        position: Point,
        data: &[u8],
        source_width: u32,
        source_height: u32,
        format: ImageFormat,
    ) -> Self {
        Self {
            id: new_shape_id(),
            position,
            width: source_width as f64,
            height: source_height as f64,
            source_width,
            source_height,
            format,
            data_base64: STANDARD.encode(data),
            style: ShapeStyle::default(),
        }
    }

    /// Shrink to fit within `max`, preserving aspect ratio. Never enlarges.
    pub fn fit_within(mut self, max: Size) -> Self {
        if self.width <= max.width && self.height <= max.height {
            return self;
        }
        let scale = (max.width / self.width).min(max.height / self.height);
        self.width *= scale;
        self.height *= scale;
        self
    }

    /// Place the image so its center lands on `center`.
    pub fn centered_on(mut self, center: Point) -> Self {
        self.position = Point::new(center.x - self.width / 2.0, center.y - self.height / 2.0);
        self
    }

    /// Get the raw image data (decoded from base64).
    pub fn data(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.data_base64).ok()
    }

    /// Get the bounding rectangle.
    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_rect().inflate(tolerance, tolerance).contains(point)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        let scale = affine.as_coeffs();
        self.width *= scale[0].abs();
        self.height *= scale[3].abs();
    }
}
