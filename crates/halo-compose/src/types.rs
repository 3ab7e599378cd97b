//! Shared types for the halo compositor and history store.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference decoded
/// and composited rasters without depending on `image` directly.
pub use image::RgbaImage;

/// A width/height pair in canvas units (fractional pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Pixel dimensions of a decoded image.
///
/// Both axes are guaranteed non-zero, so aspect-ratio math never
/// divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    /// Create dimensions, returning `None` if either axis is zero.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.height
    }

    /// Width divided by height.
    #[must_use]
    pub fn aspect_ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// An axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin covering `width` x `height` pixels.
    #[must_use]
    pub fn covering(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, f64::from(width), f64::from(height))
    }
}

/// The fixed circular region of the output canvas where the user's
/// photo is visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal center.
    pub center_x: f64,
    /// Vertical center.
    pub center_y: f64,
    /// Circle radius.
    pub radius: f64,
}

impl Viewport {
    /// Create a new viewport circle.
    #[must_use]
    pub const fn new(center_x: f64, center_y: f64, radius: f64) -> Self {
        Self {
            center_x,
            center_y,
            radius,
        }
    }

    /// Circle diameter.
    #[must_use]
    pub fn diameter(self) -> f64 {
        self.radius * 2.0
    }

    /// Whether `(x, y)` lies inside or on the circle.
    #[must_use]
    pub fn contains(self, x: f64, y: f64) -> bool {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        dx.mul_add(dx, dy * dy) <= self.radius * self.radius
    }
}

/// An encoded (PNG) image as stored in history and offered for download.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage(Vec<u8>);

impl EncodedImage {
    /// MIME type of every encoded image produced by the compositor.
    pub const MIME_TYPE: &'static str = "image/png";

    /// Wrap already-encoded bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Size of the encoded data in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there is no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Image payloads are large; print the length instead of the bytes.
impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncodedImage")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

/// Errors raised while accepting a user-selected file.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The file exceeds [`crate::config::MAX_FILE_SIZE_BYTES`].
    #[error("file is too large ({size} bytes); please choose an image under {limit_mb} MB")]
    TooLarge {
        /// Size of the rejected file in bytes.
        size: u64,
        /// The configured limit in megabytes.
        limit_mb: u64,
    },

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The decoded image has a zero-length axis.
    #[error("image has zero width or height")]
    ZeroSized,
}

/// Errors raised while rendering or encoding a composite.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The drawing surface could not be allocated.
    #[error("cannot allocate a {width}x{height} surface")]
    SurfaceAllocation {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] image::ImageError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_reject_zero_axes() {
        assert!(Dimensions::new(0, 10).is_none());
        assert!(Dimensions::new(10, 0).is_none());
        assert!(Dimensions::new(1, 1).is_some());
    }

    #[test]
    fn aspect_ratio_is_width_over_height() {
        let dims = Dimensions::new(400, 200).unwrap();
        assert!((dims.aspect_ratio() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn viewport_contains_boundary_point() {
        let vp = Viewport::new(0.0, 0.0, 10.0);
        assert!(vp.contains(10.0, 0.0));
        assert!(vp.contains(0.0, 0.0));
        assert!(!vp.contains(7.1, 7.1));
    }

    #[test]
    fn encoded_image_debug_hides_payload() {
        let img = EncodedImage::new(vec![1, 2, 3]);
        assert_eq!(format!("{img:?}"), "EncodedImage(3 bytes)");
    }
}
