//! Geometry engine: maps the zoom factor to a draw size and the legal
//! pan range inside the circular viewport.
//!
//! At scale 1.0 the photo exactly covers the viewport on its shorter
//! axis, so the circle is always filled. Panning is bounded so the
//! covering rectangle never exposes background inside the viewport's
//! bounding square.

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, Size};

/// Compute the drawn size of an image at the given zoom factor.
///
/// Landscape images (aspect ratio > 1) get a base height equal to the
/// viewport diameter; portrait and square images get a base width
/// equal to the diameter. Both axes are then multiplied by `scale`.
#[must_use]
pub fn scaled_dimensions(image: Dimensions, viewport_diameter: f64, scale: f64) -> Size {
    let aspect = image.aspect_ratio();
    let (base_width, base_height) = if aspect > 1.0 {
        (viewport_diameter * aspect, viewport_diameter)
    } else {
        (viewport_diameter, viewport_diameter / aspect)
    };
    Size::new(base_width * scale, base_height * scale)
}

/// Symmetric pan limits: offsets are legal within `[-max, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetBounds {
    /// Largest horizontal offset magnitude.
    pub max_x: f64,
    /// Largest vertical offset magnitude.
    pub max_y: f64,
}

impl OffsetBounds {
    /// Bounds that pin the image to the center.
    pub const ZERO: Self = Self {
        max_x: 0.0,
        max_y: 0.0,
    };

    /// Clamp an offset pair into these bounds.
    #[must_use]
    pub fn clamp(self, x: f64, y: f64) -> (f64, f64) {
        (self.clamp_x(x), self.clamp_y(y))
    }

    /// Clamp a horizontal offset.
    #[must_use]
    pub fn clamp_x(self, x: f64) -> f64 {
        x.clamp(-self.max_x, self.max_x)
    }

    /// Clamp a vertical offset.
    #[must_use]
    pub fn clamp_y(self, y: f64) -> f64 {
        y.clamp(-self.max_y, self.max_y)
    }
}

/// Compute how far the scaled image may be panned on each axis.
///
/// `max(0, (scaled - diameter) / 2)` per axis, so the result is never
/// negative even if the scaled image is smaller than the viewport.
#[must_use]
pub fn offset_bounds(scaled: Size, viewport_diameter: f64) -> OffsetBounds {
    OffsetBounds {
        max_x: ((scaled.width - viewport_diameter) / 2.0).max(0.0),
        max_y: ((scaled.height - viewport_diameter) / 2.0).max(0.0),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DIAMETER: f64 = 1795.0;

    fn dims(w: u32, h: u32) -> Dimensions {
        Dimensions::new(w, h).unwrap()
    }

    #[test]
    fn landscape_covers_on_height() {
        let size = scaled_dimensions(dims(400, 200), DIAMETER, 1.0);
        assert!((size.height - 1795.0).abs() < 1e-9);
        assert!((size.width - 3590.0).abs() < 1e-9);
    }

    #[test]
    fn portrait_covers_on_width() {
        let size = scaled_dimensions(dims(300, 600), DIAMETER, 1.0);
        assert!((size.width - 1795.0).abs() < 1e-9);
        assert!((size.height - 3590.0).abs() < 1e-9);
    }

    #[test]
    fn square_matches_diameter() {
        let size = scaled_dimensions(dims(512, 512), DIAMETER, 1.0);
        assert_eq!(size, Size::new(DIAMETER, DIAMETER));
    }

    #[test]
    fn scale_multiplies_both_axes() {
        let size = scaled_dimensions(dims(512, 512), DIAMETER, 2.0);
        assert_eq!(size, Size::new(3590.0, 3590.0));
    }

    #[test]
    fn two_to_one_bounds() {
        let size = scaled_dimensions(dims(2000, 1000), DIAMETER, 1.0);
        let bounds = offset_bounds(size, DIAMETER);
        assert!((bounds.max_x - 897.5).abs() < 1e-9);
        assert!(bounds.max_y.abs() < f64::EPSILON);
    }

    #[test]
    fn bounds_never_negative() {
        let ratios = [(1, 1), (1, 7), (7, 1), (16, 9), (9, 16), (1000, 999)];
        let scales = [0.1, 0.5, 1.0, 1.37, 2.0, 3.0];
        for (w, h) in ratios {
            for scale in scales {
                let size = scaled_dimensions(dims(w, h), DIAMETER, scale);
                let bounds = offset_bounds(size, DIAMETER);
                assert!(bounds.max_x >= 0.0, "{w}x{h} @ {scale}: {bounds:?}");
                assert!(bounds.max_y >= 0.0, "{w}x{h} @ {scale}: {bounds:?}");
            }
        }
    }

    #[test]
    fn clamp_keeps_values_inside() {
        let bounds = OffsetBounds {
            max_x: 10.0,
            max_y: 0.0,
        };
        assert_eq!(bounds.clamp(25.0, -3.0), (10.0, 0.0));
        assert_eq!(bounds.clamp(-25.0, 3.0), (-10.0, 0.0));
        assert_eq!(bounds.clamp(4.0, 0.0), (4.0, 0.0));
    }
}
