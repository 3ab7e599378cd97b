//! User-controlled scale and pan applied to the photo before clipping.

use serde::{Deserialize, Serialize};

use crate::config::{MAX_SCALE, MIN_SCALE};
use crate::geometry::{self, OffsetBounds};
use crate::types::{Dimensions, Rect, Size, Viewport};

/// Current zoom and pan of the user's photo.
///
/// Offsets are measured from the centered position in canvas pixels.
/// Every mutation keeps them within the bounds implied by the current
/// scale, so a `TransformState` is always drawable as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl TransformState {
    /// Zoom factor.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Horizontal pan offset.
    #[must_use]
    pub const fn offset_x(&self) -> f64 {
        self.offset_x
    }

    /// Vertical pan offset.
    #[must_use]
    pub const fn offset_y(&self) -> f64 {
        self.offset_y
    }

    /// Drawn size of `image` at the current scale.
    #[must_use]
    pub fn scaled_size(&self, image: Dimensions, viewport: Viewport) -> Size {
        geometry::scaled_dimensions(image, viewport.diameter(), self.scale)
    }

    /// Legal pan range for `image` at the current scale.
    #[must_use]
    pub fn bounds(&self, image: Dimensions, viewport: Viewport) -> OffsetBounds {
        geometry::offset_bounds(self.scaled_size(image, viewport), viewport.diameter())
    }

    /// Change the zoom factor and re-clamp the existing offsets into the
    /// new bounds.
    ///
    /// Offsets are clamped rather than reset so the user's framing
    /// survives zooming as far as the geometry allows. Non-finite input
    /// is ignored.
    pub fn set_scale(&mut self, scale: f64, image: Dimensions, viewport: Viewport) {
        if !scale.is_finite() {
            return;
        }
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        let (x, y) = self
            .bounds(image, viewport)
            .clamp(self.offset_x, self.offset_y);
        self.offset_x = x;
        self.offset_y = y;
    }

    /// Set the horizontal offset, clamped to the current bounds.
    pub fn set_offset_x(&mut self, x: f64, image: Dimensions, viewport: Viewport) {
        if x.is_finite() {
            self.offset_x = self.bounds(image, viewport).clamp_x(x);
        }
    }

    /// Set the vertical offset, clamped to the current bounds.
    pub fn set_offset_y(&mut self, y: f64, image: Dimensions, viewport: Viewport) {
        if y.is_finite() {
            self.offset_y = self.bounds(image, viewport).clamp_y(y);
        }
    }

    /// Where to draw `image` so it is centered on the viewport, shifted
    /// by the current offsets.
    #[must_use]
    pub fn draw_rect(&self, image: Dimensions, viewport: Viewport) -> Rect {
        let size = self.scaled_size(image, viewport);
        Rect::new(
            viewport.center_x - size.width / 2.0 + self.offset_x,
            viewport.center_y - size.height / 2.0 + self.offset_y,
            size.width,
            size.height,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::VIEWPORT;

    fn dims(w: u32, h: u32) -> Dimensions {
        Dimensions::new(w, h).unwrap()
    }

    #[test]
    fn default_is_unzoomed_and_centered() {
        let t = TransformState::default();
        assert!((t.scale() - 1.0).abs() < f64::EPSILON);
        assert!(t.offset_x().abs() < f64::EPSILON);
        assert!(t.offset_y().abs() < f64::EPSILON);
    }

    #[test]
    fn zoom_out_reclamps_instead_of_resetting() {
        let img = dims(1000, 1000);
        let mut t = TransformState::default();
        t.set_scale(2.0, img, VIEWPORT);
        t.set_offset_x(800.0, img, VIEWPORT);
        t.set_offset_y(-300.0, img, VIEWPORT);
        assert!((t.offset_x() - 800.0).abs() < 1e-9);

        // At 1.5x the square image has 448.75px of slack on each side.
        t.set_scale(1.5, img, VIEWPORT);
        assert!((t.offset_x() - 448.75).abs() < 1e-9);
        assert!((t.offset_y() + 300.0).abs() < 1e-9);
    }

    #[test]
    fn offsets_stay_in_bounds_for_every_scale() {
        let img = dims(1600, 900);
        let mut t = TransformState::default();
        t.set_scale(3.0, img, VIEWPORT);
        t.set_offset_x(1e6, img, VIEWPORT);
        t.set_offset_y(-1e6, img, VIEWPORT);

        let mut scale = 3.0;
        while scale >= 1.0 {
            t.set_scale(scale, img, VIEWPORT);
            let b = t.bounds(img, VIEWPORT);
            assert!(t.offset_x().abs() <= b.max_x + 1e-9, "x out of bounds at {scale}");
            assert!(t.offset_y().abs() <= b.max_y + 1e-9, "y out of bounds at {scale}");
            scale -= 0.05;
        }
    }

    #[test]
    fn scale_is_clamped_to_slider_range() {
        let img = dims(10, 10);
        let mut t = TransformState::default();
        t.set_scale(0.2, img, VIEWPORT);
        assert!((t.scale() - MIN_SCALE).abs() < f64::EPSILON);
        t.set_scale(99.0, img, VIEWPORT);
        assert!((t.scale() - MAX_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_input_is_ignored() {
        let img = dims(10, 10);
        let mut t = TransformState::default();
        t.set_scale(f64::NAN, img, VIEWPORT);
        t.set_offset_x(f64::INFINITY, img, VIEWPORT);
        assert_eq!(t, TransformState::default());
    }

    #[test]
    fn draw_rect_centers_image_on_viewport() {
        let img = dims(2000, 1000);
        let t = TransformState::default();
        let rect = t.draw_rect(img, VIEWPORT);
        assert!((rect.x - (1000.0 - 1795.0)).abs() < 1e-9);
        assert!((rect.y - (1000.0 - 897.5)).abs() < 1e-9);
        assert!((rect.width - 3590.0).abs() < 1e-9);
        assert!((rect.height - 1795.0).abs() < 1e-9);
    }
}
