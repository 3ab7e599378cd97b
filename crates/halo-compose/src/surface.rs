//! Software drawing surface backed by a `tiny-skia` pixmap.
//!
//! Images are stored premultiplied, as `tiny-skia` expects. Conversion
//! to and from straight-alpha [`RgbaImage`] happens at the edges: when a
//! decoded photo or asset enters, and when the composite leaves for
//! encoding or display.

use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, IntSize, Mask, PathBuilder, Pixmap, PixmapPaint,
    Transform,
};

use crate::compositor::{DecodedImage, Surface};
use crate::types::{Dimensions, Rect, RenderError, RgbaImage, Viewport};

/// A decoded image ready to be drawn onto a [`PixmapSurface`].
#[derive(Clone)]
pub struct RasterImage {
    pixmap: Pixmap,
    dimensions: Dimensions,
}

impl RasterImage {
    /// Convert a straight-alpha RGBA image into a drawable raster.
    ///
    /// Returns `None` if the image has a zero-length axis.
    #[must_use]
    pub fn from_rgba(image: &RgbaImage) -> Option<Self> {
        let dimensions = Dimensions::new(image.width(), image.height())?;
        let size = IntSize::from_wh(image.width(), image.height())?;
        let mut data = Vec::with_capacity(image.as_raw().len());
        for p in image.pixels() {
            let c = ColorU8::from_rgba(p.0[0], p.0[1], p.0[2], p.0[3]).premultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        let pixmap = Pixmap::from_vec(data, size)?;
        Some(Self { pixmap, dimensions })
    }

    /// Wrap an already premultiplied pixmap.
    pub(crate) fn from_pixmap(pixmap: Pixmap) -> Option<Self> {
        let dimensions = Dimensions::new(pixmap.width(), pixmap.height())?;
        Some(Self { pixmap, dimensions })
    }
}

impl DecodedImage for RasterImage {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

/// A [`Surface`] that rasterises into an in-memory pixmap.
///
/// Clipping uses anti-aliased masks. `save` snapshots the active mask and
/// `restore` puts it back, mirroring the canvas 2-D context model.
pub struct PixmapSurface {
    pixmap: Pixmap,
    clip: Option<Mask>,
    saved: Vec<Option<Mask>>,
}

impl PixmapSurface {
    /// Allocate a transparent surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SurfaceAllocation`] if either dimension is
    /// zero or the pixel buffer would be too large.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let pixmap =
            Pixmap::new(width, height).ok_or(RenderError::SurfaceAllocation { width, height })?;
        Ok(Self {
            pixmap,
            clip: None,
            saved: Vec::new(),
        })
    }

    /// Premultiplied RGBA bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Copy the surface out as a straight-alpha RGBA image.
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in img.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        img
    }

    /// Copy the surface out as straight-alpha RGBA bytes, the layout
    /// browser `ImageData` expects.
    #[must_use]
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.to_rgba_image().into_raw()
    }

    fn new_mask(&self) -> Option<Mask> {
        Mask::new(self.pixmap.width(), self.pixmap.height())
    }
}

impl Surface for PixmapSurface {
    type Image = RasterImage;

    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw_image(&mut self, image: &RasterImage, dest: Rect) {
        let sx = dest.width / f64::from(image.dimensions.width());
        let sy = dest.height / f64::from(image.dimensions.height());
        let transform =
            Transform::from_row(sx as f32, 0.0, 0.0, sy as f32, dest.x as f32, dest.y as f32);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            image.pixmap.as_ref(),
            &paint,
            transform,
            self.clip.as_ref(),
        );
    }

    fn save(&mut self) {
        self.saved.push(self.clip.clone());
    }

    #[allow(clippy::cast_possible_truncation)]
    fn clip_circle(&mut self, viewport: Viewport) {
        let Some(path) = PathBuilder::from_circle(
            viewport.center_x as f32,
            viewport.center_y as f32,
            viewport.radius as f32,
        ) else {
            // Degenerate circle: nothing may be drawn until restore.
            self.clip = self.new_mask();
            return;
        };

        match self.clip.as_mut() {
            Some(mask) => {
                mask.intersect_path(&path, FillRule::Winding, true, Transform::identity());
            }
            None => {
                let mut mask = self.new_mask();
                if let Some(mask) = mask.as_mut() {
                    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
                }
                self.clip = mask;
            }
        }
    }

    fn restore(&mut self) {
        // Unbalanced restores are ignored, as on a canvas context.
        if let Some(clip) = self.saved.pop() {
            self.clip = clip;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::compositor::render;
    use crate::transform::TransformState;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RasterImage {
        RasterImage::from_rgba(&RgbaImage::from_pixel(w, h, image::Rgba(rgba))).unwrap()
    }

    fn transparent_frame() -> RasterImage {
        solid(4, 4, [0, 0, 0, 0])
    }

    #[test]
    fn zero_sized_surface_is_rejected() {
        assert!(matches!(
            PixmapSurface::new(0, 10),
            Err(RenderError::SurfaceAllocation { .. })
        ));
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        assert!(RasterImage::from_rgba(&RgbaImage::new(0, 3)).is_none());
    }

    #[test]
    fn photo_only_appears_inside_viewport() {
        let mut surface = PixmapSurface::new(100, 100).unwrap();
        let bg = solid(4, 4, [0, 0, 255, 255]);
        let photo = solid(8, 8, [255, 0, 0, 255]);
        let vp = Viewport::new(50.0, 50.0, 30.0);

        render(
            &mut surface,
            &bg,
            Some(&photo),
            &transparent_frame(),
            &TransformState::default(),
            vp,
        );
        let img = surface.to_rgba_image();

        // Center: photo.
        assert_eq!(img.get_pixel(50, 50).0, [255, 0, 0, 255]);
        // Corner: outside the circle but inside the photo's bounding
        // square, so only the clip keeps it blue.
        assert_eq!(img.get_pixel(25, 25).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 255, 255]);
    }

    #[test]
    fn photo_pixels_stay_within_clip_circle() {
        let mut surface = PixmapSurface::new(100, 100).unwrap();
        let vp = Viewport::new(50.0, 50.0, 30.0);
        render(
            &mut surface,
            &solid(4, 4, [0, 0, 255, 255]),
            Some(&solid(8, 8, [255, 0, 0, 255])),
            &transparent_frame(),
            &TransformState::default(),
            vp,
        );
        let img = surface.to_rgba_image();

        // One pixel of slack either side for the anti-aliased edge.
        let outer = Viewport::new(vp.center_x, vp.center_y, vp.radius + 1.0);
        let inner = Viewport::new(vp.center_x, vp.center_y, vp.radius - 1.0);
        for (x, y, px) in img.enumerate_pixels() {
            let (cx, cy) = (f64::from(x) + 0.5, f64::from(y) + 0.5);
            if px.0[0] > 0 {
                assert!(outer.contains(cx, cy), "photo leaked at ({x}, {y})");
            }
            if inner.contains(cx, cy) {
                assert_eq!(px.0, [255, 0, 0, 255], "hole at ({x}, {y})");
            }
        }
    }

    #[test]
    fn frame_is_drawn_unclipped_on_top() {
        let mut surface = PixmapSurface::new(40, 40).unwrap();
        let bg = solid(4, 4, [0, 0, 255, 255]);
        let photo = solid(4, 4, [255, 0, 0, 255]);
        let frame = solid(4, 4, [0, 255, 0, 255]);
        let vp = Viewport::new(20.0, 20.0, 10.0);

        render(
            &mut surface,
            &bg,
            Some(&photo),
            &frame,
            &TransformState::default(),
            vp,
        );
        let img = surface.to_rgba_image();
        assert_eq!(img.get_pixel(20, 20).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn restore_removes_clip() {
        let mut surface = PixmapSurface::new(20, 20).unwrap();
        surface.save();
        surface.clip_circle(Viewport::new(10.0, 10.0, 2.0));
        surface.restore();
        surface.draw_image(
            &solid(2, 2, [9, 9, 9, 255]),
            Rect::new(0.0, 0.0, 20.0, 20.0),
        );
        assert_eq!(surface.to_rgba_image().get_pixel(0, 0).0, [9, 9, 9, 255]);
    }

    #[test]
    fn clear_resets_to_transparent() {
        let mut surface = PixmapSurface::new(8, 8).unwrap();
        surface.draw_image(&solid(1, 1, [1, 2, 3, 255]), Rect::covering(8, 8));
        surface.clear();
        assert!(surface.data().iter().all(|&b| b == 0));
    }
}
