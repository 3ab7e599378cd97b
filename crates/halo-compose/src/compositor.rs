//! Compositor: draws background, clipped user photo, and frame onto an
//! output surface.
//!
//! Drawing goes through the [`Surface`] trait so the same layering logic
//! drives the software [`PixmapSurface`](crate::surface::PixmapSurface)
//! used for export and any other backend that can draw, clip and keep a
//! save/restore stack.

use crate::transform::TransformState;
use crate::types::{Dimensions, Rect, Viewport};

/// A decoded raster that can be drawn onto a [`Surface`].
pub trait DecodedImage {
    /// Pixel dimensions of the image.
    fn dimensions(&self) -> Dimensions;
}

/// A 2-D drawing surface accepting the primitives the compositor needs.
///
/// Implementations must honour the active clip in
/// [`draw_image`](Self::draw_image) and treat [`save`](Self::save) /
/// [`restore`](Self::restore) as a stack of clip states.
pub trait Surface {
    /// The image type this surface can draw.
    type Image: DecodedImage;

    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Reset every pixel to transparent, ignoring the clip.
    fn clear(&mut self);

    /// Draw `image` stretched to `dest`, respecting the current clip.
    fn draw_image(&mut self, image: &Self::Image, dest: Rect);

    /// Push the current clip state.
    fn save(&mut self);

    /// Intersect the current clip with the viewport circle.
    fn clip_circle(&mut self, viewport: Viewport);

    /// Pop back to the most recently saved clip state.
    fn restore(&mut self);
}

/// Render the full composite.
///
/// Layer order is fixed: background (full canvas), then the user photo
/// clipped to `viewport` and placed by `transform`, then the frame
/// (full canvas, unclipped). The clip is always removed before the frame
/// is drawn.
pub fn render<S: Surface>(
    surface: &mut S,
    background: &S::Image,
    user_image: Option<&S::Image>,
    frame: &S::Image,
    transform: &TransformState,
    viewport: Viewport,
) {
    let canvas = Rect::covering(surface.width(), surface.height());

    surface.clear();
    surface.draw_image(background, canvas);

    if let Some(image) = user_image {
        surface.save();
        surface.clip_circle(viewport);
        let dest = transform.draw_rect(image.dimensions(), viewport);
        surface.draw_image(image, dest);
        surface.restore();
    }

    surface.draw_image(frame, canvas);
}
