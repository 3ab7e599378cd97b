//! PNG encoding of the composite and its gallery thumbnail.
//!
//! Both run only when the user saves; the interactive redraw path never
//! encodes or resamples.

use image::ImageEncoder;
use image::imageops::FilterType;

use crate::config::THUMBNAIL_SIZE;
use crate::surface::PixmapSurface;
use crate::types::{EncodedImage, RenderError, RgbaImage};

/// The two encoded forms of a composite that get persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Full-resolution PNG.
    pub full: EncodedImage,
    /// `THUMBNAIL_SIZE` x `THUMBNAIL_SIZE` PNG for the gallery grid.
    pub thumbnail: EncodedImage,
}

/// Encode an RGBA image as PNG.
///
/// # Errors
///
/// Returns [`RenderError::PngEncode`] if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<EncodedImage, RenderError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(EncodedImage::new(png_bytes))
}

/// Resample `image` down to a square `size` x `size` thumbnail.
///
/// Non-square inputs are stretched, matching how the thumbnail is
/// derived from the (square) output canvas.
#[must_use]
pub fn thumbnail(image: &RgbaImage, size: u32) -> RgbaImage {
    image::imageops::resize(image, size, size, FilterType::Triangle)
}

/// Resample the surface to the gallery thumbnail size and encode it.
///
/// # Errors
///
/// Returns [`RenderError::PngEncode`] if encoding fails.
pub fn render_thumbnail(surface: &PixmapSurface) -> Result<EncodedImage, RenderError> {
    encode_png(&thumbnail(&surface.to_rgba_image(), THUMBNAIL_SIZE))
}

/// Encode the surface at full resolution plus its thumbnail.
///
/// # Errors
///
/// Returns [`RenderError::PngEncode`] if either encoding fails.
pub fn export(surface: &PixmapSurface) -> Result<Export, RenderError> {
    let composite = surface.to_rgba_image();
    let full = encode_png(&composite)?;
    let thumbnail = encode_png(&thumbnail(&composite, THUMBNAIL_SIZE))?;
    Ok(Export { full, thumbnail })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_is_square_at_requested_size() {
        let img = RgbaImage::from_pixel(300, 120, image::Rgba([1, 2, 3, 255]));
        let thumb = thumbnail(&img, 40);
        assert_eq!(thumb.dimensions(), (40, 40));
        assert_eq!(thumb.get_pixel(20, 20).0, [1, 2, 3, 255]);
    }

    #[test]
    fn export_produces_decodable_pngs() {
        let surface = PixmapSurface::new(400, 400).unwrap();
        let out = export(&surface).unwrap();

        let full = image::load_from_memory(out.full.as_bytes()).unwrap();
        assert_eq!((full.width(), full.height()), (400, 400));

        let thumb = image::load_from_memory(out.thumbnail.as_bytes()).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
    }

    #[test]
    fn render_thumbnail_matches_export_thumbnail() {
        let surface = PixmapSurface::new(250, 250).unwrap();
        let thumb = render_thumbnail(&surface).unwrap();
        assert_eq!(thumb, export(&surface).unwrap().thumbnail);
    }
}
