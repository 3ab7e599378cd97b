//! Accepting user-selected photos: size validation and decoding.

use crate::config::{MAX_FILE_SIZE_BYTES, MAX_FILE_SIZE_MB};
use crate::surface::RasterImage;
use crate::types::InputError;

/// File extensions offered by the upload picker.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/// Check whether a filename has an allowed image extension.
#[must_use]
pub fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    })
}

/// Reject files larger than [`MAX_FILE_SIZE_BYTES`].
///
/// Called before the file is read so oversized uploads never reach the
/// decoder, the session, or the history store.
///
/// # Errors
///
/// Returns [`InputError::TooLarge`] if `size_bytes` exceeds the limit.
pub fn validate_file_size(size_bytes: u64) -> Result<(), InputError> {
    if size_bytes > MAX_FILE_SIZE_BYTES {
        return Err(InputError::TooLarge {
            size: size_bytes,
            limit_mb: MAX_FILE_SIZE_MB,
        });
    }
    Ok(())
}

/// Decode image bytes (PNG, JPEG, BMP, WebP) into a drawable raster.
///
/// # Errors
///
/// Returns [`InputError::EmptyInput`] if `bytes` is empty.
/// Returns [`InputError::ImageDecode`] if the format is unrecognized or
/// the data is corrupt.
/// Returns [`InputError::ZeroSized`] if the decoded image has no pixels.
pub fn decode(bytes: &[u8]) -> Result<RasterImage, InputError> {
    if bytes.is_empty() {
        return Err(InputError::EmptyInput);
    }
    let img = image::load_from_memory(bytes)?;
    RasterImage::from_rgba(&img.to_rgba8()).ok_or(InputError::ZeroSized)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::compositor::DecodedImage;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn thirty_one_megabytes_is_rejected() {
        let result = validate_file_size(31 * 1024 * 1024);
        assert!(matches!(
            result,
            Err(InputError::TooLarge { limit_mb: 30, .. })
        ));
    }

    #[test]
    fn exactly_at_limit_is_accepted() {
        assert!(validate_file_size(MAX_FILE_SIZE_BYTES).is_ok());
        assert!(validate_file_size(0).is_ok());
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_allowed_extension("me.JPG"));
        assert!(has_allowed_extension("a.b.webp"));
        assert!(!has_allowed_extension("notes.txt"));
        assert!(!has_allowed_extension("png"));
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode(&[]), Err(InputError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_decode_error() {
        assert!(matches!(
            decode(&[0xFF, 0xFE, 0x00, 0x01]),
            Err(InputError::ImageDecode(_))
        ));
    }

    #[test]
    fn decodes_png_dimensions() {
        let raster = decode(&png(6, 3)).unwrap();
        let dims = raster.dimensions();
        assert_eq!((dims.width(), dims.height()), (6, 3));
    }
}
