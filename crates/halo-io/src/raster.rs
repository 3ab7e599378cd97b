//! Blob URLs for encoded images.
//!
//! History thumbnails, the full-resolution modal image and downloads all
//! point at object URLs rather than data URLs, so the PNG bytes are
//! handed to the browser once without base64 inflation.

use halo_compose::EncodedImage;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::JsValue;
use web_sys::{Blob, BlobPropertyBag, Url};

/// An object URL for a PNG, revoked when dropped.
#[derive(Debug, PartialEq, Eq)]
pub struct BlobUrl(String);

impl BlobUrl {
    /// Copy `image` into a `Blob` and create an object URL for it.
    ///
    /// # Errors
    ///
    /// Returns the browser's error if `Blob` or URL creation fails.
    pub fn new(image: &EncodedImage) -> Result<Self, JsValue> {
        let parts = Array::of1(&Uint8Array::from(image.as_bytes()));
        let opts = BlobPropertyBag::new();
        opts.set_type(EncodedImage::MIME_TYPE);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &opts)?;
        Url::create_object_url_with_blob(&blob).map(Self)
    }

    /// The `blob:` URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Drop for BlobUrl {
    fn drop(&mut self) {
        // Fails only if the URL is already gone.
        let _ = Url::revoke_object_url(&self.0);
    }
}
