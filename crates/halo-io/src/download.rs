//! Saving the composite to the user's disk.
//!
//! The PNG is wrapped in a [`BlobUrl`] and handed to a detached
//! `<a download>` that is clicked once. Browser only.

use halo_compose::EncodedImage;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlAnchorElement};

use crate::raster::BlobUrl;

/// Why a download could not be started.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A browser API call threw.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(crate::idb::js_err(&value))
    }
}

/// Offer `image` to the user as `filename`.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if the object URL or the anchor
/// cannot be created.
pub fn trigger_download(image: &EncodedImage, filename: &str) -> Result<(), DownloadError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| DownloadError::JsError("no document".into()))?;
    // Revoked when it goes out of scope, after the click has started the download.
    let url = BlobUrl::new(image)?;
    let anchor = make_anchor(&document)?;
    anchor.set_href(url.as_str());
    anchor.set_download(filename);
    anchor.click();
    Ok(())
}

fn make_anchor(document: &Document) -> Result<HtmlAnchorElement, DownloadError> {
    document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| DownloadError::JsError("created element is not an anchor".into()))
}
