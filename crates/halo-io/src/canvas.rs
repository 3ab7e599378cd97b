//! Presenting the software-rendered composite on an HTML canvas.

use halo_compose::{PixmapSurface, Surface};
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

/// Errors raised while drawing to the page canvas.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// No element with the requested id, or it is not a `<canvas>`.
    #[error("canvas element #{0} not found")]
    NotFound(String),

    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for CanvasError {
    fn from(value: JsValue) -> Self {
        Self::JsError(crate::idb::js_err(&value))
    }
}

/// Look up a `<canvas>` by element id.
///
/// # Errors
///
/// Returns [`CanvasError::NotFound`] if there is no such canvas.
pub fn find_canvas(id: &str) -> Result<HtmlCanvasElement, CanvasError> {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok())
        .ok_or_else(|| CanvasError::NotFound(id.to_owned()))
}

/// Copy `surface` onto `canvas` pixel for pixel, resizing the canvas
/// backing store to match if needed.
///
/// # Errors
///
/// Returns [`CanvasError::JsError`] if the 2-D context is unavailable or
/// the pixel upload fails.
pub fn blit(surface: &PixmapSurface, canvas: &HtmlCanvasElement) -> Result<(), CanvasError> {
    let (width, height) = (surface.width(), surface.height());
    if canvas.width() != width {
        canvas.set_width(width);
    }
    if canvas.height() != height {
        canvas.set_height(height);
    }

    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| CanvasError::JsError("2d context unavailable".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| CanvasError::JsError("unexpected context type".into()))?;

    let rgba = surface.to_rgba_bytes();
    let image_data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(&rgba), width, height)?;
    ctx.put_image_data(&image_data, 0.0, 0.0)?;
    Ok(())
}
