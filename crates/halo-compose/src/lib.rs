//! halo-compose: Pure avatar compositing and history logic (sans-IO).
//!
//! Builds a circular avatar from three layers:
//! background -> user photo (scaled, panned, clipped to a circle) -> frame.
//! Saved composites go into a capacity-bounded history behind an async
//! storage-engine seam.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. The browser (`IndexedDB`,
//! canvas, downloads) lives in `halo-io`; the filesystem lives in
//! `halo-cli`.

pub mod assets;
pub mod compositor;
pub mod config;
pub mod encode;
pub mod gallery;
pub mod geometry;
pub mod history;
pub mod input;
pub mod redraw;
pub mod session;
pub mod surface;
pub mod transform;
pub mod types;

pub use assets::default_assets;
pub use compositor::{DecodedImage, Surface, render};
pub use encode::{Export, encode_png, render_thumbnail};
pub use gallery::{DetailView, Gallery, GalleryEntry};
pub use history::{
    HistoryRecord, HistoryStore, NewRecord, RecordId, Saved, StoreError, StorePhase,
};
pub use redraw::RedrawFlag;
pub use session::{Assets, Session, SessionError, SliderRanges};
pub use surface::{PixmapSurface, RasterImage};
pub use transform::TransformState;
pub use types::{Dimensions, EncodedImage, InputError, Rect, RenderError, Size, Viewport};

/// Compose a single avatar in one call.
///
/// Decodes `photo`, applies `scale` and the offsets (each clamped
/// exactly as the editor sliders would), renders onto a fresh
/// canvas-sized surface and returns the surface with the final
/// transform.
///
/// # Errors
///
/// Returns [`SessionError::Input`] if the photo cannot be decoded, or
/// [`SessionError::Render`] if the surface cannot be allocated.
pub fn compose(
    photo: &[u8],
    assets: Assets<RasterImage>,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
) -> Result<(PixmapSurface, TransformState), SessionError> {
    let mut session = Session::new(assets);
    session.load_bytes(photo)?;
    session.set_scale(scale);
    session.set_offset_x(offset_x);
    session.set_offset_y(offset_y);

    let mut surface = PixmapSurface::new(config::CANVAS_WIDTH, config::CANVAS_HEIGHT)?;
    session.render(&mut surface);
    Ok((surface, *session.transform()))
}
