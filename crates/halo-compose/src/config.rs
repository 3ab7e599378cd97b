//! Build-time configuration constants.
//!
//! None of these are runtime-configurable. The canvas, viewport and
//! thumbnail sizes match the background and frame artwork the app ships
//! with; changing them requires new artwork.

use crate::types::Viewport;

/// Output canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 2000;

/// Output canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 2000;

/// Diameter of the circular window in the frame artwork.
pub const VIEWPORT_DIAMETER: f64 = 1795.0;

/// The circular region the user's photo is clipped to, centered in the
/// canvas.
pub const VIEWPORT: Viewport = Viewport::new(
    CANVAS_WIDTH as f64 / 2.0,
    CANVAS_HEIGHT as f64 / 2.0,
    VIEWPORT_DIAMETER / 2.0,
);

/// Edge length of the square gallery thumbnail.
pub const THUMBNAIL_SIZE: u32 = 200;

/// Maximum number of composites kept in the history store.
pub const MAX_HISTORY_ITEMS: usize = 12;

/// Largest accepted upload, in megabytes.
pub const MAX_FILE_SIZE_MB: u64 = 30;

/// Largest accepted upload, in bytes.
pub const MAX_FILE_SIZE_BYTES: u64 = MAX_FILE_SIZE_MB * 1024 * 1024;

/// Lowest zoom factor. At 1.0 the photo exactly covers the viewport on
/// its shorter axis.
pub const MIN_SCALE: f64 = 1.0;

/// Highest zoom factor offered by the zoom slider.
pub const MAX_SCALE: f64 = 3.0;

/// Zoom slider granularity.
pub const SCALE_STEP: f64 = 0.01;

/// Name of the browser database holding the history collection.
pub const DB_NAME: &str = "AvatarDB";

/// Schema version of the history database.
pub const DB_VERSION: u32 = 1;

/// Name of the single record collection.
pub const STORE_NAME: &str = "avatars";

/// Filename offered when downloading a fresh composite.
pub const DOWNLOAD_FILENAME: &str = "avatar.png";
