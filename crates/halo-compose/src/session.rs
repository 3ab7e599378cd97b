//! Editor session: the loaded assets, the user's photo and its transform.
//!
//! All mutation goes through [`Session`] so the redraw flag is raised
//! whenever the composite changes. Slider input arriving before a photo
//! is loaded is ignored, matching the disabled controls.

use crate::compositor::{self, DecodedImage, Surface};
use crate::config::{MAX_SCALE, MIN_SCALE, SCALE_STEP, VIEWPORT};
use crate::encode::{self, Export};
use crate::input;
use crate::redraw::RedrawFlag;
use crate::surface::{PixmapSurface, RasterImage};
use crate::transform::TransformState;
use crate::types::{InputError, RenderError, Viewport};

/// Errors raised by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An export was requested before any photo was loaded.
    #[error("choose an image first")]
    NoImage,

    /// The selected file was rejected or could not be decoded.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Rendering or encoding the composite failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// The fixed layers drawn under and over the user's photo.
#[derive(Debug, Clone)]
pub struct Assets<I> {
    /// Full-canvas layer drawn first.
    pub background: I,
    /// Full-canvas layer drawn last, unclipped.
    pub frame: I,
}

/// Ranges and current values for the three editor sliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRanges {
    /// Zoom slider minimum.
    pub scale_min: f64,
    /// Zoom slider maximum.
    pub scale_max: f64,
    /// Zoom slider step.
    pub scale_step: f64,
    /// Current zoom.
    pub scale: f64,
    /// X slider spans `-max_offset_x..=max_offset_x`.
    pub max_offset_x: f64,
    /// Y slider spans `-max_offset_y..=max_offset_y`.
    pub max_offset_y: f64,
    /// Current horizontal offset.
    pub offset_x: f64,
    /// Current vertical offset.
    pub offset_y: f64,
}

/// State of one editing session.
#[derive(Debug)]
pub struct Session<I = RasterImage> {
    assets: Assets<I>,
    user_image: Option<I>,
    transform: TransformState,
    redraw: RedrawFlag,
    viewport: Viewport,
}

impl<I: DecodedImage> Session<I> {
    /// Start a session over decoded assets, with no photo yet.
    pub fn new(assets: Assets<I>) -> Self {
        Self {
            assets,
            user_image: None,
            transform: TransformState::default(),
            redraw: RedrawFlag::new(),
            viewport: VIEWPORT,
        }
    }

    /// Use a different clip circle.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Reject uploads over the size limit before they are read.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Input`] wrapping
    /// [`InputError::TooLarge`]. The session is left unchanged.
    pub fn validate_upload(&self, size_bytes: u64) -> Result<(), SessionError> {
        input::validate_file_size(size_bytes).map_err(SessionError::from)
    }

    /// Replace the user's photo and reset zoom and pan.
    pub fn load_image(&mut self, image: I) {
        tracing::debug!(dimensions = ?image.dimensions(), "photo loaded");
        self.user_image = Some(image);
        self.transform = TransformState::default();
        self.redraw.request();
    }

    /// Whether a photo has been loaded.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.user_image.is_some()
    }

    /// Current zoom and pan.
    #[must_use]
    pub const fn transform(&self) -> &TransformState {
        &self.transform
    }

    /// The clip circle.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Request a redraw without changing state, e.g. on startup.
    pub fn request_redraw(&self) {
        self.redraw.request();
    }

    /// Whether a redraw is pending.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.redraw.is_pending()
    }

    /// Set the zoom factor, clamped to `[MIN_SCALE, MAX_SCALE]`, and
    /// re-clamp the offsets. Ignored without a photo.
    pub fn set_scale(&mut self, scale: f64) {
        let Some(image) = &self.user_image else {
            return;
        };
        self.transform
            .set_scale(scale, image.dimensions(), self.viewport);
        self.redraw.request();
    }

    /// Set the horizontal pan, clamped to the current bounds. Ignored
    /// without a photo.
    pub fn set_offset_x(&mut self, x: f64) {
        let Some(image) = &self.user_image else {
            return;
        };
        self.transform
            .set_offset_x(x, image.dimensions(), self.viewport);
        self.redraw.request();
    }

    /// Set the vertical pan, clamped to the current bounds. Ignored
    /// without a photo.
    pub fn set_offset_y(&mut self, y: f64) {
        let Some(image) = &self.user_image else {
            return;
        };
        self.transform
            .set_offset_y(y, image.dimensions(), self.viewport);
        self.redraw.request();
    }

    /// Slider configuration, or `None` while the sliders are disabled.
    #[must_use]
    pub fn slider_ranges(&self) -> Option<SliderRanges> {
        let image = self.user_image.as_ref()?;
        let bounds = self.transform.bounds(image.dimensions(), self.viewport);
        Some(SliderRanges {
            scale_min: MIN_SCALE,
            scale_max: MAX_SCALE,
            scale_step: SCALE_STEP,
            scale: self.transform.scale(),
            max_offset_x: bounds.max_x,
            max_offset_y: bounds.max_y,
            offset_x: self.transform.offset_x(),
            offset_y: self.transform.offset_y(),
        })
    }

    /// Draw the composite if anything changed since the last draw.
    ///
    /// Returns whether a draw happened.
    pub fn render_if_dirty<S: Surface<Image = I>>(&self, surface: &mut S) -> bool {
        if !self.redraw.take() {
            return false;
        }
        self.render(surface);
        true
    }

    /// Draw the composite unconditionally.
    pub fn render<S: Surface<Image = I>>(&self, surface: &mut S) {
        compositor::render(
            surface,
            &self.assets.background,
            self.user_image.as_ref(),
            &self.assets.frame,
            &self.transform,
            self.viewport,
        );
    }
}

impl Session<RasterImage> {
    /// Decode `bytes` and load the result. A decode failure leaves the
    /// current photo and transform untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Input`] if the bytes cannot be decoded.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let image = input::decode(bytes)?;
        self.load_image(image);
        Ok(())
    }

    /// Render the current state into `surface` and encode it at full
    /// resolution plus thumbnail.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoImage`] without a photo, or
    /// [`SessionError::Render`] if encoding fails.
    pub fn export(&self, surface: &mut PixmapSurface) -> Result<Export, SessionError> {
        if self.user_image.is_none() {
            return Err(SessionError::NoImage);
        }
        self.render(surface);
        Ok(encode::export(surface)?)
    }
}
