//! Built-in background and frame layers.
//!
//! Used when no asset files are supplied. Both are drawn with `tiny-skia`
//! at canvas size, so they line up with [`VIEWPORT`] exactly.

use tiny_skia::{
    Color, GradientStop, LineCap, LinearGradient, Paint, PathBuilder, Pixmap, Point, SpreadMode,
    Stroke, Transform,
};

use crate::config::{CANVAS_HEIGHT, CANVAS_WIDTH, VIEWPORT};
use crate::session::Assets;
use crate::surface::RasterImage;
use crate::types::RenderError;

/// Width of the frame ring, canvas pixels.
const RING_WIDTH: f32 = 48.0;

/// The default layer pair.
///
/// # Errors
///
/// Returns [`RenderError::SurfaceAllocation`] if the canvas-sized
/// pixmaps cannot be allocated.
pub fn default_assets() -> Result<Assets<RasterImage>, RenderError> {
    Ok(Assets {
        background: background()?,
        frame: frame()?,
    })
}

fn canvas() -> Result<Pixmap, RenderError> {
    Pixmap::new(CANVAS_WIDTH, CANVAS_HEIGHT).ok_or(RenderError::SurfaceAllocation {
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
    })
}

fn wrap(pixmap: Pixmap) -> Result<RasterImage, RenderError> {
    RasterImage::from_pixmap(pixmap).ok_or(RenderError::SurfaceAllocation {
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
    })
}

/// Diagonal two-tone gradient covering the whole canvas.
#[allow(clippy::cast_precision_loss)]
fn background() -> Result<RasterImage, RenderError> {
    let mut pixmap = canvas()?;
    let shader = LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32),
        vec![
            GradientStop::new(0.0, Color::from_rgba8(0x1d, 0x35, 0x57, 0xff)),
            GradientStop::new(1.0, Color::from_rgba8(0x45, 0x7b, 0x9d, 0xff)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    );
    match shader {
        Some(shader) => {
            let paint = Paint {
                shader,
                ..Paint::default()
            };
            pixmap.fill_rect(
                tiny_skia::Rect::from_xywh(0.0, 0.0, CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32)
                    .ok_or(RenderError::SurfaceAllocation {
                        width: CANVAS_WIDTH,
                        height: CANVAS_HEIGHT,
                    })?,
                &paint,
                Transform::identity(),
                None,
            );
        }
        None => pixmap.fill(Color::from_rgba8(0x1d, 0x35, 0x57, 0xff)),
    }
    wrap(pixmap)
}

/// Opaque ring straddling the viewport edge; transparent elsewhere.
#[allow(clippy::cast_possible_truncation)]
fn frame() -> Result<RasterImage, RenderError> {
    let mut pixmap = canvas()?;
    let path = PathBuilder::from_circle(
        VIEWPORT.center_x as f32,
        VIEWPORT.center_y as f32,
        VIEWPORT.radius as f32,
    );
    if let Some(path) = path {
        let stroke = Stroke {
            width: RING_WIDTH,
            line_cap: LineCap::Round,
            ..Stroke::default()
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(0xf1, 0xfa, 0xee, 0xff);
        paint.anti_alias = true;
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
    wrap(pixmap)
}
