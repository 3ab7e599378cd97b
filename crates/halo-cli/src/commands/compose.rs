//! `halo compose`: render one avatar to a PNG file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use futures::executor::block_on;
use halo_compose::config::MIN_SCALE;
use halo_compose::input::{decode, validate_file_size};
use halo_compose::surface::RasterImage;
use halo_compose::{
    Assets, HistoryStore, NewRecord, Saved, SessionError, TransformState, default_assets, encode,
};

use crate::CliError;
use crate::fs_store::DirectoryEngine;

#[derive(Debug, Args)]
pub struct ComposeArgs {
    /// Photo to place inside the frame (PNG, JPEG, BMP or WebP).
    pub photo: PathBuf,

    /// Where to write the full-resolution PNG.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Zoom factor; clamped to the editor's slider range.
    #[arg(long, default_value_t = MIN_SCALE)]
    pub scale: f64,

    /// Horizontal pan in canvas pixels; clamped so the photo still
    /// covers the circle.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub offset_x: f64,

    /// Vertical pan in canvas pixels.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub offset_y: f64,

    /// Background layer image. Defaults to the built-in gradient.
    #[arg(long, value_name = "FILE")]
    pub background: Option<PathBuf>,

    /// Frame layer image, drawn over the photo. Defaults to the built-in ring.
    #[arg(long, value_name = "FILE")]
    pub frame: Option<PathBuf>,

    /// Also write the gallery thumbnail here.
    #[arg(long, value_name = "FILE")]
    pub thumbnail: Option<PathBuf>,

    /// Save the result into this history directory.
    #[arg(long, value_name = "DIR")]
    pub history_dir: Option<PathBuf>,
}

/// What `compose` produced.
#[derive(Debug, Clone, Copy)]
pub struct ComposeReport {
    /// Transform after clamping.
    pub transform: TransformState,
    /// The history record, when `--history-dir` was given.
    pub saved: Option<Saved>,
}

/// Compose the avatar described by `args`, reporting progress to `out`.
///
/// # Errors
///
/// Fails if the photo is too large or undecodable, an asset cannot be
/// read, the output cannot be written, or the history directory is
/// unusable.
pub fn run(args: &ComposeArgs, out: &mut impl Write) -> Result<ComposeReport, CliError> {
    let size = fs::metadata(&args.photo)
        .map_err(|e| CliError::io(&args.photo, e))?
        .len();
    validate_file_size(size).map_err(|source| CliError::Input {
        path: args.photo.clone(),
        source,
    })?;
    let photo = fs::read(&args.photo).map_err(|e| CliError::io(&args.photo, e))?;
    let assets = load_assets(args.background.as_deref(), args.frame.as_deref())?;

    let (surface, transform) =
        halo_compose::compose(&photo, assets, args.scale, args.offset_x, args.offset_y).map_err(
            |e| match e {
                SessionError::Input(source) => CliError::Input {
                    path: args.photo.clone(),
                    source,
                },
                other => CliError::Session(other),
            },
        )?;
    tracing::debug!(
        scale = transform.scale(),
        offset_x = transform.offset_x(),
        offset_y = transform.offset_y(),
        "composed"
    );

    let export = encode::export(&surface)?;
    fs::write(&args.output, export.full.as_bytes()).map_err(|e| CliError::io(&args.output, e))?;
    write_line(
        out,
        &format!(
            "wrote {} (scale {:.2}, offset {:.0},{:.0})",
            args.output.display(),
            transform.scale(),
            transform.offset_x(),
            transform.offset_y()
        ),
    )?;

    if let Some(path) = &args.thumbnail {
        fs::write(path, export.thumbnail.as_bytes()).map_err(|e| CliError::io(path, e))?;
        write_line(out, &format!("wrote {}", path.display()))?;
    }

    let saved = match &args.history_dir {
        Some(dir) => {
            let store = HistoryStore::new(DirectoryEngine::new(dir));
            let saved = block_on(store.save(NewRecord {
                thumbnail: export.thumbnail,
                full: export.full,
            }))?;
            let mut line = format!("saved to history as #{}", saved.id);
            if let Some(evicted) = saved.evicted {
                line.push_str(&format!(" (evicted #{evicted})"));
            }
            write_line(out, &line)?;
            Some(saved)
        }
        None => None,
    };

    Ok(ComposeReport { transform, saved })
}

/// Built-in layers, with any user-supplied file taking its place.
fn load_assets(
    background: Option<&Path>,
    frame: Option<&Path>,
) -> Result<Assets<RasterImage>, CliError> {
    let defaults = default_assets()?;
    Ok(Assets {
        background: background.map_or(Ok(defaults.background), load_layer)?,
        frame: frame.map_or(Ok(defaults.frame), load_layer)?,
    })
}

fn load_layer(path: &Path) -> Result<RasterImage, CliError> {
    let bytes = fs::read(path).map_err(|e| CliError::io(path, e))?;
    decode(&bytes).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_line(out: &mut impl Write, line: &str) -> Result<(), CliError> {
    writeln!(out, "{line}").map_err(|e| CliError::io("<stdout>", e))
}
