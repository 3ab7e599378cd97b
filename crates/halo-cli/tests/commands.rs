#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};

use halo_cli::CliError;
use halo_cli::commands::compose::{self, ComposeArgs};
use halo_cli::commands::history::{self, HistoryArgs, HistoryCommand};
use halo_compose::config::{CANVAS_HEIGHT, CANVAS_WIDTH, THUMBNAIL_SIZE};
use halo_compose::types::InputError;

fn write_photo(dir: &Path, width: u32, height: u32) -> PathBuf {
    let path = dir.join("photo.png");
    image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]))
        .save(&path)
        .unwrap();
    path
}

fn compose_args(photo: PathBuf, output: PathBuf) -> ComposeArgs {
    ComposeArgs {
        photo,
        output,
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
        background: None,
        frame: None,
        thumbnail: None,
        history_dir: None,
    }
}

fn history(dir: &Path, command: HistoryCommand) -> String {
    let mut out = Vec::new();
    history::run(
        &HistoryArgs {
            history_dir: dir.to_path_buf(),
            command,
        },
        &mut out,
    )
    .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn compose_writes_canvas_sized_png_and_thumbnail() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_photo(dir.path(), 300, 200);
    let output = dir.path().join("avatar.png");
    let thumb = dir.path().join("thumb.png");
    let mut args = compose_args(photo, output.clone());
    args.thumbnail = Some(thumb.clone());

    let mut out = Vec::new();
    let report = compose::run(&args, &mut out).unwrap();
    assert!(report.saved.is_none());

    let full = image::open(&output).unwrap();
    assert_eq!((full.width(), full.height()), (CANVAS_WIDTH, CANVAS_HEIGHT));
    let small = image::open(&thumb).unwrap();
    assert_eq!((small.width(), small.height()), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));

    // Centre of the circle shows the photo.
    let center = full.to_rgba8().get_pixel(1000, 1000).0;
    for (got, want) in center.iter().zip([200u8, 40, 40, 255]) {
        assert!(got.abs_diff(want) <= 1, "{center:?}");
    }
    assert!(String::from_utf8(out).unwrap().starts_with("wrote "));
}

#[test]
fn compose_clamps_out_of_range_values() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_photo(dir.path(), 100, 100);
    let mut args = compose_args(photo, dir.path().join("a.png"));
    args.scale = 10.0;
    args.offset_x = -1.0e6;

    let report = compose::run(&args, &mut Vec::new()).unwrap();
    assert!((report.transform.scale() - 3.0).abs() < 1e-9);
    assert!(report.transform.offset_x() > -1.0e6);
}

#[test]
fn compose_rejects_undecodable_photo() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("notes.png");
    fs::write(&photo, b"definitely not a png").unwrap();
    let output = dir.path().join("a.png");

    let err = compose::run(&compose_args(photo.clone(), output.clone()), &mut Vec::new())
        .unwrap_err();
    assert!(matches!(
        err,
        CliError::Input { ref path, source: InputError::ImageDecode(_) } if *path == photo
    ));
    assert!(!output.exists());
}

#[test]
fn saved_avatars_can_be_listed_exported_and_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let history_dir = dir.path().join("history");
    let photo = write_photo(dir.path(), 64, 64);
    let mut args = compose_args(photo, dir.path().join("a.png"));
    args.history_dir = Some(history_dir.clone());

    let first = compose::run(&args, &mut Vec::new()).unwrap().saved.unwrap();
    let second = compose::run(&args, &mut Vec::new()).unwrap().saved.unwrap();
    assert!(second.id > first.id);

    let listing: serde_json::Value =
        serde_json::from_str(&history(&history_dir, HistoryCommand::List { json: true })).unwrap();
    let entries = listing.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["position"], 1);
    assert!(entries[0]["timestamp"].as_u64() >= entries[1]["timestamp"].as_u64());

    let exported = dir.path().join("thumb-export.png");
    history(
        &history_dir,
        HistoryCommand::Export {
            id: first.id.0,
            output: exported.clone(),
            thumbnail: true,
        },
    );
    assert_eq!(image::open(&exported).unwrap().width(), THUMBNAIL_SIZE);

    let cleared = history(&history_dir, HistoryCommand::Clear);
    assert!(cleared.contains("removed 2"));
    let empty = history(&history_dir, HistoryCommand::List { json: false });
    assert_eq!(empty.trim(), "No saved avatars yet.");
}

#[test]
fn exporting_a_missing_record_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = history::run(
        &HistoryArgs {
            history_dir: dir.path().to_path_buf(),
            command: HistoryCommand::Export {
                id: 42,
                output: dir.path().join("x.png"),
                thumbnail: false,
            },
        },
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, CliError::NotFound(id) if id.0 == 42));
}

#[test]
fn binary_is_named_after_its_package() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_halo-cli"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().starts_with("halo-cli "));
}
