// Build scripts report failure by panicking; there is no caller to
// return a Result to.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Build script for the halo binary crate.
//!
//! Runs `npx @tailwindcss/cli` to compile `crates/halo/tailwind.css`
//! into `$OUT_DIR/assets/tailwind.css`, exposed to `main.rs` as
//! `TAILWIND_CSS_PATH`.  When Node.js is not installed the build still
//! succeeds: an empty stylesheet is written instead and a warning is
//! printed, so `cargo test` and `cargo clippy` work without npm.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::{env, fs};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let crates_dir = manifest_dir
        .parent()
        .expect("could not find crates directory");

    build_tailwind_css(&manifest_dir, crates_dir, &out_dir);
}

/// Compile Tailwind CSS via `npx @tailwindcss/cli`.
///
/// Writing to `OUT_DIR` (rather than the source tree) avoids issues
/// with read-only source trees and races from concurrent `cargo`
/// invocations.
fn build_tailwind_css(manifest_dir: &Path, crates_dir: &Path, out_dir: &Path) {
    let input = manifest_dir.join("tailwind.css");
    let assets_dir = out_dir.join("assets");
    let output = assets_dir.join("tailwind.css");

    fs::create_dir_all(&assets_dir)
        .unwrap_or_else(|e| panic!("failed to create {}: {e}", assets_dir.display()));

    println!("cargo:rerun-if-changed={}", input.display());

    // Tailwind scans the UI crates for utility class names.
    register_rs_sources(&crates_dir.join("halo"));
    register_rs_sources(&crates_dir.join("halo-io"));

    let input_lossy = input.to_string_lossy();
    let output_lossy = output.to_string_lossy();
    let mut args: Vec<&str> = vec!["@tailwindcss/cli", "-i", &input_lossy, "-o", &output_lossy];

    let profile = env::var("PROFILE").unwrap_or_default();
    if profile == "release" {
        args.push("--minify");
    }

    let compiled = match Command::new("npx").args(&args).status() {
        Ok(status) if status.success() => true,
        Ok(status) => {
            println!("cargo:warning=`npx @tailwindcss/cli` exited with {status}; styles disabled");
            false
        }
        Err(e) => {
            println!("cargo:warning=failed to run `npx @tailwindcss/cli` ({e}); styles disabled");
            false
        }
    };
    if !compiled {
        fs::write(&output, "")
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", output.display()));
    }

    println!("cargo:rustc-env=TAILWIND_CSS_PATH={}", output.display());
}

/// Recursively emit `cargo:rerun-if-changed` for every `.rs` file
/// under `dir`.
fn register_rs_sources(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            register_rs_sources(&path);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
}
