//! halo-cli: compose avatars outside the browser.
//!
//! The same compositor the web editor uses, driven from the command
//! line, plus a history kept as PNG files in a directory instead of
//! `IndexedDB`. The binary is `halo-cli`; this library exposes the
//! subcommands and the [`DirectoryEngine`] so they can be tested and
//! reused.

pub mod commands;
mod error;
pub mod fs_store;

pub use error::CliError;
pub use fs_store::DirectoryEngine;
