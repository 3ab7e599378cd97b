//! `halo history`: inspect and manage a history directory.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use futures::executor::block_on;
use halo_compose::{Gallery, HistoryStore, RecordId};
use serde::Serialize;

use super::compose::write_line;
use crate::CliError;
use crate::fs_store::DirectoryEngine;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// History directory to operate on.
    #[arg(long, value_name = "DIR", global = true, default_value = ".halo-history")]
    pub history_dir: PathBuf,

    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List saved avatars, newest first.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Write a saved avatar to a file.
    Export {
        /// Record id as shown by `list`.
        id: u64,
        /// Destination PNG.
        #[arg(short, long)]
        output: PathBuf,
        /// Export the thumbnail instead of the full image.
        #[arg(long)]
        thumbnail: bool,
    },
    /// Delete every saved avatar.
    Clear,
}

/// One line of `history list --json`.
#[derive(Debug, Serialize)]
struct ListEntry {
    id: RecordId,
    position: usize,
    timestamp: u64,
    thumbnail_bytes: usize,
    full_bytes: usize,
}

/// Run a history subcommand, printing results to `out`.
///
/// # Errors
///
/// Fails if the directory cannot be opened, a record is missing, or a
/// file cannot be written.
pub fn run(args: &HistoryArgs, out: &mut impl Write) -> Result<(), CliError> {
    let store = HistoryStore::new(DirectoryEngine::new(&args.history_dir));
    match &args.command {
        HistoryCommand::List { json } => list(&store, *json, out),
        HistoryCommand::Export {
            id,
            output,
            thumbnail,
        } => {
            let id = RecordId(*id);
            let record = block_on(store.get(id))?.ok_or(CliError::NotFound(id))?;
            let image = if *thumbnail {
                record.thumbnail
            } else {
                record.full
            };
            fs::write(output, image.as_bytes()).map_err(|e| CliError::io(output, e))?;
            write_line(out, &format!("wrote #{id} to {}", output.display()))
        }
        HistoryCommand::Clear => {
            let count = block_on(store.count())?;
            block_on(store.clear())?;
            write_line(out, &format!("removed {count} saved avatar(s)"))
        }
    }
}

fn list(
    store: &HistoryStore<DirectoryEngine>,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let gallery = Gallery::from_records(block_on(store.list())?);
    let entries: Vec<ListEntry> = gallery
        .entries()
        .iter()
        .filter_map(|entry| {
            let detail = gallery.open(entry.id())?;
            Some(ListEntry {
                id: entry.id(),
                position: entry.position(),
                timestamp: detail.timestamp,
                thumbnail_bytes: entry.thumbnail().len(),
                full_bytes: detail.image.len(),
            })
        })
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        return write_line(out, "");
    }
    if entries.is_empty() {
        return write_line(out, "No saved avatars yet.");
    }
    write_line(out, &format!("{:>4}  {:>15}  {:>10}", "ID", "TIMESTAMP", "BYTES"))?;
    for e in &entries {
        write_line(
            out,
            &format!("{:>4}  {:>15}  {:>10}", e.id.to_string(), e.timestamp, e.full_bytes),
        )?;
    }
    Ok(())
}
