//! `halo-cli`: compose circular avatars and manage their history from the
//! command line.

use std::io;

use clap::{Parser, Subcommand};
use halo_cli::commands::compose::{self, ComposeArgs};
use halo_cli::commands::history::{self, HistoryArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "halo-cli", version, about)]
struct Cli {
    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place a photo in the frame and write the avatar PNG.
    Compose(ComposeArgs),
    /// List, export or clear saved avatars.
    History(HistoryArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Commands::Compose(args) => compose::run(args, &mut stdout).map(drop)?,
        Commands::History(args) => history::run(args, &mut stdout)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::Cli;

    #[test]
    fn cli_definition_is_consistent() {
        let cmd = Cli::command();
        cmd.clone().debug_assert();
        assert_eq!(cmd.get_name(), "halo-cli");
    }
}
