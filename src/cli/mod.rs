//! CLI surface for lensdesk.
//!
//! Thin handlers over the library: snapshot files in, rendered summaries
//! out. Rendering lives in `render`; command logic in `commands`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::Result;

mod commands;
mod render;

#[derive(Parser, Debug)]
#[command(
    name = "lensdesk",
    version,
    about = "Deterministic recompute engine for a lens/draft grid",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Machine-readable JSON output.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a snapshot file: lanes, instances, inventory, desk.
    Inspect {
        /// Snapshot file (JSON).
        file: PathBuf,
    },

    /// Upgrade a snapshot file to the current schema version.
    Migrate {
        /// Snapshot file (JSON).
        file: PathBuf,
        /// Write here instead of stdout.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Import a snapshot, run one recompute pass, report per-instance
    /// results.
    Recompute {
        /// Snapshot file (JSON).
        file: PathBuf,
    },

    /// Import a snapshot and re-export it normalized at the current
    /// schema version.
    Export {
        /// Snapshot file (JSON).
        file: PathBuf,
        /// Write here instead of stdout.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Build the demo patch with the stock lenses and report the pass.
    Demo {
        /// Save the resulting snapshot.
        #[arg(long, default_value_t = false)]
        save: bool,
        /// Where to save (default: the data directory).
        #[arg(long, value_name = "PATH", requires = "save")]
        out: Option<PathBuf>,
    },
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Inspect { file } => commands::inspect(&file, cli.json),
        Commands::Migrate { file, out } => commands::migrate(&file, out.as_deref()),
        Commands::Recompute { file } => commands::recompute(&file, cli.json),
        Commands::Export { file, out } => commands::export(&file, out.as_deref()),
        Commands::Demo { save, out } => commands::demo(save, out.as_deref(), cli.json),
    }
}
