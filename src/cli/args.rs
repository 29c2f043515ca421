//! CLI argument definitions using clap
//!
//! Commands:
//! - dbftable inspect <file>
//! - dbftable dump <file> [--include-deleted]
//! - dbftable create --definition <json> --out <file>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// dbftable - read and write dBase (.dbf) tables
#[derive(Parser, Debug)]
#[command(name = "dbftable")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log decode/encode details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Where a table comes from and how to read its text
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path to the .dbf file
    pub file: PathBuf,

    /// JSON table configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Code page to use, ignoring the file's language driver byte
    #[arg(long)]
    pub encoding: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the header and field descriptors as JSON
    Inspect {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print every record as one JSON object per line
    Dump {
        #[command(flatten)]
        source: SourceArgs,

        /// Also print records carrying the deletion marker
        #[arg(long)]
        include_deleted: bool,
    },

    /// Build a .dbf file from a JSON table definition
    Create {
        /// JSON definition: encoding, fields and records
        #[arg(long)]
        definition: PathBuf,

        /// Output path
        #[arg(long)]
        out: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
