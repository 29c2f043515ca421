//! Command-line front end for dbftable
//!
//! - inspect: header and field layout of a file
//! - dump: records as JSON lines
//! - create: build a file from a JSON definition

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, SourceArgs};
pub use commands::{
    create, dump, inspect, load_config, run, run_command, FieldDefinition, TableDefinition,
};
pub use errors::{CliError, CliResult};
