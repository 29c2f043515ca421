//! dbftable CLI entry point
//!
//! Parses arguments and runs one command via `cli::run`. Errors go to
//! stderr with a non-zero exit code.

use dbftable::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
