//! JSON and file I/O for the CLI
//!
//! - Output: one JSON document per line on the given writer
//! - Input: table files and JSON documents read whole from disk

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{CliError, CliResult};

/// Write one value as a single JSON line
pub fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Read a file into memory
pub fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    fs::read(path).map_err(|e| CliError::file(path, e))
}

/// Read and parse a JSON document
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let bytes = read_file(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Create (or truncate) a file for buffered writing
pub fn create_file(path: &Path) -> CliResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| CliError::file(path, e))
}
