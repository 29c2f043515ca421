//! CLI command implementations
//!
//! Each command loads or builds a table, then reports it as JSON on the
//! writer it is given. Logging goes to stderr so stdout stays parseable.

use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::format::FileHeader;
use crate::schema::{FieldDescriptor, FieldType};
use crate::table::{Table, TableConfig};

use super::args::{Cli, Command, SourceArgs};
use super::errors::{CliError, CliResult};
use super::io::{create_file, read_file, read_json, write_json_line};

/// Main CLI entry point
///
/// Parses arguments, sets up logging and dispatches to the command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command(cli.command, &mut out)?;
    out.flush()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "dbftable=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // try_init: a second call (tests) must not panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Run a parsed command, writing its JSON output to `out`
pub fn run_command<W: Write>(cmd: Command, out: &mut W) -> CliResult<()> {
    match cmd {
        Command::Inspect { source } => inspect(&source, out),
        Command::Dump {
            source,
            include_deleted,
        } => dump(&source, include_deleted, out),
        Command::Create { definition, out: path } => create(&definition, &path, out),
    }
}

/// Load a table configuration from a JSON file
pub fn load_config(path: &Path) -> CliResult<TableConfig> {
    let config: TableConfig = read_json(path)?;
    config.validate()?;
    debug!(path = %path.display(), encoding = %config.encoding, "loaded table config");
    Ok(config)
}

/// Configuration for a source: config file first, then `--encoding`,
/// which also stops the language driver byte from overriding it.
fn source_config(source: &SourceArgs) -> CliResult<TableConfig> {
    let mut config = match &source.config {
        Some(path) => load_config(path)?,
        None => TableConfig::default(),
    };
    if let Some(label) = &source.encoding {
        config.encoding = label.clone();
        config.trust_language_driver = false;
        config.validate()?;
    }
    Ok(config)
}

fn open_table(source: &SourceArgs) -> CliResult<(Vec<u8>, Table)> {
    let config = source_config(source)?;
    let bytes = read_file(&source.file)?;
    let table = Table::from_bytes_with_config(&bytes, &config)?;
    Ok((bytes, table))
}

#[derive(Serialize)]
struct InspectReport<'a> {
    file: String,
    version: String,
    last_updated: Option<String>,
    encoding: &'a str,
    language_driver: String,
    records: usize,
    header_length: u16,
    record_length: u16,
    fields: &'a [FieldDescriptor],
}

/// Print the header and field layout of a file
pub fn inspect<W: Write>(source: &SourceArgs, out: &mut W) -> CliResult<()> {
    let (bytes, table) = open_table(source)?;
    let header = FileHeader::from_bytes(&bytes)?;

    let report = InspectReport {
        file: source.file.display().to_string(),
        version: format!("0x{:02X}", header.version),
        last_updated: table.last_updated().map(|d| d.format("%Y-%m-%d").to_string()),
        encoding: table.encoding(),
        language_driver: format!("0x{:02X}", header.language_driver),
        records: table.number_of_records(),
        header_length: header.header_length,
        record_length: header.record_length,
        fields: table.fields(),
    };
    write_json_line(out, &report)
}

/// Print each record as `{"index", "deleted", "values"}`
pub fn dump<W: Write>(source: &SourceArgs, include_deleted: bool, out: &mut W) -> CliResult<()> {
    let (_, table) = open_table(source)?;
    let names = table.field_names();

    let mut skipped = 0usize;
    for index in 0..table.number_of_records() {
        let deleted = table.is_deleted(index)?;
        if deleted && !include_deleted {
            skipped += 1;
            continue;
        }
        let row = table.get_row_as_slice(index)?;
        let values: Map<String, Value> = names
            .iter()
            .cloned()
            .zip(row.into_iter().map(Value::String))
            .collect();
        write_json_line(
            out,
            &json!({"index": index, "deleted": deleted, "values": values}),
        )?;
    }
    if skipped > 0 {
        debug!(skipped, "deleted records not printed");
    }
    Ok(())
}

/// JSON input of the `create` command
#[derive(Debug, Deserialize)]
pub struct TableDefinition {
    #[serde(flatten)]
    pub config: TableConfig,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub records: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Required for character, number and float fields
    pub length: Option<u8>,
    #[serde(default)]
    pub decimal_places: u8,
}

impl TableDefinition {
    /// Build the table this definition describes
    pub fn build(&self) -> CliResult<Table> {
        let mut table = Table::with_config(self.config.clone())?;
        for field in &self.fields {
            let length = match (field.field_type.fixed_length(), field.length) {
                (Some(fixed), _) => fixed,
                (None, Some(length)) => length,
                (None, None) => {
                    return Err(CliError::Config(format!(
                        "field '{}' needs a length",
                        field.name
                    )))
                }
            };
            table.add_field(&field.name, field.field_type, length, field.decimal_places)?;
        }

        let width = self.fields.len();
        for (row_number, values) in self.records.iter().enumerate() {
            if values.len() > width {
                return Err(CliError::Config(format!(
                    "record {} has {} values for {} fields",
                    row_number,
                    values.len(),
                    width
                )));
            }
            let index = table.add_record();
            for (field_index, value) in values.iter().enumerate() {
                table.set_field_value(index, field_index, value)?;
            }
        }
        Ok(table)
    }
}

/// Build a file from a JSON definition
pub fn create<W: Write>(definition: &Path, path: &Path, out: &mut W) -> CliResult<()> {
    let definition: TableDefinition = read_json(definition)?;
    let table = definition.build()?;

    let writer = create_file(path)?;
    table.write_to(writer)?;
    info!(path = %path.display(), records = table.number_of_records(), "table written");

    write_json_line(
        out,
        &json!({
            "file": path.display().to_string(),
            "encoding": table.encoding(),
            "fields": table.fields().len(),
            "records": table.number_of_records(),
        }),
    )
}
