//! Table facade: schema, records and code page behind one object
//!
//! # Lifecycle
//!
//! 1. `Table::new(encoding)` creates an empty, open table
//! 2. `add_*_field` appends columns
//! 3. the first `add_record` locks the schema
//! 4. values are read and written by record index and field name or index
//! 5. `to_bytes` / `from_bytes` convert to and from the dBase file layout

mod config;
mod table;

pub use config::TableConfig;
pub use table::Table;
