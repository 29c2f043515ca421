//! dbftable - dBase (.dbf) table engine
//!
//! In-memory schema and record model plus a codec for the dBase III file
//! layout. Files are handed over as byte buffers or `Read`/`Write`
//! implementations; opening them is up to the caller.
//!
//! ```ignore
//! use dbftable::Table;
//!
//! let mut table = Table::new("windows-1252")?;
//! table.add_text_field("NAME", 20)?;
//! table.add_number_field("POP", 10, 0)?;
//! let row = table.add_record();
//! table.set_field_value_by_name(row, "NAME", "Zürich")?;
//! table.set_field_value_by_name(row, "POP", "421878")?;
//! let bytes = table.to_bytes()?;
//! ```

pub mod cli;
pub mod encoding;
pub mod errors;
pub mod format;
pub mod record;
pub mod schema;
pub mod table;
pub mod value;

pub use encoding::CodePage;
pub use errors::{DbfError, DbfErrorCode, DbfResult};
pub use schema::{FieldDescriptor, FieldType, Schema};
pub use table::{Table, TableConfig};
