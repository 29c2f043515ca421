//! Field schema for dBase tables
//!
//! A schema is an ordered list of uniquely named, typed, fixed-width
//! columns.
//!
//! # Rules
//!
//! - Names are cut to 10 encoded bytes before validation and storage
//! - Names are unique (exact, case-sensitive match after truncation)
//! - Width and decimal places are checked per type when a field is added
//! - The field list is frozen once the first record exists

mod registry;
mod types;

pub use registry::{Schema, SchemaRegistry};
pub use types::{
    FieldDescriptor, FieldType, MAX_CHARACTER_LENGTH, MAX_FIELD_NAME_LEN, MAX_NUMERIC_LENGTH,
};
