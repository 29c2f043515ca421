//! Ordered field registry
//!
//! `SchemaRegistry` is the mutable form used while a table has no records.
//! `freeze` turns it into a `Schema`, which has no mutating methods at all.
//! Field order is insertion order and defines both on-disk column order
//! and the index used by index-based accessors.

use crate::encoding::CodePage;
use crate::errors::{DbfError, DbfResult};
use crate::format::{FIELD_DESCRIPTOR_SIZE, FILE_HEADER_SIZE};

use super::types::{FieldDescriptor, FieldType, MAX_FIELD_NAME_LEN};

/// Frozen, read-only field list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    /// Field names in schema order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name().to_string()).collect()
    }

    /// Position of a field by exact (case-sensitive) name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Look up a field by name, failing with `DBF_UNKNOWN_FIELD`
    pub fn lookup(&self, name: &str) -> DbfResult<(usize, &FieldDescriptor)> {
        self.index_of(name)
            .map(|index| (index, &self.fields[index]))
            .ok_or_else(|| DbfError::unknown_field(name))
    }

    /// Look up a field by index, failing with `DBF_UNKNOWN_FIELD`
    pub fn lookup_index(&self, index: usize) -> DbfResult<&FieldDescriptor> {
        self.fields
            .get(index)
            .ok_or_else(|| DbfError::unknown_field_index(index, self.fields.len()))
    }

    /// Decimal places of a Number or Float field.
    ///
    /// # Errors
    ///
    /// - `DBF_UNKNOWN_FIELD` if no field has this name
    /// - `DBF_NOT_A_DECIMAL_FIELD` for Logical, Date and Character fields
    pub fn decimal_places_in_field(&self, name: &str) -> DbfResult<u8> {
        let (_, field) = self.lookup(name)?;
        if !field.field_type().is_decimal() {
            return Err(DbfError::not_a_decimal_field(
                name,
                field.field_type().type_name(),
            ));
        }
        Ok(field.decimal_places())
    }

    /// Bytes per record: the deletion flag plus every field width
    pub fn record_length(&self) -> usize {
        1 + self
            .fields
            .iter()
            .map(|f| usize::from(f.length()))
            .sum::<usize>()
    }

    /// Header bytes: file header, one descriptor per field, terminator
    pub fn header_length(&self) -> usize {
        FILE_HEADER_SIZE + FIELD_DESCRIPTOR_SIZE * self.fields.len() + 1
    }

    /// Byte offset of each field inside a record, after the deletion flag
    pub fn field_offsets(&self) -> Vec<usize> {
        let mut offset = 1;
        self.fields
            .iter()
            .map(|f| {
                let start = offset;
                offset += usize::from(f.length());
                start
            })
            .collect()
    }
}

/// Mutable field list for a table that has no records yet
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schema: Schema,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the current fields
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Append a field and return its index.
    ///
    /// The name is cut to its first 10 encoded bytes before any other
    /// check, so two long names sharing a prefix collide.
    ///
    /// # Errors
    ///
    /// - `DBF_INVALID_FIELD_DEFINITION` for an empty or non-printable name,
    ///   a bad length/decimal-place pair, or a schema whose header or record
    ///   length would overflow the 16-bit header fields
    /// - `DBF_UNSUPPORTED_CHARACTER` if the name cannot be encoded
    /// - `DBF_DUPLICATE_FIELD_NAME` if the truncated name is taken
    pub fn add_field(
        &mut self,
        name: &str,
        field_type: FieldType,
        length: u8,
        decimal_places: u8,
        code_page: &CodePage,
    ) -> DbfResult<usize> {
        if name.is_empty() {
            return Err(DbfError::invalid_field_definition(name, "field name is empty"));
        }
        if name.chars().any(char::is_control) {
            return Err(DbfError::invalid_field_definition(
                name,
                "field name contains control characters",
            ));
        }

        let stored_name = truncate_name(name, code_page)?;
        if stored_name.is_empty() {
            return Err(DbfError::invalid_field_definition(name, "field name is blank"));
        }

        field_type
            .check_definition(length, decimal_places)
            .map_err(|reason| DbfError::invalid_field_definition(&stored_name, reason))?;

        if self.schema.index_of(&stored_name).is_some() {
            return Err(DbfError::duplicate_field_name(&stored_name));
        }

        let record_length = self.schema.record_length() + usize::from(length);
        let header_length = self.schema.header_length() + FIELD_DESCRIPTOR_SIZE;
        if record_length > usize::from(u16::MAX) || header_length > usize::from(u16::MAX) {
            return Err(DbfError::invalid_field_definition(
                &stored_name,
                format!(
                    "record length {} or header length {} exceeds {}",
                    record_length,
                    header_length,
                    u16::MAX
                ),
            ));
        }

        self.schema.fields.push(FieldDescriptor::new(
            stored_name,
            field_type,
            length,
            decimal_places,
        ));
        Ok(self.schema.fields.len() - 1)
    }

    /// Stop accepting fields
    pub fn freeze(self) -> Schema {
        self.schema
    }
}

impl From<Schema> for SchemaRegistry {
    fn from(schema: Schema) -> Self {
        Self { schema }
    }
}

/// Cut a name to the descriptor width, measured in encoded bytes, and drop
/// trailing spaces, which descriptors use as padding
fn truncate_name(name: &str, code_page: &CodePage) -> DbfResult<String> {
    let bytes = code_page.fit(name, MAX_FIELD_NAME_LEN)?;
    // fit() cuts on a character boundary of `name`, so decoding cannot fail
    let truncated = code_page
        .decode(&bytes)
        .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
    Ok(truncated.trim_end_matches(' ').to_string())
}
