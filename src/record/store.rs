//! Row storage
//!
//! Each record keeps one raw slot per field holding the stored bytes at
//! exactly field width, or nothing when the value was never set. Record
//! indices are insertion order and never change.

use crate::encoding::CodePage;
use crate::errors::{DbfError, DbfResult};
use crate::schema::{FieldDescriptor, Schema};
use crate::value;

/// One row of raw field slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: Vec<Vec<u8>>,
    deleted: bool,
}

impl Record {
    /// A row whose slots are all unset
    pub(crate) fn blank(field_count: usize) -> Self {
        Self {
            values: vec![Vec::new(); field_count],
            deleted: false,
        }
    }

    /// A row read back from a file
    pub(crate) fn from_raw(values: Vec<Vec<u8>>, deleted: bool) -> Self {
        Self { values, deleted }
    }

    /// Raw stored bytes of one field, empty when unset
    pub fn raw(&self, field: usize) -> Option<&[u8]> {
        self.values.get(field).map(Vec::as_slice)
    }

    /// Whether the file marked this row deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered collection of records
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub(crate) fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Append a blank record sized to `schema`, returning its index
    pub fn add_record(&mut self, schema: &Schema) -> usize {
        self.records.push(Record::blank(schema.len()));
        self.records.len() - 1
    }

    /// Record by index, failing with `DBF_INVALID_RECORD_INDEX`
    pub fn get(&self, index: usize) -> DbfResult<&Record> {
        self.records
            .get(index)
            .ok_or_else(|| DbfError::invalid_record_index(index, self.records.len()))
    }

    fn get_mut(&mut self, index: usize) -> DbfResult<&mut Record> {
        let count = self.records.len();
        self.records
            .get_mut(index)
            .ok_or_else(|| DbfError::invalid_record_index(index, count))
    }

    /// Every field of one record as text, in schema order
    pub fn row_as_strings(
        &self,
        schema: &Schema,
        code_page: &CodePage,
        index: usize,
    ) -> DbfResult<Vec<String>> {
        let record = self.get(index)?;
        schema
            .fields()
            .iter()
            .enumerate()
            .map(|(field_index, field)| read_slot(record, field_index, field, code_page))
            .collect()
    }

    /// One field of one record as text, by field index
    pub fn field_value(
        &self,
        schema: &Schema,
        code_page: &CodePage,
        index: usize,
        field_index: usize,
    ) -> DbfResult<String> {
        let field = schema.lookup_index(field_index)?;
        let record = self.get(index)?;
        read_slot(record, field_index, field, code_page)
    }

    /// One field of one record as text, by field name
    pub fn field_value_by_name(
        &self,
        schema: &Schema,
        code_page: &CodePage,
        index: usize,
        name: &str,
    ) -> DbfResult<String> {
        let (field_index, field) = schema.lookup(name)?;
        let record = self.get(index)?;
        read_slot(record, field_index, field, code_page)
    }

    /// Validate and store a value, by field index
    pub fn set_field_value(
        &mut self,
        schema: &Schema,
        code_page: &CodePage,
        index: usize,
        field_index: usize,
        value: &str,
    ) -> DbfResult<()> {
        let field = schema.lookup_index(field_index)?;
        self.write_slot(field_index, field, code_page, index, value)
    }

    /// Validate and store a value, by field name
    pub fn set_field_value_by_name(
        &mut self,
        schema: &Schema,
        code_page: &CodePage,
        index: usize,
        name: &str,
        value: &str,
    ) -> DbfResult<()> {
        let (field_index, field) = schema.lookup(name)?;
        self.write_slot(field_index, field, code_page, index, value)
    }

    fn write_slot(
        &mut self,
        field_index: usize,
        field: &FieldDescriptor,
        code_page: &CodePage,
        index: usize,
        value: &str,
    ) -> DbfResult<()> {
        let record = self.get_mut(index)?;
        let encoded = value::encode_value(field, value, code_page)?;
        match record.values.get_mut(field_index) {
            Some(slot) => {
                *slot = encoded;
                Ok(())
            }
            None => Err(DbfError::unknown_field_index(field_index, record.values.len())),
        }
    }
}

fn read_slot(
    record: &Record,
    field_index: usize,
    field: &FieldDescriptor,
    code_page: &CodePage,
) -> DbfResult<String> {
    let raw = record
        .raw(field_index)
        .ok_or_else(|| DbfError::unknown_field_index(field_index, record.len()))?;
    value::decode_value(field, raw, code_page)
}
