//! Table facade
//!
//! A table is in one of two states:
//!
//! - `Open`: fields may be added, no records exist
//! - `Populated`: fields are frozen, records may be added and edited
//!
//! `add_record` is the only transition from Open to Populated. The Open
//! state owns a `SchemaRegistry`; the Populated state owns a frozen
//! `Schema`, which has no way to add fields.

use std::io::{Read, Write};

use chrono::{Local, NaiveDate};
use tracing::trace;

use crate::encoding::CodePage;
use crate::errors::{DbfError, DbfResult};
use crate::format;
use crate::record::{Record, RecordStore};
use crate::schema::{FieldDescriptor, FieldType, Schema, SchemaRegistry};
use crate::value;

use super::config::TableConfig;

static NO_RECORDS: RecordStore = RecordStore::new();

#[derive(Debug, Clone)]
enum TableState {
    Open { registry: SchemaRegistry },
    Populated { schema: Schema, records: RecordStore },
}

/// In-memory dBase table
#[derive(Debug, Clone)]
pub struct Table {
    config: TableConfig,
    code_page: CodePage,
    last_updated: Option<NaiveDate>,
    state: TableState,
}

impl Table {
    /// Create an empty, open table storing text in `encoding`.
    ///
    /// # Errors
    ///
    /// `DBF_UNKNOWN_ENCODING` if the label is not a usable code page.
    pub fn new(encoding: &str) -> DbfResult<Self> {
        Self::with_config(TableConfig::new(encoding))
    }

    pub fn with_config(config: TableConfig) -> DbfResult<Self> {
        let code_page = config.validate()?;
        Ok(Self {
            config,
            code_page,
            last_updated: Some(Local::now().date_naive()),
            state: TableState::Open {
                registry: SchemaRegistry::new(),
            },
        })
    }

    /// Assemble a table from decoded parts. A table with records starts
    /// Populated; one without stays Open.
    pub(crate) fn from_parts(
        config: TableConfig,
        code_page: CodePage,
        last_updated: Option<NaiveDate>,
        schema: Schema,
        records: Vec<Record>,
    ) -> Self {
        let state = if records.is_empty() {
            TableState::Open {
                registry: SchemaRegistry::from(schema),
            }
        } else {
            TableState::Populated {
                schema,
                records: RecordStore::from_records(records),
            }
        };
        Self {
            config,
            code_page,
            last_updated,
            state,
        }
    }

    // ==================
    // Introspection
    // ==================

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn code_page(&self) -> &CodePage {
        &self.code_page
    }

    /// Canonical name of the table's code page
    pub fn encoding(&self) -> &'static str {
        self.code_page.name()
    }

    /// True once the first record exists
    pub fn is_locked(&self) -> bool {
        matches!(self.state, TableState::Populated { .. })
    }

    /// Date stamped into the file header
    pub fn last_updated(&self) -> Option<NaiveDate> {
        self.last_updated
    }

    pub fn set_last_updated(&mut self, date: Option<NaiveDate>) {
        self.last_updated = date;
    }

    pub fn schema(&self) -> &Schema {
        match &self.state {
            TableState::Open { registry } => registry.schema(),
            TableState::Populated { schema, .. } => schema,
        }
    }

    pub fn records(&self) -> &RecordStore {
        match &self.state {
            TableState::Open { .. } => &NO_RECORDS,
            TableState::Populated { records, .. } => records,
        }
    }

    pub fn number_of_records(&self) -> usize {
        self.records().len()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        self.schema().fields()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.schema().field_names()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.schema().index_of(name)
    }

    /// Decimal places of a Number or Float field
    pub fn decimal_places_in_field(&self, name: &str) -> DbfResult<u8> {
        self.schema().decimal_places_in_field(name)
    }

    // ==================
    // Schema mutation
    // ==================

    /// Add a field of any type, returning its index.
    ///
    /// # Errors
    ///
    /// `DBF_SCHEMA_LOCKED` once a record exists, otherwise any error of
    /// `SchemaRegistry::add_field`.
    pub fn add_field(
        &mut self,
        name: &str,
        field_type: FieldType,
        length: u8,
        decimal_places: u8,
    ) -> DbfResult<usize> {
        match &mut self.state {
            TableState::Open { registry } => {
                registry.add_field(name, field_type, length, decimal_places, &self.code_page)
            }
            TableState::Populated { .. } => Err(DbfError::schema_locked(name)),
        }
    }

    /// Logical field, one byte
    pub fn add_boolean_field(&mut self, name: &str) -> DbfResult<usize> {
        self.add_field(name, FieldType::Logical, 1, 0)
    }

    /// Date field, eight bytes
    pub fn add_date_field(&mut self, name: &str) -> DbfResult<usize> {
        self.add_field(name, FieldType::Date, 8, 0)
    }

    pub fn add_text_field(&mut self, name: &str, length: u8) -> DbfResult<usize> {
        self.add_field(name, FieldType::Character, length, 0)
    }

    pub fn add_number_field(
        &mut self,
        name: &str,
        length: u8,
        decimal_places: u8,
    ) -> DbfResult<usize> {
        self.add_field(name, FieldType::Number, length, decimal_places)
    }

    pub fn add_float_field(
        &mut self,
        name: &str,
        length: u8,
        decimal_places: u8,
    ) -> DbfResult<usize> {
        self.add_field(name, FieldType::Float, length, decimal_places)
    }

    // ==================
    // Record mutation
    // ==================

    /// Append a blank record and return its index. The first call locks
    /// the schema.
    pub fn add_record(&mut self) -> usize {
        let state = std::mem::replace(
            &mut self.state,
            TableState::Open {
                registry: SchemaRegistry::new(),
            },
        );
        let (schema, mut records) = match state {
            TableState::Open { registry } => {
                let schema = registry.freeze();
                trace!(fields = schema.len(), "schema locked by first record");
                (schema, RecordStore::new())
            }
            TableState::Populated { schema, records } => (schema, records),
        };
        let index = records.add_record(&schema);
        self.state = TableState::Populated { schema, records };
        index
    }

    /// Whether a decoded record carried the deletion marker
    pub fn is_deleted(&self, index: usize) -> DbfResult<bool> {
        self.records().get(index).map(Record::is_deleted)
    }

    // ==================
    // Value access
    // ==================

    /// All values of one record, in schema order
    pub fn get_row_as_slice(&self, index: usize) -> DbfResult<Vec<String>> {
        self.records()
            .row_as_strings(self.schema(), &self.code_page, index)
    }

    pub fn field_value_by_name(&self, index: usize, name: &str) -> DbfResult<String> {
        self.records()
            .field_value_by_name(self.schema(), &self.code_page, index, name)
    }

    pub fn field_value(&self, index: usize, field_index: usize) -> DbfResult<String> {
        self.records()
            .field_value(self.schema(), &self.code_page, index, field_index)
    }

    /// Validate `value` against the field's type and store it.
    ///
    /// # Errors
    ///
    /// - `DBF_UNKNOWN_FIELD`, `DBF_INVALID_RECORD_INDEX`
    /// - `DBF_VALUE_ENCODING_ERROR`, `DBF_UNSUPPORTED_CHARACTER`
    pub fn set_field_value_by_name(
        &mut self,
        index: usize,
        name: &str,
        value: &str,
    ) -> DbfResult<()> {
        match &mut self.state {
            TableState::Populated { schema, records } => {
                records.set_field_value_by_name(schema, &self.code_page, index, name, value)
            }
            TableState::Open { registry } => {
                registry.schema().lookup(name)?;
                Err(DbfError::invalid_record_index(index, 0))
            }
        }
    }

    pub fn set_field_value(
        &mut self,
        index: usize,
        field_index: usize,
        value: &str,
    ) -> DbfResult<()> {
        match &mut self.state {
            TableState::Populated { schema, records } => {
                records.set_field_value(schema, &self.code_page, index, field_index, value)
            }
            TableState::Open { registry } => {
                registry.schema().lookup_index(field_index)?;
                Err(DbfError::invalid_record_index(index, 0))
            }
        }
    }

    /// Stored value of a Number or Float field parsed as an integer.
    /// Other field types fail with `DBF_VALUE_PARSE_ERROR`.
    pub fn int64_field_value_by_name(&self, index: usize, name: &str) -> DbfResult<i64> {
        let text = self.field_value_by_name(index, name)?;
        let (_, field) = self.schema().lookup(name)?;
        value::parse_int64(field, &text)
    }

    /// Stored value of a Number or Float field parsed as a decimal number.
    /// Other field types fail with `DBF_VALUE_PARSE_ERROR`.
    pub fn float64_field_value_by_name(&self, index: usize, name: &str) -> DbfResult<f64> {
        let text = self.field_value_by_name(index, name)?;
        let (_, field) = self.schema().lookup(name)?;
        value::parse_float64(field, &text)
    }

    /// Stored value as a logical; `None` for `?` or blank
    pub fn bool_field_value_by_name(&self, index: usize, name: &str) -> DbfResult<Option<bool>> {
        let text = self.field_value_by_name(index, name)?;
        let (_, field) = self.schema().lookup(name)?;
        value::parse_bool(field, &text)
    }

    /// Stored value as a calendar date; `None` when blank
    pub fn date_field_value_by_name(
        &self,
        index: usize,
        name: &str,
    ) -> DbfResult<Option<NaiveDate>> {
        let text = self.field_value_by_name(index, name)?;
        let (_, field) = self.schema().lookup(name)?;
        value::parse_date(field, &text)
    }

    pub fn set_bool_field_value_by_name(
        &mut self,
        index: usize,
        name: &str,
        flag: Option<bool>,
    ) -> DbfResult<()> {
        self.set_field_value_by_name(index, name, value::format_bool(flag))
    }

    pub fn set_date_field_value_by_name(
        &mut self,
        index: usize,
        name: &str,
        date: NaiveDate,
    ) -> DbfResult<()> {
        let text = {
            let (_, field) = self.schema().lookup(name)?;
            value::format_date(field, date)?
        };
        self.set_field_value_by_name(index, name, &text)
    }

    pub fn set_int64_field_value_by_name(
        &mut self,
        index: usize,
        name: &str,
        number: i64,
    ) -> DbfResult<()> {
        self.set_field_value_by_name(index, name, &number.to_string())
    }

    /// Store a number rounded to the field's decimal places
    pub fn set_float64_field_value_by_name(
        &mut self,
        index: usize,
        name: &str,
        number: f64,
    ) -> DbfResult<()> {
        let text = {
            let (_, field) = self.schema().lookup(name)?;
            value::format_float(field, number)?
        };
        self.set_field_value_by_name(index, name, &text)
    }

    // ==================
    // Binary interchange
    // ==================

    /// Serialize to dBase bytes
    pub fn to_bytes(&self) -> DbfResult<Vec<u8>> {
        format::encode(self)
    }

    /// Serialize into a byte sink
    pub fn write_to<W: Write>(&self, writer: W) -> DbfResult<()> {
        format::encode_to(self, writer)
    }

    /// Parse dBase bytes with the default configuration
    pub fn from_bytes(bytes: &[u8]) -> DbfResult<Self> {
        format::decode(bytes)
    }

    /// Parse dBase bytes; `config` supplies the fallback code page
    pub fn from_bytes_with_config(bytes: &[u8], config: &TableConfig) -> DbfResult<Self> {
        format::decode_with_config(bytes, config)
    }

    /// Parse dBase bytes from a byte source
    pub fn read_from<R: Read>(reader: R, config: &TableConfig) -> DbfResult<Self> {
        format::decode_from(reader, config)
    }
}
