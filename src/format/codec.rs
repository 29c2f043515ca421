//! Table encode and decode
//!
//! Layout:
//! - file header (32 bytes)
//! - one descriptor per field (32 bytes each), schema order
//! - header terminator 0x0D
//! - any bytes up to the header length (FoxPro backlink area), skipped
//! - one record per row: deletion flag, then each field at its width
//! - end-of-file marker 0x1A (optional on decode)
//!
//! Header length, record length and field offsets are derived from the
//! schema on encode and checked against the descriptors on decode. A file
//! that disagrees with itself is rejected whole; nothing is partially
//! loaded.

use std::io::{Read, Write};

use tracing::{debug, warn};

use crate::encoding::CodePage;
use crate::errors::{DbfError, DbfErrorCode, DbfResult};
use crate::record::Record;
use crate::schema::{Schema, SchemaRegistry};
use crate::table::{Table, TableConfig};
use crate::value::PADDING;

use super::header::{
    descriptor_from_bytes, descriptor_to_bytes, FileHeader, DBASE_III, EOF_MARKER,
    FIELD_DESCRIPTOR_SIZE, FILE_HEADER_SIZE, HEADER_TERMINATOR, RECORD_ACTIVE, RECORD_DELETED,
};

/// Encode a table into a new buffer
pub fn encode(table: &Table) -> DbfResult<Vec<u8>> {
    let schema = table.schema();
    let capacity = schema.header_length() + schema.record_length() * table.number_of_records() + 1;
    let mut buf = Vec::with_capacity(capacity);
    encode_to(table, &mut buf)?;
    Ok(buf)
}

/// Encode a table into a byte sink, one record at a time
pub fn encode_to<W: Write>(table: &Table, mut writer: W) -> DbfResult<()> {
    let schema = table.schema();
    let code_page = table.code_page();
    let records = table.records();

    let header = FileHeader {
        version: DBASE_III,
        last_updated: table.last_updated(),
        record_count: u32::try_from(records.len())
            .map_err(|_| DbfError::malformed_file("record count exceeds u32"))?,
        header_length: u16::try_from(schema.header_length())
            .map_err(|_| DbfError::malformed_file("header length exceeds u16"))?,
        record_length: u16::try_from(schema.record_length())
            .map_err(|_| DbfError::malformed_file("record length exceeds u16"))?,
        language_driver: code_page.language_driver(),
    };
    writer.write_all(&header.to_bytes())?;

    let offsets = schema.field_offsets();
    for (field, offset) in schema.fields().iter().zip(&offsets) {
        writer.write_all(&descriptor_to_bytes(field, *offset, code_page)?)?;
    }
    writer.write_all(&[HEADER_TERMINATOR])?;

    let mut row = Vec::with_capacity(schema.record_length());
    for record in records.iter() {
        row.clear();
        row.push(if record.is_deleted() {
            RECORD_DELETED
        } else {
            RECORD_ACTIVE
        });
        for (field_index, field) in schema.fields().iter().enumerate() {
            let width = usize::from(field.length());
            let raw = record.raw(field_index).unwrap_or(&[]);
            let start = row.len();
            row.extend(raw.iter().take(width));
            row.resize(start + width, PADDING);
        }
        writer.write_all(&row)?;
    }
    writer.write_all(&[EOF_MARKER])?;
    writer.flush()?;

    debug!(
        records = records.len(),
        fields = schema.len(),
        encoding = code_page.name(),
        "encoded dbf table"
    );
    Ok(())
}

/// Decode bytes with the default configuration
pub fn decode(bytes: &[u8]) -> DbfResult<Table> {
    decode_with_config(bytes, &TableConfig::default())
}

/// Read a byte source to the end and decode it
pub fn decode_from<R: Read>(mut reader: R, config: &TableConfig) -> DbfResult<Table> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_with_config(&bytes, config)
}

/// Decode bytes into a table.
///
/// The code page comes from the header's language driver byte when
/// `config.trust_language_driver` is set and the byte is recognized,
/// otherwise from `config.encoding`.
///
/// # Errors
///
/// - `DBF_MALFORMED_FILE` for any structural inconsistency
/// - `DBF_UNKNOWN_ENCODING` if the fallback label is unusable
pub fn decode_with_config(bytes: &[u8], config: &TableConfig) -> DbfResult<Table> {
    let header = FileHeader::from_bytes(bytes)?;
    let code_page = resolve_code_page(&header, config)?;

    let schema = decode_schema(bytes, &header, &code_page)?;
    let header_length = usize::from(header.header_length);
    let record_length = usize::from(header.record_length);

    if record_length != schema.record_length() {
        return Err(DbfError::malformed_at_offset(
            10,
            format!(
                "header claims record length {}, descriptors sum to {}",
                record_length,
                schema.record_length()
            ),
        ));
    }

    let record_count = header.record_count as usize;
    let data_end = record_count
        .checked_mul(record_length)
        .and_then(|n| n.checked_add(header_length))
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| {
            DbfError::malformed_at_offset(
                4,
                format!(
                    "header claims {} records of {} bytes, file holds {} bytes after the header",
                    record_count,
                    record_length,
                    bytes.len().saturating_sub(header_length)
                ),
            )
        })?;

    let offsets = schema.field_offsets();
    let mut records = Vec::with_capacity(record_count);
    for (row_index, row) in bytes[header_length..data_end]
        .chunks_exact(record_length)
        .enumerate()
    {
        let row_offset = header_length + row_index * record_length;
        let deleted = match row[0] {
            RECORD_ACTIVE => false,
            RECORD_DELETED => true,
            other => {
                return Err(DbfError::malformed_at_offset(
                    row_offset,
                    format!("record {} has deletion flag 0x{:02X}", row_index, other),
                ))
            }
        };

        let mut values = Vec::with_capacity(schema.len());
        for (field, &offset) in schema.fields().iter().zip(&offsets) {
            let raw = &row[offset..offset + usize::from(field.length())];
            if code_page.decode(raw).is_none() {
                return Err(DbfError::malformed_at_offset(
                    row_offset + offset,
                    format!(
                        "record {} field '{}' is not valid {}",
                        row_index,
                        field.name(),
                        code_page.name()
                    ),
                ));
            }
            values.push(raw.to_vec());
        }
        records.push(Record::from_raw(values, deleted));
    }

    if bytes.get(data_end).is_some_and(|&b| b != EOF_MARKER) {
        debug!(offset = data_end, "no end-of-file marker after last record");
    }

    debug!(
        records = records.len(),
        fields = schema.len(),
        encoding = code_page.name(),
        "decoded dbf table"
    );

    let table_config = TableConfig {
        encoding: code_page.name().to_string(),
        trust_language_driver: config.trust_language_driver,
    };
    Ok(Table::from_parts(
        table_config,
        code_page,
        header.last_updated,
        schema,
        records,
    ))
}

fn resolve_code_page(header: &FileHeader, config: &TableConfig) -> DbfResult<CodePage> {
    if config.trust_language_driver {
        if let Some(code_page) = CodePage::from_language_driver(header.language_driver) {
            return Ok(code_page);
        }
        if header.language_driver != 0 {
            warn!(
                language_driver = header.language_driver,
                fallback = %config.encoding,
                "unrecognized language driver, using configured encoding"
            );
        }
    }
    config.validate()
}

/// Parse descriptors up to the terminator and rebuild the schema through
/// the registry, so decoded files obey the same rules as built tables.
fn decode_schema(bytes: &[u8], header: &FileHeader, code_page: &CodePage) -> DbfResult<Schema> {
    let header_length = usize::from(header.header_length);
    if header_length > bytes.len() {
        return Err(DbfError::malformed_at_offset(
            8,
            format!(
                "header length {} exceeds file size {}",
                header_length,
                bytes.len()
            ),
        ));
    }

    let mut registry = SchemaRegistry::new();
    let mut pos = FILE_HEADER_SIZE;
    loop {
        if pos >= header_length {
            return Err(DbfError::malformed_at_offset(
                pos,
                "descriptor block has no terminator inside the header",
            ));
        }
        if bytes[pos] == HEADER_TERMINATOR {
            break;
        }
        if pos + FIELD_DESCRIPTOR_SIZE > header_length {
            return Err(DbfError::malformed_at_offset(
                pos,
                "field descriptor runs past the header",
            ));
        }

        let raw = descriptor_from_bytes(&bytes[pos..pos + FIELD_DESCRIPTOR_SIZE], pos, code_page)?;
        registry
            .add_field(
                &raw.name,
                raw.field_type,
                raw.length,
                raw.decimal_places,
                code_page,
            )
            .map_err(|err| match err.code() {
                DbfErrorCode::MalformedFile => err,
                _ => DbfError::malformed_at_offset(pos, format!("bad field descriptor: {}", err)),
            })?;
        pos += FIELD_DESCRIPTOR_SIZE;
    }

    Ok(registry.freeze())
}
