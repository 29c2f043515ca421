//! Fixed-size file header and field descriptor blocks
//!
//! File header (32 bytes):
//! - 0: version signature
//! - 1..4: last update, YY (since 1900) MM DD
//! - 4..8: record count (u32 LE)
//! - 8..10: header length (u16 LE)
//! - 10..12: record length (u16 LE)
//! - 12..29: reserved, zero
//! - 29: language driver id
//! - 30..32: reserved, zero
//!
//! Field descriptor (32 bytes):
//! - 0..11: name, NUL padded
//! - 11: type tag
//! - 12..16: field offset inside the record (u32 LE)
//! - 16: length
//! - 17: decimal places
//! - 18..32: reserved, zero

use chrono::{Datelike, NaiveDate};

use crate::encoding::CodePage;
use crate::errors::{DbfError, DbfResult};
use crate::schema::{FieldDescriptor, FieldType};

pub const FILE_HEADER_SIZE: usize = 32;
pub const FIELD_DESCRIPTOR_SIZE: usize = 32;

/// Ends the descriptor block
pub const HEADER_TERMINATOR: u8 = 0x0D;
/// Trails the last record
pub const EOF_MARKER: u8 = 0x1A;
/// Deletion flag of a live record
pub const RECORD_ACTIVE: u8 = b' ';
/// Deletion flag of a deleted record
pub const RECORD_DELETED: u8 = b'*';

/// dBase III without memo, the signature written by this crate
pub const DBASE_III: u8 = 0x03;

const NAME_FIELD_SIZE: usize = 11;
const LANGUAGE_DRIVER_OFFSET: usize = 29;

/// Version signatures of the dBase/FoxPro family accepted on decode
const KNOWN_VERSIONS: [u8; 12] = [
    0x02, 0x03, 0x05, 0x30, 0x31, 0x32, 0x43, 0x63, 0x83, 0x8B, 0xCB, 0xF5,
];

/// dBase 7: 68-byte header, 48-byte descriptors
const DBASE_7: u8 = 0x04;

/// Parsed file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u8,
    pub last_updated: Option<NaiveDate>,
    pub record_count: u32,
    pub header_length: u16,
    pub record_length: u16,
    pub language_driver: u8,
}

impl FileHeader {
    /// Serialize to the 32-byte on-disk form
    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        buf[0] = self.version;

        // Dates outside 1900..=2155 cannot be represented; leave them zero
        if let Some(date) = self.last_updated {
            if let Ok(years) = u8::try_from(date.year() - 1900) {
                buf[1] = years;
                buf[2] = date.month() as u8;
                buf[3] = date.day() as u8;
            }
        }

        buf[4..8].copy_from_slice(&self.record_count.to_le_bytes());
        buf[8..10].copy_from_slice(&self.header_length.to_le_bytes());
        buf[10..12].copy_from_slice(&self.record_length.to_le_bytes());
        buf[LANGUAGE_DRIVER_OFFSET] = self.language_driver;
        buf
    }

    /// Parse the leading 32 bytes of a file.
    ///
    /// # Errors
    ///
    /// `DBF_MALFORMED_FILE` if the buffer is too short or the version
    /// signature is not a dBase/FoxPro table.
    pub fn from_bytes(bytes: &[u8]) -> DbfResult<Self> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(DbfError::malformed_file(format!(
                "file is {} bytes, header needs {}",
                bytes.len(),
                FILE_HEADER_SIZE
            )));
        }

        let version = bytes[0];
        if version == DBASE_7 {
            return Err(DbfError::malformed_at_offset(
                0,
                "unsupported version signature 0x04 (dBase 7 header layout)",
            ));
        }
        if !KNOWN_VERSIONS.contains(&version) {
            return Err(DbfError::malformed_at_offset(
                0,
                format!("unknown version signature 0x{:02X}", version),
            ));
        }

        let last_updated = NaiveDate::from_ymd_opt(
            1900 + i32::from(bytes[1]),
            u32::from(bytes[2]),
            u32::from(bytes[3]),
        );

        Ok(Self {
            version,
            last_updated,
            record_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            header_length: u16::from_le_bytes([bytes[8], bytes[9]]),
            record_length: u16::from_le_bytes([bytes[10], bytes[11]]),
            language_driver: bytes[LANGUAGE_DRIVER_OFFSET],
        })
    }
}

/// A field descriptor as read from disk, before schema validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub length: u8,
    pub decimal_places: u8,
}

/// Serialize one field descriptor
pub fn descriptor_to_bytes(
    field: &FieldDescriptor,
    record_offset: usize,
    code_page: &CodePage,
) -> DbfResult<[u8; FIELD_DESCRIPTOR_SIZE]> {
    let mut buf = [0u8; FIELD_DESCRIPTOR_SIZE];

    let name = code_page.fit(field.name(), NAME_FIELD_SIZE - 1)?;
    buf[..name.len()].copy_from_slice(&name);
    buf[11] = field.field_type().tag();

    let offset = u32::try_from(record_offset)
        .map_err(|_| DbfError::malformed_file("field offset exceeds u32"))?;
    buf[12..16].copy_from_slice(&offset.to_le_bytes());
    buf[16] = field.length();
    buf[17] = field.decimal_places();
    Ok(buf)
}

/// Parse one field descriptor found at `file_offset`
pub fn descriptor_from_bytes(
    bytes: &[u8],
    file_offset: usize,
    code_page: &CodePage,
) -> DbfResult<RawDescriptor> {
    if bytes.len() < FIELD_DESCRIPTOR_SIZE {
        return Err(DbfError::malformed_at_offset(
            file_offset,
            "truncated field descriptor",
        ));
    }

    let name_bytes = &bytes[..NAME_FIELD_SIZE];
    let name_end = name_bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(NAME_FIELD_SIZE);
    let name_bytes = &name_bytes[..name_end];
    let name_end = name_bytes
        .iter()
        .rposition(|&b| b != b' ')
        .map_or(0, |i| i + 1);
    let name = code_page.decode(&name_bytes[..name_end]).ok_or_else(|| {
        DbfError::malformed_at_offset(
            file_offset,
            format!("field name is not valid {}", code_page.name()),
        )
    })?;

    let tag = bytes[11];
    let field_type = FieldType::from_tag(tag).ok_or_else(|| {
        DbfError::malformed_at_offset(
            file_offset + 11,
            format!(
                "unsupported field type '{}' for field '{}'",
                char::from(tag).escape_default(),
                name
            ),
        )
    })?;

    Ok(RawDescriptor {
        name,
        field_type,
        length: bytes[16],
        decimal_places: bytes[17],
    })
}
