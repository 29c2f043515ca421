//! Error types for dbftable
//!
//! Error codes:
//! - DBF_SCHEMA_LOCKED
//! - DBF_DUPLICATE_FIELD_NAME
//! - DBF_INVALID_FIELD_DEFINITION
//! - DBF_UNKNOWN_FIELD
//! - DBF_NOT_A_DECIMAL_FIELD
//! - DBF_INVALID_RECORD_INDEX
//! - DBF_VALUE_ENCODING_ERROR
//! - DBF_VALUE_PARSE_ERROR
//! - DBF_UNSUPPORTED_CHARACTER
//! - DBF_UNKNOWN_ENCODING
//! - DBF_MALFORMED_FILE
//! - DBF_IO_ERROR
//!
//! Every error is recoverable. Nothing in this crate aborts the process on
//! bad caller input or bad file bytes.

use std::fmt;
use std::io;

/// Error categories reported by table operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbfErrorCode {
    /// Schema mutation after the first record exists
    SchemaLocked,
    /// Truncated field name collides with an existing field
    DuplicateFieldName,
    /// Bad name, length or decimal-place combination
    InvalidFieldDefinition,
    /// No field with the given name or index
    UnknownField,
    /// Decimal places requested for a non-numeric field
    NotADecimalField,
    /// Record index out of bounds
    InvalidRecordIndex,
    /// Value does not fit its field type's grammar
    ValueEncodingError,
    /// Stored text cannot be read as the requested type
    ValueParseError,
    /// Text not representable in the table's code page
    UnsupportedCharacter,
    /// Code page label not recognized
    UnknownEncoding,
    /// Binary decode inconsistency
    MalformedFile,
    /// Failure reading from a source or writing to a sink
    IoError,
}

impl DbfErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            DbfErrorCode::SchemaLocked => "DBF_SCHEMA_LOCKED",
            DbfErrorCode::DuplicateFieldName => "DBF_DUPLICATE_FIELD_NAME",
            DbfErrorCode::InvalidFieldDefinition => "DBF_INVALID_FIELD_DEFINITION",
            DbfErrorCode::UnknownField => "DBF_UNKNOWN_FIELD",
            DbfErrorCode::NotADecimalField => "DBF_NOT_A_DECIMAL_FIELD",
            DbfErrorCode::InvalidRecordIndex => "DBF_INVALID_RECORD_INDEX",
            DbfErrorCode::ValueEncodingError => "DBF_VALUE_ENCODING_ERROR",
            DbfErrorCode::ValueParseError => "DBF_VALUE_PARSE_ERROR",
            DbfErrorCode::UnsupportedCharacter => "DBF_UNSUPPORTED_CHARACTER",
            DbfErrorCode::UnknownEncoding => "DBF_UNKNOWN_ENCODING",
            DbfErrorCode::MalformedFile => "DBF_MALFORMED_FILE",
            DbfErrorCode::IoError => "DBF_IO_ERROR",
        }
    }
}

impl fmt::Display for DbfErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Table error with code, message and optional context
#[derive(Debug)]
pub struct DbfError {
    code: DbfErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl DbfError {
    fn new(code: DbfErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach context to an existing error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Schema mutation attempted while records exist
    pub fn schema_locked(field_name: &str) -> Self {
        Self::new(
            DbfErrorCode::SchemaLocked,
            format!(
                "cannot add field '{}': schema is locked once records exist",
                field_name
            ),
        )
    }

    pub fn duplicate_field_name(field_name: &str) -> Self {
        Self::new(
            DbfErrorCode::DuplicateFieldName,
            format!("field '{}' already exists", field_name),
        )
    }

    pub fn invalid_field_definition(field_name: &str, reason: impl Into<String>) -> Self {
        Self::new(
            DbfErrorCode::InvalidFieldDefinition,
            format!("invalid definition for field '{}'", field_name),
        )
        .with_details(reason)
    }

    pub fn unknown_field(field_name: &str) -> Self {
        Self::new(
            DbfErrorCode::UnknownField,
            format!("field '{}' does not exist", field_name),
        )
    }

    pub fn unknown_field_index(index: usize, field_count: usize) -> Self {
        Self::new(
            DbfErrorCode::UnknownField,
            format!("field index {} out of range", index),
        )
        .with_details(format!("field_count: {}", field_count))
    }

    pub fn not_a_decimal_field(field_name: &str, type_name: &str) -> Self {
        Self::new(
            DbfErrorCode::NotADecimalField,
            format!("field '{}' is a {} field, not a decimal field", field_name, type_name),
        )
    }

    pub fn invalid_record_index(index: usize, record_count: usize) -> Self {
        Self::new(
            DbfErrorCode::InvalidRecordIndex,
            format!("record index {} out of range", index),
        )
        .with_details(format!("record_count: {}", record_count))
    }

    pub fn value_encoding(field_name: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::new(
            DbfErrorCode::ValueEncodingError,
            format!("value '{}' rejected for field '{}'", value, field_name),
        )
        .with_details(reason)
    }

    pub fn value_parse(field_name: &str, stored: &str, target: &str) -> Self {
        Self::new(
            DbfErrorCode::ValueParseError,
            format!(
                "stored value '{}' of field '{}' is not a valid {}",
                stored, field_name, target
            ),
        )
    }

    pub fn unsupported_character(ch: char, encoding: &str) -> Self {
        Self::new(
            DbfErrorCode::UnsupportedCharacter,
            format!("character {:?} (U+{:04X}) cannot be encoded", ch, ch as u32),
        )
        .with_details(format!("encoding: {}", encoding))
    }

    pub fn unknown_encoding(label: &str) -> Self {
        Self::new(
            DbfErrorCode::UnknownEncoding,
            format!("'{}' is not a usable code page", label),
        )
    }

    pub fn malformed_file(reason: impl Into<String>) -> Self {
        Self::new(DbfErrorCode::MalformedFile, reason)
    }

    /// Malformed file error pinned to a byte offset
    pub fn malformed_at_offset(offset: usize, reason: impl Into<String>) -> Self {
        Self::new(DbfErrorCode::MalformedFile, reason)
            .with_details(format!("byte_offset: {}", offset))
    }

    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: DbfErrorCode::IoError,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> DbfErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

impl fmt::Display for DbfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for DbfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<io::Error> for DbfError {
    fn from(err: io::Error) -> Self {
        DbfError::io_error("I/O failure", err)
    }
}

/// Result type for table operations
pub type DbfResult<T> = Result<T, DbfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(DbfErrorCode::SchemaLocked.code(), "DBF_SCHEMA_LOCKED");
        assert_eq!(DbfErrorCode::DuplicateFieldName.code(), "DBF_DUPLICATE_FIELD_NAME");
        assert_eq!(DbfErrorCode::NotADecimalField.code(), "DBF_NOT_A_DECIMAL_FIELD");
        assert_eq!(DbfErrorCode::MalformedFile.code(), "DBF_MALFORMED_FILE");
    }

    #[test]
    fn test_display_contains_code_message_and_details() {
        let err = DbfError::invalid_record_index(7, 2);
        let display = format!("{}", err);
        assert!(display.contains("DBF_INVALID_RECORD_INDEX"));
        assert!(display.contains("record index 7"));
        assert!(display.contains("record_count: 2"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error;

        let err = DbfError::from(io::Error::new(io::ErrorKind::Other, "disk gone"));
        assert_eq!(err.code(), DbfErrorCode::IoError);
        assert!(err.source().is_some());
    }
}
