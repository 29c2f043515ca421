//! Field type and field descriptor definitions
//!
//! Supported types:
//! - Logical (`L`): one byte, `T` / `F` / `?` or blank
//! - Date (`D`): eight ASCII digits, `YYYYMMDD`
//! - Character (`C`): 1..=254 bytes of code-page text
//! - Number (`N`): right-justified decimal text
//! - Float (`F`): same text form as Number, different type tag

use serde::{Deserialize, Serialize};

/// Longest field name stored in a descriptor, in encoded bytes
pub const MAX_FIELD_NAME_LEN: usize = 10;

/// Widest Character field
pub const MAX_CHARACTER_LENGTH: u8 = 254;

/// Widest Number or Float field
pub const MAX_NUMERIC_LENGTH: u8 = 254;

/// Column type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Logical,
    Date,
    Character,
    Number,
    Float,
}

impl FieldType {
    /// On-disk type tag byte
    pub fn tag(self) -> u8 {
        match self {
            FieldType::Logical => b'L',
            FieldType::Date => b'D',
            FieldType::Character => b'C',
            FieldType::Number => b'N',
            FieldType::Float => b'F',
        }
    }

    /// Parse a descriptor type tag, returns None for unsupported types
    /// (memo, binary, general and the rest)
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'L' => Some(FieldType::Logical),
            b'D' => Some(FieldType::Date),
            b'C' => Some(FieldType::Character),
            b'N' => Some(FieldType::Number),
            b'F' => Some(FieldType::Float),
            _ => None,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(self) -> &'static str {
        match self {
            FieldType::Logical => "logical",
            FieldType::Date => "date",
            FieldType::Character => "character",
            FieldType::Number => "number",
            FieldType::Float => "float",
        }
    }

    /// Number and Float carry decimal places
    pub fn is_decimal(self) -> bool {
        matches!(self, FieldType::Number | FieldType::Float)
    }

    /// Length imposed by the type, if any
    pub fn fixed_length(self) -> Option<u8> {
        match self {
            FieldType::Logical => Some(1),
            FieldType::Date => Some(8),
            _ => None,
        }
    }

    /// Check a (length, decimal places) pair against this type's rules.
    ///
    /// Returns a human-readable reason on failure.
    pub fn check_definition(self, length: u8, decimal_places: u8) -> Result<(), String> {
        match self {
            FieldType::Logical | FieldType::Date => {
                let expected = self.fixed_length().unwrap_or(length);
                if length != expected {
                    return Err(format!(
                        "{} fields are {} bytes wide, got {}",
                        self.type_name(),
                        expected,
                        length
                    ));
                }
                if decimal_places != 0 {
                    return Err(format!("{} fields have no decimal places", self.type_name()));
                }
            }
            FieldType::Character => {
                if length == 0 || length > MAX_CHARACTER_LENGTH {
                    return Err(format!(
                        "character length must be 1..={}, got {}",
                        MAX_CHARACTER_LENGTH, length
                    ));
                }
                if decimal_places != 0 {
                    return Err("character fields have no decimal places".into());
                }
            }
            FieldType::Number | FieldType::Float => {
                if length == 0 || length > MAX_NUMERIC_LENGTH {
                    return Err(format!(
                        "{} length must be 1..={}, got {}",
                        self.type_name(),
                        MAX_NUMERIC_LENGTH,
                        length
                    ));
                }
                // room for the point and at least one digit before it
                if decimal_places > 0 && u16::from(decimal_places) + 2 > u16::from(length) {
                    return Err(format!(
                        "{} decimal places do not fit in length {}",
                        decimal_places, length
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Metadata for one column. Immutable once created; only the schema
/// registry constructs descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    length: u8,
    decimal_places: u8,
}

impl FieldDescriptor {
    pub(crate) fn new(
        name: String,
        field_type: FieldType,
        length: u8,
        decimal_places: u8,
    ) -> Self {
        Self {
            name,
            field_type,
            length,
            decimal_places,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Width of the encoded value in bytes
    pub fn length(&self) -> u8 {
        self.length
    }

    /// Decimal places; always zero for non-decimal types
    pub fn decimal_places(&self) -> u8 {
        self.decimal_places
    }
}
