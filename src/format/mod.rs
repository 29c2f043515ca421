//! Binary layout codec for dBase (.dbf) files
//!
//! Encodes a table to the exact byte layout dBase readers expect and
//! decodes such bytes back into a table. This is the only wire/file format
//! the crate speaks; reading and writing files is left to the caller.

mod codec;
mod header;

pub use codec::{decode, decode_from, decode_with_config, encode, encode_to};
pub use header::{
    FileHeader, DBASE_III, EOF_MARKER, FIELD_DESCRIPTOR_SIZE, FILE_HEADER_SIZE,
    HEADER_TERMINATOR, RECORD_ACTIVE, RECORD_DELETED,
};
