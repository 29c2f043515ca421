//! Character transcoding between a table's code page and Rust strings
//!
//! Character fields are stored in the table's declared code page. Length
//! limits apply to the encoded bytes, so every width check goes through
//! [`CodePage::fit`] rather than `str::len`.
//!
//! # Guarantees
//!
//! - encode and decode are inverses for representable text
//! - unrepresentable characters fail with `DBF_UNSUPPORTED_CHARACTER`
//! - truncation never splits a multi-byte sequence

mod codepage;

pub use codepage::CodePage;
