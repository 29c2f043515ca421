//! Code page lookup and transcoding
//!
//! Labels are resolved through `encoding_rs` (WHATWG label set, so
//! "cp1252", "latin1" and "windows-1252" all name the same table).
//!
//! The dBase header stores the code page as a one-byte language driver id
//! (offset 29). A table is only as portable as that byte, so the accepted
//! code pages are UTF-8 (written as 0x00) and the ones listed in
//! `LANGUAGE_DRIVERS`. Anything else, such as KOI8-R or ISO-8859-2, would
//! be written without an identifier and could not be read back, so it is
//! rejected up front. On decode, unknown driver bytes fall back to the
//! configured encoding.

use std::fmt;

use encoding_rs::{
    Encoding, BIG5, EUC_KR, GBK, IBM866, SHIFT_JIS, UTF_8, WINDOWS_1250, WINDOWS_1251,
    WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255, WINDOWS_1256, WINDOWS_1257,
    WINDOWS_874,
};

use crate::errors::{DbfError, DbfResult};

/// Language driver id written for UTF-8, which has no dBase driver
pub const NO_LANGUAGE_DRIVER: u8 = 0x00;

/// Number of code pages with a language driver id
const DRIVER_COUNT: usize = 14;

/// Code pages paired with the driver id written for them
fn language_drivers() -> [(&'static Encoding, u8); DRIVER_COUNT] {
    [
        (WINDOWS_1252, 0x03),
        (IBM866, 0x65),
        (WINDOWS_874, 0x7C),
        (WINDOWS_1255, 0x7D),
        (WINDOWS_1256, 0x7E),
        (WINDOWS_1250, 0xC8),
        (WINDOWS_1251, 0xC9),
        (WINDOWS_1254, 0xCA),
        (WINDOWS_1253, 0xCB),
        (WINDOWS_1257, 0xCC),
        (SHIFT_JIS, 0x13),
        (GBK, 0x4D),
        (EUC_KR, 0x4E),
        (BIG5, 0x4F),
    ]
}

/// A resolved on-disk character encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePage {
    encoding: &'static Encoding,
}

impl CodePage {
    /// Resolve a code page label such as `"UTF-8"` or `"windows-1252"`.
    ///
    /// # Errors
    ///
    /// `DBF_UNKNOWN_ENCODING` if the label is unknown, or names an encoding
    /// the file header has no language driver id for.
    pub fn for_label(label: &str) -> DbfResult<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| DbfError::unknown_encoding(label))?;
        let identifiable = encoding == UTF_8
            || language_drivers()
                .iter()
                .any(|(known, _)| *known == encoding);
        if !identifiable {
            return Err(DbfError::unknown_encoding(label).with_details(format!(
                "{} has no dBase language driver id",
                encoding.name()
            )));
        }
        Ok(Self { encoding })
    }

    /// Every code page `for_label` accepts
    pub fn supported() -> impl Iterator<Item = CodePage> {
        std::iter::once(UTF_8)
            .chain(language_drivers().into_iter().map(|(encoding, _)| encoding))
            .map(|encoding| Self { encoding })
    }

    pub fn utf8() -> Self {
        Self { encoding: UTF_8 }
    }

    /// Code page for a header language driver id, if one is known
    pub fn from_language_driver(driver: u8) -> Option<Self> {
        let encoding = match driver {
            0x03 | 0x57 | 0x58 | 0x59 => WINDOWS_1252,
            0x65 => IBM866,
            0x7C => WINDOWS_874,
            0x7D => WINDOWS_1255,
            0x7E => WINDOWS_1256,
            0xC8 => WINDOWS_1250,
            0xC9 => WINDOWS_1251,
            0xCA => WINDOWS_1254,
            0xCB => WINDOWS_1253,
            0xCC => WINDOWS_1257,
            0x13 | 0x7B => SHIFT_JIS,
            0x4D | 0x7A => GBK,
            0x4E | 0x79 => EUC_KR,
            0x4F | 0x78 => BIG5,
            _ => return None,
        };
        Some(Self { encoding })
    }

    /// Language driver id to write into the file header
    pub fn language_driver(&self) -> u8 {
        language_drivers()
            .iter()
            .find(|(encoding, _)| *encoding == self.encoding)
            .map(|(_, driver)| *driver)
            .unwrap_or(NO_LANGUAGE_DRIVER)
    }

    /// Canonical encoding name
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Encode text into this code page.
    ///
    /// # Errors
    ///
    /// `DBF_UNSUPPORTED_CHARACTER` naming the first character that has no
    /// mapping. Nothing is substituted.
    pub fn encode(&self, text: &str) -> DbfResult<Vec<u8>> {
        let (bytes, _, unmappable) = self.encoding.encode(text);
        if unmappable {
            let offending = text
                .chars()
                .find(|ch| {
                    let mut buf = [0u8; 4];
                    self.encoding.encode(ch.encode_utf8(&mut buf)).2
                })
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(DbfError::unsupported_character(offending, self.name()));
        }
        Ok(bytes.into_owned())
    }

    /// Decode bytes from this code page. Returns `None` on byte sequences
    /// that are not valid in the encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
    }

    /// Encode text and cut it to at most `max_len` bytes.
    ///
    /// The cut lands on a character boundary of the source text, so the
    /// result always decodes back to a prefix of `text`.
    pub fn fit(&self, text: &str, max_len: usize) -> DbfResult<Vec<u8>> {
        let encoded = self.encode(text)?;
        if encoded.len() <= max_len {
            return Ok(encoded);
        }

        let mut cuts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        cuts.push(text.len());

        // cuts[lo] always fits, cuts[hi] never does
        let (mut lo, mut hi) = (0, cuts.len() - 1);
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.encode(&text[..cuts[mid]])?.len() <= max_len {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        self.encode(&text[..cuts[lo]])
    }
}

impl Default for CodePage {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Display for CodePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
