//! Per-table configuration
//!
//! Every table carries its own configuration value, so tables with
//! different code pages coexist in one process.

use serde::{Deserialize, Serialize};

use crate::encoding::CodePage;
use crate::errors::DbfResult;

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Code page label for Character fields (default "UTF-8")
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// On decode, prefer the code page named by the file's language driver
    /// byte over `encoding` when the byte is recognized (default true)
    #[serde(default = "default_trust_language_driver")]
    pub trust_language_driver: bool,
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

fn default_trust_language_driver() -> bool {
    true
}

impl TableConfig {
    pub fn new(encoding: impl Into<String>) -> Self {
        Self {
            encoding: encoding.into(),
            ..Self::default()
        }
    }

    /// Resolve the configured code page.
    ///
    /// # Errors
    ///
    /// `DBF_UNKNOWN_ENCODING` if the label is not usable.
    pub fn validate(&self) -> DbfResult<CodePage> {
        CodePage::for_label(&self.encoding)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
            trust_language_driver: default_trust_language_driver(),
        }
    }
}
