//! Content fingerprints used to group attempts at the same original text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Length of a full digest in hex digits.
pub const HASH_HEX_LEN: usize = 64;

/// Lowercase hex BLAKE3 digest of an original text's UTF-8 bytes.
///
/// No normalization happens here: callers hash the already-combined original
/// (see [`combine_original`](crate::text::combine_original)).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(text: &str) -> Self {
        Self(blake3::hash(text.as_bytes()).to_hex().to_string())
    }

    /// Parse a digest read back from storage or user input.
    ///
    /// Accepts exactly [`HASH_HEX_LEN`] hex digits in either case.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let hex = hex.into();
        if hex.len() != HASH_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AnalysisError::InvalidInput(format!(
                "content hash must be {HASH_HEX_LEN} hex digits, got {hex:?}"
            )));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for tables and log lines.
    pub fn short(&self) -> &str {
        // always ASCII hex, so any byte index is a char boundary
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
