//! Small data types shared across the sensor API and workflows (spec §3).

use serde::{Deserialize, Serialize};

/// Result of `search_template` (spec §3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub found: bool,
    pub position: i32,
    pub accuracy: i32,
}

impl SearchResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            position: -1,
            accuracy: -1,
        }
    }

    pub fn found(position: u16, accuracy: u16) -> Self {
        Self {
            found: true,
            position: position as i32,
            accuracy: accuracy as i32,
        }
    }
}

/// A template record produced by database export / consumed by import
/// (spec §3, §4.5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub position: u16,
    pub sha256_hex: String,
    pub characteristics: Vec<u8>,
}

impl Record {
    pub fn new(position: u16, characteristics: Vec<u8>) -> Self {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(&characteristics);
        Self {
            position,
            sha256_hex: hex::encode(digest),
            characteristics,
        }
    }
}
