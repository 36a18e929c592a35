//! Identifier types for order lookups
//!
//! Callers hand us strings of unknown provenance: a full order key, the
//! 8-character short form printed on receipts, or an external reference.
//! Nothing is guaranteed beyond length and character-set heuristics, so the
//! predicates here are independent; one identifier may satisfy several.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ResolveError;

/// Length of a hyphenated canonical key (`8-4-4-4-12`).
pub const CANONICAL_KEY_LEN: usize = 36;

/// Agreed length of the shortened, human-friendly order id.
pub const DEFAULT_SHORT_ID_LEN: usize = 8;

/// Byte offsets of the hyphens in a canonical key.
const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// Coarse classification of an identifier, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierShape {
    /// Full UUID-shaped key.
    Canonical,
    /// Exactly the shortened-id length.
    Short,
    /// Anything else, e.g. an external reference number.
    Opaque,
}

/// A trimmed, non-empty caller-supplied identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    raw: String,
    short_id_len: usize,
}

impl Identifier {
    /// Parse a caller-supplied identifier.
    ///
    /// Leading and trailing whitespace is dropped. Empty input and input
    /// containing control characters are rejected.
    pub fn parse(input: &str, short_id_len: usize) -> Result<Self, ResolveError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(ResolveError::InvalidIdentifier {
                reason: "identifier must not be empty".to_string(),
            });
        }
        if raw.chars().any(char::is_control) {
            return Err(ResolveError::InvalidIdentifier {
                reason: "identifier must not contain control characters".to_string(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            short_id_len,
        })
    }

    /// The identifier as supplied (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercased form used when matching against canonical keys.
    pub fn key_form(&self) -> String {
        self.raw.to_ascii_lowercase()
    }

    /// Whether the identifier has the canonical key shape.
    pub fn is_canonical(&self) -> bool {
        is_canonical_key(&self.raw)
    }

    /// Whether the identifier has exactly the shortened-id length.
    pub fn is_short(&self) -> bool {
        self.raw.chars().count() == self.short_id_len
    }

    /// Configured shortened-id length this identifier was parsed against.
    pub fn short_id_len(&self) -> usize {
        self.short_id_len
    }

    pub fn shape(&self) -> IdentifierShape {
        if self.is_canonical() {
            IdentifierShape::Canonical
        } else if self.is_short() {
            IdentifierShape::Short
        } else {
            IdentifierShape::Opaque
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

/// Check the fixed-length, fixed-character-set canonical key shape.
pub fn is_canonical_key(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() != CANONICAL_KEY_LEN {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| {
        if HYPHEN_POSITIONS.contains(&i) {
            *b == b'-'
        } else {
            b.is_ascii_hexdigit()
        }
    })
}

/// Shortened form of a key: its first `len` characters, lowercased.
pub fn short_id(key: &str, len: usize) -> String {
    key.chars().take(len).collect::<String>().to_ascii_lowercase()
}
