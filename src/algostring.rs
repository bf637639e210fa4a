//! # Tagged Algorithm Strings
//!
//! The one value format used everywhere a key, signature, or hash appears
//! inside an entry: `ALGORITHM:BASE85DATA`.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ALGOSTRING FORMAT                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Example: ED25519:p;XXU0XF#UO^}vKbC-wS(#5W6=OEIFmR2z`rS1j+             │
//! │                                                                         │
//! │  ┌──────────┬───┬──────────────────────────────────────────────┐       │
//! │  │  Prefix  │ : │                 Data                         │       │
//! │  ├──────────┼───┼──────────────────────────────────────────────┤       │
//! │  │ ED25519  │   │ Base85 (RFC 1924 alphabet) of the raw bytes  │       │
//! │  └──────────┴───┴──────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Known prefixes: ED25519, CURVE25519,                                  │
//! │                  BLAKE3-256, BLAKE2B-256, SHA-256, SHA3-256            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The prefix is opaque at this layer: it is carried, compared, and
//! round-tripped, but algorithm dispatch happens in the crypto and entry
//! code. Base85 with the RFC 1924 alphabet was chosen over base64 for
//! density: a 32-byte key fits in 40 text characters.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A tagged value of the form `PREFIX:BASE85DATA`
///
/// Equality is structural on both halves. An `AlgoString` can hold an
/// empty prefix or data half (e.g. freshly constructed), but is only
/// *valid* when both are non-empty; check with [`AlgoString::is_valid`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgoString {
    prefix: String,
    data: String,
}

impl AlgoString {
    /// Create from already-separated halves
    pub fn from_parts(prefix: &str, data: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            data: data.to_string(),
        }
    }

    /// Create from an algorithm tag and raw bytes, encoding the data half
    pub fn from_raw(prefix: &str, raw: &[u8]) -> Self {
        Self {
            prefix: prefix.to_string(),
            data: base85::encode(raw),
        }
    }

    /// Parse a `PREFIX:DATA` string
    ///
    /// Splits at the first `:`; everything after it (including any further
    /// colons) is the data half.
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((prefix, data)) => Ok(Self {
                prefix: prefix.to_string(),
                data: data.to_string(),
            }),
            None => Err(Error::BadData(format!("missing separator in '{}'", s))),
        }
    }

    /// Parse from raw bytes (UTF-8 decode, then [`AlgoString::parse`])
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(b)?;
        Self::parse(s)
    }

    /// The algorithm tag (e.g. `ED25519`)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The Base85-encoded data half
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Decode the data half into raw bytes
    pub fn raw_data(&self) -> Result<Vec<u8>> {
        base85::decode(&self.data)
            .map_err(|_| Error::BadData(format!("undecodable base85 in '{}'", self.prefix)))
    }

    /// Both halves present?
    pub fn is_valid(&self) -> bool {
        !self.prefix.is_empty() && !self.data.is_empty()
    }

    /// The serialized `PREFIX:DATA` form as bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl zeroize::Zeroize for AlgoString {
    fn zeroize(&mut self) {
        zeroize::Zeroize::zeroize(&mut self.prefix);
        zeroize::Zeroize::zeroize(&mut self.data);
    }
}

impl std::fmt::Display for AlgoString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.prefix, self.data)
    }
}

impl std::str::FromStr for AlgoString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let s = "ED25519:p;XXU0XF#UO^}vKbC-wS(#5W6=OEIFmR2z`rS1j+";
        let a = AlgoString::parse(s).unwrap();
        assert_eq!(a.prefix(), "ED25519");
        assert_eq!(a.data(), "p;XXU0XF#UO^}vKbC-wS(#5W6=OEIFmR2z`rS1j+");
        assert_eq!(a.to_string(), s);
        assert_eq!(a.to_bytes(), s.as_bytes());
        assert!(a.is_valid());
    }

    #[test]
    fn test_parse_splits_at_first_colon() {
        // Base85 never produces ':', but the parser must not care
        let a = AlgoString::parse("SHA-256:ab:cd").unwrap();
        assert_eq!(a.prefix(), "SHA-256");
        assert_eq!(a.data(), "ab:cd");
    }

    #[test]
    fn test_parse_missing_separator() {
        let err = AlgoString::parse("ED25519").unwrap_err();
        assert_eq!(err.code(), "BadData");
    }

    #[test]
    fn test_from_bytes_rejects_bad_utf8() {
        let err = AlgoString::from_bytes(&[0x45, 0x44, 0xFF, 0x3A, 0x41]).unwrap_err();
        assert_eq!(err.code(), "BadData");
    }

    #[test]
    fn test_validity() {
        assert!(!AlgoString::default().is_valid());
        assert!(!AlgoString::parse(":abcd").unwrap().is_valid());
        assert!(!AlgoString::parse("ED25519:").unwrap().is_valid());
        assert!(AlgoString::parse("ED25519:abcd").unwrap().is_valid());
    }

    #[test]
    fn test_raw_data_roundtrip() {
        let raw: Vec<u8> = (0u8..32).collect();
        let a = AlgoString::from_raw("CURVE25519", &raw);
        assert_eq!(a.raw_data().unwrap(), raw);
        // 32 bytes encode to 40 base85 characters
        assert_eq!(a.data().len(), 40);
    }

    #[test]
    fn test_raw_data_rejects_bad_base85() {
        // Space is outside the RFC 1924 alphabet
        let a = AlgoString::from_parts("ED25519", "not valid base85");
        assert!(a.raw_data().is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a = AlgoString::from_parts("ED25519", "abcd");
        let b = AlgoString::parse("ED25519:abcd").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, AlgoString::from_parts("CURVE25519", "abcd"));
    }
}
