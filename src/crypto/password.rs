//! # Password Hashing
//!
//! Argon2id password hashing with complexity classification.
//!
//! ## Storage Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       PASSWORD HANDLING                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  set("correct horse battery staple 9")                                  │
//! │        │                                                                │
//! │        ├──► complexity check (length + character classes)              │
//! │        │                                                                │
//! │        └──► Argon2id ──► PHC string                                     │
//! │                          $argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>   │
//! │                                                                         │
//! │  The PHC string is the ONLY persisted representation. The cleartext     │
//! │  is never stored, and check() re-derives with the parameters and salt   │
//! │  embedded in the stored string.                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Complexity Scoring
//!
//! One point per character class present: non-ASCII content, digits,
//! uppercase, lowercase, and punctuation. Short passwords need more
//! classes; anything under 8 characters is rejected outright.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::{Error, Result};

/// Punctuation class counted by the complexity score
const PUNCTUATION: &str = "~`!@#$%^&*()_={}/<>,.:;|'[]\"\\-+?";

/// The five-step strength classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    /// Fails even the basic character-class bar
    VeryWeak,
    /// Two character classes
    Weak,
    /// Three character classes
    Medium,
    /// Four character classes
    Strong,
    /// All five character classes
    VeryStrong,
}

impl PasswordStrength {
    /// Classify a complexity score (0-5)
    fn from_score(score: u8) -> Self {
        match score {
            0 | 1 => PasswordStrength::VeryWeak,
            2 => PasswordStrength::Weak,
            3 => PasswordStrength::Medium,
            4 => PasswordStrength::Strong,
            _ => PasswordStrength::VeryStrong,
        }
    }

    /// The label used in user-facing messages and the profile store
    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordStrength::VeryWeak => "very weak",
            PasswordStrength::Weak => "weak",
            PasswordStrength::Medium => "medium",
            PasswordStrength::Strong => "strong",
            PasswordStrength::VeryStrong => "very strong",
        }
    }
}

impl std::fmt::Display for PasswordStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Score a candidate password: one point per character class present
fn complexity_score(text: &str) -> u8 {
    let mut score = 0u8;
    if !text.is_ascii() {
        score += 1;
    }
    if text.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }
    if text.chars().any(|c| c.is_ascii_uppercase()) {
        score += 1;
    }
    if text.chars().any(|c| c.is_ascii_lowercase()) {
        score += 1;
    }
    if text.chars().any(|c| PUNCTUATION.contains(c)) {
        score += 1;
    }
    score
}

/// An Argon2id password hash with its strength classification
///
/// Only the PHC-format hash string is ever persisted. A default-constructed
/// `Password` holds no hash and verifies nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Password {
    hashtype: String,
    hashstring: String,
    strength: String,
}

impl Password {
    /// Create an empty password object
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a cleartext password after checking its complexity
    ///
    /// Rejection rules:
    /// - fewer than 8 characters
    /// - fewer than 12 characters with a score below 3
    /// - a score below 2 at any length
    ///
    /// Returns the strength classification on success. Rejected passwords
    /// leave the object unchanged.
    pub fn set(&mut self, text: &str) -> Result<PasswordStrength> {
        if text.chars().count() < 8 {
            return Err(Error::BadParameterValue(
                "passphrase must be at least 8 characters".into(),
            ));
        }

        let score = complexity_score(text);
        let strength = PasswordStrength::from_score(score);
        if (text.chars().count() < 12 && score < 3) || score < 2 {
            return Err(Error::BadParameterValue("passphrase too weak".into()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(text.as_bytes(), &salt)
            .map_err(|e| Error::InternalError(format!("argon2 hashing failed: {}", e)))?;

        self.hashtype = "argon2id".into();
        self.hashstring = hash.to_string();
        self.strength = strength.as_str().into();
        Ok(strength)
    }

    /// Adopt an existing PHC hash string without rehashing
    ///
    /// Used when loading credentials from the profile database; the string
    /// is trusted as stored.
    pub fn assign(&mut self, phc_string: &str) -> Result<()> {
        if phc_string.is_empty() {
            return Err(Error::BadParameterValue("empty hash string".into()));
        }
        self.hashtype = "argon2id".into();
        self.hashstring = phc_string.to_string();
        Ok(())
    }

    /// Verify a cleartext password against the stored hash (constant time)
    pub fn check(&self, text: &str) -> Result<bool> {
        let parsed = PasswordHash::new(&self.hashstring)
            .map_err(|e| Error::BadData(format!("stored hash unparseable: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(text.as_bytes(), &parsed)
            .is_ok())
    }

    /// The hash algorithm name (`argon2id`)
    pub fn hashtype(&self) -> &str {
        &self.hashtype
    }

    /// The PHC-format hash string, the sole persisted representation
    pub fn hashstring(&self) -> &str {
        &self.hashstring
    }

    /// The strength label recorded when the password was set
    pub fn strength(&self) -> &str {
        &self.strength
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_rejected() {
        let mut pw = Password::new();
        let err = pw.set("abc").unwrap_err();
        assert_eq!(err.code(), "BadParameterValue");
        assert_eq!(PasswordStrength::from_score(complexity_score("abc")).as_str(), "very weak");
        assert!(pw.hashstring().is_empty());
    }

    #[test]
    fn test_short_but_complex_accepted() {
        // 9 characters, three classes: digit + upper + lower
        let mut pw = Password::new();
        let strength = pw.set("Password1").unwrap();
        assert_eq!(strength, PasswordStrength::Medium);
        assert_eq!(pw.strength(), "medium");
        assert!(pw.hashstring().starts_with("$argon2id$"));
    }

    #[test]
    fn test_long_simple_accepted() {
        let mut pw = Password::new();
        assert!(pw.set("correct horse battery staple 9").is_ok());
    }

    #[test]
    fn test_long_single_class_rejected() {
        // Over 12 characters but only one class present
        let mut pw = Password::new();
        let err = pw.set("aaaaaaaaaaaaaaaa").unwrap_err();
        assert_eq!(err.code(), "BadParameterValue");
    }

    #[test]
    fn test_score_classes() {
        assert_eq!(complexity_score("aaaa"), 1);
        assert_eq!(complexity_score("aA1!"), 4);
        assert_eq!(complexity_score("aA1!ü"), 5);
        assert_eq!(complexity_score("1234"), 1);
    }

    #[test]
    fn test_check_roundtrip() {
        let mut pw = Password::new();
        pw.set("MyS3cretPassphrase!").unwrap();

        assert!(pw.check("MyS3cretPassphrase!").unwrap());
        assert!(!pw.check("MyS3cretPassphrase?").unwrap());
    }

    #[test]
    fn test_assign_then_check() {
        let mut original = Password::new();
        original.set("Some Passphrase 42").unwrap();

        // The profile layer round-trips only the PHC string
        let mut restored = Password::new();
        restored.assign(original.hashstring()).unwrap();
        assert!(restored.check("Some Passphrase 42").unwrap());
    }

    #[test]
    fn test_assign_rejects_empty() {
        let mut pw = Password::new();
        assert_eq!(pw.assign("").unwrap_err().code(), "BadParameterValue");
    }

    #[test]
    fn test_check_unparseable_hash() {
        let mut pw = Password::new();
        pw.assign("not a phc string").unwrap();
        assert_eq!(pw.check("whatever").unwrap_err().code(), "BadData");
    }
}
