//! # Key Management
//!
//! This module handles cryptographic key generation and the on-disk key
//! file format.
//!
//! ## Key Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SigningPair (Ed25519)                                          │   │
//! │  │  ─────────────────────                                          │   │
//! │  │  • Signs entries: Custody, Organization, and User slots         │   │
//! │  │  • Public half embedded in entries as ED25519:BASE85            │   │
//! │  │  • Private key: 32-byte seed, zeroized on drop                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  EncryptionPair (Curve25519)                                    │   │
//! │  │  ───────────────────────────                                    │   │
//! │  │  • Key exchange material published in entries                   │   │
//! │  │  • Public half embedded as CURVE25519:BASE85                    │   │
//! │  │  • Private key: 32 bytes, zeroized on drop                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SecretKey (XSalsa20, 256-bit)                                  │   │
//! │  │  ─────────────────────────────                                  │   │
//! │  │  • Symmetric key held by the profile layer                      │   │
//! │  │  • Never appears inside entries                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## File Format
//!
//! Each key serializes to a small JSON document:
//!
//! ```text
//! { "type": "signingpair", "encryption": "ed25519",
//!   "publickey": "<base85>", "privatekey": "<base85>" }
//! ```
//!
//! Values in the file are bare Base85; the algorithm lives in the
//! `encryption` field, not in a prefix. Loading validates the declared
//! `type` and `encryption` against the object being constructed. Saving
//! refuses to overwrite an existing file; key files are precious.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::ZeroizeOnDrop;

use crate::algostring::AlgoString;
use crate::error::{Error, Result};

/// On-disk document for the two asymmetric pair types
#[derive(Serialize, Deserialize)]
struct KeyPairFile {
    #[serde(rename = "type")]
    kind: String,
    encryption: String,
    publickey: String,
    privatekey: String,
}

/// On-disk document for symmetric keys
#[derive(Serialize, Deserialize)]
struct SecretKeyFile {
    #[serde(rename = "type")]
    kind: String,
    encryption: String,
    key: String,
}

/// Decode a bare-Base85 field into exactly 32 bytes
fn decode_key_bytes(data: &str, what: &str) -> Result<[u8; 32]> {
    let raw = base85::decode(data)
        .map_err(|_| Error::BadData(format!("undecodable base85 in {}", what)))?;
    raw.try_into()
        .map_err(|_| Error::BadData(format!("{} is not 32 bytes", what)))
}

/// Shared save-path policy: a real path, and never clobber an existing file
fn check_save_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::BadParameterValue("empty path".into()));
    }
    if path.exists() {
        return Err(Error::ResourceExists(path.display().to_string()));
    }
    Ok(())
}

/// Read a key file into a JSON document of the expected shape
fn read_key_file<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    if path.as_os_str().is_empty() {
        return Err(Error::BadParameterValue("empty path".into()));
    }
    if !path.exists() {
        return Err(Error::ResourceNotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

// ============================================================================
// SIGNING PAIR
// ============================================================================

/// Ed25519 signing keypair
///
/// The private half is the 32-byte seed; it is zeroized when the pair is
/// dropped. Getters hand out owned copies only.
#[derive(Debug, ZeroizeOnDrop)]
pub struct SigningPair {
    public: [u8; 32],
    private: [u8; 32],
}

impl SigningPair {
    /// Generate a new random signing pair from the OS CSPRNG
    pub fn generate() -> Self {
        let secret = SigningKey::generate(&mut OsRng);
        Self {
            public: secret.verifying_key().to_bytes(),
            private: secret.to_bytes(),
        }
    }

    /// Reconstruct from tagged public/private halves
    pub fn from_algostrings(public: &AlgoString, private: &AlgoString) -> Result<Self> {
        if public.prefix() != "ED25519" || private.prefix() != "ED25519" {
            return Err(Error::UnsupportedEncryptionType(format!(
                "{}/{}",
                public.prefix(),
                private.prefix()
            )));
        }
        Ok(Self {
            public: decode_key_bytes(public.data(), "public key")?,
            private: decode_key_bytes(private.data(), "private key")?,
        })
    }

    /// The public key in tagged form, for embedding in entries
    pub fn public_key(&self) -> AlgoString {
        AlgoString::from_raw("ED25519", &self.public)
    }

    /// The private key in tagged form
    ///
    /// Only hand this to the profile store or to entry signing; never log it.
    pub fn private_key(&self) -> AlgoString {
        AlgoString::from_raw("ED25519", &self.private)
    }

    /// Write the pair to a JSON key file, refusing to overwrite
    pub fn save(&self, path: &Path) -> Result<()> {
        check_save_path(path)?;
        let doc = KeyPairFile {
            kind: "signingpair".into(),
            encryption: "ed25519".into(),
            publickey: base85::encode(&self.public),
            privatekey: base85::encode(&self.private),
        };
        std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        tracing::debug!(path = %path.display(), "saved signing pair");
        Ok(())
    }

    /// Load a pair from a JSON key file, validating the declared schema
    pub fn load(path: &Path) -> Result<Self> {
        let doc: KeyPairFile = read_key_file(path)?;
        if doc.kind != "signingpair" || doc.encryption != "ed25519" {
            return Err(Error::BadData(format!(
                "expected an ed25519 signingpair, found {} {}",
                doc.encryption, doc.kind
            )));
        }
        Ok(Self {
            public: decode_key_bytes(&doc.publickey, "publickey")?,
            private: decode_key_bytes(&doc.privatekey, "privatekey")?,
        })
    }
}

// ============================================================================
// ENCRYPTION PAIR
// ============================================================================

/// Curve25519 encryption keypair
#[derive(ZeroizeOnDrop)]
pub struct EncryptionPair {
    public: [u8; 32],
    private: [u8; 32],
}

impl EncryptionPair {
    /// Generate a new random encryption pair from the OS CSPRNG
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519PublicKey::from(&secret);
        Self {
            public: public.to_bytes(),
            private: secret.to_bytes(),
        }
    }

    /// Reconstruct from tagged public/private halves
    pub fn from_algostrings(public: &AlgoString, private: &AlgoString) -> Result<Self> {
        if public.prefix() != "CURVE25519" || private.prefix() != "CURVE25519" {
            return Err(Error::UnsupportedEncryptionType(format!(
                "{}/{}",
                public.prefix(),
                private.prefix()
            )));
        }
        Ok(Self {
            public: decode_key_bytes(public.data(), "public key")?,
            private: decode_key_bytes(private.data(), "private key")?,
        })
    }

    /// The public key in tagged form, for embedding in entries
    pub fn public_key(&self) -> AlgoString {
        AlgoString::from_raw("CURVE25519", &self.public)
    }

    /// The private key in tagged form
    pub fn private_key(&self) -> AlgoString {
        AlgoString::from_raw("CURVE25519", &self.private)
    }

    /// Write the pair to a JSON key file, refusing to overwrite
    pub fn save(&self, path: &Path) -> Result<()> {
        check_save_path(path)?;
        let doc = KeyPairFile {
            kind: "encryptionpair".into(),
            encryption: "curve25519".into(),
            publickey: base85::encode(&self.public),
            privatekey: base85::encode(&self.private),
        };
        std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        tracing::debug!(path = %path.display(), "saved encryption pair");
        Ok(())
    }

    /// Load a pair from a JSON key file, validating the declared schema
    pub fn load(path: &Path) -> Result<Self> {
        let doc: KeyPairFile = read_key_file(path)?;
        if doc.kind != "encryptionpair" || doc.encryption != "curve25519" {
            return Err(Error::BadData(format!(
                "expected a curve25519 encryptionpair, found {} {}",
                doc.encryption, doc.kind
            )));
        }
        Ok(Self {
            public: decode_key_bytes(&doc.publickey, "publickey")?,
            private: decode_key_bytes(&doc.privatekey, "privatekey")?,
        })
    }
}

// ============================================================================
// SECRET KEY
// ============================================================================

/// XSalsa20 256-bit symmetric key
///
/// The profile layer uses these for local storage encryption; entries never
/// contain one. The cipher itself lives outside this crate; here the key
/// is pure value object: generate, persist, reload.
#[derive(Debug, ZeroizeOnDrop)]
pub struct SecretKey {
    key: [u8; 32],
}

impl SecretKey {
    /// Generate a new random key from the OS CSPRNG
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Reconstruct from the tagged form
    pub fn from_algostring(key: &AlgoString) -> Result<Self> {
        if key.prefix() != "XSALSA20" {
            return Err(Error::UnsupportedEncryptionType(key.prefix().to_string()));
        }
        Ok(Self {
            key: decode_key_bytes(key.data(), "secret key")?,
        })
    }

    /// The key in tagged form
    pub fn key(&self) -> AlgoString {
        AlgoString::from_raw("XSALSA20", &self.key)
    }

    /// Write the key to a JSON key file, refusing to overwrite
    pub fn save(&self, path: &Path) -> Result<()> {
        check_save_path(path)?;
        let doc = SecretKeyFile {
            kind: "secretkey".into(),
            encryption: "salsa20".into(),
            key: base85::encode(&self.key),
        };
        std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        tracing::debug!(path = %path.display(), "saved secret key");
        Ok(())
    }

    /// Load a key from a JSON key file, validating the declared schema
    pub fn load(path: &Path) -> Result<Self> {
        let doc: SecretKeyFile = read_key_file(path)?;
        if doc.kind != "secretkey" || doc.encryption != "salsa20" {
            return Err(Error::BadData(format!(
                "expected a salsa20 secretkey, found {} {}",
                doc.encryption, doc.kind
            )));
        }
        Ok(Self {
            key: decode_key_bytes(&doc.key, "key")?,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_pair_generation() {
        let a = SigningPair::generate();
        let b = SigningPair::generate();

        assert_ne!(a.public_key(), b.public_key());
        assert!(a.public_key().is_valid());
        assert_eq!(a.public_key().prefix(), "ED25519");
        assert_eq!(a.public_key().raw_data().unwrap().len(), 32);
    }

    #[test]
    fn test_signing_pair_algostring_roundtrip() {
        let pair = SigningPair::generate();
        let restored =
            SigningPair::from_algostrings(&pair.public_key(), &pair.private_key()).unwrap();

        assert_eq!(pair.public_key(), restored.public_key());
        assert_eq!(pair.private_key(), restored.private_key());
    }

    #[test]
    fn test_signing_pair_rejects_foreign_prefix() {
        let pair = EncryptionPair::generate();
        let err =
            SigningPair::from_algostrings(&pair.public_key(), &pair.private_key()).unwrap_err();
        assert_eq!(err.code(), "UnsupportedEncryptionType");
    }

    #[test]
    fn test_encryption_pair_public_matches_private() {
        let pair = EncryptionPair::generate();

        // The stored public half must be the one derived from the private half
        let secret = StaticSecret::from(
            <[u8; 32]>::try_from(pair.private_key().raw_data().unwrap()).unwrap(),
        );
        let derived = X25519PublicKey::from(&secret);
        assert_eq!(
            pair.public_key().raw_data().unwrap(),
            derived.to_bytes().to_vec()
        );
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();

        let spair = SigningPair::generate();
        let spath = dir.path().join("signing.jk");
        spair.save(&spath).unwrap();
        let sloaded = SigningPair::load(&spath).unwrap();
        assert_eq!(spair.public_key(), sloaded.public_key());
        assert_eq!(spair.private_key(), sloaded.private_key());

        let epair = EncryptionPair::generate();
        let epath = dir.path().join("encryption.jk");
        epair.save(&epath).unwrap();
        let eloaded = EncryptionPair::load(&epath).unwrap();
        assert_eq!(epair.private_key(), eloaded.private_key());

        let skey = SecretKey::generate();
        let kpath = dir.path().join("secret.jk");
        skey.save(&kpath).unwrap();
        let kloaded = SecretKey::load(&kpath).unwrap();
        assert_eq!(skey.key(), kloaded.key());
    }

    #[test]
    fn test_save_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signing.jk");

        SigningPair::generate().save(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = SigningPair::generate().save(&path).unwrap_err();
        assert_eq!(err.code(), "ResourceExists");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_save_rejects_empty_path() {
        let err = SigningPair::generate().save(Path::new("")).unwrap_err();
        assert_eq!(err.code(), "BadParameterValue");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SigningPair::load(&dir.path().join("nope.jk")).unwrap_err();
        assert_eq!(err.code(), "ResourceNotFound");
    }

    #[test]
    fn test_load_rejects_wrong_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encryption.jk");
        EncryptionPair::generate().save(&path).unwrap();

        // An encryptionpair file is not a signingpair
        let err = SigningPair::load(&path).unwrap_err();
        assert_eq!(err.code(), "BadData");
    }

    #[test]
    fn test_load_rejects_truncated_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.jk");
        std::fs::write(
            &path,
            r#"{"type":"secretkey","encryption":"salsa20","key":"abcd"}"#,
        )
        .unwrap();

        let err = SecretKey::load(&path).unwrap_err();
        assert_eq!(err.code(), "BadData");
    }
}
