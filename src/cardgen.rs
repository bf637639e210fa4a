//! # Root Card Generation
//!
//! The "make keycard" flow: mint the key material for a brand-new
//! principal, persist it, and build the signed, hashed root entry.
//!
//! ## Organization Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   ROOT ORGANIZATION CARD                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Mint keys        signing pair + encryption pair                     │
//! │  2. Persist keys     org_signing_keypair.jk / org_encryption_keypair.jk │
//! │  3. Build entry      caller fields + tagged public keys                 │
//! │  4. Self-sign        Organization-Signature with the new signing key    │
//! │  5. Hash             BLAKE3-256 over everything below the hash slot     │
//! │  6. Persist card     org.kc                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The user flow mints four pairs (primary signing, public encryption,
//! contact-request signing, contact-request encryption) and needs the
//! organization's signing key, because a user root is organization-signed
//! before it is hashed and user-signed.
//!
//! Interactive prompting lives in the shell, not here: this module takes
//! already-validated field values and a directory.

use std::path::Path;

use crate::algostring::AlgoString;
use crate::crypto::{EncryptionPair, SigningPair};
use crate::error::{Error, Result};
use crate::keycard::{Entry, EntryType, Keycard};

/// Digest algorithm used for freshly generated cards
pub const DEFAULT_HASH_ALGORITHM: &str = "BLAKE3-256";

/// The target must exist and be a directory
fn check_output_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || !dir.exists() {
        return Err(Error::BadParameterValue(format!(
            "output directory '{}' does not exist",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(Error::BadParameterValue(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }
    Ok(())
}

/// Generate a root organization keycard and its key files
///
/// `fields` holds validated entry fields (`Name`, `Contact-Admin`, and so
/// on). The minted signing and encryption pairs land in
/// `org_signing_keypair.jk` and `org_encryption_keypair.jk`, the card in
/// `org.kc`, all in `dir`, all refusing to overwrite. Returns the card.
pub fn generate_org_card(fields: &[(&str, &str)], dir: &Path) -> Result<Keycard> {
    check_output_dir(dir)?;

    let skey = SigningPair::generate();
    let ekey = EncryptionPair::generate();
    skey.save(&dir.join("org_signing_keypair.jk"))?;
    ekey.save(&dir.join("org_encryption_keypair.jk"))?;
    tracing::info!(dir = %dir.display(), "minted and saved organization keys");

    let mut entry = Entry::new(EntryType::Organization);
    entry.set_fields(fields)?;
    entry.set_field(
        "Primary-Verification-Key",
        &skey.public_key().to_string(),
    )?;
    entry.set_field("Encryption-Key", &ekey.public_key().to_string())?;

    entry.sign(&skey.private_key(), "Organization")?;
    entry.generate_hash(DEFAULT_HASH_ALGORITHM)?;
    entry.is_compliant()?;

    let mut card = Keycard::new(EntryType::Organization);
    card.add_root(entry)?;
    card.save(&dir.join("org.kc"), false)?;
    tracing::info!(dir = %dir.display(), "generated root organization card");
    Ok(card)
}

/// Generate a root user keycard and its key files
///
/// Mints the user's primary signing, public encryption, contact-request
/// signing, and contact-request encryption pairs and saves them as
/// `user_*_keypair.jk` in `dir`. A `Workspace-ID` is generated when
/// `fields` does not carry one. The entry is organization-signed with
/// `org_signing_key`, hashed, then user-signed, and the card lands in
/// `user.kc`. Returns the card.
pub fn generate_user_card(
    fields: &[(&str, &str)],
    org_signing_key: &AlgoString,
    dir: &Path,
) -> Result<Keycard> {
    check_output_dir(dir)?;

    let skey = SigningPair::generate();
    let ekey = EncryptionPair::generate();
    let crskey = SigningPair::generate();
    let crekey = EncryptionPair::generate();
    skey.save(&dir.join("user_signing_keypair.jk"))?;
    ekey.save(&dir.join("user_encryption_keypair.jk"))?;
    crskey.save(&dir.join("user_crsigning_keypair.jk"))?;
    crekey.save(&dir.join("user_crencryption_keypair.jk"))?;
    tracing::info!(dir = %dir.display(), "minted and saved user keys");

    let mut entry = Entry::new(EntryType::User);
    entry.set_fields(fields)?;
    if entry.field("Workspace-ID").map_or(true, |v| v.is_empty()) {
        entry.set_field("Workspace-ID", &uuid::Uuid::new_v4().to_string())?;
    }
    entry.set_fields(&[
        (
            "Contact-Request-Verification-Key",
            &crskey.public_key().to_string(),
        ),
        (
            "Contact-Request-Encryption-Key",
            &crekey.public_key().to_string(),
        ),
        ("Public-Encryption-Key", &ekey.public_key().to_string()),
    ])?;

    entry.sign(org_signing_key, "Organization")?;
    entry.generate_hash(DEFAULT_HASH_ALGORITHM)?;
    entry.sign(&skey.private_key(), "User")?;
    entry.is_compliant()?;

    let mut card = Keycard::new(EntryType::User);
    card.add_root(entry)?;
    card.save(&dir.join("user.kc"), false)?;
    tracing::info!(dir = %dir.display(), "generated root user card");
    Ok(card)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ORG_FIELDS: &[(&str, &str)] = &[
        ("Name", "Acme, Inc."),
        ("Contact-Admin", "admin/acme.com"),
        ("Language", "en"),
    ];

    #[test]
    fn test_generate_org_card() {
        let dir = tempfile::tempdir().unwrap();

        let card = generate_org_card(ORG_FIELDS, dir.path()).unwrap();
        assert_eq!(card.len(), 1);

        let root = card.root().unwrap();
        root.is_compliant().unwrap();
        root.verify_hash().unwrap();

        // The persisted signing key must verify the self-signature
        let skey = SigningPair::load(&dir.path().join("org_signing_keypair.jk")).unwrap();
        root.verify_signature(&skey.public_key(), "Organization")
            .unwrap();
        assert_eq!(
            root.field("Primary-Verification-Key").unwrap(),
            skey.public_key().to_string()
        );

        // And the card file round-trips
        let loaded = Keycard::load(&dir.path().join("org.kc")).unwrap();
        assert_eq!(loaded, card);
    }

    #[test]
    fn test_generate_user_card() {
        let dir = tempfile::tempdir().unwrap();

        let org_skey = SigningPair::generate();
        let card = generate_user_card(
            &[("User-ID", "csmith"), ("Domain", "example.com")],
            &org_skey.private_key(),
            dir.path(),
        )
        .unwrap();

        let root = card.root().unwrap();
        root.is_compliant().unwrap();
        root.verify_hash().unwrap();
        root.verify_signature(&org_skey.public_key(), "Organization")
            .unwrap();

        // Workspace-ID was generated
        assert!(!root.field("Workspace-ID").unwrap().is_empty());

        let skey = SigningPair::load(&dir.path().join("user_signing_keypair.jk")).unwrap();
        root.verify_signature(&skey.public_key(), "User").unwrap();
    }

    #[test]
    fn test_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = generate_org_card(ORG_FIELDS, &missing).unwrap_err();
        assert_eq!(err.code(), "BadParameterValue");
    }

    #[test]
    fn test_refuses_to_overwrite_keys() {
        let dir = tempfile::tempdir().unwrap();

        generate_org_card(ORG_FIELDS, dir.path()).unwrap();
        // Same directory again: the existing key files stop the run
        let err = generate_org_card(ORG_FIELDS, dir.path()).unwrap_err();
        assert_eq!(err.code(), "ResourceExists");
    }
}
