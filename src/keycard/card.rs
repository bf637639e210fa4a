//! # Keycards
//!
//! The append-only chain of entries for one principal, plus its file form.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KEYCARD LIFECYCLE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Keycard::new(type) ──► add_root(entry) ──► chain() ──► chain() ──► …   │
//! │         │                                                               │
//! │         └── or Keycard::load(path)                                      │
//! │                                                                         │
//! │  Entries only ever accumulate. Revocation is modeled as rotation:       │
//! │  a compromised key is superseded by chaining a new entry, never by      │
//! │  rewriting history.                                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## File Format
//!
//! ```text
//! ----- BEGIN ENTRY -----\r\n
//! <entry bytes, all signatures and hash included>
//! ----- END ENTRY -----\r\n
//! ----- BEGIN ENTRY -----\r\n
//! ...
//! ```
//!
//! Frame markers sit on their own lines with exactly that spelling. All
//! entries in one file share a type; a mixed file is rejected outright.

use std::path::Path;

use crate::algostring::AlgoString;
use crate::error::{Error, Result};
use crate::keycard::entry::{Entry, EntryType, KeyBundle, ALL_SIGNATURES};

/// Opening frame marker, on its own line
const BEGIN_ENTRY: &str = "----- BEGIN ENTRY -----";

/// Closing frame marker, on its own line
const END_ENTRY: &str = "----- END ENTRY -----";

/// The complete, ordered entry history for one organization or user
///
/// The first entry is the root: no custody signature, no previous hash.
/// Every later entry arrives through [`Keycard::chain`], so the list is a
/// custody chain by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keycard {
    card_type: EntryType,
    entries: Vec<Entry>,
}

impl Keycard {
    /// Create an empty keycard for the given principal type
    pub fn new(card_type: EntryType) -> Self {
        Self {
            card_type,
            entries: Vec::new(),
        }
    }

    /// The principal type all entries share
    pub fn card_type(&self) -> EntryType {
        self.card_type
    }

    /// All entries, root first
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the card holds no entries yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The root entry, if any
    pub fn root(&self) -> Option<&Entry> {
        self.entries.first()
    }

    /// The newest entry, if any
    pub fn current(&self) -> Option<&Entry> {
        self.entries.last()
    }

    /// Mutable access to the newest entry
    ///
    /// Needed after [`Keycard::chain`]: the caller still has to org-sign,
    /// re-hash, and (for users) re-sign the fresh entry. Entry methods keep
    /// the invalidation invariants, so this cannot corrupt the chain
    /// silently; at worst the next [`Keycard::verify`] reports it.
    pub fn current_mut(&mut self) -> Option<&mut Entry> {
        self.entries.last_mut()
    }

    /// Install the root entry of a fresh card
    ///
    /// Fails with `ResourceExists` once the card has any entry; later
    /// growth happens only through [`Keycard::chain`].
    pub fn add_root(&mut self, entry: Entry) -> Result<()> {
        if !self.entries.is_empty() {
            return Err(Error::ResourceExists("keycard already has a root".into()));
        }
        self.append(entry)
    }

    /// The one place entries enter the list
    fn append(&mut self, entry: Entry) -> Result<()> {
        if entry.entry_type() != self.card_type {
            return Err(Error::BadParameterValue(format!(
                "cannot add a {} entry to a {} keycard",
                entry.entry_type(),
                self.card_type
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Rotate keys: chain a new entry onto the newest one
    ///
    /// Delegates to [`Entry::chain`] with `sign_key` (the newest entry's
    /// primary or contact-request signing key) and appends the result. For
    /// user cards the new entry is also signed at the terminal `User` slot
    /// with the freshly minted primary; organization cards are signed by
    /// the organization externally.
    ///
    /// Returns the bundle of minted keypairs; persisting the private
    /// halves is the caller's responsibility.
    pub fn chain(&mut self, sign_key: &AlgoString, rotate_optional: bool) -> Result<KeyBundle> {
        let last = self
            .entries
            .last()
            .ok_or_else(|| Error::ResourceNotFound("keycard is empty".into()))?;

        let (mut entry, bundle) = last.chain(sign_key, rotate_optional)?;

        if self.card_type == EntryType::User {
            let primary = bundle
                .sign
                .as_ref()
                .ok_or_else(|| Error::InternalError("chain minted no primary key".into()))?;
            entry.sign(&primary.private, "User")?;
        }

        self.append(entry)?;
        Ok(bundle)
    }

    /// Verify the whole custody chain
    ///
    /// An empty card is `ResourceNotFound`. A single root passes; there
    /// is no chain to check yet. Otherwise every consecutive pair must
    /// satisfy [`Entry::verify_chain`].
    pub fn verify(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(Error::ResourceNotFound("keycard is empty".into()));
        }
        for pair in self.entries.windows(2) {
            pair[1].verify_chain(&pair[0])?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Write the card to a file as framed entries
    ///
    /// Refuses an existing target unless `clobber` is set.
    pub fn save(&self, path: &Path, clobber: bool) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::BadParameterValue("empty path".into()));
        }
        if self.entries.is_empty() {
            return Err(Error::ResourceNotFound("keycard is empty".into()));
        }
        if path.exists() && !clobber {
            return Err(Error::ResourceExists(path.display().to_string()));
        }

        let mut out: Vec<u8> = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(BEGIN_ENTRY.as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&entry.make_bytestring(ALL_SIGNATURES));
            out.extend_from_slice(END_ENTRY.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        std::fs::write(path, out)?;
        tracing::info!(
            path = %path.display(),
            entries = self.entries.len(),
            "saved keycard"
        );
        Ok(())
    }

    /// Load a card from a framed-entry file
    ///
    /// Strict about structure: CRLF line endings only, no content outside
    /// frames, no nesting, no unterminated entry, no mixed entry types.
    pub fn load(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(Error::BadParameterValue("empty path".into()));
        }
        if !path.exists() {
            return Err(Error::ResourceNotFound(path.display().to_string()));
        }
        let raw = std::fs::read(path)?;
        let text = String::from_utf8(raw).map_err(|e| Error::BadData(e.to_string()))?;

        let mut card_type: Option<EntryType> = None;
        let mut entries: Vec<Entry> = Vec::new();
        let mut in_entry = false;
        let mut buffer: Vec<&str> = Vec::new();

        for line in text.split("\r\n") {
            match line {
                BEGIN_ENTRY => {
                    if in_entry {
                        return Err(Error::BadData("nested entry frame".into()));
                    }
                    in_entry = true;
                    buffer.clear();
                }
                END_ENTRY => {
                    if !in_entry {
                        return Err(Error::BadData("unopened entry frame".into()));
                    }
                    in_entry = false;

                    let type_name = buffer
                        .iter()
                        .find_map(|l| l.strip_prefix("Type:"))
                        .ok_or_else(|| Error::BadData("entry without a Type line".into()))?;
                    let entry_type: EntryType = type_name.parse()?;
                    match card_type {
                        None => card_type = Some(entry_type),
                        Some(t) if t != entry_type => {
                            return Err(Error::BadData("mixed entry types in keycard".into()))
                        }
                        Some(_) => {}
                    }

                    let mut data = buffer.join("\r\n");
                    data.push_str("\r\n");
                    entries.push(Entry::from_bytes(entry_type, data.as_bytes())?);
                }
                _ if in_entry => buffer.push(line),
                "" => {}
                _ => return Err(Error::BadData("content outside entry frame".into())),
            }
        }

        if in_entry {
            return Err(Error::BadData("unterminated entry frame".into()));
        }
        let card_type =
            card_type.ok_or_else(|| Error::BadData("no entries in keycard file".into()))?;

        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            "loaded keycard"
        );
        Ok(Self { card_type, entries })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{EncryptionPair, SigningPair};

    /// A compliant org root plus its primary signing pair
    fn org_root() -> (Entry, SigningPair) {
        let sign = SigningPair::generate();
        let encrypt = EncryptionPair::generate();

        let mut entry = Entry::new(EntryType::Organization);
        entry
            .set_fields(&[
                ("Name", "Example, Inc."),
                ("Contact-Admin", "admin/example.com"),
                ("Primary-Verification-Key", &sign.public_key().to_string()),
                ("Encryption-Key", &encrypt.public_key().to_string()),
            ])
            .unwrap();
        entry.sign(&sign.private_key(), "Organization").unwrap();
        entry.generate_hash("BLAKE3-256").unwrap();
        (entry, sign)
    }

    /// A hashed user root plus its contact-request signing pair
    fn user_root() -> (Entry, SigningPair) {
        let crsign = SigningPair::generate();
        let crencrypt = EncryptionPair::generate();
        let encrypt = EncryptionPair::generate();

        let mut entry = Entry::new(EntryType::User);
        entry
            .set_fields(&[
                ("Workspace-ID", "4418bf6c-000b-4bb3-8111-316e72030468"),
                ("Domain", "example.com"),
                (
                    "Contact-Request-Verification-Key",
                    &crsign.public_key().to_string(),
                ),
                (
                    "Contact-Request-Encryption-Key",
                    &crencrypt.public_key().to_string(),
                ),
                ("Public-Encryption-Key", &encrypt.public_key().to_string()),
            ])
            .unwrap();
        entry.generate_hash("BLAKE3-256").unwrap();
        (entry, crsign)
    }

    #[test]
    fn test_add_root_once() {
        let (root, _) = org_root();
        let mut card = Keycard::new(EntryType::Organization);

        card.add_root(root.clone()).unwrap();
        assert_eq!(card.len(), 1);

        let err = card.add_root(root).unwrap_err();
        assert_eq!(err.code(), "ResourceExists");
    }

    #[test]
    fn test_add_root_type_mismatch() {
        let (root, _) = org_root();
        let mut card = Keycard::new(EntryType::User);
        assert_eq!(
            card.add_root(root).unwrap_err().code(),
            "BadParameterValue"
        );
    }

    #[test]
    fn test_verify_empty_card() {
        let card = Keycard::new(EntryType::Organization);
        assert_eq!(card.verify().unwrap_err().code(), "ResourceNotFound");
    }

    #[test]
    fn test_single_root_verifies() {
        let (root, _) = org_root();
        let mut card = Keycard::new(EntryType::Organization);
        card.add_root(root).unwrap();
        card.verify().unwrap();
    }

    #[test]
    fn test_chain_on_empty_card() {
        let mut card = Keycard::new(EntryType::Organization);
        let key = SigningPair::generate().private_key();
        assert_eq!(
            card.chain(&key, true).unwrap_err().code(),
            "ResourceNotFound"
        );
    }

    #[test]
    fn test_org_chain_and_verify() {
        let (root, sign) = org_root();
        let mut card = Keycard::new(EntryType::Organization);
        card.add_root(root).unwrap();

        let bundle = card.chain(&sign.private_key(), true).unwrap();
        assert_eq!(card.len(), 2);
        assert_eq!(card.current().unwrap().field("Index"), Some("2"));

        // Finish the rotation the way the organization does: sign with the
        // new primary and re-hash
        let new_primary = bundle.sign.as_ref().unwrap();
        let entry = card.current_mut().unwrap();
        entry.sign(&new_primary.private, "Organization").unwrap();
        entry.generate_hash("BLAKE3-256").unwrap();
        entry.is_compliant().unwrap();

        card.verify().unwrap();
    }

    #[test]
    fn test_user_chain_terminal_signature() {
        let (root, crsign) = user_root();
        let mut card = Keycard::new(EntryType::User);
        card.add_root(root).unwrap();

        let org_sign = SigningPair::generate();
        let bundle = card.chain(&crsign.private_key(), false).unwrap();

        // chain() already user-signed the new entry with the minted primary
        assert!(card.current().unwrap().signature("User").is_some());

        // The full re-signing pass: organization, hash, user, in order
        let primary = bundle.sign.as_ref().unwrap();
        let entry = card.current_mut().unwrap();
        entry.sign(&org_sign.private_key(), "Organization").unwrap();
        entry.generate_hash("BLAKE3-256").unwrap();
        entry.sign(&primary.private, "User").unwrap();
        entry.is_compliant().unwrap();

        card.verify().unwrap();
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("org.kc");

        let (root, sign) = org_root();
        let mut card = Keycard::new(EntryType::Organization);
        card.add_root(root).unwrap();
        let bundle = card.chain(&sign.private_key(), false).unwrap();
        let new_primary = bundle.sign.as_ref().unwrap();
        let entry = card.current_mut().unwrap();
        entry.sign(&new_primary.private, "Organization").unwrap();
        entry.generate_hash("BLAKE3-256").unwrap();

        card.save(&path, false).unwrap();
        let loaded = Keycard::load(&path).unwrap();

        assert_eq!(loaded, card);
        loaded.verify().unwrap();
    }

    #[test]
    fn test_save_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("org.kc");

        let (root, _) = org_root();
        let mut card = Keycard::new(EntryType::Organization);
        card.add_root(root).unwrap();

        card.save(&path, false).unwrap();
        let before = std::fs::read(&path).unwrap();

        assert_eq!(card.save(&path, false).unwrap_err().code(), "ResourceExists");
        assert_eq!(std::fs::read(&path).unwrap(), before);

        // Explicit opt-in clobbers
        card.save(&path, true).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Keycard::load(&dir.path().join("nope.kc")).unwrap_err();
        assert_eq!(err.code(), "ResourceNotFound");
    }

    #[test]
    fn test_load_rejects_mixed_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.kc");

        let (org, _) = org_root();
        let (user, _) = user_root();
        let mut data = Vec::new();
        for entry in [org.make_bytestring(ALL_SIGNATURES), user.make_bytestring(ALL_SIGNATURES)] {
            data.extend_from_slice(b"----- BEGIN ENTRY -----\r\n");
            data.extend_from_slice(&entry);
            data.extend_from_slice(b"----- END ENTRY -----\r\n");
        }
        std::fs::write(&path, data).unwrap();

        let err = Keycard::load(&path).unwrap_err();
        assert_eq!(err.code(), "BadData");
    }

    #[test]
    fn test_load_rejects_stray_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stray.kc");
        std::fs::write(&path, b"Type:Organization\r\n").unwrap();
        assert_eq!(Keycard::load(&path).unwrap_err().code(), "BadData");
    }

    #[test]
    fn test_load_rejects_unterminated_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("torn.kc");
        std::fs::write(&path, b"----- BEGIN ENTRY -----\r\nType:Organization\r\n").unwrap();
        assert_eq!(Keycard::load(&path).unwrap_err().code(), "BadData");
    }
}
