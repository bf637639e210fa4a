//! # Keycard Entries
//!
//! The structured, signed, hashed identity record at the heart of the
//! engine, together with its canonical byte serialization.
//!
//! ## Entry Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ENTRY STRUCTURE                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Type:User                                    ◄─ entry type             │
//! │  Index:2                                                                │
//! │  Workspace-ID:4418bf6c-000b-4bb3-...          ◄─ fields, declared order │
//! │  Domain:example.com                                                     │
//! │  Contact-Request-Verification-Key:ED25519:…                             │
//! │  ...                                                                    │
//! │  Custody-Signature:ED25519:…                  ◄─ level 1 (optional)     │
//! │  Organization-Signature:ED25519:…             ◄─ level 2                │
//! │  Previous-Hash:BLAKE3-256:…                   ◄─ level 3 (hash slot)    │
//! │  Hash:BLAKE3-256:…                                                      │
//! │  User-Signature:ED25519:…                     ◄─ level 4 (user only)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Signature Levels
//!
//! Every signature and hash is computed over [`Entry::make_bytestring`]
//! cut at the slot's own level, with the slot's own line left out: a
//! signature never covers itself, and each level seals everything beneath
//! it. This is why any field edit clears all signatures and the hash:
//! they are all derived from those bytes.
//!
//! ```text
//!         fields ◄── Custody ◄── Organization ◄── Hash ◄── User
//!                    (level 1)    (level 2)    (level 3)  (level 4)
//! ```
//!
//! ## Chaining
//!
//! Key rotation mints entry *n+1* from entry *n*: fields copied, `Index`
//! incremented, fresh keypairs written in, and a `Custody` signature made
//! with entry *n*'s signing key. Verifying a whole keycard walks these
//! custody links back to the root.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use ed25519_dalek::{Signature as Ed25519Signature, Signer, SigningKey, Verifier, VerifyingKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::algostring::AlgoString;
use crate::crypto::{hash_data, is_supported_algorithm, EncryptionPair, SigningPair};
use crate::error::{Error, Result};

/// Cutoff value meaning "serialize every signature and hash line"
pub const ALL_SIGNATURES: i64 = -1;

/// Signature-line prefixes the parser recognizes
const SIGNATURE_NAMES: [&str; 4] = ["Custody", "Organization", "User", "Entry"];

// ============================================================================
// TYPE DESCRIPTORS
// ============================================================================

/// What a signature slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// An Ed25519 signature line (`<Name>-Signature:`)
    Signature,
    /// The entry digest (`Previous-Hash:` / `Hash:` lines)
    Hash,
}

/// Descriptor for one signature slot of an entry type
#[derive(Debug, Clone, Copy)]
pub struct SignatureSlot {
    /// Slot name (`Custody`, `Organization`, `Hashes`, `User`)
    pub name: &'static str,
    /// Serialization cutoff level, 1-based
    pub level: i64,
    /// Optional slots may be absent from a compliant entry
    pub optional: bool,
    /// Signature or hash
    pub kind: SlotKind,
}

const ORG_FIELDS: &[&str] = &[
    "Index",
    "Name",
    "Contact-Admin",
    "Contact-Abuse",
    "Contact-Support",
    "Language",
    "Primary-Verification-Key",
    "Secondary-Verification-Key",
    "Encryption-Key",
    "Time-To-Live",
    "Expires",
];

const ORG_REQUIRED: &[&str] = &[
    "Index",
    "Name",
    "Contact-Admin",
    "Primary-Verification-Key",
    "Encryption-Key",
    "Time-To-Live",
    "Expires",
];

const ORG_SLOTS: &[SignatureSlot] = &[
    SignatureSlot { name: "Custody", level: 1, optional: true, kind: SlotKind::Signature },
    SignatureSlot { name: "Organization", level: 2, optional: false, kind: SlotKind::Signature },
    SignatureSlot { name: "Hashes", level: 3, optional: false, kind: SlotKind::Hash },
];

const USER_FIELDS: &[&str] = &[
    "Index",
    "Name",
    "Workspace-ID",
    "User-ID",
    "Domain",
    "Contact-Request-Verification-Key",
    "Contact-Request-Encryption-Key",
    "Public-Encryption-Key",
    "Alternate-Encryption-Key",
    "Time-To-Live",
    "Expires",
];

const USER_REQUIRED: &[&str] = &[
    "Index",
    "Workspace-ID",
    "Domain",
    "Contact-Request-Verification-Key",
    "Contact-Request-Encryption-Key",
    "Public-Encryption-Key",
    "Time-To-Live",
    "Expires",
];

const USER_SLOTS: &[SignatureSlot] = &[
    SignatureSlot { name: "Custody", level: 1, optional: true, kind: SlotKind::Signature },
    SignatureSlot { name: "Organization", level: 2, optional: false, kind: SlotKind::Signature },
    SignatureSlot { name: "Hashes", level: 3, optional: false, kind: SlotKind::Hash },
    SignatureSlot { name: "User", level: 4, optional: false, kind: SlotKind::Signature },
];

/// The two principal types a keycard can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// An organization (a server/domain operator)
    Organization,
    /// A user workspace
    User,
}

impl EntryType {
    /// The wire name (`Organization` / `User`)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Organization => "Organization",
            EntryType::User => "User",
        }
    }

    /// Declared canonical field order for this type
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            EntryType::Organization => ORG_FIELDS,
            EntryType::User => USER_FIELDS,
        }
    }

    /// Fields that must be non-empty for compliance
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            EntryType::Organization => ORG_REQUIRED,
            EntryType::User => USER_REQUIRED,
        }
    }

    /// Ordered signature slot descriptors for this type
    pub fn signature_slots(&self) -> &'static [SignatureSlot] {
        match self {
            EntryType::Organization => ORG_SLOTS,
            EntryType::User => USER_SLOTS,
        }
    }

    fn default_expiration_days(&self) -> i64 {
        match self {
            EntryType::Organization => 365,
            EntryType::User => 90,
        }
    }

    fn default_time_to_live(&self) -> &'static str {
        match self {
            EntryType::Organization => "30",
            EntryType::User => "7",
        }
    }

    /// The field in entry *n−1* holding the key that custody-signs entry *n*
    fn custody_key_field(&self) -> &'static str {
        match self {
            EntryType::Organization => "Primary-Verification-Key",
            EntryType::User => "Contact-Request-Verification-Key",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Organization" => Ok(EntryType::Organization),
            "User" => Ok(EntryType::User),
            _ => Err(Error::UnsupportedKeycardType(s.to_string())),
        }
    }
}

// ============================================================================
// KEY BUNDLE
// ============================================================================

/// A freshly minted keypair handed back from [`Entry::chain`]
///
/// Both halves in tagged form; zeroized on drop. The caller owns
/// persistence of the private half.
#[derive(Clone, Debug, Default, Zeroize, ZeroizeOnDrop)]
pub struct MintedPair {
    /// Public half, as embedded in the new entry where applicable
    pub public: AlgoString,
    /// Private half, never embedded anywhere
    pub private: AlgoString,
}

impl MintedPair {
    fn from_signing(pair: &SigningPair) -> Self {
        Self { public: pair.public_key(), private: pair.private_key() }
    }

    fn from_encryption(pair: &EncryptionPair) -> Self {
        Self { public: pair.public_key(), private: pair.private_key() }
    }
}

/// Every keypair minted during a [`Entry::chain`] call
///
/// Which slots are populated depends on the entry type and on whether
/// optional rotation was requested:
///
/// | Slot       | Organization        | User                       |
/// |------------|---------------------|----------------------------|
/// | `sign`     | always (primary)    | always (primary)           |
/// | `encrypt`  | always              | only with optional rotation|
/// | `crsign`   | never               | always                     |
/// | `crencrypt`| never               | always                     |
/// | `altsign`  | optional rotation   | never                      |
/// | `altencrypt`| never              | only with optional rotation|
#[derive(Clone, Debug, Default, Zeroize, ZeroizeOnDrop)]
pub struct KeyBundle {
    /// New primary signing pair
    pub sign: Option<MintedPair>,
    /// New contact-request signing pair
    pub crsign: Option<MintedPair>,
    /// New contact-request encryption pair
    pub crencrypt: Option<MintedPair>,
    /// New general encryption pair
    pub encrypt: Option<MintedPair>,
    /// New secondary/alternate signing pair
    pub altsign: Option<MintedPair>,
    /// New alternate encryption pair
    pub altencrypt: Option<MintedPair>,
}

// ============================================================================
// ENTRY
// ============================================================================

/// Compute an expiration date string `days` from now (UTC)
fn expiration_date(days: i64) -> String {
    (Utc::now() + Duration::days(days)).format("%Y%m%d").to_string()
}

/// One record in a keycard: a signed, hashed snapshot of a principal's
/// public keys and metadata
///
/// Field storage is a plain map; canonical ordering comes from the type
/// descriptor, so insertion order never matters. All mutation goes through
/// [`Entry::set_field`], which invalidates every signature and the hash;
/// they are derived values and become stale the moment a field changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    entry_type: EntryType,
    fields: HashMap<String, String>,
    signatures: HashMap<String, String>,
    prev_hash: String,
    hash: String,
}

impl Entry {
    /// Create an empty entry of the given type with its defaults:
    /// `Index` 1, the type's `Time-To-Live`, and a default `Expires`
    pub fn new(entry_type: EntryType) -> Self {
        let mut fields = HashMap::new();
        fields.insert("Index".to_string(), "1".to_string());
        fields.insert(
            "Time-To-Live".to_string(),
            entry_type.default_time_to_live().to_string(),
        );
        fields.insert(
            "Expires".to_string(),
            expiration_date(entry_type.default_expiration_days()),
        );
        Self {
            entry_type,
            fields,
            signatures: HashMap::new(),
            prev_hash: String::new(),
            hash: String::new(),
        }
    }

    /// The entry's type
    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Get a field value
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    /// Get a stored signature by slot name
    pub fn signature(&self, slot: &str) -> Option<&str> {
        self.signatures.get(slot).map(|s| s.as_str())
    }

    /// All stored signatures
    pub fn signatures(&self) -> &HashMap<String, String> {
        &self.signatures
    }

    /// The tagged digest of this entry, empty until [`Entry::generate_hash`]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The predecessor's tagged digest, empty for a root entry
    pub fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    /// Set a field value
    ///
    /// Rejects values containing `\r`/`\n`, malformed `Index` and `Expires`
    /// values, and field names that would corrupt the line format. Any
    /// successful edit clears all signatures and the hash; fields a
    /// signature was computed over have changed, so the signature is stale.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        validate_field(name, value).map_err(Error::BadParameterValue)?;

        self.fields.insert(name.to_string(), value.to_string());
        self.signatures.clear();
        self.hash.clear();
        Ok(())
    }

    /// Set several fields at once (same invalidation as [`Entry::set_field`])
    pub fn set_fields(&mut self, pairs: &[(&str, &str)]) -> Result<()> {
        for (name, value) in pairs {
            self.set_field(name, value)?;
        }
        Ok(())
    }

    /// Set the `Expires` field to `days` from now (UTC)
    ///
    /// `None` uses the type default (365 days for organizations, 90 for
    /// users); anything beyond 1095 days is capped there.
    pub fn set_expiration(&mut self, days: Option<i64>) -> Result<()> {
        let days = match days {
            Some(d) if d < 1 => {
                return Err(Error::BadParameterValue(
                    "expiration must be at least one day out".into(),
                ))
            }
            Some(d) => d.min(1095),
            None => self.entry_type.default_expiration_days(),
        };
        self.set_field("Expires", &expiration_date(days))
    }

    // ------------------------------------------------------------------------
    // Canonical serialization
    // ------------------------------------------------------------------------

    /// Serialize to canonical bytes: CRLF line endings, declared field
    /// order, signature lines up to and including `level`
    ///
    /// `-1` (or any value past the last slot level) emits everything; `0`
    /// emits fields only. This is the single source of truth for signature
    /// and hash input; both are computed over these bytes.
    pub fn make_bytestring(&self, level: i64) -> Vec<u8> {
        self.canonical_bytes(level, None)
    }

    /// Canonical serialization with one slot's own line suppressed, so a
    /// signature (or the hash) can be computed and checked over bytes that
    /// do not contain it
    fn canonical_bytes(&self, level: i64, exclude: Option<&str>) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        let mut push_line = |name: &str, value: &str| {
            out.extend_from_slice(name.as_bytes());
            out.push(b':');
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        };

        push_line("Type", self.entry_type.as_str());

        for field in self.entry_type.field_names() {
            if let Some(value) = self.fields.get(*field) {
                if !value.is_empty() {
                    push_line(field, value);
                }
            }
        }

        let slots = self.entry_type.signature_slots();
        let max_level = slots.last().map(|s| s.level).unwrap_or(0);
        let cutoff = if level < 0 || level > max_level { max_level } else { level };

        for slot in slots.iter().filter(|s| s.level <= cutoff) {
            match slot.kind {
                SlotKind::Hash => {
                    if !self.prev_hash.is_empty() {
                        push_line("Previous-Hash", &self.prev_hash);
                    }
                    if exclude != Some(slot.name) && !self.hash.is_empty() {
                        push_line("Hash", &self.hash);
                    }
                }
                SlotKind::Signature => {
                    if exclude == Some(slot.name) {
                        continue;
                    }
                    if let Some(sig) = self.signatures.get(slot.name) {
                        if !sig.is_empty() {
                            push_line(&format!("{}-Signature", slot.name), sig);
                        }
                    }
                }
            }
        }

        out
    }

    // ------------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------------

    /// Replace this entry's contents from serialized bytes
    ///
    /// Only CRLF line endings are legal; a lone `\n` (or stray `\r`) is
    /// `BadData`; it would silently change the bytes signatures were
    /// computed over. The `Type` line must match this entry's type.
    /// Unknown fields are stored but ignored by compliance.
    pub fn set(&mut self, data: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(data)?;

        let mut fields = HashMap::new();
        let mut signatures = HashMap::new();
        let mut prev_hash = String::new();
        let mut hash = String::new();

        for line in text.split("\r\n") {
            if line.is_empty() {
                continue;
            }
            if line.contains('\r') || line.contains('\n') {
                return Err(Error::BadData("bare line ending".into()));
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::BadData(format!("malformed line '{}'", line)))?;

            if name == "Type" {
                if value != self.entry_type.as_str() {
                    return Err(Error::BadData(format!(
                        "expected a {} entry, found {}",
                        self.entry_type, value
                    )));
                }
                continue;
            }
            if name == "Previous-Hash" {
                prev_hash = value.to_string();
                continue;
            }
            if name == "Hash" {
                hash = value.to_string();
                continue;
            }
            if let Some(prefix) = name.strip_suffix("-Signature") {
                if SIGNATURE_NAMES.contains(&prefix) {
                    signatures.insert(prefix.to_string(), value.to_string());
                    continue;
                }
            }

            validate_field(name, value).map_err(Error::BadData)?;
            fields.insert(name.to_string(), value.to_string());
        }

        self.fields = fields;
        self.signatures = signatures;
        self.prev_hash = prev_hash;
        self.hash = hash;
        Ok(())
    }

    /// Parse serialized bytes into a fresh entry of the given type
    pub fn from_bytes(entry_type: EntryType, data: &[u8]) -> Result<Self> {
        let mut entry = Self {
            entry_type,
            fields: HashMap::new(),
            signatures: HashMap::new(),
            prev_hash: String::new(),
            hash: String::new(),
        };
        entry.set(data)?;
        Ok(entry)
    }

    // ------------------------------------------------------------------------
    // Compliance
    // ------------------------------------------------------------------------

    /// Check that every required field, signature, and the hash are present
    ///
    /// Returns the first violation: `RequiredFieldMissing` with the field
    /// name, or `SignatureMissing` with the slot name. An optional slot
    /// that is present but empty also fails.
    pub fn is_compliant(&self) -> Result<()> {
        for field in self.entry_type.required_fields() {
            match self.fields.get(*field) {
                Some(value) if !value.is_empty() => {}
                _ => return Err(Error::RequiredFieldMissing(field.to_string())),
            }
        }

        for slot in self.entry_type.signature_slots() {
            match slot.kind {
                SlotKind::Hash => {
                    if self.hash.is_empty() && !slot.optional {
                        return Err(Error::SignatureMissing(slot.name.to_string()));
                    }
                }
                SlotKind::Signature => match self.signatures.get(slot.name) {
                    Some(value) if value.is_empty() => {
                        return Err(Error::SignatureMissing(slot.name.to_string()))
                    }
                    Some(_) => {}
                    None if !slot.optional => {
                        return Err(Error::SignatureMissing(slot.name.to_string()))
                    }
                    None => {}
                },
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Signing and verification
    // ------------------------------------------------------------------------

    fn slot(&self, name: &str) -> Result<(usize, &'static SignatureSlot)> {
        self.entry_type
            .signature_slots()
            .iter()
            .enumerate()
            .find(|(_, s)| s.name == name)
            .ok_or_else(|| Error::BadParameterValue(format!("unknown signature slot '{}'", name)))
    }

    /// Clear every slot at position > `index`; their inputs just changed
    fn clear_slots_after(&mut self, index: usize) {
        for slot in &self.entry_type.signature_slots()[index + 1..] {
            match slot.kind {
                SlotKind::Hash => self.hash.clear(),
                SlotKind::Signature => {
                    self.signatures.remove(slot.name);
                }
            }
        }
    }

    /// Sign the entry at the named slot with an Ed25519 private key
    ///
    /// The signature covers [`Entry::make_bytestring`] cut at the slot's
    /// level, minus the slot's own line. Everything downstream of the slot
    /// is cleared first; those values covered bytes that no longer exist.
    pub fn sign(&mut self, key: &AlgoString, slot_name: &str) -> Result<()> {
        if key.prefix() != "ED25519" {
            return Err(Error::UnsupportedEncryptionType(key.prefix().to_string()));
        }
        let (index, slot) = self.slot(slot_name)?;
        if slot.kind == SlotKind::Hash {
            return Err(Error::BadParameterValue(format!(
                "'{}' holds a hash, not a signature",
                slot_name
            )));
        }

        let seed: [u8; 32] = key
            .raw_data()?
            .try_into()
            .map_err(|_| Error::BadData("signing key is not 32 bytes".into()))?;
        let signing_key = SigningKey::from_bytes(&seed);

        self.clear_slots_after(index);
        let data = self.canonical_bytes(slot.level, Some(slot.name));
        let signature = signing_key.sign(&data);
        self.signatures.insert(
            slot.name.to_string(),
            AlgoString::from_raw("ED25519", &signature.to_bytes()).to_string(),
        );
        Ok(())
    }

    /// Verify the signature stored at the named slot against a public key
    ///
    /// The exact inverse of [`Entry::sign`]: same serialization cut, same
    /// self-exclusion. Any cryptographic failure is `InvalidKeycard`.
    pub fn verify_signature(&self, verify_key: &AlgoString, slot_name: &str) -> Result<()> {
        if verify_key.prefix() != "ED25519" {
            return Err(Error::UnsupportedEncryptionType(
                verify_key.prefix().to_string(),
            ));
        }
        let (_, slot) = self.slot(slot_name)?;
        if slot.kind == SlotKind::Hash {
            return Err(Error::BadParameterValue(format!(
                "'{}' holds a hash, not a signature",
                slot_name
            )));
        }

        let stored = match self.signatures.get(slot.name) {
            None => return Err(Error::SignatureMissing(slot.name.to_string())),
            Some(value) if value.is_empty() => {
                return Err(Error::NotCompliant(format!("empty {} signature", slot.name)))
            }
            Some(value) => value,
        };

        let sig_bytes: [u8; 64] = AlgoString::parse(stored)?
            .raw_data()?
            .try_into()
            .map_err(|_| Error::BadData(format!("{} signature is not 64 bytes", slot.name)))?;
        let key_bytes: [u8; 32] = verify_key
            .raw_data()?
            .try_into()
            .map_err(|_| Error::BadData("verification key is not 32 bytes".into()))?;
        let key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| Error::BadData(format!("unusable verification key: {}", e)))?;

        let data = self.canonical_bytes(slot.level, Some(slot.name));
        key.verify(&data, &Ed25519Signature::from_bytes(&sig_bytes))
            .map_err(|_| {
                Error::InvalidKeycard(format!("{} signature verification failure", slot.name))
            })
    }

    // ------------------------------------------------------------------------
    // Hashing
    // ------------------------------------------------------------------------

    fn hash_slot(&self) -> Result<(usize, &'static SignatureSlot)> {
        // Both descriptor tables carry exactly one hash slot
        self.entry_type
            .signature_slots()
            .iter()
            .enumerate()
            .find(|(_, s)| s.kind == SlotKind::Hash)
            .ok_or_else(|| Error::InternalError("descriptor table lacks a hash slot".into()))
    }

    /// Compute and store the entry digest with the named algorithm
    ///
    /// The digest covers everything up to the hash slot, including
    /// `Previous-Hash`, which is what chains each entry to its
    /// predecessor's content. Slots after the hash are cleared.
    pub fn generate_hash(&mut self, algorithm: &str) -> Result<()> {
        if !is_supported_algorithm(algorithm) {
            return Err(Error::UnsupportedHashType(algorithm.to_string()));
        }
        let (index, slot) = self.hash_slot()?;
        self.hash.clear();
        self.clear_slots_after(index);

        let data = self.canonical_bytes(slot.level, Some(slot.name));
        self.hash = hash_data(algorithm, &data)?.to_string();
        Ok(())
    }

    /// Recompute the digest and compare it with the stored one
    ///
    /// The algorithm is taken from the stored hash's own prefix.
    pub fn verify_hash(&self) -> Result<()> {
        if self.hash.is_empty() {
            return Err(Error::SignatureMissing("Hashes".into()));
        }
        let stored = AlgoString::parse(&self.hash)?;
        if !is_supported_algorithm(stored.prefix()) {
            return Err(Error::UnsupportedHashType(stored.prefix().to_string()));
        }

        let (_, slot) = self.hash_slot()?;
        let data = self.canonical_bytes(slot.level, Some(slot.name));
        let computed = hash_data(stored.prefix(), &data)?;
        if computed.to_string() != self.hash {
            return Err(Error::InvalidKeycard("entry hash verification failure".into()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Chaining
    // ------------------------------------------------------------------------

    fn index(&self) -> Result<u64> {
        self.fields
            .get("Index")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|i| *i >= 1)
            .ok_or_else(|| Error::BadData("unparseable entry index".into()))
    }

    /// Mint the successor entry: key rotation with proof of custody
    ///
    /// Copies every field, increments `Index`, links `prev_hash` to this
    /// entry's hash, writes freshly generated public keys into the
    /// key fields, and custody-signs the result with `prev_signing_key`:
    /// this entry's primary signing key (organizations) or
    /// contact-request signing key (users).
    ///
    /// With `rotate_optional`, organizations also roll the secondary
    /// verification key and users roll both encryption keys; otherwise the
    /// outgoing org primary demotes to secondary and user encryption keys
    /// carry over.
    ///
    /// Returns the new entry plus the [`KeyBundle`] of minted keypairs.
    /// The caller must persist the private halves, then org-sign, re-hash,
    /// and (for users) user-sign the new entry before it is compliant.
    pub fn chain(
        &self,
        prev_signing_key: &AlgoString,
        rotate_optional: bool,
    ) -> Result<(Entry, KeyBundle)> {
        if self.hash.is_empty() {
            return Err(Error::SignatureMissing("Hashes".into()));
        }
        let index = self.index()?;

        let mut entry = Entry {
            entry_type: self.entry_type,
            fields: self.fields.clone(),
            signatures: HashMap::new(),
            prev_hash: self.hash.clone(),
            hash: String::new(),
        };
        entry.set_field("Index", &(index + 1).to_string())?;

        let mut bundle = KeyBundle::default();
        match self.entry_type {
            EntryType::Organization => {
                let sign = SigningPair::generate();
                let encrypt = EncryptionPair::generate();

                if rotate_optional {
                    let altsign = SigningPair::generate();
                    entry.set_field(
                        "Secondary-Verification-Key",
                        &altsign.public_key().to_string(),
                    )?;
                    bundle.altsign = Some(MintedPair::from_signing(&altsign));
                } else {
                    // The outgoing primary demotes to secondary
                    let outgoing = self
                        .fields
                        .get("Primary-Verification-Key")
                        .filter(|v| !v.is_empty())
                        .cloned()
                        .ok_or_else(|| {
                            Error::RequiredFieldMissing("Primary-Verification-Key".into())
                        })?;
                    entry.set_field("Secondary-Verification-Key", &outgoing)?;
                }

                entry.set_field("Primary-Verification-Key", &sign.public_key().to_string())?;
                entry.set_field("Encryption-Key", &encrypt.public_key().to_string())?;
                bundle.sign = Some(MintedPair::from_signing(&sign));
                bundle.encrypt = Some(MintedPair::from_encryption(&encrypt));
            }
            EntryType::User => {
                let sign = SigningPair::generate();
                let crsign = SigningPair::generate();
                let crencrypt = EncryptionPair::generate();

                entry.set_field(
                    "Contact-Request-Verification-Key",
                    &crsign.public_key().to_string(),
                )?;
                entry.set_field(
                    "Contact-Request-Encryption-Key",
                    &crencrypt.public_key().to_string(),
                )?;
                bundle.sign = Some(MintedPair::from_signing(&sign));
                bundle.crsign = Some(MintedPair::from_signing(&crsign));
                bundle.crencrypt = Some(MintedPair::from_encryption(&crencrypt));

                if rotate_optional {
                    let encrypt = EncryptionPair::generate();
                    let altencrypt = EncryptionPair::generate();
                    entry.set_field(
                        "Public-Encryption-Key",
                        &encrypt.public_key().to_string(),
                    )?;
                    entry.set_field(
                        "Alternate-Encryption-Key",
                        &altencrypt.public_key().to_string(),
                    )?;
                    bundle.encrypt = Some(MintedPair::from_encryption(&encrypt));
                    bundle.altencrypt = Some(MintedPair::from_encryption(&altencrypt));
                }
            }
        }

        entry.sign(prev_signing_key, "Custody")?;
        Ok((entry, bundle))
    }

    /// Verify that this entry is the legitimate successor of `prev`
    ///
    /// Checks type, index continuity, hash linkage, and the custody
    /// signature against the predecessor's primary (organizations) or
    /// contact-request (users) verification key.
    pub fn verify_chain(&self, prev: &Entry) -> Result<()> {
        if self.entry_type != prev.entry_type {
            return Err(Error::InvalidKeycard("entry type mismatch".into()));
        }

        // Index continuity comes first: a broken sequence is a broken
        // chain no matter what the signatures say.
        let index_failure = || Error::InvalidKeycard("entry index compliance failure".into());
        let prev_index = prev.index().map_err(|_| index_failure())?;
        let index = self.index().map_err(|_| index_failure())?;
        if index != prev_index + 1 {
            return Err(index_failure());
        }

        let key_field = self.entry_type.custody_key_field();
        let prev_key = prev
            .fields
            .get(key_field)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::RequiredFieldMissing(key_field.to_string()))?;
        let prev_key = AlgoString::parse(prev_key)?;

        if !self.signatures.contains_key("Custody") {
            return Err(Error::SignatureMissing("Custody".into()));
        }

        if !prev.hash.is_empty() && self.prev_hash != prev.hash {
            return Err(Error::InvalidKeycard("entry hash chain failure".into()));
        }

        self.verify_signature(&prev_key, "Custody")
    }
}

/// Producer-side line discipline: no line breaks, no malformed names, and
/// format checks for the two structured fields
fn validate_field(name: &str, value: &str) -> std::result::Result<(), String> {
    if name.is_empty() || name.contains(':') || name.contains('\r') || name.contains('\n') {
        return Err(format!("invalid field name '{}'", name));
    }
    if value.contains('\r') || value.contains('\n') {
        return Err(format!("field {} value contains a line break", name));
    }
    match name {
        "Index" => {
            if value.parse::<u64>().map_or(true, |i| i < 1) {
                return Err("index must be a positive decimal integer".into());
            }
        }
        "Expires" => {
            if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err("expiration dates use the form YYYYMMDD".into());
            }
        }
        _ => {}
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
