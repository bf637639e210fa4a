//! # Keycard Core
//!
//! The keycard engine of an end-to-end encrypted messaging platform:
//! issuing, chaining, signing, hashing, and verifying tamper-evident
//! public-key identity records for organizations and users.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       KEYCARD CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  keycard                                                         │  │
//! │  │                                                                  │  │
//! │  │  Entry ── canonical CRLF serialization, multi-level signatures,  │  │
//! │  │           digest, custody chaining                               │  │
//! │  │  Keycard ── append-only entry chain, BEGIN/END ENTRY file form   │  │
//! │  └───────────────┬──────────────────────────────────────────────────┘  │
//! │                  │                                                     │
//! │  ┌───────────────▼───────────────┐  ┌──────────────────────────────┐   │
//! │  │  crypto                       │  │  algostring                  │   │
//! │  │                               │  │                              │   │
//! │  │  SigningPair (Ed25519)        │  │  ALGORITHM:BASE85DATA, the   │   │
//! │  │  EncryptionPair (Curve25519)  │  │  one format for every key,   │   │
//! │  │  SecretKey (XSalsa20)         │  │  signature, and hash inside  │   │
//! │  │  Password (Argon2id)          │  │  an entry                    │   │
//! │  │  hash_data (4 digest algos)   │  │                              │   │
//! │  └───────────────────────────────┘  └──────────────────────────────┘   │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  cardgen ── root card flow: mint keys, persist, sign, hash       │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Trust Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CHAIN OF CUSTODY                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  An entry binds a principal's current public keys to its identity.      │
//! │  Its successor is signed by the predecessor's key (the Custody          │
//! │  signature) and records the predecessor's digest (Previous-Hash),       │
//! │  so holding the chain's newest private keys proves continuity of        │
//! │  control back to the root. Rotation never rewrites history; it          │
//! │  appends.                                                               │
//! │                                                                         │
//! │  Byte discipline is absolute: signatures and hashes are computed        │
//! │  over one canonical CRLF serialization, reproducible bit-for-bit        │
//! │  across implementations. Editing any field invalidates everything       │
//! │  derived from those bytes.                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`algostring`] - The `ALGORITHM:BASE85DATA` tagged value
//! - [`crypto`] - Key material, password hashing, digest dispatch
//! - [`keycard`] - Entries, keycards, and their wire/file formats
//! - [`cardgen`] - Root-card generation flow
//!
//! ## Concurrency
//!
//! The engine is single-threaded and synchronous by design. Entries and
//! keycards are plain values; nothing here blocks, suspends, or spawns.
//! The only I/O is the explicit `save`/`load` on keys and keycards, and
//! the only clock read is `Entry::set_expiration`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod algostring;
pub mod cardgen;
pub mod crypto;
pub mod error;
pub mod keycard;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use algostring::AlgoString;
pub use crypto::{EncryptionPair, Password, PasswordStrength, SecretKey, SigningPair};
pub use error::{Error, Result};
pub use keycard::{Entry, EntryType, KeyBundle, Keycard};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of the keycard engine
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
