//! # Cryptography Module
//!
//! Key material, password hashing, and digest dispatch for the keycard
//! engine.
//!
//! ## Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC BUILDING BLOCKS                        │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐         │
//! │  │  SigningPair    │  │ EncryptionPair  │  │   SecretKey     │         │
//! │  │  (Ed25519)      │  │ (Curve25519)    │  │ (XSalsa20-256)  │         │
//! │  │                 │  │                 │  │                 │         │
//! │  │ • Entry sigs    │  │ • Published KX  │  │ • Profile-layer │         │
//! │  │ • Custody chain │  │   material      │  │   symmetric key │         │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘         │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌──────────────────────────────────────┐         │
//! │  │   Password      │  │  hash_data()                         │         │
//! │  │  (Argon2id)     │  │  BLAKE3-256 / BLAKE2B-256 /          │         │
//! │  │                 │  │  SHA-256 / SHA3-256                  │         │
//! │  └─────────────────┘  └──────────────────────────────────────┘         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | Ed25519 | Entry signatures | Fast, small keys, deterministic |
//! | Curve25519 | Published encryption keys | Same curve family, audited |
//! | Argon2id | Password hashing | Memory-hard, PHC self-describing |
//! | BLAKE3-256 | Default entry digest | Fastest of the supported set |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: All private key bytes are zeroized when dropped
//! 2. **Secure Random**: `rand::rngs::OsRng` for all key generation
//! 3. **No Aliasing**: Getters return owned copies or tagged-string views

mod hashing;
mod keys;
mod password;

pub use hashing::{hash_data, is_supported_algorithm, SUPPORTED_HASH_ALGORITHMS};
pub use keys::{EncryptionPair, SecretKey, SigningPair};
pub use password::{Password, PasswordStrength};

/// Size of all supported key material in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of an Ed25519 signature in bytes
pub const SIGNATURE_SIZE: usize = 64;
