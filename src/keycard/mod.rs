//! # Keycard Module
//!
//! Tamper-evident public-key identity records and the chains they form.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KEYCARD SYSTEM                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Keycard (one per principal)                                    │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐      ┌─────────┐      ┌─────────┐                 │   │
//! │  │  │ Entry 1 │◄─────│ Entry 2 │◄─────│ Entry 3 │                 │   │
//! │  │  │ (root)  │      │         │      │         │                 │   │
//! │  │  └─────────┘      └─────────┘      └─────────┘                 │   │
//! │  │       ▲                │                │                      │   │
//! │  │       │                │                │                      │   │
//! │  │       │     Custody-Signature: made with entry n-1's key       │   │
//! │  │       │     Previous-Hash: entry n-1's digest                  │   │
//! │  │       │                                                        │   │
//! │  │   no custody signature, no previous hash                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Key rotation = chaining: entry n+1 copies entry n, mints fresh         │
//! │  keys, and is signed by the old key. Control of the chain IS the        │
//! │  identity.                                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod card;
mod entry;

pub use card::Keycard;
pub use entry::{
    Entry, EntryType, KeyBundle, MintedPair, SignatureSlot, SlotKind, ALL_SIGNATURES,
};
