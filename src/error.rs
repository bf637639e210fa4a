//! # Error Handling
//!
//! This module provides the error types for the keycard engine.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                      │
//! │  │                                                                      │
//! │  ├── Input Errors                                                       │
//! │  │   ├── BadData               - Malformed bytes, encoding, or schema   │
//! │  │   └── BadParameterValue     - Caller passed an unusable value        │
//! │  │                                                                      │
//! │  ├── Compliance Errors                                                  │
//! │  │   ├── UnsupportedKeycardType    - Type outside {Organization, User}  │
//! │  │   ├── UnsupportedEncryptionType - Non-Ed25519 signing key offered    │
//! │  │   ├── UnsupportedHashType       - Digest algorithm outside the set   │
//! │  │   ├── RequiredFieldMissing      - A required entry field is empty    │
//! │  │   ├── SignatureMissing          - A required signature/hash absent   │
//! │  │   └── NotCompliant              - Entry fails a structural rule      │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                      │
//! │  │   └── InvalidKeycard        - Signature, hash, or chain failure      │
//! │  │                                                                      │
//! │  ├── Resource Errors                                                    │
//! │  │   ├── ResourceExists        - Target exists; overwrite not opted in  │
//! │  │   ├── ResourceNotFound      - File or entry does not exist           │
//! │  │   └── ExceptionThrown       - Runtime failure caught at the boundary │
//! │  │                                                                      │
//! │  └── Logic Errors                                                       │
//! │      ├── InternalError         - Invariant violation (programmer error) │
//! │      └── FeatureNotAvailable   - Operation not supported for this type  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error carries its `info` text payload; compliance errors put the
//! offending field or slot name there. [`Error::code`] yields the canonical
//! wire code used by the client-server protocol, so callers translating to
//! protocol responses never match on variants directly.

use thiserror::Error;

/// Result type alias for keycard engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the keycard engine
///
/// Variants are the canonical protocol codes. Verification failures are
/// never swallowed; any cryptographic failure aborts the operation that
/// discovered it.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Malformed bytes, bad encoding, or an invalid document schema
    #[error("Bad data: {0}")]
    BadData(String),

    /// A caller-supplied value is unusable
    #[error("Bad parameter value: {0}")]
    BadParameterValue(String),

    // ========================================================================
    // Compliance Errors
    // ========================================================================
    /// Keycard type outside the closed set {Organization, User}
    #[error("Unsupported keycard type: {0}")]
    UnsupportedKeycardType(String),

    /// Signing or verification attempted with a non-Ed25519 key
    #[error("Unsupported encryption type: {0}")]
    UnsupportedEncryptionType(String),

    /// Digest algorithm outside the supported set
    #[error("Unsupported hash type: {0}")]
    UnsupportedHashType(String),

    /// A required entry field is absent or empty
    #[error("Required field missing: {0}")]
    RequiredFieldMissing(String),

    /// A required signature or hash slot is absent or empty
    #[error("Signature missing: {0}")]
    SignatureMissing(String),

    /// The entry fails a structural compliance rule
    #[error("Not compliant: {0}")]
    NotCompliant(String),

    // ========================================================================
    // Crypto Errors
    // ========================================================================
    /// Signature verification, hash verification, or chain validation failed
    #[error("Invalid keycard: {0}")]
    InvalidKeycard(String),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Target file already exists and overwrite was not requested
    #[error("Resource exists: {0}")]
    ResourceExists(String),

    /// Requested file or entry does not exist
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A runtime failure (I/O, encoding) caught at the boundary
    #[error("Exception thrown: {0}")]
    ExceptionThrown(String),

    // ========================================================================
    // Logic Errors
    // ========================================================================
    /// Invariant violation; indicates a bug, not bad input
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Operation is defined but not supported in this configuration
    #[error("Feature not available: {0}")]
    FeatureNotAvailable(String),
}

impl Error {
    /// Get the canonical wire code for this error
    ///
    /// These are the code strings the protocol layer puts on the wire, so
    /// they are stable API.
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadData(_) => "BadData",
            Error::BadParameterValue(_) => "BadParameterValue",
            Error::UnsupportedKeycardType(_) => "UnsupportedKeycardType",
            Error::UnsupportedEncryptionType(_) => "UnsupportedEncryptionType",
            Error::UnsupportedHashType(_) => "UnsupportedHashType",
            Error::RequiredFieldMissing(_) => "RequiredFieldMissing",
            Error::SignatureMissing(_) => "SignatureMissing",
            Error::NotCompliant(_) => "NotCompliant",
            Error::InvalidKeycard(_) => "InvalidKeycard",
            Error::ResourceExists(_) => "ResourceExists",
            Error::ResourceNotFound(_) => "ResourceNotFound",
            Error::ExceptionThrown(_) => "ExceptionThrown",
            Error::InternalError(_) => "InternalError",
            Error::FeatureNotAvailable(_) => "FeatureNotAvailable",
        }
    }

    /// Get the info payload: the offending field, slot, or detail text
    pub fn info(&self) -> &str {
        match self {
            Error::BadData(s)
            | Error::BadParameterValue(s)
            | Error::UnsupportedKeycardType(s)
            | Error::UnsupportedEncryptionType(s)
            | Error::UnsupportedHashType(s)
            | Error::RequiredFieldMissing(s)
            | Error::SignatureMissing(s)
            | Error::NotCompliant(s)
            | Error::InvalidKeycard(s)
            | Error::ResourceExists(s)
            | Error::ResourceNotFound(s)
            | Error::ExceptionThrown(s)
            | Error::InternalError(s)
            | Error::FeatureNotAvailable(s) => s,
        }
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::ExceptionThrown(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::BadData(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::BadData(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
