//! # Digest Dispatch
//!
//! Multi-algorithm hashing for entry digests.
//!
//! ## Supported Algorithms
//!
//! | Tag | Implementation | Digest size |
//! |-------------|----------------|-------------|
//! | BLAKE3-256  | blake3         | 32 bytes    |
//! | BLAKE2B-256 | blake2 (Blake2b/256) | 32 bytes |
//! | SHA-256     | sha2           | 32 bytes    |
//! | SHA3-256    | sha3           | 32 bytes    |
//!
//! The set is closed: algorithm choice is a deployment decision baked into
//! each entry's `Hash` line, never negotiated at runtime. Anything outside
//! the set is `UnsupportedHashType`.

use blake2::digest::consts::U32;
use blake2::Blake2b;
use sha2::{Digest, Sha256};
use sha3::Sha3_256;

use crate::algostring::AlgoString;
use crate::error::{Error, Result};

/// BLAKE2b parameterized to a 256-bit digest
type Blake2b256 = Blake2b<U32>;

/// The closed set of digest algorithm tags, in preference order
pub const SUPPORTED_HASH_ALGORITHMS: [&str; 4] =
    ["BLAKE3-256", "BLAKE2B-256", "SHA-256", "SHA3-256"];

/// Is this tag one of the supported digest algorithms?
pub fn is_supported_algorithm(algorithm: &str) -> bool {
    SUPPORTED_HASH_ALGORITHMS.contains(&algorithm)
}

/// Hash `data` with the named algorithm, returning the tagged digest
pub fn hash_data(algorithm: &str, data: &[u8]) -> Result<AlgoString> {
    let digest: Vec<u8> = match algorithm {
        "BLAKE3-256" => blake3::hash(data).as_bytes().to_vec(),
        "BLAKE2B-256" => {
            let mut hasher = Blake2b256::new();
            hasher.update(data);
            hasher.finalize().to_vec()
        }
        "SHA-256" => {
            let mut hasher = Sha256::new();
            hasher.update(data);
            hasher.finalize().to_vec()
        }
        "SHA3-256" => {
            let mut hasher = Sha3_256::new();
            hasher.update(data);
            hasher.finalize().to_vec()
        }
        _ => return Err(Error::UnsupportedHashType(algorithm.to_string())),
    };
    Ok(AlgoString::from_raw(algorithm, &digest))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_algorithms_produce_256_bits() {
        for algo in SUPPORTED_HASH_ALGORITHMS {
            let tagged = hash_data(algo, b"keycard digest test").unwrap();
            assert_eq!(tagged.prefix(), algo);
            assert_eq!(tagged.raw_data().unwrap().len(), 32, "{}", algo);
        }
    }

    #[test]
    fn test_deterministic() {
        let a = hash_data("BLAKE3-256", b"same input").unwrap();
        let b = hash_data("BLAKE3-256", b"same input").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_algorithms_disagree() {
        // Same input, four different digests
        let digests: Vec<String> = SUPPORTED_HASH_ALGORITHMS
            .iter()
            .map(|a| hash_data(a, b"input").unwrap().data().to_string())
            .collect();
        for i in 0..digests.len() {
            for j in i + 1..digests.len() {
                assert_ne!(digests[i], digests[j]);
            }
        }
    }

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256("abc") = ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad
        let tagged = hash_data("SHA-256", b"abc").unwrap();
        let raw = tagged.raw_data().unwrap();
        assert_eq!(raw[0], 0xba);
        assert_eq!(raw[1], 0x78);
        assert_eq!(raw[31], 0xad);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = hash_data("MD5", b"data").unwrap_err();
        assert_eq!(err.code(), "UnsupportedHashType");
        assert!(!is_supported_algorithm("SHA-512"));
        assert!(is_supported_algorithm("SHA3-256"));
    }
}
