// crates/sdm-core/src/hashing.rs
// ============================================================================
// Module: SDM Hash Stage
// Description: Deterministic digests for hashed audit entries.
// Purpose: Make audit rows verifiable without storing plaintext.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! Hashed audit entries store the lowercase hex SHA-256 digest of the field's
//! canonical string rendering (see [`crate::value`]). Recomputing the digest
//! from a claimed plaintext must reproduce the stored value, so the input
//! representation and output encoding are fixed.
//!
//! The algorithm is versioned through [`HashAlgorithm`]; there is no
//! negotiation, generated code pins [`DEFAULT_HASH_ALGORITHM`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported digest algorithms for hashed audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256, 64 hex characters.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the stable label of the algorithm.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Returns the hex-encoded digest width in characters.
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Default algorithm for hashed audit entries.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Digest value tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

/// Returns the hex digest of a canonical value rendering.
///
/// This is the function generated repositories call for hashed audit entries.
///
/// # Examples
/// ```
/// use sdm_core::hashing::digest;
///
/// let first = digest("123 Main St");
/// assert_eq!(first, digest("123 Main St"));
/// assert_eq!(first.len(), 64);
/// ```
#[must_use]
pub fn digest(canonical: &str) -> String {
    hash_bytes(DEFAULT_HASH_ALGORITHM, canonical.as_bytes()).value
}

/// Returns true when `stored` is the digest of `canonical`.
#[must_use]
pub fn verify_digest(canonical: &str, stored: &str) -> bool {
    digest(canonical).eq_ignore_ascii_case(stored)
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
