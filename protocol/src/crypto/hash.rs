//! # Hashing Utilities
//!
//! The block identity hash goes through a single capability,
//! [`BlockHasher`], so the chain never names a concrete hash library. Two
//! implementations ship with the crate:
//!
//! - **SHA-256** ([`Sha256Hasher`]) — the default. Chains produced by the
//!   original service hash with SHA-256 and render lowercase hex, and we
//!   want those documents to validate unchanged.
//!
//! - **BLAKE3** ([`Blake3Hasher`]) — same 256-bit output, faster on every
//!   platform we care about. Use it for chains that never leave Miler.
//!
//! Anything weaker than 256 bits of output is not welcome here.

use sha2::{Digest, Sha256};

/// A cryptographic digest used to derive block identities.
///
/// Implementations must be deterministic and collision-resistant. The
/// chain only ever sees the hex rendering of the digest.
pub trait BlockHasher: Send + Sync {
    /// Hash `data` and return the raw digest bytes.
    fn digest(&self, data: &[u8]) -> Vec<u8>;

    /// Short, lowercase algorithm name (e.g. `"sha256"`).
    fn algorithm(&self) -> &'static str;

    /// Hash `data` and return the digest as lowercase hex.
    fn digest_hex(&self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }
}

/// SHA-256 block hasher. The default for every chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl BlockHasher for Sha256Hasher {
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        sha256(data)
    }

    fn algorithm(&self) -> &'static str {
        "sha256"
    }
}

/// BLAKE3 block hasher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl BlockHasher for Blake3Hasher {
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        blake3_hash(data).to_vec()
    }

    fn algorithm(&self) -> &'static str {
        "blake3"
    }
}

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use miler_protocol::crypto::sha256;
///
/// let hash = sha256(b"miler");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use miler_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"miler");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc") from FIPS 180-2.
        assert_eq!(
            Sha256Hasher.digest_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_empty_input() {
        assert_eq!(
            Sha256Hasher.digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn blake3_known_vector() {
        // BLAKE3 of the empty input, from the reference test vectors.
        assert_eq!(
            Blake3Hasher.digest_hex(b""),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn hashers_produce_256_bit_digests() {
        assert_eq!(Sha256Hasher.digest(b"block").len(), 32);
        assert_eq!(Blake3Hasher.digest(b"block").len(), 32);
    }

    #[test]
    fn hashers_disagree() {
        assert_ne!(
            Sha256Hasher.digest_hex(b"block"),
            Blake3Hasher.digest_hex(b"block")
        );
    }

    #[test]
    fn algorithm_names() {
        assert_eq!(Sha256Hasher.algorithm(), "sha256");
        assert_eq!(Blake3Hasher.algorithm(), "blake3");
    }
}
