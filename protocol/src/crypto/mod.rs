//! # Cryptographic Primitives for Miler
//!
//! Only one primitive matters here: the digest that turns a block's fields
//! into its identity. It sits behind the [`BlockHasher`] capability so the
//! chain depends on an interface, not a library.
//!
//! We don't roll our own. SHA-256 comes from `sha2`, BLAKE3 from `blake3`.

pub mod hash;

pub use hash::{blake3_hash, sha256, Blake3Hasher, BlockHasher, Sha256Hasher};
