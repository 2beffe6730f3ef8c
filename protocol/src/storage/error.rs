//! Error types for block construction and chain verification.
//!
//! Construction failures surface immediately to the caller. Integrity
//! failures are only produced by [`crate::storage::Chain::verify`]; the
//! boolean [`crate::storage::Chain::validate`] never returns them.

use thiserror::Error;

/// Errors produced by the block and chain layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The block payload could not be serialized into its canonical form.
    #[error("payload serialization failed: {0}")]
    Serialization(String),

    /// A chain document had no blocks. Every chain starts with genesis.
    #[error("chain has no genesis block")]
    EmptyChain,

    /// A block's stored hash disagrees with the hash of its current fields.
    #[error("block {index} hash mismatch: stored={stored}, computed={computed}")]
    HashMismatch {
        /// Position of the offending block.
        index: u64,
        /// Hash carried by the block.
        stored: String,
        /// Hash recomputed from the block's fields.
        computed: String,
    },

    /// A block does not point at its predecessor's hash.
    #[error("block {index} broken link: expected preceding hash {expected}, found {found}")]
    BrokenLink {
        /// Position of the offending block.
        index: u64,
        /// Hash of the block at `index - 1`.
        expected: String,
        /// Preceding hash carried by the block.
        found: String,
    },

    /// The genesis block does not carry the `"0"` sentinel.
    #[error("genesis block must have preceding hash \"0\", found {found:?}")]
    InvalidGenesis {
        /// Preceding hash carried by the genesis block.
        found: String,
    },
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization(err.to_string())
    }
}
