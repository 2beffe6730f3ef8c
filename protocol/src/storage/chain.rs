//! # Chain Management
//!
//! An ordered, append-only sequence of [`Block`]s anchored at a genesis
//! block. Two invariants hold for a chain built only through
//! [`Chain::genesis`] and [`Chain::append`]:
//!
//! 1. **Chain-link integrity** — for every `i >= 1`,
//!    `blocks[i].preceding_hash == blocks[i - 1].hash`.
//! 2. **Self-consistency** — every block's stored hash equals the hash
//!    recomputed from its fields.
//!
//! [`Chain::validate`] re-checks both from index 1 onward. Chains read back
//! from JSON are not trusted: deserialization never repairs a hash, so a
//! tampered document fails validation instead of being silently healed.
//!
//! ## Genesis
//!
//! `validate()` does not re-derive the genesis block's own hash; that
//! matches the original Miler service. [`Chain::verify_strict`] closes
//! the gap for callers that want it.
//!
//! ## Concurrency
//!
//! `append` takes `&mut self`, `validate` takes `&self`. Shared owners
//! wrap the chain in a `RwLock` and hold the write guard across the whole
//! append; the node does exactly that.

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_DIFFICULTY, GENESIS_INDEX, GENESIS_PRECEDING_HASH};
use crate::crypto::hash::{BlockHasher, Sha256Hasher};
use crate::storage::block::Block;
use crate::storage::error::ChainError;

// ---------------------------------------------------------------------------
// GenesisSeed
// ---------------------------------------------------------------------------

/// Timestamp and payload used to build the genesis block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisSeed<T> {
    /// Opaque genesis timestamp. Accepts `date` on input, as the original
    /// service did, and numbers rendered through
    /// [`crate::storage::block::field_text`].
    #[serde(
        alias = "date",
        deserialize_with = "crate::storage::block::timestamp_from_json"
    )]
    pub timestamp: String,
    /// Genesis payload.
    pub transaction: T,
}

impl<T> GenesisSeed<T> {
    /// Bundle a genesis timestamp and payload.
    pub fn new(timestamp: impl Into<String>, transaction: T) -> Self {
        Self {
            timestamp: timestamp.into(),
            transaction,
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Append-only, hash-linked sequence of blocks.
///
/// Serialized as `{ "id", "name", "blockchain": [...], "difficulty" }`.
/// The digest is not part of the document; it comes from `H`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(
    try_from = "RawChain<T>",
    bound(
        serialize = "T: Serialize",
        deserialize = "T: serde::de::DeserializeOwned, H: BlockHasher + Default"
    )
)]
pub struct Chain<T, H = Sha256Hasher> {
    id: String,
    name: String,
    #[serde(rename = "blockchain")]
    blocks: Vec<Block<T>>,
    difficulty: u32,
    #[serde(skip)]
    hasher: H,
}

/// Unchecked wire form of a chain.
#[derive(Deserialize)]
struct RawChain<T> {
    id: String,
    name: String,
    blockchain: Vec<Block<T>>,
    #[serde(default = "default_difficulty")]
    difficulty: u32,
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

impl<T, H: BlockHasher + Default> TryFrom<RawChain<T>> for Chain<T, H> {
    type Error = ChainError;

    fn try_from(raw: RawChain<T>) -> Result<Self, Self::Error> {
        if raw.blockchain.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        Ok(Chain {
            id: raw.id,
            name: raw.name,
            blocks: raw.blockchain,
            difficulty: raw.difficulty,
            hasher: H::default(),
        })
    }
}

impl<T: Serialize> Chain<T, Sha256Hasher> {
    /// Create a chain seeded with its genesis block, hashed with SHA-256.
    ///
    /// # Errors
    ///
    /// [`ChainError::Serialization`] if the genesis payload cannot be
    /// serialized.
    pub fn genesis(
        id: impl Into<String>,
        name: impl Into<String>,
        seed: GenesisSeed<T>,
    ) -> Result<Self, ChainError> {
        Self::with_hasher(Sha256Hasher, id, name, seed)
    }
}

impl<T: Serialize, H: BlockHasher> Chain<T, H> {
    /// Create a chain seeded with its genesis block under an explicit digest.
    pub fn with_hasher(
        hasher: H,
        id: impl Into<String>,
        name: impl Into<String>,
        seed: GenesisSeed<T>,
    ) -> Result<Self, ChainError> {
        let genesis = genesis_block(&hasher, seed)?;
        let chain = Chain {
            id: id.into(),
            name: name.into(),
            blocks: vec![genesis],
            difficulty: DEFAULT_DIFFICULTY,
            hasher,
        };
        tracing::debug!(id = %chain.id, genesis = %chain.tail().hash(), "chain created");
        Ok(chain)
    }

    /// Re-run genesis on this instance, discarding every existing block.
    ///
    /// On error the chain is left untouched.
    pub fn reset(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        seed: GenesisSeed<T>,
    ) -> Result<(), ChainError> {
        let genesis = genesis_block(&self.hasher, seed)?;
        let dropped = self.blocks.len();
        self.id = id.into();
        self.name = name.into();
        self.blocks = vec![genesis];
        self.difficulty = DEFAULT_DIFFICULTY;
        tracing::debug!(id = %self.id, dropped, "chain reset");
        Ok(())
    }

    /// Link `candidate` to the current tail and push it.
    ///
    /// The candidate's index becomes the chain length and its preceding
    /// hash becomes the tail's hash; the identity hash is recomputed after
    /// both are set. Whatever link the candidate carried before is ignored.
    ///
    /// Returns the block as stored.
    pub fn append(&mut self, mut candidate: Block<T>) -> Result<&Block<T>, ChainError> {
        let index = self.blocks.len() as u64;
        let preceding_hash = self.tail().hash().to_string();
        candidate.link(index, preceding_hash, &self.hasher)?;
        tracing::debug!(index, hash = %candidate.hash(), "block appended");
        self.blocks.push(candidate);
        Ok(self.tail())
    }

    /// `true` when every block after genesis is self-consistent and linked
    /// to its predecessor.
    ///
    /// Total: never panics, never errors. A block whose payload no longer
    /// serializes counts as invalid.
    pub fn validate(&self) -> bool {
        self.verify().is_ok()
    }

    /// Like [`Chain::validate`], but reports the first violation.
    ///
    /// Checks, for each `i >= 1` in order: the stored hash against the
    /// recomputed hash, then the preceding hash against `blocks[i - 1]`.
    pub fn verify(&self) -> Result<(), ChainError> {
        for (offset, pair) in self.blocks.windows(2).enumerate() {
            let (preceding, current) = (&pair[0], &pair[1]);
            let index = offset as u64 + 1;

            let computed = current.compute_hash(&self.hasher)?;
            if computed != current.hash() {
                return Err(ChainError::HashMismatch {
                    index,
                    stored: current.hash().to_string(),
                    computed,
                });
            }

            if current.preceding_hash() != preceding.hash() {
                return Err(ChainError::BrokenLink {
                    index,
                    expected: preceding.hash().to_string(),
                    found: current.preceding_hash().to_string(),
                });
            }
        }
        Ok(())
    }

    /// [`Chain::verify`] plus genesis checks: the `"0"` sentinel and the
    /// genesis block's own hash.
    pub fn verify_strict(&self) -> Result<(), ChainError> {
        let genesis = self.genesis_block();
        if genesis.preceding_hash() != GENESIS_PRECEDING_HASH {
            return Err(ChainError::InvalidGenesis {
                found: genesis.preceding_hash().to_string(),
            });
        }

        let computed = genesis.compute_hash(&self.hasher)?;
        if computed != genesis.hash() {
            return Err(ChainError::HashMismatch {
                index: 0,
                stored: genesis.hash().to_string(),
                computed,
            });
        }

        self.verify()
    }

    /// Boolean form of [`Chain::verify_strict`].
    pub fn validate_strict(&self) -> bool {
        self.verify_strict().is_ok()
    }
}

impl<T, H> Chain<T, H> {
    /// Chain identifier, set at genesis.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, set at genesis.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inert difficulty tag.
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// The digest this chain hashes with.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// All blocks, genesis first.
    pub fn blocks(&self) -> &[Block<T>] {
        &self.blocks
    }

    /// Block at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Block<T>> {
        self.blocks.get(index)
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false` for a chain built through genesis or deserialization.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The genesis block.
    pub fn genesis_block(&self) -> &Block<T> {
        self.blocks
            .first()
            .expect("chain always holds its genesis block")
    }

    /// The most recently appended block.
    ///
    /// # Panics
    ///
    /// Only if the chain is empty, which neither genesis nor deserialization
    /// allows.
    pub fn tail(&self) -> &Block<T> {
        self.blocks
            .last()
            .expect("chain always holds its genesis block")
    }
}

fn genesis_block<T: Serialize, H: BlockHasher + ?Sized>(
    hasher: &H,
    seed: GenesisSeed<T>,
) -> Result<Block<T>, ChainError> {
    Block::with_hasher(
        hasher,
        GENESIS_INDEX,
        seed.timestamp,
        seed.transaction,
        GENESIS_PRECEDING_HASH,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
