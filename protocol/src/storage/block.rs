//! # Block Structure
//!
//! A block is one sealed record in the chain: a position, an opaque
//! timestamp, an application payload (the "transaction"), the identity of
//! the block before it, and its own identity hash.
//!
//! ## Block Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Block<T>                                    │
//! │  ├── index: u64          (0 = genesis)       │
//! │  ├── timestamp: String   (caller-supplied)   │
//! │  ├── transaction: T      (any Serialize)     │
//! │  ├── preceding_hash: String                  │
//! │  └── hash: String        (hex digest)        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! The identity hash is the hex digest of the UTF-8 string
//! `index || preceding_hash || timestamp || json(transaction)`, with the
//! index in decimal and no separators. That is exactly what the original
//! Miler service hashed, so its chains still validate here.
//!
//! The payload goes through `serde_json` with `preserve_order`, so a
//! `serde_json::Value` payload hashes with its keys in the order they were
//! received, the same text `JSON.stringify` produced. Custom payload types
//! must serialize the same value to the same bytes every time.
//!
//! Timestamps are text. A document that carries a number (or any other
//! JSON value) is read through [`field_text`], the same rendering the node
//! applies to request bodies.
//!
//! ## Sealing
//!
//! Constructors compute the hash before returning, so a `Block` handed to
//! callers is always sealed. The fields have no public setters. The only
//! mutation left is [`crate::storage::Chain::append`], which relinks a
//! candidate to the chain tail and reseals it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::UNLINKED_PRECEDING_HASH;
use crate::crypto::hash::{BlockHasher, Sha256Hasher};
use crate::storage::error::ChainError;

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A hash-identified unit of the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block<T> {
    /// 0-based position in the chain.
    pub(crate) index: u64,
    /// Opaque timestamp, hashed verbatim.
    #[serde(deserialize_with = "timestamp_from_json")]
    pub(crate) timestamp: String,
    /// Application payload.
    pub(crate) transaction: T,
    /// Identity hash of the previous block. `"0"` for genesis.
    pub(crate) preceding_hash: String,
    /// Hex identity hash of this block.
    pub(crate) hash: String,
}

impl<T: Serialize> Block<T> {
    /// Construct a sealed block using the default SHA-256 digest.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Serialization`] if the payload cannot be
    /// serialized. No block is produced in that case.
    pub fn new(
        index: u64,
        timestamp: impl Into<String>,
        transaction: T,
        preceding_hash: impl Into<String>,
    ) -> Result<Self, ChainError> {
        Self::with_hasher(&Sha256Hasher, index, timestamp, transaction, preceding_hash)
    }

    /// Construct a block that has not been linked to a chain yet.
    ///
    /// The preceding hash is empty; [`crate::storage::Chain::append`]
    /// fills it in.
    pub fn candidate(
        index: u64,
        timestamp: impl Into<String>,
        transaction: T,
    ) -> Result<Self, ChainError> {
        Self::new(index, timestamp, transaction, UNLINKED_PRECEDING_HASH)
    }

    /// Construct a sealed block under an explicit digest.
    pub fn with_hasher<H: BlockHasher + ?Sized>(
        hasher: &H,
        index: u64,
        timestamp: impl Into<String>,
        transaction: T,
        preceding_hash: impl Into<String>,
    ) -> Result<Self, ChainError> {
        let mut block = Block {
            index,
            timestamp: timestamp.into(),
            transaction,
            preceding_hash: preceding_hash.into(),
            hash: String::new(),
        };
        block.hash = block.compute_hash(hasher)?;
        Ok(block)
    }

    /// Recompute the identity hash from the block's current fields.
    ///
    /// Pure: no clock, no I/O. Use it to check that `hash()` still matches
    /// the content.
    pub fn compute_hash<H: BlockHasher + ?Sized>(&self, hasher: &H) -> Result<String, ChainError> {
        let payload = serde_json::to_string(&self.transaction)?;
        let preimage = format!(
            "{}{}{}{}",
            self.index, self.preceding_hash, self.timestamp, payload
        );
        Ok(hasher.digest_hex(preimage.as_bytes()))
    }

    /// Check that the stored hash matches the recomputed one.
    ///
    /// # Errors
    ///
    /// [`ChainError::HashMismatch`] on disagreement,
    /// [`ChainError::Serialization`] if the payload no longer serializes.
    pub fn verify<H: BlockHasher + ?Sized>(&self, hasher: &H) -> Result<(), ChainError> {
        let computed = self.compute_hash(hasher)?;
        if computed != self.hash {
            return Err(ChainError::HashMismatch {
                index: self.index,
                stored: self.hash.clone(),
                computed,
            });
        }
        Ok(())
    }

    /// Point the block at a new predecessor and reseal it.
    ///
    /// The hash is recomputed after both fields are set, never before.
    pub(crate) fn link<H: BlockHasher + ?Sized>(
        &mut self,
        index: u64,
        preceding_hash: String,
        hasher: &H,
    ) -> Result<(), ChainError> {
        self.index = index;
        self.preceding_hash = preceding_hash;
        self.hash = self.compute_hash(hasher)?;
        Ok(())
    }
}

impl<T> Block<T> {
    /// Position of the block in its chain.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Caller-supplied timestamp.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Application payload.
    pub fn transaction(&self) -> &T {
        &self.transaction
    }

    /// Identity hash of the previous block.
    pub fn preceding_hash(&self) -> &str {
        &self.preceding_hash
    }

    /// Hex identity hash of this block.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Whether the block has been linked to a predecessor.
    pub fn is_linked(&self) -> bool {
        self.preceding_hash != UNLINKED_PRECEDING_HASH
    }
}

/// Render a JSON scalar the way string concatenation does: strings pass
/// through, everything else is written as compact JSON (`1700000000`,
/// `true`).
pub fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn timestamp_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| field_text(&value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::{sha256, Blake3Hasher};
    use std::collections::BTreeMap;

    #[test]
    fn hash_matches_original_formula() {
        let block = Block::new(0, "T0", "genesis-tx", "0").unwrap();
        let expected = hex::encode(sha256(b"00T0\"genesis-tx\""));
        assert_eq!(block.hash(), expected);
    }

    #[test]
    fn hash_is_deterministic() {
        let a = Block::new(3, "2024-01-01", serde_json::json!({"to": "bob", "amount": 5}), "ab")
            .unwrap();
        let b = Block::new(3, "2024-01-01", serde_json::json!({"to": "bob", "amount": 5}), "ab")
            .unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.compute_hash(&Sha256Hasher).unwrap(), a.hash());
    }

    #[test]
    fn payload_hashed_in_received_key_order() {
        let payload: Value = serde_json::from_str(r#"{"to":"bob","amount":5}"#).unwrap();
        let block = Block::new(1, "T1", payload, "prev").unwrap();
        let expected = hex::encode(sha256(br#"1prevT1{"to":"bob","amount":5}"#));
        assert_eq!(block.hash(), expected);

        let reordered: Value = serde_json::from_str(r#"{"amount":5,"to":"bob"}"#).unwrap();
        let other = Block::new(1, "T1", reordered, "prev").unwrap();
        assert_ne!(other.hash(), block.hash());
    }

    #[test]
    fn numeric_timestamp_read_as_text() {
        let doc = r#"{"index":1,"timestamp":1700000000,"transaction":"tx",
                      "precedingHash":"prev","hash":"h"}"#;
        let block: Block<Value> = serde_json::from_str(doc).unwrap();
        assert_eq!(block.timestamp(), "1700000000");
        assert_eq!(
            block.compute_hash(&Sha256Hasher).unwrap(),
            hex::encode(sha256(br#"1prev1700000000"tx""#))
        );
    }

    #[test]
    fn field_text_renders_like_concatenation() {
        assert_eq!(field_text(&Value::from("T0")), "T0");
        assert_eq!(field_text(&Value::from(1700000000u64)), "1700000000");
        assert_eq!(field_text(&Value::from(1.5)), "1.5");
        assert_eq!(field_text(&Value::from(true)), "true");
    }

    #[test]
    fn every_field_feeds_the_hash() {
        let base = Block::new(1, "T1", "tx", "prev").unwrap();
        let variants = [
            Block::new(2, "T1", "tx", "prev").unwrap(),
            Block::new(1, "T2", "tx", "prev").unwrap(),
            Block::new(1, "T1", "tx2", "prev").unwrap(),
            Block::new(1, "T1", "tx", "other").unwrap(),
        ];
        for v in &variants {
            assert_ne!(v.hash(), base.hash());
        }
    }

    #[test]
    fn candidate_is_unlinked_but_sealed() {
        let block = Block::candidate(7, "T", "payload").unwrap();
        assert_eq!(block.preceding_hash(), "");
        assert!(!block.is_linked());
        assert!(block.verify(&Sha256Hasher).is_ok());
    }

    #[test]
    fn explicit_hasher_changes_identity() {
        let sha = Block::new(0, "T0", "tx", "0").unwrap();
        let blake = Block::with_hasher(&Blake3Hasher, 0, "T0", "tx", "0").unwrap();
        assert_ne!(sha.hash(), blake.hash());
        assert!(blake.verify(&Blake3Hasher).is_ok());
        assert!(blake.verify(&Sha256Hasher).is_err());
    }

    #[test]
    fn unserializable_payload_is_rejected() {
        let mut payload = BTreeMap::new();
        payload.insert((1u32, 2u32), "tuple keys are not JSON object keys");
        let err = Block::new(0, "T0", payload, "0").unwrap_err();
        assert!(matches!(err, ChainError::Serialization(_)));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let mut block = Block::new(1, "T1", "tx1".to_string(), "prev").unwrap();
        block.transaction = "forged".to_string();
        match block.verify(&Sha256Hasher) {
            Err(ChainError::HashMismatch { index, stored, computed }) => {
                assert_eq!(index, 1);
                assert_ne!(stored, computed);
            }
            other => panic!("expected hash mismatch, got {:?}", other),
        }
    }

    #[test]
    fn mismatch_reports_full_width_index() {
        let index = u64::from(u32::MAX) + 7;
        let mut block = Block::new(index, "T", "tx".to_string(), "prev").unwrap();
        block.transaction = "forged".to_string();
        match block.verify(&Sha256Hasher) {
            Err(ChainError::HashMismatch { index: reported, .. }) => assert_eq!(reported, index),
            other => panic!("expected hash mismatch, got {:?}", other),
        }
    }

    #[test]
    fn link_reseals_after_setting_fields() {
        let mut block = Block::candidate(0, "T", "tx").unwrap();
        let before = block.hash().to_string();
        block.link(4, "parent".into(), &Sha256Hasher).unwrap();

        assert_eq!(block.index(), 4);
        assert_eq!(block.preceding_hash(), "parent");
        assert_ne!(block.hash(), before);
        assert_eq!(
            block.hash(),
            Block::new(4, "T", "tx", "parent").unwrap().hash()
        );
    }

    #[test]
    fn serializes_with_external_field_names() {
        let block = Block::new(0, "T0", "genesis-tx", "0").unwrap();
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["index"], 0);
        assert_eq!(json["timestamp"], "T0");
        assert_eq!(json["transaction"], "genesis-tx");
        assert_eq!(json["precedingHash"], "0");
        assert_eq!(json["hash"], block.hash());
    }
}
