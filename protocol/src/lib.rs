// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Miler Protocol — Core Library
//!
//! A tamper-evident, append-only chain of blocks. Each block commits to
//! the identity hash of the block before it, so rewriting any record after
//! the fact breaks either that block's own hash or the link that follows.
//!
//! ## Architecture
//!
//! - **crypto** — The digest capability behind every block hash.
//! - **storage** — Blocks, the chain, and its error type.
//! - **config** — Sentinels, defaults, and the protocol version.
//!
//! ## Example
//!
//! ```
//! use miler_protocol::storage::{Block, Chain, GenesisSeed};
//!
//! let mut chain = Chain::genesis("c1", "demo", GenesisSeed::new("T0", "genesis-tx"))?;
//! chain.append(Block::candidate(0, "T1", "tx1")?)?;
//! assert!(chain.validate());
//! # Ok::<(), miler_protocol::storage::ChainError>(())
//! ```
//!
//! ## Non-goals
//!
//! No mining, no consensus, no persistence. The `difficulty` field rides
//! along for compatibility and nothing reads it.

pub mod config;
pub mod crypto;
pub mod storage;

pub use storage::{Block, Chain, ChainError, GenesisSeed};
