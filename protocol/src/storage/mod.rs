//! # Storage Module
//!
//! The in-memory chain: blocks, the append-only sequence that links them,
//! and the errors both can raise. Nothing here touches disk; callers that
//! want durability serialize the [`Chain`] themselves.
//!
//! ## Architecture
//!
//! ```text
//! block.rs  — Block structure, identity hash, sealing
//! chain.rs  — Genesis, append, validation
//! error.rs  — ChainError
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! payload → Block::candidate → Chain::append → Chain::validate
//!                                  ↓
//!                    link to tail, reseal, push
//! ```

pub mod block;
pub mod chain;
pub mod error;

pub use block::Block;
pub use chain::{Chain, GenesisSeed};
pub use error::ChainError;
