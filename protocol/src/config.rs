//! # Protocol Configuration & Constants
//!
//! Every magic value in Miler lives here. There are not many of them, which
//! is the point: a hash-linked chain needs a sentinel, a version, and not
//! much else.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Protocol version reported by nodes. Bump the minor version whenever the
/// hash preimage layout changes, because every existing chain stops
/// validating when it does.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Chain Linkage
// ---------------------------------------------------------------------------

/// Preceding hash of the genesis block. Not a real digest: a single ASCII
/// zero, so it can never collide with a 64-character hex hash.
pub const GENESIS_PRECEDING_HASH: &str = "0";

/// Preceding hash of a candidate block that has not been linked yet.
/// [`crate::storage::Chain::append`] always overwrites it.
pub const UNLINKED_PRECEDING_HASH: &str = "";

/// Position of the genesis block.
pub const GENESIS_INDEX: u64 = 0;

/// Difficulty carried on every new chain.
///
/// Inert: nothing in the protocol reads it. It is kept in the external
/// representation so clients of the original service keep working.
pub const DEFAULT_DIFFICULTY: u32 = 4;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default port for the HTTP API.
pub const DEFAULT_RPC_PORT: u16 = 9090;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 9091;

/// Body of the root endpoint.
pub const WELCOME_MESSAGE: &str = "Welcome to my blockchain";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_distinct() {
        assert_ne!(GENESIS_PRECEDING_HASH, UNLINKED_PRECEDING_HASH);
        assert_ne!(DEFAULT_RPC_PORT, DEFAULT_METRICS_PORT);
    }
}
