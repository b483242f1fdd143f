//! Registry error types

use thiserror::Error;

use mkfs_merkle::MerkleError;
use mkfs_prover::ProverError;

/// Errors raised by registry mutation and verification
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Insert beyond the tree's leaf capacity
    #[error("registry is full, capacity {capacity} leaves")]
    CapacityExceeded { capacity: u64 },

    /// Tree access failure (out-of-range index or depth)
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// Proving-layer failure other than plain non-verification
    #[error(transparent)]
    Prover(#[from] ProverError),
}

/// Errors raised while loading a persisted snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Leaf map key that is not a decimal index
    #[error("invalid leaf index key {0:?}")]
    BadIndexKey(String),

    /// Digest string that is not 32 bytes of hex
    #[error("invalid digest string {0:?}")]
    BadDigest(String),

    /// Cursor beyond the stated tree's capacity
    #[error("current index {cursor} exceeds capacity {capacity}")]
    BadCursor { cursor: u64, capacity: u64 },

    /// Stated height or leaf index outside the tree's range
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// Malformed JSON document
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
