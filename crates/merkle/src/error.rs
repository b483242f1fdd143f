//! Merkle tree error types

use thiserror::Error;

/// Errors raised by tree construction and access
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    /// Height outside the supported `1..=MAX_HEIGHT` range
    #[error("invalid tree height {height}, expected 1..={max}")]
    InvalidHeight { height: u32, max: u32 },

    /// Leaf or node index beyond the level's width
    #[error("index {index} out of range, level holds {width} nodes")]
    InvalidIndex { index: u64, width: u64 },

    /// Node depth at or beyond the tree height
    #[error("depth {depth} out of range for tree of height {height}")]
    InvalidDepth { depth: u32, height: u32 },
}
