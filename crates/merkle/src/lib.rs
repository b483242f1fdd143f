//! Fixed-height binary Merkle tree over content digests
//!
//! This crate provides the commitment layer of the file registry:
//! - Fixed height: leaf capacity is `2^(height - 1)`, decided at construction
//! - Sparse storage: unset leaves resolve to a per-depth zero-subtree digest
//! - Witness generation: bottom-up sibling paths that recompute the root

mod error;
mod hasher;
mod tree;
mod witness;

pub use error::MerkleError;
pub use hasher::ContentHasher;
pub use tree::MerkleTree;
pub use witness::Witness;

/// 32-byte digest type
pub type Digest = [u8; 32];

/// Canonical digest of an unset leaf
pub const ZERO_DIGEST: Digest = [0u8; 32];

/// Maximum supported tree height (keeps `leaf_count` within `u64`)
pub const MAX_HEIGHT: u32 = 63;
