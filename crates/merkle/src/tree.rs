//! Fixed-height sparse Merkle tree

use std::collections::HashMap;

use crate::{ContentHasher, Digest, MerkleError, Witness, MAX_HEIGHT, ZERO_DIGEST};

/// Fixed-height binary Merkle tree with sparse node storage
///
/// Depth 0 is the leaf level, depth `height - 1` holds the root. Unset
/// nodes resolve to the precomputed zero-subtree digest of their depth, so
/// an empty tree's root is the recursive hash of zero leaves.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    height: u32,
    leaf_count: u64,
    /// Set nodes: (depth, index) -> digest
    nodes: HashMap<(u32, u64), Digest>,
    /// Digest of an all-zero subtree rooted at each depth
    zero_digests: Vec<Digest>,
}

impl MerkleTree {
    /// Create an empty tree of the given height
    pub fn new(height: u32) -> Result<Self, MerkleError> {
        if height == 0 || height > MAX_HEIGHT {
            return Err(MerkleError::InvalidHeight { height, max: MAX_HEIGHT });
        }

        let mut zero_digests = Vec::with_capacity(height as usize);
        zero_digests.push(ZERO_DIGEST);
        for depth in 1..height {
            let child = zero_digests[depth as usize - 1];
            zero_digests.push(ContentHasher::hash_pair(&child, &child));
        }

        Ok(Self {
            height,
            leaf_count: 1u64 << (height - 1),
            nodes: HashMap::new(),
            zero_digests,
        })
    }

    /// Build a tree from a contiguous prefix of leaf digests
    pub fn from_leaves(height: u32, leaves: &[Digest]) -> Result<Self, MerkleError> {
        let mut tree = Self::new(height)?;
        if leaves.len() as u64 > tree.leaf_count {
            return Err(MerkleError::InvalidIndex {
                index: leaves.len() as u64 - 1,
                width: tree.leaf_count,
            });
        }
        for (i, leaf) in leaves.iter().enumerate() {
            tree.set_leaf(i as u64, *leaf)?;
        }
        Ok(tree)
    }

    /// Tree height (number of levels, including the root level)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Leaf capacity, `2^(height - 1)`
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// Root digest over all leaves
    pub fn root(&self) -> Digest {
        self.node_digest(self.height - 1, 0)
    }

    /// Set the leaf at `index` and recompute its path to the root
    pub fn set_leaf(&mut self, index: u64, digest: Digest) -> Result<(), MerkleError> {
        if index >= self.leaf_count {
            return Err(MerkleError::InvalidIndex { index, width: self.leaf_count });
        }

        self.nodes.insert((0, index), digest);
        let mut idx = index;
        for depth in 1..self.height {
            idx /= 2;
            let left = self.node_digest(depth - 1, idx * 2);
            let right = self.node_digest(depth - 1, idx * 2 + 1);
            self.nodes.insert((depth, idx), ContentHasher::hash_pair(&left, &right));
        }
        Ok(())
    }

    /// Digest at a given depth and index, for inspection and serialization
    pub fn node(&self, depth: u32, index: u64) -> Result<Digest, MerkleError> {
        if depth >= self.height {
            return Err(MerkleError::InvalidDepth { depth, height: self.height });
        }
        let width = self.level_width(depth);
        if index >= width {
            return Err(MerkleError::InvalidIndex { index, width });
        }
        Ok(self.node_digest(depth, index))
    }

    /// Sibling path for the leaf at `index`, bottom-up, `height - 1` entries
    pub fn witness(&self, index: u64) -> Result<Witness, MerkleError> {
        if index >= self.leaf_count {
            return Err(MerkleError::InvalidIndex { index, width: self.leaf_count });
        }

        let mut siblings = Vec::with_capacity(self.height as usize - 1);
        for depth in 0..self.height - 1 {
            let sibling_index = (index >> depth) ^ 1;
            siblings.push(self.node_digest(depth, sibling_index));
        }
        Ok(Witness { leaf_index: index, siblings })
    }

    fn level_width(&self, depth: u32) -> u64 {
        1u64 << (self.height - 1 - depth)
    }

    fn node_digest(&self, depth: u32, index: u64) -> Digest {
        self.nodes
            .get(&(depth, index))
            .copied()
            .unwrap_or(self.zero_digests[depth as usize])
    }
}
