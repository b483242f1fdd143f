//! Inclusion witnesses

use serde::{Deserialize, Serialize};

use crate::{ContentHasher, Digest};

/// Sibling path proving one leaf's inclusion under a root
///
/// Siblings are ordered bottom-up; the path bits are derived from
/// `leaf_index` (bit `d` selects the leaf's side at depth `d`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// Index of the leaf this witness belongs to
    pub leaf_index: u64,
    /// Sibling digests from leaf level to just below the root
    pub siblings: Vec<Digest>,
}

impl Witness {
    /// Fold a leaf digest through the sibling path to recompute the root
    pub fn compute_root(&self, leaf: &Digest) -> Digest {
        let mut current = *leaf;
        for (depth, sibling) in self.siblings.iter().enumerate() {
            let is_right = (self.leaf_index >> depth) & 1 == 1;
            current = if is_right {
                ContentHasher::hash_pair(sibling, &current)
            } else {
                ContentHasher::hash_pair(&current, sibling)
            };
        }
        current
    }
}
