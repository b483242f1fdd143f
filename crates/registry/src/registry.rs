//! The file registry: tree + cursor + reverse lookup

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mkfs_merkle::{ContentHasher, Digest, MerkleTree};
use mkfs_prover::{
    BatchVerifier, FoldConfig, FoldInput, LeafClaim, ProofBackend, ProverError, VerificationKey,
};

use crate::error::RegistryError;

/// Shared handle with single-writer discipline: take the write lock for
/// `add`, the read lock for root/witness/verify access.
pub type SharedRegistry = Arc<RwLock<FileRegistry>>;

/// Fixed-capacity content-addressed file registry
///
/// Files get append-only leaf indices; the reverse digest map answers
/// content lookups. Cloning yields an independent copy-on-read snapshot.
#[derive(Clone, Debug)]
pub struct FileRegistry {
    tree: MerkleTree,
    current_index: u64,
    hash_to_index: HashMap<Digest, u64>,
}

impl FileRegistry {
    /// Create an empty registry over a tree of the given height
    pub fn new(height: u32) -> Result<Self, RegistryError> {
        Ok(Self {
            tree: MerkleTree::new(height)?,
            current_index: 0,
            hash_to_index: HashMap::new(),
        })
    }

    pub(crate) fn from_parts(
        tree: MerkleTree,
        current_index: u64,
        hash_to_index: HashMap<Digest, u64>,
    ) -> Self {
        Self { tree, current_index, hash_to_index }
    }

    /// Tree height
    pub fn height(&self) -> u32 {
        self.tree.height()
    }

    /// Leaf capacity
    pub fn capacity(&self) -> u64 {
        self.tree.leaf_count()
    }

    /// Number of files added so far
    pub fn len(&self) -> u64 {
        self.current_index
    }

    /// Whether no file has been added yet
    pub fn is_empty(&self) -> bool {
        self.current_index == 0
    }

    /// Committed root over all leaves
    pub fn root(&self) -> Digest {
        self.tree.root()
    }

    /// The underlying tree, for witness access and batch verification
    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    pub(crate) fn hash_to_index(&self) -> &HashMap<Digest, u64> {
        &self.hash_to_index
    }

    /// Register file content at the next free leaf, returning its index
    ///
    /// Fails with [`RegistryError::CapacityExceeded`] when the tree is
    /// full; the cursor is left untouched in that case. Re-adding the same
    /// content consumes a fresh leaf and repoints the reverse lookup at it.
    pub fn add(&mut self, data: &[u8]) -> Result<u64, RegistryError> {
        if self.current_index >= self.tree.leaf_count() {
            return Err(RegistryError::CapacityExceeded { capacity: self.tree.leaf_count() });
        }

        let digest = ContentHasher::hash_content(data);
        let index = self.current_index;
        self.tree.set_leaf(index, digest)?;
        self.hash_to_index.insert(digest, index);
        self.current_index += 1;
        Ok(index)
    }

    /// Index of the newest leaf holding this digest, if any
    pub fn index_of(&self, digest: &Digest) -> Option<u64> {
        self.hash_to_index.get(digest).copied()
    }

    /// Index of the newest leaf holding this content, if any
    pub fn index_of_content(&self, data: &[u8]) -> Option<u64> {
        self.index_of(&ContentHasher::hash_content(data))
    }

    /// Prove and verify that `data` is the file committed at `index`
    ///
    /// Returns `Ok(false)` for content that does not match the committed
    /// leaf; non-verification is an expected outcome, not an error. An
    /// out-of-range index is caller misuse and fails with
    /// [`mkfs_merkle::MerkleError::InvalidIndex`].
    pub fn verify<B: ProofBackend>(
        &self,
        backend: &B,
        key: &VerificationKey,
        data: &[u8],
        index: u64,
    ) -> Result<bool, RegistryError> {
        let digest = ContentHasher::hash_content(data);
        let witness = self.tree.witness(index)?;

        let input = FoldInput {
            root: self.tree.root(),
            claims: vec![LeafClaim { index, digest, witness }],
            prev: None,
        };
        match backend.prove(&input) {
            Ok(certificate) => Ok(backend.verify(&certificate, key)?),
            // The backend refuses to certify a claim that does not
            // recompute the root; that is the "false" outcome.
            Err(ProverError::ProofConstruction { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify the entire registry content in one recursive fold
    ///
    /// `assignment` must list every leaf's `(index, digest)` pair. The fold
    /// configuration comes from the environment; drive a [`BatchVerifier`]
    /// directly for explicit batch sizes, cancellation, or progress.
    pub fn verify_all<B: ProofBackend>(
        &self,
        backend: &B,
        key: &VerificationKey,
        assignment: &[(u64, Digest)],
    ) -> Result<bool, RegistryError> {
        let mut verifier = BatchVerifier::new(FoldConfig::from_env());
        Ok(verifier.verify_all(backend, key, &self.tree, assignment)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkfs_merkle::{MerkleError, ZERO_DIGEST};
    use mkfs_prover::MockBackend;

    #[test]
    fn test_add_assigns_sequential_indices() {
        let mut registry = FileRegistry::new(4).unwrap();
        let empty_root = registry.root();

        assert_eq!(registry.add(b"first").unwrap(), 0);
        assert_eq!(registry.add(b"second").unwrap(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.capacity(), 8);
        assert_ne!(registry.root(), empty_root);
    }

    #[test]
    fn test_capacity_exceeded_leaves_cursor_unchanged() {
        let mut registry = FileRegistry::new(2).unwrap();
        registry.add(b"a").unwrap();
        registry.add(b"b").unwrap();

        let root = registry.root();
        assert!(matches!(
            registry.add(b"c"),
            Err(RegistryError::CapacityExceeded { capacity: 2 })
        ));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.root(), root);
    }

    #[test]
    fn test_duplicate_content_repoints_lookup() {
        let mut registry = FileRegistry::new(3).unwrap();
        registry.add(b"same").unwrap();
        registry.add(b"same").unwrap();

        // Two leaves consumed, reverse lookup answers the newer one.
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.index_of_content(b"same"), Some(1));
    }

    #[test]
    fn test_unknown_content_lookup_is_none() {
        let mut registry = FileRegistry::new(3).unwrap();
        registry.add(b"known").unwrap();

        assert_eq!(registry.index_of_content(b"unknown"), None);
        assert_eq!(registry.index_of(&ZERO_DIGEST), None);
    }

    #[test]
    fn test_verify_roundtrip() {
        let mut registry = FileRegistry::new(4).unwrap();
        registry.add(b"content A").unwrap();
        registry.add(b"content B").unwrap();

        let backend = MockBackend::new();
        let key = backend.compile().unwrap();

        assert!(registry.verify(&backend, &key, b"content A", 0).unwrap());
        assert!(registry.verify(&backend, &key, b"content B", 1).unwrap());
        // Wrong content or wrong (in-range) index is false, not an error.
        assert!(!registry.verify(&backend, &key, b"content X", 0).unwrap());
        assert!(!registry.verify(&backend, &key, b"content A", 1).unwrap());
        assert!(!registry.verify(&backend, &key, b"content A", 3).unwrap());
    }

    #[test]
    fn test_verify_out_of_range_index_is_structural() {
        let mut registry = FileRegistry::new(3).unwrap();
        registry.add(b"content").unwrap();
        let backend = MockBackend::new();
        let key = backend.compile().unwrap();

        assert!(matches!(
            registry.verify(&backend, &key, b"content", 4),
            Err(RegistryError::Merkle(MerkleError::InvalidIndex { index: 4, .. }))
        ));
    }

    #[test]
    fn test_verify_all_over_registry() {
        let mut registry = FileRegistry::new(4).unwrap();
        registry.add(b"one").unwrap();
        registry.add(b"two").unwrap();

        let backend = MockBackend::new();
        let key = backend.compile().unwrap();

        let mut assignment: Vec<(u64, Digest)> = vec![
            (0, ContentHasher::hash_content(b"one")),
            (1, ContentHasher::hash_content(b"two")),
        ];
        assignment.extend((2..8).map(|i| (i, ZERO_DIGEST)));

        assert!(registry.verify_all(&backend, &key, &assignment).unwrap());

        assignment[4].1 = [0x11; 32];
        assert!(!registry.verify_all(&backend, &key, &assignment).unwrap());
    }
}
