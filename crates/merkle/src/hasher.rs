//! Keccak256 hashing for file content and tree nodes

use tiny_keccak::{Hasher, Keccak};

use crate::Digest;

/// Keccak256 hasher behind the registry's narrow hashing interface
///
/// Content and interior-node hashing are domain-separated with one-byte
/// prefixes so no file content can collide with a node's child
/// concatenation.
pub struct ContentHasher;

impl ContentHasher {
    /// Hash arbitrary file content into a leaf digest
    pub fn hash_content(data: &[u8]) -> Digest {
        let mut hasher = Keccak::v256();
        hasher.update(&[0x00]); // Leaf prefix
        hasher.update(data);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }

    /// Hash two child digests into their parent node
    pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
        let mut hasher = Keccak::v256();
        hasher.update(&[0x01]); // Node prefix
        hasher.update(left);
        hasher.update(right);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }
}
