//! Snapshot persistence
//!
//! The persisted layout mirrors the registry verbatim:
//!
//! ```json
//! {
//!   "data": { "<leafIndex>": "<digestHex>", ... },
//!   "fileHashToIndex": { "<digestHex>": <index>, ... },
//!   "height": 8,
//!   "currentIndex": 1
//! }
//! ```
//!
//! Every leaf is emitted, set or not, so a snapshot restores the exact
//! tree and `from_snapshot(to_snapshot(x)).root() == x.root()` holds.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use mkfs_merkle::{Digest, MerkleTree, ZERO_DIGEST};

use crate::error::SnapshotError;
use crate::registry::FileRegistry;

/// Serialized registry state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Leaf digests keyed by decimal index
    pub data: BTreeMap<String, String>,
    /// Reverse lookup, digest hex to leaf index
    #[serde(rename = "fileHashToIndex")]
    pub file_hash_to_index: BTreeMap<String, u64>,
    /// Tree height
    pub height: u32,
    /// Append cursor
    #[serde(rename = "currentIndex")]
    pub current_index: u64,
}

impl Snapshot {
    /// Render as a JSON document
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from a JSON document
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl FileRegistry {
    /// Capture the full registry state
    pub fn snapshot(&self) -> Snapshot {
        let data = (0..self.capacity())
            .map(|i| {
                let digest = self.tree().node(0, i).unwrap_or(ZERO_DIGEST);
                (i.to_string(), hex::encode(digest))
            })
            .collect();
        let file_hash_to_index = self
            .hash_to_index()
            .iter()
            .map(|(digest, index)| (hex::encode(digest), *index))
            .collect();

        Snapshot {
            data,
            file_hash_to_index,
            height: self.height(),
            current_index: self.len(),
        }
    }

    /// Rebuild a registry from a snapshot; the restored root equals the
    /// captured one
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, SnapshotError> {
        let mut tree = MerkleTree::new(snapshot.height)?;
        if snapshot.current_index > tree.leaf_count() {
            return Err(SnapshotError::BadCursor {
                cursor: snapshot.current_index,
                capacity: tree.leaf_count(),
            });
        }

        for (key, value) in &snapshot.data {
            let index: u64 = key
                .parse()
                .map_err(|_| SnapshotError::BadIndexKey(key.clone()))?;
            let digest = parse_digest(value)?;
            if digest != ZERO_DIGEST {
                tree.set_leaf(index, digest)?;
            }
        }

        let mut hash_to_index = HashMap::with_capacity(snapshot.file_hash_to_index.len());
        for (key, index) in &snapshot.file_hash_to_index {
            hash_to_index.insert(parse_digest(key)?, *index);
        }

        Ok(Self::from_parts(tree, snapshot.current_index, hash_to_index))
    }
}

fn parse_digest(s: &str) -> Result<Digest, SnapshotError> {
    let bytes = hex::decode(s).map_err(|_| SnapshotError::BadDigest(s.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| SnapshotError::BadDigest(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_registry() -> FileRegistry {
        let mut registry = FileRegistry::new(4).unwrap();
        registry.add(b"alpha").unwrap();
        registry.add(b"beta").unwrap();
        registry.add(b"gamma").unwrap();
        registry
    }

    #[test]
    fn test_snapshot_round_trip_preserves_root() {
        let registry = populated_registry();
        let restored = FileRegistry::from_snapshot(&registry.snapshot()).unwrap();

        assert_eq!(restored.root(), registry.root());
        assert_eq!(restored.height(), registry.height());
        assert_eq!(restored.len(), registry.len());
        assert_eq!(restored.index_of_content(b"beta"), Some(1));
    }

    #[test]
    fn test_json_round_trip() {
        let registry = populated_registry();
        let raw = registry.snapshot().to_json().unwrap();
        let restored = FileRegistry::from_snapshot(&Snapshot::from_json(&raw).unwrap()).unwrap();
        assert_eq!(restored.root(), registry.root());
    }

    #[test]
    fn test_snapshot_layout() {
        let registry = populated_registry();
        let value: serde_json::Value =
            serde_json::from_str(&registry.snapshot().to_json().unwrap()).unwrap();

        assert_eq!(value["height"], 4);
        assert_eq!(value["currentIndex"], 3);
        // Every leaf is emitted, set or not.
        assert_eq!(value["data"].as_object().unwrap().len(), 8);
        assert_eq!(value["fileHashToIndex"].as_object().unwrap().len(), 3);
        assert_eq!(value["data"]["7"], hex::encode(ZERO_DIGEST));
    }

    #[test]
    fn test_bad_digest_is_rejected() {
        let mut snapshot = populated_registry().snapshot();
        snapshot
            .data
            .insert("0".to_string(), "not-hex".to_string());
        assert!(matches!(
            FileRegistry::from_snapshot(&snapshot),
            Err(SnapshotError::BadDigest(_))
        ));
    }

    #[test]
    fn test_bad_index_key_is_rejected() {
        let mut snapshot = populated_registry().snapshot();
        let digest = snapshot.data["0"].clone();
        snapshot.data.insert("leaf-zero".to_string(), digest);
        assert!(matches!(
            FileRegistry::from_snapshot(&snapshot),
            Err(SnapshotError::BadIndexKey(_))
        ));
    }

    #[test]
    fn test_cursor_beyond_capacity_is_rejected() {
        let mut snapshot = populated_registry().snapshot();
        snapshot.current_index = 9;
        assert!(matches!(
            FileRegistry::from_snapshot(&snapshot),
            Err(SnapshotError::BadCursor { cursor: 9, capacity: 8 })
        ));
    }
}
