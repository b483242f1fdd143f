//! Content-addressed Merkle file registry (MKFS)
//!
//! A [`FileRegistry`] commits file content digests into a fixed-height
//! Merkle tree with append-only indices and a reverse digest-to-index map.
//! Single-file membership is proven through the proof backend; the whole
//! registry verifies in one recursive fold via `mkfs-prover`.

mod error;
mod registry;
mod snapshot;

pub use error::{RegistryError, SnapshotError};
pub use registry::{FileRegistry, SharedRegistry};
pub use snapshot::Snapshot;
