//! End-to-end registry scenario: a height-8 tree (128 leaves), one real
//! file, single-file proof and whole-tree recursive fold.

use anyhow::Result;
use rand::RngCore;

use mkfs_merkle::{ContentHasher, Digest, ZERO_DIGEST};
use mkfs_prover::{BatchVerifier, FoldConfig, MockBackend, ProofBackend, ProverError};
use mkfs_registry::{FileRegistry, RegistryError, Snapshot};

fn random_file(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

#[test]
fn height_eight_registry_end_to_end() -> Result<()> {
    let mut registry = FileRegistry::new(8)?;
    assert_eq!(registry.capacity(), 128);

    let file = random_file(4096);
    assert_eq!(registry.add(&file)?, 0);
    assert_eq!(registry.index_of_content(&file), Some(0));

    let backend = MockBackend::new();
    let key = backend.compile()?;

    // Single-file membership.
    assert!(registry.verify(&backend, &key, &file, 0)?);

    let mut flipped = file.clone();
    flipped[100] ^= 0x01;
    assert!(!registry.verify(&backend, &key, &flipped, 0)?);
    assert!(!registry.verify(&backend, &key, &file, 1)?);

    // Whole-tree fold: the real file at index 0, zero digests elsewhere.
    let mut assignment: Vec<(u64, Digest)> = vec![(0, ContentHasher::hash_content(&file))];
    assignment.extend((1..128).map(|i| (i, ZERO_DIGEST)));
    assert!(registry.verify_all(&backend, &key, &assignment)?);

    // Any single mismatched entry makes the fold fail.
    let mut altered = assignment.clone();
    altered[77].1 = [0x42; 32];
    assert!(!registry.verify_all(&backend, &key, &altered)?);

    // A short assignment is refused before any proving work.
    let probe = MockBackend::new();
    let mut verifier = BatchVerifier::new(FoldConfig::default());
    let result = verifier.verify_all(&probe, &key, registry.tree(), &assignment[..127]);
    assert!(matches!(
        result,
        Err(ProverError::InvalidInput { expected: 128, actual: 127 })
    ));
    assert_eq!(probe.prove_calls(), 0);

    Ok(())
}

#[test]
fn capacity_is_exactly_leaf_count() -> Result<()> {
    let mut registry = FileRegistry::new(8)?;
    for i in 0..128u32 {
        registry.add(&i.to_le_bytes())?;
    }
    assert_eq!(registry.len(), 128);

    // The 129th add fails and the cursor stays put.
    assert!(matches!(
        registry.add(b"one too many"),
        Err(RegistryError::CapacityExceeded { capacity: 128 })
    ));
    assert_eq!(registry.len(), 128);
    Ok(())
}

#[test]
fn snapshot_survives_json_round_trip_and_still_verifies() -> Result<()> {
    let mut registry = FileRegistry::new(8)?;
    let file = random_file(512);
    registry.add(&file)?;

    let raw = registry.snapshot().to_json()?;
    let restored = FileRegistry::from_snapshot(&Snapshot::from_json(&raw)?)?;
    assert_eq!(restored.root(), registry.root());

    let backend = MockBackend::new();
    let key = backend.compile()?;
    assert!(restored.verify(&backend, &key, &file, 0)?);
    Ok(())
}
