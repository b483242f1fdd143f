//! Recursive batch-fold verification of a whole tree

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use tracing::{info, warn};

use mkfs_merkle::{Digest, MerkleError, MerkleTree};

use crate::backend::{Certificate, FoldInput, LeafClaim, ProofBackend, ProverError, VerificationKey};
use crate::config::{FoldConfig, MAX_BATCH_WIDTH};

/// Fold progress, terminal on the first failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoldState {
    /// No fold started yet
    Empty,
    /// Folding the given batch index
    Accumulating(usize),
    /// Final certificate verified
    Complete,
    /// Aborted: bad input, refused certificate, cancellation, or backend fault
    Failed,
}

/// Shared read handle onto a fold's state
///
/// Clone it before starting a fold to watch `Accumulating(i)` advance from
/// another thread while `verify_all` holds the verifier.
#[derive(Clone, Debug)]
pub struct FoldProgress {
    inner: Arc<Mutex<FoldState>>,
}

impl FoldProgress {
    fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(FoldState::Empty)) }
    }

    /// Current fold state
    pub fn get(&self) -> FoldState {
        *self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set(&self, state: FoldState) {
        *self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }
}

/// Coarse cancellation flag, checked between batch steps only
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect before the next batch step
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Verifies a complete leaf assignment against the tree's root by folding
/// fixed-size batches into a single recursive certificate
///
/// The fold is strictly sequential: each certificate is the next step's
/// private input, so batches cannot be proven out of order or in parallel.
/// Witness precomputation is independent per batch and runs on the rayon
/// pool before the fold starts.
pub struct BatchVerifier {
    config: FoldConfig,
    progress: FoldProgress,
}

impl BatchVerifier {
    /// Create a verifier with the given fold configuration
    pub fn new(config: FoldConfig) -> Self {
        Self { config, progress: FoldProgress::new() }
    }

    /// Current fold state
    pub fn state(&self) -> FoldState {
        self.progress.get()
    }

    /// Shared handle for watching the fold from another thread
    pub fn progress(&self) -> FoldProgress {
        self.progress.clone()
    }

    /// Verify that `assignment` is exactly the tree's leaf content
    ///
    /// `assignment` must hold one `(index, digest)` pair per leaf, in index
    /// order. Returns `Ok(false)` when any pair does not match the
    /// committed tree; fails with [`ProverError::InvalidInput`] on a length
    /// mismatch or [`ProverError::InvalidAssignment`] on duplicated or
    /// misplaced indices, before any proving work begins.
    pub fn verify_all<B: ProofBackend>(
        &mut self,
        backend: &B,
        key: &VerificationKey,
        tree: &MerkleTree,
        assignment: &[(u64, Digest)],
    ) -> Result<bool, ProverError> {
        self.verify_all_with_cancel(backend, key, tree, assignment, &CancelToken::new())
    }

    /// Like [`Self::verify_all`], checking `cancel` between batch steps
    pub fn verify_all_with_cancel<B: ProofBackend>(
        &mut self,
        backend: &B,
        key: &VerificationKey,
        tree: &MerkleTree,
        assignment: &[(u64, Digest)],
        cancel: &CancelToken,
    ) -> Result<bool, ProverError> {
        if assignment.len() as u64 != tree.leaf_count() {
            self.progress.set(FoldState::Failed);
            return Err(ProverError::InvalidInput {
                expected: tree.leaf_count(),
                actual: assignment.len(),
            });
        }
        // Length alone does not prove coverage: a duplicated index would
        // leave some other leaf unchecked while the fold still verifies.
        for (position, &(index, _)) in assignment.iter().enumerate() {
            if index != position as u64 {
                self.progress.set(FoldState::Failed);
                return Err(ProverError::InvalidAssignment { position, index });
            }
        }

        // Witnesses are independent per claim; compute them all up front,
        // on a bounded pool when the config asks for one.
        let batch_size = self.config.batch_size.clamp(1, MAX_BATCH_WIDTH);
        let compute = || -> Result<Vec<Vec<LeafClaim>>, MerkleError> {
            assignment
                .par_chunks(batch_size)
                .map(|batch| {
                    batch
                        .iter()
                        .map(|&(index, digest)| {
                            tree.witness(index).map(|witness| LeafClaim { index, digest, witness })
                        })
                        .collect()
                })
                .collect()
        };
        let claim_batches = if self.config.precompute_workers > 0 {
            let pool = match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.precompute_workers)
                .build()
            {
                Ok(pool) => pool,
                Err(e) => {
                    self.progress.set(FoldState::Failed);
                    return Err(ProverError::Backend {
                        reason: format!("witness pool construction failed: {e}"),
                    });
                }
            };
            pool.install(compute)
        } else {
            compute()
        };
        let claim_batches = match claim_batches {
            Ok(batches) => batches,
            Err(e) => {
                self.progress.set(FoldState::Failed);
                return Err(e.into());
            }
        };

        let root = tree.root();
        let total = claim_batches.len();
        info!(batches = total, batch_size, "starting recursive fold");

        let mut prev: Option<Certificate> = None;
        for (batch_index, claims) in claim_batches.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(batch = batch_index, "fold cancelled");
                self.progress.set(FoldState::Failed);
                return Err(ProverError::Cancelled { batch: batch_index });
            }
            self.progress.set(FoldState::Accumulating(batch_index));

            let input = FoldInput { root, claims, prev: prev.take() };
            match backend.prove(&input) {
                Ok(certificate) => prev = Some(certificate),
                Err(ProverError::ProofConstruction { reason }) => {
                    // The batch does not match the committed tree; this is a
                    // terminal non-verification, not a structural error.
                    warn!(batch = batch_index, %reason, "fold aborted");
                    self.progress.set(FoldState::Failed);
                    return Ok(false);
                }
                Err(e) => {
                    self.progress.set(FoldState::Failed);
                    return Err(e);
                }
            }
        }

        let Some(certificate) = prev else {
            // Unreachable for height >= 1 trees; fail loudly rather than
            // report a vacuous success.
            self.progress.set(FoldState::Failed);
            return Err(ProverError::Backend { reason: "fold produced no certificate".to_string() });
        };

        match backend.verify(&certificate, key) {
            Ok(true) => {
                info!(batches = total, "recursive fold verified");
                self.progress.set(FoldState::Complete);
                Ok(true)
            }
            Ok(false) => {
                warn!("final certificate did not verify");
                self.progress.set(FoldState::Failed);
                Ok(false)
            }
            Err(e) => {
                self.progress.set(FoldState::Failed);
                Err(e)
            }
        }
    }
}
