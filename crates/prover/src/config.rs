//! Fold configuration

use std::env;

/// Default claims per fold step
pub const DEFAULT_BATCH_WIDTH: usize = 8;

/// Per-circuit input capacity of the backend
pub const MAX_BATCH_WIDTH: usize = 32;

/// Batch-fold configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoldConfig {
    /// Claims folded per certificate, clamped to `1..=MAX_BATCH_WIDTH`
    pub batch_size: usize,
    /// Threads for witness precomputation; 0 uses the shared rayon pool
    pub precompute_workers: usize,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_WIDTH, precompute_workers: 0 }
    }
}

impl FoldConfig {
    /// Create a config with the given batch size, clamped to the backend's
    /// per-circuit input capacity
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.clamp(1, MAX_BATCH_WIDTH),
            precompute_workers: 0,
        }
    }

    /// Load from environment variables
    ///
    /// `MKFS_BATCH_SIZE` sets the batch width, `MKFS_WITNESS_THREADS` the
    /// witness precomputation pool size.
    pub fn from_env() -> Self {
        let batch_size = env::var("MKFS_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BATCH_WIDTH);
        let precompute_workers = env::var("MKFS_WITNESS_THREADS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        Self { precompute_workers, ..Self::new(batch_size) }
    }
}
