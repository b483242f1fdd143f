//! Proof backend interface and recursive batch-fold protocol
//!
//! The registry consumes proving through the narrow [`ProofBackend`] trait:
//! `compile` produces the verification key once, `prove` turns a typed
//! [`FoldInput`] into an opaque [`Certificate`], `verify` checks a
//! certificate against a key. [`BatchVerifier`] chains certificates across
//! ordered batches of leaves so the whole tree verifies in one protocol run.

pub mod backend;
pub mod batch;
pub mod config;
pub mod mock;

pub use backend::{Certificate, FoldInput, LeafClaim, ProofBackend, ProverError, VerificationKey};
pub use batch::{BatchVerifier, CancelToken, FoldProgress, FoldState};
pub use config::FoldConfig;
pub use mock::MockBackend;
