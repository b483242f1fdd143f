//! Proof backend interface: typed circuit inputs, certificates, keys

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mkfs_merkle::{Digest, MerkleError, Witness};

/// Errors raised by the proving layer
///
/// Cryptographic non-verification is never an error: `verify` returns
/// `Ok(false)` and the batch fold maps a refused certificate to `Ok(false)`.
#[derive(Debug, Error)]
pub enum ProverError {
    /// Batch-verify assignment does not cover the tree exactly
    #[error("assignment holds {actual} entries, tree has {expected} leaves")]
    InvalidInput { expected: u64, actual: usize },

    /// Assignment entry out of place: pairs must cover leaves
    /// `0..leaf_count` in order, no duplicates, no gaps
    #[error("assignment entry {position} claims leaf {index}, expected leaf {position}")]
    InvalidAssignment { position: usize, index: u64 },

    /// Backend cannot build a certificate from structurally bad inputs
    #[error("proof construction failed: {reason}")]
    ProofConstruction { reason: String },

    /// Fold cancelled between batch steps
    #[error("fold cancelled before batch {batch}")]
    Cancelled { batch: usize },

    /// Witness computation failed
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// Backend infrastructure fault (callers may retry these)
    #[error("backend failure: {reason}")]
    Backend { reason: String },
}

/// Public artifact required to check any certificate of a given circuit
///
/// Produced by [`ProofBackend::compile`] and threaded explicitly into every
/// `verify` call; never process-wide state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    /// Digest identifying the compiled circuit
    pub circuit_digest: Digest,
}

/// Opaque proof object bound to a public root
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Public input the certificate commits to
    pub public_root: Digest,
    /// Circuit the certificate was produced by
    pub circuit_digest: Digest,
    /// Backend-opaque attestation bytes
    pub payload: Vec<u8>,
}

/// One leaf's claim inside a fold step: its digest plus the sibling path
/// that must recompute the public root
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafClaim {
    /// Leaf index in the committed tree
    pub index: u64,
    /// Claimed content digest at that leaf
    pub digest: Digest,
    /// Sibling path for the leaf
    pub witness: Witness,
}

/// Input to one fold step
///
/// `prev: None` is the base case (prove this batch alone); `prev: Some` is
/// the recursive case (prove the previous certificate verifies AND this
/// batch recomputes the root).
#[derive(Clone, Debug)]
pub struct FoldInput {
    /// Public input: the committed root every claim must recompute
    pub root: Digest,
    /// Claims of this batch, in ascending index order
    pub claims: Vec<LeafClaim>,
    /// Previous certificate for recursive steps
    pub prev: Option<Certificate>,
}

/// Narrow interface to the cryptographic proving backend
pub trait ProofBackend {
    /// One-time circuit compilation; idempotent
    fn compile(&self) -> Result<VerificationKey, ProverError>;

    /// Produce a certificate for one fold step
    ///
    /// Fails with [`ProverError::ProofConstruction`] when the inputs are
    /// structurally inconsistent, e.g. a witness that does not recompute
    /// the claimed root or an inner certificate that does not verify.
    fn prove(&self, input: &FoldInput) -> Result<Certificate, ProverError>;

    /// Check a certificate against a verification key
    fn verify(
        &self,
        certificate: &Certificate,
        key: &VerificationKey,
    ) -> Result<bool, ProverError>;
}
