//! Mock proof backend for running the protocol without a SNARK prover
//!
//! Unlike a throwaway stub, this backend keeps the protocol's semantics:
//! `prove` refuses to certify any claim whose witness does not recompute
//! the public root, and refuses recursive inputs whose inner certificate
//! does not verify. Certificates carry a binding digest over everything
//! that was certified, bincode-encoded as the opaque payload.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mkfs_merkle::{ContentHasher, Digest};

use crate::backend::{Certificate, FoldInput, ProofBackend, ProverError, VerificationKey};

const DEFAULT_CIRCUIT_TAG: &str = "mkfs-fold/v1";

/// What the mock certificate attests to
#[derive(Serialize, Deserialize)]
struct Attestation {
    root: Digest,
    binding: Digest,
    folded_batches: u32,
}

/// One `prove` call as seen by the backend, recorded for tests
#[derive(Clone, Debug)]
pub struct ProveRecord {
    /// Claim indices of the batch, in input order
    pub indices: Vec<u64>,
    /// Whether the input carried a previous certificate
    pub recursive: bool,
}

/// In-process deterministic proof backend
pub struct MockBackend {
    circuit_tag: String,
    log: Mutex<Vec<ProveRecord>>,
}

impl MockBackend {
    /// Create a backend for the default fold circuit
    pub fn new() -> Self {
        Self::with_tag(DEFAULT_CIRCUIT_TAG)
    }

    /// Create a backend for a differently-tagged circuit (its key will not
    /// verify certificates of other tags)
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self { circuit_tag: tag.into(), log: Mutex::new(Vec::new()) }
    }

    /// Number of `prove` calls made so far
    pub fn prove_calls(&self) -> usize {
        self.lock_log().len()
    }

    /// Recorded `prove` calls, oldest first
    pub fn prove_log(&self) -> Vec<ProveRecord> {
        self.lock_log().clone()
    }

    fn lock_log(&self) -> std::sync::MutexGuard<'_, Vec<ProveRecord>> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn circuit_digest(&self) -> Digest {
        ContentHasher::hash_content(self.circuit_tag.as_bytes())
    }

    /// Digest chaining the public root, the previous binding, and every
    /// certified (index, digest) pair
    fn binding(input: &FoldInput, prev_binding: Option<&Digest>) -> Digest {
        let mut buf = Vec::with_capacity(64 + input.claims.len() * 40);
        buf.extend_from_slice(&input.root);
        if let Some(prev) = prev_binding {
            buf.extend_from_slice(prev);
        }
        for claim in &input.claims {
            buf.extend_from_slice(&claim.index.to_le_bytes());
            buf.extend_from_slice(&claim.digest);
        }
        ContentHasher::hash_content(&buf)
    }

    fn decode_attestation(certificate: &Certificate) -> Option<Attestation> {
        bincode::deserialize(&certificate.payload).ok()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofBackend for MockBackend {
    fn compile(&self) -> Result<VerificationKey, ProverError> {
        info!(circuit = %self.circuit_tag, "compiled fold circuit");
        Ok(VerificationKey { circuit_digest: self.circuit_digest() })
    }

    fn prove(&self, input: &FoldInput) -> Result<Certificate, ProverError> {
        if input.claims.is_empty() {
            return Err(ProverError::ProofConstruction {
                reason: "empty claim batch".to_string(),
            });
        }

        for claim in &input.claims {
            if claim.witness.leaf_index != claim.index {
                return Err(ProverError::ProofConstruction {
                    reason: format!(
                        "witness is for leaf {}, claim is for leaf {}",
                        claim.witness.leaf_index, claim.index
                    ),
                });
            }
            if claim.witness.compute_root(&claim.digest) != input.root {
                return Err(ProverError::ProofConstruction {
                    reason: format!("leaf {} does not recompute the root", claim.index),
                });
            }
        }

        let (prev_binding, folded_batches) = match &input.prev {
            Some(prev) => {
                if prev.circuit_digest != self.circuit_digest() {
                    return Err(ProverError::ProofConstruction {
                        reason: "inner certificate was produced by another circuit".to_string(),
                    });
                }
                let attestation = Self::decode_attestation(prev).ok_or_else(|| {
                    ProverError::ProofConstruction {
                        reason: "inner certificate payload is malformed".to_string(),
                    }
                })?;
                if attestation.root != prev.public_root || prev.public_root != input.root {
                    return Err(ProverError::ProofConstruction {
                        reason: "inner certificate does not verify against the root".to_string(),
                    });
                }
                (Some(attestation.binding), attestation.folded_batches + 1)
            }
            None => (None, 1),
        };

        self.lock_log().push(ProveRecord {
            indices: input.claims.iter().map(|c| c.index).collect(),
            recursive: input.prev.is_some(),
        });
        debug!(
            claims = input.claims.len(),
            recursive = input.prev.is_some(),
            folded_batches,
            "certified fold step"
        );

        let attestation = Attestation {
            root: input.root,
            binding: Self::binding(input, prev_binding.as_ref()),
            folded_batches,
        };
        let payload = bincode::serialize(&attestation).map_err(|e| ProverError::Backend {
            reason: format!("attestation encoding failed: {e}"),
        })?;

        Ok(Certificate {
            public_root: input.root,
            circuit_digest: self.circuit_digest(),
            payload,
        })
    }

    fn verify(
        &self,
        certificate: &Certificate,
        key: &VerificationKey,
    ) -> Result<bool, ProverError> {
        if certificate.circuit_digest != key.circuit_digest {
            return Ok(false);
        }
        let Some(attestation) = Self::decode_attestation(certificate) else {
            return Ok(false);
        };
        Ok(attestation.root == certificate.public_root)
    }
}
