// circuitgate-orchestrator/src/error.rs
// ============================================================================
// Module: Orchestrator Error
// Description: The single error type `process` can return.
// Purpose: Give every failure in the pipeline a stable variant while
//          still letting `process` itself decide, per variant, whether the
//          task was already transitioned to FAILED before returning.
// Dependencies: circuitgate-core, circuitgate-extract, circuitgate-validate
// ============================================================================

//! ## Overview
//! §4.9's closing line — "any exception not explicitly handled transitions
//! the Task to FAILED with the error message" — is implemented by
//! `pipeline::process` catching every variant below and attempting a
//! best-effort CAS to `FAILED` before propagating. The broker's worker
//! loop (`circuitgate-broker::worker::run_worker`) only needs a
//! `Display`-able error, so the CLI layer maps this type with
//! `.map_err(|e| e.to_string())`.

use circuitgate_core::AnalysisStoreError;
use circuitgate_core::AuditStoreError;
use circuitgate_core::FindingStoreError;
use circuitgate_core::ObjectStoreError;
use circuitgate_core::TaskId;
use circuitgate_core::TaskStoreError;
use circuitgate_core::TestType;
use circuitgate_extract::Classification;
use circuitgate_extract::ExtractorError;

use crate::decode::DecodeError;

/// Errors from running the pipeline for one task.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The task store failed.
    #[error("task store error: {0}")]
    TaskStore(#[from] TaskStoreError),
    /// The analysis store failed.
    #[error("analysis store error: {0}")]
    AnalysisStore(#[from] AnalysisStoreError),
    /// The finding store failed.
    #[error("finding store error: {0}")]
    FindingStore(#[from] FindingStoreError),
    /// The audit store failed.
    #[error("audit store error: {0}")]
    AuditStore(#[from] AuditStoreError),
    /// The object store failed.
    #[error("object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),
    /// The downloaded artifact could not be decoded.
    #[error("artifact decode error: {0}")]
    Decode(#[from] DecodeError),
    /// The document's test type could not be classified.
    #[error("classification error: document did not match any known test type")]
    Classification,
    /// A per-flavor extractor failed.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractorError),
    /// The task's identifier has no corresponding row in the task store.
    #[error("task {0} was not found")]
    TaskNotFound(TaskId),
    /// The downloaded artifact exceeds the ingestion size ceiling.
    #[error("artifact is {actual} bytes, exceeding the {max} byte ceiling")]
    ArtifactTooLarge {
        /// The artifact's actual size in bytes.
        actual: u64,
        /// The enforced ceiling in bytes.
        max: u64,
    },
    /// Batching produced no thermography result even though at least one
    /// batch was submitted; indicates an invariant violation in the
    /// batching helper rather than a reachable runtime condition.
    #[error("thermography batching produced no merged result")]
    EmptyThermographyBatch,
}

/// Maps a classifier outcome to a `Result`, used once by `pipeline::process`.
pub(crate) fn require_known(classification: Classification) -> Result<TestType, OrchestratorError> {
    match classification {
        Classification::Known(test_type) => Ok(test_type),
        Classification::Unknown => Err(OrchestratorError::Classification),
    }
}
