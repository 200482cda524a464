// circuitgate-core/src/interfaces.rs
// ============================================================================
// Module: Circuitgate Interfaces
// Description: Backend-agnostic interfaces for storage, extraction, and
//              dispatch.
// Purpose: Define the contract surfaces the orchestrator and HTTP layer
//          depend on without embedding backend-specific details.
// Dependencies: crate::entities, crate::extraction, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the rest of the workspace integrates with external
//! systems — the relational store, the object store, the LLM provider, the
//! job broker, the report renderer — without any of those backends leaking
//! into `circuitgate-core`, `circuitgate-validate`, or
//! `circuitgate-orchestrator`. Implementations must fail closed on missing
//! or invalid data.

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::entities::Analysis;
use crate::entities::AuditEvent;
use crate::entities::AuditEventType;
use crate::entities::Finding;
use crate::entities::Task;
use crate::entities::TaskStatus;
use crate::entities::User;
use crate::identifiers::AnalysisId;
use crate::identifiers::TaskId;
use crate::identifiers::UserId;

// ============================================================================
// SECTION: User Store
// ============================================================================

/// User store errors.
#[derive(Debug, Error)]
pub enum UserStoreError {
    /// Store I/O error.
    #[error("user store io error: {0}")]
    Io(String),
    /// The email address is already registered.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
}

/// Persistence for the `User` entity backing the auth subsystem. The auth
/// subsystem itself is an external collaborator per §1; this trait exists
/// only so `circuitgate-api` can exercise real ownership checks end to end.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a newly registered user.
    ///
    /// # Errors
    ///
    /// Returns [`UserStoreError::DuplicateEmail`] when the email is already
    /// registered, or [`UserStoreError::Io`] on any other store failure.
    async fn create(&self, user: &User) -> Result<(), UserStoreError>;

    /// Loads a user by email, used during login.
    ///
    /// # Errors
    ///
    /// Returns [`UserStoreError`] when loading fails.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    /// Loads a user by identifier, used to resolve a bearer token's subject.
    ///
    /// # Errors
    ///
    /// Returns [`UserStoreError`] when loading fails.
    async fn get(&self, user_id: UserId) -> Result<Option<User>, UserStoreError>;
}

// ============================================================================
// SECTION: Task Store
// ============================================================================

/// Task store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// Store I/O error.
    #[error("task store io error: {0}")]
    Io(String),
    /// Store data is invalid or fails deserialization.
    #[error("task store invalid data: {0}")]
    Invalid(String),
    /// A compare-and-set status transition lost the race or was illegal.
    #[error("task store conflict: {0}")]
    Conflict(String),
}

/// Transactional persistence for tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a newly created task with status `QUEUED`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when persistence fails.
    async fn create(&self, task: &Task) -> Result<(), TaskStoreError>;

    /// Loads a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when loading fails.
    async fn get(&self, task_id: TaskId) -> Result<Option<Task>, TaskStoreError>;

    /// Atomically transitions a task's status, succeeding only if the
    /// task's current persisted status equals `expected`. Returns `false`
    /// without error when the compare fails — the caller (orchestrator)
    /// treats that as a non-side-effecting re-entry, not a failure.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when the store itself fails.
    async fn compare_and_set_status(
        &self,
        task_id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
        error_message: Option<&str>,
    ) -> Result<bool, TaskStoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when the store is unavailable.
    async fn readiness(&self) -> Result<(), TaskStoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Analysis Store
// ============================================================================

/// Sort key for paged analysis listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSortBy {
    /// Sort by creation time.
    CreatedAt,
    /// Sort by compliance score.
    ComplianceScore,
}

/// Sort order for paged analysis listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// A filter over analyses owned by a single user.
#[derive(Debug, Clone, Default)]
pub struct AnalysisFilter {
    /// Restrict to analyses whose verdict equals this value, when set.
    pub status_filter: Option<crate::entities::Verdict>,
    /// Restrict to analyses created at or after this time, when set.
    pub date_from: Option<time::OffsetDateTime>,
    /// Restrict to analyses created at or before this time, when set.
    pub date_to: Option<time::OffsetDateTime>,
}

/// A single page of a listing, plus the pagination metadata needed to
/// reconstruct the full result set across repeated calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// The page number returned (1-indexed).
    pub page: u32,
    /// Items requested per page.
    pub per_page: u32,
    /// Total number of pages, `ceil(total / per_page)`.
    pub total_pages: u32,
}

/// Analysis store errors.
#[derive(Debug, Error)]
pub enum AnalysisStoreError {
    /// Store I/O error.
    #[error("analysis store io error: {0}")]
    Io(String),
    /// Store data is invalid or fails deserialization.
    #[error("analysis store invalid data: {0}")]
    Invalid(String),
}

/// Transactional persistence for analyses.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persists a newly created analysis.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisStoreError`] when persistence fails.
    async fn create(&self, analysis: &Analysis) -> Result<(), AnalysisStoreError>;

    /// Replaces a previously persisted analysis (used for verdict/score
    /// updates and reviewer mutations).
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisStoreError`] when persistence fails.
    async fn update(&self, analysis: &Analysis) -> Result<(), AnalysisStoreError>;

    /// Loads an analysis by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisStoreError`] when loading fails.
    async fn get(&self, analysis_id: AnalysisId) -> Result<Option<Analysis>, AnalysisStoreError>;

    /// Loads the analysis produced by a given task, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisStoreError`] when loading fails.
    async fn get_by_task(&self, task_id: TaskId) -> Result<Option<Analysis>, AnalysisStoreError>;

    /// Lists analyses owned by `owner`, applying `filter`, sorted by
    /// `sort_by`/`sort_order`, 1-indexed at `page` with `per_page` items
    /// per page. Nulls in `compliance_score` sort last ascending, first
    /// descending.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisStoreError`] when listing fails.
    async fn list(
        &self,
        owner: UserId,
        filter: &AnalysisFilter,
        sort_by: AnalysisSortBy,
        sort_order: SortOrder,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Analysis>, AnalysisStoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisStoreError`] when the store is unavailable.
    async fn readiness(&self) -> Result<(), AnalysisStoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Finding Store
// ============================================================================

/// Finding store errors.
#[derive(Debug, Error)]
pub enum FindingStoreError {
    /// Store I/O error.
    #[error("finding store io error: {0}")]
    Io(String),
}

/// Transactional persistence for findings.
#[async_trait]
pub trait FindingStore: Send + Sync {
    /// Persists a batch of findings for one analysis in a single
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`FindingStoreError`] when persistence fails.
    async fn create_many(&self, findings: &[Finding]) -> Result<(), FindingStoreError>;

    /// Lists findings for an analysis.
    ///
    /// # Errors
    ///
    /// Returns [`FindingStoreError`] when listing fails.
    async fn list_by_analysis(
        &self,
        analysis_id: AnalysisId,
    ) -> Result<Vec<Finding>, FindingStoreError>;
}

// ============================================================================
// SECTION: Audit Store
// ============================================================================

/// Audit store errors.
#[derive(Debug, Error)]
pub enum AuditStoreError {
    /// Store I/O error.
    #[error("audit store io error: {0}")]
    Io(String),
}

/// Append-only persistence for audit events. Implementations must reject
/// updates and deletes; the trait offers no mutating operation beyond
/// `append`.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Appends a single audit event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditStoreError`] when the append fails.
    async fn append(&self, event: &AuditEvent) -> Result<(), AuditStoreError>;

    /// Lists events for an analysis in timestamp order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditStoreError`] when listing fails.
    async fn list_by_analysis(
        &self,
        analysis_id: AnalysisId,
    ) -> Result<Vec<AuditEvent>, AuditStoreError>;
}

/// Convenience used by callers that only need to know an event's type
/// matched what they expected (e.g. verifying a `finding_generated` event
/// precedes its finding). Not part of the trait; a free function over
/// `AuditEvent` is sufficient and keeps the store interface minimal.
#[must_use]
pub fn events_of_type(events: &[AuditEvent], event_type: AuditEventType) -> Vec<&AuditEvent> {
    events.iter().filter(|e| e.event_type == event_type).collect()
}

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// The maximum size, in bytes, of any single ingested artifact (§4.1:
/// "byte size ≤ 50 MiB"). Enforced both by the ingestion API on write and
/// by the orchestrator's decode step on read.
pub const MAX_ARTIFACT_BYTES: u64 = 50 * 1024 * 1024;

/// Object store errors.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// Upstream write error.
    #[error("object store write error: {0}")]
    Write(String),
    /// Upstream read error.
    #[error("object store read error: {0}")]
    Read(String),
    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
}

/// Streamed object storage, keyed by `{task_id}/{filename}`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Streams `content` to `key`, never buffering the full payload.
    /// Implementations read from `content` in bounded chunks and must
    /// reject (without a partial write left readable) a stream whose
    /// actual length exceeds `max_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the write fails or `max_bytes` is
    /// exceeded.
    async fn put_stream(
        &self,
        key: &str,
        content: &mut (dyn tokio::io::AsyncRead + Send + Unpin),
        max_bytes: u64,
    ) -> Result<u64, ObjectStoreError>;

    /// Reads the full object at `key` into memory. Used only by
    /// components that already know the object is bounded (e.g. the
    /// orchestrator's decode step, which enforces the same 50 MiB ceiling
    /// that ingestion enforced on write).
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the read fails or the object is
    /// absent.
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the store is unavailable.
    async fn readiness(&self) -> Result<(), ObjectStoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Extraction Client
// ============================================================================

/// A single content block submitted to the LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContentBlock {
    /// Plain text content.
    Text(String),
    /// A base64-encoded image, with its content type (e.g. `"image/png"`).
    Image {
        /// Base64-encoded image bytes.
        base64_data: String,
        /// Image content type.
        content_type: String,
    },
}

/// Metadata returned alongside an extracted value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// LLM model identifier.
    pub model_version: String,
    /// Prompt version used for this call.
    pub prompt_version: String,
    /// Prompt token count, when reported by the provider.
    pub prompt_tokens: Option<u64>,
    /// Completion token count, when reported by the provider.
    pub completion_tokens: Option<u64>,
    /// An aggregate quality signal in `[0, 1]`, independent of any one
    /// leaf field's confidence.
    pub aggregate_quality: f64,
}

/// Extraction client errors.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A transient provider error persisted across every retry attempt.
    #[error("extraction provider error after retries: {0}")]
    Provider(String),
    /// The provider's response never passed schema validation, even after
    /// re-prompting with the validator's error text.
    #[error("extraction schema validation failed after retries: {0}")]
    SchemaValidation(String),
}

/// A single request to the external LLM extraction provider.
#[derive(Debug, Clone)]
pub struct ExtractionRequest<'a> {
    /// The system prompt steering extraction for this flavor.
    pub system_prompt: &'a str,
    /// Ordered text blocks.
    pub text_blocks: &'a [String],
    /// Ordered image blocks (base64-encoded).
    pub image_blocks: &'a [ContentBlock],
    /// The JSON schema the response must validate against.
    pub response_schema: &'a serde_json::Value,
}

/// Adapter to the external LLM provider. The only component permitted to
/// call the provider; every other component in the workspace is
/// deterministic.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Extracts a schema-conformant structured value from the given
    /// content blocks.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] after retries are exhausted, either for
    /// transient provider failures or persistent schema-validation
    /// failures.
    async fn extract(
        &self,
        request: ExtractionRequest<'_>,
    ) -> Result<(serde_json::Value, ExtractionMetadata), ExtractionError>;
}

// ============================================================================
// SECTION: Job Broker
// ============================================================================

/// Job broker errors.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The broker's backing store failed.
    #[error("broker store error: {0}")]
    Store(String),
    /// Enqueue was rejected outright (e.g. malformed arguments).
    #[error("broker enqueue rejected: {0}")]
    EnqueueRejected(String),
}

/// Acknowledgement returned by a successful enqueue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueAck {
    /// The job identifier assigned by the broker.
    pub job_id: String,
}

/// At-least-once job queue. `circuitgate-broker` implements this trait;
/// `circuitgate-orchestrator` and `circuitgate-api` depend only on it.
#[async_trait]
pub trait JobBroker: Send + Sync {
    /// Enqueues a `process_document(task_id)` job.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the enqueue fails.
    async fn enqueue_process_document(&self, task_id: TaskId) -> Result<EnqueueAck, BrokerError>;
}

// ============================================================================
// SECTION: Report Renderer
// ============================================================================

/// Report renderer errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Rendering failed.
    #[error("report rendering error: {0}")]
    Render(String),
}

/// Converts a structured report bundle into rendered bytes (PDF). Supplied
/// by an external collaborator per §1; `circuitgate-api` depends only on
/// this trait.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    /// Renders a report bundle to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when rendering fails.
    async fn render(
        &self,
        bundle: &crate::report::ReportBundle,
    ) -> Result<Vec<u8>, ReportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::AuditEventType;
    use crate::identifiers::AnalysisId;
    use crate::identifiers::AuditEventId;

    #[test]
    fn events_of_type_filters_correctly() {
        let analysis_id = AnalysisId::new();
        let events = vec![
            AuditEvent {
                id: AuditEventId::new(),
                analysis_id,
                event_type: AuditEventType::ExtractionStarted,
                event_timestamp: time::OffsetDateTime::UNIX_EPOCH,
                model_version: None,
                prompt_version: None,
                rule_id: None,
                confidence_score: None,
                details: serde_json::Value::Null,
            },
            AuditEvent {
                id: AuditEventId::new(),
                analysis_id,
                event_type: AuditEventType::FindingGenerated,
                event_timestamp: time::OffsetDateTime::UNIX_EPOCH,
                model_version: None,
                prompt_version: None,
                rule_id: Some("GND-01".to_string()),
                confidence_score: None,
                details: serde_json::Value::Null,
            },
        ];
        let findings = events_of_type(&events, AuditEventType::FindingGenerated);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id.as_deref(), Some("GND-01"));
    }
}
