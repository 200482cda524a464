// circuitgate-core/src/entities.rs
// ============================================================================
// Module: Circuitgate Entities
// Description: The persisted data model — User, Task, Analysis, Finding,
//              AuditEvent — and the enumerations that constrain them.
// Purpose: Give every crate in the workspace one shared vocabulary for the
//          entities the store, the orchestrator, and the API all handle.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! These types hold no behavior beyond small derived accessors; all
//! transitions and computations live in the crates that own them
//! (`circuitgate-validate` for scoring/verdicts, `circuitgate-orchestrator`
//! for task lifecycle, `circuitgate-store` for persistence).

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::identifiers::AnalysisId;
use crate::identifiers::AuditEventId;
use crate::identifiers::FindingId;
use crate::identifiers::TaskId;
use crate::identifiers::UserId;

// ============================================================================
// SECTION: User
// ============================================================================

/// A registered user. Owns tasks transitively through to analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier.
    pub id: UserId,
    /// Unique email address.
    pub email: String,
    /// Argon2 password hash, never the plaintext password.
    pub password_hash: String,
    /// Whether the account may authenticate.
    pub active: bool,
    /// Creation time.
    pub created_at: OffsetDateTime,
}

// ============================================================================
// SECTION: Task
// ============================================================================

/// The lifecycle status of an ingestion task.
///
/// # Invariants
/// - Transitions are monotonic: `QUEUED -> PROCESSING -> {COMPLETED, FAILED}`.
///   No other transition is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Enqueued, not yet picked up by a worker.
    Queued,
    /// A worker has claimed the task and is running the pipeline.
    Processing,
    /// The pipeline ran to completion and produced an Analysis.
    Completed,
    /// The pipeline failed terminally; no Analysis was produced.
    Failed,
}

impl TaskStatus {
    /// Whether `self -> next` is an allowed transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Whether this status is terminal (no further transition is possible).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The unit of ingestion: one uploaded artifact and its processing status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier.
    pub id: TaskId,
    /// Owning user.
    pub owner_id: UserId,
    /// Original filename as supplied by the uploader.
    pub filename: String,
    /// Object-store key the artifact is stored under.
    pub object_key: String,
    /// Size of the stored artifact in bytes.
    pub byte_size: u64,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Summary error message, set only when `status == Failed`.
    pub error_message: Option<String>,
    /// Creation time.
    pub created_at: OffsetDateTime,
    /// Last status-mutating update time.
    pub updated_at: OffsetDateTime,
}

// ============================================================================
// SECTION: Analysis
// ============================================================================

/// The kind of electrical test a document's measurements belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// Ground / earth resistance test.
    Grounding,
    /// Insulation resistance test (Megger).
    Megger,
    /// Infrared thermography inspection.
    Thermography,
}

/// The category of equipment a measurement was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EquipmentType {
    /// Electrical panel.
    Panel,
    /// Uninterruptible power supply.
    Ups,
    /// Automatic transfer switch.
    Ats,
    /// Generator.
    Gen,
    /// Transformer.
    Xfmr,
    /// Any equipment kind not covered by the named categories.
    Other,
}

/// The outcome of a completed analysis.
///
/// # Invariants
/// - Derived by [`crate::AppError`]-free computation from findings and
///   confidence (see the validate crate), except when overwritten by the
///   review API's approve/reject actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// No critical findings, score and confidence both clear their floors.
    Approved,
    /// Needs a human reviewer: low score, low confidence, or pending review.
    Review,
    /// At least one critical finding, or a reviewer rejected it.
    Rejected,
}

/// The unit of result: one document's extraction plus validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Opaque identifier.
    pub id: AnalysisId,
    /// The task this analysis was produced from (one-to-one).
    pub task_id: TaskId,
    /// Detected test type.
    pub test_type: TestType,
    /// Detected equipment type.
    pub equipment_type: EquipmentType,
    /// Equipment tag as it appears on the document.
    pub equipment_tag: String,
    /// Compliance score in `[0, 100]`, set once validation has run.
    pub compliance_score: Option<f64>,
    /// Overall extraction confidence in `[0, 1]`.
    pub overall_confidence: f64,
    /// Derived or reviewer-set verdict; `None` until validation completes.
    pub verdict: Option<Verdict>,
    /// Reviewer-supplied rejection reason, `10..=1000` chars when present.
    pub rejection_reason: Option<String>,
    /// Raw extraction payload (test-type-specific), stored as JSON.
    pub extraction_payload: serde_json::Value,
    /// Raw validation payload (severity counts, profile used), stored as JSON.
    pub validation_payload: serde_json::Value,
    /// Creation time.
    pub created_at: OffsetDateTime,
    /// Last update time.
    pub updated_at: OffsetDateTime,
}

// ============================================================================
// SECTION: Finding
// ============================================================================

/// The severity of a single validation finding.
///
/// # Invariants
/// - Only `Critical`, `Major`, and `Minor` affect the compliance score;
///   `Info` never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational only; never affects score or verdict.
    Info,
    /// Minor deviation; small score penalty.
    Minor,
    /// Significant deviation; forces `REVIEW` unless outweighed by a
    /// critical finding elsewhere.
    Major,
    /// Non-compliant; forces verdict `REJECTED`.
    Critical,
}

/// The evidence backing a single finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// The value as extracted, rendered as a string for display.
    pub extracted_value: String,
    /// The threshold or expected value the extraction was checked against.
    pub threshold: String,
    /// The citation for the rule this finding enforces; `"N/A"` if unknown.
    pub standard_reference: String,
}

impl Evidence {
    /// The literal used when a rule has no more specific standard citation.
    pub const UNKNOWN_REFERENCE: &'static str = "N/A";
}

/// A single validation outcome for an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Opaque identifier.
    pub id: FindingId,
    /// The analysis this finding belongs to.
    pub analysis_id: AnalysisId,
    /// Severity of the finding.
    pub severity: Severity,
    /// Stable rule identifier, e.g. `"GND-01"`, `"COMP-002"`.
    pub rule_id: String,
    /// Human-readable description of the finding.
    pub message: String,
    /// Supporting evidence.
    pub evidence: Evidence,
    /// Optional remediation guidance.
    pub remediation: Option<String>,
}

// ============================================================================
// SECTION: AuditEvent
// ============================================================================

/// The kind of event recorded in the append-only audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Extraction began.
    ExtractionStarted,
    /// Extraction finished successfully.
    ExtractionCompleted,
    /// Extraction failed terminally.
    ExtractionFailed,
    /// A single validation rule ran.
    ValidationRuleApplied,
    /// A single finding was produced.
    FindingGenerated,
    /// Validation finished; the analysis now has a score and verdict.
    ValidationCompleted,
    /// A reviewer approved the analysis.
    HumanReviewApproved,
    /// A reviewer rejected the analysis.
    HumanReviewRejected,
}

/// A single append-only audit record for an analysis.
///
/// # Invariants
/// - Never updated or deleted once persisted (see `AuditStore`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Opaque identifier.
    pub id: AuditEventId,
    /// The analysis this event belongs to.
    pub analysis_id: AnalysisId,
    /// The kind of event.
    pub event_type: AuditEventType,
    /// When the event occurred.
    pub event_timestamp: OffsetDateTime,
    /// LLM model identifier, present for extraction-related events.
    pub model_version: Option<String>,
    /// Prompt version, present for extraction-related events.
    pub prompt_version: Option<String>,
    /// Rule identifier, present for validation-related events.
    pub rule_id: Option<String>,
    /// Confidence score, present for extraction-related events.
    pub confidence_score: Option<f64>,
    /// Opaque structured details specific to the event type.
    pub details: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_transitions_are_monotonic() {
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Processing));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Queued.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Processing));
        assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Queued));
    }

    #[test]
    fn completed_and_failed_are_terminal() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
    }

    #[test]
    fn severity_orders_info_below_critical() {
        let mut severities = vec![Severity::Critical, Severity::Info, Severity::Major, Severity::Minor];
        severities.sort();
        assert_eq!(
            severities,
            vec![Severity::Info, Severity::Minor, Severity::Major, Severity::Critical]
        );
    }
}
