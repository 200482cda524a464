// circuitgate-broker/src/job.rs
// ============================================================================
// Module: Circuitgate Broker Job
// Description: The persisted queue row and its lifecycle status.
// Purpose: Give the store and the worker loop one shared vocabulary for a
//          queued job.
// Dependencies: circuitgate-core, time
// ============================================================================

//! ## Overview
//! A job is a durable row, not an in-memory future: the worker loop may
//! crash between claiming a job and recording its outcome, and the row's
//! `status`/`next_attempt_at` fields are the only state that survives that.

use circuitgate_core::TaskId;
use time::OffsetDateTime;

/// The lifecycle status of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Queued and eligible for a worker to claim once `next_attempt_at`
    /// has passed.
    Pending,
    /// Claimed by a worker; the handler is running or crashed mid-run.
    Running,
    /// The handler completed successfully.
    Succeeded,
    /// Retries are exhausted or the job aged out; terminal.
    Failed,
}

impl JobStatus {
    /// Renders the status as the text stored in the `jobs.status` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status previously written by [`Self::as_str`].
    #[must_use]
    pub fn from_str(text: &str) -> Option<Self> {
        match text {
            "PENDING" => Some(Self::Pending),
            "RUNNING" => Some(Self::Running),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A single queued `process_document` job.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Opaque job identifier, distinct from the task identifier it carries.
    pub id: String,
    /// The named job kind; always `"process_document"` in this system.
    pub job_name: String,
    /// The task this job processes.
    pub task_id: TaskId,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Attempts made so far.
    pub attempts: u32,
    /// Attempts allowed before the job is abandoned as permanently failed.
    pub max_attempts: u32,
    /// Earliest time a worker may next claim this job.
    pub next_attempt_at: OffsetDateTime,
    /// When the job was first enqueued; the 24h age limit is measured
    /// from here, not from the most recent attempt.
    pub created_at: OffsetDateTime,
    /// The most recent handler error, if any attempt has failed.
    pub last_error: Option<String>,
}

/// The outcome of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The job was rescheduled for another attempt.
    Retrying,
    /// Retries are exhausted or the job aged out; the job is now `FAILED`.
    Terminal,
}
