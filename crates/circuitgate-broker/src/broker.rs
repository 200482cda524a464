// circuitgate-broker/src/broker.rs
// ============================================================================
// Module: Circuitgate Broker Queue
// Description: SQLite-backed at-least-once job queue implementing the
//              circuitgate-core `JobBroker` trait, plus the claim/complete/
//              fail operations the worker loop drives.
// Purpose: Durable enqueue of `process_document` jobs with exponential
//          backoff, a maximum attempt count, and a 24h age limit.
// Dependencies: circuitgate-core, rusqlite, time, uuid
// ============================================================================

//! ## Overview
//! `SqliteJobBroker` owns the `jobs` table. [`circuitgate_core::JobBroker`]
//! exposes only `enqueue_process_document`, matching the trait boundary the
//! orchestrator and API crates depend on; the claim/complete/fail methods
//! below are this crate's own API, driven by [`crate::worker::run_worker`].

use async_trait::async_trait;
use circuitgate_core::BrokerError;
use circuitgate_core::EnqueueAck;
use circuitgate_core::JobBroker;
use circuitgate_core::TaskId;
use rusqlite::OptionalExtension;
use time::Duration as TimeDuration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::conn::BrokerHandle;
use crate::conn::decode_timestamp;
use crate::conn::encode_timestamp;
use crate::job::FailureOutcome;
use crate::job::JobRecord;
use crate::job::JobStatus;

/// Maximum attempts a job is given before it is abandoned as permanently
/// failed (§4.2: "maximum 3 attempts").
pub const MAX_ATTEMPTS: u32 = 3;

/// Backoff cap (§4.2: "doubling, capped at 5 min").
const BACKOFF_CAP_SECONDS: i64 = 300;

/// Age beyond which a job is abandoned regardless of remaining attempts
/// (§4.2: "an age limit (24 h)").
const AGE_LIMIT: TimeDuration = TimeDuration::hours(24);

/// The job name this crate's queue serves; the only kind the system
/// currently enqueues.
pub const PROCESS_DOCUMENT_JOB: &str = "process_document";

/// Errors from the broker's own claim/complete/fail operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The underlying `SQLite` engine reported an error.
    #[error("broker store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A persisted row could not be decoded.
    #[error("broker store decode error: {0}")]
    Decode(String),
}

/// Computes the backoff delay for the attempt that just failed.
///
/// `failed_attempt` is 1-indexed: the first failure is attempt 1. The
/// series doubles from one second and saturates at [`BACKOFF_CAP_SECONDS`].
#[must_use]
pub fn backoff_seconds(failed_attempt: u32) -> i64 {
    let shift = failed_attempt.saturating_sub(1).min(31);
    let delay = 1i64.saturating_shl(shift);
    delay.min(BACKOFF_CAP_SECONDS)
}

/// SQLite-backed job queue.
pub struct SqliteJobBroker {
    handle: BrokerHandle,
}

impl SqliteJobBroker {
    /// Wraps an already-open [`BrokerHandle`].
    #[must_use]
    pub fn new(handle: BrokerHandle) -> Self {
        Self { handle }
    }

    /// Claims the single oldest eligible pending job, if any, transitioning
    /// it to `RUNNING`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the store itself fails.
    pub fn claim_next(&self) -> Result<Option<JobRecord>, QueueError> {
        let now = OffsetDateTime::now_utc();
        let now_text = encode_timestamp(now).map_err(|e| QueueError::Decode(e.to_string()))?;

        self.handle.with_connection(|conn| {
            let candidate: Option<(String, String, String, String, i64, i64, String, String, Option<String>)> = conn
                .query_row(
                    "SELECT id, job_name, task_id, status, attempts, max_attempts, \
                     next_attempt_at, created_at, last_error \
                     FROM jobs WHERE status = 'PENDING' AND next_attempt_at <= ?1 \
                     ORDER BY next_attempt_at ASC LIMIT 1",
                    [&now_text],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                            row.get(7)?,
                            row.get(8)?,
                        ))
                    },
                )
                .optional()?;

            let Some((id, job_name, task_id, status, attempts, max_attempts, next_attempt_at, created_at, last_error)) =
                candidate
            else {
                return Ok(None);
            };

            let rows_changed = conn.execute(
                "UPDATE jobs SET status = 'RUNNING' WHERE id = ?1 AND status = 'PENDING'",
                [&id],
            )?;
            if rows_changed != 1 {
                // Lost the race to another worker in this same process; the
                // caller's next poll tick will try again.
                return Ok(None);
            }

            let record = decode_record(
                id,
                job_name,
                task_id,
                status,
                attempts,
                max_attempts,
                next_attempt_at,
                created_at,
                last_error,
            )
            .map_err(|e| rusqlite::Error::InvalidColumnType(0, e, rusqlite::types::Type::Text))?;
            Ok(Some(record))
        })
    }

    /// Marks a claimed job as permanently succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the store itself fails.
    pub fn record_success(&self, job_id: &str) -> Result<(), QueueError> {
        self.handle.with_connection(|conn| {
            conn.execute("UPDATE jobs SET status = 'SUCCEEDED' WHERE id = ?1", [job_id])
        })?;
        Ok(())
    }

    /// Records a failed attempt, either rescheduling with exponential
    /// backoff or marking the job terminally `FAILED` if attempts are
    /// exhausted or the job has aged out.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the store itself fails.
    pub fn record_failure(&self, job_id: &str, error: &str) -> Result<FailureOutcome, QueueError> {
        let now = OffsetDateTime::now_utc();

        self.handle.with_connection(|conn| {
            let (attempts, max_attempts, created_at_text): (i64, i64, String) = conn.query_row(
                "SELECT attempts, max_attempts, created_at FROM jobs WHERE id = ?1",
                [job_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            let created_at = decode_timestamp(&created_at_text)
                .map_err(|e| rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text))?;

            let new_attempts = u32::try_from(attempts).unwrap_or(u32::MAX).saturating_add(1);
            let aged_out = now - created_at > AGE_LIMIT;
            let exhausted = new_attempts >= u32::try_from(max_attempts).unwrap_or(MAX_ATTEMPTS);

            if aged_out || exhausted {
                conn.execute(
                    "UPDATE jobs SET status = 'FAILED', attempts = ?2, last_error = ?3 WHERE id = ?1",
                    rusqlite::params![job_id, i64::from(new_attempts), error],
                )?;
                return Ok(FailureOutcome::Terminal);
            }

            let delay = backoff_seconds(new_attempts);
            let next_attempt_at = now + TimeDuration::seconds(delay);
            let next_attempt_text = encode_timestamp(next_attempt_at)
                .map_err(|e| rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text))?;

            conn.execute(
                "UPDATE jobs SET status = 'PENDING', attempts = ?2, next_attempt_at = ?3, \
                 last_error = ?4 WHERE id = ?1",
                rusqlite::params![job_id, i64::from(new_attempts), next_attempt_text, error],
            )?;
            Ok(FailureOutcome::Retrying)
        })
    }
}

#[async_trait]
impl JobBroker for SqliteJobBroker {
    async fn enqueue_process_document(&self, task_id: TaskId) -> Result<EnqueueAck, BrokerError> {
        let now = OffsetDateTime::now_utc();
        let now_text = encode_timestamp(now).map_err(|e| BrokerError::Store(e.to_string()))?;
        let job_id = Uuid::new_v4().to_string();

        self.handle
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO jobs (id, job_name, task_id, status, attempts, max_attempts, \
                     next_attempt_at, created_at, last_error) \
                     VALUES (?1, ?2, ?3, 'PENDING', 0, ?4, ?5, ?5, NULL)",
                    rusqlite::params![job_id, PROCESS_DOCUMENT_JOB, task_id.to_string(), i64::from(MAX_ATTEMPTS), now_text],
                )
            })
            .map_err(|e| BrokerError::Store(e.to_string()))?;

        Ok(EnqueueAck { job_id })
    }
}

#[allow(clippy::too_many_arguments, reason = "one argument per stored column, no natural grouping")]
fn decode_record(
    id: String,
    job_name: String,
    task_id: String,
    status: String,
    attempts: i64,
    max_attempts: i64,
    next_attempt_at: String,
    created_at: String,
    last_error: Option<String>,
) -> Result<JobRecord, String> {
    Ok(JobRecord {
        id,
        job_name,
        task_id: task_id.parse().map_err(|e| format!("{e}"))?,
        status: JobStatus::from_str(&status).ok_or_else(|| format!("unknown job status: {status}"))?,
        attempts: u32::try_from(attempts).unwrap_or(0),
        max_attempts: u32::try_from(max_attempts).unwrap_or(MAX_ATTEMPTS),
        next_attempt_at: decode_timestamp(&next_attempt_at).map_err(|e| e.to_string())?,
        created_at: decode_timestamp(&created_at).map_err(|e| e.to_string())?,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker() -> SqliteJobBroker {
        SqliteJobBroker::new(crate::conn::BrokerHandle::open_in_memory().expect("opens"))
    }

    #[tokio::test]
    async fn enqueue_then_claim_round_trips() {
        let broker = broker();
        let task_id = TaskId::new();
        let ack = broker.enqueue_process_document(task_id).await.expect("enqueues");
        assert!(!ack.job_id.is_empty());

        let claimed = broker.claim_next().expect("claims").expect("job present");
        assert_eq!(claimed.task_id, task_id);
        assert_eq!(claimed.status, JobStatus::Running);
        assert_eq!(claimed.attempts, 0);
    }

    #[tokio::test]
    async fn claim_skips_jobs_not_yet_due() {
        let broker = broker();
        let task_id = TaskId::new();
        let ack = broker.enqueue_process_document(task_id).await.expect("enqueues");
        broker.record_failure(&ack.job_id, "transient").expect("records failure");

        assert!(broker.claim_next().expect("claims").is_none());
    }

    #[tokio::test]
    async fn failure_retries_until_max_attempts_then_terminal() {
        let broker = broker();
        let task_id = TaskId::new();
        let ack = broker.enqueue_process_document(task_id).await.expect("enqueues");

        let first = broker.record_failure(&ack.job_id, "err1").expect("records");
        assert_eq!(first, FailureOutcome::Retrying);
        let second = broker.record_failure(&ack.job_id, "err2").expect("records");
        assert_eq!(second, FailureOutcome::Retrying);
        let third = broker.record_failure(&ack.job_id, "err3").expect("records");
        assert_eq!(third, FailureOutcome::Terminal);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_seconds(1), 1);
        assert_eq!(backoff_seconds(2), 2);
        assert_eq!(backoff_seconds(3), 4);
        assert_eq!(backoff_seconds(20), 300);
    }
}
