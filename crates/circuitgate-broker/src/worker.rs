// circuitgate-broker/src/worker.rs
// ============================================================================
// Module: Circuitgate Broker Worker Loop
// Description: Polls the queue, runs the handler, records the outcome, and
//              marks a task terminally FAILED on exhausted retries.
// Purpose: The worker-side half of the broker's `enqueue`/`consume`
//          contract (§4.2).
// Dependencies: circuitgate-core, tokio, tokio-util
// ============================================================================

//! ## Overview
//! [`run_worker`] loops until `shutdown` is cancelled, claiming at most one
//! job per tick. A handler failure that exhausts retries or ages the job
//! out transitions the task to `FAILED` via `TaskStore::compare_and_set_status`
//! — a best-effort call: if the task has already moved on (e.g. a human
//! operator re-drove it), the CAS simply reports no change and is ignored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use circuitgate_core::TaskStatus;
use circuitgate_core::TaskStore;
use tokio_util::sync::CancellationToken;

use crate::broker::SqliteJobBroker;
use crate::job::FailureOutcome;

/// Runs the worker loop until `shutdown` is cancelled.
///
/// `handler` processes one task and returns `Err(message)` on failure; it
/// is expected to be idempotent per the task's status field (§4.2), so a
/// crash between claim and completion is safe to retry.
pub async fn run_worker<H, Fut>(
    broker: Arc<SqliteJobBroker>,
    task_store: Arc<dyn TaskStore>,
    handler: H,
    poll_interval: Duration,
    shutdown: CancellationToken,
) where
    H: Fn(circuitgate_core::TaskId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
{
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            () = tokio::time::sleep(poll_interval) => {}
        }

        let claimed = match broker.claim_next() {
            Ok(job) => job,
            Err(_) => continue,
        };
        let Some(job) = claimed else { continue };

        let outcome = handler(job.task_id).await;
        match outcome {
            Ok(()) => {
                let _ = broker.record_success(&job.id);
            }
            Err(message) => match broker.record_failure(&job.id, &message) {
                Ok(FailureOutcome::Terminal) => {
                    let _ = task_store
                        .compare_and_set_status(job.task_id, TaskStatus::Processing, TaskStatus::Failed, Some(&message))
                        .await;
                }
                Ok(FailureOutcome::Retrying) | Err(_) => {}
            },
        }
    }
}
