// circuitgate-broker/src/lib.rs
// ============================================================================
// Module: Circuitgate Broker
// Description: At-least-once `process_document` job queue.
// Purpose: Durable enqueue (C3) plus the worker-side consume loop the
//          `circuitgate-cli worker` subcommand drives.
// Dependencies: circuitgate-core, rusqlite, tokio, tokio-util
// ============================================================================

//! ## Overview
//! [`SqliteJobBroker`] implements [`circuitgate_core::JobBroker`] for
//! enqueue; [`worker::run_worker`] is the consume side. Both sides share the
//! same `jobs` table via [`conn::BrokerHandle`].

pub mod broker;
pub mod conn;
pub mod job;
pub mod worker;

pub use broker::MAX_ATTEMPTS;
pub use broker::PROCESS_DOCUMENT_JOB;
pub use broker::QueueError;
pub use broker::SqliteJobBroker;
pub use broker::backoff_seconds;
pub use conn::BrokerConnError;
pub use conn::BrokerHandle;
pub use conn::SCHEMA_VERSION;
pub use job::FailureOutcome;
pub use job::JobRecord;
pub use job::JobStatus;
pub use worker::run_worker;
