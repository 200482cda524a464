// circuitgate-cli/src/main.rs
// ============================================================================
// Module: Circuitgate CLI Entry Point
// Description: Command dispatcher for the three process roles the system
//              runs as: the HTTP ingestion/review surface, the background
//              worker, and a one-shot schema migration.
// Purpose: Wire the backend-agnostic component graph (stores, object
//          store, broker, extraction client, orchestrator) from strict,
//          fail-closed environment configuration, matching §6's
//          "Configuration (via environment)" section.
// Dependencies: clap, tokio, circuitgate-api, circuitgate-broker,
//               circuitgate-core, circuitgate-extract,
//               circuitgate-objectstore, circuitgate-orchestrator,
//               circuitgate-store
// ============================================================================

//! ## Overview
//! Three subcommands, one per deployable role (§5 "Scheduling model"):
//! `serve` runs the request-handling pool (C11/C12/C13), `worker` runs the
//! dedicated consumer pool that drives the orchestrator (C10) end to end,
//! and `migrate` applies the domain-store and job-queue schema migrations
//! without starting either role — useful before a rolling deploy. `serve`
//! and `worker` share the same domain database and object store but are
//! meant to run as separate processes (§5: "processes=1, threads=4" sizes
//! the worker pool independently of the request pool).

mod config;
mod diagnostics;

use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;

use circuitgate_api::AppConfig;
use circuitgate_api::AppState;
use circuitgate_api::ApiServer;
use circuitgate_broker::BrokerHandle;
use circuitgate_broker::SqliteJobBroker;
use circuitgate_broker::run_worker;
use circuitgate_core::JobBroker;
use circuitgate_core::JsonReportRenderer;
use circuitgate_core::StandardProfile;
use circuitgate_extract::HttpExtractionClient;
use circuitgate_extract::HttpExtractionConfig;
use circuitgate_extract::PROMPT_VERSION;
use circuitgate_objectstore::LocalObjectStore;
use circuitgate_objectstore::S3ObjectStore;
use circuitgate_orchestrator::OrchestratorContext;
use circuitgate_orchestrator::process as run_pipeline;
use circuitgate_store::SqliteAnalysisStore;
use circuitgate_store::SqliteAuditStore;
use circuitgate_store::SqliteFindingStore;
use circuitgate_store::SqliteHandle;
use circuitgate_store::SqliteTaskStore;
use circuitgate_store::SqliteUserStore;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::InfraConfig;
use crate::config::ObjectStoreConfig;
use crate::config::WorkerConfig;
use crate::diagnostics::StderrDiagnostics;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "circuitgate", arg_required_else_help = true)]
struct Cli {
    /// Selected process role to run.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands, one per process role.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP ingestion/review/report surface (C11/C12/C13).
    Serve,
    /// Run the background worker that drives the orchestrator (C10).
    Worker,
    /// Apply domain-store and job-queue schema migrations and exit.
    Migrate,
}

/// Errors surfaced to the process exit path.
#[derive(Debug, Error)]
#[error("{0}")]
struct CliError(String);

impl CliError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type CliResult<T> = Result<T, CliError>;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "circuitgate: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve => command_serve().await,
        Commands::Worker => command_worker().await,
        Commands::Migrate => command_migrate(),
    }
}

/// Opens the domain store handle and wraps it in all five store traits.
struct DomainStores {
    user: Arc<SqliteUserStore>,
    task: Arc<SqliteTaskStore>,
    analysis: Arc<SqliteAnalysisStore>,
    finding: Arc<SqliteFindingStore>,
    audit: Arc<SqliteAuditStore>,
}

fn open_domain_stores(infra: &InfraConfig) -> Result<DomainStores, String> {
    let handle = SqliteHandle::open(&infra.database_path).map_err(|e| e.to_string())?;
    Ok(DomainStores {
        user: Arc::new(SqliteUserStore::new(handle.clone())),
        task: Arc::new(SqliteTaskStore::new(handle.clone())),
        analysis: Arc::new(SqliteAnalysisStore::new(handle.clone())),
        finding: Arc::new(SqliteFindingStore::new(handle.clone())),
        audit: Arc::new(SqliteAuditStore::new(handle)),
    })
}

fn open_broker(infra: &InfraConfig) -> Result<Arc<SqliteJobBroker>, String> {
    let handle = BrokerHandle::open(&infra.broker_database_path).map_err(|e| e.to_string())?;
    Ok(Arc::new(SqliteJobBroker::new(handle)))
}

async fn open_object_store(infra: &InfraConfig) -> Result<Arc<dyn circuitgate_core::ObjectStore>, String> {
    match &infra.object_store {
        ObjectStoreConfig::Local { root } => {
            std::fs::create_dir_all(root).map_err(|e| e.to_string())?;
            Ok(Arc::new(LocalObjectStore::new(root.clone())))
        }
        ObjectStoreConfig::S3 { bucket } => Ok(Arc::new(S3ObjectStore::from_env(bucket.clone()).await)),
    }
}

// ============================================================================
// SECTION: `serve` Command
// ============================================================================

async fn command_serve() -> CliResult<()> {
    let infra = InfraConfig::from_env().map_err(|e| CliError::new(format!("infrastructure config: {e}")))?;
    let api_config = AppConfig::from_env().map_err(|e| CliError::new(format!("api config: {e}")))?;

    let stores = open_domain_stores(&infra).map_err(|e| CliError::new(format!("opening domain store: {e}")))?;
    let broker = open_broker(&infra).map_err(|e| CliError::new(format!("opening job queue: {e}")))?;
    let object_store = open_object_store(&infra).await.map_err(|e| CliError::new(format!("opening object store: {e}")))?;

    let job_broker: Arc<dyn JobBroker> = broker;
    let state = AppState::new(
        stores.user,
        stores.task,
        stores.analysis,
        stores.finding,
        stores.audit,
        object_store,
        job_broker,
        Arc::new(JsonReportRenderer),
        Arc::new(StderrDiagnostics),
        api_config,
    );

    let server = ApiServer::new(state).map_err(|e| CliError::new(format!("building server: {e}")))?;
    server
        .run_until(shutdown_signal())
        .await
        .map_err(|e| CliError::new(format!("server error: {e}")))
}

// ============================================================================
// SECTION: `worker` Command
// ============================================================================

async fn command_worker() -> CliResult<()> {
    let infra = InfraConfig::from_env().map_err(|e| CliError::new(format!("infrastructure config: {e}")))?;
    let worker_config = WorkerConfig::from_env().map_err(|e| CliError::new(format!("worker config: {e}")))?;

    let stores = open_domain_stores(&infra).map_err(|e| CliError::new(format!("opening domain store: {e}")))?;
    let broker = open_broker(&infra).map_err(|e| CliError::new(format!("opening job queue: {e}")))?;
    let object_store = open_object_store(&infra).await.map_err(|e| CliError::new(format!("opening object store: {e}")))?;

    let extraction_config =
        HttpExtractionConfig::new(worker_config.llm_endpoint.clone(), worker_config.llm_api_key.clone(), worker_config.llm_model.clone());
    let extraction_client = HttpExtractionClient::new(extraction_config, PROMPT_VERSION)
        .map_err(|e| CliError::new(format!("building extraction client: {e}")))?;

    let ctx = Arc::new(OrchestratorContext {
        task_store: stores.task.clone(),
        analysis_store: stores.analysis,
        finding_store: stores.finding,
        audit_store: stores.audit,
        object_store,
        extraction_client: Arc::new(extraction_client),
        profile: StandardProfile::resolve(worker_config.default_profile),
        diagnostics: Arc::new(StderrDiagnostics),
    });

    let shutdown = CancellationToken::new();
    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_for_signal.cancel();
    });

    run_worker(
        broker,
        stores.task,
        move |task_id| {
            let ctx = ctx.clone();
            async move { run_pipeline(&ctx, task_id).await.map_err(|e| e.to_string()) }
        },
        worker_config.poll_interval,
        shutdown,
    )
    .await;
    Ok(())
}

// ============================================================================
// SECTION: `migrate` Command
// ============================================================================

fn command_migrate() -> CliResult<()> {
    let infra = InfraConfig::from_env().map_err(|e| CliError::new(format!("infrastructure config: {e}")))?;
    SqliteHandle::open(&infra.database_path).map_err(|e| CliError::new(format!("migrating domain store: {e}")))?;
    BrokerHandle::open(&infra.broker_database_path).map_err(|e| CliError::new(format!("migrating job queue: {e}")))?;
    let mut stdout = std::io::stdout();
    writeln!(stdout, "migrations applied").map_err(|e| CliError::new(e.to_string()))?;
    Ok(())
}

/// Resolves once the process receives a shutdown signal (`SIGINT` on every
/// platform; `SIGTERM` as well on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
            return;
        };
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
