// crates/leadgen-cli/src/main.rs
// ============================================================================
// Module: Leadgen CLI Entry Point
// Description: Command dispatcher wiring storage, orchestration, workers,
// and the HTTP API into a runnable process.
// Purpose: Provide a single `serve` command that loads configuration, opens
// the SQLite-backed stores, and runs the worker pool alongside the HTTP/SSE
// server until shutdown is requested.
// Dependencies: clap, tokio, tokio-util, leadgen-core, leadgen-config,
// leadgen-store, leadgen-events, leadgen-orchestrator, leadgen-workers,
// leadgen-api
// ============================================================================

//! ## Overview
//! `leadgen serve` is the only subcommand today: it assembles every crate in
//! the workspace into one process. Real DNS and HTTP keyword validators are
//! external collaborators this workspace only defines the trait boundary
//! for, so `serve` wires in the deterministic stand-ins from
//! `leadgen_workers::testing` until a real validator is plugged in, the same
//! way a deployment might start from a built-in provider before pointing at
//! an external one.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use leadgen_api::AppState;
use leadgen_config::AppConfig;
use leadgen_config::SqliteConfigStore;
use leadgen_core::interfaces::IdentityShuffler;
use leadgen_core::interfaces::NoopMetrics;
use leadgen_core::interfaces::StderrAuditSink;
use leadgen_events::LiveEventBroadcaster;
use leadgen_events::SqliteEventStore;
use leadgen_orchestrator::CampaignOrchestrator;
use leadgen_orchestrator::CampaignOrchestratorConfig;
use leadgen_store::SqliteCampaignStore;
use leadgen_workers::WorkerCollaborators;
use leadgen_workers::WorkerPool;
use leadgen_workers::testing::StubDnsValidator;
use leadgen_workers::testing::StubHttpValidator;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "leadgen", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the worker pool and HTTP/SSE server in one process.
    Serve(ServeArgs),
}

/// Configuration for the `serve` command.
#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Optional config file path (defaults to `leadgen.toml` or `LEADGEN_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Top-level CLI error, mapped onto a process exit code.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration failed to load or validate.
    #[error("configuration error: {0}")]
    Config(#[from] leadgen_config::ConfigError),
    /// A backing store failed to open.
    #[error("store error: {0}")]
    Store(String),
    /// The HTTP server failed to bind or run.
    #[error("server error: {0}")]
    Server(String),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::print_stderr, reason = "Top-level error reporting has nowhere else to go.")]
fn eprintln_error(message: &str) {
    eprintln!("leadgen: {message}");
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
    }
}

async fn command_serve(args: ServeArgs) -> CliResult<()> {
    let config = AppConfig::load(args.config.as_deref())?;

    let store = Arc::new(
        SqliteCampaignStore::open(&config.store.path, Some(config.store.busy_timeout_ms))
            .map_err(|err| CliError::Store(err.to_string()))?,
    );
    let config_store = Arc::new(
        SqliteConfigStore::open(&config.config_store.path, Some(config.config_store.busy_timeout_ms))
            .map_err(|err| CliError::Store(err.to_string()))?,
    );
    let event_store =
        SqliteEventStore::open(&config.store.path).map_err(|err| CliError::Store(err.to_string()))?;
    let events = Arc::new(LiveEventBroadcaster::new(event_store));

    let metrics = Arc::new(NoopMetrics);
    let audit = Arc::new(StderrAuditSink);

    let orchestrator = CampaignOrchestrator::new(CampaignOrchestratorConfig {
        store: store.clone(),
        events: events.clone(),
        metrics: metrics.clone(),
        audit,
    });

    let collaborators = WorkerCollaborators {
        store: store.clone(),
        config_store,
        events: events.clone(),
        metrics,
        dns_validator: Arc::new(StubDnsValidator::always_resolved()),
        http_validator: Arc::new(StubHttpValidator::always_empty()),
        shuffler: Arc::new(IdentityShuffler),
        orchestrator: orchestrator.clone(),
        config: config.worker.clone(),
    };
    let pool = WorkerPool::new(collaborators);
    let cancel = CancellationToken::new();

    let pool_cancel = cancel.clone();
    let pool_handle = tokio::spawn(async move { pool.run(pool_cancel).await });

    let app_state = AppState::new(orchestrator, store, events.clone(), events);
    let router = leadgen_api::router(app_state);
    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str())
        .await
        .map_err(|err| CliError::Server(err.to_string()))?;

    let server_cancel = cancel.clone();
    let shutdown = async move {
        let _ = tokio::signal::ctrl_c().await;
        server_cancel.cancel();
    };
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| CliError::Server(err.to_string()))?;

    cancel.cancel();
    let _ = pool_handle.await;
    Ok(())
}
