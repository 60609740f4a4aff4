mod bootstrap;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use vahan_core::settings::{Command, Settings};
use vahan_runtime::orchestrator::IngestionOrchestrator;
use vahan_runtime::{AggregationEngine, LocalStore, RecordStore};
use vahan_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();
    let data_dir = settings.resolved_data_dir();

    bootstrap::ensure_directories(&data_dir, settings.log_file.as_deref())?;
    let _log_guard = bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Vahan dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(data_dir = %data_dir.display(), "Opening record store");

    let store: Arc<dyn RecordStore> = Arc::new(
        LocalStore::open(&data_dir)
            .with_context(|| format!("failed to open record store in {}", data_dir.display()))?,
    );

    match settings.command {
        Command::Serve { host, port } => {
            let listener = TcpListener::bind((host.as_str(), port))
                .await
                .with_context(|| format!("failed to bind {host}:{port}"))?;
            let state = AppState::new(AggregationEngine::new(store));
            vahan_server::serve(listener, state, shutdown_signal()).await?;
        }

        Command::Ingest { root, class } => {
            tracing::info!(
                root = %root.display(),
                collection = class.collection_name(),
                "Starting ingestion"
            );
            let report = IngestionOrchestrator::new(store, class)
                .run(&root)
                .await
                .with_context(|| format!("ingestion of {} failed", root.display()))?;
            tracing::info!(
                files_seen = report.files_seen,
                files_ingested = report.files_ingested,
                files_failed = report.files_failed,
                records_inserted = report.records_inserted,
                "Ingestion complete"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Ctrl+C received; shutting down");
}
