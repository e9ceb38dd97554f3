use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

use crate::config::IngestConfig;
use crate::ingest::Ingestor;
use crate::store::Store;

/// Ingest a directory on the blocking pool and return its summary.
pub async fn handle_ingest_directory(
    store: &Store,
    config: &IngestConfig,
    dir: PathBuf,
) -> Result<Value> {
    let store = store.clone();
    let config = config.clone();

    let summary = tokio::task::spawn_blocking(move || {
        Ingestor::new(&store, config).ingest_directory(&dir)
    })
    .await
    .context("Ingestion task panicked")??;

    info!(
        "Directory ingestion wrote {} records ({} errors, {} files skipped)",
        summary.records_written(),
        summary.errors,
        summary.files_skipped.len()
    );
    Ok(serde_json::to_value(&summary)?)
}

pub async fn handle_ingest_file(
    store: &Store,
    config: &IngestConfig,
    file: PathBuf,
) -> Result<Value> {
    let store = store.clone();
    let config = config.clone();

    let summary = tokio::task::spawn_blocking(move || Ingestor::new(&store, config).ingest_file(&file))
        .await
        .context("Ingestion task panicked")??;

    Ok(serde_json::to_value(&summary)?)
}
