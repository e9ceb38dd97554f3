use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::store::StoreStats;

/// Outcome of ingesting one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileStats {
    pub file: String,
    /// Entity table for FAA snapshot files, format name otherwise
    pub kind: String,
    pub records_written: usize,
    /// Rows without their entity's key
    pub records_dropped: usize,
    /// Rows that could not be parsed or written
    pub errors: usize,
    /// Records written per target table (sheet name, file stem, entity table)
    pub tables: BTreeMap<String, usize>,
    pub duration_secs: f64,
}

impl FileStats {
    pub fn new(path: &Path, kind: impl Into<String>) -> Self {
        Self {
            file: file_name(path),
            kind: kind.into(),
            ..Self::default()
        }
    }
}

/// A file that was not ingested: either an unsupported format (`reason`) or a
/// file-level failure (`error`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SkippedFile {
    pub fn unsupported(path: &Path) -> Self {
        Self {
            file: file_name(path),
            reason: Some("unsupported format".to_string()),
            error: None,
        }
    }

    pub fn failed(path: &Path, error: &anyhow::Error) -> Self {
        Self {
            file: file_name(path),
            reason: None,
            error: Some(format!("{:#}", error)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub files_processed: Vec<FileStats>,
    pub files_skipped: Vec<SkippedFile>,
    /// Number of processed files per kind
    pub files_by_kind: BTreeMap<String, usize>,
    /// Records written per table across all files
    pub records_by_table: BTreeMap<String, usize>,
    /// Row-level parse and write failures across all files
    pub errors: usize,
    pub duration_secs: f64,
    /// Row counts after ingestion
    pub store_stats: StoreStats,
}

impl IngestSummary {
    pub fn new(source: &Path) -> Self {
        Self {
            source: Some(source.to_path_buf()),
            ..Self::default()
        }
    }

    pub fn add_file(&mut self, stats: FileStats) {
        *self.files_by_kind.entry(stats.kind.clone()).or_default() += 1;
        for (table, count) in &stats.tables {
            *self.records_by_table.entry(table.clone()).or_default() += count;
        }
        self.errors += stats.errors;
        self.files_processed.push(stats);
    }

    pub fn skip(&mut self, skipped: SkippedFile) {
        self.files_skipped.push(skipped);
    }

    pub fn records_written(&self) -> usize {
        self.files_processed.iter().map(|f| f.records_written).sum()
    }

    pub fn file(&self, name: &str) -> Option<&FileStats> {
        self.files_processed.iter().find(|f| f.file == name)
    }

    pub fn skipped(&self, name: &str) -> Option<&SkippedFile> {
        self.files_skipped.iter().find(|f| f.file == name)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Record metrics for one ingested file
pub(crate) fn record_file_metrics(stats: &FileStats) {
    let kind = stats.kind.clone();
    metrics::histogram!("ingest.file.duration_seconds", "kind" => kind.clone())
        .record(stats.duration_secs);
    metrics::counter!("ingest.records_upserted_total", "kind" => kind.clone())
        .increment(stats.records_written as u64);
    metrics::counter!("ingest.errors_total", "kind" => kind).increment(stats.errors as u64);
}
