//! Directory and single-file ingestion.
//!
//! FAA snapshot files are streamed through [`FaaRecordReader`] into typed
//! records; every other supported file becomes custom records. Records are
//! written in batches, one transaction per batch. Row and file failures are
//! counted and reported in the summary; only a missing source aborts a run.

mod summary;

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

use crate::config::IngestConfig;
use crate::faa::{ColumnMapping, FaaRecordReader, authority_files, mapping_for_file_name};
use crate::parsers::{
    DelimitedRowReader, FileFormat, STRUCTURED_TABLE_NAME, read_structured, read_workbook,
};
use crate::records::{CustomRecord, DataFields, Record};
use crate::store::Store;

pub use summary::{FileStats, IngestSummary, SkippedFile};
use summary::{file_name, record_file_metrics};

pub struct Ingestor<'a> {
    store: &'a Store,
    config: IngestConfig,
}

impl<'a> Ingestor<'a> {
    /// Zero batch sizes and progress intervals are raised to 1.
    pub fn new(store: &'a Store, mut config: IngestConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!("{:#}; using 1", e);
            config.batch_size = config.batch_size.max(1);
            config.progress_interval = config.progress_interval.max(1);
        }
        Self { store, config }
    }

    /// Ingest every supported file of a directory.
    ///
    /// FAA snapshot files go first in a fixed order with the registry last;
    /// the remaining files follow in name order. Hidden files and
    /// subdirectories are ignored.
    pub fn ingest_directory(&self, dir: &Path) -> Result<IngestSummary> {
        if !dir.is_dir() {
            bail!("Directory not found: {:?}", dir);
        }
        let start = Instant::now();
        let mut summary = IngestSummary::new(dir);
        info!("Ingesting directory {:?}", dir);

        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Listing {:?}", dir))?
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                    None
                }
            })
            .filter(|path| path.is_file() && !is_hidden(path))
            .collect();
        entries.sort();

        for mapping in authority_files() {
            if let Some(path) = entries
                .iter()
                .find(|path| mapping.matches_file_name(&file_name(path)))
            {
                self.ingest_authority(path, mapping, &mut summary);
            }
        }

        for path in &entries {
            if mapping_for_file_name(&file_name(path)).is_some() {
                continue;
            }
            self.ingest_secondary(path, &mut summary);
        }

        self.finish(summary, start)
    }

    /// Ingest one file, FAA snapshot or secondary, by name and extension.
    pub fn ingest_file(&self, path: &Path) -> Result<IngestSummary> {
        if !path.is_file() {
            bail!("File not found: {:?}", path);
        }
        let start = Instant::now();
        let mut summary = IngestSummary::new(path);

        match mapping_for_file_name(&file_name(path)) {
            Some(mapping) => self.ingest_authority(path, mapping, &mut summary),
            None => self.ingest_secondary(path, &mut summary),
        }

        self.finish(summary, start)
    }

    fn finish(&self, mut summary: IngestSummary, start: Instant) -> Result<IngestSummary> {
        summary.store_stats = self
            .store
            .stats()
            .context("Reading row counts after ingestion")?;
        summary.duration_secs = start.elapsed().as_secs_f64();
        info!(
            "Ingestion finished: {} files processed, {} skipped, {} records written, {} errors in {:.1}s",
            summary.files_processed.len(),
            summary.files_skipped.len(),
            summary.records_written(),
            summary.errors,
            summary.duration_secs
        );
        Ok(summary)
    }

    fn ingest_authority(
        &self,
        path: &Path,
        mapping: &'static ColumnMapping,
        summary: &mut IngestSummary,
    ) {
        match self.load_authority_file(path, mapping) {
            Ok(stats) => {
                record_file_metrics(&stats);
                summary.add_file(stats);
            }
            Err(e) => {
                error!("Failed to ingest {:?}: {:#}", path, e);
                summary.skip(SkippedFile::failed(path, &e));
            }
        }
    }

    fn ingest_secondary(&self, path: &Path, summary: &mut IngestSummary) {
        let Some(format) = FileFormat::from_path(path) else {
            debug!("Skipping {:?}: unsupported format", path);
            summary.skip(SkippedFile::unsupported(path));
            return;
        };

        match self.load_secondary_file(path, format) {
            Ok(stats) => {
                record_file_metrics(&stats);
                summary.add_file(stats);
            }
            Err(e) => {
                error!("Failed to ingest {:?}: {:#}", path, e);
                summary.skip(SkippedFile::failed(path, &e));
            }
        }
    }

    /// Stream one FAA snapshot file into the store.
    pub fn load_authority_file(
        &self,
        path: &Path,
        mapping: &'static ColumnMapping,
    ) -> Result<FileStats> {
        let start = Instant::now();
        let kind = mapping.kind;
        let mut stats = FileStats::new(path, kind.table_name());
        let _span = info_span!("ingest", file = %stats.file).entered();
        info!("Ingesting {} from {:?}", kind, path);

        let reader = FaaRecordReader::open(path, mapping)?;
        let mut batch = Vec::with_capacity(self.config.batch_size);
        let mut seen: u64 = 0;

        for row in reader {
            seen += 1;
            if seen % self.config.progress_interval == 0 {
                info!(
                    "  Processed {} {} rows ({} written so far)",
                    seen, kind, stats.records_written
                );
            }

            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping unreadable row: {:#}", e);
                    stats.errors += 1;
                    continue;
                }
            };

            match Record::from_mapped(kind, row) {
                Some(record) => batch.push(record),
                None => stats.records_dropped += 1,
            }
            if batch.len() >= self.config.batch_size {
                self.flush(&mut batch, kind.table_name(), &mut stats);
            }
        }
        self.flush(&mut batch, kind.table_name(), &mut stats);

        stats.duration_secs = start.elapsed().as_secs_f64();
        info!(
            "Ingested {} {} records from {:?} ({} dropped without key, {} errors)",
            stats.records_written, kind, path, stats.records_dropped, stats.errors
        );
        Ok(stats)
    }

    /// Load a secondary file as custom records.
    pub fn load_secondary_file(&self, path: &Path, format: FileFormat) -> Result<FileStats> {
        let start = Instant::now();
        let mut stats = FileStats::new(path, format.name());
        let source = path.display().to_string();
        let _span = info_span!("ingest", file = %stats.file).entered();
        info!("Ingesting {} file {:?}", format.name(), path);

        match format {
            FileFormat::Delimited { delimiter } => {
                let table = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| stats.file.clone());
                let reader = DelimitedRowReader::open(path, delimiter)?;
                let mut batch = Vec::with_capacity(self.config.batch_size);

                for row in reader {
                    match row {
                        Ok(fields) => batch.push(custom(&source, &table, fields)),
                        Err(e) => {
                            warn!("Skipping unreadable row: {:#}", e);
                            stats.errors += 1;
                        }
                    }
                    if batch.len() >= self.config.batch_size {
                        self.flush(&mut batch, &table, &mut stats);
                    }
                }
                self.flush(&mut batch, &table, &mut stats);
            }
            FileFormat::Spreadsheet => {
                for sheet in read_workbook(path)? {
                    let rows: Vec<Record> = sheet
                        .rows
                        .into_iter()
                        .map(|fields| custom(&source, &sheet.name, fields))
                        .collect();
                    for chunk in rows.chunks(self.config.batch_size) {
                        let mut batch = chunk.to_vec();
                        self.flush(&mut batch, &sheet.name, &mut stats);
                    }
                    info!("  Sheet '{}': {} rows", sheet.name, rows.len());
                }
            }
            FileFormat::Structured(structured) => {
                let rows: Vec<Record> = read_structured(path, structured)?
                    .into_iter()
                    .map(|fields| custom(&source, STRUCTURED_TABLE_NAME, fields))
                    .collect();
                for chunk in rows.chunks(self.config.batch_size) {
                    let mut batch = chunk.to_vec();
                    self.flush(&mut batch, STRUCTURED_TABLE_NAME, &mut stats);
                }
            }
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        info!(
            "Ingested {} records from {:?} ({} errors)",
            stats.records_written, path, stats.errors
        );
        Ok(stats)
    }

    /// Write and clear the pending batch, folding the outcome into `stats`.
    fn flush(&self, batch: &mut Vec<Record>, table: &str, stats: &mut FileStats) {
        if batch.is_empty() {
            return;
        }

        match self.store.upsert_batch(batch) {
            Ok(outcome) => {
                for (key, e) in &outcome.failed {
                    warn!("Failed to upsert {} {}: {}", table, key, e);
                }
                stats.errors += outcome.failed.len();
                stats.records_written += outcome.written;
                *stats.tables.entry(table.to_string()).or_default() += outcome.written;
            }
            Err(e) => {
                error!(
                    "Failed to write batch of {} {} records: {}",
                    batch.len(),
                    table,
                    e
                );
                stats.errors += batch.len();
            }
        }
        batch.clear();
    }
}

fn custom(source: &str, table: &str, fields: DataFields) -> Record {
    Record::Custom(CustomRecord::new(source, table, fields))
}

fn is_hidden(path: &Path) -> bool {
    file_name(path).starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    fn zero_config(batch_size: usize, progress_interval: u64) -> IngestConfig {
        IngestConfig {
            batch_size,
            progress_interval,
        }
    }

    #[test]
    fn test_zero_batch_size_is_raised() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreConfig::at(dir.path().join("aircraft.db"))).unwrap();
        let data = tempfile::tempdir().unwrap();
        std::fs::write(data.path().join("rows.json"), r#"[{"a": 1}, {"a": 2}]"#).unwrap();

        let ingestor = Ingestor::new(&store, zero_config(0, 10));
        assert_eq!(ingestor.config.batch_size, 1);
        let summary = ingestor.ingest_directory(data.path()).unwrap();
        assert_eq!(summary.records_written(), 2);
    }

    #[test]
    fn test_zero_progress_interval_is_raised() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreConfig::at(dir.path().join("aircraft.db"))).unwrap();
        let data = tempfile::tempdir().unwrap();
        std::fs::write(
            data.path().join("ACFTREF.txt"),
            "CODE,MFR,MODEL\nX1,ACME,Z\nX2,ACME,Y\n",
        )
        .unwrap();

        let ingestor = Ingestor::new(&store, zero_config(10, 0));
        assert_eq!(ingestor.config.progress_interval, 1);
        let summary = ingestor.ingest_directory(data.path()).unwrap();
        assert_eq!(summary.records_written(), 2);
        assert_eq!(summary.errors, 0);
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("/data/.DS_Store")));
        assert!(!is_hidden(Path::new("/data/MASTER.txt")));
    }
}
