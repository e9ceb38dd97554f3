//! The embedded SQLite store holding every ingested entity.
//!
//! A [`Store`] is a plain handle: it remembers where the database lives and
//! how to configure connections. Each operation opens its own short-lived
//! connection, so a handle can be shared by reference across threads and
//! concurrent readers never wait on an ingestion writer (WAL mode).

mod query;
mod read;
mod schema;
mod search;
mod write;

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OpenFlags, Transaction, TransactionBehavior};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::records::{
    AircraftModel, CustomRecord, Dealer, DeregisteredAircraft, Engine, EntityKind, Record,
    RegistryEntry,
};

pub use query::{QueryRow, validate_read_only};
pub use read::{RegistrationLabels, RegistryDetails};
pub use search::{
    DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, ModelFilters, RegistryFilters, SearchFilters,
    effective_limit,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The database lock could not be acquired within the busy timeout.
    /// Transient; the operation can be retried.
    #[error("store busy: {0}")]
    Busy(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
    /// A raw query failed the read-only guard
    #[error("query rejected: {0}")]
    Rejected(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                StoreError::Busy(err.to_string())
            }
            _ => StoreError::Sqlite(err),
        }
    }
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Busy(_))
    }
}

/// Row counts per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StoreStats {
    pub counts: BTreeMap<String, i64>,
}

impl StoreStats {
    pub fn count(&self, kind: EntityKind) -> i64 {
        self.counts.get(kind.table_name()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> i64 {
        self.counts.values().sum()
    }
}

/// Result of writing one batch of records in a single transaction.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub written: usize,
    /// Records whose statement failed, by record key
    pub failed: Vec<(String, StoreError)>,
}

#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
}

impl Store {
    /// Open (creating if needed) the store described by `config` and make
    /// sure the schema exists.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        ensure_parent_dir(&config.path)?;
        let store = Self { config };
        let mut conn = store.write_connection()?;
        schema::initialize(&mut conn)?;
        info!("Opened aircraft store at {:?}", store.config.path);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn write_connection(&self) -> Result<Connection, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.config.path, flags)?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;
        let mode: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            self.config.journal_mode.pragma_value(),
            |row| row.get(0),
        )?;
        debug!("journal_mode = {}", mode);
        conn.pragma_update(None, "synchronous", self.config.synchronous.pragma_value())?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    fn read_connection(&self) -> Result<Connection, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.config.path, flags)?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;
        conn.pragma_update(None, "query_only", "ON")?;
        Ok(conn)
    }

    /// Run `f` inside one write transaction. The transaction takes the write
    /// lock up front and is rolled back if `f` fails.
    pub fn transaction<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    {
        let mut conn = self.write_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Insert or overwrite one record. Custom records are appended.
    pub fn upsert(&self, record: &Record) -> Result<(), StoreError> {
        let now = Utc::now();
        self.transaction(|tx| write::upsert_record(tx, record, now))
    }

    pub fn upsert_model(&self, model: &AircraftModel) -> Result<(), StoreError> {
        self.upsert(&Record::AircraftModel(model.clone()))
    }

    pub fn upsert_engine(&self, engine: &Engine) -> Result<(), StoreError> {
        self.upsert(&Record::Engine(engine.clone()))
    }

    pub fn upsert_registration(&self, entry: &RegistryEntry) -> Result<(), StoreError> {
        self.upsert(&Record::Registration(entry.clone()))
    }

    /// Append a custom record and return its id.
    pub fn insert_custom(&self, record: &CustomRecord) -> Result<i64, StoreError> {
        let now = Utc::now();
        self.transaction(|tx| write::insert_custom(tx, record, now))
    }

    /// Write a batch of records in one transaction.
    ///
    /// A record whose statement fails is reported in the outcome and the rest
    /// of the batch is still written. Failing to begin or commit the
    /// transaction fails the whole batch.
    pub fn upsert_batch(&self, records: &[Record]) -> Result<BatchOutcome, StoreError> {
        if records.is_empty() {
            return Ok(BatchOutcome::default());
        }
        let now = Utc::now();
        self.transaction(|tx| {
            let mut outcome = BatchOutcome::default();
            for record in records {
                match write::upsert_record(tx, record, now) {
                    Ok(_) => outcome.written += 1,
                    Err(e @ StoreError::Busy(_)) => return Err(e),
                    Err(e) => outcome.failed.push((record.key(), e)),
                }
            }
            Ok(outcome)
        })
    }

    pub fn get_model(&self, code: &str) -> Result<Option<AircraftModel>, StoreError> {
        read::get_model(&self.read_connection()?, code.trim())
    }

    pub fn get_engine(&self, code: &str) -> Result<Option<Engine>, StoreError> {
        read::get_engine(&self.read_connection()?, code.trim())
    }

    pub fn get_dealer(&self, certificate_number: &str) -> Result<Option<Dealer>, StoreError> {
        read::get_dealer(&self.read_connection()?, certificate_number.trim())
    }

    /// Registry entry by registration mark. FAA files store marks without the
    /// leading `N`, so `N12345` also finds `12345`.
    pub fn get_registration(&self, registration: &str) -> Result<Option<RegistryEntry>, StoreError> {
        let conn = self.read_connection()?;
        for candidate in registration_candidates(registration) {
            if let Some(entry) = read::get_registration(&conn, &candidate)? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    pub fn get_by_transponder(&self, hex: &str) -> Result<Option<RegistryEntry>, StoreError> {
        read::get_by_transponder(&self.read_connection()?, &hex.trim().to_uppercase())
    }

    /// Every deregistration of a registration mark, most recent first.
    pub fn deregistration_history(
        &self,
        registration: &str,
    ) -> Result<Vec<DeregisteredAircraft>, StoreError> {
        let conn = self.read_connection()?;
        let mut history = Vec::new();
        for candidate in registration_candidates(registration) {
            history.extend(read::deregistrations(&conn, &candidate)?);
        }
        history.sort_by(|a, b| b.cancel_date.cmp(&a.cancel_date));
        Ok(history)
    }

    pub fn get_custom(&self, id: i64) -> Result<Option<CustomRecord>, StoreError> {
        read::get_custom(&self.read_connection()?, id)
    }

    /// Custom records of one table (sheet or file stem), oldest first.
    pub fn custom_records(
        &self,
        table_name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CustomRecord>, StoreError> {
        read::custom_records(&self.read_connection()?, table_name, effective_limit(limit))
    }

    /// Exact-match lookup by primary key.
    ///
    /// Deregistrations are keyed `N-NUMBER@CANCEL-DATE`; a bare registration
    /// returns its most recent deregistration. Custom records are keyed by id.
    pub fn get_by_key(&self, kind: EntityKind, key: &str) -> Result<Option<Record>, StoreError> {
        let record = match kind {
            EntityKind::AircraftModel => self.get_model(key)?.map(Record::AircraftModel),
            EntityKind::Engine => self.get_engine(key)?.map(Record::Engine),
            EntityKind::Registration => self.get_registration(key)?.map(Record::Registration),
            EntityKind::Dealer => self.get_dealer(key)?.map(Record::Dealer),
            EntityKind::Deregistered => {
                let (registration, cancel_date) = match key.split_once('@') {
                    Some((registration, date)) => (registration, Some(date.trim())),
                    None => (key, None),
                };
                self.deregistration_history(registration)?
                    .into_iter()
                    .find(|d| cancel_date.is_none_or(|date| d.cancel_date == date))
                    .map(Record::Deregistered)
            }
            EntityKind::Custom => match key.trim().parse::<i64>() {
                Ok(id) => self.get_custom(id)?.map(Record::Custom),
                Err(_) => None,
            },
        };
        Ok(record)
    }

    /// Registry entry joined with its model and engine, by registration mark
    /// or, failing that, by transponder address.
    pub fn get_with_joins(&self, identifier: &str) -> Result<Option<RegistryDetails>, StoreError> {
        if let Some(details) = self.details_by_registration(identifier)? {
            return Ok(Some(details));
        }
        self.details_by_transponder(identifier)
    }

    pub fn details_by_registration(
        &self,
        registration: &str,
    ) -> Result<Option<RegistryDetails>, StoreError> {
        let conn = self.read_connection()?;
        for candidate in registration_candidates(registration) {
            if let Some(details) = read::details_where(&conn, "r.n_number = ?1", &candidate)? {
                return Ok(Some(details));
            }
        }
        Ok(None)
    }

    pub fn details_by_transponder(&self, hex: &str) -> Result<Option<RegistryDetails>, StoreError> {
        let conn = self.read_connection()?;
        read::details_where(&conn, "r.mode_s_hex = ?1", &hex.trim().to_uppercase())
    }

    pub fn search(
        &self,
        filters: &SearchFilters,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError> {
        match filters {
            SearchFilters::Registry(f) => Ok(self
                .search_registry(f, limit)?
                .into_iter()
                .map(Record::Registration)
                .collect()),
            SearchFilters::Models(f) => Ok(self
                .search_models(f, limit)?
                .into_iter()
                .map(Record::AircraftModel)
                .collect()),
        }
    }

    pub fn search_registry(
        &self,
        filters: &RegistryFilters,
        limit: Option<usize>,
    ) -> Result<Vec<RegistryEntry>, StoreError> {
        search::search_registry(&self.read_connection()?, filters, effective_limit(limit))
    }

    pub fn search_models(
        &self,
        filters: &ModelFilters,
        limit: Option<usize>,
    ) -> Result<Vec<AircraftModel>, StoreError> {
        search::search_models(&self.read_connection()?, filters, effective_limit(limit))
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.read_connection()?;
        let mut stats = StoreStats::default();
        for kind in EntityKind::ALL {
            let table = kind.table_name();
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            stats.counts.insert(table.to_string(), count);
        }
        Ok(stats)
    }

    /// Run a caller-supplied `SELECT` on a read-only connection.
    pub fn raw_query(&self, sql: &str) -> Result<Vec<QueryRow>, StoreError> {
        let statement = validate_read_only(sql)?;
        query::run_read_only(&self.read_connection()?, statement)
    }
}

/// Registration marks to try, in order: the mark as given (uppercased), then
/// without its leading `N`.
fn registration_candidates(registration: &str) -> Vec<String> {
    let mark = registration.trim().to_uppercase();
    let mut candidates = Vec::with_capacity(2);
    if let Some(stripped) = mark.strip_prefix('N')
        && !stripped.is_empty()
    {
        candidates.push(mark.clone());
        candidates.push(stripped.to_string());
    } else if !mark.is_empty() {
        candidates.push(mark);
    }
    candidates
}

fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_candidates() {
        assert_eq!(registration_candidates(" n123ab "), vec!["N123AB", "123AB"]);
        assert_eq!(registration_candidates("123AB"), vec!["123AB"]);
        assert_eq!(registration_candidates("N"), vec!["N"]);
        assert!(registration_candidates("  ").is_empty());
    }

    #[test]
    fn test_busy_errors_are_retryable() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        );
        let err = StoreError::from(busy);
        assert!(err.is_retryable());

        let other = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!other.is_retryable());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("aircraft.db");
        let store = Store::open(StoreConfig::at(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(store.stats().unwrap().total(), 0);
    }
}
