//! Common test utilities for store-backed integration tests
//!
//! `TestStore` opens a fresh store file inside its own temporary directory.
//! The directory, store file and WAL files included, is removed when the
//! `TestStore` is dropped, so tests can run in parallel without sharing state.
//!
//! ```no_run
//! use common::TestStore;
//!
//! #[test]
//! fn my_test() {
//!     let test_store = TestStore::new().expect("Failed to create test store");
//!     let store = test_store.store();
//! }
//! ```

#![allow(dead_code)]

use aircraftdb::config::{IngestConfig, StoreConfig};
use aircraftdb::ingest::Ingestor;
use aircraftdb::store::Store;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ACFTREF_HEADER: &str =
    "CODE,MFR,MODEL,TYPE-ACFT,TYPE-ENG,AC-CAT,BUILD-CERT-IND,NO-ENG,NO-SEATS,AC-WEIGHT,SPEED,TC-DATA-SHEET,TC-DATA-HOLDER,";
pub const ENGINE_HEADER: &str = "CODE,MFR,MODEL,TYPE,HORSEPOWER,THRUST,";
pub const MASTER_HEADER: &str = "N-NUMBER,SERIAL NUMBER,MFR MDL CODE,ENG MFR MDL,YEAR MFR,TYPE REGISTRANT,NAME,STREET,STREET2,CITY,STATE,ZIP CODE,REGION,COUNTY,COUNTRY,LAST ACTION DATE,CERT ISSUE DATE,CERTIFICATION,TYPE AIRCRAFT,TYPE ENGINE,STATUS CODE,MODE S CODE,FRACT OWNER,AIR WORTH DATE,OTHER NAMES(1),EXPIRATION DATE,UNIQUE ID,KIT MFR,KIT MODEL,MODE S CODE HEX,";
pub const DEALER_HEADER: &str = "CERTIFICATE-NUMBER,OWNERSHIP,CERTIFICATE-DATE,EXPIRATION-DATE,EXPIRATION-FLAG,CERTIFICATE-ISSUE-COUNT,NAME,STREET,STREET2,CITY,STATE-ABBREV,ZIP-CODE,";
pub const DEREG_HEADER: &str =
    "N-NUMBER,SERIAL-NUMBER,MFR-MDL-CODE,STATUS-CODE,NAME,MODE-S-CODE-HEX,CANCEL-DATE,";

/// An isolated store in a temporary directory.
pub struct TestStore {
    dir: TempDir,
    store: Store,
}

impl TestStore {
    pub fn new() -> Result<Self> {
        Self::with_config(|_| {})
    }

    /// A test store whose config is adjusted by `configure` before opening.
    pub fn with_config(configure: impl FnOnce(&mut StoreConfig)) -> Result<Self> {
        let dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let mut config = StoreConfig::at(dir.path().join("aircraft.db"));
        configure(&mut config);
        let store = Store::open(config).context("Failed to open test store")?;
        Ok(Self { dir, store })
    }

    /// A second, plain connection to the same store file.
    pub fn raw_connection(&self) -> rusqlite::Connection {
        let conn = rusqlite::Connection::open(self.path()).expect("Failed to open raw connection");
        conn.busy_timeout(std::time::Duration::from_millis(1_000))
            .expect("Failed to set busy timeout");
        conn
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn ingestor(&self) -> Ingestor<'_> {
        Ingestor::new(&self.store, test_ingest_config())
    }
}

/// Small batches so multi-batch paths are exercised by small fixtures.
pub fn test_ingest_config() -> IngestConfig {
    IngestConfig {
        batch_size: 2,
        progress_interval: 1_000,
    }
}

/// A fresh data directory for fixture files.
pub fn data_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create data dir")
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write fixture file");
    path
}

/// Write an authority file: the header, then one line per row.
pub fn write_authority(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let mut contents = String::from(header);
    contents.push_str("\r\n");
    for row in rows {
        contents.push_str(row);
        contents.push_str("\r\n");
    }
    write_file(dir, name, contents.as_bytes())
}

pub fn write_acftref(dir: &Path, rows: &[&str]) -> PathBuf {
    write_authority(dir, "ACFTREF.txt", ACFTREF_HEADER, rows)
}

pub fn write_engine(dir: &Path, rows: &[&str]) -> PathBuf {
    write_authority(dir, "ENGINE.txt", ENGINE_HEADER, rows)
}

pub fn write_master(dir: &Path, rows: &[&str]) -> PathBuf {
    write_authority(dir, "MASTER.txt", MASTER_HEADER, rows)
}

pub fn write_dealer(dir: &Path, rows: &[&str]) -> PathBuf {
    write_authority(dir, "DEALER.txt", DEALER_HEADER, rows)
}

pub fn write_dereg(dir: &Path, rows: &[&str]) -> PathBuf {
    write_authority(dir, "DEREG.txt", DEREG_HEADER, rows)
}

/// A model reference row; other columns blank.
pub fn acftref_row(code: &str, manufacturer: &str, model: &str, type_aircraft: &str, seats: u32) -> String {
    format!(
        "{code},{manufacturer},{model},{type_aircraft},1,1,0,1,{seats},CLASS 1,110,,,"
    )
}

/// A registry row with the columns the tests care about.
#[allow(clippy::too_many_arguments)]
pub fn master_row(
    n_number: &str,
    mfr_mdl_code: &str,
    eng_mfr_mdl: &str,
    year: &str,
    name: &str,
    city: &str,
    state: &str,
    mode_s_hex: &str,
) -> String {
    format!(
        "{n_number},SN-{n_number},{mfr_mdl_code},{eng_mfr_mdl},{year},1,{name},1 MAIN ST,,{city},{state},67202,4,173,US,20230115,20200101,1N,4,1,V,51234567,,20000101,,20300101,12345,,,{mode_s_hex},"
    )
}
