//! aircraftdb - local store of the FAA aircraft registry
//!
//! Ingests the FAA releasable-aircraft snapshot files (ACFTREF, ENGINE,
//! MASTER, DEALER, DEREG) plus arbitrary CSV, spreadsheet and JSON files into
//! an embedded SQLite database, and answers lookups and searches over it.

pub mod commands;
pub mod config;
pub mod encoding;
pub mod faa;
pub mod ingest;
pub mod log_format;
pub mod parsers;
pub mod records;
pub mod store;
pub mod text;
