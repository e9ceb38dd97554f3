//! FAA releasable aircraft database: code tables, header mappings and the
//! streaming reader for the comma-delimited snapshot files.

pub mod codes;
pub mod columns;
pub mod reader;

pub use columns::{ColumnMapping, authority_files, mapping_for_file_name};
pub use reader::FaaRecordReader;
