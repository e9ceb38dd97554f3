//! Handlers behind the `aircraftdb` subcommands. Each returns the JSON value
//! the binary prints.

pub mod ingest;
pub mod lookup;
pub mod query;
pub mod search;

pub use ingest::{handle_ingest_directory, handle_ingest_file};
pub use lookup::{
    LookupTarget, handle_dealer, handle_engine, handle_lookup, handle_model, handle_stats,
};
pub use query::handle_query;
pub use search::{handle_search_models, handle_search_registry};

use serde::Serialize;
use serde_json::{Value, json};

/// JSON for an optional lookup result: the value, or `{"found": false}`.
pub(crate) fn found_or_not<T: Serialize>(key: &str, value: Option<T>) -> anyhow::Result<Value> {
    match value {
        Some(value) => Ok(serde_json::to_value(value)?),
        None => Ok(json!({ "found": false, "key": key })),
    }
}
