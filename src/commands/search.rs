use anyhow::Result;
use serde_json::{Value, json};

use crate::store::{ModelFilters, RegistryFilters, Store, effective_limit};

pub fn handle_search_registry(
    store: &Store,
    filters: &RegistryFilters,
    limit: Option<usize>,
) -> Result<Value> {
    let results = store.search_registry(filters, limit)?;
    Ok(json!({
        "count": results.len(),
        "limit": effective_limit(limit),
        "results": results,
    }))
}

pub fn handle_search_models(
    store: &Store,
    filters: &ModelFilters,
    limit: Option<usize>,
) -> Result<Value> {
    let results = store.search_models(filters, limit)?;
    Ok(json!({
        "count": results.len(),
        "limit": effective_limit(limit),
        "results": results,
    }))
}
