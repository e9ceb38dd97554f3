use anyhow::Result;
use serde_json::{Value, json};

use crate::store::Store;

pub fn handle_query(store: &Store, sql: &str) -> Result<Value> {
    let rows = store.raw_query(sql)?;
    Ok(json!({ "count": rows.len(), "rows": rows }))
}
