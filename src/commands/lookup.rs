use anyhow::Result;
use serde_json::{Value, json};

use super::found_or_not;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTarget {
    Registration(String),
    Transponder(String),
}

pub fn handle_stats(store: &Store) -> Result<Value> {
    let stats = store.stats()?;
    let total = stats.total();
    Ok(json!({ "counts": stats, "total": total }))
}

/// Registry entry with its joined model and engine, plus any past
/// deregistrations of the same mark.
pub fn handle_lookup(store: &Store, target: &LookupTarget) -> Result<Value> {
    let (key, details) = match target {
        LookupTarget::Registration(mark) => (mark, store.details_by_registration(mark)?),
        LookupTarget::Transponder(hex) => (hex, store.details_by_transponder(hex)?),
    };

    let Some(details) = details else {
        return found_or_not::<()>(key, None);
    };
    let history = store.deregistration_history(&details.registration.n_number)?;

    let mut value = serde_json::to_value(&details)?;
    if let Value::Object(map) = &mut value {
        map.insert("deregistrations".to_string(), serde_json::to_value(history)?);
    }
    Ok(value)
}

pub fn handle_model(store: &Store, code: &str) -> Result<Value> {
    let Some(model) = store.get_model(code)? else {
        return found_or_not::<()>(code, None);
    };
    let labels = model.labels();

    let mut value = serde_json::to_value(&model)?;
    if let Value::Object(map) = &mut value {
        map.insert("labels".to_string(), serde_json::to_value(labels)?);
    }
    Ok(value)
}

pub fn handle_engine(store: &Store, code: &str) -> Result<Value> {
    found_or_not(code, store.get_engine(code)?)
}

pub fn handle_dealer(store: &Store, certificate_number: &str) -> Result<Value> {
    found_or_not(certificate_number, store.get_dealer(certificate_number)?)
}
