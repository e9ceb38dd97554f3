use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use serde::{Deserialize, Serialize};

use super::StoreError;
use super::read::{model_from_row, registration_from_row};
use crate::records::{AircraftModel, RegistryEntry};

pub const DEFAULT_SEARCH_LIMIT: usize = 50;
pub const MAX_SEARCH_LIMIT: usize = 1000;

/// Clamp a requested result cap. Missing or zero means the default.
pub fn effective_limit(limit: Option<usize>) -> usize {
    match limit {
        None | Some(0) => DEFAULT_SEARCH_LIMIT,
        Some(n) => n.min(MAX_SEARCH_LIMIT),
    }
}

/// Registry search predicates. Absent filters match everything; present
/// ones are ANDed. Text filters match substrings, case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryFilters {
    pub registrant_name: Option<String>,
    pub city: Option<String>,
    /// Two-letter state code, exact
    pub state: Option<String>,
    /// Manufacturer name from the model table
    pub manufacturer: Option<String>,
    pub mfr_mdl_code: Option<String>,
    pub type_aircraft: Option<String>,
    pub status_code: Option<String>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelFilters {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub type_aircraft: Option<String>,
    pub num_engines: Option<i64>,
    pub min_seats: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum SearchFilters {
    Registry(RegistryFilters),
    Models(ModelFilters),
}

/// Accumulates `WHERE` conditions and their positional parameters.
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    params: Vec<SqlValue>,
}

impl Conditions {
    fn push(&mut self, clause: &str, value: SqlValue) {
        self.params.push(value);
        self.clauses
            .push(clause.replace('?', &format!("?{}", self.params.len())));
    }

    fn contains(&mut self, column: &str, needle: Option<&str>) {
        if let Some(needle) = non_blank(needle) {
            self.push(
                &format!("{} LIKE ? ESCAPE '\\'", column),
                SqlValue::Text(format!("%{}%", escape_like(needle))),
            );
        }
    }

    fn equals_text(&mut self, column: &str, value: Option<&str>) {
        if let Some(value) = non_blank(value) {
            self.push(&format!("{} = ?", column), SqlValue::Text(value.to_uppercase()));
        }
    }

    fn compare_int(&mut self, column: &str, op: &str, value: Option<i64>) {
        if let Some(value) = value {
            self.push(&format!("{} {} ?", column, op), SqlValue::Integer(value));
        }
    }

    fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            "1=1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn search_registry(
    conn: &Connection,
    filters: &RegistryFilters,
    limit: usize,
) -> Result<Vec<RegistryEntry>, StoreError> {
    let mut conditions = Conditions::default();
    conditions.contains("r.registrant_name", filters.registrant_name.as_deref());
    conditions.contains("r.city", filters.city.as_deref());
    conditions.equals_text("r.state", filters.state.as_deref());
    if let Some(manufacturer) = non_blank(filters.manufacturer.as_deref()) {
        conditions.push(
            "r.mfr_mdl_code IN (SELECT code FROM aircraft_models WHERE manufacturer LIKE ? ESCAPE '\\')",
            SqlValue::Text(format!("%{}%", escape_like(manufacturer))),
        );
    }
    conditions.equals_text("r.mfr_mdl_code", filters.mfr_mdl_code.as_deref());
    conditions.equals_text("r.type_aircraft", filters.type_aircraft.as_deref());
    conditions.equals_text("r.status_code", filters.status_code.as_deref());
    conditions.compare_int("r.year_mfr", ">=", filters.year_from);
    conditions.compare_int("r.year_mfr", "<=", filters.year_to);

    let sql = format!(
        "SELECT r.* FROM aircraft_registry r WHERE {} ORDER BY r.n_number LIMIT {}",
        conditions.where_clause(),
        limit
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(conditions.params.iter()), registration_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn search_models(
    conn: &Connection,
    filters: &ModelFilters,
    limit: usize,
) -> Result<Vec<AircraftModel>, StoreError> {
    let mut conditions = Conditions::default();
    conditions.contains("manufacturer", filters.manufacturer.as_deref());
    conditions.contains("model", filters.model.as_deref());
    conditions.equals_text("type_aircraft", filters.type_aircraft.as_deref());
    conditions.compare_int("num_engines", "=", filters.num_engines);
    conditions.compare_int("num_seats", ">=", filters.min_seats);

    let sql = format!(
        "SELECT * FROM aircraft_models WHERE {} ORDER BY code LIMIT {}",
        conditions.where_clause(),
        limit
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(conditions.params.iter()), model_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit() {
        assert_eq!(effective_limit(None), DEFAULT_SEARCH_LIMIT);
        assert_eq!(effective_limit(Some(0)), DEFAULT_SEARCH_LIMIT);
        assert_eq!(effective_limit(Some(7)), 7);
        assert_eq!(effective_limit(Some(5000)), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(escape_like("CESSNA"), "CESSNA");
    }

    #[test]
    fn test_conditions_number_parameters() {
        let mut conditions = Conditions::default();
        assert_eq!(conditions.where_clause(), "1=1");
        conditions.contains("city", Some("  "));
        conditions.equals_text("state", Some("ks"));
        conditions.compare_int("year_mfr", ">=", Some(1990));
        assert_eq!(conditions.where_clause(), "state = ?1 AND year_mfr >= ?2");
        assert_eq!(conditions.params[0], SqlValue::Text("KS".to_string()));
    }
}
