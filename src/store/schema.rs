//! Table and index definitions. Every statement is idempotent so the schema
//! can be applied each time a store is opened.

use rusqlite::Connection;

use super::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS aircraft_models (
    code TEXT PRIMARY KEY,
    manufacturer TEXT,
    model TEXT,
    type_aircraft TEXT,
    type_engine TEXT,
    aircraft_category TEXT,
    builder_cert_ind TEXT,
    num_engines INTEGER,
    num_seats INTEGER,
    weight_class TEXT,
    speed INTEGER,
    tc_data_sheet TEXT,
    tc_data_holder TEXT,
    raw_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS engines (
    code TEXT PRIMARY KEY,
    manufacturer TEXT,
    model TEXT,
    type_engine TEXT,
    horsepower INTEGER,
    thrust INTEGER,
    raw_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS aircraft_registry (
    n_number TEXT PRIMARY KEY,
    serial_number TEXT,
    mfr_mdl_code TEXT,
    eng_mfr_mdl TEXT,
    year_mfr INTEGER,
    type_registrant TEXT,
    registrant_name TEXT,
    street TEXT,
    street2 TEXT,
    city TEXT,
    state TEXT,
    zip_code TEXT,
    region TEXT,
    county TEXT,
    country TEXT,
    last_action_date TEXT,
    cert_issue_date TEXT,
    certification TEXT,
    type_aircraft TEXT,
    type_engine TEXT,
    status_code TEXT,
    mode_s_code TEXT,
    mode_s_hex TEXT,
    fract_owner TEXT,
    air_worth_date TEXT,
    expiration_date TEXT,
    unique_id TEXT,
    kit_mfr TEXT,
    kit_model TEXT,
    raw_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dealers (
    certificate_number TEXT PRIMARY KEY,
    ownership TEXT,
    certificate_date TEXT,
    expiration_date TEXT,
    expiration_flag TEXT,
    name TEXT,
    street TEXT,
    city TEXT,
    state TEXT,
    zip_code TEXT,
    raw_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS aircraft_deregistered (
    n_number TEXT NOT NULL,
    cancel_date TEXT NOT NULL DEFAULT '',
    serial_number TEXT,
    mfr_mdl_code TEXT,
    status_code TEXT,
    mode_s_hex TEXT,
    raw_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (n_number, cancel_date)
);

CREATE TABLE IF NOT EXISTS custom_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_file TEXT NOT NULL,
    table_name TEXT NOT NULL,
    data_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_registry_mode_s ON aircraft_registry(mode_s_hex);
CREATE INDEX IF NOT EXISTS idx_registry_mfr_mdl ON aircraft_registry(mfr_mdl_code);
CREATE INDEX IF NOT EXISTS idx_registry_state ON aircraft_registry(state);
CREATE INDEX IF NOT EXISTS idx_registry_city ON aircraft_registry(city);
CREATE INDEX IF NOT EXISTS idx_models_manufacturer ON aircraft_models(manufacturer);
CREATE INDEX IF NOT EXISTS idx_models_type ON aircraft_models(type_aircraft);
CREATE INDEX IF NOT EXISTS idx_deregistered_mode_s ON aircraft_deregistered(mode_s_hex);
CREATE INDEX IF NOT EXISTS idx_custom_table ON custom_data(table_name);
"#;

pub(crate) fn initialize(connection: &mut Connection) -> Result<(), StoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch(SCHEMA)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&mut conn).unwrap();
        initialize(&mut conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 6);
    }

    #[test]
    fn test_lookup_indexes_exist() {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&mut conn).unwrap();

        for index in [
            "idx_registry_mode_s",
            "idx_registry_mfr_mdl",
            "idx_registry_state",
            "idx_registry_city",
            "idx_models_manufacturer",
            "idx_models_type",
        ] {
            let found: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
                    [index],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(found, 1, "missing index {}", index);
        }
    }
}
