use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use super::StoreError;
use crate::records::{
    AircraftModel, CustomRecord, Dealer, DeregisteredAircraft, Engine, Record, RegistryEntry,
};

/// Write one record on an open connection or transaction.
///
/// Upsertable entities keep their `created_at` on conflict and get a fresh
/// `updated_at`; custom records are always appended.
pub(crate) fn upsert_record(
    conn: &Connection,
    record: &Record,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    match record {
        Record::AircraftModel(model) => upsert_model(conn, model, now),
        Record::Engine(engine) => upsert_engine(conn, engine, now),
        Record::Registration(entry) => upsert_registration(conn, entry, now),
        Record::Dealer(dealer) => upsert_dealer(conn, dealer, now),
        Record::Deregistered(dereg) => upsert_deregistered(conn, dereg, now),
        Record::Custom(custom) => insert_custom(conn, custom, now).map(|_| ()),
    }
}

fn upsert_model(conn: &Connection, model: &AircraftModel, now: DateTime<Utc>) -> Result<(), StoreError> {
    let raw_json = serde_json::to_string(&model.raw)?;
    conn.execute(
        r#"
        INSERT INTO aircraft_models (
            code, manufacturer, model, type_aircraft, type_engine, aircraft_category,
            builder_cert_ind, num_engines, num_seats, weight_class, speed,
            tc_data_sheet, tc_data_holder, raw_json, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
        ON CONFLICT (code) DO UPDATE SET
            manufacturer = excluded.manufacturer,
            model = excluded.model,
            type_aircraft = excluded.type_aircraft,
            type_engine = excluded.type_engine,
            aircraft_category = excluded.aircraft_category,
            builder_cert_ind = excluded.builder_cert_ind,
            num_engines = excluded.num_engines,
            num_seats = excluded.num_seats,
            weight_class = excluded.weight_class,
            speed = excluded.speed,
            tc_data_sheet = excluded.tc_data_sheet,
            tc_data_holder = excluded.tc_data_holder,
            raw_json = excluded.raw_json,
            updated_at = excluded.updated_at
        "#,
        params![
            model.code,
            model.manufacturer,
            model.model,
            model.type_aircraft,
            model.type_engine,
            model.aircraft_category,
            model.builder_cert_ind,
            model.num_engines,
            model.num_seats,
            model.weight_class,
            model.speed,
            model.tc_data_sheet,
            model.tc_data_holder,
            raw_json,
            now,
        ],
    )?;
    Ok(())
}

fn upsert_engine(conn: &Connection, engine: &Engine, now: DateTime<Utc>) -> Result<(), StoreError> {
    let raw_json = serde_json::to_string(&engine.raw)?;
    conn.execute(
        r#"
        INSERT INTO engines (
            code, manufacturer, model, type_engine, horsepower, thrust,
            raw_json, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        ON CONFLICT (code) DO UPDATE SET
            manufacturer = excluded.manufacturer,
            model = excluded.model,
            type_engine = excluded.type_engine,
            horsepower = excluded.horsepower,
            thrust = excluded.thrust,
            raw_json = excluded.raw_json,
            updated_at = excluded.updated_at
        "#,
        params![
            engine.code,
            engine.manufacturer,
            engine.model,
            engine.type_engine,
            engine.horsepower,
            engine.thrust,
            raw_json,
            now,
        ],
    )?;
    Ok(())
}

fn upsert_registration(
    conn: &Connection,
    entry: &RegistryEntry,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let raw_json = serde_json::to_string(&entry.raw)?;
    conn.execute(
        r#"
        INSERT INTO aircraft_registry (
            n_number, serial_number, mfr_mdl_code, eng_mfr_mdl, year_mfr,
            type_registrant, registrant_name, street, street2, city, state,
            zip_code, region, county, country, last_action_date, cert_issue_date,
            certification, type_aircraft, type_engine, status_code, mode_s_code,
            mode_s_hex, fract_owner, air_worth_date, expiration_date,
            unique_id, kit_mfr, kit_model, raw_json, created_at, updated_at
        )
        VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
            ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?31
        )
        ON CONFLICT (n_number) DO UPDATE SET
            serial_number = excluded.serial_number,
            mfr_mdl_code = excluded.mfr_mdl_code,
            eng_mfr_mdl = excluded.eng_mfr_mdl,
            year_mfr = excluded.year_mfr,
            type_registrant = excluded.type_registrant,
            registrant_name = excluded.registrant_name,
            street = excluded.street,
            street2 = excluded.street2,
            city = excluded.city,
            state = excluded.state,
            zip_code = excluded.zip_code,
            region = excluded.region,
            county = excluded.county,
            country = excluded.country,
            last_action_date = excluded.last_action_date,
            cert_issue_date = excluded.cert_issue_date,
            certification = excluded.certification,
            type_aircraft = excluded.type_aircraft,
            type_engine = excluded.type_engine,
            status_code = excluded.status_code,
            mode_s_code = excluded.mode_s_code,
            mode_s_hex = excluded.mode_s_hex,
            fract_owner = excluded.fract_owner,
            air_worth_date = excluded.air_worth_date,
            expiration_date = excluded.expiration_date,
            unique_id = excluded.unique_id,
            kit_mfr = excluded.kit_mfr,
            kit_model = excluded.kit_model,
            raw_json = excluded.raw_json,
            updated_at = excluded.updated_at
        "#,
        params![
            entry.n_number.to_uppercase(),
            entry.serial_number,
            entry.mfr_mdl_code,
            entry.eng_mfr_mdl,
            entry.year_mfr,
            entry.type_registrant,
            entry.registrant_name,
            entry.street,
            entry.street2,
            entry.city,
            entry.state,
            entry.zip_code,
            entry.region,
            entry.county,
            entry.country,
            entry.last_action_date,
            entry.cert_issue_date,
            entry.certification,
            entry.type_aircraft,
            entry.type_engine,
            entry.status_code,
            entry.mode_s_code,
            entry.mode_s_hex.as_deref().map(str::to_uppercase),
            entry.fract_owner,
            entry.air_worth_date,
            entry.expiration_date,
            entry.unique_id,
            entry.kit_mfr,
            entry.kit_model,
            raw_json,
            now,
        ],
    )?;
    Ok(())
}

fn upsert_dealer(conn: &Connection, dealer: &Dealer, now: DateTime<Utc>) -> Result<(), StoreError> {
    let raw_json = serde_json::to_string(&dealer.raw)?;
    conn.execute(
        r#"
        INSERT INTO dealers (
            certificate_number, ownership, certificate_date, expiration_date,
            expiration_flag, name, street, city, state, zip_code,
            raw_json, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
        ON CONFLICT (certificate_number) DO UPDATE SET
            ownership = excluded.ownership,
            certificate_date = excluded.certificate_date,
            expiration_date = excluded.expiration_date,
            expiration_flag = excluded.expiration_flag,
            name = excluded.name,
            street = excluded.street,
            city = excluded.city,
            state = excluded.state,
            zip_code = excluded.zip_code,
            raw_json = excluded.raw_json,
            updated_at = excluded.updated_at
        "#,
        params![
            dealer.certificate_number,
            dealer.ownership,
            dealer.certificate_date,
            dealer.expiration_date,
            dealer.expiration_flag,
            dealer.name,
            dealer.street,
            dealer.city,
            dealer.state,
            dealer.zip_code,
            raw_json,
            now,
        ],
    )?;
    Ok(())
}

fn upsert_deregistered(
    conn: &Connection,
    dereg: &DeregisteredAircraft,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let raw_json = serde_json::to_string(&dereg.raw)?;
    conn.execute(
        r#"
        INSERT INTO aircraft_deregistered (
            n_number, cancel_date, serial_number, mfr_mdl_code, status_code,
            mode_s_hex, raw_json, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        ON CONFLICT (n_number, cancel_date) DO UPDATE SET
            serial_number = excluded.serial_number,
            mfr_mdl_code = excluded.mfr_mdl_code,
            status_code = excluded.status_code,
            mode_s_hex = excluded.mode_s_hex,
            raw_json = excluded.raw_json,
            updated_at = excluded.updated_at
        "#,
        params![
            dereg.n_number.to_uppercase(),
            dereg.cancel_date,
            dereg.serial_number,
            dereg.mfr_mdl_code,
            dereg.status_code,
            dereg.mode_s_hex.as_deref().map(str::to_uppercase),
            raw_json,
            now,
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_custom(
    conn: &Connection,
    record: &CustomRecord,
    now: DateTime<Utc>,
) -> Result<i64, StoreError> {
    let data_json = serde_json::to_string(&record.data)?;
    conn.execute(
        "INSERT INTO custom_data (source_file, table_name, data_json, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![record.source_file, record.table_name, data_json, now],
    )?;
    Ok(conn.last_insert_rowid())
}
