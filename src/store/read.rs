use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::StoreError;
use crate::faa::codes::{aircraft_type_label, engine_type_label, registrant_type_label};
use crate::records::{
    AircraftModel, CustomRecord, Dealer, DeregisteredAircraft, Engine, RegistryEntry,
};

/// A registry entry left-joined with its aircraft model and engine.
///
/// Joined fields are `None` when the referenced code is unknown; the registry
/// row itself is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryDetails {
    #[serde(flatten)]
    pub registration: RegistryEntry,
    pub model_manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub model_type_aircraft: Option<String>,
    pub model_type_engine: Option<String>,
    pub model_num_engines: Option<i64>,
    pub model_num_seats: Option<i64>,
    pub model_weight_class: Option<String>,
    pub model_speed: Option<i64>,
    pub engine_manufacturer: Option<String>,
    pub engine_model: Option<String>,
    pub engine_horsepower: Option<i64>,
    pub engine_thrust: Option<i64>,
    pub labels: RegistrationLabels,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistrationLabels {
    pub aircraft_type: Option<String>,
    pub engine_type: Option<String>,
    pub registrant_type: Option<String>,
}

/// Decode a JSON text column into `T`.
fn json_column<T: DeserializeOwned>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|e| {
        let idx = row.as_ref().column_index(column).unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

pub(crate) fn model_from_row(row: &Row<'_>) -> rusqlite::Result<AircraftModel> {
    Ok(AircraftModel {
        code: row.get("code")?,
        manufacturer: row.get("manufacturer")?,
        model: row.get("model")?,
        type_aircraft: row.get("type_aircraft")?,
        type_engine: row.get("type_engine")?,
        aircraft_category: row.get("aircraft_category")?,
        builder_cert_ind: row.get("builder_cert_ind")?,
        num_engines: row.get("num_engines")?,
        num_seats: row.get("num_seats")?,
        weight_class: row.get("weight_class")?,
        speed: row.get("speed")?,
        tc_data_sheet: row.get("tc_data_sheet")?,
        tc_data_holder: row.get("tc_data_holder")?,
        raw: json_column(row, "raw_json")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn engine_from_row(row: &Row<'_>) -> rusqlite::Result<Engine> {
    Ok(Engine {
        code: row.get("code")?,
        manufacturer: row.get("manufacturer")?,
        model: row.get("model")?,
        type_engine: row.get("type_engine")?,
        horsepower: row.get("horsepower")?,
        thrust: row.get("thrust")?,
        raw: json_column(row, "raw_json")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn registration_from_row(row: &Row<'_>) -> rusqlite::Result<RegistryEntry> {
    Ok(RegistryEntry {
        n_number: row.get("n_number")?,
        serial_number: row.get("serial_number")?,
        mfr_mdl_code: row.get("mfr_mdl_code")?,
        eng_mfr_mdl: row.get("eng_mfr_mdl")?,
        year_mfr: row.get("year_mfr")?,
        type_registrant: row.get("type_registrant")?,
        registrant_name: row.get("registrant_name")?,
        street: row.get("street")?,
        street2: row.get("street2")?,
        city: row.get("city")?,
        state: row.get("state")?,
        zip_code: row.get("zip_code")?,
        region: row.get("region")?,
        county: row.get("county")?,
        country: row.get("country")?,
        last_action_date: row.get("last_action_date")?,
        cert_issue_date: row.get("cert_issue_date")?,
        certification: row.get("certification")?,
        type_aircraft: row.get("type_aircraft")?,
        type_engine: row.get("type_engine")?,
        status_code: row.get("status_code")?,
        mode_s_code: row.get("mode_s_code")?,
        mode_s_hex: row.get("mode_s_hex")?,
        fract_owner: row.get("fract_owner")?,
        air_worth_date: row.get("air_worth_date")?,
        expiration_date: row.get("expiration_date")?,
        unique_id: row.get("unique_id")?,
        kit_mfr: row.get("kit_mfr")?,
        kit_model: row.get("kit_model")?,
        raw: json_column(row, "raw_json")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn dealer_from_row(row: &Row<'_>) -> rusqlite::Result<Dealer> {
    Ok(Dealer {
        certificate_number: row.get("certificate_number")?,
        ownership: row.get("ownership")?,
        certificate_date: row.get("certificate_date")?,
        expiration_date: row.get("expiration_date")?,
        expiration_flag: row.get("expiration_flag")?,
        name: row.get("name")?,
        street: row.get("street")?,
        city: row.get("city")?,
        state: row.get("state")?,
        zip_code: row.get("zip_code")?,
        raw: json_column(row, "raw_json")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn deregistered_from_row(row: &Row<'_>) -> rusqlite::Result<DeregisteredAircraft> {
    Ok(DeregisteredAircraft {
        n_number: row.get("n_number")?,
        cancel_date: row.get("cancel_date")?,
        serial_number: row.get("serial_number")?,
        mfr_mdl_code: row.get("mfr_mdl_code")?,
        status_code: row.get("status_code")?,
        mode_s_hex: row.get("mode_s_hex")?,
        raw: json_column(row, "raw_json")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn custom_from_row(row: &Row<'_>) -> rusqlite::Result<CustomRecord> {
    Ok(CustomRecord {
        id: row.get("id")?,
        source_file: row.get("source_file")?,
        table_name: row.get("table_name")?,
        data: json_column(row, "data_json")?,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn get_model(conn: &Connection, code: &str) -> Result<Option<AircraftModel>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT * FROM aircraft_models WHERE code = ?1",
            params![code],
            model_from_row,
        )
        .optional()?)
}

pub(crate) fn get_engine(conn: &Connection, code: &str) -> Result<Option<Engine>, StoreError> {
    Ok(conn
        .query_row("SELECT * FROM engines WHERE code = ?1", params![code], engine_from_row)
        .optional()?)
}

pub(crate) fn get_registration(
    conn: &Connection,
    n_number: &str,
) -> Result<Option<RegistryEntry>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT * FROM aircraft_registry WHERE n_number = ?1",
            params![n_number],
            registration_from_row,
        )
        .optional()?)
}

pub(crate) fn get_by_transponder(
    conn: &Connection,
    mode_s_hex: &str,
) -> Result<Option<RegistryEntry>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT * FROM aircraft_registry WHERE mode_s_hex = ?1 ORDER BY n_number LIMIT 1",
            params![mode_s_hex],
            registration_from_row,
        )
        .optional()?)
}

pub(crate) fn get_dealer(
    conn: &Connection,
    certificate_number: &str,
) -> Result<Option<Dealer>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT * FROM dealers WHERE certificate_number = ?1",
            params![certificate_number],
            dealer_from_row,
        )
        .optional()?)
}

pub(crate) fn deregistrations(
    conn: &Connection,
    n_number: &str,
) -> Result<Vec<DeregisteredAircraft>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM aircraft_deregistered WHERE n_number = ?1 ORDER BY cancel_date DESC",
    )?;
    let rows = stmt
        .query_map(params![n_number], deregistered_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn get_custom(conn: &Connection, id: i64) -> Result<Option<CustomRecord>, StoreError> {
    Ok(conn
        .query_row("SELECT * FROM custom_data WHERE id = ?1", params![id], custom_from_row)
        .optional()?)
}

pub(crate) fn custom_records(
    conn: &Connection,
    table_name: &str,
    limit: usize,
) -> Result<Vec<CustomRecord>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT * FROM custom_data WHERE table_name = ?1 ORDER BY id LIMIT ?2")?;
    let rows = stmt
        .query_map(params![table_name, limit as i64], custom_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Joined registry lookup. `condition` is a fixed predicate on `r` taking
/// one parameter.
pub(crate) fn details_where(
    conn: &Connection,
    condition: &str,
    value: &str,
) -> Result<Option<RegistryDetails>, StoreError> {
    let sql = format!(
        r#"
        SELECT
            r.*,
            m.manufacturer AS model_manufacturer,
            m.model AS model_name,
            m.type_aircraft AS model_type_aircraft,
            m.type_engine AS model_type_engine,
            m.num_engines AS model_num_engines,
            m.num_seats AS model_num_seats,
            m.weight_class AS model_weight_class,
            m.speed AS model_speed,
            e.manufacturer AS engine_manufacturer,
            e.model AS engine_model,
            e.horsepower AS engine_horsepower,
            e.thrust AS engine_thrust
        FROM aircraft_registry r
        LEFT JOIN aircraft_models m ON r.mfr_mdl_code = m.code
        LEFT JOIN engines e ON r.eng_mfr_mdl = e.code
        WHERE {}
        ORDER BY r.n_number
        LIMIT 1
        "#,
        condition
    );

    Ok(conn
        .query_row(&sql, params![value], |row| {
            let registration = registration_from_row(row)?;
            let model_type_aircraft: Option<String> = row.get("model_type_aircraft")?;
            let model_type_engine: Option<String> = row.get("model_type_engine")?;

            // Prefer the registry's own codes; fall back to the model's
            let labels = RegistrationLabels {
                aircraft_type: aircraft_type_label(
                    registration
                        .type_aircraft
                        .as_deref()
                        .or(model_type_aircraft.as_deref()),
                ),
                engine_type: engine_type_label(
                    registration
                        .type_engine
                        .as_deref()
                        .or(model_type_engine.as_deref()),
                ),
                registrant_type: registrant_type_label(registration.type_registrant.as_deref()),
            };

            Ok(RegistryDetails {
                model_manufacturer: row.get("model_manufacturer")?,
                model_name: row.get("model_name")?,
                model_type_aircraft,
                model_type_engine,
                model_num_engines: row.get("model_num_engines")?,
                model_num_seats: row.get("model_num_seats")?,
                model_weight_class: row.get("model_weight_class")?,
                model_speed: row.get("model_speed")?,
                engine_manufacturer: row.get("engine_manufacturer")?,
                engine_model: row.get("engine_model")?,
                engine_horsepower: row.get("engine_horsepower")?,
                engine_thrust: row.get("engine_thrust")?,
                labels,
                registration,
            })
        })
        .optional()?)
}
