//! Typed records for every entity the store persists.
//!
//! Parsers produce [`MappedRow`]s; each entity kind turns a row into its own
//! typed struct. A row without the entity's key yields `None` and is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::faa::codes::{
    AircraftCategory, BuilderCertification, WeightClass, aircraft_type_label, engine_type_label,
};
use crate::text::Cell;

/// Every original column of a source row, trimmed, keyed by upstream header.
pub type RawFields = BTreeMap<String, String>;

/// Field map for records from generic files (spreadsheets, JSON, CSV).
pub type DataFields = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    AircraftModel,
    Engine,
    Registration,
    Dealer,
    Deregistered,
    Custom,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::AircraftModel,
        EntityKind::Engine,
        EntityKind::Registration,
        EntityKind::Dealer,
        EntityKind::Deregistered,
        EntityKind::Custom,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::AircraftModel => "aircraft_models",
            EntityKind::Engine => "engines",
            EntityKind::Registration => "aircraft_registry",
            EntityKind::Dealer => "dealers",
            EntityKind::Deregistered => "aircraft_deregistered",
            EntityKind::Custom => "custom_data",
        }
    }

    /// Normalized field holding the primary key (first column for composite keys)
    pub fn key_field(&self) -> &'static str {
        match self {
            EntityKind::AircraftModel | EntityKind::Engine => "code",
            EntityKind::Registration | EntityKind::Deregistered => "n_number",
            EntityKind::Dealer => "certificate_number",
            EntityKind::Custom => "id",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// One parsed row of an authority file: mapped, coerced fields plus the full
/// original field set.
#[derive(Debug, Clone, Default)]
pub struct MappedRow {
    pub fields: BTreeMap<&'static str, Cell>,
    pub raw: RawFields,
}

impl MappedRow {
    pub fn text(&self, field: &str) -> Option<String> {
        self.fields.get(field).map(|cell| cell.text.clone())
    }

    pub fn upper(&self, field: &str) -> Option<String> {
        self.fields.get(field).map(|cell| cell.text.to_uppercase())
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(|cell| cell.value.as_i64())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftModel {
    pub code: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub type_aircraft: Option<String>,
    pub type_engine: Option<String>,
    pub aircraft_category: Option<String>,
    pub builder_cert_ind: Option<String>,
    pub num_engines: Option<i64>,
    pub num_seats: Option<i64>,
    pub weight_class: Option<String>,
    pub speed: Option<i64>,
    pub tc_data_sheet: Option<String>,
    pub tc_data_holder: Option<String>,
    pub raw: RawFields,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AircraftModel {
    pub fn from_row(row: MappedRow) -> Option<Self> {
        Some(AircraftModel {
            code: row.text("code")?,
            manufacturer: row.text("manufacturer"),
            model: row.text("model"),
            type_aircraft: row.text("type_aircraft"),
            type_engine: row.text("type_engine"),
            aircraft_category: row.text("aircraft_category"),
            builder_cert_ind: row.text("builder_cert_ind"),
            num_engines: row.integer("num_engines"),
            num_seats: row.integer("num_seats"),
            weight_class: row.text("weight_class"),
            speed: row.integer("speed"),
            tc_data_sheet: row.text("tc_data_sheet"),
            tc_data_holder: row.text("tc_data_holder"),
            raw: row.raw,
            created_at: None,
            updated_at: None,
        })
    }

    /// Readable labels for the coded columns.
    pub fn labels(&self) -> ModelLabels {
        ModelLabels {
            aircraft_type: aircraft_type_label(self.type_aircraft.as_deref()),
            engine_type: engine_type_label(self.type_engine.as_deref()),
            aircraft_category: self
                .aircraft_category
                .as_deref()
                .and_then(|c| c.parse::<AircraftCategory>().ok())
                .map(|c| c.to_string()),
            builder_certification: self
                .builder_cert_ind
                .as_deref()
                .and_then(|c| c.parse::<BuilderCertification>().ok())
                .map(|c| c.to_string()),
            weight_class: self
                .weight_class
                .as_deref()
                .and_then(|c| c.parse::<WeightClass>().ok())
                .map(|c| c.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelLabels {
    pub aircraft_type: Option<String>,
    pub engine_type: Option<String>,
    pub aircraft_category: Option<String>,
    pub builder_certification: Option<String>,
    pub weight_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    pub code: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub type_engine: Option<String>,
    pub horsepower: Option<i64>,
    pub thrust: Option<i64>,
    pub raw: RawFields,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Engine {
    pub fn from_row(row: MappedRow) -> Option<Self> {
        Some(Engine {
            code: row.text("code")?,
            manufacturer: row.text("manufacturer"),
            model: row.text("model"),
            type_engine: row.text("type_engine"),
            horsepower: row.integer("horsepower"),
            thrust: row.integer("thrust"),
            raw: row.raw,
            created_at: None,
            updated_at: None,
        })
    }
}

/// A row of the registration master file. `n_number` and `mode_s_hex` are
/// stored uppercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub n_number: String,
    pub serial_number: Option<String>,
    pub mfr_mdl_code: Option<String>,
    pub eng_mfr_mdl: Option<String>,
    pub year_mfr: Option<i64>,
    pub type_registrant: Option<String>,
    pub registrant_name: Option<String>,
    pub street: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub region: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
    pub last_action_date: Option<String>,
    pub cert_issue_date: Option<String>,
    pub certification: Option<String>,
    pub type_aircraft: Option<String>,
    pub type_engine: Option<String>,
    pub status_code: Option<String>,
    pub mode_s_code: Option<String>,
    pub mode_s_hex: Option<String>,
    pub fract_owner: Option<String>,
    pub air_worth_date: Option<String>,
    pub expiration_date: Option<String>,
    pub unique_id: Option<String>,
    pub kit_mfr: Option<String>,
    pub kit_model: Option<String>,
    pub raw: RawFields,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RegistryEntry {
    pub fn from_row(row: MappedRow) -> Option<Self> {
        Some(RegistryEntry {
            n_number: row.upper("n_number")?,
            serial_number: row.text("serial_number"),
            mfr_mdl_code: row.text("mfr_mdl_code"),
            eng_mfr_mdl: row.text("eng_mfr_mdl"),
            year_mfr: row.integer("year_mfr"),
            type_registrant: row.text("type_registrant"),
            registrant_name: row.text("registrant_name"),
            street: row.text("street"),
            street2: row.text("street2"),
            city: row.text("city"),
            state: row.text("state"),
            zip_code: row.text("zip_code"),
            region: row.text("region"),
            county: row.text("county"),
            country: row.text("country"),
            last_action_date: row.text("last_action_date"),
            cert_issue_date: row.text("cert_issue_date"),
            certification: row.text("certification"),
            type_aircraft: row.text("type_aircraft"),
            type_engine: row.text("type_engine"),
            status_code: row.text("status_code"),
            mode_s_code: row.text("mode_s_code"),
            mode_s_hex: row.upper("mode_s_hex"),
            fract_owner: row.text("fract_owner"),
            air_worth_date: row.text("air_worth_date"),
            expiration_date: row.text("expiration_date"),
            unique_id: row.text("unique_id"),
            kit_mfr: row.text("kit_mfr"),
            kit_model: row.text("kit_model"),
            raw: row.raw,
            created_at: None,
            updated_at: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dealer {
    pub certificate_number: String,
    pub ownership: Option<String>,
    pub certificate_date: Option<String>,
    pub expiration_date: Option<String>,
    pub expiration_flag: Option<String>,
    pub name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub raw: RawFields,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Dealer {
    pub fn from_row(row: MappedRow) -> Option<Self> {
        Some(Dealer {
            certificate_number: row.text("certificate_number")?,
            ownership: row.text("ownership"),
            certificate_date: row.text("certificate_date"),
            expiration_date: row.text("expiration_date"),
            expiration_flag: row.text("expiration_flag"),
            name: row.text("name"),
            street: row.text("street"),
            city: row.text("city"),
            state: row.text("state"),
            zip_code: row.text("zip_code"),
            raw: row.raw,
            created_at: None,
            updated_at: None,
        })
    }
}

/// One cancellation of a registration. Keyed by (n_number, cancel_date); an
/// unknown cancellation date is the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeregisteredAircraft {
    pub n_number: String,
    pub cancel_date: String,
    pub serial_number: Option<String>,
    pub mfr_mdl_code: Option<String>,
    pub status_code: Option<String>,
    pub mode_s_hex: Option<String>,
    pub raw: RawFields,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeregisteredAircraft {
    pub fn from_row(row: MappedRow) -> Option<Self> {
        Some(DeregisteredAircraft {
            n_number: row.upper("n_number")?,
            cancel_date: row.text("cancel_date").unwrap_or_default(),
            serial_number: row.text("serial_number"),
            mfr_mdl_code: row.text("mfr_mdl_code"),
            status_code: row.text("status_code"),
            mode_s_hex: row.upper("mode_s_hex"),
            raw: row.raw,
            created_at: None,
            updated_at: None,
        })
    }
}

/// Catch-all row from a generic file. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRecord {
    pub id: Option<i64>,
    pub source_file: String,
    pub table_name: String,
    pub data: DataFields,
    pub created_at: Option<DateTime<Utc>>,
}

impl CustomRecord {
    pub fn new(source_file: impl Into<String>, table_name: impl Into<String>, data: DataFields) -> Self {
        CustomRecord {
            id: None,
            source_file: source_file.into(),
            table_name: table_name.into(),
            data,
            created_at: None,
        }
    }
}

/// A record of any entity kind, ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    AircraftModel(AircraftModel),
    Engine(Engine),
    Registration(RegistryEntry),
    Dealer(Dealer),
    Deregistered(DeregisteredAircraft),
    Custom(CustomRecord),
}

impl Record {
    /// Build the typed record for an authority-file row. `None` when the row
    /// lacks its key, or for [`EntityKind::Custom`], which has no mapped form.
    pub fn from_mapped(kind: EntityKind, row: MappedRow) -> Option<Record> {
        match kind {
            EntityKind::AircraftModel => AircraftModel::from_row(row).map(Record::AircraftModel),
            EntityKind::Engine => Engine::from_row(row).map(Record::Engine),
            EntityKind::Registration => RegistryEntry::from_row(row).map(Record::Registration),
            EntityKind::Dealer => Dealer::from_row(row).map(Record::Dealer),
            EntityKind::Deregistered => {
                DeregisteredAircraft::from_row(row).map(Record::Deregistered)
            }
            EntityKind::Custom => None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Record::AircraftModel(_) => EntityKind::AircraftModel,
            Record::Engine(_) => EntityKind::Engine,
            Record::Registration(_) => EntityKind::Registration,
            Record::Dealer(_) => EntityKind::Dealer,
            Record::Deregistered(_) => EntityKind::Deregistered,
            Record::Custom(_) => EntityKind::Custom,
        }
    }

    /// Human-readable key, used in log lines.
    pub fn key(&self) -> String {
        match self {
            Record::AircraftModel(m) => m.code.clone(),
            Record::Engine(e) => e.code.clone(),
            Record::Registration(r) => r.n_number.clone(),
            Record::Dealer(d) => d.certificate_number.clone(),
            Record::Deregistered(d) => format!("{}@{}", d.n_number, d.cancel_date),
            Record::Custom(c) => format!("{}:{}", c.source_file, c.table_name),
        }
    }
}
