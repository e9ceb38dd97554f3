//! Header-to-field mapping tables for the FAA releasable aircraft database.
//!
//! Each snapshot file is comma-delimited with a named header row. Only the
//! headers listed here become typed columns; everything else survives in the
//! record's raw field map.

use crate::records::EntityKind;

#[derive(Debug)]
pub struct ColumnMapping {
    pub kind: EntityKind,
    /// Conventional file name inside the FAA archive
    pub file_name: &'static str,
    /// (upstream header, normalized field)
    pub columns: &'static [(&'static str, &'static str)],
}

impl ColumnMapping {
    /// Resolve one upstream header to its normalized field, if mapped.
    pub fn resolve(&self, header: &str) -> Option<&'static str> {
        let header = header.trim();
        self.columns
            .iter()
            .find(|(upstream, _)| upstream.eq_ignore_ascii_case(header))
            .map(|(_, field)| *field)
    }

    /// Match a directory entry against this file's conventional name.
    pub fn matches_file_name(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(self.file_name)
    }
}

pub static ACFTREF: ColumnMapping = ColumnMapping {
    kind: EntityKind::AircraftModel,
    file_name: "ACFTREF.txt",
    columns: &[
        ("CODE", "code"),
        ("MFR", "manufacturer"),
        ("MODEL", "model"),
        ("TYPE-ACFT", "type_aircraft"),
        ("TYPE-ENG", "type_engine"),
        ("AC-CAT", "aircraft_category"),
        ("BUILD-CERT-IND", "builder_cert_ind"),
        ("NO-ENG", "num_engines"),
        ("NO-SEATS", "num_seats"),
        ("AC-WEIGHT", "weight_class"),
        ("SPEED", "speed"),
        ("TC-DATA-SHEET", "tc_data_sheet"),
        ("TC-DATA-HOLDER", "tc_data_holder"),
    ],
};

pub static ENGINE: ColumnMapping = ColumnMapping {
    kind: EntityKind::Engine,
    file_name: "ENGINE.txt",
    columns: &[
        ("CODE", "code"),
        ("MFR", "manufacturer"),
        ("MODEL", "model"),
        ("TYPE", "type_engine"),
        ("HORSEPOWER", "horsepower"),
        ("THRUST", "thrust"),
    ],
};

pub static MASTER: ColumnMapping = ColumnMapping {
    kind: EntityKind::Registration,
    file_name: "MASTER.txt",
    columns: &[
        ("N-NUMBER", "n_number"),
        ("SERIAL NUMBER", "serial_number"),
        ("MFR MDL CODE", "mfr_mdl_code"),
        ("ENG MFR MDL", "eng_mfr_mdl"),
        ("YEAR MFR", "year_mfr"),
        ("TYPE REGISTRANT", "type_registrant"),
        ("NAME", "registrant_name"),
        ("STREET", "street"),
        ("STREET2", "street2"),
        ("CITY", "city"),
        ("STATE", "state"),
        ("ZIP CODE", "zip_code"),
        ("REGION", "region"),
        ("COUNTY", "county"),
        ("COUNTRY", "country"),
        ("LAST ACTION DATE", "last_action_date"),
        ("CERT ISSUE DATE", "cert_issue_date"),
        ("CERTIFICATION", "certification"),
        ("TYPE AIRCRAFT", "type_aircraft"),
        ("TYPE ENGINE", "type_engine"),
        ("STATUS CODE", "status_code"),
        ("MODE S CODE", "mode_s_code"),
        ("MODE S CODE HEX", "mode_s_hex"),
        ("FRACT OWNER", "fract_owner"),
        ("AIR WORTH DATE", "air_worth_date"),
        ("EXPIRATION DATE", "expiration_date"),
        ("UNIQUE ID", "unique_id"),
        ("KIT MFR", "kit_mfr"),
        ("KIT MODEL", "kit_model"),
    ],
};

pub static DEALER: ColumnMapping = ColumnMapping {
    kind: EntityKind::Dealer,
    file_name: "DEALER.txt",
    columns: &[
        ("CERTIFICATE-NUMBER", "certificate_number"),
        ("OWNERSHIP", "ownership"),
        ("CERTIFICATE-DATE", "certificate_date"),
        ("EXPIRATION-DATE", "expiration_date"),
        ("EXPIRATION-FLAG", "expiration_flag"),
        ("NAME", "name"),
        ("STREET", "street"),
        ("CITY", "city"),
        ("STATE-ABBREV", "state"),
        ("ZIP-CODE", "zip_code"),
    ],
};

pub static DEREG: ColumnMapping = ColumnMapping {
    kind: EntityKind::Deregistered,
    file_name: "DEREG.txt",
    columns: &[
        ("N-NUMBER", "n_number"),
        ("SERIAL-NUMBER", "serial_number"),
        ("MFR-MDL-CODE", "mfr_mdl_code"),
        ("STATUS-CODE", "status_code"),
        ("MODE-S-CODE-HEX", "mode_s_hex"),
        ("CANCEL-DATE", "cancel_date"),
    ],
};

/// Authority files in ingestion order. The registry is last: it is by far
/// the largest and problems in the reference files show up first.
pub fn authority_files() -> [&'static ColumnMapping; 5] {
    [&ACFTREF, &ENGINE, &DEALER, &DEREG, &MASTER]
}

/// The mapping for a directory entry, if it is a well-known authority file.
pub fn mapping_for_file_name(name: &str) -> Option<&'static ColumnMapping> {
    authority_files()
        .into_iter()
        .find(|mapping| mapping.matches_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_trimmed_and_case_insensitive() {
        assert_eq!(MASTER.resolve("N-NUMBER"), Some("n_number"));
        assert_eq!(MASTER.resolve(" mode s code hex "), Some("mode_s_hex"));
        assert_eq!(MASTER.resolve("OTHER NAMES(1)"), None);
        assert_eq!(ACFTREF.resolve("TYPE-ACFT"), Some("type_aircraft"));
    }

    #[test]
    fn test_registry_is_last() {
        let files = authority_files();
        assert_eq!(files[0].kind, EntityKind::AircraftModel);
        assert_eq!(files[files.len() - 1].kind, EntityKind::Registration);
    }

    #[test]
    fn test_mapping_for_file_name() {
        assert_eq!(
            mapping_for_file_name("acftref.TXT").map(|m| m.kind),
            Some(EntityKind::AircraftModel)
        );
        assert_eq!(
            mapping_for_file_name("MASTER.txt").map(|m| m.kind),
            Some(EntityKind::Registration)
        );
        assert!(mapping_for_file_name("DOCINDEX.txt").is_none());
    }

    #[test]
    fn test_every_mapping_names_its_key_column() {
        for mapping in authority_files() {
            let key = mapping.kind.key_field();
            assert!(
                mapping.columns.iter().any(|(_, field)| *field == key),
                "{} does not map its key column {}",
                mapping.file_name,
                key
            );
        }
    }
}
