use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::parsers::non_empty;
use crate::records::DataFields;
use crate::text::{is_placeholder_column, normalize_column_name};

/// The usable rows of one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRows {
    pub name: String,
    pub rows: Vec<DataFields>,
}

/// Read every sheet of a workbook (xlsx, xlsm, xls, ods).
///
/// The first row of each sheet holds the headers. Columns with an empty or
/// placeholder header are dropped, as are empty cells and rows left empty.
/// Sheets without any data row are returned with no rows.
pub fn read_workbook(path: &Path) -> Result<Vec<SheetRows>> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| anyhow!("Failed to open workbook {:?}: {}", path, e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| anyhow!("Failed to read sheet '{}': {}", sheet_name, e))
            .with_context(|| format!("Reading {:?}", path))?;

        let mut rows_iter = range.rows();
        let columns: Vec<Option<String>> = match rows_iter.next() {
            Some(header) => header.iter().map(header_name).collect(),
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for row in rows_iter {
            let mut fields = DataFields::new();
            for (column, cell) in columns.iter().zip(row.iter()) {
                if let Some(name) = column
                    && let Some(value) = cell_value(cell)
                {
                    fields.insert(name.clone(), value);
                }
            }
            if let Some(fields) = non_empty(fields) {
                rows.push(fields);
            }
        }

        debug!("{:?} sheet '{}': {} rows", path, sheet_name, rows.len());
        sheets.push(SheetRows {
            name: sheet_name.clone(),
            rows,
        });
    }

    Ok(sheets)
}

fn header_name(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    };
    let name = normalize_column_name(&text);
    if is_placeholder_column(&name) { None } else { Some(name) }
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let t = s.trim();
            if t.is_empty() { None } else { Some(Value::from(t)) }
        }
        Data::Int(n) => Some(Value::from(*n)),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Some(Value::from(*b)),
        Data::DateTime(dt) => Some(
            excel_serial_to_iso(dt.as_f64())
                .map(Value::from)
                .unwrap_or_else(|| Value::from(dt.as_f64())),
        ),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::from(s.as_str())),
        Data::Error(e) => Some(Value::from(format!("#{:?}", e))),
    }
}

fn float_value(f: f64) -> Option<Value> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        Some(Value::from(f as i64))
    } else {
        Some(Value::from(f))
    }
}

/// Convert a 1900-system serial date to ISO 8601. Whole serials become a
/// plain date; fractional ones a date-time at second precision.
fn excel_serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    // Serial 0 is 1899-12-30 once the 1900 leap-year bug is accounted for
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    let datetime = base.checked_add_signed(Duration::try_seconds(seconds)?)?;

    if serial.fract() == 0.0 {
        Some(datetime.date().format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_excel_serial_to_iso() {
        assert_eq!(excel_serial_to_iso(45292.0).as_deref(), Some("2024-01-01"));
        assert_eq!(
            excel_serial_to_iso(45292.5).as_deref(),
            Some("2024-01-01T12:00:00")
        );
        assert_eq!(excel_serial_to_iso(-1.0), None);
    }

    #[test]
    fn test_float_value() {
        assert_eq!(float_value(3.0), Some(json!(3)));
        assert_eq!(float_value(2.5), Some(json!(2.5)));
        assert_eq!(float_value(f64::NAN), None);
    }

    #[test]
    fn test_header_name_drops_placeholders() {
        assert_eq!(header_name(&Data::String("Tail #".into())).as_deref(), Some("tail"));
        assert_eq!(header_name(&Data::String("Unnamed: 3".into())), None);
        assert_eq!(header_name(&Data::Empty), None);
        assert_eq!(header_name(&Data::Float(2024.0)).as_deref(), Some("2024"));
    }

    #[test]
    fn test_read_workbook_multiple_sheets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fleet.xlsx");

        let mut workbook = Workbook::new();
        let fleet = workbook.add_worksheet().set_name("Fleet").unwrap();
        fleet.write_string(0, 0, "Tail Number").unwrap();
        fleet.write_string(0, 1, "Seats").unwrap();
        fleet.write_string(0, 2, "col_2").unwrap();
        fleet.write_string(1, 0, "N123").unwrap();
        fleet.write_number(1, 1, 4.0).unwrap();
        fleet.write_string(1, 2, "ignored").unwrap();
        fleet.write_string(3, 0, "N456").unwrap();
        let empty = workbook.add_worksheet().set_name("Empty").unwrap();
        empty.write_string(0, 0, "only header").unwrap();
        workbook.save(&path).unwrap();

        let sheets = read_workbook(&path).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "Fleet");
        assert_eq!(
            sheets[0].rows,
            vec![
                json!({"tail_number": "N123", "seats": 4}).as_object().unwrap().clone(),
                json!({"tail_number": "N456"}).as_object().unwrap().clone(),
            ]
        );
        assert_eq!(sheets[1].name, "Empty");
        assert!(sheets[1].rows.is_empty());
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        assert!(read_workbook(&path).is_err());
    }
}
