//! Readers for secondary files: anything that is not an FAA snapshot.
//!
//! Each reader turns its format into plain field maps; the ingestor stores
//! every map as a custom record tagged with a table name.

pub mod delimited;
pub mod spreadsheet;
pub mod structured;

use std::path::Path;

use crate::records::DataFields;

pub use delimited::DelimitedRowReader;
pub use spreadsheet::{SheetRows, read_workbook};
pub use structured::{StructuredFormat, read_structured};

/// Table name used for rows of structured (JSON) files.
pub const STRUCTURED_TABLE_NAME: &str = "data";

/// Secondary file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// Comma- or tab-delimited text with a header row
    Delimited { delimiter: u8 },
    Spreadsheet,
    Structured(StructuredFormat),
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Delimited { delimiter: b',' }),
            "tsv" => Some(FileFormat::Delimited { delimiter: b'\t' }),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(FileFormat::Spreadsheet),
            "json" => Some(FileFormat::Structured(StructuredFormat::Json)),
            "jsonl" | "ndjson" => Some(FileFormat::Structured(StructuredFormat::JsonLines)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Delimited { delimiter: b'\t' } => "tsv",
            FileFormat::Delimited { .. } => "csv",
            FileFormat::Spreadsheet => "spreadsheet",
            FileFormat::Structured(StructuredFormat::Json) => "json",
            FileFormat::Structured(StructuredFormat::JsonLines) => "jsonl",
        }
    }
}

/// Drop empty maps; a row with no usable cell carries nothing to store.
pub(crate) fn non_empty(fields: DataFields) -> Option<DataFields> {
    if fields.is_empty() { None } else { Some(fields) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            FileFormat::from_path(Path::new("a/fleet.CSV")),
            Some(FileFormat::Delimited { delimiter: b',' })
        );
        assert_eq!(
            FileFormat::from_path(Path::new("fleet.tsv")).map(|f| f.name()),
            Some("tsv")
        );
        assert_eq!(
            FileFormat::from_path(Path::new("book.ods")),
            Some(FileFormat::Spreadsheet)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("x.ndjson")),
            Some(FileFormat::Structured(StructuredFormat::JsonLines))
        );
        assert_eq!(FileFormat::from_path(Path::new("DOCINDEX.txt")), None);
        assert_eq!(FileFormat::from_path(Path::new("README")), None);
    }
}
