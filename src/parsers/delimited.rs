use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::encoding::{DecodingReader, open_decoded};
use crate::parsers::non_empty;
use crate::records::DataFields;
use crate::text::{normalize_column_name, parse_value};

/// Streaming reader for a generic delimited file.
///
/// Headers are normalized to snake_case; columns whose header normalizes to
/// nothing are dropped. Values are coerced like FAA cells and empty cells are
/// left out of the row. Rows with no remaining cell are skipped.
pub struct DelimitedRowReader {
    path: PathBuf,
    columns: Vec<Option<String>>,
    records: StringRecordsIntoIter<DecodingReader<File>>,
    finished: bool,
}

impl DelimitedRowReader {
    pub fn open(path: &Path, delimiter: u8) -> Result<Self> {
        let (decoded, _encoding) = open_decoded(path)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(decoded);

        let columns = reader
            .headers()
            .with_context(|| format!("Reading header row of {:?}", path))?
            .iter()
            .map(|h| {
                let name = normalize_column_name(h);
                if name.is_empty() { None } else { Some(name) }
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            records: reader.into_records(),
            finished: false,
        })
    }

    /// Normalized column names, `None` for dropped columns.
    pub fn columns(&self) -> &[Option<String>] {
        &self.columns
    }
}

impl Iterator for DelimitedRowReader {
    type Item = Result<DataFields>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let record = match self.records.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Ok(record)) => record,
                Some(Err(e)) => {
                    if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                        self.finished = true;
                    }
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    return Some(
                        Err(e).with_context(|| format!("Reading {:?} line {}", self.path, line)),
                    );
                }
            };

            let mut fields = DataFields::new();
            for (column, value) in self.columns.iter().zip(record.iter()) {
                if let Some(name) = column
                    && let Some(value) = parse_value(value)
                {
                    fields.insert(name.clone(), value.to_json());
                }
            }

            if let Some(fields) = non_empty(fields) {
                return Some(Ok(fields));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(bytes: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_normalizes_headers_and_coerces_values() {
        let f = write_file(b"Tail Number,Year Built,Weight (lbs),\nN123,1998,2450.5,\n");
        let rows: Vec<DataFields> = DelimitedRowReader::open(f.path(), b',')
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("tail_number"), Some(&json!("N123")));
        assert_eq!(rows[0].get("year_built"), Some(&json!(1998)));
        assert_eq!(rows[0].get("weight_lbs"), Some(&json!(2450.5)));
        assert_eq!(rows[0].len(), 3);
    }

    #[test]
    fn test_tab_delimited_and_empty_cells() {
        let f = write_file(b"a\tb\n1\t\n\t\n2\tx\n");
        let rows: Vec<DataFields> = DelimitedRowReader::open(f.path(), b'\t')
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("a"), Some(&json!(1)));
        assert!(rows[0].get("b").is_none());
        assert_eq!(rows[1].get("b"), Some(&json!("x")));
    }
}
