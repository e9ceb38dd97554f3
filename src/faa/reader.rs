use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use encoding_rs::Encoding;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::encoding::{DecodingReader, open_decoded};
use crate::faa::columns::ColumnMapping;
use crate::records::MappedRow;
use crate::text::parse_cell;

/// Forward-only reader over one FAA snapshot file.
///
/// The header row is read once when the file is opened; every following
/// non-blank row is yielded as a [`MappedRow`]. Rows are decoded and parsed
/// lazily, so memory use does not grow with the file.
pub struct FaaRecordReader {
    mapping: &'static ColumnMapping,
    path: PathBuf,
    encoding: &'static Encoding,
    headers: Vec<String>,
    fields: Vec<Option<&'static str>>,
    records: StringRecordsIntoIter<DecodingReader<File>>,
    line: u64,
    finished: bool,
}

impl FaaRecordReader {
    pub fn open(path: &Path, mapping: &'static ColumnMapping) -> Result<Self> {
        let (decoded, encoding) = open_decoded(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(decoded);

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Reading header row of {:?}", path))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(anyhow!("{:?} has no header row", path));
        }
        let headers = disambiguate_headers(path, headers);

        let fields: Vec<Option<&'static str>> =
            headers.iter().map(|h| mapping.resolve(h)).collect();
        let mapped = fields.iter().filter(|f| f.is_some()).count();
        debug!(
            "{:?}: {} columns, {} mapped to {} fields, encoding {}",
            path,
            headers.len(),
            mapped,
            mapping.kind,
            encoding.name()
        );

        Ok(Self {
            mapping,
            path: path.to_path_buf(),
            encoding,
            headers,
            fields,
            records: reader.into_records(),
            line: 1,
            finished: false,
        })
    }

    pub fn mapping(&self) -> &'static ColumnMapping {
        self.mapping
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn map_record(&self, record: &StringRecord) -> MappedRow {
        let mut row = MappedRow::default();

        for (i, header) in self.headers.iter().enumerate() {
            // Trailing delimiters in FAA files produce an unnamed last column
            if header.is_empty() {
                continue;
            }
            let value = record.get(i).unwrap_or("").trim();
            row.raw.insert(header.clone(), value.to_string());

            if let Some(field) = self.fields[i]
                && let Some(cell) = parse_cell(value)
            {
                row.fields.insert(field, cell);
            }
        }

        row
    }
}

/// Suffix repeated headers (`NAME`, `NAME#2`) so every column keeps its own
/// raw entry. Only the first occurrence can resolve to a mapped field.
fn disambiguate_headers(path: &Path, headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|header| {
            if header.is_empty() {
                return header;
            }
            let count = seen.entry(header.to_ascii_uppercase()).or_default();
            *count += 1;
            if *count == 1 {
                header
            } else {
                let renamed = format!("{}#{}", header, count);
                warn!("{:?}: repeated header {:?} kept as {:?}", path, header, renamed);
                renamed
            }
        })
        .collect()
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|v| v.trim().is_empty())
}

impl Iterator for FaaRecordReader {
    type Item = Result<MappedRow>;

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
                    self.line += 1;
                    // An I/O error leaves the reader in an unknown position
                    if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                        self.finished = true;
                    }
                    return Some(
                        Err(e).with_context(|| format!("Reading {:?} line {}", self.path, self.line)),
                    );
                }
            };
            self.line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(self.line + 1);

            if is_blank(&record) {
                continue;
            }
            return Some(Ok(self.map_record(&record)));
        }
    }
}
