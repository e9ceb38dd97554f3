//! Guarded read-only SQL for ad-hoc inspection.
//!
//! The guard is lexical: it skips leading whitespace and comments, requires
//! `SELECT` as the first keyword and refuses more than one statement. The
//! statement then runs on a read-only connection and must be reported
//! read-only by SQLite itself, so a statement that slips past the lexer
//! still cannot write.

use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde_json::{Map, Value};

use super::StoreError;

/// One result row, column name to value. Blobs are hex-encoded.
pub type QueryRow = Map<String, Value>;

/// Check `sql` and return the single statement to run, without its
/// trailing semicolon.
pub fn validate_read_only(sql: &str) -> Result<&str, StoreError> {
    let body = skip_leading_trivia(sql);

    let keyword: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if !keyword.eq_ignore_ascii_case("select") {
        return Err(StoreError::Rejected(format!(
            "only SELECT statements are allowed, found {:?}",
            if keyword.is_empty() { body.chars().take(16).collect() } else { keyword }
        )));
    }

    let end = statement_end(body)?;
    Ok(body[..end].trim_end())
}

/// Strip whitespace, `-- line` and `/* block */` comments from the front.
fn skip_leading_trivia(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix("--") {
            rest = after.find('\n').map(|i| &after[i + 1..]).unwrap_or("");
        } else if let Some(after) = trimmed.strip_prefix("/*") {
            rest = after.find("*/").map(|i| &after[i + 2..]).unwrap_or("");
        } else {
            return trimmed;
        }
    }
}

/// Byte offset where the statement ends: the end of input, or a single
/// trailing `;` followed only by whitespace and comments. Any other `;`
/// outside quotes and comments is rejected.
fn statement_end(body: &str) -> Result<usize, StoreError> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        // Doubled quote is an escaped quote
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
            }
            b'[' => {
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            b';' => {
                if skip_leading_trivia(&body[i + 1..]).is_empty() {
                    return Ok(i);
                }
                return Err(StoreError::Rejected(
                    "multiple statements are not allowed".to_string(),
                ));
            }
            _ => {}
        }
        i += 1;
    }
    Ok(body.len())
}

pub(crate) fn run_read_only(conn: &Connection, sql: &str) -> Result<Vec<QueryRow>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    if !stmt.readonly() {
        return Err(StoreError::Rejected(
            "statement is not read-only".to_string(),
        ));
    }

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut object = QueryRow::new();
        for (i, column) in columns.iter().enumerate() {
            object.insert(column.clone(), json_value(row.get_ref(i)?));
        }
        out.push(object);
    }
    Ok(out)
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::from(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::from(hex::encode(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(sql: &str) -> bool {
        matches!(validate_read_only(sql), Err(StoreError::Rejected(_)))
    }

    #[test]
    fn test_accepts_plain_selects() {
        assert_eq!(validate_read_only("SELECT 1").unwrap(), "SELECT 1");
        assert_eq!(validate_read_only("  select 1 ;  ").unwrap(), "select 1");
        assert_eq!(
            validate_read_only("-- count\n/* models */ SELECT COUNT(*) FROM aircraft_models;")
                .unwrap(),
            "SELECT COUNT(*) FROM aircraft_models"
        );
        assert!(validate_read_only("SELECT 'a;b' AS x").is_ok());
        assert!(validate_read_only("SELECT 'it''s; fine'").is_ok());
        assert!(validate_read_only("SELECT 1; -- trailing comment").is_ok());
    }

    #[test]
    fn test_rejects_writes_and_stacked_statements() {
        assert!(rejected("DELETE FROM aircraft_registry"));
        assert!(rejected("select 1; drop table x"));
        assert!(rejected("SELECT 1;;"));
        assert!(rejected("/* SELECT */ UPDATE engines SET code = 'x'"));
        assert!(rejected("SELECTED"));
        assert!(rejected(""));
        assert!(rejected("   -- only a comment"));
        assert!(rejected("WITH x AS (SELECT 1) SELECT * FROM x"));
    }

    #[test]
    fn test_run_read_only_maps_values() {
        let conn = Connection::open_in_memory().unwrap();
        let rows = run_read_only(
            &conn,
            "SELECT 1 AS n, 2.5 AS r, 'x' AS t, NULL AS z, x'0aff' AS b",
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["n"], Value::from(1));
        assert_eq!(rows[0]["r"], Value::from(2.5));
        assert_eq!(rows[0]["t"], Value::from("x"));
        assert_eq!(rows[0]["z"], Value::Null);
        assert_eq!(rows[0]["b"], Value::from("0aff"));
    }
}
