use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use std::path::Path;

use crate::encoding::read_to_string_decoded;
use crate::records::DataFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuredFormat {
    /// A single object or an array of objects
    Json,
    /// One object per line
    JsonLines,
}

/// Read a structured file into one field map per object.
///
/// Anything other than objects (a top-level scalar, an array element that is
/// not an object) is an unsupported structure and fails the whole file.
pub fn read_structured(path: &Path, format: StructuredFormat) -> Result<Vec<DataFields>> {
    let text = read_to_string_decoded(path)?;
    match format {
        StructuredFormat::Json => {
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("Parsing JSON in {:?}", path))?;
            objects_from_value(value).with_context(|| format!("Reading {:?}", path))
        }
        StructuredFormat::JsonLines => {
            let mut objects = Vec::new();
            for (i, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line)
                    .with_context(|| format!("Parsing {:?} line {}", path, i + 1))?;
                match value {
                    Value::Object(map) => objects.push(map),
                    other => bail!(
                        "Unsupported structure in {:?} line {}: expected an object, found {}",
                        path,
                        i + 1,
                        type_name(&other)
                    ),
                }
            }
            Ok(objects)
        }
    }
}

fn objects_from_value(value: Value) -> Result<Vec<DataFields>> {
    match value {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(anyhow!(
                    "Unsupported structure: array element {} is {}, expected an object",
                    i,
                    type_name(&other)
                )),
            })
            .collect(),
        other => Err(anyhow!(
            "Unsupported structure: top-level {}, expected an object or an array of objects",
            type_name(&other)
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
