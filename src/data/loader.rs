use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use super::model::{Table, Value, TIMESTAMP_FORMAT};

/// Timestamp format used when the caller supplies none.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = TIMESTAMP_FORMAT;

/// Date-column name assumed for JSON input when the caller supplies none.
/// (JSON objects carry no column order, so the name cannot default to
/// "the first column" the way CSV headers can.)
pub const DEFAULT_JSON_DATECOL: &str = "datetime";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table of time-stamped records from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row with column names; `datecol` defaults to the
///   first header
/// * `.json` – records-oriented array `[{ "datetime": "...", "load": 1.2 }, ...]`
///
/// The date column is parsed with the chrono `format` string and moved to
/// position 0 of the resulting [`Table`], so engines built on it pick it
/// up as the default timestamp column. All other cells are inferred
/// numeric-first.
pub fn load_file(path: &Path, datecol: Option<&str>, format: &str) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => {
            let text = std::fs::read_to_string(path).context("reading CSV file")?;
            parse_csv_str(&text, datecol, format)?
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json_str(&text, datecol.unwrap_or(DEFAULT_JSON_DATECOL), format)?
        }
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::info!(
        "loaded {} records × {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse CSV text into a [`Table`]. The header row names the columns;
/// `datecol` (default: the first header) is parsed as timestamps with the
/// chrono `format` string.
pub fn parse_csv_str(input: &str, datecol: Option<&str>, format: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().from_reader(input.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        bail!("CSV input has no columns");
    }

    let datecol = datecol.unwrap_or_else(|| headers[0].as_str());
    let date_idx = headers
        .iter()
        .position(|h| h == datecol)
        .with_context(|| format!("CSV missing '{datecol}' column"))?;

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, field) in record.iter().enumerate() {
            let value = if col_idx == date_idx {
                parse_timestamp(field, format)
                    .with_context(|| format!("CSV row {row_no}: bad timestamp '{field}'"))?
            } else {
                guess_value(field)
            };
            if let Some(column) = columns.get_mut(col_idx) {
                column.push(value);
            }
        }
    }

    build_table(headers, columns, date_idx)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Parse records-oriented JSON (an array of flat objects) into a
/// [`Table`]. Every record must carry the `datecol` field; the remaining
/// columns are the union of the other keys, in sorted order, with nulls
/// filled in where a record lacks a key.
pub fn parse_json_str(input: &str, datecol: &str, format: &str) -> Result<Table> {
    let root: JsonValue = serde_json::from_str(input).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    // serde_json object keys iterate sorted, so the column order is the
    // sorted union of keys with the date column pulled to the front.
    let mut names: Vec<String> = Vec::new();
    for rec in records {
        if let Some(obj) = rec.as_object() {
            for key in obj.keys() {
                if key != datecol && !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }
    }
    names.sort();
    names.insert(0, datecol.to_string());

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let stamp = obj
            .get(datecol)
            .and_then(JsonValue::as_str)
            .with_context(|| format!("Row {i}: missing or non-string '{datecol}'"))?;
        columns[0].push(
            parse_timestamp(stamp, format)
                .with_context(|| format!("Row {i}: bad timestamp '{stamp}'"))?,
        );
        for (col_idx, name) in names.iter().enumerate().skip(1) {
            columns[col_idx].push(match obj.get(name) {
                Some(v) => json_to_value(v),
                None => Value::Null,
            });
        }
    }

    build_table(names, columns, 0)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn parse_timestamp(s: &str, format: &str) -> Result<Value> {
    let ts = NaiveDateTime::parse_from_str(s.trim(), format)?;
    Ok(Value::Timestamp(ts))
}

/// Infer a cell type from CSV text, numeric first.
fn guess_value(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}

/// Assemble a [`Table`] with the date column moved to position 0.
fn build_table(names: Vec<String>, columns: Vec<Vec<Value>>, date_idx: usize) -> Result<Table> {
    let mut table = Table::new();
    let mut pairs: Vec<(String, Vec<Value>)> = names.into_iter().zip(columns).collect();
    let date_pair = pairs.remove(date_idx);
    let (name, values) = date_pair;
    table.push_column(name, values)?;
    for (name, values) in pairs {
        table.push_column(name, values)?;
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
