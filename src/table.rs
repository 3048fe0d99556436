use crate::models::Record;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// One CSV row: column name to cell text.
pub type Row = BTreeMap<String, String>;

/// Columns that identify a listing across search and property pages.
pub const JOIN_COLUMNS: [&str; 3] = ["id", "path_id", "property_url"];

pub fn record_to_row(record: &Record) -> Result<Row> {
    match serde_json::to_value(record).context("Failed to serialize record")? {
        Value::Object(fields) => Ok(fields
            .iter()
            .map(|(column, value)| (column.clone(), cell(value)))
            .collect()),
        other => anyhow::bail!("Record serialized to a non-object value: {}", other),
    }
}

pub fn records_to_rows(records: &[Record]) -> Result<Vec<Row>> {
    records.iter().map(record_to_row).collect()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Full outer join of `left` and `right` on `keys`.
///
/// Every matching pair produces one row. Unmatched rows from either side are
/// kept as they are. Non-key columns present on both sides are renamed with
/// `_x` (left) and `_y` (right) suffixes. Output keeps `left` order, followed
/// by the unmatched `right` rows in their order.
pub fn outer_join(left: &[Row], right: &[Row], keys: &[&str]) -> Vec<Row> {
    let left_columns = value_columns(left, keys);
    let right_columns = value_columns(right, keys);
    let shared: BTreeSet<&String> = left_columns.intersection(&right_columns).collect();

    let rename = |row: &Row, suffix: &str| -> Row {
        row.iter()
            .map(|(column, value)| {
                if shared.contains(column) {
                    (format!("{}{}", column, suffix), value.clone())
                } else {
                    (column.clone(), value.clone())
                }
            })
            .collect()
    };

    let mut joined = Vec::new();
    let mut right_matched = vec![false; right.len()];

    for left_row in left {
        let key = join_key(left_row, keys);
        let mut matched = false;

        for (index, right_row) in right.iter().enumerate() {
            if join_key(right_row, keys) != key {
                continue;
            }
            matched = true;
            right_matched[index] = true;

            let mut row = rename(left_row, "_x");
            row.extend(rename(right_row, "_y"));
            joined.push(row);
        }

        if !matched {
            joined.push(rename(left_row, "_x"));
        }
    }

    for (right_row, matched) in right.iter().zip(right_matched) {
        if !matched {
            joined.push(rename(right_row, "_y"));
        }
    }

    joined
}

fn value_columns(rows: &[Row], keys: &[&str]) -> BTreeSet<String> {
    rows.iter()
        .flat_map(|row| row.keys())
        .filter(|column| !keys.contains(&column.as_str()))
        .cloned()
        .collect()
}

fn join_key<'a>(row: &'a Row, keys: &[&str]) -> Vec<&'a str> {
    keys.iter()
        .map(|key| row.get(*key).map(String::as_str).unwrap_or_default())
        .collect()
}

/// Set `column` to `value` on every row.
pub fn stamp(rows: &mut [Row], column: &str, value: &str) {
    for row in rows {
        row.insert(column.to_string(), value.to_string());
    }
}

pub fn load_table(input_path: impl AsRef<Path>) -> Result<Vec<Row>> {
    let path = input_path.as_ref();

    if !path.exists() {
        info!("CSV file does not exist yet: {}", path.display());
        return Ok(Vec::new());
    }

    let file = File::open(path).context(format!("Failed to open input file: {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader
        .headers()
        .context(format!("Failed to read CSV header of {}", path.display()))?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect(),
        );
    }

    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Write `rows` with the sorted union of their columns as the header.
/// Cells a row does not have are left empty.
pub fn save_table(rows: &[Row], output_path: impl AsRef<Path>) -> Result<()> {
    let path = output_path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create output directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .context(format!("Failed to create output file: {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    let columns: BTreeSet<&String> = rows.iter().flat_map(|row| row.keys()).collect();
    if !columns.is_empty() {
        writer.write_record(&columns)?;
    }

    for row in rows {
        writer.write_record(
            columns
                .iter()
                .map(|column| row.get(*column).map(String::as_str).unwrap_or_default()),
        )?;
    }

    writer.flush()?;
    info!("Saved {} rows to {}", rows.len(), path.display());

    Ok(())
}
