/// Result rows handed to the presentation layer
use aqlite_core::{Record, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Column label to display value
pub type Row = BTreeMap<String, Value>;

pub const NAMESPACE_COLUMN: &str = "Namespace";
pub const SET_COLUMN: &str = "Set";
pub const KEY_COLUMN: &str = "Key";
pub const GENERATION_COLUMN: &str = "Generation";
pub const TTL_COLUMN: &str = "TTL";

/// Metadata columns in display order
pub const METADATA_COLUMNS: [&str; 5] = [
    NAMESPACE_COLUMN,
    SET_COLUMN,
    KEY_COLUMN,
    GENERATION_COLUMN,
    TTL_COLUMN,
];

fn metadata_row(record: &Record, with_key: bool) -> Row {
    let mut row = Row::new();
    row.insert(NAMESPACE_COLUMN.to_string(), Value::string(&record.key.namespace));
    row.insert(SET_COLUMN.to_string(), Value::string(&record.key.set));
    if with_key {
        row.insert(KEY_COLUMN.to_string(), Value::string(&record.key.user_key));
    }
    row.insert(GENERATION_COLUMN.to_string(), Value::Int(i64::from(record.generation)));
    row.insert(TTL_COLUMN.to_string(), Value::Int(record.ttl_seconds()));

    // Bins win over metadata labels of the same name
    for (name, value) in &record.bins {
        row.insert(name.clone(), value.clone());
    }
    row
}

/// Row for a SELECT result: metadata including `Key`, then bins
pub fn query_row(record: &Record) -> Row {
    metadata_row(record, true)
}

/// Row for a browse scan: no `Key` column
pub fn scan_row(record: &Record) -> Row {
    metadata_row(record, false)
}

/// Union of the columns of a batch: metadata first in fixed order, then
/// bin columns sorted by name.
pub fn column_union(rows: &[Row]) -> Vec<String> {
    let present: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut columns: Vec<String> = METADATA_COLUMNS
        .iter()
        .filter(|c| present.contains(*c))
        .map(|c| c.to_string())
        .collect();
    columns.extend(
        present
            .iter()
            .filter(|c| !METADATA_COLUMNS.contains(*c))
            .map(|c| c.to_string()),
    );
    columns
}

/// JSON object for one row
pub fn row_to_json(row: &Row) -> serde_json::Value {
    serde_json::Value::Object(
        row.iter()
            .map(|(column, value)| (column.clone(), value.to_json()))
            .collect(),
    )
}
