/// Table formatting for result rows using comfy-table

use aqlite_api::{column_union, Row, Value};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

/// Format a batch of rows as a table
///
/// Columns are the union over all rows: metadata columns first, then bins
/// alphabetically. Cells a row does not have stay blank.
pub fn format_rows_table(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "No records found".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let columns = column_union(rows);
    table.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());

    for row in rows {
        let cells = columns
            .iter()
            .map(|col| match row.get(col) {
                Some(value) => Cell::new(format_value(value)),
                None => Cell::new(""),
            })
            .collect::<Vec<_>>();
        table.add_row(cells);
    }

    table.to_string()
}

/// Cell text for a bin value
fn format_value(value: &Value) -> String {
    match value {
        Value::Map(_) | Value::List(_) => value.to_json().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_format_empty_rows() {
        assert_eq!(format_rows_table(&[]), "No records found");
    }

    #[test]
    fn test_format_sparse_rows() {
        let rows = vec![
            row(&[("Key", Value::string("u1")), ("name", Value::string("Alice"))]),
            row(&[("Key", Value::string("u2")), ("age", Value::Int(25))]),
        ];

        let output = format_rows_table(&rows);
        assert!(output.contains("Alice"));
        assert!(output.contains("25"));

        // Metadata column comes before bins
        let key_at = output.find("Key").unwrap();
        let age_at = output.find("age").unwrap();
        assert!(key_at < age_at);
    }

    #[test]
    fn test_format_value_types() {
        assert_eq!(format_value(&Value::string("test")), "test");
        assert_eq!(format_value(&Value::Int(42)), "42");
        assert_eq!(format_value(&Value::Bool(true)), "true");
        assert_eq!(format_value(&Value::Nil), "null");
        assert_eq!(
            format_value(&Value::List(vec![Value::string("a"), Value::Int(1)])),
            "[\"a\",1]"
        );
    }
}
