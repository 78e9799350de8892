/// Rendering of delivered outcomes for the terminal

use crate::table::format_rows_table;
use anyhow::Result;
use aqlite_api::{column_union, row_to_json, Delivery, Row, Value};
use clap::ValueEnum;
use colored::Colorize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    Table,
    /// Pretty JSON
    Json,
    /// JSON Lines (one row per line)
    Jsonl,
    /// CSV format
    Csv,
}

impl OutputFormat {
    /// Parse a format name as typed in the shell
    pub fn parse(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Render a row batch in the chosen format
pub fn render_rows(rows: &[Row], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Table => format_rows_table(rows),
        OutputFormat::Json => {
            let json: Vec<_> = rows.iter().map(row_to_json).collect();
            serde_json::to_string_pretty(&json)?
        }
        OutputFormat::Jsonl => {
            let mut lines = Vec::with_capacity(rows.len());
            for row in rows {
                lines.push(serde_json::to_string(&row_to_json(row))?);
            }
            lines.join("\n")
        }
        OutputFormat::Csv => format_csv(rows),
    })
}

/// Print every delivery of one request. Returns the number of errors.
pub fn print_deliveries(deliveries: &[Delivery], format: OutputFormat) -> Result<usize> {
    let mut errors = 0;
    for delivery in deliveries {
        match delivery {
            Delivery::Rows(rows) => {
                println!("{}", render_rows(rows, format)?);
                if format == OutputFormat::Table && !rows.is_empty() {
                    let count = rows.len();
                    println!(
                        "{}",
                        format!("{} row{}", count, if count == 1 { "" } else { "s" }).dimmed()
                    );
                }
            }
            Delivery::Status(message) => println!("{}", message),
            Delivery::Error(message) => {
                errors += 1;
                eprintln!("{} {}", "Error:".red().bold(), message);
            }
            Delivery::Finished => {}
        }
    }
    Ok(errors)
}

fn format_csv(rows: &[Row]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let columns = column_union(rows);
    let mut lines = vec![columns.iter().map(|c| escape_csv(c)).collect::<Vec<_>>().join(",")];
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| row.get(col).map(format_csv_value).unwrap_or_default())
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::Nil => String::new(),
        Value::List(_) | Value::Map(_) => escape_csv(&value.to_json().to_string()),
        other => escape_csv(&other.to_string()),
    }
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
