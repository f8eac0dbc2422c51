//! Rendering command results.
//!
//! Structured modes (JSON, YAML, CSV) serialize the data directly. Text
//! mode lays rows out in aligned columns for the terminal.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use console::{measure_text_width, pad_str, style, truncate_str, Alignment};
use lexia_table::Pagination;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
    Yaml,
    Csv,
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(String),
}

/// A column of the text layout.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Field name in the serialized row.
    pub key: &'static str,
    pub title: &'static str,
    /// Longer cells are cut with an ellipsis.
    pub max_width: usize,
}

impl Column {
    pub const fn new(key: &'static str, title: &'static str, max_width: usize) -> Self {
        Column { key, title, max_width }
    }
}

/// One page of rows and its metadata.
#[derive(Debug, Serialize)]
pub struct Listing<'a, T> {
    pub rows: Vec<&'a T>,
    pub pagination: Pagination,
}

pub fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub fn to_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, OutputError> {
    Ok(serde_yaml::to_string(data)?)
}

/// Renders a listing in the given mode.
pub fn render_listing<T: Serialize>(
    listing: &Listing<'_, T>,
    columns: &[Column],
    mode: OutputMode,
) -> Result<String, OutputError> {
    match mode {
        OutputMode::Json => to_json(listing),
        OutputMode::Yaml => to_yaml(listing),
        OutputMode::Csv => serialize_csv(&listing.rows, columns),
        OutputMode::Text => {
            let rows = serde_json::to_value(&listing.rows)?;
            let rows = rows.as_array().map(Vec::as_slice).unwrap_or_default();
            let mut out = render_table(rows, columns);
            out.push_str(&footer(&listing.pagination));
            Ok(out)
        }
    }
}

/// Renders a single serializable value: key/value lines in text mode.
pub fn render_value<T: Serialize>(data: &T, mode: OutputMode) -> Result<String, OutputError> {
    match mode {
        OutputMode::Json => to_json(data),
        OutputMode::Yaml => to_yaml(data),
        OutputMode::Csv => serialize_csv(&[data], &[]),
        OutputMode::Text => {
            let value = serde_json::to_value(data)?;
            let Value::Object(map) = value else {
                return Ok(format!("{}\n", cell_text(&value)));
            };
            let width = map.keys().map(|k| measure_text_width(k)).max().unwrap_or(0);
            let mut out = String::new();
            for (key, value) in &map {
                let key = pad_str(key, width, Alignment::Left, None);
                out.push_str(&format!("{}  {}\n", style(key).bold(), cell_text(value)));
            }
            Ok(out)
        }
    }
}

/// Aligned text table. An empty row set renders a single notice.
pub fn render_table(rows: &[Value], columns: &[Column]) -> String {
    if rows.is_empty() {
        return format!("{}\n", style("No results").dim());
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| truncate_str(&cell_text(&row[c.key]), c.max_width, "…").into_owned())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| measure_text_width(&r[i]))
                .chain(std::iter::once(measure_text_width(c.title)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| style(pad_str(c.title, *w, Alignment::Left, None)).bold().to_string())
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad_str(cell, *w, Alignment::Left, None).into_owned())
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// "Showing 11-20 of 42 (page 2 of 5)".
pub fn footer(p: &Pagination) -> String {
    if p.total_items == 0 {
        return String::new();
    }
    format!(
        "{}\n",
        style(format!(
            "Showing {}-{} of {} (page {} of {})",
            p.start_item, p.end_item, p.total_items, p.current_page, p.total_pages
        ))
        .dim()
    )
}

/// Display text of a JSON cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(at) => at.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string(),
            Err(_) => s.clone(),
        },
        other => other.to_string(),
    }
}

/// CSV with the given columns as header, or every key of the first row
/// when `columns` is empty.
pub fn serialize_csv<T: Serialize>(rows: &[T], columns: &[Column]) -> Result<String, OutputError> {
    let values = serde_json::to_value(rows)?;
    let rows = values.as_array().map(Vec::as_slice).unwrap_or_default();

    let keys: Vec<String> = if columns.is_empty() {
        match rows.first() {
            Some(Value::Object(first)) => first.keys().cloned().collect(),
            _ => vec!["value".to_string()],
        }
    } else {
        columns.iter().map(|c| c.key.to_string()).collect()
    };

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&keys)
        .map_err(|e| OutputError::Csv(e.to_string()))?;
    for row in rows {
        let record: Vec<String> = match row {
            Value::Object(obj) => keys
                .iter()
                .map(|k| obj.get(k).map(csv_text).unwrap_or_default())
                .collect(),
            other => vec![csv_text(other)],
        };
        wtr.write_record(&record)
            .map_err(|e| OutputError::Csv(e.to_string()))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| OutputError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Csv(e.to_string()))
}

fn csv_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
