//! Result rendering: aligned text, JSON and CSV.

use crate::error::CliResult;
use clap::ValueEnum;
use ducklet_core::{ResultSet, Value};
use serde::Serialize;
use serde_json::Number;
use std::io::Write;

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table.
    Text,
    /// One JSON document per result.
    Json,
    /// Comma-separated values with a header row.
    Csv,
}

/// JSON shape of a result.
#[derive(Debug, Serialize)]
struct JsonResult {
    columns: Vec<JsonColumn>,
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct JsonColumn {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
}

/// Writes `result` to `out` in `format`.
pub fn write_result(
    out: &mut impl Write,
    result: &ResultSet,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Text => write_text(out, result)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &to_json(result))?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_csv(out, result)?,
    }
    Ok(())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

fn write_text(out: &mut impl Write, result: &ResultSet) -> std::io::Result<()> {
    if result.column_count() == 0 {
        return writeln!(out, "OK");
    }

    let header: Vec<String> = result.columns().iter().map(|c| c.name.clone()).collect();
    let types: Vec<String> = result
        .columns()
        .iter()
        .map(|c| c.data_type.to_string())
        .collect();
    let rows: Vec<Vec<String>> = result
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let mut widths: Vec<usize> = header
        .iter()
        .zip(&types)
        .map(|(h, t)| h.chars().count().max(t.chars().count()))
        .collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    writeln!(out, "{}", line(&header).trim_end())?;
    writeln!(out, "{}", line(&types).trim_end())?;
    writeln!(out, "{rule}")?;
    for row in &rows {
        writeln!(out, "{}", line(row).trim_end())?;
    }
    let count = rows.len();
    writeln!(out, "({count} {})", if count == 1 { "row" } else { "rows" })
}

fn to_json(result: &ResultSet) -> JsonResult {
    JsonResult {
        columns: result
            .columns()
            .iter()
            .map(|c| JsonColumn {
                name: c.name.clone(),
                data_type: c.data_type.to_string(),
            })
            .collect(),
        rows: result
            .rows()
            .map(|row| row.iter().map(json_value).collect())
            .collect(),
    }
}

/// Numbers stay numbers where JSON can hold them; other values use their
/// canonical text.
fn json_value(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::TinyInt(_)
        | Value::SmallInt(_)
        | Value::Integer(_)
        | Value::BigInt(_)
        | Value::HugeInt(_)
        | Value::UTinyInt(_)
        | Value::USmallInt(_)
        | Value::UInteger(_)
        | Value::UBigInt(_)
        | Value::UHugeInt(_) => integer_json(value),
        Value::Float(_) | Value::Double(_) | Value::Decimal { .. } => value
            .as_f64()
            .and_then(Number::from_f64)
            .map_or_else(|| Json::String(value.to_string()), Json::Number),
        Value::List { values, .. } => Json::Array(values.iter().map(json_value).collect()),
        other => Json::String(other.to_string()),
    }
}

fn integer_json(value: &Value) -> serde_json::Value {
    if let Value::UHugeInt(v) = value {
        if let Ok(v) = u64::try_from(*v) {
            return serde_json::Value::Number(v.into());
        }
        return serde_json::Value::String(v.to_string());
    }
    match value.as_i128() {
        Some(v) => {
            if let Ok(small) = i64::try_from(v) {
                serde_json::Value::Number(small.into())
            } else if let Ok(unsigned) = u64::try_from(v) {
                serde_json::Value::Number(unsigned.into())
            } else {
                serde_json::Value::String(v.to_string())
            }
        }
        None => serde_json::Value::String(value.to_string()),
    }
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn write_csv(out: &mut impl Write, result: &ResultSet) -> std::io::Result<()> {
    if result.column_count() == 0 {
        return Ok(());
    }
    let header: Vec<String> = result.columns().iter().map(|c| csv_field(&c.name)).collect();
    writeln!(out, "{}", header.join(","))?;
    for row in result.rows() {
        // NULL is the empty field
        let fields: Vec<String> = row
            .iter()
            .map(|v| if v.is_null() { String::new() } else { csv_field(&v.to_string()) })
            .collect();
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ducklet_core::Database;

    fn render(sql: &str, format: OutputFormat) -> String {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        let result = conn.query(sql).unwrap();
        let mut out = Vec::new();
        write_result(&mut out, &result, format).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn text_table() {
        let text = render("VALUES (1, 'duck'), (22, NULL)", OutputFormat::Text);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "col0    | col1");
        assert_eq!(lines[1], "INTEGER | VARCHAR");
        assert_eq!(lines[2], "--------+--------");
        assert_eq!(lines[3], "1       | duck");
        assert_eq!(lines[4], "22      | NULL");
        assert_eq!(lines[5], "(2 rows)");
    }

    #[test]
    fn ddl_prints_ok() {
        assert_eq!(render("CREATE TABLE t (x INTEGER)", OutputFormat::Text), "OK\n");
        assert_eq!(render("CREATE TABLE t (x INTEGER)", OutputFormat::Csv), "");
    }

    #[test]
    fn json_keeps_numbers() {
        let text = render(
            "SELECT 1 AS i, 2.5 AS d, 'x' AS s, NULL AS n, TRUE AS b, [1, 2] AS l",
            OutputFormat::Json,
        );
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        let row = &doc["rows"][0];
        assert_eq!(row[0], serde_json::json!(1));
        assert_eq!(row[1], serde_json::json!(2.5));
        assert_eq!(row[2], serde_json::json!("x"));
        assert!(row[3].is_null());
        assert_eq!(row[4], serde_json::json!(true));
        assert_eq!(row[5], serde_json::json!([1, 2]));
        assert_eq!(doc["columns"][0]["name"], "i");
        assert_eq!(doc["columns"][0]["type"], "INTEGER");
    }

    #[test]
    fn csv_quoting() {
        let text = render("SELECT 'a,b' AS x, 'say \"hi\"' AS y, NULL AS z", OutputFormat::Csv);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("x,y,z"));
        assert_eq!(lines.next(), Some("\"a,b\",\"say \"\"hi\"\"\","));
    }
}
