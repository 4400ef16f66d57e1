//! Table schema, identifier validation and SQL text
//!
//! Identifiers cannot be bound as parameters, so table names and catalog
//! aliases are interpolated into SQL only after they pass
//! [`IDENTIFIER_PATTERN`]. Record values are always bound.

use crate::error::{Result, SinkError};
use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use envsink_common::{TelemetryError, TelemetryRecord};
use regex::Regex;

/// Accepted shape for table names and catalog aliases
pub const IDENTIFIER_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*$";

/// Column names and types, in insert order
pub const COLUMNS: [(&str, &str); 9] = [
    ("temperature_millicelsius", "INTEGER"),
    ("humidity", "INTEGER"),
    ("pressure", "INTEGER"),
    ("battery_potential", "INTEGER"),
    ("tx_power", "INTEGER"),
    ("movement_counter", "INTEGER"),
    ("measurement_sequence_number", "INTEGER"),
    ("measurement_ts_ms", "BIGINT"),
    ("mac_address", "VARCHAR"),
];

pub fn is_valid_identifier(name: &str) -> Result<bool> {
    let pattern = Regex::new(IDENTIFIER_PATTERN)
        .map_err(|e| SinkError::config(format!("Invalid identifier pattern: {}", e)))?;
    Ok(pattern.is_match(name))
}

/// Reject anything that is not a plain SQL identifier
pub fn validate_table_name(name: &str) -> Result<()> {
    if !is_valid_identifier(name)? {
        return Err(SinkError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

/// `CREATE TABLE IF NOT EXISTS` for the fixed schema; the table is never altered
pub fn create_table_sql(table: &str) -> String {
    let columns = COLUMNS
        .iter()
        .map(|(name, ty)| format!("{} {}", name, ty))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ({})", table, columns)
}

/// Multi-row insert with one placeholder group per row
pub fn insert_sql(table: &str, rows: usize) -> String {
    let names = COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");
    let group = format!("({})", vec!["?"; COLUMNS.len()].join(", "));
    let groups = vec![group; rows].join(", ");
    format!("INSERT INTO {} ({}) VALUES {}", table, names, groups)
}

/// Bound values for one record, in [`COLUMNS`] order
pub fn row_values(record: &TelemetryRecord) -> std::result::Result<Vec<Value>, TelemetryError> {
    let mac = record.mac_address.to_display_string()?;

    Ok(vec![
        Value::Int(record.temperature_millicelsius),
        Value::Int(record.humidity),
        Value::Int(record.pressure),
        Value::Int(record.battery_potential),
        Value::Int(record.tx_power),
        Value::Int(record.movement_counter),
        Value::Int(record.measurement_sequence_number),
        Value::BigInt(record.measurement_ts_ms),
        Value::Text(mac),
    ])
}

/// Insert prepared rows with a single statement; returns the affected row count
pub fn insert_rows(conn: &Connection, table: &str, rows: Vec<Vec<Value>>) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    let sql = insert_sql(table, rows.len());
    let inserted = conn.execute(&sql, params_from_iter(rows.into_iter().flatten()))?;
    Ok(inserted)
}
