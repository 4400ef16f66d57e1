//! Connection acquisition for direct and lakehouse modes
//!
//! This is the only step where the two modes differ. Everything after it
//! (schema, insert) runs against whatever connection comes back.

use super::config::{DuckDbMode, LakehouseConfig, MEMORY_PATH};
use crate::error::Result;
use duckdb::Connection;
use std::path::Path;
use tracing::debug;

/// Open a connection for `mode`
///
/// The caller owns the connection; dropping it closes the database.
pub fn acquire(mode: &DuckDbMode) -> Result<Connection> {
    match mode {
        DuckDbMode::Direct { path } => open_direct(path),
        DuckDbMode::Lakehouse(lakehouse) => open_lakehouse(lakehouse),
    }
}

fn open_direct(path: &Path) -> Result<Connection> {
    if path.as_os_str() == MEMORY_PATH {
        return Ok(Connection::open_in_memory()?);
    }

    create_parent_dir(path)?;
    debug!(path = %path.display(), "Opening DuckDB database");
    Ok(Connection::open(path)?)
}

fn open_lakehouse(lakehouse: &LakehouseConfig) -> Result<Connection> {
    if let Some(catalog_path) = lakehouse.catalog.local_path() {
        create_parent_dir(catalog_path)?;
    }
    std::fs::create_dir_all(&lakehouse.data_path)?;

    let conn = Connection::open_in_memory()?;
    debug!(
        catalog = %lakehouse.catalog.attach_target(),
        data_path = %lakehouse.data_path.display(),
        alias = %lakehouse.alias,
        "Attaching lakehouse catalog"
    );
    conn.execute_batch(&attach_sql(lakehouse))?;
    Ok(conn)
}

/// Statements that load the extensions, attach the catalog and select it
///
/// The alias is validated as an identifier by the config; the catalog target
/// and data path are quoted as string literals.
pub fn attach_sql(lakehouse: &LakehouseConfig) -> String {
    let mut sql = String::new();

    for extension in lakehouse.catalog.extensions() {
        sql.push_str(&format!("INSTALL {ext}; LOAD {ext};\n", ext = extension));
    }

    sql.push_str(&format!(
        "ATTACH {} AS {} (DATA_PATH {});\n",
        quote_literal(&lakehouse.catalog.attach_target()),
        lakehouse.alias,
        quote_literal(&lakehouse.data_path.to_string_lossy()),
    ));
    sql.push_str(&format!("USE {};", lakehouse.alias));
    sql
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
