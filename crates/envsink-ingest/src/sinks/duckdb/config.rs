//! DuckDB sink configuration

use super::schema::{is_valid_identifier, validate_table_name};
use crate::error::{Result, SinkError};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// DuckDB Sink Constants
// ============================================================================

/// Default database file for direct mode
pub const DEFAULT_DUCKDB_PATH: &str = "./data/telemetry.duckdb";

/// Special path selecting an in-memory database
pub const MEMORY_PATH: &str = ":memory:";

pub const DEFAULT_TABLE_NAME: &str = "telemetry";

/// Records per multi-row insert
pub const DEFAULT_DUCKDB_BATCH_SIZE: usize = 100;

/// Longest a partial batch waits before it is written
pub const DEFAULT_DUCKDB_BATCH_LATENCY_MS: u64 = 5_000;

/// Name the lakehouse catalog is attached under
pub const DEFAULT_CATALOG_ALIAS: &str = "lake";

/// Default catalog file for file-backed lakehouse catalogs
pub const DEFAULT_CATALOG_PATH: &str = "./data/catalog.ducklake";

/// Default directory for lakehouse Parquet files
pub const DEFAULT_DATA_PATH: &str = "./data/lake";

/// Storage backing the DuckLake catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogBackend {
    /// Catalog kept in a DuckDB file
    DuckDb(PathBuf),
    /// Catalog kept in a SQLite file
    Sqlite(PathBuf),
    /// Catalog kept in PostgreSQL, e.g. `dbname=lake host=localhost`
    Postgres(String),
}

impl CatalogBackend {
    /// Extensions that must be loaded before attaching, in load order
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            CatalogBackend::DuckDb(_) => &["ducklake"],
            CatalogBackend::Sqlite(_) => &["ducklake", "sqlite"],
            CatalogBackend::Postgres(_) => &["ducklake", "postgres"],
        }
    }

    /// Target string for `ATTACH`
    pub fn attach_target(&self) -> String {
        match self {
            CatalogBackend::DuckDb(path) => format!("ducklake:{}", path.display()),
            CatalogBackend::Sqlite(path) => format!("ducklake:sqlite:{}", path.display()),
            CatalogBackend::Postgres(dsn) => format!("ducklake:postgres:{}", dsn),
        }
    }

    /// Local file backing the catalog, if any
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            CatalogBackend::DuckDb(path) | CatalogBackend::Sqlite(path) => Some(path),
            CatalogBackend::Postgres(_) => None,
        }
    }
}

/// Catalog plus data directory for lakehouse mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LakehouseConfig {
    pub catalog: CatalogBackend,
    pub data_path: PathBuf,
    pub alias: String,
}

impl LakehouseConfig {
    pub fn new(catalog: CatalogBackend, data_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            data_path: data_path.into(),
            alias: DEFAULT_CATALOG_ALIAS.to_string(),
        }
    }
}

/// How the sink obtains its connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuckDbMode {
    /// One self-contained database file, or `:memory:`
    Direct { path: PathBuf },
    /// DuckLake catalog attached to an in-memory session
    Lakehouse(LakehouseConfig),
}

impl Default for DuckDbMode {
    fn default() -> Self {
        DuckDbMode::Direct {
            path: PathBuf::from(DEFAULT_DUCKDB_PATH),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DuckDbConfig {
    pub mode: DuckDbMode,

    /// Destination table; must match `^[a-zA-Z_][a-zA-Z0-9_]*$`
    pub table: String,

    pub batch_size: usize,

    pub batch_latency: Duration,
}

impl Default for DuckDbConfig {
    fn default() -> Self {
        Self {
            mode: DuckDbMode::default(),
            table: DEFAULT_TABLE_NAME.to_string(),
            batch_size: DEFAULT_DUCKDB_BATCH_SIZE,
            batch_latency: Duration::from_millis(DEFAULT_DUCKDB_BATCH_LATENCY_MS),
        }
    }
}

impl DuckDbConfig {
    /// Direct mode against `path`
    pub fn direct(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: DuckDbMode::Direct { path: path.into() },
            ..Self::default()
        }
    }

    /// Direct mode against a private in-memory database
    pub fn in_memory() -> Self {
        Self::direct(MEMORY_PATH)
    }

    pub fn lakehouse(lakehouse: LakehouseConfig) -> Self {
        Self {
            mode: DuckDbMode::Lakehouse(lakehouse),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(&self.mode, DuckDbMode::Direct { path } if path.as_os_str() == MEMORY_PATH)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_table_name(&self.table)?;

        if self.batch_size == 0 {
            return Err(SinkError::config("DuckDB batch size must be greater than 0"));
        }

        match &self.mode {
            DuckDbMode::Direct { path } => {
                if path.as_os_str().is_empty() {
                    return Err(SinkError::config("DuckDB database path cannot be empty"));
                }
            },
            DuckDbMode::Lakehouse(lakehouse) => {
                if !is_valid_identifier(&lakehouse.alias)? {
                    return Err(SinkError::config(format!(
                        "Invalid catalog alias: '{}'",
                        lakehouse.alias
                    )));
                }

                if lakehouse.data_path.as_os_str().is_empty() {
                    return Err(SinkError::config("Lakehouse data path cannot be empty"));
                }

                let catalog_empty = match &lakehouse.catalog {
                    CatalogBackend::DuckDb(path) | CatalogBackend::Sqlite(path) => {
                        path.as_os_str().is_empty()
                    },
                    CatalogBackend::Postgres(dsn) => dsn.trim().is_empty(),
                };
                if catalog_empty {
                    return Err(SinkError::config("Lakehouse catalog location cannot be empty"));
                }
            },
        }

        Ok(())
    }
}
