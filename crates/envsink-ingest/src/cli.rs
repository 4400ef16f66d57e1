//! Command-line interface
//!
//! One subcommand per sink. Every flag can also come from the environment
//! (a `.env` file is loaded first by the binary).

use crate::error::{Result, SinkError};
use crate::sinks::duckdb::config::{
    DEFAULT_CATALOG_ALIAS, DEFAULT_CATALOG_PATH, DEFAULT_DATA_PATH, DEFAULT_DUCKDB_BATCH_LATENCY_MS,
    DEFAULT_DUCKDB_BATCH_SIZE, DEFAULT_DUCKDB_PATH, DEFAULT_TABLE_NAME,
};
use crate::sinks::duckdb::{CatalogBackend, DuckDbConfig, DuckDbMode, LakehouseConfig};
use crate::sinks::http::config::{
    DEFAULT_HTTP_API_URL, DEFAULT_HTTP_BATCH_LATENCY_MS, DEFAULT_HTTP_BATCH_SIZE,
    DEFAULT_HTTP_INITIAL_BACKOFF_MS, DEFAULT_HTTP_MAX_RETRIES, DEFAULT_HTTP_TIMEOUT_SECS,
};
use crate::sinks::http::{parse_sensor_names, HttpSinkConfig};
use crate::sinks::jsonl::{JsonLinesConfig, DEFAULT_JSONL_PATH};
use crate::sinks::SinkConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// envsink - BLE sensor telemetry relay
///
/// Reads newline-delimited JSON telemetry records and forwards them to the
/// selected sink.
#[derive(Parser, Debug)]
#[command(name = "envsink")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Sink to forward records to
    #[command(subcommand)]
    pub command: Commands,

    /// Input file (defaults to standard input)
    #[arg(short, long, env = "ENVSINK_INPUT", global = true)]
    pub input: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available sinks
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print each record to standard output
    Console,

    /// Append each record to a JSON-lines file
    Jsonl(JsonlArgs),

    /// Insert records into a DuckDB table or DuckLake lakehouse
    Duckdb(DuckDbArgs),

    /// Post batches of measurements to a telemetry API
    Http(HttpArgs),
}

#[derive(Args, Debug)]
pub struct JsonlArgs {
    /// Output file; parent directories are created
    #[arg(short, long, env = "JSONL_PATH", default_value = DEFAULT_JSONL_PATH)]
    pub path: PathBuf,
}

/// DuckDB storage layout
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuckDbModeArg {
    /// Single database file
    Direct,
    /// DuckLake catalog plus Parquet data files
    Lakehouse,
}

/// Where the DuckLake catalog lives
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogType {
    Duckdb,
    Sqlite,
    Postgres,
}

#[derive(Args, Debug)]
pub struct DuckDbArgs {
    /// Database file for direct mode, or `:memory:`
    #[arg(short, long, env = "DUCKDB_PATH", default_value = DEFAULT_DUCKDB_PATH)]
    pub path: PathBuf,

    /// Destination table
    #[arg(short, long, env = "DUCKDB_TABLE", default_value = DEFAULT_TABLE_NAME)]
    pub table: String,

    /// Records per insert
    #[arg(long, env = "DUCKDB_BATCH_SIZE", default_value_t = DEFAULT_DUCKDB_BATCH_SIZE)]
    pub batch_size: usize,

    /// Longest a partial batch waits, in milliseconds
    #[arg(long, env = "DUCKDB_BATCH_LATENCY_MS", default_value_t = DEFAULT_DUCKDB_BATCH_LATENCY_MS)]
    pub batch_latency_ms: u64,

    /// Storage layout
    #[arg(long, env = "DUCKDB_MODE", value_enum, default_value_t = DuckDbModeArg::Direct)]
    pub mode: DuckDbModeArg,

    /// Catalog backend for lakehouse mode
    #[arg(long, env = "DUCKLAKE_CATALOG_TYPE", value_enum, default_value_t = CatalogType::Duckdb)]
    pub catalog_type: CatalogType,

    /// Catalog file, or a connection string for postgres
    #[arg(long, env = "DUCKLAKE_CATALOG")]
    pub catalog: Option<String>,

    /// Directory for lakehouse Parquet files
    #[arg(long, env = "DUCKLAKE_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Name the catalog is attached under
    #[arg(long, env = "DUCKLAKE_ALIAS", default_value = DEFAULT_CATALOG_ALIAS)]
    pub catalog_alias: String,
}

#[derive(Args, Debug)]
pub struct HttpArgs {
    /// API base URL; batches go to `{api_url}/telemetry`
    #[arg(long, env = "HTTP_API_URL", default_value = DEFAULT_HTTP_API_URL)]
    pub api_url: String,

    /// Records per request
    #[arg(long, env = "HTTP_BATCH_SIZE", default_value_t = DEFAULT_HTTP_BATCH_SIZE)]
    pub batch_size: usize,

    /// Longest a partial batch waits, in milliseconds
    #[arg(long, env = "HTTP_BATCH_LATENCY_MS", default_value_t = DEFAULT_HTTP_BATCH_LATENCY_MS)]
    pub batch_latency_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Retries after the first attempt
    #[arg(long, env = "HTTP_MAX_RETRIES", default_value_t = DEFAULT_HTTP_MAX_RETRIES)]
    pub max_retries: u32,

    /// First retry delay in milliseconds; doubles per retry
    #[arg(long, env = "HTTP_INITIAL_BACKOFF_MS", default_value_t = DEFAULT_HTTP_INITIAL_BACKOFF_MS)]
    pub initial_backoff_ms: u64,

    /// Report a sensor by name instead of MAC (MAC=NAME, repeatable)
    #[arg(long = "sensor-name", env = "HTTP_SENSOR_NAMES", value_delimiter = ',')]
    pub sensor_names: Vec<String>,

    /// Log request payloads and response bodies
    #[arg(long, env = "HTTP_DEBUG")]
    pub debug: bool,
}

impl Commands {
    /// Resolve the parsed arguments into a sink configuration
    pub fn sink_config(&self) -> Result<SinkConfig> {
        match self {
            Commands::Console => Ok(SinkConfig::Console),
            Commands::Jsonl(args) => Ok(SinkConfig::JsonLines(JsonLinesConfig {
                path: args.path.clone(),
            })),
            Commands::Duckdb(args) => args.to_config().map(SinkConfig::DuckDb),
            Commands::Http(args) => args.to_config().map(SinkConfig::Http),
        }
    }
}

impl DuckDbArgs {
    pub fn to_config(&self) -> Result<DuckDbConfig> {
        let mode = match self.mode {
            DuckDbModeArg::Direct => DuckDbMode::Direct {
                path: self.path.clone(),
            },
            DuckDbModeArg::Lakehouse => {
                let catalog_file = || {
                    PathBuf::from(self.catalog.as_deref().unwrap_or(DEFAULT_CATALOG_PATH))
                };
                let catalog = match self.catalog_type {
                    CatalogType::Duckdb => CatalogBackend::DuckDb(catalog_file()),
                    CatalogType::Sqlite => CatalogBackend::Sqlite(catalog_file()),
                    CatalogType::Postgres => {
                        let dsn = self.catalog.clone().ok_or_else(|| {
                            SinkError::config("--catalog is required for a postgres catalog")
                        })?;
                        CatalogBackend::Postgres(dsn)
                    },
                };

                DuckDbMode::Lakehouse(LakehouseConfig {
                    catalog,
                    data_path: self.data_path.clone(),
                    alias: self.catalog_alias.clone(),
                })
            },
        };

        Ok(DuckDbConfig {
            mode,
            table: self.table.clone(),
            batch_size: self.batch_size,
            batch_latency: Duration::from_millis(self.batch_latency_ms),
        })
    }
}

impl HttpArgs {
    pub fn to_config(&self) -> Result<HttpSinkConfig> {
        Ok(HttpSinkConfig {
            api_url: self.api_url.clone(),
            batch_size: self.batch_size,
            batch_latency: Duration::from_millis(self.batch_latency_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            sensor_names: parse_sensor_names(&self.sensor_names.join(","))?,
            debug: self.debug,
        })
    }
}
