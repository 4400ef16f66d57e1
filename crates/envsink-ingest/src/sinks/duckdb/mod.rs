//! DuckDB sink
//!
//! Writes batches into a DuckDB table with one parameterized multi-row
//! `INSERT` per batch. Two modes share all validation and insert logic:
//!
//! - **Direct**: a single database file (or `:memory:`)
//! - **Lakehouse**: a DuckLake catalog (DuckDB, SQLite or PostgreSQL backed)
//!   with Parquet data files under a separate directory
//!
//! A connection is opened for each batch and closed when the batch is done,
//! whatever the outcome. `:memory:` is the exception: its single connection
//! lives as long as the sink, since every new in-memory connection is an
//! empty database.
//!
//! There is no retry here; write failures are returned to the caller.

pub mod config;
pub mod connection;
pub mod schema;

pub use config::{CatalogBackend, DuckDbConfig, DuckDbMode, LakehouseConfig};

use super::Sink;
use crate::batcher::Batch;
use crate::error::Result;
use async_trait::async_trait;
use duckdb::Connection;
use std::time::Duration;
use tracing::{debug, warn};

pub struct DuckDbSink {
    config: DuckDbConfig,
    schema_ready: bool,
    memory_conn: Option<Connection>,
}

impl DuckDbSink {
    pub fn new(config: DuckDbConfig) -> Self {
        Self {
            config,
            schema_ready: false,
            memory_conn: None,
        }
    }

    pub fn config(&self) -> &DuckDbConfig {
        &self.config
    }

    /// Run `f` against a connection scoped to this call
    fn with_connection<T>(&mut self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        if self.config.is_in_memory() {
            let conn = match self.memory_conn.take() {
                Some(conn) => conn,
                None => connection::acquire(&self.config.mode)?,
            };
            let result = f(&conn);
            self.memory_conn = Some(conn);
            return result;
        }

        let conn = connection::acquire(&self.config.mode)?;
        f(&conn)
    }
}

#[async_trait]
impl Sink for DuckDbSink {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn desired_batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn desired_max_batch_latency(&self) -> Duration {
        self.config.batch_latency
    }

    async fn consume(&mut self, batch: Batch) -> Result<()> {
        if !self.schema_ready {
            // Must fail before any connection is opened or SQL is issued
            schema::validate_table_name(&self.config.table)?;
        }

        if batch.is_empty() {
            return Ok(());
        }

        let mut rows = Vec::with_capacity(batch.len());
        for record in &batch {
            match schema::row_values(record) {
                Ok(values) => rows.push(values),
                Err(e) => warn!(
                    sink = "duckdb",
                    error = %e,
                    sequence = record.measurement_sequence_number,
                    "Skipping record with invalid MAC address"
                ),
            }
        }

        if rows.is_empty() {
            return Ok(());
        }

        let table = self.config.table.clone();
        let create_table = !self.schema_ready;
        let inserted = self.with_connection(|conn| {
            if create_table {
                conn.execute_batch(&schema::create_table_sql(&table))?;
            }
            schema::insert_rows(conn, &table, rows)
        })?;
        self.schema_ready = true;

        debug!(
            sink = "duckdb",
            table = %self.config.table,
            records = inserted,
            skipped = batch.len() - inserted,
            "Inserted batch"
        );
        Ok(())
    }
}
