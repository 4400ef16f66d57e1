//! envsink - BLE sensor telemetry relay

use anyhow::{Context, Result};
use clap::Parser;
use envsink_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use envsink_ingest::source::LineSource;
use envsink_ingest::{build_sink, pipeline, Cli};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Console)
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = log_config.merge_env()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&log_config)?;

    let mut sink = build_sink(cli.command.sink_config()?)?;

    let source = LineSource::from_input(cli.input.as_deref())
        .await
        .with_context(|| match &cli.input {
            Some(path) => format!("Failed to open input {}", path.display()),
            None => "Failed to open standard input".to_string(),
        })?;

    info!(
        sink = sink.name(),
        input = %cli
            .input
            .as_ref()
            .map_or_else(|| "stdin".to_string(), |p| p.display().to_string()),
        "Relaying telemetry"
    );

    let stats = pipeline::run(source, sink.as_mut()).await?;

    info!(
        records = stats.records,
        rejected_lines = stats.rejected_lines,
        "Input exhausted"
    );
    Ok(())
}
