//! Build automation tasks for envsink
//!
//! - Generating the CLI reference from the clap definitions

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for envsink", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<envsink_ingest::Cli>();

    let content = format!(
        r#"# envsink CLI Reference

envsink reads newline-delimited JSON telemetry records from standard input
(or `--input`) and relays them to one sink.

## Quick Start

```bash
# Print records as they arrive
ble-scanner | envsink console

# Append to a JSON-lines file
envsink --input readings.jsonl jsonl --path ./data/telemetry.jsonl

# Insert into DuckDB, 100 records per insert
ble-scanner | envsink duckdb --path ./data/telemetry.duckdb

# Write to a DuckLake lakehouse with a SQLite catalog
ble-scanner | envsink duckdb --mode lakehouse --catalog-type sqlite \
  --catalog ./data/catalog.sqlite --data-path ./data/lake

# Post to a telemetry API
ble-scanner | envsink http --api-url https://api.example.com \
  --sensor-name FE:26:88:7A:66:66=sauna
```

## Commands

{}

## Logging

Logs go to stderr. `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR` and
`LOG_FILTER` override the defaults; `--verbose` selects debug level.

---

*Generated from the CLI source. To update, run `cargo xtask generate-cli-docs`.*
"#,
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
