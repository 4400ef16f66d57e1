//! envsink Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the envsink workspace.
//!
//! # Overview
//!
//! - **Telemetry**: the canonical [`TelemetryRecord`] and its JSON wire form
//! - **Error Handling**: [`TelemetryError`] and the crate result alias
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use envsink_common::TelemetryRecord;
//!
//! fn main() -> envsink_common::Result<()> {
//!     let line = r#"{"temperature_millicelsius":21500,"humidity":450000,"pressure":100755,
//!         "battery_potential":2950,"tx_power":4,"movement_counter":0,
//!         "measurement_sequence_number":1,"measurement_ts_ms":1693460525699,
//!         "mac_address":[254,38,136,122,102,102]}"#;
//!     let record = TelemetryRecord::parse(line)?;
//!     println!("{}", record.mac_address.to_display_string()?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod telemetry;

// Re-export commonly used types
pub use error::{Result, TelemetryError};
pub use telemetry::{MacAddress, TelemetryRecord};
