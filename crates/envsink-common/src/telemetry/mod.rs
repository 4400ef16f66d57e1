//! Telemetry record model
//!
//! One [`TelemetryRecord`] is decoded per input line. The wire form is a flat
//! JSON object with snake_case keys; the MAC address travels as an array of
//! six integers and is rendered as `XX:XX:XX:XX:XX:XX` by sinks that store a
//! display string.

use crate::error::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of octets in a BLE MAC address
pub const MAC_ADDRESS_LEN: usize = 6;

/// Raw MAC address as it appears on the wire
///
/// Elements are kept exactly as decoded; range and length checks happen when
/// the address is formatted. Formatting uses the low eight bits of each
/// element, so producers that emit signed bytes (`-2`) and unsigned bytes
/// (`254`) render identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(Vec<i32>);

impl MacAddress {
    pub fn new(octets: Vec<i32>) -> Self {
        Self(octets)
    }

    /// Raw wire elements
    pub fn octets(&self) -> &[i32] {
        &self.0
    }

    /// Number of wire elements
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as colon-separated uppercase hex
    ///
    /// Fails with [`TelemetryError::InvalidMacAddress`] unless the address has
    /// exactly six elements.
    pub fn to_display_string(&self) -> Result<String> {
        if self.0.len() != MAC_ADDRESS_LEN {
            return Err(TelemetryError::InvalidMacAddress(self.0.len()));
        }

        Ok(self
            .0
            .iter()
            .map(|octet| format!("{:02X}", octet & 0xFF))
            .collect::<Vec<_>>()
            .join(":"))
    }

    /// Parse a `XX:XX:XX:XX:XX:XX` display string back into wire form
    pub fn from_display(display: &str) -> Result<Self> {
        let octets = display
            .split(':')
            .map(|part| {
                if part.len() != 2 {
                    return None;
                }
                u8::from_str_radix(part, 16).ok().map(i32::from)
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| TelemetryError::InvalidMacFormat(display.to_string()))?;

        if octets.len() != MAC_ADDRESS_LEN {
            return Err(TelemetryError::InvalidMacAddress(octets.len()));
        }

        Ok(Self(octets))
    }
}

impl From<[u8; MAC_ADDRESS_LEN]> for MacAddress {
    fn from(octets: [u8; MAC_ADDRESS_LEN]) -> Self {
        Self(octets.iter().map(|&b| i32::from(b)).collect())
    }
}

/// A single sensor reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Temperature in 1/1000 °C
    pub temperature_millicelsius: i32,

    /// Relative humidity in 1/10000 %RH
    pub humidity: i32,

    /// Pressure in Pa
    pub pressure: i32,

    /// Battery potential in mV
    pub battery_potential: i32,

    /// Transmit power in dBm
    pub tx_power: i32,

    pub movement_counter: i32,

    pub measurement_sequence_number: i32,

    /// Measurement time as epoch milliseconds
    pub measurement_ts_ms: i64,

    pub mac_address: MacAddress,
}

impl TelemetryRecord {
    /// Decode one input line
    ///
    /// Missing or wrong-typed fields are parse errors; unknown keys are
    /// ignored. No range validation happens here.
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| TelemetryError::parse(line, e))
    }

    /// Encode to the single-line JSON wire form
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "temperature_millicelsius": self.temperature_millicelsius,
            "humidity": self.humidity,
            "pressure": self.pressure,
            "battery_potential": self.battery_potential,
            "tx_power": self.tx_power,
            "movement_counter": self.movement_counter,
            "measurement_sequence_number": self.measurement_sequence_number,
            "measurement_ts_ms": self.measurement_ts_ms,
            "mac_address": self.mac_address.octets(),
        })
        .to_string()
    }
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}
