//! Record to measurement transform
//!
//! Each record expands into seven measurements. A batch is sent as one array
//! with an entry per measurement type holding every data point of that type,
//! so the grouping is by type rather than by record.

use envsink_common::{TelemetryError, TelemetryRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryType {
    Temperature,
    Humidity,
    Pressure,
    Battery,
    TxPower,
    MovementCounter,
    MeasurementSequenceNumber,
}

impl TelemetryType {
    /// Payload order
    pub const ALL: [TelemetryType; 7] = [
        TelemetryType::Temperature,
        TelemetryType::Humidity,
        TelemetryType::Pressure,
        TelemetryType::Battery,
        TelemetryType::TxPower,
        TelemetryType::MovementCounter,
        TelemetryType::MeasurementSequenceNumber,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TelemetryType::Temperature => "temperature",
            TelemetryType::Humidity => "humidity",
            TelemetryType::Pressure => "pressure",
            TelemetryType::Battery => "battery",
            TelemetryType::TxPower => "tx_power",
            TelemetryType::MovementCounter => "movement_counter",
            TelemetryType::MeasurementSequenceNumber => "measurement_sequence_number",
        }
    }

    /// Value in API units: °C, %RH, Pa, V, dBm, counts
    pub fn value_of(self, record: &TelemetryRecord) -> f64 {
        match self {
            TelemetryType::Temperature => f64::from(record.temperature_millicelsius) / 1000.0,
            TelemetryType::Humidity => f64::from(record.humidity) / 10000.0,
            TelemetryType::Pressure => f64::from(record.pressure),
            TelemetryType::Battery => f64::from(record.battery_potential) / 1000.0,
            TelemetryType::TxPower => f64::from(record.tx_power),
            TelemetryType::MovementCounter => f64::from(record.movement_counter),
            TelemetryType::MeasurementSequenceNumber => {
                f64::from(record.measurement_sequence_number)
            },
        }
    }
}

/// How a data point identifies its sensor; serialized as a single key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorId {
    MacAddress(String),
    SensorName(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(flatten)]
    pub sensor: SensorId,
    pub timestamp: i64,
    pub value: f64,
}

/// One measurement of one record
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub telemetry_type: TelemetryType,
    pub data_point: DataPoint,
}

/// Wire entry: every data point of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPayload {
    pub telemetry_type: TelemetryType,
    pub data: Vec<DataPoint>,
}

/// Transform result for a whole batch
#[derive(Debug, Default)]
pub struct BatchPayload {
    pub payload: Vec<TelemetryPayload>,

    /// Records that contributed data points
    pub accepted: usize,

    /// Records left out, by sequence number
    pub rejected: Vec<(i32, TelemetryError)>,
}

/// Expand one record into its seven measurements
///
/// Fails with [`TelemetryError::InvalidMacAddress`] when the MAC is not six
/// elements long.
pub fn measurements(
    record: &TelemetryRecord,
    sensor_names: &HashMap<String, String>,
) -> Result<Vec<Measurement>, TelemetryError> {
    let mac = record.mac_address.to_display_string()?;
    let sensor = match sensor_names.get(&mac) {
        Some(name) => SensorId::SensorName(name.clone()),
        None => SensorId::MacAddress(mac),
    };

    Ok(TelemetryType::ALL
        .iter()
        .map(|&telemetry_type| Measurement {
            telemetry_type,
            data_point: DataPoint {
                sensor: sensor.clone(),
                timestamp: record.measurement_ts_ms,
                value: telemetry_type.value_of(record),
            },
        })
        .collect())
}

/// Transform a batch and group data points by type
///
/// Types without data points are omitted; an empty payload means nothing
/// needs to be sent.
pub fn build_payload(
    batch: &[TelemetryRecord],
    sensor_names: &HashMap<String, String>,
) -> BatchPayload {
    let mut grouped: HashMap<TelemetryType, Vec<DataPoint>> = HashMap::new();
    let mut result = BatchPayload::default();

    for record in batch {
        match measurements(record, sensor_names) {
            Ok(items) => {
                result.accepted += 1;
                for item in items {
                    grouped
                        .entry(item.telemetry_type)
                        .or_default()
                        .push(item.data_point);
                }
            },
            Err(e) => result.rejected.push((record.measurement_sequence_number, e)),
        }
    }

    result.payload = TelemetryType::ALL
        .iter()
        .filter_map(|telemetry_type| {
            grouped.remove(telemetry_type).map(|data| TelemetryPayload {
                telemetry_type: *telemetry_type,
                data,
            })
        })
        .collect();

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use envsink_common::MacAddress;

    const SAMPLE: &str = r#"{"battery_potential":2335,"humidity":653675,"mac_address":[254,38,136,122,102,102],"measurement_sequence_number":53300,"movement_counter":2,"pressure":100755,"temperature_millicelsius":-29020,"tx_power":4,"measurement_ts_ms":1693460525699}"#;

    fn sample() -> TelemetryRecord {
        TelemetryRecord::parse(SAMPLE).unwrap()
    }

    #[test]
    fn test_sample_temperature_measurement() {
        let items = measurements(&sample(), &HashMap::new()).unwrap();
        assert_eq!(items.len(), 7);

        let temperature = items
            .iter()
            .find(|m| m.telemetry_type == TelemetryType::Temperature)
            .unwrap();
        assert_eq!(temperature.data_point.value, -29.02);
        assert_eq!(temperature.data_point.timestamp, 1693460525699);
        assert_eq!(
            temperature.data_point.sensor,
            SensorId::MacAddress("FE:26:88:7A:66:66".to_string())
        );
    }

    #[test]
    fn test_unit_conversions() {
        let record = sample();
        let value = |t: TelemetryType| t.value_of(&record);

        assert_eq!(value(TelemetryType::Humidity), 65.3675);
        assert_eq!(value(TelemetryType::Pressure), 100755.0);
        assert_eq!(value(TelemetryType::Battery), 2.335);
        assert_eq!(value(TelemetryType::TxPower), 4.0);
        assert_eq!(value(TelemetryType::MovementCounter), 2.0);
        assert_eq!(value(TelemetryType::MeasurementSequenceNumber), 53300.0);
    }

    #[test]
    fn test_invalid_mac_length() {
        for len in [0usize, 5, 7] {
            let mut record = sample();
            record.mac_address = MacAddress::new(vec![1; len]);

            let err = measurements(&record, &HashMap::new()).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Invalid MAC address length: {len}, expected 6")
            );
        }
    }

    #[test]
    fn test_sensor_name_replaces_mac() {
        let names = HashMap::from([("FE:26:88:7A:66:66".to_string(), "sauna".to_string())]);
        let items = measurements(&sample(), &names).unwrap();
        assert!(items
            .iter()
            .all(|m| m.data_point.sensor == SensorId::SensorName("sauna".to_string())));

        let json = serde_json::to_value(&items[0].data_point).unwrap();
        assert_eq!(json["sensor_name"], "sauna");
        assert!(json.get("mac_address").is_none());
    }

    #[test]
    fn test_batch_grouped_by_type() {
        let mut second = sample();
        second.measurement_ts_ms += 1000;
        second.temperature_millicelsius = 1500;

        let batch = build_payload(&[sample(), second], &HashMap::new());
        assert_eq!(batch.accepted, 2);
        assert!(batch.rejected.is_empty());
        assert_eq!(batch.payload.len(), 7);

        let order: Vec<TelemetryType> = batch.payload.iter().map(|p| p.telemetry_type).collect();
        assert_eq!(order, TelemetryType::ALL.to_vec());

        let temperature = &batch.payload[0];
        assert_eq!(temperature.data.len(), 2);
        assert_eq!(temperature.data[0].value, -29.02);
        assert_eq!(temperature.data[1].value, 1.5);
        assert_eq!(temperature.data[1].timestamp, 1693460526699);
    }

    #[test]
    fn test_bad_records_are_left_out() {
        let mut bad = sample();
        bad.mac_address = MacAddress::new(vec![1, 2, 3]);
        bad.measurement_sequence_number = 9;

        let batch = build_payload(&[bad.clone(), sample()], &HashMap::new());
        assert_eq!(batch.accepted, 1);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].0, 9);
        assert!(batch.payload.iter().all(|p| p.data.len() == 1));

        let only_bad = build_payload(&[bad], &HashMap::new());
        assert!(only_bad.payload.is_empty());
    }

    #[test]
    fn test_wire_shape() {
        let batch = build_payload(&[sample()], &HashMap::new());
        let json = serde_json::to_value(&batch.payload).unwrap();

        assert_eq!(json[0]["telemetry_type"], "temperature");
        assert_eq!(json[0]["data"][0]["mac_address"], "FE:26:88:7A:66:66");
        assert_eq!(json[0]["data"][0]["timestamp"], 1693460525699i64);
        assert_eq!(json[4]["telemetry_type"], "tx_power");
        assert_eq!(json[6]["telemetry_type"], "measurement_sequence_number");
    }
}
