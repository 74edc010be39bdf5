//! Telemetry record and its wire encoding.
//!
//! The payload is a flat JSON object keyed by stable field names:
//!
//! ```json
//! {"temp_water":25.0,"temp_water_1":24.0,"temp_water_2":26.0,"ph":6.8,
//!  "ec":900.0,"lux":312.5,"level":41.2,"temp_air":21.4,"pressure":1013.2}
//! ```
//!
//! Floats use `serde_json`'s shortest round-trip formatting (always a `.`
//! decimal point, no grouping). An unavailable sensor is encoded as `null`
//! so consumers can tell "no data" from a real zero.

use serde::{Deserialize, Serialize};

use crate::metrics::DerivedMetrics;
use crate::reading::RawReading;

/// One cycle's telemetry, built fresh every cycle and never merged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub temp_water: Option<f32>,
    pub temp_water_1: Option<f32>,
    pub temp_water_2: Option<f32>,
    pub ph: Option<f32>,
    pub ec: Option<f32>,
    pub lux: Option<f32>,
    pub level: Option<f32>,
    pub temp_air: Option<f32>,
    pub pressure: Option<f32>,
}

impl TelemetryRecord {
    /// Assemble the record from one cycle's reading and derived metrics.
    pub fn new(raw: &RawReading, derived: &DerivedMetrics) -> Self {
        Self {
            temp_water: derived.water_temperature_avg,
            temp_water_1: raw.temp_probe_1,
            temp_water_2: raw.temp_probe_2,
            ph: raw.ph,
            ec: raw.electrical_conductivity,
            lux: raw.illuminance,
            level: raw.distance_level,
            temp_air: raw.air_temperature,
            pressure: raw.air_pressure,
        }
    }

    /// Serialise to the wire payload.
    ///
    /// Cannot fail for this record shape (non-finite floats serialise as
    /// `null`); the `Result` only reflects the serializer's signature.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse a wire payload. Field order does not matter.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Build and serialise the record for one cycle.
pub fn encode(raw: &RawReading, derived: &DerivedMetrics) -> Result<Vec<u8>, serde_json::Error> {
    TelemetryRecord::new(raw, derived).to_bytes()
}
