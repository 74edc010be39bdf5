//! Raw per-cycle sensor snapshot.
//!
//! A missing or failed sensor is `None`, never a magic number. Drivers
//! filter non-finite values before they get here (see [`measurement`]).

use serde::{Deserialize, Serialize};

/// Immutable snapshot of one acquisition cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    /// First DS18B20 water probe (°C).
    pub temp_probe_1: Option<f32>,
    /// Second DS18B20 water probe (°C).
    pub temp_probe_2: Option<f32>,
    /// Water pH (pH units).
    pub ph: Option<f32>,
    /// Electrical conductivity (µS/cm).
    pub electrical_conductivity: Option<f32>,
    /// Ambient light (lux).
    pub illuminance: Option<f32>,
    /// Ultrasonic distance to the water surface (cm).
    pub distance_level: Option<f32>,
    /// Air temperature from the barometer (°C).
    pub air_temperature: Option<f32>,
    /// Barometric pressure (hPa).
    pub air_pressure: Option<f32>,
}

impl RawReading {
    /// A snapshot in which every sensor is unavailable.
    pub const fn unavailable() -> Self {
        Self {
            temp_probe_1: None,
            temp_probe_2: None,
            ph: None,
            electrical_conductivity: None,
            illuminance: None,
            distance_level: None,
            air_temperature: None,
            air_pressure: None,
        }
    }

    /// Number of sensors that produced no value this cycle.
    pub fn unavailable_count(&self) -> usize {
        [
            self.temp_probe_1,
            self.temp_probe_2,
            self.ph,
            self.electrical_conductivity,
            self.illuminance,
            self.distance_level,
            self.air_temperature,
            self.air_pressure,
        ]
        .iter()
        .filter(|v| v.is_none())
        .count()
    }
}

/// Wrap a driver value, mapping NaN and infinities to "unavailable".
pub fn measurement(value: f32) -> Option<f32> {
    value.is_finite().then_some(value)
}
