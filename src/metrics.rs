//! Composite values derived from a [`RawReading`].
//!
//! Derivation is a pure function of its input: no I/O, no hidden state.
//! Besides the probe average this gives two rough pond indicators: the
//! dissolved-oxygen saturation expected at the water temperature, and the
//! risk of an algae bloom from warmth and light together.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::reading::RawReading;

/// Values computed from one cycle's raw reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Mean of the two water probes (°C). `None` if either probe is missing.
    pub water_temperature_avg: Option<f32>,
    /// Saturation dissolved oxygen at the averaged temperature (mg/L, sea level).
    pub estimated_oxygen: Option<f32>,
    /// `None` without both the averaged temperature and a light reading.
    pub algae_risk: Option<AlgaeRisk>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgaeRisk {
    Low,
    Moderate,
    High,
}

impl fmt::Display for AlgaeRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Moderate => write!(f, "moderate"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Compute the derived metrics for one reading.
pub fn derive(raw: &RawReading) -> DerivedMetrics {
    let avg = mean_of_pair(raw.temp_probe_1, raw.temp_probe_2);
    DerivedMetrics {
        water_temperature_avg: avg,
        estimated_oxygen: avg.and_then(oxygen_saturation),
        algae_risk: avg.zip(raw.illuminance).and_then(|(t, lux)| algae_risk(t, lux)),
    }
}

/// Quadratic fit of O₂ saturation (mg/L) against water temperature (°C).
pub fn oxygen_saturation(celsius: f32) -> Option<f32> {
    let o2 = 14.6 - 0.4 * celsius + 0.0045 * celsius * celsius;
    o2.is_finite().then(|| o2.max(0.0))
}

/// Bloom risk: moderate above 20 °C and 5000 lux, high above 25 °C and
/// 8000 lux. Both limits are exclusive.
pub fn algae_risk(celsius: f32, lux: f32) -> Option<AlgaeRisk> {
    if !celsius.is_finite() || !lux.is_finite() {
        return None;
    }
    Some(if celsius > 25.0 && lux > 8000.0 {
        AlgaeRisk::High
    } else if celsius > 20.0 && lux > 5000.0 {
        AlgaeRisk::Moderate
    } else {
        AlgaeRisk::Low
    })
}

/// Arithmetic mean of two probes. A half-failed pair is unavailable rather
/// than averaged against a failure sentinel.
fn mean_of_pair(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    let (a, b) = (a?, b?);
    let mean = (a + b) / 2.0;
    mean.is_finite().then_some(mean)
}
