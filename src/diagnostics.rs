//! Startup diagnostics.
//!
//! Peripheral bring-up happens once, before the first cycle. A failure
//! there is the only condition the firmware treats as serious, yet it is
//! still not fatal: the failed peripheral is recorded here, surfaced on
//! the diagnostics channel (the `Started` event), and its readings stay
//! unavailable for the rest of the run.

use core::fmt;

use crate::app::events::LinkState;
use crate::error::Error;

/// Peripherals brought up at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peripheral {
    WaterProbes,
    PhProbe,
    EcProbe,
    LightMeter,
    Ultrasonic,
    Barometer,
    Display,
    Wifi,
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaterProbes => write!(f, "DS18B20 probes"),
            Self::PhProbe => write!(f, "pH probe"),
            Self::EcProbe => write!(f, "EC probe"),
            Self::LightMeter => write!(f, "BH1750"),
            Self::Ultrasonic => write!(f, "ultrasonic"),
            Self::Barometer => write!(f, "BMP280"),
            Self::Display => write!(f, "display"),
            Self::Wifi => write!(f, "WiFi"),
        }
    }
}

/// Outcome of bringing one peripheral up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralStatus {
    Ready,
    /// Up, but not fully (e.g. only one of two probes found).
    Partial(&'static str),
    /// Down for this run; its readings are always unavailable.
    Failed(Error),
}

const MAX_PERIPHERALS: usize = 8;

/// Result of the one-time startup sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct StartupReport {
    entries: heapless::Vec<(Peripheral, PeripheralStatus), MAX_PERIPHERALS>,
    /// Broker link after the bounded startup join.
    pub link: LinkState,
    /// Threshold bands that will classify everything CRITICAL.
    pub malformed_bands: heapless::Vec<&'static str, 9>,
}

impl Default for StartupReport {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupReport {
    pub fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
            link: LinkState::Disconnected,
            malformed_bands: heapless::Vec::new(),
        }
    }

    /// Record (or overwrite) a peripheral's status.
    pub fn record(&mut self, peripheral: Peripheral, status: PeripheralStatus) {
        if let Some(slot) = self.entries.iter_mut().find(|(p, _)| *p == peripheral) {
            slot.1 = status;
        } else {
            // One slot per Peripheral variant, so this cannot overflow.
            let _ = self.entries.push((peripheral, status));
        }
    }

    pub fn status(&self, peripheral: Peripheral) -> Option<PeripheralStatus> {
        self.entries
            .iter()
            .find(|(p, _)| *p == peripheral)
            .map(|(_, s)| *s)
    }

    pub fn entries(&self) -> &[(Peripheral, PeripheralStatus)] {
        &self.entries
    }

    /// Peripherals that are down for this run.
    pub fn failed(&self) -> impl Iterator<Item = (Peripheral, Error)> + '_ {
        self.entries.iter().filter_map(|(p, s)| match s {
            PeripheralStatus::Failed(e) => Some((*p, *e)),
            _ => None,
        })
    }

    /// True when anything is missing, partial, offline or misconfigured.
    pub fn is_degraded(&self) -> bool {
        self.link == LinkState::Disconnected
            || !self.malformed_bands.is_empty()
            || self
                .entries
                .iter()
                .any(|(_, s)| *s != PeripheralStatus::Ready)
    }
}
