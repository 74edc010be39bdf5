//! Electrical conductivity probe (analog TDS/EC board).
//!
//! Linear mapping of the 12-bit ADC range onto 0–2000 µS/cm. No
//! temperature compensation is applied.
//!
//! On ESP-IDF: ADC1_CH6. On host/test: static atomic for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(not(target_os = "espidf"))]
use super::SIM_ADC_FAULT;
use super::scale_adc;

/// Full-scale conductivity in µS/cm at ADC 4095.
pub const EC_FULL_SCALE_US_CM: f32 = 2000.0;

#[cfg(not(target_os = "espidf"))]
static SIM_EC_ADC: AtomicU32 = AtomicU32::new(2048);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ec_adc(raw: Option<u16>) {
    SIM_EC_ADC.store(raw.map_or(SIM_ADC_FAULT, u32::from), Ordering::Relaxed);
}

pub fn adc_to_conductivity(raw: u16) -> Option<f32> {
    scale_adc(raw, EC_FULL_SCALE_US_CM)
}

pub struct ConductivityProbe {
    enabled: bool,
}

impl ConductivityProbe {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn read(&mut self) -> Option<f32> {
        if !self.enabled {
            return None;
        }
        self.read_adc().and_then(adc_to_conductivity)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Option<u16> {
        hw_init::adc1_read(pins::EC_ADC_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Option<u16> {
        u16::try_from(SIM_EC_ADC.load(Ordering::Relaxed)).ok()
    }
}

impl Default for ConductivityProbe {
    fn default() -> Self {
        Self::new()
    }
}
