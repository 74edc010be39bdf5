//! pH probe behind an analog amplifier board.
//!
//! Linear two-point mapping of the 12-bit ADC range onto 0–14 pH with no
//! per-probe calibration.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH7 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static atomic for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(not(target_os = "espidf"))]
use super::SIM_ADC_FAULT;
use super::scale_adc;

/// Full-scale pH at ADC 4095.
pub const PH_FULL_SCALE: f32 = 14.0;

#[cfg(not(target_os = "espidf"))]
static SIM_PH_ADC: AtomicU32 = AtomicU32::new(1995);

/// Inject the next raw sample; `None` simulates an ADC read error.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ph_adc(raw: Option<u16>) {
    SIM_PH_ADC.store(raw.map_or(SIM_ADC_FAULT, u32::from), Ordering::Relaxed);
}

/// Raw ADC count → pH; `None` for counts outside the 12-bit range.
pub fn adc_to_ph(raw: u16) -> Option<f32> {
    scale_adc(raw, PH_FULL_SCALE)
}

pub struct PhProbe {
    enabled: bool,
}

impl PhProbe {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Mark the probe unusable for this run (ADC failed to come up).
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
        self.read_adc().and_then(adc_to_ph)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Option<u16> {
        hw_init::adc1_read(pins::PH_ADC_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Option<u16> {
        u16::try_from(SIM_PH_ADC.load(Ordering::Relaxed)).ok()
    }
}

impl Default for PhProbe {
    fn default() -> Self {
        Self::new()
    }
}
