//! Water temperature: two DS18B20 probes sharing one 1-Wire bus.
//!
//! Probes are enumerated once at startup by ROM search; the first ROM
//! found is probe 1. Each read issues one broadcast CONVERT T, waits for
//! the 12-bit conversion, then reads each scratchpad by ROM.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-banged bus on `pins::ONEWIRE_GPIO` (see drivers::onewire).
//! On host/test: per-probe values come from static atomics.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use log::{debug, info, warn};

use crate::drivers::onewire::{self, RomCode};
use crate::error::SensorError;

pub const MAX_PROBES: usize = 2;

/// Value the DallasTemperature convention reports for a missing probe.
pub const DISCONNECTED_C: f32 = -127.0;

/// Scratchpad temperature register after power-on, before any conversion
/// (85.0 °C in 1/16 °C steps).
const POWER_ON_RESET_RAW: i16 = 0x0550;

const MIN_C: f32 = -55.0;
const MAX_C: f32 = 125.0;

#[cfg(not(target_os = "espidf"))]
static SIM_PROBES: [AtomicU32; MAX_PROBES] = [
    AtomicU32::new(0x41C4_0000), // 24.5
    AtomicU32::new(0x41C8_CCCD), // 25.1
];

/// Inject a probe value; `None` simulates an unplugged probe.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_probe(index: usize, celsius: Option<f32>) {
    if let Some(slot) = SIM_PROBES.get(index) {
        slot.store(celsius.unwrap_or(f32::NAN).to_bits(), Ordering::Relaxed);
    }
}

/// Decode a 9-byte DS18B20 scratchpad to °C.
pub fn scratchpad_to_celsius(scratchpad: &[u8; 9]) -> Result<f32, SensorError> {
    if scratchpad.iter().all(|&b| b == 0) {
        // Data line stuck low.
        return Err(SensorError::BusFault);
    }
    if !onewire::crc_ok(scratchpad) {
        return Err(SensorError::CrcMismatch);
    }
    let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]);
    if raw == POWER_ON_RESET_RAW {
        return Err(SensorError::OutOfRange);
    }
    let celsius = f32::from(raw) / 16.0;
    if !(MIN_C..=MAX_C).contains(&celsius) {
        return Err(SensorError::OutOfRange);
    }
    Ok(celsius)
}

/// Map a library-style reading to an optional value.
pub fn probe_value(celsius: f32) -> Option<f32> {
    if celsius <= DISCONNECTED_C || !(MIN_C..=MAX_C).contains(&celsius) {
        None
    } else {
        Some(celsius)
    }
}

pub struct WaterProbes {
    roms: heapless::Vec<RomCode, MAX_PROBES>,
}

impl WaterProbes {
    pub fn new() -> Self {
        Self {
            roms: heapless::Vec::new(),
        }
    }

    /// Enumerate probes on the bus. Returns how many answered.
    pub fn begin(&mut self) -> usize {
        self.roms = self.enumerate();
        match self.roms.len() {
            0 => warn!("DS18B20: no probe on the 1-Wire bus"),
            n => info!("DS18B20: {} probe(s) found", n),
        }
        self.roms.len()
    }

    /// Both probe temperatures; a missing or failing probe reads `None`.
    pub fn read(&mut self) -> (Option<f32>, Option<f32>) {
        let mut out = [None; MAX_PROBES];
        if self.roms.is_empty() {
            return (None, None);
        }
        self.start_conversion();
        for (slot, rom) in out.iter_mut().zip(self.roms.iter()) {
            *slot = match self.read_probe(rom) {
                Ok(c) => Some(c),
                Err(e) => {
                    debug!("DS18B20 {:02X?}: {}", rom, e);
                    None
                }
            };
        }
        (out[0], out[1])
    }

    // ── Bus access ────────────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn enumerate(&self) -> heapless::Vec<RomCode, MAX_PROBES> {
        onewire::search::<MAX_PROBES>()
    }

    #[cfg(target_os = "espidf")]
    fn start_conversion(&self) {
        use esp_idf_svc::hal::delay::FreeRtos;
        if onewire::reset() {
            onewire::write_byte(onewire::CMD_SKIP_ROM);
            onewire::write_byte(0x44);
            // 12-bit conversion time.
            FreeRtos::delay_ms(750);
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_probe(&self, rom: &RomCode) -> Result<f32, SensorError> {
        if !onewire::reset() {
            return Err(SensorError::NotDetected);
        }
        onewire::select(rom);
        onewire::write_byte(0xBE);
        let mut scratchpad = [0u8; 9];
        for b in scratchpad.iter_mut() {
            *b = onewire::read_byte();
        }
        scratchpad_to_celsius(&scratchpad)
    }

    #[cfg(not(target_os = "espidf"))]
    fn enumerate(&self) -> heapless::Vec<RomCode, MAX_PROBES> {
        let mut roms = heapless::Vec::new();
        for (i, slot) in SIM_PROBES.iter().enumerate() {
            if !f32::from_bits(slot.load(Ordering::Relaxed)).is_nan() {
                let mut rom: RomCode = [0x28, i as u8, 0, 0, 0, 0, 0, 0];
                rom[7] = onewire::crc8(&rom[..7]);
                let _ = roms.push(rom);
            }
        }
        roms
    }

    #[cfg(not(target_os = "espidf"))]
    fn start_conversion(&self) {}

    #[cfg(not(target_os = "espidf"))]
    fn read_probe(&self, rom: &RomCode) -> Result<f32, SensorError> {
        let slot = SIM_PROBES
            .get(usize::from(rom[1]))
            .ok_or(SensorError::NotDetected)?;
        probe_value(f32::from_bits(slot.load(Ordering::Relaxed))).ok_or(SensorError::NotDetected)
    }
}

impl Default for WaterProbes {
    fn default() -> Self {
        Self::new()
    }
}
