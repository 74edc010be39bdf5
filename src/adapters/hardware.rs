//! Hardware adapter — bridges real peripherals to the [`SensorPort`].
//!
//! Owns the [`SensorHub`]. This is the only module in the system that
//! touches sensor hardware. On non-espidf targets, the underlying drivers
//! use cfg-gated simulation stubs.

use embedded_hal::i2c::I2c;

use crate::app::ports::SensorPort;
use crate::diagnostics::StartupReport;
use crate::drivers::hw_init;
use crate::sensors::SensorHub;

/// Concrete adapter that exposes the sensor hardware behind the port.
pub struct HardwareAdapter<I> {
    sensor_hub: SensorHub<I>,
}

impl<I: I2c> HardwareAdapter<I> {
    pub fn new(sensor_hub: SensorHub<I>) -> Self {
        Self { sensor_hub }
    }

    /// One-time bring-up: ADC/GPIO first, then every sensor.
    pub fn init(&mut self, report: &mut StartupReport) {
        let hw = hw_init::init_peripherals();
        self.sensor_hub.init(hw, report);
    }

    pub fn hub(&self) -> &SensorHub<I> {
        &self.sensor_hub
    }

    pub fn hub_mut(&mut self) -> &mut SensorHub<I> {
        &mut self.sensor_hub
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I: I2c> SensorPort for HardwareAdapter<I> {
    fn read_water_temperatures(&mut self) -> (Option<f32>, Option<f32>) {
        self.sensor_hub.read_water_temperatures()
    }

    fn read_ph(&mut self) -> Option<f32> {
        self.sensor_hub.read_ph()
    }

    fn read_conductivity(&mut self) -> Option<f32> {
        self.sensor_hub.read_conductivity()
    }

    fn read_illuminance(&mut self) -> Option<f32> {
        self.sensor_hub.read_illuminance()
    }

    fn read_distance_level(&mut self) -> Option<f32> {
        self.sensor_hub.read_distance_level()
    }

    fn read_air(&mut self) -> (Option<f32>, Option<f32>) {
        self.sensor_hub.read_air()
    }
}
