//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and the shared I2C bus. `init()` brings
//! each sensor up once and records the outcome; a sensor that fails there
//! reads `None` for the rest of the run.

pub mod barometer;
pub mod conductivity;
pub mod level;
pub mod light;
pub mod ph;
pub mod temperature;

use embedded_hal::i2c::I2c;

use crate::diagnostics::{Peripheral, PeripheralStatus, StartupReport};
use crate::drivers::hw_init::HwInitStatus;
use crate::error::{Error, SensorError};
use crate::pins;

use barometer::Barometer;
use conductivity::ConductivityProbe;
use level::UltrasonicLevel;
use light::LightMeter;
use ph::PhProbe;
use temperature::{MAX_PROBES, WaterProbes};

/// Full-scale count of the 12-bit ADC.
pub const ADC_MAX: u16 = 4095;

/// Sim sentinel for an ADC read error.
#[cfg(not(target_os = "espidf"))]
pub(crate) const SIM_ADC_FAULT: u32 = u32::MAX;

/// Linear map of a raw ADC count onto `0..=full_scale`.
pub fn scale_adc(raw: u16, full_scale: f32) -> Option<f32> {
    (raw <= ADC_MAX).then(|| f32::from(raw) / f32::from(ADC_MAX) * full_scale)
}

/// Aggregates all sensor drivers.
pub struct SensorHub<I> {
    i2c: I,
    pub probes: WaterProbes,
    pub ph: PhProbe,
    pub conductivity: ConductivityProbe,
    pub light: LightMeter,
    pub level: UltrasonicLevel,
    pub barometer: Barometer,
}

impl<I: I2c> SensorHub<I> {
    pub fn new(i2c: I, echo_timeout_us: u32) -> Self {
        Self {
            i2c,
            probes: WaterProbes::new(),
            ph: PhProbe::new(),
            conductivity: ConductivityProbe::new(),
            light: LightMeter::new(pins::BH1750_ADDR),
            level: UltrasonicLevel::new(echo_timeout_us),
            barometer: Barometer::new(pins::BMP280_ADDR),
        }
    }

    /// One-time bring-up of every sensor, given the outcome of the
    /// low-level ADC/GPIO init.
    pub fn init(&mut self, hw: HwInitStatus, report: &mut StartupReport) {
        if let Err(e) = hw.adc {
            log::warn!("Sensors: {}, pH and EC disabled", e);
            self.ph.disable();
            self.conductivity.disable();
            report.record(Peripheral::PhProbe, failed_init("ADC"));
            report.record(Peripheral::EcProbe, failed_init("ADC"));
        } else {
            report.record(Peripheral::PhProbe, PeripheralStatus::Ready);
            report.record(Peripheral::EcProbe, PeripheralStatus::Ready);
        }

        if let Err(e) = hw.gpio {
            log::warn!("Sensors: {}, ultrasonic and 1-Wire disabled", e);
            self.level.disable();
            report.record(Peripheral::Ultrasonic, failed_init("GPIO"));
            report.record(Peripheral::WaterProbes, failed_init("GPIO"));
        } else {
            report.record(Peripheral::Ultrasonic, PeripheralStatus::Ready);
            let status = match self.probes.begin() {
                0 => PeripheralStatus::Failed(Error::Sensor(SensorError::NotDetected)),
                n if n < MAX_PROBES => PeripheralStatus::Partial("one of two probes found"),
                _ => PeripheralStatus::Ready,
            };
            report.record(Peripheral::WaterProbes, status);
        }

        let status = status_of(self.light.begin(&mut self.i2c));
        report.record(Peripheral::LightMeter, status);
        let status = status_of(self.barometer.begin(&mut self.i2c));
        report.record(Peripheral::Barometer, status);
    }

    pub fn read_water_temperatures(&mut self) -> (Option<f32>, Option<f32>) {
        self.probes.read()
    }

    pub fn read_ph(&mut self) -> Option<f32> {
        self.ph.read()
    }

    pub fn read_conductivity(&mut self) -> Option<f32> {
        self.conductivity.read()
    }

    pub fn read_illuminance(&mut self) -> Option<f32> {
        self.light.read(&mut self.i2c)
    }

    pub fn read_distance_level(&mut self) -> Option<f32> {
        self.level.read()
    }

    pub fn read_air(&mut self) -> (Option<f32>, Option<f32>) {
        self.barometer.read(&mut self.i2c)
    }
}

fn failed_init(what: &'static str) -> PeripheralStatus {
    PeripheralStatus::Failed(Error::Init(what))
}

fn status_of(result: Result<(), SensorError>) -> PeripheralStatus {
    match result {
        Ok(()) => PeripheralStatus::Ready,
        Err(e) => PeripheralStatus::Failed(e.into()),
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::drivers::hw_init::HwInitError;
    use crate::drivers::sim_i2c::SimI2cBus;

    #[test]
    fn scale_rejects_over_range() {
        assert_eq!(scale_adc(4096, 14.0), None);
        assert_eq!(scale_adc(4095, 14.0), Some(14.0));
    }

    #[test]
    fn missing_barometer_is_reported_and_reads_none() {
        let mut bus = SimI2cBus::new();
        bus.detach(pins::BMP280_ADDR);
        let mut hub = SensorHub::new(bus, 30_000);
        let mut report = StartupReport::new();
        hub.init(HwInitStatus::all_ok(), &mut report);

        assert_eq!(
            report.status(Peripheral::Barometer),
            Some(PeripheralStatus::Failed(Error::Sensor(SensorError::NotDetected)))
        );
        assert_eq!(report.status(Peripheral::LightMeter), Some(PeripheralStatus::Ready));
        assert_eq!(hub.read_air(), (None, None));
        assert!(hub.read_illuminance().is_some());
    }

    #[test]
    fn adc_failure_disables_analog_probes() {
        let mut hub = SensorHub::new(SimI2cBus::new(), 30_000);
        let mut report = StartupReport::new();
        let hw = HwInitStatus {
            adc: Err(HwInitError::AdcInitFailed(-1)),
            gpio: Ok(()),
        };
        hub.init(hw, &mut report);
        assert_eq!(hub.read_ph(), None);
        assert_eq!(hub.read_conductivity(), None);
        assert!(matches!(
            report.status(Peripheral::PhProbe),
            Some(PeripheralStatus::Failed(Error::Init("ADC")))
        ));
    }

    #[test]
    fn injected_faults_read_as_unavailable() {
        temperature::sim_set_probe(1, None);
        ph::sim_set_ph_adc(None);
        conductivity::sim_set_ec_adc(Some(5000));
        level::sim_set_echo_us(0);

        let mut hub = SensorHub::new(SimI2cBus::new(), 30_000);
        let mut report = StartupReport::new();
        hub.init(HwInitStatus::all_ok(), &mut report);
        let partial = report.status(Peripheral::WaterProbes);
        let temps = hub.read_water_temperatures();
        let (ph, ec, lvl) = (hub.read_ph(), hub.read_conductivity(), hub.read_distance_level());

        temperature::sim_set_probe(1, Some(25.1));
        ph::sim_set_ph_adc(Some(1995));
        conductivity::sim_set_ec_adc(Some(2048));
        level::sim_set_echo_us(2353);

        assert!(matches!(partial, Some(PeripheralStatus::Partial(_))));
        assert!(temps.0.is_some());
        assert_eq!(temps.1, None);
        assert_eq!((ph, ec, lvl), (None, None, None));
    }
}
