//! Air temperature and barometric pressure (Bosch BMP280) on I2C.
//!
//! `begin()` checks the chip id, reads the factory trimming parameters and
//! puts the device in normal mode (×16 pressure, ×2 temperature
//! oversampling). Each read burst-reads the six data registers and applies
//! the floating-point compensation formulas from the datasheet (§8.1).

use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, info, warn};

use crate::error::SensorError;

pub const REG_CHIP_ID: u8 = 0xD0;
pub const REG_CALIB: u8 = 0x88;
pub const REG_CTRL_MEAS: u8 = 0xF4;
pub const REG_CONFIG: u8 = 0xF5;
pub const REG_DATA: u8 = 0xF7;

pub const CHIP_ID: u8 = 0x58;
/// osrs_t ×2, osrs_p ×16, normal mode.
pub const CTRL_MEAS_NORMAL: u8 = 0xB7;

/// ADC value the device reports for a skipped/not-yet-run measurement.
const ADC_SKIPPED: i32 = 0x80000;

/// Factory trimming parameters (registers 0x88..0x9F, little-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
}

impl Calibration {
    pub fn from_registers(raw: &[u8; 24]) -> Self {
        let u = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]);
        Self {
            t1: u(0),
            t2: s(2),
            t3: s(4),
            p1: u(6),
            p2: s(8),
            p3: s(10),
            p4: s(12),
            p5: s(14),
            p6: s(16),
            p7: s(18),
            p8: s(20),
            p9: s(22),
        }
    }

    /// Compensated temperature in °C plus the `t_fine` carried into pressure.
    pub fn temperature(&self, adc_t: i32) -> (f64, f64) {
        let adc_t = f64::from(adc_t);
        let t1 = f64::from(self.t1);
        let var1 = (adc_t / 16384.0 - t1 / 1024.0) * f64::from(self.t2);
        let d = adc_t / 131_072.0 - t1 / 8192.0;
        let var2 = d * d * f64::from(self.t3);
        let t_fine = var1 + var2;
        (t_fine / 5120.0, t_fine)
    }

    /// Compensated pressure in Pa; `None` when the trimming data would
    /// divide by zero.
    pub fn pressure(&self, adc_p: i32, t_fine: f64) -> Option<f64> {
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * f64::from(self.p6) / 32768.0;
        var2 += var1 * f64::from(self.p5) * 2.0;
        var2 = var2 / 4.0 + f64::from(self.p4) * 65536.0;
        var1 = (f64::from(self.p3) * var1 * var1 / 524_288.0 + f64::from(self.p2) * var1)
            / 524_288.0;
        var1 = (1.0 + var1 / 32768.0) * f64::from(self.p1);
        if var1.abs() < f64::EPSILON {
            return None;
        }
        let mut p = 1_048_576.0 - f64::from(adc_p);
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        let var1 = f64::from(self.p9) * p * p / 2_147_483_648.0;
        let var2 = p * f64::from(self.p8) / 32768.0;
        Some(p + (var1 + var2 + f64::from(self.p7)) / 16.0)
    }
}

/// Unpack the 20-bit pressure and temperature ADC values from 0xF7..0xFC.
pub fn unpack_adc(data: &[u8; 6]) -> (i32, i32) {
    let p = (i32::from(data[0]) << 12) | (i32::from(data[1]) << 4) | (i32::from(data[2]) >> 4);
    let t = (i32::from(data[3]) << 12) | (i32::from(data[4]) << 4) | (i32::from(data[5]) >> 4);
    (p, t)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirReading {
    pub temperature_c: f32,
    pub pressure_hpa: Option<f32>,
}

pub struct Barometer {
    address: u8,
    calibration: Option<Calibration>,
}

impl Barometer {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            calibration: None,
        }
    }

    pub fn begin<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        self.calibration = None;
        let mut id = [0u8; 1];
        if let Err(e) = i2c.write_read(self.address, &[REG_CHIP_ID], &mut id) {
            warn!("BMP280 @0x{:02X}: not detected ({:?})", self.address, e.kind());
            return Err(SensorError::NotDetected);
        }
        if id[0] != CHIP_ID {
            warn!("BMP280 @0x{:02X}: unexpected chip id 0x{:02X}", self.address, id[0]);
            return Err(SensorError::NotDetected);
        }

        let mut raw = [0u8; 24];
        i2c.write_read(self.address, &[REG_CALIB], &mut raw)
            .map_err(|_| SensorError::BusFault)?;
        i2c.write(self.address, &[REG_CONFIG, 0x00])
            .and_then(|()| i2c.write(self.address, &[REG_CTRL_MEAS, CTRL_MEAS_NORMAL]))
            .map_err(|_| SensorError::BusFault)?;

        self.calibration = Some(Calibration::from_registers(&raw));
        info!("BMP280 @0x{:02X}: normal mode", self.address);
        Ok(())
    }

    /// Air temperature (°C) and pressure (hPa); either may be unavailable.
    pub fn read<I: I2c>(&mut self, i2c: &mut I) -> (Option<f32>, Option<f32>) {
        match self.sample(i2c) {
            Ok(air) => (Some(air.temperature_c), air.pressure_hpa),
            Err(e) => {
                debug!("BMP280: {}", e);
                (None, None)
            }
        }
    }

    fn sample<I: I2c>(&mut self, i2c: &mut I) -> Result<AirReading, SensorError> {
        let cal = self.calibration.ok_or(SensorError::NotDetected)?;
        let mut data = [0u8; 6];
        i2c.write_read(self.address, &[REG_DATA], &mut data)
            .map_err(|_| SensorError::BusFault)?;
        let (adc_p, adc_t) = unpack_adc(&data);
        if adc_t == ADC_SKIPPED {
            return Err(SensorError::OutOfRange);
        }
        let (celsius, t_fine) = cal.temperature(adc_t);
        let pressure_hpa = if adc_p == ADC_SKIPPED {
            None
        } else {
            cal.pressure(adc_p, t_fine).map(|pa| (pa / 100.0) as f32)
        };
        Ok(AirReading {
            temperature_c: celsius as f32,
            pressure_hpa,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::sim_i2c::{DATASHEET_CALIBRATION, SimI2cBus};
    use crate::pins::BMP280_ADDR;

    fn datasheet() -> Calibration {
        Calibration::from_registers(&DATASHEET_CALIBRATION)
    }

    #[test]
    fn datasheet_temperature() {
        let (t, _) = datasheet().temperature(519_888);
        assert!((t - 25.08).abs() < 0.01, "got {}", t);
    }

    #[test]
    fn datasheet_pressure() {
        let cal = datasheet();
        let (_, t_fine) = cal.temperature(519_888);
        let p = cal.pressure(415_148, t_fine).unwrap_or_default();
        assert!((p - 100_653.27).abs() < 1.0, "got {}", p);
    }

    #[test]
    fn zero_p1_does_not_divide() {
        let cal = Calibration {
            p1: 0,
            ..datasheet()
        };
        assert_eq!(cal.pressure(415_148, 128_422.0), None);
    }

    #[test]
    fn unpacks_20_bit_values() {
        let (p, t) = unpack_adc(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00]);
        assert_eq!(p, 415_148);
        assert_eq!(t, 519_888);
    }

    #[test]
    fn reads_through_the_bus() {
        let mut bus = SimI2cBus::new();
        let mut baro = Barometer::new(BMP280_ADDR);
        assert!(baro.begin(&mut bus).is_ok());
        assert_eq!(bus.register(BMP280_ADDR, REG_CTRL_MEAS), Some(CTRL_MEAS_NORMAL));
        let (t, p) = baro.read(&mut bus);
        assert!((t.unwrap_or_default() - 25.08).abs() < 0.01);
        assert!((p.unwrap_or_default() - 1006.53).abs() < 0.02);
    }

    #[test]
    fn wrong_chip_id_is_not_detected() {
        let mut bus = SimI2cBus::new();
        bus.set_register(BMP280_ADDR, REG_CHIP_ID, 0x60);
        let mut baro = Barometer::new(BMP280_ADDR);
        assert_eq!(baro.begin(&mut bus), Err(SensorError::NotDetected));
        assert_eq!(baro.read(&mut bus), (None, None));
    }
}
