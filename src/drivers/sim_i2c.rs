//! Host-side I2C bus with a BH1750 and a BMP280 attached.
//!
//! Register-level enough for the real drivers to run unchanged: the
//! BH1750 honours its opcodes, the BMP280 exposes a register file with
//! the datasheet's example trimming parameters and only publishes
//! measurements once put in normal mode.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::pins::{BH1750_ADDR, BMP280_ADDR};

/// Trimming registers 0x88..0x9F from the BMP280 datasheet example (§8.2).
pub const DATASHEET_CALIBRATION: [u8; 24] = [
    0x70, 0x6B, // T1 = 27504
    0x43, 0x67, // T2 = 26435
    0x18, 0xFC, // T3 = -1000
    0x7D, 0x8E, // P1 = 36477
    0x43, 0xD6, // P2 = -10685
    0xD0, 0x0B, // P3 = 3024
    0x27, 0x0B, // P4 = 2855
    0x8C, 0x00, // P5 = 140
    0xF9, 0xFF, // P6 = -7
    0x8C, 0x3C, // P7 = 15500
    0xF8, 0xC6, // P8 = -14600
    0x70, 0x17, // P9 = 6000
];

/// Datasheet example raw values: 25.08 °C, 1006.53 hPa.
pub const DATASHEET_ADC_T: i32 = 519_888;
pub const DATASHEET_ADC_P: i32 = 415_148;

struct LightMeterModel {
    present: bool,
    powered: bool,
    measuring: bool,
    count: u16,
}

impl LightMeterModel {
    fn command(&mut self, opcode: u8) {
        match opcode {
            0x00 => {
                self.powered = false;
                self.measuring = false;
            }
            0x01 => self.powered = true,
            0x10..=0x13 | 0x20..=0x23 if self.powered => self.measuring = true,
            _ => {}
        }
    }
}

struct BarometerModel {
    present: bool,
    regs: [u8; 256],
    pointer: u8,
    adc_t: i32,
    adc_p: i32,
}

impl BarometerModel {
    fn new() -> Self {
        let mut regs = [0u8; 256];
        regs[0xD0] = 0x58;
        regs[0x88..0x88 + 24].copy_from_slice(&DATASHEET_CALIBRATION);
        // Reset value of the data registers: measurement skipped.
        regs[0xF7] = 0x80;
        regs[0xFA] = 0x80;
        Self {
            present: true,
            regs,
            pointer: 0,
            adc_t: DATASHEET_ADC_T,
            adc_p: DATASHEET_ADC_P,
        }
    }

    fn normal_mode(&self) -> bool {
        self.regs[0xF4] & 0x03 == 0x03
    }

    fn latch(&mut self) {
        if !self.normal_mode() {
            return;
        }
        let pack = |v: i32| [(v >> 12) as u8, (v >> 4) as u8, ((v & 0x0F) << 4) as u8];
        self.regs[0xF7..0xFA].copy_from_slice(&pack(self.adc_p));
        self.regs[0xFA..0xFD].copy_from_slice(&pack(self.adc_t));
    }

    fn write(&mut self, bytes: &[u8]) {
        if let [reg] = bytes {
            self.pointer = *reg;
            return;
        }
        for pair in bytes.chunks_exact(2) {
            self.regs[usize::from(pair[0])] = pair[1];
            self.pointer = pair[0];
        }
        self.latch();
    }

    fn read(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.regs[usize::from(self.pointer)];
            self.pointer = self.pointer.wrapping_add(1);
        }
    }
}

/// In-memory I2C bus for host builds and tests.
pub struct SimI2cBus {
    light: LightMeterModel,
    baro: BarometerModel,
}

impl SimI2cBus {
    pub fn new() -> Self {
        Self {
            light: LightMeterModel {
                present: true,
                powered: false,
                measuring: false,
                count: 360, // 300 lx
            },
            baro: BarometerModel::new(),
        }
    }

    pub fn set_lux(&mut self, lux: f32) {
        self.light.count = (lux * 1.2).round().clamp(0.0, f32::from(u16::MAX)) as u16;
    }

    /// Set the raw 20-bit BMP280 temperature and pressure samples.
    pub fn set_air_adc(&mut self, adc_t: i32, adc_p: i32) {
        self.baro.adc_t = adc_t;
        self.baro.adc_p = adc_p;
        self.baro.latch();
    }

    /// Remove a device from the bus; it NACKs its address from now on.
    pub fn detach(&mut self, address: u8) {
        match address {
            BH1750_ADDR => self.light.present = false,
            BMP280_ADDR => self.baro.present = false,
            _ => {}
        }
    }

    pub fn register(&self, address: u8, reg: u8) -> Option<u8> {
        (address == BMP280_ADDR).then(|| self.baro.regs[usize::from(reg)])
    }

    pub fn set_register(&mut self, address: u8, reg: u8, value: u8) {
        if address == BMP280_ADDR {
            self.baro.regs[usize::from(reg)] = value;
        }
    }
}

impl Default for SimI2cBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for SimI2cBus {
    type Error = ErrorKind;
}

impl I2c for SimI2cBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        match address {
            BH1750_ADDR if self.light.present => {
                for op in operations {
                    match op {
                        Operation::Write(bytes) => {
                            bytes.iter().for_each(|&b| self.light.command(b));
                        }
                        Operation::Read(buf) => {
                            let count = if self.light.measuring { self.light.count } else { 0 };
                            let be = count.to_be_bytes();
                            for (dst, src) in buf.iter_mut().zip(be.iter().cycle()) {
                                *dst = *src;
                            }
                        }
                    }
                }
                Ok(())
            }
            BMP280_ADDR if self.baro.present => {
                for op in operations {
                    match op {
                        Operation::Write(bytes) => self.baro.write(bytes),
                        Operation::Read(buf) => self.baro.read(buf),
                    }
                }
                Ok(())
            }
            _ => Err(nack),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_address_nacks() {
        let mut bus = SimI2cBus::new();
        let err = bus.write(0x40, &[0x00]);
        assert_eq!(err, Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)));
    }

    #[test]
    fn light_meter_reads_zero_until_measuring() {
        let mut bus = SimI2cBus::new();
        let mut buf = [0xFFu8; 2];
        assert!(bus.read(BH1750_ADDR, &mut buf).is_ok());
        assert_eq!(buf, [0, 0]);
        assert!(bus.write(BH1750_ADDR, &[0x01]).is_ok());
        assert!(bus.write(BH1750_ADDR, &[0x10]).is_ok());
        assert!(bus.read(BH1750_ADDR, &mut buf).is_ok());
        assert_eq!(u16::from_be_bytes(buf), 360);
    }

    #[test]
    fn barometer_data_latches_in_normal_mode() {
        let mut bus = SimI2cBus::new();
        let mut data = [0u8; 6];
        assert!(bus.write_read(BMP280_ADDR, &[0xF7], &mut data).is_ok());
        assert_eq!(data[0], 0x80);
        assert!(bus.write(BMP280_ADDR, &[0xF4, 0xB7]).is_ok());
        assert!(bus.write_read(BMP280_ADDR, &[0xF7], &mut data).is_ok());
        assert_eq!(data, [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00]);
    }
}
