//! Ambient light meter (BH1750) on the shared I2C bus.
//!
//! Runs in continuous high-resolution mode (1 lx, 120 ms). Each read
//! fetches the latest 16-bit count; lux = count / 1.2.
//!
//! The driver borrows the bus per call so the barometer can share it.

use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, info, warn};

use crate::error::SensorError;

pub const OP_POWER_ON: u8 = 0x01;
pub const OP_CONTINUOUS_HIGH_RES: u8 = 0x10;

/// Counts per lux in high-resolution mode.
pub const COUNTS_PER_LUX: f32 = 1.2;

pub fn count_to_lux(count: u16) -> f32 {
    f32::from(count) / COUNTS_PER_LUX
}

pub struct LightMeter {
    address: u8,
    ready: bool,
}

impl LightMeter {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            ready: false,
        }
    }

    /// Power the device on and start continuous measurement.
    pub fn begin<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        let result = i2c
            .write(self.address, &[OP_POWER_ON])
            .and_then(|()| i2c.write(self.address, &[OP_CONTINUOUS_HIGH_RES]));
        match result {
            Ok(()) => {
                self.ready = true;
                info!("BH1750 @0x{:02X}: continuous high-res mode", self.address);
                Ok(())
            }
            Err(e) => {
                self.ready = false;
                warn!("BH1750 @0x{:02X}: not responding ({:?})", self.address, e.kind());
                Err(SensorError::NotDetected)
            }
        }
    }

    pub fn read<I: I2c>(&mut self, i2c: &mut I) -> Option<f32> {
        if !self.ready {
            return None;
        }
        let mut buf = [0u8; 2];
        match i2c.read(self.address, &mut buf) {
            Ok(()) => Some(count_to_lux(u16::from_be_bytes(buf))),
            Err(e) => {
                debug!("BH1750: read failed ({:?})", e.kind());
                None
            }
        }
    }
}
