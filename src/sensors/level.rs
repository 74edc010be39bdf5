//! Ultrasonic distance-to-surface sensor (HC-SR04).
//!
//! A 10 µs trigger pulse starts a measurement; the echo pin is then held
//! HIGH for the round-trip time. Distance = echo µs × 0.034 / 2 cm.
//! No echo within the timeout means no reading, never a zero distance.
//!
//! On ESP-IDF: bit-timed GPIO via hw_init. On host/test: the echo
//! duration comes from a static atomic (0 = no echo).

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Speed of sound in cm/µs at ~20 °C.
pub const SOUND_CM_PER_US: f32 = 0.034;

#[cfg(not(target_os = "espidf"))]
static SIM_ECHO_US: AtomicU32 = AtomicU32::new(2353);

/// Inject the next echo duration in µs; 0 simulates a timeout.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_echo_us(us: u32) {
    SIM_ECHO_US.store(us, Ordering::Relaxed);
}

/// Echo round-trip time → one-way distance in cm.
///
/// `None` when there was no echo or it exceeded `timeout_us`.
pub fn echo_to_cm(echo_us: u32, timeout_us: u32) -> Option<f32> {
    if echo_us == 0 || echo_us > timeout_us {
        return None;
    }
    Some(echo_us as f32 * SOUND_CM_PER_US / 2.0)
}

pub struct UltrasonicLevel {
    echo_timeout_us: u32,
    enabled: bool,
}

impl UltrasonicLevel {
    pub fn new(echo_timeout_us: u32) -> Self {
        Self {
            echo_timeout_us,
            enabled: true,
        }
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
        let echo = self.measure_echo()?;
        echo_to_cm(echo, self.echo_timeout_us)
    }

    #[cfg(target_os = "espidf")]
    fn measure_echo(&self) -> Option<u32> {
        hw_init::gpio_write(pins::TRIG_GPIO, false);
        hw_init::delay_us(2);
        hw_init::gpio_write(pins::TRIG_GPIO, true);
        hw_init::delay_us(10);
        hw_init::gpio_write(pins::TRIG_GPIO, false);
        hw_init::pulse_in_high(pins::ECHO_GPIO, self.echo_timeout_us)
    }

    #[cfg(not(target_os = "espidf"))]
    fn measure_echo(&self) -> Option<u32> {
        match SIM_ECHO_US.load(Ordering::Relaxed) {
            0 => None,
            us => Some(us),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_metre_round_trip() {
        // 5882 µs round trip ≈ 100 cm
        let cm = echo_to_cm(5882, 30_000).unwrap_or_default();
        assert!((cm - 99.99).abs() < 0.05, "got {}", cm);
    }

    #[test]
    fn no_echo_is_unavailable_not_zero() {
        assert_eq!(echo_to_cm(0, 30_000), None);
    }

    #[test]
    fn echo_beyond_timeout_is_unavailable() {
        assert_eq!(echo_to_cm(30_001, 30_000), None);
        assert!(echo_to_cm(30_000, 30_000).is_some());
    }

    #[test]
    fn disabled_sensor_reads_nothing() {
        let mut level = UltrasonicLevel::new(30_000);
        level.disable();
        assert_eq!(level.read(), None);
    }
}
