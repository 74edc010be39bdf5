//! GPIO / peripheral pin assignments for the basin monitor board (ESP32).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// TFT (ST7735, SPI)
// ---------------------------------------------------------------------------

pub const TFT_CS_GPIO: i32 = 15;
pub const TFT_DC_GPIO: i32 = 2;
pub const TFT_RST_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Water temperature — two DS18B20 on one 1-Wire bus (4.7 kΩ pull-up)
// ---------------------------------------------------------------------------

pub const ONEWIRE_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Ultrasonic level sensor (HC-SR04)
// ---------------------------------------------------------------------------

/// Digital output: 10 µs HIGH pulse starts a measurement.
pub const TRIG_GPIO: i32 = 25;
/// Digital input: HIGH for the echo round-trip time.
pub const ECHO_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Analog probes (ADC1, 12-bit, 11 dB attenuation)
// ---------------------------------------------------------------------------

/// pH probe amplifier output. GPIO 35 = ADC1 channel 7.
pub const PH_ADC_GPIO: i32 = 35;
pub const PH_ADC_CHANNEL: u32 = 7;

/// EC probe amplifier output. GPIO 34 = ADC1 channel 6.
pub const EC_ADC_GPIO: i32 = 34;
pub const EC_ADC_CHANNEL: u32 = 6;

// ---------------------------------------------------------------------------
// I2C bus (BH1750 light meter, BMP280 barometer)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_FREQ_HZ: u32 = 100_000;

/// BH1750 with ADDR pin low.
pub const BH1750_ADDR: u8 = 0x23;
/// BMP280 with SDO pin low.
pub const BMP280_ADDR: u8 = 0x76;
