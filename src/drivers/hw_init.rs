//! One-shot hardware peripheral initialization and raw pin access.
//!
//! Configures the ADC channels of the two analog probes and the GPIOs of
//! the ultrasonic sensor and the 1-Wire bus using raw ESP-IDF sys calls.
//! Called once from `main()` before the first cycle.
//!
//! A failure here is reported, never fatal: the caller marks the affected
//! sensors unavailable and the monitor runs degraded.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

/// Which groups of peripherals came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwInitStatus {
    pub adc: Result<(), HwInitError>,
    pub gpio: Result<(), HwInitError>,
}

impl HwInitStatus {
    pub const fn all_ok() -> Self {
        Self {
            adc: Ok(()),
            gpio: Ok(()),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::{info, warn};

#[cfg(target_os = "espidf")]
use crate::pins;

/// Bring up ADC and GPIO. Each group is attempted even if the other fails.
#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> HwInitStatus {
    // SAFETY: Called once from main() before the first cycle; single-threaded.
    let adc = unsafe { init_adc() };
    let gpio = unsafe { init_gpio() };
    if let Err(e) = adc {
        warn!("hw_init: {}", e);
    }
    if let Err(e) = gpio {
        warn!("hw_init: {}", e);
    }
    HwInitStatus { adc, gpio }
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> HwInitStatus {
    log::info!("hw_init(sim): peripheral init skipped");
    HwInitStatus::all_ok()
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for channel in [pins::PH_ADC_CHANNEL, pins::EC_ADC_CHANNEL] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!("hw_init: ADC1 configured (CH7=pH, CH6=EC)");
    Ok(())
}

/// One 12-bit ADC1 sample; `None` when the driver reports an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let handle = unsafe { adc1_handle() };
    if handle.is_null() {
        return None;
    }
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio() -> Result<(), HwInitError> {
    let configs = [
        (pins::TRIG_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
        (pins::ECHO_GPIO, gpio_mode_t_GPIO_MODE_INPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
        // Open-drain with the external 4.7 kΩ pull-up.
        (pins::ONEWIRE_GPIO, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD, gpio_pullup_t_GPIO_PULLUP_ENABLE),
    ];
    for (pin, mode, pull_up_en) in configs {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode,
            pull_up_en,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    unsafe {
        gpio_set_level(pins::TRIG_GPIO, 0);
        gpio_set_level(pins::ONEWIRE_GPIO, 1);
    }
    info!("hw_init: GPIO configured (trig/echo, 1-Wire)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on an already-configured pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as output (or open-drain) in init_gpio().
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(target_os = "espidf")]
pub fn delay_us(us: u32) {
    // SAFETY: ROM busy-wait, no shared state.
    unsafe { esp_rom_delay_us(us) }
}

#[cfg(target_os = "espidf")]
fn now_us() -> i64 {
    // SAFETY: monotonic timer read.
    unsafe { esp_timer_get_time() }
}

/// Length of the next HIGH pulse on `pin` in µs.
///
/// Both the wait for the rising edge and the pulse itself are bounded by
/// `timeout_us`; `None` on timeout.
#[cfg(target_os = "espidf")]
pub fn pulse_in_high(pin: i32, timeout_us: u32) -> Option<u32> {
    let deadline = now_us() + i64::from(timeout_us);
    while !gpio_read(pin) {
        if now_us() > deadline {
            return None;
        }
    }
    let start = now_us();
    while gpio_read(pin) {
        if now_us() > deadline {
            return None;
        }
    }
    u32::try_from(now_us() - start).ok()
}
