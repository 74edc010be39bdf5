//! Aquamon Firmware — Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HardwareAdapter   MqttPublisher   StatusDisplay  LogEventSink│
//! │  (SensorPort)      (TelemetryPort) (DisplayPort)  (EventSink) │
//! │  NvsAdapter        WifiAdapter     SystemDelay                │
//! │  (ConfigPort)      (Connectivity)  (DelayNs)                  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  AppService: acquire · derive · classify · render ·    │  │
//! │  │              publish, every cycle_interval_ms          │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Startup never aborts on a missing peripheral or network: whatever
//! failed is listed in the startup report and the loop runs degraded.

#![deny(unused_must_use)]

use anyhow::Result;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use aquamon::adapters::display::{SerialConsole, StatusDisplay};
use aquamon::adapters::hardware::HardwareAdapter;
use aquamon::adapters::log_sink::LogEventSink;
use aquamon::adapters::mqtt::MqttPublisher;
use aquamon::adapters::nvs::NvsAdapter;
use aquamon::adapters::time::SystemDelay;
use aquamon::adapters::wifi::{ConnectivityPort, WifiAdapter};
use aquamon::app::events::LinkState;
use aquamon::app::ports::ConfigPort;
use aquamon::app::service::AppService;
use aquamon::config::SystemConfig;
use aquamon::diagnostics::{Peripheral, PeripheralStatus, StartupReport};
use aquamon::error::{CommsError, Error};
use aquamon::sensors::SensorHub;

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::EspWifi;

    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    banner();

    let config = load_config();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // SDA = GPIO21, SCL = GPIO22 (see pins.rs)
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(aquamon::pins::I2C_FREQ_HZ)),
    )?;
    let wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition))?);

    run(config, i2c, wifi, None)
}

#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use aquamon::drivers::sim_i2c::SimI2cBus;

    tracing_subscriber::fmt().init();
    banner();

    let config = load_config();
    // Bounded runs for host demos.
    let cycles = std::env::var("AQUAMON_CYCLES").ok().and_then(|v| v.parse().ok());
    run(config, SimI2cBus::new(), WifiAdapter::new(), cycles)
}

fn banner() {
    info!("╔══════════════════════════════════════╗");
    info!("║  Aquamon v{:<27}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
}

/// Stored config, or defaults when there is none or it cannot be read.
fn load_config() -> SystemConfig {
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            return SystemConfig::default();
        }
    };
    match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

fn run<I: I2c>(config: SystemConfig, i2c: I, mut wifi: WifiAdapter, cycles: Option<u64>) -> Result<()> {
    let mut delay = SystemDelay::new();
    let mut report = StartupReport::new();
    report.malformed_bands = config.malformed_bands();

    // ── Sensors ───────────────────────────────────────────────
    let mut hardware = HardwareAdapter::new(SensorHub::new(i2c, config.echo_timeout_us));
    hardware.init(&mut report);

    // ── Dashboard ─────────────────────────────────────────────
    let mut display = StatusDisplay::new(SerialConsole, config.bands);
    let status = match display.begin() {
        Ok(()) => PeripheralStatus::Ready,
        Err(_) => PeripheralStatus::Failed(Error::Init("display")),
    };
    report.record(Peripheral::Display, status);

    // ── WiFi (bounded join) ───────────────────────────────────
    let net = &config.network;
    let joined = match wifi.set_credentials(&net.wifi_ssid, &net.wifi_password) {
        Ok(()) => wifi.connect_within(net.wifi_connect_timeout_ms, &mut delay),
        Err(e) => {
            warn!("WiFi: {}", e);
            LinkState::Disconnected
        }
    };
    let status = match joined {
        LinkState::Connected => PeripheralStatus::Ready,
        LinkState::Disconnected => PeripheralStatus::Failed(CommsError::WifiConnectFailed.into()),
    };
    report.record(Peripheral::Wifi, status);

    // ── MQTT ──────────────────────────────────────────────────
    let mut mqtt = MqttPublisher::new(net, wifi);
    report.link = mqtt.start();

    let mut app = AppService::new(config, hardware, mqtt, display, LogEventSink::new());
    app.start(report);
    app.run(&mut delay, cycles);

    info!("Stopped after {} cycles", app.cycle_count());
    Ok(())
}
