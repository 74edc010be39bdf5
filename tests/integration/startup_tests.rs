//! Startup sequence and end-to-end cycles on the simulated board.

use aquamon::adapters::display::StatusDisplay;
use aquamon::adapters::hardware::HardwareAdapter;
use aquamon::adapters::mqtt::MqttPublisher;
use aquamon::adapters::wifi::{ConnectivityPort, WifiAdapter};
use aquamon::app::events::{AppEvent, LinkState, PublishOutcome};
use aquamon::app::ports::SensorPort;
use aquamon::app::service::AppService;
use aquamon::config::SystemConfig;
use aquamon::diagnostics::{Peripheral, PeripheralStatus, StartupReport};
use aquamon::drivers::sim_i2c::SimI2cBus;
use aquamon::pins;
use aquamon::sensors::SensorHub;
use aquamon::telemetry::TelemetryRecord;

use crate::mock_hw::{RecordingDelay, RecordingSink, journal};

fn board(bus: SimI2cBus) -> (HardwareAdapter<SimI2cBus>, StartupReport) {
    let mut hw = HardwareAdapter::new(SensorHub::new(bus, 30_000));
    let mut report = StartupReport::new();
    hw.init(&mut report);
    (hw, report)
}

/// Short network timeouts so reconnects on the host don't sleep.
fn test_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.network.network_timeout_ms = 0;
    config
}

fn joined_wifi() -> WifiAdapter {
    let mut wifi = WifiAdapter::new();
    wifi.set_credentials("greenhouse", "tilapia-2024").unwrap();
    let j = journal();
    let link = wifi.connect_within(1000, &mut RecordingDelay::new(&j));
    assert_eq!(link, LinkState::Connected);
    wifi
}

// ── Peripheral bring-up ───────────────────────────────────────

#[test]
fn simulated_board_reports_every_sensor_ready() {
    let (_, report) = board(SimI2cBus::new());
    for p in [
        Peripheral::WaterProbes,
        Peripheral::PhProbe,
        Peripheral::EcProbe,
        Peripheral::LightMeter,
        Peripheral::Ultrasonic,
        Peripheral::Barometer,
    ] {
        assert_eq!(report.status(p), Some(PeripheralStatus::Ready), "{}", p);
    }
    assert_eq!(report.failed().count(), 0);
}

#[test]
fn missing_barometer_degrades_but_other_sensors_read() {
    let mut bus = SimI2cBus::new();
    bus.detach(pins::BMP280_ADDR);
    let (mut hw, report) = board(bus);

    assert!(matches!(
        report.status(Peripheral::Barometer),
        Some(PeripheralStatus::Failed(_))
    ));
    assert!(report.is_degraded());

    let reading = hw.acquire();
    assert_eq!(reading.air_temperature, None);
    assert_eq!(reading.air_pressure, None);
    assert!(reading.illuminance.is_some());
    assert!(reading.ph.is_some());
}

#[test]
fn simulated_board_reads_plausible_values() {
    let (mut hw, _) = board(SimI2cBus::new());
    let reading = hw.acquire();

    let ph = reading.ph.unwrap();
    assert!((0.0..=14.0).contains(&ph));
    let pressure = reading.air_pressure.unwrap();
    assert!((900.0..=1100.0).contains(&pressure), "{}", pressure);
    let lux = reading.illuminance.unwrap();
    assert!((lux - 300.0).abs() < 0.5, "{}", lux);
    assert!(reading.distance_level.unwrap() > 0.0);
}

// ── End to end ────────────────────────────────────────────────

#[test]
fn full_stack_cycle_draws_and_publishes() {
    let config = test_config();
    let (hw, mut report) = board(SimI2cBus::new());

    let mut display = StatusDisplay::new(String::new(), config.bands);
    display.begin().unwrap();

    let mut mqtt = MqttPublisher::new(&config.network, joined_wifi());
    report.link = mqtt.start();
    assert_eq!(report.link, LinkState::Connected);

    let mut app = AppService::new(config, hw, mqtt, display, RecordingSink::default());
    app.start(report);
    let cycle = app.tick();

    assert_eq!(cycle.publish, PublishOutcome::Published);
    assert!(matches!(app.sink().events[0], AppEvent::Started(_)));

    let published = app.telemetry().sim_published();
    assert_eq!(published.len(), 1);
    let record = TelemetryRecord::from_bytes(&published[0].1).unwrap();
    assert_eq!(record.temp_water, cycle.derived.water_temperature_avg);
    assert!(record.pressure.is_some());

    let screen = app.display().output();
    assert!(screen.starts_with("AQUAPONICS starting"));
    assert!(screen.contains("fish:"));
    assert!(app.display().last_frame().is_some());
}

#[test]
fn broker_outage_drops_telemetry_then_recovers() {
    let config = test_config();
    let (hw, mut report) = board(SimI2cBus::new());

    let mut mqtt = MqttPublisher::new(&config.network, joined_wifi());
    mqtt.sim_set_broker_reachable(false);
    report.link = mqtt.start();
    assert_eq!(report.link, LinkState::Disconnected);

    let mut display = StatusDisplay::new(String::new(), config.bands);
    display.begin().unwrap();
    let mut app = AppService::new(config, hw, mqtt, display, RecordingSink::default());
    app.start(report);

    let down = app.tick();
    assert_eq!(down.publish, PublishOutcome::Offline);
    assert!(app.telemetry().sim_published().is_empty());

    app.telemetry_mut().sim_set_broker_reachable(true);
    let up = app.tick();
    assert_eq!(up.link, LinkState::Connected);
    assert_eq!(up.publish, PublishOutcome::Published);
    assert_eq!(app.telemetry().sim_published().len(), 1);
}

#[test]
fn dark_display_does_not_block_the_cycle() {
    let config = test_config();
    let (hw, _) = board(SimI2cBus::new());
    let mqtt = MqttPublisher::new(&config.network, joined_wifi());
    // begin() never called: the panel stays dark.
    let display = StatusDisplay::new(String::new(), config.bands);

    let mut app = AppService::new(config, hw, mqtt, display, RecordingSink::default());
    let cycle = app.tick();

    assert_eq!(cycle.publish, PublishOutcome::Published);
    assert!(
        app.sink()
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::RenderFailed(_)))
    );
    assert!(app.display().output().is_empty());
}
