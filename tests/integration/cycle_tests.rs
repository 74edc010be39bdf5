//! Full-cycle behaviour of `AppService` against mock collaborators.

use aquamon::app::events::{AppEvent, LinkState, PublishOutcome};
use aquamon::app::service::AppService;
use aquamon::config::{DEFAULT_TOPIC, SystemConfig};
use aquamon::metrics::AlgaeRisk;
use aquamon::reading::RawReading;
use aquamon::safety::Severity;
use aquamon::telemetry::TelemetryRecord;

use crate::mock_hw::{
    Journal, MockBroker, MockDisplay, RecordingDelay, RecordingSink, ScriptedSensors, Step, count,
    journal, nominal_reading, position,
};

type App = AppService<ScriptedSensors, MockBroker, MockDisplay, RecordingSink>;

fn app_with(reading: RawReading, broker: MockBroker, display: MockDisplay, j: &Journal) -> App {
    AppService::new(
        SystemConfig::default(),
        ScriptedSensors::new(reading, j),
        broker,
        display,
        RecordingSink::default(),
    )
}

fn nominal_app(j: &Journal) -> App {
    app_with(nominal_reading(), MockBroker::up(j), MockDisplay::new(j), j)
}

// ── Nominal cycle ─────────────────────────────────────────────

#[test]
fn nominal_cycle_averages_classifies_and_publishes() {
    let j = journal();
    let mut app = nominal_app(&j);

    let report = app.tick();

    assert_eq!(report.derived.water_temperature_avg, Some(25.0));
    assert_eq!(report.severities.water_temperature, Severity::Normal);
    assert_eq!(report.severities.ph, Severity::Normal);
    assert_eq!(report.severities.conductivity, Severity::Normal);
    assert_eq!(report.severities.organism, Severity::Normal);
    assert_eq!(report.link, LinkState::Connected);
    assert_eq!(report.publish, PublishOutcome::Published);

    let (topic, payload) = &app.telemetry().published[0];
    assert_eq!(topic, DEFAULT_TOPIC);
    let record = TelemetryRecord::from_bytes(payload).unwrap();
    assert_eq!(record.temp_water, Some(25.0));
    assert_eq!(record.temp_water_1, Some(24.0));
    assert_eq!(record.ec, Some(900.0));
}

#[test]
fn pond_indicators_stay_off_the_wire() {
    let j = journal();
    let mut app = nominal_app(&j);

    let report = app.tick();

    assert!(report.derived.estimated_oxygen.is_some_and(|o2| o2 > 7.0 && o2 < 8.0));
    assert_eq!(report.derived.algae_risk, Some(AlgaeRisk::Low));
    assert_eq!(report.severities.health_score, Some(100));

    let (_, payload) = &app.telemetry().published[0];
    let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
    assert_eq!(value.as_object().map(|o| o.len()), Some(9));
}

#[test]
fn every_sensor_is_read_exactly_once_per_cycle() {
    let j = journal();
    let mut app = nominal_app(&j);
    app.tick();
    for step in [
        Step::ReadWater,
        Step::ReadPh,
        Step::ReadEc,
        Step::ReadLux,
        Step::ReadLevel,
        Step::ReadAir,
    ] {
        assert_eq!(count(&j, &step), 1, "{:?}", step);
    }
}

#[test]
fn cycle_order_is_acquire_render_publish_then_sleep() {
    let j = journal();
    let mut app = nominal_app(&j);
    let mut delay = RecordingDelay::new(&j);

    app.run(&mut delay, Some(1));

    let read = position(&j, &Step::ReadAir).unwrap();
    let render = position(&j, &Step::Render).unwrap();
    let publish = position(&j, &Step::Publish).unwrap();
    let sleep = position(&j, &Step::Delay(2000)).unwrap();
    assert!(read < render && render < publish && publish < sleep);
}

#[test]
fn cycle_event_is_emitted_last() {
    let j = journal();
    let mut app = nominal_app(&j);
    app.tick();
    match app.sink().events.last() {
        Some(AppEvent::Cycle(c)) => assert_eq!(c.cycle, 1),
        other => panic!("expected Cycle event, got {:?}", other),
    }
}

// ── Broker down ───────────────────────────────────────────────

#[test]
fn failed_reconnect_still_completes_the_cycle() {
    let j = journal();
    let mut app = app_with(
        nominal_reading(),
        MockBroker::unreachable(&j),
        MockDisplay::new(&j),
        &j,
    );
    let mut delay = RecordingDelay::new(&j);

    app.run(&mut delay, Some(2));

    assert_eq!(app.cycle_count(), 2);
    assert_eq!(count(&j, &Step::Reconnect), 2, "one reconnect attempt per cycle");
    assert_eq!(count(&j, &Step::Render), 2, "render still invoked");
    assert_eq!(count(&j, &Step::Publish), 0);
    assert_eq!(count(&j, &Step::Delay(2000)), 2, "fixed interval after each cycle");
    assert_eq!(app.display().frames.len(), 2);

    let offline = app
        .sink()
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::PublishFailed(PublishOutcome::Offline)))
        .count();
    assert_eq!(offline, 2);
}

#[test]
fn offline_cycle_reports_offline_but_keeps_classifying() {
    let j = journal();
    let mut app = app_with(
        nominal_reading(),
        MockBroker::unreachable(&j),
        MockDisplay::new(&j),
        &j,
    );
    let report = app.tick();
    assert_eq!(report.link, LinkState::Disconnected);
    assert_eq!(report.publish, PublishOutcome::Offline);
    assert_eq!(report.severities.overall, Severity::Normal);
}

#[test]
fn successful_reconnect_publishes_and_reports_link_change() {
    let j = journal();
    let mut app = app_with(
        nominal_reading(),
        MockBroker::recovering(&j),
        MockDisplay::new(&j),
        &j,
    );
    let report = app.tick();
    assert_eq!(report.link, LinkState::Connected);
    assert_eq!(report.publish, PublishOutcome::Published);
    assert_eq!(app.link(), LinkState::Connected);
    assert!(app.sink().events.iter().any(|e| matches!(
        e,
        AppEvent::LinkChanged {
            from: LinkState::Disconnected,
            to: LinkState::Connected
        }
    )));
    // Already up on the next cycle: no second attempt.
    app.tick();
    assert_eq!(count(&j, &Step::Reconnect), 1);
}

#[test]
fn refused_publish_is_reported_not_raised() {
    let j = journal();
    let mut broker = MockBroker::up(&j);
    broker.accept = false;
    let mut app = app_with(nominal_reading(), broker, MockDisplay::new(&j), &j);

    let report = app.tick();
    assert_eq!(report.publish, PublishOutcome::Rejected);
    assert!(
        app.sink()
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::PublishFailed(PublishOutcome::Rejected)))
    );
}

// ── Display failure ───────────────────────────────────────────

#[test]
fn render_failure_does_not_stop_publish() {
    let j = journal();
    let mut app = app_with(
        nominal_reading(),
        MockBroker::up(&j),
        MockDisplay::broken(&j),
        &j,
    );
    let report = app.tick();
    assert_eq!(report.publish, PublishOutcome::Published);
    assert!(
        app.sink()
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::RenderFailed(_)))
    );
}

// ── Unavailable and out-of-range values ───────────────────────

#[test]
fn missing_probe_makes_temperature_unavailable_and_critical() {
    let j = journal();
    let reading = RawReading {
        temp_probe_2: None,
        ..nominal_reading()
    };
    let mut app = app_with(reading, MockBroker::up(&j), MockDisplay::new(&j), &j);

    let report = app.tick();
    assert_eq!(report.derived.water_temperature_avg, None);
    assert_eq!(report.severities.water_temperature, Severity::Critical);
    assert_eq!(report.severities.organism, Severity::Critical);

    let payload = &app.telemetry().published[0].1;
    let json = core::str::from_utf8(payload).unwrap();
    assert!(json.contains("\"temp_water\":null"), "{}", json);
    assert!(json.contains("\"temp_water_2\":null"), "{}", json);
    assert!(json.contains("\"temp_water_1\":24"), "{}", json);
}

#[test]
fn acidic_water_is_critical_for_the_fish_regardless_of_the_rest() {
    let j = journal();
    let reading = RawReading {
        temp_probe_1: Some(22.0),
        temp_probe_2: Some(22.0),
        ph: Some(5.5),
        electrical_conductivity: Some(900.0),
        ..nominal_reading()
    };
    let mut app = app_with(reading, MockBroker::up(&j), MockDisplay::new(&j), &j);
    let report = app.tick();
    assert_eq!(report.severities.organism, Severity::Critical);
    assert_eq!(report.severities.ph, Severity::Critical);
    assert_eq!(report.severities.overall, Severity::Critical);
}

#[test]
fn display_receives_the_cycle_severities() {
    let j = journal();
    let mut app = nominal_app(&j);
    let report = app.tick();
    let (reading, severities) = app.display().frames[0];
    assert_eq!(reading, report.reading);
    assert_eq!(severities, report.severities);
}

#[test]
fn cycles_are_independent() {
    let j = journal();
    let mut app = nominal_app(&j);
    let first = app.tick();
    let second = app.tick();
    assert_eq!(first.reading, second.reading);
    assert_eq!(first.severities, second.severities);
    assert_eq!(second.cycle, first.cycle + 1);
}
