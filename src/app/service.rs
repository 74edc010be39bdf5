//! Application service — the hexagonal core.
//!
//! [`AppService`] drives the monitoring cycle. It owns its collaborators
//! (handed in at construction) and nothing else survives from one cycle
//! to the next besides the cycle counter and the last observed link.
//!
//! ```text
//!  link check ─▶ acquire ─▶ derive ─▶ classify ─▶ render ─▶ encode ─▶ publish
//!  (1 reconnect)   SensorPort                      DisplayPort        TelemetryPort
//! ```
//!
//! Every stage after the link check runs regardless of what happened to
//! the network, and nothing a collaborator reports can abort the cycle.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::diagnostics::StartupReport;
use crate::metrics::{self, DerivedMetrics};
use crate::reading::RawReading;
use crate::safety::SeverityReport;
use crate::telemetry;

use super::events::{AppEvent, CycleReport, LinkState, PublishOutcome};
use super::ports::{DashboardView, DisplayPort, EventSink, SensorPort, TelemetryPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The cycle orchestrator.
pub struct AppService<S, T, D, E> {
    config: SystemConfig,
    sensors: S,
    telemetry: T,
    display: D,
    sink: E,
    link: LinkState,
    cycle_count: u64,
}

impl<S, T, D, E> AppService<S, T, D, E>
where
    S: SensorPort,
    T: TelemetryPort,
    D: DisplayPort,
    E: EventSink,
{
    /// Construct the service. Config is read-only from here on.
    pub fn new(config: SystemConfig, sensors: S, telemetry: T, display: D, sink: E) -> Self {
        let link = if telemetry.is_connected() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        };
        Self {
            config,
            sensors,
            telemetry,
            display,
            sink,
            link,
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the startup outcome on the diagnostics channel.
    pub fn start(&mut self, report: StartupReport) {
        if report.is_degraded() {
            for (peripheral, err) in report.failed() {
                warn!("Startup: {} unavailable for this run ({})", peripheral, err);
            }
            warn!("AppService started in degraded mode (link={:?})", report.link);
        } else {
            info!("AppService started, all peripherals ready");
        }
        self.sink.emit(&AppEvent::Started(report));
    }

    /// Run cycles back to back with a fixed delay after each.
    ///
    /// `None` runs forever. The delay is not corrected for the time the
    /// cycle itself took.
    pub fn run(&mut self, delay: &mut impl DelayNs, cycles: Option<u64>) {
        let mut remaining = cycles;
        while remaining != Some(0) {
            self.tick();
            delay.delay_ms(self.config.cycle_interval_ms);
            remaining = remaining.map(|n| n - 1);
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full monitoring cycle.
    pub fn tick(&mut self) -> CycleReport {
        self.cycle_count += 1;

        // 1. Broker link: one reconnect attempt, never fatal
        let link = self.check_link();

        // 2. Acquire via SensorPort
        let reading = self.sensors.acquire();
        let missing = reading.unavailable_count();
        if missing > 0 {
            debug!("Cycle {}: {} sensor value(s) unavailable", self.cycle_count, missing);
        }

        // 3. Derive
        let derived = metrics::derive(&reading);

        // 4. Classify (per metric + organism health)
        let severities = SeverityReport::evaluate(
            &self.config.bands,
            &self.config.organism,
            derived.water_temperature_avg,
            reading.ph,
            reading.electrical_conductivity,
        );

        // 5. Render; a broken panel only costs the picture
        let view = DashboardView {
            reading: &reading,
            derived: &derived,
            severities: &severities,
        };
        if let Err(e) = self.display.render(&view) {
            warn!("Display: render failed ({}), continuing", e);
            self.sink.emit(&AppEvent::RenderFailed(e));
        }

        // 6–7. Encode + publish (best-effort)
        let publish = self.publish(&reading, &derived, link);
        if !publish.is_delivered() {
            self.sink.emit(&AppEvent::PublishFailed(publish));
        }

        let report = CycleReport {
            cycle: self.cycle_count,
            reading,
            derived,
            severities,
            link,
            publish,
        };
        self.sink.emit(&AppEvent::Cycle(report));
        report
    }

    // ── Queries ───────────────────────────────────────────────

    /// Total cycles executed since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Broker link as observed by the last cycle.
    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut T {
        &mut self.telemetry
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    // ── Internal ──────────────────────────────────────────────

    fn check_link(&mut self) -> LinkState {
        let connected = self.telemetry.is_connected() || {
            debug!("MQTT: not connected, attempting reconnect");
            let ok = self.telemetry.reconnect();
            if !ok {
                warn!("MQTT: reconnect failed, telemetry for this cycle will be dropped");
            }
            ok
        };
        let link = if connected {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        };
        if link != self.link {
            self.sink.emit(&AppEvent::LinkChanged {
                from: self.link,
                to: link,
            });
            self.link = link;
        }
        link
    }

    fn publish(
        &mut self,
        reading: &RawReading,
        derived: &DerivedMetrics,
        link: LinkState,
    ) -> PublishOutcome {
        let payload = match telemetry::encode(reading, derived) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Telemetry: encode failed ({}), dropping cycle", e);
                return PublishOutcome::EncodeFailed;
            }
        };
        if link == LinkState::Disconnected {
            return PublishOutcome::Offline;
        }
        if self.telemetry.publish(&self.config.network.topic, &payload) {
            PublishOutcome::Published
        } else {
            warn!("MQTT: publish to '{}' refused", self.config.network.topic);
            PublishOutcome::Rejected
        }
    }
}
