//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (ESP-IDF UART in production, stderr on the host). This is
//! the diagnostics channel.

use log::{info, warn};

use crate::app::events::{AppEvent, LinkState, PublishOutcome};
use crate::app::ports::EventSink;
use crate::diagnostics::PeripheralStatus;

/// `12.34` or `--`.
struct V(Option<f32>);

impl core::fmt::Display for V {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.2}", v),
            None => write!(f, "--"),
        }
    }
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Cycle(c) => {
                let r = &c.reading;
                info!(
                    "CYCLE | #{} | T={}/{} avg={}\u{00b0}C | pH={} | EC={}uS/cm | \
                     lux={} | lvl={}cm | air={}\u{00b0}C {}hPa | \
                     O2={}mg/L algae={:?} | \
                     sev T={} pH={} EC={} fish={} score={:?} | link={:?} publish={:?}",
                    c.cycle,
                    V(r.temp_probe_1),
                    V(r.temp_probe_2),
                    V(c.derived.water_temperature_avg),
                    V(r.ph),
                    V(r.electrical_conductivity),
                    V(r.illuminance),
                    V(r.distance_level),
                    V(r.air_temperature),
                    V(r.air_pressure),
                    V(c.derived.estimated_oxygen),
                    c.derived.algae_risk,
                    c.severities.water_temperature,
                    c.severities.ph,
                    c.severities.conductivity,
                    c.severities.organism,
                    c.severities.health_score,
                    c.link,
                    c.publish,
                );
            }
            AppEvent::LinkChanged { from, to } => match to {
                LinkState::Connected => info!("LINK | {:?} -> {:?}", from, to),
                LinkState::Disconnected => warn!("LINK | {:?} -> {:?}", from, to),
            },
            AppEvent::RenderFailed(e) => {
                warn!("RENDER | {}", e);
            }
            AppEvent::PublishFailed(outcome) => match outcome {
                PublishOutcome::Offline => info!("PUBLISH | skipped, offline"),
                other => warn!("PUBLISH | {:?}", other),
            },
            AppEvent::Started(report) => {
                info!(
                    "START | link={:?} degraded={}",
                    report.link,
                    report.is_degraded()
                );
                for (peripheral, status) in report.entries() {
                    match status {
                        PeripheralStatus::Ready => info!("START | {}: ready", peripheral),
                        PeripheralStatus::Partial(why) => {
                            warn!("START | {}: partial ({})", peripheral, why)
                        }
                        PeripheralStatus::Failed(e) => {
                            warn!("START | {}: FAILED ({})", peripheral, e)
                        }
                    }
                }
                for band in &report.malformed_bands {
                    warn!("START | {}; it classifies CRITICAL until fixed", band);
                }
            }
        }
    }
}
