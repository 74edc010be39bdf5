//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them (serial log, diagnostics channel).

use crate::diagnostics::StartupReport;
use crate::metrics::DerivedMetrics;
use crate::reading::RawReading;
use crate::safety::SeverityReport;

use super::ports::DisplayError;

/// Connectivity to the telemetry broker, as observed at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// What happened to a cycle's telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Handed to the transport.
    Published,
    /// Connected, but the transport refused the payload.
    Rejected,
    /// No session after the reconnect attempt; telemetry dropped.
    Offline,
    /// The record could not be serialised; telemetry dropped.
    EncodeFailed,
}

impl PublishOutcome {
    pub fn is_delivered(self) -> bool {
        self == Self::Published
    }
}

/// Summary of one monitoring cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle counter since startup.
    pub cycle: u64,
    pub reading: RawReading,
    pub derived: DerivedMetrics,
    pub severities: SeverityReport,
    pub link: LinkState,
    pub publish: PublishOutcome,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The monitor has started (carries the peripheral and network status).
    Started(StartupReport),

    /// The broker link changed between two cycles.
    LinkChanged { from: LinkState, to: LinkState },

    /// A cycle completed.
    Cycle(CycleReport),

    /// The dashboard failed to draw; the cycle carried on.
    RenderFailed(DisplayError),

    /// The cycle's telemetry did not reach the broker.
    PublishFailed(PublishOutcome),
}
