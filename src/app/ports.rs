//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   SensorPort ──▶ AppService ──▶ TelemetryPort
//!                      │
//!                      ├────────▶ DisplayPort
//!                      └────────▶ EventSink
//! ```
//!
//! Adapters implement these traits and are handed to the
//! [`AppService`](super::service::AppService) at construction, so the
//! domain core never touches a peripheral or a global handle directly.
//!
//! None of the runtime ports may block past a bounded timeout, and none
//! of them report transient failure by panicking: sensors return `None`,
//! transports return `false`, the display returns a typed error.

use core::fmt;

use crate::config::SystemConfig;
use crate::metrics::DerivedMetrics;
use crate::reading::RawReading;
use crate::safety::SeverityReport;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one call per sensor type per cycle.
///
/// Every method yields either a value or `None` for "unavailable".
pub trait SensorPort {
    /// Both DS18B20 water probes, in bus index order.
    fn read_water_temperatures(&mut self) -> (Option<f32>, Option<f32>);

    /// Water pH.
    fn read_ph(&mut self) -> Option<f32>;

    /// Electrical conductivity (µS/cm).
    fn read_conductivity(&mut self) -> Option<f32>;

    /// Ambient light (lux).
    fn read_illuminance(&mut self) -> Option<f32>;

    /// Distance to the water surface (cm). Bounded by the echo timeout.
    fn read_distance_level(&mut self) -> Option<f32>;

    /// Air temperature (°C) and barometric pressure (hPa).
    fn read_air(&mut self) -> (Option<f32>, Option<f32>);

    /// Read every sensor exactly once and assemble the cycle snapshot.
    fn acquire(&mut self) -> RawReading {
        let (temp_probe_1, temp_probe_2) = self.read_water_temperatures();
        let ph = self.read_ph();
        let electrical_conductivity = self.read_conductivity();
        let illuminance = self.read_illuminance();
        let distance_level = self.read_distance_level();
        let (air_temperature, air_pressure) = self.read_air();
        RawReading {
            temp_probe_1,
            temp_probe_2,
            ph,
            electrical_conductivity,
            illuminance,
            distance_level,
            air_temperature,
            air_pressure,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (driven adapter: domain → broker)
// ───────────────────────────────────────────────────────────────

/// Best-effort publisher for the telemetry channel.
pub trait TelemetryPort {
    /// Whether the broker session is currently up.
    fn is_connected(&self) -> bool;

    /// Make exactly one attempt to (re)establish the session.
    fn reconnect(&mut self) -> bool;

    /// Fire-and-forget publish. `false` means the payload was not handed
    /// to the transport; it is never queued for later.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → dashboard)
// ───────────────────────────────────────────────────────────────

/// Everything the dashboard needs for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct DashboardView<'a> {
    pub reading: &'a RawReading,
    pub derived: &'a DerivedMetrics,
    pub severities: &'a SeverityReport,
}

/// Draws the cycle's classified values.
pub trait DisplayPort {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<(), DisplayError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting: invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists, and
    /// rejects a stored config whose timing or network fields are out of
    /// range. Malformed bands are passed through.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`DisplayPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// The panel never came up at boot.
    NotInitialised,
    /// A write to the panel failed.
    Bus,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialised => write!(f, "display not initialised"),
            Self::Bus => write!(f, "display bus error"),
        }
    }
}
