//! System configuration parameters
//!
//! All tunable parameters for the aquamon basin monitor. Loaded once at
//! startup (NVS blob or defaults) and read-only afterwards.
//! Network defaults are baked in at build time from `AQUAMON_*`
//! environment variables.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::safety::{MetricBands, OrganismBands, ThresholdBand};

/// MQTT topic the basin readings are published to.
pub const DEFAULT_TOPIC: &str = "sensors/bassin/data";

pub type Ssid = heapless::String<32>;
pub type Password = heapless::String<64>;
pub type Host = heapless::String<64>;
pub type DeviceName = heapless::String<32>;
pub type Topic = heapless::String<64>;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Fixed delay between two monitoring cycles (milliseconds)
    pub cycle_interval_ms: u32,
    /// Maximum wait for an ultrasonic echo (microseconds)
    pub echo_timeout_us: u32,

    // --- Thresholds ---
    /// Per-metric survival bands (dashboard bars)
    pub bands: MetricBands,
    /// Survival + comfort limits for the organism-health indicator
    pub organism: OrganismBands,

    // --- Network ---
    pub network: NetworkConfig,
}

/// Credentials and broker coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub wifi_ssid: Ssid,
    pub wifi_password: Password,
    /// Upper bound on the blocking WiFi join at startup (milliseconds)
    pub wifi_connect_timeout_ms: u32,
    pub broker_host: Host,
    pub broker_port: u16,
    /// MQTT client id; derived from the MAC address when empty
    pub device_name: DeviceName,
    pub topic: Topic,
    /// Upper bound on one broker reconnect, WiFi re-join included (milliseconds)
    pub network_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            cycle_interval_ms: 2000,
            echo_timeout_us: 30_000, // ~5 m round trip

            // Thresholds
            bands: MetricBands::DEFAULT,
            organism: OrganismBands::DEFAULT,

            network: NetworkConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: fixed(option_env!("AQUAMON_WIFI_SSID").unwrap_or("")),
            wifi_password: fixed(option_env!("AQUAMON_WIFI_PASS").unwrap_or("")),
            wifi_connect_timeout_ms: 10_000,
            broker_host: fixed(option_env!("AQUAMON_MQTT_HOST").unwrap_or("192.168.1.10")),
            broker_port: option_env!("AQUAMON_MQTT_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1883),
            device_name: fixed(option_env!("AQUAMON_DEVICE_NAME").unwrap_or("")),
            topic: fixed(DEFAULT_TOPIC),
            network_timeout_ms: 1500,
        }
    }
}

/// Copy `s` into a fixed-capacity string, truncating at a char boundary.
pub fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl SystemConfig {
    /// Range-check every field. Used before persisting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_schedule()?;
        for (band, what) in self.named_bands() {
            if !band.is_well_formed() {
                return Err(ConfigError::ValidationFailed(what));
            }
        }
        Ok(())
    }

    /// Range-check everything except the bands. A stored config must pass
    /// this to be used at all; a malformed band only classifies CRITICAL.
    pub fn validate_schedule(&self) -> Result<(), ConfigError> {
        if !(500..=60_000).contains(&self.cycle_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "cycle_interval_ms must be 500–60000",
            ));
        }
        if !(1_000..=60_000).contains(&self.echo_timeout_us) {
            return Err(ConfigError::ValidationFailed(
                "echo_timeout_us must be 1000–60000",
            ));
        }
        // The echo wait must leave room for the rest of the cycle.
        if self.echo_timeout_us / 1000 >= self.cycle_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "echo_timeout_us must be shorter than the cycle interval",
            ));
        }
        let net = &self.network;
        if net.broker_port == 0 {
            return Err(ConfigError::ValidationFailed("broker_port must be non-zero"));
        }
        if net.topic.is_empty() {
            return Err(ConfigError::ValidationFailed("topic must not be empty"));
        }
        if !(1_000..=60_000).contains(&net.wifi_connect_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "wifi_connect_timeout_ms must be 1000–60000",
            ));
        }
        if net.network_timeout_ms == 0 || net.network_timeout_ms >= self.cycle_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "network_timeout_ms must be non-zero and shorter than the cycle interval",
            ));
        }
        Ok(())
    }

    /// Names of bands with `min >= max` or non-finite bounds.
    ///
    /// Such bands are tolerated at runtime (they classify CRITICAL); this
    /// is for startup diagnostics.
    pub fn malformed_bands(&self) -> heapless::Vec<&'static str, 9> {
        self.named_bands()
            .into_iter()
            .filter(|(band, _)| !band.is_well_formed())
            .map(|(_, what)| what)
            .collect()
    }

    fn named_bands(&self) -> [(ThresholdBand, &'static str); 9] {
        let b = &self.bands;
        let s = &self.organism.survival;
        let c = &self.organism.comfort;
        [
            (b.water_temperature, "bands.water_temperature must satisfy min < max"),
            (b.ph, "bands.ph must satisfy min < max"),
            (b.conductivity, "bands.conductivity must satisfy min < max"),
            (s.water_temperature, "organism.survival.water_temperature must satisfy min < max"),
            (s.ph, "organism.survival.ph must satisfy min < max"),
            (s.conductivity, "organism.survival.conductivity must satisfy min < max"),
            (c.water_temperature, "organism.comfort.water_temperature must satisfy min < max"),
            (c.ph, "organism.comfort.ph must satisfy min < max"),
            (c.conductivity, "organism.comfort.conductivity must satisfy min < max"),
        ]
    }
}
