//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the boundary for network
//! connectivity underneath the MQTT publisher.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: a simulated access point for host-side tests.
//!
//! ## Startup join
//!
//! [`ConnectivityPort::connect_within`] polls association for at most the
//! configured timeout and then gives up, so the monitor starts offline
//! instead of hanging at boot.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::app::events::LinkState;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

/// Poll period while waiting for association.
pub const JOIN_POLL_MS: u32 = 500;

pub trait ConnectivityPort {
    /// Start joining the configured network. Returns once the attempt is
    /// under way; association completes asynchronously.
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Refresh the link state from the driver.
    fn poll(&mut self);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;

    /// Join and wait for association, giving up after `timeout_ms`.
    fn connect_within(&mut self, timeout_ms: u32, delay: &mut impl DelayNs) -> LinkState {
        if self.is_connected() {
            return LinkState::Connected;
        }
        if let Err(e) = self.connect() {
            warn!("WiFi: join not started ({})", e);
            return LinkState::Disconnected;
        }
        let mut waited = 0u32;
        loop {
            self.poll();
            if self.is_connected() {
                return LinkState::Connected;
            }
            if waited >= timeout_ms {
                warn!("WiFi: no association after {} ms, starting offline", timeout_ms);
                return LinkState::Disconnected;
            }
            let step = JOIN_POLL_MS.min(timeout_ms - waited);
            delay.delay_ms(step);
            waited += step;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Simulated access point (host)
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy)]
struct SimAccessPoint {
    reachable: bool,
    /// Polls an association takes to complete.
    join_polls: u32,
    polls_left: u32,
    associated: bool,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    driver: EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimAccessPoint,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(driver: EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            last_rssi: None,
            driver,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            last_rssi: None,
            sim: SimAccessPoint {
                reachable: true,
                join_polls: 1,
                polls_left: 0,
                associated: false,
            },
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Simulation: whether the access point answers association requests.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_reachable(&mut self, reachable: bool) {
        self.sim.reachable = reachable;
        if !reachable {
            self.sim.associated = false;
        }
    }

    /// Simulation: how many polls an association takes.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_join_polls(&mut self, polls: u32) {
        self.sim.join_polls = polls;
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.driver.set_configuration(&cfg).map_err(|e| {
            error!("WiFi(espidf): set_configuration failed: {:?}", e);
            ConnectivityError::ConnectionFailed
        })?;
        if !self.driver.is_started().unwrap_or(false) {
            self.driver.start().map_err(|e| {
                error!("WiFi(espidf): start failed: {:?}", e);
                ConnectivityError::ConnectionFailed
            })?;
        }
        self.driver.connect().map_err(|e| {
            error!("WiFi(espidf): connect failed: {:?}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim.polls_left = self.sim.join_polls;
        self.sim.associated = false;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi(espidf): disconnect failed: {:?}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim.associated = false;
        info!("WiFi(sim): disconnected");
    }

    /// Associated and holding an IP address.
    #[cfg(target_os = "espidf")]
    fn platform_link_up(&mut self) -> bool {
        self.driver.is_connected().unwrap_or(false) && self.driver.sta_netif().is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&mut self) -> bool {
        if self.state == WifiState::Connecting && self.sim.reachable && !self.sim.associated {
            if self.sim.polls_left <= 1 {
                self.sim.associated = true;
                info!("WiFi(sim): associated with '{}'", self.ssid);
            } else {
                self.sim.polls_left -= 1;
            }
        }
        self.sim.reachable && self.sim.associated
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        use esp_idf_svc::sys::{ESP_OK, esp_wifi_sta_get_ap_info, wifi_ap_record_t};
        let mut info = wifi_ap_record_t::default();
        // SAFETY: out-pointer to a stack-local record.
        let rc = unsafe { esp_wifi_sta_get_ap_info(&mut info) };
        (rc == ESP_OK as i32).then_some(info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        (self.state == WifiState::Connected).then_some(-60)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connecting;
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = WifiState::Disconnected;
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    fn poll(&mut self) {
        let up = self.platform_link_up();
        match (self.state, up) {
            (WifiState::Connecting, true) => {
                self.state = WifiState::Connected;
                self.last_rssi = self.platform_rssi();
                info!("WiFi: connected (RSSI={:?})", self.last_rssi);
            }
            (WifiState::Connected, false) => {
                warn!("WiFi: connection lost");
                self.state = WifiState::Disconnected;
                self.last_rssi = None;
            }
            (WifiState::Connected, true) => self.last_rssi = self.platform_rssi(),
            _ => {}
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|()| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|()| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingDelay {
        total_ms: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += u64::from(ns) / 1_000_000;
        }
        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += u64::from(ms);
        }
    }

    #[test]
    fn rejects_empty_ssid() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials("", "password123"), Err(ConnectivityError::InvalidSsid));
    }

    #[test]
    fn rejects_short_password() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials("MyNet", "short"), Err(ConnectivityError::InvalidPassword));
    }

    #[test]
    fn rejects_non_printable_ssid() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials("Net\u{7}", ""), Err(ConnectivityError::InvalidSsid));
    }

    #[test]
    fn accepts_open_network() {
        let mut a = WifiAdapter::new();
        assert!(a.set_credentials("OpenCafe", "").is_ok());
    }

    #[test]
    fn connect_without_credentials_fails() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.connect(), Err(ConnectivityError::NoCredentials));
    }

    #[test]
    fn join_waits_for_association() {
        let mut a = WifiAdapter::new();
        a.set_credentials("Basin", "password1").unwrap();
        a.sim_set_join_polls(3);
        let mut delay = CountingDelay::default();
        assert_eq!(a.connect_within(10_000, &mut delay), LinkState::Connected);
        assert_eq!(delay.total_ms, 2 * u64::from(JOIN_POLL_MS));
        assert!(a.rssi().is_some());
    }

    #[test]
    fn unreachable_ap_gives_up_at_timeout() {
        let mut a = WifiAdapter::new();
        a.set_credentials("Basin", "password1").unwrap();
        a.sim_set_reachable(false);
        let mut delay = CountingDelay::default();
        assert_eq!(a.connect_within(1_200, &mut delay), LinkState::Disconnected);
        assert_eq!(delay.total_ms, 1_200);
        assert!(!a.is_connected());
    }

    #[test]
    fn missing_credentials_start_offline_without_waiting() {
        let mut a = WifiAdapter::new();
        let mut delay = CountingDelay::default();
        assert_eq!(a.connect_within(10_000, &mut delay), LinkState::Disconnected);
        assert_eq!(delay.total_ms, 0);
    }

    #[test]
    fn lost_link_is_noticed_on_poll() {
        let mut a = WifiAdapter::new();
        a.set_credentials("Basin", "password1").unwrap();
        let mut delay = CountingDelay::default();
        assert_eq!(a.connect_within(1_000, &mut delay), LinkState::Connected);
        a.sim_set_reachable(false);
        a.poll();
        assert_eq!(a.state(), WifiState::Disconnected);
        assert!(a.rssi().is_none());
    }

    #[test]
    fn connect_disconnect_roundtrip() {
        let mut a = WifiAdapter::new();
        a.set_credentials("TestNet", "password1").unwrap();
        a.connect().unwrap();
        a.poll();
        assert!(a.is_connected());
        a.disconnect();
        assert!(!a.is_connected());
    }

    #[test]
    fn double_connect_fails() {
        let mut a = WifiAdapter::new();
        a.set_credentials("Net", "password1").unwrap();
        a.connect().unwrap();
        a.poll();
        assert_eq!(a.connect(), Err(ConnectivityError::AlreadyConnected));
    }
}
