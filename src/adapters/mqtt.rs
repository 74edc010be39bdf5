//! MQTT telemetry publisher.
//!
//! Implements [`TelemetryPort`] on top of the WiFi adapter. Publishes are
//! QoS 0, not retained, and never queued: a payload that cannot be handed
//! to the client right now is dropped.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//!   The session flag is driven by the client's event callback.
//! - **all other targets**: an in-memory broker that records publishes.
//!
//! ## Reconnect
//!
//! `reconnect()` makes one attempt bounded by `network_timeout_ms` in
//! total: if WiFi has dropped, half of it goes to the re-join and the rest
//! to the broker session wait.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::events::LinkState;
use crate::app::ports::TelemetryPort;
use crate::config::NetworkConfig;

use super::device_id::{self, ClientId};
use super::time::SystemDelay;
use super::wifi::{ConnectivityPort, WifiAdapter};

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, Ordering};
#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

/// Poll period while waiting for the broker session.
const SESSION_POLL_MS: u32 = 100;

pub type BrokerUrl = heapless::String<96>;

/// `(join_ms, session_ms)` for one reconnect; the two never sum past
/// `timeout_ms`.
pub fn reconnect_budget(timeout_ms: u32, wifi_up: bool) -> (u32, u32) {
    if wifi_up {
        (0, timeout_ms)
    } else {
        let join = timeout_ms / 2;
        (join, timeout_ms - join)
    }
}

/// `mqtt://host:port`
pub fn broker_url(host: &str, port: u16) -> BrokerUrl {
    let mut url = BrokerUrl::new();
    let _ = write!(url, "mqtt://{}:{}", host, port);
    url
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimBroker {
    reachable: bool,
    session: bool,
    accept_publish: bool,
    published: Vec<(String, Vec<u8>)>,
}

pub struct MqttPublisher {
    wifi: WifiAdapter,
    delay: SystemDelay,
    client_id: ClientId,
    url: BrokerUrl,
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    session: Arc<AtomicBool>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

impl MqttPublisher {
    pub fn new(network: &NetworkConfig, wifi: WifiAdapter) -> Self {
        let client_id = device_id::client_id(&network.device_name, &device_id::read_mac());
        let url = broker_url(&network.broker_host, network.broker_port);
        info!("MQTT: broker {} as '{}'", url, client_id);
        Self {
            wifi,
            delay: SystemDelay::new(),
            client_id,
            url,
            timeout_ms: network.network_timeout_ms,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            session: Arc::new(AtomicBool::new(false)),
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker {
                reachable: true,
                accept_publish: true,
                ..SimBroker::default()
            },
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn wifi(&self) -> &WifiAdapter {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut WifiAdapter {
        &mut self.wifi
    }

    /// Open the broker session if WiFi is already up. Used once at startup.
    pub fn start(&mut self) -> LinkState {
        if !self.wifi.is_connected() {
            return LinkState::Disconnected;
        }
        if self.open_session(self.timeout_ms) {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }

    fn open_session(&mut self, budget_ms: u32) -> bool {
        self.platform_open();
        let mut waited = 0;
        loop {
            if self.platform_session_up() {
                info!("MQTT: session up");
                return true;
            }
            if waited >= budget_ms {
                warn!("MQTT: no session with {} after {} ms", self.url, budget_ms);
                return false;
            }
            let step = SESSION_POLL_MS.min(budget_ms - waited);
            self.delay.delay_ms(step);
            waited += step;
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    /// Create the client if it does not exist yet; it reconnects on its own
    /// afterwards.
    #[cfg(target_os = "espidf")]
    fn platform_open(&mut self) {
        if self.client.is_some() {
            return;
        }
        let conf = MqttClientConfiguration {
            client_id: Some(self.client_id.as_str()),
            network_timeout: core::time::Duration::from_millis(u64::from(self.timeout_ms)),
            ..Default::default()
        };
        let session = Arc::clone(&self.session);
        let created = EspMqttClient::new_cb(self.url.as_str(), &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => session.store(true, Ordering::Release),
                EventPayload::Disconnected => session.store(false, Ordering::Release),
                _ => {}
            }
        });
        match created {
            Ok(client) => self.client = Some(client),
            Err(e) => warn!("MQTT(espidf): client init failed: {:?}", e),
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_session_up(&self) -> bool {
        self.client.is_some() && self.session.load(Ordering::Acquire)
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        let Some(client) = self.client.as_mut() else {
            return false;
        };
        match client.enqueue(topic, QoS::AtMostOnce, false, payload) {
            Ok(_) => true,
            Err(e) => {
                debug!("MQTT(espidf): enqueue failed: {:?}", e);
                false
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_open(&mut self) {
        self.sim.session = self.sim.reachable;
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_session_up(&self) -> bool {
        self.sim.session
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !self.sim.accept_publish {
            return false;
        }
        self.sim.published.push((topic.to_owned(), payload.to_vec()));
        true
    }

    // ── Simulation controls ───────────────────────────────────

    /// Simulation: take the broker up or down. Going down drops the session.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_broker_reachable(&mut self, reachable: bool) {
        self.sim.reachable = reachable;
        if !reachable {
            self.sim.session = false;
        }
    }

    /// Simulation: make the client refuse publishes while connected.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_accept_publish(&mut self, accept: bool) {
        self.sim.accept_publish = accept;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[(String, Vec<u8>)] {
        &self.sim.published
    }
}

impl TelemetryPort for MqttPublisher {
    fn is_connected(&self) -> bool {
        self.wifi.is_connected() && self.platform_session_up()
    }

    fn reconnect(&mut self) -> bool {
        self.wifi.poll();
        let wifi_up = self.wifi.is_connected();
        let (join_ms, session_ms) = reconnect_budget(self.timeout_ms, wifi_up);
        if !wifi_up {
            info!("MQTT: WiFi down, re-joining first");
            if self.wifi.connect_within(join_ms, &mut self.delay) == LinkState::Disconnected {
                return false;
            }
        }
        self.open_session(session_ms)
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !self.is_connected() {
            return false;
        }
        let ok = self.platform_publish(topic, payload);
        if ok {
            debug!("MQTT: {} bytes -> {}", payload.len(), topic);
        }
        ok
    }
}
