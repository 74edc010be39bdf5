//! Device identity derived from the ESP32 factory MAC address.
//!
//! The MQTT client id is the configured device name. When none is set,
//! a stable one is derived from the last three MAC bytes: `aquamon-xxyyzz`.

use core::fmt::Write;

/// MQTT client id (device names are capped at 32 bytes).
pub type ClientId = heapless::String<32>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly six bytes into the buffer.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// `aquamon-xxyyzz` from the last 3 MAC bytes (lowercase hex).
pub fn default_client_id(mac: &MacAddress) -> ClientId {
    let mut id = ClientId::new();
    let _ = write!(id, "aquamon-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}

/// Configured device name, or the MAC-derived id when it is blank.
pub fn client_id(device_name: &str, mac: &MacAddress) -> ClientId {
    let name = device_name.trim();
    if name.is_empty() {
        return default_client_id(mac);
    }
    let mut id = ClientId::new();
    for c in name.chars() {
        if id.push(c).is_err() {
            break;
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_id_format() {
        let mac = [0x00, 0x11, 0x22, 0xAA, 0xBB, 0xCC];
        assert_eq!(default_client_id(&mac).as_str(), "aquamon-aabbcc");
    }

    #[test]
    fn configured_name_wins() {
        let mac = [0x00, 0x11, 0x22, 0xAA, 0xBB, 0xCC];
        assert_eq!(client_id("bassin-nord", &mac).as_str(), "bassin-nord");
    }

    #[test]
    fn blank_name_falls_back_to_mac() {
        let mac = read_mac();
        assert_eq!(client_id("  ", &mac).as_str(), "aquamon-efcafe");
    }

    #[test]
    fn sim_mac_deterministic() {
        assert_eq!(read_mac(), read_mac());
    }
}
