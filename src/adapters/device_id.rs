//! Device identity derived from the ESP32 factory MAC address.
//!
//! The MAC is reported verbatim by `/detect`; the last three bytes also
//! form the network hostname (`floodlight-xxyyzz`).

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the station MAC address.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly 6 bytes into `mac`.
    unsafe {
        esp_idf_svc::sys::esp_read_mac(mac.as_mut_ptr(), esp_idf_svc::sys::esp_mac_type_t_ESP_MAC_WIFI_STA);
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// `floodlight-xxyyzz` (lowercase).
pub fn hostname(mac: &MacAddress) -> heapless::String<24> {
    let mut name = heapless::String::<24>::new();
    use core::fmt::Write;
    let _ = write!(name, "floodlight-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
