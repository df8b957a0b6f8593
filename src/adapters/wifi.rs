//! WiFi station-mode adapter.
//!
//! Joins the access point whose credentials ESP-IDF already holds in its
//! own NVS namespace (written by the external provisioning portal).  A
//! build-time `WIFI_SSID` / `WIFI_PASS` pair is used only when nothing is
//! stored.  The caller restarts the chip if the connect deadline passes.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi` over `EspWifi`.
//! - **all other targets**: simulation stub for host-side tests.

use core::fmt;
use std::time::Duration;

use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

#[cfg(target_os = "espidf")]
const RETRY_DELAY_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    /// Driver refused configuration or start.
    DriverFailed,
    /// No IP within the connect deadline.
    Timeout,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials stored"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::DriverFailed => write!(f, "WiFi driver error"),
            Self::Timeout => write!(f, "WiFi connect timed out"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed(ConnectivityError),
}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
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

/// Station credentials.  An empty password means an open network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut c = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        c.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        c.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(c)
    }

    /// `WIFI_SSID` / `WIFI_PASS` baked in at build time, if present and valid.
    pub fn from_build_env() -> Option<Self> {
        let ssid = option_env!("WIFI_SSID")?;
        let password = option_env!("WIFI_PASS").unwrap_or("");
        match Self::new(ssid, password) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("WiFi: ignoring build-time credentials: {}", e);
                None
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_stored: Option<Credentials>,
    #[cfg(not(target_os = "espidf"))]
    sim_reachable: bool,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, esp_idf_svc::sys::EspError> {
        let esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs))?;
        let wifi = BlockingWifi::wrap(esp_wifi, sys_loop)?;
        Ok(Self {
            state: WifiState::Disconnected,
            wifi,
        })
    }

    fn stored_client(&self) -> Option<ClientConfiguration> {
        match self.wifi.get_configuration() {
            Ok(Configuration::Client(c)) | Ok(Configuration::Mixed(c, _)) if !c.ssid.is_empty() => Some(c),
            _ => None,
        }
    }

    fn platform_connect(&mut self, fallback: Option<&Credentials>, timeout: Duration) -> Result<(), ConnectivityError> {
        let client = match (self.stored_client(), fallback) {
            (Some(c), _) => c,
            (None, Some(creds)) => ClientConfiguration {
                ssid: creds.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
                password: creds
                    .password
                    .as_str()
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidPassword)?,
                auth_method: if creds.password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPAWPA2Personal
                },
                ..Default::default()
            },
            (None, None) => return Err(ConnectivityError::NoCredentials),
        };
        info!("WiFi: connecting to '{}'", client.ssid);

        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|_| ConnectivityError::DriverFailed)?;
        self.wifi.start().map_err(|_| ConnectivityError::DriverFailed)?;

        let deadline = std::time::Instant::now() + timeout;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.wifi.connect().and_then(|_| self.wifi.wait_netif_up()) {
                Ok(()) => {
                    if let Ok(ip) = self.wifi.wifi().sta_netif().get_ip_info() {
                        info!("WiFi: up on attempt {} ip={}", attempt, ip.ip);
                    }
                    return Ok(());
                }
                Err(e) => warn!("WiFi: attempt {} failed: {}", attempt, e),
            }
            if std::time::Instant::now() >= deadline {
                let _ = self.wifi.disconnect();
                return Err(ConnectivityError::Timeout);
            }
            let _ = self.wifi.disconnect();
            std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            sim_stored: None,
            sim_reachable: true,
        }
    }

    /// Simulation: credentials "left behind" by the provisioning portal.
    pub fn sim_store_credentials(&mut self, creds: Option<Credentials>) {
        self.sim_stored = creds;
    }

    /// Simulation: whether the access point answers.
    pub fn sim_set_reachable(&mut self, reachable: bool) {
        self.sim_reachable = reachable;
    }

    fn platform_connect(&mut self, fallback: Option<&Credentials>, _timeout: Duration) -> Result<(), ConnectivityError> {
        let creds = self.sim_stored.as_ref().or(fallback).ok_or(ConnectivityError::NoCredentials)?;
        if !self.sim_reachable {
            return Err(ConnectivityError::Timeout);
        }
        info!("WiFi(sim): connected to '{}'", creds.ssid);
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    /// Join the stored network (or `fallback`), retrying until `timeout`.
    pub fn connect(&mut self, fallback: Option<&Credentials>, timeout: Duration) -> Result<(), ConnectivityError> {
        self.state = WifiState::Connecting;
        match self.platform_connect(fallback, timeout) {
            Ok(()) => {
                self.state = WifiState::Connected;
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed: {}", e);
                self.state = WifiState::Failed(e);
                Err(e)
            }
        }
    }
}
