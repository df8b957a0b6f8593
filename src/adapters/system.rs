//! System adapter: bounded pauses, credential wipe and reboot.

use log::{info, warn};

use crate::app::ports::SystemPort;

/// [`SystemPort`] backed by the chip.
#[cfg(target_os = "espidf")]
pub struct EspSystem;

#[cfg(target_os = "espidf")]
impl SystemPort for EspSystem {
    fn sleep_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }

    fn forget_network_credentials(&mut self) {
        // SAFETY: resets the driver's persisted station/AP config; the
        // driver is initialised once in main before any request arrives.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_restore() };
        if ret != esp_idf_svc::sys::ESP_OK {
            warn!("system: esp_wifi_restore failed ({})", ret);
        } else {
            info!("system: WiFi credentials dropped");
        }
    }

    fn restart(&mut self) {
        info!("system: restarting");
        // SAFETY: esp_restart never returns.
        unsafe { esp_idf_svc::sys::esp_restart() };
    }
}

/// Host stand-in that records what the firmware asked for.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimSystem {
    pub slept_ms: u64,
    pub credentials_forgotten: bool,
    pub restarts: u32,
}

#[cfg(not(target_os = "espidf"))]
impl SimSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_os = "espidf"))]
impl SystemPort for SimSystem {
    fn sleep_ms(&mut self, ms: u32) {
        self.slept_ms += u64::from(ms);
    }

    fn forget_network_credentials(&mut self) {
        if self.credentials_forgotten {
            warn!("system(sim): credentials already dropped");
        }
        self.credentials_forgotten = true;
    }

    fn restart(&mut self) {
        info!("system(sim): restart #{}", self.restarts + 1);
        self.restarts += 1;
    }
}
