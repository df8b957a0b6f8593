//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the floodlight.
//!
//! - Config validation: all fields are range-checked before persistence.
//! - Namespace isolation: preferences and config live in separate namespaces.
//! - Atomic writes: ESP-IDF NVS commits are atomic per nvs_commit().

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::LightConfig;
use crate::pins::MAX_LIGHTS;
use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "floodlight";
const CONFIG_KEY: &str = "lightcfg";

/// Largest config blob accepted by `save` and read back by `load`.
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called from the single main-task context before any
            // concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                Self::reinit_flash().map_err(|_| ConfigError::IoError)?;
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// Load the stored config, writing the defaults first when none exists
    /// so later boots read back a validated blob.
    pub fn load_or_seed(&self) -> Result<LightConfig, ConfigError> {
        if self.exists(CONFIG_NAMESPACE, CONFIG_KEY) {
            return self.load();
        }
        let config = LightConfig::default();
        self.save(&config)?;
        info!("NvsAdapter: seeded default config");
        Ok(config)
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Number of stored keys (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }

    #[cfg(target_os = "espidf")]
    fn reinit_flash() -> Result<(), i32> {
        // SAFETY: no NVS handle is open while the partition is recycled.
        let ret = unsafe { nvs_flash_erase() };
        if ret != ESP_OK {
            return Err(ret);
        }
        let ret = unsafe { nvs_flash_init() };
        if ret != ESP_OK {
            return Err(ret);
        }
        Ok(())
    }

    /// NUL-terminated copy of `name`, truncated to the 15-byte NVS limit.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

pub(crate) fn validate_config(cfg: &LightConfig) -> Result<(), ConfigError> {
    if cfg.light_name.is_empty() {
        return Err(ConfigError::ValidationFailed("light_name must not be empty"));
    }
    if !(1..=MAX_LIGHTS).contains(&cfg.light_count) {
        return Err(ConfigError::ValidationFailed("light_count exceeds the board's LED channels"));
    }
    if !(8..=14).contains(&cfg.pwm_resolution_bits) {
        return Err(ConfigError::ValidationFailed("pwm_resolution_bits must be 8–14"));
    }
    if cfg.led_min_duty >= cfg.led_max_duty {
        return Err(ConfigError::ValidationFailed("led_min_duty must be < led_max_duty"));
    }
    if cfg.led_max_duty > cfg.max_raw_duty() {
        return Err(ConfigError::ValidationFailed("led_max_duty exceeds PWM resolution"));
    }
    if !(1..=1000).contains(&cfg.ticks_per_unit) {
        return Err(ConfigError::ValidationFailed("ticks_per_unit must be 1–1000"));
    }
    if !(0..=600).contains(&cfg.default_transition_units) {
        return Err(ConfigError::ValidationFailed("default_transition_units must be 0–600"));
    }
    if cfg.boot_ramp_ticks == 0 || cfg.boot_settle_ticks == 0 {
        return Err(ConfigError::ValidationFailed("boot ramp/settle ticks must be > 0"));
    }
    if !(40.0..=120.0).contains(&cfg.critical_temperature_c) {
        return Err(ConfigError::ValidationFailed("critical_temperature_c must be 40.0–120.0"));
    }
    if !(1..=50).contains(&cfg.loop_interval_ms) {
        return Err(ConfigError::ValidationFailed("loop_interval_ms must be 1–50"));
    }
    if cfg.transition_pause_ms > 50 {
        return Err(ConfigError::ValidationFailed("transition_pause_ms must be 0–50"));
    }
    if !(5..=3600).contains(&cfg.telemetry_interval_secs) {
        return Err(ConfigError::ValidationFailed("telemetry_interval_secs must be 5–3600"));
    }
    if !(10..=600).contains(&cfg.wifi_connect_timeout_secs) {
        return Err(ConfigError::ValidationFailed("wifi_connect_timeout_secs must be 10–600"));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<LightConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match self.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => {
                let cfg: LightConfig = postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
                validate_config(&cfg)?;
                info!("NvsAdapter: loaded config ({} bytes)", len);
                Ok(cfg)
            }
            Err(StorageError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(LightConfig::default())
            }
            Err(_) => Err(ConfigError::IoError),
        }
    }

    fn save(&self, config: &LightConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::StorageFull);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
                let key = Self::c_name(CONFIG_KEY);
                let ret = unsafe {
                    nvs_set_blob(handle, key.as_ptr() as *const _, bytes.as_ptr() as *const _, bytes.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(ConfigError::StorageFull),
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let key_buf = Self::c_name(key);
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(handle, key_buf.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                // a namespace that was never written cannot be opened read-only
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(e) => {
                    warn!("NvsAdapter: read {}::{} failed ({})", namespace, key, e);
                    Err(StorageError::IoError)
                }
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe {
                    nvs_set_blob(handle, key_buf.as_ptr() as *const _, data.as_ptr() as *const _, data.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => Ok(()),
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(StorageError::Full),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe { nvs_find_key(handle, key_buf.as_ptr() as *const _, core::ptr::null_mut()) };
                Ok(ret == ESP_OK)
            });
            result.unwrap_or(false)
        }
    }

    fn erase_all(&mut self) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store.borrow_mut().clear();
            info!("NvsAdapter: store wiped (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::reinit_flash().map_err(|e| {
                warn!("NvsAdapter: partition wipe failed ({})", e);
                StorageError::IoError
            })?;
            info!("NvsAdapter: NVS partition wiped");
            Ok(())
        }
    }
}
