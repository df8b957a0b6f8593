//! Mock adapters for integration tests.
//!
//! Records every actuator, storage, and system call so tests can assert on
//! the full history without touching real LEDC/ADC/NVS registers.

use floodlight::app::events::AppEvent;
use floodlight::app::ports::{ActuatorPort, EventSink, SensorPort, StorageError, StoragePort, SystemPort};
use std::collections::HashMap;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    SetLed { channel: usize, duty: u32 },
    SetFan { duty: u32 },
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    /// Returned by every `read_temperature()`.
    pub temperature: Option<f32>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            temperature: Some(25.0),
        }
    }

    /// Last duty written to LED `channel` (0 after `all_off`).
    pub fn led_duty(&self, channel: usize) -> u32 {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match *c {
                ActuatorCall::SetLed { channel: ch, duty } if ch == channel => Some(duty),
                ActuatorCall::AllOff => Some(0),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn fan_duty(&self) -> u32 {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match *c {
                ActuatorCall::SetFan { duty } => Some(duty),
                ActuatorCall::AllOff => Some(0),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Every LED duty written, in order.
    pub fn led_writes(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                ActuatorCall::SetLed { duty, .. } => Some(duty),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self) -> Option<f32> {
        self.temperature
    }
}

impl ActuatorPort for MockHardware {
    fn set_led_duty(&mut self, channel: usize, duty: u32) {
        self.calls.push(ActuatorCall::SetLed { channel, duty });
    }

    fn set_fan_duty(&mut self, duty: u32) {
        self.calls.push(ActuatorCall::SetFan { duty });
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── MockNvs ───────────────────────────────────────────────────

/// In-memory [`StoragePort`] with a switch to make writes fail.
#[derive(Default)]
pub struct MockNvs {
    pub data: HashMap<(String, String), Vec<u8>>,
    pub fail_writes: bool,
    pub writes: usize,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ns: &str, key: &str) -> Option<&[u8]> {
        self.data.get(&(ns.to_string(), key.to_string())).map(Vec::as_slice)
    }
}

impl StoragePort for MockNvs {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self.get(ns, key).ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.data.insert((ns.to_string(), key.to_string()), data.to_vec());
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.get(ns, key).is_some()
    }

    fn erase_all(&mut self) -> Result<(), StorageError> {
        self.data.clear();
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockSystem ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSystem {
    pub sleeps: Vec<u32>,
    pub credentials_forgotten: bool,
    pub restarts: u32,
}

#[allow(dead_code)]
impl MockSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept_ms(&self) -> u32 {
        self.sleeps.iter().sum()
    }
}

impl SystemPort for MockSystem {
    fn sleep_ms(&mut self, ms: u32) {
        self.sleeps.push(ms);
    }

    fn forget_network_credentials(&mut self) {
        self.credentials_forgotten = true;
    }

    fn restart(&mut self) {
        self.restarts += 1;
    }
}
