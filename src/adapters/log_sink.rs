//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let temp = t.temperature_c.unwrap_or(f32::NAN);
                info!(
                    "TELEM | T={:.1}\u{00b0}C | led={} fan={} | on={} ramping={} | faults=0b{:08b}",
                    temp, t.led_duty, t.fan_duty, t.lights_on, t.in_transition, t.fault_flags,
                );
            }
            AppEvent::LightChanged { light, on, bri } => {
                info!("STATE | light {} on={} bri={}", light + 1, on, bri);
            }
            AppEvent::FanDutyChanged { from, to } => {
                info!("FAN | {} -> {}", from, to);
            }
            AppEvent::ThermalFault(flags) => {
                warn!("FAULT | thermal, flags=0b{:08b}", flags);
            }
            AppEvent::ThermalFaultCleared => {
                info!("FAULT | all cleared");
            }
            AppEvent::PreferencesSaved(p) => {
                info!("PREFS | last_on={} startup={:?} scene={}", p.last_on, p.startup, p.scene);
            }
            AppEvent::Started { lights, power_on } => {
                info!("START | lights={} power_on={}", lights, power_on);
            }
            AppEvent::FactoryReset => {
                warn!("RESET | factory reset, restarting");
            }
            AppEvent::RestartRequested => {
                info!("RESET | restart requested");
            }
        }
    }
}
