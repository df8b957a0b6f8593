//! Outbound application events.
//!
//! The [`LightService`](super::service::LightService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log today).

use crate::prefs::Preferences;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot finished; carries the power state chosen by the startup policy.
    Started { lights: usize, power_on: bool },

    /// A light's requested state changed (target, not ramp position).
    LightChanged { light: usize, on: bool, bri: u8 },

    /// Fan duty moved to a different band.
    FanDutyChanged { from: u32, to: u32 },

    /// One or more thermal faults were raised.
    ThermalFault(u8),

    /// All thermal faults have been cleared.
    ThermalFaultCleared,

    /// Preferences were written to the store.
    PreferencesSaved(Preferences),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// Store wiped; restart follows.
    FactoryReset,

    RestartRequested,
}

/// A point-in-time telemetry snapshot suitable for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub temperature_c: Option<f32>,
    /// Duty of the first LED channel as driven.
    pub led_duty: u32,
    pub fan_duty: u32,
    pub lights_on: usize,
    pub in_transition: bool,
    pub fault_flags: u8,
}
