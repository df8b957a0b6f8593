//! Unified error types for the floodlight firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform.  All variants are `Copy`
//! so they can be passed through the control surface without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};
use crate::drivers::hw_init::HwInitError;
use crate::ota::OtaError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A control-surface request was rejected.
    Control(ControlError),
    /// The preference / config store failed.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A firmware update session failed.
    Update(OtaError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control(e) => write!(f, "control: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Update(e) => write!(f, "update: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Control surface errors
// ---------------------------------------------------------------------------

/// Reasons a control-surface request is rejected.  A rejected request never
/// mutates light, scene or preference state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// Body is not a JSON object of light-index → state objects.
    MalformedPayload,
    /// A light key is not a positive integer.
    InvalidLightKey,
    /// A light index is outside `1..=light_count`.
    LightOutOfRange(usize),
    /// A required argument is absent.
    MissingArgument(&'static str),
    /// An argument could not be parsed or is outside its domain.
    InvalidArgument(&'static str),
    /// Persisting the change failed; nothing was acknowledged.
    StorageFailed,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload => write!(f, "malformed payload"),
            Self::InvalidLightKey => write!(f, "light key must be a positive integer"),
            Self::LightOutOfRange(idx) => write!(f, "light {idx} out of range"),
            Self::MissingArgument(name) => write!(f, "missing argument '{name}'"),
            Self::InvalidArgument(name) => write!(f, "invalid argument '{name}'"),
            Self::StorageFailed => write!(f, "preference store write failed"),
        }
    }
}

impl From<ControlError> for Error {
    fn from(e: ControlError) -> Self {
        Self::Control(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<OtaError> for Error {
    fn from(e: OtaError) -> Self {
        Self::Update(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Thermal faults
// ---------------------------------------------------------------------------

/// Thermal faults are accumulated in a bitfield by the thermal supervisor so
/// that simultaneous faults can be tracked and individually cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThermalFault {
    /// No usable temperature sample this tick.
    SensorUnavailable = 0b0000_0001,
    /// Heatsink temperature above the critical ceiling.
    OverTemperature = 0b0000_0010,
}

impl ThermalFault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ThermalFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorUnavailable => write!(f, "temperature sensor unavailable"),
            Self::OverTemperature => write!(f, "over temperature"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
