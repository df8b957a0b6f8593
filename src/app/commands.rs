//! Inbound commands to the light service.
//!
//! The control surface parses HTTP requests into these; the
//! [`LightService`](super::service::LightService) validates and applies
//! them.  Light indices are 0-based here.

use crate::prefs::StartupBehavior;

/// One light's entry in a `PUT /state` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateChange {
    pub light: usize,
    pub on: Option<bool>,
    pub bri: Option<i64>,
    pub bri_inc: Option<i64>,
    /// Transition-time units; `None` means the default.
    pub transition: Option<i32>,
}

/// The per-light action of a `/` query.  Only one applies, in this order
/// of precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootAction {
    /// `scene=<id>` without `bri`: adopt and persist the preset.
    Scene(u8),
    /// `scene=<id>&bri=<v>`: set brightness, ignore the preset.
    Brightness(i64),
    /// `on=true|false`.
    Power(bool),
    /// `alert=…`: flash against the current state.
    Alert,
    #[default]
    None,
}

/// Parsed `/` query form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RootCommand {
    pub startup: Option<StartupBehavior>,
    pub action: RootAction,
    pub reset: bool,
}

/// Actions the control loop performs after the response is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    Restart,
    FactoryReset,
}
