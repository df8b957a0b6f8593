//! Request payload parsing.
//!
//! Turns `PUT /state` bodies and `/` query forms into typed commands.
//! Nothing here touches light state; range checks against the light count
//! happen in the service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::app::commands::{RootAction, RootCommand, StateChange};
use crate::error::ControlError;
use crate::prefs::StartupBehavior;

use super::request::ControlRequest;

/// One light's object in a `PUT /state` body.  Unknown fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bri: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bri_inc: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<i32>,
}

/// `{"<1-based index>": LightPayload, ...}`.
pub type StatePayload = BTreeMap<String, LightPayload>;

/// Parse a `PUT /state` body.  Returns the decoded document (for the echo)
/// and the per-light changes with 0-based indices.
pub fn parse_state_update(body: &str) -> Result<(StatePayload, Vec<StateChange>), ControlError> {
    let doc: StatePayload = serde_json::from_str(body).map_err(|_| ControlError::MalformedPayload)?;

    let changes = doc
        .iter()
        .map(|(key, values)| {
            let light = parse_light_number(key).ok_or(ControlError::InvalidLightKey)?;
            Ok(StateChange {
                light,
                on: values.on,
                bri: values.bri,
                bri_inc: values.bri_inc,
                transition: values.transitiontime,
            })
        })
        .collect::<Result<Vec<_>, ControlError>>()?;

    Ok((doc, changes))
}

/// `light=<1-based>` of `GET /state`, as a 0-based index.
pub fn parse_light_arg(req: &ControlRequest) -> Result<usize, ControlError> {
    let raw = req.arg("light").ok_or(ControlError::MissingArgument("light"))?;
    parse_light_number(raw).ok_or(ControlError::InvalidArgument("light"))
}

/// Parse the `/` query form.
///
/// `startup` is independent of the light action.  For the light action the
/// first present of `scene`, `on`, `alert` wins; `scene` together with a
/// non-empty `bri` sets the brightness instead of the preset.
pub fn parse_root_query(req: &ControlRequest) -> Result<RootCommand, ControlError> {
    let startup = match req.arg("startup") {
        Some(raw) => Some(
            raw.trim()
                .parse::<u8>()
                .ok()
                .and_then(StartupBehavior::from_u8)
                .ok_or(ControlError::InvalidArgument("startup"))?,
        ),
        None => None,
    };

    let action = if let Some(scene) = req.arg("scene") {
        match req.arg("bri").filter(|b| !b.is_empty()) {
            Some(bri) => RootAction::Brightness(
                bri.trim()
                    .parse::<i64>()
                    .map_err(|_| ControlError::InvalidArgument("bri"))?,
            ),
            None => RootAction::Scene(
                scene
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| ControlError::InvalidArgument("scene"))?,
            ),
        }
    } else if let Some(on) = req.arg("on") {
        RootAction::Power(on == "true")
    } else if req.has_arg("alert") {
        RootAction::Alert
    } else {
        RootAction::None
    };

    Ok(RootCommand {
        startup,
        action,
        reset: req.has_arg("reset"),
    })
}

fn parse_light_number(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&n| n >= 1).map(|n| n - 1)
}
