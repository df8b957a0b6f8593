//! Scene presets.
//!
//! A preset only chooses a target brightness; it never switches the light
//! on or off.  Unknown ids are ignored.

use super::transition::Light;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScenePreset {
    Relax = 0,
    Bright = 1,
    Nightly = 2,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 3] = [Self::Relax, Self::Bright, Self::Nightly];

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Relax),
            1 => Some(Self::Bright),
            2 => Some(Self::Nightly),
            _ => None,
        }
    }

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn brightness(self) -> u8 {
        match self {
            Self::Relax => 144,
            Self::Bright => 254,
            Self::Nightly => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Relax => "Relax",
            Self::Bright => "Bright",
            Self::Nightly => "Nightly",
        }
    }
}

/// Apply preset `id` to `light`.  Returns the preset if `id` was known.
pub fn apply_scene(light: &mut Light, id: u8) -> Option<ScenePreset> {
    let preset = ScenePreset::from_id(id)?;
    light.set_scene(preset.id(), preset.brightness());
    Some(preset)
}
