//! Light model: duty mapping, brightness ramps, and scene presets.

pub mod duty;
pub mod scene;
pub mod transition;

pub use duty::{DutyLimits, map_duty};
pub use scene::{ScenePreset, apply_scene};
pub use transition::{Light, RampState, TransitionEngine};
