//! Duty mapper: logical brightness → physical LED PWM duty.
//!
//! The LED driver does not respond below roughly 8 % duty, and the board is
//! rated for about 1.5 A peak, so every non-zero brightness is squeezed into
//! `[min, max]`.  Zero bypasses the floor so "off" is truly off.

use serde::{Deserialize, Serialize};

/// Fine-resolution input scale: 12-bit (0 – 4095).
pub const FINE_RESOLUTION: u32 = 4096;

/// Factor between the 0 – 255 brightness scale and the fine scale.
pub const FINE_SCALE: f32 = 16.0;

/// Hardware-safe duty bounds for one PWM channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyLimits {
    /// Usability floor for any non-zero input.
    pub min: u32,
    /// Safety ceiling.
    pub max: u32,
    /// Number of input steps (4096 for 12-bit).
    pub resolution: u32,
}

impl DutyLimits {
    pub const fn new(min: u32, max: u32, resolution: u32) -> Self {
        Self {
            min,
            max,
            resolution,
        }
    }

    /// Map a fine-resolution value (`0..resolution`) to a duty.
    pub fn map(&self, value: u32) -> u32 {
        map_duty(value, self.min, self.max, self.resolution)
    }

    /// Rescale `value` from `[0, value_max]` into the fine resolution, then map.
    pub fn map_scaled(&self, value: u32, value_max: u32) -> u32 {
        self.map(rescale(value, value_max, self.resolution))
    }
}

/// Core duty mapping.
///
/// * `v == 0` → `0`
/// * `v > 0`  → `min + (v - 1) * (max - min) / (resolution - 1)`, clamped to
///   `[min, max]`
///
/// Arithmetic is widened to `u64`; a reversed `min`/`max` pair is treated as
/// its ordered equivalent.
pub fn map_duty(v: u32, min_duty: u32, max_duty: u32, resolution: u32) -> u32 {
    if v == 0 {
        return 0;
    }

    let (lo, hi) = if min_duty <= max_duty {
        (min_duty, max_duty)
    } else {
        (max_duty, min_duty)
    };
    let span = u64::from(resolution.saturating_sub(1).max(1));
    let offset = u64::from(v - 1) * u64::from(hi - lo) / span;

    (u64::from(lo) + offset).min(u64::from(hi)) as u32
}

/// Linear rescale of `[0, value_max]` into `[0, resolution - 1]`, truncating.
pub fn rescale(value: u32, value_max: u32, resolution: u32) -> u32 {
    if value_max == 0 {
        return 0;
    }
    let fine_max = u64::from(resolution.saturating_sub(1));
    (u64::from(value.min(value_max)) * fine_max / u64::from(value_max)) as u32
}
