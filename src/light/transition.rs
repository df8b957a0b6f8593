//! Brightness transition engine.
//!
//! Each [`Light`] ramps its current brightness linearly toward an effective
//! target (the requested brightness while on, zero while off).  A ramp spans
//! a fixed number of ticks; the last tick lands exactly on the target so
//! float accumulation never leaves a light one step short.
//!
//! ```text
//!   STEADY ──(write on/bri/transition)──▶ TRANSITIONING
//!      ▲                                        │
//!      └────────(current == effective target)───┘
//! ```

use super::duty::{DutyLimits, FINE_SCALE};

/// Engine ticks per transition-time unit.
pub const TICKS_PER_UNIT: u32 = 33;
/// Transition used when a request does not specify one.
pub const DEFAULT_TRANSITION_UNITS: i32 = 4;

pub const MIN_BRIGHTNESS: u8 = 1;
pub const MAX_BRIGHTNESS: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampState {
    Steady,
    Transitioning,
}

/// One dimmable channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    on: bool,
    target: u8,
    current: f32,
    step: f32,
    ticks_remaining: u32,
    scene: u8,
}

impl Light {
    /// A light that is off, dark, and aiming at `target` once switched on.
    pub fn new(target: u8) -> Self {
        Self {
            on: false,
            target: target.max(MIN_BRIGHTNESS),
            current: 0.0,
            step: 0.0,
            ticks_remaining: 0,
            scene: 0,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Requested brightness (1 – 255), independent of ramp progress.
    pub fn target(&self) -> u8 {
        self.target
    }

    /// Brightness currently driven (0.0 – 255.0).
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Signed per-tick increment of the active ramp.
    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn scene(&self) -> u8 {
        self.scene
    }

    pub fn state(&self) -> RampState {
        if self.current == self.effective_target() {
            RampState::Steady
        } else {
            RampState::Transitioning
        }
    }

    /// Where the ramp is heading: the target while on, 0 while off.
    pub fn effective_target(&self) -> f32 {
        if self.on { f32::from(self.target) } else { 0.0 }
    }

    pub fn set_on(&mut self, on: bool) {
        self.on = on;
    }

    /// Set the target, clamped into `[1, 255]`.
    pub fn set_target(&mut self, brightness: i64) {
        self.target = brightness.clamp(i64::from(MIN_BRIGHTNESS), i64::from(MAX_BRIGHTNESS)) as u8;
    }

    /// Add `delta` to the target, clamped into `[1, 255]`.
    pub fn adjust_target(&mut self, delta: i64) {
        self.set_target(i64::from(self.target).saturating_add(delta));
    }

    /// Record a scene preset and adopt its brightness.  `on` is untouched.
    pub fn set_scene(&mut self, id: u8, brightness: u8) {
        self.scene = id;
        self.set_target(i64::from(brightness));
    }

    /// Start a ramp toward the effective target over `units` transition
    /// units.  `units <= 0` jumps on the next tick.
    pub fn start_transition(&mut self, units: i32, ticks_per_unit: u32) {
        let ticks = if units <= 0 {
            1
        } else {
            (units as u32).saturating_mul(ticks_per_unit.max(1))
        };
        self.start_ramp(ticks);
    }

    /// Start a ramp toward the effective target spanning `ticks` ticks.
    pub fn start_ramp(&mut self, ticks: u32) {
        let ticks = ticks.max(1);
        let goal = self.effective_target();
        if self.current == goal {
            self.step = 0.0;
            self.ticks_remaining = 0;
            return;
        }
        self.step = (goal - self.current) / ticks as f32;
        self.ticks_remaining = ticks;
    }

    /// Jump the driven brightness without ramping (alert flash).
    pub fn snap_to(&mut self, brightness: f32) {
        self.current = brightness.clamp(0.0, f32::from(MAX_BRIGHTNESS));
        self.ticks_remaining = 0;
        self.step = 0.0;
    }

    /// Current brightness on the fine (0 to 4080) scale, truncated.  Any
    /// lit value maps to at least 1 so the duty floor still applies.
    pub fn fine_value(&self) -> u32 {
        if self.current > 0.0 {
            ((self.current * FINE_SCALE) as u32).max(1)
        } else {
            0
        }
    }

    /// Advance one tick.  Returns `true` if the driven brightness changed.
    ///
    /// `fallback_ticks` is used when the light is off target with no usable
    /// ramp (e.g. target changed without a new transition).
    pub fn advance(&mut self, fallback_ticks: u32) -> bool {
        let goal = self.effective_target();
        if self.current == goal {
            self.step = 0.0;
            self.ticks_remaining = 0;
            return false;
        }

        let heading_wrong_way = self.step == 0.0 || (goal - self.current).signum() != self.step.signum();
        if self.ticks_remaining == 0 || heading_wrong_way {
            self.start_ramp(fallback_ticks);
        }

        self.current += self.step;
        self.ticks_remaining -= 1;

        let overshoot = (self.step > 0.0 && self.current > goal) || (self.step < 0.0 && self.current < goal);
        if overshoot || self.ticks_remaining == 0 {
            self.current = goal;
            self.ticks_remaining = 0;
        }
        self.current = self.current.clamp(0.0, f32::from(MAX_BRIGHTNESS));
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Engine
// ───────────────────────────────────────────────────────────────

/// Owns every light and converts ramp progress into channel duty.
pub struct TransitionEngine {
    lights: Vec<Light>,
    duties: Vec<u32>,
    limits: DutyLimits,
    ticks_per_unit: u32,
    default_units: i32,
}

impl TransitionEngine {
    pub fn new(count: usize, initial_target: u8, limits: DutyLimits, ticks_per_unit: u32, default_units: i32) -> Self {
        Self {
            lights: vec![Light::new(initial_target); count],
            duties: vec![0; count],
            limits,
            ticks_per_unit: ticks_per_unit.max(1),
            default_units,
        }
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Zero-based lookup.
    pub fn light(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    pub fn ticks_per_unit(&self) -> u32 {
        self.ticks_per_unit
    }

    pub fn default_units(&self) -> i32 {
        self.default_units
    }

    pub fn limits(&self) -> DutyLimits {
        self.limits
    }

    /// Duty last written to channel `index`.
    pub fn duty(&self, index: usize) -> u32 {
        self.duties.get(index).copied().unwrap_or(0)
    }

    /// Restart the ramp of light `index` over `units` (default when `None`).
    pub fn retarget(&mut self, index: usize, units: Option<i32>) {
        let units = units.unwrap_or(self.default_units);
        let tpu = self.ticks_per_unit;
        if let Some(light) = self.lights.get_mut(index) {
            light.start_transition(units, tpu);
        }
    }

    /// Advance every light one tick, writing changed duties through `write`.
    ///
    /// Returns `true` if any light moved (the loop may pause briefly).
    pub fn tick(&mut self, mut write: impl FnMut(usize, u32)) -> bool {
        let fallback = (self.default_units.max(1) as u32).saturating_mul(self.ticks_per_unit);
        let mut in_transition = false;

        for (index, light) in self.lights.iter_mut().enumerate() {
            if light.advance(fallback) {
                in_transition = true;
                let duty = self.limits.map(light.fine_value());
                self.duties[index] = duty;
                write(index, duty);
            }
        }
        in_transition
    }

    /// Re-write every channel's duty from the current brightness.
    pub fn refresh(&mut self, mut write: impl FnMut(usize, u32)) {
        for (index, light) in self.lights.iter().enumerate() {
            let duty = self.limits.map(light.fine_value());
            self.duties[index] = duty;
            write(index, duty);
        }
    }

    /// True if any light is still ramping.
    pub fn in_transition(&self) -> bool {
        self.lights.iter().any(|l| l.state() == RampState::Transitioning)
    }
}
