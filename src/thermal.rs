//! Fan control keyed off LED heatsink temperature.
//!
//! An ordered band table, evaluated from the highest threshold down; the
//! first band whose threshold the reading strictly exceeds wins, otherwise
//! the default duty applies.
//!
//! There is no hysteresis: a reading hovering on a threshold flips the fan
//! between two duties from one tick to the next.

use log::debug;

use crate::config::LightConfig;
use crate::safety::ThermalSupervisor;

/// Full-scale fan duty (12-bit).
pub const FAN_DUTY_MAX: u32 = 4095;
/// Duty when no band matches.
pub const FAN_DUTY_IDLE: u32 = 500;

const MAX_BANDS: usize = 8;

/// `temp > above_c` → `duty`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanBand {
    pub above_c: f32,
    pub duty: u32,
}

pub const DEFAULT_BANDS: [FanBand; 3] = [
    FanBand { above_c: 40.0, duty: 4095 },
    FanBand { above_c: 35.0, duty: 3000 },
    FanBand { above_c: 30.0, duty: 2000 },
];

/// Ordered band table with an explicit default.
#[derive(Debug, Clone)]
pub struct FanCurve {
    bands: heapless::Vec<FanBand, MAX_BANDS>,
    default_duty: u32,
}

impl FanCurve {
    /// Build a curve; bands are sorted highest threshold first and anything
    /// beyond the table capacity is dropped.
    pub fn new(bands: &[FanBand], default_duty: u32) -> Self {
        let mut sorted: heapless::Vec<FanBand, MAX_BANDS> = bands.iter().copied().take(MAX_BANDS).collect();
        sorted.sort_unstable_by(|a, b| b.above_c.total_cmp(&a.above_c));
        Self {
            bands: sorted,
            default_duty,
        }
    }

    pub fn bands(&self) -> &[FanBand] {
        &self.bands
    }

    /// First match wins, strict-greater thresholds.
    pub fn duty_for(&self, temp_c: f32) -> u32 {
        self.bands
            .iter()
            .find(|band| temp_c > band.above_c)
            .map_or(self.default_duty, |band| band.duty)
    }
}

impl Default for FanCurve {
    fn default() -> Self {
        Self::new(&DEFAULT_BANDS, FAN_DUTY_IDLE)
    }
}

/// Fan duty for `temp_c` using the stock table.
pub fn fan_duty(temp_c: f32) -> u32 {
    FanCurve::default().duty_for(temp_c)
}

/// Last applied fan duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanState {
    pub duty: u32,
}

/// Result of one thermal evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermalDecision {
    pub fan_duty: u32,
    /// LED output must be forced to zero this tick.
    pub inhibit_led: bool,
    /// Thermal fault bitmask (see [`ThermalFault`](crate::error::ThermalFault)).
    pub faults: u8,
}

/// Band table plus fail-safe supervisor.
pub struct ThermalController {
    curve: FanCurve,
    supervisor: ThermalSupervisor,
    inhibit_led_on_fault: bool,
    fan: FanState,
}

impl ThermalController {
    pub fn new(config: &LightConfig) -> Self {
        Self::with_curve(
            FanCurve::default(),
            ThermalSupervisor::new(config),
            config.inhibit_led_on_thermal_fault,
        )
    }

    pub fn with_curve(curve: FanCurve, supervisor: ThermalSupervisor, inhibit_led_on_fault: bool) -> Self {
        Self {
            curve,
            supervisor,
            inhibit_led_on_fault,
            fan: FanState { duty: 0 },
        }
    }

    /// Evaluate one sample.  Any fault forces full fan duty.
    pub fn update(&mut self, sample: Option<f32>) -> ThermalDecision {
        let faults = self.supervisor.evaluate(sample);

        let fan_duty = match sample {
            Some(t) if faults == 0 => self.curve.duty_for(t),
            _ => FAN_DUTY_MAX,
        };
        if fan_duty != self.fan.duty {
            debug!("fan duty {} -> {} (sample {:?})", self.fan.duty, fan_duty, sample);
        }
        self.fan.duty = fan_duty;

        ThermalDecision {
            fan_duty,
            inhibit_led: faults != 0 && self.inhibit_led_on_fault,
            faults,
        }
    }

    pub fn fan(&self) -> FanState {
        self.fan
    }

    pub fn faults(&self) -> u8 {
        self.supervisor.faults()
    }

    pub fn curve(&self) -> &FanCurve {
        &self.curve
    }
}
