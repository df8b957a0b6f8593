//! Thermal safety supervisor.
//!
//! Runs every tick before the fan table is consulted and accumulates a fault
//! bitmask.  While any fault is latched the fan runs flat out and, if
//! configured, the LED output is held at zero.
//!
//! ## Fault lifecycle
//!
//! 1. A sample is missing / non-finite, or above the critical ceiling.
//! 2. The supervisor sets the corresponding bit and logs it once.
//! 3. Each tick re-evaluates; a bit clears as soon as its condition does.
//!
//! A stale reading is never reused: no sample this tick means
//! [`ThermalFault::SensorUnavailable`].

use crate::config::LightConfig;
use crate::error::ThermalFault;
use log::{error, info};

/// Thermal safety supervisor.
pub struct ThermalSupervisor {
    critical_c: f32,
    /// Latched fault bitmask.
    faults: u8,
}

impl ThermalSupervisor {
    pub fn new(config: &LightConfig) -> Self {
        Self::with_ceiling(config.critical_temperature_c)
    }

    pub fn with_ceiling(critical_c: f32) -> Self {
        Self {
            critical_c,
            faults: 0,
        }
    }

    /// Evaluate the latest sample.  Returns the updated fault bitmask.
    pub fn evaluate(&mut self, sample: Option<f32>) -> u8 {
        let usable = sample.filter(|t| t.is_finite());

        self.eval_fault(ThermalFault::SensorUnavailable, usable.is_none());
        self.eval_fault(
            ThermalFault::OverTemperature,
            usable.is_some_and(|t| t > self.critical_c),
        );

        self.faults
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: ThermalFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: ThermalFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("THERMAL FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("THERMAL FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
