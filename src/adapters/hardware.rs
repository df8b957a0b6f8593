//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the thermistor and both PWM channels, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets, the
//! underlying drivers use cfg-gated simulation stubs.

use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::pwm::PwmChannel;
use crate::sensors::Thermistor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    thermistor: Thermistor,
    led: PwmChannel,
    fan: PwmChannel,
}

impl HardwareAdapter {
    pub fn new(thermistor: Thermistor, led: PwmChannel, fan: PwmChannel) -> Self {
        Self { thermistor, led, fan }
    }

    pub fn led_duty(&self) -> u16 {
        self.led.duty()
    }

    pub fn fan_duty(&self) -> u16 {
        self.fan.duty()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_temperature(&mut self) -> Option<f32> {
        self.thermistor.read_celsius()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_led_duty(&mut self, channel: usize, duty: u32) {
        // single-channel board
        if channel != 0 {
            warn!("no LED channel {channel}");
            return;
        }
        self.led.set(duty);
    }

    fn set_fan_duty(&mut self, duty: u32) {
        self.fan.set(duty);
    }

    fn all_off(&mut self) {
        self.led.set(0);
        self.fan.set(0);
    }
}
