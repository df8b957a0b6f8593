//! LEDC PWM channel driver.
//!
//! Implements [`embedded_hal::pwm::SetDutyCycle`] over one LEDC channel so
//! the hardware adapter can treat the LED and fan outputs uniformly.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC duty register via hw_init.
//! On host/test: only tracks the last duty written.

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::drivers::hw_init;

pub struct PwmChannel {
    channel: u32,
    max_duty: u16,
    duty: u16,
}

impl PwmChannel {
    /// `resolution_bits` must match the timer the channel is bound to.
    pub fn new(channel: u32, resolution_bits: u32) -> Self {
        let max_duty = ((1u32 << resolution_bits.min(16)) - 1) as u16;
        Self {
            channel,
            max_duty,
            duty: 0,
        }
    }

    /// Write a raw duty, saturating at the channel maximum.
    pub fn set(&mut self, duty: u32) {
        let duty = duty.min(u32::from(self.max_duty)) as u16;
        let _ = self.set_duty_cycle(duty);
    }

    pub fn duty(&self) -> u16 {
        self.duty
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }
}

impl ErrorType for PwmChannel {
    type Error = Infallible;
}

impl SetDutyCycle for PwmChannel {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let duty = duty.min(self.max_duty);
        hw_init::ledc_set(self.channel, u32::from(duty));
        self.duty = duty;
        Ok(())
    }
}
