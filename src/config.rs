//! System configuration parameters
//!
//! All tunable parameters for the floodlight.  Values can be overridden via
//! NVS (see [`ConfigPort`](crate::app::ports::ConfigPort)); a missing blob
//! means factory defaults.

use serde::{Deserialize, Serialize};

use crate::light::duty::DutyLimits;

/// Name reported by `/detect` when nothing else is configured.
pub const DEFAULT_LIGHT_NAME: &str = "Dimmable LED Floodlight";

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightConfig {
    // --- Identity ---
    /// Human-readable light name (also the provisioning AP name).
    pub light_name: heapless::String<32>,
    /// Number of physical LED channels driven by this board.
    pub light_count: u8,

    // --- LED output ---
    /// Lowest non-zero duty; below it the driver does not respond (~8 %).
    pub led_min_duty: u32,
    /// Highest duty; caps peak driver current (~1.5 A).
    pub led_max_duty: u32,
    /// PWM resolution in bits for both LEDC timers.
    pub pwm_resolution_bits: u8,
    pub led_pwm_freq_hz: u32,
    pub fan_pwm_freq_hz: u32,

    // --- Transitions ---
    /// Engine ticks per declared transition-time unit.
    pub ticks_per_unit: u32,
    /// Transition applied when a request does not carry one.
    pub default_transition_units: i32,
    /// Length of the power-on ramp when the startup policy turns the light on.
    pub boot_ramp_ticks: u32,
    /// Upper bound on engine ticks run synchronously during boot.
    pub boot_settle_ticks: u32,

    // --- Thermal ---
    /// Absolute ceiling (Celsius) above which the thermal fail-safe engages.
    pub critical_temperature_c: f32,
    /// Force the LED output to zero while a thermal fault is active.
    pub inhibit_led_on_thermal_fault: bool,

    // --- Timing ---
    /// Idle control loop pause (milliseconds).
    pub loop_interval_ms: u32,
    /// Pause applied instead while a ramp is in progress (milliseconds).
    pub transition_pause_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,
    /// How long to wait for the station connection before restarting.
    pub wifi_connect_timeout_secs: u32,

    // --- Firmware update ---
    /// Shared token expected in `X-Update-Token`; empty disables the check.
    pub update_token: heapless::String<32>,
}

impl LightConfig {
    /// Duty floor/ceiling and resolution used by the LED channel.
    pub fn duty_limits(&self) -> DutyLimits {
        DutyLimits::new(
            self.led_min_duty,
            self.led_max_duty,
            1u32 << self.pwm_resolution_bits,
        )
    }

    /// Maximum raw duty value for the configured resolution (4095 @ 12 bit).
    pub fn max_raw_duty(&self) -> u32 {
        (1u32 << self.pwm_resolution_bits) - 1
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        let mut light_name = heapless::String::new();
        let _ = light_name.push_str(DEFAULT_LIGHT_NAME);

        Self {
            // Identity
            light_name,
            light_count: 1,

            // LED output
            led_min_duty: 180,
            led_max_duty: 2500,
            pwm_resolution_bits: crate::pins::PWM_RESOLUTION_BITS,
            led_pwm_freq_hz: crate::pins::LED_PWM_FREQ_HZ,
            fan_pwm_freq_hz: crate::pins::FAN_PWM_FREQ_HZ,

            // Transitions
            ticks_per_unit: 33,
            default_transition_units: 4,
            boot_ramp_ticks: 150,
            boot_settle_ticks: 200,

            // Thermal
            critical_temperature_c: 80.0,
            inhibit_led_on_thermal_fault: true,

            // Timing
            loop_interval_ms: 10,
            transition_pause_ms: 2,
            telemetry_interval_secs: 60,
            wifi_connect_timeout_secs: 120,

            update_token: heapless::String::new(),
        }
    }
}
