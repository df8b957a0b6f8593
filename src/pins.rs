//! GPIO / peripheral pin assignments for the floodlight driver board.
//!
//! Single source of truth; every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// LED driver (constant-current buck, PWM dimming input)
// ---------------------------------------------------------------------------

/// LEDC PWM output to the LED driver dimming input.
pub const LED_PWM_GPIO: i32 = 23;
/// LED channels on the board; one dimming output.
pub const MAX_LIGHTS: u8 = 1;

// ---------------------------------------------------------------------------
// Cooling fan (4-wire, 25 kHz PWM control input)
// ---------------------------------------------------------------------------

pub const FAN_PWM_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Sensors: Analog (ADC1)
// ---------------------------------------------------------------------------

/// NTC thermistor on the LED heatsink, 100 kΩ @ 25 °C, 100 kΩ reference.
/// ADC1 channel 6 (GPIO 34 on ESP32).
pub const THERMISTOR_ADC_GPIO: i32 = 34;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  12-bit gives 0 – 4095 duty levels.
pub const PWM_RESOLUTION_BITS: u8 = 12;
/// LEDC base frequency for the LED driver.
pub const LED_PWM_FREQ_HZ: u32 = 2_000;
/// LEDC base frequency for the fan (25 kHz, inaudible, 4-wire fan standard).
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;
