//! NTC thermistor on the LED heatsink (100 kOhm @ 25 C, B = 3950).
//!
//! The NTC sits on the ground side of a divider with a 100 kOhm reference
//! resistor and is read via ADC1.  Each reading averages a burst of
//! samples, then applies the Beta equation.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH6 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static AtomicU16 for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

/// Injected ADC value for simulation; ~25 C at mid-scale.
#[cfg(not(target_os = "espidf"))]
static SIM_THERMISTOR_ADC: AtomicU16 = AtomicU16::new(2048);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(raw: u16) {
    SIM_THERMISTOR_ADC.store(raw, Ordering::Relaxed);
}

const R_NOMINAL: f32 = 100_000.0;
const R_REFERENCE: f32 = 100_000.0;
const BETA: f32 = 3950.0;
const T_NOMINAL_K: f32 = 298.15;
const ADC_MAX: f32 = 4095.0;

/// Samples averaged per reading.
pub const SMOOTHING_SAMPLES: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermistorReading {
    /// Averaged raw ADC value.
    pub raw: u16,
    pub celsius: f32,
}

pub struct Thermistor {
    samples: u16,
}

impl Thermistor {
    pub fn new() -> Self {
        Self::with_samples(SMOOTHING_SAMPLES)
    }

    pub fn with_samples(samples: u16) -> Self {
        Self { samples: samples.max(1) }
    }

    /// `None` if a conversion failed or the divider is at a rail (open or
    /// shorted sensor).
    pub fn read(&self) -> Option<ThermistorReading> {
        let mut sum: u32 = 0;
        for _ in 0..self.samples {
            sum += u32::from(self.read_adc()?);
        }
        let raw = (sum / u32::from(self.samples)) as u16;
        let celsius = adc_to_celsius(raw)?;
        Some(ThermistorReading { raw, celsius })
    }

    pub fn read_celsius(&self) -> Option<f32> {
        self.read().map(|r| r.celsius)
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Option<u16> {
        hw_init::adc1_read(hw_init::ADC1_CH_THERMISTOR)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Option<u16> {
        Some(SIM_THERMISTOR_ADC.load(Ordering::Relaxed))
    }
}

impl Default for Thermistor {
    fn default() -> Self {
        Self::new()
    }
}

/// Beta-equation conversion.  `None` at either rail.
pub fn adc_to_celsius(raw: u16) -> Option<f32> {
    let raw = f32::from(raw);
    if raw <= 0.0 || raw >= ADC_MAX {
        return None;
    }
    let r_ntc = R_REFERENCE * raw / (ADC_MAX - raw);
    let inv_t = (1.0 / T_NOMINAL_K) + (r_ntc / R_NOMINAL).ln() / BETA;
    if inv_t <= 0.0 {
        return None;
    }
    Some(1.0 / inv_t - 273.15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_scale_is_nominal_temperature() {
        let t = adc_to_celsius(2048).unwrap();
        assert!((t - 25.0).abs() < 0.1, "got {t}");
    }

    #[test]
    fn lower_ntc_resistance_is_hotter() {
        let hot = adc_to_celsius(1000).unwrap();
        let cold = adc_to_celsius(3000).unwrap();
        assert!(hot > 25.0);
        assert!(cold < 25.0);
    }

    #[test]
    fn rails_are_unavailable() {
        assert_eq!(adc_to_celsius(0), None);
        assert_eq!(adc_to_celsius(4095), None);
    }

    #[test]
    fn averaged_reading_follows_injected_adc() {
        let probe = Thermistor::with_samples(4);
        sim_set_adc(1000);
        let r = probe.read().unwrap();
        assert_eq!(r.raw, 1000);
        assert_eq!(probe.read_celsius(), adc_to_celsius(1000));

        sim_set_adc(0);
        assert_eq!(probe.read(), None);
        sim_set_adc(2048);
    }
}
