//! Sensor drivers.

pub mod thermistor;

pub use thermistor::Thermistor;
