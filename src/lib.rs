//! Floodlight firmware library.
//!
//! Exposes the pure-logic modules for integration testing and fuzzing.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; on the host the same modules run against
//! simulation stubs.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod light;
pub mod ota;
pub mod pins;
pub mod prefs;
pub mod safety;
pub mod thermal;

pub mod adapters;
pub mod control;
pub mod drivers;
pub mod sensors;

// embassy-sync channels need a critical-section implementation on the host
#[cfg(test)]
use critical_section as _;
