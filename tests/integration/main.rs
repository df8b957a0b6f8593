//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real hardware required.

// critical-section implementation for the bridge channels
use critical_section as _;

mod bridge_tests;
mod mock_hw;
mod router_tests;
mod service_tests;
