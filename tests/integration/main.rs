//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! the mock adapters in `mock_hw`. Everything runs on the host with no
//! real hardware or network.

mod end_to_end_tests;
mod mock_hw;
mod sensor_monitor_tests;
