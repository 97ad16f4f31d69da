//! A small reference machine built from the cyclecore parts: an MCS-96 CPU
//! whose external interrupt is driven by an SCC68070 interrupt controller,
//! with RAM, a ROM window and a 60 Hz frame timer.

pub mod machine;

use cyclecore_common::register_device_type;

pub use machine::{Board, BoardConfig};

/// Register every device type this crate knows how to build.
pub fn register_builtin_devices() {
    register_device_type(cyclecore_mcs96::MCS96);
    register_device_type(cyclecore_scc68070::SCC68070);
}
