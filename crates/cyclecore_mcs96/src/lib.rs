//! Intel MCS-96 CPU core, 8096 branch.
//!
//! The core executes against a [`Bus`] supplied by the machine, the same way
//! a hand-wired board drives its CPU: the machine owns memory, peripherals
//! and the scheduler, the CPU owns its register file and PSW.

pub mod cpu;

use cyclecore_common::{Device, DeviceType};

pub use cpu::{
    Bus, InstState, Mcs96, Mcs96Config, Psw, EXINT_LINE, REGISTER_WINDOW_END, RESET_PC,
};

fn create(tag: &str, clock: u32) -> Box<dyn Device> {
    Box::new(Mcs96::new(tag, Mcs96Config::builder().clock(clock).build()))
}

pub const MCS96: DeviceType = DeviceType {
    shortname: "mcs96",
    fullname: "Intel MCS-96 (8096)",
    default_clock: 12_000_000,
    factory: create,
};
