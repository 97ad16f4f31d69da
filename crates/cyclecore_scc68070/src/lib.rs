//! Philips SCC68070 on-chip peripherals: the LIR/PICR interrupt network,
//! I2C, UART, timers, DMA and MMU register banks.
//!
//! The controller does not own a CPU. Its priority level comes out through
//! [`Scc68070::take_irq_line_change`] and [`Scc68070::ipl`], and the host
//! routes register accesses, acknowledge cycles and timer expiries to it.

mod controller;
mod logging;
pub mod periph;
pub mod port;
pub mod regs;
mod state;

use cyclecore_common::{Device, DeviceType};

pub use controller::{
    autovector, internal_vector, IackCallback, Scc68070, Scc68070Config, SccLine, UartTxSink,
};
pub use logging::LogChannels;
pub use periph::uart::UART_FIFO_SIZE;

fn create(tag: &str, clock: u32) -> Box<dyn Device> {
    Box::new(Scc68070::new(
        tag,
        Scc68070Config::builder().clock(clock).build(),
    ))
}

pub const SCC68070: DeviceType = DeviceType {
    shortname: "scc68070",
    fullname: "Philips SCC68070",
    default_clock: 15_500_000,
    factory: create,
};
