//! Board wiring: memory map, device routing and the run loop glue.

mod board;
mod bus;

pub use board::{Board, BoardConfig, CPU_TAG, SCC_TAG};

use cyclecore_common::DeviceTag;

pub const RAM_START: u32 = 0x0100;
pub const RAM_END: u32 = 0x1eff;

/// Reading `IACK_START + level` runs an SCC68070 acknowledge cycle.
pub const IACK_START: u32 = 0x1f00;
pub const IACK_END: u32 = 0x1f07;

/// Frame counter, low byte then high byte.
pub const FRAME_LATCH: u32 = 0x1f10;

pub const ROM_START: u32 = 0x2000;
pub const ROM_END: u32 = 0x7fff;
pub const ROM_SIZE: usize = (ROM_END - ROM_START + 1) as usize;

/// SCC68070 register window; the offset into the window is the register
/// offset.
pub const SCC_START: u32 = 0x8000;
pub const SCC_END: u32 = 0xffff;

const SCC_DEVICE: DeviceTag = DeviceTag(0);
const IACK_DEVICE: DeviceTag = DeviceTag(1);
const LATCH_DEVICE: DeviceTag = DeviceTag(2);
