//! The controller as seen from a 68000-family CPU: the peripheral window
//! and the interrupt acknowledge window in a 32-bit big-endian space.

use cyclecore_common::{
    AccessMode, AddressSpace, DataWidth, DeviceAccess, DeviceTag, Endianness, MapTarget, Result,
    Scheduler, SpaceConfig,
};

use crate::regs::WINDOW_END;
use crate::Scc68070;

pub const PERIPHERAL_BASE: u32 = 0x8000_0000;
pub const IACK_BASE: u32 = 0xffff_fff0;
pub const IACK_END: u32 = 0xffff_ffff;

/// Configuration of the CPU-side program space the controller maps into.
pub fn cpu_space_config(name: &str) -> SpaceConfig {
    SpaceConfig::builder()
        .name(name)
        .address_bits(32)
        .data_width(DataWidth::Bits16)
        .endianness(Endianness::Big)
        .unmap_value(0)
        .build()
}

/// Install the peripheral window and the acknowledge window.
pub fn internal_map(space: &mut AddressSpace, periph: DeviceTag, iack: DeviceTag) -> Result<()> {
    space.install(
        PERIPHERAL_BASE,
        PERIPHERAL_BASE + WINDOW_END,
        0,
        MapTarget::Device(periph),
    )?;
    space.install(IACK_BASE, IACK_END, 0, MapTarget::Device(iack))
}

/// Routes accesses from an address space to the controller.
pub struct SccPort<'a> {
    pub scc: &'a mut Scc68070,
    pub scheduler: &'a mut Scheduler,
    pub periph: DeviceTag,
    pub iack: DeviceTag,
}

impl DeviceAccess for SccPort<'_> {
    fn device_read(&mut self, tag: DeviceTag, offset: u32, mem_mask: u16, mode: AccessMode) -> u16 {
        if tag == self.periph {
            self.scc.periphs_r(offset, mem_mask, mode)
        } else if tag == self.iack && mem_mask & 0x00ff != 0 {
            // The vector is driven on the low byte lane.
            u16::from(self.scc.iack_r((offset / 2) as u8, mode))
        } else {
            0
        }
    }

    fn device_write(
        &mut self,
        tag: DeviceTag,
        offset: u32,
        data: u16,
        mem_mask: u16,
        _mode: AccessMode,
    ) {
        if tag == self.periph {
            self.scc.periphs_w(offset, data, mem_mask, self.scheduler);
        }
    }
}
