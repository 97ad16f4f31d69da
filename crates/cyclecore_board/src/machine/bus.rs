use cyclecore_common::{
    AccessMode, AddressSpace, Attotime, DeviceAccess, DeviceTag, LineState, Scheduler,
};
use cyclecore_mcs96::{Bus, EXINT_LINE};
use cyclecore_scc68070::Scc68070;

use super::{IACK_DEVICE, LATCH_DEVICE, SCC_DEVICE};

/// The memory-mapped devices of the board.
pub(super) struct BoardDevices<'a> {
    pub scc: &'a mut Scc68070,
    pub scheduler: &'a mut Scheduler,
    pub frame_counter: u16,
}

/// Byte lane of an SCC68070 register byte: even offsets are the high half
/// of the big-endian word.
fn scc_lane(offset: u32) -> (u16, u32) {
    if offset & 1 == 0 {
        (0xff00, 8)
    } else {
        (0x00ff, 0)
    }
}

impl DeviceAccess for BoardDevices<'_> {
    fn device_read(&mut self, tag: DeviceTag, offset: u32, _mem_mask: u16, mode: AccessMode) -> u16 {
        match tag {
            SCC_DEVICE => {
                let (mask, shift) = scc_lane(offset);
                (self.scc.periphs_r(offset & !1, mask, mode) >> shift) & 0x00ff
            }
            IACK_DEVICE => u16::from(self.scc.iack_r(offset as u8, mode)),
            LATCH_DEVICE => {
                let [lo, hi] = self.frame_counter.to_le_bytes();
                u16::from(if offset & 1 == 0 { lo } else { hi })
            }
            _ => 0x00ff,
        }
    }

    fn device_write(
        &mut self,
        tag: DeviceTag,
        offset: u32,
        data: u16,
        _mem_mask: u16,
        _mode: AccessMode,
    ) {
        match tag {
            SCC_DEVICE => {
                let (mask, shift) = scc_lane(offset);
                self.scc
                    .periphs_w(offset & !1, (data & 0x00ff) << shift, mask, self.scheduler);
            }
            _ => log::debug!("board: ignored write {data:02x} to {tag:?}+{offset:x}"),
        }
    }
}

/// The CPU's view of the board for one timeslice.
pub(super) struct CpuBus<'a> {
    pub program: &'a mut AddressSpace,
    pub devices: BoardDevices<'a>,
    pub clock: u32,
    pub exint: &'a mut LineState,
    pub exint_level: u8,
}

impl Bus for CpuBus<'_> {
    fn read8(&mut self, addr: u16) -> u8 {
        self.program
            .read8(u32::from(addr), AccessMode::Normal, &mut self.devices)
    }

    fn write8(&mut self, addr: u16, value: u8) {
        self.program
            .write8(u32::from(addr), value, AccessMode::Normal, &mut self.devices);
    }

    fn begin_instruction(&mut self, total_cycles: u64) {
        self.devices
            .scheduler
            .set_local_time(Attotime::from_cycles(total_cycles, self.clock));
    }

    fn next_input_line_change(&mut self) -> Option<(u8, LineState)> {
        exint_change(self.devices.scc, self.exint, self.exint_level)
    }

    fn timeslice_aborted(&self) -> bool {
        self.devices.scheduler.timeslice_aborted()
    }
}

/// Fold the controller's priority level into the CPU's single EXINT pin,
/// asserted while the level is at least `level`.
pub(super) fn exint_change(
    scc: &mut Scc68070,
    exint: &mut LineState,
    level: u8,
) -> Option<(u8, LineState)> {
    while scc.take_irq_line_change().is_some() {}
    let state = LineState::from(scc.ipl() >= level);
    if state == *exint {
        return None;
    }
    *exint = state;
    Some((EXINT_LINE, state))
}
