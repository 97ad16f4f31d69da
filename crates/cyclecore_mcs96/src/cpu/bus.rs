use cyclecore_common::LineState;

/// The CPU's view of the machine: the 16-bit little-endian program space
/// plus the hooks the execution engine needs from its owner.
///
/// Only `read8`/`write8` are required; a flat test bus is a 64 KiB array.
pub trait Bus {
    fn read8(&mut self, addr: u16) -> u8;
    fn write8(&mut self, addr: u16, value: u8);

    /// Word read on an even address. The default assembles two byte reads.
    fn read16(&mut self, addr: u16) -> u16 {
        let lo = self.read8(addr);
        let hi = self.read8(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn write16(&mut self, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write8(addr, lo);
        self.write8(addr.wrapping_add(1), hi);
    }

    /// Read of a special function register the core does not implement
    /// itself (0x02-0x17 except the interrupt and timer registers).
    fn sfr_read(&mut self, adr: u8) -> u8 {
        log::debug!("unimplemented SFR read {adr:02x}");
        0xff
    }

    fn sfr_write(&mut self, adr: u8, value: u8) {
        log::debug!("unimplemented SFR write {adr:02x} = {value:02x}");
    }

    /// Called before every state executes, with the CPU's running cycle
    /// count. Machines publish the CPU's local time to their scheduler here
    /// so that timers armed by the instruction are relative to it.
    fn begin_instruction(&mut self, _total_cycles: u64) {}

    /// Next pending change of a CPU input line, applied at instruction
    /// boundaries.
    fn next_input_line_change(&mut self) -> Option<(u8, LineState)> {
        None
    }

    /// True when the machine wants the CPU to give up the rest of its
    /// timeslice at the next instruction boundary.
    fn timeslice_aborted(&self) -> bool {
        false
    }
}
