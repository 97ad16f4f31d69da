use crate::cpu::{timing, Bus, InstState, Mcs96, Psw};

impl Mcs96 {
    pub(super) fn exec_push<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let (aop, mode) = self.decode_aop(bus, opcode, 2);
        let value = self.read_op16(bus, aop);
        self.push(bus, value);
        timing::for_mode(&timing::PUSH, mode)
    }

    pub(super) fn exec_pop<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let (aop, mode) = self.decode_aop(bus, opcode, 2);
        let value = self.pop(bus);
        self.write_op16(bus, aop, value);
        timing::for_mode(&timing::POP, mode)
    }

    /// PUSHF saves the PSW and then clears all of it, interrupt mask
    /// included.
    pub(super) fn exec_pushf<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let psw = self.psw.bits();
        self.push(bus, psw);
        self.psw = Psw::empty();
        self.check_irq();
        self.inst_state = InstState::FetchNoIrq;
        timing::PUSHF
    }

    pub(super) fn exec_popf<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let psw = self.pop(bus);
        self.psw = Psw::from_bits_retain(psw);
        self.check_irq();
        self.inst_state = InstState::FetchNoIrq;
        timing::POPF
    }
}
