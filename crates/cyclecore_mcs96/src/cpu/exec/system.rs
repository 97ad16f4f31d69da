use crate::cpu::interrupts::TRAP_VECTOR;
use crate::cpu::{timing, Bus, InstState, Mcs96, Psw};

impl Mcs96 {
    pub(super) fn exec_trap<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let ret = self.pc;
        self.push(bus, ret);
        self.pc = self.any_r16(bus, TRAP_VECTOR);
        timing::TRAP
    }

    /// CLRC, SETC, DI, EI, CLRVT, NOP (0xf8-0xfd).
    pub(super) fn exec_psw_op(&mut self, opcode: u8) -> u32 {
        match opcode {
            0xf8 => self.psw.remove(Psw::C),
            0xf9 => self.psw.insert(Psw::C),
            0xfa | 0xfb => {
                self.psw.set(Psw::I, opcode == 0xfb);
                self.check_irq();
                self.inst_state = InstState::FetchNoIrq;
            }
            0xfc => self.psw.remove(Psw::VT),
            _ => {}
        }
        timing::SIMPLE
    }

    pub(super) fn exec_rst(&mut self) -> u32 {
        log::debug!("{}: RST at {:04x}", self.tag(), self.ppc);
        self.reset();
        timing::RST
    }
}
