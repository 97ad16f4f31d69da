use crate::cpu::{timing, Bus, Mcs96, Psw};

impl Mcs96 {
    /// 11-bit displacement: low three opcode bits and the next byte.
    fn short_disp<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> i16 {
        let raw = (u16::from(opcode & 7) << 8) | u16::from(self.fetch8(bus));
        ((raw << 5) as i16) >> 5
    }

    pub(super) fn exec_sjmp<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let disp = self.short_disp(bus, opcode);
        self.branch(disp);
        timing::SJMP
    }

    pub(super) fn exec_scall<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let disp = self.short_disp(bus, opcode);
        let ret = self.pc;
        self.push(bus, ret);
        self.branch(disp);
        timing::CALL
    }

    /// JBC (0x30-0x37) and JBS (0x38-0x3f): `op breg disp8`.
    pub(super) fn exec_jbit<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let breg = self.fetch8(bus);
        let disp = self.fetch8(bus) as i8;
        let bit = self.reg_r8(bus, breg) & (1 << (opcode & 7)) != 0;
        let want_set = opcode & 0x08 != 0;
        if bit == want_set {
            self.branch(disp.into());
            timing::JBIT_TAKEN
        } else {
            timing::JBIT_NOT_TAKEN
        }
    }

    /// Conditional jumps 0xd0-0xdf. The upper half takes the jump when the
    /// lower half would not. JVT and JNVT clear VT after testing it.
    pub(super) fn exec_jcc<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let disp = self.fetch8(bus) as i8;
        let psw = self.psw;
        let negative_form = match opcode & 7 {
            0 => !psw.contains(Psw::ST),
            1 => !psw.contains(Psw::C) || psw.contains(Psw::Z),
            2 => !psw.contains(Psw::N) && !psw.contains(Psw::Z),
            3 => !psw.contains(Psw::C),
            4 => !psw.contains(Psw::VT),
            5 => !psw.contains(Psw::V),
            6 => !psw.contains(Psw::N),
            _ => !psw.contains(Psw::Z),
        };
        if opcode & 7 == 4 {
            self.psw.remove(Psw::VT);
        }
        // JNST JNH JGT JNC JNVT JNV JGE JNE / JST JH JLE JC JVT JV JLT JE
        let taken = if opcode & 0x08 == 0 {
            negative_form
        } else {
            !negative_form
        };
        if taken {
            self.branch(disp.into());
            timing::JCC_TAKEN
        } else {
            timing::JCC_NOT_TAKEN
        }
    }

    pub(super) fn exec_djnz<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let breg = self.fetch8(bus);
        let disp = self.fetch8(bus) as i8;
        let count = self.reg_r8(bus, breg).wrapping_sub(1);
        self.reg_w8(bus, breg, count);
        if count != 0 {
            self.branch(disp.into());
            timing::DJNZ_TAKEN
        } else {
            timing::DJNZ_NOT_TAKEN
        }
    }

    /// BR [wreg]
    pub(super) fn exec_br_indirect<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let reg = self.fetch8(bus);
        self.pc = self.reg_r16(bus, reg);
        timing::BR
    }

    pub(super) fn exec_ljmp<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let disp = self.fetch16(bus) as i16;
        self.branch(disp);
        timing::LJMP
    }

    pub(super) fn exec_lcall<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let disp = self.fetch16(bus) as i16;
        let ret = self.pc;
        self.push(bus, ret);
        self.branch(disp);
        timing::CALL
    }

    pub(super) fn exec_ret<B: Bus>(&mut self, bus: &mut B) -> u32 {
        self.pc = self.pop(bus);
        timing::RET
    }
}
