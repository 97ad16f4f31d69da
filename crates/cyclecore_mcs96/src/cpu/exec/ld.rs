use crate::cpu::{timing, Bus, Mcs96};

impl Mcs96 {
    /// LD, LDBZE, LDB, LDBSE: `op aop dreg`. Loads leave the flags alone.
    pub(super) fn exec_load<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        match opcode & 0xfc {
            0xa0 => {
                let (aop, mode) = self.decode_aop(bus, opcode, 2);
                let dreg = self.fetch8(bus);
                let value = self.read_op16(bus, aop);
                self.reg_w16(bus, dreg, value);
                timing::for_mode(&timing::TWO_OP_WORD, mode)
            }
            0xb0 => {
                let (aop, mode) = self.decode_aop(bus, opcode, 1);
                let dreg = self.fetch8(bus);
                let value = self.read_op8(bus, aop);
                self.reg_w8(bus, dreg, value);
                timing::for_mode(&timing::TWO_OP_BYTE, mode)
            }
            sext => {
                let (aop, mode) = self.decode_aop(bus, opcode, 1);
                let dreg = self.fetch8(bus);
                let byte = self.read_op8(bus, aop);
                let value = if sext == 0xbc {
                    i16::from(byte as i8) as u16
                } else {
                    u16::from(byte)
                };
                self.reg_w16(bus, dreg, value);
                timing::for_mode(&timing::TWO_OP_BYTE, mode)
            }
        }
    }

    /// ST and STB: `op aop wreg`, storing the register to `aop`.
    pub(super) fn exec_store<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let byte = opcode & 0x04 != 0;
        let (aop, mode) = self.decode_aop(bus, opcode, if byte { 1 } else { 2 });
        let reg = self.fetch8(bus);
        if byte {
            let value = self.reg_r8(bus, reg);
            self.write_op8(bus, aop, value);
        } else {
            let value = self.reg_r16(bus, reg);
            self.write_op16(bus, aop, value);
        }
        timing::for_mode(&timing::STORE, mode)
    }
}
