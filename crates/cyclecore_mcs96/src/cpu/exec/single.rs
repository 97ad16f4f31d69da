use crate::cpu::{timing, Bus, Mcs96};

impl Mcs96 {
    /// SKIP: two-byte no-op.
    pub(super) fn exec_skip<B: Bus>(&mut self, bus: &mut B) -> u32 {
        self.fetch8(bus);
        timing::SKIP
    }

    /// CLR, NOT, NEG, DEC, EXT, INC and their byte forms: `op reg`.
    pub(super) fn exec_single<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let reg = self.fetch8(bus);
        match opcode {
            0x01 => {
                self.reg_w16(bus, reg, 0);
                self.set_nz16(0);
            }
            0x02 => {
                let v = !self.reg_r16(bus, reg);
                self.reg_w16(bus, reg, v);
                self.set_nz16(v);
            }
            0x03 => {
                let v = self.reg_r16(bus, reg);
                let r = self.do_sub(0, v);
                self.reg_w16(bus, reg, r);
            }
            0x05 => {
                let v = self.reg_r16(bus, reg);
                let r = self.do_sub(v, 1);
                self.reg_w16(bus, reg, r);
            }
            0x06 => {
                // EXT: sign-extend the low word into a long.
                let v = self.reg_r16(bus, reg & 0xfc) as i16;
                let r = i32::from(v) as u32;
                self.reg_w32(bus, reg, r);
                self.set_nz32(r);
                return timing::EXT;
            }
            0x07 => {
                let v = self.reg_r16(bus, reg);
                let r = self.do_add(v, 1);
                self.reg_w16(bus, reg, r);
            }
            0x11 => {
                self.reg_w8(bus, reg, 0);
                self.set_nz8(0);
            }
            0x12 => {
                let v = !self.reg_r8(bus, reg);
                self.reg_w8(bus, reg, v);
                self.set_nz8(v);
            }
            0x13 => {
                let v = self.reg_r8(bus, reg);
                let r = self.do_subb(0, v);
                self.reg_w8(bus, reg, r);
            }
            0x15 => {
                let v = self.reg_r8(bus, reg);
                let r = self.do_subb(v, 1);
                self.reg_w8(bus, reg, r);
            }
            0x16 => {
                // EXTB: sign-extend a byte into a word.
                let v = self.reg_r8(bus, reg & 0xfe) as i8;
                let r = i16::from(v) as u16;
                self.reg_w16(bus, reg, r);
                self.set_nz16(r);
                return timing::EXT;
            }
            _ => {
                // 0x17 INCB
                let v = self.reg_r8(bus, reg);
                let r = self.do_addb(v, 1);
                self.reg_w8(bus, reg, r);
            }
        }
        timing::SINGLE_OP
    }

    /// Shift count operand: values below 16 are immediate, anything else
    /// names the byte register holding the count.
    fn shift_count<B: Bus>(&mut self, bus: &mut B, count: u8) -> u32 {
        if count < 16 {
            u32::from(count)
        } else {
            u32::from(self.reg_r8(bus, count) & 0x1f)
        }
    }

    /// SHR/SHL/SHRA in word, long and byte forms: `op count reg`.
    pub(super) fn exec_shift<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let count = self.fetch8(bus);
        let reg = self.fetch8(bus);
        let count = self.shift_count(bus, count);
        let kind = opcode & 3;
        match opcode & 0xf4 {
            // 0x08-0x0a word
            0x00 => {
                let v = u32::from(self.reg_r16(bus, reg));
                let r = self.shift(v, count, 16, kind);
                self.reg_w16(bus, reg, r as u16);
            }
            // 0x0c-0x0e long
            0x04 => {
                let v = self.reg_r32(bus, reg);
                let r = self.shift(v, count, 32, kind);
                self.reg_w32(bus, reg, r);
            }
            // 0x18-0x1a byte
            _ => {
                let v = u32::from(self.reg_r8(bus, reg));
                let r = self.shift(v, count, 8, kind);
                self.reg_w8(bus, reg, r as u8);
            }
        }
        timing::SHIFT_BASE + count
    }

    fn shift(&mut self, value: u32, count: u32, bits: u32, kind: u8) -> u32 {
        match kind {
            0 => self.shift_right(value, count, bits, false),
            1 => self.shift_left(value, count, bits),
            _ => self.shift_right(value, count, bits, true),
        }
    }

    /// NORML: `0x0f breg lreg`. Normalizes `lreg` and stores the shift
    /// count in `breg`.
    pub(super) fn exec_norml<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let breg = self.fetch8(bus);
        let lreg = self.fetch8(bus);
        let v = self.reg_r32(bus, lreg);
        let (r, count) = self.do_norml(v);
        self.reg_w32(bus, lreg, r);
        self.reg_w8(bus, breg, count);
        timing::NORML_BASE + u32::from(count)
    }
}
