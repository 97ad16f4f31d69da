mod alu;
mod control;
mod ld;
mod single;
mod stack;
mod system;

pub(crate) use alu::AluOp;

use super::{Bus, InstState, Mcs96};

impl Mcs96 {
    /// Execute the instruction latched in `Exec(op)` and charge its cost.
    ///
    /// Encodings outside the 8096 set take no cycles and leave the state
    /// untouched, which the run loop reports as an unhandled instruction.
    pub(crate) fn execute_opcode<B: Bus>(&mut self, bus: &mut B, op: u16) {
        let opcode = op as u8;
        let states = match op {
            0x00 => self.exec_skip(bus),
            0x01..=0x03 | 0x05..=0x07 | 0x11..=0x13 | 0x15..=0x17 => {
                self.exec_single(bus, opcode)
            }
            0x08..=0x0a | 0x0c..=0x0e | 0x18..=0x1a => self.exec_shift(bus, opcode),
            0x0f => self.exec_norml(bus),

            0x20..=0x27 => self.exec_sjmp(bus, opcode),
            0x28..=0x2f => self.exec_scall(bus, opcode),
            0x30..=0x3f => self.exec_jbit(bus, opcode),

            // 3-operand: AND ADD SUB MULU ANDB ADDB SUBB MULUB
            0x40..=0x5f => {
                let alu = AluOp::three_op(opcode);
                self.exec_alu(bus, alu, opcode, true)
            }
            // 2-operand arithmetic and logic
            0x60..=0x9f | 0xa4..=0xab | 0xb4..=0xbb => {
                let alu = AluOp::two_op(opcode);
                self.exec_alu(bus, alu, opcode, false)
            }
            // LD, LDBZE, LDB, LDBSE
            0xa0..=0xa3 | 0xac..=0xaf | 0xb0..=0xb3 | 0xbc..=0xbf => self.exec_load(bus, opcode),

            0xc0 | 0xc2 | 0xc3 | 0xc4 | 0xc6 | 0xc7 => self.exec_store(bus, opcode),
            0xc8..=0xcb => self.exec_push(bus, opcode),
            0xcc | 0xce | 0xcf => self.exec_pop(bus, opcode),

            0xd0..=0xdf => self.exec_jcc(bus, opcode),
            0xe0 => self.exec_djnz(bus),
            0xe3 => self.exec_br_indirect(bus),
            0xe7 => self.exec_ljmp(bus),
            0xef => self.exec_lcall(bus),
            0xf0 => self.exec_ret(bus),
            0xf2 => self.exec_pushf(bus),
            0xf3 => self.exec_popf(bus),
            0xf7 => self.exec_trap(bus),
            0xf8..=0xfd => self.exec_psw_op(opcode),
            0xff => self.exec_rst(),

            // 0xfe prefix: signed MUL (3-op), MULB (3-op), MUL, MULB, DIV, DIVB
            0x14c..=0x14f | 0x15c..=0x15f | 0x16c..=0x16f | 0x17c..=0x17f | 0x18c..=0x18f
            | 0x19c..=0x19f => {
                let alu = AluOp::signed(opcode);
                self.exec_alu(bus, alu, opcode, matches!(opcode & 0xf0, 0x40 | 0x50))
            }

            _ => return,
        };

        if self.inst_state == InstState::Exec(op) {
            self.inst_state = InstState::Fetch;
        }
        self.consume(states);
    }

    /// Relative branch from the current PC.
    #[inline]
    pub(crate) fn branch(&mut self, disp: i16) {
        self.pc = self.pc.wrapping_add(disp as u16);
    }
}
