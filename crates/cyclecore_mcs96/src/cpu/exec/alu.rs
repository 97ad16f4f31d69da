use crate::cpu::operands::{AddrMode, Operand};
use crate::cpu::{timing, Bus, Mcs96};

/// Operation of a 2- or 3-operand arithmetic/logic instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AluOp {
    And,
    Add,
    Sub,
    Mulu,
    AndB,
    AddB,
    SubB,
    MuluB,
    Or,
    Xor,
    Cmp,
    Divu,
    OrB,
    XorB,
    CmpB,
    DivuB,
    Addc,
    Subc,
    AddcB,
    SubcB,
    Mul,
    MulB,
    Div,
    DivB,
}

/// Groups of four opcodes starting at 0x60.
const TWO_OP: [Option<AluOp>; 24] = [
    Some(AluOp::And),
    Some(AluOp::Add),
    Some(AluOp::Sub),
    Some(AluOp::Mulu),
    Some(AluOp::AndB),
    Some(AluOp::AddB),
    Some(AluOp::SubB),
    Some(AluOp::MuluB),
    Some(AluOp::Or),
    Some(AluOp::Xor),
    Some(AluOp::Cmp),
    Some(AluOp::Divu),
    Some(AluOp::OrB),
    Some(AluOp::XorB),
    Some(AluOp::CmpB),
    Some(AluOp::DivuB),
    None, // LD
    Some(AluOp::Addc),
    Some(AluOp::Subc),
    None, // LDBZE
    None, // LDB
    Some(AluOp::AddcB),
    Some(AluOp::SubcB),
    None, // LDBSE
];

impl AluOp {
    pub(crate) fn three_op(opcode: u8) -> Self {
        Self::two_op(opcode + 0x20)
    }

    pub(crate) fn two_op(opcode: u8) -> Self {
        TWO_OP
            .get(usize::from(opcode.wrapping_sub(0x60) >> 2))
            .copied()
            .flatten()
            .unwrap_or(AluOp::And)
    }

    /// 0xfe-prefixed forms, keyed by the second opcode byte.
    pub(crate) fn signed(opcode: u8) -> Self {
        match opcode & 0xf0 {
            0x40 | 0x60 => AluOp::Mul,
            0x50 | 0x70 => AluOp::MulB,
            0x80 => AluOp::Div,
            _ => AluOp::DivB,
        }
    }

    fn is_byte(self) -> bool {
        matches!(
            self,
            AluOp::AndB
                | AluOp::AddB
                | AluOp::SubB
                | AluOp::MuluB
                | AluOp::OrB
                | AluOp::XorB
                | AluOp::CmpB
                | AluOp::DivuB
                | AluOp::AddcB
                | AluOp::SubcB
                | AluOp::MulB
                | AluOp::DivB
        )
    }

    fn states(self, mode: AddrMode, three: bool) -> u32 {
        match self {
            AluOp::Mulu => timing::muldiv(timing::MULU, mode),
            AluOp::MuluB => timing::muldiv(timing::MULUB, mode),
            AluOp::Divu => timing::muldiv(timing::DIVU, mode),
            AluOp::DivuB => timing::muldiv(timing::DIVUB, mode),
            AluOp::Mul => timing::muldiv(timing::MULU + timing::SIGNED_EXTRA, mode),
            AluOp::MulB => timing::muldiv(timing::MULUB + timing::SIGNED_EXTRA, mode),
            AluOp::Div => timing::muldiv(timing::DIVU + timing::SIGNED_EXTRA, mode),
            AluOp::DivB => timing::muldiv(timing::DIVUB + timing::SIGNED_EXTRA, mode),
            _ if three => timing::for_mode(&timing::THREE_OP, mode),
            _ if self.is_byte() => timing::for_mode(&timing::TWO_OP_BYTE, mode),
            _ => timing::for_mode(&timing::TWO_OP_WORD, mode),
        }
    }
}

impl Mcs96 {
    /// `op aop [sreg] dreg`: for the 2-operand form the destination is also
    /// the first source.
    pub(in crate::cpu) fn exec_alu<B: Bus>(
        &mut self,
        bus: &mut B,
        alu: AluOp,
        opcode: u8,
        three: bool,
    ) -> u32 {
        let size = if alu.is_byte() { 1 } else { 2 };
        let (aop, mode) = self.decode_aop(bus, opcode, size);
        let sreg = if three { Some(self.fetch8(bus)) } else { None };
        let dreg = self.fetch8(bus);
        let src = sreg.unwrap_or(dreg);

        if alu.is_byte() {
            self.alu_byte(bus, alu, aop, src, dreg);
        } else {
            self.alu_word(bus, alu, aop, src, dreg);
        }
        alu.states(mode, three)
    }

    fn alu_word<B: Bus>(&mut self, bus: &mut B, alu: AluOp, aop: Operand, src: u8, dreg: u8) {
        let b = self.read_op16(bus, aop);
        match alu {
            AluOp::Mulu => {
                let a = self.reg_r16(bus, src);
                self.reg_w32(bus, dreg, u32::from(a) * u32::from(b));
            }
            AluOp::Mul => {
                let a = self.reg_r16(bus, src) as i16;
                let product = i32::from(a) * i32::from(b as i16);
                self.reg_w32(bus, dreg, product as u32);
            }
            AluOp::Divu | AluOp::Div => {
                let dividend = self.reg_r32(bus, dreg);
                let result = if alu == AluOp::Divu {
                    self.do_divu(dividend, b)
                } else {
                    self.do_div(dividend, b)
                };
                if let Some(result) = result {
                    self.reg_w32(bus, dreg, result);
                }
            }
            _ => {
                let a = self.reg_r16(bus, src);
                let result = match alu {
                    AluOp::And => {
                        let r = a & b;
                        self.set_nz16(r);
                        r
                    }
                    AluOp::Or => {
                        let r = a | b;
                        self.set_nz16(r);
                        r
                    }
                    AluOp::Xor => {
                        let r = a ^ b;
                        self.set_nz16(r);
                        r
                    }
                    AluOp::Add => self.do_add(a, b),
                    AluOp::Addc => self.do_addc(a, b),
                    AluOp::Sub => self.do_sub(a, b),
                    AluOp::Subc => self.do_subc(a, b),
                    _ => {
                        // CMP
                        self.do_sub(a, b);
                        return;
                    }
                };
                self.reg_w16(bus, dreg, result);
            }
        }
    }

    fn alu_byte<B: Bus>(&mut self, bus: &mut B, alu: AluOp, aop: Operand, src: u8, dreg: u8) {
        let b = self.read_op8(bus, aop);
        match alu {
            AluOp::MuluB => {
                let a = self.reg_r8(bus, src);
                self.reg_w16(bus, dreg, u16::from(a) * u16::from(b));
            }
            AluOp::MulB => {
                let a = self.reg_r8(bus, src) as i8;
                let product = i16::from(a) * i16::from(b as i8);
                self.reg_w16(bus, dreg, product as u16);
            }
            AluOp::DivuB | AluOp::DivB => {
                let dividend = self.reg_r16(bus, dreg);
                let result = if alu == AluOp::DivuB {
                    self.do_divub(dividend, b)
                } else {
                    self.do_divb(dividend, b)
                };
                if let Some(result) = result {
                    self.reg_w16(bus, dreg, result);
                }
            }
            _ => {
                let a = self.reg_r8(bus, src);
                let result = match alu {
                    AluOp::AndB => {
                        let r = a & b;
                        self.set_nz8(r);
                        r
                    }
                    AluOp::OrB => {
                        let r = a | b;
                        self.set_nz8(r);
                        r
                    }
                    AluOp::XorB => {
                        let r = a ^ b;
                        self.set_nz8(r);
                        r
                    }
                    AluOp::AddB => self.do_addb(a, b),
                    AluOp::AddcB => self.do_addcb(a, b),
                    AluOp::SubB => self.do_subb(a, b),
                    AluOp::SubcB => self.do_subcb(a, b),
                    _ => {
                        // CMPB
                        self.do_subb(a, b);
                        return;
                    }
                };
                self.reg_w8(bus, dreg, result);
            }
        }
    }
}
