use super::{Bus, Mcs96};

/// Addressing mode of the `aop` operand, from the opcode's low two bits
/// and, for indirect and indexed forms, the low bit of the register byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AddrMode {
    Direct,
    Immediate,
    Indirect,
    IndirectInc,
    ShortIndexed,
    LongIndexed,
}

impl AddrMode {
    /// Column in the timing tables.
    pub(crate) fn index(self) -> usize {
        match self {
            AddrMode::Direct => 0,
            AddrMode::Immediate => 1,
            AddrMode::Indirect => 2,
            AddrMode::IndirectInc => 3,
            AddrMode::ShortIndexed => 4,
            AddrMode::LongIndexed => 5,
        }
    }
}

/// A decoded `aop` operand: either a location or an immediate value.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Operand {
    Register(u8),
    Memory(u16),
    Immediate(u16),
}

impl Mcs96 {
    pub(crate) fn fetch8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read8(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch8(bus);
        let hi = self.fetch8(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Decode the `aop` operand bytes that follow the opcode. `size` is the
    /// operand width in bytes, used for immediates and auto-increment.
    pub(crate) fn decode_aop<B: Bus>(
        &mut self,
        bus: &mut B,
        opcode: u8,
        size: u16,
    ) -> (Operand, AddrMode) {
        match opcode & 3 {
            0 => (Operand::Register(self.fetch8(bus)), AddrMode::Direct),
            1 => {
                let value = if size == 1 {
                    u16::from(self.fetch8(bus))
                } else {
                    self.fetch16(bus)
                };
                (Operand::Immediate(value), AddrMode::Immediate)
            }
            2 => {
                let ireg = self.fetch8(bus);
                let reg = ireg & 0xfe;
                let addr = self.reg_r16(bus, reg);
                self.tmp = addr;
                if ireg & 1 != 0 {
                    self.reg_w16(bus, reg, addr.wrapping_add(size));
                    (Operand::Memory(addr), AddrMode::IndirectInc)
                } else {
                    (Operand::Memory(addr), AddrMode::Indirect)
                }
            }
            _ => {
                let ireg = self.fetch8(bus);
                let reg = ireg & 0xfe;
                let (disp, mode) = if ireg & 1 != 0 {
                    (self.fetch16(bus), AddrMode::LongIndexed)
                } else {
                    (self.fetch8(bus) as i8 as u16, AddrMode::ShortIndexed)
                };
                let addr = self.reg_r16(bus, reg).wrapping_add(disp);
                self.tmp = addr;
                (Operand::Memory(addr), mode)
            }
        }
    }

    pub(crate) fn read_op8<B: Bus>(&mut self, bus: &mut B, op: Operand) -> u8 {
        match op {
            Operand::Register(reg) => self.reg_r8(bus, reg),
            Operand::Memory(addr) => self.any_r8(bus, addr),
            Operand::Immediate(value) => value as u8,
        }
    }

    pub(crate) fn read_op16<B: Bus>(&mut self, bus: &mut B, op: Operand) -> u16 {
        match op {
            Operand::Register(reg) => self.reg_r16(bus, reg),
            Operand::Memory(addr) => self.any_r16(bus, addr),
            Operand::Immediate(value) => value,
        }
    }

    /// Store through an operand. Immediates are not locations; callers
    /// reject them at decode time.
    pub(crate) fn write_op8<B: Bus>(&mut self, bus: &mut B, op: Operand, value: u8) {
        match op {
            Operand::Register(reg) => self.reg_w8(bus, reg, value),
            Operand::Memory(addr) => self.any_w8(bus, addr, value),
            Operand::Immediate(_) => {}
        }
    }

    pub(crate) fn write_op16<B: Bus>(&mut self, bus: &mut B, op: Operand, value: u16) {
        match op {
            Operand::Register(reg) => self.reg_w16(bus, reg, value),
            Operand::Memory(addr) => self.any_w16(bus, addr, value),
            Operand::Immediate(_) => {}
        }
    }
}
