use bitflags::bitflags;

use super::{Bus, Mcs96, REGISTER_WINDOW_END};

bitflags! {
    /// Program status word. The low byte is the interrupt mask (INT_MASK).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Psw: u16 {
        const Z = 0x8000;
        const N = 0x4000;
        const V = 0x2000;
        /// Overflow trap (sticky V).
        const VT = 0x1000;
        const C = 0x0800;
        const I = 0x0200;
        /// Sticky bit, set by right shifts that lose ones.
        const ST = 0x0100;
    }
}

pub(crate) const ZERO_REG: u8 = 0x00;
pub(crate) const INT_MASK: u8 = 0x08;
pub(crate) const INT_PENDING: u8 = 0x09;
pub(crate) const TIMER1_LO: u8 = 0x0a;
pub(crate) const TIMER1_HI: u8 = 0x0b;
pub(crate) const SP: u8 = 0x18;

/// Last special function register; register RAM starts after it.
const SFR_END: u8 = 0x17;

impl Mcs96 {
    pub fn int_mask_r(&self) -> u8 {
        self.psw.bits() as u8
    }

    pub fn int_mask_w(&mut self, data: u8) {
        self.psw = Psw::from_bits_retain((self.psw.bits() & 0xff00) | u16::from(data));
        self.check_irq();
    }

    pub fn int_pending_r(&self) -> u8 {
        self.pending_irq
    }

    pub fn int_pending_w(&mut self, data: u8) {
        self.pending_irq = data;
        self.check_irq();
    }

    pub(crate) fn reg_r8<B: Bus>(&mut self, bus: &mut B, adr: u8) -> u8 {
        match adr {
            ZERO_REG | 0x01 => 0,
            INT_MASK => self.int_mask_r(),
            INT_PENDING => self.int_pending_r(),
            TIMER1_LO => self.timer1_value() as u8,
            TIMER1_HI => (self.timer1_value() >> 8) as u8,
            0x02..=SFR_END => bus.sfr_read(adr),
            _ => self.register_file[usize::from(adr)],
        }
    }

    pub(crate) fn reg_w8<B: Bus>(&mut self, bus: &mut B, adr: u8, data: u8) {
        match adr {
            ZERO_REG | 0x01 => {}
            INT_MASK => self.int_mask_w(data),
            INT_PENDING => self.int_pending_w(data),
            0x02..=SFR_END => bus.sfr_write(adr, data),
            _ => self.register_file[usize::from(adr)] = data,
        }
    }

    pub(crate) fn reg_r16<B: Bus>(&mut self, bus: &mut B, adr: u8) -> u16 {
        let adr = adr & 0xfe;
        let lo = self.reg_r8(bus, adr);
        let hi = self.reg_r8(bus, adr | 1);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn reg_w16<B: Bus>(&mut self, bus: &mut B, adr: u8, data: u16) {
        let adr = adr & 0xfe;
        let [lo, hi] = data.to_le_bytes();
        self.reg_w8(bus, adr, lo);
        self.reg_w8(bus, adr | 1, hi);
    }

    pub(crate) fn reg_r32<B: Bus>(&mut self, bus: &mut B, adr: u8) -> u32 {
        let adr = adr & 0xfc;
        let lo = self.reg_r16(bus, adr);
        let hi = self.reg_r16(bus, adr | 2);
        (u32::from(hi) << 16) | u32::from(lo)
    }

    pub(crate) fn reg_w32<B: Bus>(&mut self, bus: &mut B, adr: u8, data: u32) {
        let adr = adr & 0xfc;
        self.reg_w16(bus, adr, data as u16);
        self.reg_w16(bus, adr | 2, (data >> 16) as u16);
    }

    pub(crate) fn any_r8<B: Bus>(&mut self, bus: &mut B, adr: u16) -> u8 {
        if adr < REGISTER_WINDOW_END {
            self.reg_r8(bus, adr as u8)
        } else {
            bus.read8(adr)
        }
    }

    pub(crate) fn any_w8<B: Bus>(&mut self, bus: &mut B, adr: u16, data: u8) {
        if adr < REGISTER_WINDOW_END {
            self.reg_w8(bus, adr as u8, data);
        } else {
            bus.write8(adr, data);
        }
    }

    pub(crate) fn any_r16<B: Bus>(&mut self, bus: &mut B, adr: u16) -> u16 {
        let adr = adr & 0xfffe;
        if adr < REGISTER_WINDOW_END {
            self.reg_r16(bus, adr as u8)
        } else {
            bus.read16(adr)
        }
    }

    pub(crate) fn any_w16<B: Bus>(&mut self, bus: &mut B, adr: u16, data: u16) {
        let adr = adr & 0xfffe;
        if adr < REGISTER_WINDOW_END {
            self.reg_w16(bus, adr as u8, data);
        } else {
            bus.write16(adr, data);
        }
    }

    pub(crate) fn push<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let sp = self.reg_r16(bus, SP).wrapping_sub(2);
        self.reg_w16(bus, SP, sp);
        self.any_w16(bus, sp, value);
    }

    pub(crate) fn pop<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let sp = self.reg_r16(bus, SP);
        let value = self.any_r16(bus, sp);
        self.reg_w16(bus, SP, sp.wrapping_add(2));
        value
    }

    /// Debugger read of the 16-bit register pair at `adr`, without touching
    /// special function registers that have side effects.
    pub fn peek_reg16(&self, adr: u8) -> u16 {
        let adr = usize::from(adr & 0xfe);
        u16::from_le_bytes([self.register_file[adr], self.register_file[adr + 1]])
    }
}
