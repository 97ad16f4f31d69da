//! Flag-exact arithmetic.
//!
//! Add sets C on carry out; subtract sets C when no borrow occurred, as the
//! 8096 does. Signed overflow sets both V and the sticky VT.

use super::{Mcs96, Psw};

const ARITH_FLAGS: Psw = Psw::Z.union(Psw::N).union(Psw::C).union(Psw::V);

impl Mcs96 {
    fn set_zn(&mut self, value: u32, sign: u32) {
        if value == 0 {
            self.psw.insert(Psw::Z);
        } else if value & sign != 0 {
            self.psw.insert(Psw::N);
        }
    }

    fn add_common(&mut self, v1: u32, v2: u32, carry: u32, sign: u32) -> u32 {
        let mask = (sign << 1).wrapping_sub(1);
        let sum = v1 + v2 + carry;
        self.psw.remove(ARITH_FLAGS);
        self.set_zn(sum & mask, sign);
        if !(v1 ^ v2) & (v1 ^ sum) & sign != 0 {
            self.psw.insert(Psw::V | Psw::VT);
        }
        if sum & !mask != 0 {
            self.psw.insert(Psw::C);
        }
        sum & mask
    }

    fn sub_common(&mut self, v1: u32, v2: u32, borrow: u32, sign: u32) -> u32 {
        let mask = (sign << 1).wrapping_sub(1);
        let diff = v1.wrapping_sub(v2).wrapping_sub(borrow);
        self.psw.remove(ARITH_FLAGS);
        self.set_zn(diff & mask, sign);
        if (v1 ^ v2) & (v1 ^ diff) & sign != 0 {
            self.psw.insert(Psw::V | Psw::VT);
        }
        if diff & !mask == 0 {
            self.psw.insert(Psw::C);
        }
        diff & mask
    }

    fn carry_in(&self) -> u32 {
        u32::from(self.psw.contains(Psw::C))
    }

    pub fn do_addb(&mut self, v1: u8, v2: u8) -> u8 {
        self.add_common(v1.into(), v2.into(), 0, 0x80) as u8
    }

    pub fn do_add(&mut self, v1: u16, v2: u16) -> u16 {
        self.add_common(v1.into(), v2.into(), 0, 0x8000) as u16
    }

    pub fn do_addcb(&mut self, v1: u8, v2: u8) -> u8 {
        let carry = self.carry_in();
        self.add_common(v1.into(), v2.into(), carry, 0x80) as u8
    }

    pub fn do_addc(&mut self, v1: u16, v2: u16) -> u16 {
        let carry = self.carry_in();
        self.add_common(v1.into(), v2.into(), carry, 0x8000) as u16
    }

    pub fn do_subb(&mut self, v1: u8, v2: u8) -> u8 {
        self.sub_common(v1.into(), v2.into(), 0, 0x80) as u8
    }

    pub fn do_sub(&mut self, v1: u16, v2: u16) -> u16 {
        self.sub_common(v1.into(), v2.into(), 0, 0x8000) as u16
    }

    pub fn do_subcb(&mut self, v1: u8, v2: u8) -> u8 {
        let borrow = 1 - self.carry_in();
        self.sub_common(v1.into(), v2.into(), borrow, 0x80) as u8
    }

    pub fn do_subc(&mut self, v1: u16, v2: u16) -> u16 {
        let borrow = 1 - self.carry_in();
        self.sub_common(v1.into(), v2.into(), borrow, 0x8000) as u16
    }

    pub fn set_nz8(&mut self, v: u8) {
        self.psw.remove(ARITH_FLAGS);
        self.set_zn(v.into(), 0x80);
    }

    pub fn set_nz16(&mut self, v: u16) {
        self.psw.remove(ARITH_FLAGS);
        self.set_zn(v.into(), 0x8000);
    }

    pub(crate) fn set_nz32(&mut self, v: u32) {
        self.psw.remove(ARITH_FLAGS);
        self.set_zn(v, 0x8000_0000);
    }

    /// Unsigned 32/16 divide. Returns `remainder << 16 | quotient`, or `None`
    /// (with V and VT set) on divide-by-zero or quotient overflow.
    pub fn do_divu(&mut self, dividend: u32, divisor: u16) -> Option<u32> {
        let result = (divisor != 0)
            .then(|| dividend / u32::from(divisor))
            .filter(|q| *q <= 0xffff)
            .map(|q| ((dividend % u32::from(divisor)) << 16) | q);
        self.divide_flags(result.is_some());
        result
    }

    /// Unsigned 16/8 divide: `remainder << 8 | quotient`.
    pub fn do_divub(&mut self, dividend: u16, divisor: u8) -> Option<u16> {
        let result = (divisor != 0)
            .then(|| dividend / u16::from(divisor))
            .filter(|q| *q <= 0xff)
            .map(|q| ((dividend % u16::from(divisor)) << 8) | q);
        self.divide_flags(result.is_some());
        result
    }

    /// Signed 32/16 divide; the remainder takes the sign of the dividend.
    pub fn do_div(&mut self, dividend: u32, divisor: u16) -> Option<u32> {
        let (n, d) = (dividend as i32, i32::from(divisor as i16));
        let result = n
            .checked_div(d)
            .filter(|q| i16::try_from(*q).is_ok())
            .map(|q| ((((n % d) as u32) & 0xffff) << 16) | (q as u32 & 0xffff));
        self.divide_flags(result.is_some());
        result
    }

    pub fn do_divb(&mut self, dividend: u16, divisor: u8) -> Option<u16> {
        let (n, d) = (dividend as i16, i16::from(divisor as i8));
        let result = n
            .checked_div(d)
            .filter(|q| i8::try_from(*q).is_ok())
            .map(|q| ((((n % d) as u16) & 0xff) << 8) | (q as u16 & 0xff));
        self.divide_flags(result.is_some());
        result
    }

    fn divide_flags(&mut self, ok: bool) {
        if ok {
            self.psw.remove(Psw::V);
        } else {
            self.psw.insert(Psw::V | Psw::VT);
        }
    }

    /// Logical/arithmetic right shift of a `bits`-wide value. C is the last
    /// bit out, ST is set if any earlier bit out was a one.
    pub(crate) fn shift_right(&mut self, value: u32, count: u32, bits: u32, arith: bool) -> u32 {
        let sign = 1u32 << (bits - 1);
        let mask = (sign << 1).wrapping_sub(1);
        let mut value = value & mask;
        let mut carry = false;
        let mut sticky = false;
        for _ in 0..count {
            sticky |= carry;
            carry = value & 1 != 0;
            let fill = if arith { value & sign } else { 0 };
            value = (value >> 1) | fill;
        }
        self.psw.remove(ARITH_FLAGS);
        self.set_zn(value, sign);
        self.psw.set(Psw::C, carry);
        if sticky {
            self.psw.insert(Psw::ST);
        }
        value
    }

    /// Left shift. C is the last bit out; V and VT are set if the sign bit
    /// changes at any step.
    pub(crate) fn shift_left(&mut self, value: u32, count: u32, bits: u32) -> u32 {
        let sign = 1u32 << (bits - 1);
        let mask = (sign << 1).wrapping_sub(1);
        let mut value = value & mask;
        let mut carry = false;
        let mut overflow = false;
        for _ in 0..count {
            carry = value & sign != 0;
            value = (value << 1) & mask;
            overflow |= carry != (value & sign != 0);
        }
        self.psw.remove(ARITH_FLAGS);
        self.set_zn(value, sign);
        self.psw.set(Psw::C, carry);
        if overflow {
            self.psw.insert(Psw::V | Psw::VT);
        }
        value
    }

    /// Normalize: shift left until bit 31 is set, at most 31 steps.
    /// Returns the shifted value and the shift count.
    pub fn do_norml(&mut self, value: u32) -> (u32, u8) {
        let count = if value == 0 { 31 } else { value.leading_zeros() };
        let result = value << count;
        self.psw.remove(Psw::Z | Psw::N | Psw::C);
        if value == 0 {
            self.psw.insert(Psw::Z);
        }
        if result & 0x8000_0000 != 0 {
            self.psw.insert(Psw::N);
        }
        (result, count as u8)
    }
}
