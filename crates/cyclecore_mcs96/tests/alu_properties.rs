//! Property tests for the flag-exact ALU helpers.

use cyclecore_mcs96::{Mcs96, Mcs96Config, Psw};
use proptest::prelude::*;

fn cpu() -> Mcs96 {
    Mcs96::new("maincpu", Mcs96Config::default())
}

proptest! {
    #[test]
    fn add_wraps_and_carries(a: u16, b: u16) {
        let mut cpu = cpu();
        let r = cpu.do_add(a, b);
        prop_assert_eq!(r, a.wrapping_add(b));
        prop_assert_eq!(cpu.psw().contains(Psw::C), u32::from(a) + u32::from(b) > 0xffff);
        prop_assert_eq!(cpu.psw().contains(Psw::Z), r == 0);
        prop_assert_eq!(cpu.psw().contains(Psw::N), r & 0x8000 != 0);
    }

    #[test]
    fn addb_wraps_and_carries(a: u8, b: u8) {
        let mut cpu = cpu();
        let r = cpu.do_addb(a, b);
        prop_assert_eq!(r, a.wrapping_add(b));
        prop_assert_eq!(cpu.psw().contains(Psw::C), u16::from(a) + u16::from(b) > 0xff);
        let overflow = (a as i8).checked_add(b as i8).is_none();
        prop_assert_eq!(cpu.psw().contains(Psw::V), overflow);
    }

    #[test]
    fn sub_carry_means_no_borrow(a: u16, b: u16) {
        let mut cpu = cpu();
        let r = cpu.do_sub(a, b);
        prop_assert_eq!(r, a.wrapping_sub(b));
        prop_assert_eq!(cpu.psw().contains(Psw::C), a >= b);
        let overflow = (a as i16).checked_sub(b as i16).is_none();
        prop_assert_eq!(cpu.psw().contains(Psw::V), overflow);
    }

    #[test]
    fn add_undoes_sub(a: u16, b: u16) {
        let mut cpu = cpu();
        let diff = cpu.do_sub(a, b);
        prop_assert_eq!(cpu.do_add(diff, b), a);
    }

    #[test]
    fn addb_undoes_subb(a: u8, b: u8) {
        let mut cpu = cpu();
        let diff = cpu.do_subb(a, b);
        prop_assert_eq!(cpu.do_addb(diff, b), a);
    }

    #[test]
    fn overflow_trap_is_sticky(a: u16, b: u16) {
        let mut cpu = cpu();
        cpu.set_psw(Psw::VT);
        cpu.do_add(a, b);
        prop_assert!(cpu.psw().contains(Psw::VT));
    }

    #[test]
    fn divu_matches_integer_division(dividend: u32, divisor in 1u16..) {
        let mut cpu = cpu();
        let q = dividend / u32::from(divisor);
        match cpu.do_divu(dividend, divisor) {
            Some(r) => {
                prop_assert!(q <= 0xffff);
                prop_assert_eq!(r & 0xffff, q);
                prop_assert_eq!(r >> 16, dividend % u32::from(divisor));
                prop_assert!(!cpu.psw().contains(Psw::V));
            }
            None => {
                prop_assert!(q > 0xffff);
                prop_assert!(cpu.psw().contains(Psw::V | Psw::VT));
            }
        }
    }

    #[test]
    fn norml_sets_the_top_bit(value in 1u32..) {
        let mut cpu = cpu();
        let (r, count) = cpu.do_norml(value);
        prop_assert!(r & 0x8000_0000 != 0);
        prop_assert_eq!(r >> count, value);
    }
}
