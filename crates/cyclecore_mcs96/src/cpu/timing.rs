//! Instruction timing in state times, per addressing mode column
//! (direct, immediate, indirect, indirect+, short-indexed, long-indexed).

use super::operands::AddrMode;

pub(crate) const TWO_OP_WORD: [u32; 6] = [4, 5, 6, 7, 6, 7];
pub(crate) const TWO_OP_BYTE: [u32; 6] = [4, 4, 6, 7, 6, 7];
pub(crate) const THREE_OP: [u32; 6] = [5, 6, 7, 8, 7, 8];
pub(crate) const STORE: [u32; 6] = [4, 4, 7, 8, 7, 8];
pub(crate) const PUSH: [u32; 6] = [8, 8, 11, 12, 11, 12];
pub(crate) const POP: [u32; 6] = [12, 12, 14, 14, 14, 14];

/// Extra states over the direct form for multiply/divide.
const MULDIV_EXTRA: [u32; 6] = [0, 1, 2, 3, 2, 3];

pub(crate) const MULU: u32 = 25;
pub(crate) const MULUB: u32 = 17;
pub(crate) const DIVU: u32 = 25;
pub(crate) const DIVUB: u32 = 17;
/// Signed multiply/divide cost over the unsigned form.
pub(crate) const SIGNED_EXTRA: u32 = 4;

pub(crate) const SJMP: u32 = 8;
pub(crate) const LJMP: u32 = 8;
pub(crate) const BR: u32 = 8;
pub(crate) const CALL: u32 = 13;
pub(crate) const RET: u32 = 12;
pub(crate) const JCC_NOT_TAKEN: u32 = 4;
pub(crate) const JCC_TAKEN: u32 = 8;
pub(crate) const DJNZ_NOT_TAKEN: u32 = 5;
pub(crate) const DJNZ_TAKEN: u32 = 9;
pub(crate) const JBIT_NOT_TAKEN: u32 = 5;
pub(crate) const JBIT_TAKEN: u32 = 9;
pub(crate) const PUSHF: u32 = 8;
pub(crate) const POPF: u32 = 9;
pub(crate) const TRAP: u32 = 21;
pub(crate) const RST: u32 = 16;
pub(crate) const SIMPLE: u32 = 2;
pub(crate) const SKIP: u32 = 3;
pub(crate) const SINGLE_OP: u32 = 3;
pub(crate) const EXT: u32 = 4;
pub(crate) const SHIFT_BASE: u32 = 7;
pub(crate) const NORML_BASE: u32 = 11;

/// Interrupt entry, split between the two micro-steps.
pub(crate) const IRQ_PUSH: u32 = 11;
pub(crate) const IRQ_VECTOR: u32 = 10;

#[inline]
pub(crate) fn for_mode(table: &[u32; 6], mode: AddrMode) -> u32 {
    table[mode.index()]
}

#[inline]
pub(crate) fn muldiv(base: u32, mode: AddrMode) -> u32 {
    base + MULDIV_EXTRA[mode.index()]
}
