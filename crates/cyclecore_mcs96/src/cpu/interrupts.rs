mod poll;
mod service;

/// Vector table base; source `n` vectors through `0x2000 + 2 * n`.
pub(crate) const VECTOR_BASE: u16 = 0x2000;
pub(crate) const TRAP_VECTOR: u16 = 0x2010;
