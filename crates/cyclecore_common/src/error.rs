use thiserror::Error;

use crate::time::Attotime;

/// Fatal emulation conditions.
///
/// Nothing in the core panics on bad guest behaviour; every condition that
/// would stop a real emulation session surfaces here and is propagated to
/// the caller that drives the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmuError {
    /// An instruction state retired without consuming cycles. `state` is the
    /// raw instruction state, `ppc` the address of the faulting opcode.
    #[error("Unhandled {state:x} ({ppc:04x})")]
    UnhandledInstruction { state: u16, ppc: u16 },

    #[error("no forward progress at {at} (horizon {horizon})")]
    NoProgress { at: Attotime, horizon: Attotime },

    #[error("{device}: {fifo} FIFO overflow ({capacity} bytes)")]
    FifoOverflow {
        device: String,
        fifo: &'static str,
        capacity: usize,
    },

    #[error("address space '{space}': {new} overlaps {existing}")]
    MapOverlap {
        space: String,
        new: String,
        existing: String,
    },

    #[error("address space '{space}': {reason}")]
    InvalidMapping { space: String, reason: String },

    #[error("state item {index}: expected {expected}, found {found}")]
    StateMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("corrupt state: {0}")]
    StateCorrupt(String),

    #[error("unknown device type '{0}'")]
    UnknownDeviceType(String),

    #[error("unsupported timer channel {0}")]
    UnsupportedTimerChannel(u8),

    #[error("invalid ROM image: {0}")]
    InvalidRom(String),
}

pub type Result<T, E = EmuError> = std::result::Result<T, E>;
