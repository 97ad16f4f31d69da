//! On-chip peripheral register banks.

pub mod dma;
pub mod i2c;
pub mod mmu;
pub mod timers;
pub mod uart;
