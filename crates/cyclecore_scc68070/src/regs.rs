//! Byte offsets of the peripheral registers from the window base, and the
//! register bits the controller acts on.

pub const LIR: u32 = 0x1000;

pub const I2C_DATA: u32 = 0x2000;
pub const I2C_ADDRESS: u32 = 0x2002;
pub const I2C_STATUS: u32 = 0x2004;
pub const I2C_CONTROL: u32 = 0x2006;
pub const I2C_CLOCK_CONTROL: u32 = 0x2008;

pub const UART_MODE: u32 = 0x2010;
pub const UART_STATUS: u32 = 0x2012;
pub const UART_CLOCK_SELECT: u32 = 0x2014;
pub const UART_COMMAND: u32 = 0x2016;
pub const UART_THR: u32 = 0x2018;
pub const UART_RHR: u32 = 0x201a;

pub const TIMER_STATUS_CONTROL: u32 = 0x2020;
pub const TIMER_RELOAD: u32 = 0x2022;
pub const TIMER0: u32 = 0x2024;
pub const TIMER1: u32 = 0x2026;
pub const TIMER2: u32 = 0x2028;

pub const PICR1: u32 = 0x2044;
pub const PICR2: u32 = 0x2046;

pub const DMA_BASE: u32 = 0x4000;
pub const DMA_END: u32 = 0x407f;
pub const DMA_CHANNEL_STRIDE: u32 = 0x40;
pub const DMA_STATUS_ERROR: u32 = 0x00;
pub const DMA_DEVICE_OPERATION: u32 = 0x04;
pub const DMA_SEQUENCE_CHANNEL: u32 = 0x06;
pub const DMA_TRANSFER_COUNTER: u32 = 0x0a;
pub const DMA_MEMORY_ADDRESS_HI: u32 = 0x0c;
pub const DMA_MEMORY_ADDRESS_LO: u32 = 0x0e;
pub const DMA_DEVICE_ADDRESS_HI: u32 = 0x14;
pub const DMA_DEVICE_ADDRESS_LO: u32 = 0x16;

pub const MMU_STATUS_CONTROL: u32 = 0x8000;
pub const MMU_DESC_BASE: u32 = 0x8040;
pub const MMU_DESC_END: u32 = 0x807f;
pub const MMU_DESC_STRIDE: u32 = 0x08;

/// Last byte of the peripheral window.
pub const WINDOW_END: u32 = 0x807f;

pub const USR_RXRDY: u8 = 0x01;
pub const USR_TXRDY: u8 = 0x04;

pub const TSR_OV0: u8 = 0x80;

/// DMA channel status: channel operation complete.
pub const CSR_COC: u8 = 0x80;
/// DMA channel control: start operation.
pub const CCR_SO: u8 = 0x80;
/// DMA channel control: interrupt enable.
pub const CCR_INE: u8 = 0x08;
pub const CCR_IPL: u8 = 0x07;

/// PICR bits that acknowledge the low and high sources when written.
pub const PICR_CLEAR_LOW: u8 = 0x08;
pub const PICR_CLEAR_HIGH: u8 = 0x80;

#[inline]
pub(crate) fn low_lane(mem_mask: u16) -> bool {
    mem_mask & 0x00ff != 0
}

#[inline]
pub(crate) fn high_lane(mem_mask: u16) -> bool {
    mem_mask & 0xff00 != 0
}
