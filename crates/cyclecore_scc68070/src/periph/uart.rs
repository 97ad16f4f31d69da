use cyclecore_common::{AccessMode, Attotime, EmuError, Result, Scheduler};

use crate::logging::{scc_log, LogChannels};
use crate::regs::{self, USR_RXRDY, USR_TXRDY};
use crate::Scc68070;

/// Capacity of each UART FIFO in bytes.
pub const UART_FIFO_SIZE: usize = 32768;

/// Reference clock the UART divides down from.
const UART_REFERENCE_HZ: u32 = 49_152_000;

/// Fixed-capacity byte queue. The backing store never changes size so the
/// save-state layout stays stable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fifo {
    pub(crate) buf: Vec<u8>,
    pub(crate) len: usize,
}

impl Default for Fifo {
    fn default() -> Self {
        Self {
            buf: vec![0; UART_FIFO_SIZE],
            len: 0,
        }
    }
}

impl Fifo {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Oldest byte, or whatever the head slot last held when empty.
    pub fn front(&self) -> u8 {
        self.buf[0]
    }

    fn push(&mut self, data: u8) -> bool {
        if self.len == UART_FIFO_SIZE {
            return false;
        }
        self.buf[self.len] = data;
        self.len += 1;
        true
    }

    fn pop(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        let data = self.buf[0];
        self.buf.copy_within(1..self.len, 0);
        self.len -= 1;
        Some(data)
    }

    fn clear(&mut self) {
        self.len = 0;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Uart {
    pub mode: u8,
    pub status: u8,
    pub clock_select: u8,
    pub command: u8,
    pub transmit_holding: u8,
    pub receive_holding: u8,
    pub rx: Fifo,
    pub tx: Fifo,
}

impl Uart {
    pub(crate) fn reset(&mut self) {
        self.mode = 0;
        self.status = USR_TXRDY;
        self.clock_select = 0;
        self.command = 0;
        self.transmit_holding = 0;
        self.receive_holding = 0;
        self.rx.clear();
        self.tx.clear();
    }

    pub fn rx_enabled(&self) -> bool {
        self.command & 3 == 1
    }

    pub fn tx_enabled(&self) -> bool {
        (self.command >> 2) & 3 == 1
    }

    /// Bit rate for a 3-bit clock select value.
    pub fn rate_hz(csel: u8) -> u32 {
        (UART_REFERENCE_HZ / (0x1_0000 >> (csel & 7))) / 8
    }

    fn rx_period(&self) -> Attotime {
        Attotime::from_hz(Self::rate_hz(self.clock_select >> 4))
    }

    fn tx_period(&self) -> Attotime {
        Attotime::from_hz(Self::rate_hz(self.clock_select))
    }
}

impl Scc68070 {
    pub fn uart(&self) -> &Uart {
        &self.uart
    }

    pub(crate) fn uart_r(&mut self, offset: u32, mem_mask: u16, mode: AccessMode) -> Option<u16> {
        let value = match offset {
            regs::UART_MODE => self.uart.mode | 0x20,
            regs::UART_STATUS => {
                if !mode.side_effects_disabled() {
                    self.uart.status |= 1 << 1;
                }
                self.uart.status | 0x08
            }
            regs::UART_CLOCK_SELECT => self.uart.clock_select | 0x08,
            regs::UART_COMMAND => self.uart.command | 0x80,
            regs::UART_THR => self.uart.transmit_holding,
            regs::UART_RHR => {
                if mode.side_effects_disabled() {
                    return Some(u16::from(self.uart.rx.front()));
                }
                if self.uart_rx_int {
                    self.uart_rx_int = false;
                    self.update_ipl();
                }
                self.uart.receive_holding = self.uart.rx.front();
                self.uart.rx.pop();
                self.uart.receive_holding
            }
            _ => return None,
        };
        if regs::low_lane(mem_mask) {
            scc_log!(self, LogChannels::UART, "read {offset:04x} = {value:02x}");
        }
        Some(u16::from(value))
    }

    pub(crate) fn uart_w(
        &mut self,
        offset: u32,
        data: u16,
        mem_mask: u16,
        scheduler: &mut Scheduler,
    ) -> bool {
        if !regs::low_lane(mem_mask) {
            return matches!(offset, regs::UART_MODE..=regs::UART_RHR);
        }
        let data = data as u8;
        scc_log!(self, LogChannels::UART, "write {offset:04x} = {data:02x}");
        match offset {
            regs::UART_MODE => self.uart.mode = data,
            regs::UART_STATUS => self.uart.status = data,
            regs::UART_CLOCK_SELECT => self.uart.clock_select = data,
            regs::UART_COMMAND => {
                self.uart.command = data;
                self.uart_rx_check(scheduler);
                self.uart_tx_check(scheduler);
            }
            regs::UART_THR => {
                if let Err(err) = self.uart_tx(data, scheduler) {
                    self.record_fault(err);
                }
                self.uart.transmit_holding = data;
            }
            regs::UART_RHR => self.uart.receive_holding = data,
            _ => return false,
        }
        true
    }

    /// Queue a byte arriving on the receive pin.
    pub fn uart_rx(&mut self, data: u8, scheduler: &mut Scheduler) -> Result<()> {
        if !self.uart.rx.push(data) {
            return Err(self.fifo_overflow("rx"));
        }
        self.uart_rx_check(scheduler);
        Ok(())
    }

    /// Queue a byte for transmission.
    pub fn uart_tx(&mut self, data: u8, scheduler: &mut Scheduler) -> Result<()> {
        if !self.uart.tx.push(data) {
            return Err(self.fifo_overflow("tx"));
        }
        self.uart_tx_check(scheduler);
        Ok(())
    }

    fn fifo_overflow(&self, fifo: &'static str) -> EmuError {
        EmuError::FifoOverflow {
            device: self.tag().to_string(),
            fifo,
            capacity: UART_FIFO_SIZE,
        }
    }

    fn uart_rx_check(&mut self, scheduler: &mut Scheduler) {
        let Some(timers) = self.timer_ids else {
            return;
        };
        if self.uart.rx_enabled() {
            scheduler.adjust(timers.uart_rx, self.uart.rx_period());
        } else {
            self.uart.status &= !USR_RXRDY;
            scheduler.reset(timers.uart_rx);
        }
    }

    fn uart_tx_check(&mut self, scheduler: &mut Scheduler) {
        let Some(timers) = self.timer_ids else {
            return;
        };
        if self.uart.tx_enabled() {
            if self.uart.tx.is_empty() {
                self.uart.status |= USR_TXRDY;
            } else {
                self.uart.status &= !USR_TXRDY;
            }
            if !scheduler.enabled(timers.uart_tx) {
                scheduler.adjust(timers.uart_tx, self.uart.tx_period());
            }
        } else {
            scheduler.reset(timers.uart_tx);
        }
    }

    /// One receive bit-time elapsed: present the head byte and raise the
    /// receive interrupt while data is waiting.
    pub(crate) fn uart_rx_expired(&mut self, scheduler: &mut Scheduler) {
        if self.uart.rx_enabled() {
            self.uart.receive_holding = self.uart.rx.front();
            if self.uart.rx.is_empty() {
                self.uart.status &= !USR_RXRDY;
            } else {
                scc_log!(self, LogChannels::UART, "receiving {:02x}", self.uart.receive_holding);
                self.uart.status |= USR_RXRDY;
                self.uart_rx_int = true;
                self.update_ipl();
            }
        } else {
            self.uart.status &= !USR_RXRDY;
        }
        self.uart_rx_check(scheduler);
    }

    /// One transmit bit-time elapsed: shift out the head byte, if any.
    pub(crate) fn uart_tx_expired(&mut self, scheduler: &mut Scheduler) {
        let Some(timers) = self.timer_ids else {
            return;
        };
        if self.uart.tx_enabled() {
            self.uart_tx_int = true;
            self.update_ipl();

            if let Some(data) = self.uart.tx.pop() {
                self.uart.transmit_holding = data;
                scc_log!(self, LogChannels::UART, "transmitting {data:02x}");
                if let Some(sink) = self.config.uart_tx.as_mut() {
                    sink(data);
                }
                scheduler.adjust(timers.uart_tx, self.uart.tx_period());
            } else {
                scheduler.reset(timers.uart_tx);
            }
        } else {
            scheduler.reset(timers.uart_tx);
        }
        self.uart_tx_check(scheduler);
    }
}
