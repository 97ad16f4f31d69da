use cyclecore_common::{
    AccessMode, Device, EmuError, LineQueue, LineState, Result, Scheduler, TimerId,
};
use typed_builder::TypedBuilder;

use crate::logging::{scc_log, LogChannels};
use crate::periph::dma::Dma;
use crate::periph::i2c::I2c;
use crate::periph::mmu::Mmu;
use crate::periph::timers::Timers;
use crate::periph::uart::Uart;
use crate::regs;

/// Supplies the vector byte for an external interrupt acknowledge.
pub type IackCallback = Box<dyn FnMut() -> u8>;

/// Receives every byte the UART shifts out.
pub type UartTxSink = Box<dyn FnMut(u8)>;

/// Vector returned for an external source without an acknowledge callback.
#[inline]
pub const fn autovector(level: u8) -> u8 {
    0x18 + level
}

/// Vector returned for every internal acknowledge.
#[inline]
pub const fn internal_vector(level: u8) -> u8 {
    0x38 + level
}

#[derive(TypedBuilder)]
pub struct Scc68070Config {
    /// CLKOUT in Hz. The timers count at CLKOUT / 96.
    #[builder(default = 15_500_000)]
    pub clock: u32,
    #[builder(default)]
    pub verbose: LogChannels,
    #[builder(default, setter(strip_option))]
    pub iack2: Option<IackCallback>,
    #[builder(default, setter(strip_option))]
    pub iack4: Option<IackCallback>,
    #[builder(default, setter(strip_option))]
    pub iack5: Option<IackCallback>,
    #[builder(default, setter(strip_option))]
    pub iack7: Option<IackCallback>,
    #[builder(default, setter(strip_option))]
    pub uart_tx: Option<UartTxSink>,
}

impl Default for Scc68070Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Input pins of the interrupt network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SccLine {
    /// Level-sensitive external inputs.
    In2,
    In4,
    In5,
    Nmi,
    /// Edge-latched into LIR bit 7.
    Int1,
    /// Edge-latched into LIR bit 3.
    Int2,
}

/// Internal interrupt sources, in acknowledge priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InternalSource {
    Int1,
    Int2,
    Timer,
    UartRx,
    UartTx,
    I2c,
}

const ACK_ORDER: [InternalSource; 6] = [
    InternalSource::Int1,
    InternalSource::Int2,
    InternalSource::Timer,
    InternalSource::UartRx,
    InternalSource::UartTx,
    InternalSource::I2c,
];

/// Scheduler timers owned by the controller.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SccTimers {
    pub(crate) timer0: TimerId,
    pub(crate) uart_rx: TimerId,
    pub(crate) uart_tx: TimerId,
}

pub struct Scc68070 {
    tag: String,
    pub(crate) config: Scc68070Config,

    pub(crate) ipl: u8,
    pub(crate) in2: LineState,
    pub(crate) in4: LineState,
    pub(crate) in5: LineState,
    pub(crate) nmi: LineState,
    pub(crate) int1: LineState,
    pub(crate) int2: LineState,
    pub(crate) lir: u16,

    pub(crate) picr1: u8,
    pub(crate) picr2: u8,
    pub(crate) timer_int: bool,
    pub(crate) i2c_int: bool,
    pub(crate) uart_rx_int: bool,
    pub(crate) uart_tx_int: bool,

    pub(crate) i2c: I2c,
    pub(crate) uart: Uart,
    pub(crate) timers: Timers,
    pub(crate) dma: Dma,
    pub(crate) mmu: Mmu,

    pub(crate) timer_ids: Option<SccTimers>,
    irq_lines: LineQueue,
    fault: Option<EmuError>,
}

impl Scc68070 {
    pub fn new(tag: impl Into<String>, config: Scc68070Config) -> Self {
        let mut scc = Self {
            tag: tag.into(),
            config,
            ipl: 0,
            in2: LineState::Clear,
            in4: LineState::Clear,
            in5: LineState::Clear,
            nmi: LineState::Clear,
            int1: LineState::Clear,
            int2: LineState::Clear,
            lir: 0,
            picr1: 0,
            picr2: 0,
            timer_int: false,
            i2c_int: false,
            uart_rx_int: false,
            uart_tx_int: false,
            i2c: I2c::default(),
            uart: Uart::default(),
            timers: Timers::default(),
            dma: Dma::default(),
            mmu: Mmu::default(),
            timer_ids: None,
            irq_lines: LineQueue::new(),
            fault: None,
        };
        scc.reset();
        scc
    }

    /// Allocate the controller's timers. Call once, before the first access
    /// that needs them.
    pub fn start(&mut self, scheduler: &mut Scheduler) {
        let timer0 = scheduler.timer_alloc(format!("{}.timer0", self.tag));
        let uart_rx = scheduler.timer_alloc(format!("{}.uart_rx", self.tag));
        let uart_tx = scheduler.timer_alloc(format!("{}.uart_tx", self.tag));
        self.timer_ids = Some(SccTimers {
            timer0,
            uart_rx,
            uart_tx,
        });
    }

    /// Disarm the controller's timers. `reset` leaves them running, so a
    /// host resetting the whole machine calls this as well.
    pub fn stop_timers(&self, scheduler: &mut Scheduler) {
        if let Some(timers) = self.timer_ids {
            scheduler.reset(timers.timer0);
            scheduler.reset(timers.uart_rx);
            scheduler.reset(timers.uart_tx);
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn config(&self) -> &Scc68070Config {
        &self.config
    }

    #[inline]
    pub fn verbose(&self) -> LogChannels {
        self.config.verbose
    }

    pub fn reset(&mut self) {
        self.lir = 0;
        self.picr1 = 0;
        self.picr2 = 0;
        self.timer_int = false;
        self.i2c_int = false;
        self.uart_rx_int = false;
        self.uart_tx_int = false;

        self.i2c = I2c::default();
        self.uart.reset();
        self.timers = Timers::default();
        self.dma = Dma::default();
        self.mmu = Mmu::default();

        self.update_ipl();
    }

    /// Interrupt priority level currently presented to the CPU.
    #[inline]
    pub fn ipl(&self) -> u8 {
        self.ipl
    }

    pub fn lir(&self) -> u16 {
        self.lir
    }

    /// Next change of the CPU interrupt lines, numbered by level.
    pub fn take_irq_line_change(&mut self) -> Option<(u8, LineState)> {
        self.irq_lines.pop()
    }

    /// A fatal condition raised inside a register access, which has no
    /// error path of its own.
    pub fn take_fault(&mut self) -> Option<EmuError> {
        self.fault.take()
    }

    pub(crate) fn record_fault(&mut self, err: EmuError) {
        log::error!("{}: {err}", self.tag);
        if self.fault.is_none() {
            self.fault = Some(err);
        }
    }

    pub fn owns_timer(&self, id: TimerId) -> bool {
        self.timer_ids
            .is_some_and(|t| id == t.timer0 || id == t.uart_rx || id == t.uart_tx)
    }

    /// Route an expired scheduler timer to its peripheral.
    pub fn timer_expired(&mut self, id: TimerId, scheduler: &mut Scheduler) -> Result<()> {
        let Some(timers) = self.timer_ids else {
            return Ok(());
        };
        if id == timers.timer0 {
            self.timer0_expired(scheduler)
        } else if id == timers.uart_rx {
            self.uart_rx_expired(scheduler);
            Ok(())
        } else if id == timers.uart_tx {
            self.uart_tx_expired(scheduler);
            Ok(())
        } else {
            Ok(())
        }
    }

    pub fn set_line(&mut self, line: SccLine, state: LineState) {
        match line {
            SccLine::In2 => self.in2 = state,
            SccLine::In4 => self.in4 = state,
            SccLine::In5 => self.in5 = state,
            SccLine::Nmi => self.nmi = state,
            SccLine::Int1 => {
                if self.int1 != state {
                    if state.is_asserted() && self.lir & 0x80 == 0 {
                        self.lir |= 0x80;
                    }
                    self.int1 = state;
                }
            }
            SccLine::Int2 => {
                if self.int2 != state {
                    if state.is_asserted() && self.lir & 0x08 == 0 {
                        self.lir |= 0x08;
                    }
                    self.int2 = state;
                }
            }
        }
        self.update_ipl();
    }

    /// Recompute the priority level from every source and move the output
    /// line if it changed.
    pub(crate) fn update_ipl(&mut self) {
        let external = if self.nmi.is_asserted() {
            7
        } else if self.in5.is_asserted() {
            5
        } else if self.in4.is_asserted() {
            4
        } else if self.in2.is_asserted() {
            2
        } else {
            0
        };
        let internal = ACK_ORDER
            .iter()
            .map(|&source| self.source_level(source))
            .max()
            .unwrap_or(0);
        let new_ipl = external
            .max(internal)
            .max(self.dma.level(0))
            .max(self.dma.level(1));

        if new_ipl != self.ipl {
            scc_log!(self, LogChannels::IRQS, "IPL {} -> {}", self.ipl, new_ipl);
            if self.ipl != 0 {
                self.irq_lines.set(self.ipl, LineState::Clear);
            }
            if new_ipl != 0 {
                self.irq_lines.set(new_ipl, LineState::Assert);
            }
            self.ipl = new_ipl;
        }
    }

    /// Level a source is requesting, or 0 when it is idle.
    fn source_level(&self, source: InternalSource) -> u8 {
        let lir = self.lir as u8;
        match source {
            InternalSource::Int1 if lir & 0x80 != 0 => (lir >> 4) & 7,
            InternalSource::Int2 if lir & 0x08 != 0 => lir & 7,
            InternalSource::Timer if self.timer_int => self.picr1 & 7,
            InternalSource::UartRx if self.uart_rx_int => (self.picr2 >> 4) & 7,
            InternalSource::UartTx if self.uart_tx_int => self.picr2 & 7,
            InternalSource::I2c if self.i2c_int => (self.picr1 >> 4) & 7,
            _ => 0,
        }
    }

    fn clear_source(&mut self, source: InternalSource) {
        match source {
            InternalSource::Int1 => self.lir &= !0x80,
            InternalSource::Int2 => self.lir &= !0x08,
            InternalSource::Timer => self.timer_int = false,
            InternalSource::UartRx => self.uart_rx_int = false,
            InternalSource::UartTx => self.uart_tx_int = false,
            InternalSource::I2c => self.i2c_int = false,
        }
    }

    /// Interrupt acknowledge cycle for `level`.
    ///
    /// An asserted external line at that level supplies its own vector.
    /// Otherwise the first internal source at that level is cleared and the
    /// internal vector is returned; `AccessMode::Debug` reads clear nothing.
    pub fn iack_r(&mut self, level: u8, mode: AccessMode) -> u8 {
        let callback = match level {
            2 if self.in2.is_asserted() => Some(&mut self.config.iack2),
            4 if self.in4.is_asserted() => Some(&mut self.config.iack4),
            5 if self.in5.is_asserted() => Some(&mut self.config.iack5),
            7 if self.nmi.is_asserted() => Some(&mut self.config.iack7),
            _ => None,
        };
        if let Some(callback) = callback {
            return callback.as_mut().map_or(autovector(level), |iack| iack());
        }

        if !mode.side_effects_disabled() {
            let source = ACK_ORDER
                .iter()
                .copied()
                .find(|&source| level != 0 && self.source_level(source) == level);
            if let Some(source) = source {
                scc_log!(self, LogChannels::IRQS, "acknowledge {source:?} at level {level}");
                self.clear_source(source);
                self.update_ipl();
            }
        }

        internal_vector(level)
    }

    /// Host-side hook for boards that model an I2C slave.
    pub fn set_i2c_interrupt(&mut self, pending: bool) {
        self.i2c_int = pending;
        self.update_ipl();
    }

    /// Read the 16-bit register at byte `offset` in the peripheral window.
    pub fn periphs_r(&mut self, offset: u32, mem_mask: u16, mode: AccessMode) -> u16 {
        let offset = offset & !1;
        let value = match offset {
            regs::LIR => Some(self.lir),
            regs::I2C_DATA..=regs::I2C_CLOCK_CONTROL => self.i2c_r(offset, mem_mask),
            regs::UART_MODE..=regs::UART_RHR => self.uart_r(offset, mem_mask, mode),
            regs::TIMER_STATUS_CONTROL..=regs::TIMER2 => self.timers_r(offset, mem_mask),
            regs::PICR1 => Some(u16::from(self.picr1 & 0x77)),
            regs::PICR2 => Some(u16::from(self.picr2 & 0x77)),
            regs::DMA_BASE..=regs::DMA_END => self.dma_r(offset, mem_mask),
            regs::MMU_STATUS_CONTROL..=regs::MMU_DESC_END => self.mmu_r(offset, mem_mask),
            _ => None,
        };
        value.unwrap_or_else(|| {
            scc_log!(self, LogChannels::UNKNOWN, "unknown read {offset:04x} & {mem_mask:04x}");
            0
        })
    }

    /// Write the 16-bit register at byte `offset` on the lanes in `mem_mask`.
    pub fn periphs_w(&mut self, offset: u32, data: u16, mem_mask: u16, scheduler: &mut Scheduler) {
        let offset = offset & !1;
        let handled = match offset {
            regs::LIR => {
                cyclecore_common::combine_data(&mut self.lir, data, mem_mask);
                self.update_ipl();
                true
            }
            regs::I2C_DATA..=regs::I2C_CLOCK_CONTROL => self.i2c_w(offset, data, mem_mask),
            regs::UART_MODE..=regs::UART_RHR => self.uart_w(offset, data, mem_mask, scheduler),
            regs::TIMER_STATUS_CONTROL..=regs::TIMER2 => {
                self.timers_w(offset, data, mem_mask, scheduler)
            }
            regs::PICR1 => {
                if regs::low_lane(mem_mask) {
                    self.picr1_w(data as u8);
                }
                true
            }
            regs::PICR2 => {
                if regs::low_lane(mem_mask) {
                    self.picr2_w(data as u8);
                }
                true
            }
            regs::DMA_BASE..=regs::DMA_END => self.dma_w(offset, data, mem_mask),
            regs::MMU_STATUS_CONTROL..=regs::MMU_DESC_END => self.mmu_w(offset, data, mem_mask),
            _ => false,
        };
        if !handled {
            scc_log!(
                self,
                LogChannels::UNKNOWN,
                "unknown write {offset:04x} = {data:04x} & {mem_mask:04x}"
            );
        }
    }

    fn picr1_w(&mut self, data: u8) {
        scc_log!(self, LogChannels::IRQS, "PICR1 = {data:02x}");
        self.picr1 = data & 0x77;
        if data & regs::PICR_CLEAR_LOW != 0 {
            self.timer_int = false;
        }
        if data & regs::PICR_CLEAR_HIGH != 0 {
            self.i2c_int = false;
        }
        self.update_ipl();
    }

    fn picr2_w(&mut self, data: u8) {
        scc_log!(self, LogChannels::IRQS, "PICR2 = {data:02x}");
        self.picr2 = data & 0x77;
        if data & regs::PICR_CLEAR_LOW != 0 {
            self.uart_tx_int = false;
        }
        if data & regs::PICR_CLEAR_HIGH != 0 {
            self.uart_rx_int = false;
        }
        self.update_ipl();
    }

    pub fn timer_int(&self) -> bool {
        self.timer_int
    }

    pub fn uart_rx_int(&self) -> bool {
        self.uart_rx_int
    }

    pub fn uart_tx_int(&self) -> bool {
        self.uart_tx_int
    }
}

impl Device for Scc68070 {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn shortname(&self) -> &'static str {
        "scc68070"
    }

    fn reset(&mut self) {
        Scc68070::reset(self);
    }
}

#[cfg(test)]
mod tests;
