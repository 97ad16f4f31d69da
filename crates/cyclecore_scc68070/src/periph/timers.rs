use cyclecore_common::{combine_data, Attotime, EmuError, Result, Scheduler};

use crate::logging::{scc_log, LogChannels};
use crate::regs::{self, TSR_OV0};
use crate::Scc68070;

/// Timer clocks per count.
const TIMER_PRESCALE: u64 = 96;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    pub status: u8,
    pub control: u8,
    pub reload: u16,
    pub timer0: u16,
    pub timer1: u16,
    pub timer2: u16,
}

impl Timers {
    /// Time from `count` to overflow at `clock`.
    pub fn period(count: u16, clock: u32) -> Attotime {
        let compare = 0x1_0000 - u64::from(count);
        Attotime::from_cycles(TIMER_PRESCALE * compare, clock)
    }
}

impl Scc68070 {
    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub(crate) fn timers_r(&mut self, offset: u32, mem_mask: u16) -> Option<u16> {
        let value = match offset {
            regs::TIMER_STATUS_CONTROL => {
                (u16::from(self.timers.status) << 8) | u16::from(self.timers.control)
            }
            regs::TIMER_RELOAD => self.timers.reload,
            regs::TIMER0 => self.timers.timer0,
            regs::TIMER1 => self.timers.timer1,
            regs::TIMER2 => self.timers.timer2,
            _ => return None,
        };
        scc_log!(
            self,
            LogChannels::TIMERS,
            "read {offset:04x} = {value:04x} & {mem_mask:04x}"
        );
        Some(value)
    }

    pub(crate) fn timers_w(
        &mut self,
        offset: u32,
        data: u16,
        mem_mask: u16,
        scheduler: &mut Scheduler,
    ) -> bool {
        scc_log!(
            self,
            LogChannels::TIMERS,
            "write {offset:04x} = {data:04x} & {mem_mask:04x}"
        );
        match offset {
            regs::TIMER_STATUS_CONTROL => {
                if regs::low_lane(mem_mask) {
                    self.timers.control = data as u8;
                }
                if regs::high_lane(mem_mask) {
                    self.timers.status &= !((data >> 8) as u8);
                }
            }
            regs::TIMER_RELOAD => combine_data(&mut self.timers.reload, data, mem_mask),
            regs::TIMER0 => {
                combine_data(&mut self.timers.timer0, data, mem_mask);
                if let Err(err) = self.arm_timer(0, scheduler) {
                    self.record_fault(err);
                }
            }
            regs::TIMER1 => combine_data(&mut self.timers.timer1, data, mem_mask),
            regs::TIMER2 => combine_data(&mut self.timers.timer2, data, mem_mask),
            _ => return false,
        }
        true
    }

    /// Schedule the overflow of timer `channel` from its current count.
    /// Only channel 0 counts; the others are plain registers.
    pub fn arm_timer(&mut self, channel: u8, scheduler: &mut Scheduler) -> Result<()> {
        if channel != 0 {
            return Err(EmuError::UnsupportedTimerChannel(channel));
        }
        let Some(timers) = self.timer_ids else {
            return Ok(());
        };
        let period = Timers::period(self.timers.timer0, self.config.clock);
        scc_log!(self, LogChannels::TIMERS_HF, "timer 0 armed for {period}");
        scheduler.adjust(timers.timer0, period);
        Ok(())
    }

    pub(crate) fn timer0_expired(&mut self, scheduler: &mut Scheduler) -> Result<()> {
        scc_log!(self, LogChannels::TIMERS_HF, "timer 0 overflow");
        self.timers.timer0 = self.timers.reload;
        self.timers.status |= TSR_OV0;
        if !self.timer_int {
            self.timer_int = true;
            self.update_ipl();
        }
        self.arm_timer(0, scheduler)
    }
}
