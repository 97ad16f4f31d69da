use super::Mcs96;

/// Timer1 advances once every 8 state times.
const TIMER1_PRESCALE: u64 = 8;

/// Pending bit raised on Timer1 overflow.
const TIMER_OVERFLOW_IRQ: u8 = 0x01;

impl Mcs96 {
    pub(crate) fn timer1_period(&self) -> u64 {
        0x1_0000 * TIMER1_PRESCALE * u64::from(self.config().cycles_scaling)
    }

    /// Timer1 as sampled at the current cycle.
    pub fn timer1_value(&self) -> u16 {
        let prescale = TIMER1_PRESCALE * u64::from(self.config().cycles_scaling);
        (self.total_cycles.saturating_sub(self.timer1_epoch) / prescale) as u16
    }

    /// Bring on-chip peripherals up to `current_time` (absolute cycles) and
    /// schedule the next internal event.
    pub(crate) fn internal_update(&mut self, current_time: u64) {
        if current_time >= self.timer1_overflow {
            let period = self.timer1_period();
            while self.timer1_overflow <= current_time {
                self.timer1_overflow += period;
            }
            log::trace!("Timer1 overflow at cycle {current_time}");
            self.pending_irq |= TIMER_OVERFLOW_IRQ;
            self.check_irq();
        }
        self.recompute_bcount(self.timer1_overflow);
    }

    /// Translate the absolute cycle of the next internal event into the
    /// `icount` threshold at which execution must stop for it.
    pub(crate) fn recompute_bcount(&mut self, event_time: u64) {
        let end = self.total_cycles as i64 + self.icount;
        if event_time == 0 || event_time as i64 >= end {
            self.bcount = 0;
            return;
        }
        self.bcount = end - event_time as i64;
    }
}
