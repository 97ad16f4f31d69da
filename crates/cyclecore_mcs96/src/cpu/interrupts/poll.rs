use cyclecore_common::LineState;

use super::super::{Mcs96, Psw, EXINT_LINE};

/// Pending bit driven by the EXTINT pin.
const EXINT_PENDING: u8 = 0x80;

impl Mcs96 {
    /// Recompute `irq_requested` from the pending set, the mask and PSW.I.
    pub(crate) fn check_irq(&mut self) {
        self.irq_requested =
            self.pending_irq & self.int_mask_r() != 0 && self.psw.contains(Psw::I);
    }

    /// Highest-numbered source that is both pending and unmasked.
    pub(crate) fn highest_pending_level(&self) -> Option<u8> {
        let active = self.pending_irq & self.int_mask_r();
        (active != 0).then(|| 7 - active.leading_zeros() as u8)
    }

    pub fn execute_set_input(&mut self, line: u8, state: LineState) {
        match line {
            EXINT_LINE => {
                self.exint = state;
                if state.is_asserted() {
                    self.pending_irq |= EXINT_PENDING;
                } else {
                    self.pending_irq &= !EXINT_PENDING;
                }
                self.check_irq();
            }
            _ => log::warn!("{}: no input line {line}", self.tag()),
        }
    }
}
