use super::super::{Bus, InstState, Mcs96};
use super::VECTOR_BASE;
use crate::cpu::timing;

impl Mcs96 {
    /// Latch the highest pending interrupt and enter the `Irq` state.
    /// Its pending bit is cleared here, so a re-assertion while the entry
    /// sequence runs is seen as a new request.
    pub(in crate::cpu) fn take_interrupt(&mut self) -> bool {
        let Some(level) = self.highest_pending_level() else {
            return false;
        };
        self.pending_irq &= !(1 << level);
        self.check_irq();
        self.irq_level = level;
        self.inst_state = InstState::Irq;
        self.inst_substate = 0;
        true
    }

    /// Run one micro-step of the interrupt entry: push PC, then load the
    /// vector.
    pub(in crate::cpu) fn irq_step<B: Bus>(&mut self, bus: &mut B) {
        match self.inst_substate {
            0 => {
                let pc = self.pc;
                self.push(bus, pc);
                self.consume(timing::IRQ_PUSH);
                self.inst_substate = 1;
            }
            _ => {
                let vector = VECTOR_BASE + 2 * u16::from(self.irq_level);
                self.pc = self.any_r16(bus, vector);
                log::trace!(
                    "{}: interrupt {} via {vector:04x} -> {:04x}",
                    self.tag(),
                    self.irq_level,
                    self.pc
                );
                self.consume(timing::IRQ_VECTOR);
                self.inst_substate = 0;
                self.inst_state = InstState::Fetch;
            }
        }
    }
}
