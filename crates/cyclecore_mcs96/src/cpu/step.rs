use cyclecore_common::{EmuError, Result};

use super::{Bus, InstState, Mcs96};

impl Mcs96 {
    /// Run for up to `cycles` clock cycles and return the cycles actually
    /// consumed. The last instruction may overshoot the budget; the run
    /// stops early when the bus reports an aborted timeslice.
    pub fn execute_run<B: Bus>(&mut self, cycles: i64, bus: &mut B) -> Result<i64> {
        self.icount = cycles;
        self.bcount = 0;
        self.internal_update(self.total_cycles);

        'run: while self.icount > 0 {
            while self.icount > self.bcount {
                let picount = if self.inst_state.is_dispatch() {
                    -1
                } else {
                    self.icount
                };
                self.boundary(bus);
                self.do_exec_full(bus);
                if self.icount == picount {
                    log::error!(
                        "{}: unhandled {:x} ({:04x})",
                        self.tag(),
                        self.inst_state.raw(),
                        self.ppc
                    );
                    return Err(EmuError::UnhandledInstruction {
                        state: self.inst_state.raw(),
                        ppc: self.ppc,
                    });
                }
                if bus.timeslice_aborted() {
                    break 'run;
                }
            }
            while self.bcount != 0 && self.icount <= self.bcount {
                let event = self.total_cycles as i64 + self.icount - self.bcount;
                self.internal_update(event as u64);
            }
        }

        let consumed = cycles - self.icount;
        self.icount = 0;
        self.bcount = 0;
        Ok(consumed)
    }

    /// Execute exactly one state (one instruction, one dispatch or the
    /// whole interrupt entry) and return the cycles it took.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> Result<u64> {
        let start = self.total_cycles;
        let dispatch = self.inst_state.is_dispatch();
        self.boundary(bus);
        self.do_exec_full(bus);
        self.internal_update(self.total_cycles);
        let taken = self.total_cycles - start;
        if taken == 0 && !dispatch {
            return Err(EmuError::UnhandledInstruction {
                state: self.inst_state.raw(),
                ppc: self.ppc,
            });
        }
        Ok(taken)
    }

    /// Instruction boundary: publish local time and apply line changes.
    fn boundary<B: Bus>(&mut self, bus: &mut B) {
        bus.begin_instruction(self.total_cycles);
        while let Some((line, state)) = bus.next_input_line_change() {
            self.execute_set_input(line, state);
        }
    }

    pub(crate) fn do_exec_full<B: Bus>(&mut self, bus: &mut B) {
        match self.inst_state {
            InstState::Fetch => self.fetch(bus, true),
            InstState::FetchNoIrq => self.fetch(bus, false),
            InstState::Irq => {
                while self.inst_state == InstState::Irq {
                    self.irq_step(bus);
                }
            }
            InstState::Exec(op) => self.execute_opcode(bus, op),
        }
    }

    /// Run a single micro-step. Only the interrupt entry has more than one;
    /// every other state behaves as in `do_exec_full`.
    pub fn do_exec_partial<B: Bus>(&mut self, bus: &mut B) {
        match self.inst_state {
            InstState::Irq => self.irq_step(bus),
            _ => self.do_exec_full(bus),
        }
    }

    fn fetch<B: Bus>(&mut self, bus: &mut B, allow_irq: bool) {
        if allow_irq && self.irq_requested && self.take_interrupt() {
            return;
        }
        self.ppc = self.pc;
        let op = self.fetch8(bus);
        self.op1 = if op == 0xfe {
            0x100 | u16::from(self.fetch8(bus))
        } else {
            u16::from(op)
        };
        self.inst_state = InstState::Exec(self.op1);
    }
}
