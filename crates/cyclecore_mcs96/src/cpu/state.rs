use cyclecore_common::{Saveable, StateVisitor};

use super::{InstState, Mcs96, Psw};

impl Saveable for Mcs96 {
    fn save_state(&mut self, state: &mut dyn StateVisitor) {
        let tag = self.tag().to_string();
        let name = |field: &str| format!("{tag}.{field}");

        let mut inst_state = self.inst_state.raw();
        let mut psw = self.psw.bits();

        state.bytes(&name("register_file"), &mut self.register_file);
        state.u16(&name("pc"), &mut self.pc);
        state.u16(&name("ppc"), &mut self.ppc);
        state.u16(&name("psw"), &mut psw);
        state.u8(&name("pending_irq"), &mut self.pending_irq);
        state.bool(&name("irq_requested"), &mut self.irq_requested);
        state.u16(&name("inst_state"), &mut inst_state);
        state.u8(&name("inst_substate"), &mut self.inst_substate);
        state.u8(&name("irq_level"), &mut self.irq_level);
        state.u16(&name("op1"), &mut self.op1);
        state.u16(&name("tmp"), &mut self.tmp);
        state.line(&name("exint"), &mut self.exint);
        state.u64(&name("total_cycles"), &mut self.total_cycles);
        state.u64(&name("timer1_epoch"), &mut self.timer1_epoch);
        state.u64(&name("timer1_overflow"), &mut self.timer1_overflow);

        self.inst_state = InstState::from_raw(inst_state);
        self.psw = Psw::from_bits_retain(psw);
    }
}
