use cyclecore_common::{Saveable, StateVisitor};

use crate::periph::uart::{Fifo, UART_FIFO_SIZE};
use crate::Scc68070;

fn fifo(state: &mut dyn StateVisitor, name: &str, fifo: &mut Fifo) {
    let mut len = fifo.len as u32;
    state.bytes(&format!("{name}.buffer"), &mut fifo.buf);
    state.u32(&format!("{name}.len"), &mut len);
    fifo.len = (len as usize).min(UART_FIFO_SIZE);
}

impl Saveable for Scc68070 {
    fn save_state(&mut self, state: &mut dyn StateVisitor) {
        let tag = self.tag().to_string();
        let name = |field: &str| format!("{tag}.{field}");

        state.u8(&name("ipl"), &mut self.ipl);
        state.line(&name("in2_line"), &mut self.in2);
        state.line(&name("in4_line"), &mut self.in4);
        state.line(&name("in5_line"), &mut self.in5);
        state.line(&name("nmi_line"), &mut self.nmi);
        state.line(&name("int1_line"), &mut self.int1);
        state.line(&name("int2_line"), &mut self.int2);
        state.u16(&name("lir"), &mut self.lir);

        state.u8(&name("picr1"), &mut self.picr1);
        state.u8(&name("picr2"), &mut self.picr2);
        state.bool(&name("timer_int"), &mut self.timer_int);
        state.bool(&name("i2c_int"), &mut self.i2c_int);
        state.bool(&name("uart_rx_int"), &mut self.uart_rx_int);
        state.bool(&name("uart_tx_int"), &mut self.uart_tx_int);

        let i2c = &mut self.i2c;
        state.u8(&name("i2c.data_register"), &mut i2c.data);
        state.u8(&name("i2c.address_register"), &mut i2c.address);
        state.u8(&name("i2c.status_register"), &mut i2c.status);
        state.u8(&name("i2c.control_register"), &mut i2c.control);
        state.u8(&name("i2c.clock_control_register"), &mut i2c.clock_control);

        let uart = &mut self.uart;
        state.u8(&name("uart.mode_register"), &mut uart.mode);
        state.u8(&name("uart.status_register"), &mut uart.status);
        state.u8(&name("uart.clock_select"), &mut uart.clock_select);
        state.u8(&name("uart.command_register"), &mut uart.command);
        state.u8(&name("uart.transmit_holding_register"), &mut uart.transmit_holding);
        state.u8(&name("uart.receive_holding_register"), &mut uart.receive_holding);
        fifo(state, &name("uart.receive"), &mut uart.rx);
        fifo(state, &name("uart.transmit"), &mut uart.tx);

        let timers = &mut self.timers;
        state.u8(&name("timers.timer_status_register"), &mut timers.status);
        state.u8(&name("timers.timer_control_register"), &mut timers.control);
        state.u16(&name("timers.reload_register"), &mut timers.reload);
        state.u16(&name("timers.timer0"), &mut timers.timer0);
        state.u16(&name("timers.timer1"), &mut timers.timer1);
        state.u16(&name("timers.timer2"), &mut timers.timer2);

        for (i, ch) in self.dma.channel.iter_mut().enumerate() {
            let field = |f: &str| name(&format!("dma.channel[{i}].{f}"));
            state.u8(&field("channel_status"), &mut ch.channel_status);
            state.u8(&field("channel_error"), &mut ch.channel_error);
            state.u8(&field("device_control"), &mut ch.device_control);
            state.u8(&field("operation_control"), &mut ch.operation_control);
            state.u8(&field("sequence_control"), &mut ch.sequence_control);
            state.u8(&field("channel_control"), &mut ch.channel_control);
            state.u16(&field("transfer_counter"), &mut ch.transfer_counter);
            state.u32(&field("memory_address_counter"), &mut ch.memory_address_counter);
            state.u32(&field("device_address_counter"), &mut ch.device_address_counter);
        }

        state.u8(&name("mmu.status"), &mut self.mmu.status);
        state.u8(&name("mmu.control"), &mut self.mmu.control);
        for (i, desc) in self.mmu.desc.iter_mut().enumerate() {
            let field = |f: &str| name(&format!("mmu.desc[{i}].{f}"));
            state.u16(&field("attr"), &mut desc.attr);
            state.u16(&field("length"), &mut desc.length);
            state.u8(&field("segment"), &mut desc.segment);
            state.u16(&field("base"), &mut desc.base);
        }
    }
}
