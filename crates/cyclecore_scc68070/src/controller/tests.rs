use std::cell::RefCell;
use std::rc::Rc;

use cyclecore_common::state::{StateReader, StateWriter};
use cyclecore_common::{AddressSpace, Attotime, DeviceTag};

use super::*;
use crate::port::{self, SccPort};
use crate::regs::*;
use crate::UART_FIFO_SIZE;

fn setup() -> (Scc68070, Scheduler) {
    setup_with(Scc68070Config::default())
}

fn setup_with(config: Scc68070Config) -> (Scc68070, Scheduler) {
    let mut sched = Scheduler::new();
    let mut scc = Scc68070::new("scc", config);
    scc.start(&mut sched);
    (scc, sched)
}

fn write(scc: &mut Scc68070, sched: &mut Scheduler, offset: u32, data: u16) {
    scc.periphs_w(offset, data, 0xffff, sched);
}

fn read(scc: &mut Scc68070, offset: u32) -> u16 {
    scc.periphs_r(offset, 0xffff, AccessMode::Normal)
}

/// Fire every timer due up to `upto` into the controller.
fn run_timers(scc: &mut Scc68070, sched: &mut Scheduler, upto: Attotime) {
    while let Some(fired) = sched.fire_next(upto) {
        scc.timer_expired(fired.id, sched).unwrap();
    }
    sched.advance_to(upto);
}

fn lines(scc: &mut Scc68070) -> Vec<(u8, LineState)> {
    std::iter::from_fn(|| scc.take_irq_line_change()).collect()
}

/// Arm timer 0 to overflow after one count and let it fire.
fn raise_timer(scc: &mut Scc68070, sched: &mut Scheduler) {
    write(scc, sched, TIMER0, 0xffff);
    let until = sched.now() + Timers::period(0xffff, scc.config().clock);
    run_timers(scc, sched, until);
}

#[test]
fn reset_state() {
    let (mut scc, _) = setup();
    assert_eq!(scc.ipl(), 0);
    assert_eq!(scc.uart().status, USR_TXRDY);
    assert_eq!(read(&mut scc, UART_STATUS), u16::from(USR_TXRDY | 0x02 | 0x08));
    assert_eq!(read(&mut scc, UART_MODE), 0x20);
    assert_eq!(read(&mut scc, UART_COMMAND), 0x80);
    assert!(lines(&mut scc).is_empty());
}

#[test]
fn timer_interrupt_uses_picr1_low_level() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, PICR1, 0x03);
    raise_timer(&mut scc, &mut sched);

    assert!(scc.timer_int());
    assert_eq!(scc.ipl(), 3);
    assert_eq!(lines(&mut scc), [(3, LineState::Assert)]);

    assert_eq!(scc.iack_r(3, AccessMode::Normal), 0x3b);
    assert!(!scc.timer_int());
    assert_eq!(scc.ipl(), 0);
    assert_eq!(lines(&mut scc), [(3, LineState::Clear)]);
}

#[test]
fn only_the_highest_level_is_asserted() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, PICR1, 0x02);
    raise_timer(&mut scc, &mut sched);
    scc.set_line(SccLine::In5, LineState::Assert);
    assert_eq!(scc.ipl(), 5);
    assert_eq!(
        lines(&mut scc),
        [
            (2, LineState::Assert),
            (2, LineState::Clear),
            (5, LineState::Assert)
        ]
    );

    scc.set_line(SccLine::In5, LineState::Clear);
    assert_eq!(scc.ipl(), 2);
}

#[test]
fn repeated_iack_without_source_is_idempotent() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, PICR1, 0x03);
    raise_timer(&mut scc, &mut sched);
    lines(&mut scc);

    assert_eq!(scc.iack_r(5, AccessMode::Normal), 0x3d);
    assert_eq!(scc.iack_r(5, AccessMode::Normal), 0x3d);
    assert_eq!(scc.ipl(), 3);
    assert!(scc.timer_int());
    assert!(lines(&mut scc).is_empty());
}

#[test]
fn debug_iack_clears_nothing() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, PICR1, 0x03);
    raise_timer(&mut scc, &mut sched);
    assert_eq!(scc.iack_r(3, AccessMode::Debug), 0x3b);
    assert!(scc.timer_int());
    assert_eq!(scc.ipl(), 3);
}

#[test]
fn external_lines_autovector_or_use_callback() {
    let config = Scc68070Config::builder()
        .iack4(Box::new(|| 0x40u8))
        .build();
    let (mut scc, _) = setup_with(config);

    scc.set_line(SccLine::In2, LineState::Assert);
    assert_eq!(scc.ipl(), 2);
    assert_eq!(scc.iack_r(2, AccessMode::Normal), autovector(2));

    scc.set_line(SccLine::In4, LineState::Assert);
    assert_eq!(scc.ipl(), 4);
    assert_eq!(scc.iack_r(4, AccessMode::Normal), 0x40);

    scc.set_line(SccLine::Nmi, LineState::Assert);
    assert_eq!(scc.ipl(), 7);
    assert_eq!(scc.iack_r(7, AccessMode::Normal), 0x1f);
    // Level-sensitive: acknowledging does not drop the line.
    assert_eq!(scc.ipl(), 7);
}

#[test]
fn int1_is_edge_latched_into_lir() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, LIR, 0x0050);
    assert_eq!(scc.ipl(), 0);

    scc.set_line(SccLine::Int1, LineState::Assert);
    assert_eq!(scc.lir(), 0x00d0);
    assert_eq!(scc.ipl(), 5);

    assert_eq!(scc.iack_r(5, AccessMode::Normal), 0x3d);
    assert_eq!(scc.lir(), 0x0050);
    assert_eq!(scc.ipl(), 0);

    // Still high: no new edge.
    scc.set_line(SccLine::Int1, LineState::Assert);
    assert_eq!(scc.ipl(), 0);

    scc.set_line(SccLine::Int1, LineState::Clear);
    scc.set_line(SccLine::Int1, LineState::Assert);
    assert_eq!(scc.ipl(), 5);
}

#[test]
fn int2_edges_do_not_disturb_int1() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, LIR, 0x0062);

    scc.set_line(SccLine::Int2, LineState::Assert);
    assert_eq!(scc.lir(), 0x006a);
    assert_eq!(scc.ipl(), 2);

    scc.set_line(SccLine::Int1, LineState::Assert);
    assert_eq!(scc.lir(), 0x00ea);
    assert_eq!(scc.ipl(), 6);
}

#[test]
fn acknowledge_follows_source_order() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, LIR, 0x0030);
    write(&mut scc, &mut sched, PICR1, 0x03);
    raise_timer(&mut scc, &mut sched);
    scc.set_line(SccLine::Int1, LineState::Assert);
    assert_eq!(scc.ipl(), 3);

    scc.iack_r(3, AccessMode::Normal);
    assert_eq!(scc.lir() & 0x80, 0);
    assert!(scc.timer_int());
    assert_eq!(scc.ipl(), 3);

    scc.iack_r(3, AccessMode::Normal);
    assert!(!scc.timer_int());
    assert_eq!(scc.ipl(), 0);
}

#[test]
fn i2c_acknowledge_matches_picr1_level() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, PICR1, 0x40);
    scc.set_i2c_interrupt(true);
    assert_eq!(scc.ipl(), 4);

    scc.iack_r(1, AccessMode::Normal);
    assert_eq!(scc.ipl(), 4);

    scc.iack_r(4, AccessMode::Normal);
    assert_eq!(scc.ipl(), 0);
}

#[test]
fn picr_writes_acknowledge_sources() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, PICR1, 0x03);
    raise_timer(&mut scc, &mut sched);
    assert_eq!(scc.ipl(), 3);

    write(&mut scc, &mut sched, PICR1, 0x0b);
    assert!(!scc.timer_int());
    assert_eq!(scc.ipl(), 0);
    assert_eq!(read(&mut scc, PICR1), 0x03);
}

#[test]
fn timer0_reloads_and_sets_overflow_flag() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, TIMER_RELOAD, 0xff00);
    write(&mut scc, &mut sched, TIMER0, 0xfff0);
    let clock = scc.config().clock;
    let first = Timers::period(0xfff0, clock);
    assert_eq!(first, Attotime::from_cycles(96 * 16, clock));

    run_timers(&mut scc, &mut sched, first);
    assert_eq!(read(&mut scc, TIMER0), 0xff00);
    assert_eq!(read(&mut scc, TIMER_STATUS_CONTROL) >> 8, u16::from(TSR_OV0));

    // Status is write-one-to-clear from the high byte.
    write(&mut scc, &mut sched, TIMER_STATUS_CONTROL, 0x8005);
    assert_eq!(read(&mut scc, TIMER_STATUS_CONTROL), 0x0005);

    let timer0 = scc.timer_ids.unwrap().timer0;
    assert_eq!(
        sched.expire_time(timer0),
        first + Timers::period(0xff00, clock)
    );
}

#[test]
fn only_timer_channel_zero_counts() {
    let (mut scc, mut sched) = setup();
    assert_eq!(
        scc.arm_timer(1, &mut sched).unwrap_err(),
        EmuError::UnsupportedTimerChannel(1)
    );
    write(&mut scc, &mut sched, TIMER1, 0x1234);
    assert_eq!(read(&mut scc, TIMER1), 0x1234);
}

#[test]
fn uart_transmits_through_the_sink() {
    let out = Rc::new(RefCell::new(Vec::<u8>::new()));
    let sink = Rc::clone(&out);
    let config = Scc68070Config::builder()
        .uart_tx(Box::new(move |byte: u8| sink.borrow_mut().push(byte)))
        .build();
    let (mut scc, mut sched) = setup_with(config);

    write(&mut scc, &mut sched, UART_COMMAND, 0x04);
    write(&mut scc, &mut sched, UART_THR, u16::from(b'H'));
    write(&mut scc, &mut sched, UART_THR, u16::from(b'i'));
    assert_eq!(scc.uart().status & USR_TXRDY, 0);

    run_timers(&mut scc, &mut sched, Attotime::from_msec(100));
    assert_eq!(out.borrow().as_slice(), b"Hi");
    assert!(scc.uart_tx_int());
    assert_ne!(scc.uart().status & USR_TXRDY, 0);
}

#[test]
fn stop_timers_disarms_timer_and_uart() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, TIMER0, 0xffff);
    write(&mut scc, &mut sched, UART_COMMAND, 0x05);
    write(&mut scc, &mut sched, UART_THR, u16::from(b'Z'));
    let timers = scc.timer_ids.unwrap();
    assert!(sched.enabled(timers.timer0));
    assert!(sched.enabled(timers.uart_rx));
    assert!(sched.enabled(timers.uart_tx));

    scc.stop_timers(&mut sched);
    scc.reset();
    assert_eq!(sched.next_expiry(), Attotime::NEVER);
    assert_eq!(scc.ipl(), 0);
}

#[test]
fn uart_tx_rate_follows_clock_select() {
    assert_eq!(Uart::rate_hz(0), 93);
    assert_eq!(Uart::rate_hz(7), 12_000);
    assert_eq!(Uart::rate_hz(0x17), 12_000);
}

#[test]
fn uart_receive_raises_interrupt_until_read() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, PICR2, 0x20);
    write(&mut scc, &mut sched, UART_COMMAND, 0x01);
    scc.uart_rx(b'A', &mut sched).unwrap();
    scc.uart_rx(b'B', &mut sched).unwrap();

    run_timers(&mut scc, &mut sched, Attotime::from_msec(11));
    assert!(scc.uart_rx_int());
    assert_eq!(scc.ipl(), 2);
    assert_ne!(scc.uart().status & USR_RXRDY, 0);

    assert_eq!(scc.periphs_r(UART_RHR, 0x00ff, AccessMode::Debug), u16::from(b'A'));
    assert_eq!(scc.uart().rx.len(), 2);

    assert_eq!(read(&mut scc, UART_RHR), u16::from(b'A'));
    assert!(!scc.uart_rx_int());
    assert_eq!(scc.ipl(), 0);
    assert_eq!(read(&mut scc, UART_RHR), u16::from(b'B'));
    assert!(scc.uart().rx.is_empty());
}

#[test]
fn disabling_the_receiver_stops_its_timer() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, UART_COMMAND, 0x01);
    let rx = scc.timer_ids.unwrap().uart_rx;
    assert!(sched.enabled(rx));
    write(&mut scc, &mut sched, UART_COMMAND, 0x02);
    assert!(!sched.enabled(rx));
}

#[test]
fn receive_fifo_overflow_is_fatal() {
    let mut sched = Scheduler::new();
    let mut scc = Scc68070::new("scc", Scc68070Config::default());
    for i in 0..UART_FIFO_SIZE {
        scc.uart_rx(i as u8, &mut sched).unwrap();
    }
    let err = scc.uart_rx(0, &mut sched).unwrap_err();
    assert_eq!(
        err,
        EmuError::FifoOverflow {
            device: "scc".into(),
            fifo: "rx",
            capacity: UART_FIFO_SIZE
        }
    );
}

#[test]
fn transmit_overflow_through_registers_is_reported_as_fault() {
    let mut sched = Scheduler::new();
    let mut scc = Scc68070::new("scc", Scc68070Config::default());
    for _ in 0..UART_FIFO_SIZE {
        write(&mut scc, &mut sched, UART_THR, 0x55);
    }
    assert!(scc.take_fault().is_none());
    write(&mut scc, &mut sched, UART_THR, 0x55);
    assert!(matches!(
        scc.take_fault(),
        Some(EmuError::FifoOverflow { fifo: "tx", .. })
    ));
    assert!(scc.take_fault().is_none());
}

#[test]
fn dma_completion_interrupt() {
    let (mut scc, mut sched) = setup();
    // Channel 2: SO | INE | level 5
    scc.periphs_w(0x4046, 0x008d, 0x00ff, &mut sched);
    assert_eq!(scc.dma().channel[1].channel_control, 0x0d);
    assert_eq!(scc.dma().channel[1].channel_status, CSR_COC);
    assert_eq!(scc.ipl(), 5);

    scc.periphs_w(0x4040, 0x8000, 0xff00, &mut sched);
    assert_eq!(scc.dma().channel[1].channel_status, 0);
    assert_eq!(scc.ipl(), 0);
}

#[test]
fn dma_address_counters_are_split_words() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, 0x400c, 0x0012);
    write(&mut scc, &mut sched, 0x400e, 0x3456);
    scc.periphs_w(0x4054, 0xab00, 0xff00, &mut sched);
    write(&mut scc, &mut sched, 0x404a, 0x0100);

    assert_eq!(scc.dma().channel[0].memory_address_counter, 0x0012_3456);
    assert_eq!(scc.dma().channel[1].device_address_counter, 0xab00_0000);
    assert_eq!(read(&mut scc, 0x400c), 0x0012);
    assert_eq!(read(&mut scc, 0x4056), 0x0000);
    assert_eq!(read(&mut scc, 0x404a), 0x0100);
}

#[test]
fn mmu_registers() {
    let (mut scc, mut sched) = setup();
    scc.periphs_w(MMU_STATUS_CONTROL, 0x0081, 0x00ff, &mut sched);
    assert_eq!(scc.periphs_r(MMU_STATUS_CONTROL, 0x00ff, AccessMode::Normal), 0x81);
    assert_eq!(scc.periphs_r(MMU_STATUS_CONTROL, 0xff00, AccessMode::Normal), 0);

    // Descriptor 3
    write(&mut scc, &mut sched, 0x8058, 0x1111);
    write(&mut scc, &mut sched, 0x805a, 0x2222);
    write(&mut scc, &mut sched, 0x805c, 0x0033);
    write(&mut scc, &mut sched, 0x805e, 0x4444);
    assert_eq!(
        scc.mmu().desc[3],
        crate::periph::mmu::Descriptor {
            attr: 0x1111,
            length: 0x2222,
            segment: 0x33,
            base: 0x4444
        }
    );
    assert_eq!(scc.periphs_r(0x805c, 0xff00, AccessMode::Normal), 0);
}

#[test]
fn unknown_offsets_read_zero() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, 0x3000, 0xffff);
    assert_eq!(read(&mut scc, 0x3000), 0);
    assert_eq!(read(&mut scc, 0x4002), 0);
}

#[test]
fn i2c_status_hides_bit_four() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, I2C_STATUS, 0x00ff);
    assert_eq!(scc.i2c().status, 0xff);
    assert_eq!(read(&mut scc, I2C_STATUS), 0xef);
    scc.periphs_w(I2C_DATA, 0x5500, 0xff00, &mut sched);
    assert_eq!(scc.i2c().data, 0);
}

#[test]
fn cpu_space_routes_registers_and_acknowledge() {
    let (mut scc, mut sched) = setup();
    let periph = DeviceTag(0);
    let iack = DeviceTag(1);
    let mut space = AddressSpace::new(port::cpu_space_config("program"));
    port::internal_map(&mut space, periph, iack).unwrap();

    let mut bus = SccPort {
        scc: &mut scc,
        scheduler: &mut sched,
        periph,
        iack,
    };
    space.write16(0x8000_2044, 0x00ff, AccessMode::Normal, &mut bus);
    assert_eq!(space.read16(0x8000_2044, AccessMode::Normal, &mut bus), 0x0077);
    // Byte access to the odd address lands on the low lane.
    space.write8(0x8000_2047, 0x20, AccessMode::Normal, &mut bus);
    assert_eq!(space.read8(0x8000_2047, AccessMode::Normal, &mut bus), 0x20);
    assert_eq!(space.read8(0xffff_fff5, AccessMode::Normal, &mut bus), 0x3a);
    assert_eq!(space.read8(0x8000_3000, AccessMode::Normal, &mut bus), 0);
}

#[test]
fn state_round_trip() {
    let (mut scc, mut sched) = setup();
    write(&mut scc, &mut sched, PICR2, 0x20);
    write(&mut scc, &mut sched, UART_COMMAND, 0x01);
    scc.uart_rx(b'x', &mut sched).unwrap();
    write(&mut scc, &mut sched, 0x8046, 0x00ab);
    scc.set_line(SccLine::In4, LineState::Assert);
    let blob = StateWriter::save(&mut scc);

    let mut restored = Scc68070::new("scc", Scc68070Config::default());
    StateReader::load(&mut restored, &blob).unwrap();
    assert_eq!(restored.ipl(), 4);
    assert_eq!(restored.uart().rx.len(), 1);
    assert_eq!(restored.uart().rx.front(), b'x');
    assert_eq!(restored.uart().command, 0x01);
    assert_eq!(restored.mmu().desc[0].base, 0x00ab);
    assert_eq!(read(&mut restored, PICR2), 0x20);
}
