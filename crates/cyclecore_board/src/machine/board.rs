use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use typed_builder::TypedBuilder;

use cyclecore_common::memory::RegionId;
use cyclecore_common::state::{StateInspector, StateReader, StateValue, StateWriter};
use cyclecore_common::{
    AccessMode, AddressSpace, Attotime, DataWidth, EmuError, Endianness, FiredTimer, LineState,
    Machine, MapTarget, Result, Saveable, Scheduler, SpaceConfig, StateVisitor, TimerId,
};
use cyclecore_mcs96::{Mcs96, Mcs96Config};
use cyclecore_scc68070::{LogChannels, Scc68070, Scc68070Config, SccLine};

use super::bus::{BoardDevices, CpuBus};
use super::{
    FRAME_LATCH, IACK_DEVICE, IACK_END, IACK_START, LATCH_DEVICE, RAM_END, RAM_START, ROM_END,
    ROM_SIZE, ROM_START, SCC_DEVICE, SCC_END, SCC_START,
};

pub const CPU_TAG: &str = "maincpu";
pub const SCC_TAG: &str = "scc";

#[derive(Clone, Debug, TypedBuilder)]
pub struct BoardConfig {
    /// MCS-96 input clock in Hz.
    #[builder(default = 12_000_000)]
    pub cpu_clock: u32,
    #[builder(default = 1)]
    pub cpu_cycles_scaling: u32,
    /// SCC68070 CLKOUT in Hz.
    #[builder(default = 15_500_000)]
    pub scc_clock: u32,
    /// Frame timer rate; 0 disables it.
    #[builder(default = 60)]
    pub frame_hz: u32,
    /// Lowest SCC68070 priority level that asserts EXINT.
    #[builder(default = 1)]
    pub exint_level: u8,
    #[builder(default)]
    pub scc_verbose: LogChannels,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub struct Board {
    config: BoardConfig,
    cpu: Mcs96,
    scc: Scc68070,
    scheduler: Scheduler,
    program: AddressSpace,
    ram: RegionId,
    rom: RegionId,
    frame_timer: TimerId,
    frame_counter: u16,
    /// EXINT level last presented to the CPU.
    exint: LineState,
    serial: Rc<RefCell<Vec<u8>>>,
}

impl Board {
    pub fn new(config: BoardConfig) -> Result<Self> {
        let serial = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&serial);

        let mut scheduler = Scheduler::new();
        let mut scc = Scc68070::new(
            SCC_TAG,
            Scc68070Config::builder()
                .clock(config.scc_clock)
                .verbose(config.scc_verbose)
                .uart_tx(Box::new(move |byte: u8| sink.borrow_mut().push(byte)))
                .build(),
        );
        scc.start(&mut scheduler);
        let frame_timer = scheduler.timer_alloc("board.frame");

        let cpu = Mcs96::new(
            CPU_TAG,
            Mcs96Config::builder()
                .clock(config.cpu_clock)
                .cycles_scaling(config.cpu_cycles_scaling)
                .build(),
        );

        let mut program = AddressSpace::new(
            SpaceConfig::builder()
                .name("program")
                .address_bits(16)
                .data_width(DataWidth::Bits8)
                .endianness(Endianness::Little)
                .build(),
        );
        let ram = program.add_region("ram", (RAM_END - RAM_START + 1) as usize, true);
        let rom = program.add_region("rom", ROM_SIZE, false);
        program.install(RAM_START, RAM_END, 0, MapTarget::Region(ram))?;
        program.install(IACK_START, IACK_END, 0, MapTarget::Device(IACK_DEVICE))?;
        program.install(FRAME_LATCH, FRAME_LATCH + 1, 0, MapTarget::Device(LATCH_DEVICE))?;
        program.install(ROM_START, ROM_END, 0, MapTarget::Region(rom))?;
        program.install(SCC_START, SCC_END, 0, MapTarget::Device(SCC_DEVICE))?;
        program.region_mut(rom).fill(0xff);

        let mut board = Self {
            config,
            cpu,
            scc,
            scheduler,
            program,
            ram,
            rom,
            frame_timer,
            frame_counter: 0,
            exint: LineState::Clear,
            serial,
        };
        board.start_frame_timer();
        Ok(board)
    }

    /// Build a board and load the ROM image at `path`.
    pub fn from_rom_file(path: impl AsRef<Path>, config: BoardConfig) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let image =
            std::fs::read(path).with_context(|| format!("reading ROM '{}'", path.display()))?;
        let mut board = Self::new(config).context("building the board")?;
        board
            .load_rom(&image)
            .with_context(|| format!("loading ROM '{}'", path.display()))?;
        Ok(board)
    }

    fn start_frame_timer(&mut self) {
        let period = Attotime::from_hz(self.config.frame_hz);
        self.scheduler
            .adjust_periodic(self.frame_timer, period, period);
    }

    /// Copy `image` to the start of the ROM window and reset the board.
    pub fn load_rom(&mut self, image: &[u8]) -> Result<()> {
        if image.len() > ROM_SIZE {
            return Err(EmuError::InvalidRom(format!(
                "{} bytes does not fit the {ROM_SIZE} byte ROM window",
                image.len()
            )));
        }
        self.program.region_mut(self.rom).fill(0xff);
        self.program.load_region(self.rom, 0, image)?;
        log::info!("loaded {} byte ROM", image.len());
        self.reset();
        Ok(())
    }

    /// Reset the CPU, the controller and the board latches, and disarm the
    /// controller's timers. RAM and ROM are preserved.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.scc.stop_timers(&mut self.scheduler);
        self.scc.reset();
        self.frame_counter = 0;
        self.start_frame_timer();
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn cpu(&self) -> &Mcs96 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mcs96 {
        &mut self.cpu
    }

    pub fn scc(&self) -> &Scc68070 {
        &self.scc
    }

    pub fn frame_counter(&self) -> u16 {
        self.frame_counter
    }

    pub fn now(&self) -> Attotime {
        self.scheduler.now()
    }

    pub fn ram(&self) -> &[u8] {
        self.program.region(self.ram)
    }

    /// Everything the UART has shifted out so far.
    pub fn serial_output(&self) -> Vec<u8> {
        self.serial.borrow().clone()
    }

    pub fn take_serial_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut *self.serial.borrow_mut())
    }

    /// Queue bytes on the UART receive pin.
    pub fn serial_input(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.scc.uart_rx(byte, &mut self.scheduler)?;
        }
        Ok(())
    }

    /// Drive one of the controller's external interrupt pins.
    pub fn set_scc_line(&mut self, line: SccLine, state: LineState) {
        self.scc.set_line(line, state);
    }

    /// Read the program space without side effects.
    pub fn peek(&mut self, addr: u16) -> u8 {
        let mut devices = BoardDevices {
            scc: &mut self.scc,
            scheduler: &mut self.scheduler,
            frame_counter: self.frame_counter,
        };
        self.program
            .read8(u32::from(addr), AccessMode::Debug, &mut devices)
    }

    pub fn save_state(&mut self) -> Vec<u8> {
        StateWriter::save(self)
    }

    pub fn load_state(&mut self, blob: &[u8]) -> Result<()> {
        StateReader::load(self, blob)
    }

    /// Look up one saved item by name, e.g. `"maincpu.pc"`.
    pub fn query(&mut self, name: &str) -> Option<StateValue> {
        StateInspector::query(self, name)
    }

    fn frame(&mut self) {
        self.frame_counter = self.frame_counter.wrapping_add(1);
        log::trace!("frame {}", self.frame_counter);
        self.scc.set_line(SccLine::Int1, LineState::Assert);
        self.scc.set_line(SccLine::Int1, LineState::Clear);
    }
}

impl Machine for Board {
    fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    fn execute(&mut self, horizon: Attotime) -> Result<Attotime> {
        let clock = self.config.cpu_clock;
        let local = Attotime::from_cycles(self.cpu.total_cycles(), clock);
        if local < horizon {
            let cycles = local.cycles_until(horizon, clock);
            let mut bus = CpuBus {
                program: &mut self.program,
                devices: BoardDevices {
                    scc: &mut self.scc,
                    scheduler: &mut self.scheduler,
                    frame_counter: self.frame_counter,
                },
                clock,
                exint: &mut self.exint,
                exint_level: self.config.exint_level,
            };
            self.cpu
                .execute_run(i64::try_from(cycles).unwrap_or(i64::MAX), &mut bus)?;
        }
        if let Some(fault) = self.scc.take_fault() {
            return Err(fault);
        }
        Ok(Attotime::from_cycles(self.cpu.total_cycles(), clock))
    }

    fn timer_expired(&mut self, timer: FiredTimer) -> Result<()> {
        if timer.id == self.frame_timer {
            self.frame();
            Ok(())
        } else if self.scc.owns_timer(timer.id) {
            self.scc.timer_expired(timer.id, &mut self.scheduler)
        } else {
            log::warn!("timer {} has no owner", timer.id.index());
            Ok(())
        }
    }
}

impl Saveable for Board {
    fn save_state(&mut self, state: &mut dyn StateVisitor) {
        Saveable::save_state(&mut self.scheduler, state);
        Saveable::save_state(&mut self.cpu, state);
        Saveable::save_state(&mut self.scc, state);
        Saveable::save_state(&mut self.program, state);
        state.u16("board.frame_counter", &mut self.frame_counter);
        state.line("board.exint", &mut self.exint);
    }
}
