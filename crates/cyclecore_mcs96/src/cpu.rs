mod alu;
mod bus;
mod exec;
mod interrupts;
mod operands;
mod regs;
mod state;
mod step;
mod timer;
mod timing;

use typed_builder::TypedBuilder;

use cyclecore_common::{Device, Executable, LineState};

pub use bus::Bus;
pub use regs::Psw;

/// Addresses below this go to the on-chip register file.
pub const REGISTER_WINDOW_END: u16 = 0x100;

/// PC after reset.
pub const RESET_PC: u16 = 0x2080;

/// External interrupt input, pending bit 7.
pub const EXINT_LINE: u8 = 0;

/// Instruction state of the execution engine.
///
/// `Exec` holds the opcode being executed: the plain opcode, or
/// `0x100 | op` for the 0xfe-prefixed group. The other states are the
/// fetch/dispatch points between instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstState {
    Exec(u16),
    Fetch,
    /// Fetch without sampling interrupts, after DI/EI/PUSHF/POPF.
    FetchNoIrq,
    Irq,
}

impl InstState {
    pub const FETCH: u16 = 0x200;
    pub const FETCH_NOIRQ: u16 = 0x201;
    pub const IRQ: u16 = 0x202;

    pub fn raw(self) -> u16 {
        match self {
            InstState::Exec(op) => op,
            InstState::Fetch => Self::FETCH,
            InstState::FetchNoIrq => Self::FETCH_NOIRQ,
            InstState::Irq => Self::IRQ,
        }
    }

    pub fn from_raw(raw: u16) -> Self {
        match raw {
            Self::FETCH => InstState::Fetch,
            Self::FETCH_NOIRQ => InstState::FetchNoIrq,
            Self::IRQ => InstState::Irq,
            op => InstState::Exec(op & 0x1ff),
        }
    }

    /// True for the dispatch states, which may legitimately take no cycles.
    pub fn is_dispatch(self) -> bool {
        self.raw() >= Self::FETCH
    }
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct Mcs96Config {
    /// Input clock in Hz.
    #[builder(default = 12_000_000)]
    pub clock: u32,
    /// Clock cycles per state time.
    #[builder(default = 1)]
    pub cycles_scaling: u32,
}

impl Default for Mcs96Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// MCS-96 CPU state.
pub struct Mcs96 {
    tag: String,
    config: Mcs96Config,

    pub(crate) register_file: [u8; 0x100],
    pub(crate) pc: u16,
    /// Address of the instruction being executed.
    pub(crate) ppc: u16,
    pub(crate) psw: Psw,
    pub(crate) pending_irq: u8,
    pub(crate) irq_requested: bool,
    pub(crate) inst_state: InstState,
    /// Micro-step inside a multi-step state (interrupt entry).
    pub(crate) inst_substate: u8,
    pub(crate) irq_level: u8,
    /// Current opcode latch.
    pub(crate) op1: u16,
    /// Last effective address.
    pub(crate) tmp: u16,
    pub(crate) exint: LineState,

    pub(crate) icount: i64,
    pub(crate) bcount: i64,
    pub(crate) total_cycles: u64,

    /// Cycle at which Timer1 last started counting from zero.
    pub(crate) timer1_epoch: u64,
    /// Cycle of the next Timer1 overflow.
    pub(crate) timer1_overflow: u64,
}

impl Mcs96 {
    pub fn new(tag: impl Into<String>, config: Mcs96Config) -> Self {
        let mut cpu = Self {
            tag: tag.into(),
            config,
            register_file: [0; 0x100],
            pc: 0,
            ppc: 0,
            psw: Psw::empty(),
            pending_irq: 0,
            irq_requested: false,
            inst_state: InstState::Fetch,
            inst_substate: 0,
            irq_level: 0,
            op1: 0,
            tmp: 0,
            exint: LineState::Clear,
            icount: 0,
            bcount: 0,
            total_cycles: 0,
            timer1_epoch: 0,
            timer1_overflow: 0,
        };
        cpu.reset();
        cpu
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn config(&self) -> &Mcs96Config {
        &self.config
    }

    pub fn reset(&mut self) {
        self.pc = RESET_PC;
        self.ppc = self.pc;
        self.psw = Psw::empty();
        self.pending_irq = 0;
        self.irq_requested = false;
        self.inst_state = InstState::Fetch;
        self.inst_substate = 0;
        self.timer1_epoch = self.total_cycles;
        self.timer1_overflow = self.timer1_epoch + self.timer1_period();
        if self.exint.is_asserted() {
            self.pending_irq |= 0x80;
        }
        log::debug!("{}: reset, PC={:04x}", self.tag, self.pc);
    }

    #[inline]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
        self.ppc = pc;
    }

    #[inline]
    pub fn ppc(&self) -> u16 {
        self.ppc
    }

    #[inline]
    pub fn psw(&self) -> Psw {
        self.psw
    }

    pub fn set_psw(&mut self, psw: Psw) {
        self.psw = psw;
        self.check_irq();
    }

    #[inline]
    pub fn pending_irq(&self) -> u8 {
        self.pending_irq
    }

    #[inline]
    pub fn irq_requested(&self) -> bool {
        self.irq_requested
    }

    #[inline]
    pub fn inst_state(&self) -> InstState {
        self.inst_state
    }

    #[inline]
    pub fn inst_substate(&self) -> u8 {
        self.inst_substate
    }

    #[inline]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Raw register RAM, bypassing the special function registers.
    pub fn register_file(&self) -> &[u8; 0x100] {
        &self.register_file
    }

    pub fn register_file_mut(&mut self) -> &mut [u8; 0x100] {
        &mut self.register_file
    }

    pub fn sp(&self) -> u16 {
        u16::from_le_bytes([self.register_file[0x18], self.register_file[0x19]])
    }

    /// PSW rendered as `ZNVvCIS 76543210`, `.` for clear bits.
    pub fn flags_string(&self) -> String {
        const NAMES: [(Psw, char); 7] = [
            (Psw::Z, 'Z'),
            (Psw::N, 'N'),
            (Psw::V, 'V'),
            (Psw::VT, 'v'),
            (Psw::C, 'C'),
            (Psw::I, 'I'),
            (Psw::ST, 'S'),
        ];
        let mut out: String = NAMES
            .iter()
            .map(|&(flag, c)| if self.psw.contains(flag) { c } else { '.' })
            .collect();
        out.push(' ');
        let mask = self.int_mask_r();
        for bit in (0..8).rev() {
            out.push(if mask & (1 << bit) != 0 {
                char::from(b'0' + bit)
            } else {
                '.'
            });
        }
        out
    }

    /// Charge `states` state times to the current instruction.
    pub(crate) fn consume(&mut self, states: u32) {
        let cycles = u64::from(states) * u64::from(self.config.cycles_scaling);
        self.icount -= cycles as i64;
        self.total_cycles += cycles;
    }
}

impl Device for Mcs96 {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn shortname(&self) -> &'static str {
        "mcs96"
    }

    fn reset(&mut self) {
        Mcs96::reset(self);
    }

    fn as_executable(&self) -> Option<&dyn Executable> {
        Some(self)
    }
}

impl Executable for Mcs96 {
    fn clock(&self) -> u32 {
        self.config.clock
    }

    fn min_cycles(&self) -> u32 {
        4
    }

    fn max_cycles(&self) -> u32 {
        33
    }

    fn input_lines(&self) -> u8 {
        1
    }

    fn set_input(&mut self, line: u8, state: LineState) {
        self.execute_set_input(line, state);
    }

    fn total_cycles(&self) -> u64 {
        self.total_cycles
    }
}
