use bitflags::bitflags;

bitflags! {
    /// Register traffic channels that may be logged.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LogChannels: u8 {
        const I2C = 1 << 0;
        const UART = 1 << 1;
        const TIMERS = 1 << 2;
        /// Per-expiry timer traffic.
        const TIMERS_HF = 1 << 3;
        const DMA = 1 << 4;
        const MMU = 1 << 5;
        const IRQS = 1 << 6;
        const UNKNOWN = 1 << 7;
    }
}

impl Default for LogChannels {
    fn default() -> Self {
        LogChannels::UART
    }
}

/// `log::debug!` gated on a channel of the controller's verbosity mask.
macro_rules! scc_log {
    ($scc:expr, $channel:expr, $($arg:tt)+) => {
        if $scc.verbose().contains($channel) {
            ::log::debug!("{}: {}", $scc.tag(), format_args!($($arg)+));
        }
    };
}

pub(crate) use scc_log;
