use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use cyclecore_board::{Board, BoardConfig};
use cyclecore_common::{device_types, Attotime, Machine};

pub const USAGE: &str =
    "usage: cyclecore <rom> [--msec N] [--save PATH] [--load PATH] [--list-devices]";

const DEFAULT_MSEC: u64 = 1000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub rom: Option<PathBuf>,
    /// Simulated milliseconds to run.
    pub msec: u64,
    pub save: Option<PathBuf>,
    pub load: Option<PathBuf>,
    pub list_devices: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rom: None,
            msec: DEFAULT_MSEC,
            save: None,
            load: None,
            list_devices: false,
        }
    }
}

impl Options {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} needs a value"))
            };
            match arg.as_str() {
                "--msec" => {
                    let raw = value("--msec")?;
                    options.msec = raw
                        .parse()
                        .with_context(|| format!("invalid --msec value '{raw}'"))?;
                }
                "--save" => options.save = Some(value("--save")?.into()),
                "--load" => options.load = Some(value("--load")?.into()),
                "--list-devices" => options.list_devices = true,
                flag if flag.starts_with("--") => bail!("unknown option '{flag}'"),
                _ if options.rom.is_none() => options.rom = Some(PathBuf::from(&arg)),
                _ => bail!("unexpected argument '{arg}'"),
            }
        }
        if options.rom.is_none() && !options.list_devices {
            bail!("no ROM given");
        }
        Ok(options)
    }
}

pub fn run(options: &Options) -> Result<()> {
    cyclecore_board::register_builtin_devices();

    if options.list_devices {
        for ty in device_types() {
            println!(
                "{:<10} {:<24} {} Hz",
                ty.shortname, ty.fullname, ty.default_clock
            );
        }
    }
    let Some(rom) = &options.rom else {
        return Ok(());
    };

    let mut board = Board::from_rom_file(rom, BoardConfig::default())?;
    if let Some(path) = &options.load {
        let blob = std::fs::read(path)
            .with_context(|| format!("reading state '{}'", path.display()))?;
        board
            .load_state(&blob)
            .with_context(|| format!("restoring state '{}'", path.display()))?;
        log::info!("restored state from '{}'", path.display());
    }

    let result = board.run_for(Attotime::from_msec(options.msec));
    print!("{}", report(&board));
    result.context("emulation stopped")?;

    if let Some(path) = &options.save {
        std::fs::write(path, board.save_state())
            .with_context(|| format!("writing state '{}'", path.display()))?;
        log::info!("saved state to '{}'", path.display());
    }
    Ok(())
}

/// CPU registers, flags and any UART output, as printed after a run.
pub fn report(board: &Board) -> String {
    let cpu = board.cpu();
    let mut out = format!(
        "time {}\nPC={:04x} SP={:04x} PSW={} cycles={}\n",
        board.now(),
        cpu.pc(),
        cpu.sp(),
        cpu.flags_string(),
        cpu.total_cycles()
    );
    let serial = board.serial_output();
    if !serial.is_empty() {
        out.push_str("serial: ");
        out.push_str(&String::from_utf8_lossy(&serial));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests;
