//! Headless runner: loads a ROM, runs it for a fixed number of cycles at a paced
//! instruction rate, and prints the final framebuffer as text.
use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use chipotle8::{Config, Emulator};
use clap::{Parser, ValueEnum};
use slog::{info, o};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

#[derive(Parser, Debug)]
#[command(version, about = "Run a CHIP-8 ROM without a display")]
struct Args {
    /// Path to the ROM file
    rom: PathBuf,

    /// Number of instructions to execute
    #[arg(long, default_value_t = 1000)]
    cycles: u64,

    /// Instructions per second
    #[arg(long, default_value_t = 500)]
    hz: u32,

    /// JSON file with quirk and policy settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip unknown opcodes instead of halting
    #[arg(long)]
    permissive: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Severity {
        match level {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Debug => Severity::Debug,
            LogLevel::Info => Severity::Info,
            LogLevel::Warning => Severity::Warning,
            LogLevel::Error => Severity::Error,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut builder = TerminalLoggerBuilder::new();
    builder.level(args.log_level.into());
    builder.destination(Destination::Stderr);
    let logger = builder.build().map_err(|e| e.to_string())?;

    let mut config = match &args.config {
        Some(path) => Config::from_json(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if args.permissive {
        config = config.permissive();
    }

    let rom = std::fs::read(&args.rom)?;
    let rom_logger = logger.new(o!("rom" => args.rom.display().to_string()));
    let mut emulator = Emulator::with_config(config, Some(rom_logger));
    emulator.load_rom(&rom)?;

    let interval = Duration::from_secs(1) / args.hz.max(1);
    let mut next = Instant::now();

    for _ in 0..args.cycles {
        emulator.cycle()?;
        emulator.update_timers();

        next += interval;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        }
    }

    info!(logger, "finished";
        "stats" => ?emulator.stats(), "pc" => format!("{:#06X}", emulator.pc()));
    print!("{}", emulator.graphics().to_ascii());

    Ok(())
}
