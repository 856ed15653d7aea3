use std::path::PathBuf;

use clap::Parser;
use log::info;

use chip8_interpreter::{
    load_entry_mode, load_entry_mode_from_env, run_emulator_app, run_emulator_headless,
    Chip8Error, InterpreterConfig,
};

#[derive(Debug, Parser)]
#[command(name = "chip8-interpreter")]
#[command(about = "Run a CHIP-8 program")]
struct Args {
    #[arg(long)]
    rom: PathBuf,

    /// CPU clock in Hz.
    #[arg(long, default_value_t = 500)]
    speed: u32,

    /// Load address profile; falls back to CHIP8_ENTRY_MODE, then standard.
    #[arg(long, value_parser = ["standard", "eti660"])]
    entry_mode: Option<String>,

    #[arg(long, default_value_t = 10)]
    scale: usize,

    #[arg(long, default_value_t = 60)]
    fps: usize,

    #[arg(long, default_value_t = 2000)]
    max_cycles: usize,

    #[arg(long)]
    headless: bool,
}

fn main() -> Result<(), Chip8Error> {
    env_logger::init();

    let args = Args::parse();
    let entry_mode = match args.entry_mode.as_deref() {
        Some(profile) => load_entry_mode(profile),
        None => load_entry_mode_from_env().map(|(_, mode)| mode),
    }
    .map_err(|_| Chip8Error::InvalidArgument("entry mode must be standard or eti660"))?;

    let config = InterpreterConfig::new(args.speed, entry_mode);
    info!("starting with {config:?}");

    if args.headless {
        let cpu = run_emulator_headless(config, &args.rom, args.max_cycles)?;
        println!(
            "headless finished: halted={} pc=0x{:03x}",
            cpu.should_halt(),
            cpu.pc()
        );
        return Ok(());
    }

    let _cpu = run_emulator_app(config, &args.rom, args.scale, args.fps)?;
    Ok(())
}
