use std::path::PathBuf;

use clap::Parser;

use chip8_interpreter::{disassemble, load_entry_mode, read_rom, Chip8Error};

#[derive(Debug, Parser)]
#[command(name = "chip8-disasm")]
#[command(about = "Print the instructions of a CHIP-8 ROM")]
struct Args {
    rom: PathBuf,

    #[arg(long, default_value = "standard", value_parser = ["standard", "eti660"])]
    entry_mode: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let origin = load_entry_mode(&args.entry_mode)
        .map_err(|_| Chip8Error::InvalidArgument("entry mode must be standard or eti660"))?
        .entry_point();

    let rom = read_rom(&args.rom)?;
    for line in disassemble(&rom, origin) {
        println!("{line}");
    }
    Ok(())
}
