use std::env;
use std::time::Duration;

use crate::interpreter::error::Chip8Error;

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: usize = 0x200;
pub const ETI660_PROGRAM_START: usize = 0x600;
pub const RESERVED_END: usize = PROGRAM_START;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

pub const REGISTER_COUNT: usize = 16;
pub const FLAG_REGISTER: usize = 0xF;
pub const KEY_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;

pub const INSTRUCTION_WIDTH: u16 = 2;
pub const FONT_GLYPH_HEIGHT: u16 = 5;

pub const TIMER_HZ: u32 = 60;
pub const DEFAULT_CLOCK_HZ: u32 = 500;

pub const FONT_BYTES: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Where a loaded program is placed and where execution begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    #[default]
    Standard,
    Eti660,
}

impl EntryMode {
    pub fn entry_point(self) -> usize {
        match self {
            Self::Standard => PROGRAM_START,
            Self::Eti660 => ETI660_PROGRAM_START,
        }
    }

    /// Largest ROM that fits between the entry point and the top of memory.
    pub fn max_rom_size(self) -> usize {
        MEMORY_SIZE - self.entry_point()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    pub clock_hz: u32,
    pub entry_mode: EntryMode,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            entry_mode: EntryMode::Standard,
        }
    }
}

impl InterpreterConfig {
    pub fn new(clock_hz: u32, entry_mode: EntryMode) -> Self {
        Self {
            clock_hz,
            entry_mode,
        }
    }

    pub fn validate(&self) -> Result<(), Chip8Error> {
        if self.clock_hz == 0 {
            return Err(Chip8Error::InvalidArgument("clock_hz must be > 0"));
        }
        Ok(())
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.clock_hz.max(1)))
    }

    /// Number of CPU cycles that make up one 60 Hz timer period.
    pub fn cycles_per_timer_tick(&self) -> usize {
        usize::max(1, (self.clock_hz / TIMER_HZ) as usize)
    }
}

pub fn load_entry_mode(profile: &str) -> Result<EntryMode, String> {
    match profile.trim().to_ascii_lowercase().as_str() {
        "standard" => Ok(EntryMode::Standard),
        "eti660" | "eti-660" => Ok(EntryMode::Eti660),
        other => Err(format!(
            "invalid CHIP8_ENTRY_MODE '{other}', expected one of: standard, eti660"
        )),
    }
}

pub fn load_entry_mode_from_env() -> Result<(String, EntryMode), String> {
    let profile = env::var("CHIP8_ENTRY_MODE").unwrap_or_else(|_| "standard".to_owned());
    let normalized = profile.trim().to_ascii_lowercase();
    let mode = load_entry_mode(&normalized)?;
    Ok((normalized, mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_mode_profiles_parse() {
        assert_eq!(load_entry_mode(" Standard "), Ok(EntryMode::Standard));
        assert_eq!(load_entry_mode("ETI660"), Ok(EntryMode::Eti660));
        assert!(load_entry_mode("schip").is_err());
    }

    #[test]
    fn entry_points_and_capacity() {
        assert_eq!(EntryMode::Standard.entry_point(), 0x200);
        assert_eq!(EntryMode::Eti660.entry_point(), 0x600);
        assert_eq!(EntryMode::Standard.max_rom_size(), 3584);
        assert_eq!(EntryMode::Eti660.max_rom_size(), 2560);
    }

    #[test]
    fn zero_clock_is_rejected() {
        let config = InterpreterConfig::new(0, EntryMode::Standard);
        assert!(matches!(
            config.validate(),
            Err(Chip8Error::InvalidArgument(_))
        ));
        assert!(InterpreterConfig::default().validate().is_ok());
    }

    #[test]
    fn timer_ticks_scale_with_clock() {
        assert_eq!(InterpreterConfig::default().cycles_per_timer_tick(), 8);
        assert_eq!(
            InterpreterConfig::new(30, EntryMode::Standard).cycles_per_timer_tick(),
            1
        );
    }
}
