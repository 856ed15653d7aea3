use log::info;

use crate::interpreter::config::{EntryMode, FONT_BYTES, MEMORY_SIZE, RESERVED_END};
use crate::interpreter::error::Chip8Error;

/// Flat 4 KiB address space. Everything below `0x200` holds the built-in
/// digit glyphs and is read-only to programs.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

fn is_reserved(address: usize) -> bool {
    address < RESERVED_END
}

impl Memory {
    pub fn new() -> Self {
        let mut memory = Self {
            bytes: [0; MEMORY_SIZE],
        };
        memory.bytes[..FONT_BYTES.len()].copy_from_slice(&FONT_BYTES);
        memory
    }

    pub fn read(&self, address: usize) -> Result<u8, Chip8Error> {
        self.bytes
            .get(address)
            .copied()
            .ok_or(Chip8Error::AddressOutOfBounds(address))
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<(), Chip8Error> {
        if is_reserved(address) {
            return Err(Chip8Error::ReservedMemoryWrite(address));
        }
        let cell = self
            .bytes
            .get_mut(address)
            .ok_or(Chip8Error::AddressOutOfBounds(address))?;
        *cell = value;
        Ok(())
    }

    /// Bytes in `start..end`; the range may straddle the reserved boundary.
    pub fn block_read(&self, start: usize, end: usize) -> Result<&[u8], Chip8Error> {
        if end > MEMORY_SIZE {
            return Err(Chip8Error::AddressOutOfBounds(end - 1));
        }
        if start > end {
            return Err(Chip8Error::InvalidArgument("block range start past end"));
        }
        Ok(&self.bytes[start..end])
    }

    /// Writes `data` to `start..end`. Nothing is written if any byte of the
    /// range is reserved.
    pub fn block_write(&mut self, start: usize, end: usize, data: &[u8]) -> Result<(), Chip8Error> {
        if start > end || data.len() != end - start {
            return Err(Chip8Error::InvalidArgument(
                "block write data does not match range",
            ));
        }
        if start == end {
            return Ok(());
        }
        if is_reserved(start) {
            return Err(Chip8Error::ReservedMemoryWrite(start));
        }
        if end > MEMORY_SIZE {
            return Err(Chip8Error::AddressOutOfBounds(end - 1));
        }
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Clears program space and copies `rom` to the mode's entry point.
    pub fn load_program(&mut self, rom: &[u8], mode: EntryMode) -> Result<(), Chip8Error> {
        let max = mode.max_rom_size();
        if rom.len() > max {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max,
            });
        }

        self.clear_program_space();
        let start = mode.entry_point();
        let end = start + rom.len();
        self.block_write(start, end, rom)?;
        info!("loaded rom into mem starting at {:x} - to {:x}", start, end);
        Ok(())
    }

    pub fn clear_program_space(&mut self) {
        self.bytes[RESERVED_END..].fill(0);
    }
}
