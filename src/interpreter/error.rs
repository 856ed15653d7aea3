use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Chip8Error {
    Io(std::io::Error),
    RomTooLarge { size: usize, max: usize },
    ReservedMemoryWrite(usize),
    AddressOutOfBounds(usize),
    StackOverflow,
    StackUnderflow,
    UnknownInstruction { pc: u16, opcode: u16 },
    InvalidArgument(&'static str),
    ThreadPanicked(&'static str),
    Cancelled,
}

impl Chip8Error {
    /// Whether the error must stop the cycle loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ReservedMemoryWrite(_) | Self::Cancelled)
    }
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::RomTooLarge { size, max } => {
                write!(f, "ROM too large: {size} bytes (max {max})")
            }
            Self::ReservedMemoryWrite(address) => {
                write!(f, "write to reserved memory: 0x{address:03x}")
            }
            Self::AddressOutOfBounds(address) => {
                write!(f, "address outside addressable memory: 0x{address:04x}")
            }
            Self::StackOverflow => write!(f, "call with full stack"),
            Self::StackUnderflow => write!(f, "return instruction with empty stack"),
            Self::UnknownInstruction { pc, opcode } => {
                write!(f, "unknown instruction 0x{opcode:04x} at 0x{pc:03x}")
            }
            Self::InvalidArgument(argument) => write!(f, "invalid argument: {argument}"),
            Self::ThreadPanicked(name) => write!(f, "{name} thread panicked"),
            Self::Cancelled => write!(f, "keypad wait cancelled by shutdown"),
        }
    }
}

impl std::error::Error for Chip8Error {}

impl From<std::io::Error> for Chip8Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
