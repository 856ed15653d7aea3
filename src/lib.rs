pub mod interpreter;

pub use interpreter::app::{
    read_rom, run_cycles, run_emulator_app, run_emulator_headless, Emulator,
};
pub use interpreter::config::{
    load_entry_mode, load_entry_mode_from_env, EntryMode, InterpreterConfig,
};
pub use interpreter::cpu::{Cpu, KeyWait, SharedIo};
pub use interpreter::display::{Display, FrameBuffer};
pub use interpreter::error::Chip8Error;
pub use interpreter::instruction::{disassemble, AluOp, DisassembledLine, Instruction, LineKind};
pub use interpreter::keyboard::Keypad;
pub use interpreter::memory::Memory;
pub use interpreter::registers::Registers;
pub use interpreter::stack::CallStack;
pub use interpreter::timers::{spawn_timer_loop, Timers};
