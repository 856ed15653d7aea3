use std::sync::Arc;

use log::{info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::interpreter::config::{InterpreterConfig, FLAG_REGISTER, INSTRUCTION_WIDTH, MEMORY_SIZE};
use crate::interpreter::display::{Display, FrameBuffer};
use crate::interpreter::error::Chip8Error;
use crate::interpreter::instruction::{AluOp, Instruction};
use crate::interpreter::keyboard::Keypad;
use crate::interpreter::memory::Memory;
use crate::interpreter::registers::Registers;
use crate::interpreter::stack::CallStack;
use crate::interpreter::timers::Timers;

/// The state the CPU shares with the timer thread and the frontend.
#[derive(Debug, Clone, Default)]
pub struct SharedIo {
    pub keypad: Arc<Keypad>,
    pub timers: Arc<Timers>,
    pub frame: Arc<FrameBuffer>,
}

impl SharedIo {
    pub fn new() -> Self {
        Self::default()
    }
}

/// How `Fx0A` waits for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyWait {
    /// Park the CPU thread until a key is held or the wait is cancelled.
    #[default]
    Block,
    /// Leave PC on the `Fx0A` while no key is held, so the next cycle
    /// executes it again.
    Poll,
}

pub struct Cpu {
    config: InterpreterConfig,
    memory: Memory,
    registers: Registers,
    stack: CallStack,
    display: Display,
    keypad: Arc<Keypad>,
    key_wait: KeyWait,
    rng: StdRng,
    last_opcode: u16,
}

impl Cpu {
    pub fn new(config: InterpreterConfig, io: SharedIo) -> Self {
        let mut registers = Registers::new(io.timers);
        registers.set_pc(config.entry_mode.entry_point() as u16);

        Self {
            config,
            memory: Memory::new(),
            registers,
            stack: CallStack::new(),
            display: Display::new(io.frame),
            keypad: io.keypad,
            key_wait: KeyWait::default(),
            rng: StdRng::from_entropy(),
            last_opcode: 0,
        }
    }

    /// A CPU with its own, unshared IO.
    pub fn standalone(config: InterpreterConfig) -> Self {
        Self::new(config, SharedIo::new())
    }

    pub fn io(&self) -> SharedIo {
        SharedIo {
            keypad: Arc::clone(&self.keypad),
            timers: Arc::clone(self.registers.timers()),
            frame: Arc::clone(self.display.frame_buffer()),
        }
    }

    pub fn config(&self) -> InterpreterConfig {
        self.config
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn keypad(&self) -> &Arc<Keypad> {
        &self.keypad
    }

    pub fn timers(&self) -> &Arc<Timers> {
        self.registers.timers()
    }

    pub fn pc(&self) -> u16 {
        self.registers.pc()
    }

    pub fn last_opcode(&self) -> u16 {
        self.last_opcode
    }

    pub fn key_wait(&self) -> KeyWait {
        self.key_wait
    }

    pub fn set_key_wait(&mut self, key_wait: KeyWait) {
        self.key_wait = key_wait;
    }

    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        let mode = self.config.entry_mode;
        self.memory.load_program(rom, mode)?;
        self.registers.set_pc(mode.entry_point() as u16);
        info!("program of {} bytes loaded, entry {:?}", rom.len(), mode);
        Ok(())
    }

    /// Power-on state: registers, stack, timers and screen cleared, program
    /// space zeroed, font kept. The key mask belongs to the input side and
    /// is left alone; only a pending cancel is cleared.
    pub fn reset(&mut self) {
        self.memory.clear_program_space();
        self.registers
            .reset(self.config.entry_mode.entry_point() as u16);
        self.stack.clear();
        self.display.clear();
        self.keypad.rearm();
        self.last_opcode = 0;
    }

    pub fn should_halt(&self) -> bool {
        usize::from(self.registers.pc()) >= MEMORY_SIZE
    }

    pub fn fetch(&self) -> Result<u16, Chip8Error> {
        let pc = usize::from(self.registers.pc());
        let high = self.memory.read(pc)?;
        let low = self.memory.read(pc + 1)?;
        Ok((u16::from(high) << 8) | u16::from(low))
    }

    /// Fetch, advance PC past the instruction, then decode and execute.
    pub fn cycle(&mut self) -> Result<(), Chip8Error> {
        let pc = self.registers.pc();
        let opcode = self.fetch()?;
        self.registers.increment_pc();
        self.last_opcode = opcode;

        let instruction =
            Instruction::decode(opcode).ok_or(Chip8Error::UnknownInstruction { pc, opcode })?;
        trace!("{pc:03x}: {opcode:04x} {instruction}");

        self.execute(instruction)
    }

    /// Decodes and executes `opcode` as if it had just been fetched from
    /// `PC - 2`.
    pub fn execute_opcode(&mut self, opcode: u16) -> Result<(), Chip8Error> {
        self.last_opcode = opcode;
        let pc = self.registers.pc().wrapping_sub(INSTRUCTION_WIDTH);
        let instruction =
            Instruction::decode(opcode).ok_or(Chip8Error::UnknownInstruction { pc, opcode })?;
        self.execute(instruction)
    }

    pub fn execute(&mut self, instruction: Instruction) -> Result<(), Chip8Error> {
        match instruction {
            Instruction::ClearScreen => self.display.clear(),
            Instruction::Return => {
                let ret = self.stack.pop()?;
                self.registers.set_pc(ret);
            }
            Instruction::Jump { nnn } => self.registers.set_pc(nnn),
            Instruction::Call { nnn } => {
                self.stack.push(self.registers.pc())?;
                self.registers.set_pc(nnn);
            }
            Instruction::SkipIfEqualImmediate { x, kk } => {
                self.skip_if(self.registers.get(x) == kk);
            }
            Instruction::SkipIfNotEqualImmediate { x, kk } => {
                self.skip_if(self.registers.get(x) != kk);
            }
            Instruction::SkipIfEqualRegister { x, y } => {
                self.skip_if(self.registers.get(x) == self.registers.get(y));
            }
            Instruction::LoadImmediate { x, kk } => self.registers.set(x, kk),
            Instruction::AddImmediate { x, kk } => self.registers.add_immediate(x, kk),
            Instruction::Alu { op, x, y } => self.execute_alu(op, x, y),
            Instruction::SkipIfNotEqualRegister { x, y } => {
                self.skip_if(self.registers.get(x) != self.registers.get(y));
            }
            Instruction::LoadIndex { nnn } => self.registers.set_index(nnn),
            Instruction::JumpOffset { nnn } => {
                let target = u16::from(self.registers.get(0)) + nnn;
                self.registers.set_pc(target);
            }
            Instruction::Random { x, kk } => {
                let value = self.rng.gen::<u8>() & kk;
                self.registers.set(x, value);
            }
            Instruction::Draw { x, y, n } => self.execute_draw(x, y, n)?,
            Instruction::SkipIfKeyPressed { x } => {
                self.skip_if(self.keypad.is_pressed(self.registers.get(x)));
            }
            Instruction::SkipIfKeyNotPressed { x } => {
                self.skip_if(!self.keypad.is_pressed(self.registers.get(x)));
            }
            Instruction::LoadDelayTimer { x } => {
                let delay = self.registers.delay_timer();
                self.registers.set(x, delay);
            }
            Instruction::WaitForKey { x } => {
                let pressed = match self.key_wait {
                    KeyWait::Block => self.keypad.wait_for_keypress().map(Some),
                    KeyWait::Poll => Ok(self.keypad.try_keypress()),
                };
                match pressed {
                    Ok(Some(key)) => self.registers.set(x, key),
                    Ok(None) => self.repeat_instruction(),
                    Err(error) => {
                        self.repeat_instruction();
                        return Err(error);
                    }
                }
            }
            Instruction::SetDelayTimer { x } => {
                self.registers.set_delay_timer(self.registers.get(x));
            }
            Instruction::SetSoundTimer { x } => {
                self.registers.set_sound_timer(self.registers.get(x));
            }
            Instruction::AddIndex { x } => {
                let index = self
                    .registers
                    .index()
                    .wrapping_add(u16::from(self.registers.get(x)));
                self.registers.set_index(index & 0x0FFF);
            }
            Instruction::LoadDigitSprite { x } => {
                let address = self.registers.digit_sprite_address(x);
                self.registers.set_index(address);
            }
            Instruction::StoreBcd { x } => {
                let digits = self.registers.bcd(x);
                let start = usize::from(self.registers.index());
                store_recovering(&mut self.memory, start, &digits)?;
            }
            Instruction::StoreRegisters { x } => {
                let start = usize::from(self.registers.index());
                store_recovering(&mut self.memory, start, self.registers.dump(x))?;
            }
            Instruction::LoadRegisters { x } => {
                let start = usize::from(self.registers.index());
                let values = self.memory.block_read(start, start + x + 1)?;
                self.registers.restore(values);
            }
        }

        Ok(())
    }

    // Puts PC back on the instruction just fetched.
    fn repeat_instruction(&mut self) {
        let pc = self.registers.pc().wrapping_sub(INSTRUCTION_WIDTH);
        self.registers.set_pc(pc);
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.registers.increment_pc();
        }
    }

    fn execute_alu(&mut self, op: AluOp, x: usize, y: usize) {
        let regs = &mut self.registers;
        match op {
            AluOp::Load => regs.binary_op(x, y, |_, vy| vy),
            AluOp::Or => regs.binary_op(x, y, |vx, vy| vx | vy),
            AluOp::And => regs.binary_op(x, y, |vx, vy| vx & vy),
            AluOp::Xor => regs.binary_op(x, y, |vx, vy| vx ^ vy),
            AluOp::Add => regs.binary_op_with_flag(
                x,
                y,
                |vx, vy| vx.wrapping_add(vy),
                |vx, vy| u8::from(vx.checked_add(vy).is_none()),
            ),
            AluOp::Sub => regs.binary_op_with_flag(
                x,
                y,
                |vx, vy| vx.wrapping_sub(vy),
                |vx, vy| u8::from(vx >= vy),
            ),
            AluOp::ShiftRight => regs.binary_op_with_flag(x, y, |vx, _| vx >> 1, |vx, _| vx & 0x1),
            AluOp::SubReverse => regs.binary_op_with_flag(
                x,
                y,
                |vx, vy| vy.wrapping_sub(vx),
                |vx, vy| u8::from(vy >= vx),
            ),
            AluOp::ShiftLeft => regs.binary_op_with_flag(x, y, |vx, _| vx << 1, |vx, _| vx >> 7),
        }
    }

    fn execute_draw(&mut self, x: usize, y: usize, n: u8) -> Result<(), Chip8Error> {
        let start = usize::from(self.registers.index());
        let height = usize::from(n);
        let sprite = self.memory.block_read(start, start + height)?;

        let collision = self.display.draw_sprite(
            self.registers.get(x),
            self.registers.get(y),
            height,
            sprite,
        );
        self.registers.set(FLAG_REGISTER, u8::from(collision));
        Ok(())
    }
}

/// Writes `data` at `start`; a write into the reserved region is dropped
/// with a warning and execution continues.
fn store_recovering(memory: &mut Memory, start: usize, data: &[u8]) -> Result<(), Chip8Error> {
    match memory.block_write(start, start + data.len(), data) {
        Err(Chip8Error::ReservedMemoryWrite(address)) => {
            warn!(
                "ignored store of {} bytes into reserved memory at 0x{address:03x}",
                data.len()
            );
            Ok(())
        }
        other => other,
    }
}
