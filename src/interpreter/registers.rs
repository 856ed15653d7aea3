use std::sync::Arc;

use crate::interpreter::config::{
    FLAG_REGISTER, FONT_GLYPH_HEIGHT, INSTRUCTION_WIDTH, PROGRAM_START, REGISTER_COUNT,
};
use crate::interpreter::timers::Timers;

/// V0-VF, I, PC and a handle on the timer pair shared with the timer thread.
#[derive(Debug, Clone)]
pub struct Registers {
    general: [u8; REGISTER_COUNT],
    index: u16,
    pc: u16,
    timers: Arc<Timers>,
}

impl Registers {
    pub fn new(timers: Arc<Timers>) -> Self {
        Self {
            general: [0; REGISTER_COUNT],
            index: 0,
            pc: PROGRAM_START as u16,
            timers,
        }
    }

    pub fn get(&self, x: usize) -> u8 {
        self.general[x]
    }

    pub fn set(&mut self, x: usize, value: u8) {
        self.general[x] = value;
    }

    pub fn flag(&self) -> u8 {
        self.general[FLAG_REGISTER]
    }

    pub fn all(&self) -> &[u8; REGISTER_COUNT] {
        &self.general
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn set_index(&mut self, value: u16) {
        self.index = value;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    pub fn increment_pc(&mut self) {
        self.pc = self.pc.wrapping_add(INSTRUCTION_WIDTH);
    }

    pub fn add_immediate(&mut self, x: usize, value: u8) {
        self.general[x] = self.general[x].wrapping_add(value);
    }

    /// `Vx = op(Vx, Vy)`.
    pub fn binary_op(&mut self, x: usize, y: usize, op: impl Fn(u8, u8) -> u8) {
        self.general[x] = op(self.general[x], self.general[y]);
    }

    /// Like `binary_op`, but first stores `flag(Vx, Vy)` in VF. The flag is
    /// computed from the operands as they were before the operation.
    pub fn binary_op_with_flag(
        &mut self,
        x: usize,
        y: usize,
        op: impl Fn(u8, u8) -> u8,
        flag: impl Fn(u8, u8) -> u8,
    ) {
        let (vx, vy) = (self.general[x], self.general[y]);
        self.general[FLAG_REGISTER] = flag(vx, vy);
        self.general[x] = op(vx, vy);
    }

    pub fn bcd(&self, x: usize) -> [u8; 3] {
        let value = self.general[x];
        [value / 100, (value % 100) / 10, value % 10]
    }

    pub fn digit_sprite_address(&self, x: usize) -> u16 {
        FONT_GLYPH_HEIGHT * u16::from(self.general[x])
    }

    /// V0..=Vx, for dumping to memory.
    pub fn dump(&self, x: usize) -> &[u8] {
        &self.general[..=x]
    }

    /// Overwrites V0.. with `values`; at most 16 registers are touched.
    pub fn restore(&mut self, values: &[u8]) {
        let count = values.len().min(REGISTER_COUNT);
        self.general[..count].copy_from_slice(&values[..count]);
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay()
    }

    pub fn set_delay_timer(&self, value: u8) {
        self.timers.set_delay(value);
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound()
    }

    pub fn set_sound_timer(&self, value: u8) {
        self.timers.set_sound(value);
    }

    pub fn timers(&self) -> &Arc<Timers> {
        &self.timers
    }

    pub fn reset(&mut self, pc: u16) {
        self.general = [0; REGISTER_COUNT];
        self.index = 0;
        self.pc = pc;
        self.timers.reset();
    }
}
