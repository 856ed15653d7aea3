use crate::interpreter::config::STACK_DEPTH;
use crate::interpreter::error::Chip8Error;

/// Fixed-depth return address stack.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    addresses: [u16; STACK_DEPTH],
    pointer: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, address: u16) -> Result<(), Chip8Error> {
        let slot = self
            .addresses
            .get_mut(self.pointer)
            .ok_or(Chip8Error::StackOverflow)?;
        *slot = address;
        self.pointer += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Chip8Error> {
        if self.pointer == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        self.pointer -= 1;
        Ok(self.addresses[self.pointer])
    }

    pub fn depth(&self) -> usize {
        self.pointer
    }

    pub fn is_empty(&self) -> bool {
        self.pointer == 0
    }

    /// Live entries, oldest first.
    pub fn frames(&self) -> &[u16] {
        &self.addresses[..self.pointer]
    }

    pub fn clear(&mut self) {
        self.pointer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_round_trips() {
        let mut stack = CallStack::new();
        stack.push(0x2A4).unwrap();
        stack.push(0x3B6).unwrap();
        assert_eq!(stack.pop().unwrap(), 0x3B6);
        assert_eq!(stack.pop().unwrap(), 0x2A4);
        assert!(stack.is_empty());
    }

    #[test]
    fn seventeenth_push_overflows() {
        let mut stack = CallStack::new();
        for address in 0..STACK_DEPTH as u16 {
            stack.push(0x200 + address * 2).unwrap();
        }
        assert!(matches!(stack.push(0x400), Err(Chip8Error::StackOverflow)));
        assert_eq!(stack.depth(), STACK_DEPTH);
        assert_eq!(stack.frames()[STACK_DEPTH - 1], 0x21E);
    }

    #[test]
    fn pop_on_empty_underflows() {
        let mut stack = CallStack::new();
        assert!(matches!(stack.pop(), Err(Chip8Error::StackUnderflow)));
        assert_eq!(stack.depth(), 0);
    }
}
