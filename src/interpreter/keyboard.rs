use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

use crate::interpreter::config::KEY_COUNT;
use crate::interpreter::error::Chip8Error;

/// Hex keypad state. The input collaborator overwrites the whole mask on
/// every poll; the CPU only ever reads it.
#[derive(Debug, Default)]
pub struct Keypad {
    mask: AtomicU16,
    cancelled: AtomicBool,
    gate: Mutex<()>,
    changed: Condvar,
}

pub fn lowest_pressed_key(mask: u16) -> Option<u8> {
    if mask == 0 {
        None
    } else {
        Some(mask.trailing_zeros() as u8)
    }
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mask(&self) -> u16 {
        self.mask.load(Ordering::Acquire)
    }

    pub fn set_mask(&self, mask: u16) {
        self.mask.store(mask, Ordering::Release);
        self.notify();
    }

    pub fn set_key(&self, key: usize, is_pressed: bool) {
        if key >= KEY_COUNT {
            return;
        }

        let bit = 1u16 << key;
        if is_pressed {
            self.mask.fetch_or(bit, Ordering::AcqRel);
        } else {
            self.mask.fetch_and(!bit, Ordering::AcqRel);
        }
        self.notify();
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        if usize::from(key) >= KEY_COUNT {
            return false;
        }
        self.mask() & (1 << key) != 0
    }

    /// Lowest held key, without waiting.
    pub fn try_keypress(&self) -> Option<u8> {
        lowest_pressed_key(self.mask())
    }

    /// Blocks until any key is held and returns the lowest held key.
    /// Returns `Cancelled` once `cancel` has been called.
    pub fn wait_for_keypress(&self) -> Result<u8, Chip8Error> {
        let mut guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return Err(Chip8Error::Cancelled);
            }
            if let Some(key) = lowest_pressed_key(self.mask()) {
                return Ok(key);
            }
            guard = self
                .changed
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Releases every current and future `wait_for_keypress` caller.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.notify();
    }

    /// Lets `wait_for_keypress` block again after a `cancel`. The mask is
    /// left to the input collaborator.
    pub fn rearm(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    // Taking the gate orders the store before any waiter's re-check.
    fn notify(&self) {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn is_pressed_tests_mask_bits() {
        let keypad = Keypad::new();
        keypad.set_mask(0b1000_0000_0000_0010);
        assert!(keypad.is_pressed(0x1));
        assert!(keypad.is_pressed(0xF));
        assert!(!keypad.is_pressed(0x0));
        assert!(!keypad.is_pressed(0x10));
    }

    #[test]
    fn set_key_toggles_single_bits() {
        let keypad = Keypad::new();
        keypad.set_key(0xA, true);
        keypad.set_key(0x3, true);
        keypad.set_key(0xA, false);
        keypad.set_key(99, true);
        assert_eq!(keypad.mask(), 1 << 3);
    }

    #[test]
    fn wait_returns_lowest_held_key() {
        let keypad = Keypad::new();
        keypad.set_mask(0b0011_0000);
        assert_eq!(keypad.wait_for_keypress().unwrap(), 4);
    }

    #[test]
    fn wait_wakes_on_input_update() {
        let keypad = Arc::new(Keypad::new());
        let writer = Arc::clone(&keypad);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.set_mask(1 << 0xB);
        });

        assert_eq!(keypad.wait_for_keypress().unwrap(), 0xB);
        handle.join().unwrap();
    }

    #[test]
    fn cancel_releases_waiter() {
        let keypad = Arc::new(Keypad::new());
        let canceller = Arc::clone(&keypad);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        assert!(matches!(
            keypad.wait_for_keypress(),
            Err(Chip8Error::Cancelled)
        ));
        handle.join().unwrap();
    }

    #[test]
    fn try_keypress_does_not_block() {
        let keypad = Keypad::new();
        assert_eq!(keypad.try_keypress(), None);
        keypad.set_mask(0b1010_0000);
        assert_eq!(keypad.try_keypress(), Some(5));
    }

    #[test]
    fn rearm_restores_blocking_wait_and_keeps_mask() {
        let keypad = Arc::new(Keypad::new());
        keypad.set_mask(1 << 0x2);
        keypad.cancel();
        assert!(matches!(
            keypad.wait_for_keypress(),
            Err(Chip8Error::Cancelled)
        ));

        keypad.rearm();

        assert_eq!(keypad.mask(), 1 << 0x2);
        assert_eq!(keypad.wait_for_keypress().unwrap(), 0x2);
    }
}
