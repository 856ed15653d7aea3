use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;

use crate::interpreter::config::TIMER_HZ;
use crate::interpreter::error::Chip8Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TimerPair {
    delay: u8,
    sound: u8,
}

/// Delay and sound timers shared between the CPU thread and the 60 Hz
/// timer thread. Both bytes sit behind one lock, held only for a single
/// read-modify-write.
#[derive(Debug, Default)]
pub struct Timers {
    pair: Mutex<TimerPair>,
    sound_active: AtomicBool,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TimerPair> {
        self.pair.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn delay(&self) -> u8 {
        self.lock().delay
    }

    pub fn sound(&self) -> u8 {
        self.lock().sound
    }

    pub fn set_delay(&self, value: u8) {
        self.lock().delay = value;
    }

    pub fn set_sound(&self, value: u8) {
        let mut pair = self.lock();
        pair.sound = value;
        self.sound_active.store(value > 0, Ordering::Release);
    }

    /// One 60 Hz period. Returns whether the tone should play for it.
    pub fn tick(&self) -> bool {
        let mut pair = self.lock();
        pair.delay = pair.delay.saturating_sub(1);

        let active = pair.sound > 0;
        if active {
            pair.sound -= 1;
        }
        self.sound_active.store(active, Ordering::Release);
        active
    }

    pub fn is_sound_active(&self) -> bool {
        self.sound_active.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        *self.lock() = TimerPair::default();
        self.sound_active.store(false, Ordering::Release);
    }
}

pub fn timer_interval() -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(TIMER_HZ))
}

/// Deadline after `deadline`. A loop that has fallen more than one
/// `interval` behind restarts from `now` instead of firing a burst.
pub fn next_deadline(deadline: Instant, interval: Duration, now: Instant) -> Instant {
    let next = deadline + interval;
    if next < now {
        now + interval
    } else {
        next
    }
}

/// Decrements `timers` at 60 Hz until `shutdown` is raised.
pub fn spawn_timer_loop(
    timers: Arc<Timers>,
    shutdown: Arc<AtomicBool>,
) -> Result<JoinHandle<()>, Chip8Error> {
    let handle = thread::Builder::new()
        .name("chip8-timers".to_owned())
        .spawn(move || {
            let interval = timer_interval();
            let mut next_tick = Instant::now() + interval;
            let mut was_active = false;

            while !shutdown.load(Ordering::Acquire) {
                let now = Instant::now();
                if now < next_tick {
                    spin_sleep::sleep(next_tick - now);
                }
                next_tick = next_deadline(next_tick, interval, Instant::now());

                let active = timers.tick();
                if active != was_active {
                    debug!("tone {}", if active { "on" } else { "off" });
                    was_active = active;
                }
            }
            timers.sound_active.store(false, Ordering::Release);
        })?;
    Ok(handle)
}
