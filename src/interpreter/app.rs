use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{error, info, warn};

use crate::interpreter::config::{InterpreterConfig, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::interpreter::cpu::{Cpu, KeyWait, SharedIo};
use crate::interpreter::display::{row_pixel, Rows};
use crate::interpreter::error::Chip8Error;
use crate::interpreter::timers::{next_deadline, spawn_timer_loop};

pub fn read_rom(rom_path: &Path) -> Result<Vec<u8>, Chip8Error> {
    let rom = fs::read(rom_path)?;
    info!("read {} bytes from {}", rom.len(), rom_path.display());
    Ok(rom)
}

/// Runs up to `max_cycles` cycles back to back on the calling thread,
/// ticking the timers once every `clock_hz / 60` cycles.
pub fn run_emulator_headless(
    config: InterpreterConfig,
    rom_path: &Path,
    max_cycles: usize,
) -> Result<Cpu, Chip8Error> {
    if max_cycles == 0 {
        return Err(Chip8Error::InvalidArgument("max_cycles must be > 0"));
    }
    config.validate()?;

    let rom = read_rom(rom_path)?;
    let mut cpu = Cpu::standalone(config);
    cpu.load_program(&rom)?;
    run_cycles(&mut cpu, max_cycles)?;
    Ok(cpu)
}

/// Serial driver shared by the headless runner and tests. Nothing can
/// press a key while it runs, so `Fx0A` polls and each unanswered wait
/// spends one cycle of the budget.
pub fn run_cycles(cpu: &mut Cpu, max_cycles: usize) -> Result<usize, Chip8Error> {
    cpu.set_key_wait(KeyWait::Poll);
    let cycles_per_timer_tick = cpu.config().cycles_per_timer_tick();

    for i in 0..max_cycles {
        if cpu.should_halt() {
            info!("halted after {i} cycles at pc=0x{:03x}", cpu.pc());
            return Ok(i);
        }

        cpu.cycle()?;

        if ((i + 1) % cycles_per_timer_tick) == 0 {
            cpu.timers().tick();
        }
    }

    Ok(max_cycles)
}

/// A CPU running on its own thread next to the 60 Hz timer thread.
pub struct Emulator {
    io: SharedIo,
    shutdown: Arc<AtomicBool>,
    cpu_thread: JoinHandle<Result<Cpu, Chip8Error>>,
    timer_thread: JoinHandle<()>,
}

impl Emulator {
    pub fn spawn(config: InterpreterConfig, rom: &[u8]) -> Result<Self, Chip8Error> {
        config.validate()?;

        let mut cpu = Cpu::standalone(config);
        cpu.load_program(rom)?;
        Self::spawn_cpu(cpu)
    }

    /// Starts threads for an already prepared CPU, including one handed
    /// back by `stop`.
    pub fn spawn_cpu(mut cpu: Cpu) -> Result<Self, Chip8Error> {
        cpu.set_key_wait(KeyWait::Block);
        let io = cpu.io();
        io.keypad.rearm();
        let shutdown = Arc::new(AtomicBool::new(false));

        let timer_thread = spawn_timer_loop(Arc::clone(&io.timers), Arc::clone(&shutdown))?;

        let cpu_shutdown = Arc::clone(&shutdown);
        let cpu_thread = thread::Builder::new()
            .name("chip8-cpu".to_owned())
            .spawn(move || run_clocked(cpu, &cpu_shutdown))?;

        Ok(Self {
            io,
            shutdown,
            cpu_thread,
            timer_thread,
        })
    }

    pub fn io(&self) -> &SharedIo {
        &self.io
    }

    /// Replaces the whole keypad mask; bit `k` is key `k`.
    pub fn set_keys(&self, mask: u16) {
        self.io.keypad.set_mask(mask);
    }

    pub fn frame(&self) -> Rows {
        self.io.frame.snapshot()
    }

    pub fn sound_active(&self) -> bool {
        self.io.timers.is_sound_active()
    }

    /// True once the CPU thread has stopped on its own (halt or error).
    pub fn is_finished(&self) -> bool {
        self.cpu_thread.is_finished()
    }

    /// Requests shutdown, waits for both threads and hands back the CPU.
    pub fn stop(self) -> Result<Cpu, Chip8Error> {
        self.shutdown.store(true, Ordering::Release);
        self.io.keypad.cancel();

        let result = self
            .cpu_thread
            .join()
            .map_err(|_| Chip8Error::ThreadPanicked("chip8-cpu"))?;
        self.timer_thread
            .join()
            .map_err(|_| Chip8Error::ThreadPanicked("chip8-timers"))?;
        result
    }
}

fn run_clocked(mut cpu: Cpu, shutdown: &AtomicBool) -> Result<Cpu, Chip8Error> {
    let interval = cpu.config().cycle_interval();
    let mut next_cycle = Instant::now() + interval;

    let outcome = loop {
        if shutdown.load(Ordering::Acquire) {
            info!("shutdown requested at pc=0x{:03x}", cpu.pc());
            break Ok(());
        }
        if cpu.should_halt() {
            info!("halted at pc=0x{:03x}", cpu.pc());
            break Ok(());
        }

        match cpu.cycle() {
            Ok(()) => {}
            Err(Chip8Error::Cancelled) => {
                info!("keypad wait cancelled at pc=0x{:03x}", cpu.pc());
                break Ok(());
            }
            Err(error) if !error.is_fatal() => warn!("continuing: {error}"),
            Err(error) => {
                error!("stopping: {error}");
                break Err(error);
            }
        }

        let now = Instant::now();
        if now < next_cycle {
            spin_sleep::sleep(next_cycle - now);
        }
        next_cycle = next_deadline(next_cycle, interval, Instant::now());
    };

    shutdown.store(true, Ordering::Release);
    outcome.map(|()| cpu)
}

pub fn run_emulator_app(
    config: InterpreterConfig,
    rom_path: &Path,
    scale: usize,
    target_fps: usize,
) -> Result<Cpu, Chip8Error> {
    use raylib::prelude::{Color, KeyboardKey, RaylibDraw};

    if scale == 0 {
        return Err(Chip8Error::InvalidArgument("scale must be > 0"));
    }
    if target_fps == 0 {
        return Err(Chip8Error::InvalidArgument("target_fps must be > 0"));
    }

    let rom = read_rom(rom_path)?;
    let emulator = Emulator::spawn(config, &rom)?;

    let width = (SCREEN_WIDTH * scale) as i32;
    let height = (SCREEN_HEIGHT * scale) as i32;
    let (mut rl, thread) = raylib::init()
        .size(width, height)
        .title("chip8-interpreter")
        .build();
    rl.set_target_fps(target_fps as u32);

    let key_map = [
        (KeyboardKey::KEY_ONE, 0x1usize),
        (KeyboardKey::KEY_TWO, 0x2),
        (KeyboardKey::KEY_THREE, 0x3),
        (KeyboardKey::KEY_FOUR, 0xC),
        (KeyboardKey::KEY_Q, 0x4),
        (KeyboardKey::KEY_W, 0x5),
        (KeyboardKey::KEY_E, 0x6),
        (KeyboardKey::KEY_R, 0xD),
        (KeyboardKey::KEY_A, 0x7),
        (KeyboardKey::KEY_S, 0x8),
        (KeyboardKey::KEY_D, 0x9),
        (KeyboardKey::KEY_F, 0xE),
        (KeyboardKey::KEY_Z, 0xA),
        (KeyboardKey::KEY_X, 0x0),
        (KeyboardKey::KEY_C, 0xB),
        (KeyboardKey::KEY_V, 0xF),
    ];

    while !rl.window_should_close() && !emulator.is_finished() {
        if rl.is_key_pressed(KeyboardKey::KEY_ESCAPE) {
            break;
        }

        let mut mask = 0u16;
        for (key, mapped) in key_map {
            if rl.is_key_down(key) {
                mask |= 1 << mapped;
            }
        }
        emulator.set_keys(mask);

        let frame = emulator.frame();
        let tone = emulator.sound_active();

        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::BLACK);
        for (y, row) in frame.iter().enumerate() {
            for x in (0..SCREEN_WIDTH).filter(|x| row_pixel(*row, *x)) {
                d.draw_rectangle(
                    (x * scale) as i32,
                    (y * scale) as i32,
                    scale as i32,
                    scale as i32,
                    Color::WHITE,
                );
            }
        }
        if tone {
            d.draw_rectangle_lines(0, 0, width, height, Color::GOLD);
        }
    }

    emulator.stop()
}
