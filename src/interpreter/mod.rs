pub mod app;
pub mod config;
pub mod cpu;
pub mod display;
pub mod error;
pub mod instruction;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod stack;
pub mod timers;
