//! A scanline-granularity model of a handheld console's display, DMA, timer
//! and interrupt hardware.
//!
//! Software talks to the model the way it would talk to the hardware: through
//! memory-mapped registers on a [`Console`]. Emulated time only passes inside
//! [`Console::advance`] and the halt primitives built on it.

pub mod clock;
pub mod config;
pub mod console;
pub mod dma;
pub mod error;
pub mod interrupts;
pub mod registers;
pub mod scheduler;
pub mod timers;
pub mod video;

pub use config::{Config, TimerTickSource};
pub use console::Console;
pub use error::Error;
pub use interrupts::{Interrupt, InterruptFlags};
