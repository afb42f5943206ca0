use thiserror::Error;

use crate::dma::DmaError;
use crate::interrupts::{InterruptError, InterruptFlags};
use crate::timers::{PeriodError, TimerError};

/// Every fault the hardware model reports.
///
/// Configuration faults surface synchronously from the call (or register
/// write) that caused them. `HaltTimeout` is raised from inside the scanline
/// loop and aborts the emulation step.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Dma(#[from] DmaError),
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error(transparent)]
    Interrupt(#[from] InterruptError),
    #[error("no {mask:?} interrupt arrived within {frames} frames")]
    HaltTimeout { mask: InterruptFlags, frames: u32 },
}
