//! The scanline loop and the two suspension primitives built on it.
//!
//! Nothing runs in the background: hardware time only passes inside
//! [`Console::advance`], which the halt calls drive. A handler invoked from
//! inside `advance` may halt again, nesting further lines on the call stack
//! before the outer line finishes.

use crate::Console;
use crate::clock::{FrameClock, LINES_PER_FRAME, VISIBLE_LINES};
use crate::config::TimerTickSource;
use crate::error::Error;
use crate::interrupts::{Interrupt, InterruptError, InterruptFlags};
use crate::registers::io;
use crate::video::control::DisplayStatus;

impl Console {
    /// Runs one scanline: draw, DMA, display interrupts, then timers.
    pub fn advance(&mut self) -> Result<(), Error> {
        // The clock moves first so a halt from inside a handler processes the
        // following lines rather than this one again.
        let line = self.clock.step();
        self.update_display_status(line);

        if FrameClock::is_visible(line) {
            self.video.render_line(&self.registers, usize::from(line));
        }

        if line == VISIBLE_LINES {
            self.video.swap();
            self.frames += 1;
            let flags = self.dma.fire_vblank_channels(&mut self.registers);
            self.raise_all(flags)?;
            self.raise(Interrupt::VBlank)?;
        }

        self.set_status(DisplayStatus::HBLANK, true);
        if FrameClock::is_visible(line) {
            let flags = self.dma.fire_hblank_channels(&mut self.registers);
            self.raise_all(flags)?;
        }

        if self.status().contains(DisplayStatus::VCOUNT_MATCH) {
            self.raise(Interrupt::VCount)?;
        }
        self.raise(Interrupt::HBlank)?;

        match self.config.timer_tick_source {
            TimerTickSource::DeterministicPerScanline => {
                let overflows = self.timers.tick(self.config.cycles_per_scanline);
                self.raise_timer_overflows(overflows)?;
            }
        }

        Ok(())
    }

    /// Advances until an interrupt in `mask` is acknowledged, either by its
    /// handler running or by being left pending while masked.
    pub fn halt_until(&mut self, mask: InterruptFlags) -> Result<(), Error> {
        if mask.is_empty() {
            return Err(InterruptError::EmptyWaitMask.into());
        }

        let mark = self.interrupts.mark();
        let limit = u64::from(self.config.halt_timeout_frames) * u64::from(LINES_PER_FRAME);

        for _ in 0..limit {
            self.advance()?;
            if self
                .interrupts
                .arrived_since(&mark, mask, self.interrupt_request())
            {
                return Ok(());
            }
        }

        Err(Error::HaltTimeout {
            mask,
            frames: self.config.halt_timeout_frames,
        })
    }

    pub fn halt_until_vblank(&mut self) -> Result<(), Error> {
        self.halt_until(InterruptFlags::VBLANK)
    }

    /// Runs whole frames, stopping at the start of VBlank of the last one.
    pub fn run_frames(&mut self, frames: u64) -> Result<(), Error> {
        let target = self.frames + frames;
        while self.frames < target {
            self.advance()?;
        }
        Ok(())
    }

    fn status(&self) -> DisplayStatus {
        DisplayStatus::from_bits_retain(self.registers.io16(io::DISPSTAT))
    }

    fn set_status(&mut self, flag: DisplayStatus, value: bool) {
        let mut status = self.status();
        status.set(flag, value);
        self.registers.set_io16(io::DISPSTAT, status.bits());
    }

    fn update_display_status(&mut self, line: u16) {
        self.registers.set_io16(io::VCOUNT, line);

        let mut status = self.status();
        status.set(
            DisplayStatus::VBLANK,
            (VISIBLE_LINES..LINES_PER_FRAME - 1).contains(&line),
        );
        status.remove(DisplayStatus::HBLANK);
        status.set(DisplayStatus::VCOUNT_MATCH, status.vcount_setting() == line);
        self.registers.set_io16(io::DISPSTAT, status.bits());
    }
}
