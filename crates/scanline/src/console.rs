use crate::clock::FrameClock;
use crate::config::Config;
use crate::dma::{DmaChannel, DmaControl, DmaController};
use crate::error::Error;
use crate::interrupts::{Interrupt, InterruptController, InterruptFlags};
use crate::registers::io::{self, Register};
use crate::registers::{IO_SIZE, Region, RegisterFile};
use crate::timers::{Prescaler, TimerChannel, TimerControl, Timers};
use crate::video::Video;
use crate::video::control::DisplayStatus;
use crate::video::screen::Frame;

/// The display, DMA, timer and interrupt hardware behind one register file.
///
/// Bus accesses through [`Console::write16`] and friends run the same hooks
/// the hardware would. [`Console::registers_mut`] bypasses them.
pub struct Console {
    pub(crate) config: Config,
    pub(crate) clock: FrameClock,
    pub(crate) frames: u64,
    pub(crate) registers: RegisterFile,
    pub(crate) interrupts: InterruptController,
    pub(crate) dma: DmaController,
    pub(crate) timers: Timers,
    pub(crate) video: Video,
}

impl Console {
    pub fn new(config: Config) -> Self {
        let mut registers = RegisterFile::new();
        // Identity transforms for the affine and bitmap layers.
        for bg in [2, 3] {
            registers.set_io16(io::bg_affine(bg), 0x100);
            registers.set_io16(io::bg_affine(bg) + 6, 0x100);
        }

        Self {
            config,
            clock: FrameClock::new(),
            frames: 0,
            registers,
            interrupts: InterruptController::new(),
            dma: DmaController::new(),
            timers: Timers::new(),
            video: Video::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Raw access to memory and registers. Writes made here skip every hook.
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    pub fn load_rom(&mut self, rom: Vec<u8>) {
        self.registers.load_rom(rom);
    }

    /// The line the next `advance` will process.
    pub fn line(&self) -> u16 {
        self.clock.line()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The most recently completed frame.
    pub fn front_buffer(&self) -> &Frame {
        self.video.front()
    }

    pub fn dma_channel(&self, channel: usize) -> Result<&DmaChannel, Error> {
        Ok(self.dma.channel(channel)?)
    }

    pub fn timer(&self, channel: usize) -> Result<&TimerChannel, Error> {
        Ok(self.timers.channel(channel)?)
    }

    pub(crate) fn raise_all(&mut self, flags: InterruptFlags) -> Result<(), Error> {
        for interrupt in flags.interrupts() {
            self.raise(interrupt)?;
        }
        Ok(())
    }

    pub fn configure_dma(
        &mut self,
        channel: usize,
        source: u32,
        destination: u32,
        count: u32,
        control: DmaControl,
    ) -> Result<(), Error> {
        let flags = self
            .dma
            .configure(&mut self.registers, channel, source, destination, count, control)?;
        self.raise_all(flags)
    }

    pub fn stop_dma(&mut self, channel: usize) -> Result<(), Error> {
        Ok(self.dma.stop(&mut self.registers, channel)?)
    }

    /// A sound FIFO request for a channel armed with the special trigger.
    pub fn fire_dma_special(&mut self, channel: usize) -> Result<(), Error> {
        let flags = self.dma.fire_special(&mut self.registers, channel)?;
        self.raise_all(flags)
    }

    pub fn start_timer(
        &mut self,
        channel: usize,
        reload: u16,
        prescaler: Prescaler,
        cascade: bool,
        irq: bool,
    ) -> Result<(), Error> {
        self.timers.start(channel, reload, prescaler, cascade, irq)?;
        self.registers.set_io16(io::timer_reload(channel), reload);
        self.registers.set_io16(
            io::timer_control(channel),
            TimerControl::new(prescaler, cascade, irq, true).bits(),
        );
        Ok(())
    }

    pub fn stop_timer(&mut self, channel: usize) -> Result<(), Error> {
        self.timers.stop(channel)?;
        let offset = io::timer_control(channel);
        let control = TimerControl::from_bits_retain(self.registers.io16(offset));
        self.registers.set_io16(offset, (control - TimerControl::ENABLE).bits());
        Ok(())
    }

    pub fn read8(&self, address: u32) -> u8 {
        let shift = 8 * (address & 1);
        (self.read16(address) >> shift) as u8
    }

    /// Bus read. TMxCNT_L reads return the live counter instead of the reload value.
    pub fn read16(&self, address: u32) -> u16 {
        let address = address & !1;
        if let Some(Region::Io(offset)) = Region::of(address) {
            if let Register::TimerReload { channel } = Register::at(offset) {
                if let Ok(timer) = self.timers.channel(channel) {
                    return timer.counter;
                }
            }
        }
        self.registers.read16(address)
    }

    pub fn read32(&self, address: u32) -> u32 {
        let address = address & !3;
        u32::from(self.read16(address)) | (u32::from(self.read16(address + 2)) << 16)
    }

    pub fn write8(&mut self, address: u32, value: u8) -> Result<(), Error> {
        match Region::of(address) {
            Some(Region::Io(offset)) => {
                let aligned = offset & !1;
                let shift = 8 * (offset & 1);
                let value = u16::from(value) << shift;
                // IF is write-one-to-clear, so the other byte must stay zero.
                let merged = if aligned == io::IF {
                    value
                } else {
                    (self.registers.io16(aligned) & !(0xFF << shift)) | value
                };
                self.write_io16(aligned, merged)
            }
            _ => {
                self.registers.write8(address, value);
                Ok(())
            }
        }
    }

    pub fn write16(&mut self, address: u32, value: u16) -> Result<(), Error> {
        let address = address & !1;
        match Region::of(address) {
            Some(Region::Io(offset)) => self.write_io16(offset, value),
            _ => {
                self.registers.write16(address, value);
                Ok(())
            }
        }
    }

    pub fn write32(&mut self, address: u32, value: u32) -> Result<(), Error> {
        let address = address & !3;
        self.write16(address, value as u16)?;
        self.write16(address + 2, (value >> 16) as u16)
    }

    /// Stores an IO halfword and runs its hook.
    fn write_io16(&mut self, offset: usize, value: u16) -> Result<(), Error> {
        if offset + 1 >= IO_SIZE {
            return Ok(());
        }

        match Register::at(offset) {
            Register::DisplayStatus => {
                let current = self.registers.io16(offset);
                let read_only = DisplayStatus::READ_ONLY.bits();
                self.registers
                    .set_io16(offset, (current & read_only) | (value & !read_only));
                self.dispatch_pending()
            }
            Register::VerticalCount => {
                log::debug!("Ignored write {value:04X} to VCOUNT");
                Ok(())
            }
            Register::AffineReference { bg } => {
                self.registers.set_io16(offset, value);
                self.video.latch_reference(&self.registers, bg);
                Ok(())
            }
            Register::DmaControl { channel } => self.write_dma_control(channel, value),
            Register::TimerReload { channel } => {
                self.registers.set_io16(offset, value);
                Ok(self.timers.set_reload(channel, value)?)
            }
            Register::TimerControl { channel } => {
                let control = TimerControl::from_bits_retain(value);
                self.timers.write_control(channel, control)?;
                self.registers.set_io16(offset, value);
                Ok(())
            }
            Register::InterruptEnable => {
                self.registers.set_io16(offset, value & 0x3FFF);
                self.dispatch_pending()
            }
            Register::InterruptRequest => {
                self.acknowledge_flags(InterruptFlags::from_bits_truncate(value));
                Ok(())
            }
            Register::InterruptMasterEnable => {
                self.note_master_written();
                self.registers.set_io16(offset, value & 1);
                self.dispatch_pending()
            }
            Register::Plain => {
                self.registers.set_io16(offset, value);
                Ok(())
            }
        }
    }

    fn write_dma_control(&mut self, channel: usize, value: u16) -> Result<(), Error> {
        let offset = io::dma_control(channel);
        let control = DmaControl::from_bits_retain(value);
        let was_enabled = self.dma.channel(channel)?.enabled;

        match (was_enabled, control.enabled()) {
            (false, true) => {
                let source = self.registers.io32(io::dma_source(channel));
                let destination = self.registers.io32(io::dma_destination(channel));
                let count_mask = if channel == 3 { 0xFFFF } else { 0x3FFF };
                let count = u32::from(self.registers.io16(io::dma_count(channel)) & count_mask);
                let result = self.configure_dma(channel, source, destination, count, control);
                if result.is_err() {
                    self.registers
                        .set_io16(offset, (control - DmaControl::ENABLE).bits());
                }
                result
            }
            (true, false) => {
                self.stop_dma(channel)?;
                self.registers.set_io16(offset, value);
                Ok(())
            }
            (true, true) => {
                let flags = self.dma.update_control(&mut self.registers, channel, control)?;
                self.raise_all(flags)
            }
            (false, false) => {
                self.registers.set_io16(offset, value);
                Ok(())
            }
        }
    }

    pub(crate) fn raise_timer_overflows(&mut self, overflows: [u32; 4]) -> Result<(), Error> {
        for (channel, count) in overflows.into_iter().enumerate() {
            if count == 0 || !self.timers.channel(channel)?.irq {
                continue;
            }
            if count > 1 {
                log::debug!("Timer {channel} overflowed {count} times in one line");
            }
            for _ in 0..count {
                self.raise(Interrupt::timer(channel))?;
            }
        }
        Ok(())
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
