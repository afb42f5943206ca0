//! Four-channel DMA controller.
//!
//! Transfers read and write the register file directly. A transfer that lands
//! on an IO register stores the value without running that register's write
//! hook, so DMA into DISPSTAT or IF behaves like a plain memory copy.

use thiserror::Error;

use crate::interrupts::{Interrupt, InterruptFlags};
use crate::registers::{RegisterFile, ROM_END, ROM_START};

pub use registers::{AddressStep, DmaControl, TransferWidth, Trigger};

pub mod registers;

pub const NUM_CHANNELS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DmaError {
    #[error("there is no DMA channel {0}")]
    InvalidChannel(usize),
    #[error("DMA {channel} cannot read cartridge ROM at {address:#010X}; only channel 3 can")]
    RomSource { channel: usize, address: u32 },
    #[error("DMA {channel} address {address:#010X} is not aligned to {width:?} transfers")]
    Misaligned {
        channel: usize,
        address: u32,
        width: TransferWidth,
    },
    #[error("DMA {channel} cannot move {count} units; the limit is {max}")]
    CountTooLarge { channel: usize, count: u32, max: u32 },
    #[error("DMA {channel} cannot use {step:?} for its source address")]
    InvalidSourceStep { channel: usize, step: AddressStep },
    #[error("DMA {channel} cannot use {step:?} for its destination; only channels 1 and 2 can")]
    InvalidDestinationStep { channel: usize, step: AddressStep },
    #[error("DMA 0 has no special trigger")]
    SpecialOnChannelZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaChannel {
    pub source: u32,
    pub destination: u32,
    /// Units per trigger after the zero-means-maximum rule.
    pub count: u32,
    pub control: DmaControl,
    pub enabled: bool,
    current_source: u32,
    current_destination: u32,
}

impl DmaChannel {
    fn new() -> Self {
        Self {
            source: 0,
            destination: 0,
            count: 0,
            control: DmaControl::empty(),
            enabled: false,
            current_source: 0,
            current_destination: 0,
        }
    }

    pub fn trigger(&self) -> Trigger {
        self.control.trigger()
    }

    pub fn repeat(&self) -> bool {
        self.control.repeat()
    }
}

fn max_count(channel: usize) -> u32 {
    if channel == 3 { 0x1_0000 } else { 0x4000 }
}

fn source_mask(channel: usize) -> u32 {
    if channel == 0 { 0x07FF_FFFF } else { 0x0FFF_FFFF }
}

fn destination_mask(channel: usize) -> u32 {
    if channel == 3 { 0x0FFF_FFFF } else { 0x07FF_FFFF }
}

fn is_rom(address: u32) -> bool {
    (ROM_START..ROM_END).contains(&address)
}

/// The first cartridge ROM address one trigger of this transfer would read,
/// after the channel's source mask is applied.
fn rom_in_span(channel: usize, source: u32, count: u32, control: DmaControl) -> Option<u32> {
    let source = source & source_mask(channel);
    if is_rom(source) {
        return Some(source);
    }

    let units = if count == 0 { max_count(channel) } else { count };
    let width = control.width().bytes();
    let reach = u64::from(units - 1) * u64::from(width);
    let (low, high) = match control.source_step() {
        AddressStep::Increment | AddressStep::IncrementReload => {
            (u64::from(source), u64::from(source) + reach + u64::from(width))
        }
        AddressStep::Decrement => (
            u64::from(source).saturating_sub(reach),
            u64::from(source) + u64::from(width),
        ),
        AddressStep::Fixed => return None,
    };

    if low < u64::from(ROM_END) && high > u64::from(ROM_START) {
        Some(ROM_START.max(low as u32))
    } else {
        None
    }
}

/// Reads one transfer unit. Channels 0 to 2 read zero from cartridge ROM,
/// which repeating transfers can walk into after their first trigger.
fn read_source(
    registers: &RegisterFile,
    channel: usize,
    address: u32,
    width: TransferWidth,
) -> u32 {
    let address = address & source_mask(channel);
    if channel != 3 && is_rom(address) {
        log::debug!("DMA {channel} read of cartridge ROM at {address:08X} returns 0");
        return 0;
    }
    match width {
        TransferWidth::Half => u32::from(registers.read16(address)),
        TransferWidth::Word => registers.read32(address),
    }
}

pub struct DmaController {
    channels: [DmaChannel; NUM_CHANNELS],
}

impl DmaController {
    pub fn new() -> Self {
        Self {
            channels: [DmaChannel::new(); NUM_CHANNELS],
        }
    }

    pub fn channel(&self, channel: usize) -> Result<&DmaChannel, DmaError> {
        self.channels.get(channel).ok_or(DmaError::InvalidChannel(channel))
    }

    fn validate(
        channel: usize,
        source: u32,
        destination: u32,
        count: u32,
        control: DmaControl,
    ) -> Result<(), DmaError> {
        if channel >= NUM_CHANNELS {
            return Err(DmaError::InvalidChannel(channel));
        }

        if channel != 3 {
            if let Some(address) = rom_in_span(channel, source, count, control) {
                return Err(DmaError::RomSource { channel, address });
            }
        }

        let width = control.width();
        for address in [source, destination] {
            if address % width.bytes() != 0 {
                return Err(DmaError::Misaligned {
                    channel,
                    address,
                    width,
                });
            }
        }

        let max = max_count(channel);
        if count > max {
            return Err(DmaError::CountTooLarge {
                channel,
                count,
                max,
            });
        }

        let step = control.source_step();
        if step == AddressStep::IncrementReload {
            return Err(DmaError::InvalidSourceStep { channel, step });
        }

        let step = control.destination_step();
        if step == AddressStep::IncrementReload && !(1..=2).contains(&channel) {
            return Err(DmaError::InvalidDestinationStep { channel, step });
        }

        if channel == 0 && control.trigger() == Trigger::Special {
            return Err(DmaError::SpecialOnChannelZero);
        }

        Ok(())
    }

    /// Validates and stores a channel, mirroring it into the DMA registers.
    /// Immediate transfers run before this returns and always leave the
    /// channel disabled. Returns the interrupts the transfer requested.
    pub fn configure(
        &mut self,
        registers: &mut RegisterFile,
        channel: usize,
        source: u32,
        destination: u32,
        count: u32,
        control: DmaControl,
    ) -> Result<InterruptFlags, DmaError> {
        Self::validate(channel, source, destination, count, control)?;

        let source = source & source_mask(channel);
        let destination = destination & destination_mask(channel);
        let count = if count == 0 { max_count(channel) } else { count };
        let enabled = control.enabled();

        self.channels[channel] = DmaChannel {
            source,
            destination,
            count,
            control,
            enabled,
            current_source: source,
            current_destination: destination,
        };

        registers.set_io32(crate::registers::io::dma_source(channel), source);
        registers.set_io32(crate::registers::io::dma_destination(channel), destination);
        registers.set_io16(
            crate::registers::io::dma_count(channel),
            (count & (max_count(channel) - 1)) as u16,
        );
        registers.set_io16(crate::registers::io::dma_control(channel), control.bits());

        if enabled && control.trigger() == Trigger::Immediate {
            log::trace!("DMA {channel} immediate: {count} units {source:08X} -> {destination:08X}");
            let flags = self.run(registers, channel);
            self.disable(registers, channel);
            return Ok(flags);
        }

        Ok(InterruptFlags::empty())
    }

    /// Applies a control write to a channel that stays enabled. The addresses
    /// and remaining progress are kept; repeat, IRQ, width, steps and trigger
    /// take effect from the next trigger. Switching to the immediate trigger
    /// runs the transfer now.
    pub fn update_control(
        &mut self,
        registers: &mut RegisterFile,
        channel: usize,
        control: DmaControl,
    ) -> Result<InterruptFlags, DmaError> {
        let armed = *self.channel(channel)?;
        Self::validate(
            channel,
            armed.current_source,
            armed.current_destination,
            armed.count,
            control,
        )?;

        self.channels[channel].control = control;
        registers.set_io16(crate::registers::io::dma_control(channel), control.bits());

        if control.trigger() == Trigger::Immediate {
            let flags = self.run(registers, channel);
            self.disable(registers, channel);
            return Ok(flags);
        }
        Ok(InterruptFlags::empty())
    }

    /// Disarms a channel. Stopping an idle channel is a no-op.
    pub fn stop(&mut self, registers: &mut RegisterFile, channel: usize) -> Result<(), DmaError> {
        if channel >= NUM_CHANNELS {
            return Err(DmaError::InvalidChannel(channel));
        }
        self.disable(registers, channel);
        Ok(())
    }

    pub fn fire_hblank_channels(&mut self, registers: &mut RegisterFile) -> InterruptFlags {
        self.fire(registers, Trigger::HBlank)
    }

    pub fn fire_vblank_channels(&mut self, registers: &mut RegisterFile) -> InterruptFlags {
        self.fire(registers, Trigger::VBlank)
    }

    /// Services one sound FIFO request: four words to a fixed destination.
    /// Channels not armed for the special trigger ignore the request.
    pub fn fire_special(
        &mut self,
        registers: &mut RegisterFile,
        channel: usize,
    ) -> Result<InterruptFlags, DmaError> {
        let armed = self.channel(channel)?;
        if !armed.enabled || armed.trigger() != Trigger::Special {
            return Ok(InterruptFlags::empty());
        }

        let dma = &mut self.channels[channel];
        let mut source = dma.current_source;
        for _ in 0..4 {
            let value = read_source(registers, channel, source & !3, TransferWidth::Word);
            registers.write32(dma.destination & !3, value);
            source = source.wrapping_add(dma.control.source_step().offset(TransferWidth::Word));
        }
        dma.current_source = source;

        let flags = if dma.control.irq() {
            Interrupt::dma(channel).into()
        } else {
            InterruptFlags::empty()
        };
        if !dma.repeat() {
            self.disable(registers, channel);
        }
        Ok(flags)
    }

    fn fire(&mut self, registers: &mut RegisterFile, trigger: Trigger) -> InterruptFlags {
        let mut flags = InterruptFlags::empty();

        for channel in 0..NUM_CHANNELS {
            let dma = &mut self.channels[channel];
            if !dma.enabled || dma.trigger() != trigger {
                continue;
            }

            log::trace!(
                "DMA {channel} {trigger:?}: {} units {:08X} -> {:08X}",
                dma.count,
                dma.current_source,
                dma.current_destination
            );
            flags |= self.run(registers, channel);

            let dma = &mut self.channels[channel];
            if dma.repeat() {
                if dma.control.destination_step() == AddressStep::IncrementReload {
                    dma.current_destination = dma.destination;
                }
            } else {
                self.disable(registers, channel);
            }
        }

        flags
    }

    fn run(&mut self, registers: &mut RegisterFile, channel: usize) -> InterruptFlags {
        let dma = &mut self.channels[channel];
        let width = dma.control.width();
        let source_step = dma.control.source_step().offset(width);
        let destination_step = dma.control.destination_step().offset(width);

        let mut source = dma.current_source;
        let mut destination = dma.current_destination;
        for _ in 0..dma.count {
            let value = read_source(registers, channel, source, width);
            match width {
                TransferWidth::Half => registers.write16(destination, value as u16),
                TransferWidth::Word => registers.write32(destination, value),
            }
            source = source.wrapping_add(source_step);
            destination = destination.wrapping_add(destination_step);
        }
        dma.current_source = source;
        dma.current_destination = destination;

        if dma.control.irq() {
            Interrupt::dma(channel).into()
        } else {
            InterruptFlags::empty()
        }
    }

    fn disable(&mut self, registers: &mut RegisterFile, channel: usize) {
        let dma = &mut self.channels[channel];
        dma.enabled = false;
        dma.control.remove(DmaControl::ENABLE);
        registers.set_io16(crate::registers::io::dma_control(channel), dma.control.bits());
    }
}

impl Default for DmaController {
    fn default() -> Self {
        Self::new()
    }
}
