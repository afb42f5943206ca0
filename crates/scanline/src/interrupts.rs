use std::rc::Rc;

use bitflags::bitflags;
use thiserror::Error;

use crate::Console;
use crate::error::Error;
use crate::registers::io;
use crate::video::control::DisplayStatus;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct InterruptFlags: u16 {
        const VBLANK  = 1 << 0;
        const HBLANK  = 1 << 1;
        const VCOUNT  = 1 << 2;
        const TIMER0  = 1 << 3;
        const TIMER1  = 1 << 4;
        const TIMER2  = 1 << 5;
        const TIMER3  = 1 << 6;
        const SERIAL  = 1 << 7;
        const DMA0    = 1 << 8;
        const DMA1    = 1 << 9;
        const DMA2    = 1 << 10;
        const DMA3    = 1 << 11;
        const KEYPAD  = 1 << 12;
        const GAMEPAK = 1 << 13;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    VBlank,
    HBlank,
    VCount,
    Timer0,
    Timer1,
    Timer2,
    Timer3,
    Serial,
    Dma0,
    Dma1,
    Dma2,
    Dma3,
    Keypad,
    GamePak,
}

pub const NUM_SOURCES: usize = 14;

impl Interrupt {
    pub const ALL: [Interrupt; NUM_SOURCES] = [
        Interrupt::VBlank,
        Interrupt::HBlank,
        Interrupt::VCount,
        Interrupt::Timer0,
        Interrupt::Timer1,
        Interrupt::Timer2,
        Interrupt::Timer3,
        Interrupt::Serial,
        Interrupt::Dma0,
        Interrupt::Dma1,
        Interrupt::Dma2,
        Interrupt::Dma3,
        Interrupt::Keypad,
        Interrupt::GamePak,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn timer(channel: usize) -> Self {
        [
            Interrupt::Timer0,
            Interrupt::Timer1,
            Interrupt::Timer2,
            Interrupt::Timer3,
        ][channel & 3]
    }

    pub fn dma(channel: usize) -> Self {
        [
            Interrupt::Dma0,
            Interrupt::Dma1,
            Interrupt::Dma2,
            Interrupt::Dma3,
        ][channel & 3]
    }

    /// The order pending sources are serviced in when several are deliverable at once.
    pub fn dispatch_order() -> &'static [Self] {
        &[
            Interrupt::HBlank,
            Interrupt::VCount,
            Interrupt::VBlank,
            Interrupt::Timer0,
            Interrupt::Timer1,
            Interrupt::Timer2,
            Interrupt::Timer3,
            Interrupt::Serial,
            Interrupt::Dma0,
            Interrupt::Dma1,
            Interrupt::Dma2,
            Interrupt::Dma3,
            Interrupt::Keypad,
            Interrupt::GamePak,
        ]
    }

    /// The DISPSTAT bit that must also be set for display sources to be delivered.
    pub fn display_enable(self) -> Option<DisplayStatus> {
        match self {
            Interrupt::VBlank => Some(DisplayStatus::VBLANK_IRQ),
            Interrupt::HBlank => Some(DisplayStatus::HBLANK_IRQ),
            Interrupt::VCount => Some(DisplayStatus::VCOUNT_IRQ),
            _ => None,
        }
    }
}

impl From<Interrupt> for InterruptFlags {
    fn from(interrupt: Interrupt) -> Self {
        InterruptFlags::from_bits_retain(1 << interrupt.index())
    }
}

impl InterruptFlags {
    pub fn interrupts(self) -> impl Iterator<Item = Interrupt> {
        Interrupt::ALL
            .into_iter()
            .filter(move |interrupt| self.contains((*interrupt).into()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterruptError {
    #[error("waiting on an empty interrupt mask would never return")]
    EmptyWaitMask,
}

pub type Handler = Rc<dyn Fn(&mut Console) -> Result<(), Error>>;

/// Handler table plus the bookkeeping the halt primitives poll.
///
/// IE, IF and IME themselves live in the register file so collaborators can
/// read them as memory.
pub struct InterruptController {
    handlers: [Option<Handler>; NUM_SOURCES],
    master_written: bool,
    acknowledged: [u64; NUM_SOURCES],
    raised: [u64; NUM_SOURCES],
}

/// Snapshot of the delivery counters, taken when a halt begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    acknowledged: [u64; NUM_SOURCES],
    raised: [u64; NUM_SOURCES],
}

impl InterruptController {
    pub fn new() -> Self {
        Self {
            handlers: Default::default(),
            master_written: false,
            acknowledged: [0; NUM_SOURCES],
            raised: [0; NUM_SOURCES],
        }
    }

    pub fn handler(&self, interrupt: Interrupt) -> Option<Handler> {
        self.handlers[interrupt.index()].clone()
    }

    pub fn mark(&self) -> Mark {
        Mark {
            acknowledged: self.acknowledged,
            raised: self.raised,
        }
    }

    /// Whether a source in `mask` was acknowledged after `mark`, or was raised
    /// after it and is still pending in `request`.
    pub fn arrived_since(
        &self,
        mark: &Mark,
        mask: InterruptFlags,
        request: InterruptFlags,
    ) -> bool {
        mask.interrupts().any(|interrupt| {
            let index = interrupt.index();
            self.acknowledged[index] > mark.acknowledged[index]
                || (self.raised[index] > mark.raised[index]
                    && request.contains(interrupt.into()))
        })
    }

    pub fn acknowledged_count(&self, interrupt: Interrupt) -> u64 {
        self.acknowledged[interrupt.index()]
    }

    pub fn raised_count(&self, interrupt: Interrupt) -> u64 {
        self.raised[interrupt.index()]
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn set_handler(
        &mut self,
        interrupt: Interrupt,
        handler: impl Fn(&mut Console) -> Result<(), Error> + 'static,
    ) {
        self.interrupts.handlers[interrupt.index()] = Some(Rc::new(handler));
    }

    pub fn clear_handler(&mut self, interrupt: Interrupt) {
        self.interrupts.handlers[interrupt.index()] = None;
    }

    pub fn interrupt_enable(&self) -> InterruptFlags {
        InterruptFlags::from_bits_retain(self.registers.io16(io::IE))
    }

    pub fn interrupt_request(&self) -> InterruptFlags {
        InterruptFlags::from_bits_retain(self.registers.io16(io::IF))
    }

    pub fn master_enabled(&self) -> bool {
        self.registers.io16(io::IME) & 1 != 0
    }

    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    /// Sets the IE bit for a source. Display sources also get their DISPSTAT
    /// sub-enable so a single call is enough to receive them.
    pub fn set_interrupt_enabled(
        &mut self,
        interrupt: Interrupt,
        enabled: bool,
    ) -> Result<(), Error> {
        let mut enable = self.interrupt_enable();
        enable.set(interrupt.into(), enabled);
        self.registers.set_io16(io::IE, enable.bits());

        if let Some(sub_enable) = interrupt.display_enable() {
            let mut status = DisplayStatus::from_bits_retain(self.registers.io16(io::DISPSTAT));
            status.set(sub_enable, enabled);
            self.registers.set_io16(io::DISPSTAT, status.bits());
        }

        self.dispatch_pending()
    }

    pub fn set_master_enabled(&mut self, enabled: bool) -> Result<(), Error> {
        self.interrupts.master_written = true;
        self.registers.set_io16(io::IME, enabled as u16);
        self.dispatch_pending()
    }

    /// Requests a source. The pending bit is always set; the handler runs now
    /// if the source is deliverable.
    pub fn raise(&mut self, interrupt: Interrupt) -> Result<(), Error> {
        let request = self.interrupt_request() | interrupt.into();
        self.registers.set_io16(io::IF, request.bits());
        self.interrupts.raised[interrupt.index()] += 1;
        self.dispatch_pending()
    }

    /// Clears a pending source without running its handler.
    pub fn acknowledge(&mut self, interrupt: Interrupt) {
        self.acknowledge_flags(interrupt.into());
    }

    pub(crate) fn acknowledge_flags(&mut self, flags: InterruptFlags) {
        let request = self.interrupt_request();
        for interrupt in (request & flags).interrupts() {
            self.interrupts.acknowledged[interrupt.index()] += 1;
        }
        self.registers.set_io16(io::IF, (request - flags).bits());
    }

    pub(crate) fn note_master_written(&mut self) {
        self.interrupts.master_written = true;
    }

    fn deliverable(&self, interrupt: Interrupt) -> bool {
        if !self.master_enabled() || !self.interrupt_enable().contains(interrupt.into()) {
            return false;
        }

        match interrupt.display_enable() {
            Some(sub_enable) => DisplayStatus::from_bits_retain(self.registers.io16(io::DISPSTAT))
                .contains(sub_enable),
            None => true,
        }
    }

    fn next_deliverable(&self) -> Option<Interrupt> {
        let request = self.interrupt_request();
        Interrupt::dispatch_order()
            .iter()
            .copied()
            .find(|interrupt| request.contains((*interrupt).into()) && self.deliverable(*interrupt))
    }

    pub(crate) fn dispatch_pending(&mut self) -> Result<(), Error> {
        while let Some(interrupt) = self.next_deliverable() {
            self.deliver(interrupt)?;
        }
        Ok(())
    }

    fn deliver(&mut self, interrupt: Interrupt) -> Result<(), Error> {
        log::trace!("Dispatching {interrupt:?} at line {}", self.registers.io16(io::VCOUNT));
        self.acknowledge(interrupt);

        let saved = self.registers.io16(io::IME);
        let outer_written = std::mem::replace(&mut self.interrupts.master_written, false);
        self.registers.set_io16(io::IME, 0);

        let result = match self.interrupts.handler(interrupt) {
            Some(handler) => handler(self),
            None => Ok(()),
        };

        if !self.interrupts.master_written {
            self.registers.set_io16(io::IME, saved);
        }
        self.interrupts.master_written = outer_written;

        result
    }
}
