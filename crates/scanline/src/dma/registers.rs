use bitflags::bitflags;

bitflags! {
    /// DMAxCNT_H.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct DmaControl: u16 {
        const DEST_STEP   = 0b11 << 5;
        const SOURCE_STEP = 0b11 << 7;
        const REPEAT      = 1 << 9;
        const WORD        = 1 << 10;
        const GAMEPAK_DRQ = 1 << 11;
        const TRIGGER     = 0b11 << 12;
        const IRQ         = 1 << 14;
        const ENABLE      = 1 << 15;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStep {
    Increment,
    Decrement,
    Fixed,
    /// Increment during a transfer, then restore the destination on the next trigger.
    IncrementReload,
}

impl AddressStep {
    fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0 => AddressStep::Increment,
            1 => AddressStep::Decrement,
            2 => AddressStep::Fixed,
            3.. => AddressStep::IncrementReload,
        }
    }

    fn bits(self) -> u16 {
        self as u16
    }

    pub fn offset(self, width: TransferWidth) -> u32 {
        match self {
            AddressStep::Increment | AddressStep::IncrementReload => width.bytes(),
            AddressStep::Decrement => width.bytes().wrapping_neg(),
            AddressStep::Fixed => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Immediate,
    VBlank,
    HBlank,
    /// Sound FIFO requests on channels 1 and 2, video capture on channel 3.
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferWidth {
    Half,
    Word,
}

impl TransferWidth {
    pub fn bytes(self) -> u32 {
        match self {
            TransferWidth::Half => 2,
            TransferWidth::Word => 4,
        }
    }
}

impl DmaControl {
    pub fn destination_step(self) -> AddressStep {
        AddressStep::from_bits(self.bits() >> 5)
    }

    pub fn source_step(self) -> AddressStep {
        AddressStep::from_bits(self.bits() >> 7)
    }

    pub fn with_destination_step(self, step: AddressStep) -> Self {
        (self - DmaControl::DEST_STEP) | DmaControl::from_bits_retain(step.bits() << 5)
    }

    pub fn with_source_step(self, step: AddressStep) -> Self {
        (self - DmaControl::SOURCE_STEP) | DmaControl::from_bits_retain(step.bits() << 7)
    }

    pub fn trigger(self) -> Trigger {
        match (self.bits() >> 12) & 0b11 {
            0 => Trigger::Immediate,
            1 => Trigger::VBlank,
            2 => Trigger::HBlank,
            3.. => Trigger::Special,
        }
    }

    pub fn with_trigger(self, trigger: Trigger) -> Self {
        (self - DmaControl::TRIGGER) | DmaControl::from_bits_retain((trigger as u16) << 12)
    }

    pub fn width(self) -> TransferWidth {
        if self.contains(DmaControl::WORD) {
            TransferWidth::Word
        } else {
            TransferWidth::Half
        }
    }

    pub fn repeat(self) -> bool {
        self.contains(DmaControl::REPEAT)
    }

    pub fn irq(self) -> bool {
        self.contains(DmaControl::IRQ)
    }

    pub fn enabled(self) -> bool {
        self.contains(DmaControl::ENABLE)
    }
}
