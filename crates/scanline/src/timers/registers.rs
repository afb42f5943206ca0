use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct TimerControl: u16 {
        const PRESCALER = 0b11;
        const CASCADE   = 1 << 2;
        const IRQ       = 1 << 6;
        const ENABLE    = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prescaler {
    Div1,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    /// Finest to coarsest.
    pub const ALL: [Prescaler; 4] = [
        Prescaler::Div1,
        Prescaler::Div64,
        Prescaler::Div256,
        Prescaler::Div1024,
    ];

    pub fn divider(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    fn bits(self) -> u16 {
        self as u16
    }
}

impl TimerControl {
    pub fn new(prescaler: Prescaler, cascade: bool, irq: bool, enable: bool) -> Self {
        let mut control = TimerControl::from_bits_retain(prescaler.bits());
        control.set(TimerControl::CASCADE, cascade);
        control.set(TimerControl::IRQ, irq);
        control.set(TimerControl::ENABLE, enable);
        control
    }

    pub fn prescaler(self) -> Prescaler {
        match self.bits() & TimerControl::PRESCALER.bits() {
            0b00 => Prescaler::Div1,
            0b01 => Prescaler::Div64,
            0b10 => Prescaler::Div256,
            0b11.. => Prescaler::Div1024,
        }
    }

    pub fn cascade(self) -> bool {
        self.contains(TimerControl::CASCADE)
    }

    pub fn irq(self) -> bool {
        self.contains(TimerControl::IRQ)
    }

    pub fn enabled(self) -> bool {
        self.contains(TimerControl::ENABLE)
    }
}
