use thiserror::Error;

use super::registers::Prescaler;

/// System clock the prescalers divide.
pub const CLOCK_HZ: u64 = 16_777_216;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("a zero-length period cannot be programmed")]
    ZeroPeriod,
    #[error("{millis} ms is longer than one channel can count; cascade a second channel")]
    Unrepresentable { millis: u32 },
}

/// A prescaler and reload pair for a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerPeriod {
    pub prescaler: Prescaler,
    pub reload: u16,
}

impl TimerPeriod {
    /// Prescaled ticks between overflows.
    pub fn ticks(&self) -> u32 {
        0x1_0000 - u32::from(self.reload)
    }

    pub fn cycles(&self) -> u64 {
        u64::from(self.ticks()) * u64::from(self.prescaler.divider())
    }

    /// Picks the finest prescaler that can represent `millis` in one channel.
    pub fn from_millis(millis: u32) -> Result<Self, PeriodError> {
        if millis == 0 {
            return Err(PeriodError::ZeroPeriod);
        }

        let cycles = u64::from(millis) * CLOCK_HZ;
        for prescaler in Prescaler::ALL {
            let divider = u64::from(prescaler.divider()) * 1000;
            let ticks = (cycles + divider / 2) / divider;
            if (1..=0x1_0000).contains(&ticks) {
                return Ok(Self {
                    prescaler,
                    reload: (0x1_0000 - ticks) as u16,
                });
            }
        }

        Err(PeriodError::Unrepresentable { millis })
    }
}
