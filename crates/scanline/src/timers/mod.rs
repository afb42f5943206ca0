use thiserror::Error;

pub use period::{PeriodError, TimerPeriod};
pub use registers::{Prescaler, TimerControl};

pub mod period;
pub mod registers;

pub const NUM_CHANNELS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("there is no timer channel {0}")]
    InvalidChannel(usize),
    #[error("timer 0 has no previous channel to cascade from")]
    CascadeOnFirstChannel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerChannel {
    pub reload: u16,
    pub counter: u16,
    pub prescaler: Prescaler,
    pub cascade: bool,
    pub running: bool,
    pub irq: bool,
    /// Cycles carried over that did not make a whole prescaled tick.
    residue: u32,
}

impl TimerChannel {
    fn new() -> Self {
        Self {
            reload: 0,
            counter: 0,
            prescaler: Prescaler::Div1,
            cascade: false,
            running: false,
            irq: false,
            residue: 0,
        }
    }

    pub fn control(&self) -> TimerControl {
        TimerControl::new(self.prescaler, self.cascade, self.irq, self.running)
    }

    fn apply_control(&mut self, control: TimerControl) {
        self.prescaler = control.prescaler();
        self.cascade = control.cascade();
        self.irq = control.irq();
    }

    /// Counts `ticks` increments and returns how many times the counter overflowed.
    fn count(&mut self, ticks: u32) -> u32 {
        let to_overflow = 0x1_0000 - u32::from(self.counter);
        if ticks < to_overflow {
            self.counter += ticks as u16;
            return 0;
        }

        let period = 0x1_0000 - u32::from(self.reload);
        let rest = ticks - to_overflow;
        self.counter = self.reload + (rest % period) as u16;
        1 + rest / period
    }

    fn prescaled_ticks(&mut self, cycles: u32) -> u32 {
        let total = self.residue + cycles;
        let divider = self.prescaler.divider();
        self.residue = total % divider;
        total / divider
    }
}

pub struct Timers {
    channels: [TimerChannel; NUM_CHANNELS],
}

impl Timers {
    pub fn new() -> Self {
        Self {
            channels: [TimerChannel::new(); NUM_CHANNELS],
        }
    }

    pub fn channel(&self, channel: usize) -> Result<&TimerChannel, TimerError> {
        self.channels.get(channel).ok_or(TimerError::InvalidChannel(channel))
    }

    fn channel_mut(&mut self, channel: usize) -> Result<&mut TimerChannel, TimerError> {
        self.channels
            .get_mut(channel)
            .ok_or(TimerError::InvalidChannel(channel))
    }

    pub fn start(
        &mut self,
        channel: usize,
        reload: u16,
        prescaler: Prescaler,
        cascade: bool,
        irq: bool,
    ) -> Result<(), TimerError> {
        if channel == 0 && cascade {
            return Err(TimerError::CascadeOnFirstChannel);
        }

        let timer = self.channel_mut(channel)?;
        *timer = TimerChannel {
            reload,
            counter: reload,
            prescaler,
            cascade,
            running: true,
            irq,
            residue: 0,
        };
        Ok(())
    }

    /// Halts counting. The counter and reload keep their values.
    pub fn stop(&mut self, channel: usize) -> Result<(), TimerError> {
        self.channel_mut(channel)?.running = false;
        Ok(())
    }

    pub fn set_reload(&mut self, channel: usize, reload: u16) -> Result<(), TimerError> {
        self.channel_mut(channel)?.reload = reload;
        Ok(())
    }

    /// Applies a TMxCNT_H write: a rising enable edge starts from the reload
    /// value, a falling edge stops, anything else only updates the flags.
    pub fn write_control(
        &mut self,
        channel: usize,
        control: TimerControl,
    ) -> Result<(), TimerError> {
        if channel == 0 && control.cascade() {
            return Err(TimerError::CascadeOnFirstChannel);
        }

        let timer = self.channel_mut(channel)?;
        match (timer.running, control.enabled()) {
            (false, true) => {
                let reload = timer.reload;
                self.start(
                    channel,
                    reload,
                    control.prescaler(),
                    control.cascade(),
                    control.irq(),
                )?;
            }
            (true, false) => {
                timer.apply_control(control);
                timer.running = false;
            }
            _ => timer.apply_control(control),
        }
        Ok(())
    }

    /// Advances every running channel by `cycles` CPU cycles and returns the
    /// number of overflows per channel.
    pub fn tick(&mut self, cycles: u32) -> [u32; NUM_CHANNELS] {
        let mut overflows = [0; NUM_CHANNELS];

        for index in 0..NUM_CHANNELS {
            let previous = if index == 0 { 0 } else { overflows[index - 1] };
            let timer = &mut self.channels[index];
            if !timer.running {
                continue;
            }

            let ticks = if timer.cascade {
                previous
            } else {
                timer.prescaled_ticks(cycles)
            };
            if ticks > 0 {
                overflows[index] = timer.count(ticks);
            }
        }

        overflows
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}
