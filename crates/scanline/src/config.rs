use serde::{Deserialize, Serialize};

/// CPU cycles in one 228-line frame divided evenly over its lines.
pub const CYCLES_PER_SCANLINE: u32 = 1232;

/// How timer channels learn that time has passed.
///
/// Only the deterministic source exists: timers are advanced by a fixed cycle
/// budget from inside the scanline loop, never by host timer callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimerTickSource {
    #[default]
    DeterministicPerScanline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cycles credited to the timers after each scanline.
    pub cycles_per_scanline: u32,
    pub timer_tick_source: TimerTickSource,
    /// Frames a halt may wait for a matching interrupt before failing.
    pub halt_timeout_frames: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycles_per_scanline: CYCLES_PER_SCANLINE,
            timer_tick_source: TimerTickSource::default(),
            halt_timeout_frames: 3600,
        }
    }
}
