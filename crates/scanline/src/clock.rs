pub const VISIBLE_LINES: u16 = 160;
pub const LINES_PER_FRAME: u16 = 228;

/// The scanline counter driving every hardware event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameClock {
    line: u16,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { line: 0 }
    }

    /// The line the next `step` will process.
    pub fn line(&self) -> u16 {
        self.line
    }

    /// Returns the line to process now and moves the counter on, wrapping after 227.
    pub fn step(&mut self) -> u16 {
        let line = self.line;
        self.line = if line + 1 == LINES_PER_FRAME { 0 } else { line + 1 };
        line
    }

    pub fn is_visible(line: u16) -> bool {
        line < VISIBLE_LINES
    }
}
