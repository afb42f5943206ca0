use bitflags::bitflags;

use crate::registers::{RegisterFile, io};

use super::control::DisplayControl;
use super::screen::{SCREEN_HEIGHT, SCREEN_WIDTH};

bitflags! {
    /// The per-window layer mask in WININ and WINOUT.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct WindowLayers: u8 {
        const BG0     = 1 << 0;
        const BG1     = 1 << 1;
        const BG2     = 1 << 2;
        const BG3     = 1 << 3;
        const OBJ     = 1 << 4;
        const EFFECTS = 1 << 5;
    }
}

impl WindowLayers {
    pub fn background(self, bg: usize) -> bool {
        self.bits() & (1 << bg) != 0
    }
}

/// A half-open span along one axis. Out-of-range or inverted ends clamp the
/// far edge to the screen edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

impl Span {
    fn new(bits: u16, limit: usize) -> Self {
        let start = usize::from(bits >> 8);
        let end = usize::from(bits & 0xFF);
        let end = if end > limit || start > end { limit } else { end };
        Self { start, end }
    }

    fn contains(&self, value: usize) -> bool {
        (self.start..self.end).contains(&value)
    }
}

/// Window state resolved for a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineWindows {
    enabled: bool,
    rectangles: [Option<(Span, WindowLayers)>; 2],
    object: Option<WindowLayers>,
    outside: WindowLayers,
}

impl LineWindows {
    pub fn new(registers: &RegisterFile, line: usize) -> Self {
        let control = DisplayControl::new(registers.io16(io::DISPCNT));
        let inside = registers.io16(io::WININ).to_le_bytes();
        let outside = registers.io16(io::WINOUT).to_le_bytes();

        let rectangles = [(io::WIN0H, io::WIN0V), (io::WIN1H, io::WIN1V)]
            .into_iter()
            .enumerate()
            .map(|(window, (horizontal, vertical))| {
                let vertical = Span::new(registers.io16(vertical), SCREEN_HEIGHT);
                (control.window_enabled(window) && vertical.contains(line)).then(|| {
                    (
                        Span::new(registers.io16(horizontal), SCREEN_WIDTH),
                        WindowLayers::from_bits_truncate(inside[window]),
                    )
                })
            });
        let mut spans = [None; 2];
        for (slot, rectangle) in spans.iter_mut().zip(rectangles) {
            *slot = rectangle;
        }

        Self {
            enabled: control.any_window_enabled(),
            rectangles: spans,
            object: control
                .object_window_enabled()
                .then(|| WindowLayers::from_bits_truncate(outside[1])),
            outside: WindowLayers::from_bits_truncate(outside[0]),
        }
    }

    /// Layers visible at `x`. Window 0 beats window 1, which beats the object
    /// window, which beats the outside mask.
    pub fn layers_at(&self, x: usize, in_object_window: bool) -> WindowLayers {
        if !self.enabled {
            return WindowLayers::all();
        }

        for (span, layers) in self.rectangles.iter().flatten() {
            if span.contains(x) {
                return *layers;
            }
        }

        match self.object {
            Some(layers) if in_object_window => layers,
            _ => self.outside,
        }
    }
}
