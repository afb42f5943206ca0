use bitflags::bitflags;

use crate::registers::{RegisterFile, io};

use super::screen::Color;

bitflags! {
    /// Layers named in either half of BLDCNT.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct BlendTargets: u8 {
        const BG0      = 1 << 0;
        const BG1      = 1 << 1;
        const BG2      = 1 << 2;
        const BG3      = 1 << 3;
        const OBJ      = 1 << 4;
        const BACKDROP = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    None,
    Alpha,
    Brighten,
    Darken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendControl {
    pub mode: BlendMode,
    pub first: BlendTargets,
    pub second: BlendTargets,
    pub eva: u16,
    pub evb: u16,
    pub evy: u16,
}

impl BlendControl {
    pub fn read(registers: &RegisterFile) -> Self {
        let control = registers.io16(io::BLDCNT);
        let alpha = registers.io16(io::BLDALPHA);

        Self {
            mode: match (control >> 6) & 3 {
                0 => BlendMode::None,
                1 => BlendMode::Alpha,
                2 => BlendMode::Brighten,
                _ => BlendMode::Darken,
            },
            first: BlendTargets::from_bits_truncate(control as u8),
            second: BlendTargets::from_bits_truncate((control >> 8) as u8),
            eva: (alpha & 0x1F).min(16),
            evb: ((alpha >> 8) & 0x1F).min(16),
            evy: (registers.io16(io::BLDY) & 0x1F).min(16),
        }
    }
}

pub fn alpha(first: Color, second: Color, eva: u16, evb: u16) -> Color {
    let mix = |a: u16, b: u16| ((eva * a + evb * b) >> 4).min(31);
    Color::from_rgb(
        mix(first.red(), second.red()),
        mix(first.green(), second.green()),
        mix(first.blue(), second.blue()),
    )
}

pub fn brighten(color: Color, evy: u16) -> Color {
    let lift = |c: u16| c + ((evy * (31 - c)) >> 4);
    Color::from_rgb(lift(color.red()), lift(color.green()), lift(color.blue()))
}

pub fn darken(color: Color, evy: u16) -> Color {
    let dim = |c: u16| c - ((evy * c) >> 4);
    Color::from_rgb(dim(color.red()), dim(color.green()), dim(color.blue()))
}
