use crate::registers::{RegisterFile, io};

use super::control::LayerKind;
use super::screen::{Color, SCREEN_HEIGHT, SCREEN_WIDTH};
use super::tiles::{BG_VRAM_END, BitsPerPixel, palette_index, texel};

/// One layer's pixels for the current line. `None` is transparent.
pub type LayerLine = [Option<Color>; SCREEN_WIDTH];

const MODE5_WIDTH: i32 = 160;
const MODE5_HEIGHT: i32 = 128;

/// BGxCNT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundControl {
    pub priority: u8,
    pub char_base: usize,
    pub mosaic: bool,
    pub bpp: BitsPerPixel,
    pub screen_base: usize,
    /// Affine layers only; text layers always wrap.
    pub wrap: bool,
    pub size: u8,
}

impl BackgroundControl {
    pub fn new(bits: u16) -> Self {
        Self {
            priority: (bits & 0b11) as u8,
            char_base: usize::from((bits >> 2) & 0b11) * 0x4000,
            mosaic: bits & (1 << 6) != 0,
            bpp: BitsPerPixel::from_bit(bits & (1 << 7) != 0),
            screen_base: usize::from((bits >> 8) & 0x1F) * 0x800,
            wrap: bits & (1 << 13) != 0,
            size: (bits >> 14) as u8,
        }
    }

    pub fn read(registers: &RegisterFile, bg: usize) -> Self {
        Self::new(registers.io16(io::bg_control(bg)))
    }

    /// Map width and height in pixels for a text layer.
    pub fn text_size(&self) -> (usize, usize) {
        match self.size {
            0 => (256, 256),
            1 => (512, 256),
            2 => (256, 512),
            _ => (512, 512),
        }
    }

    /// Side length in pixels of an affine layer's square map.
    pub fn affine_size(&self) -> i32 {
        128 << self.size
    }
}

/// A reference point in 20.8 fixed point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AffinePoint {
    pub x: i32,
    pub y: i32,
}

impl AffinePoint {
    /// Reads BGxX/BGxY, sign-extending their 28-bit fields.
    pub fn read(registers: &RegisterFile, bg: usize) -> Self {
        let base = io::bg_affine(bg);
        let extend = |raw: u32| ((raw << 4) as i32) >> 4;
        Self {
            x: extend(registers.io32(base + 8)),
            y: extend(registers.io32(base + 12)),
        }
    }
}

/// PA, PB, PC, PD in 8.8 fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffineMatrix {
    pub pa: i32,
    pub pb: i32,
    pub pc: i32,
    pub pd: i32,
}

impl AffineMatrix {
    pub fn read(registers: &RegisterFile, bg: usize) -> Self {
        let base = io::bg_affine(bg);
        let param = |offset: usize| i32::from(registers.io16(base + offset) as i16);
        Self {
            pa: param(0),
            pb: param(2),
            pc: param(4),
            pd: param(6),
        }
    }
}

pub fn render_text(registers: &RegisterFile, bg: usize, line: usize, out: &mut LayerLine) {
    let control = BackgroundControl::read(registers, bg);
    let (width, height) = control.text_size();
    let h_offset = usize::from(registers.io16(io::bg_h_offset(bg)) & 0x1FF);
    let v_offset = usize::from(registers.io16(io::bg_v_offset(bg)) & 0x1FF);
    let vram = registers.vram();

    let y = (line + v_offset) & (height - 1);
    let screens_across = width / 256;

    for (x, pixel) in out.iter_mut().enumerate() {
        let map_x = (x + h_offset) & (width - 1);
        let screen = (y / 256) * screens_across + map_x / 256;
        let entry_address =
            control.screen_base + screen * 0x800 + ((y % 256) / 8 * 32 + (map_x % 256) / 8) * 2;
        if entry_address + 1 >= BG_VRAM_END {
            *pixel = None;
            continue;
        }

        let entry = u16::from_le_bytes([vram[entry_address], vram[entry_address + 1]]);
        let tile = usize::from(entry & 0x3FF);
        let col = if entry & (1 << 10) != 0 { 7 - map_x % 8 } else { map_x % 8 };
        let row = if entry & (1 << 11) != 0 { 7 - y % 8 } else { y % 8 };

        let tile_address = control.char_base + tile * control.bpp.tile_bytes();
        let index = texel(vram, tile_address, control.bpp, col, row, BG_VRAM_END);
        *pixel = (index != 0).then(|| {
            Color(registers.palette_color(palette_index(control.bpp, entry >> 12, index)))
        });
    }
}

/// Renders an affine or bitmap layer by stepping `origin` across the line
/// with the layer's PA and PC.
pub fn render_transformed(
    registers: &RegisterFile,
    bg: usize,
    kind: LayerKind,
    page: usize,
    origin: AffinePoint,
    out: &mut LayerLine,
) {
    let control = BackgroundControl::read(registers, bg);
    let matrix = AffineMatrix::read(registers, bg);

    let (mut x, mut y) = (origin.x, origin.y);
    for pixel in out.iter_mut() {
        *pixel = sample(registers, &control, kind, page, x >> 8, y >> 8);
        x += matrix.pa;
        y += matrix.pc;
    }
}

fn sample(
    registers: &RegisterFile,
    control: &BackgroundControl,
    kind: LayerKind,
    page: usize,
    x: i32,
    y: i32,
) -> Option<Color> {
    let vram = registers.vram();
    let within = |width: i32, height: i32| (0..width).contains(&x) && (0..height).contains(&y);

    match kind {
        LayerKind::Text => None,
        LayerKind::Affine => {
            let size = control.affine_size();
            let (x, y) = if within(size, size) {
                (x, y)
            } else if control.wrap {
                (x & (size - 1), y & (size - 1))
            } else {
                return None;
            };

            let tiles_across = (size / 8) as usize;
            let map_address =
                control.screen_base + (y as usize / 8) * tiles_across + x as usize / 8;
            if map_address >= BG_VRAM_END {
                return None;
            }

            let tile = control.char_base + usize::from(vram[map_address]) * 64;
            let index = texel(
                vram,
                tile,
                BitsPerPixel::Eight,
                x as usize % 8,
                y as usize % 8,
                BG_VRAM_END,
            );
            (index != 0).then(|| Color(registers.palette_color(usize::from(index))))
        }
        LayerKind::Bitmap3 => {
            if !within(SCREEN_WIDTH as i32, SCREEN_HEIGHT as i32) {
                return None;
            }
            let address = 2 * (y as usize * SCREEN_WIDTH + x as usize);
            Some(Color(u16::from_le_bytes([vram[address], vram[address + 1]])))
        }
        LayerKind::Bitmap4 => {
            if !within(SCREEN_WIDTH as i32, SCREEN_HEIGHT as i32) {
                return None;
            }
            let index = vram[page + y as usize * SCREEN_WIDTH + x as usize];
            (index != 0).then(|| Color(registers.palette_color(usize::from(index))))
        }
        LayerKind::Bitmap5 => {
            if !within(MODE5_WIDTH, MODE5_HEIGHT) {
                return None;
            }
            let address = page + 2 * (y as usize * MODE5_WIDTH as usize + x as usize);
            Some(Color(u16::from_le_bytes([vram[address], vram[address + 1]])))
        }
    }
}

/// Horizontal mosaic: every pixel repeats the first pixel of its block.
pub fn apply_mosaic(line: &mut LayerLine, width: usize) {
    if width <= 1 {
        return;
    }
    for x in 0..SCREEN_WIDTH {
        line[x] = line[x - x % width];
    }
}
