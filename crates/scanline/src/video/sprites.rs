use crate::registers::RegisterFile;

use super::control::{DisplayControl, Mosaic};
use super::screen::{Color, SCREEN_WIDTH};
use super::tiles::{BitsPerPixel, OBJ_TILE_BASE, palette_index, texel};

pub const NUM_OBJECTS: usize = 128;

/// Object palettes start halfway through palette RAM.
const OBJ_PALETTE: usize = 256;

/// Tiles below this number overlap the bitmap in modes 3-5 and are not drawn.
const BITMAP_FIRST_OBJ_TILE: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectMode {
    Normal,
    SemiTransparent,
    Window,
    Prohibited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectShape {
    Square,
    Wide,
    Tall,
    Prohibited,
}

impl ObjectShape {
    /// Width and height in pixels. The prohibited shape is drawn as 8x8.
    pub fn dimensions(self, size: u8) -> (u32, u32) {
        match (self, size & 3) {
            (ObjectShape::Square, size) => (8 << size, 8 << size),
            (ObjectShape::Wide, 0) => (16, 8),
            (ObjectShape::Wide, 1) => (32, 8),
            (ObjectShape::Wide, 2) => (32, 16),
            (ObjectShape::Wide, _) => (64, 32),
            (ObjectShape::Tall, 0) => (8, 16),
            (ObjectShape::Tall, 1) => (8, 32),
            (ObjectShape::Tall, 2) => (16, 32),
            (ObjectShape::Tall, _) => (32, 64),
            (ObjectShape::Prohibited, _) => (8, 8),
        }
    }
}

/// One decoded OAM entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectEntry {
    pub x: u32,
    pub y: u32,
    pub affine: bool,
    /// Affine objects only: the canvas is twice the sprite's size.
    pub double_size: bool,
    /// Regular objects only.
    pub hidden: bool,
    pub mode: ObjectMode,
    pub mosaic: bool,
    pub bpp: BitsPerPixel,
    pub shape: ObjectShape,
    pub size: u8,
    pub h_flip: bool,
    pub v_flip: bool,
    pub matrix: usize,
    pub tile: usize,
    pub priority: u8,
    pub palette: u16,
}

impl ObjectEntry {
    pub fn parse(attributes: [u16; 3]) -> Self {
        let [attr0, attr1, attr2] = attributes;
        let affine = attr0 & (1 << 8) != 0;

        Self {
            x: u32::from(attr1 & 0x1FF),
            y: u32::from(attr0 & 0xFF),
            affine,
            double_size: affine && attr0 & (1 << 9) != 0,
            hidden: !affine && attr0 & (1 << 9) != 0,
            mode: match (attr0 >> 10) & 3 {
                0 => ObjectMode::Normal,
                1 => ObjectMode::SemiTransparent,
                2 => ObjectMode::Window,
                _ => ObjectMode::Prohibited,
            },
            mosaic: attr0 & (1 << 12) != 0,
            bpp: BitsPerPixel::from_bit(attr0 & (1 << 13) != 0),
            shape: match attr0 >> 14 {
                0 => ObjectShape::Square,
                1 => ObjectShape::Wide,
                2 => ObjectShape::Tall,
                _ => ObjectShape::Prohibited,
            },
            size: (attr1 >> 14) as u8,
            h_flip: !affine && attr1 & (1 << 12) != 0,
            v_flip: !affine && attr1 & (1 << 13) != 0,
            matrix: usize::from((attr1 >> 9) & 0x1F),
            tile: usize::from(attr2 & 0x3FF),
            priority: ((attr2 >> 10) & 3) as u8,
            palette: attr2 >> 12,
        }
    }

    pub fn read(registers: &RegisterFile, index: usize) -> Self {
        let base = index * 8;
        Self::parse([
            registers.oam16(base),
            registers.oam16(base + 2),
            registers.oam16(base + 4),
        ])
    }
}

/// The affine matrices live in the fourth halfword of each group of four entries.
pub fn object_matrix(registers: &RegisterFile, matrix: usize) -> [i32; 4] {
    let base = matrix * 32;
    [6, 14, 22, 30].map(|offset| i32::from(registers.oam16(base + offset) as i16))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectPixel {
    pub color: Color,
    pub semi_transparent: bool,
}

/// Object pixels sorted by priority, plus the object window mask.
pub struct ObjectLayers {
    pub buckets: [[Option<ObjectPixel>; SCREEN_WIDTH]; 4],
    pub window: [bool; SCREEN_WIDTH],
}

impl ObjectLayers {
    pub fn new() -> Self {
        Self {
            buckets: [[None; SCREEN_WIDTH]; 4],
            window: [false; SCREEN_WIDTH],
        }
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.fill(None);
        }
        self.window.fill(false);
    }

    /// Scans all entries in OAM order. Within a bucket the lowest index wins.
    pub fn render(&mut self, registers: &RegisterFile, line: u32, bitmap_mode: bool) {
        self.clear();

        let control = DisplayControl::new(registers.io16(crate::registers::io::DISPCNT));
        let mosaic = Mosaic::new(registers.io16(crate::registers::io::MOSAIC));
        let context = Context {
            registers,
            one_dimensional: control.one_dimensional_objects(),
            bitmap_mode,
        };

        for index in 0..NUM_OBJECTS {
            let object = ObjectEntry::read(registers, index);
            if object.hidden || object.mode == ObjectMode::Prohibited {
                continue;
            }

            let (width, height) = object.shape.dimensions(object.size);
            let scale = if object.double_size { 2 } else { 1 };
            let (canvas_width, canvas_height) = (width * scale, height * scale);

            let sprite_y = line.wrapping_sub(object.y) & 0xFF;
            if sprite_y >= canvas_height {
                continue;
            }
            let sprite_y = if object.mosaic {
                let mosaic_line = line - line % u32::from(mosaic.obj_height);
                let y = mosaic_line.wrapping_sub(object.y) & 0xFF;
                if y >= canvas_height { 0 } else { y }
            } else {
                sprite_y
            };

            let matrix = object.affine.then(|| object_matrix(registers, object.matrix));
            for canvas_x in 0..canvas_width {
                let screen_x = (object.x + canvas_x) & 0x1FF;
                if screen_x as usize >= SCREEN_WIDTH {
                    continue;
                }

                let canvas_x = if object.mosaic {
                    let block_start = screen_x - screen_x % u32::from(mosaic.obj_width);
                    block_start.wrapping_sub(object.x) & 0x1FF
                } else {
                    canvas_x
                };
                let canvas_x = if canvas_x >= canvas_width { 0 } else { canvas_x };

                let texture = match matrix {
                    Some([pa, pb, pc, pd]) => {
                        let dx = canvas_x as i32 - (canvas_width / 2) as i32;
                        let dy = sprite_y as i32 - (canvas_height / 2) as i32;
                        let tx = ((pa * dx + pb * dy) >> 8) + (width / 2) as i32;
                        let ty = ((pc * dx + pd * dy) >> 8) + (height / 2) as i32;
                        if !(0..width as i32).contains(&tx) || !(0..height as i32).contains(&ty) {
                            continue;
                        }
                        (tx as u32, ty as u32)
                    }
                    None => (
                        if object.h_flip { width - 1 - canvas_x } else { canvas_x },
                        if object.v_flip { height - 1 - sprite_y } else { sprite_y },
                    ),
                };

                let Some(index) = context.texel(&object, width, texture) else {
                    continue;
                };
                self.plot(&object, screen_x as usize, index, registers);
            }
        }
    }

    fn plot(&mut self, object: &ObjectEntry, x: usize, index: u8, registers: &RegisterFile) {
        if object.mode == ObjectMode::Window {
            self.window[x] = true;
            return;
        }

        let slot = &mut self.buckets[usize::from(object.priority)][x];
        if slot.is_none() {
            let color = registers.palette_color(
                OBJ_PALETTE + palette_index(object.bpp, object.palette, index),
            );
            *slot = Some(ObjectPixel {
                color: Color(color),
                semi_transparent: object.mode == ObjectMode::SemiTransparent,
            });
        }
    }
}

impl Default for ObjectLayers {
    fn default() -> Self {
        Self::new()
    }
}

struct Context<'a> {
    registers: &'a RegisterFile,
    one_dimensional: bool,
    bitmap_mode: bool,
}

impl Context<'_> {
    /// Non-zero palette index at a texture coordinate, or `None` if transparent.
    fn texel(&self, object: &ObjectEntry, width: u32, (x, y): (u32, u32)) -> Option<u8> {
        let step = match object.bpp {
            BitsPerPixel::Four => 1,
            BitsPerPixel::Eight => 2,
        };
        let row_tiles = if self.one_dimensional {
            (width as usize / 8) * step
        } else {
            32
        };

        let tile = (object.tile + (y as usize / 8) * row_tiles + (x as usize / 8) * step) & 0x3FF;
        if self.bitmap_mode && tile < BITMAP_FIRST_OBJ_TILE {
            return None;
        }

        let vram = self.registers.vram();
        let index = texel(
            vram,
            OBJ_TILE_BASE + tile * 32,
            object.bpp,
            x as usize % 8,
            y as usize % 8,
            vram.len(),
        );
        (index != 0).then_some(index)
    }
}
