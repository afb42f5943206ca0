/// Start of the object tile area in VRAM.
pub const OBJ_TILE_BASE: usize = 0x1_0000;

/// Background tile and map fetches past this offset read as transparent.
pub const BG_VRAM_END: usize = 0x1_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitsPerPixel {
    Four,
    Eight,
}

impl BitsPerPixel {
    pub fn from_bit(eight: bool) -> Self {
        if eight {
            BitsPerPixel::Eight
        } else {
            BitsPerPixel::Four
        }
    }

    pub fn tile_bytes(self) -> usize {
        match self {
            BitsPerPixel::Four => 32,
            BitsPerPixel::Eight => 64,
        }
    }
}

/// Palette index of one texel. `tile` is the byte offset of the tile in VRAM;
/// `limit` bounds the area the fetch may touch.
pub fn texel(
    vram: &[u8],
    tile: usize,
    bpp: BitsPerPixel,
    col: usize,
    row: usize,
    limit: usize,
) -> u8 {
    match bpp {
        BitsPerPixel::Four => {
            let address = tile + row * 4 + col / 2;
            if address >= limit {
                return 0;
            }
            (vram[address] >> (4 * (col & 1))) & 0xF
        }
        BitsPerPixel::Eight => {
            let address = tile + row * 8 + col;
            if address >= limit {
                return 0;
            }
            vram[address]
        }
    }
}

/// Palette RAM colour index for a non-zero texel.
pub fn palette_index(bpp: BitsPerPixel, bank: u16, texel: u8) -> usize {
    match bpp {
        BitsPerPixel::Four => usize::from(bank) * 16 + usize::from(texel),
        BitsPerPixel::Eight => usize::from(texel),
    }
}
