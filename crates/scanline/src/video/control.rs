use bitflags::bitflags;

bitflags! {
    /// DISPCNT.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct DisplayControlFlags: u16 {
        const MODE         = 0b111;
        const FRAME_SELECT = 1 << 4;
        const HBLANK_FREE  = 1 << 5;
        const OBJ_1D       = 1 << 6;
        const FORCED_BLANK = 1 << 7;
        const BG0          = 1 << 8;
        const BG1          = 1 << 9;
        const BG2          = 1 << 10;
        const BG3          = 1 << 11;
        const OBJ          = 1 << 12;
        const WIN0         = 1 << 13;
        const WIN1         = 1 << 14;
        const OBJ_WINDOW   = 1 << 15;
    }
}

bitflags! {
    /// DISPSTAT. The high byte holds the VCOUNT match setting.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct DisplayStatus: u16 {
        const VBLANK       = 1 << 0;
        const HBLANK       = 1 << 1;
        const VCOUNT_MATCH = 1 << 2;
        const VBLANK_IRQ   = 1 << 3;
        const HBLANK_IRQ   = 1 << 4;
        const VCOUNT_IRQ   = 1 << 5;

        const _ = !0;
    }
}

impl DisplayStatus {
    /// Bits the hardware owns; software writes to them are ignored.
    pub const READ_ONLY: Self = Self::from_bits_retain(0b111);

    pub fn vcount_setting(self) -> u16 {
        self.bits() >> 8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BgMode {
    Tiled,
    Mixed,
    Affine,
    Bitmap3,
    Bitmap4,
    Bitmap5,
    Prohibited(u8),
}

/// How one background layer is sampled in the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Text,
    Affine,
    Bitmap3,
    Bitmap4,
    Bitmap5,
}

const MODE_LAYERS: [[Option<LayerKind>; 4]; 6] = {
    use LayerKind::*;
    [
        [Some(Text), Some(Text), Some(Text), Some(Text)],
        [Some(Text), Some(Text), Some(Affine), None],
        [None, None, Some(Affine), Some(Affine)],
        [None, None, Some(Bitmap3), None],
        [None, None, Some(Bitmap4), None],
        [None, None, Some(Bitmap5), None],
    ]
};

impl BgMode {
    /// Which layer kind each of BG0-BG3 uses in this mode. Prohibited modes
    /// display no backgrounds.
    pub fn layers(self) -> [Option<LayerKind>; 4] {
        match self {
            BgMode::Prohibited(_) => [None; 4],
            mode => MODE_LAYERS[mode.index()],
        }
    }

    pub fn is_bitmap(self) -> bool {
        matches!(self, BgMode::Bitmap3 | BgMode::Bitmap4 | BgMode::Bitmap5)
    }

    fn index(self) -> usize {
        match self {
            BgMode::Tiled => 0,
            BgMode::Mixed => 1,
            BgMode::Affine => 2,
            BgMode::Bitmap3 => 3,
            BgMode::Bitmap4 => 4,
            BgMode::Bitmap5 => 5,
            BgMode::Prohibited(mode) => mode as usize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayControl(DisplayControlFlags);

impl DisplayControl {
    pub fn new(bits: u16) -> Self {
        Self(DisplayControlFlags::from_bits_retain(bits))
    }

    pub fn bits(&self) -> u16 {
        self.0.bits()
    }

    pub fn mode(&self) -> BgMode {
        match self.0.bits() & DisplayControlFlags::MODE.bits() {
            0 => BgMode::Tiled,
            1 => BgMode::Mixed,
            2 => BgMode::Affine,
            3 => BgMode::Bitmap3,
            4 => BgMode::Bitmap4,
            5 => BgMode::Bitmap5,
            mode => BgMode::Prohibited(mode as u8),
        }
    }

    /// Byte offset of the displayed page for the paged bitmap modes.
    pub fn bitmap_page(&self) -> usize {
        if self.0.contains(DisplayControlFlags::FRAME_SELECT) {
            0xA000
        } else {
            0
        }
    }

    pub fn one_dimensional_objects(&self) -> bool {
        self.0.contains(DisplayControlFlags::OBJ_1D)
    }

    pub fn forced_blank(&self) -> bool {
        self.0.contains(DisplayControlFlags::FORCED_BLANK)
    }

    pub fn background_enabled(&self, bg: usize) -> bool {
        self.0.bits() & (DisplayControlFlags::BG0.bits() << bg) != 0
    }

    pub fn objects_enabled(&self) -> bool {
        self.0.contains(DisplayControlFlags::OBJ)
    }

    pub fn window_enabled(&self, window: usize) -> bool {
        self.0.bits() & (DisplayControlFlags::WIN0.bits() << window) != 0
    }

    pub fn object_window_enabled(&self) -> bool {
        self.0.contains(DisplayControlFlags::OBJ_WINDOW)
    }

    pub fn any_window_enabled(&self) -> bool {
        self.0.intersects(
            DisplayControlFlags::WIN0 | DisplayControlFlags::WIN1 | DisplayControlFlags::OBJ_WINDOW,
        )
    }
}

/// MOSAIC block sizes, already converted from the register's size-minus-one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mosaic {
    pub bg_width: u16,
    pub bg_height: u16,
    pub obj_width: u16,
    pub obj_height: u16,
}

impl Mosaic {
    pub fn new(bits: u16) -> Self {
        Self {
            bg_width: (bits & 0xF) + 1,
            bg_height: ((bits >> 4) & 0xF) + 1,
            obj_width: ((bits >> 8) & 0xF) + 1,
            obj_height: ((bits >> 12) & 0xF) + 1,
        }
    }
}
