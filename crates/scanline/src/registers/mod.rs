//! The flat register file and the memory regions the hardware model shares.
//!
//! `RegisterFile` is plain storage. It performs no side effects on write;
//! register hooks live on [`Console`](crate::Console), which routes IO writes
//! to the interrupt, DMA, timer and video components after storing them here.

pub mod io;

pub const EWRAM_SIZE: usize = 0x4_0000;
pub const IWRAM_SIZE: usize = 0x8000;
pub const IO_SIZE: usize = 0x400;
pub const PALETTE_SIZE: usize = 0x400;
pub const VRAM_SIZE: usize = 0x1_8000;
pub const OAM_SIZE: usize = 0x400;
pub const ROM_MAX_SIZE: usize = 0x200_0000;

pub const EWRAM_START: u32 = 0x0200_0000;
pub const IWRAM_START: u32 = 0x0300_0000;
pub const IO_START: u32 = 0x0400_0000;
pub const PALETTE_START: u32 = 0x0500_0000;
pub const VRAM_START: u32 = 0x0600_0000;
pub const OAM_START: u32 = 0x0700_0000;
pub const ROM_START: u32 = 0x0800_0000;
pub const ROM_END: u32 = 0x0E00_0000;

/// A decoded bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Ewram(usize),
    Iwram(usize),
    Io(usize),
    Palette(usize),
    Vram(usize),
    Oam(usize),
    Rom(usize),
}

impl Region {
    /// Decodes an address, applying the hardware mirroring of each region.
    /// Returns `None` for unmapped space.
    pub fn of(address: u32) -> Option<Region> {
        let offset = (address & 0x00FF_FFFF) as usize;
        match address >> 24 {
            0x02 => Some(Region::Ewram(offset & (EWRAM_SIZE - 1))),
            0x03 => Some(Region::Iwram(offset & (IWRAM_SIZE - 1))),
            0x04 if offset < IO_SIZE => Some(Region::Io(offset)),
            0x05 => Some(Region::Palette(offset & (PALETTE_SIZE - 1))),
            0x06 => {
                // 128 KiB window; the upper 32 KiB mirrors the object tile area
                let offset = offset & 0x1_FFFF;
                Some(Region::Vram(if offset >= VRAM_SIZE {
                    offset - 0x8000
                } else {
                    offset
                }))
            }
            0x07 => Some(Region::Oam(offset & (OAM_SIZE - 1))),
            0x08..=0x0D => Some(Region::Rom((address - ROM_START) as usize & (ROM_MAX_SIZE - 1))),
            _ => None,
        }
    }
}

pub struct RegisterFile {
    io: [u8; IO_SIZE],
    palette: [u8; PALETTE_SIZE],
    oam: [u8; OAM_SIZE],
    vram: Box<[u8]>,
    ewram: Box<[u8]>,
    iwram: Box<[u8]>,
    rom: Vec<u8>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            io: [0; IO_SIZE],
            palette: [0; PALETTE_SIZE],
            oam: [0; OAM_SIZE],
            vram: vec![0; VRAM_SIZE].into_boxed_slice(),
            ewram: vec![0; EWRAM_SIZE].into_boxed_slice(),
            iwram: vec![0; IWRAM_SIZE].into_boxed_slice(),
            rom: Vec::new(),
        }
    }

    /// Replaces the cartridge image. Images larger than the ROM window are truncated.
    pub fn load_rom(&mut self, mut rom: Vec<u8>) {
        rom.truncate(ROM_MAX_SIZE);
        self.rom = rom;
    }

    pub fn io(&self) -> &[u8] {
        &self.io
    }

    pub fn palette(&self) -> &[u8] {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut [u8] {
        &mut self.palette
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut [u8] {
        &mut self.vram
    }

    pub fn oam(&self) -> &[u8] {
        &self.oam
    }

    pub fn oam_mut(&mut self) -> &mut [u8] {
        &mut self.oam
    }

    pub fn io16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.io[offset], self.io[offset + 1]])
    }

    pub fn io32(&self, offset: usize) -> u32 {
        u32::from(self.io16(offset)) | (u32::from(self.io16(offset + 2)) << 16)
    }

    pub fn set_io16(&mut self, offset: usize, value: u16) {
        self.io[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn set_io32(&mut self, offset: usize, value: u32) {
        self.set_io16(offset, value as u16);
        self.set_io16(offset + 2, (value >> 16) as u16);
    }

    /// Halfword from the palette RAM, indexed in colours rather than bytes.
    pub fn palette_color(&self, index: usize) -> u16 {
        let offset = (index * 2) & (PALETTE_SIZE - 1);
        u16::from_le_bytes([self.palette[offset], self.palette[offset + 1]])
    }

    pub fn oam16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.oam[offset], self.oam[offset + 1]])
    }

    fn byte(&self, region: Region) -> u8 {
        match region {
            Region::Ewram(offset) => self.ewram[offset],
            Region::Iwram(offset) => self.iwram[offset],
            Region::Io(offset) => self.io[offset],
            Region::Palette(offset) => self.palette[offset],
            Region::Vram(offset) => self.vram[offset],
            Region::Oam(offset) => self.oam[offset],
            Region::Rom(offset) => self.rom.get(offset).copied().unwrap_or(0),
        }
    }

    fn byte_mut(&mut self, region: Region) -> Option<&mut u8> {
        match region {
            Region::Ewram(offset) => Some(&mut self.ewram[offset]),
            Region::Iwram(offset) => Some(&mut self.iwram[offset]),
            Region::Io(offset) => Some(&mut self.io[offset]),
            Region::Palette(offset) => Some(&mut self.palette[offset]),
            Region::Vram(offset) => Some(&mut self.vram[offset]),
            Region::Oam(offset) => Some(&mut self.oam[offset]),
            Region::Rom(_) => None,
        }
    }

    pub fn read8(&self, address: u32) -> u8 {
        Region::of(address).map_or(0, |region| self.byte(region))
    }

    pub fn read16(&self, address: u32) -> u16 {
        let address = address & !1;
        u16::from_le_bytes([self.read8(address), self.read8(address + 1)])
    }

    pub fn read32(&self, address: u32) -> u32 {
        let address = address & !3;
        u32::from(self.read16(address)) | (u32::from(self.read16(address + 2)) << 16)
    }

    /// Stores a byte. Writes to ROM or unmapped space are dropped.
    pub fn write8(&mut self, address: u32, value: u8) {
        match Region::of(address).and_then(|region| self.byte_mut(region)) {
            Some(byte) => *byte = value,
            None => log::debug!("Dropped write {value:02X} to {address:08X}"),
        }
    }

    pub fn write16(&mut self, address: u32, value: u16) {
        let address = address & !1;
        let [low, high] = value.to_le_bytes();
        self.write8(address, low);
        self.write8(address + 1, high);
    }

    pub fn write32(&mut self, address: u32, value: u32) {
        let address = address & !3;
        self.write16(address, value as u16);
        self.write16(address + 2, (value >> 16) as u16);
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
