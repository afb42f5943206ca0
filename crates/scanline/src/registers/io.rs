//! IO register offsets relative to `0x0400_0000`.
//!
//! Collaborator code treats these as memory-mapped values, so the offsets and
//! bit positions match the hardware exactly.

pub const DISPCNT: usize = 0x000;
pub const GREENSWAP: usize = 0x002;
pub const DISPSTAT: usize = 0x004;
pub const VCOUNT: usize = 0x006;

pub const BG0CNT: usize = 0x008;
pub const BG0HOFS: usize = 0x010;
pub const BG0VOFS: usize = 0x012;

pub const BG2PA: usize = 0x020;
pub const BG2X: usize = 0x028;
pub const BG2Y: usize = 0x02C;
pub const BG3PA: usize = 0x030;
pub const BG3Y_END: usize = 0x040;

pub const WIN0H: usize = 0x040;
pub const WIN1H: usize = 0x042;
pub const WIN0V: usize = 0x044;
pub const WIN1V: usize = 0x046;
pub const WININ: usize = 0x048;
pub const WINOUT: usize = 0x04A;
pub const MOSAIC: usize = 0x04C;

pub const BLDCNT: usize = 0x050;
pub const BLDALPHA: usize = 0x052;
pub const BLDY: usize = 0x054;

pub const DMA0SAD: usize = 0x0B0;
pub const DMA_STRIDE: usize = 12;
pub const DMA_END: usize = DMA0SAD + 4 * DMA_STRIDE;

pub const TM0CNT_L: usize = 0x100;
pub const TIMER_STRIDE: usize = 4;
pub const TIMER_END: usize = TM0CNT_L + 4 * TIMER_STRIDE;

pub const IE: usize = 0x200;
pub const IF: usize = 0x202;
pub const IME: usize = 0x208;

pub const fn bg_control(bg: usize) -> usize {
    BG0CNT + 2 * bg
}

pub const fn bg_h_offset(bg: usize) -> usize {
    BG0HOFS + 4 * bg
}

pub const fn bg_v_offset(bg: usize) -> usize {
    BG0VOFS + 4 * bg
}

/// Base of the PA/PB/PC/PD/X/Y block for affine background 2 or 3.
pub const fn bg_affine(bg: usize) -> usize {
    if bg == 2 { BG2PA } else { BG3PA }
}

pub const fn dma_source(channel: usize) -> usize {
    DMA0SAD + DMA_STRIDE * channel
}

pub const fn dma_destination(channel: usize) -> usize {
    dma_source(channel) + 4
}

pub const fn dma_count(channel: usize) -> usize {
    dma_source(channel) + 8
}

pub const fn dma_control(channel: usize) -> usize {
    dma_source(channel) + 10
}

pub const fn timer_reload(channel: usize) -> usize {
    TM0CNT_L + TIMER_STRIDE * channel
}

pub const fn timer_control(channel: usize) -> usize {
    timer_reload(channel) + 2
}

/// Identifies which hooked register, if any, an aligned halfword offset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    DisplayStatus,
    VerticalCount,
    AffineReference { bg: usize },
    DmaControl { channel: usize },
    TimerReload { channel: usize },
    TimerControl { channel: usize },
    InterruptEnable,
    InterruptRequest,
    InterruptMasterEnable,
    Plain,
}

impl Register {
    pub fn at(offset: usize) -> Self {
        match offset {
            DISPSTAT => Register::DisplayStatus,
            VCOUNT => Register::VerticalCount,
            BG2X..BG3PA => Register::AffineReference { bg: 2 },
            0x038..BG3Y_END => Register::AffineReference { bg: 3 },
            DMA0SAD..DMA_END if (offset - DMA0SAD) % DMA_STRIDE == 10 => Register::DmaControl {
                channel: (offset - DMA0SAD) / DMA_STRIDE,
            },
            TM0CNT_L..TIMER_END => {
                let channel = (offset - TM0CNT_L) / TIMER_STRIDE;
                if offset % TIMER_STRIDE == 0 {
                    Register::TimerReload { channel }
                } else {
                    Register::TimerControl { channel }
                }
            }
            IE => Register::InterruptEnable,
            IF => Register::InterruptRequest,
            IME => Register::InterruptMasterEnable,
            _ => Register::Plain,
        }
    }
}
