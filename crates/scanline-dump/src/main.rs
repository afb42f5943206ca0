//! Drives demo scenes through the hardware model using only register writes
//! and interrupt handlers, then saves the last completed frame as a PNG.

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use rgb::ComponentBytes;
use scanline::dma::{AddressStep, DmaControl, Trigger};
use scanline::registers::{EWRAM_START, IO_START, OAM_START, PALETTE_START, VRAM_START, io};
use scanline::timers::TimerPeriod;
use scanline::video::control::DisplayControlFlags as Dispcnt;
use scanline::video::screen::{Color, SCREEN_HEIGHT, SCREEN_WIDTH};
use scanline::{Config, Console, Interrupt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scene {
    /// A checkerboard text layer scrolled by a timer interrupt, with a sprite on top.
    Tiles,
    /// A mode 3 colour gradient.
    Bitmap,
    /// A per-line backdrop gradient fed by HBlank DMA and re-armed every VBlank.
    Raster,
    /// Two text layers alpha-blended inside a window.
    Effects,
}

/// Render a demo scene and save the final frame
#[derive(Parser, Debug)]
#[command(name = "scanline-dump")]
struct Args {
    #[arg(value_enum)]
    scene: Scene,

    /// Number of frames to run
    #[arg(short, long, default_value = "1")]
    frames: u64,

    /// Where to write the PNG
    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,

    /// Hardware model settings in RON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective settings as RON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ron::from_str::<Config>(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if args.print_config {
        println!(
            "{}",
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())?
        );
        return Ok(());
    }

    let mut console = Console::new(config);
    match args.scene {
        Scene::Tiles => tiles(&mut console)?,
        Scene::Bitmap => bitmap(&mut console)?,
        Scene::Raster => raster(&mut console)?,
        Scene::Effects => effects(&mut console)?,
    }

    console.run_frames(args.frames)?;
    save_png(&console, &args.output)?;

    eprintln!(
        "{:?}: {} frames, saved {}",
        args.scene,
        console.frames(),
        args.output.display()
    );
    Ok(())
}

fn io(offset: usize) -> u32 {
    IO_START + offset as u32
}

fn set_palette(console: &mut Console, index: u32, color: Color) -> Result<(), scanline::Error> {
    console.write16(PALETTE_START + 2 * index, color.0)
}

fn fill_vram(console: &mut Console, offset: u32, bytes: &[u8]) -> Result<(), scanline::Error> {
    for (index, byte) in bytes.iter().enumerate() {
        console.write8(VRAM_START + offset + index as u32, *byte)?;
    }
    Ok(())
}

/// Fills a 4bpp tile with a single palette index.
fn solid_tile(
    console: &mut Console,
    offset: u32,
    tile: u32,
    index: u8,
) -> Result<(), scanline::Error> {
    fill_vram(console, offset + tile * 32, &[index * 0x11; 32])
}

fn hide_objects(console: &mut Console) -> Result<(), scanline::Error> {
    for entry in 0..128 {
        console.write16(OAM_START + entry * 8, 1 << 9)?;
    }
    Ok(())
}

fn tiles(console: &mut Console) -> Result<(), scanline::Error> {
    set_palette(console, 1, Color::from_rgb(4, 6, 12))?;
    set_palette(console, 2, Color::from_rgb(20, 24, 31))?;
    solid_tile(console, 0, 1, 1)?;
    solid_tile(console, 0, 2, 2)?;

    let map = 31 * 0x800;
    for row in 0..32u32 {
        for col in 0..32u32 {
            let tile = 1 + ((row + col) & 1) as u16;
            console.write16(VRAM_START + map + 2 * (row * 32 + col), tile)?;
        }
    }
    console.write16(io(io::bg_control(0)), 31 << 8)?;

    // A 16x16 sprite from object tiles 0..4.
    set_palette(console, 256 + 3, Color::from_rgb(31, 28, 0))?;
    for tile in 0..4 {
        solid_tile(console, 0x1_0000, tile, 3)?;
    }
    hide_objects(console)?;
    console.write16(OAM_START, 72)?;
    console.write16(OAM_START + 2, 112 | (1 << 14))?;
    console.write16(OAM_START + 4, 0)?;

    let period = TimerPeriod::from_millis(16)?;
    console.set_handler(Interrupt::Timer0, |console| {
        let offset = console.read16(io(io::bg_h_offset(0)));
        console.write16(io(io::bg_h_offset(0)), offset.wrapping_add(1) & 0x1FF)
    });
    console.set_interrupt_enabled(Interrupt::Timer0, true)?;
    console.set_master_enabled(true)?;
    console.start_timer(0, period.reload, period.prescaler, false, true)?;

    console.write16(
        io(io::DISPCNT),
        (Dispcnt::BG0 | Dispcnt::OBJ | Dispcnt::OBJ_1D).bits(),
    )
}

fn bitmap(console: &mut Console) -> Result<(), scanline::Error> {
    for y in 0..SCREEN_HEIGHT {
        for x in 0..SCREEN_WIDTH {
            let color = Color::from_rgb(
                (x * 31 / (SCREEN_WIDTH - 1)) as u16,
                (y * 31 / (SCREEN_HEIGHT - 1)) as u16,
                16,
            );
            console.write16(VRAM_START + 2 * (y * SCREEN_WIDTH + x) as u32, color.0)?;
        }
    }
    console.write16(io(io::DISPCNT), (Dispcnt::from_bits_retain(3) | Dispcnt::BG2).bits())
}

const RASTER_TABLE: u32 = EWRAM_START;

fn arm_raster(console: &mut Console) -> Result<(), scanline::Error> {
    let control = (DmaControl::ENABLE | DmaControl::REPEAT)
        .with_trigger(Trigger::HBlank)
        .with_destination_step(AddressStep::Fixed);
    console.configure_dma(0, RASTER_TABLE, PALETTE_START, 1, control)
}

fn raster(console: &mut Console) -> Result<(), scanline::Error> {
    for line in 0..SCREEN_HEIGHT as u32 {
        let color = Color::from_rgb(0, (line / 10) as u16, 31 - (line / 5) as u16);
        console.write16(RASTER_TABLE + 2 * line, color.0)?;
    }

    console.set_handler(Interrupt::VBlank, |console| {
        console.stop_dma(0)?;
        arm_raster(console)
    });
    console.set_interrupt_enabled(Interrupt::VBlank, true)?;
    console.set_master_enabled(true)?;
    arm_raster(console)?;

    console.write16(io(io::DISPCNT), 0)
}

fn effects(console: &mut Console) -> Result<(), scanline::Error> {
    set_palette(console, 1, Color::from_rgb(4, 6, 12))?;
    set_palette(console, 2, Color::from_rgb(20, 24, 31))?;
    set_palette(console, 3, Color::from_rgb(31, 4, 4))?;
    for (tile, index) in [(1, 1), (2, 2), (3, 3)] {
        solid_tile(console, 0, tile, index)?;
    }

    let checkerboard = 31 * 0x800;
    let solid = 30 * 0x800;
    for row in 0..32u32 {
        for col in 0..32u32 {
            let entry = 2 * (row * 32 + col);
            let tile = 1 + ((row ^ col) & 1) as u16;
            console.write16(VRAM_START + checkerboard + entry, tile)?;
            console.write16(VRAM_START + solid + entry, 3)?;
        }
    }
    console.write16(io(io::bg_control(0)), (31 << 8) | 1)?;
    console.write16(io(io::bg_control(1)), 30 << 8)?;

    console.write16(io(io::WIN0H), (40 << 8) | 200)?;
    console.write16(io(io::WIN0V), (30 << 8) | 130)?;
    // Inside: both layers plus effects. Outside: the checkerboard only.
    console.write16(io(io::WININ), 0x0023)?;
    console.write16(io(io::WINOUT), 0x0001)?;

    console.write16(io(io::BLDCNT), 0x0002 | (1 << 6) | (0x01 << 8))?;
    console.write16(io(io::BLDALPHA), 10 | (6 << 8))?;

    console.write16(
        io(io::DISPCNT),
        (Dispcnt::BG0 | Dispcnt::BG1 | Dispcnt::WIN0).bits(),
    )
}

fn save_png(console: &Console, path: &Path) -> Result<(), Box<dyn Error>> {
    let pixels = console.front_buffer().to_rgb8();

    let file = BufWriter::new(fs::File::create(path)?);
    let mut encoder = png::Encoder::new(file, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(pixels.as_bytes())?;
    Ok(())
}
