use scanline::Console;
use scanline::registers::{OAM_START, VRAM_START, io};
use scanline::video::control::DisplayControlFlags as Dispcnt;
use scanline::video::screen::{Color, SCREEN_HEIGHT, SCREEN_WIDTH};

use crate::common;

const RED: Color = Color(0x001F);
const GREEN: Color = Color(0x03E0);
const BLUE: Color = Color(0x7C00);

fn set_display(console: &mut Console, flags: Dispcnt) {
    console
        .write16(common::io(io::DISPCNT), flags.bits())
        .unwrap();
}

/// BG0 as a text layer of solid palette-1 tiles, with its map at screen block 31.
fn solid_background(console: &mut Console, color: Color) {
    common::fill_vram(console, 0, &[0x11; 32]);
    common::set_palette(console, 1, color.0);
    console
        .write16(common::io(io::bg_control(0)), 31 << 8)
        .unwrap();
}

fn write_object(console: &mut Console, index: u32, attributes: [u16; 3]) {
    for (slot, value) in attributes.into_iter().enumerate() {
        console
            .write16(OAM_START + index * 8 + 2 * slot as u32, value)
            .unwrap();
    }
}

#[test]
fn forced_blank_draws_white() {
    let mut console = common::console();
    solid_background(&mut console, RED);
    set_display(&mut console, Dispcnt::BG0 | Dispcnt::FORCED_BLANK);

    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert!(frame.pixels().iter().all(|pixel| *pixel == Color::WHITE));
}

#[test]
fn mode4_page_flip_leaves_vram_untouched() {
    const PAGE: usize = SCREEN_WIDTH * SCREEN_HEIGHT;
    let mut console = common::console();
    common::fill_vram(&mut console, 0, &[2; PAGE]);
    common::fill_vram(&mut console, 0xA000, &[1; PAGE]);
    common::set_palette(&mut console, 1, BLUE.0);
    common::set_palette(&mut console, 2, RED.0);

    let mode4 = Dispcnt::from_bits_retain(4) | Dispcnt::BG2;
    set_display(&mut console, mode4 | Dispcnt::FRAME_SELECT);
    console.run_frames(1).unwrap();
    assert_eq!(console.front_buffer().pixel(10, 10), BLUE);
    assert_eq!(
        console.front_buffer().pixel(SCREEN_WIDTH - 1, SCREEN_HEIGHT - 1),
        BLUE
    );

    set_display(&mut console, mode4);
    console.run_frames(1).unwrap();
    assert_eq!(console.front_buffer().pixel(10, 10), RED);
    assert_eq!(
        console.front_buffer().pixel(SCREEN_WIDTH - 1, SCREEN_HEIGHT - 1),
        RED
    );

    set_display(&mut console, mode4 | Dispcnt::FRAME_SELECT);
    console.run_frames(1).unwrap();
    assert_eq!(console.front_buffer().pixel(10, 10), BLUE);

    let vram = console.registers().vram();
    assert!(vram[..PAGE].iter().all(|byte| *byte == 2));
    assert!(vram[0xA000..0xA000 + PAGE].iter().all(|byte| *byte == 1));
}

#[test]
fn window_precedence() {
    let mut console = common::console();
    solid_background(&mut console, RED);
    common::hide_objects(&mut console);

    // A 64x64 object-window sprite at (64, 0) made of non-zero texels.
    common::fill_vram(&mut console, 0x1_0000, &[0x11; 64 * 32]);
    write_object(&mut console, 0, [2 << 10, 64 | (3 << 14), 0]);

    console.write16(common::io(io::WIN0H), 100).unwrap();
    console
        .write16(common::io(io::WIN1H), (50 << 8) | 150)
        .unwrap();
    console.write16(common::io(io::WIN0V), 10).unwrap();
    console.write16(common::io(io::WIN1V), 10).unwrap();
    console.write16(common::io(io::WININ), 0x0001).unwrap();
    console.write16(common::io(io::WINOUT), 0x0100).unwrap();

    set_display(
        &mut console,
        Dispcnt::BG0
            | Dispcnt::OBJ
            | Dispcnt::OBJ_1D
            | Dispcnt::WIN0
            | Dispcnt::WIN1
            | Dispcnt::OBJ_WINDOW,
    );
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    // Window 0 shows BG0 even where window 1 and the object window overlap it.
    assert_eq!(frame.pixel(30, 4), RED);
    assert_eq!(frame.pixel(66, 4), RED);
    // Window 1 hides everything, including under the object window.
    assert_eq!(frame.pixel(120, 4), Color::BLACK);
    // Outside both rectangles the object window decides.
    assert_eq!(frame.pixel(66, 20), RED);
    assert_eq!(frame.pixel(120, 20), RED);
    assert_eq!(frame.pixel(200, 4), Color::BLACK);
    assert_eq!(frame.pixel(30, 20), Color::BLACK);
    assert_eq!(frame.pixel(66, 100), Color::BLACK);
}

#[test]
fn brighten_effect_on_first_target() {
    let mut console = common::console();
    solid_background(&mut console, RED);
    set_display(&mut console, Dispcnt::BG0);

    console.write16(common::io(io::BLDCNT), 0x0001 | (2 << 6)).unwrap();
    console.write16(common::io(io::BLDY), 8).unwrap();
    console.run_frames(1).unwrap();
    assert_eq!(console.front_buffer().pixel(0, 0), Color::from_rgb(31, 15, 15));

    console.write16(common::io(io::BLDY), 16).unwrap();
    console.run_frames(1).unwrap();
    assert_eq!(console.front_buffer().pixel(0, 0), Color::WHITE);
}

#[test]
fn alpha_blend_with_backdrop() {
    let mut console = common::console();
    solid_background(&mut console, RED);
    common::set_palette(&mut console, 0, BLUE.0);
    set_display(&mut console, Dispcnt::BG0);

    // BG0 over the backdrop at 8/16 each.
    console
        .write16(common::io(io::BLDCNT), 0x0001 | (1 << 6) | (0x20 << 8))
        .unwrap();
    console.write16(common::io(io::BLDALPHA), 8 | (8 << 8)).unwrap();
    console.run_frames(1).unwrap();

    assert_eq!(console.front_buffer().pixel(5, 5), Color::from_rgb(15, 0, 15));
}

#[test]
fn sprite_draws_over_background_of_equal_priority() {
    let mut console = common::console();
    solid_background(&mut console, RED);
    common::hide_objects(&mut console);

    common::fill_vram(&mut console, 0x1_0000, &[0x11; 32]);
    common::set_palette(&mut console, 256 + 1, GREEN.0);
    write_object(&mut console, 0, [8, 16, 0]);
    // A lower-priority object at the same spot is hidden behind BG0.
    write_object(&mut console, 1, [8, 40, 1 << 10]);

    set_display(&mut console, Dispcnt::BG0 | Dispcnt::OBJ | Dispcnt::OBJ_1D);
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(16, 8), GREEN);
    assert_eq!(frame.pixel(23, 15), GREEN);
    assert_eq!(frame.pixel(24, 8), RED);
    assert_eq!(frame.pixel(16, 16), RED);
    assert_eq!(frame.pixel(40, 8), RED);
}

#[test]
fn registers_written_mid_frame_affect_later_lines() {
    let mut console = common::console();
    solid_background(&mut console, RED);
    set_display(&mut console, Dispcnt::BG0);

    while console.line() < 80 {
        console.advance().unwrap();
    }
    common::set_palette(&mut console, 1, GREEN.0);
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(0, 79), RED);
    assert_eq!(frame.pixel(0, 80), GREEN);
}

#[test]
fn darken_respects_the_window_effect_bit() {
    let mut console = common::console();
    solid_background(&mut console, Color::from_rgb(31, 16, 8));

    // Window 0 covers x 0..8 and leaves effects off inside it.
    console.write16(common::io(io::WIN0H), 8).unwrap();
    console.write16(common::io(io::WIN0V), 160).unwrap();
    console.write16(common::io(io::WININ), 0x01).unwrap();
    console.write16(common::io(io::WINOUT), 0x21).unwrap();

    console.write16(common::io(io::BLDCNT), 0x0001 | (3 << 6)).unwrap();
    console.write16(common::io(io::BLDY), 8).unwrap();
    set_display(&mut console, Dispcnt::BG0 | Dispcnt::WIN0);
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(4, 4), Color::from_rgb(31, 16, 8));
    assert_eq!(frame.pixel(100, 4), Color::from_rgb(16, 8, 4));
}

#[test]
fn semi_transparent_object_blends_without_an_effect() {
    let mut console = common::console();
    solid_background(&mut console, RED);
    common::hide_objects(&mut console);

    common::fill_vram(&mut console, 0x1_0000, &[0x11; 32]);
    common::set_palette(&mut console, 256 + 1, GREEN.0);
    write_object(&mut console, 0, [8 | (1 << 10), 16, 0]);

    // Window 0 covers the object's left half with effects disabled.
    console.write16(common::io(io::WIN0H), 20).unwrap();
    console.write16(common::io(io::WIN0V), 160).unwrap();
    console.write16(common::io(io::WININ), 0x11).unwrap();
    console.write16(common::io(io::WINOUT), 0x31).unwrap();

    // No first target and no mode: only BG0 as a second target.
    console.write16(common::io(io::BLDCNT), 0x01 << 8).unwrap();
    console.write16(common::io(io::BLDALPHA), 8 | (8 << 8)).unwrap();
    set_display(
        &mut console,
        Dispcnt::BG0 | Dispcnt::OBJ | Dispcnt::OBJ_1D | Dispcnt::WIN0,
    );
    console.run_frames(1).unwrap();

    let mixed = Color::from_rgb(15, 15, 0);
    let frame = console.front_buffer();
    assert_eq!(frame.pixel(17, 10), mixed);
    assert_eq!(frame.pixel(22, 10), mixed);
    assert_eq!(frame.pixel(30, 10), RED);

    // BG0 is no longer a second target, so the object draws as is.
    console.write16(common::io(io::BLDCNT), 0x02 << 8).unwrap();
    console.run_frames(1).unwrap();
    assert_eq!(console.front_buffer().pixel(17, 10), GREEN);
}

/// BG2 in mode 1 over a 128x128 affine map of solid red tiles.
fn affine_background(console: &mut Console, wrap: bool) {
    common::fill_vram(console, 64, &[1; 64]);
    common::fill_vram(console, 0x4000, &[1; 16 * 16]);
    common::set_palette(console, 0, BLUE.0);
    common::set_palette(console, 1, RED.0);

    let control = (8 << 8) | if wrap { 1 << 13 } else { 0 };
    console
        .write16(common::io(io::bg_control(2)), control)
        .unwrap();
    set_display(console, Dispcnt::from_bits_retain(1) | Dispcnt::BG2);
}

#[test]
fn affine_background_clips_outside_its_map() {
    let mut console = common::console();
    affine_background(&mut console, false);
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(10, 10), RED);
    assert_eq!(frame.pixel(127, 127), RED);
    assert_eq!(frame.pixel(130, 10), BLUE);
    assert_eq!(frame.pixel(10, 130), BLUE);
}

#[test]
fn affine_background_wraps_when_asked() {
    let mut console = common::console();
    affine_background(&mut console, true);
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(130, 10), RED);
    assert_eq!(frame.pixel(10, 130), RED);
    assert_eq!(frame.pixel(239, 159), RED);
}

fn fill_bitmap(console: &mut Console, color: impl Fn(usize, usize) -> u16) {
    let mut bytes = Vec::with_capacity(2 * SCREEN_WIDTH * SCREEN_HEIGHT);
    for y in 0..SCREEN_HEIGHT {
        for x in 0..SCREEN_WIDTH {
            bytes.extend_from_slice(&color(x, y).to_le_bytes());
        }
    }
    common::fill_vram(console, 0, &bytes);
}

#[test]
fn affine_reference_steps_by_pb_and_pd_each_line() {
    let mut console = common::console();
    let matrix = io::bg_affine(2);
    set_display(&mut console, Dispcnt::from_bits_retain(3) | Dispcnt::BG2);

    // Each line starts one column further right.
    fill_bitmap(&mut console, |x, _| x as u16 + 1);
    console.write16(common::io(matrix + 2), 0x100).unwrap();
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(0, 10), Color(11));
    assert_eq!(frame.pixel(5, 50), Color(56));
    assert_eq!(frame.pixel(200, 50), Color::BLACK);

    // Each line skips a row of the bitmap.
    fill_bitmap(&mut console, |_, y| y as u16 + 1);
    console.write16(common::io(matrix + 2), 0).unwrap();
    console.write16(common::io(matrix + 6), 0x200).unwrap();
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(0, 10), Color(21));
    assert_eq!(frame.pixel(100, 79), Color(159));
    assert_eq!(frame.pixel(0, 80), Color::BLACK);
}

fn write_object_matrix(console: &mut Console, matrix: u32, [pa, pb, pc, pd]: [u16; 4]) {
    for (slot, value) in [pa, pb, pc, pd].into_iter().enumerate() {
        console
            .write16(OAM_START + matrix * 32 + 6 + 8 * slot as u32, value)
            .unwrap();
    }
}

#[test]
fn affine_objects_scale_inside_their_canvas() {
    let mut console = common::console();
    common::hide_objects(&mut console);
    common::fill_vram(&mut console, 0x1_0000, &[0x11; 32]);
    common::set_palette(&mut console, 256 + 1, GREEN.0);

    // An 8x8 identity sprite centred in a double-size 16x16 canvas at (16, 8).
    write_object_matrix(&mut console, 0, [0x100, 0, 0, 0x100]);
    write_object(&mut console, 0, [8 | (1 << 8) | (1 << 9), 16, 0]);
    // The same sprite shrunk to half size in a regular 8x8 canvas at (64, 8).
    write_object_matrix(&mut console, 1, [0x200, 0, 0, 0x200]);
    write_object(&mut console, 1, [8 | (1 << 8), 64 | (1 << 9), 0]);

    set_display(&mut console, Dispcnt::OBJ | Dispcnt::OBJ_1D);
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(16, 8), Color::BLACK);
    assert_eq!(frame.pixel(19, 12), Color::BLACK);
    assert_eq!(frame.pixel(20, 12), GREEN);
    assert_eq!(frame.pixel(27, 19), GREEN);
    assert_eq!(frame.pixel(28, 19), Color::BLACK);
    assert_eq!(frame.pixel(27, 20), Color::BLACK);

    assert_eq!(frame.pixel(65, 10), Color::BLACK);
    assert_eq!(frame.pixel(66, 10), GREEN);
    assert_eq!(frame.pixel(69, 13), GREEN);
    assert_eq!(frame.pixel(70, 13), Color::BLACK);
    assert_eq!(frame.pixel(66, 14), Color::BLACK);
}

#[test]
fn mosaic_applies_to_backgrounds_and_objects() {
    let yellow = Color::from_rgb(31, 31, 0);
    let cyan = Color::from_rgb(0, 31, 31);
    let mut console = common::console();
    common::hide_objects(&mut console);

    // Tile 0: a blue top row, then a red first column on green.
    let mut tile = vec![0x33u8; 4];
    for _ in 1..8 {
        tile.extend_from_slice(&[0x21, 0x22, 0x22, 0x22]);
    }
    common::fill_vram(&mut console, 0, &tile);
    common::set_palette(&mut console, 1, RED.0);
    common::set_palette(&mut console, 2, GREEN.0);
    common::set_palette(&mut console, 3, BLUE.0);
    console
        .write16(common::io(io::bg_control(0)), (31 << 8) | (1 << 6))
        .unwrap();

    // A sprite with a yellow first column on cyan.
    common::fill_vram(&mut console, 0x1_0000, &[0x21u8, 0x22, 0x22, 0x22].repeat(8));
    common::set_palette(&mut console, 256 + 1, yellow.0);
    common::set_palette(&mut console, 256 + 2, cyan.0);
    write_object(&mut console, 0, [40 | (1 << 12), 16, 0]);

    // 4x4 background blocks, 4-wide object blocks.
    console.write16(common::io(io::MOSAIC), 0x0333).unwrap();
    set_display(&mut console, Dispcnt::BG0 | Dispcnt::OBJ | Dispcnt::OBJ_1D);
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(0, 2), BLUE);
    assert_eq!(frame.pixel(3, 5), RED);
    assert_eq!(frame.pixel(6, 5), GREEN);
    assert_eq!(frame.pixel(9, 6), RED);

    assert_eq!(frame.pixel(19, 42), yellow);
    assert_eq!(frame.pixel(20, 42), cyan);
}

fn write_map_entry(console: &mut Console, column: u32, entry: u16) {
    console
        .write16(VRAM_START + 31 * 0x800 + 2 * column, entry)
        .unwrap();
}

#[test]
fn text_entries_flip_and_select_a_palette_bank() {
    let mut console = common::console();

    // Tile 1: index 1 in the top-left corner, index 2 elsewhere.
    let mut tile = vec![0x21u8, 0x22, 0x22, 0x22];
    tile.extend_from_slice(&[0x22; 28]);
    common::fill_vram(&mut console, 32, &tile);
    common::set_palette(&mut console, 1, RED.0);
    common::set_palette(&mut console, 2, GREEN.0);
    common::set_palette(&mut console, 3 * 16 + 1, BLUE.0);
    common::set_palette(&mut console, 3 * 16 + 2, GREEN.0);

    write_map_entry(&mut console, 0, 1);
    write_map_entry(&mut console, 1, 1 | (1 << 10));
    write_map_entry(&mut console, 2, 1 | (1 << 11));
    write_map_entry(&mut console, 3, 1 | (1 << 10) | (1 << 11) | (3 << 12));
    console
        .write16(common::io(io::bg_control(0)), 31 << 8)
        .unwrap();
    set_display(&mut console, Dispcnt::BG0);
    console.run_frames(1).unwrap();

    let frame = console.front_buffer();
    assert_eq!(frame.pixel(0, 0), RED);
    assert_eq!(frame.pixel(7, 7), GREEN);
    assert_eq!(frame.pixel(15, 0), RED);
    assert_eq!(frame.pixel(8, 0), GREEN);
    assert_eq!(frame.pixel(16, 7), RED);
    assert_eq!(frame.pixel(16, 0), GREEN);
    assert_eq!(frame.pixel(31, 7), BLUE);
    assert_eq!(frame.pixel(24, 0), GREEN);
}
