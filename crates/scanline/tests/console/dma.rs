use std::cell::Cell;
use std::rc::Rc;

use scanline::dma::{AddressStep, DmaControl, DmaError, TransferWidth, Trigger};
use scanline::registers::{EWRAM_START, IWRAM_START, ROM_START, io};
use scanline::{Error, Interrupt};

use crate::common;

const SOURCE: u32 = EWRAM_START;
const DESTINATION: u32 = IWRAM_START + 0x100;

fn fill_source(console: &mut scanline::Console, words: &[u32]) {
    for (index, word) in words.iter().enumerate() {
        console
            .registers_mut()
            .write32(SOURCE + 4 * index as u32, *word);
    }
}

#[test]
fn immediate_transfer_ignores_repeat() {
    let mut console = common::console();
    fill_source(&mut console, &[0x1111_1111, 0x2222_2222, 0x3333_3333]);

    let control = DmaControl::ENABLE | DmaControl::REPEAT | DmaControl::WORD;
    console
        .configure_dma(3, SOURCE, DESTINATION, 3, control)
        .unwrap();

    assert_eq!(console.read32(DESTINATION), 0x1111_1111);
    assert_eq!(console.read32(DESTINATION + 8), 0x3333_3333);
    assert!(!console.dma_channel(3).unwrap().enabled);
    let register = DmaControl::from_bits_retain(console.registers().io16(io::dma_control(3)));
    assert!(!register.enabled());
    assert!(register.repeat());
}

#[test]
fn vblank_one_shot_copies_once() {
    let mut console = common::console();
    fill_source(&mut console, &[0xCAFE_F00D]);

    let control = (DmaControl::ENABLE | DmaControl::WORD).with_trigger(Trigger::VBlank);
    console
        .configure_dma(1, SOURCE, DESTINATION, 1, control)
        .unwrap();
    assert_eq!(console.read32(DESTINATION), 0);
    assert!(console.dma_channel(1).unwrap().enabled);

    console.halt_until_vblank().unwrap();
    assert_eq!(console.read32(DESTINATION), 0xCAFE_F00D);
    assert!(!console.dma_channel(1).unwrap().enabled);

    fill_source(&mut console, &[0x1234_5678]);
    console.run_frames(2).unwrap();
    assert_eq!(console.read32(DESTINATION), 0xCAFE_F00D);
}

#[test]
fn vblank_repeat_copies_every_frame_until_stopped() {
    let mut console = common::console();
    fill_source(&mut console, &[0xBEEF]);

    let control = (DmaControl::ENABLE | DmaControl::REPEAT)
        .with_trigger(Trigger::VBlank)
        .with_source_step(AddressStep::Fixed);
    console
        .configure_dma(0, SOURCE, DESTINATION, 1, control)
        .unwrap();

    console.run_frames(3).unwrap();
    for index in 0..3 {
        assert_eq!(console.read16(DESTINATION + 2 * index), 0xBEEF);
    }
    assert_eq!(console.read16(DESTINATION + 6), 0);

    console.stop_dma(0).unwrap();
    console.stop_dma(0).unwrap();
    console.run_frames(2).unwrap();
    assert_eq!(console.read16(DESTINATION + 6), 0);
}

#[test]
fn hblank_transfer_lands_before_hblank_interrupt() {
    let mut console = common::console();
    fill_source(&mut console, &[0x5555_AAAA]);

    let seen = Rc::new(Cell::new(0));
    let recorder = seen.clone();
    console.set_handler(Interrupt::HBlank, move |console| {
        recorder.set(console.read32(DESTINATION));
        Ok(())
    });
    common::enable(&mut console, &[Interrupt::HBlank]);

    let control = (DmaControl::ENABLE | DmaControl::WORD).with_trigger(Trigger::HBlank);
    console
        .configure_dma(2, SOURCE, DESTINATION, 1, control)
        .unwrap();
    console.advance().unwrap();

    assert_eq!(seen.get(), 0x5555_AAAA);
}

#[test]
fn completion_interrupt() {
    let mut console = common::console();
    let count = common::count_interrupts(&mut console, Interrupt::Dma3);
    common::enable(&mut console, &[Interrupt::Dma3]);

    console
        .configure_dma(3, SOURCE, DESTINATION, 4, DmaControl::ENABLE | DmaControl::IRQ)
        .unwrap();
    assert_eq!(count.get(), 1);
}

#[test]
fn rom_is_reserved_for_channel_three() {
    let mut console = common::console();
    console.load_rom(vec![0x78, 0x56, 0x34, 0x12]);

    for channel in 0..3 {
        assert!(matches!(
            console.configure_dma(channel, ROM_START, DESTINATION, 1, DmaControl::ENABLE),
            Err(Error::Dma(DmaError::RomSource { address: ROM_START, .. }))
        ));
    }

    console
        .configure_dma(3, ROM_START, DESTINATION, 1, DmaControl::ENABLE | DmaControl::WORD)
        .unwrap();
    assert_eq!(console.read32(DESTINATION), 0x1234_5678);
}

#[test]
fn mirrored_and_overrunning_rom_sources_are_rejected() {
    let mut console = common::console();
    console.load_rom(vec![0x78, 0x56, 0x34, 0x12]);
    let word = DmaControl::ENABLE | DmaControl::WORD;

    // Channels 1 and 2 keep 28 source bits, so 0x1800_0000 would reach ROM.
    assert!(matches!(
        console.configure_dma(1, 0x1800_0000, DESTINATION, 1, word),
        Err(Error::Dma(DmaError::RomSource { channel: 1, address: ROM_START }))
    ));
    assert_eq!(console.read32(DESTINATION), 0);
    assert!(!console.dma_channel(1).unwrap().enabled);

    // Starting just below ROM and incrementing into it.
    let below = ROM_START - 8;
    assert!(matches!(
        console.configure_dma(2, below, DESTINATION, 4, word),
        Err(Error::Dma(DmaError::RomSource { channel: 2, address: ROM_START }))
    ));
    // The same span decrementing away from ROM is fine.
    let downward = word.with_trigger(Trigger::VBlank).with_source_step(AddressStep::Decrement);
    console.configure_dma(2, below, DESTINATION, 4, downward).unwrap();
    // So is a mirror that lands outside ROM.
    console
        .configure_dma(1, 0x1200_0000, DESTINATION, 1, word.with_trigger(Trigger::VBlank))
        .unwrap();
    assert_eq!(console.dma_channel(1).unwrap().source, EWRAM_START);

    console
        .configure_dma(3, 0x1800_0000, DESTINATION, 1, word)
        .unwrap();
    assert_eq!(console.read32(DESTINATION), 0x1234_5678);
}

#[test]
fn repeating_transfer_reads_zero_once_it_reaches_rom() {
    let mut console = common::console();
    console.load_rom(vec![0xFF; 16]);
    let last_word = ROM_START - 4;
    console.registers_mut().write32(last_word, 0xABCD_EF01);

    let control = (DmaControl::ENABLE | DmaControl::REPEAT | DmaControl::WORD)
        .with_trigger(Trigger::VBlank)
        .with_destination_step(AddressStep::Fixed);
    console
        .configure_dma(1, last_word, DESTINATION, 1, control)
        .unwrap();

    console.halt_until_vblank().unwrap();
    assert_eq!(console.read32(DESTINATION), 0xABCD_EF01);
    console.run_frames(1).unwrap();
    assert_eq!(console.read32(DESTINATION), 0);
}

#[test]
fn control_write_to_an_armed_channel_updates_its_mode() {
    let mut console = common::console();
    fill_source(&mut console, &[0x0102_0304, 0x0506_0708]);
    let count = common::count_interrupts(&mut console, Interrupt::Dma2);
    common::enable(&mut console, &[Interrupt::Dma2]);

    let one_shot = (DmaControl::ENABLE | DmaControl::WORD).with_trigger(Trigger::VBlank);
    console
        .configure_dma(2, SOURCE, DESTINATION, 1, one_shot)
        .unwrap();

    // Still enabled: the channel picks up REPEAT and IRQ without restarting.
    let repeating = one_shot | DmaControl::REPEAT | DmaControl::IRQ;
    console
        .write16(common::io(io::dma_control(2)), repeating.bits())
        .unwrap();
    assert_eq!(console.dma_channel(2).unwrap().control, repeating);

    console.run_frames(2).unwrap();
    assert_eq!(console.read32(DESTINATION), 0x0102_0304);
    assert_eq!(console.read32(DESTINATION + 4), 0x0506_0708);
    assert_eq!(count.get(), 2);
    assert!(console.dma_channel(2).unwrap().enabled);

    // An invalid mode is rejected and leaves the channel as it was.
    let reserved = repeating.with_source_step(AddressStep::IncrementReload);
    assert!(matches!(
        console.write16(common::io(io::dma_control(2)), reserved.bits()),
        Err(Error::Dma(DmaError::InvalidSourceStep { channel: 2, .. }))
    ));
    assert_eq!(console.dma_channel(2).unwrap().control, repeating);
}

#[test]
fn misaligned_and_invalid_channels_fault() {
    let mut console = common::console();

    assert!(matches!(
        console.configure_dma(1, SOURCE + 2, DESTINATION, 1, DmaControl::ENABLE | DmaControl::WORD),
        Err(Error::Dma(DmaError::Misaligned {
            channel: 1,
            width: TransferWidth::Word,
            ..
        }))
    ));
    assert!(matches!(
        console.configure_dma(1, SOURCE, DESTINATION + 1, 1, DmaControl::ENABLE),
        Err(Error::Dma(DmaError::Misaligned {
            width: TransferWidth::Half,
            ..
        }))
    ));
    assert!(matches!(
        console.configure_dma(4, SOURCE, DESTINATION, 1, DmaControl::ENABLE),
        Err(Error::Dma(DmaError::InvalidChannel(4)))
    ));
    assert!(matches!(
        console.stop_dma(9),
        Err(Error::Dma(DmaError::InvalidChannel(9)))
    ));
}

#[test]
fn enabling_through_registers_configures_channel() {
    let mut console = common::console();
    fill_source(&mut console, &[0xAAAA_BBBB, 0xCCCC_DDDD]);

    console.write32(common::io(io::dma_source(3)), SOURCE).unwrap();
    console
        .write32(common::io(io::dma_destination(3)), DESTINATION)
        .unwrap();
    console.write16(common::io(io::dma_count(3)), 2).unwrap();
    console
        .write16(
            common::io(io::dma_control(3)),
            (DmaControl::ENABLE | DmaControl::WORD).bits(),
        )
        .unwrap();

    assert_eq!(console.read32(DESTINATION + 4), 0xCCCC_DDDD);
    assert!(!console.dma_channel(3).unwrap().enabled);

    console.write32(common::io(io::dma_source(0)), ROM_START).unwrap();
    assert!(matches!(
        console.write16(common::io(io::dma_control(0)), DmaControl::ENABLE.bits()),
        Err(Error::Dma(DmaError::RomSource { channel: 0, .. }))
    ));
    assert!(!DmaControl::from_bits_retain(console.registers().io16(io::dma_control(0))).enabled());
}

#[test]
fn special_trigger_waits_for_fifo_requests() {
    let mut console = common::console();
    fill_source(&mut console, &[1, 2, 3, 4, 5, 6, 7, 8]);
    let fifo = common::io(0x0A0);

    let control = (DmaControl::ENABLE | DmaControl::REPEAT | DmaControl::WORD)
        .with_trigger(Trigger::Special)
        .with_destination_step(AddressStep::Fixed);
    console.configure_dma(1, SOURCE, fifo, 4, control).unwrap();

    console.run_frames(1).unwrap();
    assert_eq!(console.read32(fifo), 0);

    console.fire_dma_special(1).unwrap();
    assert_eq!(console.read32(fifo), 4);
    console.fire_dma_special(1).unwrap();
    assert_eq!(console.read32(fifo), 8);
    // Unarmed channels ignore requests.
    console.fire_dma_special(2).unwrap();
}
