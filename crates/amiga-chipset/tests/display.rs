mod common;

use amiga_chipset::custom_regs::{self as regs, DmaCon, bplpt, sprpt};
use amiga_chipset::denise::FB_WIDTH;
use amiga_chipset::denise::ham::HamMode;
use amiga_chipset::denise::video::Palette;
use amiga_chipset::{ChipRevision, Chipset, ChipsetConfig};
use common::{argb, chipset, column_pixel, run_lines, standard_window, write_pointer};
use proptest::prelude::*;

const FIRST_LINE: usize = 0x2C;
const LEFT: usize = 0x81;
const RIGHT: usize = 0x1C1;
const BLACK: u32 = 0xFF00_0000;

const BPL_ON: u16 = 0x8000 | DmaCon::MASTER.bits() | DmaCon::BPL.bits();
const SPR_ON: u16 = 0x8000 | DmaCon::MASTER.bits() | DmaCon::SPR.bits();

/// Point plane `n` at its own buffer holding one display line.
fn load_plane(c: &mut Chipset, n: usize, line: &[u16]) {
    let addr = 0x10000 + 0x1000 * n as u32;
    c.memory_mut().load_words(addr, line);
    write_pointer(c, bplpt(n), addr);
}

/// Sprite list: POS, CTL, then `height` lines of (DATA, DATB), then the end
/// marker.
fn load_sprite(c: &mut Chipset, n: usize, pos: u16, ctl: u16, height: usize, data: u16, datb: u16) {
    let addr = 0x30000 + 0x100 * n as u32;
    let mut words = vec![pos, ctl];
    for _ in 0..height {
        words.extend([data, datb]);
    }
    words.extend([0, 0]);
    c.memory_mut().load_words(addr, &words);
    write_pointer(c, sprpt(n), addr);
}

fn run_to_first_line(c: &mut Chipset) {
    run_lines(c, FIRST_LINE + 1);
}

fn playfield_with_sprite(bplcon2: u16) -> Chipset {
    let mut c = chipset();
    standard_window(&mut c);
    c.write(regs::BPLCON0, 0x1200);
    c.write(regs::BPLCON2, bplcon2);
    c.write(regs::CLXCON, 0x0041);
    c.write(regs::COLOR00 + 2, 0x0F00);
    c.write(regs::COLOR00 + 34, 0x00F0);
    load_plane(&mut c, 0, &[0xFFFF; 20]);
    // HSTART 0xA0, lines 0x2C..0x34, colour code 1.
    load_sprite(&mut c, 0, 0x2C50, 0x3400, 8, 0xFFFF, 0x0000);
    c.write(regs::DMACON, BPL_ON | SPR_ON);
    run_to_first_line(&mut c);
    c
}

#[test]
fn framebuffer_covers_every_line() {
    let c = chipset();
    assert_eq!(c.framebuffer().width(), FB_WIDTH);
    assert_eq!(c.framebuffer().height(), 312);
}

#[test]
fn sprite_in_front_of_playfield_at_its_columns() {
    let mut c = playfield_with_sprite(0x0024);
    let red = argb(0x0F00);
    let green = argb(0x00F0);

    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT - 1), BLACK);
    for col in LEFT..0xA0 {
        assert_eq!(column_pixel(&c, FIRST_LINE, col), red, "column {col:#X}");
    }
    for col in 0xA0..0xB0 {
        assert_eq!(column_pixel(&c, FIRST_LINE, col), green, "column {col:#X}");
    }
    for col in 0xB0..RIGHT {
        assert_eq!(column_pixel(&c, FIRST_LINE, col), red, "column {col:#X}");
    }
    assert_eq!(column_pixel(&c, FIRST_LINE, RIGHT), BLACK);
    assert_eq!(column_pixel(&c, FIRST_LINE - 1, 0xA0), BLACK);

    // Sprite 0 over plane 1: odd planes vs pair 0.
    assert_ne!(c.read(regs::CLXDAT) & 0x0002, 0);
    assert_eq!(c.read(regs::CLXDAT) & 0x0002, 0);
}

#[test]
fn sprite_behind_playfield_with_low_priority() {
    let c = playfield_with_sprite(0x0000);
    let red = argb(0x0F00);
    for col in 0xA0..0xB0 {
        assert_eq!(column_pixel(&c, FIRST_LINE, col), red);
    }
}

fn sprite_pair(ctl1: u16) -> Chipset {
    let mut c = chipset();
    standard_window(&mut c);
    c.write(regs::BPLCON0, 0x0200);
    c.write(regs::COLOR00 + 34, 0x000F);
    c.write(regs::COLOR00 + 50, 0x0FF0);
    load_sprite(&mut c, 0, 0x2C50, 0x3400, 8, 0xFFFF, 0x0000);
    load_sprite(&mut c, 1, 0x2C50, ctl1, 8, 0x0000, 0xFFFF);
    c.write(regs::DMACON, SPR_ON);
    run_to_first_line(&mut c);
    c
}

#[test]
fn attached_pair_merges_into_four_bit_colour() {
    // Odd code 2, even code 1: colour 16 + 9.
    let c = sprite_pair(0x3480);
    assert_eq!(column_pixel(&c, FIRST_LINE, 0xA0), argb(0x0FF0));
    assert_eq!(column_pixel(&c, FIRST_LINE, 0xAF), argb(0x0FF0));
    assert_eq!(column_pixel(&c, FIRST_LINE, 0xB0), BLACK);
}

#[test]
fn unattached_pair_shows_even_sprite() {
    let c = sprite_pair(0x3400);
    assert_eq!(column_pixel(&c, FIRST_LINE, 0xA0), argb(0x000F));
}

fn dual_playfield(mut c: Chipset, bplcon2: u16) -> Chipset {
    standard_window(&mut c);
    c.write(regs::BPLCON0, 0x2600);
    c.write(regs::BPLCON2, bplcon2);
    c.write(regs::COLOR00 + 2, 0x0F00);
    c.write(regs::COLOR00 + 18, 0x000F);
    load_plane(&mut c, 0, &[0xFF00]);
    load_plane(&mut c, 1, &[0x0FF0]);
    c.write(regs::DMACON, BPL_ON);
    run_to_first_line(&mut c);
    c
}

#[test]
fn dual_playfield_front_playfield_wins() {
    let red = argb(0x0F00);
    let blue = argb(0x000F);

    let c = dual_playfield(chipset(), 0);
    let row: Vec<u32> = (0..16).map(|k| column_pixel(&c, FIRST_LINE, LEFT + k)).collect();
    assert_eq!(&row[0..4], &[red; 4]);
    assert_eq!(&row[4..8], &[red; 4]);
    assert_eq!(&row[8..12], &[blue; 4]);
    assert_eq!(&row[12..16], &[BLACK; 4]);

    let c = dual_playfield(chipset(), 0x0040);
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 5), blue);
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 1), red);
}

#[test]
fn aga_dual_playfield_takes_playfield_two_from_colour_eight() {
    common::init_tracing();
    let aga = Chipset::new(ChipsetConfig::preset(ChipRevision::Aga)).expect("AGA preset is valid");
    let c = dual_playfield(aga, 0);
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 1), argb(0x0F00));
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 9), argb(0x000F));
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 13), BLACK);
}

#[test]
fn ham6_modifies_previous_pixel() {
    let mut c = chipset();
    standard_window(&mut c);
    c.write(regs::BPLCON0, 0x6A00);
    c.write(regs::COLOR00 + 2, 0x000F);
    // Pixels 0-3 load colour 1, 4-7 set red to 15, 8-15 set blue to 0.
    let planes = [0xFF00, 0x0F00, 0x0F00, 0x0F00, 0x00FF, 0x0F00];
    for (n, word) in planes.into_iter().enumerate() {
        load_plane(&mut c, n, &[word]);
    }
    c.write(regs::DMACON, BPL_ON);
    run_to_first_line(&mut c);

    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT), 0xFF00_00FF);
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 5), 0xFFFF_00FF);
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 9), 0xFFFF_0000);
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 20), BLACK);
}

#[test]
fn extra_half_brite_halves_upper_colours() {
    let mut c = chipset();
    standard_window(&mut c);
    c.write(regs::BPLCON0, 0x6200);
    c.write(regs::COLOR00 + 2, 0x0EEE);
    load_plane(&mut c, 0, &[0xC000]);
    load_plane(&mut c, 5, &[0x8000]);
    c.write(regs::DMACON, BPL_ON);
    run_to_first_line(&mut c);

    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT), 0xFF77_7777);
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 1), argb(0x0EEE));
}

#[test]
fn modulo_added_after_each_active_line() {
    let mut c = chipset();
    standard_window(&mut c);
    c.write(regs::BPLCON0, 0x1200);
    c.write(regs::BPL1MOD, 40);
    load_plane(&mut c, 0, &[0; 20]);
    c.write(regs::DMACON, BPL_ON);
    run_to_first_line(&mut c);
    assert_eq!(c.registers().display().plane_pointer(0), 0x10000 + 80);

    run_lines(&mut c, 1);
    assert_eq!(c.registers().display().plane_pointer(0), 0x10000 + 160);
}

#[test]
fn scroll_delay_shifts_odd_planes() {
    let mut c = chipset();
    standard_window(&mut c);
    c.write(regs::BPLCON0, 0x1200);
    c.write(regs::BPLCON1, 0x0003);
    c.write(regs::COLOR00 + 2, 0x0F00);
    load_plane(&mut c, 0, &[0x8000]);
    c.write(regs::DMACON, BPL_ON);
    run_to_first_line(&mut c);

    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT), BLACK);
    assert_eq!(column_pixel(&c, FIRST_LINE, LEFT + 3), argb(0x0F00));
}

/// Independent model of HAM6 on (r, g, b) nibbles.
fn ham6_model(palette: &[u16; 16], pixels: &[u8]) -> (u8, u8, u8) {
    let mut rgb = (0u8, 0u8, 0u8);
    for &p in pixels {
        let data = p & 0x0F;
        match (p >> 4) & 3 {
            0 => {
                let c = palette[usize::from(data)];
                rgb = ((c >> 8) as u8 & 0xF, (c >> 4) as u8 & 0xF, c as u8 & 0xF);
            }
            1 => rgb.2 = data,
            2 => rgb.0 = data,
            _ => rgb.1 = data,
        }
    }
    rgb
}

/// Independent model of HAM8 modify ops on 8-bit components.
fn ham8_modify(start: u32, pixels: &[u8]) -> u32 {
    let mut parts = [(start >> 16) as u8, (start >> 8) as u8, start as u8];
    for &p in pixels {
        let slot = match p & 3 {
            1 => 2,
            2 => 0,
            3 => 1,
            _ => continue,
        };
        parts[slot] = (p & 0xFC) | (parts[slot] & 3);
    }
    (u32::from(parts[0]) << 16) | (u32::from(parts[1]) << 8) | u32::from(parts[2])
}

proptest! {
    #[test]
    fn ham6_accumulates_like_the_model(
        colours in prop::array::uniform16(0u16..0x1000),
        pixels in prop::collection::vec(0u8..64, 1..64),
    ) {
        let mut palette = Palette::new(ChipRevision::Ocs);
        for (n, &rgb12) in colours.iter().enumerate() {
            palette.write(n, rgb12, 0);
        }
        let acc = pixels.iter().fold(0, |acc, &p| HamMode::Ham6.apply(acc, p, &palette));
        let (r, g, b) = ham6_model(&colours, &pixels);
        let expected = (u32::from(r) * 0x11) << 16 | (u32::from(g) * 0x11) << 8 | u32::from(b) * 0x11;
        prop_assert_eq!(acc, expected);
    }

    #[test]
    fn ham8_modify_keeps_low_bits(
        start in 0u32..0x100_0000,
        pixels in prop::collection::vec(any::<u8>().prop_filter("modify op", |p| p & 3 != 0), 1..64),
    ) {
        let palette = Palette::new(ChipRevision::Aga);
        let acc = pixels.iter().fold(start, |acc, &p| HamMode::Ham8.apply(acc, p, &palette));
        prop_assert_eq!(acc, ham8_modify(start, &pixels));
    }
}
