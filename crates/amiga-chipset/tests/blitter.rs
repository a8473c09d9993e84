mod common;

use std::cell::RefCell;
use std::rc::Rc;

use amiga_chipset::agnus::blitter::{LineWalker, Octant};
use amiga_chipset::Chipset;
use amiga_chipset::custom_regs::{self as regs, DmaCon, IntBits};
use common::{chipset, write_pointer};
use emu_core::{ChipBus, Ticks};
use proptest::prelude::*;

const LINE: u16 = 0x0001;
const DESC: u16 = 0x0002;
const IFE: u16 = 0x0008;
const EFE: u16 = 0x0010;
const SIGN: u16 = 0x0040;
// HRM line octant bits
const SUD: u16 = 0x0010;
const SUL: u16 = 0x0008;

#[test]
fn copy_completes_after_its_tick_cost() {
    let mut c = chipset();
    let levels = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&levels);
    c.set_interrupt_handler(move |level| sink.borrow_mut().push(level));
    c.write(regs::INTENA, 0xC000 | IntBits::BLIT.bits());

    c.memory_mut().load_words(0x1000, &[0xFFFF; 16]);
    c.write(regs::BLTCON0, 0x09F0);
    c.write(regs::BLTCON1, 0);
    c.write(regs::BLTAFWM, 0xFFFF);
    c.write(regs::BLTALWM, 0xFFFF);
    c.write(regs::BLTAMOD, 0);
    c.write(regs::BLTDMOD, 0);
    write_pointer(&mut c, regs::BLTAPTH, 0x1000);
    write_pointer(&mut c, regs::BLTDPTH, 0x2000);
    c.write(regs::BLTSIZE, (4 << 6) | 4);

    // A and D only: 4 ticks per word, 16 words.
    assert_eq!(c.blitter().done_at(), Some(c.now() + Ticks(64)));
    assert_ne!(c.read(regs::DMACONR) & DmaCon::BBUSY.bits(), 0);
    assert!(levels.borrow().is_empty());

    c.tick_scanline().expect("line runs");

    assert!(!c.blitter().is_busy());
    assert_eq!(c.read(regs::DMACONR) & DmaCon::BBUSY.bits(), 0);
    assert_eq!(c.read(regs::DMACONR) & DmaCon::BZERO.bits(), 0);
    assert_ne!(c.read(regs::INTREQR) & IntBits::BLIT.bits(), 0);
    assert_eq!(*levels.borrow(), vec![3]);
    assert_eq!(c.blitter().completed(), 1);
    assert_eq!(c.registers().blitter().pointer(3), 0x2020);
    assert_eq!(c.registers().blitter().pointer(0), 0x1020);
    for i in 0..16 {
        assert_eq!(c.memory().read_word(0x2000 + 2 * i), 0xFFFF);
    }
    assert_eq!(c.memory().read_word(0x2020), 0);
}

#[test]
fn all_zero_result_sets_bzero() {
    let mut c = chipset();
    c.write(regs::BLTCON0, 0x0100);
    write_pointer(&mut c, regs::BLTDPTH, 0x2000);
    c.write(regs::BLTSIZE, (2 << 6) | 2);
    c.tick_scanline().expect("line runs");
    assert_ne!(c.read(regs::DMACONR) & DmaCon::BZERO.bits(), 0);
}

#[test]
fn retrigger_while_busy_is_dropped() {
    let mut c = chipset();
    c.write(regs::BLTCON0, 0x01FF);
    write_pointer(&mut c, regs::BLTDPTH, 0x2000);
    c.write(regs::BLTSIZE, (8 << 6) | 8);
    let done = c.blitter().done_at();

    write_pointer(&mut c, regs::BLTDPTH, 0x4000);
    c.write(regs::BLTSIZE, (1 << 6) | 1);
    assert_eq!(c.blitter().done_at(), done);
    assert_eq!(c.memory().read_word(0x4000), 0);
}

/// Load an X-major line blit: `dx` across, `dy` rows, C/D at `start`.
fn setup_line(c: &mut Chipset, con1: u16, (dx, dy): (i16, i16), start: u32, texture: u16) {
    let error = 4 * dy - 2 * dx;
    c.write(regs::BLTCON0, 0x0BCA);
    c.write(regs::BLTCON1, con1 | LINE | if error < 0 { SIGN } else { 0 });
    c.write(regs::BLTAFWM, 0xFFFF);
    c.write(regs::BLTALWM, 0xFFFF);
    c.write(regs::BLTADAT, 0x8000);
    c.write(regs::BLTBDAT, texture);
    c.write(regs::BLTAPTH, 0);
    c.write(regs::BLTAPTL, error as u16);
    c.write(regs::BLTAMOD, (4 * (dy - dx)) as u16);
    c.write(regs::BLTBMOD, (4 * dy) as u16);
    c.write(regs::BLTCMOD, 40);
    c.write(regs::BLTDMOD, 40);
    write_pointer(c, regs::BLTCPTH, start);
    write_pointer(c, regs::BLTDPTH, start);
    c.write(regs::BLTSIZE, (((dx + 1) as u16) << 6) | 2);
}

#[test]
fn line_blit_plots_bresenham_dots() {
    let mut c = chipset();
    setup_line(&mut c, SUD, (15, 3), 0x3000, 0xFFFF);

    let rows: Vec<u16> = (0..5).map(|r| c.memory().read_word(0x3000 + 40 * r)).collect();
    assert_eq!(rows, vec![0xE000, 0x1F00, 0x00F8, 0x0007, 0x0000]);

    c.tick_scanline().expect("line runs");
    assert!(!c.blitter().is_busy());
    // The error term ends negative, so SIGN stays set.
    assert_ne!(c.registers().blitter().control1() & SIGN, 0);
    assert_eq!(c.registers().blitter().pointer(3), 0x3000 + 40 * 3);
}

#[test]
fn up_right_line_walks_towards_lower_addresses() {
    let mut c = chipset();
    let start = 0x3000 + 40 * 4;
    setup_line(&mut c, SUD | SUL, (15, 3), start, 0xFFFF);

    let rows: Vec<u16> = (0..5).map(|r| c.memory().read_word(start - 40 * r)).collect();
    assert_eq!(rows, vec![0xE000, 0x1F00, 0x00F8, 0x0007, 0x0000]);
    assert_eq!(c.memory().read_word(start + 40), 0);
}

#[test]
fn line_texture_continues_in_bltbdat() {
    let mut c = chipset();
    setup_line(&mut c, SUD, (7, 0), 0x3000, 0xF000);
    assert_eq!(c.memory().read_word(0x3000), 0xF000);

    c.tick_scanline().expect("line runs");
    assert_eq!(c.registers().blitter().data(1), 0xF000u16.rotate_left(8));
}

#[test]
fn exclusive_fill_drops_left_edge() {
    let mut c = chipset();
    c.memory_mut().load_words(0x1000, &[0x2040]);
    c.write(regs::BLTCON0, 0x09F0);
    c.write(regs::BLTCON1, DESC | EFE);
    c.write(regs::BLTAFWM, 0xFFFF);
    c.write(regs::BLTALWM, 0xFFFF);
    write_pointer(&mut c, regs::BLTAPTH, 0x1000);
    write_pointer(&mut c, regs::BLTDPTH, 0x2000);
    c.write(regs::BLTSIZE, (1 << 6) | 1);
    // Edges at bits 13 and 6: exclusive keeps 6..=12.
    assert_eq!(c.memory().read_word(0x2000), 0x1FC0);
}

/// Bit position counted from the most significant bit of a row's first word.
fn set_bit(words: &mut [u16], row_words: usize, row: usize, pos: usize) {
    words[row * row_words + pos / 16] |= 0x8000 >> (pos % 16);
}

fn fill_case() -> impl Strategy<Value = (usize, Vec<Option<(usize, usize)>>)> {
    (1usize..=3).prop_flat_map(|width| {
        let bits = width * 16;
        let edges = prop::option::of(
            (0..bits, 0..bits).prop_filter("two distinct edges", |(p, q)| p != q),
        );
        (Just(width), prop::collection::vec(edges, 1..6))
    })
}

proptest! {
    #[test]
    fn minterm_follows_truth_table(lf in any::<u8>(), a in any::<u16>(), b in any::<u16>(), cw in any::<u16>()) {
        let mut c = chipset();
        c.write(regs::BLTCON0, 0x0100 | u16::from(lf));
        c.write(regs::BLTCON1, 0);
        c.write(regs::BLTAFWM, 0xFFFF);
        c.write(regs::BLTALWM, 0xFFFF);
        c.write(regs::BLTADAT, a);
        c.write(regs::BLTBDAT, b);
        c.write(regs::BLTCDAT, cw);
        write_pointer(&mut c, regs::BLTDPTH, 0x3000);
        c.write(regs::BLTSIZE, (1 << 6) | 1);

        let d = c.memory().read_word(0x3000);
        for bit in 0..16 {
            let index = (((a >> bit) & 1) << 2) | (((b >> bit) & 1) << 1) | ((cw >> bit) & 1);
            prop_assert_eq!((d >> bit) & 1, u16::from((lf >> index) & 1), "bit {}", bit);
        }
    }

    #[test]
    fn inclusive_fill_spans_between_edges((width, rows) in fill_case()) {
        let mut c = chipset();
        let mut src = vec![0u16; width * rows.len()];
        let mut expected = vec![0u16; width * rows.len()];
        for (r, edges) in rows.iter().enumerate() {
            if let Some((p, q)) = *edges {
                let (lo, hi) = (p.min(q), p.max(q));
                set_bit(&mut src, width, r, lo);
                set_bit(&mut src, width, r, hi);
                for pos in lo..=hi {
                    set_bit(&mut expected, width, r, pos);
                }
            }
        }
        c.memory_mut().load_words(0x1000, &src);

        let last = 2 * (src.len() as u32 - 1);
        c.write(regs::BLTCON0, 0x09F0);
        c.write(regs::BLTCON1, DESC | IFE);
        c.write(regs::BLTAFWM, 0xFFFF);
        c.write(regs::BLTALWM, 0xFFFF);
        write_pointer(&mut c, regs::BLTAPTH, 0x1000 + last);
        write_pointer(&mut c, regs::BLTDPTH, 0x4000 + last);
        c.write(regs::BLTSIZE, ((rows.len() as u16) << 6) | width as u16);

        let out: Vec<u16> = (0..src.len() as u32)
            .map(|i| c.memory().read_word(0x4000 + 2 * i))
            .collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn line_walk_tracks_ideal_line(
        (major, minor) in (1i32..300).prop_flat_map(|major| (Just(major), 0..=major)),
        major_is_y in any::<bool>(),
        x_neg in any::<bool>(),
        y_neg in any::<bool>(),
    ) {
        let octant = Octant { major_is_y, x_neg, y_neg };
        let error = (2 * minor - major) as i16;
        let walker = LineWalker::new(
            octant,
            error,
            (2 * (minor - major)) as i16,
            (2 * minor) as i16,
            major as u32 + 1,
        );
        let dots: Vec<_> = walker.collect();
        prop_assert_eq!(dots.len(), major as usize + 1);

        let sx = if x_neg { -1 } else { 1 };
        let sy = if y_neg { -1 } else { 1 };
        let along = |x: i32, y: i32| if major_is_y { (y * sy, x * sx) } else { (x * sx, y * sy) };

        for pair in dots.windows(2) {
            let (m0, n0) = along(pair[0].x, pair[0].y);
            let (m1, n1) = along(pair[1].x, pair[1].y);
            prop_assert_eq!(m1 - m0, 1);
            prop_assert_eq!(n1 - n0, i32::from(pair[0].error >= 0));
        }
        for dot in &dots {
            let (m, n) = along(dot.x, dot.y);
            prop_assert!((2 * major * n - 2 * minor * m).abs() <= major);
        }
        let end = dots[dots.len() - 1];
        prop_assert_eq!(along(end.x, end.y), (major, minor));
    }
}
