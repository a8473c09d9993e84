//! Shared setup for the integration tests.

#![allow(dead_code)]

use amiga_chipset::custom_regs as regs;
use amiga_chipset::{Chipset, ChipsetConfig};

/// Log to the test harness so `cargo test -- --nocapture` shows chip traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn chipset() -> Chipset {
    init_tracing();
    Chipset::new(ChipsetConfig::default()).expect("default config is valid")
}

/// Write a 32-bit pointer through its register pair.
pub fn write_pointer(chipset: &mut Chipset, hi: u16, addr: u32) {
    chipset.write(hi, (addr >> 16) as u16);
    chipset.write(hi + 2, addr as u16);
}

pub fn run_lines(chipset: &mut Chipset, lines: usize) {
    for _ in 0..lines {
        chipset.tick_scanline().expect("line runs");
    }
}

/// Standard PAL low-res window: 320x256 from (0x81, 0x2C).
pub fn standard_window(chipset: &mut Chipset) {
    chipset.write(regs::DIWSTRT, 0x2C81);
    chipset.write(regs::DIWSTOP, 0x2CC1);
    chipset.write(regs::DDFSTRT, 0x38);
    chipset.write(regs::DDFSTOP, 0xD0);
}

/// ARGB32 as the framebuffer stores a 12-bit colour.
pub fn argb(rgb12: u16) -> u32 {
    let r = u32::from((rgb12 >> 8) & 0xF) * 0x11;
    let g = u32::from((rgb12 >> 4) & 0xF) * 0x11;
    let b = u32::from(rgb12 & 0xF) * 0x11;
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

/// Framebuffer pixel at a low-res column (left sub-pixel).
pub fn column_pixel(chipset: &Chipset, line: usize, column: usize) -> u32 {
    chipset.framebuffer().pixel(column * 2, line)
}
