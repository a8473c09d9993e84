//! Palette and framebuffer.

use crate::config::{ChipRevision, TICKS_PER_LINE};

/// Framebuffer width: two sub-pixels per low-res beam column.
pub const FB_WIDTH: usize = TICKS_PER_LINE as usize * 2;

/// Expand 12-bit RGB to 24-bit by nibble duplication.
#[must_use]
pub fn rgb12_to_rgb24(rgb12: u16) -> u32 {
    let r = u32::from((rgb12 >> 8) & 0xF);
    let g = u32::from((rgb12 >> 4) & 0xF);
    let b = u32::from(rgb12 & 0xF);
    ((r << 4 | r) << 16) | ((g << 4 | g) << 8) | (b << 4 | b)
}

#[must_use]
pub fn rgb24_to_argb32(rgb: u32) -> u32 {
    0xFF00_0000 | (rgb & 0x00FF_FFFF)
}

/// Colour registers.
///
/// OCS/ECS have 32 entries of 12 bits. AGA has 256 entries of 24 bits,
/// reached through the BPLCON3 bank select; a write with LOCT set updates
/// only the low nibbles.
#[derive(Debug, Clone)]
pub struct Palette {
    revision: ChipRevision,
    entries: [u32; 256],
}

const BANK_SHIFT: u16 = 13;
const LOCT: u16 = 0x0200;

impl Palette {
    #[must_use]
    pub fn new(revision: ChipRevision) -> Self {
        Self {
            revision,
            entries: [0; 256],
        }
    }

    /// COLORxx write, `n` in 0..32.
    pub fn write(&mut self, n: usize, value: u16, bplcon3: u16) {
        let n = n & 0x1F;
        if self.revision != ChipRevision::Aga {
            self.entries[n] = rgb12_to_rgb24(value);
            return;
        }
        let idx = usize::from(bplcon3 >> BANK_SHIFT) * 32 + n;
        let nibbles = rgb12_to_rgb24(value) & 0x0F0F0F;
        let old = self.entries[idx];
        self.entries[idx] = if bplcon3 & LOCT != 0 {
            (old & 0xF0F0F0) | nibbles
        } else {
            (nibbles << 4) | nibbles
        };
    }

    /// 24-bit colour of an entry.
    #[must_use]
    pub fn rgb(&self, idx: usize) -> u32 {
        let limit = if self.revision == ChipRevision::Aga {
            0xFF
        } else {
            0x1F
        };
        self.entries[idx & limit]
    }

    /// Extra-half-brite colour: entry `idx` at half intensity.
    ///
    /// OCS/ECS shift the 12-bit value, so each nibble halves before it is
    /// expanded (F becomes 77). AGA halves the full 8-bit components.
    #[must_use]
    pub fn half(&self, idx: usize) -> u32 {
        let rgb = self.rgb(idx);
        if self.revision == ChipRevision::Aga {
            return (rgb >> 1) & 0x7F7F7F;
        }
        let nibbles = (rgb >> 5) & 0x070707;
        (nibbles << 4) | nibbles
    }

    pub fn clear(&mut self) {
        self.entries = [0; 256];
    }
}

/// ARGB32 image, one row per raster line.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    height: usize,
    pixels: Vec<u32>,
}

impl Framebuffer {
    #[must_use]
    pub fn new(height: usize) -> Self {
        Self {
            height,
            pixels: vec![0xFF00_0000; FB_WIDTH * height],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        FB_WIDTH
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// One raster line, or an empty slice past the bottom.
    #[must_use]
    pub fn row(&self, y: usize) -> &[u32] {
        self.pixels
            .get(y * FB_WIDTH..(y + 1) * FB_WIDTH)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        if x >= FB_WIDTH || y >= self.height {
            return 0;
        }
        self.pixels[y * FB_WIDTH + x]
    }

    pub fn set(&mut self, x: usize, y: usize, argb: u32) {
        if x < FB_WIDTH && y < self.height {
            self.pixels[y * FB_WIDTH + x] = argb;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb12_expands_by_nibble() {
        assert_eq!(rgb24_to_argb32(rgb12_to_rgb24(0x000)), 0xFF00_0000);
        assert_eq!(rgb24_to_argb32(rgb12_to_rgb24(0xFFF)), 0xFFFF_FFFF);
        assert_eq!(rgb12_to_rgb24(0xF00), 0xFF0000);
    }

    #[test]
    fn ocs_palette_wraps_at_32() {
        let mut pal = Palette::new(ChipRevision::Ocs);
        pal.write(1, 0x0F80, 0xE000);
        assert_eq!(pal.rgb(1), 0xFF8800);
        assert_eq!(pal.rgb(33), 0xFF8800);
        assert_eq!(pal.half(1), 0x774400);
    }

    #[test]
    fn half_brite_by_revision() {
        let mut ocs = Palette::new(ChipRevision::Ecs);
        ocs.write(0, 0x0FFF, 0);
        ocs.write(1, 0x0123, 0);
        assert_eq!(ocs.half(0), 0x777777);
        assert_eq!(ocs.half(1), 0x001111);

        let mut aga = Palette::new(ChipRevision::Aga);
        aga.write(0, 0x0FFF, 0);
        assert_eq!(aga.half(0), 0x7F7F7F);
    }

    #[test]
    fn aga_bank_and_low_nibbles() {
        let mut pal = Palette::new(ChipRevision::Aga);
        pal.write(2, 0x0123, 0x2000);
        assert_eq!(pal.rgb(32 + 2), 0x112233);
        pal.write(2, 0x0ABC, 0x2000 | LOCT);
        assert_eq!(pal.rgb(32 + 2), 0x1A2B3C);
        assert_eq!(pal.rgb(2), 0);
    }

    #[test]
    fn framebuffer_bounds() {
        let mut fb = Framebuffer::new(4);
        fb.set(FB_WIDTH, 0, 1);
        fb.set(3, 3, 0x1234);
        assert_eq!(fb.pixel(3, 3), 0x1234);
        assert_eq!(fb.row(3).len(), FB_WIDTH);
        assert!(fb.row(4).is_empty());
    }
}
