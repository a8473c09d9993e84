//! Hold-and-modify colour.
//!
//! Each HAM pixel either loads a palette colour or keeps the previous
//! pixel's colour with one component replaced.
//!
//! HAM6 (6 planes): control in bits 4-5, 4-bit data.
//! HAM8 (8 planes, AGA): control in bits 0-1, 6-bit data.

use super::video::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HamMode {
    Ham6,
    Ham8,
}

/// What a pixel does to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HamOp {
    Load(u8),
    Blue(u8),
    Red(u8),
    Green(u8),
}

impl HamMode {
    /// Split a bitplane index into its control tag and data.
    #[must_use]
    pub fn decode(self, pixel: u8) -> HamOp {
        let (tag, data) = match self {
            Self::Ham6 => ((pixel >> 4) & 3, pixel & 0x0F),
            Self::Ham8 => (pixel & 3, pixel >> 2),
        };
        match tag {
            0 => HamOp::Load(data),
            1 => HamOp::Blue(data),
            2 => HamOp::Red(data),
            _ => HamOp::Green(data),
        }
    }

    /// Component value written by a modify op.
    fn component(self, data: u8, old: u8) -> u8 {
        match self {
            Self::Ham6 => (data & 0x0F) * 0x11,
            Self::Ham8 => ((data & 0x3F) << 2) | (old & 3),
        }
    }

    /// Apply one pixel to the accumulated 24-bit colour.
    #[must_use]
    pub fn apply(self, acc: u32, pixel: u8, palette: &Palette) -> u32 {
        let replace = |shift: u32, data: u8| {
            let old = ((acc >> shift) & 0xFF) as u8;
            (acc & !(0xFF << shift)) | (u32::from(self.component(data, old)) << shift)
        };
        match self.decode(pixel) {
            HamOp::Load(idx) => palette.rgb(usize::from(idx)),
            HamOp::Blue(d) => replace(0, d),
            HamOp::Red(d) => replace(16, d),
            HamOp::Green(d) => replace(8, d),
        }
    }
}
