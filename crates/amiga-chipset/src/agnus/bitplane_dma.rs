//! Bitplane DMA: fetch window, plane fetches and end-of-line modulos.

use emu_core::ChipBus;

use crate::config::ChipRevision;
use crate::custom_regs::bplpt;
use crate::denise::bitplanes::PlaneSource;
use crate::registers::RegisterFile;

/// Low-res pixels between a fetch at DDFSTRT and its first displayed pixel.
pub const LORES_FETCH_DELAY: u16 = 17;
pub const HIRES_FETCH_DELAY: u16 = 9;

/// Words per bitplane fetch from FMODE BPL32/BPAGEM.
#[must_use]
pub fn fetch_width(revision: ChipRevision, fmode: u16) -> u16 {
    if revision != ChipRevision::Aga {
        return 1;
    }
    match fmode & 3 {
        0 => 1,
        1 | 2 => 2,
        _ => 4,
    }
}

/// Where a line's bitplane data lands on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchWindow {
    /// First display column (low-res pixels).
    pub start: u16,
    /// Width in low-res pixels.
    pub width: u16,
    /// Words fetched per plane per line.
    pub words: u16,
}

impl FetchWindow {
    /// Decode DDFSTRT/DDFSTOP. Lowres fetches a word every 8 colour clocks,
    /// hires every 4; the word count rounds up to the fetch width.
    #[must_use]
    pub fn decode(ddfstrt: u16, ddfstop: u16, hires: bool, fetch_width: u16) -> Self {
        let strt = ddfstrt & 0xFC;
        let stop = ddfstop & 0xFC;
        if stop < strt {
            return Self::default();
        }
        let span = stop - strt;
        let words = if hires { span / 4 + 2 } else { span / 8 + 1 };
        let fw = fetch_width.max(1);
        let words = words.div_ceil(fw) * fw;
        let delay = if hires {
            HIRES_FETCH_DELAY
        } else {
            LORES_FETCH_DELAY
        };
        let width = if hires { words * 8 } else { words * 16 };
        Self {
            start: strt * 2 + delay,
            width,
            words,
        }
    }
}

/// Bitplane fetches straight from chip RAM, advancing BPLxPT.
pub struct PlaneFetcher<'a, B: ChipBus> {
    regs: &'a mut RegisterFile,
    bus: &'a B,
}

impl<'a, B: ChipBus> PlaneFetcher<'a, B> {
    pub fn new(regs: &'a mut RegisterFile, bus: &'a B) -> Self {
        Self { regs, bus }
    }
}

impl<B: ChipBus> PlaneSource for PlaneFetcher<'_, B> {
    fn fetch(&mut self, plane: usize, words: usize) -> u64 {
        let mut ptr = self.regs.long(bplpt(plane));
        let mut out = 0u64;
        for i in 0..words.min(4) {
            out |= u64::from(self.bus.read_word(ptr)) << (48 - 16 * i);
            ptr = ptr.wrapping_add(2);
        }
        self.regs.set_long(bplpt(plane), ptr);
        out
    }
}

/// Add BPL1MOD to odd planes and BPL2MOD to even planes.
pub fn apply_modulos(regs: &mut RegisterFile, planes: usize) {
    for plane in 0..planes.min(8) {
        let ptr = regs.display().plane_pointer(plane);
        let modulo = i32::from(regs.display().plane_modulo(plane));
        regs.set_long(bplpt(plane), ptr.wrapping_add_signed(modulo));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_regs as regs;
    use emu_core::WordRam;

    #[test]
    fn standard_lowres_window() {
        let w = FetchWindow::decode(0x38, 0xD0, false, 1);
        assert_eq!(w.words, 20);
        assert_eq!(w.start, 0x81);
        assert_eq!(w.width, 320);
    }

    #[test]
    fn standard_hires_window() {
        let w = FetchWindow::decode(0x3C, 0xD4, true, 1);
        assert_eq!(w.words, 40);
        assert_eq!(w.start, 0x81);
        assert_eq!(w.width, 320);
    }

    #[test]
    fn wide_fetch_rounds_words() {
        let w = FetchWindow::decode(0x38, 0xD0, false, 4);
        assert_eq!(w.words, 20);
        let w = FetchWindow::decode(0x38, 0xC8, false, 4);
        assert_eq!(w.words, 20);
    }

    #[test]
    fn inverted_window_is_empty() {
        assert_eq!(FetchWindow::decode(0xD0, 0x38, false, 1).words, 0);
    }

    #[test]
    fn fetch_advances_pointer() {
        let mut ram = WordRam::new(0x8_0000);
        ram.load_words(0x3000, &[0x1234, 0x5678]);
        let mut file = RegisterFile::new(0x07_FFFE);
        file.set_long(bplpt(2), 0x3000);
        let mut f = PlaneFetcher::new(&mut file, &ram);
        assert_eq!(f.fetch(2, 2), 0x1234_5678_0000_0000);
        assert_eq!(file.display().plane_pointer(2), 0x3004);
    }

    #[test]
    fn modulos_alternate_by_plane() {
        let mut file = RegisterFile::new(0x07_FFFE);
        file.set_long(bplpt(0), 0x1000);
        file.set_long(bplpt(1), 0x2000);
        file.store(regs::BPL1MOD, 40);
        file.store(regs::BPL2MOD, 0xFFFE);
        apply_modulos(&mut file, 2);
        assert_eq!(file.display().plane_pointer(0), 0x1028);
        assert_eq!(file.display().plane_pointer(1), 0x1FFE);
    }
}
