//! Bitplane display state and the per-line fetch/serialise context.
//!
//! BPLCON0: HIRES(15) BPU(14-12) HAM(11) DBLPF(10) COLOR(9) BPU3(4)
//! BPLCON1: PF2H(7-4) PF1H(3-0)
//! BPLCON2: KILLEHB(9) PF2PRI(6) PF2P(5-3) PF1P(2-0)

use crate::agnus::beam::DisplayWindow;
use crate::agnus::bitplane_dma::{self, FetchWindow};
use crate::config::ChipRevision;
use crate::registers::RegisterFile;

use super::ham::HamMode;
use super::playfield;

const HIRES: u16 = 0x8000;
const HAM: u16 = 0x0800;
const DBLPF: u16 = 0x0400;
const BPU3: u16 = 0x0010;
const KILLEHB: u16 = 0x0200;

/// Where bitplane words come from. Agnus implements this over chip RAM.
pub trait PlaneSource {
    /// Fetch `words` words of `plane` left-aligned in a u64 and advance the
    /// plane's pointer.
    fn fetch(&mut self, plane: usize, words: usize) -> u64;
}

/// Display configuration latched from the registers. Re-derived only after
/// a display register write, not per pixel.
#[derive(Debug, Clone, Default)]
pub struct DisplayLatch {
    pub planes: usize,
    pub hires: bool,
    pub ham: Option<HamMode>,
    pub dual: bool,
    pub ehb: bool,
    /// Scroll delay in low-res pixels for the odd and even plane groups.
    pub delay: [u16; 2],
    pub fetch: FetchWindow,
    /// Words per bitplane fetch.
    pub fetch_width: usize,
    pub window: DisplayWindow,
    pub bplcon2: u16,
    pub bplcon3: u16,
    pub clxcon: u16,
    pub pf2_offset: usize,
}

impl DisplayLatch {
    #[must_use]
    pub fn derive(regs: &RegisterFile, revision: ChipRevision, diwhigh: Option<u16>) -> Self {
        let d = regs.display();
        let bplcon0 = d.bplcon0();
        let aga = revision == ChipRevision::Aga;

        let bpu = usize::from((bplcon0 >> 12) & 7);
        let planes = match (aga, bplcon0 & BPU3 != 0) {
            (true, true) => 8,
            (true, false) => bpu,
            (false, _) => bpu.min(6),
        };
        let hires = bplcon0 & HIRES != 0;
        let ham = (bplcon0 & HAM != 0).then_some(if planes == 8 {
            HamMode::Ham8
        } else {
            HamMode::Ham6
        });
        let dual = bplcon0 & DBLPF != 0;
        let killehb = aga && d.bplcon2() & KILLEHB != 0;
        let fetch_width = bitplane_dma::fetch_width(revision, d.fmode());

        Self {
            planes,
            hires,
            ham,
            dual,
            ehb: planes == 6 && ham.is_none() && !dual && !killehb,
            delay: [d.bplcon1() & 0xF, (d.bplcon1() >> 4) & 0xF],
            fetch: FetchWindow::decode(d.ddfstrt(), d.ddfstop(), hires, fetch_width),
            fetch_width: usize::from(fetch_width),
            window: DisplayWindow::decode(d.diwstrt(), d.diwstop(), diwhigh),
            bplcon2: d.bplcon2(),
            bplcon3: d.bplcon3(),
            clxcon: d.clxcon(),
            pf2_offset: if aga {
                playfield::pf2_offset(d.bplcon3())
            } else {
                8
            },
        }
    }

    /// Bit index into a group's plane data for a sub-pixel, negative before
    /// the first fetched bit.
    #[must_use]
    pub fn stream_bit(&self, column: u16, sub: u16, group: usize) -> i32 {
        let x = i32::from(column) - i32::from(self.fetch.start) - i32::from(self.delay[group]);
        if self.hires {
            x * 2 + i32::from(sub)
        } else {
            x
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PlaneGroup {
    /// Fetch units taken so far this line.
    fetched: usize,
    latched: [u64; 8],
}

/// Transient per-line fetch state. Odd planes (index 0, 2, 4, 6) and even
/// planes (1, 3, 5, 7) are fetched and scrolled as separate groups.
#[derive(Debug, Clone, Default)]
pub struct ScanlineFetchContext {
    groups: [PlaneGroup; 2],
}

impl ScanlineFetchContext {
    pub fn reset(&mut self) {
        self.groups = [PlaneGroup::default(); 2];
    }

    /// Assemble the pixel index at per-group stream positions `bits`,
    /// fetching more words as the positions reach new fetch units.
    pub fn pixel(
        &mut self,
        latch: &DisplayLatch,
        bits: [i32; 2],
        source: &mut impl PlaneSource,
    ) -> u8 {
        let fw = latch.fetch_width.max(1);
        let unit = 16 * fw as i32;
        let total = i32::from(latch.fetch.words) * 16;
        let mut index = 0u8;

        for (g, group) in self.groups.iter_mut().enumerate() {
            let b = bits[g];
            if b < 0 || b >= total {
                continue;
            }
            let chunk = (b / unit) as usize;
            while group.fetched <= chunk {
                for plane in (g..latch.planes).step_by(2) {
                    group.latched[plane] = source.fetch(plane, fw);
                }
                group.fetched += 1;
            }
            let offset = (b % unit) as u32;
            for plane in (g..latch.planes).step_by(2) {
                let bit = (group.latched[plane] >> (63 - offset)) & 1;
                index |= (bit as u8) << plane;
            }
        }
        index
    }

    /// Take whatever fetches the line has left so pointers end up where
    /// DMA would leave them.
    pub fn finish(&mut self, latch: &DisplayLatch, source: &mut impl PlaneSource) {
        let fw = latch.fetch_width.max(1);
        let units = usize::from(latch.fetch.words) / fw;
        for (g, group) in self.groups.iter_mut().enumerate() {
            while group.fetched < units {
                for plane in (g..latch.planes).step_by(2) {
                    group.latched[plane] = source.fetch(plane, fw);
                }
                group.fetched += 1;
            }
        }
    }
}
