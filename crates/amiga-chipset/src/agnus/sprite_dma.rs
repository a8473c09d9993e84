//! Sprite DMA: per-line reload and fetch for the eight sprite channels.
//!
//! Each channel owns two DMA slots at the start of a line, sprite n at
//! $15 + 4n and $17 + 4n. When the bitplane fetch window opens early those
//! slots go to bitplanes and the high channels lose their DMA.
//!
//! With a fetch width of N words, POS and CTL each occupy N words in memory
//! and each image line is N DATA words followed by N DATB words.

use emu_core::ChipBus;

use crate::config::ChipRevision;
use crate::custom_regs::sprpt;
use crate::denise::sprites::{MAX_SPRITE_WORDS, SpriteChannel};
use crate::registers::RegisterFile;

/// Sprite channels with DMA this line, given the bitplane fetch start.
#[must_use]
pub fn slot_limit(bitplane_dma: bool, ddfstrt: u16) -> usize {
    if !bitplane_dma {
        return 8;
    }
    let start = ddfstrt & 0xFC;
    (0..8u16).take_while(|n| 0x17 + 4 * n < start).count()
}

/// Words per sprite fetch from FMODE SPR32/SPAGEM.
#[must_use]
pub fn fetch_width(revision: ChipRevision, fmode: u16) -> usize {
    if revision != ChipRevision::Aga {
        return 1;
    }
    match (fmode >> 2) & 3 {
        0 => 1,
        1 | 2 => 2,
        _ => 4,
    }
}

/// Inputs for one line of sprite DMA.
#[derive(Debug, Clone, Copy)]
pub struct SpriteDmaLine {
    pub line: u16,
    /// DMAEN and SPREN both set.
    pub dma: bool,
    /// Channels 0..limit get DMA slots.
    pub limit: usize,
    /// Words per fetch (1, 2 or 4).
    pub width: usize,
}

/// Run sprite DMA for one line. Returns how many channels fetched image data.
pub fn run_line(
    channels: &mut [SpriteChannel; 8],
    regs: &mut RegisterFile,
    bus: &impl ChipBus,
    line: &SpriteDmaLine,
) -> usize {
    let width = line.width.clamp(1, MAX_SPRITE_WORDS);
    let stride = 2 * width as u32;
    let mut live = 0;

    for (n, ch) in channels.iter_mut().enumerate() {
        ch.begin_line();
        if !line.dma || n >= line.limit {
            continue;
        }

        let mut ptr = regs.long(sprpt(n));
        if ch.reload_pending() && !ch.ctl_written() {
            let pos = bus.read_word(ptr);
            let ctl = bus.read_word(ptr.wrapping_add(stride));
            ptr = ptr.wrapping_add(2 * stride);
            ch.reload(pos, ctl);
        }

        if line.line == ch.vstart() {
            ch.arm();
        }
        if line.line == ch.vstop() {
            ch.stop();
        }

        if ch.is_armed() {
            let mut data = [0u16; MAX_SPRITE_WORDS];
            let mut datb = [0u16; MAX_SPRITE_WORDS];
            for i in 0..width {
                data[i] = bus.read_word(ptr.wrapping_add(2 * i as u32));
                datb[i] = bus.read_word(ptr.wrapping_add(stride + 2 * i as u32));
            }
            ptr = ptr.wrapping_add(2 * stride);
            ch.load_line(&data[..width], &datb[..width]);
            live += 1;
        }

        regs.set_long(sprpt(n), ptr);
    }
    live
}
