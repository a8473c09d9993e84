//! Denise: video output.
//!
//! Denise takes bitplane data from Agnus, serialises it pixel by pixel,
//! merges the sprites and looks up colours in the palette to produce the
//! framebuffer. A line is rendered lazily: the chipset asks for columns up
//! to the beam before any display register changes, and for the rest of the
//! line at its end.

pub mod bitplanes;
pub mod collision;
pub mod ham;
pub mod playfield;
pub mod sprites;
pub mod video;

use crate::config::{ChipRevision, TICKS_PER_LINE};
use crate::registers::RegisterFile;

use bitplanes::{DisplayLatch, PlaneSource, ScanlineFetchContext};
use playfield::Playfield;
use sprites::{SpriteChannel, SpritePixel, combine};
use video::{Framebuffer, Palette, rgb24_to_argb32};

pub use video::FB_WIDTH;

/// Beam columns per line, in low-res pixels.
pub const COLUMNS: u16 = TICKS_PER_LINE as u16;

pub struct Denise {
    revision: ChipRevision,
    pub palette: Palette,
    pub sprites: [SpriteChannel; 8],
    latch: DisplayLatch,
    latch_dirty: bool,
    fetch: ScanlineFetchContext,
    framebuffer: Framebuffer,
    line: u16,
    /// Next column to render on the current line.
    cursor: u16,
    bitplane_dma: bool,
    clxdat: u16,
    /// HAM colour accumulator (24-bit).
    ham: u32,
}

impl Denise {
    #[must_use]
    pub fn new(revision: ChipRevision, lines: u16) -> Self {
        Self {
            revision,
            palette: Palette::new(revision),
            sprites: std::array::from_fn(|_| SpriteChannel::new()),
            latch: DisplayLatch::default(),
            latch_dirty: true,
            fetch: ScanlineFetchContext::default(),
            framebuffer: Framebuffer::new(usize::from(lines)),
            line: 0,
            cursor: COLUMNS,
            bitplane_dma: false,
            clxdat: 0,
            ham: 0,
        }
    }

    /// Power-on state. The framebuffer keeps its last image.
    pub fn reset(&mut self) {
        self.palette.clear();
        for ch in &mut self.sprites {
            *ch = SpriteChannel::new();
        }
        self.latch = DisplayLatch::default();
        self.latch_dirty = true;
        self.fetch.reset();
        self.cursor = COLUMNS;
        self.clxdat = 0;
        self.ham = 0;
    }

    /// A display register changed; re-derive the latch before the next pixel.
    pub fn invalidate(&mut self) {
        self.latch_dirty = true;
    }

    pub fn sync_latch(&mut self, regs: &RegisterFile, diwhigh: Option<u16>) {
        if self.latch_dirty {
            self.latch = DisplayLatch::derive(regs, self.revision, diwhigh);
            self.latch_dirty = false;
        }
    }

    #[must_use]
    pub fn latch(&self) -> &DisplayLatch {
        &self.latch
    }

    /// Start rendering raster line `line`.
    pub fn begin_line(&mut self, line: u16, bitplane_dma: bool) {
        self.line = line;
        self.cursor = 0;
        self.bitplane_dma = bitplane_dma;
        self.fetch.reset();
    }

    /// Bitplane DMA runs on this line.
    #[must_use]
    pub fn line_active(&self) -> bool {
        self.bitplane_dma && self.latch.planes > 0 && self.latch.window.contains_line(self.line)
    }

    /// Render columns up to (not including) `column`.
    pub fn render_to(&mut self, column: u16, source: &mut impl PlaneSource) {
        let end = column.min(COLUMNS);
        while self.cursor < end {
            self.render_column(self.cursor, source);
            self.cursor += 1;
        }
    }

    /// Finish the line. Returns true when bitplane DMA ran, so the caller
    /// adds the modulos.
    pub fn end_line(&mut self, source: &mut impl PlaneSource) -> bool {
        self.render_to(COLUMNS, source);
        let active = self.line_active();
        if active {
            self.fetch.finish(&self.latch, source);
        }
        active
    }

    fn render_column(&mut self, column: u16, source: &mut impl PlaneSource) {
        let codes: [u8; 8] = std::array::from_fn(|n| self.sprites[n].shift_pixel(column));
        let attached: [bool; 8] = std::array::from_fn(|n| n & 1 == 1 && self.sprites[n].attached());
        let sprite = combine(&codes, &attached);

        let y = usize::from(self.line);
        let x = usize::from(column) * 2;
        let visible = self.latch.window.contains_line(self.line)
            && self.latch.window.contains_column(column);
        if !visible {
            let border = rgb24_to_argb32(self.palette.rgb(0));
            self.framebuffer.set(x, y, border);
            self.framebuffer.set(x + 1, y, border);
            return;
        }

        let active = self.line_active();
        for sub in 0..2u16 {
            let raw = if active {
                let bits = [
                    self.latch.stream_bit(column, sub, 0),
                    self.latch.stream_bit(column, sub, 1),
                ];
                self.fetch.pixel(&self.latch, bits, source)
            } else {
                0
            };
            if sub == 0 {
                let groups = collision::sprite_groups(sprite.present, self.latch.clxcon);
                self.clxdat |= collision::collision_bits(self.latch.clxcon, raw, groups);
            }
            let rgb = self.resolve(raw, sprite);
            self.framebuffer
                .set(x + usize::from(sub), y, rgb24_to_argb32(rgb));
        }
    }

    /// Final 24-bit colour of one sub-pixel.
    fn resolve(&mut self, raw: u8, sprite: SpritePixel) -> u32 {
        let latch = &self.latch;
        let (rgb, front) = if let Some(mode) = latch.ham {
            self.ham = mode.apply(self.ham, raw, &self.palette);
            (self.ham, (raw != 0).then_some(Playfield::Pf1))
        } else if latch.dual {
            let px = playfield::dual(raw, latch.bplcon2, latch.pf2_offset);
            (self.palette.rgb(px.index), px.front)
        } else {
            let px = playfield::single(usize::from(raw));
            let rgb = if latch.ehb && px.index >= 32 {
                self.palette.half(px.index - 32)
            } else {
                self.palette.rgb(px.index)
            };
            (rgb, px.front)
        };

        let sprite_wins = sprite.is_opaque()
            && front.is_none_or(|pf| playfield::sprite_in_front(sprite.pair, pf, latch.bplcon2));
        if sprite_wins {
            self.palette.rgb(usize::from(sprite.color))
        } else {
            rgb
        }
    }

    /// COLORxx write.
    pub fn write_color(&mut self, n: usize, value: u16, bplcon3: u16) {
        self.palette.write(n, value, bplcon3);
    }

    /// CLXDAT read: returns the latched bits and clears them.
    pub fn read_clxdat(&mut self) -> u16 {
        let value = self.clxdat | 0x8000;
        self.clxdat = 0;
        value
    }

    /// CLXDAT without clearing.
    #[must_use]
    pub fn peek_clxdat(&self) -> u16 {
        self.clxdat | 0x8000
    }

    #[must_use]
    pub fn ham_color(&self) -> u32 {
        self.ham
    }

    #[must_use]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }
}
