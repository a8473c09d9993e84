//! Sprite channels: position decode, serialisation and pair merging.
//!
//! Agnus fills a channel's data words (see `agnus::sprite_dma`); Denise
//! shifts them out from the channel's horizontal start, two bits (DATB, DATA)
//! per low-res pixel.
//!
//! SPRxPOS: SV7-SV0(15-8) SH8-SH1(7-0)
//! SPRxCTL: EV7-EV0(15-8) ATT(7) SV8(2) EV8(1) SH0(0)

/// Most word pairs one channel can hold per line (AGA 64-bit fetch).
pub const MAX_SPRITE_WORDS: usize = 4;

/// First palette entry used by sprites.
pub const SPRITE_PALETTE_BASE: u8 = 16;

/// Decode VSTART from POS/CTL.
#[must_use]
pub fn vstart(pos: u16, ctl: u16) -> u16 {
    (((ctl >> 2) & 1) << 8) | (pos >> 8)
}

/// Decode VSTOP from CTL.
#[must_use]
pub fn vstop(ctl: u16) -> u16 {
    (((ctl >> 1) & 1) << 8) | (ctl >> 8)
}

/// Decode HSTART (low-res pixels) from POS/CTL.
#[must_use]
pub fn hstart(pos: u16, ctl: u16) -> u16 {
    ((pos & 0xFF) << 1) | (ctl & 1)
}

/// Interleave DATB/DATA so each 2-bit code sits in the top bits in turn.
fn interleave(data: u16, datb: u16) -> u32 {
    let mut out = 0u32;
    for bit in (0..16).rev() {
        let lo = u32::from((data >> bit) & 1);
        let hi = u32::from((datb >> bit) & 1);
        out = (out << 2) | (hi << 1) | lo;
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct SpriteChannel {
    pub pos: u16,
    pub ctl: u16,
    /// Comparator armed: the channel draws at HSTART.
    armed: bool,
    /// Next DMA slot fetches POS/CTL instead of data.
    reload_pending: bool,
    /// CPU or copper wrote CTL since the last VSTOP.
    ctl_written: bool,
    data: [u16; MAX_SPRITE_WORDS],
    datb: [u16; MAX_SPRITE_WORDS],
    /// Word pairs held for this line.
    words: usize,
    shifter: u32,
    countdown: u8,
    consumed: usize,
}

impl SpriteChannel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reload_pending: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn vstart(&self) -> u16 {
        vstart(self.pos, self.ctl)
    }

    #[must_use]
    pub fn vstop(&self) -> u16 {
        vstop(self.ctl)
    }

    #[must_use]
    pub fn hstart(&self) -> u16 {
        hstart(self.pos, self.ctl)
    }

    /// ATTACH bit (meaningful on odd channels).
    #[must_use]
    pub fn attached(&self) -> bool {
        self.ctl & 0x0080 != 0
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    #[must_use]
    pub fn reload_pending(&self) -> bool {
        self.reload_pending
    }

    #[must_use]
    pub fn ctl_written(&self) -> bool {
        self.ctl_written
    }

    /// SPRxPOS write.
    pub fn write_pos(&mut self, value: u16) {
        self.pos = value;
    }

    /// SPRxCTL write: disarms the channel until DATA is written.
    pub fn write_ctl(&mut self, value: u16) {
        self.ctl = value;
        self.armed = false;
        self.ctl_written = true;
    }

    /// SPRxDATA write: arms the channel.
    pub fn write_data(&mut self, value: u16) {
        self.data[0] = value;
        self.words = self.words.max(1);
        self.armed = true;
    }

    /// SPRxDATB write.
    pub fn write_datb(&mut self, value: u16) {
        self.datb[0] = value;
        self.words = self.words.max(1);
    }

    /// Position/control words fetched by DMA.
    pub fn reload(&mut self, pos: u16, ctl: u16) {
        self.pos = pos;
        self.ctl = ctl;
        self.armed = false;
        self.reload_pending = false;
    }

    /// VSTART reached.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// VSTOP reached: drop data and fetch new control words next time.
    pub fn stop(&mut self) {
        self.armed = false;
        self.data = [0; MAX_SPRITE_WORDS];
        self.datb = [0; MAX_SPRITE_WORDS];
        self.words = 0;
        self.reload_pending = true;
        self.ctl_written = false;
    }

    /// Image words fetched by DMA for this line.
    pub fn load_line(&mut self, data: &[u16], datb: &[u16]) {
        let n = data.len().min(datb.len()).min(MAX_SPRITE_WORDS);
        self.data[..n].copy_from_slice(&data[..n]);
        self.datb[..n].copy_from_slice(&datb[..n]);
        self.words = n;
        self.consumed = 0;
    }

    /// DMA reset: back to reload-pending, in-flight output discarded.
    pub fn reset_dma(&mut self) {
        self.armed = false;
        self.reload_pending = true;
        self.ctl_written = false;
        self.shifter = 0;
        self.countdown = 0;
        self.consumed = 0;
    }

    /// Start-of-line: a line never inherits a half-shifted sprite.
    pub fn begin_line(&mut self) {
        self.shifter = 0;
        self.countdown = 0;
        self.consumed = 0;
    }

    /// Advance one low-res pixel and return the 2-bit colour code.
    pub fn shift_pixel(&mut self, column: u16) -> u8 {
        if self.countdown == 0 {
            if !self.armed || self.words == 0 || column != self.hstart() {
                return 0;
            }
            self.shifter = interleave(self.data[0], self.datb[0]);
            self.countdown = 16;
            self.consumed = 1;
        }
        let code = (self.shifter >> 30) as u8;
        self.shifter <<= 2;
        self.countdown -= 1;
        if self.countdown == 0 && self.consumed < self.words {
            self.shifter = interleave(self.data[self.consumed], self.datb[self.consumed]);
            self.countdown = 16;
            self.consumed += 1;
        }
        code
    }
}

/// Merged sprite output for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpritePixel {
    /// Palette index, 0 when transparent.
    pub color: u8,
    /// Pair (0-3) that produced `color`.
    pub pair: u8,
    /// One bit per channel with a non-zero code.
    pub present: u8,
}

impl SpritePixel {
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.color != 0
    }

    /// One bit per pair with any non-zero channel.
    #[must_use]
    pub fn pair_mask(&self) -> u8 {
        (0..4).fold(0, |m, pair| {
            if self.present & (0b11 << (pair * 2)) != 0 {
                m | (1 << pair)
            } else {
                m
            }
        })
    }
}

/// Merge eight 2-bit channel codes. The lowest-numbered pair wins; an odd
/// channel with ATTACH set combines with its even partner into a 4-bit code.
#[must_use]
pub fn combine(codes: &[u8; 8], attached: &[bool; 8]) -> SpritePixel {
    let present = codes
        .iter()
        .enumerate()
        .fold(0u8, |m, (i, &c)| if c != 0 { m | (1 << i) } else { m });
    let mut out = SpritePixel {
        present,
        ..SpritePixel::default()
    };
    for pair in 0..4 {
        let even = codes[pair * 2];
        let odd = codes[pair * 2 + 1];
        let color = if attached[pair * 2 + 1] {
            let code = (odd << 2) | even;
            if code == 0 { 0 } else { SPRITE_PALETTE_BASE + code }
        } else if even != 0 {
            SPRITE_PALETTE_BASE + pair as u8 * 4 + even
        } else if odd != 0 {
            SPRITE_PALETTE_BASE + pair as u8 * 4 + odd
        } else {
            0
        };
        if color != 0 {
            out.color = color;
            out.pair = pair as u8;
            break;
        }
    }
    out
}
