//! Playfield compositing and sprite priority.
//!
//! In dual playfield mode odd planes (1, 3, 5, 7) form playfield 1 and even
//! planes (2, 4, 6, 8) form playfield 2. Plane numbers here are 1-based as
//! in the hardware manual; bit 0 of a pixel index is plane 1.

const PF2PRI: u16 = 0x0040;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playfield {
    Pf1,
    Pf2,
}

/// Resolved playfield output for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayfieldPixel {
    /// Palette index, 0 for background.
    pub index: usize,
    /// Playfield in front, `None` for background.
    pub front: Option<Playfield>,
}

/// Playfield 1 and 2 codes from an interleaved pixel index.
#[must_use]
pub fn split_dual(raw: u8) -> (u8, u8) {
    let mut pf1 = 0;
    let mut pf2 = 0;
    for bit in 0..4 {
        pf1 |= ((raw >> (bit * 2)) & 1) << bit;
        pf2 |= ((raw >> (bit * 2 + 1)) & 1) << bit;
    }
    (pf1, pf2)
}

/// Single playfield: the raw index, in front whenever non-zero.
#[must_use]
pub fn single(raw: usize) -> PlayfieldPixel {
    PlayfieldPixel {
        index: raw,
        front: (raw != 0).then_some(Playfield::Pf1),
    }
}

/// Dual playfield: the front non-transparent playfield wins. Playfield 2
/// colours start at `pf2_offset`.
#[must_use]
pub fn dual(raw: u8, bplcon2: u16, pf2_offset: usize) -> PlayfieldPixel {
    let (pf1, pf2) = split_dual(raw);
    let one = PlayfieldPixel {
        index: usize::from(pf1),
        front: Some(Playfield::Pf1),
    };
    let two = PlayfieldPixel {
        index: pf2_offset + usize::from(pf2),
        front: Some(Playfield::Pf2),
    };
    match (pf1 != 0, pf2 != 0) {
        (false, false) => PlayfieldPixel {
            index: 0,
            front: None,
        },
        (true, false) => one,
        (false, true) => two,
        (true, true) if bplcon2 & PF2PRI != 0 => two,
        (true, true) => one,
    }
}

/// AGA PF2OF: palette offset of playfield 2 from BPLCON3 bits 10-12.
#[must_use]
pub fn pf2_offset(bplcon3: u16) -> usize {
    match (bplcon3 >> 10) & 7 {
        0 => 0,
        n => 1 << n,
    }
}

/// PFxP places a playfield among the four sprite pairs; a pair numbered
/// below that position is in front. Values above 4 act as 4.
#[must_use]
pub fn sprite_in_front(pair: u8, playfield: Playfield, bplcon2: u16) -> bool {
    let pos = match playfield {
        Playfield::Pf1 => bplcon2 & 7,
        Playfield::Pf2 => (bplcon2 >> 3) & 7,
    }
    .min(4);
    u16::from(pair) < pos
}
