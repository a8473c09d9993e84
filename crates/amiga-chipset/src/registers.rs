//! The custom register file.
//!
//! A flat store of 256 word slots, kept flat so the whole chip state can be
//! dumped for debugging. Call sites go through the named views
//! ([`BlitterRegs`], [`CopperRegs`], [`DisplayRegs`], [`SpriteRegs`]) rather
//! than raw offsets.

use crate::custom_regs::{
    self as regs, DmaCon, IntBits, RegisterKind, is_modulo, register_kind, set_clr_write,
};

/// Compose a 32-bit pointer from its two register halves.
#[must_use]
pub const fn make_long(hi: u16, lo: u16) -> u32 {
    ((hi as u32) << 16) | lo as u32
}

/// Split a 32-bit pointer into (high, low) register halves.
#[must_use]
pub const fn split_long(value: u32) -> (u16, u16) {
    ((value >> 16) as u16, value as u16)
}

const fn slot(offset: u16) -> usize {
    ((offset & 0x1FE) >> 1) as usize
}

#[derive(Debug, Clone)]
pub struct RegisterFile {
    slots: [u16; 256],
    chip_mask: u32,
}

impl RegisterFile {
    /// `chip_mask` is applied to every pointer the file composes or stores.
    #[must_use]
    pub fn new(chip_mask: u32) -> Self {
        Self {
            slots: [0; 256],
            chip_mask,
        }
    }

    #[must_use]
    pub fn chip_mask(&self) -> u32 {
        self.chip_mask
    }

    /// Store a bus write according to the register's classification.
    ///
    /// Returns the kind so the caller can dispatch side effects. Read-only
    /// and strobe registers leave the store untouched.
    pub fn store(&mut self, offset: u16, value: u16) -> RegisterKind {
        let kind = register_kind(offset);
        let s = slot(offset);
        match kind {
            RegisterKind::ReadOnly | RegisterKind::Strobe => {}
            RegisterKind::SetClear => {
                let mut v = self.slots[s];
                set_clr_write(&mut v, value);
                if offset & 0x1FE == regs::DMACON {
                    v &= DmaCon::WRITABLE.bits();
                }
                self.slots[s] = v;
            }
            RegisterKind::PointerHigh => {
                self.slots[s] = value & (self.chip_mask >> 16) as u16;
            }
            RegisterKind::PointerLow => self.slots[s] = value & 0xFFFE,
            RegisterKind::ReadWrite if is_modulo(offset) => self.slots[s] = value & 0xFFFE,
            RegisterKind::ReadWrite => self.slots[s] = value,
        }
        kind
    }

    /// Raw slot contents, bypassing classification.
    #[must_use]
    pub fn raw(&self, offset: u16) -> u16 {
        self.slots[slot(offset)]
    }

    /// Overwrite a slot directly. Used by the chips for status and write-back.
    pub fn poke(&mut self, offset: u16, value: u16) {
        self.slots[slot(offset)] = value;
    }

    /// Pointer held in the pair starting at `hi_offset`.
    #[must_use]
    pub fn long(&self, hi_offset: u16) -> u32 {
        make_long(self.raw(hi_offset), self.raw(hi_offset + 2)) & self.chip_mask
    }

    /// Write a pointer pair, masked to chip RAM.
    pub fn set_long(&mut self, hi_offset: u16, value: u32) {
        let (hi, lo) = split_long(value & self.chip_mask);
        self.poke(hi_offset, hi);
        self.poke(hi_offset + 2, lo);
    }

    /// Every slot, indexed by offset / 2.
    #[must_use]
    pub fn dump(&self) -> &[u16; 256] {
        &self.slots
    }

    #[must_use]
    pub fn dmacon(&self) -> DmaCon {
        DmaCon::from_bits_truncate(self.raw(regs::DMACON))
    }

    #[must_use]
    pub fn intena(&self) -> IntBits {
        IntBits::from_bits_truncate(self.raw(regs::INTENA))
    }

    #[must_use]
    pub fn intreq(&self) -> IntBits {
        IntBits::from_bits_truncate(self.raw(regs::INTREQ))
    }

    /// Raise or drop interrupt request bits without the set/clear protocol.
    pub fn set_intreq_bits(&mut self, bits: IntBits, on: bool) {
        let mut v = self.intreq();
        v.set(bits, on);
        self.poke(regs::INTREQ, v.bits() & 0x7FFF);
    }

    #[must_use]
    pub fn blitter(&self) -> BlitterRegs<'_> {
        BlitterRegs(self)
    }

    #[must_use]
    pub fn copper(&self) -> CopperRegs<'_> {
        CopperRegs(self)
    }

    #[must_use]
    pub fn display(&self) -> DisplayRegs<'_> {
        DisplayRegs(self)
    }

    #[must_use]
    pub fn sprite(&self, n: usize) -> SpriteRegs<'_> {
        SpriteRegs { file: self, n }
    }
}

/// Blitter view of the register file.
#[derive(Clone, Copy)]
pub struct BlitterRegs<'a>(&'a RegisterFile);

impl BlitterRegs<'_> {
    #[must_use]
    pub fn control0(&self) -> u16 {
        self.0.raw(regs::BLTCON0)
    }
    #[must_use]
    pub fn control1(&self) -> u16 {
        self.0.raw(regs::BLTCON1)
    }
    #[must_use]
    pub fn first_word_mask(&self) -> u16 {
        self.0.raw(regs::BLTAFWM)
    }
    #[must_use]
    pub fn last_word_mask(&self) -> u16 {
        self.0.raw(regs::BLTALWM)
    }
    /// Pointer for channel 0..=3 (A, B, C, D).
    #[must_use]
    pub fn pointer(&self, channel: usize) -> u32 {
        self.0.long(BLITTER_POINTERS[channel])
    }
    /// Modulo for channel 0..=3 (A, B, C, D), sign-extended.
    #[must_use]
    pub fn modulo(&self, channel: usize) -> i16 {
        self.0.raw(BLITTER_MODULOS[channel]) as i16
    }
    /// Data latch for channel 0..=2 (A, B, C).
    #[must_use]
    pub fn data(&self, channel: usize) -> u16 {
        self.0.raw(BLITTER_DATA[channel])
    }
}

/// Pointer register per blitter channel A, B, C, D.
pub const BLITTER_POINTERS: [u16; 4] = [regs::BLTAPTH, regs::BLTBPTH, regs::BLTCPTH, regs::BLTDPTH];
/// Modulo register per blitter channel A, B, C, D.
pub const BLITTER_MODULOS: [u16; 4] = [regs::BLTAMOD, regs::BLTBMOD, regs::BLTCMOD, regs::BLTDMOD];
/// Data latch per source channel A, B, C.
pub const BLITTER_DATA: [u16; 3] = [regs::BLTADAT, regs::BLTBDAT, regs::BLTCDAT];

/// Copper view of the register file.
#[derive(Clone, Copy)]
pub struct CopperRegs<'a>(&'a RegisterFile);

impl CopperRegs<'_> {
    #[must_use]
    pub fn list1(&self) -> u32 {
        self.0.long(regs::COP1LCH)
    }
    #[must_use]
    pub fn list2(&self) -> u32 {
        self.0.long(regs::COP2LCH)
    }
    /// COPCON CDANG: copper may write the blitter registers.
    #[must_use]
    pub fn danger(&self) -> bool {
        self.0.raw(regs::COPCON) & 0x0002 != 0
    }
}

/// Display (bitplane and window) view of the register file.
#[derive(Clone, Copy)]
pub struct DisplayRegs<'a>(&'a RegisterFile);

impl DisplayRegs<'_> {
    #[must_use]
    pub fn bplcon0(&self) -> u16 {
        self.0.raw(regs::BPLCON0)
    }
    #[must_use]
    pub fn bplcon1(&self) -> u16 {
        self.0.raw(regs::BPLCON1)
    }
    #[must_use]
    pub fn bplcon2(&self) -> u16 {
        self.0.raw(regs::BPLCON2)
    }
    #[must_use]
    pub fn bplcon3(&self) -> u16 {
        self.0.raw(regs::BPLCON3)
    }
    #[must_use]
    pub fn diwstrt(&self) -> u16 {
        self.0.raw(regs::DIWSTRT)
    }
    #[must_use]
    pub fn diwstop(&self) -> u16 {
        self.0.raw(regs::DIWSTOP)
    }
    #[must_use]
    pub fn ddfstrt(&self) -> u16 {
        self.0.raw(regs::DDFSTRT)
    }
    #[must_use]
    pub fn ddfstop(&self) -> u16 {
        self.0.raw(regs::DDFSTOP)
    }
    #[must_use]
    pub fn clxcon(&self) -> u16 {
        self.0.raw(regs::CLXCON)
    }
    #[must_use]
    pub fn fmode(&self) -> u16 {
        self.0.raw(regs::FMODE)
    }
    /// Fetch pointer of bitplane `n` (0-based).
    #[must_use]
    pub fn plane_pointer(&self, n: usize) -> u32 {
        self.0.long(regs::bplpt(n))
    }
    /// Modulo applied to plane `n`: BPL1MOD for odd planes, BPL2MOD for even.
    #[must_use]
    pub fn plane_modulo(&self, n: usize) -> i16 {
        let reg = if n % 2 == 0 { regs::BPL1MOD } else { regs::BPL2MOD };
        self.0.raw(reg) as i16
    }
}

/// One sprite channel's registers.
#[derive(Clone, Copy)]
pub struct SpriteRegs<'a> {
    file: &'a RegisterFile,
    n: usize,
}

impl SpriteRegs<'_> {
    #[must_use]
    pub fn pointer(&self) -> u32 {
        self.file.long(regs::sprpt(self.n))
    }
    #[must_use]
    pub fn pos(&self) -> u16 {
        self.file.raw(regs::sprpos(self.n))
    }
    #[must_use]
    pub fn ctl(&self) -> u16 {
        self.file.raw(regs::sprpos(self.n) + 2)
    }
}
