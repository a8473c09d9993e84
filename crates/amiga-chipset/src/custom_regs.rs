//! Custom chip register offsets, flag types and classification.
//!
//! Custom registers live at $DFF000-$DFF1FF. Offsets here are relative to
//! $DFF000. Every offset has a fixed classification that decides how a write
//! lands in the register file.

use bitflags::bitflags;

/// Apply SET/CLR write logic used by DMACON, INTENA, INTREQ, ADKCON.
///
/// Bit 15 determines set (1) or clear (0) mode for bits 0-14.
pub fn set_clr_write(reg: &mut u16, val: u16) {
    if val & 0x8000 != 0 {
        *reg |= val & 0x7FFF;
    } else {
        *reg &= !(val & 0x7FFF);
    }
}

bitflags! {
    /// DMACON write bits and DMACONR status bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DmaCon: u16 {
        const AUD0 = 1 << 0;
        const AUD1 = 1 << 1;
        const AUD2 = 1 << 2;
        const AUD3 = 1 << 3;
        const DSK = 1 << 4;
        const SPR = 1 << 5;
        const BLT = 1 << 6;
        const COP = 1 << 7;
        const BPL = 1 << 8;
        /// Master enable for every DMA channel.
        const MASTER = 1 << 9;
        /// Blitter takes every bus cycle it wants ("nasty" mode).
        const BLTPRI = 1 << 10;
        /// Read-only: last blit produced no set bits.
        const BZERO = 1 << 13;
        /// Read-only: blitter busy.
        const BBUSY = 1 << 14;
        const SETCLR = 1 << 15;
    }
}

impl DmaCon {
    /// Bits a DMACON write may change.
    pub const WRITABLE: Self = Self::from_bits_truncate(0x07FF);

    /// True if the master enable and every bit of `channel` are set.
    #[must_use]
    pub fn live(self, channel: Self) -> bool {
        self.contains(Self::MASTER | channel)
    }
}

bitflags! {
    /// INTENA / INTREQ bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IntBits: u16 {
        const TBE = 1 << 0;
        const DSKBLK = 1 << 1;
        const SOFT = 1 << 2;
        /// CIA-A.
        const PORTS = 1 << 3;
        const COPER = 1 << 4;
        const VERTB = 1 << 5;
        const BLIT = 1 << 6;
        const AUD0 = 1 << 7;
        const AUD1 = 1 << 8;
        const AUD2 = 1 << 9;
        const AUD3 = 1 << 10;
        const RBF = 1 << 11;
        const DSKSYN = 1 << 12;
        /// CIA-B.
        const EXTER = 1 << 13;
        /// INTENA master enable.
        const INTEN = 1 << 14;
        const SETCLR = 1 << 15;
    }
}

/// CPU interrupt priority level for the current enable/request pair.
#[must_use]
pub fn interrupt_level(intena: IntBits, intreq: IntBits) -> u8 {
    if !intena.contains(IntBits::INTEN) {
        return 0;
    }
    let active = (intena & intreq).bits() & 0x3FFF;
    if active & 0x2000 != 0 {
        6
    } else if active & 0x1800 != 0 {
        5
    } else if active & 0x0780 != 0 {
        4
    } else if active & 0x0070 != 0 {
        3
    } else if active & 0x0008 != 0 {
        2
    } else if active & 0x0007 != 0 {
        1
    } else {
        0
    }
}

/// How a register slot behaves on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// Status, beam and latch registers. Writes are ignored; reads are live.
    ReadOnly,
    /// Plain storage.
    ReadWrite,
    /// The write itself is the event; the value is discarded.
    Strobe,
    /// Bit 15 selects set or clear of bits 0-14.
    SetClear,
    /// Top half of a DMA pointer, masked to chip RAM.
    PointerHigh,
    /// Bottom half of a DMA pointer, word aligned.
    PointerLow,
}

/// Classification of a register offset.
#[must_use]
pub fn register_kind(offset: u16) -> RegisterKind {
    let offset = offset & 0x1FE;
    match offset {
        0x000..=0x01E | DENISEID => RegisterKind::ReadOnly,
        COPJMP1 | COPJMP2 | STREQU | STRVBL | STRHOR | STRLONG | NO_OP => RegisterKind::Strobe,
        DMACON | INTENA | INTREQ | ADKCON => RegisterKind::SetClear,
        DSKPTH | BLTCPTH | BLTBPTH | BLTAPTH | BLTDPTH | COP1LCH | COP2LCH => {
            RegisterKind::PointerHigh
        }
        DSKPTL | BLTCPTL | BLTBPTL | BLTAPTL | BLTDPTL | COP1LCL | COP2LCL => {
            RegisterKind::PointerLow
        }
        // AUDxLC at the start of each 16-byte audio block.
        0x0A0..=0x0DE if offset & 0x0F == 0x00 => RegisterKind::PointerHigh,
        0x0A0..=0x0DE if offset & 0x0F == 0x02 => RegisterKind::PointerLow,
        BPL1PTH..=0x0FE | SPR0PTH..=0x13E => {
            if offset & 2 == 0 {
                RegisterKind::PointerHigh
            } else {
                RegisterKind::PointerLow
            }
        }
        _ => RegisterKind::ReadWrite,
    }
}

/// True for the modulo registers, whose bit 0 is not implemented.
#[must_use]
pub fn is_modulo(offset: u16) -> bool {
    matches!(
        offset & 0x1FE,
        BLTCMOD | BLTBMOD | BLTAMOD | BLTDMOD | BPL1MOD | BPL2MOD
    )
}

/// True for registers Denise samples while drawing a line.
#[must_use]
pub fn affects_display(offset: u16) -> bool {
    matches!(
        offset & 0x1FE,
        DIWSTRT..=DDFSTOP
            | CLXCON
            | BPL1PTH..=0x1BE
            | DIWHIGH
            | FMODE
    )
}

// Read registers:
pub const BLTDDAT: u16 = 0x000;
pub const DMACONR: u16 = 0x002;
pub const VPOSR: u16 = 0x004;
pub const VHPOSR: u16 = 0x006;
pub const DSKDATR: u16 = 0x008;
pub const JOY0DAT: u16 = 0x00A;
pub const JOY1DAT: u16 = 0x00C;
pub const CLXDAT: u16 = 0x00E;
pub const ADKCONR: u16 = 0x010;
pub const POTGOR: u16 = 0x016;
pub const SERDATR: u16 = 0x018;
pub const DSKBYTR: u16 = 0x01A;
pub const INTENAR: u16 = 0x01C;
pub const INTREQR: u16 = 0x01E;

// Disk
pub const DSKPTH: u16 = 0x020;
pub const DSKPTL: u16 = 0x022;
pub const DSKLEN: u16 = 0x024;

// Beam and strobes
pub const VPOSW: u16 = 0x02A;
pub const VHPOSW: u16 = 0x02C;
pub const COPCON: u16 = 0x02E;
pub const STREQU: u16 = 0x038;
pub const STRVBL: u16 = 0x03A;
pub const STRHOR: u16 = 0x03C;
pub const STRLONG: u16 = 0x03E;

// Blitter
pub const BLTCON0: u16 = 0x040;
pub const BLTCON1: u16 = 0x042;
pub const BLTAFWM: u16 = 0x044;
pub const BLTALWM: u16 = 0x046;
pub const BLTCPTH: u16 = 0x048;
pub const BLTCPTL: u16 = 0x04A;
pub const BLTBPTH: u16 = 0x04C;
pub const BLTBPTL: u16 = 0x04E;
pub const BLTAPTH: u16 = 0x050;
pub const BLTAPTL: u16 = 0x052;
pub const BLTDPTH: u16 = 0x054;
pub const BLTDPTL: u16 = 0x056;
pub const BLTSIZE: u16 = 0x058;
pub const BLTCON0L: u16 = 0x05A;
pub const BLTSIZV: u16 = 0x05C;
pub const BLTSIZH: u16 = 0x05E;
pub const BLTCMOD: u16 = 0x060;
pub const BLTBMOD: u16 = 0x062;
pub const BLTAMOD: u16 = 0x064;
pub const BLTDMOD: u16 = 0x066;
pub const BLTCDAT: u16 = 0x070;
pub const BLTBDAT: u16 = 0x072;
pub const BLTADAT: u16 = 0x074;
pub const DENISEID: u16 = 0x07C;

// Copper
pub const COP1LCH: u16 = 0x080;
pub const COP1LCL: u16 = 0x082;
pub const COP2LCH: u16 = 0x084;
pub const COP2LCL: u16 = 0x086;
pub const COPJMP1: u16 = 0x088;
pub const COPJMP2: u16 = 0x08A;

// Display window and DMA control
pub const DIWSTRT: u16 = 0x08E;
pub const DIWSTOP: u16 = 0x090;
pub const DDFSTRT: u16 = 0x092;
pub const DDFSTOP: u16 = 0x094;
pub const DMACON: u16 = 0x096;
pub const CLXCON: u16 = 0x098;
pub const INTENA: u16 = 0x09A;
pub const INTREQ: u16 = 0x09C;
pub const ADKCON: u16 = 0x09E;

// Bitplanes
pub const BPL1PTH: u16 = 0x0E0;
pub const BPLCON0: u16 = 0x100;
pub const BPLCON1: u16 = 0x102;
pub const BPLCON2: u16 = 0x104;
pub const BPLCON3: u16 = 0x106;
pub const BPL1MOD: u16 = 0x108;
pub const BPL2MOD: u16 = 0x10A;
pub const BPLCON4: u16 = 0x10C;
pub const BPL1DAT: u16 = 0x110;

// Sprites
pub const SPR0PTH: u16 = 0x120;
pub const SPR0POS: u16 = 0x140;
pub const SPR0CTL: u16 = 0x142;
pub const SPR0DATA: u16 = 0x144;
pub const SPR0DATB: u16 = 0x146;

pub const COLOR00: u16 = 0x180;
pub const DIWHIGH: u16 = 0x1E4;
pub const FMODE: u16 = 0x1FC;
pub const NO_OP: u16 = 0x1FE;

/// Offset of BPLxPTH for plane `n` (0-based).
#[must_use]
pub const fn bplpt(n: usize) -> u16 {
    BPL1PTH + 4 * n as u16
}

/// Offset of SPRxPTH for sprite `n`.
#[must_use]
pub const fn sprpt(n: usize) -> u16 {
    SPR0PTH + 4 * n as u16
}

/// Offset of SPRxPOS for sprite `n`. CTL, DATA and DATB follow at +2, +4, +6.
#[must_use]
pub const fn sprpos(n: usize) -> u16 {
    SPR0POS + 8 * n as u16
}
