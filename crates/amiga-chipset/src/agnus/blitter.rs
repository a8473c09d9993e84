//! Blitter: area copy/fill and line draw.
//!
//! A blit is computed in one go when BLTSIZE (or BLTSIZH on ECS) is written.
//! Memory is updated immediately; the register write-back, BZERO, BBUSY and
//! the BLIT interrupt wait until the tick budget for the blit has elapsed, so
//! software polling DMACONR or waiting on the copper sees a busy blitter for
//! as long as real hardware would be busy.
//!
//! BLTCON0: ASH(15-12) USEA USEB USEC USED(11-8) LF(7-0)
//! BLTCON1 area: BSH(15-12) EFE(4) IFE(3) FCI(2) DESC(1) LINE(0)
//! BLTCON1 line: SIGN(6) SUD(4) SUL(3) AUL(2) SING(1) LINE(0)

use emu_core::{ChipBus, Ticks};
use tracing::{debug, warn};

use crate::registers::RegisterFile;

const USE_A: u16 = 0x0800;
const USE_B: u16 = 0x0400;
const USE_C: u16 = 0x0200;
const USE_D: u16 = 0x0100;

const LINE: u16 = 0x0001;
const DESC: u16 = 0x0002;
const SING: u16 = 0x0002;
const FCI: u16 = 0x0004;
const IFE: u16 = 0x0008;
const EFE: u16 = 0x0010;
const SIGN: u16 = 0x0040;

/// Drawing algorithm selected by BLTCON1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitMode {
    Ascending,
    Descending,
    Line,
}

impl BlitMode {
    #[must_use]
    pub fn from_control(con1: u16) -> Self {
        if con1 & LINE != 0 {
            Self::Line
        } else if con1 & DESC != 0 {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
            Self::Line => "line",
        }
    }
}

/// Everything a blit reads from the register file, captured at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlitParams {
    pub con0: u16,
    pub con1: u16,
    pub first_mask: u16,
    pub last_mask: u16,
    /// A, B, C, D.
    pub pointers: [u32; 4],
    /// A, B, C, D, in bytes.
    pub modulos: [i16; 4],
    /// A, B, C data latches.
    pub data: [u16; 3],
    /// Rows (line mode: dots).
    pub height: u32,
    /// Words per row (line mode: always 2).
    pub width: u32,
    pub chip_mask: u32,
}

impl BlitParams {
    /// Capture the blitter registers for a blit of the given size.
    #[must_use]
    pub fn from_registers(regs: &RegisterFile, height: u32, width: u32) -> Self {
        let b = regs.blitter();
        Self {
            con0: b.control0(),
            con1: b.control1(),
            first_mask: b.first_word_mask(),
            last_mask: b.last_word_mask(),
            pointers: [0, 1, 2, 3].map(|ch| b.pointer(ch)),
            modulos: [0, 1, 2, 3].map(|ch| b.modulo(ch)),
            data: [0, 1, 2].map(|ch| b.data(ch)),
            height,
            width,
            chip_mask: regs.chip_mask(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> BlitMode {
        BlitMode::from_control(self.con1)
    }

    #[must_use]
    pub fn minterm(&self) -> u8 {
        self.con0 as u8
    }

    /// Channel enables A, B, C, D.
    #[must_use]
    pub fn channels(&self) -> [bool; 4] {
        [USE_A, USE_B, USE_C, USE_D].map(|bit| self.con0 & bit != 0)
    }

    /// Ticks the blit keeps the blitter busy.
    #[must_use]
    pub fn tick_cost(&self) -> u64 {
        let [_, use_b, use_c, use_d] = self.channels();
        let per_word = if self.mode() == BlitMode::Line {
            8
        } else {
            4 + if use_b { 2 } else { 0 } + if use_c && use_d { 2 } else { 0 }
        };
        per_word * u64::from(self.height) * u64::from(self.width)
    }
}

/// Register state after a blit, written back on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlitOutcome {
    pub pointers: [u32; 4],
    pub data: [u16; 3],
    /// Last D word computed (BLTDDAT).
    pub last_d: u16,
    /// No D word had a set bit.
    pub zero: bool,
    /// BLTCON1 with the line-mode SIGN bit updated.
    pub con1: u16,
}

/// Decode BLTSIZE: height in bits 6-15, width in bits 0-5, zero means max.
#[must_use]
pub fn decode_size(bltsize: u16) -> (u32, u32) {
    let h = u32::from(bltsize >> 6);
    let w = u32::from(bltsize & 0x3F);
    (if h == 0 { 1024 } else { h }, if w == 0 { 64 } else { w })
}

/// Decode ECS BLTSIZV (15-bit height) and BLTSIZH (11-bit width).
#[must_use]
pub fn decode_big_size(sizv: u16, sizh: u16) -> (u32, u32) {
    let h = u32::from(sizv & 0x7FFF);
    let w = u32::from(sizh & 0x07FF);
    (if h == 0 { 0x8000 } else { h }, if w == 0 { 0x0800 } else { w })
}

/// Minterm logic over whole words.
///
/// Bit `i` of `lf` selects the term whose (A, B, C) index is `i`, with A the
/// most significant index bit.
#[must_use]
pub fn minterm(lf: u8, a: u16, b: u16, c: u16) -> u16 {
    let mut out = 0;
    for index in 0..8 {
        if lf & (1 << index) == 0 {
            continue;
        }
        let ta = if index & 4 != 0 { a } else { !a };
        let tb = if index & 2 != 0 { b } else { !b };
        let tc = if index & 1 != 0 { c } else { !c };
        out |= ta & tb & tc;
    }
    out
}

/// Per-nibble fill results: `[carry_in][nibble] -> (filled, carry_out)`.
type FillTable = [[(u8, bool); 16]; 2];

const fn build_fill_table(exclusive: bool) -> FillTable {
    let mut table = [[(0u8, false); 16]; 2];
    let mut carry_in = 0;
    while carry_in < 2 {
        let mut nibble = 0;
        while nibble < 16 {
            let mut carry = carry_in == 1;
            let mut out = 0u8;
            let mut bit = 0;
            while bit < 4 {
                let d = (nibble >> bit) & 1 == 1;
                let set = if exclusive {
                    carry != d
                } else {
                    carry || d
                };
                if set {
                    out |= 1 << bit;
                }
                if d {
                    carry = !carry;
                }
                bit += 1;
            }
            table[carry_in][nibble] = (out, carry);
            nibble += 1;
        }
        carry_in += 1;
    }
    table
}

static INCLUSIVE_FILL: FillTable = build_fill_table(false);
static EXCLUSIVE_FILL: FillTable = build_fill_table(true);

/// Area-fill one word, right to left, carrying the fill state.
///
/// Inclusive fill keeps both edges. Exclusive fill keeps the right edge and
/// drops the left one.
#[must_use]
pub fn fill_word(word: u16, carry: &mut bool, exclusive: bool) -> u16 {
    let table = if exclusive {
        &EXCLUSIVE_FILL
    } else {
        &INCLUSIVE_FILL
    };
    let mut out = 0u16;
    for n in 0..4 {
        let nibble = usize::from((word >> (4 * n)) & 0xF);
        let (filled, next) = table[usize::from(*carry)][nibble];
        out |= u16::from(filled) << (4 * n);
        *carry = next;
    }
    out
}

fn step(ptr: u32, delta: i32, mask: u32) -> u32 {
    ptr.wrapping_add_signed(delta) & mask
}

/// Run an ascending or descending area blit against memory.
pub fn run_area(p: &BlitParams, bus: &mut impl ChipBus) -> BlitOutcome {
    let [use_a, use_b, use_c, use_d] = p.channels();
    let desc = p.mode() == BlitMode::Descending;
    let lf = p.minterm();
    let a_shift = u32::from(p.con0 >> 12);
    let b_shift = u32::from(p.con1 >> 12);
    let fill = p.con1 & (IFE | EFE) != 0;
    let exclusive = p.con1 & EFE != 0;
    let dir: i32 = if desc { -1 } else { 1 };

    let mut ptr = p.pointers;
    let mut data = p.data;
    let mut last_d = 0;
    let mut zero = true;

    // The shifters carry bits across rows; they are only cleared per blit.
    let mut a_prev: u16 = 0;
    let mut b_prev: u16 = 0;

    for _row in 0..p.height {
        let mut carry = p.con1 & FCI != 0;

        for col in 0..p.width {
            let mut fetch = |ch: usize, enabled: bool, data: &mut [u16; 3]| {
                if enabled {
                    data[ch] = bus.read_word(ptr[ch]);
                    ptr[ch] = step(ptr[ch], 2 * dir, p.chip_mask);
                }
                data[ch]
            };
            let a_raw = fetch(0, use_a, &mut data);
            let b_raw = fetch(1, use_b, &mut data);
            let c = fetch(2, use_c, &mut data);

            let mut a = a_raw;
            if col == 0 {
                a &= p.first_mask;
            }
            if col == p.width - 1 {
                a &= p.last_mask;
            }

            // Descending blits shift left, so the previous word sits below.
            let (a_s, b_s) = if desc {
                (
                    ((u32::from(a) << 16 | u32::from(a_prev)) >> (16 - a_shift)) as u16,
                    ((u32::from(b_raw) << 16 | u32::from(b_prev)) >> (16 - b_shift)) as u16,
                )
            } else {
                (
                    ((u32::from(a_prev) << 16 | u32::from(a)) >> a_shift) as u16,
                    ((u32::from(b_prev) << 16 | u32::from(b_raw)) >> b_shift) as u16,
                )
            };
            a_prev = a;
            b_prev = b_raw;

            let mut d = minterm(lf, a_s, b_s, c);
            if fill {
                d = fill_word(d, &mut carry, exclusive);
            }
            zero &= d == 0;
            last_d = d;

            if use_d {
                bus.write_word(ptr[3], d);
                ptr[3] = step(ptr[3], 2 * dir, p.chip_mask);
            }
        }

        for (ch, &enabled) in p.channels().iter().enumerate() {
            if enabled {
                ptr[ch] = step(ptr[ch], i32::from(p.modulos[ch]) * dir, p.chip_mask);
            }
        }
    }

    BlitOutcome {
        pointers: ptr,
        data,
        last_d,
        zero,
        con1: p.con1,
    }
}

/// Line direction decoded from BLTCON1 SUD/SUL/AUL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Octant {
    pub major_is_y: bool,
    pub x_neg: bool,
    pub y_neg: bool,
}

impl Octant {
    #[must_use]
    pub fn from_control(con1: u16) -> Self {
        // SUD:SUL:AUL. y_neg is up the screen, towards lower addresses.
        let (major_is_y, x_neg, y_neg) = match (con1 >> 2) & 7 {
            0b000 => (true, false, false),
            0b001 => (true, false, true),
            0b010 => (true, true, false),
            0b011 => (true, true, true),
            0b100 => (false, false, false),
            0b101 => (false, true, false),
            0b110 => (false, false, true),
            _ => (false, true, true),
        };
        Self {
            major_is_y,
            x_neg,
            y_neg,
        }
    }

    /// BLTCON1 SUD/SUL/AUL bits for this direction.
    #[must_use]
    pub fn control_bits(self) -> u16 {
        let code = match (self.major_is_y, self.x_neg, self.y_neg) {
            (true, false, false) => 0b000,
            (true, false, true) => 0b001,
            (true, true, false) => 0b010,
            (true, true, true) => 0b011,
            (false, false, false) => 0b100,
            (false, true, false) => 0b101,
            (false, false, true) => 0b110,
            (false, true, true) => 0b111,
        };
        code << 2
    }
}

/// One plotted dot of a line blit, relative to the start dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDot {
    pub x: i32,
    pub y: i32,
    /// Error accumulator before the step that follows this dot.
    pub error: i16,
}

/// Bresenham walk driven by the values software loads into the blitter:
/// the error term (BLTAPTL), the diagonal increment (BLTAMOD) and the
/// straight increment (BLTBMOD).
#[derive(Debug, Clone)]
pub struct LineWalker {
    octant: Octant,
    error: i16,
    diagonal_inc: i16,
    straight_inc: i16,
    x: i32,
    y: i32,
    remaining: u32,
}

impl LineWalker {
    #[must_use]
    pub fn new(octant: Octant, error: i16, diagonal_inc: i16, straight_inc: i16, dots: u32) -> Self {
        Self {
            octant,
            error,
            diagonal_inc,
            straight_inc,
            x: 0,
            y: 0,
            remaining: dots,
        }
    }

    /// Error term after the last step taken.
    #[must_use]
    pub fn error(&self) -> i16 {
        self.error
    }

    fn step_x(&mut self) {
        self.x += if self.octant.x_neg { -1 } else { 1 };
    }

    fn step_y(&mut self) {
        self.y += if self.octant.y_neg { -1 } else { 1 };
    }
}

impl Iterator for LineWalker {
    type Item = LineDot;

    fn next(&mut self) -> Option<LineDot> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let dot = LineDot {
            x: self.x,
            y: self.y,
            error: self.error,
        };
        if self.error >= 0 {
            self.step_x();
            self.step_y();
            self.error = self.error.wrapping_add(self.diagonal_inc);
        } else if self.octant.major_is_y {
            self.step_y();
            self.error = self.error.wrapping_add(self.straight_inc);
        } else {
            self.step_x();
            self.error = self.error.wrapping_add(self.straight_inc);
        }
        Some(dot)
    }
}

/// Run a line blit. One dot per row of BLTSIZE, each dot a single-bit
/// read-modify-write of the C/D word under it.
pub fn run_line(p: &BlitParams, bus: &mut impl ChipBus) -> BlitOutcome {
    let lf = p.minterm();
    let octant = Octant::from_control(p.con1);
    let single = p.con1 & SING != 0;
    let start_bit = i32::from(p.con0 >> 12);
    let row_bytes = i32::from(p.modulos[2]);
    let mut texture = p.data[1].rotate_left(u32::from(p.con1 >> 12));

    let mut walker = LineWalker::new(
        octant,
        p.pointers[0] as u16 as i16,
        p.modulos[0],
        p.modulos[1],
        p.height,
    );
    let mut data = p.data;
    let mut zero = true;
    let mut last_d = 0;
    let mut last_row = None;
    let mut end = (p.pointers[2], p.pointers[3]);

    for dot in walker.by_ref() {
        let column = start_bit + dot.x;
        let offset = column.div_euclid(16) * 2 + dot.y * row_bytes;
        let bit = column.rem_euclid(16);
        let caddr = step(p.pointers[2], offset, p.chip_mask);
        let daddr = step(p.pointers[3], offset, p.chip_mask);
        end = (caddr, daddr);

        let mask = 0x8000u16 >> bit;
        let b = if texture & 0x8000 != 0 { 0xFFFF } else { 0 };
        texture = texture.rotate_left(1);

        if single && last_row == Some(dot.y) {
            continue;
        }
        last_row = Some(dot.y);

        let c = bus.read_word(caddr);
        data[2] = c;
        let d = (minterm(lf, mask, b, c) & mask) | (c & !mask);
        zero &= d == 0;
        last_d = d;
        bus.write_word(daddr, d);
    }

    let error = walker.error();
    let mut pointers = p.pointers;
    pointers[0] = (p.pointers[0] & 0xFFFF_0000) | u32::from(error as u16);
    pointers[2] = end.0;
    pointers[3] = end.1;
    let con1 = if error < 0 { p.con1 | SIGN } else { p.con1 & !SIGN };
    data[1] = texture;

    BlitOutcome {
        pointers,
        data,
        last_d,
        zero,
        con1,
    }
}

#[derive(Debug, Clone)]
struct RunningBlit {
    mode: BlitMode,
    done_at: Ticks,
    nasty: bool,
    outcome: BlitOutcome,
}

/// Blitter status: idle or running towards a completion deadline.
#[derive(Debug, Clone, Default)]
pub struct Blitter {
    running: Option<RunningBlit>,
    zero: bool,
    completed: u64,
}

impl Blitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a blit. Memory is written now; the returned deadline is when the
    /// caller should call [`Blitter::finish`].
    ///
    /// `nasty_budget` replaces the computed cost when BLTPRI is set. Returns
    /// `None` if a blit is already running; the retrigger is dropped.
    pub fn start(
        &mut self,
        params: &BlitParams,
        bus: &mut impl ChipBus,
        now: Ticks,
        nasty_budget: Option<u64>,
    ) -> Option<Ticks> {
        if let Some(run) = &self.running {
            warn!(
                mode = run.mode.name(),
                done_at = run.done_at.get(),
                "blit retriggered while busy, ignoring"
            );
            return None;
        }

        let mode = params.mode();
        let outcome = if mode == BlitMode::Line {
            if params.width != 2 {
                warn!(width = params.width, "line blit with width other than 2");
            }
            run_line(params, bus)
        } else {
            run_area(params, bus)
        };

        let cost = nasty_budget.unwrap_or_else(|| params.tick_cost());
        let done_at = now + Ticks(cost);
        debug!(
            mode = mode.name(),
            width = params.width,
            height = params.height,
            cost,
            "blit started"
        );
        self.running = Some(RunningBlit {
            mode,
            done_at,
            nasty: nasty_budget.is_some(),
            outcome,
        });
        Some(done_at)
    }

    /// Complete the running blit and hand back its register write-back.
    pub fn finish(&mut self) -> Option<BlitOutcome> {
        let run = self.running.take()?;
        self.zero = run.outcome.zero;
        self.completed += 1;
        debug!(mode = run.mode.name(), zero = self.zero, "blit done");
        Some(run.outcome)
    }

    /// Drop a running blit without write-back (chip reset).
    pub fn abort(&mut self) {
        self.running = None;
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.running.is_some()
    }

    /// BZERO as last latched at blit completion.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.zero
    }

    /// True while a blit started in BLTPRI mode is running.
    #[must_use]
    pub fn is_nasty(&self) -> bool {
        self.running.as_ref().is_some_and(|r| r.nasty)
    }

    #[must_use]
    pub fn mode(&self) -> Option<BlitMode> {
        self.running.as_ref().map(|r| r.mode)
    }

    #[must_use]
    pub fn done_at(&self) -> Option<Ticks> {
        self.running.as_ref().map(|r| r.done_at)
    }

    /// Blits completed since power-on.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed
    }
}
