//! Copper coprocessor.
//!
//! The Copper synchronises register writes to beam positions. It reads
//! instruction pairs from chip RAM in its DMA slots.
//!
//! Instructions:
//! - MOVE (IR1 bit 0 = 0): write IR2 to register (IR1 & $01FE)
//! - WAIT (IR1 bit 0 = 1, IR2 bit 0 = 0): block until beam >= position
//! - SKIP (IR1 bit 0 = 1, IR2 bit 0 = 1): skip next if beam >= position
//!
//! A MOVE does not reach the register file in the slot that fetched it. The
//! write sits in a one-entry buffer until the start of the copper's next
//! slot, which is where real hardware lands it relative to CPU writes.

use emu_core::ChipBus;
use tracing::warn;

use crate::config::ChipRevision;

/// Copper state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No list started since reset.
    Idle,
    FetchIR1,
    FetchIR2,
    WaitBeam,
    /// Slots spent after a WAIT resolves.
    Wake(u8),
    /// Slots burned by an instruction a SKIP jumped over.
    Skipped(u8),
    /// Illegal MOVE: parked until the next jump.
    Halted,
}

/// Beam and arbitration inputs for one copper slot.
#[derive(Debug, Clone, Copy)]
pub struct CopperContext {
    pub vpos: u16,
    /// Horizontal position in colour clocks.
    pub hpos: u16,
    pub blitter_busy: bool,
    /// Lowest register offset a MOVE may target.
    pub threshold: u16,
    /// Extra slots after a WAIT resolves.
    pub wake_slots: u8,
}

impl CopperContext {
    /// Raster position in WAIT/SKIP comparison format.
    #[must_use]
    pub fn beam(&self) -> u16 {
        ((self.vpos & 0xFF) << 8) | (self.hpos & 0xFE)
    }
}

/// Lowest register a copper MOVE may write.
#[must_use]
pub fn move_threshold(revision: ChipRevision, danger: bool) -> u16 {
    match (danger, revision.is_ecs_or_later()) {
        (false, _) => 0x080,
        (true, false) => 0x040,
        (true, true) => 0x000,
    }
}

/// WAIT/SKIP comparison.
///
/// `ir1` holds VP(15-8) HP(7-1); `ir2` holds BFD(15) VE(14-8) HE(7-1).
/// The top vertical bit is always compared.
#[must_use]
pub fn beam_reached(beam: u16, ir1: u16, ir2: u16) -> bool {
    let mask = (ir2 & 0x7FFE) | 0x8000;
    (beam & mask) >= (ir1 & 0xFFFE & mask)
}

/// A register write the copper has executed but not yet delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopperWrite {
    pub reg: u16,
    pub value: u16,
}

#[derive(Debug, Clone)]
pub struct Copper {
    state: State,
    pc: u32,
    ir1: u16,
    ir2: u16,
    pending: Option<CopperWrite>,
}

impl Copper {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            pc: 0,
            ir1: 0,
            ir2: 0,
            pending: None,
        }
    }

    /// Restart execution at `pc` (COPJMP1/COPJMP2 and vertical blank).
    pub fn jump(&mut self, pc: u32) {
        self.pc = pc;
        self.state = State::FetchIR1;
    }

    /// Back to power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Take the buffered MOVE. Called at the start of every copper slot.
    pub fn take_pending(&mut self) -> Option<CopperWrite> {
        self.pending.take()
    }

    /// Run one copper DMA slot.
    pub fn slot(&mut self, ctx: &CopperContext, bus: &impl ChipBus) {
        match self.state {
            State::Idle | State::Halted => {}
            State::FetchIR1 => {
                self.ir1 = bus.read_word(self.pc);
                self.pc = self.pc.wrapping_add(2);
                self.state = State::FetchIR2;
            }
            State::FetchIR2 => {
                self.ir2 = bus.read_word(self.pc);
                self.pc = self.pc.wrapping_add(2);
                self.execute(ctx);
            }
            State::WaitBeam => {
                let blitter_ok = self.ir2 & 0x8000 != 0 || !ctx.blitter_busy;
                if blitter_ok && beam_reached(ctx.beam(), self.ir1, self.ir2) {
                    self.state = match ctx.wake_slots {
                        0 => State::FetchIR1,
                        n => State::Wake(n),
                    };
                }
            }
            State::Wake(n) | State::Skipped(n) => {
                self.state = if n <= 1 {
                    State::FetchIR1
                } else if matches!(self.state, State::Wake(_)) {
                    State::Wake(n - 1)
                } else {
                    State::Skipped(n - 1)
                };
            }
        }
    }

    fn execute(&mut self, ctx: &CopperContext) {
        if self.ir1 & 1 == 0 {
            let reg = self.ir1 & 0x01FE;
            if reg < ctx.threshold {
                warn!(
                    reg = %format!("{reg:#05X}"),
                    pc = %format!("{:#08X}", self.pc.wrapping_sub(4)),
                    "copper MOVE below protection threshold, halting until next jump"
                );
                self.state = State::Halted;
                return;
            }
            self.pending = Some(CopperWrite {
                reg,
                value: self.ir2,
            });
            self.state = State::FetchIR1;
        } else if self.ir2 & 1 == 0 {
            self.state = State::WaitBeam;
        } else {
            let blitter_ok = self.ir2 & 0x8000 != 0 || !ctx.blitter_busy;
            if blitter_ok && beam_reached(ctx.beam(), self.ir1, self.ir2) {
                self.pc = self.pc.wrapping_add(4);
                self.state = State::Skipped(2);
            } else {
                self.state = State::FetchIR1;
            }
        }
    }

    /// Current copper PC.
    #[must_use]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// True while blocked on a WAIT.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.state == State::WaitBeam
    }

    /// True after an illegal MOVE.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    #[must_use]
    pub fn state_name(&self) -> &'static str {
        match self.state {
            State::Idle => "idle",
            State::FetchIR1 => "fetch1",
            State::FetchIR2 => "fetch2",
            State::WaitBeam => "wait",
            State::Wake(_) => "wake",
            State::Skipped(_) => "skipped",
            State::Halted => "halted",
        }
    }
}

impl Default for Copper {
    fn default() -> Self {
        Self::new()
    }
}
