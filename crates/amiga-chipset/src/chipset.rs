//! The chipset context object.
//!
//! One `Chipset` owns the register file, chip RAM, the scheduler and every
//! chip. The host drives it a scanline at a time; the CPU collaborator reads
//! and writes registers between (or, through the copper, during) lines.
//!
//! Time runs in ticks, one low-res pixel each: 454 per line. The copper gets
//! a slot every even colour clock (every 4 ticks). Rendering is lazy and
//! catches up to the beam before any display register changes.

use bitflags::bitflags;
use emu_core::{ChipBus, Observable, Scheduler, Ticks, Value, WordRam};
use tracing::{debug, error, trace};

use crate::agnus::beam::Beam;
use crate::agnus::bitplane_dma::{self, PlaneFetcher};
use crate::agnus::blitter::{BlitParams, Blitter, decode_big_size, decode_size};
use crate::agnus::copper::{Copper, CopperContext, move_threshold};
use crate::agnus::sprite_dma::{self, SpriteDmaLine};
use crate::config::{ChipRevision, ChipsetConfig, TICKS_PER_CCK, TICKS_PER_LINE};
use crate::custom_regs::{
    self as regs, DmaCon, IntBits, RegisterKind, affects_display, interrupt_level,
};
use crate::denise::Denise;
use crate::denise::video::Framebuffer;
use crate::error::ChipsetError;
use crate::registers::{BLITTER_DATA, BLITTER_POINTERS, RegisterFile};

/// Ticks between copper DMA slots.
const COPPER_SLOT_TICKS: u64 = 2 * TICKS_PER_CCK;

bitflags! {
    /// Side effects a register write may trigger. Storage always happens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SideEffects: u8 {
        /// BLTSIZE/BLTSIZH start a blit.
        const BLITTER = 1 << 0;
        /// COPJMP1/COPJMP2 restart the copper.
        const COPPER = 1 << 1;
        /// SPRxPT writes reset that channel's DMA.
        const SPRITES = 1 << 2;
        /// INTENA/INTREQ writes notify the interrupt handler.
        const INTERRUPTS = 1 << 3;
        /// Display writes first render the line up to the beam.
        const DISPLAY = 1 << 4;
    }
}

/// The two CIA interrupt lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiaLine {
    /// CIA-A, INT2 (INTREQ.PORTS).
    A,
    /// CIA-B, INT6 (INTREQ.EXTER).
    B,
}

impl CiaLine {
    fn bit(self) -> IntBits {
        match self {
            Self::A => IntBits::PORTS,
            Self::B => IntBits::EXTER,
        }
    }
}

/// Deferred chipset work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChipsetEvent {
    BlitterDone,
}

type InterruptHandler = Box<dyn FnMut(u8)>;

pub struct Chipset {
    config: ChipsetConfig,
    regs: RegisterFile,
    ram: WordRam,
    scheduler: Scheduler<ChipsetEvent>,
    blitter: Blitter,
    copper: Copper,
    denise: Denise,
    beam: Beam,
    now: Ticks,
    line_start: Ticks,
    /// Beam column (tick within the line) for catch-up rendering.
    column: u16,
    irq: Option<InterruptHandler>,
    ipl: u8,
    cia: [bool; 2],
    /// ECS DIWHIGH, dropped again by a DIWSTRT/DIWSTOP write.
    diwhigh: Option<u16>,
    /// BLTDDAT.
    last_d: u16,
    halted: bool,
}

impl Chipset {
    /// Build a chipset with zeroed chip RAM.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ChipsetConfig) -> Result<Self, ChipsetError> {
        config.validate()?;
        let lines = config.lines_per_frame();
        let mut chipset = Self {
            regs: RegisterFile::new(config.chip_mask()),
            ram: WordRam::new(config.chip_ram_size as usize),
            scheduler: Scheduler::new(),
            blitter: Blitter::new(),
            copper: Copper::new(),
            denise: Denise::new(config.revision, lines),
            beam: Beam::default(),
            now: Ticks::ZERO,
            line_start: Ticks::ZERO,
            column: 0,
            irq: None,
            ipl: 0,
            cia: [false; 2],
            diwhigh: None,
            last_d: 0,
            halted: false,
            config,
        };
        chipset.seed_bplcon3();
        Ok(chipset)
    }

    /// Lisa comes out of reset with PF2OF = 3 (playfield 2 at colour 8).
    fn seed_bplcon3(&mut self) {
        if self.config.revision == ChipRevision::Aga {
            self.regs.poke(regs::BPLCON3, 0x0C00);
            self.denise.invalidate();
        }
    }

    /// Install the CPU interrupt callback. It receives the new interrupt
    /// priority level each time the level changes.
    pub fn set_interrupt_handler(&mut self, handler: impl FnMut(u8) + 'static) {
        self.irq = Some(Box::new(handler));
    }

    // ---------------------------------------------------------------------
    // Register access
    // ---------------------------------------------------------------------

    /// CPU register read. Never fails; CLXDAT clears on read.
    pub fn read(&mut self, offset: u16) -> u16 {
        if offset & 0x1FE == regs::CLXDAT {
            return self.denise.read_clxdat();
        }
        self.peek(offset)
    }

    /// Register value as a read would return it, without read side effects.
    #[must_use]
    pub fn peek(&self, offset: u16) -> u16 {
        let offset = offset & 0x1FE;
        match offset {
            regs::DMACONR => {
                let mut v = self.regs.dmacon();
                v.set(DmaCon::BBUSY, self.blitter.is_busy());
                v.set(DmaCon::BZERO, self.blitter.is_zero());
                v.bits()
            }
            regs::VPOSR => self.beam.vposr(self.config.revision, self.config.region),
            regs::VHPOSR => self.beam.vhposr(),
            regs::INTENAR => self.regs.raw(regs::INTENA),
            regs::INTREQR => self.regs.raw(regs::INTREQ),
            regs::ADKCONR => self.regs.raw(regs::ADKCON),
            regs::CLXDAT => self.denise.peek_clxdat(),
            regs::BLTDDAT => self.last_d,
            regs::DENISEID => match self.config.revision {
                ChipRevision::Ocs => 0xFFFF,
                ChipRevision::Ecs => 0xFFFC,
                ChipRevision::Aga => 0xFFF8,
            },
            _ => match regs::register_kind(offset) {
                RegisterKind::ReadOnly | RegisterKind::Strobe => 0,
                _ => self.regs.raw(offset),
            },
        }
    }

    /// CPU register write with every side effect enabled.
    pub fn write(&mut self, offset: u16, value: u16) {
        self.write_with(offset, value, SideEffects::all());
    }

    /// Register write, triggering only the side effects in `effects`.
    pub fn write_with(&mut self, offset: u16, value: u16, effects: SideEffects) {
        let offset = offset & 0x1FE;
        let display = affects_display(offset);
        if display && effects.contains(SideEffects::DISPLAY) {
            self.catch_up();
        }

        let kind = self.regs.store(offset, value);
        if kind == RegisterKind::ReadOnly {
            trace!(reg = %format!("{offset:#05X}"), "write to read-only register ignored");
            return;
        }
        if display {
            self.denise.invalidate();
        }

        let ecs = self.config.revision.is_ecs_or_later();
        match offset {
            regs::BLTSIZE if effects.contains(SideEffects::BLITTER) => {
                let (h, w) = decode_size(value);
                self.start_blit(h, w);
            }
            regs::BLTSIZH if ecs && effects.contains(SideEffects::BLITTER) => {
                let (h, w) = decode_big_size(self.regs.raw(regs::BLTSIZV), value);
                self.start_blit(h, w);
            }
            regs::BLTCON0L if ecs => {
                let con0 = (self.regs.raw(regs::BLTCON0) & 0xFF00) | (value & 0x00FF);
                self.regs.poke(regs::BLTCON0, con0);
            }
            regs::COPJMP1 if effects.contains(SideEffects::COPPER) => {
                self.copper_jump(self.regs.copper().list1());
            }
            regs::COPJMP2 if effects.contains(SideEffects::COPPER) => {
                self.copper_jump(self.regs.copper().list2());
            }
            regs::INTREQ => {
                self.reassert_cia_lines();
                if effects.contains(SideEffects::INTERRUPTS) {
                    self.update_ipl();
                }
            }
            regs::INTENA if effects.contains(SideEffects::INTERRUPTS) => self.update_ipl(),
            regs::DIWSTRT | regs::DIWSTOP => self.diwhigh = None,
            regs::DIWHIGH if ecs => self.diwhigh = Some(value),
            regs::FMODE if self.config.revision != ChipRevision::Aga => {
                self.regs.poke(regs::FMODE, 0);
            }
            regs::SPR0PTH..=0x13E if effects.contains(SideEffects::SPRITES) => {
                self.reset_sprite_dma(usize::from((offset - regs::SPR0PTH) / 4));
            }
            regs::SPR0POS..=0x17E => {
                let ch = &mut self.denise.sprites[usize::from((offset - regs::SPR0POS) / 8)];
                match (offset >> 1) & 3 {
                    0 => ch.write_pos(value),
                    1 => ch.write_ctl(value),
                    2 => ch.write_data(value),
                    _ => ch.write_datb(value),
                }
            }
            regs::COLOR00..=0x1BE => {
                let bplcon3 = self.regs.display().bplcon3();
                self.denise
                    .write_color(usize::from((offset - regs::COLOR00) / 2), value, bplcon3);
            }
            _ => {}
        }
    }

    // ---------------------------------------------------------------------
    // Timing
    // ---------------------------------------------------------------------

    /// Run one raster line.
    ///
    /// # Errors
    ///
    /// Fails with [`ChipsetError::SpriteScratchExhausted`] when a line needs
    /// more sprite fetch buffers than configured, and with
    /// [`ChipsetError::Halted`] on every call after that.
    pub fn tick_scanline(&mut self) -> Result<(), ChipsetError> {
        if self.halted {
            return Err(ChipsetError::Halted);
        }
        let line = self.beam.vpos;
        self.run_sprite_dma(line)?;

        self.denise.sync_latch(&self.regs, self.diwhigh);
        let bitplane_dma = self.regs.dmacon().live(DmaCon::BPL);
        self.denise.begin_line(line, bitplane_dma);

        for t in 0..TICKS_PER_LINE {
            self.now = self.line_start + Ticks(t);
            self.column = t as u16;
            self.beam.hpos = (t / TICKS_PER_CCK) as u16;
            while let Some((_, event)) = self.scheduler.pop_due(self.now) {
                self.dispatch(event);
            }
            if t % COPPER_SLOT_TICKS == 0 {
                self.copper_slot();
            }
        }

        self.now = self.line_start + Ticks(TICKS_PER_LINE);
        self.line_start = self.now;
        self.denise.sync_latch(&self.regs, self.diwhigh);
        let mut fetcher = PlaneFetcher::new(&mut self.regs, &self.ram);
        if self.denise.end_line(&mut fetcher) {
            bitplane_dma::apply_modulos(&mut self.regs, self.denise.latch().planes);
        }
        self.column = 0;

        if self.beam.next_line(self.config.lines_per_frame()) {
            self.start_frame();
        }
        Ok(())
    }

    /// Run lines until the beam wraps to the next frame.
    ///
    /// # Errors
    ///
    /// Propagates the first [`Chipset::tick_scanline`] failure.
    pub fn run_frame(&mut self) -> Result<(), ChipsetError> {
        let frame = self.beam.frame;
        while self.beam.frame == frame {
            self.tick_scanline()?;
        }
        Ok(())
    }

    /// CPU clocks granted over `ticks`: halved while a BLTPRI blit holds
    /// the bus.
    #[must_use]
    pub fn cpu_progress(&self, ticks: u64) -> u64 {
        if self.blitter.is_nasty() {
            ticks / 2
        } else {
            ticks
        }
    }

    fn run_sprite_dma(&mut self, line: u16) -> Result<(), ChipsetError> {
        let dmacon = self.regs.dmacon();
        let d = self.regs.display();
        let request = SpriteDmaLine {
            line,
            dma: dmacon.live(DmaCon::SPR),
            limit: sprite_dma::slot_limit(dmacon.live(DmaCon::BPL), d.ddfstrt()),
            width: sprite_dma::fetch_width(self.config.revision, d.fmode()),
        };
        let live = sprite_dma::run_line(
            &mut self.denise.sprites,
            &mut self.regs,
            &self.ram,
            &request,
        );
        let slots = self.config.sprite_scratch_slots;
        if live > slots {
            error!(line, live, slots, "sprite fetch scratch exhausted, halting");
            self.halted = true;
            return Err(ChipsetError::SpriteScratchExhausted { line, live, slots });
        }
        Ok(())
    }

    fn copper_slot(&mut self) {
        if let Some(w) = self.copper.take_pending() {
            self.write_with(w.reg, w.value, SideEffects::all());
        }
        if !self.regs.dmacon().live(DmaCon::COP) {
            return;
        }
        let ctx = CopperContext {
            vpos: self.beam.vpos,
            hpos: self.beam.hpos,
            blitter_busy: self.blitter.is_busy(),
            threshold: move_threshold(self.config.revision, self.regs.copper().danger()),
            wake_slots: self.config.copper_wake_slots,
        };
        self.copper.slot(&ctx, &self.ram);
    }

    fn copper_jump(&mut self, pc: u32) {
        debug!(pc = %format!("{pc:#08X}"), "copper jump");
        self.copper.jump(pc);
    }

    fn start_frame(&mut self) {
        debug!(frame = self.beam.frame, "vertical blank");
        let lace = self.regs.display().bplcon0() & 0x0004 != 0;
        self.beam.lof = if lace { !self.beam.lof } else { true };
        self.regs.set_intreq_bits(IntBits::VERTB, true);
        self.copper.jump(self.regs.copper().list1());
        for ch in &mut self.denise.sprites {
            ch.reset_dma();
        }
        self.update_ipl();
    }

    /// Render the current line up to the beam.
    fn catch_up(&mut self) {
        self.denise.sync_latch(&self.regs, self.diwhigh);
        let mut fetcher = PlaneFetcher::new(&mut self.regs, &self.ram);
        self.denise.render_to(self.column, &mut fetcher);
    }

    // ---------------------------------------------------------------------
    // Blitter
    // ---------------------------------------------------------------------

    fn start_blit(&mut self, height: u32, width: u32) {
        let params = BlitParams::from_registers(&self.regs, height, width);
        let nasty = self
            .regs
            .dmacon()
            .contains(DmaCon::BLTPRI)
            .then_some(u64::from(self.config.nasty_blit_ticks));
        if let Some(done_at) = self.blitter.start(&params, &mut self.ram, self.now, nasty) {
            self.scheduler.schedule(done_at, ChipsetEvent::BlitterDone);
        }
    }

    fn dispatch(&mut self, event: ChipsetEvent) {
        match event {
            ChipsetEvent::BlitterDone => self.finish_blit(),
        }
    }

    fn finish_blit(&mut self) {
        let Some(out) = self.blitter.finish() else {
            return;
        };
        for (hi, ptr) in BLITTER_POINTERS.into_iter().zip(out.pointers) {
            self.regs.set_long(hi, ptr);
        }
        for (reg, data) in BLITTER_DATA.into_iter().zip(out.data) {
            self.regs.poke(reg, data);
        }
        self.regs.poke(regs::BLTCON1, out.con1);
        self.last_d = out.last_d;
        self.regs.set_intreq_bits(IntBits::BLIT, true);
        self.update_ipl();
    }

    // ---------------------------------------------------------------------
    // Interrupts and resets
    // ---------------------------------------------------------------------

    /// Drive a CIA interrupt line. While a line is asserted its INTREQ bit
    /// cannot be cleared.
    pub fn set_cia_interrupt(&mut self, line: CiaLine, active: bool) {
        self.cia[line as usize] = active;
        if active {
            self.regs.set_intreq_bits(line.bit(), true);
        }
        self.update_ipl();
    }

    fn reassert_cia_lines(&mut self) {
        for line in [CiaLine::A, CiaLine::B] {
            if self.cia[line as usize] {
                self.regs.set_intreq_bits(line.bit(), true);
            }
        }
    }

    fn update_ipl(&mut self) {
        let level = interrupt_level(self.regs.intena(), self.regs.intreq());
        if level != self.ipl {
            self.ipl = level;
            if let Some(handler) = self.irq.as_mut() {
                handler(level);
            }
        }
    }

    /// Sprite DMA reset: the channel discards its output and fetches new
    /// control words at its next DMA slot.
    pub fn reset_sprite_dma(&mut self, channel: usize) {
        if let Some(ch) = self.denise.sprites.get_mut(channel) {
            debug!(channel, "sprite DMA reset");
            ch.reset_dma();
        }
    }

    /// Hardware reset. Chip RAM and most registers keep their contents.
    pub fn reset(&mut self) {
        debug!("chipset reset");
        for reg in [regs::DMACON, regs::INTENA, regs::INTREQ] {
            self.regs.poke(reg, 0);
        }
        self.blitter.abort();
        self.scheduler.cancel(|e| *e == ChipsetEvent::BlitterDone);
        self.copper.reset();
        self.denise.reset();
        self.seed_bplcon3();
        self.beam = Beam::default();
        self.column = 0;
        self.cia = [false; 2];
        self.diwhigh = None;
        self.halted = false;
        self.update_ipl();
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &ChipsetConfig {
        &self.config
    }

    #[must_use]
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    #[must_use]
    pub fn memory(&self) -> &WordRam {
        &self.ram
    }

    pub fn memory_mut(&mut self) -> &mut WordRam {
        &mut self.ram
    }

    #[must_use]
    pub fn framebuffer(&self) -> &Framebuffer {
        self.denise.framebuffer()
    }

    #[must_use]
    pub fn denise(&self) -> &Denise {
        &self.denise
    }

    #[must_use]
    pub fn beam(&self) -> &Beam {
        &self.beam
    }

    #[must_use]
    pub fn copper(&self) -> &Copper {
        &self.copper
    }

    #[must_use]
    pub fn blitter(&self) -> &Blitter {
        &self.blitter
    }

    #[must_use]
    pub fn now(&self) -> Ticks {
        self.now
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.beam.frame
    }

    /// Current CPU interrupt priority level.
    #[must_use]
    pub fn ipl(&self) -> u8 {
        self.ipl
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

impl Observable for Chipset {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("beam.") {
            match rest {
                "vpos" => Some(self.beam.vpos.into()),
                "hpos" => Some(self.beam.hpos.into()),
                "frame" => Some(self.beam.frame.into()),
                "lof" => Some(self.beam.lof.into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("blitter.") {
            match rest {
                "busy" => Some(self.blitter.is_busy().into()),
                "zero" => Some(self.blitter.is_zero().into()),
                "nasty" => Some(self.blitter.is_nasty().into()),
                "mode" => Some(self.blitter.mode().map_or("idle", |m| m.name()).into()),
                "completed" => Some(self.blitter.completed().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("copper.") {
            match rest {
                "pc" => Some(self.copper.pc().into()),
                "state" => Some(self.copper.state_name().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("scheduler.") {
            match rest {
                "pending" => Some((!self.scheduler.is_empty()).into()),
                "next" => self.scheduler.next_deadline().map(|t| t.get().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("reg.") {
            let offset = parse_hex_or_dec(rest)?;
            u16::try_from(offset).ok().map(|o| self.peek(o).into())
        } else if let Some(rest) = path.strip_prefix("memory.") {
            let addr = parse_hex_or_dec(rest)?;
            u32::try_from(addr).ok().map(|a| self.ram.read_word(a).into())
        } else {
            match path {
                "dmacon" => Some(self.peek(regs::DMACONR).into()),
                "intena" => Some(self.regs.raw(regs::INTENA).into()),
                "intreq" => Some(self.regs.raw(regs::INTREQ).into()),
                "ipl" => Some(self.ipl.into()),
                "now" => Some(self.now.get().into()),
                "halted" => Some(self.halted.into()),
                "denise.ham" => Some(self.denise.ham_color().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "beam.vpos",
            "beam.hpos",
            "beam.frame",
            "beam.lof",
            "blitter.busy",
            "blitter.zero",
            "blitter.nasty",
            "blitter.mode",
            "blitter.completed",
            "copper.pc",
            "copper.state",
            "scheduler.pending",
            "scheduler.next",
            "reg.<offset>",
            "memory.<address>",
            "dmacon",
            "intena",
            "intreq",
            "ipl",
            "now",
            "halted",
            "denise.ham",
        ]
    }
}

fn parse_hex_or_dec(s: &str) -> Option<u64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = s.strip_prefix('$') {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}
