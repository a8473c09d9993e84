//! Beam counter and display window decode.
//!
//! Horizontal positions come in two units. `hpos` counts colour clocks
//! (0..227) and is what the copper compares against. Display columns count
//! low-res pixels, two per colour clock; DIWSTRT/DIWSTOP and sprite HSTART
//! use that unit.

use crate::config::{ChipRevision, Region};

/// Current raster position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Beam {
    pub vpos: u16,
    /// Colour clock within the line.
    pub hpos: u16,
    /// Long frame (interlace field toggle).
    pub lof: bool,
    pub frame: u64,
}

impl Beam {
    /// VPOSR: LOF(15) chip id(14-8) V8(0).
    #[must_use]
    pub fn vposr(&self, revision: ChipRevision, region: Region) -> u16 {
        let lof = if self.lof { 0x8000 } else { 0 };
        lof | (revision.agnus_id(region) << 8) | ((self.vpos >> 8) & 1)
    }

    /// VHPOSR: V7-V0(15-8) H8-H1(7-0).
    #[must_use]
    pub fn vhposr(&self) -> u16 {
        ((self.vpos & 0xFF) << 8) | (self.hpos & 0xFF)
    }

    /// Advance to the next line. Returns true when a new frame starts.
    pub fn next_line(&mut self, lines_per_frame: u16) -> bool {
        self.hpos = 0;
        self.vpos += 1;
        if self.vpos >= lines_per_frame {
            self.vpos = 0;
            self.frame += 1;
            true
        } else {
            false
        }
    }
}

/// Display window in beam coordinates, stop exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayWindow {
    pub hstart: u16,
    pub hstop: u16,
    pub vstart: u16,
    pub vstop: u16,
}

impl DisplayWindow {
    /// Decode DIWSTRT/DIWSTOP, with ECS DIWHIGH when it has been written
    /// since the last DIWSTRT/DIWSTOP write.
    ///
    /// Without DIWHIGH: start V8 = 0, H8 = 0; stop V8 = !V7, H8 = 1.
    #[must_use]
    pub fn decode(diwstrt: u16, diwstop: u16, diwhigh: Option<u16>) -> Self {
        let v_start = diwstrt >> 8;
        let h_start = diwstrt & 0xFF;
        let v_stop = diwstop >> 8;
        let h_stop = diwstop & 0xFF;
        match diwhigh {
            Some(high) => Self {
                vstart: v_start | ((high & 0x0007) << 8),
                hstart: h_start | (((high >> 5) & 1) << 8),
                vstop: v_stop | (((high >> 8) & 0x0007) << 8),
                hstop: h_stop | (((high >> 13) & 1) << 8),
            },
            None => Self {
                vstart: v_start,
                hstart: h_start,
                vstop: v_stop | if v_stop & 0x80 == 0 { 0x100 } else { 0 },
                hstop: h_stop | 0x100,
            },
        }
    }

    #[must_use]
    pub fn contains_line(&self, line: u16) -> bool {
        line >= self.vstart && line < self.vstop
    }

    #[must_use]
    pub fn contains_column(&self, column: u16) -> bool {
        column >= self.hstart && column < self.hstop
    }
}
