//! Amiga custom chipset core: blitter, copper, sprite and bitplane DMA, and
//! the Denise scanline compositor.
//!
//! The CPU and CIAs are collaborators outside this crate. They talk to the
//! chipset through [`Chipset::read`], [`Chipset::write`], the interrupt
//! callback and [`Chipset::set_cia_interrupt`]. A host timing driver calls
//! [`Chipset::tick_scanline`] once per raster line.
//!
//! Timing (PAL):
//! - Colour clock (CCK): 3,546,895 Hz, 227 per line
//! - One tick = half a CCK = one low-res pixel = one CPU clock
//! - One frame: 312 lines x 454 ticks

pub mod agnus;
mod chipset;
pub mod config;
pub mod custom_regs;
pub mod denise;
mod error;
pub mod registers;

pub use chipset::{Chipset, ChipsetEvent, CiaLine, SideEffects};
pub use config::{ChipRevision, ChipsetConfig, Region};
pub use error::ChipsetError;
pub use registers::{RegisterFile, make_long, split_long};
