//! Agnus: beam counter and the DMA engines.
//!
//! Agnus owns the beam position and every chip RAM DMA channel the core
//! models: the blitter, the copper, sprite DMA and bitplane DMA.

pub mod beam;
pub mod bitplane_dma;
pub mod blitter;
pub mod copper;
pub mod sprite_dma;
