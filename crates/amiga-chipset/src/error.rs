//! Chipset error taxonomy.
//!
//! Protocol violations (illegal copper moves, blit retriggers, malformed line
//! blits) are not errors here: they are logged and the hardware fallback is
//! applied. Only construction and structural failures surface as values.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChipsetError {
    #[error("chip RAM size {0:#X} is not a power of two between 256K and 2M")]
    InvalidChipRamSize(u32),

    #[error("line {line}: {live} sprite fetches live but only {slots} scratch slots")]
    SpriteScratchExhausted { line: u16, live: usize, slots: usize },

    #[error("chipset halted after a fatal error")]
    Halted,

    #[error("invalid chipset configuration: {0}")]
    Config(#[from] serde_json::Error),
}
