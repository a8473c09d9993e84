//! Chipset configuration.
//!
//! Every field has a sensible default for a stock PAL A500. Configurations
//! can be loaded from JSON; missing fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ChipsetError;

/// Custom chip generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipRevision {
    /// Original Chip Set.
    #[default]
    Ocs,
    /// Enhanced Chip Set: big blits, DIWHIGH, relaxed copper danger range.
    Ecs,
    /// Advanced Graphics Architecture: FMODE, 8 bitplanes, 24-bit palette.
    Aga,
}

impl ChipRevision {
    #[must_use]
    pub fn is_ecs_or_later(self) -> bool {
        matches!(self, Self::Ecs | Self::Aga)
    }

    /// Agnus/Alice id returned in VPOSR bits 8-14.
    #[must_use]
    pub fn agnus_id(self, region: Region) -> u16 {
        match (self, region) {
            (Self::Ocs, Region::Pal) => 0x00,
            (Self::Ocs, Region::Ntsc) => 0x10,
            (Self::Ecs, Region::Pal) => 0x20,
            (Self::Ecs, Region::Ntsc) => 0x30,
            (Self::Aga, Region::Pal) => 0x22,
            (Self::Aga, Region::Ntsc) => 0x32,
        }
    }
}

/// Video region (affects frame height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// 312 lines per frame.
    #[default]
    Pal,
    /// 262 lines per frame.
    Ntsc,
}

impl Region {
    #[must_use]
    pub const fn lines_per_frame(self) -> u16 {
        match self {
            Self::Pal => 312,
            Self::Ntsc => 262,
        }
    }
}

/// Colour clocks per raster line.
pub const CCKS_PER_LINE: u16 = 227;

/// Virtual ticks per colour clock. One tick is one low-res pixel.
pub const TICKS_PER_CCK: u64 = 2;

/// Virtual ticks per raster line.
pub const TICKS_PER_LINE: u64 = CCKS_PER_LINE as u64 * TICKS_PER_CCK;

const MIN_CHIP_RAM: u32 = 256 * 1024;
const MAX_CHIP_RAM: u32 = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipsetConfig {
    pub revision: ChipRevision,
    pub region: Region,
    /// Chip RAM in bytes. Determines the DMA pointer mask.
    pub chip_ram_size: u32,
    /// Extra copper slots spent after a WAIT resolves, before the next fetch.
    pub copper_wake_slots: u8,
    /// Completion budget in ticks for blits started with BLTPRI set.
    pub nasty_blit_ticks: u32,
    /// Sprite fetch buffers available to the rasterizer per scanline.
    pub sprite_scratch_slots: usize,
}

impl Default for ChipsetConfig {
    fn default() -> Self {
        Self {
            revision: ChipRevision::Ocs,
            region: Region::Pal,
            chip_ram_size: 512 * 1024,
            copper_wake_slots: 1,
            nasty_blit_ticks: 16,
            sprite_scratch_slots: 8,
        }
    }
}

impl ChipsetConfig {
    /// Stock configuration for a chip generation.
    #[must_use]
    pub fn preset(revision: ChipRevision) -> Self {
        let chip_ram_size = match revision {
            ChipRevision::Ocs => 512 * 1024,
            ChipRevision::Ecs => 1024 * 1024,
            ChipRevision::Aga => 2 * 1024 * 1024,
        };
        Self {
            revision,
            chip_ram_size,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration and validate it.
    pub fn from_json(text: &str) -> Result<Self, ChipsetError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChipsetError> {
        let size = self.chip_ram_size;
        if !size.is_power_of_two() || !(MIN_CHIP_RAM..=MAX_CHIP_RAM).contains(&size) {
            return Err(ChipsetError::InvalidChipRamSize(size));
        }
        Ok(())
    }

    /// Mask applied to every DMA pointer.
    #[must_use]
    pub fn chip_mask(&self) -> u32 {
        (self.chip_ram_size - 1) & !1
    }

    #[must_use]
    pub fn lines_per_frame(&self) -> u16 {
        self.region.lines_per_frame()
    }
}
