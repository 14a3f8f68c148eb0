//! Boot configuration decoding
//!
//! The boot ROM picks its boot device from BOOT_CFG1[7:4], which the SRC
//! mirrors into the low byte of SBMR1. BOOT_MODE in SBMR2 tells whether the
//! ROM used the fuses, the serial downloader or the boot pins.

use core::fmt;

/// Device the boot ROM loads the image from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootSource {
    /// Serial NOR flash on FlexSPI
    SpiNor,
    /// SD card via uSDHC
    SdCard,
    /// eMMC via uSDHC
    Emmc,
    /// SLC NAND via SEMC
    SlcNand,
    /// Parallel NOR flash via SEMC
    ParallelNor,
    /// Serial NAND flash on FlexSPI
    SpiNand,
}

impl BootSource {
    /// Decode the boot device from an SBMR1 value
    ///
    /// Only bits 7:4 are significant. The bit groups overlap, so the checks
    /// must run in this order. 0b11xx is the only pattern left at the end.
    pub fn from_boot_cfg(boot_cfg: u32) -> Self {
        let src = boot_cfg & 0xF0;
        if src == 0x00 {
            Self::SpiNor
        } else if src & 0xC0 == 0x40 {
            Self::SdCard
        } else if src & 0xC0 == 0x80 {
            Self::Emmc
        } else if src & 0xE0 == 0x20 {
            Self::SlcNand
        } else if src == 0x10 {
            Self::ParallelNor
        } else {
            Self::SpiNand
        }
    }

    /// Returns true for the FlexSPI serial flash sources this driver handles
    pub fn is_serial_flash(&self) -> bool {
        matches!(self, Self::SpiNor | Self::SpiNand)
    }
}

impl fmt::Display for BootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SpiNor => "SPI Flash (NOR)",
            Self::SdCard => "SD Card",
            Self::Emmc => "eMMC via uSDHC",
            Self::SlcNand => "SLC NAND via SEMC",
            Self::ParallelNor => "parallel Flash (NOR) via SEMC",
            Self::SpiNand => "SPI Flash (NAND)",
        };
        f.write_str(name)
    }
}

/// How the boot ROM was told to pick its boot device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootMode {
    /// Boot from fuses
    Fuses,
    /// Serial downloader (USB/UART)
    SerialDownloader,
    /// Internal boot using the BOOT_CFG pins
    InternalBoot,
    /// Reserved encoding
    Reserved,
}

impl BootMode {
    /// Decode BOOT_MODE from an SBMR2 value
    pub fn from_sbmr2(sbmr2: u32) -> Self {
        use crate::regs::{SBMR2_BOOT_MODE_MASK, SBMR2_BOOT_MODE_SHIFT};

        match (sbmr2 >> SBMR2_BOOT_MODE_SHIFT) & SBMR2_BOOT_MODE_MASK {
            0 => Self::Fuses,
            1 => Self::SerialDownloader,
            2 => Self::InternalBoot,
            _ => Self::Reserved,
        }
    }
}

impl fmt::Display for BootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fuses => "boot from fuses",
            Self::SerialDownloader => "serial downloader",
            Self::InternalBoot => "internal boot",
            Self::Reserved => "reserved",
        };
        f.write_str(name)
    }
}
