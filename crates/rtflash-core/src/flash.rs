//! Memory map types
//!
//! Drivers describe the target's memory to the framework with these types:
//! RAM regions, flash regions and the geometry of an attached flash chip.

use crate::spi::opcodes;

/// Page size assumed when the flash cannot describe itself
pub const FALLBACK_PAGE_SIZE: u32 = 256;
/// Sector size assumed when the flash cannot describe itself
pub const FALLBACK_SECTOR_SIZE: u32 = 4096;

/// JEDEC identification of a SPI flash chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JedecId {
    /// Manufacturer ID
    pub manufacturer: u8,
    /// Memory type
    pub device_type: u8,
    /// Capacity as a power of two
    pub capacity_exp: u8,
}

impl JedecId {
    /// Parse the three-byte RDID response
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            manufacturer: bytes[0],
            device_type: bytes[1],
            capacity_exp: bytes[2],
        }
    }

    /// Returns true if the ID looks like a real part
    ///
    /// Any field reading back as 0xFF means nothing drove the bus.
    pub const fn is_valid(&self) -> bool {
        self.manufacturer != 0xFF && self.device_type != 0xFF && self.capacity_exp != 0xFF
    }

    /// Capacity in bytes, if the exponent is representable
    pub const fn capacity(&self) -> Option<u32> {
        1u32.checked_shl(self.capacity_exp as u32)
    }
}

/// Geometry of a flash chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    /// Program page size in bytes
    pub page_size: u32,
    /// Smallest erase unit in bytes
    pub sector_size: u32,
    /// Total size in bytes
    pub capacity: u32,
    /// Opcode erasing one sector
    pub sector_erase_opcode: u8,
}

impl FlashGeometry {
    /// Conservative geometry for a chip of the given capacity
    pub const fn fallback(capacity: u32) -> Self {
        Self {
            page_size: FALLBACK_PAGE_SIZE,
            sector_size: FALLBACK_SECTOR_SIZE,
            capacity,
            sector_erase_opcode: opcodes::SE_20,
        }
    }
}

/// A RAM region in the target's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamRegion {
    /// First address
    pub start: u32,
    /// Length in bytes
    pub length: u32,
}

impl RamRegion {
    /// Create a region
    pub const fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    /// Last address (inclusive); `start` for an empty region
    pub const fn end(&self) -> u32 {
        self.start.saturating_add(self.length.saturating_sub(1))
    }
}

/// A flash region in the target's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashRegion {
    /// First address of the memory-mapped window
    pub start: u32,
    /// Length in bytes
    pub length: u32,
    /// Erase block size in bytes
    pub block_size: u32,
    /// Program page size in bytes
    pub page_size: u32,
    /// Value of an erased byte
    pub erased: u8,
    /// Opcode erasing one block
    pub erase_opcode: u8,
}

impl FlashRegion {
    /// Describe a memory-mapped window onto a flash chip of the given geometry
    pub const fn from_geometry(start: u32, geometry: &FlashGeometry) -> Self {
        Self {
            start,
            length: geometry.capacity,
            block_size: geometry.sector_size,
            page_size: geometry.page_size,
            erased: 0xFF,
            erase_opcode: geometry.sector_erase_opcode,
        }
    }

    /// Last address (inclusive); `start` for an empty region
    pub const fn end(&self) -> u32 {
        self.start.saturating_add(self.length.saturating_sub(1))
    }
}
