//! Flash command descriptor
//!
//! A [`FlashCommand`] describes everything about a flash transaction except
//! the data itself: the transfer length comes from the buffer handed to the
//! controller alongside it.
//!
//! Commands pack into a 32-bit word, which is how they appear in trace logs:
//!
//! | Bits | Field |
//! |---|---|
//! | 7:0 | opcode |
//! | 15:8 | dummy cycle count |
//! | 16 | addressing (0 = opcode only, 1 = 3-byte address) |
//! | 17 | data direction (0 = in, 1 = out) |

use super::{opcodes, AddressWidth};

const DUMMY_SHIFT: u32 = 8;
const ADDR_3B: u32 = 1 << 16;
const DATA_OUT: u32 = 1 << 17;

/// Direction of the data phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Data flows from the flash chip to the controller
    #[default]
    In,
    /// Data flows from the controller to the flash chip
    Out,
}

/// An abstract flash command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlashCommand {
    /// The opcode byte
    pub opcode: u8,
    /// Dummy cycles between the address and data phases
    pub dummy_cycles: u8,
    /// Address phase
    pub address_width: AddressWidth,
    /// Data phase direction
    pub direction: Direction,
}

impl FlashCommand {
    /// Write Enable
    pub const WRITE_ENABLE: Self = Self::opcode_only(opcodes::WREN, Direction::Out);
    /// Chip Erase
    pub const CHIP_ERASE: Self = Self::opcode_only(opcodes::CE_60, Direction::Out);
    /// Read Status Register 1
    pub const READ_STATUS: Self = Self::opcode_only(opcodes::RDSR, Direction::In);
    /// Read JEDEC ID
    pub const READ_JEDEC_ID: Self = Self::opcode_only(opcodes::RDID, Direction::In);
    /// Read SFDP
    pub const READ_SFDP: Self = Self::addressed(opcodes::RDSFDP, Direction::In)
        .with_dummy_cycles(opcodes::RDSFDP_DUMMY_CYCLES);

    /// Create a command without an address phase
    pub const fn opcode_only(opcode: u8, direction: Direction) -> Self {
        Self {
            opcode,
            dummy_cycles: 0,
            address_width: AddressWidth::None,
            direction,
        }
    }

    /// Create a command with a 3-byte address phase
    pub const fn addressed(opcode: u8, direction: Direction) -> Self {
        Self {
            opcode,
            dummy_cycles: 0,
            address_width: AddressWidth::ThreeByte,
            direction,
        }
    }

    /// Set the number of dummy cycles
    pub const fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Returns true if this command has an address phase
    pub const fn has_address(&self) -> bool {
        self.address_width.is_addressed()
    }

    /// Pack the command into its 32-bit word form
    pub const fn to_word(&self) -> u32 {
        let mut word = self.opcode as u32 | ((self.dummy_cycles as u32) << DUMMY_SHIFT);
        if self.has_address() {
            word |= ADDR_3B;
        }
        if matches!(self.direction, Direction::Out) {
            word |= DATA_OUT;
        }
        word
    }
}
