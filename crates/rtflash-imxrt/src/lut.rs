//! FlexSPI LUT sequence builder
//!
//! A LUT sequence is a micro-program of up to eight instructions the FlexSPI
//! controller runs to perform one flash transaction. Each instruction is two
//! bytes: an operand followed by `opcode << 2 | pads`. Execution stops at
//! the first STOP instruction, which is what an all-zero slot decodes to.

use heapless::Vec;

use rtflash_core::error::{Error, Result};
use rtflash_core::spi::{Direction, FlashCommand};

/// Number of instruction slots in one sequence
pub const SEQUENCE_SLOTS: usize = 8;
/// Size of one sequence in the LUT, in bytes
pub const SEQUENCE_BYTES: usize = SEQUENCE_SLOTS * 2;

/// Address width the FlexSPI sends for a 3-byte addressed command
const ADDRESS_BITS: u8 = 24;

/// LUT instruction opcodes (SDR variants)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LutOpcode {
    /// End of sequence
    Stop = 0x00,
    /// Send a command byte
    Command = 0x01,
    /// Send the row address
    RowAddress = 0x02,
    /// Send the column address
    ColumnAddress = 0x03,
    /// Send data from the TX FIFO
    Write = 0x08,
    /// Receive data into the RX FIFO
    Read = 0x09,
    /// Wait for dummy cycles
    Dummy = 0x0C,
}

impl LutOpcode {
    /// Decode an opcode field, if it is one this driver emits
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0x00 => Self::Stop,
            0x01 => Self::Command,
            0x02 => Self::RowAddress,
            0x03 => Self::ColumnAddress,
            0x08 => Self::Write,
            0x09 => Self::Read,
            0x0C => Self::Dummy,
            _ => return None,
        })
    }
}

/// Number of data lines an instruction uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PadMode {
    /// One line
    #[default]
    Single = 0,
    /// Two lines
    Dual = 1,
    /// Four lines
    Quad = 2,
    /// Eight lines
    Octal = 3,
}

impl PadMode {
    /// Decode a two-bit pads field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Self::Single,
            1 => Self::Dual,
            2 => Self::Quad,
            _ => Self::Octal,
        }
    }
}

/// One packed LUT instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LutInstruction {
    /// Operand byte: command, address width, dummy count or data hint
    pub operand: u8,
    /// `opcode << 2 | pads`
    pub opcode_mode: u8,
}

impl LutInstruction {
    /// Build an instruction
    pub const fn new(opcode: LutOpcode, pads: PadMode, operand: u8) -> Self {
        Self {
            operand,
            opcode_mode: ((opcode as u8 & 0x3F) << 2) | pads as u8,
        }
    }

    /// Single-pad instruction, the only kind this driver issues
    pub const fn single(opcode: LutOpcode, operand: u8) -> Self {
        Self::new(opcode, PadMode::Single, operand)
    }

    /// Decode the opcode field
    pub fn opcode(&self) -> Option<LutOpcode> {
        LutOpcode::from_bits(self.opcode_mode >> 2)
    }

    /// Decode the pads field
    pub fn pads(&self) -> PadMode {
        PadMode::from_bits(self.opcode_mode)
    }

    /// Returns true for the all-zero STOP slot
    pub fn is_stop(&self) -> bool {
        self.opcode_mode >> 2 == LutOpcode::Stop as u8
    }
}

/// A LUT sequence of at most [`SEQUENCE_SLOTS`] populated instructions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LutSequence {
    slots: Vec<LutInstruction, SEQUENCE_SLOTS>,
}

impl LutSequence {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction
    pub fn push(&mut self, instruction: LutInstruction) -> Result<()> {
        self.slots
            .push(instruction)
            .map_err(|_| Error::SequenceOverflow)
    }

    /// Build the IP command sequence for `command`
    ///
    /// `column_bits` is the column address width configured in FLSHCR1 and
    /// `length` the number of data bytes to transfer.
    pub fn build(command: &FlashCommand, column_bits: u8, length: usize) -> Result<Self> {
        let mut seq = Self::new();
        seq.push(LutInstruction::single(LutOpcode::Command, command.opcode))?;
        if command.has_address() {
            seq.push(LutInstruction::single(
                LutOpcode::RowAddress,
                ADDRESS_BITS.saturating_sub(column_bits),
            ))?;
            if column_bits != 0 {
                seq.push(LutInstruction::single(
                    LutOpcode::ColumnAddress,
                    column_bits,
                ))?;
            }
        }
        // Emitted even for zero cycles
        seq.push(LutInstruction::single(
            LutOpcode::Dummy,
            command.dummy_cycles,
        ))?;
        if length > 0 {
            let opcode = match command.direction {
                Direction::In => LutOpcode::Read,
                Direction::Out => LutOpcode::Write,
            };
            seq.push(LutInstruction::single(opcode, 0))?;
        }
        Ok(seq)
    }

    /// Populated instructions
    pub fn instructions(&self) -> &[LutInstruction] {
        &self.slots
    }

    /// Number of populated instructions
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no instruction is populated
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Pack into the LUT layout, unused slots zeroed
    pub fn to_bytes(&self) -> [u8; SEQUENCE_BYTES] {
        let mut bytes = [0u8; SEQUENCE_BYTES];
        for (slot, instruction) in bytes.chunks_exact_mut(2).zip(&self.slots) {
            slot[0] = instruction.operand;
            slot[1] = instruction.opcode_mode;
        }
        bytes
    }

    /// Unpack from the LUT layout, stopping at the first STOP slot
    pub fn from_bytes(bytes: &[u8; SEQUENCE_BYTES]) -> Self {
        let mut seq = Self::new();
        for slot in bytes.chunks_exact(2) {
            let instruction = LutInstruction {
                operand: slot[0],
                opcode_mode: slot[1],
            };
            if instruction.is_stop() {
                break;
            }
            // Cannot overflow: the input holds exactly SEQUENCE_SLOTS slots
            let _ = seq.slots.push(instruction);
        }
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtflash_core::spi::opcodes;

    fn opcodes_of(seq: &LutSequence) -> std::vec::Vec<LutOpcode> {
        seq.instructions()
            .iter()
            .map(|i| i.opcode().unwrap())
            .collect()
    }

    #[test]
    fn test_instruction_encoding() {
        let cmd = LutInstruction::single(LutOpcode::Command, 0x9F);
        assert_eq!(cmd.operand, 0x9F);
        assert_eq!(cmd.opcode_mode, 0x04);
        let read = LutInstruction::new(LutOpcode::Read, PadMode::Quad, 0x04);
        assert_eq!(read.opcode_mode, 0x26);
        assert_eq!(read.pads(), PadMode::Quad);
        assert_eq!(LutInstruction::single(LutOpcode::Dummy, 8).opcode_mode, 0x30);
    }

    #[test]
    fn test_opcode_only_no_data_uses_two_slots() {
        for command in [FlashCommand::WRITE_ENABLE, FlashCommand::CHIP_ERASE] {
            let seq = LutSequence::build(&command, 0, 0).unwrap();
            assert_eq!(seq.len(), 2);
            assert_eq!(opcodes_of(&seq), [LutOpcode::Command, LutOpcode::Dummy]);
        }
        // Direction does not matter without a data phase
        let seq = LutSequence::build(&FlashCommand::READ_STATUS, 0, 0).unwrap();
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_addressed_with_data_uses_four_slots() {
        let seq = LutSequence::build(&FlashCommand::READ_SFDP, 0, 16).unwrap();
        assert_eq!(
            opcodes_of(&seq),
            [
                LutOpcode::Command,
                LutOpcode::RowAddress,
                LutOpcode::Dummy,
                LutOpcode::Read
            ]
        );
        assert_eq!(seq.instructions()[0].operand, opcodes::RDSFDP);
        assert_eq!(seq.instructions()[1].operand, 24);
        assert_eq!(seq.instructions()[2].operand, 8);

        let program = FlashCommand::addressed(opcodes::PP, Direction::Out);
        let seq = LutSequence::build(&program, 0, 4).unwrap();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.instructions()[3].opcode(), Some(LutOpcode::Write));
    }

    #[test]
    fn test_column_address_split() {
        let seq = LutSequence::build(&FlashCommand::READ_SFDP, 3, 8).unwrap();
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.instructions()[1].operand, 21);
        assert_eq!(
            seq.instructions()[2],
            LutInstruction::single(LutOpcode::ColumnAddress, 3)
        );
    }

    #[test]
    fn test_packed_layout() {
        let seq = LutSequence::build(&FlashCommand::READ_JEDEC_ID, 0, 3).unwrap();
        assert_eq!(
            seq.to_bytes(),
            [0x9F, 0x04, 0x00, 0x30, 0x00, 0x24, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(LutSequence::from_bytes(&seq.to_bytes()), seq);
    }

    #[test]
    fn test_overflow_is_checked() {
        let mut seq = LutSequence::new();
        for _ in 0..SEQUENCE_SLOTS {
            seq.push(LutInstruction::single(LutOpcode::Dummy, 0)).unwrap();
        }
        assert_eq!(
            seq.push(LutInstruction::single(LutOpcode::Dummy, 0)),
            Err(Error::SequenceOverflow)
        );
        assert_eq!(seq.len(), SEQUENCE_SLOTS);
    }
}
