//! Address width types

/// Address phase of a flash command
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// No address phase (opcode only)
    #[default]
    None,
    /// 3-byte (24-bit) address - supports up to 16 MiB
    ThreeByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 3,
        }
    }

    /// Returns the number of address bits clocked out on the bus
    pub const fn bits(&self) -> u8 {
        self.bytes() * 8
    }

    /// Returns true if the command carries an address
    pub const fn is_addressed(&self) -> bool {
        !matches!(self, Self::None)
    }
}
