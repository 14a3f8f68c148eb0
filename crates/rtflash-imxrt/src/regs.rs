//! i.MXRT10xx register definitions
//!
//! Addresses of the System Reset Controller boot mode registers, the
//! on-chip RAM banks and the FlexSPI1 controller, as seen from the debug
//! transport. FlexSPI register names follow the reference manual.

// ============================================================================
// System Reset Controller
// ============================================================================

/// SRC register block
pub const SRC_BASE: u32 = 0x400F_8000;
/// SRC Boot Mode Register 1 (BOOT_CFG fuses and pins)
pub const SRC_SBMR1: u32 = SRC_BASE + 0x004;
/// SRC Boot Mode Register 2
pub const SRC_SBMR2: u32 = SRC_BASE + 0x01C;
/// BOOT_MODE field of SBMR2
pub const SBMR2_BOOT_MODE_SHIFT: u32 = 24;
/// BOOT_MODE field width mask (after shifting)
pub const SBMR2_BOOT_MODE_MASK: u32 = 0x3;

// ============================================================================
// Memory map
// ============================================================================

/// OCRAM bank 1
pub const OCRAM1_BASE: u32 = 0x2028_0000;
/// OCRAM bank 1 size
pub const OCRAM1_SIZE: u32 = 0x0008_0000;
/// OCRAM bank 2
pub const OCRAM2_BASE: u32 = 0x2020_0000;
/// OCRAM bank 2 size
pub const OCRAM2_SIZE: u32 = 0x0008_0000;
/// FlexSPI1 AHB window onto the external flash
pub const FLEXSPI1_FLASH_BASE: u32 = 0x6000_0000;

// ============================================================================
// FlexSPI1
// ============================================================================

/// FlexSPI1 register block
pub const FLEXSPI1_BASE: u32 = 0x402A_8000;

/// Module Control Register 0
pub const MCR0: u32 = FLEXSPI1_BASE + 0x000;
/// Interrupt Register (write 1 to clear)
pub const INTR: u32 = FLEXSPI1_BASE + 0x014;
/// LUT Key Register
pub const LUTKEY: u32 = FLEXSPI1_BASE + 0x018;
/// LUT Control Register
pub const LUTCR: u32 = FLEXSPI1_BASE + 0x01C;
/// Flash A1 Control Register 1
pub const FLSHCR1: u32 = FLEXSPI1_BASE + 0x070;
/// IP Control Register 0 (serial flash address)
pub const IPCR0: u32 = FLEXSPI1_BASE + 0x0A0;
/// IP Control Register 1 (data size and sequence index)
pub const IPCR1: u32 = FLEXSPI1_BASE + 0x0A4;
/// IP Command Register
pub const IPCMD: u32 = FLEXSPI1_BASE + 0x0B0;
/// IP RX FIFO Control Register
pub const IPRXFCR: u32 = FLEXSPI1_BASE + 0x0B8;
/// IP TX FIFO Control Register
pub const IPTXFCR: u32 = FLEXSPI1_BASE + 0x0BC;
/// IP RX FIFO data window
pub const RFDR: u32 = FLEXSPI1_BASE + 0x100;
/// IP TX FIFO data window
pub const TFDR: u32 = FLEXSPI1_BASE + 0x180;
/// Look-up table
pub const LUT: u32 = FLEXSPI1_BASE + 0x200;

// MCR0 bits
/// Module suspended
pub const MCR0_SUSPEND: u32 = 1 << 1;

// INTR bits
/// IP command done
pub const INTR_CMD_DONE: u32 = 1 << 0;
/// IP RX FIFO watermark available
pub const INTR_RX_FIFO_FULL: u32 = 1 << 5;
/// IP TX FIFO watermark empty
pub const INTR_TX_FIFO_EMPTY: u32 = 1 << 6;

// LUT protection
/// Key written to LUTKEY before any LUTCR change
pub const LUT_KEY: u32 = 0x5AF0_5AF0;
/// LUTCR: lock the LUT
pub const LUTCR_LOCK: u32 = 1;
/// LUTCR: unlock the LUT
pub const LUTCR_UNLOCK: u32 = 2;

// FLSHCR1 fields
/// Column address bit count
pub const FLSHCR1_CAS_MASK: u32 = 0x0000_7800;
/// Column address bit count shift
pub const FLSHCR1_CAS_SHIFT: u32 = 11;

// IPCR1 fields
/// Data size of an IP command
pub const IPCR1_DATA_SIZE_MASK: u32 = 0x0000_FFFF;
/// Sequence index of an IP command
pub const IPCR1_SEQ_INDEX_SHIFT: u32 = 16;

// IPCMD bits
/// Trigger an IP command
pub const IPCMD_TRIGGER: u32 = 1 << 0;

// IP FIFO control bits
/// Clear the FIFO
pub const FIFO_CLEAR: u32 = 1 << 0;

/// Size of one IP FIFO data window
pub const FIFO_SIZE: usize = 128;

/// FIFO watermark field for a watermark of `bytes` bytes
pub const fn fifo_watermark(bytes: u32) -> u32 {
    ((((bytes + 7) >> 3) - 1) & 0xF) << 2
}
