//! rtflash-sim - Simulated i.MXRT10xx target for testing
//!
//! This crate provides an in-memory model of the parts of an i.MXRT10xx
//! that a flash driver talks to over the debug transport: the SRC boot
//! mode registers, the FlexSPI1 IP command path (LUT, LUT lock, IP FIFOs,
//! interrupt flags) and an external SPI NOR chip on the FlexSPI bus. It is
//! useful for testing and development without real hardware.
//!
//! The model executes IP commands by decoding the LUT sequence the way the
//! controller does, so it checks what a driver programs rather than trusting
//! it.

#![warn(missing_docs)]

mod flash;

pub use flash::{SimFlash, SimFlashConfig};

use rtflash_core::error::{Error, Result};
use rtflash_core::memory::MemoryAccess;

/// SRC boot mode register 1 (BOOT_CFG)
pub const SRC_SBMR1: u32 = 0x400F_8004;
/// SRC boot mode register 2 (BOOT_MODE in bits 25:24)
pub const SRC_SBMR2: u32 = 0x400F_801C;
/// FlexSPI1 register block
pub const FLEXSPI1_BASE: u32 = 0x402A_8000;

const MCR0: u32 = 0x000;
const INTR: u32 = 0x014;
const LUTKEY: u32 = 0x018;
const LUTCR: u32 = 0x01C;
const FLSHCR1: u32 = 0x070;
const IPCR0: u32 = 0x0A0;
const IPCR1: u32 = 0x0A4;
const IPCMD: u32 = 0x0B0;
const IPRXFCR: u32 = 0x0B8;
const IPTXFCR: u32 = 0x0BC;
const RFDR: u32 = 0x100;
const TFDR: u32 = 0x180;
const LUT: u32 = 0x200;

const MCR0_SUSPEND: u32 = 1 << 1;
const MCR0_RESET_BITS: u32 = 0xFFFF_8010;
const INTR_CMD_DONE: u32 = 1 << 0;
const INTR_RX_WATERMARK: u32 = 1 << 5;
const INTR_TX_EMPTY: u32 = 1 << 6;
const LUT_KEY: u32 = 0x5AF0_5AF0;
const LUTCR_LOCK: u32 = 1;
const LUTCR_UNLOCK: u32 = 2;
const FLSHCR1_CAS_SHIFT: u32 = 11;
const FLSHCR1_CAS_MASK: u32 = 0xF << FLSHCR1_CAS_SHIFT;
const FIFO_CLEAR: u32 = 1 << 0;

/// Size of one IP FIFO window
pub const FIFO_SIZE: usize = 128;
/// Size of the LUT (16 sequences of 8 instructions)
pub const LUT_SIZE: usize = 256;
/// Size of one LUT sequence
pub const SEQUENCE_SIZE: usize = 16;

const OP_STOP: u8 = 0x00;
const OP_CMD: u8 = 0x01;
const OP_RADDR: u8 = 0x02;
const OP_CADDR: u8 = 0x03;
const OP_WRITE: u8 = 0x08;
const OP_READ: u8 = 0x09;
const OP_DUMMY: u8 = 0x0C;

/// What boot ROM firmware typically leaves in sequence 0: quad I/O read
pub const FIRMWARE_SEQUENCE: [u8; SEQUENCE_SIZE] = [
    0xEB, 0x04, 0x18, 0x0A, 0x06, 0x32, 0x04, 0x26, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Configuration for the simulated target
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Value of SRC_SBMR1 (BOOT_CFG fuses)
    pub boot_cfg: u32,
    /// BOOT_MODE pins, 0..=3
    pub boot_mode: u8,
    /// Column address bit count in FLSHCR1
    pub column_bits: u8,
    /// FlexSPI left suspended by the firmware
    pub suspended: bool,
    /// LUT left locked by the firmware
    pub lut_locked: bool,
    /// INTR reads before an IP command reports done
    pub done_delay: u32,
    /// IP commands never complete
    pub hang_commands: bool,
    /// Address whose accesses fail at the transport level
    pub fault_addr: Option<u32>,
    /// Initial content of LUT sequence 0
    pub firmware_sequence: [u8; SEQUENCE_SIZE],
    /// The attached flash chip
    pub flash: SimFlashConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            boot_cfg: 0x0000_0000,
            boot_mode: 2,
            column_bits: 0,
            suspended: false,
            lut_locked: true,
            done_delay: 0,
            hang_commands: false,
            fault_addr: None,
            firmware_sequence: FIRMWARE_SEQUENCE,
            flash: SimFlashConfig::default(),
        }
    }
}

/// Direction of a data phase seen on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPhase {
    /// No data phase
    None,
    /// Data read from the chip
    Read(usize),
    /// Data written to the chip
    Write(usize),
}

/// An IP command the controller executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedCommand {
    /// The LUT sequence as it was when the command was triggered
    pub sequence: [u8; SEQUENCE_SIZE],
    /// Command byte sent to the chip
    pub opcode: u8,
    /// Address sent to the chip, if any
    pub address: Option<u32>,
    /// Row address bits of the RADDR instruction
    pub row_bits: u8,
    /// Column address bits of the CADDR instruction
    pub column_bits: u8,
    /// Dummy cycles
    pub dummy_cycles: u8,
    /// Data phase
    pub data: DataPhase,
}

/// Simulated i.MXRT10xx target
#[derive(Debug, Clone)]
pub struct SimTarget {
    config: SimConfig,
    flash: SimFlash,
    mcr0: u32,
    intr: u32,
    lut_key: u32,
    lut_control: u32,
    flshcr1: u32,
    ipcr0: u32,
    ipcr1: u32,
    rx_fifo_control: u32,
    tx_fifo_control: u32,
    rx_fifo: [u8; FIFO_SIZE],
    tx_fifo: [u8; FIFO_SIZE],
    lut: [u8; LUT_SIZE],
    pending_done: Option<u32>,
    commands: Vec<ExecutedCommand>,
    lut_writes: usize,
    locked_lut_writes: usize,
}

impl SimTarget {
    /// Create a simulated target
    pub fn new(config: SimConfig) -> Self {
        let mut lut = [0u8; LUT_SIZE];
        lut[..SEQUENCE_SIZE].copy_from_slice(&config.firmware_sequence);
        let mcr0 = if config.suspended {
            MCR0_RESET_BITS | MCR0_SUSPEND
        } else {
            MCR0_RESET_BITS
        };
        Self {
            flash: SimFlash::new(config.flash.clone()),
            mcr0,
            intr: INTR_TX_EMPTY,
            lut_key: 0,
            lut_control: if config.lut_locked {
                LUTCR_LOCK
            } else {
                LUTCR_UNLOCK
            },
            flshcr1: 0x63 | (((config.column_bits as u32) << FLSHCR1_CAS_SHIFT) & FLSHCR1_CAS_MASK),
            ipcr0: 0,
            ipcr1: 0,
            rx_fifo_control: 0,
            tx_fifo_control: 0,
            rx_fifo: [0; FIFO_SIZE],
            tx_fifo: [0; FIFO_SIZE],
            lut,
            pending_done: None,
            commands: Vec::new(),
            lut_writes: 0,
            locked_lut_writes: 0,
            config,
        }
    }

    /// Create a simulated target with the default configuration
    pub fn new_default() -> Self {
        Self::new(SimConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The attached flash chip
    pub fn flash(&self) -> &SimFlash {
        &self.flash
    }

    /// Mutable access to the attached flash chip
    pub fn flash_mut(&mut self) -> &mut SimFlash {
        &mut self.flash
    }

    /// Current MCR0 value
    pub fn module_control(&self) -> u32 {
        self.mcr0
    }

    /// Current LUTCR value
    pub fn lut_control(&self) -> u32 {
        self.lut_control
    }

    /// Current interrupt flags
    pub fn interrupts(&self) -> u32 {
        self.intr
    }

    /// Current RX and TX FIFO control values
    pub fn fifo_control(&self) -> (u32, u32) {
        (self.rx_fifo_control, self.tx_fifo_control)
    }

    /// Current content of LUT sequence 0
    pub fn sequence(&self) -> [u8; SEQUENCE_SIZE] {
        let mut seq = [0u8; SEQUENCE_SIZE];
        seq.copy_from_slice(&self.lut[..SEQUENCE_SIZE]);
        seq
    }

    /// IP commands executed so far
    pub fn commands(&self) -> &[ExecutedCommand] {
        &self.commands
    }

    /// Number of word writes to the LUT that were accepted
    pub fn lut_writes(&self) -> usize {
        self.lut_writes
    }

    /// Number of word writes to the LUT dropped because it was locked
    pub fn locked_lut_writes(&self) -> usize {
        self.locked_lut_writes
    }

    /// Make accesses to `addr` fail, or clear the fault
    pub fn set_fault(&mut self, addr: Option<u32>) {
        self.config.fault_addr = addr;
    }

    /// Make IP commands hang, or let them complete again
    pub fn set_hang(&mut self, hang: bool) {
        self.config.hang_commands = hang;
    }

    fn read_word(&mut self, addr: u32) -> Result<u32> {
        match addr {
            SRC_SBMR1 => return Ok(self.config.boot_cfg),
            SRC_SBMR2 => return Ok(((self.config.boot_mode as u32) & 0x3) << 24),
            _ => {}
        }

        let offset = addr
            .checked_sub(FLEXSPI1_BASE)
            .ok_or(Error::MemoryAccess { addr })?;
        let value = match offset {
            MCR0 => self.mcr0,
            INTR => self.read_interrupts(),
            LUTKEY => self.lut_key,
            LUTCR => self.lut_control,
            FLSHCR1 => self.flshcr1,
            IPCR0 => self.ipcr0,
            IPCR1 => self.ipcr1,
            IPCMD => 0,
            IPRXFCR => self.rx_fifo_control,
            IPTXFCR => self.tx_fifo_control,
            o if (RFDR..TFDR).contains(&o) => fifo_word(&self.rx_fifo, (o - RFDR) as usize),
            o if (TFDR..LUT).contains(&o) => fifo_word(&self.tx_fifo, (o - TFDR) as usize),
            o if (LUT..LUT + LUT_SIZE as u32).contains(&o) => {
                fifo_word(&self.lut, (o - LUT) as usize)
            }
            _ => return Err(Error::MemoryAccess { addr }),
        };
        Ok(value)
    }

    fn write_word(&mut self, addr: u32, value: u32) -> Result<()> {
        if addr == SRC_SBMR1 || addr == SRC_SBMR2 {
            log::warn!("sim: write to read-only SRC register 0x{:08X}", addr);
            return Ok(());
        }

        let offset = addr
            .checked_sub(FLEXSPI1_BASE)
            .ok_or(Error::MemoryAccess { addr })?;
        match offset {
            MCR0 => self.mcr0 = value,
            INTR => self.intr &= !value,
            LUTKEY => self.lut_key = value,
            LUTCR => {
                if self.lut_key == LUT_KEY && (value == LUTCR_LOCK || value == LUTCR_UNLOCK) {
                    self.lut_control = value;
                } else {
                    log::warn!("sim: LUTCR write 0x{:X} without key", value);
                }
                self.lut_key = 0;
            }
            FLSHCR1 => self.flshcr1 = value,
            IPCR0 => self.ipcr0 = value,
            IPCR1 => self.ipcr1 = value,
            IPCMD => {
                if value & 1 != 0 {
                    self.trigger();
                }
            }
            IPRXFCR => {
                if value & FIFO_CLEAR != 0 {
                    self.rx_fifo = [0; FIFO_SIZE];
                    self.intr &= !INTR_RX_WATERMARK;
                }
                self.rx_fifo_control = value & !FIFO_CLEAR;
            }
            IPTXFCR => {
                if value & FIFO_CLEAR != 0 {
                    self.tx_fifo = [0; FIFO_SIZE];
                    self.intr |= INTR_TX_EMPTY;
                }
                self.tx_fifo_control = value & !FIFO_CLEAR;
            }
            o if (RFDR..TFDR).contains(&o) => {}
            o if (TFDR..LUT).contains(&o) => {
                set_fifo_word(&mut self.tx_fifo, (o - TFDR) as usize, value)
            }
            o if (LUT..LUT + LUT_SIZE as u32).contains(&o) => {
                if self.lut_control == LUTCR_UNLOCK {
                    set_fifo_word(&mut self.lut, (o - LUT) as usize, value);
                    self.lut_writes += 1;
                } else {
                    self.locked_lut_writes += 1;
                }
            }
            _ => return Err(Error::MemoryAccess { addr }),
        }
        Ok(())
    }

    fn read_interrupts(&mut self) -> u32 {
        if let Some(remaining) = self.pending_done {
            if self.config.hang_commands {
                return self.intr;
            }
            if remaining == 0 {
                self.intr |= INTR_CMD_DONE;
                self.pending_done = None;
            } else {
                self.pending_done = Some(remaining - 1);
            }
        }
        self.intr
    }

    /// Execute the sequence selected by IPCR1 against the flash chip
    fn trigger(&mut self) {
        let index = ((self.ipcr1 >> 16) & 0xF) as usize;
        let length = (self.ipcr1 & 0xFFFF) as usize;
        let start = index * SEQUENCE_SIZE;
        let mut sequence = [0u8; SEQUENCE_SIZE];
        sequence.copy_from_slice(&self.lut[start..start + SEQUENCE_SIZE]);

        let mut command = ExecutedCommand {
            sequence,
            opcode: 0,
            address: None,
            row_bits: 0,
            column_bits: 0,
            dummy_cycles: 0,
            data: DataPhase::None,
        };
        for slot in sequence.chunks_exact(2) {
            let operand = slot[0];
            match slot[1] >> 2 {
                OP_STOP => break,
                OP_CMD => command.opcode = operand,
                OP_RADDR => command.row_bits = operand,
                OP_CADDR => command.column_bits = operand,
                OP_DUMMY => command.dummy_cycles = operand,
                OP_READ => command.data = DataPhase::Read(length.min(FIFO_SIZE)),
                OP_WRITE => command.data = DataPhase::Write(length.min(FIFO_SIZE)),
                op => {
                    log::warn!("sim: unsupported LUT opcode 0x{:02X}", op);
                    break;
                }
            }
        }

        let address_bits = command.row_bits as u32 + command.column_bits as u32;
        if address_bits > 0 {
            let mask = 1u32.checked_shl(address_bits).map_or(u32::MAX, |v| v - 1);
            command.address = Some(self.ipcr0 & mask);
        }

        log::trace!("sim: IP command {:02X?}", command);
        match command.data {
            DataPhase::Read(len) => {
                let mut buf = [0xFFu8; FIFO_SIZE];
                self.flash.execute(
                    command.opcode,
                    command.address,
                    command.dummy_cycles,
                    &mut buf[..len],
                    &[],
                );
                self.rx_fifo = buf;
                self.intr |= INTR_RX_WATERMARK;
            }
            DataPhase::Write(len) => {
                let data = self.tx_fifo;
                self.flash.execute(
                    command.opcode,
                    command.address,
                    command.dummy_cycles,
                    &mut [],
                    &data[..len],
                );
                self.intr |= INTR_TX_EMPTY;
            }
            DataPhase::None => self.flash.execute(
                command.opcode,
                command.address,
                command.dummy_cycles,
                &mut [],
                &[],
            ),
        }

        self.commands.push(command);
        self.pending_done = Some(self.config.done_delay);
    }
}

fn fifo_word(buf: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn set_fifo_word(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

impl MemoryAccess for SimTarget {
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        if addr % 4 != 0 || buf.len() % 4 != 0 {
            return Err(Error::InvalidAlignment);
        }
        for (i, chunk) in buf.chunks_exact_mut(4).enumerate() {
            let word_addr = addr + (i as u32) * 4;
            if self.config.fault_addr == Some(word_addr) {
                return Err(Error::MemoryAccess { addr: word_addr });
            }
            chunk.copy_from_slice(&self.read_word(word_addr)?.to_le_bytes());
        }
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        if addr % 4 != 0 || data.len() % 4 != 0 {
            return Err(Error::InvalidAlignment);
        }
        for (i, chunk) in data.chunks_exact(4).enumerate() {
            let word_addr = addr + (i as u32) * 4;
            if self.config.fault_addr == Some(word_addr) {
                return Err(Error::MemoryAccess { addr: word_addr });
            }
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            self.write_word(word_addr, u32::from_le_bytes(word))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtflash_core::spi::opcodes;

    fn unlock(sim: &mut SimTarget) {
        sim.write32(FLEXSPI1_BASE + LUTKEY, LUT_KEY).unwrap();
        sim.write32(FLEXSPI1_BASE + LUTCR, LUTCR_UNLOCK).unwrap();
    }

    fn wait_done(sim: &mut SimTarget) {
        while sim.read32(FLEXSPI1_BASE + INTR).unwrap() & INTR_CMD_DONE == 0 {}
        sim.write32(FLEXSPI1_BASE + INTR, INTR_CMD_DONE).unwrap();
    }

    #[test]
    fn test_boot_registers() {
        let mut sim = SimTarget::new(SimConfig {
            boot_cfg: 0x40,
            boot_mode: 1,
            ..Default::default()
        });
        assert_eq!(sim.read32(SRC_SBMR1).unwrap(), 0x40);
        assert_eq!(sim.read32(SRC_SBMR2).unwrap(), 0x0100_0000);
    }

    #[test]
    fn test_unmapped_and_unaligned_access() {
        let mut sim = SimTarget::new_default();
        assert_eq!(
            sim.read32(0x1000_0000),
            Err(Error::MemoryAccess { addr: 0x1000_0000 })
        );
        let mut buf = [0u8; 2];
        assert_eq!(
            sim.read(FLEXSPI1_BASE, &mut buf),
            Err(Error::InvalidAlignment)
        );
    }

    #[test]
    fn test_lut_lock_needs_key() {
        let mut sim = SimTarget::new_default();
        sim.write32(FLEXSPI1_BASE + LUTCR, LUTCR_UNLOCK).unwrap();
        assert_eq!(sim.lut_control(), LUTCR_LOCK);

        sim.write32(FLEXSPI1_BASE + LUT, 0).unwrap();
        assert_eq!(sim.locked_lut_writes(), 1);
        assert_eq!(sim.sequence(), FIRMWARE_SEQUENCE);

        unlock(&mut sim);
        assert_eq!(sim.lut_control(), LUTCR_UNLOCK);
        sim.write32(FLEXSPI1_BASE + LUT, 0).unwrap();
        assert_eq!(sim.lut_writes(), 1);
    }

    #[test]
    fn test_interrupts_write_one_to_clear() {
        let mut sim = SimTarget::new_default();
        assert_eq!(sim.interrupts(), INTR_TX_EMPTY);
        sim.write32(FLEXSPI1_BASE + INTR, INTR_CMD_DONE).unwrap();
        assert_eq!(sim.interrupts(), INTR_TX_EMPTY);
        sim.write32(FLEXSPI1_BASE + INTR, INTR_TX_EMPTY).unwrap();
        assert_eq!(sim.interrupts(), 0);
    }

    #[test]
    fn test_ip_command_reads_jedec_id() {
        let mut sim = SimTarget::new(SimConfig {
            done_delay: 2,
            ..Default::default()
        });
        unlock(&mut sim);
        // CMD 0x9F, DUMMY 0, READ
        let seq: [u8; 16] = [0x9F, 0x04, 0x00, 0x30, 0x00, 0x24, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        sim.write(FLEXSPI1_BASE + LUT, &seq).unwrap();
        sim.write32(FLEXSPI1_BASE + IPCR1, 3).unwrap();
        sim.write32(FLEXSPI1_BASE + IPCMD, 1).unwrap();

        // Done only shows up after the configured delay
        assert_eq!(sim.read32(FLEXSPI1_BASE + INTR).unwrap() & INTR_CMD_DONE, 0);
        wait_done(&mut sim);

        let mut fifo = [0u8; 4];
        sim.read(FLEXSPI1_BASE + RFDR, &mut fifo).unwrap();
        assert_eq!(&fifo[..3], &[0xEF, 0x40, 0x16]);

        let command = &sim.commands()[0];
        assert_eq!(command.opcode, opcodes::RDID);
        assert_eq!(command.address, None);
        assert_eq!(command.data, DataPhase::Read(3));
    }

    #[test]
    fn test_ip_command_addressed_read() {
        let mut sim = SimTarget::new_default();
        sim.flash_mut().data_mut()[0x1234..0x1238].copy_from_slice(&[1, 2, 3, 4]);
        unlock(&mut sim);
        // CMD 0x03, RADDR 24, DUMMY 0, READ
        let seq: [u8; 16] = [0x03, 0x04, 0x18, 0x08, 0x00, 0x30, 0x00, 0x24, 0, 0, 0, 0, 0, 0, 0, 0];
        sim.write(FLEXSPI1_BASE + LUT, &seq).unwrap();
        sim.write32(FLEXSPI1_BASE + IPCR0, 0x6000_1234).unwrap();
        sim.write32(FLEXSPI1_BASE + IPCR1, 4).unwrap();
        sim.write32(FLEXSPI1_BASE + IPCMD, 1).unwrap();
        wait_done(&mut sim);

        assert_eq!(sim.read32(FLEXSPI1_BASE + RFDR).unwrap(), 0x0403_0201);
        assert_eq!(sim.commands()[0].address, Some(0x1234));
        assert_eq!(sim.commands()[0].row_bits, 24);
    }

    #[test]
    fn test_fault_injection() {
        let mut sim = SimTarget::new_default();
        sim.set_fault(Some(FLEXSPI1_BASE + MCR0));
        assert_eq!(
            sim.read32(FLEXSPI1_BASE + MCR0),
            Err(Error::MemoryAccess {
                addr: FLEXSPI1_BASE + MCR0
            })
        );
        sim.set_fault(None);
        assert_eq!(sim.read32(FLEXSPI1_BASE + MCR0).unwrap(), MCR0_RESET_BITS);
    }

    #[test]
    fn test_fifo_clear() {
        let mut sim = SimTarget::new_default();
        sim.write32(FLEXSPI1_BASE + TFDR, 0xDEAD_BEEF).unwrap();
        sim.write32(FLEXSPI1_BASE + IPTXFCR, 0x3D).unwrap();
        assert_eq!(sim.read32(FLEXSPI1_BASE + TFDR).unwrap(), 0);
        assert_eq!(sim.fifo_control(), (0, 0x3C));
    }
}
