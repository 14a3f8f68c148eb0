//! FlexSPI1 IP command path
//!
//! Flash commands are issued as IP commands: a LUT sequence is written to
//! sequence 0, the controller is triggered, and data moves through the
//! 128-byte IP FIFOs. Sequence 0 belongs to the firmware (it is usually the
//! AHB read sequence), so its previous content is saved before every command
//! and written back afterwards.
//!
//! The controller must already be in flash mode, see [`crate::guard`].

use std::time::{Duration, Instant};

use rtflash_core::error::{Error, Result};
use rtflash_core::flash::JedecId;
use rtflash_core::memory::MemoryAccess;
use rtflash_core::spi::FlashCommand;

use crate::lut::{LutSequence, SEQUENCE_BYTES};
use crate::regs;

/// LUT sequence used for IP commands
const SEQUENCE_INDEX: u32 = 0;

/// Sequence 0 borrowed from the firmware for one IP command
///
/// Created by [`Sequence::program`]; the firmware's sequence is written back
/// by [`Sequence::restore`], or when the guard is dropped on an early return.
pub struct Sequence<'a, A: MemoryAccess + ?Sized> {
    mem: &'a mut A,
    saved: [u8; SEQUENCE_BYTES],
    timeout: Option<Duration>,
    restored: bool,
}

impl<'a, A: MemoryAccess + ?Sized> Sequence<'a, A> {
    /// Save sequence 0 and program it for `command`
    pub fn program(
        mem: &'a mut A,
        command: &FlashCommand,
        address: u32,
        length: usize,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut saved = [0u8; SEQUENCE_BYTES];
        mem.read(regs::LUT, &mut saved)?;
        let mut seq = Self {
            mem,
            saved,
            timeout,
            restored: false,
        };
        seq.load(command, address, length)?;
        Ok(seq)
    }

    fn load(&mut self, command: &FlashCommand, address: u32, length: usize) -> Result<()> {
        let column_bits = if command.has_address() {
            let flshcr1 = self.mem.read32(regs::FLSHCR1)?;
            ((flshcr1 & regs::FLSHCR1_CAS_MASK) >> regs::FLSHCR1_CAS_SHIFT) as u8
        } else {
            0
        };
        let program = LutSequence::build(command, column_bits, length)?;
        log::trace!(
            "FlexSPI: command {:05X}, {} instructions, {} bytes",
            command.to_word(),
            program.len(),
            length
        );
        self.mem.write(regs::LUT, &program.to_bytes())?;

        if command.has_address() {
            self.mem.write32(regs::IPCR0, address)?;
        }
        self.mem.write32(
            regs::IPCR1,
            (length as u32 & regs::IPCR1_DATA_SIZE_MASK)
                | (SEQUENCE_INDEX << regs::IPCR1_SEQ_INDEX_SHIFT),
        )
    }

    /// Trigger the command and wait for it to complete
    pub fn run(&mut self) -> Result<()> {
        self.mem.write32(regs::IPCMD, regs::IPCMD_TRIGGER)?;

        let start = Instant::now();
        while self.mem.read32(regs::INTR)? & regs::INTR_CMD_DONE == 0 {
            if let Some(limit) = self.timeout {
                if start.elapsed() >= limit {
                    log::warn!("FlexSPI: IP command did not complete within {:?}", limit);
                    return Err(Error::Timeout);
                }
            }
        }
        self.mem.write32(regs::INTR, regs::INTR_CMD_DONE)
    }

    /// Copy received data out of the RX FIFO
    fn read_fifo(&mut self, buf: &mut [u8]) -> Result<()> {
        check_length(buf.len())?;
        let mut window = [0u8; regs::FIFO_SIZE];
        self.mem.read(regs::RFDR, &mut window)?;
        buf.copy_from_slice(&window[..buf.len()]);
        self.mem.write32(regs::INTR, regs::INTR_RX_FIFO_FULL)
    }

    /// Stage data in the TX FIFO
    fn fill_fifo(&mut self, data: &[u8]) -> Result<()> {
        check_length(data.len())?;
        // The FIFO window only takes whole words
        let padded = (data.len() + 3) & !3;
        let mut window = [0u8; regs::FIFO_SIZE];
        window[..data.len()].copy_from_slice(data);
        self.mem.write(regs::TFDR, &window[..padded])?;
        self.mem.write32(regs::INTR, regs::INTR_TX_FIFO_EMPTY)
    }

    /// Write the firmware's sequence back, reporting transport errors
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.mem.write(regs::LUT, &self.saved)
    }
}

impl<A: MemoryAccess + ?Sized> Drop for Sequence<'_, A> {
    fn drop(&mut self) {
        if !self.restored {
            if let Err(e) = self.mem.write(regs::LUT, &self.saved) {
                log::error!("Failed to restore FlexSPI1 LUT sequence: {}", e);
            }
        }
    }
}

fn check_length(length: usize) -> Result<()> {
    if length > regs::FIFO_SIZE {
        return Err(Error::TransferTooLarge {
            requested: length,
            max: regs::FIFO_SIZE,
        });
    }
    Ok(())
}

/// IP command access to the flash chip on FlexSPI1
pub struct FlexSpi<'a, A: MemoryAccess + ?Sized> {
    mem: &'a mut A,
    timeout: Option<Duration>,
}

impl<'a, A: MemoryAccess + ?Sized> FlexSpi<'a, A> {
    /// Wrap a transport; `timeout` bounds each wait for command completion
    pub fn new(mem: &'a mut A, timeout: Option<Duration>) -> Self {
        Self { mem, timeout }
    }

    /// Run `command` and receive `buf.len()` bytes, at most one FIFO window
    pub fn read(&mut self, command: &FlashCommand, address: u32, buf: &mut [u8]) -> Result<()> {
        check_length(buf.len())?;
        let mut seq = Sequence::program(&mut *self.mem, command, address, buf.len(), self.timeout)?;
        seq.run()?;
        seq.read_fifo(buf)?;
        seq.restore()
    }

    /// Run `command` sending `data`, at most one FIFO window
    pub fn write(&mut self, command: &FlashCommand, address: u32, data: &[u8]) -> Result<()> {
        check_length(data.len())?;
        let mut seq = Sequence::program(&mut *self.mem, command, address, data.len(), self.timeout)?;
        if !data.is_empty() {
            seq.fill_fifo(data)?;
        }
        seq.run()?;
        seq.restore()
    }

    /// Read status register 1
    pub fn read_status(&mut self) -> Result<u8> {
        let mut status = [0u8; 1];
        self.read(&FlashCommand::READ_STATUS, 0, &mut status)?;
        Ok(status[0])
    }

    /// Read the JEDEC ID
    pub fn read_jedec_id(&mut self) -> Result<JedecId> {
        let mut id = [0u8; 3];
        self.read(&FlashCommand::READ_JEDEC_ID, 0, &mut id)?;
        Ok(JedecId::from_bytes(id))
    }

    /// Read SFDP space, in as many IP commands as needed
    pub fn read_sfdp(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        let mut offset = address;
        for chunk in buf.chunks_mut(regs::FIFO_SIZE) {
            self.read(&FlashCommand::READ_SFDP, offset, chunk)?;
            offset = offset.wrapping_add(chunk.len() as u32);
        }
        Ok(())
    }

    /// Set the write enable latch
    pub fn write_enable(&mut self) -> Result<()> {
        self.write(&FlashCommand::WRITE_ENABLE, 0, &[])
    }

    /// Start a chip erase
    pub fn chip_erase(&mut self) -> Result<()> {
        self.write(&FlashCommand::CHIP_ERASE, 0, &[])
    }
}
