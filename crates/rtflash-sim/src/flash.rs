//! Simulated SPI NOR flash chip
//!
//! Emulates the command set the FlexSPI model forwards to the chip: ID,
//! status, write enable/disable, read, page program, sector and chip erase
//! and SFDP reads. Like a real part, commands it does not understand or
//! cannot perform are ignored and reads of unknown data float high.

use rtflash_core::spi::opcodes;

/// Minimal SFDP header: signature, revision 1.6, one parameter header
const DEFAULT_SFDP: [u8; 16] = [
    b'S', b'F', b'D', b'P', 0x06, 0x01, 0x00, 0xFF, 0x00, 0x06, 0x01, 0x10, 0x30, 0x00, 0x00, 0xFF,
];

/// Configuration for the simulated flash chip
#[derive(Debug, Clone)]
pub struct SimFlashConfig {
    /// RDID response: manufacturer, memory type, capacity exponent
    pub jedec_id: [u8; 3],
    /// Array size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Raw SFDP space, reads past the end return 0xFF
    pub sfdp: Vec<u8>,
    /// Number of status reads that report busy after a chip erase
    pub erase_polls: u32,
    /// Ignore WREN, leaving the write enable latch clear
    pub ignore_write_enable: bool,
}

impl Default for SimFlashConfig {
    fn default() -> Self {
        Self {
            jedec_id: [0xEF, 0x40, 0x16], // W25Q32
            size: 4 * 1024 * 1024,
            page_size: 256,
            sfdp: DEFAULT_SFDP.to_vec(),
            erase_polls: 3,
            ignore_write_enable: false,
        }
    }
}

/// Simulated SPI NOR flash
#[derive(Debug, Clone)]
pub struct SimFlash {
    config: SimFlashConfig,
    data: Vec<u8>,
    write_enabled: bool,
    busy_polls: u32,
}

impl SimFlash {
    /// Create a new simulated flash, fully erased
    pub fn new(config: SimFlashConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            write_enabled: false,
            busy_polls: 0,
        }
    }

    /// Get a reference to the flash array
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash array
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &SimFlashConfig {
        &self.config
    }

    /// Current value of status register 1
    pub fn status(&self) -> u8 {
        let mut status = 0;
        if self.busy_polls > 0 {
            status |= opcodes::SR1_WIP;
        }
        if self.write_enabled {
            status |= opcodes::SR1_WEL;
        }
        status
    }

    /// Execute one SPI transaction
    ///
    /// `read_buf` receives the data-in phase, `write_data` is the data-out
    /// phase. At most one of them is non-empty.
    pub fn execute(
        &mut self,
        opcode: u8,
        address: Option<u32>,
        dummy_cycles: u8,
        read_buf: &mut [u8],
        write_data: &[u8],
    ) {
        read_buf.fill(0xFF);

        // Only RDSR is accepted while an erase is in progress
        if self.busy_polls > 0 && opcode != opcodes::RDSR {
            log::debug!("sim flash: busy, ignoring opcode 0x{:02X}", opcode);
            return;
        }

        match opcode {
            opcodes::RDID => {
                let len = read_buf.len().min(3);
                read_buf[..len].copy_from_slice(&self.config.jedec_id[..len]);
            }
            opcodes::RDSR => {
                let status = self.status();
                read_buf.fill(status);
                // Each status read advances a pending erase
                self.busy_polls = self.busy_polls.saturating_sub(1);
                if self.busy_polls == 0 && status & opcodes::SR1_WIP != 0 {
                    self.write_enabled = false;
                }
            }
            opcodes::WREN => {
                if self.config.ignore_write_enable {
                    log::debug!("sim flash: ignoring WREN");
                } else {
                    self.write_enabled = true;
                }
            }
            opcodes::WRDI => self.write_enabled = false,
            opcodes::READ => self.handle_read(address, read_buf),
            opcodes::PP => self.handle_page_program(address, write_data),
            opcodes::SE_20 => self.handle_sector_erase(address, 4096),
            opcodes::CE_60 | opcodes::CE_C7 => self.handle_chip_erase(),
            opcodes::RDSFDP => self.handle_sfdp(address, dummy_cycles, read_buf),
            _ => log::warn!("sim flash: unsupported opcode 0x{:02X}", opcode),
        }
    }

    fn offset(&self, address: Option<u32>, len: usize) -> Option<usize> {
        let start = address? as usize;
        let end = start.checked_add(len)?;
        (end <= self.data.len()).then_some(start)
    }

    fn handle_read(&mut self, address: Option<u32>, read_buf: &mut [u8]) {
        match self.offset(address, read_buf.len()) {
            Some(start) => read_buf.copy_from_slice(&self.data[start..start + read_buf.len()]),
            None => log::warn!("sim flash: read outside the array"),
        }
    }

    fn handle_page_program(&mut self, address: Option<u32>, data: &[u8]) {
        if !self.write_enabled {
            log::debug!("sim flash: page program without WREN");
            return;
        }
        self.write_enabled = false;

        let Some(start) = self.offset(address, 0) else {
            return;
        };
        // Programming wraps within the page
        let page = start & !(self.config.page_size - 1);
        for (i, &byte) in data.iter().enumerate() {
            let offset = page + (start - page + i) % self.config.page_size;
            if let Some(cell) = self.data.get_mut(offset) {
                *cell &= byte;
            }
        }
    }

    fn handle_sector_erase(&mut self, address: Option<u32>, erase_size: usize) {
        if !self.write_enabled {
            log::debug!("sim flash: sector erase without WREN");
            return;
        }
        self.write_enabled = false;

        let Some(start) = self.offset(address, 0) else {
            return;
        };
        let aligned = start & !(erase_size - 1);
        let end = (aligned + erase_size).min(self.data.len());
        self.data[aligned..end].fill(0xFF);
    }

    fn handle_chip_erase(&mut self) {
        if !self.write_enabled {
            log::debug!("sim flash: chip erase without WREN");
            return;
        }
        self.data.fill(0xFF);
        self.busy_polls = self.config.erase_polls;
        if self.busy_polls == 0 {
            self.write_enabled = false;
        }
    }

    fn handle_sfdp(&mut self, address: Option<u32>, dummy_cycles: u8, read_buf: &mut [u8]) {
        if dummy_cycles != opcodes::RDSFDP_DUMMY_CYCLES {
            log::warn!("sim flash: RDSFDP with {} dummy cycles", dummy_cycles);
            return;
        }
        let start = address.unwrap_or(0) as usize;
        for (i, byte) in read_buf.iter_mut().enumerate() {
            *byte = self.config.sfdp.get(start + i).copied().unwrap_or(0xFF);
        }
    }
}
