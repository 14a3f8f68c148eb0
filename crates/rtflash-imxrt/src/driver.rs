//! i.MXRT10xx target driver
//!
//! Probing identifies the boot device, maps both OCRAM banks and, when the
//! part boots from serial flash on FlexSPI1, identifies the flash chip and
//! registers it. The returned [`Imxrt`] session provides the flash hooks.

use std::time::Instant;

use rtflash_core::error::{Error, Result};
use rtflash_core::flash::{FlashGeometry, FlashRegion, JedecId, RamRegion};
use rtflash_core::memory::MemoryAccess;
use rtflash_core::progress::Progress;
use rtflash_core::sfdp::SfdpDecoder;
use rtflash_core::spi::opcodes;
use rtflash_core::target::{FlashHooks, Target, TargetDriver, TargetOptions};

use crate::boot::{BootMode, BootSource};
use crate::flexspi::FlexSpi;
use crate::guard::{ControllerSnapshot, FlashMode};
use crate::options::ImxrtOptions;
use crate::regs;

/// Part identity the debug core reports for the i.MXRT10xx family
pub const PART_ID: u16 = 0x88C;
/// Driver name
pub const DRIVER_NAME: &str = "i.MXRT10xx";

/// Driver session for one attached i.MXRT10xx
#[derive(Debug)]
pub struct Imxrt {
    boot_source: BootSource,
    boot_mode: BootMode,
    options: ImxrtOptions,
    /// Set while the framework holds flash mode through the hooks
    snapshot: Option<ControllerSnapshot>,
}

impl Imxrt {
    /// Probe an attached target
    ///
    /// Returns `Ok(None)`, without touching the target, if it is not an
    /// i.MXRT10xx.
    pub fn probe<M: MemoryAccess>(
        target: &mut Target<M>,
        decoder: &mut dyn SfdpDecoder,
        options: ImxrtOptions,
    ) -> Result<Option<Self>> {
        if target.part_id() != PART_ID {
            return Ok(None);
        }

        target.set_option(TargetOptions::INHIBIT_NRST);
        target.set_driver(DRIVER_NAME);

        let boot_mode = BootMode::from_sbmr2(target.read32(regs::SRC_SBMR2)?);
        log::debug!("i.MXRT boot mode is {}", boot_mode);
        let boot_cfg = target.read32(regs::SRC_SBMR1)?;
        log::debug!("i.MXRT boot config is {:08X}", boot_cfg);
        let boot_source = BootSource::from_boot_cfg(boot_cfg);
        log::info!("i.MXRT booting from {}", boot_source);

        target.add_ram(RamRegion::new(regs::OCRAM1_BASE, regs::OCRAM1_SIZE));
        target.add_ram(RamRegion::new(regs::OCRAM2_BASE, regs::OCRAM2_SIZE));

        let session = Self {
            boot_source,
            boot_mode,
            options,
            snapshot: None,
        };

        if boot_source.is_serial_flash() {
            let mut flash_mode = FlashMode::enter(target)?;
            let id = FlexSpi::new(&mut *flash_mode, session.options.command_timeout)
                .read_jedec_id()?;

            flash_mode.install_hooks(FlashHooks::MASS_ERASE | FlashHooks::FLASH_MODE);

            match id.capacity().filter(|_| id.is_valid()) {
                Some(capacity) => {
                    log::info!(
                        "SPI Flash: mfr = {:02X}, type = {:02X}, capacity = {:08X}",
                        id.manufacturer,
                        id.device_type,
                        capacity
                    );
                    session.register_flash(&mut *flash_mode, decoder, capacity)?;
                }
                None => log::info!("Flash identification failed"),
            }

            flash_mode.exit()?;
        }

        Ok(Some(session))
    }

    /// Discover the flash geometry and register the FlexSPI1 flash window
    fn register_flash<M: MemoryAccess>(
        &self,
        target: &mut Target<M>,
        decoder: &mut dyn SfdpDecoder,
        capacity: u32,
    ) -> Result<()> {
        let discovered = {
            let mut flexspi = FlexSpi::new(&mut *target, self.options.command_timeout);
            let mut read = |address: u32, buf: &mut [u8]| flexspi.read_sfdp(address, buf);
            decoder.read_parameters(&mut read)
        };
        let geometry = discovered.filter(is_usable).unwrap_or_else(|| {
            log::debug!("SFDP discovery failed, using default geometry");
            FlashGeometry::fallback(capacity)
        });

        target.add_flash(FlashRegion::from_geometry(
            regs::FLEXSPI1_FLASH_BASE,
            &geometry,
        ));
        log::info!("Flash size: {} MiB", geometry.capacity / (1024 * 1024));
        Ok(())
    }

    /// Boot device decoded at probe time
    pub fn boot_source(&self) -> BootSource {
        self.boot_source
    }

    /// Boot mode decoded at probe time
    pub fn boot_mode(&self) -> BootMode {
        self.boot_mode
    }

    /// Driver options
    pub fn options(&self) -> &ImxrtOptions {
        &self.options
    }

    /// Returns true while flash mode is held through the hooks
    pub fn in_flash_mode(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Run `op` with FlexSPI1 in flash mode
    ///
    /// Reuses flash mode entered through the hooks, otherwise takes the
    /// controller for the duration of `op` only.
    fn with_flexspi<M, T>(
        &self,
        target: &mut Target<M>,
        op: impl FnOnce(&mut FlexSpi<'_, Target<M>>) -> Result<T>,
    ) -> Result<T>
    where
        M: MemoryAccess,
    {
        let timeout = self.options.command_timeout;
        if self.snapshot.is_some() {
            return op(&mut FlexSpi::new(target, timeout));
        }

        let mut flash_mode = FlashMode::enter(target)?;
        let result = op(&mut FlexSpi::new(&mut *flash_mode, timeout));
        let exited = flash_mode.exit();
        let value = result?;
        exited?;
        Ok(value)
    }

    /// Read the JEDEC ID of the flash chip
    pub fn read_jedec_id<M: MemoryAccess>(&self, target: &mut Target<M>) -> Result<JedecId> {
        self.with_flexspi(target, |flexspi| flexspi.read_jedec_id())
    }

    /// Read status register 1 of the flash chip
    pub fn read_status<M: MemoryAccess>(&self, target: &mut Target<M>) -> Result<u8> {
        self.with_flexspi(target, |flexspi| flexspi.read_status())
    }

    /// Read raw SFDP bytes from the flash chip
    pub fn read_sfdp<M: MemoryAccess>(
        &self,
        target: &mut Target<M>,
        address: u32,
        buf: &mut [u8],
    ) -> Result<()> {
        self.with_flexspi(target, |flexspi| flexspi.read_sfdp(address, buf))
    }

    /// Write enable, chip erase, then wait for the chip to finish
    fn erase_chip<M: MemoryAccess>(
        &self,
        flexspi: &mut FlexSpi<'_, Target<M>>,
        progress: &mut dyn Progress,
    ) -> Result<()> {
        flexspi.write_enable()?;
        let status = flexspi.read_status()?;
        if status & opcodes::SR1_WEL == 0 {
            log::warn!("Flash did not latch write enable (status {:02X})", status);
            return Err(Error::WriteEnableFailed);
        }

        log::debug!("Starting chip erase");
        flexspi.chip_erase()?;

        let start = Instant::now();
        let mut last_tick = start;
        while flexspi.read_status()? & opcodes::SR1_WIP != 0 {
            if let Some(limit) = self.options.erase_timeout {
                if start.elapsed() >= limit {
                    log::warn!("Chip erase still busy after {:?}", limit);
                    return Err(Error::Timeout);
                }
            }
            if last_tick.elapsed() >= self.options.progress_interval {
                progress.tick();
                last_tick = Instant::now();
            }
        }
        log::debug!("Chip erase done in {:?}", start.elapsed());
        Ok(())
    }
}

/// A geometry with an empty chip, sector or page cannot describe a region
fn is_usable(geometry: &FlashGeometry) -> bool {
    geometry.capacity != 0 && geometry.sector_size != 0 && geometry.page_size != 0
}

impl<M: MemoryAccess> TargetDriver<M> for Imxrt {
    fn enter_flash_mode(&mut self, target: &mut Target<M>) -> Result<()> {
        if self.snapshot.is_some() {
            log::warn!("Already in flash mode, previous controller state is lost");
        }
        self.snapshot = Some(ControllerSnapshot::enter(target)?);
        Ok(())
    }

    fn exit_flash_mode(&mut self, target: &mut Target<M>) -> Result<()> {
        let snapshot = self.snapshot.take().ok_or(Error::NotInFlashMode)?;
        snapshot.restore(target)
    }

    fn mass_erase(&mut self, target: &mut Target<M>, progress: &mut dyn Progress) -> Result<()> {
        self.with_flexspi(target, |flexspi| self.erase_chip(flexspi, progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtflash_core::progress::NoProgress;
    use rtflash_core::sfdp::{NoSfdp, SfdpRead};
    use rtflash_sim::{SimConfig, SimFlashConfig, SimTarget, FIRMWARE_SEQUENCE};
    use std::time::Duration;

    fn attach(config: SimConfig) -> Target<SimTarget> {
        Target::new(SimTarget::new(config), PART_ID)
    }

    fn probe(target: &mut Target<SimTarget>) -> Imxrt {
        Imxrt::probe(target, &mut NoSfdp, ImxrtOptions::default())
            .unwrap()
            .unwrap()
    }

    /// Decoder that reads the SFDP header and reports a fixed geometry
    struct HeaderDecoder {
        signature: [u8; 4],
    }

    impl SfdpDecoder for HeaderDecoder {
        fn read_parameters(&mut self, read: &mut SfdpRead<'_>) -> Option<FlashGeometry> {
            read(0, &mut self.signature).ok()?;
            (&self.signature == b"SFDP").then_some(FlashGeometry {
                page_size: 256,
                sector_size: 65536,
                capacity: 4 * 1024 * 1024,
                sector_erase_opcode: 0xD8,
            })
        }
    }

    #[test]
    fn test_other_part_is_untouched() {
        let mut target = Target::new(SimTarget::new_default(), 0x123);
        let result = Imxrt::probe(&mut target, &mut NoSfdp, ImxrtOptions::default());
        assert!(matches!(result, Ok(None)));
        assert_eq!(target.driver(), None);
        assert!(target.options().is_empty());
        assert!(target.ram_regions().is_empty());
        assert!(target.memory_mut().commands().is_empty());
    }

    #[test]
    fn test_probe_registers_nor_flash() {
        let mut target = attach(SimConfig::default());
        let imxrt = probe(&mut target);

        assert_eq!(imxrt.boot_source(), BootSource::SpiNor);
        assert_eq!(imxrt.boot_mode(), BootMode::InternalBoot);
        assert_eq!(target.driver(), Some(DRIVER_NAME));
        assert!(target.options().contains(TargetOptions::INHIBIT_NRST));
        assert_eq!(
            target.ram_regions(),
            &[
                RamRegion::new(0x2028_0000, 0x8_0000),
                RamRegion::new(0x2020_0000, 0x8_0000)
            ]
        );
        assert_eq!(target.hooks(), FlashHooks::MASS_ERASE | FlashHooks::FLASH_MODE);

        // JEDEC EF 40 16: 4 MiB, SFDP not decoded so the fallback geometry
        assert_eq!(
            target.flash_regions(),
            &[FlashRegion {
                start: 0x6000_0000,
                length: 4_194_304,
                block_size: 4096,
                page_size: 256,
                erased: 0xFF,
                erase_opcode: 0x20,
            }]
        );

        let sim = target.memory_mut();
        assert_eq!(sim.sequence(), FIRMWARE_SEQUENCE);
        assert_eq!(sim.lut_control(), regs::LUTCR_LOCK);
    }

    #[test]
    fn test_probe_uses_sfdp_geometry() {
        let mut target = attach(SimConfig::default());
        let mut decoder = HeaderDecoder { signature: [0; 4] };
        Imxrt::probe(&mut target, &mut decoder, ImxrtOptions::default())
            .unwrap()
            .unwrap();

        let region = target.flash_regions()[0];
        assert_eq!(region.block_size, 65536);
        assert_eq!(region.erase_opcode, 0xD8);
        assert_eq!(target.memory_mut().commands()[1].opcode, opcodes::RDSFDP);
    }

    /// Decoder that reports whatever geometry it was given
    struct FixedDecoder(FlashGeometry);

    impl SfdpDecoder for FixedDecoder {
        fn read_parameters(&mut self, _read: &mut SfdpRead<'_>) -> Option<FlashGeometry> {
            Some(self.0)
        }
    }

    #[test]
    fn test_probe_rejects_empty_geometry() {
        log::set_max_level(log::LevelFilter::Trace);
        let empty = FlashGeometry {
            page_size: 256,
            sector_size: 4096,
            capacity: 0,
            sector_erase_opcode: 0x20,
        };
        let no_sectors = FlashGeometry {
            sector_size: 0,
            capacity: 4 * 1024 * 1024,
            ..empty
        };
        for geometry in [empty, no_sectors] {
            let mut target = attach(SimConfig::default());
            Imxrt::probe(&mut target, &mut FixedDecoder(geometry), ImxrtOptions::default())
                .unwrap()
                .unwrap();

            // Falls back to the geometry implied by the JEDEC ID
            let region = target.flash_regions()[0];
            assert_eq!(region.length, 4_194_304);
            assert_eq!(region.block_size, 4096);
            assert_eq!(region.end(), 0x603F_FFFF);
        }
    }

    #[test]
    fn test_probe_spi_nand_boot() {
        let mut target = attach(SimConfig {
            boot_cfg: 0xC0,
            ..Default::default()
        });
        let imxrt = probe(&mut target);
        assert_eq!(imxrt.boot_source(), BootSource::SpiNand);
        assert_eq!(target.flash_regions().len(), 1);
    }

    #[test]
    fn test_probe_sd_boot_is_ram_only() {
        let mut target = attach(SimConfig {
            boot_cfg: 0x40,
            ..Default::default()
        });
        let imxrt = probe(&mut target);
        assert_eq!(imxrt.boot_source(), BootSource::SdCard);
        assert_eq!(target.ram_regions().len(), 2);
        assert!(target.flash_regions().is_empty());
        assert!(target.hooks().is_empty());
        assert!(target.memory_mut().commands().is_empty());
    }

    #[test]
    fn test_probe_unprogrammed_id() {
        let mut target = attach(SimConfig {
            flash: SimFlashConfig {
                jedec_id: [0xFF, 0xFF, 0xFF],
                ..Default::default()
            },
            ..Default::default()
        });
        probe(&mut target);
        assert!(target.flash_regions().is_empty());
        // Hooks are installed whether or not the chip answered
        assert_eq!(target.hooks(), FlashHooks::all());
        assert_eq!(target.memory_mut().lut_control(), regs::LUTCR_LOCK);
    }

    #[test]
    fn test_probe_restores_suspended_controller() {
        let mut target = attach(SimConfig {
            suspended: true,
            lut_locked: false,
            ..Default::default()
        });
        let mcr0 = target.memory_mut().module_control();
        probe(&mut target);
        let sim = target.memory_mut();
        assert_eq!(sim.module_control(), mcr0);
        assert_eq!(sim.lut_control(), regs::LUTCR_UNLOCK);
        assert_eq!(sim.sequence(), FIRMWARE_SEQUENCE);
    }

    #[test]
    fn test_mass_erase() {
        let mut target = attach(SimConfig {
            flash: SimFlashConfig {
                erase_polls: 5,
                ..Default::default()
            },
            ..Default::default()
        });
        let mut imxrt = probe(&mut target);
        target.memory_mut().flash_mut().data_mut()[..4].copy_from_slice(&[0, 1, 2, 3]);

        imxrt.mass_erase(&mut target, &mut NoProgress).unwrap();

        let sim = target.memory_mut();
        assert!(sim.flash().data().iter().all(|&b| b == 0xFF));
        let erase = sim
            .commands()
            .iter()
            .position(|c| c.opcode == opcodes::CE_60)
            .unwrap();
        assert_eq!(sim.commands()[erase - 2].opcode, opcodes::WREN);
        assert_eq!(sim.commands()[erase - 1].opcode, opcodes::RDSR);
        // Polled until the busy countdown ran out
        assert_eq!(sim.commands().len() - erase - 1, 6);
        assert_eq!(sim.lut_control(), regs::LUTCR_LOCK);
        assert_eq!(sim.sequence(), FIRMWARE_SEQUENCE);
    }

    #[test]
    fn test_mass_erase_aborts_without_write_enable() {
        let mut target = attach(SimConfig {
            suspended: true,
            flash: SimFlashConfig {
                ignore_write_enable: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let mut imxrt = probe(&mut target);
        let mcr0 = target.memory_mut().module_control();
        target.memory_mut().flash_mut().data_mut()[0] = 0x00;

        let result = imxrt.mass_erase(&mut target, &mut NoProgress);
        assert_eq!(result, Err(Error::WriteEnableFailed));

        let sim = target.memory_mut();
        assert_eq!(sim.flash().data()[0], 0x00);
        assert!(sim.commands().iter().all(|c| c.opcode != opcodes::CE_60));
        assert_eq!(sim.module_control(), mcr0);
        assert_eq!(sim.lut_control(), regs::LUTCR_LOCK);
    }

    #[test]
    fn test_mass_erase_progress() {
        let mut target = attach(SimConfig {
            flash: SimFlashConfig {
                erase_polls: 200,
                ..Default::default()
            },
            ..Default::default()
        });
        let options = ImxrtOptions::new().with_progress_interval(Duration::ZERO);
        let mut imxrt = Imxrt::probe(&mut target, &mut NoSfdp, options)
            .unwrap()
            .unwrap();

        let mut ticks = 0;
        let mut progress = || ticks += 1;
        imxrt.mass_erase(&mut target, &mut progress).unwrap();
        assert!(ticks > 0);
    }

    #[test]
    fn test_mass_erase_timeout_releases_controller() {
        let mut target = attach(SimConfig {
            flash: SimFlashConfig {
                erase_polls: u32::MAX,
                ..Default::default()
            },
            ..Default::default()
        });
        let options = ImxrtOptions::new().with_erase_timeout(Duration::from_millis(20));
        let mut imxrt = Imxrt::probe(&mut target, &mut NoSfdp, options)
            .unwrap()
            .unwrap();

        let result = imxrt.mass_erase(&mut target, &mut NoProgress);
        assert_eq!(result, Err(Error::Timeout));
        let sim = target.memory_mut();
        assert_eq!(sim.lut_control(), regs::LUTCR_LOCK);
        assert_eq!(sim.sequence(), FIRMWARE_SEQUENCE);
    }

    #[test]
    fn test_flash_mode_hooks() {
        let mut target = attach(SimConfig {
            suspended: true,
            ..Default::default()
        });
        let mut imxrt = probe(&mut target);
        let mcr0 = target.memory_mut().module_control();

        assert_eq!(
            imxrt.exit_flash_mode(&mut target),
            Err(Error::NotInFlashMode)
        );

        imxrt.enter_flash_mode(&mut target).unwrap();
        assert!(imxrt.in_flash_mode());
        assert_eq!(target.memory_mut().lut_control(), regs::LUTCR_UNLOCK);

        // Operations reuse the session instead of re-entering
        let id = imxrt.read_jedec_id(&mut target).unwrap();
        assert!(id.is_valid());
        assert_eq!(target.memory_mut().lut_control(), regs::LUTCR_UNLOCK);

        imxrt.exit_flash_mode(&mut target).unwrap();
        assert!(!imxrt.in_flash_mode());
        assert_eq!(target.memory_mut().module_control(), mcr0);
        assert_eq!(target.memory_mut().lut_control(), regs::LUTCR_LOCK);
    }

    #[test]
    fn test_double_enter_loses_first_snapshot() {
        let mut target = attach(SimConfig {
            suspended: true,
            lut_locked: true,
            ..Default::default()
        });
        let mut imxrt = probe(&mut target);
        let mcr0 = target.memory_mut().module_control();
        assert_ne!(mcr0 & regs::MCR0_SUSPEND, 0);

        imxrt.enter_flash_mode(&mut target).unwrap();
        // The second snapshot records the already taken-over controller
        imxrt.enter_flash_mode(&mut target).unwrap();
        assert!(imxrt.in_flash_mode());

        imxrt.exit_flash_mode(&mut target).unwrap();
        let sim = target.memory_mut();
        assert_eq!(sim.module_control(), mcr0 & !regs::MCR0_SUSPEND);
        assert_eq!(sim.lut_control(), regs::LUTCR_UNLOCK);

        // Only one exit pairs with the two enters
        assert_eq!(
            imxrt.exit_flash_mode(&mut target),
            Err(Error::NotInFlashMode)
        );
    }

    #[test]
    fn test_read_status_and_sfdp() {
        let mut target = attach(SimConfig::default());
        let imxrt = probe(&mut target);
        assert_eq!(imxrt.read_status(&mut target).unwrap(), 0);

        let mut header = [0u8; 8];
        imxrt.read_sfdp(&mut target, 0, &mut header).unwrap();
        assert_eq!(&header[..4], b"SFDP");
        assert_eq!(target.memory_mut().lut_control(), regs::LUTCR_LOCK);
    }
}
