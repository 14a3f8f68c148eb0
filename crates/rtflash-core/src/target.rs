//! Attached target handle and driver hook contract
//!
//! A [`Target`] owns the debug transport for one attached microcontroller
//! and records what the target driver registered during probe: its name,
//! the options it needs from the debug core, the memory map and which flash
//! hooks it provides. The hooks themselves live on the driver value that
//! probe returns, which implements [`TargetDriver`].

use alloc::vec::Vec;

use bitflags::bitflags;

use crate::error::Result;
use crate::flash::{FlashRegion, RamRegion};
use crate::memory::MemoryAccess;
use crate::progress::Progress;

bitflags! {
    /// Behaviour the driver requests from the debug core
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TargetOptions: u8 {
        /// Never assert the hardware reset line
        const INHIBIT_NRST = 1 << 0;
    }
}

bitflags! {
    /// Flash hooks a driver has installed
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FlashHooks: u8 {
        /// [`TargetDriver::mass_erase`] is available
        const MASS_ERASE = 1 << 0;
        /// [`TargetDriver::enter_flash_mode`] and
        /// [`TargetDriver::exit_flash_mode`] are available
        const FLASH_MODE = 1 << 1;
    }
}

/// An attached target
#[derive(Debug)]
pub struct Target<M> {
    mem: M,
    part_id: u16,
    driver: Option<&'static str>,
    options: TargetOptions,
    ram: Vec<RamRegion>,
    flash: Vec<FlashRegion>,
    hooks: FlashHooks,
}

impl<M: MemoryAccess> Target<M> {
    /// Wrap a transport attached to a part with the given identity
    pub fn new(mem: M, part_id: u16) -> Self {
        Self {
            mem,
            part_id,
            driver: None,
            options: TargetOptions::empty(),
            ram: Vec::new(),
            flash: Vec::new(),
            hooks: FlashHooks::empty(),
        }
    }

    /// Part identity reported by the debug core
    pub fn part_id(&self) -> u16 {
        self.part_id
    }

    /// Name of the driver that claimed this target
    pub fn driver(&self) -> Option<&'static str> {
        self.driver
    }

    /// Record the name of the driver claiming this target
    pub fn set_driver(&mut self, name: &'static str) {
        self.driver = Some(name);
    }

    /// Options requested by the driver
    pub fn options(&self) -> TargetOptions {
        self.options
    }

    /// Request an option from the debug core
    pub fn set_option(&mut self, option: TargetOptions) {
        self.options |= option;
    }

    /// Register a RAM region
    pub fn add_ram(&mut self, region: RamRegion) {
        log::debug!(
            "RAM region 0x{:08X}-0x{:08X}",
            region.start,
            region.end()
        );
        self.ram.push(region);
    }

    /// Register a flash region
    pub fn add_flash(&mut self, region: FlashRegion) {
        log::debug!(
            "Flash region 0x{:08X}-0x{:08X}, {} byte blocks",
            region.start,
            region.end(),
            region.block_size
        );
        self.flash.push(region);
    }

    /// Registered RAM regions
    pub fn ram_regions(&self) -> &[RamRegion] {
        &self.ram
    }

    /// Registered flash regions
    pub fn flash_regions(&self) -> &[FlashRegion] {
        &self.flash
    }

    /// Mark flash hooks as provided by the driver
    pub fn install_hooks(&mut self, hooks: FlashHooks) {
        self.hooks |= hooks;
    }

    /// Flash hooks provided by the driver
    pub fn hooks(&self) -> FlashHooks {
        self.hooks
    }

    /// Direct access to the transport
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.mem
    }
}

impl<M: MemoryAccess> MemoryAccess for Target<M> {
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.mem.read(addr, buf)
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.mem.write(addr, data)
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        self.mem.read32(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.mem.write32(addr, value)
    }
}

/// Flash hooks a target driver provides after a successful probe
///
/// The framework only calls the hooks the driver announced through
/// [`Target::install_hooks`].
pub trait TargetDriver<M: MemoryAccess> {
    /// Take control of the flash controller
    fn enter_flash_mode(&mut self, target: &mut Target<M>) -> Result<()>;

    /// Hand the flash controller back to the firmware
    fn exit_flash_mode(&mut self, target: &mut Target<M>) -> Result<()>;

    /// Erase the whole flash chip
    fn mass_erase(&mut self, target: &mut Target<M>, progress: &mut dyn Progress) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::flash::FlashGeometry;

    struct Bus;

    impl MemoryAccess for Bus {
        fn read(&mut self, addr: u32, _buf: &mut [u8]) -> Result<()> {
            Err(Error::MemoryAccess { addr })
        }

        fn write(&mut self, addr: u32, _data: &[u8]) -> Result<()> {
            Err(Error::MemoryAccess { addr })
        }
    }

    #[test]
    fn test_new_target_is_unclaimed() {
        let target = Target::new(Bus, 0x88C);
        assert_eq!(target.part_id(), 0x88C);
        assert_eq!(target.driver(), None);
        assert!(target.options().is_empty());
        assert!(target.hooks().is_empty());
        assert!(target.ram_regions().is_empty());
        assert!(target.flash_regions().is_empty());
    }

    #[test]
    fn test_registration() {
        let mut target = Target::new(Bus, 0x88C);
        target.set_driver("test");
        target.set_option(TargetOptions::INHIBIT_NRST);
        target.add_ram(RamRegion::new(0x2000_0000, 0x1000));
        target.add_flash(FlashRegion::from_geometry(
            0x6000_0000,
            &FlashGeometry::fallback(0x1_0000),
        ));
        target.install_hooks(FlashHooks::MASS_ERASE);
        target.install_hooks(FlashHooks::FLASH_MODE);

        assert_eq!(target.driver(), Some("test"));
        assert!(target.options().contains(TargetOptions::INHIBIT_NRST));
        assert_eq!(target.ram_regions()[0].end(), 0x2000_0FFF);
        assert_eq!(target.flash_regions()[0].length, 0x1_0000);
        assert_eq!(target.hooks(), FlashHooks::all());
    }

    #[test]
    fn test_memory_access_delegates() {
        let mut target = Target::new(Bus, 0);
        assert_eq!(
            target.read32(0x1234_5678),
            Err(Error::MemoryAccess { addr: 0x1234_5678 })
        );
    }
}
