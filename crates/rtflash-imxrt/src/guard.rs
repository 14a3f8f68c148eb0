//! FlexSPI controller state guard
//!
//! The running firmware owns FlexSPI1: it may have suspended the module or
//! locked the LUT. Before issuing IP commands the driver takes the controller
//! over, and afterwards it puts MCR0 and the LUT lock back exactly as found.

use core::ops::{Deref, DerefMut};

use rtflash_core::error::Result;
use rtflash_core::memory::MemoryAccess;

use crate::regs;

/// Controller state captured when taking over FlexSPI1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSnapshot {
    /// MCR0 as the firmware left it
    pub module_control: u32,
    /// LUTCR as the firmware left it
    pub lut_control: u32,
}

impl ControllerSnapshot {
    /// Take over the controller and return the state to restore later
    ///
    /// Resumes a suspended module, acknowledges stale interrupts, resets both
    /// IP FIFOs and unlocks the LUT.
    pub fn enter<A: MemoryAccess + ?Sized>(mem: &mut A) -> Result<Self> {
        let module_control = mem.read32(regs::MCR0)?;
        if module_control & regs::MCR0_SUSPEND != 0 {
            log::debug!("FlexSPI1 suspended, resuming");
            mem.write32(regs::MCR0, module_control & !regs::MCR0_SUSPEND)?;
        }

        let result = Self::prepare(mem, module_control);
        if result.is_err() && module_control & regs::MCR0_SUSPEND != 0 {
            // Put the module back to sleep before reporting the failure
            if let Err(e) = mem.write32(regs::MCR0, module_control) {
                log::error!("Failed to restore FlexSPI1 MCR0: {}", e);
            }
        }
        result
    }

    fn prepare<A: MemoryAccess + ?Sized>(mem: &mut A, module_control: u32) -> Result<Self> {
        let pending = mem.read32(regs::INTR)?;
        mem.write32(regs::INTR, pending)?;

        let fifo_control = regs::fifo_watermark(regs::FIFO_SIZE as u32) | regs::FIFO_CLEAR;
        mem.write32(regs::IPRXFCR, fifo_control)?;
        mem.write32(regs::IPTXFCR, fifo_control)?;

        let lut_control = mem.read32(regs::LUTCR)?;
        if lut_control != regs::LUTCR_UNLOCK {
            log::debug!("Unlocking FlexSPI1 LUT (LUTCR = {})", lut_control);
            mem.write32(regs::LUTKEY, regs::LUT_KEY)?;
            mem.write32(regs::LUTCR, regs::LUTCR_UNLOCK)?;
        }

        Ok(Self {
            module_control,
            lut_control,
        })
    }

    /// Hand the controller back in the captured state
    pub fn restore<A: MemoryAccess + ?Sized>(&self, mem: &mut A) -> Result<()> {
        if self.lut_control != regs::LUTCR_UNLOCK {
            mem.write32(regs::LUTKEY, regs::LUT_KEY)?;
            mem.write32(regs::LUTCR, self.lut_control)?;
        }
        // Also re-suspends the module if the firmware had it suspended
        mem.write32(regs::MCR0, self.module_control)
    }
}

/// Scoped ownership of FlexSPI1
///
/// Created by [`FlashMode::enter`]; the controller is handed back by
/// [`FlashMode::exit`], or when the guard is dropped on an early return.
/// The guard dereferences to the transport it borrows.
pub struct FlashMode<'a, A: MemoryAccess + ?Sized> {
    mem: &'a mut A,
    snapshot: ControllerSnapshot,
    active: bool,
}

impl<'a, A: MemoryAccess + ?Sized> FlashMode<'a, A> {
    /// Take over the controller
    pub fn enter(mem: &'a mut A) -> Result<Self> {
        let snapshot = ControllerSnapshot::enter(mem)?;
        Ok(Self {
            mem,
            snapshot,
            active: true,
        })
    }

    /// The state that will be restored
    pub fn snapshot(&self) -> &ControllerSnapshot {
        &self.snapshot
    }

    /// Hand the controller back, reporting transport errors
    pub fn exit(mut self) -> Result<()> {
        self.active = false;
        self.snapshot.restore(self.mem)
    }
}

impl<A: MemoryAccess + ?Sized> Deref for FlashMode<'_, A> {
    type Target = A;

    fn deref(&self) -> &A {
        &*self.mem
    }
}

impl<A: MemoryAccess + ?Sized> DerefMut for FlashMode<'_, A> {
    fn deref_mut(&mut self) -> &mut A {
        &mut *self.mem
    }
}

impl<A: MemoryAccess + ?Sized> Drop for FlashMode<'_, A> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.snapshot.restore(self.mem) {
                log::error!("Failed to hand FlexSPI1 back to the firmware: {}", e);
            }
        }
    }
}
