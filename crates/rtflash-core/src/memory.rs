//! Debug transport memory access
//!
//! Target drivers never touch hardware directly: every register access is a
//! remote memory transaction issued through the debug transport. This module
//! defines the trait that transport implements.

use crate::error::Result;

/// Remote memory access over a debug transport
///
/// All accesses block until the transport has completed them. Word helpers
/// use the little-endian byte order of the attached Cortex-M target.
pub trait MemoryAccess {
    /// Read `buf.len()` bytes starting at `addr`
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `addr`
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Read a 32-bit word
    fn read32(&mut self, addr: u32) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Write a 32-bit word
    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.write(addr, &value.to_le_bytes())
    }
}

impl<M: MemoryAccess + ?Sized> MemoryAccess for &mut M {
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read(addr, buf)
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        (**self).write(addr, data)
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        (**self).write32(addr, value)
    }
}

impl<M: MemoryAccess + ?Sized> MemoryAccess for alloc::boxed::Box<M> {
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read(addr, buf)
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        (**self).write(addr, data)
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        (**self).write32(addr, value)
    }
}
