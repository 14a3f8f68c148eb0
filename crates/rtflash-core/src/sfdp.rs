//! SFDP decoder boundary
//!
//! Decoding JEDEC JESD216 parameter tables is left to an external decoder.
//! Drivers only provide the raw read primitive: the decoder is handed a
//! callback that reads SFDP bytes from the attached chip and reports back
//! the geometry it found, or `None` if discovery failed.

use crate::error::Result;
use crate::flash::FlashGeometry;

/// Raw SFDP read callback: `(sfdp_address, buffer)`
pub type SfdpRead<'a> = dyn FnMut(u32, &mut [u8]) -> Result<()> + 'a;

/// An SFDP table decoder
pub trait SfdpDecoder {
    /// Discover the flash geometry through `read`
    ///
    /// Returns `None` if the chip has no usable SFDP tables.
    fn read_parameters(&mut self, read: &mut SfdpRead<'_>) -> Option<FlashGeometry>;
}

/// Decoder used when no SFDP support is available
///
/// Always reports that discovery failed, so drivers fall back to
/// conservative defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSfdp;

impl SfdpDecoder for NoSfdp {
    fn read_parameters(&mut self, _read: &mut SfdpRead<'_>) -> Option<FlashGeometry> {
        log::debug!("No SFDP decoder available, skipping discovery");
        None
    }
}
