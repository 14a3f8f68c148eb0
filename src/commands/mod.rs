//! CLI command implementations
//!
//! Every command attaches to a target, lets the i.MXRT driver probe it and
//! then works on the resulting [`Session`]. Commands that talk to the flash
//! chip need the part to boot from serial flash on FlexSPI1.

mod erase;
mod flash;
mod list;
mod probe;

pub use erase::run_erase;
pub use flash::{run_id, run_sfdp, run_status};
pub use list::list_targets;
pub use probe::run_probe;

use rtflash_core::memory::MemoryAccess;
use rtflash_core::sfdp::NoSfdp;
use rtflash_core::target::Target;
use rtflash_imxrt::{Imxrt, ImxrtOptions};

use crate::error::CliError;
use crate::targets::open_target;

/// An attached target claimed by the i.MXRT driver
pub struct Session {
    /// The attached target
    pub target: Target<Box<dyn MemoryAccess>>,
    /// The driver session returned by probe
    pub imxrt: Imxrt,
}

impl Session {
    /// Fail unless the part boots from serial flash
    pub fn require_serial_flash(&self) -> Result<(), CliError> {
        let source = self.imxrt.boot_source();
        if source.is_serial_flash() {
            Ok(())
        } else {
            Err(CliError::NoSerialFlash(source))
        }
    }
}

/// Attach to `target` and probe it
///
/// `configure` gets the driver options parsed from the target string and
/// may override them.
pub fn attach(
    target: &str,
    configure: impl FnOnce(ImxrtOptions) -> ImxrtOptions,
) -> Result<Session, Box<dyn std::error::Error>> {
    let open = open_target(target)?;
    let pairs: Vec<(&str, &str)> = open
        .driver_options
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let options = configure(ImxrtOptions::from_options(&pairs)?);

    let mut target = open.target;
    match Imxrt::probe(&mut target, &mut NoSfdp, options)? {
        Some(imxrt) => Ok(Session { target, imxrt }),
        None => Err(CliError::NotClaimed {
            part_id: target.part_id(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtflash_imxrt::BootSource;
    use std::time::Duration;

    #[test]
    fn test_attach_claims_imxrt() {
        let session = attach("sim", |o| o).unwrap();
        assert_eq!(session.target.driver(), Some("i.MXRT10xx"));
        assert_eq!(session.target.flash_regions().len(), 1);
        assert!(session.require_serial_flash().is_ok());
    }

    #[test]
    fn test_attach_applies_overrides() {
        let session = attach("sim:erase_timeout_s=30", |o| {
            o.with_command_timeout(Duration::from_millis(50))
        })
        .unwrap();
        let options = session.imxrt.options();
        assert_eq!(options.erase_timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.command_timeout, Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_attach_other_part() {
        let err = attach("sim:part_id=0x123", |o| o).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::NotClaimed { part_id: 0x123 })
        ));
    }

    #[test]
    fn test_attach_bad_driver_option() {
        assert!(attach("sim:progress_ms=fast", |o| o).is_err());
    }

    #[test]
    fn test_require_serial_flash() {
        let session = attach("sim:boot_cfg=0x40", |o| o).unwrap();
        assert!(matches!(
            session.require_serial_flash(),
            Err(CliError::NoSerialFlash(BootSource::SdCard))
        ));
    }
}
