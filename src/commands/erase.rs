//! Erase command implementation

use indicatif::{ProgressBar, ProgressStyle};
use rtflash_core::target::{FlashHooks, TargetDriver};

use super::Session;
use crate::error::CliError;

/// Erase the whole boot flash through the driver's flash hooks
pub fn run_erase(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    session.require_serial_flash()?;
    let total_size = match session.target.flash_regions().first() {
        Some(flash) if session.target.hooks().contains(FlashHooks::MASS_ERASE) => flash.length,
        _ => return Err(CliError::NoFlash.into()),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!(
        "Erasing {} bytes (this may take a while)...",
        total_size
    ));
    let mut tick = || pb.tick();

    let imxrt = &mut session.imxrt;
    let target = &mut session.target;
    imxrt.enter_flash_mode(&mut *target)?;
    let erased = imxrt.mass_erase(&mut *target, &mut tick);
    let exited = imxrt.exit_flash_mode(&mut *target);

    match erased.and(exited) {
        Ok(()) => {
            pb.finish_with_message(format!("Erased {} bytes", total_size));
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("Chip erase failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::attach;
    use std::time::Duration;

    #[test]
    fn test_erase() {
        let mut session = attach("sim:erase_polls=4", |o| o).unwrap();
        run_erase(&mut session).unwrap();
        assert!(!session.imxrt.in_flash_mode());
    }

    #[test]
    fn test_erase_without_flash() {
        let mut session = attach("sim:jedec=ffffff", |o| o).unwrap();
        let err = run_erase(&mut session).err().unwrap();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::NoFlash)));
    }

    #[test]
    fn test_erase_write_enable_ignored() {
        let mut session = attach("sim:no_wren=1", |o| o).unwrap();
        assert!(run_erase(&mut session).is_err());
        assert!(!session.imxrt.in_flash_mode());
    }

    #[test]
    fn test_erase_timeout() {
        let mut session = attach("sim:erase_polls=0xFFFFFFFF", |o| {
            o.with_erase_timeout(Duration::ZERO)
        })
        .unwrap();
        let err = run_erase(&mut session).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<rtflash_core::error::Error>(),
            Some(rtflash_core::error::Error::Timeout)
        ));
    }
}
