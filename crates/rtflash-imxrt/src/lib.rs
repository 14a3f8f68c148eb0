//! rtflash-imxrt - NXP i.MXRT10xx target driver
//!
//! This crate drives the FlexSPI1 controller of an i.MXRT10xx through the
//! debug transport to reach the external serial flash the part boots from.
//!
//! # Architecture
//!
//! - [`boot`] - Boot device and boot mode decoding from the SRC
//! - [`guard`] - Taking FlexSPI1 over from the firmware and handing it back
//! - [`lut`] - LUT sequence builder
//! - [`flexspi`] - IP command sequencer, transfers and flash operations
//! - [`driver`] - Probe, flash region registration and the flash hooks
//!
//! # Example
//!
//! ```ignore
//! use rtflash_core::sfdp::NoSfdp;
//! use rtflash_imxrt::{Imxrt, ImxrtOptions};
//!
//! if let Some(imxrt) = Imxrt::probe(&mut target, &mut NoSfdp, ImxrtOptions::default())? {
//!     println!("booting from {}", imxrt.boot_source());
//! }
//! ```

#![warn(missing_docs)]

pub mod boot;
pub mod driver;
pub mod error;
pub mod flexspi;
pub mod guard;
pub mod lut;
pub mod options;
pub mod regs;

pub use boot::{BootMode, BootSource};
pub use driver::{Imxrt, DRIVER_NAME, PART_ID};
pub use error::ImxrtError;
pub use options::ImxrtOptions;
