//! List command implementation

use crate::targets::TARGETS;

/// List all supported targets
pub fn list_targets() {
    println!("Supported targets:");
    println!();
    for target in TARGETS {
        println!("  {:<9} - {}", target.name, target.description);
    }
    println!();
    println!("Unrecognised target parameters are passed to the i.MXRT driver:");
    println!("  command_timeout_ms=<ms>, erase_timeout_s=<s>, progress_ms=<ms>");
}
