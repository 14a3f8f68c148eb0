//! Probe command implementation

use super::Session;

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

/// Show what probing found: boot device and memory map
pub fn run_probe(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let target = &session.target;
    let imxrt = &session.imxrt;

    println!("Target: {}", target.driver().unwrap_or("unknown"));
    println!("  Part ID:     0x{:03X}", target.part_id());
    println!("  Boot mode:   {}", imxrt.boot_mode());
    println!("  Boot device: {}", imxrt.boot_source());
    println!();

    println!("RAM:");
    for ram in target.ram_regions() {
        println!(
            "  0x{:08X}-0x{:08X}  {}",
            ram.start,
            ram.end(),
            format_size(ram.length)
        );
    }

    if target.flash_regions().is_empty() {
        println!("Flash: none");
    } else {
        println!("Flash:");
        for flash in target.flash_regions() {
            println!(
                "  0x{:08X}-0x{:08X}  {}, {} erase blocks (opcode {:02X}), {} byte pages",
                flash.start,
                flash.end(),
                format_size(flash.length),
                format_size(flash.block_size),
                flash.erase_opcode,
                flash.page_size
            );
        }
    }

    if !target.hooks().is_empty() {
        println!("Flash hooks: {:?}", target.hooks());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::attach;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0x80000), "512 KiB");
        assert_eq!(format_size(16 * 1024 * 1024), "16 MiB");
        assert_eq!(format_size(256), "256 B");
    }

    #[test]
    fn test_probe_without_flash() {
        let session = attach("sim:jedec=ffffff", |o| o).unwrap();
        assert!(session.target.flash_regions().is_empty());
        run_probe(&session).unwrap();
    }
}
