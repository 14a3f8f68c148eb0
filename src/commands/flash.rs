//! Commands that talk to the flash chip directly

use rtflash_core::spi::opcodes;

use super::Session;

/// Print the JEDEC ID of the boot flash
pub fn run_id(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    session.require_serial_flash()?;
    let id = session.imxrt.read_jedec_id(&mut session.target)?;

    println!(
        "JEDEC ID: {:02X} {:02X} {:02X}",
        id.manufacturer, id.device_type, id.capacity_exp
    );
    match id.capacity().filter(|_| id.is_valid()) {
        Some(capacity) => println!("Capacity: {} bytes", capacity),
        None => println!("Capacity: unknown (no valid ID)"),
    }
    Ok(())
}

/// Describe status register 1
fn describe_status(status: u8) -> String {
    let mut flags = Vec::new();
    if status & opcodes::SR1_WIP != 0 {
        flags.push("WIP");
    }
    if status & opcodes::SR1_WEL != 0 {
        flags.push("WEL");
    }
    if flags.is_empty() {
        format!("{:02X}", status)
    } else {
        format!("{:02X} ({})", status, flags.join(" "))
    }
}

/// Print status register 1 of the boot flash
pub fn run_status(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    session.require_serial_flash()?;
    let status = session.imxrt.read_status(&mut session.target)?;
    println!("Status: {}", describe_status(status));
    Ok(())
}

/// Format `data` read from `address` as a hexdump, 16 bytes per line
fn hexdump(address: u32, data: &[u8]) -> Vec<String> {
    data.chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
                .collect();
            format!(
                "{:08X}  {:<47}  {}",
                address as usize + i * 16,
                hex.join(" "),
                ascii
            )
        })
        .collect()
}

/// Dump raw SFDP bytes from the boot flash
pub fn run_sfdp(
    session: &mut Session,
    address: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    session.require_serial_flash()?;
    if address.checked_add(length).map_or(true, |end| end > 1 << 24) {
        return Err(format!(
            "SFDP range 0x{:X}+0x{:X} is outside the 24-bit SFDP space",
            address, length
        )
        .into());
    }

    let mut buf = vec![0u8; length as usize];
    session.imxrt.read_sfdp(&mut session.target, address, &mut buf)?;

    for line in hexdump(address, &buf) {
        println!("{}", line);
    }
    Ok(())
}
