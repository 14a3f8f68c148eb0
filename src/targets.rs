//! Target registration and target string parsing
//!
//! A target is selected with a string of the form `name` or
//! `name:key1=value1,key2=value2`. Keys the target itself does not use are
//! handed to the driver as driver options.

use std::collections::HashMap;

use rtflash_core::memory::MemoryAccess;
use rtflash_core::target::Target;
use rtflash_imxrt::PART_ID;
use rtflash_sim::{SimConfig, SimFlashConfig, SimTarget};

use crate::cli::parse_hex_u32;
use crate::error::CliError;

/// Information about a target
pub struct TargetInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
}

/// All targets this build can attach to
pub const TARGETS: &[TargetInfo] = &[TargetInfo {
    name: "sim",
    description: "Simulated i.MXRT10xx with SPI NOR flash (boot_cfg=,boot_mode=,part_id=,jedec=,size=,cas=,suspended=,locked=,erase_polls=,no_wren=)",
}];

/// Generate a short list of target names for CLI help
pub fn target_names_short() -> String {
    let names: Vec<&str> = TARGETS.iter().map(|t| t.name).collect();
    names.join(", ")
}

/// Parsed target parameters
#[derive(Debug)]
pub struct TargetParams {
    /// Target name
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

/// Parse a target string into name and parameters
///
/// Keys must be non-empty and may appear only once. Surrounding whitespace
/// and empty entries (`a=1,,b=2`) are ignored.
pub fn parse_target_params(target: &str) -> Result<TargetParams, CliError> {
    let (name, opts) = target.split_once(':').unwrap_or((target, ""));

    let mut params = HashMap::new();
    for opt in opts.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        let (key, value) = opt
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(k, _)| !k.is_empty())
            .ok_or_else(|| CliError::InvalidFormat(opt.to_string()))?;
        if params.insert(key.to_string(), value.to_string()).is_some() {
            return Err(CliError::DuplicateParameter(key.to_string()));
        }
    }

    Ok(TargetParams {
        name: name.trim().to_string(),
        params,
    })
}

/// An attached target plus the options meant for its driver
pub struct OpenTarget {
    /// The attached target
    pub target: Target<Box<dyn MemoryAccess>>,
    /// Parameters the target did not consume
    pub driver_options: Vec<(String, String)>,
}

/// Attach to the target described by `target`
pub fn open_target(target: &str) -> Result<OpenTarget, CliError> {
    let mut params = parse_target_params(target)?;

    match params.name.as_str() {
        "sim" => {
            let (config, part_id) = sim_config(&mut params.params)?;
            log::info!("Attached to simulated target, part 0x{:03X}", part_id);
            let mem: Box<dyn MemoryAccess> = Box::new(SimTarget::new(config));
            let mut driver_options: Vec<_> = params.params.into_iter().collect();
            driver_options.sort();
            Ok(OpenTarget {
                target: Target::new(mem, part_id),
                driver_options,
            })
        }
        _ => Err(CliError::UnknownTarget(params.name)),
    }
}

fn invalid(key: &str, value: &str) -> CliError {
    CliError::InvalidParameter {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, CliError> {
    parse_hex_u32(value).map_err(|_| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CliError> {
    match value {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_jedec(value: &str) -> Result<[u8; 3], CliError> {
    let raw = value.trim_start_matches("0x");
    if raw.len() != 6 {
        return Err(invalid("jedec", value));
    }
    let id = u32::from_str_radix(raw, 16).map_err(|_| invalid("jedec", value))?;
    Ok([(id >> 16) as u8, (id >> 8) as u8, id as u8])
}

/// Build a simulator configuration, removing the keys it consumes
fn sim_config(params: &mut HashMap<String, String>) -> Result<(SimConfig, u16), CliError> {
    let mut config = SimConfig::default();
    let mut flash = SimFlashConfig::default();
    let mut part_id = PART_ID;
    let mut size = None;

    if let Some(v) = params.remove("boot_cfg") {
        config.boot_cfg = parse_u32("boot_cfg", &v)?;
    }
    if let Some(v) = params.remove("boot_mode") {
        config.boot_mode = match parse_u32("boot_mode", &v)? {
            mode @ 0..=3 => mode as u8,
            _ => return Err(invalid("boot_mode", &v)),
        };
    }
    if let Some(v) = params.remove("part_id") {
        part_id = u16::try_from(parse_u32("part_id", &v)?).map_err(|_| invalid("part_id", &v))?;
    }
    if let Some(v) = params.remove("jedec") {
        flash.jedec_id = parse_jedec(&v)?;
    }
    if let Some(v) = params.remove("size") {
        size = Some(parse_u32("size", &v)? as usize);
    }
    if let Some(v) = params.remove("cas") {
        config.column_bits = match parse_u32("cas", &v)? {
            bits @ 0..=15 => bits as u8,
            _ => return Err(invalid("cas", &v)),
        };
    }
    if let Some(v) = params.remove("suspended") {
        config.suspended = parse_bool("suspended", &v)?;
    }
    if let Some(v) = params.remove("locked") {
        config.lut_locked = parse_bool("locked", &v)?;
    }
    if let Some(v) = params.remove("erase_polls") {
        flash.erase_polls = parse_u32("erase_polls", &v)?;
    }
    if let Some(v) = params.remove("no_wren") {
        flash.ignore_write_enable = parse_bool("no_wren", &v)?;
    }

    // Follow the ID unless told otherwise, up to 64 MiB of backing memory
    flash.size = match size {
        Some(size) => size,
        None if flash.jedec_id[2] <= 26 => 1 << flash.jedec_id[2],
        None => flash.size,
    };
    config.flash = flash;
    Ok((config, part_id))
}
