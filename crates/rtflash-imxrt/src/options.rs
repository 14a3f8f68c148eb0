//! Driver options

use std::time::Duration;

use crate::error::{ImxrtError, Result};

/// Default interval between progress ticks while a chip erase runs
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Options for the i.MXRT driver
///
/// Both deadlines are off by default: a command that never completes, or a
/// chip that never leaves busy, blocks the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImxrtOptions {
    /// Bound on each wait for an IP command to complete
    pub command_timeout: Option<Duration>,
    /// Bound on the busy wait of a chip erase
    pub erase_timeout: Option<Duration>,
    /// Minimum interval between progress ticks during a chip erase
    pub progress_interval: Duration,
}

impl Default for ImxrtOptions {
    fn default() -> Self {
        Self {
            command_timeout: None,
            erase_timeout: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ImxrtOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each IP command wait
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Bound the chip erase busy wait
    pub fn with_erase_timeout(mut self, timeout: Duration) -> Self {
        self.erase_timeout = Some(timeout);
        self
    }

    /// Set the progress tick interval
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Parse options from key-value pairs (from CLI)
    ///
    /// Supported options:
    /// - command_timeout_ms=<ms>
    /// - erase_timeout_s=<s>
    /// - progress_ms=<ms>
    pub fn from_options(options: &[(&str, &str)]) -> Result<Self> {
        let mut opts = Self::default();

        for (key, value) in options {
            match *key {
                "command_timeout_ms" => {
                    let ms = parse_number("command_timeout_ms", value)?;
                    opts.command_timeout = Some(Duration::from_millis(ms));
                }
                "erase_timeout_s" => {
                    let s = parse_number("erase_timeout_s", value)?;
                    opts.erase_timeout = Some(Duration::from_secs(s));
                }
                "progress_ms" => {
                    let ms = parse_number("progress_ms", value)?;
                    opts.progress_interval = Duration::from_millis(ms);
                }
                _ => {
                    log::warn!("Unknown i.MXRT driver option: {}={}", key, value);
                }
            }
        }

        Ok(opts)
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| ImxrtError::InvalidOption {
        key,
        value: value.to_string(),
    })
}
