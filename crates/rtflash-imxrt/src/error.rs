//! Error types for the i.MXRT driver configuration

use thiserror::Error;

/// Errors raised while configuring the driver
#[derive(Debug, Error)]
pub enum ImxrtError {
    /// An option value could not be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidOption {
        /// Option name
        key: &'static str,
        /// Value as given
        value: String,
    },
}

/// Result type for driver configuration
pub type Result<T> = std::result::Result<T, ImxrtError>;
