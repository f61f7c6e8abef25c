//! Error types for the first person mod

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A byte pattern required at startup is missing from the module image.
    #[error("Failed to find {name} pattern ({pattern})")]
    PatternNotFound { name: String, pattern: String },

    #[error("Invalid pattern token {token:?} in {pattern:?}")]
    InvalidPattern { pattern: String, token: String },

    #[error("Module image is unavailable")]
    ModuleUnavailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, Error>;
