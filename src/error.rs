//! Error types for the Helios core

use thiserror::Error;

/// Helios core error type
#[derive(Error, Debug)]
pub enum HeliosError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for HeliosError {
    fn from(e: serde_yaml::Error) -> Self {
        HeliosError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HeliosError>;
