use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to parse request file: {0}")]
    RequestFileError(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to create channel '{path}': {source}")]
    ChannelCreationError { path: PathBuf, source: nix::Error },

    #[error("Channel '{path}' has no reader after {attempts} attempts")]
    ChannelUnavailable { path: PathBuf, attempts: u32 },

    #[error("Malformed record on channel '{path}': {reason}")]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("Unexpected response from controller: {0}")]
    UnexpectedResponse(String),

    #[error("No response from controller on '{path}' within {seconds}s")]
    ResponseTimeout { path: PathBuf, seconds: u64 },

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
