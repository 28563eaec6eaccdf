//! Error types.

use std::io;

use crate::job::JobDescriptor;

pub type Result<T> = core::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed launching job #{index} ({job}): {reason}")]
    SpawnError {
        index: usize,
        job: JobDescriptor,
        reason: String,
    },

    #[error("invalid configuration for `{axis}`: {reason}")]
    ConfigurationError { axis: String, reason: String },

    #[error("io error: {0}")]
    IoError(String),

    #[cfg(feature = "yaml")]
    #[error("yaml deserialization error: {0}")]
    YamlDeserError(#[from] serde_yaml::Error),
    #[error("toml deserialization error: {0}")]
    TomlDeserError(#[from] toml::de::Error),
    #[error("unsupported config file format: {0}")]
    UnsupportedConfigFormat(String),

    #[error("completion channel disconnected with {0} job(s) still active")]
    ChannelDisconnected(usize),
}

impl Error {
    pub(crate) fn config(axis: &str, reason: impl Into<String>) -> Self {
        Error::ConfigurationError {
            axis: axis.to_string(),
            reason: reason.into(),
        }
    }
}
