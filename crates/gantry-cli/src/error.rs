//! Command layer errors.

use gantry_dispatch::{ConfigError, DispatchError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    /// The command's subject does not exist; `key` names it.
    #[error("{message}")]
    NotFound { message: String, key: String },

    #[error("invalid arguments: {0}")]
    Parameter(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to serialize command result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CommandError {
    pub fn not_found(message: impl Into<String>, key: impl Into<String>) -> Self {
        CommandError::NotFound {
            message: message.into(),
            key: key.into(),
        }
    }

    pub fn parameter(message: impl Into<String>) -> Self {
        CommandError::Parameter(message.into())
    }

    /// The missing key, for `NotFound` errors.
    pub fn key(&self) -> Option<&str> {
        match self {
            CommandError::NotFound { key, .. } => Some(key),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;
