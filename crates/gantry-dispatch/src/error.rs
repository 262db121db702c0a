//! Error types for dispatch and project configuration.

use std::path::PathBuf;

use gantry_core::{ActionKind, ContractError, TargetKind, ValidationError};
use thiserror::Error;

/// Errors returned by the action dispatch surface.
///
/// Configuration errors (`Contract`, `UnknownProvider`, `NoSuchCapability`,
/// `TargetMismatch`, `DuplicateProvider`, `EmptyCapabilities`) are fatal and
/// never retried. `Provider` carries the provider's own error unchanged.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Contract(ContractError),

    #[error("no provider registered under name {provider}")]
    UnknownProvider { provider: String },

    #[error("provider {provider} has no capability {action}")]
    NoSuchCapability {
        provider: String,
        action: ActionKind,
    },

    #[error("action {action} targets a {expected}, got a {actual}")]
    TargetMismatch {
        action: ActionKind,
        expected: TargetKind,
        actual: TargetKind,
    },

    #[error("provider {provider} is already registered")]
    DuplicateProvider { provider: String },

    #[error("provider {provider} declares no actions")]
    EmptyCapabilities { provider: String },

    #[error("invalid provider result: {0}")]
    Validation(ValidationError),

    #[error(transparent)]
    Provider(anyhow::Error),
}

impl DispatchError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DispatchError::Contract(_)
                | DispatchError::UnknownProvider { .. }
                | DispatchError::NoSuchCapability { .. }
                | DispatchError::TargetMismatch { .. }
                | DispatchError::DuplicateProvider { .. }
                | DispatchError::EmptyCapabilities { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DispatchError::Validation(_))
    }

    /// The provider's own error, if this is a provider failure.
    pub fn provider_error(&self) -> Option<&anyhow::Error> {
        match self {
            DispatchError::Provider(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContractError> for DispatchError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::Validation(v) => DispatchError::Validation(v),
            other => DispatchError::Contract(other),
        }
    }
}

impl From<ValidationError> for DispatchError {
    fn from(err: ValidationError) -> Self {
        DispatchError::Validation(err)
    }
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors loading or checking a project configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("module {module} depends on unknown module {dependency}")]
    UnknownDependency { module: String, dependency: String },

    #[error("dependency cycle through module {module}")]
    DependencyCycle { module: String },

    #[error("version error: {0}")]
    Version(#[from] ContractError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_validation_maps_to_validation() {
        let err: DispatchError = ContractError::Validation(ValidationError::UnexpectedNull {
            action: "build".to_string(),
        })
        .into();
        assert!(err.is_validation());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_unknown_action_is_configuration() {
        let err: DispatchError = ContractError::UnknownAction {
            name: "explode".to_string(),
        }
        .into();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "unknown action: explode");
    }

    #[test]
    fn test_provider_error_message_is_unchanged() {
        let err = DispatchError::Provider(anyhow::anyhow!("docker daemon unreachable"));
        assert_eq!(err.to_string(), "docker daemon unreachable");
        assert!(err.provider_error().is_some());
        assert!(!err.is_configuration());
        assert!(!err.is_validation());
    }
}
