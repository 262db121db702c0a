//! Error taxonomy for the contract layer.
//!
//! `ContractError` covers configuration problems (unknown actions, missing
//! catalog entries, malformed version input). `ValidationError` covers
//! provider results that do not match their contract.

/// Errors produced when a provider result does not conform to its contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{action}: result must be an object, got {found}")]
    NotAnObject { action: String, found: String },

    #[error("{action}: result must not be null")]
    UnexpectedNull { action: String },

    #[error("{action}: missing required field `{field}`")]
    MissingField { action: String, field: String },

    #[error("{action}: field `{field}` expected {expected}, got {found}")]
    WrongType {
        action: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("{action}: field `{field}` must not be an empty string")]
    EmptyString { action: String, field: String },

    #[error("{action}: field `{field}` must be within {min}..={max}, got {value}")]
    OutOfRange {
        action: String,
        field: String,
        value: String,
        min: i64,
        max: i64,
    },

    #[error("{action}: field `{field}` has value {value:?}, expected one of {allowed:?}")]
    NotAllowed {
        action: String,
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("{action}: field `{field}` is not an RFC 3339 timestamp: {value:?}")]
    InvalidTimestamp {
        action: String,
        field: String,
        value: String,
    },

    #[error("{action}: field `{later}` is earlier than `{earlier}`")]
    OutOfOrder {
        action: String,
        earlier: String,
        later: String,
    },

    #[error("{action}: validated result could not be decoded: {message}")]
    Decode { action: String, message: String },
}

impl ValidationError {
    /// The field path this error refers to, when it refers to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField { field, .. }
            | ValidationError::WrongType { field, .. }
            | ValidationError::EmptyString { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::InvalidTimestamp { field, .. } => Some(field),
            ValidationError::OutOfOrder { later, .. } => Some(later),
            ValidationError::NotAnObject { .. }
            | ValidationError::UnexpectedNull { .. }
            | ValidationError::Decode { .. } => None,
        }
    }
}

/// Configuration-level errors for the contract layer.
///
/// These are fatal and never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractError {
    #[error("unknown action: {name}")]
    UnknownAction { name: String },

    #[error("no result contract registered for action {action}")]
    MissingContract { action: String },

    #[error("malformed content: {0}")]
    MalformedContent(String),

    #[error("dependency {name} listed with conflicting versions {first} and {second}")]
    ConflictingDependency {
        name: String,
        first: String,
        second: String,
    },

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for ContractError {
    fn from(err: serde_json::Error) -> Self {
        ContractError::MalformedContent(err.to_string())
    }
}

/// Result type for contract operations.
pub type Result<T> = std::result::Result<T, ContractError>;
