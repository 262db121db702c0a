//! Gantry Core
//!
//! The contract layer between an orchestrator and its providers:
//! - `Version`: content-derived identity of modules, services, and tasks
//! - `ActionKind` / `TargetDescriptor`: the closed action set and its targets
//! - `outputs`: typed result records for every action
//! - `ContractCatalog`: per-action result contracts, as data
//! - `ValidatedResult`: provider output that passed its contract

pub mod action;
pub mod actions;
pub mod catalog;
pub mod digest;
pub mod error;
pub mod obs;
pub mod outputs;
pub mod telemetry;
pub mod validate;
pub mod version;

pub use action::{ActionKind, TargetDescriptor, TargetKind};
pub use actions::Action;
pub use catalog::{
    Constraint, ContractCatalog, ExtraFields, FieldSpec, FieldType, Presence, ResultContract,
};
pub use digest::{canonical_json, digest_bytes, digest_json};
pub use error::{ContractError, Result, ValidationError};
pub use obs::{
    emit_action_completed, emit_action_invoked, emit_provider_failed, emit_validation_failed,
    InvocationSpan,
};
pub use outputs::*;
pub use telemetry::init_tracing;
pub use validate::{validate_record, ValidatedResult};
pub use version::Version;

/// Gantry version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
