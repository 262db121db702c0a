//! Typed result records for every provider action.
//!
//! Each record mirrors the wire shape of its action result (camelCase keys)
//! and keeps unknown provider fields in a flattened `extra` map so they are
//! never stripped on the way to the scheduler.

pub mod module;
pub mod provider;
pub mod run;
pub mod service;

use serde::{Deserialize, Serialize};

pub use module::{
    BuildResult, BuildStatus, ModuleConfig, ModuleTypeDescription, NamedConfig, PublishResult,
    PushResult,
};
pub use provider::{
    CleanupEnvironmentResult, ConfigureProviderResult, DashboardPage, DeleteSecretResult,
    EnvironmentStatus, GetSecretResult, PrepareEnvironmentResult, ProviderConfig,
    SetSecretResult,
};
pub use run::{RunResult, RunTaskResult, TaskStatus, TestResult};
pub use service::{
    ExecInServiceResult, GetServiceLogsResult, HotReloadServiceResult, IngressProtocol,
    PrimitiveValue, ServiceIngress, ServiceLogEntry, ServiceOutputs, ServiceState, ServiceStatus,
};

/// Provider-specific fields not declared by a contract.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Result of actions that only acknowledge completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(flatten)]
    pub extra: Extra,
}
