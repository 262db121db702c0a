//! Action kinds, target kinds, and target descriptors.
//!
//! The action set is a closed enum. Each action belongs to exactly one target
//! namespace (provider, service, task, or module).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// The kind of entity an action operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Provider,
    Module,
    Service,
    Task,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Provider => write!(f, "provider"),
            TargetKind::Module => write!(f, "module"),
            TargetKind::Service => write!(f, "service"),
            TargetKind::Task => write!(f, "task"),
        }
    }
}

/// Identifies the provider handling an invocation and the entity it targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub provider: String,
    pub kind: TargetKind,
    pub name: String,
}

impl TargetDescriptor {
    pub fn new(provider: impl Into<String>, kind: TargetKind, name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            name: name.into(),
        }
    }

    /// Target the provider itself (its name doubles as the target name).
    pub fn provider(provider: impl Into<String>) -> Self {
        let provider = provider.into();
        Self {
            name: provider.clone(),
            provider,
            kind: TargetKind::Provider,
        }
    }

    pub fn module(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(provider, TargetKind::Module, name)
    }

    pub fn service(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(provider, TargetKind::Service, name)
    }

    pub fn task(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(provider, TargetKind::Task, name)
    }
}

impl std::fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}/{}", self.provider, self.kind, self.name)
    }
}

/// Every action a provider may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    // Provider
    ConfigureProvider,
    GetEnvironmentStatus,
    PrepareEnvironment,
    CleanupEnvironment,
    GetSecret,
    SetSecret,
    DeleteSecret,
    // Service
    GetServiceStatus,
    DeployService,
    HotReloadService,
    DeleteService,
    GetServiceOutputs,
    ExecInService,
    GetServiceLogs,
    RunService,
    // Task
    GetTaskStatus,
    RunTask,
    // Module
    DescribeType,
    Configure,
    GetBuildStatus,
    Build,
    PushModule,
    PublishModule,
    RunModule,
    TestModule,
    GetTestResult,
}

impl ActionKind {
    pub const ALL: [ActionKind; 26] = [
        ActionKind::ConfigureProvider,
        ActionKind::GetEnvironmentStatus,
        ActionKind::PrepareEnvironment,
        ActionKind::CleanupEnvironment,
        ActionKind::GetSecret,
        ActionKind::SetSecret,
        ActionKind::DeleteSecret,
        ActionKind::GetServiceStatus,
        ActionKind::DeployService,
        ActionKind::HotReloadService,
        ActionKind::DeleteService,
        ActionKind::GetServiceOutputs,
        ActionKind::ExecInService,
        ActionKind::GetServiceLogs,
        ActionKind::RunService,
        ActionKind::GetTaskStatus,
        ActionKind::RunTask,
        ActionKind::DescribeType,
        ActionKind::Configure,
        ActionKind::GetBuildStatus,
        ActionKind::Build,
        ActionKind::PushModule,
        ActionKind::PublishModule,
        ActionKind::RunModule,
        ActionKind::TestModule,
        ActionKind::GetTestResult,
    ];

    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::ConfigureProvider => "configureProvider",
            ActionKind::GetEnvironmentStatus => "getEnvironmentStatus",
            ActionKind::PrepareEnvironment => "prepareEnvironment",
            ActionKind::CleanupEnvironment => "cleanupEnvironment",
            ActionKind::GetSecret => "getSecret",
            ActionKind::SetSecret => "setSecret",
            ActionKind::DeleteSecret => "deleteSecret",
            ActionKind::GetServiceStatus => "getServiceStatus",
            ActionKind::DeployService => "deployService",
            ActionKind::HotReloadService => "hotReloadService",
            ActionKind::DeleteService => "deleteService",
            ActionKind::GetServiceOutputs => "getServiceOutputs",
            ActionKind::ExecInService => "execInService",
            ActionKind::GetServiceLogs => "getServiceLogs",
            ActionKind::RunService => "runService",
            ActionKind::GetTaskStatus => "getTaskStatus",
            ActionKind::RunTask => "runTask",
            ActionKind::DescribeType => "describeType",
            ActionKind::Configure => "configure",
            ActionKind::GetBuildStatus => "getBuildStatus",
            ActionKind::Build => "build",
            ActionKind::PushModule => "pushModule",
            ActionKind::PublishModule => "publishModule",
            ActionKind::RunModule => "runModule",
            ActionKind::TestModule => "testModule",
            ActionKind::GetTestResult => "getTestResult",
        }
    }

    /// The target namespace this action belongs to.
    pub fn target_kind(&self) -> TargetKind {
        match self {
            ActionKind::ConfigureProvider
            | ActionKind::GetEnvironmentStatus
            | ActionKind::PrepareEnvironment
            | ActionKind::CleanupEnvironment
            | ActionKind::GetSecret
            | ActionKind::SetSecret
            | ActionKind::DeleteSecret => TargetKind::Provider,
            ActionKind::GetServiceStatus
            | ActionKind::DeployService
            | ActionKind::HotReloadService
            | ActionKind::DeleteService
            | ActionKind::GetServiceOutputs
            | ActionKind::ExecInService
            | ActionKind::GetServiceLogs
            | ActionKind::RunService => TargetKind::Service,
            ActionKind::GetTaskStatus | ActionKind::RunTask => TargetKind::Task,
            ActionKind::DescribeType
            | ActionKind::Configure
            | ActionKind::GetBuildStatus
            | ActionKind::Build
            | ActionKind::PushModule
            | ActionKind::PublishModule
            | ActionKind::RunModule
            | ActionKind::TestModule
            | ActionKind::GetTestResult => TargetKind::Module,
        }
    }

    /// All actions in one target namespace.
    pub fn in_namespace(kind: TargetKind) -> impl Iterator<Item = ActionKind> {
        Self::ALL.into_iter().filter(move |a| a.target_kind() == kind)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| ContractError::UnknownAction {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for action in ActionKind::ALL {
            assert_eq!(action.name().parse::<ActionKind>().unwrap(), action);
        }
    }

    #[test]
    fn test_serde_name_matches_wire_name() {
        for action in ActionKind::ALL {
            let wire = serde_json::to_value(action).unwrap();
            assert_eq!(wire, serde_json::Value::String(action.name().to_string()));
        }
    }

    #[test]
    fn test_unknown_action_is_configuration_error() {
        let err = "compileModule".parse::<ActionKind>().unwrap_err();
        assert_eq!(
            err,
            ContractError::UnknownAction {
                name: "compileModule".to_string()
            }
        );
    }

    #[test]
    fn test_namespace_sizes() {
        assert_eq!(ActionKind::in_namespace(TargetKind::Provider).count(), 7);
        assert_eq!(ActionKind::in_namespace(TargetKind::Service).count(), 8);
        assert_eq!(ActionKind::in_namespace(TargetKind::Task).count(), 2);
        assert_eq!(ActionKind::in_namespace(TargetKind::Module).count(), 9);
    }

    #[test]
    fn test_target_descriptor_display() {
        let target = TargetDescriptor::module("local", "module-a");
        assert_eq!(target.to_string(), "local:module/module-a");
        let provider = TargetDescriptor::provider("local");
        assert_eq!(provider.name, "local");
        assert_eq!(provider.kind, TargetKind::Provider);
    }
}
