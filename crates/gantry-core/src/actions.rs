//! Marker types binding each [`ActionKind`] to its typed output.
//!
//! Used with typed dispatch, e.g. `dispatcher.call::<actions::Build>(..)`
//! returns a [`BuildResult`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::action::ActionKind;
use crate::outputs::*;

/// An action with a statically known result type.
pub trait Action {
    const KIND: ActionKind;
    type Output: DeserializeOwned + Serialize + Send;
}

macro_rules! typed_actions {
    ($($marker:ident => $output:ty;)*) => {
        $(
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $marker;

            impl Action for $marker {
                const KIND: ActionKind = ActionKind::$marker;
                type Output = $output;
            }
        )*
    };
}

typed_actions! {
    ConfigureProvider => ConfigureProviderResult;
    GetEnvironmentStatus => EnvironmentStatus;
    PrepareEnvironment => PrepareEnvironmentResult;
    CleanupEnvironment => CleanupEnvironmentResult;
    GetSecret => GetSecretResult;
    SetSecret => SetSecretResult;
    DeleteSecret => DeleteSecretResult;
    GetServiceStatus => ServiceStatus;
    DeployService => ServiceStatus;
    HotReloadService => HotReloadServiceResult;
    DeleteService => ServiceStatus;
    GetServiceOutputs => ServiceOutputs;
    ExecInService => ExecInServiceResult;
    GetServiceLogs => GetServiceLogsResult;
    RunService => RunResult;
    GetTaskStatus => TaskStatus;
    RunTask => RunTaskResult;
    DescribeType => ModuleTypeDescription;
    Configure => ModuleConfig;
    GetBuildStatus => BuildStatus;
    Build => BuildResult;
    PushModule => PushResult;
    PublishModule => PublishResult;
    RunModule => RunResult;
    TestModule => TestResult;
    GetTestResult => Option<TestResult>;
}
