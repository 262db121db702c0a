//! In-memory provider driven by a [`ProjectConfig`].
//!
//! Implements every action without touching the host: builds, tests, and
//! tasks replay what the project file declares, and commands run inside
//! services are simulated (`echo`, `true`, and `false` are understood).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use chrono::Utc;
use gantry_core::{
    Acknowledgement, ActionKind, BuildResult, BuildStatus, ConfigureProviderResult,
    ContractError, DeleteSecretResult, EnvironmentStatus, ExecInServiceResult, Extra,
    GetSecretResult, IngressProtocol, ModuleConfig, ModuleTypeDescription, NamedConfig,
    PrimitiveValue, ProviderConfig, PublishResult, PushResult, RunResult, RunTaskResult,
    ServiceIngress, ServiceState, ServiceStatus, TaskStatus, TestResult, Version,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{ModuleDefinition, ProjectConfig};
use crate::error::ConfigError;
use crate::provider::{ActionRequest, Provider};

/// Mutable state of the local environment.
#[derive(Debug, Default)]
struct LocalState {
    ready: bool,
    secrets: BTreeMap<String, String>,
    built: HashSet<String>,
    test_results: HashMap<(String, String), TestResult>,
    services: HashMap<String, ServiceStatus>,
    tasks_done: HashSet<String>,
}

pub struct LocalProvider {
    name: String,
    project: ProjectConfig,
    versions: HashMap<String, Version>,
    state: Mutex<LocalState>,
}

impl LocalProvider {
    /// Create a provider for `project`, computing every module version up front.
    pub fn new(project: ProjectConfig) -> Result<Self, ConfigError> {
        project.validate()?;
        let versions = module_versions(&project)?;
        let state = LocalState {
            secrets: project.secrets.clone(),
            ..LocalState::default()
        };
        Ok(Self {
            name: project.provider.clone(),
            project,
            versions,
            state: Mutex::new(state),
        })
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    /// Version of a declared module.
    pub fn module_version(&self, module: &str) -> Option<&Version> {
        self.versions.get(module)
    }

    fn state(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn module(&self, name: &str) -> anyhow::Result<(&ModuleDefinition, &Version)> {
        let module = self
            .project
            .module(name)
            .ok_or_else(|| anyhow!("module {name} is not part of project {}", self.project.name))?;
        let version = self
            .versions
            .get(name)
            .ok_or_else(|| anyhow!("no version computed for module {name}"))?;
        Ok((module, version))
    }

    fn service_module(&self, service: &str) -> anyhow::Result<&ModuleDefinition> {
        self.project
            .service(service)
            .map(|(module, _)| module)
            .ok_or_else(|| anyhow!("service {service} is not part of project {}", self.project.name))
    }

    // Provider namespace

    fn configure_provider(&self) -> anyhow::Result<Value> {
        let mut config = Extra::new();
        config.insert("environment".into(), json!(self.project.environment));
        config.insert("project".into(), json!(self.project.name));
        to_value(ConfigureProviderResult {
            config: ProviderConfig {
                name: self.name.clone(),
                extra: config,
            },
            extra: Extra::new(),
        })
    }

    fn environment_status(&self) -> anyhow::Result<Value> {
        let ready = self.state().ready;
        to_value(EnvironmentStatus {
            ready,
            need_user_input: false,
            dashboard_pages: Vec::new(),
            detail: Some(json!({"environment": self.project.environment})),
            extra: Extra::new(),
        })
    }

    fn set_ready(&self, ready: bool) -> anyhow::Result<Value> {
        self.state().ready = ready;
        debug!(environment = %self.project.environment, ready, "environment state changed");
        to_value(Acknowledgement::default())
    }

    fn get_secret(&self, key: &str) -> anyhow::Result<Value> {
        let value = self.state().secrets.get(key).cloned();
        to_value(GetSecretResult {
            value,
            extra: Extra::new(),
        })
    }

    fn set_secret(&self, key: String, request: &ActionRequest) -> anyhow::Result<Value> {
        let value = request
            .str_param("value")
            .ok_or_else(|| anyhow!("missing parameter value"))?
            .to_string();
        self.state().secrets.insert(key, value);
        to_value(Acknowledgement::default())
    }

    fn delete_secret(&self, key: &str) -> anyhow::Result<Value> {
        let found = self.state().secrets.remove(key).is_some();
        to_value(DeleteSecretResult {
            found,
            extra: Extra::new(),
        })
    }

    // Service namespace

    fn service_status(&self, service: &str) -> anyhow::Result<Value> {
        self.service_module(service)?;
        let status = self
            .state()
            .services
            .get(service)
            .cloned()
            .unwrap_or_else(|| ServiceStatus {
                state: Some(ServiceState::Missing),
                ..ServiceStatus::default()
            });
        to_value(status)
    }

    fn deploy_service(&self, service: &str) -> anyhow::Result<Value> {
        let module = self.service_module(service)?;
        let (_, version) = self.module(&module.name)?;
        let port = self
            .project
            .service(service)
            .and_then(|(_, s)| match s.outputs.get("port") {
                Some(PrimitiveValue::Integer(port)) => u16::try_from(*port).ok(),
                _ => None,
            })
            .unwrap_or(80);
        let now = Utc::now();

        let mut state = self.state();
        let created_at = state
            .services
            .get(service)
            .and_then(|s| s.created_at)
            .unwrap_or(now);
        let status = ServiceStatus {
            state: Some(ServiceState::Ready),
            version: Some(version.as_str().to_string()),
            running_replicas: Some(1),
            ingresses: vec![ServiceIngress {
                hostname: format!("{service}.{}.local", self.project.name),
                path: "/".to_string(),
                port,
                protocol: IngressProtocol::Http,
                extra: Extra::new(),
            }],
            last_message: Some(format!("deployed {}", version.short())),
            created_at: Some(created_at),
            updated_at: Some(now),
            ..ServiceStatus::default()
        };
        state.services.insert(service.to_string(), status.clone());
        to_value(status)
    }

    fn require_deployed(&self, service: &str) -> anyhow::Result<()> {
        self.service_module(service)?;
        if !self.state().services.contains_key(service) {
            bail!("service {service} is not deployed");
        }
        Ok(())
    }

    fn delete_service(&self, service: &str) -> anyhow::Result<Value> {
        self.service_module(service)?;
        self.state().services.remove(service);
        to_value(ServiceStatus {
            state: Some(ServiceState::Missing),
            ..ServiceStatus::default()
        })
    }

    fn service_outputs(&self, service: &str) -> anyhow::Result<Value> {
        let (_, definition) = self
            .project
            .service(service)
            .ok_or_else(|| anyhow!("service {service} is not part of project {}", self.project.name))?;
        to_value(&definition.outputs)
    }

    fn exec_in_service(&self, service: &str, request: &ActionRequest) -> anyhow::Result<Value> {
        self.require_deployed(service)?;
        let command: Vec<String> = request
            .param("command")?
            .ok_or_else(|| anyhow!("missing parameter command"))?;
        let (code, output) = simulate(&command)?;
        let (stdout, stderr) = if code == 0 {
            (output.clone(), String::new())
        } else {
            (String::new(), output.clone())
        };
        to_value(ExecInServiceResult {
            code,
            output,
            stdout: Some(stdout),
            stderr: Some(stderr),
            extra: Extra::new(),
        })
    }

    fn service_logs(&self, service: &str, request: &ActionRequest) -> anyhow::Result<Value> {
        let (_, definition) = self
            .project
            .service(service)
            .ok_or_else(|| anyhow!("service {service} is not part of project {}", self.project.name))?;
        if let Some(sink) = &request.log_sink {
            for line in &definition.logs {
                if !sink.emit(line.clone()) {
                    debug!(service, "log stream dropped by caller");
                    break;
                }
            }
        }
        to_value(Acknowledgement::default())
    }

    fn run_service(&self, service: &str, request: &ActionRequest) -> anyhow::Result<Value> {
        let module = self.service_module(service)?;
        let command = request
            .param::<Vec<String>>("command")?
            .unwrap_or_else(|| vec![service.to_string()]);
        let (_, version) = self.module(&module.name)?;
        to_value(run_command(&module.name, version, command)?)
    }

    // Task namespace

    fn task_status(&self, task: &str) -> anyhow::Result<Value> {
        self.project
            .task(task)
            .ok_or_else(|| anyhow!("task {task} is not part of project {}", self.project.name))?;
        let done = self.state().tasks_done.contains(task);
        to_value(TaskStatus {
            done,
            extra: Extra::new(),
        })
    }

    fn run_task(&self, task: &str) -> anyhow::Result<Value> {
        let (module, definition) = self
            .project
            .task(task)
            .ok_or_else(|| anyhow!("task {task} is not part of project {}", self.project.name))?;
        let (_, version) = self.module(&module.name)?;
        let result = RunTaskResult {
            task_name: task.to_string(),
            run: recorded_run(
                &module.name,
                version,
                definition.command.clone(),
                definition.success,
                definition.output.clone(),
            ),
        };
        if result.run.success {
            self.state().tasks_done.insert(task.to_string());
        }
        to_value(result)
    }

    // Module namespace

    fn describe_type(&self, module_type: &str) -> anyhow::Result<Value> {
        let known = module_type == "exec"
            || self
                .project
                .modules
                .iter()
                .any(|m| m.module_type == module_type);
        if !known {
            bail!("unknown module type {module_type}");
        }
        to_value(ModuleTypeDescription {
            docs: format!(
                "# {module_type}\n\nModules of type `{module_type}` declare tests, services, and tasks \
                 as commands in the project file.\n"
            ),
            schema: json!({
                "type": "object",
                "properties": {
                    "build_log": {"type": "string"},
                    "dependencies": {"type": "array", "items": {"type": "string"}},
                    "tests": {"type": "array"},
                    "services": {"type": "array"},
                    "tasks": {"type": "array"}
                }
            }),
            extra: Extra::new(),
        })
    }

    fn configure(&self, name: &str) -> anyhow::Result<Value> {
        let (module, version) = self.module(name)?;
        let named = |name: &str, spec: Value| NamedConfig {
            name: name.to_string(),
            dependencies: Vec::new(),
            spec,
            extra: Extra::new(),
        };
        let mut extra = Extra::new();
        extra.insert("version".into(), serde_json::to_value(version)?);
        to_value(ModuleConfig {
            name: module.name.clone(),
            module_type: module.module_type.clone(),
            path: None,
            description: module.description.clone(),
            spec: json!({"dependencies": module.dependencies}),
            service_configs: module
                .services
                .iter()
                .map(|s| named(&s.name, json!({"outputs": s.outputs})))
                .collect(),
            test_configs: module
                .tests
                .iter()
                .map(|t| named(&t.name, json!({"command": t.command})))
                .collect(),
            task_configs: module
                .tasks
                .iter()
                .map(|t| named(&t.name, json!({"command": t.command})))
                .collect(),
            extra,
        })
    }

    fn build_status(&self, name: &str) -> anyhow::Result<Value> {
        self.module(name)?;
        let ready = self.state().built.contains(name);
        to_value(BuildStatus {
            ready,
            extra: Extra::new(),
        })
    }

    fn build(&self, name: &str, force: bool) -> anyhow::Result<Value> {
        let (module, version) = self.module(name)?;
        let mut state = self.state();
        if let Some(missing) = module
            .dependencies
            .iter()
            .find(|d| !state.built.contains(d.as_str()))
        {
            bail!("module {name} depends on {missing}, which has not been built");
        }

        let fresh = force || !state.built.contains(name);
        state.built.insert(name.to_string());
        drop(state);

        to_value(BuildResult {
            build_log: if fresh { module.build_log.clone() } else { None },
            fresh: Some(fresh),
            version: Some(version.as_str().to_string()),
            ..BuildResult::default()
        })
    }

    fn push_module(&self, name: &str) -> anyhow::Result<Value> {
        self.module(name)?;
        to_value(PushResult {
            pushed: false,
            message: Some("the local environment has no registry to push to".to_string()),
            extra: Extra::new(),
        })
    }

    fn publish_module(&self, name: &str) -> anyhow::Result<Value> {
        self.module(name)?;
        to_value(PublishResult {
            published: false,
            message: Some("the local environment has no registry to publish to".to_string()),
            extra: Extra::new(),
        })
    }

    fn run_module(&self, name: &str, request: &ActionRequest) -> anyhow::Result<Value> {
        let (_, version) = self.module(name)?;
        let command: Vec<String> = request
            .param("command")?
            .ok_or_else(|| anyhow!("missing parameter command"))?;
        to_value(run_command(name, version, command)?)
    }

    fn test_module(&self, name: &str, request: &ActionRequest) -> anyhow::Result<Value> {
        let (module, version) = self.module(name)?;
        let test_name = request
            .str_param("testName")
            .ok_or_else(|| anyhow!("missing parameter testName"))?;
        let test = module
            .test(test_name)
            .ok_or_else(|| anyhow!("module {name} has no test named {test_name}"))?;

        let result = TestResult {
            test_name: test.name.clone(),
            run: recorded_run(
                name,
                version,
                test.command.clone(),
                test.success,
                test.output.clone(),
            ),
        };
        self.state()
            .test_results
            .insert((name.to_string(), test.name.clone()), result.clone());
        to_value(result)
    }

    fn test_result(&self, name: &str, request: &ActionRequest) -> anyhow::Result<Value> {
        self.module(name)?;
        let test_name = request
            .str_param("testName")
            .ok_or_else(|| anyhow!("missing parameter testName"))?;
        let result = self
            .state()
            .test_results
            .get(&(name.to_string(), test_name.to_string()))
            .cloned();
        to_value(result)
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_actions(&self) -> Vec<ActionKind> {
        ActionKind::ALL.to_vec()
    }

    async fn handle(&self, request: ActionRequest) -> anyhow::Result<Value> {
        let target = request.target.name.clone();
        let result = match request.action {
            ActionKind::ConfigureProvider => self.configure_provider(),
            ActionKind::GetEnvironmentStatus => self.environment_status(),
            ActionKind::PrepareEnvironment => self.set_ready(true),
            ActionKind::CleanupEnvironment => self.set_ready(false),
            ActionKind::GetSecret => self.get_secret(&request.key_param()?),
            ActionKind::SetSecret => self.set_secret(request.key_param()?, &request),
            ActionKind::DeleteSecret => self.delete_secret(&request.key_param()?),
            ActionKind::GetServiceStatus => self.service_status(&target),
            ActionKind::DeployService => self.deploy_service(&target),
            ActionKind::HotReloadService => {
                self.require_deployed(&target)?;
                to_value(Acknowledgement::default())
            }
            ActionKind::DeleteService => self.delete_service(&target),
            ActionKind::GetServiceOutputs => self.service_outputs(&target),
            ActionKind::ExecInService => self.exec_in_service(&target, &request),
            ActionKind::GetServiceLogs => self.service_logs(&target, &request),
            ActionKind::RunService => self.run_service(&target, &request),
            ActionKind::GetTaskStatus => self.task_status(&target),
            ActionKind::RunTask => self.run_task(&target),
            ActionKind::DescribeType => self.describe_type(&target),
            ActionKind::Configure => self.configure(&target),
            ActionKind::GetBuildStatus => self.build_status(&target),
            ActionKind::Build => self.build(&target, request.bool_param("force")),
            ActionKind::PushModule => self.push_module(&target),
            ActionKind::PublishModule => self.publish_module(&target),
            ActionKind::RunModule => self.run_module(&target, &request),
            ActionKind::TestModule => self.test_module(&target, &request),
            ActionKind::GetTestResult => self.test_result(&target, &request),
        };
        result.with_context(|| format!("{} failed for {}", request.action, request.target))
    }
}

impl std::fmt::Debug for LocalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProvider")
            .field("name", &self.name)
            .field("project", &self.project.name)
            .finish_non_exhaustive()
    }
}

fn to_value<T: Serialize>(value: T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Run-like result replaying a declared outcome.
fn recorded_run(
    module: &str,
    version: &Version,
    command: Vec<String>,
    success: bool,
    output: String,
) -> RunResult {
    let started_at = Utc::now();
    RunResult {
        module_name: module.to_string(),
        command,
        version: version.clone(),
        success,
        started_at,
        completed_at: Utc::now().max(started_at),
        output,
        extra: Extra::new(),
    }
}

fn run_command(module: &str, version: &Version, command: Vec<String>) -> anyhow::Result<RunResult> {
    let (code, output) = simulate(&command)?;
    Ok(recorded_run(module, version, command, code == 0, output))
}

/// Exit code and output of a simulated command.
fn simulate(command: &[String]) -> anyhow::Result<(i64, String)> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("command must not be empty"))?;
    Ok(match program.as_str() {
        "echo" => (0, format!("{}\n", args.join(" "))),
        "true" => (0, String::new()),
        "false" => (1, String::new()),
        other => (127, format!("{other}: command not found\n")),
    })
}

/// Versions of every module, dependencies first.
fn module_versions(project: &ProjectConfig) -> Result<HashMap<String, Version>, ConfigError> {
    let mut versions = HashMap::new();
    for module in &project.modules {
        resolve_version(project, &module.name, &mut versions, &mut Vec::new())?;
    }
    Ok(versions)
}

fn resolve_version(
    project: &ProjectConfig,
    name: &str,
    versions: &mut HashMap<String, Version>,
    stack: &mut Vec<String>,
) -> Result<Version, ConfigError> {
    if let Some(version) = versions.get(name) {
        return Ok(version.clone());
    }
    if stack.iter().any(|s| s == name) {
        return Err(ConfigError::DependencyCycle {
            module: name.to_string(),
        });
    }
    let module = project
        .module(name)
        .ok_or_else(|| ConfigError::UnknownDependency {
            module: stack.last().cloned().unwrap_or_default(),
            dependency: name.to_string(),
        })?;

    stack.push(name.to_string());
    let mut dependencies = Vec::with_capacity(module.dependencies.len());
    for dependency in &module.dependencies {
        let version = resolve_version(project, dependency, versions, stack)?;
        dependencies.push((dependency.as_str(), version));
    }
    stack.pop();

    let content = serde_json::to_value(module).map_err(ContractError::from)?;
    let refs: Vec<(&str, &Version)> = dependencies.iter().map(|(n, v)| (*n, v)).collect();
    let version = Version::compute_from_value(&content, &refs)?;
    versions.insert(name.to_string(), version.clone());
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Params;
    use gantry_core::TargetDescriptor;

    fn project(toml: &str) -> ProjectConfig {
        ProjectConfig::from_toml_str(toml).unwrap()
    }

    fn request(action: ActionKind, target: TargetDescriptor, params: Value) -> ActionRequest {
        let params = match params {
            Value::Object(map) => map,
            _ => Params::new(),
        };
        ActionRequest::new(action, target, params)
    }

    const TWO_MODULES: &str = r#"
name = "shop"

[[modules]]
name = "api"
dependencies = ["common"]

[[modules]]
name = "common"
"#;

    #[test]
    fn test_versions_depend_on_dependencies() {
        let provider = LocalProvider::new(project(TWO_MODULES)).unwrap();
        let api = provider.module_version("api").unwrap();
        let common = provider.module_version("common").unwrap();
        assert_eq!(
            api.dependency_versions.get("common"),
            Some(&common.version_string)
        );
        assert!(common.dependency_versions.is_empty());
    }

    #[test]
    fn test_dependency_cycle_rejected() {
        let err = LocalProvider::new(project(
            r#"
name = "loop"
[[modules]]
name = "a"
dependencies = ["b"]
[[modules]]
name = "b"
dependencies = ["a"]
"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::DependencyCycle { .. }));
    }

    #[tokio::test]
    async fn test_build_requires_dependencies() {
        let provider = LocalProvider::new(project(TWO_MODULES)).unwrap();
        let err = provider
            .handle(request(
                ActionKind::Build,
                TargetDescriptor::module("local", "api"),
                json!({}),
            ))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("common"));
    }

    #[tokio::test]
    async fn test_exec_simulates_echo() {
        let provider = LocalProvider::new(project(
            r#"
name = "shop"
[[modules]]
name = "api"
[[modules.services]]
name = "web"
"#,
        ))
        .unwrap();
        let target = TargetDescriptor::service("local", "web");
        provider
            .handle(request(ActionKind::DeployService, target.clone(), json!({})))
            .await
            .unwrap();

        let out = provider
            .handle(request(
                ActionKind::ExecInService,
                target.clone(),
                json!({"command": ["echo", "hello", "world"]}),
            ))
            .await
            .unwrap();
        assert_eq!(out["code"], json!(0));
        assert_eq!(out["output"], json!("hello world\n"));

        let missing = provider
            .handle(request(
                ActionKind::ExecInService,
                target,
                json!({"command": ["psql"]}),
            ))
            .await
            .unwrap();
        assert_eq!(missing["code"], json!(127));
    }
}
