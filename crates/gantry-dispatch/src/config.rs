//! Project configuration (`gantry.toml`).
//!
//! Describes the modules of a project together with their tests, services,
//! and tasks. The local provider is driven entirely by this file.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use gantry_core::ServiceOutputs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Default project file name, looked up in the working directory.
pub const PROJECT_FILE: &str = "gantry.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Provider that handles every action for this project.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Initial secrets, keyed by dotted path.
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
}

fn default_environment() -> String {
    "local".to_string()
}

fn default_provider() -> String {
    "local".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub name: String,
    #[serde(rename = "type", default = "default_module_type")]
    pub module_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Names of modules that must be built first.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Log reported by a fresh build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_log: Option<String>,
    #[serde(default)]
    pub tests: Vec<TestDefinition>,
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

fn default_module_type() -> String {
    "exec".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub name: String,
    pub command: Vec<String>,
    #[serde(default = "default_test_output")]
    pub output: String,
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_test_output() -> String {
    "OK\n".to_string()
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    #[serde(default)]
    pub outputs: ServiceOutputs,
    /// Lines replayed by `getServiceLogs`.
    #[serde(default)]
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,
    pub command: Vec<String>,
    #[serde(default)]
    pub output: String,
    #[serde(default = "default_success")]
    pub success: bool,
}

impl ProjectConfig {
    /// Parse and validate a project from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProjectConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a project file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(
            project = %config.name,
            modules = config.modules.len(),
            path = %path.display(),
            "loaded project"
        );
        Ok(config)
    }

    /// Reject duplicate names and dependencies on undeclared modules.
    ///
    /// Dependency cycles are detected later, when versions are computed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut modules = HashSet::new();
        let mut services = HashSet::new();
        let mut tasks = HashSet::new();

        for module in &self.modules {
            if !modules.insert(module.name.as_str()) {
                return Err(duplicate("module", &module.name));
            }
            let mut tests = HashSet::new();
            for test in &module.tests {
                if !tests.insert(test.name.as_str()) {
                    return Err(duplicate("test", &format!("{}.{}", module.name, test.name)));
                }
            }
            for service in &module.services {
                if !services.insert(service.name.as_str()) {
                    return Err(duplicate("service", &service.name));
                }
            }
            for task in &module.tasks {
                if !tasks.insert(task.name.as_str()) {
                    return Err(duplicate("task", &task.name));
                }
            }
        }

        for module in &self.modules {
            if let Some(dependency) = module
                .dependencies
                .iter()
                .find(|d| !modules.contains(d.as_str()))
            {
                return Err(ConfigError::UnknownDependency {
                    module: module.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Find a service and the module that declares it.
    pub fn service(&self, name: &str) -> Option<(&ModuleDefinition, &ServiceDefinition)> {
        self.modules.iter().find_map(|m| {
            m.services
                .iter()
                .find(|s| s.name == name)
                .map(|s| (m, s))
        })
    }

    /// Find a task and the module that declares it.
    pub fn task(&self, name: &str) -> Option<(&ModuleDefinition, &TaskDefinition)> {
        self.modules
            .iter()
            .find_map(|m| m.tasks.iter().find(|t| t.name == name).map(|t| (m, t)))
    }
}

impl ModuleDefinition {
    pub fn test(&self, name: &str) -> Option<&TestDefinition> {
        self.tests.iter().find(|t| t.name == name)
    }
}

fn duplicate(kind: &'static str, name: &str) -> ConfigError {
    ConfigError::DuplicateName {
        kind,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::PrimitiveValue;

    const PROJECT: &str = r#"
name = "shop"

[secrets]
"db.password" = "hunter2"

[[modules]]
name = "api"
dependencies = ["common"]

[[modules.tests]]
name = "unit"
command = ["cargo", "test"]

[[modules.services]]
name = "api"
logs = ["listening"]

[modules.services.outputs]
host = "api.local"
port = 8080

[[modules]]
name = "common"
type = "library"
build_log = "common\n"

[[modules.tasks]]
name = "migrate"
command = ["./migrate.sh"]
"#;

    #[test]
    fn test_parse_applies_defaults() {
        let config = ProjectConfig::from_toml_str(PROJECT).unwrap();
        assert_eq!(config.environment, "local");
        assert_eq!(config.provider, "local");
        assert_eq!(config.secrets["db.password"], "hunter2");

        let api = config.module("api").unwrap();
        assert_eq!(api.module_type, "exec");
        let unit = api.test("unit").unwrap();
        assert_eq!(unit.output, "OK\n");
        assert!(unit.success);

        let (owner, service) = config.service("api").unwrap();
        assert_eq!(owner.name, "api");
        assert_eq!(service.outputs["port"], PrimitiveValue::Integer(8080));

        let (owner, task) = config.task("migrate").unwrap();
        assert_eq!(owner.name, "common");
        assert_eq!(task.output, "");
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let err = ProjectConfig::from_toml_str(
            r#"
name = "shop"
[[modules]]
name = "api"
dependencies = ["ghost"]
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownDependency { ref dependency, .. } if dependency == "ghost"
        ));
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let err = ProjectConfig::from_toml_str(
            r#"
name = "shop"
[[modules]]
name = "api"
[[modules]]
name = "api"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { kind: "module", .. }));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = ProjectConfig::from_toml_str("name = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
