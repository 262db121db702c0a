//! Module-scoped results: type description, configuration, build, push, publish.

use serde::{Deserialize, Serialize};

use super::Extra;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleTypeDescription {
    /// Markdown documentation for the module type.
    pub docs: String,
    /// Open structural schema of the module type's own configuration.
    pub schema: serde_json::Value,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A named sub-configuration of a module (service, test, or task).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedConfig {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub spec: serde_json::Value,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Module configuration returned by `configure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub spec: serde_json::Value,
    #[serde(default)]
    pub service_configs: Vec<NamedConfig>,
    #[serde(default)]
    pub test_configs: Vec<NamedConfig>,
    #[serde(default)]
    pub task_configs: Vec<NamedConfig>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildStatus {
    /// Whether an up-to-date build is ready.
    pub ready: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Outcome of a `build` invocation.
///
/// `fresh` means work was performed by this invocation; `fetched` means the
/// output came from a remote cache or registry. They are independent, and a
/// provider may set both. Both absent means the output was already present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fresh: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl BuildResult {
    pub fn is_fresh(&self) -> bool {
        self.fresh.unwrap_or(false)
    }

    pub fn is_fetched(&self) -> bool {
        self.fetched.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResult {
    pub pushed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_and_fetched_are_independent() {
        let result: BuildResult =
            serde_json::from_value(json!({"fresh": true, "fetched": true})).unwrap();
        assert!(result.is_fresh());
        assert!(result.is_fetched());

        let cached = BuildResult::default();
        assert!(!cached.is_fresh());
        assert!(!cached.is_fetched());
        assert_eq!(serde_json::to_value(&cached).unwrap(), json!({}));
    }

    #[test]
    fn test_module_config_type_key() {
        let config: ModuleConfig = serde_json::from_value(json!({
            "name": "module-a",
            "type": "exec",
            "testConfigs": [{"name": "unit"}]
        }))
        .unwrap();
        assert_eq!(config.module_type, "exec");
        assert_eq!(config.test_configs[0].name, "unit");
        assert!(config.test_configs[0].dependencies.is_empty());
    }
}
