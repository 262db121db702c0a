//! Provider-scoped results: provider configuration, environment lifecycle, secrets.

use serde::{Deserialize, Serialize};

use super::{Acknowledgement, Extra};

/// Provider configuration as resolved by `configureProvider`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureProviderResult {
    pub config: ProviderConfig,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A dashboard page a provider exposes for an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPage {
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub new_window: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Status of an environment for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentStatus {
    pub ready: bool,
    #[serde(default)]
    pub need_user_input: bool,
    #[serde(default)]
    pub dashboard_pages: Vec<DashboardPage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl EnvironmentStatus {
    /// `ready = false` always blocks, whatever the other fields say.
    pub fn can_proceed(&self) -> bool {
        self.ready
    }
}

pub type PrepareEnvironmentResult = Acknowledgement;
pub type CleanupEnvironmentResult = Acknowledgement;
pub type SetSecretResult = Acknowledgement;

/// `value` is `None` when the key does not exist; `Some("")` is a stored empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetSecretResult {
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSecretResult {
    /// `true` if the key was deleted, `false` if it did not exist.
    pub found: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_value_null_differs_from_empty() {
        let absent: GetSecretResult = serde_json::from_value(json!({"value": null})).unwrap();
        let empty: GetSecretResult = serde_json::from_value(json!({"value": ""})).unwrap();
        assert_eq!(absent.value, None);
        assert_eq!(empty.value.as_deref(), Some(""));
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({"value": null}));
    }

    #[test]
    fn test_environment_status_keeps_unknown_fields() {
        let status: EnvironmentStatus =
            serde_json::from_value(json!({"ready": false, "clusterId": "c-1"})).unwrap();
        assert!(!status.can_proceed());
        assert!(!status.need_user_input);
        assert!(status.dashboard_pages.is_empty());
        let wire = serde_json::to_value(&status).unwrap();
        assert_eq!(wire["clusterId"], json!("c-1"));
    }
}
