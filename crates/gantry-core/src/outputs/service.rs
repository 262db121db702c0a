//! Service-scoped results: status, outputs, exec, and log entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Acknowledgement, Extra};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceState {
    Ready,
    Deploying,
    Stopped,
    Unhealthy,
    Unknown,
    Outdated,
    Missing,
}

impl ServiceState {
    pub const ALL: [ServiceState; 7] = [
        ServiceState::Ready,
        ServiceState::Deploying,
        ServiceState::Stopped,
        ServiceState::Unhealthy,
        ServiceState::Unknown,
        ServiceState::Outdated,
        ServiceState::Missing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Ready => "ready",
            ServiceState::Deploying => "deploying",
            ServiceState::Stopped => "stopped",
            ServiceState::Unhealthy => "unhealthy",
            ServiceState::Unknown => "unknown",
            ServiceState::Outdated => "outdated",
            ServiceState::Missing => "missing",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngressProtocol {
    Http,
    Https,
    Tcp,
    Udp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceIngress {
    pub hostname: String,
    pub path: String,
    pub port: u16,
    pub protocol: IngressProtocol,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of `getServiceStatus`, `deployService`, and `deleteService`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ServiceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_replicas: Option<u32>,
    #[serde(default)]
    pub ingresses: Vec<ServiceIngress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

pub type HotReloadServiceResult = Acknowledgement;

/// `getServiceLogs` returns an empty record; the entries themselves are streamed.
pub type GetServiceLogsResult = Acknowledgement;

/// A primitive output value published by a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimitiveValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

/// Result of `getServiceOutputs`.
pub type ServiceOutputs = BTreeMap<String, PrimitiveValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecInServiceResult {
    pub code: i64,
    /// Merged stdout and stderr; always present.
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ExecInServiceResult {
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}

/// One entry in a service's log stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLogEntry {
    pub service_name: String,
    pub timestamp: DateTime<Utc>,
    pub msg: String,
}

impl ServiceLogEntry {
    pub fn new(service_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            timestamp: Utc::now(),
            msg: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_state_wire_names() {
        for state in ServiceState::ALL {
            let wire = serde_json::to_value(state).unwrap();
            assert_eq!(wire, json!(state.as_str()));
        }
    }

    #[test]
    fn test_service_outputs_decode_primitives() {
        let outputs: ServiceOutputs = serde_json::from_value(json!({
            "host": "api.local",
            "port": 8080,
            "ratio": 0.5,
            "tls": false,
            "token": null
        }))
        .unwrap();
        assert_eq!(outputs["host"], PrimitiveValue::String("api.local".into()));
        assert_eq!(outputs["port"], PrimitiveValue::Integer(8080));
        assert_eq!(outputs["ratio"], PrimitiveValue::Number(0.5));
        assert_eq!(outputs["tls"], PrimitiveValue::Bool(false));
        assert_eq!(outputs["token"], PrimitiveValue::Null);
    }

    #[test]
    fn test_exec_result_split_streams_optional() {
        let result: ExecInServiceResult =
            serde_json::from_value(json!({"code": 1, "output": ""})).unwrap();
        assert!(!result.succeeded());
        assert!(result.stdout.is_none());
        assert!(result.stderr.is_none());
    }
}
