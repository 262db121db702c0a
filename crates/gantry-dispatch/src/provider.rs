//! The provider trait and the request handed to it.

use async_trait::async_trait;
use gantry_core::{ActionKind, TargetDescriptor};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::logs::LogSink;

/// Open key-value parameters of an invocation.
pub type Params = serde_json::Map<String, Value>;

/// A single action invocation as seen by a provider.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: ActionKind,
    pub target: TargetDescriptor,
    pub params: Params,
    /// Present for `getServiceLogs` invocations made through
    /// `ActionDispatcher::service_logs`.
    pub log_sink: Option<LogSink>,
}

impl ActionRequest {
    pub fn new(action: ActionKind, target: TargetDescriptor, params: Params) -> Self {
        Self {
            action,
            target,
            params,
            log_sink: None,
        }
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn bool_param(&self, key: &str) -> bool {
        self.params
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Decode a parameter into a typed value; `None` when absent.
    pub fn param<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| anyhow::anyhow!("invalid parameter {key}: {e}")),
        }
    }

    /// A configuration key given either as a dotted string or a list of segments.
    pub fn key_param(&self) -> anyhow::Result<String> {
        match self.params.get("key") {
            Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
            Some(Value::Array(segments)) if !segments.is_empty() => segments
                .iter()
                .map(|s| {
                    s.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| anyhow::anyhow!("key segments must be strings"))
                })
                .collect::<anyhow::Result<Vec<_>>>()
                .map(|parts| parts.join(".")),
            _ => anyhow::bail!("missing parameter key"),
        }
    }
}

/// A pluggable implementation of some of the actions.
///
/// `handle` returns the raw result; the dispatcher validates it before anyone
/// else sees it. An `Err` is a provider failure and is propagated unchanged.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Actions this provider implements.
    fn supported_actions(&self) -> Vec<ActionKind>;

    async fn handle(&self, request: ActionRequest) -> anyhow::Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(params: Value) -> ActionRequest {
        let Value::Object(params) = params else {
            panic!("params must be an object");
        };
        ActionRequest::new(
            ActionKind::DeleteSecret,
            TargetDescriptor::provider("local"),
            params,
        )
    }

    #[test]
    fn test_key_param_accepts_segments_and_strings() {
        assert_eq!(
            request(json!({"key": ["db", "password"]})).key_param().unwrap(),
            "db.password"
        );
        assert_eq!(
            request(json!({"key": "db.password"})).key_param().unwrap(),
            "db.password"
        );
        assert!(request(json!({})).key_param().is_err());
        assert!(request(json!({"key": [1]})).key_param().is_err());
    }

    #[test]
    fn test_typed_param() {
        let req = request(json!({"command": ["echo", "hi"], "force": true}));
        let command: Vec<String> = req.param("command").unwrap().unwrap();
        assert_eq!(command, vec!["echo", "hi"]);
        assert!(req.bool_param("force"));
        assert!(!req.bool_param("missing"));
        assert!(req.param::<Vec<String>>("missing").unwrap().is_none());
    }
}
