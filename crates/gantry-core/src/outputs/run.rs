//! Run, test, and task results.
//!
//! `TestResult` and `RunTaskResult` embed a [`RunResult`] and flatten it, so on
//! the wire every run field sits at the same level as `testName` / `taskName`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Extra;
use crate::version::Version;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub module_name: String,
    pub command: Vec<String>,
    pub version: Version,
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Log output of the run; may be empty, never absent.
    pub output: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl RunResult {
    pub fn duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_name: String,
    #[serde(flatten)]
    pub run: RunResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTaskResult {
    pub task_name: String,
    #[serde(flatten)]
    pub run: RunResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Whether the task has run successfully for the module's current version.
    pub done: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_run() -> serde_json::Value {
        json!({
            "moduleName": "module-a",
            "command": ["make", "test"],
            "version": {"versionString": "v-0123456789abcdef", "dependencyVersions": {}},
            "success": true,
            "startedAt": "2024-01-01T00:00:00Z",
            "completedAt": "2024-01-01T00:00:02Z",
            "output": "OK\n"
        })
    }

    #[test]
    fn test_test_result_is_flat_on_the_wire() {
        let mut wire = wire_run();
        wire["testName"] = json!("unit");
        wire["junitPath"] = json!("reports/unit.xml");

        let result: TestResult = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(result.test_name, "unit");
        assert_eq!(result.run.module_name, "module-a");
        assert_eq!(result.run.duration(), chrono::Duration::seconds(2));
        assert_eq!(result.run.extra["junitPath"], json!("reports/unit.xml"));

        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["testName"], json!("unit"));
        assert_eq!(back["moduleName"], json!("module-a"));
        assert!(back.get("run").is_none());
        assert_eq!(back["junitPath"], json!("reports/unit.xml"));
    }

    #[test]
    fn test_run_task_result_flattens_task_name() {
        let mut wire = wire_run();
        wire["taskName"] = json!("migrate");
        let result: RunTaskResult = serde_json::from_value(wire).unwrap();
        assert_eq!(result.task_name, "migrate");
        assert!(result.run.success);
    }
}
