//! Result contract catalog.
//!
//! One [`ResultContract`] per action: the declared fields of its result, how
//! each field is validated, which fields get defaults, and what happens to
//! fields nobody declared. Contracts are plain data, so a new or stricter
//! contract can be registered without touching the dispatcher.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::action::ActionKind;
use crate::error::{ContractError, Result};

/// Validation rule for a single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Boolean,
    /// An integer within `min..=max`.
    Integer { min: i64, max: i64 },
    Number,
    String { allow_empty: bool },
    /// A string restricted to a fixed set of values.
    OneOf(Vec<String>),
    /// The inner type, or `null`.
    Nullable(Box<FieldType>),
    /// An RFC 3339 timestamp string.
    Timestamp,
    /// Any JSON object; contents are provider-specific.
    Object,
    Any,
    ArrayOf(Box<FieldType>),
    /// An object whose values all share one type.
    MapOf(Box<FieldType>),
    /// A nested record with its own declared fields. Undeclared keys pass through.
    Record(Vec<FieldSpec>),
}

impl FieldType {
    pub fn string() -> Self {
        FieldType::String { allow_empty: false }
    }

    pub fn string_allow_empty() -> Self {
        FieldType::String { allow_empty: true }
    }

    pub fn integer() -> Self {
        FieldType::integer_in(i64::MIN, i64::MAX)
    }

    pub fn integer_in(min: i64, max: i64) -> Self {
        FieldType::Integer { min, max }
    }

    pub fn one_of(values: &[&str]) -> Self {
        FieldType::OneOf(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn nullable(inner: FieldType) -> Self {
        FieldType::Nullable(Box::new(inner))
    }

    pub fn array_of(inner: FieldType) -> Self {
        FieldType::ArrayOf(Box::new(inner))
    }

    pub fn map_of(inner: FieldType) -> Self {
        FieldType::MapOf(Box::new(inner))
    }

    /// Human-readable description used in validation errors.
    pub fn describe(&self) -> String {
        match self {
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Integer {
                min: i64::MIN,
                max: i64::MAX,
            } => "integer".to_string(),
            FieldType::Integer { min, max } => format!("integer in {min}..={max}"),
            FieldType::Number => "number".to_string(),
            FieldType::String { allow_empty: true } => "string".to_string(),
            FieldType::String { .. } => "non-empty string".to_string(),
            FieldType::OneOf(values) => format!("one of {values:?}"),
            FieldType::Nullable(inner) => format!("{} or null", inner.describe()),
            FieldType::Timestamp => "RFC 3339 timestamp".to_string(),
            FieldType::Object => "object".to_string(),
            FieldType::Any => "any value".to_string(),
            FieldType::ArrayOf(inner) => format!("array of {}", inner.describe()),
            FieldType::MapOf(inner) => format!("map of {}", inner.describe()),
            FieldType::Record(_) => "object".to_string(),
        }
    }
}

/// Whether a field must be present, and what fills it when absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    Default(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    pub presence: Presence,
}

impl FieldSpec {
    pub fn required(name: &str, ty: FieldType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            presence: Presence::Required,
        }
    }

    pub fn optional(name: &str, ty: FieldType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            presence: Presence::Optional,
        }
    }

    pub fn defaulted(name: &str, ty: FieldType, default: Value) -> Self {
        Self {
            name: name.to_string(),
            ty,
            presence: Presence::Default(default),
        }
    }
}

/// What to do with result keys no field declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraFields {
    /// Keep them unchanged (forward compatibility with newer providers).
    PassThrough,
    /// Keep them, but each value must be a JSON primitive.
    Primitives,
}

/// A cross-field rule checked after every field is valid.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Timestamp field `later` must not be earlier than `earlier`.
    NotBefore { earlier: String, later: String },
}

/// The result contract of one action.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultContract {
    pub action: ActionKind,
    pub fields: Vec<FieldSpec>,
    pub extra_fields: ExtraFields,
    /// Whether a `null` result is a valid terminal value ("no result").
    pub nullable: bool,
    pub constraints: Vec<Constraint>,
}

impl ResultContract {
    pub fn new(action: ActionKind, fields: Vec<FieldSpec>) -> Self {
        Self {
            action,
            fields,
            extra_fields: ExtraFields::PassThrough,
            nullable: false,
            constraints: Vec::new(),
        }
    }

    /// Acknowledgement-only contract with no declared fields.
    pub fn empty(action: ActionKind) -> Self {
        Self::new(action, Vec::new())
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primitive_extras(mut self) -> Self {
        self.extra_fields = ExtraFields::Primitives;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.presence == Presence::Required)
            .map(|f| f.name.as_str())
    }
}

/// Mapping from action to result contract.
#[derive(Debug, Clone, Default)]
pub struct ContractCatalog {
    contracts: HashMap<ActionKind, ResultContract>,
}

impl ContractCatalog {
    /// A catalog with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The catalog for every built-in action.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for contract in builtin_contracts() {
            catalog.register(contract);
        }
        catalog
    }

    /// Add or replace a contract, returning the one it replaced.
    pub fn register(&mut self, contract: ResultContract) -> Option<ResultContract> {
        self.contracts.insert(contract.action, contract)
    }

    pub fn get(&self, action: ActionKind) -> Option<&ResultContract> {
        self.contracts.get(&action)
    }

    /// Look up a contract; a missing entry is a configuration error.
    pub fn contract(&self, action: ActionKind) -> Result<&ResultContract> {
        self.get(action).ok_or_else(|| ContractError::MissingContract {
            action: action.name().to_string(),
        })
    }

    pub fn contains(&self, action: ActionKind) -> bool {
        self.contracts.contains_key(&action)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Registered actions in declaration order.
    pub fn actions(&self) -> Vec<ActionKind> {
        let mut actions: Vec<_> = self.contracts.keys().copied().collect();
        actions.sort();
        actions
    }
}

// ---------------------------------------------------------------------------
// Shared shapes
// ---------------------------------------------------------------------------

/// Fields of a module version.
pub fn version_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("versionString", FieldType::string()),
        FieldSpec::defaulted(
            "dependencyVersions",
            FieldType::map_of(FieldType::string()),
            json!({}),
        ),
        FieldSpec::optional("dirtyTimestamp", FieldType::nullable(FieldType::integer())),
    ]
}

pub fn dashboard_page_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("title", FieldType::string()),
        FieldSpec::required("description", FieldType::string()),
        FieldSpec::required("url", FieldType::string()),
        FieldSpec::defaulted("newWindow", FieldType::Boolean, json!(false)),
    ]
}

/// Fields of one entry in a `getServiceLogs` stream.
pub fn service_log_entry_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("serviceName", FieldType::string()),
        FieldSpec::required("timestamp", FieldType::Timestamp),
        FieldSpec::required("msg", FieldType::string()),
    ]
}

fn ingress_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("hostname", FieldType::string()),
        FieldSpec::required("path", FieldType::string_allow_empty()),
        FieldSpec::required("port", FieldType::integer_in(0, u16::MAX.into())),
        FieldSpec::required(
            "protocol",
            FieldType::one_of(&["http", "https", "tcp", "udp"]),
        ),
    ]
}

fn named_config_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("name", FieldType::string()),
        FieldSpec::defaulted(
            "dependencies",
            FieldType::array_of(FieldType::string()),
            json!([]),
        ),
        FieldSpec::defaulted("spec", FieldType::Object, json!({})),
    ]
}

fn service_status_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::optional(
            "state",
            FieldType::one_of(&[
                "ready",
                "deploying",
                "stopped",
                "unhealthy",
                "unknown",
                "outdated",
                "missing",
            ]),
        ),
        FieldSpec::optional("version", FieldType::string()),
        FieldSpec::optional("runningReplicas", FieldType::integer_in(0, u32::MAX.into())),
        FieldSpec::defaulted(
            "ingresses",
            FieldType::array_of(FieldType::Record(ingress_fields())),
            json!([]),
        ),
        FieldSpec::optional("lastMessage", FieldType::string_allow_empty()),
        FieldSpec::optional("lastError", FieldType::string_allow_empty()),
        FieldSpec::optional("createdAt", FieldType::Timestamp),
        FieldSpec::optional("updatedAt", FieldType::Timestamp),
        FieldSpec::optional("detail", FieldType::Object),
    ]
}

/// Fields shared by every run-like result.
pub fn run_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("moduleName", FieldType::string()),
        FieldSpec::required("command", FieldType::array_of(FieldType::string())),
        FieldSpec::required("version", FieldType::Record(version_fields())),
        FieldSpec::required("success", FieldType::Boolean),
        FieldSpec::required("startedAt", FieldType::Timestamp),
        FieldSpec::required("completedAt", FieldType::Timestamp),
        FieldSpec::required("output", FieldType::string_allow_empty()),
    ]
}

fn run_order() -> Constraint {
    Constraint::NotBefore {
        earlier: "startedAt".to_string(),
        later: "completedAt".to_string(),
    }
}

fn run_contract(action: ActionKind, extra: Option<FieldSpec>) -> ResultContract {
    let mut fields = run_fields();
    fields.extend(extra);
    ResultContract::new(action, fields).with_constraint(run_order())
}

fn test_result_contract(action: ActionKind) -> ResultContract {
    run_contract(
        action,
        Some(FieldSpec::required("testName", FieldType::string())),
    )
}

// ---------------------------------------------------------------------------
// Built-in contracts
// ---------------------------------------------------------------------------

fn builtin_contracts() -> Vec<ResultContract> {
    use ActionKind::*;

    let status = |action| ResultContract::new(action, service_status_fields());

    vec![
        // Provider
        ResultContract::new(
            ConfigureProvider,
            vec![FieldSpec::required(
                "config",
                FieldType::Record(vec![FieldSpec::required("name", FieldType::string())]),
            )],
        ),
        ResultContract::new(
            GetEnvironmentStatus,
            vec![
                FieldSpec::required("ready", FieldType::Boolean),
                FieldSpec::defaulted("needUserInput", FieldType::Boolean, json!(false)),
                FieldSpec::defaulted(
                    "dashboardPages",
                    FieldType::array_of(FieldType::Record(dashboard_page_fields())),
                    json!([]),
                ),
                FieldSpec::optional("detail", FieldType::Object),
            ],
        ),
        ResultContract::empty(PrepareEnvironment),
        ResultContract::empty(CleanupEnvironment),
        ResultContract::new(
            GetSecret,
            vec![FieldSpec::required(
                "value",
                FieldType::nullable(FieldType::string_allow_empty()),
            )],
        ),
        ResultContract::empty(SetSecret),
        ResultContract::new(
            DeleteSecret,
            vec![FieldSpec::required("found", FieldType::Boolean)],
        ),
        // Service
        status(GetServiceStatus),
        status(DeployService),
        ResultContract::empty(HotReloadService),
        status(DeleteService),
        ResultContract::empty(GetServiceOutputs).primitive_extras(),
        ResultContract::new(
            ExecInService,
            vec![
                FieldSpec::required("code", FieldType::integer()),
                FieldSpec::required("output", FieldType::string_allow_empty()),
                FieldSpec::optional("stdout", FieldType::string_allow_empty()),
                FieldSpec::optional("stderr", FieldType::string_allow_empty()),
            ],
        ),
        ResultContract::empty(GetServiceLogs),
        run_contract(RunService, None),
        // Task
        ResultContract::new(
            GetTaskStatus,
            vec![FieldSpec::required("done", FieldType::Boolean)],
        ),
        run_contract(
            RunTask,
            Some(FieldSpec::required("taskName", FieldType::string())),
        ),
        // Module
        ResultContract::new(
            DescribeType,
            vec![
                FieldSpec::required("docs", FieldType::string()),
                FieldSpec::required("schema", FieldType::Object),
            ],
        ),
        ResultContract::new(
            Configure,
            vec![
                FieldSpec::required("name", FieldType::string()),
                FieldSpec::required("type", FieldType::string()),
                FieldSpec::optional("path", FieldType::string()),
                FieldSpec::optional("description", FieldType::string_allow_empty()),
                FieldSpec::defaulted("spec", FieldType::Object, json!({})),
                FieldSpec::defaulted(
                    "serviceConfigs",
                    FieldType::array_of(FieldType::Record(named_config_fields())),
                    json!([]),
                ),
                FieldSpec::defaulted(
                    "testConfigs",
                    FieldType::array_of(FieldType::Record(named_config_fields())),
                    json!([]),
                ),
                FieldSpec::defaulted(
                    "taskConfigs",
                    FieldType::array_of(FieldType::Record(named_config_fields())),
                    json!([]),
                ),
            ],
        ),
        ResultContract::new(
            GetBuildStatus,
            vec![FieldSpec::required("ready", FieldType::Boolean)],
        ),
        ResultContract::new(
            Build,
            vec![
                FieldSpec::optional("buildLog", FieldType::string_allow_empty()),
                FieldSpec::optional("fetched", FieldType::Boolean),
                FieldSpec::optional("fresh", FieldType::Boolean),
                FieldSpec::optional("version", FieldType::string()),
                FieldSpec::optional("details", FieldType::Object),
            ],
        ),
        ResultContract::new(
            PushModule,
            vec![
                FieldSpec::required("pushed", FieldType::Boolean),
                FieldSpec::optional("message", FieldType::string()),
            ],
        ),
        ResultContract::new(
            PublishModule,
            vec![
                FieldSpec::required("published", FieldType::Boolean),
                FieldSpec::optional("message", FieldType::string()),
            ],
        ),
        run_contract(RunModule, None),
        test_result_contract(TestModule),
        test_result_contract(GetTestResult).nullable(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_action() {
        let catalog = ContractCatalog::builtin();
        assert_eq!(catalog.len(), ActionKind::ALL.len());
        for action in ActionKind::ALL {
            assert!(catalog.contains(action), "missing contract for {action}");
        }
    }

    #[test]
    fn test_only_get_test_result_is_nullable() {
        let catalog = ContractCatalog::builtin();
        for action in ActionKind::ALL {
            let contract = catalog.contract(action).unwrap();
            assert_eq!(contract.nullable, action == ActionKind::GetTestResult);
        }
    }

    #[test]
    fn test_get_service_logs_is_an_empty_record() {
        let catalog = ContractCatalog::builtin();
        let contract = catalog.contract(ActionKind::GetServiceLogs).unwrap();
        assert!(contract.fields.is_empty());
        assert!(!contract.nullable);
    }

    #[test]
    fn test_test_result_extends_run_fields() {
        let catalog = ContractCatalog::builtin();
        let test = catalog.contract(ActionKind::TestModule).unwrap();
        let run = catalog.contract(ActionKind::RunModule).unwrap();
        for field in &run.fields {
            assert_eq!(test.field(&field.name), Some(field));
        }
        assert!(test.field("testName").is_some());
    }

    #[test]
    fn test_register_replaces_entry() {
        let mut catalog = ContractCatalog::builtin();
        let stricter = ResultContract::new(
            ActionKind::Build,
            vec![FieldSpec::required("version", FieldType::string())],
        );
        let previous = catalog.register(stricter.clone());
        assert!(previous.is_some());
        assert_eq!(catalog.contract(ActionKind::Build).unwrap(), &stricter);
    }

    #[test]
    fn test_missing_contract_is_configuration_error() {
        let catalog = ContractCatalog::empty();
        let err = catalog.contract(ActionKind::Build).unwrap_err();
        assert!(matches!(err, ContractError::MissingContract { .. }));
    }

    #[test]
    fn test_required_fields_listing() {
        let catalog = ContractCatalog::builtin();
        let exec = catalog.contract(ActionKind::ExecInService).unwrap();
        let required: Vec<_> = exec.required_fields().collect();
        assert_eq!(required, vec!["code", "output"]);
    }
}
