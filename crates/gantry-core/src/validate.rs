//! Result validation against the contract catalog.
//!
//! Checks, in order:
//! 1. The result is an object (or `null` for a nullable contract).
//! 2. Every required field is present.
//! 3. Every present declared field matches its [`FieldType`].
//! 4. Absent defaulted fields are filled.
//! 5. Undeclared fields pass through (or must be primitives).
//! 6. Cross-field constraints hold.
//!
//! Validation is pure: the same input always yields the same verdict.

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::action::ActionKind;
use crate::catalog::{
    Constraint, ContractCatalog, ExtraFields, FieldSpec, FieldType, Presence, ResultContract,
};
use crate::error::{Result, ValidationError};

/// A provider result that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResult {
    action: ActionKind,
    value: Option<Map<String, Value>>,
}

impl ValidatedResult {
    pub fn action(&self) -> ActionKind {
        self.action
    }

    /// `true` when the provider legitimately returned "no result".
    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    pub fn value(&self) -> Option<&Map<String, Value>> {
        self.value.as_ref()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value.as_ref().and_then(|v| v.get(field))
    }

    /// The validated result as JSON; `null` when absent.
    pub fn into_value(self) -> Value {
        self.value.map(Value::Object).unwrap_or(Value::Null)
    }

    /// Decode into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> std::result::Result<T, ValidationError> {
        serde_json::from_value(self.clone().into_value()).map_err(|e| ValidationError::Decode {
            action: self.action.name().to_string(),
            message: e.to_string(),
        })
    }
}

impl ContractCatalog {
    /// Validate a raw result for `action`.
    ///
    /// A missing catalog entry is a configuration error; a non-conforming
    /// result is a validation error.
    pub fn validate(&self, action: ActionKind, raw: Value) -> Result<ValidatedResult> {
        Ok(self.contract(action)?.validate(raw)?)
    }

    /// Validate a raw result for an action given by wire name.
    pub fn validate_named(&self, action: &str, raw: Value) -> Result<ValidatedResult> {
        self.validate(action.parse()?, raw)
    }
}

impl ResultContract {
    pub fn validate(&self, raw: Value) -> std::result::Result<ValidatedResult, ValidationError> {
        let checker = Checker {
            action: self.action.name(),
        };
        match raw {
            Value::Null if self.nullable => Ok(ValidatedResult {
                action: self.action,
                value: None,
            }),
            Value::Null => Err(ValidationError::UnexpectedNull {
                action: checker.action.to_string(),
            }),
            Value::Object(map) => {
                let map = checker.record("", &self.fields, map, self.extra_fields)?;
                for constraint in &self.constraints {
                    checker.constraint(constraint, &map)?;
                }
                Ok(ValidatedResult {
                    action: self.action,
                    value: Some(map),
                })
            }
            other => Err(ValidationError::NotAnObject {
                action: checker.action.to_string(),
                found: type_name(&other).to_string(),
            }),
        }
    }
}

/// Validate fields of a standalone record, e.g. a streamed log entry.
pub fn validate_record(
    action: ActionKind,
    fields: &[FieldSpec],
    raw: Value,
) -> std::result::Result<Value, ValidationError> {
    let checker = Checker {
        action: action.name(),
    };
    checker.value("", &FieldType::Record(fields.to_vec()), raw)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

struct Checker<'a> {
    action: &'a str,
}

impl Checker<'_> {
    fn wrong_type(&self, path: &str, ty: &FieldType, found: &Value) -> ValidationError {
        ValidationError::WrongType {
            action: self.action.to_string(),
            field: path.to_string(),
            expected: ty.describe(),
            found: type_name(found).to_string(),
        }
    }

    fn record(
        &self,
        prefix: &str,
        fields: &[FieldSpec],
        mut map: Map<String, Value>,
        extras: ExtraFields,
    ) -> std::result::Result<Map<String, Value>, ValidationError> {
        for spec in fields {
            let path = join(prefix, &spec.name);
            match map.remove(&spec.name) {
                Some(value) => {
                    let checked = self.value(&path, &spec.ty, value)?;
                    map.insert(spec.name.clone(), checked);
                }
                None => match &spec.presence {
                    Presence::Required => {
                        return Err(ValidationError::MissingField {
                            action: self.action.to_string(),
                            field: path,
                        })
                    }
                    Presence::Optional => {}
                    Presence::Default(default) => {
                        map.insert(spec.name.clone(), default.clone());
                    }
                },
            }
        }

        if extras == ExtraFields::Primitives {
            for (key, value) in &map {
                if fields.iter().any(|f| &f.name == key) {
                    continue;
                }
                if matches!(value, Value::Array(_) | Value::Object(_)) {
                    return Err(ValidationError::WrongType {
                        action: self.action.to_string(),
                        field: join(prefix, key),
                        expected: "primitive value".to_string(),
                        found: type_name(value).to_string(),
                    });
                }
            }
        }

        Ok(map)
    }

    fn value(
        &self,
        path: &str,
        ty: &FieldType,
        value: Value,
    ) -> std::result::Result<Value, ValidationError> {
        match ty {
            FieldType::Boolean if value.is_boolean() => Ok(value),
            FieldType::Number if value.is_number() => Ok(value),
            FieldType::Any => Ok(value),
            FieldType::Object if value.is_object() => Ok(value),
            FieldType::Integer { min, max } => {
                if !value.is_i64() && !value.is_u64() {
                    return Err(self.wrong_type(path, ty, &value));
                }
                match value.as_i64() {
                    Some(n) if (*min..=*max).contains(&n) => Ok(value),
                    _ => Err(ValidationError::OutOfRange {
                        action: self.action.to_string(),
                        field: path.to_string(),
                        value: value.to_string(),
                        min: *min,
                        max: *max,
                    }),
                }
            }
            FieldType::String { allow_empty } => match value.as_str() {
                Some("") if !allow_empty => Err(ValidationError::EmptyString {
                    action: self.action.to_string(),
                    field: path.to_string(),
                }),
                Some(_) => Ok(value),
                None => Err(self.wrong_type(path, ty, &value)),
            },
            FieldType::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => Ok(value),
                Some(s) => Err(ValidationError::NotAllowed {
                    action: self.action.to_string(),
                    field: path.to_string(),
                    value: s.to_string(),
                    allowed: allowed.clone(),
                }),
                None => Err(self.wrong_type(path, ty, &value)),
            },
            FieldType::Nullable(inner) => {
                if value.is_null() {
                    Ok(value)
                } else {
                    self.value(path, inner, value)
                }
            }
            FieldType::Timestamp => match value.as_str() {
                Some(s) if parse_timestamp(s).is_some() => Ok(value),
                Some(s) => Err(ValidationError::InvalidTimestamp {
                    action: self.action.to_string(),
                    field: path.to_string(),
                    value: s.to_string(),
                }),
                None => Err(self.wrong_type(path, ty, &value)),
            },
            FieldType::ArrayOf(inner) => match value {
                Value::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| self.value(&format!("{path}[{i}]"), inner, item))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => Err(self.wrong_type(path, ty, &other)),
            },
            FieldType::MapOf(inner) => match value {
                Value::Object(map) => {
                    let mut checked = Map::new();
                    for (key, item) in map {
                        let item = self.value(&join(path, &key), inner, item)?;
                        checked.insert(key, item);
                    }
                    Ok(Value::Object(checked))
                }
                other => Err(self.wrong_type(path, ty, &other)),
            },
            FieldType::Record(fields) => match value {
                Value::Object(map) => self
                    .record(path, fields, map, ExtraFields::PassThrough)
                    .map(Value::Object),
                other => Err(self.wrong_type(path, ty, &other)),
            },
            _ => Err(self.wrong_type(path, ty, &value)),
        }
    }

    fn constraint(
        &self,
        constraint: &Constraint,
        map: &Map<String, Value>,
    ) -> std::result::Result<(), ValidationError> {
        match constraint {
            Constraint::NotBefore { earlier, later } => {
                let start = map.get(earlier).and_then(Value::as_str).and_then(parse_timestamp);
                let end = map.get(later).and_then(Value::as_str).and_then(parse_timestamp);
                match (start, end) {
                    (Some(start), Some(end)) if end < start => Err(ValidationError::OutOfOrder {
                        action: self.action.to_string(),
                        earlier: earlier.clone(),
                        later: later.clone(),
                    }),
                    _ => Ok(()),
                }
            }
        }
    }
}
